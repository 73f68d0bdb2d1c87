//! The platforms this project knows how to build toolchains for.

use crate::error::{Result, TripletError};
use crate::triplet::Triplet;

/// Machines a produced toolchain may run on. Vendor fields are omitted.
pub const HOSTS: &[&str] = &["x86_64-linux-gnu", "x86_64-w64-mingw32"];

/// Machines a produced toolchain may emit code for. Vendor fields are omitted.
pub const TARGETS: &[&str] = &[
    "x86_64-linux-gnu",
    "i686-linux-gnu",
    "aarch64-linux-gnu",
    "arm-linux-gnueabi",
    "arm-linux-gnueabihf",
    "loongarch64-linux-gnu",
    "riscv64-linux-gnu",
    "x86_64-w64-mingw32",
    "i686-w64-mingw32",
    "arm-none-eabi",
    "x86_64-elf",
];

fn parse_all(list: &[&str]) -> Vec<Triplet> {
    list.iter().filter_map(|s| Triplet::parse(s).ok()).collect()
}

/// Parsed [`HOSTS`].
pub fn supported_hosts() -> Vec<Triplet> {
    parse_all(HOSTS)
}

/// Parsed [`TARGETS`].
pub fn supported_targets() -> Vec<Triplet> {
    parse_all(TARGETS)
}

fn check_in(triplet: &Triplet, list: &[Triplet], role: &'static str) -> Result<()> {
    if list.iter().any(|s| s.weak_eq(triplet)) {
        Ok(())
    } else {
        Err(TripletError::Unsupported {
            role,
            triplet: triplet.to_string(),
        })
    }
}

/// Validate a user-supplied host/target pair against the supported lists.
///
/// Comparison is weak, so a vendor-qualified spelling of a supported
/// platform is accepted.
pub fn check_supported(host: &Triplet, target: &Triplet) -> Result<()> {
    check_in(host, &supported_hosts(), "host")?;
    check_in(target, &supported_targets(), "target")
}
