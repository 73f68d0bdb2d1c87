//! The `Triplet` value type: parsing, normalization, and comparison.
//!
//! A triplet is written `arch-[vendor-]os-abi`. Two-field strings such as
//! `x86_64-elf` carry only an architecture and an ABI. Missing fields
//! normalize to `unknown`, and an `os` of `none` normalizes to `unknown`.
//! The original text is kept so that `Display` reproduces exactly what the
//! user wrote.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, TripletError};

/// Architectures whose hosted toolchains use `lib32` as their library directory.
pub const ARCH_32_BIT: &[&str] = &["arm", "armeb", "i486", "i686", "risc32", "risc32be"];

/// Value used for any field the triplet does not spell out.
pub const UNKNOWN: &str = "unknown";

/// A parsed platform identifier.
///
/// Equality, ordering, and hashing use the normalized fields, so
/// `x86_64-linux-gnu` and `x86_64-unknown-linux-gnu` are the same platform.
#[derive(Debug, Clone)]
pub struct Triplet {
    arch: String,
    vendor: String,
    os: String,
    abi: String,
    raw: String,
}

impl Triplet {
    /// Parse a hyphen-separated triplet of 2 to 4 fields.
    pub fn parse(input: &str) -> Result<Self> {
        let fields: Vec<&str> = input.split('-').collect();
        if fields.iter().any(|f| f.is_empty()) {
            return Err(TripletError::Malformed {
                input: input.to_string(),
                fields: fields.len(),
            });
        }
        let (arch, vendor, os, abi) = match fields.as_slice() {
            [arch, abi] => (*arch, UNKNOWN, UNKNOWN, *abi),
            [arch, os, abi] => (*arch, UNKNOWN, *os, *abi),
            [arch, vendor, os, abi] => (*arch, *vendor, *os, *abi),
            _ => {
                return Err(TripletError::Malformed {
                    input: input.to_string(),
                    fields: fields.len(),
                })
            }
        };
        let os = if os == "none" { UNKNOWN } else { os };
        Ok(Self {
            arch: arch.to_string(),
            vendor: vendor.to_string(),
            os: os.to_string(),
            abi: abi.to_string(),
            raw: input.to_string(),
        })
    }

    /// The build machine every built-in definition assumes: `x86_64-linux-gnu`.
    pub fn build_default() -> Self {
        Self {
            arch: "x86_64".into(),
            vendor: UNKNOWN.into(),
            os: "linux".into(),
            abi: "gnu".into(),
            raw: "x86_64-linux-gnu".into(),
        }
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn os(&self) -> &str {
        &self.os
    }

    pub fn abi(&self) -> &str {
        &self.abi
    }

    /// The triplet exactly as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Number of fields in the original text.
    pub fn field_count(&self) -> usize {
        self.raw.split('-').count()
    }

    /// Compare architecture, operating system, and ABI, ignoring the vendor.
    pub fn weak_eq(&self, other: &Triplet) -> bool {
        self.arch == other.arch && self.os == other.os && self.abi == other.abi
    }

    /// True for embedded targets without a hosted C library (`elf` / `eabi`).
    pub fn is_freestanding(&self) -> bool {
        matches!(self.abi.as_str(), "elf" | "eabi")
    }

    pub fn is_linux(&self) -> bool {
        self.os == "linux"
    }

    pub fn is_mingw(&self) -> bool {
        self.abi == "mingw32"
    }

    /// True when hosted libraries for this architecture live under `lib32`.
    pub fn is_32bit(&self) -> bool {
        ARCH_32_BIT.contains(&self.arch.as_str())
    }

    /// The LLVM spelling, which always carries a vendor field.
    ///
    /// `x86_64-linux-gnu` becomes `x86_64-unknown-linux-gnu`; all other
    /// shapes are returned unchanged.
    pub fn llvm_style(&self) -> String {
        if self.field_count() == 3 {
            format!("{}-{}-{}-{}", self.arch, UNKNOWN, self.os, self.abi)
        } else {
            self.raw.clone()
        }
    }

    fn key(&self) -> (&str, &str, &str, &str) {
        (&self.arch, &self.vendor, &self.os, &self.abi)
    }
}

impl PartialEq for Triplet {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Triplet {}

impl Hash for Triplet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for Triplet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Triplet {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for Triplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Triplet {
    type Err = TripletError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Triplet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Triplet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Triplet::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_three_fields() {
        let t = Triplet::parse("x86_64-linux-gnu").unwrap();
        assert_eq!(t.arch(), "x86_64");
        assert_eq!(t.vendor(), "unknown");
        assert_eq!(t.os(), "linux");
        assert_eq!(t.abi(), "gnu");
        assert_eq!(t.to_string(), "x86_64-linux-gnu");
    }

    #[test]
    fn parse_two_fields() {
        let t = Triplet::parse("x86_64-elf").unwrap();
        assert_eq!(t.os(), "unknown");
        assert_eq!(t.abi(), "elf");
        assert!(t.is_freestanding());
    }

    #[test]
    fn parse_four_fields() {
        let t = Triplet::parse("loongarch64-loongnix-linux-gnu").unwrap();
        assert_eq!(t.vendor(), "loongnix");
        assert_eq!(t.os(), "linux");
        assert_eq!(t.to_string(), "loongarch64-loongnix-linux-gnu");
    }

    #[test]
    fn none_os_normalizes() {
        let t = Triplet::parse("arm-none-eabi").unwrap();
        assert_eq!(t.os(), "unknown");
        assert_eq!(t.to_string(), "arm-none-eabi");
        assert!(t.is_freestanding());
    }

    #[test]
    fn malformed_field_counts() {
        for input in ["x86_64", "a-b-c-d-e", "x86_64--gnu", ""] {
            let err = Triplet::parse(input).unwrap_err();
            assert!(matches!(err, TripletError::Malformed { .. }), "{input}");
        }
    }

    #[test]
    fn weak_eq_ignores_vendor() {
        let a = Triplet::parse("arm-linux-gnueabi").unwrap();
        let b = Triplet::parse("arm-unknown-linux-gnueabi").unwrap();
        let c = Triplet::parse("arm-linux-gnueabihf").unwrap();
        assert!(a.weak_eq(&b));
        assert!(!a.weak_eq(&c));

        let d = Triplet::parse("loongarch64-loongnix-linux-gnu").unwrap();
        let e = Triplet::parse("loongarch64-linux-gnu").unwrap();
        assert!(d.weak_eq(&e));
        assert_ne!(d, e);
    }

    #[test]
    fn equality_uses_normalized_fields() {
        let a = Triplet::parse("x86_64-linux-gnu").unwrap();
        let b = Triplet::parse("x86_64-unknown-linux-gnu").unwrap();
        assert_eq!(a, b);
        assert_eq!(Triplet::build_default(), a);
    }

    #[test]
    fn llvm_style_inserts_vendor() {
        let t = Triplet::parse("riscv64-linux-gnu").unwrap();
        assert_eq!(t.llvm_style(), "riscv64-unknown-linux-gnu");
        let t = Triplet::parse("x86_64-w64-mingw32").unwrap();
        assert_eq!(t.llvm_style(), "x86_64-unknown-w64-mingw32");
        let t = Triplet::parse("x86_64-elf").unwrap();
        assert_eq!(t.llvm_style(), "x86_64-elf");
    }

    #[test]
    fn word_size() {
        assert!(Triplet::parse("i686-linux-gnu").unwrap().is_32bit());
        assert!(!Triplet::parse("aarch64-linux-gnu").unwrap().is_32bit());
    }

    #[test]
    fn serde_as_string() {
        #[derive(Serialize, Deserialize)]
        struct Holder {
            target: Triplet,
        }
        let h: Holder = toml::from_str("target = \"arm-linux-gnueabihf\"").unwrap();
        assert_eq!(h.target.abi(), "gnueabihf");
        let out = toml::to_string(&h).unwrap();
        assert!(out.contains("arm-linux-gnueabihf"));
        assert!(toml::from_str::<Holder>("target = \"bogus\"").is_err());
    }
}
