//! Per-target configuration patches.
//!
//! A few targets need configure flags or linker-script names that differ from
//! what the generic plan derives. Each one is a [`TargetQuirk`]; the table
//! below maps exact target triplets to them.

use toolchains_triplet::Triplet;

/// The configure-option set a quirk may patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigureSet {
    /// Options for the gcc configure step.
    pub gcc: Vec<String>,
    /// Options for the C library (glibc or mingw-w64) configure step.
    pub libc: Vec<String>,
    /// Architecture prefix of the canonical linker scripts in the data directory.
    pub ldscript_arch: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetQuirk {
    ArmSoftFloat,
    ArmHardFloat,
    /// The vendor kernel and glibc trees for Loongnix.
    Loongnix,
    Mingw64,
    Mingw32,
}

/// Targets with a quirk. Matched with full equality, so a vendor field counts.
const QUIRKS: &[(&str, TargetQuirk)] = &[
    ("arm-linux-gnueabi", TargetQuirk::ArmSoftFloat),
    ("arm-linux-gnueabihf", TargetQuirk::ArmHardFloat),
    ("loongarch64-loongnix-linux-gnu", TargetQuirk::Loongnix),
    ("x86_64-w64-mingw32", TargetQuirk::Mingw64),
    ("i686-w64-mingw32", TargetQuirk::Mingw32),
];

impl TargetQuirk {
    pub fn for_target(target: &Triplet) -> Option<Self> {
        QUIRKS
            .iter()
            .find(|(name, _)| Triplet::parse(name).is_ok_and(|t| &t == target))
            .map(|(_, quirk)| *quirk)
    }

    pub fn apply(self, set: &mut ConfigureSet) {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        match self {
            TargetQuirk::ArmSoftFloat => set.ldscript_arch = "arm-sf".into(),
            TargetQuirk::ArmHardFloat => set.ldscript_arch = "arm-hf".into(),
            TargetQuirk::Loongnix => {
                set.ldscript_arch = "loongarch64-loongnix".into();
                set.libc.push("--enable-obsolete-rpc".into());
                set.gcc.push("--disable-libsanitizer".into());
            }
            TargetQuirk::Mingw64 => set.libc.extend(strings(&["--disable-lib32", "--enable-lib64"])),
            TargetQuirk::Mingw32 => set.libc.extend(strings(&["--disable-lib64", "--enable-lib32"])),
        }
    }
}

/// Apply the quirk registered for `target`, if any.
pub fn patch(target: &Triplet, set: &mut ConfigureSet) -> Option<TargetQuirk> {
    let quirk = TargetQuirk::for_target(target)?;
    quirk.apply(set);
    Some(quirk)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Triplet {
        Triplet::parse(s).unwrap()
    }

    #[test]
    fn vendor_matters_for_loongnix() {
        assert_eq!(
            TargetQuirk::for_target(&t("loongarch64-loongnix-linux-gnu")),
            Some(TargetQuirk::Loongnix)
        );
        assert_eq!(TargetQuirk::for_target(&t("loongarch64-linux-gnu")), None);
        assert_eq!(
            TargetQuirk::for_target(&t("arm-unknown-linux-gnueabihf")),
            Some(TargetQuirk::ArmHardFloat)
        );
    }

    #[test]
    fn loongnix_patches_all_three() {
        let mut set = ConfigureSet { ldscript_arch: "loongarch64".into(), ..Default::default() };
        patch(&t("loongarch64-loongnix-linux-gnu"), &mut set);
        assert_eq!(set.ldscript_arch, "loongarch64-loongnix");
        assert_eq!(set.libc, vec!["--enable-obsolete-rpc"]);
        assert_eq!(set.gcc, vec!["--disable-libsanitizer"]);
    }

    #[test]
    fn mingw_selects_library_width() {
        let mut set = ConfigureSet::default();
        patch(&t("i686-w64-mingw32"), &mut set);
        assert_eq!(set.libc, vec!["--disable-lib64", "--enable-lib32"]);
        let mut set = ConfigureSet::default();
        assert_eq!(patch(&t("riscv64-linux-gnu"), &mut set), None);
        assert_eq!(set, ConfigureSet::default());
    }
}
