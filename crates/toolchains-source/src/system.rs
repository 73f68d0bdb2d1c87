//! Host packages the builds expect to find installed.

/// Debian package names needed on the build machine.
pub const SYSTEM_PACKAGES: &[&str] = &[
    "bison",
    "flex",
    "texinfo",
    "make",
    "automake",
    "autoconf",
    "libtool",
    "git",
    "gcc",
    "g++",
    "gcc-multilib",
    "g++-multilib",
    "python3",
    "tar",
    "xz-utils",
    "unzip",
    "libgmp-dev",
    "libmpfr-dev",
    "zlib1g-dev",
    "libexpat1-dev",
    "gawk",
    "bzip2",
    "cmake",
    "ninja-build",
    "clang",
    "lld",
    "libxml2-dev",
];

/// The install hint printed by `source system`.
pub fn install_hint() -> String {
    format!("Please install following system libs: {}", SYSTEM_PACKAGES.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_duplicates() {
        let mut sorted = SYSTEM_PACKAGES.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), SYSTEM_PACKAGES.len());
        assert!(install_hint().ends_with("libxml2-dev"));
    }
}
