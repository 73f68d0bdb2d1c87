//! Install layout of a GCC toolchain: names and every directory derived from them.

use std::path::{Path, PathBuf};

use toolchains_triplet::{TargetEnv, ToolchainSpec, Triplet};

/// Major version of the GCC toolchains this project builds.
pub const GCC_MAJOR: &str = "15";

/// Runtime DSOs whose debug info is split into sidecar files on linux targets.
pub const LINUX_DSOS: &[&str] = &[
    "libgcc_s.so.1",
    "libstdc++.so",
    "libatomic.so",
    "libquadmath.so",
    "libgomp.so",
];

/// Runtime DLLs whose debug info is split into sidecar files on windows targets.
pub const WINDOWS_DSOS: &[&str] = &[
    "libgcc_s_seh-1.dll",
    "libgcc_s_dw2-1.dll",
    "libstdc++-6.dll",
    "libatomic-1.dll",
    "libquadmath-0.dll",
];

/// Every path a GCC toolchain install uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GccLayout {
    /// `<host>-host-<target>-target-gcc` or `<host>-native-gcc`.
    pub name_without_version: String,
    pub name: String,
    pub prefix: PathBuf,
    /// `<prefix>/<target>` for cross compilers, `<prefix>` otherwise.
    pub lib_prefix: PathBuf,
    pub bin_dir: PathBuf,
    pub share_dir: PathBuf,
    pub gdbinit_path: PathBuf,
    /// `lib32` or `lib64` under the prefix, by host bitness.
    pub rpath_dir: PathBuf,
    /// Linker flag pointing gdb at `rpath_dir` relative to its own location.
    pub rpath_option: String,
    /// `<target>-` for cross compilers.
    pub tool_prefix: String,
}

impl GccLayout {
    pub fn new(spec: &ToolchainSpec, prefix_dir: &Path) -> Self {
        let cross = spec.is_cross_compiler();
        let name_without_version = if cross {
            format!("{}-host-{}-target-gcc", spec.host, spec.target)
        } else {
            format!("{}-native-gcc", spec.host)
        };
        let name = format!("{name_without_version}{GCC_MAJOR}");
        let prefix = prefix_dir.join(&name);
        let lib_prefix = if cross {
            prefix.join(spec.target.as_str())
        } else {
            prefix.clone()
        };
        let share_dir = prefix.join("share");
        let lib_name = if spec.host.is_32bit() { "lib32" } else { "lib64" };
        Self {
            name_without_version,
            lib_prefix,
            bin_dir: prefix.join("bin"),
            gdbinit_path: share_dir.join(".gdbinit"),
            share_dir,
            rpath_dir: prefix.join(lib_name),
            rpath_option: format!("-Wl,-rpath='$$ORIGIN'/../{lib_name}"),
            tool_prefix: if cross { format!("{}-", spec.target) } else { String::new() },
            prefix,
            name,
        }
    }

    /// Layout of the toolchain built on, and running on, `build` for `target`.
    pub fn for_build(build: &Triplet, target: &Triplet, prefix_dir: &Path) -> Self {
        Self::new(&ToolchainSpec::cross(build.clone(), target.clone()), prefix_dir)
    }

    /// `<prefix>/lib/gcc/<target>`, the parent of the versioned libgcc directory.
    pub fn libgcc_root(&self, target: &Triplet) -> PathBuf {
        self.prefix.join("lib").join("gcc").join(target.as_str())
    }
}

/// Sorted entries of `dir`; empty when it does not exist.
pub fn entries(dir: &Path) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(read) => read.filter_map(|e| e.ok().map(|e| e.path())).collect(),
        Err(_) => Vec::new(),
    };
    entries.sort();
    entries
}

/// File name of `path` as UTF-8, or an empty string.
pub fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

/// The runtime DSOs whose debug info is split for this target.
pub fn debug_split_dsos(target: &Triplet) -> &'static [&'static str] {
    match TargetEnv::of(target) {
        Ok(TargetEnv::Linux) => LINUX_DSOS,
        Ok(TargetEnv::WindowsMingw) => WINDOWS_DSOS,
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Triplet {
        Triplet::parse(s).unwrap()
    }

    #[test]
    fn native_layout() {
        let layout = GccLayout::new(&ToolchainSpec::native(t("x86_64-linux-gnu")), Path::new("/opt"));
        assert_eq!(layout.name, "x86_64-linux-gnu-native-gcc15");
        assert_eq!(layout.lib_prefix, layout.prefix);
        assert_eq!(layout.rpath_dir, PathBuf::from("/opt/x86_64-linux-gnu-native-gcc15/lib64"));
        assert!(layout.tool_prefix.is_empty());
    }

    #[test]
    fn cross_layout() {
        let spec = ToolchainSpec::new(t("x86_64-linux-gnu"), t("x86_64-w64-mingw32"), t("arm-none-eabi"));
        let layout = GccLayout::new(&spec, Path::new("/opt"));
        assert_eq!(layout.name, "x86_64-w64-mingw32-host-arm-none-eabi-target-gcc15");
        assert_eq!(
            layout.lib_prefix,
            PathBuf::from("/opt/x86_64-w64-mingw32-host-arm-none-eabi-target-gcc15/arm-none-eabi")
        );
        assert_eq!(layout.tool_prefix, "arm-none-eabi-");
        assert_eq!(layout.rpath_option, "-Wl,-rpath='$$ORIGIN'/../lib64");
    }

    #[test]
    fn thirty_two_bit_host_uses_lib32() {
        let spec = ToolchainSpec::native(t("i686-linux-gnu"));
        let layout = GccLayout::new(&spec, Path::new("/opt"));
        assert!(layout.rpath_dir.ends_with("lib32"));
    }

    #[test]
    fn entries_are_sorted_and_tolerate_missing_dirs() {
        let dir = tempfile::tempdir().unwrap();
        assert!(entries(&dir.path().join("missing")).is_empty());
        std::fs::write(dir.path().join("b"), "").unwrap();
        std::fs::write(dir.path().join("a"), "").unwrap();
        let names: Vec<_> = entries(dir.path()).iter().map(|p| file_name(p).to_string()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn dso_lists_by_target() {
        assert_eq!(debug_split_dsos(&t("riscv64-linux-gnu")), LINUX_DSOS);
        assert_eq!(debug_split_dsos(&t("i686-w64-mingw32")), WINDOWS_DSOS);
        assert!(debug_split_dsos(&t("arm-none-eabi")).is_empty());
    }
}
