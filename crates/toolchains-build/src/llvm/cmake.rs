//! CMake cache options for the LLVM projects and their host libraries.

use std::path::Path;

use toolchains_triplet::Triplet;

use crate::error::{BuildError, Result};

/// Runtime targets and the `CMAKE_SYSTEM_NAME` each one is built for.
pub const RUNTIME_TARGETS: &[(&str, &str)] = &[
    ("x86_64-linux-gnu", "Linux"),
    ("i686-linux-gnu", "Linux"),
    ("aarch64-linux-gnu", "Linux"),
    ("riscv64-linux-gnu", "Linux"),
    ("loongarch64-linux-gnu", "Linux"),
    ("x86_64-w64-mingw32", "Windows"),
    ("i686-w64-mingw32", "Windows"),
];

/// Flags that make clang use the LLVM runtimes instead of the GNU ones.
pub const LLVM_RUNTIME_FLAGS: &[&str] = &["-stdlib=libc++", "-unwindlib=libunwind", "-rtlib=compiler-rt"];

/// Extra link flags for the host libraries of a windows-hosted LLVM.
pub const WINDOWS_LIB_FLAGS: &[&str] = &["-lws2_32", "-lbcrypt"];

const COMPILERS: &[(&str, &str)] = &[("C", "clang"), ("CXX", "clang++"), ("ASM", "clang")];

/// An ordered set of `-D<key>=<value>` options. Setting a key twice keeps
/// its first position and the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CmakeOptions {
    entries: Vec<(String, String)>,
}

impl CmakeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    pub fn remove(mut self, key: &str) -> Self {
        self.entries.retain(|(k, _)| k != key);
        self
    }

    /// `other` layered over `self`.
    pub fn merge(self, other: &CmakeOptions) -> Self {
        other
            .entries
            .iter()
            .fold(self, |options, (k, v)| options.set(k.as_str(), v.as_str()))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn to_args(&self) -> Vec<String> {
        self.entries.iter().map(|(k, v)| format!("-D{k}={v}")).collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CmakeOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), |options, (k, v)| options.set(k, v))
    }
}

/// Link clang and the tools against one shared libLLVM.
pub fn dylib() -> CmakeOptions {
    [
        ("LLVM_LINK_LLVM_DYLIB", "ON"),
        ("LLVM_BUILD_LLVM_DYLIB", "ON"),
        ("CLANG_LINK_CLANG_DYLIB", "ON"),
    ]
    .into_iter()
    .collect()
}

/// The first stage: compiler, linker and runtimes, without tests or docs.
pub fn stage1() -> CmakeOptions {
    [
        ("CMAKE_BUILD_TYPE", "Release"),
        ("LLVM_BUILD_DOCS", "OFF"),
        ("LLVM_BUILD_EXAMPLES", "OFF"),
        ("LLVM_INCLUDE_BENCHMARKS", "OFF"),
        ("LLVM_INCLUDE_EXAMPLES", "OFF"),
        ("LLVM_INCLUDE_TESTS", "OFF"),
        ("LLVM_TARGETS_TO_BUILD", "X86;AArch64;WebAssembly;RISCV;ARM;LoongArch"),
        ("LLVM_ENABLE_PROJECTS", "clang;lld"),
        ("LLVM_ENABLE_RUNTIMES", "libcxx;libcxxabi;libunwind;compiler-rt"),
        ("LLVM_ENABLE_WARNINGS", "OFF"),
        ("CLANG_INCLUDE_TESTS", "OFF"),
        ("BENCHMARK_INSTALL_DOCS", "OFF"),
        ("CLANG_DEFAULT_LINKER", "lld"),
        ("LLVM_ENABLE_LLD", "ON"),
        ("CMAKE_BUILD_WITH_INSTALL_RPATH", "ON"),
        ("LIBCXX_INCLUDE_BENCHMARKS", "OFF"),
        ("LIBCXX_USE_COMPILER_RT", "ON"),
        ("LIBCXX_CXX_ABI", "libcxxabi"),
        ("COMPILER_RT_DEFAULT_TARGET_ONLY", "ON"),
        ("COMPILER_RT_BUILD_BUILTINS", "ON"),
        ("COMPILER_RT_USE_LIBCXX", "ON"),
    ]
    .into_iter()
    .collect()
}

/// Windows runtimes use libstdc++'s ABI library in place of libcxxabi.
fn windows_runtimes(abi_include: &Path) -> CmakeOptions {
    CmakeOptions::new()
        .set("LLVM_ENABLE_RUNTIMES", "libcxx;libunwind;compiler-rt")
        .set("LIBCXX_CXX_ABI", "libsupc++")
        .set("LIBCXX_CXX_ABI_INCLUDE_PATHS", abi_include.display().to_string())
}

/// The second stage compiler: ThinLTO, LLVM runtimes by default.
pub fn stage2() -> CmakeOptions {
    stage1()
        .set("LLVM_ENABLE_PROJECTS", "clang;clang-tools-extra;lld")
        .set("LLVM_ENABLE_LTO", "Thin")
        .set("CLANG_DEFAULT_CXX_STDLIB", "libc++")
        .set("CLANG_DEFAULT_RTLIB", "compiler-rt")
        .set("CLANG_DEFAULT_UNWINDLIB", "libunwind")
        .remove("LLVM_ENABLE_RUNTIMES")
}

/// Options for the runtimes of `target` in the first stage.
///
/// `abi_include` is only read for windows targets.
pub fn stage1_runtimes(target: &Triplet, abi_include: &Path) -> CmakeOptions {
    if target.is_mingw() {
        stage1().merge(&windows_runtimes(abi_include))
    } else {
        stage1()
    }
}

/// Options for the runtimes of `target` in the third stage.
pub fn stage3_runtimes(target: &Triplet, abi_include: &Path) -> CmakeOptions {
    let stage3 = stage2().set("LLVM_ENABLE_RUNTIMES", "libcxx;libcxxabi;libunwind;compiler-rt");
    if target.is_mingw() {
        stage3.merge(&stage1_runtimes(target, abi_include))
    } else {
        stage3
    }
}

/// Options for zlib and libxml2 built for a windows host.
pub fn host_libraries() -> CmakeOptions {
    [
        ("BUILD_SHARED_LIBS", "ON"),
        ("LIBXML2_WITH_ICONV", "OFF"),
        ("LIBXML2_WITH_LZMA", "OFF"),
        ("LIBXML2_WITH_PYTHON", "OFF"),
        ("LIBXML2_WITH_ZLIB", "OFF"),
        ("LIBXML2_WITH_THREADS", "OFF"),
        ("LIBXML2_WITH_CATALOG", "OFF"),
        ("CMAKE_RC_COMPILER", "llvm-windres"),
        ("CMAKE_BUILD_WITH_INSTALL_RPATH", "ON"),
    ]
    .into_iter()
    .collect()
}

/// Options that point a canadian LLVM at its host libraries and at the
/// tablegen binaries of the build machine's LLVM.
pub fn canadian(zlib_prefix: &Path, libxml2_prefix: &Path, native_tool_dir: &Path) -> CmakeOptions {
    let zlib = zlib_prefix.join("lib").join("libzlibstatic.a").display().to_string();
    CmakeOptions::new()
        .set(
            "LIBXML2_INCLUDE_DIR",
            libxml2_prefix.join("include").join("libxml2").display().to_string(),
        )
        .set(
            "LIBXML2_LIBRARY",
            libxml2_prefix.join("lib").join("libxml2.dll.a").display().to_string(),
        )
        .set("CLANG_ENABLE_LIBXML2", "ON")
        .set("ZLIB_INCLUDE_DIR", zlib_prefix.join("include").display().to_string())
        .set("ZLIB_LIBRARY", zlib.clone())
        .set("ZLIB_LIBRARY_RELEASE", zlib)
        .set("LLVM_NATIVE_TOOL_DIR", native_tool_dir.display().to_string())
}

/// `CMAKE_SYSTEM_NAME` for a runtime target.
pub fn system_name(target: &Triplet) -> Result<&'static str> {
    RUNTIME_TARGETS
        .iter()
        .find(|(name, _)| *name == target.as_str())
        .map(|(_, system)| *system)
        .ok_or_else(|| BuildError::Unsupported {
            detail: format!("no LLVM runtimes for target {target}"),
        })
}

/// The runtime targets as triplets.
pub fn runtime_targets() -> Result<Vec<Triplet>> {
    RUNTIME_TARGETS
        .iter()
        .map(|(name, _)| Triplet::parse(name).map_err(BuildError::from))
        .collect()
}

/// The machines a compiler invocation involves.
#[derive(Debug, Clone, Copy)]
pub struct Machines<'a> {
    pub build: &'a Triplet,
    pub host: &'a Triplet,
    pub target: &'a Triplet,
}

/// Compiler options for building code that runs on `machines.target`.
///
/// clang always gets `--gcc-toolchain` pointed at the sysroot; anything not
/// running on the build machine is configured as a cross compile against it.
pub fn compiler(machines: Machines<'_>, sysroot: &Path, flags: &[&str]) -> Result<CmakeOptions> {
    let Machines { build, host, target } = machines;
    let extra = flags.join(" ");
    let compile_flags = format!(
        "-Wno-unused-command-line-argument --gcc-toolchain={} {extra}",
        sysroot.display()
    );
    let mut options = CmakeOptions::new();
    for (lang, program) in COMPILERS {
        options = options
            .set(format!("CMAKE_{lang}_COMPILER"), *program)
            .set(format!("CMAKE_{lang}_COMPILER_TARGET"), target.as_str())
            .set(format!("CMAKE_{lang}_FLAGS"), compile_flags.trim_end())
            .set(format!("CMAKE_{lang}_COMPILER_WORKS"), "ON");
    }
    if target != build {
        options = options
            .set("CMAKE_SYSTEM_NAME", system_name(target)?)
            .set("CMAKE_SYSTEM_PROCESSOR", target.arch())
            .set("CMAKE_SYSROOT", sysroot.display().to_string())
            .set("CMAKE_CROSSCOMPILING", "TRUE");
    }
    Ok(options
        .set("LLVM_RUNTIMES_TARGET", target.as_str())
        .set("LLVM_DEFAULT_TARGET_TRIPLE", target.llvm_style())
        .set("LLVM_HOST_TRIPLE", host.llvm_style())
        .set("CMAKE_LINK_FLAGS", extra))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Triplet {
        Triplet::parse(s).unwrap()
    }

    #[test]
    fn set_keeps_position_and_replaces_value() {
        let options = CmakeOptions::new().set("A", "1").set("B", "2").set("A", "3");
        assert_eq!(options.to_args(), vec!["-DA=3", "-DB=2"]);
        assert_eq!(options.remove("A").to_args(), vec!["-DB=2"]);
    }

    #[test]
    fn stage_two_builds_no_runtimes() {
        let options = stage2();
        assert_eq!(options.get("LLVM_ENABLE_RUNTIMES"), None);
        assert_eq!(options.get("LLVM_ENABLE_PROJECTS"), Some("clang;clang-tools-extra;lld"));
        assert_eq!(options.get("CMAKE_BUILD_TYPE"), Some("Release"));
    }

    #[test]
    fn windows_runtimes_use_libsupcxx() {
        let abi = Path::new("/h/sysroot/x86_64-w64-mingw32/include/c++/15.1.0");
        let windows = stage1_runtimes(&t("x86_64-w64-mingw32"), abi);
        assert_eq!(windows.get("LIBCXX_CXX_ABI"), Some("libsupc++"));
        assert_eq!(windows.get("LLVM_ENABLE_RUNTIMES"), Some("libcxx;libunwind;compiler-rt"));
        assert_eq!(
            windows.get("LIBCXX_CXX_ABI_INCLUDE_PATHS"),
            Some("/h/sysroot/x86_64-w64-mingw32/include/c++/15.1.0")
        );

        let linux = stage1_runtimes(&t("aarch64-linux-gnu"), abi);
        assert_eq!(linux.get("LIBCXX_CXX_ABI"), Some("libcxxabi"));

        let stage3 = stage3_runtimes(&t("i686-w64-mingw32"), abi);
        assert_eq!(stage3.get("LIBCXX_CXX_ABI"), Some("libsupc++"));
        assert_eq!(stage3.get("LLVM_ENABLE_LTO"), Some("Thin"));
        assert_eq!(stage3_runtimes(&t("x86_64-linux-gnu"), abi).get("LLVM_ENABLE_RUNTIMES"), Some("libcxx;libcxxabi;libunwind;compiler-rt"));
    }

    #[test]
    fn cross_compiles_set_the_system() {
        let build = t("x86_64-linux-gnu");
        let target = t("x86_64-w64-mingw32");
        let sysroot = Path::new("/h/sysroot");
        let machines = Machines { build: &build, host: &build, target: &target };
        let options = compiler(machines, sysroot, LLVM_RUNTIME_FLAGS).unwrap();
        assert_eq!(options.get("CMAKE_SYSTEM_NAME"), Some("Windows"));
        assert_eq!(options.get("CMAKE_SYSTEM_PROCESSOR"), Some("x86_64"));
        assert_eq!(options.get("CMAKE_CXX_COMPILER"), Some("clang++"));
        assert_eq!(
            options.get("CMAKE_C_FLAGS"),
            Some("-Wno-unused-command-line-argument --gcc-toolchain=/h/sysroot -stdlib=libc++ -unwindlib=libunwind -rtlib=compiler-rt")
        );
        assert_eq!(options.get("LLVM_DEFAULT_TARGET_TRIPLE"), Some("x86_64-unknown-w64-mingw32"));
        assert_eq!(options.get("LLVM_HOST_TRIPLE"), Some("x86_64-unknown-linux-gnu"));

        let native = Machines { build: &build, host: &build, target: &build };
        let options = compiler(native, sysroot, &[]).unwrap();
        assert_eq!(options.get("CMAKE_SYSTEM_NAME"), None);
        assert_eq!(options.get("CMAKE_C_FLAGS"), Some("-Wno-unused-command-line-argument --gcc-toolchain=/h/sysroot"));
        assert_eq!(options.get("CMAKE_LINK_FLAGS"), Some(""));
    }

    #[test]
    fn freestanding_targets_have_no_runtimes() {
        let build = t("x86_64-linux-gnu");
        let target = t("arm-none-eabi");
        let machines = Machines { build: &build, host: &build, target: &target };
        assert!(matches!(
            compiler(machines, Path::new("/s"), &[]),
            Err(BuildError::Unsupported { .. })
        ));
        assert_eq!(runtime_targets().unwrap().len(), 7);
    }
}
