//! The shared, triple-keyed sysroot the LLVM toolchains compile against.
//!
//! The sysroot starts as a copy of the C libraries and libgcc objects of the
//! hosted GCC cross toolchains ([`assemble_gcc_sysroot`]). Each LLVM bootstrap
//! stage then harvests the runtimes it builds into it ([`harvest_runtimes`]).
//! Harvesting overwrites, so running it twice for a target is harmless.

use std::path::{Path, PathBuf};

use log::{info, warn};
use toolchains_shell::{FsOp, Shell};
use toolchains_triplet::{supported_targets, TargetEnv, ToolchainSpec, Triplet};

use crate::error::Result;
use crate::layout::{entries, file_name, GccLayout};

/// Library prefix entries that stay out of the sysroot.
const SKIPPED_LIB_PREFIX_ITEMS: &[&str] = &["bin", "lib32"];

/// `<home>/sysroot`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sysroot {
    root: PathBuf,
}

impl Sysroot {
    pub fn new(home: &Path) -> Self {
        Self {
            root: home.join("sysroot"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn target_dir(&self, target: &Triplet) -> PathBuf {
        self.root.join(target.as_str())
    }

    pub fn lib_dir(&self, target: &Triplet) -> PathBuf {
        self.target_dir(target).join("lib")
    }

    pub fn include_dir(&self, target: &Triplet) -> PathBuf {
        self.target_dir(target).join("include")
    }

    /// `lib/gcc/<target>` at the sysroot root.
    pub fn libgcc_root(&self, target: &Triplet) -> PathBuf {
        self.root.join("lib").join("gcc").join(target.as_str())
    }

    /// The libstdc++ header directory, `include/c++/<version>`.
    ///
    /// The newest version directory wins. Without one, the `c++` directory
    /// itself is returned; `None` means the target has no C++ headers at all.
    pub fn cxx_abi_include(&self, target: &Triplet) -> Option<PathBuf> {
        let cxx = self.include_dir(target).join("c++");
        if !cxx.is_dir() {
            return None;
        }
        let versioned = entries(&cxx).into_iter().rev().find(|dir| {
            let name = file_name(dir).as_bytes();
            name.len() >= 2 && name[0].is_ascii_digit() && name[1].is_ascii_digit()
        });
        Some(versioned.unwrap_or(cxx))
    }
}

/// GCC toolchains whose runtimes seed the sysroot, with the target each provides.
///
/// Every hosted cross toolchain running on `build`, plus the windows-hosted
/// toolchain targeting `build` itself: the native toolchain keeps its C
/// library in the system root, so it has nothing to contribute.
pub fn sysroot_donors(build: &Triplet, prefix_dir: &Path) -> Vec<(Triplet, GccLayout)> {
    let mut specs: Vec<ToolchainSpec> = supported_targets()
        .into_iter()
        .filter(|target| target != build && !target.is_freestanding())
        .map(|target| ToolchainSpec::cross(build.clone(), target))
        .collect();
    if build.is_linux() {
        if let Ok(windows) = Triplet::parse("x86_64-w64-mingw32") {
            specs.push(ToolchainSpec::new(build.clone(), windows, build.clone()));
        }
    }
    specs
        .into_iter()
        .map(|spec| {
            let layout = GccLayout::new(&spec, prefix_dir);
            (spec.target, layout)
        })
        .collect()
}

/// Recreate the sysroot from the GCC toolchains installed under `prefix_dir`.
///
/// Toolchains that are not installed are skipped with a warning. Returns the
/// names of the toolchains that were copied.
pub fn assemble_gcc_sysroot<S: Shell + ?Sized>(
    shell: &S,
    sysroot: &Sysroot,
    build: &Triplet,
    prefix_dir: &Path,
) -> Result<Vec<String>> {
    shell.apply(&FsOp::CreateDir {
        path: sysroot.root().to_path_buf(),
        clean: true,
    })?;
    let mut copied = Vec::new();
    for (target, layout) in sysroot_donors(build, prefix_dir) {
        if !shell.exists(&layout.prefix) {
            warn!("cannot find gcc in {}, skipping it", layout.prefix.display());
            continue;
        }
        info!("copying {} into the sysroot", layout.name);
        for item in entries(&layout.lib_prefix) {
            if SKIPPED_LIB_PREFIX_ITEMS.contains(&file_name(&item)) {
                continue;
            }
            shell.apply(&FsOp::Copy {
                to: sysroot.target_dir(&target).join(file_name(&item)),
                from: item,
            })?;
        }
        copy_libgcc(shell, sysroot, &layout, &target)?;
        copied.push(layout.name);
    }
    Ok(copied)
}

/// Assemble the sysroot unless it already exists.
pub fn ensure_gcc_sysroot<S: Shell + ?Sized>(
    shell: &S,
    sysroot: &Sysroot,
    build: &Triplet,
    prefix_dir: &Path,
) -> Result<()> {
    if shell.exists(sysroot.root()) {
        return Ok(());
    }
    assemble_gcc_sysroot(shell, sysroot, build, prefix_dir).map(|_| ())
}

/// Copy the startup objects, archives and headers of libgcc.
fn copy_libgcc<S: Shell + ?Sized>(
    shell: &S,
    sysroot: &Sysroot,
    layout: &GccLayout,
    target: &Triplet,
) -> Result<()> {
    let root = layout.libgcc_root(target);
    let Some(version) = entries(&root).into_iter().find(|p| p.is_dir()) else {
        warn!("no libgcc directory in {}", root.display());
        return Ok(());
    };
    let dest = sysroot.libgcc_root(target).join(file_name(&version));
    shell.apply(&FsOp::CreateDir {
        path: dest.clone(),
        clean: false,
    })?;
    for item in entries(&version) {
        let name = file_name(&item);
        if name.ends_with(".o") || name.ends_with(".a") || name.ends_with("include") {
            shell.apply(&FsOp::Copy {
                to: dest.join(name),
                from: item,
            })?;
        }
    }
    Ok(())
}

/// Directory name compiler-rt installs its libraries under for `target`.
pub fn compiler_rt_os(target: &Triplet) -> Option<&'static str> {
    match TargetEnv::of(target) {
        Ok(TargetEnv::Linux) => Some("linux"),
        Ok(TargetEnv::WindowsMingw) => Some("windows"),
        _ => None,
    }
}

/// Move the runtimes installed in `install` into the sysroot.
///
/// DLLs from `bin/` and every library in `lib/` land in the target's `lib/`,
/// except compiler-rt, which goes to `compiler_rt_dir/<os>`. The generated
/// `__config_site` header is the only header that is target specific.
pub fn harvest_runtimes<S: Shell + ?Sized>(
    shell: &S,
    sysroot: &Sysroot,
    install: &Path,
    target: &Triplet,
    compiler_rt_dir: &Path,
) -> Result<()> {
    let lib_dir = sysroot.lib_dir(target);
    for dll in entries(&install.join("bin")) {
        if file_name(&dll).ends_with("dll") {
            shell.apply(&FsOp::Copy {
                to: lib_dir.join(file_name(&dll)),
                from: dll,
            })?;
        }
    }

    let rt_os = compiler_rt_os(target);
    for item in entries(&install.join("lib")) {
        let name = file_name(&item);
        if Some(name) == rt_os {
            let rt_dir = compiler_rt_dir.join(name);
            shell.apply(&FsOp::CreateDir {
                path: rt_dir.clone(),
                clean: false,
            })?;
            for file in entries(&item) {
                shell.apply(&FsOp::Copy {
                    to: rt_dir.join(file_name(&file)),
                    from: file,
                })?;
            }
            continue;
        }
        shell.apply(&FsOp::Copy {
            to: lib_dir.join(name),
            from: item.clone(),
        })?;
    }

    let config_site = install.join("include/c++/v1/__config_site");
    if shell.exists(&config_site) {
        shell.apply(&FsOp::Copy {
            from: config_site,
            to: sysroot.include_dir(target).join("__config_site"),
        })?;
    }
    Ok(())
}
