//! The build plan for one GCC toolchain, as data.
//!
//! A [`ToolchainBuildPlan`] is computed from a [`ToolchainSpec`] and the
//! [`GccOptions`] without touching the filesystem: the build path, the
//! ordered steps, every configure option set, and the source directories
//! that must exist before anything runs.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use toolchains_triplet::{Category, TargetEnv, ToolchainSpec, Triplet};

use crate::error::{BuildError, Result};
use crate::layout::GccLayout;
use crate::options::GccOptions;
use crate::quirk::{self, ConfigureSet, TargetQuirk};

/// Flags that strip every hosted runtime from a freestanding gcc.
pub const DISABLE_HOSTED: &[&str] = &[
    "--disable-threads",
    "--disable-hosted-libstdcxx",
    "--disable-libstdcxx-verbose",
    "--disable-shared",
    "--without-headers",
    "--disable-libvtv",
    "--disable-libsanitizer",
    "--disable-libssp",
    "--disable-libquadmath",
    "--disable-libgomp",
];

/// Shared runtime install targets added after `install-strip`.
pub const RUNTIME_INSTALL_TARGETS: &[&str] = &[
    "install-target-libgcc",
    "install-target-libstdc++-v3",
    "install-target-libatomic",
    "install-target-libquadmath",
    "install-target-libgomp",
];

/// Linux targets a windows-hosted toolchain can still build from scratch.
const WINDOWS_HOSTED_FULL_ARCHES: &[&str] = &["x86_64", "i686", "arm"];

/// How much of the toolchain is built from source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildPath {
    /// Binutils, gcc, and the target C library are all built here.
    Full,
    /// Only the host tools are built; the target runtime is copied from a donor.
    Partial,
    /// No hosted C library exists for the target.
    Freestanding,
}

impl BuildPath {
    pub fn of(spec: &ToolchainSpec) -> Result<Self> {
        let host_env = spec.host_env()?;
        let target_env = spec.target_env()?;
        Ok(match (host_env, target_env) {
            (TargetEnv::Freestanding, _) => {
                return Err(BuildError::Unsupported {
                    detail: format!("host {} has no operating system", spec.host),
                })
            }
            (_, TargetEnv::Freestanding) => BuildPath::Freestanding,
            (TargetEnv::Linux, _) => BuildPath::Full,
            (TargetEnv::WindowsMingw, TargetEnv::Linux)
                if WINDOWS_HOSTED_FULL_ARCHES.contains(&spec.target.arch()) =>
            {
                BuildPath::Full
            }
            _ => BuildPath::Partial,
        })
    }
}

impl fmt::Display for BuildPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuildPath::Full => "full",
            BuildPath::Partial => "partial",
            BuildPath::Freestanding => "freestanding",
        })
    }
}

/// Which parts of gcc one pass builds and installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GccPass {
    /// The compiler proper, without any target library.
    Frontend,
    /// The compiler plus libgcc, enough to build a C runtime.
    FrontendLibgcc,
    /// Everything. With `runtimes`, the shared runtime libraries are installed explicitly.
    Full { runtimes: bool },
}

impl GccPass {
    /// `make` targets for the build.
    pub fn build_targets(self) -> Vec<&'static str> {
        match self {
            GccPass::Frontend => vec!["all-gcc"],
            GccPass::FrontendLibgcc => vec!["all-gcc", "all-target-libgcc"],
            GccPass::Full { .. } => Vec::new(),
        }
    }

    /// `make` invocations for the install, in order.
    pub fn install_runs(self) -> Vec<Vec<&'static str>> {
        match self {
            GccPass::Frontend => vec![vec!["install-strip-gcc"]],
            GccPass::FrontendLibgcc => vec![vec!["install-strip-gcc", "install-strip-target-libgcc"]],
            GccPass::Full { runtimes: false } => vec![vec!["install-strip"]],
            GccPass::Full { runtimes: true } => {
                vec![vec!["install-strip"], RUNTIME_INSTALL_TARGETS.to_vec()]
            }
        }
    }
}

/// One state of the GCC build state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GccStep {
    /// Static gmp, expat, iconv, mpfr and `libpython.a` for a windows-hosted gdb.
    GdbPrerequisites,
    Binutils,
    Gcc(GccPass),
    /// mingw-w64 configured `--without-crt`, headers only.
    MingwHeaders,
    KernelHeaders,
    /// glibc headers plus the empty `gnu/stubs.h` placeholder.
    LibcHeaders,
    /// Re-enter the gcc build directory and build libgcc alone.
    Libgcc,
    /// Full glibc, then the post-install adjustments.
    Libc,
    /// Full mingw-w64, then the transient multilib links.
    MingwRuntime,
    RemoveMultilibLinks,
    Newlib,
    StripDebugSymbols,
    Gdbserver,
    /// Remove DLLs the gcc install dropped into `bin/`.
    RemoveHostDlls,
    /// Copy the target runtime tree from the donor toolchain.
    CopyForward,
    Pexports,
    /// Copy the DSOs gdb needs from the toolchain that produced this host's binaries.
    HostRuntime,
    PrettyPrinter,
    Package,
}

impl fmt::Display for GccStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GccStep::GdbPrerequisites => f.write_str("gdb prerequisites"),
            GccStep::Binutils => f.write_str("binutils"),
            GccStep::Gcc(GccPass::Frontend) => f.write_str("gcc (compiler only)"),
            GccStep::Gcc(GccPass::FrontendLibgcc) => f.write_str("gcc (compiler and libgcc)"),
            GccStep::Gcc(GccPass::Full { .. }) => f.write_str("gcc"),
            GccStep::MingwHeaders => f.write_str("mingw-w64 headers"),
            GccStep::KernelHeaders => f.write_str("linux headers"),
            GccStep::LibcHeaders => f.write_str("glibc headers"),
            GccStep::Libgcc => f.write_str("libgcc"),
            GccStep::Libc => f.write_str("glibc"),
            GccStep::MingwRuntime => f.write_str("mingw-w64"),
            GccStep::RemoveMultilibLinks => f.write_str("remove multilib links"),
            GccStep::Newlib => f.write_str("newlib"),
            GccStep::StripDebugSymbols => f.write_str("split debug symbols"),
            GccStep::Gdbserver => f.write_str("gdbserver"),
            GccStep::RemoveHostDlls => f.write_str("remove host dlls"),
            GccStep::CopyForward => f.write_str("copy runtime from donor"),
            GccStep::Pexports => f.write_str("pexports"),
            GccStep::HostRuntime => f.write_str("copy host runtime"),
            GccStep::PrettyPrinter => f.write_str("copy pretty printer"),
            GccStep::Package => f.write_str("package"),
        }
    }
}

/// A source directory that must exist before the build starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredSource {
    pub component: String,
    pub path: PathBuf,
}

/// Everything a GCC build will do, computed up front.
#[derive(Debug, Clone)]
pub struct ToolchainBuildPlan {
    pub spec: ToolchainSpec,
    pub options: GccOptions,
    pub host_env: TargetEnv,
    pub target_env: TargetEnv,
    pub path: BuildPath,
    pub layout: GccLayout,
    pub quirk: Option<TargetQuirk>,
    /// Options shared by every autotools project built for this toolchain.
    pub basic_options: Vec<String>,
    /// gcc and C library options, after the target quirk is applied.
    pub configure: ConfigureSet,
    pub steps: Vec<GccStep>,
    pub sources: Vec<RequiredSource>,
}

impl ToolchainBuildPlan {
    pub fn new(spec: ToolchainSpec, options: &GccOptions) -> Result<Self> {
        let host_env = spec.host_env()?;
        let target_env = spec.target_env()?;
        let path = BuildPath::of(&spec)?;
        let layout = GccLayout::new(&spec, &options.prefix_dir);

        let mut plan = Self {
            spec,
            options: options.clone(),
            host_env,
            target_env,
            path,
            layout,
            quirk: None,
            basic_options: Vec::new(),
            configure: ConfigureSet::default(),
            steps: Vec::new(),
            sources: Vec::new(),
        };
        plan.basic_options = plan.compute_basic_options();
        plan.configure = ConfigureSet {
            gcc: plan.compute_gcc_options(),
            libc: plan.compute_libc_options(),
            ldscript_arch: plan.spec.target.arch().to_string(),
        };
        plan.quirk = quirk::patch(&plan.spec.target, &mut plan.configure);
        plan.steps = plan.compute_steps();
        plan.sources = plan.compute_sources();
        Ok(plan)
    }

    pub fn category(&self) -> Category {
        self.spec.category()
    }

    pub fn is_windows_host(&self) -> bool {
        self.host_env == TargetEnv::WindowsMingw
    }

    /// Whether binutils is configured with gdb. Linux-hosted mingw compilers never carry one.
    pub fn builds_gdb(&self) -> bool {
        self.options.gdb && (self.is_windows_host() || self.target_env != TargetEnv::WindowsMingw)
    }

    /// `<home>/<component>`, with the vendor trees substituted for Loongnix.
    pub fn source_dir(&self, component: &str) -> PathBuf {
        let home = &self.options.home;
        let loongnix = self.quirk == Some(TargetQuirk::Loongnix);
        match component {
            "linux" if loongnix => home.join("linux-loongnix"),
            "glibc" if loongnix => home.join("glibc-loongnix"),
            "iconv" => home.join("binutils").join("gdb").join("libiconv"),
            _ => home.join(component),
        }
    }

    /// Directory configure and make run in for `component`.
    pub fn build_dir(&self, component: &str) -> PathBuf {
        match component {
            "expat" => self.options.home.join("expat").join("expat").join("build"),
            _ => self.source_dir(component).join("build"),
        }
    }

    /// Where a static gdb prerequisite is installed.
    pub fn install_dir(&self, component: &str) -> PathBuf {
        self.options.home.join(component).join("install")
    }

    /// `bin/` directories put on PATH before the build, in registration order.
    pub fn path_entries(&self) -> Vec<PathBuf> {
        let prefix_dir = &self.options.prefix_dir;
        let build = &self.spec.build;
        let native = || GccLayout::new(&ToolchainSpec::native(build.clone()), prefix_dir).bin_dir;
        let mut entries = Vec::new();
        match self.category() {
            Category::Native => {}
            Category::Cross => entries.push(native()),
            Category::Canadian => {
                entries.push(native());
                entries.push(GccLayout::for_build(build, &self.spec.host, prefix_dir).bin_dir);
            }
            Category::CanadianCross => {
                entries.push(native());
                entries.push(GccLayout::for_build(build, &self.spec.host, prefix_dir).bin_dir);
                entries.push(GccLayout::for_build(build, &self.spec.target, prefix_dir).bin_dir);
            }
        }
        entries.push(self.layout.bin_dir.clone());
        entries
    }

    /// Cross compilers that must resolve on the registered PATH.
    pub fn required_compilers(&self) -> Vec<String> {
        let mut programs = Vec::new();
        if matches!(self.category(), Category::Canadian | Category::CanadianCross) {
            programs.push(format!("{}-gcc", self.spec.host));
        }
        if self.category() == Category::CanadianCross && self.spec.target != self.spec.build {
            programs.push(format!("{}-gcc", self.spec.target));
        }
        programs
    }

    /// The toolchain built on the build machine for this target.
    pub fn donor(&self) -> GccLayout {
        GccLayout::for_build(&self.spec.build, &self.spec.target, &self.options.prefix_dir)
    }

    /// The toolchain built on the build machine that produces binaries for this host.
    pub fn host_runtime_donor(&self) -> GccLayout {
        GccLayout::for_build(&self.spec.build, &self.spec.host, &self.options.prefix_dir)
    }

    fn compute_basic_options(&self) -> Vec<String> {
        let mut options = vec![
            "--disable-werror".to_string(),
            if self.is_windows_host() { "--disable-nls" } else { "--enable-nls" }.to_string(),
            format!("--prefix={}", self.layout.prefix.display()),
        ];
        if self.spec.is_cross_compiler() {
            options.push(format!("--target={}", self.spec.target));
        }
        if self.spec.host != self.spec.build {
            options.push(format!("--host={}", self.spec.host));
        }
        options
    }

    fn multilib(&self) -> bool {
        let target = &self.spec.target;
        match self.target_env {
            TargetEnv::Linux => self.category() == Category::Native && target.arch() == "x86_64",
            TargetEnv::WindowsMingw => target.arch() == "x86_64",
            TargetEnv::Freestanding => target.arch() == "arm",
        }
    }

    fn compute_gcc_options(&self) -> Vec<String> {
        let mut options = self.basic_options.clone();
        if !self.is_windows_host() {
            options.push("--disable-bootstrap".into());
        }
        options.push(if self.multilib() { "--enable-multilib" } else { "--disable-multilib" }.into());
        options.push("--enable-languages=c,c++".into());
        match self.target_env {
            TargetEnv::WindowsMingw => {
                options.push("--disable-sjlj-exceptions".into());
                options.push("--enable-threads=win32".into());
            }
            TargetEnv::Freestanding => {
                options.extend(DISABLE_HOSTED.iter().map(|s| s.to_string()));
                if self.options.newlib && self.spec.build == self.spec.host {
                    options.push("--with-newlib".into());
                }
            }
            TargetEnv::Linux => {}
        }
        options
    }

    fn compute_libc_options(&self) -> Vec<String> {
        let target = &self.spec.target;
        match self.target_env {
            TargetEnv::Linux => vec![
                format!("--prefix={}", self.layout.lib_prefix.display()),
                format!("--host={target}"),
                format!("--build={}", self.spec.build),
                "--disable-werror".into(),
            ],
            TargetEnv::WindowsMingw => vec![
                format!("--host={target}"),
                format!("--prefix={}", self.layout.lib_prefix.display()),
                "--with-default-msvcrt=ucrt".into(),
            ],
            TargetEnv::Freestanding => Vec::new(),
        }
    }

    fn compute_steps(&self) -> Vec<GccStep> {
        use GccStep::*;

        let gdb = self.options.gdb;
        let windows_gdb = self.is_windows_host() && gdb;
        let mut steps = Vec::new();
        match (self.path, self.host_env, self.target_env) {
            (BuildPath::Full, TargetEnv::Linux, TargetEnv::Linux) if !self.spec.is_cross_compiler() => {
                steps.extend([Gcc(GccPass::Full { runtimes: true }), StripDebugSymbols, Binutils]);
            }
            (BuildPath::Full, TargetEnv::Linux, TargetEnv::Linux) => {
                steps.extend([
                    Binutils,
                    Gcc(GccPass::Frontend),
                    KernelHeaders,
                    LibcHeaders,
                    Libgcc,
                    Libc,
                    Gcc(GccPass::Full { runtimes: false }),
                    StripDebugSymbols,
                ]);
                if self.options.gdbserver {
                    steps.push(Gdbserver);
                }
                if gdb {
                    steps.push(HostRuntime);
                }
            }
            (BuildPath::Full, TargetEnv::Linux, TargetEnv::WindowsMingw) => {
                steps.extend([
                    Binutils,
                    MingwHeaders,
                    Gcc(GccPass::FrontendLibgcc),
                    MingwRuntime,
                    Gcc(GccPass::Full { runtimes: true }),
                    RemoveMultilibLinks,
                    StripDebugSymbols,
                ]);
            }
            (BuildPath::Full, _, _) => {
                if windows_gdb {
                    steps.push(GdbPrerequisites);
                }
                steps.extend([Binutils, Gcc(GccPass::Full { runtimes: false })]);
                if self.options.gdbserver {
                    steps.push(Gdbserver);
                }
                steps.extend([KernelHeaders, Libc, HostRuntime]);
            }
            (BuildPath::Freestanding, _, _) => {
                if windows_gdb {
                    steps.push(GdbPrerequisites);
                }
                steps.push(Binutils);
                let full = Gcc(GccPass::Full { runtimes: true });
                match (self.options.newlib, self.spec.build == self.spec.host) {
                    (true, true) => steps.extend([Gcc(GccPass::Frontend), Newlib, full]),
                    (true, false) => steps.extend([full, Newlib]),
                    (false, _) => steps.push(full),
                }
                if gdb {
                    steps.extend([HostRuntime, PrettyPrinter]);
                }
            }
            (BuildPath::Partial, _, target_env) => {
                let mingw = target_env == TargetEnv::WindowsMingw;
                if windows_gdb {
                    steps.push(GdbPrerequisites);
                }
                steps.extend([Binutils, Gcc(GccPass::Frontend)]);
                if mingw {
                    steps.push(RemoveHostDlls);
                }
                steps.push(CopyForward);
                if mingw {
                    steps.push(Pexports);
                }
                steps.push(HostRuntime);
            }
        }
        steps.push(Package);
        steps
    }

    fn compute_sources(&self) -> Vec<RequiredSource> {
        let mut names = vec!["gcc", "binutils"];
        match (self.path, self.target_env) {
            (BuildPath::Full, TargetEnv::Linux) => names.extend(["linux", "glibc"]),
            (BuildPath::Full, TargetEnv::WindowsMingw) => names.push("mingw"),
            (BuildPath::Freestanding, _) if self.options.newlib => names.push("newlib"),
            (BuildPath::Partial, TargetEnv::WindowsMingw) => names.push("pexports"),
            _ => {}
        }
        if self.is_windows_host() && self.options.gdb {
            names.extend(["expat", "gmp", "mpfr", "iconv", "python-embed"]);
        }
        names
            .into_iter()
            .map(|name| RequiredSource {
                component: name.to_string(),
                path: self.source_dir(name),
            })
            .collect()
    }
}

/// The kernel `ARCH=` value for a linux target.
pub fn kernel_arch(target: &Triplet) -> Result<&'static str> {
    Ok(match target.arch() {
        "x86_64" | "i686" => "x86",
        "aarch64" => "arm64",
        "arm" => "arm",
        "riscv64" => "riscv",
        "loongarch64" => "loongarch",
        other => {
            return Err(BuildError::Unsupported {
                detail: format!("no kernel architecture for {other}"),
            })
        }
    })
}
