//! Runs the stages of a [`BootstrapBuildPlan`].

use std::path::{Path, PathBuf};

use log::{info, warn};
use toolchains_shell::{FsOp, Shell};
use toolchains_triplet::Triplet;

use crate::context::BuildContext;
use crate::error::{BuildError, Result};
use crate::layout::{entries, file_name};
use crate::llvm::cmake::{self, CmakeOptions, Machines};
use crate::llvm::plan::{BootstrapBuildPlan, Project};
use crate::llvm::state::{BootstrapState, StartAt, Stage};
use crate::package;
use crate::sysroot;

/// Runs one LLVM build against a [`Shell`].
pub struct Bootstrapper<'a, S: Shell + ?Sized> {
    shell: &'a S,
    plan: &'a BootstrapBuildPlan,
}

impl<'a, S: Shell + ?Sized> Bootstrapper<'a, S> {
    pub fn new(shell: &'a S, plan: &'a BootstrapBuildPlan) -> Self {
        Self { shell, plan }
    }

    /// Check sources, then either bootstrap or run the single canadian pass.
    pub fn build(&self, ctx: BuildContext, start: StartAt) -> Result<BuildContext> {
        for source in &self.plan.sources {
            if !self.shell.exists(&source.path) {
                return Err(BuildError::MissingSource {
                    component: source.component.clone(),
                    path: source.path.clone(),
                });
            }
        }
        if self.plan.is_canadian() {
            self.canadian(ctx, start)
        } else {
            self.bootstrap(ctx, start)
        }
    }

    fn bootstrap(&self, ctx: BuildContext, start: StartAt) -> Result<BuildContext> {
        let plan = self.plan;
        let state_path = plan.state_path();
        let mut state = BootstrapState::load(&state_path)?;
        let Some(first) = state.start(start) else {
            info!("{} is already bootstrapped", plan.name);
            return Ok(ctx);
        };
        let mut ctx = ctx.register(plan.final_prefix().join("bin"));
        for stage in first.remaining() {
            info!("{}: {stage}", plan.name);
            ctx = self.run_stage(stage, ctx)?;
            state.record(stage, &plan.prefix(stage));
            state.save(self.shell, &state_path)?;
        }
        Ok(ctx)
    }

    fn run_stage(&self, stage: Stage, ctx: BuildContext) -> Result<BuildContext> {
        let plan = self.plan;
        match stage {
            Stage::Bootstrap => {
                sysroot::ensure_gcc_sysroot(
                    self.shell,
                    &plan.sysroot,
                    &plan.options.build,
                    &plan.options.gcc_prefix_dir,
                )?;
                let options = cmake::dylib().merge(&cmake::stage1());
                self.compiler(&ctx, Stage::Bootstrap, &[], &options)?;
                self.runtimes(&ctx, Stage::Bootstrap)?;
                Ok(ctx)
            }
            Stage::Compiler => {
                let options = cmake::dylib().merge(&cmake::stage2());
                self.compiler(&ctx, Stage::Compiler, cmake::LLVM_RUNTIME_FLAGS, &options)?;
                Ok(ctx)
            }
            Stage::Runtimes => {
                let ctx = ctx.register(plan.new_prefix().join("bin"));
                self.runtimes(&ctx, Stage::Runtimes)?;
                Ok(ctx)
            }
            Stage::Install => {
                self.swap_installs()?;
                self.package(&ctx)?;
                Ok(ctx)
            }
        }
    }

    fn missing(&self, what: &str, path: &Path) -> Result<()> {
        if self.shell.dry_run() {
            warn!("{what} not found at {}, continuing the dry run", path.display());
            return Ok(());
        }
        Err(BuildError::MissingArtifact {
            what: what.to_string(),
            path: path.to_path_buf(),
        })
    }

    fn require(&self, what: &str, path: &Path) -> Result<bool> {
        if self.shell.exists(path) {
            return Ok(true);
        }
        self.missing(what, path)?;
        Ok(false)
    }

    /// `cmake -G Ninja` into a fresh build directory.
    fn configure(
        &self,
        ctx: &BuildContext,
        project: Project,
        prefix: &Path,
        target: &Triplet,
        flags: &[&str],
        options: &CmakeOptions,
    ) -> Result<()> {
        let plan = self.plan;
        let build_dir = plan.build_dir(project);
        self.shell.apply(&FsOp::CreateDir {
            path: build_dir.clone(),
            clean: true,
        })?;
        let machines = Machines {
            build: &plan.options.build,
            host: &plan.options.host,
            target,
        };
        let compiler = cmake::compiler(machines, plan.sysroot.root(), flags)?;
        let command = ctx
            .command("cmake")
            .args(["-G", "Ninja", "--install-prefix"])
            .path_arg(prefix)
            .arg("-B")
            .path_arg(&build_dir)
            .arg("-S")
            .path_arg(&plan.source_dir(project))
            .args(compiler.to_args())
            .args(options.to_args());
        self.shell.exec(&command)?;
        Ok(())
    }

    fn ninja(&self, ctx: &BuildContext, project: Project, target: Option<&str>) -> Result<()> {
        let mut command = ctx
            .command("ninja")
            .arg("-C")
            .path_arg(&self.plan.build_dir(project));
        if let Some(target) = target {
            command = command.arg(target);
        }
        let command = command.arg(format!("-j{}", self.plan.options.jobs));
        self.shell.exec(&command)?;
        Ok(())
    }

    fn make_and_install(&self, ctx: &BuildContext, project: Project) -> Result<()> {
        self.ninja(ctx, project, None)?;
        self.ninja(ctx, project, Some("install/strip"))
    }

    fn compiler(&self, ctx: &BuildContext, stage: Stage, flags: &[&str], options: &CmakeOptions) -> Result<()> {
        let host = &self.plan.options.host;
        self.configure(ctx, Project::Llvm, &self.plan.prefix(stage), host, flags, options)?;
        self.make_and_install(ctx, Project::Llvm)
    }

    /// libstdc++ headers the windows runtimes take their C++ ABI from.
    fn abi_include(&self, target: &Triplet) -> Result<PathBuf> {
        let sysroot = &self.plan.sysroot;
        if let Some(dir) = sysroot.cxx_abi_include(target) {
            return Ok(dir);
        }
        let cxx = sysroot.include_dir(target).join("c++");
        self.missing("libstdc++ headers", &cxx)?;
        Ok(cxx)
    }

    /// Build the runtimes for every target and harvest each into the sysroot.
    fn runtimes(&self, ctx: &BuildContext, stage: Stage) -> Result<()> {
        let plan = self.plan;
        let install = plan.runtimes_prefix(stage);
        let compiler_rt_dir = BootstrapBuildPlan::compiler_rt_dir(&plan.prefix(stage));
        // Resolve every target's options before the first runtime build starts.
        let mut builds = Vec::new();
        for target in &plan.runtime_targets {
            let abi_include = if target.is_mingw() {
                self.abi_include(target)?
            } else {
                PathBuf::new()
            };
            let options = match stage {
                Stage::Bootstrap => cmake::stage1_runtimes(target, &abi_include),
                _ => cmake::stage3_runtimes(target, &abi_include),
            };
            builds.push((target, options));
        }
        for (target, options) in builds {
            info!("{}: runtimes for {target}", plan.name);
            self.shell.apply(&FsOp::Remove { path: install.clone() })?;
            self.configure(ctx, Project::Runtimes, &install, target, &[], &options)?;
            self.make_and_install(ctx, Project::Runtimes)?;
            if self.require("runtimes install", &install)? {
                sysroot::harvest_runtimes(self.shell, &plan.sysroot, &install, target, &compiler_rt_dir)?;
            }
        }
        Ok(())
    }

    /// `<name>` becomes `<name>-old` and `<name>-new` becomes `<name>`.
    fn swap_installs(&self) -> Result<()> {
        let plan = self.plan;
        let old = plan.old_prefix();
        if self.shell.exists(&old) {
            if self.shell.dry_run() {
                warn!("{} already exists, the install stage would stop here", old.display());
                return Ok(());
            }
            return Err(BuildError::InvalidOption {
                detail: format!(
                    "{} is left from an earlier install, remove it before installing {}",
                    old.display(),
                    plan.name
                ),
            });
        }
        let current = plan.final_prefix();
        let new = plan.new_prefix();
        if !self.require("stage-1 toolchain", &current)? || !self.require("stage-2 toolchain", &new)? {
            return Ok(());
        }
        self.shell.apply(&FsOp::Rename {
            from: current.clone(),
            to: old,
        })?;
        self.shell.apply(&FsOp::Rename { from: new, to: current })?;
        Ok(())
    }

    fn package(&self, ctx: &BuildContext) -> Result<()> {
        let plan = self.plan;
        package::install_readme(
            self.shell,
            &plan.options.data_dir,
            &plan.name_without_version,
            &plan.final_prefix(),
        )?;
        package::compress(self.shell, ctx, &plan.options.home, &plan.name)
    }

    /// Host libraries, one LLVM pass with the build machine's clang, then the
    /// runtime libraries the toolchain ships with.
    fn canadian(&self, ctx: BuildContext, start: StartAt) -> Result<BuildContext> {
        let plan = self.plan;
        if let StartAt::Stage(stage) = start {
            if stage != Stage::Bootstrap {
                return Err(BuildError::InvalidOption {
                    detail: format!("{} runs on another machine and cannot bootstrap", plan.name),
                });
            }
        }
        let ctx = ctx.register(plan.native_prefix().join("bin"));
        if ctx.which("clang").is_none() {
            let err = BuildError::NotOnPath {
                program: "clang".into(),
                required_by: plan.name.clone(),
            };
            if !self.shell.dry_run() {
                return Err(err);
            }
            warn!("{err}");
        }

        let host = &plan.options.host;
        let lib_flags: Vec<&str> = cmake::LLVM_RUNTIME_FLAGS
            .iter()
            .chain(cmake::WINDOWS_LIB_FLAGS)
            .copied()
            .collect();
        for lib in [Project::Zlib, Project::Libxml2] {
            info!("{}: {lib}", plan.name);
            let prefix = plan.library_prefix(lib);
            self.configure(&ctx, lib, &prefix, host, &lib_flags, &cmake::host_libraries())?;
            self.make_and_install(&ctx, lib)?;
        }

        info!("{}: llvm", plan.name);
        let options = cmake::dylib().merge(&cmake::stage1()).merge(&cmake::canadian(
            &plan.library_prefix(Project::Zlib),
            &plan.library_prefix(Project::Libxml2),
            &plan.native_tool_dir(),
        ));
        self.compiler(&ctx, Stage::Bootstrap, cmake::LLVM_RUNTIME_FLAGS, &options)?;
        self.copy_llvm_libs()?;
        self.shell.apply(&FsOp::Remove {
            path: plan.build_dir(Project::Llvm),
        })?;
        self.package(&ctx)?;
        Ok(ctx)
    }

    /// Ship the C++ runtime DLLs, the shared libc++ headers, compiler-rt and
    /// libxml2 inside the canadian toolchain.
    fn copy_llvm_libs(&self) -> Result<()> {
        let plan = self.plan;
        let prefix = plan.final_prefix();
        let lib_dir = prefix.join("lib");
        for file in entries(&plan.sysroot.lib_dir(&plan.options.host)) {
            let name = file_name(&file);
            if (name.starts_with("libc++") || name.starts_with("libunwind")) && !name.ends_with(".a") {
                self.shell.apply(&FsOp::Copy {
                    to: lib_dir.join(name),
                    from: file.clone(),
                })?;
            }
        }

        let native = plan.native_prefix();
        let copies = [
            (
                "libc++ headers",
                native.join("include/c++/v1"),
                prefix.join("include/c++/v1"),
            ),
            (
                "compiler-rt",
                BootstrapBuildPlan::compiler_rt_dir(&native),
                BootstrapBuildPlan::compiler_rt_dir(&prefix),
            ),
            (
                "libxml2",
                plan.library_prefix(Project::Libxml2).join("bin/libxml2.dll"),
                lib_dir.join("libxml2.dll"),
            ),
        ];
        for (what, from, to) in copies {
            if self.require(what, &from)? {
                self.shell.apply(&FsOp::Copy { from, to })?;
            }
        }
        Ok(())
    }
}
