//! Executes a [`ToolchainBuildPlan`] step by step.

use std::path::{Path, PathBuf};

use log::{info, warn};
use toolchains_shell::{FsOp, RunOptions, Shell};
use toolchains_triplet::{ToolchainSpec, TargetEnv};

use crate::context::BuildContext;
use crate::error::{BuildError, Result};
use crate::gcc::plan::{kernel_arch, BuildPath, GccPass, GccStep, ToolchainBuildPlan};
use crate::layout::{debug_split_dsos, entries, file_name, GccLayout};
use crate::package;

/// C library subtrees a cross toolchain does not ship.
const UNUSED_GLIBC_DIRS: &[&str] = &["etc", "libexec", "sbin", "share", "var", "lib/gconv", "lib/audit"];

/// Static libraries a windows-hosted gdb links against, in build order.
const GDB_PREREQUISITES: &[&str] = &["gmp", "expat", "iconv", "mpfr"];

const LINUX_HOST_RUNTIME: &[&str] = &["libstdc++.so.6", "libgcc_s.so.1"];
const WINDOWS_HOST_RUNTIME: &[&str] = &["libstdc++-6.dll", "libgcc_s_seh-1.dll"];

const LIMITS_FIX: &str = "#undef MB_LEN_MAX\n#define MB_LEN_MAX 16\n";

/// Runs the steps of one GCC build against a [`Shell`].
pub struct GccBuilder<'a, S: Shell + ?Sized> {
    shell: &'a S,
    plan: &'a ToolchainBuildPlan,
    /// Links created for the final gcc pass of a multilib mingw build.
    multilib_links: Vec<PathBuf>,
}

impl<'a, S: Shell + ?Sized> GccBuilder<'a, S> {
    pub fn new(shell: &'a S, plan: &'a ToolchainBuildPlan) -> Self {
        Self {
            shell,
            plan,
            multilib_links: Vec::new(),
        }
    }

    /// Check preconditions, register the PATH, then run every step in order.
    pub fn build(&mut self, ctx: BuildContext) -> Result<BuildContext> {
        self.check_sources()?;
        let mut ctx = self.register_path(ctx)?;
        let plan = self.plan;
        for step in &plan.steps {
            info!("{}: {step}", plan.layout.name);
            ctx = self.run_step(*step, ctx)?;
        }
        Ok(ctx)
    }

    fn check_sources(&self) -> Result<()> {
        for source in &self.plan.sources {
            if !self.shell.exists(&source.path) {
                return Err(BuildError::MissingSource {
                    component: source.component.clone(),
                    path: source.path.clone(),
                });
            }
        }
        Ok(())
    }

    fn register_path(&self, ctx: BuildContext) -> Result<BuildContext> {
        let ctx = self
            .plan
            .path_entries()
            .into_iter()
            .fold(ctx, |ctx, bin| ctx.register(bin));
        for program in self.plan.required_compilers() {
            if ctx.which(&program).is_some() {
                continue;
            }
            let err = BuildError::NotOnPath {
                program,
                required_by: self.plan.layout.name.clone(),
            };
            if !self.shell.dry_run() {
                return Err(err);
            }
            warn!("{err}");
        }
        Ok(ctx)
    }

    fn run_step(&mut self, step: GccStep, ctx: BuildContext) -> Result<BuildContext> {
        match step {
            GccStep::GdbPrerequisites => self.gdb_prerequisites(ctx),
            GccStep::Binutils => self.binutils(ctx),
            GccStep::Gcc(pass) => self.gcc(ctx, pass),
            GccStep::MingwHeaders => self.mingw(ctx, true),
            GccStep::KernelHeaders => self.kernel_headers(ctx),
            GccStep::LibcHeaders => self.glibc_headers(ctx),
            GccStep::Libgcc => self.libgcc(ctx),
            GccStep::Libc => self.glibc(ctx),
            GccStep::MingwRuntime => {
                let ctx = self.mingw(ctx, false)?;
                self.link_multilib()?;
                Ok(ctx)
            }
            GccStep::RemoveMultilibLinks => {
                for link in std::mem::take(&mut self.multilib_links) {
                    self.shell.apply(&FsOp::Remove { path: link })?;
                }
                Ok(ctx)
            }
            GccStep::Newlib => self.newlib(ctx),
            GccStep::StripDebugSymbols => {
                self.strip_debug_symbols(&ctx)?;
                Ok(ctx)
            }
            GccStep::Gdbserver => self.gdbserver(ctx),
            GccStep::RemoveHostDlls => {
                for dll in entries(&self.plan.layout.bin_dir) {
                    if file_name(&dll).ends_with(".dll") {
                        self.shell.apply(&FsOp::Remove { path: dll })?;
                    }
                }
                Ok(ctx)
            }
            GccStep::CopyForward => {
                self.copy_forward()?;
                Ok(ctx)
            }
            GccStep::Pexports => self.pexports(ctx),
            GccStep::HostRuntime => {
                self.copy_host_runtime()?;
                Ok(ctx)
            }
            GccStep::PrettyPrinter => {
                self.copy_pretty_printer()?;
                Ok(ctx)
            }
            GccStep::Package => {
                self.package(&ctx)?;
                Ok(ctx)
            }
        }
    }

    // Artifacts from earlier builds are hard requirements, except in a dry run
    // where the earlier build was only echoed.
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

    fn enter_build_dir(&self, ctx: BuildContext, component: &str, clean: bool) -> Result<BuildContext> {
        let dir = self.plan.build_dir(component);
        self.shell.apply(&FsOp::CreateDir { path: dir.clone(), clean })?;
        Ok(ctx.enter(dir))
    }

    fn configure(&self, ctx: &BuildContext, options: &[String]) -> Result<()> {
        self.shell.exec(&ctx.command("../configure").args(options))?;
        Ok(())
    }

    fn make(&self, ctx: &BuildContext, targets: &[&str]) -> Result<()> {
        let command = ctx
            .command("make")
            .args(targets.iter().copied())
            .arg("-j")
            .arg(self.plan.options.jobs.to_string());
        self.shell.exec(&command)?;
        Ok(())
    }

    /// configure, make, `make install-strip` in a fresh build directory.
    fn autotools(&self, ctx: BuildContext, component: &str, options: &[String]) -> Result<BuildContext> {
        let ctx = self.enter_build_dir(ctx, component, true)?;
        self.configure(&ctx, options)?;
        self.make(&ctx, &[])?;
        self.make(&ctx, &["install-strip"])?;
        Ok(ctx)
    }

    fn binutils(&self, ctx: BuildContext) -> Result<BuildContext> {
        let plan = self.plan;
        let layout = &plan.layout;
        let linux_host = !plan.is_windows_host();
        let ctx = self.enter_build_dir(ctx, "binutils", true)?;

        let mut command = ctx.command("../configure").args(&plan.basic_options);
        if !plan.builds_gdb() {
            command = command.arg("--disable-gdb");
        } else if linux_host {
            command = command
                .arg(format!("--with-system-gdbinit={}", layout.gdbinit_path.display()))
                .arg(format!("LDFLAGS={}", layout.rpath_option))
                .env("ORIGIN", "$$ORIGIN");
        } else {
            command = command
                .args(self.gdb_requirement_options())
                .arg(format!("--with-system-gdbinit={}", layout.gdbinit_path.display()))
                .arg(format!(
                    "--with-python={}",
                    plan.options.data_dir.join("python_config.sh").display()
                ))
                .arg("CXXFLAGS=-D_WIN32_WINNT=0x0600")
                .arg("--disable-gdbserver")
                .env("PYTHON_EMBED_PACKAGE", plan.source_dir("python-embed"));
        }
        if linux_host && plan.spec.is_cross_compiler() && plan.target_env == TargetEnv::Linux {
            command = command.arg("--disable-gdbserver");
        }
        if linux_host && (!plan.spec.is_cross_compiler() || plan.path == BuildPath::Freestanding) {
            command = command.arg("--enable-gold");
        }
        self.shell.exec(&command)?;
        self.make(&ctx, &[])?;
        self.make(&ctx, &["install-strip"])?;
        Ok(ctx)
    }

    fn gdb_requirement_options(&self) -> Vec<String> {
        let install = |lib: &str| self.plan.install_dir(lib).display().to_string();
        vec![
            "--with-expat".to_string(),
            format!("--with-gmp={}", install("gmp")),
            format!("--with-mpfr={}", install("mpfr")),
            format!("--with-libexpat-prefix={}", install("expat")),
            format!("--with-libiconv-prefix={}", install("iconv")),
        ]
    }

    fn gdb_prerequisites(&self, ctx: BuildContext) -> Result<BuildContext> {
        self.build_libpython(&ctx)?;
        let host = &self.plan.spec.host;
        let mut ctx = ctx;
        for lib in GDB_PREREQUISITES {
            let mut options = vec![
                format!("--host={host}"),
                "--disable-shared".to_string(),
                format!("--prefix={}", self.plan.install_dir(lib).display()),
            ];
            if *lib == "mpfr" {
                options.push(format!("--with-gmp={}", self.plan.install_dir("gmp").display()));
            }
            ctx = self.autotools(ctx, lib, &options)?;
        }
        Ok(ctx)
    }

    /// Create `libpython.a` from the embeddable interpreter's DLL.
    fn build_libpython(&self, ctx: &BuildContext) -> Result<()> {
        let embed = self.plan.source_dir("python-embed");
        let lib = embed.join("libpython.a");
        if self.shell.exists(&lib) {
            return Ok(());
        }
        let dlls: Vec<PathBuf> = entries(&embed)
            .into_iter()
            .filter(|p| {
                let name = file_name(p);
                name.starts_with("python") && name.ends_with(".dll")
            })
            .collect();
        let dll = match dlls.as_slice() {
            [] => return self.missing("python*.dll", &embed),
            [dll] => dll,
            _ => {
                return Err(BuildError::Unsupported {
                    detail: format!("more than one python*.dll in {}", embed.display()),
                })
            }
        };
        let def = embed.join("libpython.def");
        let host = &self.plan.spec.host;
        self.shell.exec(&ctx.script(format!(
            "{host}-pexports {} > {}",
            dll.display(),
            def.display()
        )))?;
        self.shell.exec(
            &ctx.command(format!("{host}-dlltool"))
                .arg("-D")
                .path_arg(dll)
                .arg("-d")
                .path_arg(&def)
                .arg("-l")
                .path_arg(&lib),
        )?;
        Ok(())
    }

    fn gcc(&self, ctx: BuildContext, pass: GccPass) -> Result<BuildContext> {
        let ctx = self.enter_build_dir(ctx, "gcc", true)?;
        let mut options = self.plan.configure.gcc.clone();
        if self.plan.path == BuildPath::Full && matches!(pass, GccPass::Frontend | GccPass::FrontendLibgcc) {
            options.push("--disable-shared".into());
        }
        self.configure(&ctx, &options)?;
        self.make(&ctx, &pass.build_targets())?;
        for targets in pass.install_runs() {
            self.make(&ctx, &targets)?;
        }
        Ok(ctx)
    }

    fn kernel_headers(&self, ctx: BuildContext) -> Result<BuildContext> {
        let arch = kernel_arch(&self.plan.spec.target)?;
        let ctx = ctx.enter(self.plan.source_dir("linux"));
        let arch = format!("ARCH={arch}");
        let install = format!("INSTALL_HDR_PATH={}", self.plan.layout.lib_prefix.display());
        self.make(&ctx, &[arch.as_str(), install.as_str(), "headers_install"])?;
        Ok(ctx)
    }

    fn glibc_headers(&self, ctx: BuildContext) -> Result<BuildContext> {
        let ctx = self.enter_build_dir(ctx, "glibc", true)?;
        let mut options = self.plan.configure.libc.clone();
        options.push("libc_cv_forced_unwind=yes".into());
        self.configure(&ctx, &options)?;
        self.make(&ctx, &["install-headers"])?;
        // libgcc only checks that the header exists.
        self.shell.apply(&FsOp::WriteFile {
            path: self.plan.layout.lib_prefix.join("include/gnu/stubs.h"),
            contents: String::new(),
        })?;
        Ok(ctx)
    }

    fn libgcc(&self, ctx: BuildContext) -> Result<BuildContext> {
        let ctx = self.enter_build_dir(ctx, "gcc", false)?;
        self.make(&ctx, &["all-target-libgcc"])?;
        self.make(&ctx, &["install-target-libgcc"])?;
        Ok(ctx)
    }

    fn glibc(&self, ctx: BuildContext) -> Result<BuildContext> {
        let ctx = self.enter_build_dir(ctx, "glibc", true)?;
        self.configure(&ctx, &self.plan.configure.libc)?;
        self.make(&ctx, &[])?;
        self.make(&ctx, &["install"])?;
        self.adjust_glibc(&ctx)?;
        Ok(ctx)
    }

    fn adjust_glibc(&self, ctx: &BuildContext) -> Result<()> {
        let layout = &self.plan.layout;
        let lib_dir = layout.lib_prefix.join("lib");
        for dir in UNUSED_GLIBC_DIRS {
            self.shell.apply(&FsOp::Remove {
                path: layout.lib_prefix.join(dir),
            })?;
        }
        // Some of the matched files are linker scripts that strip rejects.
        self.shell.run(
            &ctx.script(format!("{}strip {}/*.so", layout.tool_prefix, lib_dir.display())),
            RunOptions::default().ignore_error(),
        )?;

        let prefix = format!("{}-", self.plan.configure.ldscript_arch);
        for script in entries(&self.plan.options.data_dir) {
            let name = file_name(&script);
            let Some(canonical) = name.strip_prefix(&prefix) else {
                continue;
            };
            if canonical.starts_with("lib") {
                self.shell.apply(&FsOp::Copy {
                    to: lib_dir.join(canonical),
                    from: script.clone(),
                })?;
            }
        }
        Ok(())
    }

    fn mingw(&self, ctx: BuildContext, headers_only: bool) -> Result<BuildContext> {
        let ctx = self.enter_build_dir(ctx, "mingw", true)?;
        let mut options = self.plan.configure.libc.clone();
        if headers_only {
            options.push("--without-crt".into());
        }
        self.configure(&ctx, &options)?;
        if !headers_only {
            self.make(&ctx, &[])?;
        }
        self.make(&ctx, &["install"])?;
        Ok(ctx)
    }

    /// Link `lib/<N>` to `../lib<N>` for every numbered library directory.
    fn link_multilib(&mut self) -> Result<()> {
        let lib_prefix = &self.plan.layout.lib_prefix;
        for dir in entries(lib_prefix) {
            let Some(suffix) = file_name(&dir).strip_prefix("lib") else {
                continue;
            };
            if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            let link = lib_prefix.join("lib").join(suffix);
            self.shell.apply(&FsOp::Symlink {
                target: Path::new("..").join(file_name(&dir)),
                link: link.clone(),
            })?;
            self.multilib_links.push(link);
        }
        Ok(())
    }

    fn newlib(&self, ctx: BuildContext) -> Result<BuildContext> {
        let ctx = self.enter_build_dir(ctx, "newlib", true)?;
        let options = [
            format!("--target={}", self.plan.spec.target),
            format!("--prefix={}", self.plan.layout.prefix.display()),
            "--disable-werror".to_string(),
        ];
        self.configure(&ctx, &options)?;
        self.make(&ctx, &[])?;
        self.make(&ctx, &["install"])?;
        Ok(ctx)
    }

    fn strip_debug_symbols(&self, ctx: &BuildContext) -> Result<()> {
        let layout = &self.plan.layout;
        let tool = |name: &str| format!("{}{name}", layout.tool_prefix);
        let dsos = debug_split_dsos(&self.plan.spec.target);
        for dir in entries(&layout.lib_prefix) {
            if !file_name(&dir).starts_with("lib") || !dir.is_dir() {
                continue;
            }
            for dso in dsos {
                let path = dir.join(dso);
                if !self.shell.exists(&path) {
                    continue;
                }
                let symbols = dir.join(format!("{dso}.debug"));
                self.shell.exec(
                    &ctx.command(tool("objcopy"))
                        .arg("--only-keep-debug")
                        .path_arg(&path)
                        .path_arg(&symbols),
                )?;
                self.shell.exec(&ctx.command(tool("strip")).path_arg(&path))?;
                self.shell.exec(
                    &ctx.command(tool("objcopy"))
                        .arg(format!("--add-gnu-debuglink={}", symbols.display()))
                        .path_arg(&path),
                )?;
            }
        }
        Ok(())
    }

    fn gdbserver(&self, ctx: BuildContext) -> Result<BuildContext> {
        let plan = self.plan;
        let target = &plan.spec.target;
        let root = plan.layout.libgcc_root(target);
        match entries(&root).into_iter().find(|p| p.is_dir()) {
            Some(version) => self.shell.apply(&FsOp::AppendFile {
                path: version.join("include").join("limits.h"),
                contents: LIMITS_FIX.to_string(),
            })?,
            None => self.missing("libgcc directory", &root)?,
        }

        let ctx = self.enter_build_dir(ctx, "binutils", true)?;
        let options = [
            "--disable-werror".to_string(),
            format!("--prefix={}", plan.layout.prefix.display()),
            format!("--target={target}"),
            format!("--host={target}"),
            "--disable-gdb".to_string(),
            "--enable-gdbserver".to_string(),
            "--disable-binutils".to_string(),
        ];
        self.configure(&ctx, &options)?;
        self.make(&ctx, &[])?;
        self.make(&ctx, &["install-strip-gdbserver"])?;
        Ok(ctx)
    }

    /// Copy the target runtime of the build machine's cross toolchain into ours.
    fn copy_forward(&self) -> Result<()> {
        let plan = self.plan;
        let donor = plan.donor();
        if !self.require("donor toolchain", &donor.bin_dir)? {
            return Ok(());
        }
        let layout = &plan.layout;
        for sub in ["include", "lib", "lib32"] {
            for item in entries(&donor.lib_prefix.join(sub)) {
                self.shell.apply(&FsOp::CopyIfMissing {
                    to: layout.lib_prefix.join(sub).join(file_name(&item)),
                    from: item,
                })?;
            }
        }
        // The frontend install already created the versioned libgcc directory,
        // so merge one level below it.
        let target = &plan.spec.target;
        for version in entries(&donor.libgcc_root(target)) {
            let ours = layout.libgcc_root(target).join(file_name(&version));
            for item in entries(&version) {
                self.shell.apply(&FsOp::CopyIfMissing {
                    to: ours.join(file_name(&item)),
                    from: item,
                })?;
            }
        }
        Ok(())
    }

    fn pexports(&self, ctx: BuildContext) -> Result<BuildContext> {
        let plan = self.plan;
        let options = [
            format!("--prefix={}", plan.layout.prefix.display()),
            format!("--host={}", plan.spec.host),
        ];
        let ctx = self.autotools(ctx, "pexports", &options)?;
        if plan.spec.is_cross_compiler() {
            let bin = &plan.layout.bin_dir;
            self.shell.apply(&FsOp::Rename {
                from: bin.join("pexports.exe"),
                to: bin.join(format!("{}-pexports.exe", plan.spec.target)),
            })?;
        }
        Ok(ctx)
    }

    /// The toolchain whose runtime DSOs our host binaries load.
    fn host_runtime_source(&self) -> (GccLayout, PathBuf, &'static [&'static str]) {
        let plan = self.plan;
        if plan.is_windows_host() {
            let donor = plan.host_runtime_donor();
            let dir = donor.lib_prefix.join("lib");
            (donor, dir, WINDOWS_HOST_RUNTIME)
        } else {
            let native = GccLayout::new(
                &ToolchainSpec::native(plan.spec.build.clone()),
                &plan.options.prefix_dir,
            );
            let dir = native.rpath_dir.clone();
            (native, dir, LINUX_HOST_RUNTIME)
        }
    }

    fn copy_host_runtime(&self) -> Result<()> {
        let (source, dir, files) = self.host_runtime_source();
        if !self.require(&format!("toolchain {}", source.name), &source.bin_dir)? {
            return Ok(());
        }
        let layout = &self.plan.layout;
        let dest = if self.plan.is_windows_host() {
            &layout.bin_dir
        } else {
            &layout.rpath_dir
        };
        for name in files {
            let from = dir.join(name);
            if self.require("host runtime library", &from)? {
                self.shell.apply(&FsOp::Copy { from, to: dest.join(name) })?;
            }
        }
        Ok(())
    }

    fn copy_pretty_printer(&self) -> Result<()> {
        let plan = self.plan;
        let native = GccLayout::new(
            &ToolchainSpec::native(plan.spec.build.clone()),
            &plan.options.prefix_dir,
        );
        let printer = entries(&native.share_dir)
            .into_iter()
            .find(|p| file_name(p).starts_with("gcc"));
        match printer {
            Some(from) => {
                let to = plan.layout.share_dir.join(file_name(&from));
                self.shell.apply(&FsOp::Copy { from, to })?;
            }
            None => self.missing("gcc pretty printer", &native.share_dir)?,
        }
        Ok(())
    }

    fn package(&self, ctx: &BuildContext) -> Result<()> {
        let plan = self.plan;
        let layout = &plan.layout;
        let data_dir = &plan.options.data_dir;

        if plan.builds_gdb() {
            let gdbinit = data_dir.join(".gdbinit");
            if self.require(".gdbinit", &gdbinit)? {
                self.shell.apply(&FsOp::Copy {
                    from: gdbinit,
                    to: layout.gdbinit_path.clone(),
                })?;
            }
            if plan.is_windows_host() {
                for file in entries(&plan.source_dir("python-embed")) {
                    if file_name(&file).starts_with("python") {
                        self.shell.apply(&FsOp::Copy {
                            to: layout.bin_dir.join(file_name(&file)),
                            from: file,
                        })?;
                    }
                }
            }
        }
        package::install_readme(self.shell, data_dir, &layout.name_without_version, &layout.prefix)?;

        let sysroot_link = layout.lib_prefix.join("lib").join("gcc");
        if plan.spec.is_cross_compiler() && !self.shell.exists(&sysroot_link) {
            self.shell.apply(&FsOp::Symlink {
                target: PathBuf::from("../../lib/gcc"),
                link: sysroot_link,
            })?;
        }
        package::compress(self.shell, ctx, &plan.options.prefix_dir, &layout.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::GccOptions;
    use toolchains_shell::{Event, RecordingShell};
    use toolchains_triplet::Triplet;

    fn t(s: &str) -> Triplet {
        Triplet::parse(s).unwrap()
    }

    fn options(home: &Path) -> GccOptions {
        GccOptions {
            home: home.to_path_buf(),
            prefix_dir: home.to_path_buf(),
            data_dir: home.join("data"),
            jobs: 4,
            ..Default::default()
        }
    }

    fn sources(home: &Path, names: &[&str]) {
        for name in names {
            std::fs::create_dir_all(home.join(name)).unwrap();
        }
    }

    #[test]
    fn missing_source_is_fatal_even_in_dry_run() {
        let dir = tempfile::tempdir().unwrap();
        sources(dir.path(), &["gcc"]);
        let spec = ToolchainSpec::native(t("x86_64-linux-gnu"));
        let plan = ToolchainBuildPlan::new(spec, &options(dir.path())).unwrap();
        let shell = RecordingShell::dry();
        let err = GccBuilder::new(&shell, &plan)
            .build(BuildContext::with_base_path("/usr/bin"))
            .unwrap_err();
        assert!(matches!(err, BuildError::MissingSource { ref component, .. } if component == "binutils"));
        assert!(shell.events().is_empty());
    }

    #[test]
    fn native_dry_run_echoes_the_whole_sequence() {
        let dir = tempfile::tempdir().unwrap();
        sources(dir.path(), &["gcc", "binutils"]);
        let spec = ToolchainSpec::native(t("x86_64-linux-gnu"));
        let plan = ToolchainBuildPlan::new(spec, &options(dir.path())).unwrap();
        let shell = RecordingShell::dry();
        GccBuilder::new(&shell, &plan)
            .build(BuildContext::with_base_path("/usr/bin"))
            .unwrap();

        let commands = shell.commands();
        assert!(commands[0].starts_with("../configure --disable-werror --enable-nls"));
        assert!(commands[0].contains("--enable-multilib"));
        assert_eq!(commands[1], "make -j 4");
        assert_eq!(commands[2], "make install-strip -j 4");
        assert!(commands[3].starts_with("make install-target-libgcc"));
        assert!(commands.iter().any(|c| c.contains("--enable-gold")));
        assert!(commands.last().unwrap().starts_with("xz -fev9"));
        assert!(shell.applied_fs_ops().is_empty());
        assert!(!dir.path().join("gcc/build").exists());
    }

    #[test]
    fn mingw_cross_links_multilib_dirs_transiently() {
        let dir = tempfile::tempdir().unwrap();
        sources(dir.path(), &["gcc", "binutils", "mingw"]);
        let spec = ToolchainSpec::cross(t("x86_64-linux-gnu"), t("x86_64-w64-mingw32"));
        let plan = ToolchainBuildPlan::new(spec, &options(dir.path())).unwrap();
        std::fs::create_dir_all(plan.layout.lib_prefix.join("lib32")).unwrap();
        std::fs::create_dir_all(plan.layout.lib_prefix.join("lib")).unwrap();

        let shell = RecordingShell::new();
        let mut builder = GccBuilder::new(&shell, &plan);
        let ctx = BuildContext::with_base_path("/usr/bin");
        let ctx = builder.run_step(GccStep::MingwRuntime, ctx).unwrap();
        let link = plan.layout.lib_prefix.join("lib/32");
        assert!(link.symlink_metadata().unwrap().file_type().is_symlink());

        builder.run_step(GccStep::RemoveMultilibLinks, ctx).unwrap();
        assert!(link.symlink_metadata().is_err());
        assert!(plan.layout.lib_prefix.join("lib32").is_dir());

        let configure = shell.commands().into_iter().find(|c| c.starts_with("../configure")).unwrap();
        assert!(configure.contains("--with-default-msvcrt=ucrt"));
        assert!(configure.contains("--disable-lib32 --enable-lib64"));
    }

    #[test]
    fn glibc_adjustment_replaces_linker_scripts() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path();
        sources(home, &["gcc", "binutils", "linux", "glibc", "data"]);
        std::fs::write(home.join("data/arm-hf-libc.so"), "GROUP ( libc.so.6 )").unwrap();
        std::fs::write(home.join("data/arm-sf-libc.so"), "wrong").unwrap();
        let spec = ToolchainSpec::cross(t("x86_64-linux-gnu"), t("arm-linux-gnueabihf"));
        let plan = ToolchainBuildPlan::new(spec, &options(home)).unwrap();
        let lib = plan.layout.lib_prefix.join("lib");
        std::fs::create_dir_all(lib.join("gconv")).unwrap();
        std::fs::write(lib.join("libc.so"), "GROUP ( /abs/path/libc.so.6 )").unwrap();

        let shell = RecordingShell::new().fail_always("strip");
        let mut builder = GccBuilder::new(&shell, &plan);
        builder
            .run_step(GccStep::Libc, BuildContext::with_base_path("/usr/bin"))
            .unwrap();

        assert_eq!(std::fs::read_to_string(lib.join("libc.so")).unwrap(), "GROUP ( libc.so.6 )");
        assert!(!lib.join("gconv").exists());
        assert_eq!(shell.count("arm-linux-gnueabihf-strip"), 1);
    }

    #[test]
    fn glibc_headers_write_the_stub_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let spec = ToolchainSpec::cross(t("x86_64-linux-gnu"), t("riscv64-linux-gnu"));
        let plan = ToolchainBuildPlan::new(spec, &options(dir.path())).unwrap();
        let shell = RecordingShell::new();
        GccBuilder::new(&shell, &plan)
            .run_step(GccStep::LibcHeaders, BuildContext::with_base_path("/usr/bin"))
            .unwrap();
        assert!(plan.layout.lib_prefix.join("include/gnu/stubs.h").is_file());
        assert_eq!(shell.count("libc_cv_forced_unwind=yes"), 1);
        assert_eq!(shell.count("make install-headers"), 1);
    }

    #[test]
    fn copy_forward_fills_only_missing_items() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path();
        let opts = options(home);
        let spec = ToolchainSpec::new(t("x86_64-linux-gnu"), t("x86_64-w64-mingw32"), t("riscv64-linux-gnu"));
        let plan = ToolchainBuildPlan::new(spec, &opts).unwrap();
        let donor = plan.donor();
        std::fs::create_dir_all(&donor.bin_dir).unwrap();
        std::fs::create_dir_all(donor.lib_prefix.join("include/linux")).unwrap();
        std::fs::create_dir_all(donor.lib_prefix.join("lib")).unwrap();
        std::fs::write(donor.lib_prefix.join("lib/libc.so.6"), "donor").unwrap();
        let donor_gcc = donor.libgcc_root(&plan.spec.target).join("15.1.0");
        std::fs::create_dir_all(&donor_gcc).unwrap();
        std::fs::write(donor_gcc.join("libgcc.a"), "archive").unwrap();
        std::fs::write(donor_gcc.join("cc1"), "donor").unwrap();

        let ours = plan.layout.libgcc_root(&plan.spec.target).join("15.1.0");
        std::fs::create_dir_all(&ours).unwrap();
        std::fs::write(ours.join("cc1"), "ours").unwrap();

        let shell = RecordingShell::new();
        GccBuilder::new(&shell, &plan)
            .run_step(GccStep::CopyForward, BuildContext::with_base_path("/usr/bin"))
            .unwrap();

        let lib_prefix = &plan.layout.lib_prefix;
        assert!(lib_prefix.join("include/linux").is_dir());
        assert_eq!(std::fs::read_to_string(lib_prefix.join("lib/libc.so.6")).unwrap(), "donor");
        assert!(ours.join("libgcc.a").is_file());
        assert_eq!(std::fs::read_to_string(ours.join("cc1")).unwrap(), "ours");
    }

    #[test]
    fn copy_forward_without_donor_fails() {
        let dir = tempfile::tempdir().unwrap();
        let spec = ToolchainSpec::new(t("x86_64-linux-gnu"), t("x86_64-w64-mingw32"), t("x86_64-w64-mingw32"));
        let plan = ToolchainBuildPlan::new(spec, &options(dir.path())).unwrap();
        let shell = RecordingShell::new();
        let err = GccBuilder::new(&shell, &plan)
            .run_step(GccStep::CopyForward, BuildContext::with_base_path("/usr/bin"))
            .unwrap_err();
        assert!(matches!(err, BuildError::MissingArtifact { .. }));

        let shell = RecordingShell::dry();
        GccBuilder::new(&shell, &plan)
            .run_step(GccStep::CopyForward, BuildContext::with_base_path("/usr/bin"))
            .unwrap();
        assert!(!shell.events().iter().any(|e| matches!(e, Event::Fs(_))));
    }

    #[test]
    fn gdbserver_patches_limits_header() {
        let dir = tempfile::tempdir().unwrap();
        let spec = ToolchainSpec::cross(t("x86_64-linux-gnu"), t("aarch64-linux-gnu"));
        let plan = ToolchainBuildPlan::new(spec, &options(dir.path())).unwrap();
        let include = plan.layout.libgcc_root(&plan.spec.target).join("15.1.0/include");
        std::fs::create_dir_all(&include).unwrap();
        std::fs::write(include.join("limits.h"), "/* gcc */\n").unwrap();

        let shell = RecordingShell::new();
        GccBuilder::new(&shell, &plan)
            .run_step(GccStep::Gdbserver, BuildContext::with_base_path("/usr/bin"))
            .unwrap();
        let limits = std::fs::read_to_string(include.join("limits.h")).unwrap();
        assert!(limits.ends_with(LIMITS_FIX));
        assert_eq!(shell.count("--host=aarch64-linux-gnu --disable-gdb --enable-gdbserver"), 1);
        assert_eq!(shell.count("make install-strip-gdbserver"), 1);
    }

    #[test]
    fn windows_binutils_links_static_prerequisites() {
        let dir = tempfile::tempdir().unwrap();
        let spec = ToolchainSpec::new(t("x86_64-linux-gnu"), t("x86_64-w64-mingw32"), t("arm-none-eabi"));
        let plan = ToolchainBuildPlan::new(spec, &options(dir.path())).unwrap();
        let shell = RecordingShell::dry();
        GccBuilder::new(&shell, &plan)
            .run_step(GccStep::Binutils, BuildContext::with_base_path("/usr/bin"))
            .unwrap();
        let configure = &shell.commands()[0];
        assert!(configure.contains("--with-expat"));
        assert!(configure.contains("--with-python="));
        assert!(configure.contains("CXXFLAGS=-D_WIN32_WINNT=0x0600"));
        assert!(!configure.contains("--enable-gold"));
    }
}
