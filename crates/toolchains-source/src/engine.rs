//! The acquisition engine: download missing components, update present ones.

use std::path::{Path, PathBuf};

use log::{info, warn};
use toolchains_shell::{CommandLine, FsOp, RunOptions, Shell};

use crate::catalog::{self, SourceComponent, GCC_PREREQUISITES, GIT_COMPONENTS};
use crate::error::{Result, SourceError};
use crate::options::AcquireOptions;
use crate::retry::with_retry;
use crate::version::{self, Freshness};

/// Drives every network operation through one [`Shell`].
pub struct SourceEngine<'a, S: Shell + ?Sized> {
    shell: &'a S,
    options: &'a AcquireOptions,
}

fn exist_echo(name: &str) {
    info!("Lib {name} exists, skip download.");
}

fn up_to_date_echo(name: &str) {
    info!("Lib {name} is up to date, skip update.");
}

impl<'a, S: Shell + ?Sized> SourceEngine<'a, S> {
    pub fn new(shell: &'a S, options: &'a AcquireOptions) -> Self {
        Self { shell, options }
    }

    fn home(&self) -> &Path {
        &self.options.home
    }

    fn component_dir(&self, name: &str) -> PathBuf {
        self.home().join(name)
    }

    /// Archive components selected by the options, required ones first.
    pub fn archive_components(&self) -> Result<Vec<SourceComponent>> {
        self.options
            .archive_names()
            .iter()
            .map(|name| catalog::component(name))
            .collect()
    }

    /// Fetch every component that is not present. Existing ones are left alone.
    pub fn download(&self) -> Result<()> {
        self.download_missing().map(|_| ())
    }

    /// Bring every present component up to date. All components must exist.
    pub fn update(&self) -> Result<()> {
        self.update_present(&[])
    }

    /// Download missing components, then run the update check over everything.
    pub fn auto(&self) -> Result<()> {
        let fetched = self.download_missing()?;
        self.update_present(&fetched)
    }

    fn download_missing(&self) -> Result<Vec<&'static str>> {
        let mut fetched = Vec::new();
        for name in GIT_COMPONENTS {
            let component = catalog::component(name)?;
            if self.shell.exists(&self.component_dir(name)) {
                exist_echo(name);
                continue;
            }
            self.clone(name)?;
            self.run_hook(&component)?;
            fetched.push(*name);
        }

        for component in self.archive_components()? {
            if component.is_present(self.home()) {
                exist_echo(component.name);
                continue;
            }
            self.fetch_archive(&component)?;
            self.run_hook(&component)?;
            fetched.push(component.name);
        }

        let gcc = self.component_dir("gcc");
        if GCC_PREREQUISITES.iter().all(|lib| self.shell.exists(&gcc.join(lib))) {
            exist_echo("gcc_contrib");
        } else {
            self.gcc_prerequisites()?;
        }
        Ok(fetched)
    }

    /// Components fetched earlier in this run are skipped when nothing was written to disk.
    fn update_present(&self, fetched: &[&str]) -> Result<()> {
        let skip = |name: &str| self.shell.dry_run() && fetched.contains(&name);

        for name in GIT_COMPONENTS {
            if skip(name) {
                continue;
            }
            let dir = self.component_dir(name);
            if !self.shell.exists(&dir) {
                return Err(SourceError::MissingComponent {
                    component: name.to_string(),
                    path: self.home().to_path_buf(),
                });
            }
            self.update_git(name, &dir)?;
        }

        for component in self.archive_components()? {
            if skip(component.name) {
                continue;
            }
            self.update_archive(&component)?;
        }
        Ok(())
    }

    /// Run `command` with bounded retry, converting exhaustion into a typed error.
    fn network<T>(
        &self,
        component: &str,
        operation: &'static str,
        mut attempt: impl FnMut() -> std::result::Result<T, toolchains_shell::ShellError>,
    ) -> Result<T> {
        let attempts = self.options.attempts();
        with_retry(attempts, |n| {
            attempt().map_err(|e| {
                if n < attempts {
                    warn!("{operation} {component} failed, retrying ({n}/{attempts}).");
                }
                e
            })
        })
        .map_err(|e| SourceError::NetworkExhausted {
            component: component.to_string(),
            operation,
            attempts,
            last_error: e.to_string(),
        })
    }

    fn git_url(&self, name: &str) -> Result<String> {
        self.options
            .remote
            .git_url(name)
            .map(|url| url.url(self.options.ssh))
            .ok_or_else(|| SourceError::UnknownComponent {
                name: name.to_string(),
            })
    }

    /// The glibc release to clone: configured, or detected from the host C library.
    fn glibc_version(&self) -> Result<Option<String>> {
        if let Some(version) = &self.options.glibc_version {
            return Ok(Some(version.clone()));
        }
        let output = self.shell.run(
            &CommandLine::new("getconf").arg("GNU_LIBC_VERSION"),
            RunOptions::default().capture().quiet().ignore_error(),
        )?;
        let detected = output.and_then(|out| out.stdout.split_whitespace().nth(1).map(str::to_string));
        match detected {
            Some(version) => Ok(Some(version)),
            None if self.shell.dry_run() => {
                warn!("glibc version is unknown under dry-run, cloning the default branch");
                Ok(None)
            }
            None => Err(SourceError::InvalidOption {
                detail: "cannot detect the host glibc version, set it explicitly".into(),
            }),
        }
    }

    fn clone(&self, name: &str) -> Result<()> {
        let dir = self.component_dir(name);
        let mut command = CommandLine::new("git").arg("clone");
        if name == "glibc" {
            if let Some(version) = self.glibc_version()? {
                command = command.arg("-b").arg(format!("release/{version}/master"));
            }
        }
        let command = command
            .args(self.options.clone_args())
            .arg(self.git_url(name)?)
            .path_arg(&dir);

        self.network(name, "Clone", || {
            self.shell.exec(&command).or_else(|e| {
                self.shell.apply(&FsOp::Remove { path: dir.clone() })?;
                Err(e)
            })
        })
    }

    fn fetch_archive(&self, component: &SourceComponent) -> Result<()> {
        let Some(archive) = component.archive() else {
            return Ok(());
        };
        for (file, url) in &archive.files {
            let target = self.home().join(file);
            let command = CommandLine::new("wget")
                .arg(url.as_str())
                .args(["-c", "-t", "1", "-O"])
                .path_arg(&target);
            let result = self.network(component.name, "Download", || self.shell.exec(&command));
            if result.is_err() {
                self.shell.apply(&FsOp::Remove { path: target })?;
            }
            result?;
        }
        Ok(())
    }

    fn run_hook(&self, component: &SourceComponent) -> Result<()> {
        match component.hook {
            Some(hook) => hook.run(self.shell, self.home()),
            None => Ok(()),
        }
    }

    fn gcc_prerequisites(&self) -> Result<()> {
        let command = CommandLine::new("contrib/download_prerequisites").current_dir(self.component_dir("gcc"));
        self.network("gcc_contrib", "Download", || self.shell.exec(&command))
    }

    fn update_git(&self, name: &str, dir: &Path) -> Result<()> {
        let fetch = CommandLine::new("git")
            .arg("-C")
            .path_arg(dir)
            .args(["fetch", "--dry-run"]);
        let output = self.network(name, "Fetch", || {
            self.shell.run(&fetch, RunOptions::default().capture().quiet())
        })?;
        // Nothing ran under dry-run, so there is nothing to compare.
        let Some(output) = output else {
            return Ok(());
        };
        if output.stderr.trim().is_empty() {
            up_to_date_echo(name);
            return Ok(());
        }

        let pull = CommandLine::new("git").arg("-C").path_arg(dir).arg("pull");
        self.network(name, "Pull", || self.shell.exec(&pull))?;
        self.run_hook(&catalog::component(name)?)
    }

    fn update_archive(&self, component: &SourceComponent) -> Result<()> {
        let Some(archive) = component.archive() else {
            return Ok(());
        };
        match version::check(&self.home().join(&archive.version_dir), archive.version) {
            Freshness::Newer => {
                warn!("Lib {} is newer than default version, skip update.", component.name);
                Ok(())
            }
            Freshness::UpToDate => {
                up_to_date_echo(component.name);
                Ok(())
            }
            Freshness::Stale => {
                self.fetch_archive(component)?;
                self.run_hook(component)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::versions;
    use std::fs;
    use toolchains_shell::{Captured, Event, RecordingShell};

    /// A home where every component is present and every archive is stamped current.
    fn populated_home() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path();
        for name in GIT_COMPONENTS {
            fs::create_dir_all(home.join(name)).unwrap();
        }
        for lib in GCC_PREREQUISITES {
            fs::create_dir_all(home.join("gcc").join(lib)).unwrap();
        }
        for (name, version) in [
            ("python-embed", versions::PYTHON),
            ("gmp", versions::GMP),
            ("mpfr", versions::MPFR),
        ] {
            fs::create_dir_all(home.join(name)).unwrap();
            fs::write(home.join(name).join(version::MARKER), version).unwrap();
        }
        dir
    }

    fn options(home: &Path) -> AcquireOptions {
        AcquireOptions {
            home: home.to_path_buf(),
            retry: 2,
            glibc_version: Some("2.39".into()),
            ..Default::default()
        }
    }

    fn quiet_remote() -> Captured {
        Captured { status: Some(0), ..Captured::default() }
    }

    #[test]
    fn up_to_date_update_only_probes() {
        let home = populated_home();
        let opts = options(home.path());
        let shell = RecordingShell::new().respond("fetch --dry-run", quiet_remote());
        SourceEngine::new(&shell, &opts).update().unwrap();

        let commands = shell.commands();
        assert_eq!(commands.len(), GIT_COMPONENTS.len());
        assert!(commands.iter().all(|c| c.ends_with("fetch --dry-run")));
        assert_eq!(shell.count("pull"), 0);
        assert!(shell.applied_fs_ops().is_empty());
    }

    #[test]
    fn pending_changes_pull_and_rerun_hook() {
        let home = populated_home();
        let opts = options(home.path());
        let shell = RecordingShell::new()
            .respond(
                "expat fetch --dry-run",
                Captured {
                    status: Some(0),
                    stdout: String::new(),
                    stderr: "From https://github.com/libexpat/libexpat\n".into(),
                },
            )
            .respond("fetch --dry-run", quiet_remote());
        SourceEngine::new(&shell, &opts).update().unwrap();

        assert_eq!(shell.count("pull"), 1);
        assert_eq!(shell.count("expat pull"), 1);
        assert_eq!(shell.count("./buildconf.sh"), 1);
    }

    #[test]
    fn failed_clone_leaves_nothing_behind() {
        let home = populated_home();
        fs::remove_dir_all(home.path().join("gcc")).unwrap();
        let gcc = home.path().join("gcc");
        let opts = options(home.path());
        let shell = RecordingShell::new()
            .effect("git clone", FsOp::CreateDir { path: gcc.clone(), clean: false })
            .fail_always("git clone");

        let err = SourceEngine::new(&shell, &opts).download().unwrap_err();
        assert!(matches!(
            err,
            SourceError::NetworkExhausted { ref component, attempts: 3, .. } if component == "gcc"
        ));
        assert_eq!(shell.count("git clone"), 3);
        assert!(!gcc.exists());
    }

    #[test]
    fn flaky_clone_recovers() {
        let home = populated_home();
        fs::remove_dir_all(home.path().join("newlib")).unwrap();
        let opts = options(home.path());
        let shell = RecordingShell::new().fail_times("git clone", 2);
        SourceEngine::new(&shell, &opts).download().unwrap();
        assert_eq!(shell.count("git clone"), 3);
        assert_eq!(
            shell.count("git clone --filter=blob:none https://github.com/bminor/newlib.git"),
            3
        );
    }

    #[test]
    fn glibc_clones_release_branch() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path());
        let shell = RecordingShell::dry();
        SourceEngine::new(&shell, &opts).download().unwrap();
        assert_eq!(shell.count("git clone -b release/2.39/master"), 1);
        assert_eq!(shell.count("git clone"), GIT_COMPONENTS.len());
        assert_eq!(shell.count("contrib/download_prerequisites"), 1);
    }

    #[test]
    fn dry_run_download_mutates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let opts = AcquireOptions { glibc_version: None, ..options(dir.path()) };
        let shell = RecordingShell::dry();
        SourceEngine::new(&shell, &opts).auto().unwrap();

        assert!(shell.applied_fs_ops().is_empty());
        assert!(shell.events().iter().all(|e| matches!(e, Event::DryCommand(_) | Event::DryFs(_))));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        // Unknown glibc version under dry-run: default branch.
        assert_eq!(shell.count("release/"), 0);
    }

    #[test]
    fn newer_archive_is_not_downgraded() {
        let home = populated_home();
        fs::write(home.path().join("gmp").join(version::MARKER), "7.0").unwrap();
        let opts = options(home.path());
        let shell = RecordingShell::new().respond("fetch --dry-run", quiet_remote());
        SourceEngine::new(&shell, &opts).update().unwrap();
        assert_eq!(shell.count("wget"), 0);
        assert_eq!(version::read_marker(&home.path().join("gmp")).as_deref(), Some("7.0"));
    }

    #[test]
    fn stale_archive_is_refetched_and_restamped() {
        let home = populated_home();
        let gmp = home.path().join("gmp");
        fs::write(gmp.join(version::MARKER), "6.2.1").unwrap();
        let opts = options(home.path());
        let shell = RecordingShell::new()
            .respond("fetch --dry-run", quiet_remote())
            .effect(
                "gmp.tar.xz -C",
                FsOp::CreateDir { path: home.path().join("gmp-6.3.0"), clean: false },
            );
        SourceEngine::new(&shell, &opts).update().unwrap();

        assert_eq!(shell.count("wget"), 1);
        assert_eq!(shell.count("gmp-6.3.0.tar.xz"), 1);
        assert_eq!(version::read_marker(&gmp).as_deref(), Some("6.3.0"));
    }

    #[test]
    fn exhausted_transfer_removes_partial_file() {
        let home = populated_home();
        fs::remove_dir_all(home.path().join("mpfr")).unwrap();
        let partial = home.path().join("mpfr.tar.xz");
        let opts = options(home.path());
        let shell = RecordingShell::new()
            .effect("wget", FsOp::WriteFile { path: partial.clone(), contents: "half".into() })
            .fail_always("wget");

        let err = SourceEngine::new(&shell, &opts).download().unwrap_err();
        assert!(matches!(err, SourceError::NetworkExhausted { operation: "Download", .. }));
        assert_eq!(shell.count("wget"), 3);
        assert!(!partial.exists());
    }

    #[test]
    fn update_requires_every_component() {
        let home = populated_home();
        fs::remove_dir_all(home.path().join("llvm")).unwrap();
        let opts = options(home.path());
        let shell = RecordingShell::new().respond("fetch --dry-run", quiet_remote());
        let err = SourceEngine::new(&shell, &opts).update().unwrap_err();
        assert!(matches!(err, SourceError::MissingComponent { ref component, .. } if component == "llvm"));
    }
}
