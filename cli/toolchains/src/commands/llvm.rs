//! `toolchains llvm` and `toolchains sysroot`: the LLVM bootstrap and the
//! sysroot it compiles against.

use anyhow::{Context, Result};
use log::{info, warn};
use toolchains_build::{assemble_gcc_sysroot, llvm, BuildContext, LlvmOptions, StartAt, Stage, Sysroot};
use toolchains_shell::Shell;

/// Where the bootstrap starts: an explicit stage wins over `--resume`.
pub fn start_at(stage: Option<u8>, resume: bool) -> Result<StartAt> {
    Ok(match (stage, resume) {
        (Some(number), _) => StartAt::Stage(Stage::from_number(number)?),
        (None, true) => StartAt::Resume,
        (None, false) => StartAt::Beginning,
    })
}

pub fn build<S: Shell + ?Sized>(shell: &S, options: &LlvmOptions, start: StartAt) -> Result<()> {
    options.validate()?;
    llvm::build(shell, options, start, BuildContext::from_env())
        .with_context(|| format!("building {}-clang", options.host))?;
    Ok(())
}

/// Recreate the sysroot from the installed GCC cross toolchains.
pub fn sysroot<S: Shell + ?Sized>(shell: &S, options: &LlvmOptions) -> Result<()> {
    options.validate()?;
    let sysroot = Sysroot::new(&options.home);
    let copied = assemble_gcc_sysroot(shell, &sysroot, &options.build, &options.gcc_prefix_dir)?;
    if copied.is_empty() {
        warn!(
            "no gcc toolchain found under {}, the sysroot is empty",
            options.gcc_prefix_dir.display()
        );
    } else {
        info!("sysroot {} assembled from {}", sysroot.root().display(), copied.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolchains_shell::RecordingShell;

    #[test]
    fn explicit_stage_wins_over_resume() {
        assert_eq!(start_at(None, false).unwrap(), StartAt::Beginning);
        assert_eq!(start_at(None, true).unwrap(), StartAt::Resume);
        assert_eq!(start_at(Some(3), true).unwrap(), StartAt::Stage(Stage::Runtimes));
        assert!(start_at(Some(0), false).is_err());
    }

    #[test]
    fn dry_sysroot_leaves_the_disk_alone() {
        let dir = tempfile::tempdir().unwrap();
        let options = LlvmOptions {
            home: dir.path().to_path_buf(),
            gcc_prefix_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let shell = RecordingShell::dry();
        sysroot(&shell, &options).unwrap();
        assert!(!dir.path().join("sysroot").exists());
        assert_eq!(shell.events().len(), 1);
    }
}
