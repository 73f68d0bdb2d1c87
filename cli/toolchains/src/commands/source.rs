//! `toolchains source`: fetch and refresh the source components.

use anyhow::Result;
use clap::ValueEnum;
use toolchains_shell::Shell;
use toolchains_source::{system, AcquireOptions, SourceEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceAction {
    /// Fetch every component that is missing
    Download,
    /// Update every component; all of them must exist
    Update,
    /// Download what is missing, then update everything
    Auto,
    /// Print the host packages the builds need
    System,
}

pub fn run<S: Shell + ?Sized>(shell: &S, options: &AcquireOptions, action: SourceAction) -> Result<()> {
    match action {
        SourceAction::Download => engine(shell, options)?.download()?,
        SourceAction::Update => engine(shell, options)?.update()?,
        SourceAction::Auto => engine(shell, options)?.auto()?,
        SourceAction::System => println!("{}", system::install_hint()),
    }
    Ok(())
}

fn engine<'a, S: Shell + ?Sized>(shell: &'a S, options: &'a AcquireOptions) -> Result<SourceEngine<'a, S>> {
    options.validate()?;
    Ok(SourceEngine::new(shell, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolchains_shell::RecordingShell;

    #[test]
    fn missing_home_is_rejected_before_any_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let options = AcquireOptions {
            home: dir.path().join("nope"),
            ..Default::default()
        };
        let shell = RecordingShell::dry();
        assert!(run(&shell, &options, SourceAction::Download).is_err());
        assert!(shell.events().is_empty());
        run(&shell, &options, SourceAction::System).unwrap();
    }
}
