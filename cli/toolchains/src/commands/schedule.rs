//! `toolchains schedule`: every known toolchain, in build order.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use toolchains_build::{definition, BuildContext, GccOptions, Schedule};
use toolchains_shell::Shell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum InfoFormat {
    #[default]
    Text,
    Json,
}

/// The built-in definitions plus those declared in `definitions`.
pub fn load(definitions: Option<&Path>, options: &GccOptions) -> Result<Schedule> {
    let definitions = definition::all(definitions, options).context("loading build definitions")?;
    Ok(Schedule::new(definitions))
}

pub fn info(schedule: &Schedule, format: InfoFormat) -> Result<()> {
    let info = schedule.info();
    match format {
        InfoFormat::Text => println!("{info}"),
        InfoFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
    }
    Ok(())
}

/// Print shell lines that put the installed toolchains on PATH.
pub fn path(schedule: &Schedule) -> Result<()> {
    print!("{}", schedule.path_script());
    Ok(())
}

/// Build the whole schedule, or only the named toolchains in schedule order.
pub fn build<S: Shell + ?Sized>(
    shell: &S,
    schedule: &Schedule,
    options: &GccOptions,
    only: &[String],
) -> Result<()> {
    options.validate()?;
    let selected = select(schedule, only)?;
    selected.build(shell, options, BuildContext::from_env())?;
    Ok(())
}

fn select(schedule: &Schedule, only: &[String]) -> Result<Schedule> {
    for name in only {
        if schedule.find(name).is_none() {
            bail!("unknown toolchain '{name}'. Use 'toolchains schedule info' to list them.");
        }
    }
    let definitions = schedule
        .order()
        .iter()
        .filter(|d| only.is_empty() || only.contains(&d.name))
        .cloned()
        .collect();
    Ok(Schedule::new(definitions))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(dir: &Path) -> GccOptions {
        GccOptions {
            home: dir.to_path_buf(),
            prefix_dir: dir.to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn selection_keeps_schedule_order() {
        let dir = tempfile::tempdir().unwrap();
        let schedule = load(None, &options(dir.path())).unwrap();
        let only = vec![
            "x86_64-w64-mingw32-native-gcc".to_string(),
            "x86_64-linux-gnu-native-gcc".to_string(),
        ];
        let selected = select(&schedule, &only).unwrap();
        let flow = selected.info().flow;
        assert_eq!(flow, vec!["x86_64-linux-gnu-native-gcc", "x86_64-w64-mingw32-native-gcc"]);
        assert_eq!(select(&schedule, &[]).unwrap().order().len(), schedule.order().len());
    }

    #[test]
    fn unknown_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let schedule = load(None, &options(dir.path())).unwrap();
        let err = select(&schedule, &["riscv-native".to_string()]).unwrap_err();
        assert!(err.to_string().contains("riscv-native"));
    }
}
