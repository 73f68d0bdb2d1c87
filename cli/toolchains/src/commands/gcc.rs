//! `toolchains gcc`: build one GCC toolchain or show what it would do.

use anyhow::{Context, Result};
use toolchains_build::{gcc, BuildContext, GccOptions, ToolchainBuildPlan};
use toolchains_shell::Shell;
use toolchains_triplet::{check_supported, supported_hosts, supported_targets, ToolchainSpec, Triplet};

fn spec(options: &GccOptions, host: Option<&Triplet>, target: &Triplet) -> Result<ToolchainSpec> {
    let host = host.unwrap_or(&options.build);
    check_supported(host, target)?;
    Ok(ToolchainSpec::new(options.build.clone(), host.clone(), target.clone()))
}

/// Build the toolchain running on `host` (the build machine by default) for `target`.
pub fn build<S: Shell + ?Sized>(
    shell: &S,
    options: &GccOptions,
    host: Option<&Triplet>,
    target: &Triplet,
) -> Result<()> {
    let spec = spec(options, host, target)?;
    options.validate()?;
    gcc::build(shell, spec.clone(), options, BuildContext::from_env())
        .with_context(|| format!("building {spec}"))?;
    Ok(())
}

/// Print the plan of a build without running anything.
pub fn plan(options: &GccOptions, host: Option<&Triplet>, target: &Triplet) -> Result<()> {
    let plan = ToolchainBuildPlan::new(spec(options, host, target)?, options)?;
    println!("=== {} ===", plan.layout.name);
    println!("Category: {}", plan.category());
    println!("Build path: {}", plan.path);
    println!("Prefix: {}", plan.layout.prefix.display());
    if let Some(quirk) = plan.quirk {
        println!("Quirk: {quirk:?}");
    }
    println!();
    println!("Sources:");
    for source in &plan.sources {
        println!("  {:<14} {}", source.component, source.path.display());
    }
    println!("Steps:");
    for (i, step) in plan.steps.iter().enumerate() {
        println!("  {:>2}. {step}", i + 1);
    }
    println!("gcc options: {}", plan.configure.gcc.join(" "));
    if !plan.configure.libc.is_empty() {
        println!("libc options: {}", plan.configure.libc.join(" "));
    }
    Ok(())
}

/// Print the supported platforms.
pub fn dump() -> Result<()> {
    let join = |list: Vec<Triplet>| list.iter().map(Triplet::to_string).collect::<Vec<_>>().join(", ");
    println!("Hosts: {}", join(supported_hosts()));
    println!("Targets: {}", join(supported_targets()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolchains_shell::{Event, RecordingShell};

    fn t(s: &str) -> Triplet {
        Triplet::parse(s).unwrap()
    }

    #[test]
    fn unsupported_target_is_rejected_before_planning() {
        let options = GccOptions::default();
        let err = plan(&options, None, &t("wasm32-unknown-wasi")).unwrap_err();
        assert!(format!("{err:#}").contains("wasm32-unknown-wasi"));
    }

    #[test]
    fn dry_build_of_a_cross_toolchain() {
        let dir = tempfile::tempdir().unwrap();
        for source in ["gcc", "binutils", "newlib"] {
            std::fs::create_dir_all(dir.path().join(source)).unwrap();
        }
        let options = GccOptions {
            build: t("x86_64-linux-gnu"),
            home: dir.path().to_path_buf(),
            prefix_dir: dir.path().to_path_buf(),
            data_dir: dir.path().join("data"),
            ..Default::default()
        };
        let shell = RecordingShell::dry();
        build(&shell, &options, None, &t("arm-none-eabi")).unwrap();
        assert!(shell.count("--target=arm-none-eabi") > 0);
        assert!(shell
            .events()
            .iter()
            .all(|e| matches!(e, Event::DryCommand(_) | Event::DryFs(_))));
    }
}
