//! toolchains CLI: fetch sources and build GCC and LLVM cross toolchains.

mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use anyhow::bail;
use clap::{Parser, Subcommand};
use toolchains_shell::SystemShell;
use toolchains_triplet::Triplet;

use commands::schedule::InfoFormat;
use commands::source::SourceAction;
use config::{Config, GccFlags, LlvmFlags, SourceFlags};

#[derive(Parser)]
#[command(name = "toolchains", version, about = "Build GCC and LLVM cross toolchains")]
struct Cli {
    /// Print the commands and file operations instead of running them
    #[arg(long, global = true)]
    dry_run: bool,
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Read options from a TOML file
    #[arg(long, global = true, value_name = "FILE")]
    import: Option<PathBuf>,
    /// Write the merged options to a TOML file and exit
    #[arg(long, global = true, value_name = "FILE")]
    export: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Download or update the source trees
    Source {
        /// What to do (download, update, auto, system)
        #[arg(value_enum)]
        action: SourceAction,
        #[command(flatten)]
        flags: SourceFlags,
    },
    /// Build or inspect a single GCC toolchain
    Gcc {
        #[command(subcommand)]
        action: GccAction,
    },
    /// Build every GCC toolchain in dependency order
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },
    /// Bootstrap a clang toolchain
    Llvm {
        #[command(flatten)]
        flags: LlvmFlags,
        /// Start at this stage (1-4), ignoring recorded progress
        #[arg(long, conflicts_with = "resume")]
        stage: Option<u8>,
        /// Continue after the last completed stage
        #[arg(long)]
        resume: bool,
    },
    /// Rebuild the sysroot from the installed GCC cross toolchains
    Sysroot {
        #[command(flatten)]
        flags: LlvmFlags,
    },
}

#[derive(Subcommand)]
enum GccAction {
    /// Build one toolchain
    Build {
        /// Target triplet
        target: Triplet,
        /// The machine the toolchain runs on (default: the build machine)
        #[arg(long)]
        host: Option<Triplet>,
        #[command(flatten)]
        flags: GccFlags,
    },
    /// Show the steps a build would run
    Plan {
        /// Target triplet
        target: Triplet,
        /// The machine the toolchain runs on (default: the build machine)
        #[arg(long)]
        host: Option<Triplet>,
        #[command(flatten)]
        flags: GccFlags,
    },
    /// List the supported hosts and targets
    Dump,
}

#[derive(Subcommand)]
enum ScheduleAction {
    /// Summarize the toolchains and their build order
    Info {
        /// Output format
        #[arg(long, value_enum, default_value_t)]
        format: InfoFormat,
        /// Directory with extra *.toolchain.toml definitions
        #[arg(long)]
        definitions: Option<PathBuf>,
        #[command(flatten)]
        flags: GccFlags,
    },
    /// Print PATH exports for the installed toolchains
    Path {
        /// Directory with extra *.toolchain.toml definitions
        #[arg(long)]
        definitions: Option<PathBuf>,
        #[command(flatten)]
        flags: GccFlags,
    },
    /// Build the toolchains in order
    Build {
        /// Only build these toolchains (by name)
        #[arg(long)]
        only: Vec<String>,
        /// Directory with extra *.toolchain.toml definitions
        #[arg(long)]
        definitions: Option<PathBuf>,
        #[command(flatten)]
        flags: GccFlags,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::builder().filter_level(log_level).init();

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load_or_default(cli.import.as_deref())?;
    if let Some(command) = &cli.command {
        apply_flags(command, &mut config);
    }
    if let Some(path) = &cli.export {
        config.save(path)?;
        log::info!("options written to {}", path.display());
        return Ok(());
    }
    let Some(command) = cli.command else {
        bail!("no command given. Run 'toolchains --help' for usage.");
    };

    let shell = SystemShell::new(cli.dry_run);
    match command {
        Commands::Source { action, .. } => commands::source::run(&shell, &config.source, action),

        Commands::Gcc { action } => match action {
            GccAction::Build { target, host, .. } => {
                commands::gcc::build(&shell, &config.gcc, host.as_ref(), &target)
            }
            GccAction::Plan { target, host, .. } => {
                commands::gcc::plan(&config.gcc, host.as_ref(), &target)
            }
            GccAction::Dump => commands::gcc::dump(),
        },

        Commands::Schedule { action } => {
            let definitions = config.definitions.as_deref();
            match action {
                ScheduleAction::Info { format, .. } => {
                    let schedule = commands::schedule::load(definitions, &config.gcc)?;
                    commands::schedule::info(&schedule, format)
                }
                ScheduleAction::Path { .. } => {
                    let schedule = commands::schedule::load(definitions, &config.gcc)?;
                    commands::schedule::path(&schedule)
                }
                ScheduleAction::Build { only, .. } => {
                    let schedule = commands::schedule::load(definitions, &config.gcc)?;
                    commands::schedule::build(&shell, &schedule, &config.gcc, &only)
                }
            }
        }

        Commands::Llvm { stage, resume, .. } => {
            let start = commands::llvm::start_at(stage, resume)?;
            commands::llvm::build(&shell, &config.llvm, start)
        }

        Commands::Sysroot { .. } => commands::llvm::sysroot(&shell, &config.llvm),
    }
}

/// Layer the flags of `command` over the loaded configuration.
fn apply_flags(command: &Commands, config: &mut Config) {
    match command {
        Commands::Source { flags, .. } => flags.apply(&mut config.source),
        Commands::Gcc { action } => match action {
            GccAction::Build { flags, .. } | GccAction::Plan { flags, .. } => flags.apply(&mut config.gcc),
            GccAction::Dump => {}
        },
        Commands::Schedule { action } => {
            let (definitions, flags) = match action {
                ScheduleAction::Info { definitions, flags, .. }
                | ScheduleAction::Path { definitions, flags }
                | ScheduleAction::Build { definitions, flags, .. } => (definitions, flags),
            };
            if definitions.is_some() {
                config.definitions = definitions.clone();
            }
            flags.apply(&mut config.gcc);
        }
        Commands::Llvm { flags, .. } | Commands::Sysroot { flags } => flags.apply(&mut config.llvm),
    }
}
