pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::evaluate::EvaluateArgs;
use commands::profile::ProfileArgs;

#[derive(Debug, Parser)]
#[command(
    name = "clientlens",
    about = "Focus-product client matching and segmentation",
    long_about = "Evaluate focus tasks against a sales ledger, profile single clients, \
                  and inspect configuration.",
    after_help = "Examples:\n  \
                  clientlens evaluate --ledger sales.json --task task.json\n  \
                  clientlens profile --ledger sales.json --client C1 --focus F1,F2\n  \
                  clientlens validate --task task.json\n  \
                  clientlens config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run a task's enabled parameters and print the chunked client snapshot")]
    Evaluate {
        #[arg(long, help = "Ledger JSON file (array or {\"transactions\": [...]})")]
        ledger: PathBuf,
        #[arg(long, help = "Task definition JSON file")]
        task: PathBuf,
        #[arg(long, help = "Directories JSON file with names, links and categories")]
        directory: Option<PathBuf>,
        #[arg(long, help = "Reference time (RFC 3339 or YYYY-MM-DD); defaults to the clock")]
        now: Option<String>,
        #[arg(long, help = "Maximum snapshot entries per chunk")]
        chunk_size: Option<usize>,
    },
    #[command(about = "Build the deep profile of one client")]
    Profile {
        #[arg(long, help = "Ledger JSON file")]
        ledger: PathBuf,
        #[arg(long, help = "Client code")]
        client: String,
        #[arg(
            long,
            required = true,
            value_delimiter = ',',
            help = "Focus product codes, comma separated"
        )]
        focus: Vec<String>,
        #[arg(long, help = "Directories JSON file")]
        directory: Option<PathBuf>,
        #[arg(long, help = "Reference time (RFC 3339 or YYYY-MM-DD); defaults to the clock")]
        now: Option<String>,
    },
    #[command(about = "Check a task definition without evaluating it")]
    Validate {
        #[arg(long, help = "Task definition JSON file")]
        task: PathBuf,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    run_with(Cli::parse())
}

pub fn run_with(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Evaluate { ledger, task, directory, now, chunk_size } => {
            commands::evaluate::run(EvaluateArgs { ledger, task, directory, now, chunk_size })
        }
        Command::Profile { ledger, client, focus, directory, now } => {
            commands::profile::run(ProfileArgs { ledger, client, focus, directory, now })
        }
        Command::Validate { task } => commands::validate::run(&task),
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
