pub mod commands;
pub mod logging;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::commands::LeadInput;

#[derive(Debug, Parser)]
#[command(
    name = "plumbline",
    about = "Plumbline quote wizard CLI",
    long_about = "Drive the quote wizard headlessly, inspect configuration, and check lead endpoint readiness.",
    after_help = "Examples:\n  plumbline validate --service drain-cleaning --urgency urgent ...\n  plumbline submit --service leak-repair --urgency emergency ... --attachment ceiling.jpg:240000\n  plumbline doctor --json\n  plumbline config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Walk the wizard with the given answers and submit the lead to the endpoint")]
    Submit(LeadInput),
    #[command(about = "Walk the wizard with the given answers without sending anything")]
    Validate(LeadInput),
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and lead endpoint reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    logging::init_from_env();

    let result = match cli.command {
        Command::Submit(input) => commands::submit::run(&input),
        Command::Validate(input) => commands::validate::run(&input),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
