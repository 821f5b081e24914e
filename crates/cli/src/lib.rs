pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "supportflow",
    about = "SupportFlow operator CLI",
    long_about = "Triage customer messages through the classification pipeline, manage the \
                  ticket database, and inspect runtime readiness.",
    after_help = "Examples:\n  supportflow process \"What's the status of ticket T-123?\"\n  \
                  supportflow process \"My card was stolen\" --fault database_error\n  \
                  supportflow doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run one customer message through the triage pipeline")]
    Process {
        #[arg(help = "The customer message text")]
        message: String,
        #[arg(long, help = "Session id to group audit entries under (random by default)")]
        session: Option<String>,
        #[arg(
            long,
            value_name = "FAULT",
            help = "Enable a deterministic fault before processing \
                    (classifier_failure|router_failure|database_error|timeout); repeatable"
        )]
        fault: Vec<String>,
        #[arg(long, help = "Include the session's audit trail in the output")]
        audit: bool,
    },
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo ticket fixtures and verify them")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, database connectivity, and the policy corpus")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Process { message, session, fault, audit } => {
            commands::process::run(&message, session.as_deref(), &fault, audit)
        }
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
