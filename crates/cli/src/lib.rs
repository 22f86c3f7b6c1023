pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "docket",
    about = "Docket operator CLI",
    long_about = "Operate the docket estimator: migrations, demo data, readiness checks, access tokens, and offline ranking.",
    after_help = "Examples:\n  docket doctor --json\n  docket token --account acct-demo-001\n  docket rank --text \"custody hearing\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo dataset (documents, entries, external records) idempotently")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, token signing, DB connectivity and schema version")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Issue a bearer token for an account using the configured secret")]
    Token {
        #[arg(long, help = "Account id the token resolves to")]
        account: String,
    },
    #[command(about = "Rank stored documents against a text and print the kept results as JSON")]
    Rank {
        #[arg(long, help = "Free text describing the new matter")]
        text: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Token { account } => commands::token::run(&account),
        Command::Rank { text } => commands::rank::run(&text),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
