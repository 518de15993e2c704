//! splitroute CLI.
//!
//! - `splitroute match` - Route one destination against a config file
//! - `splitroute rules` - Show the effective rule order
//! - `splitroute check` - Load and lint a config file

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use splitroute::cli::{CheckArgs, MatchArgs, RulesArgs, run_check, run_match, run_rules};

/// splitroute CLI.
#[derive(Parser)]
#[command(
    name = "splitroute",
    version,
    about = "Decide direct, proxy or block for a destination",
    propagate_version = true
)]
struct Cli {
    /// Log level override.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route one destination and print the decision.
    #[command(name = "match", alias = "test")]
    Match(MatchArgs),

    /// Show the effective rule order.
    #[command(name = "rules")]
    Rules(RulesArgs),

    /// Load, resolve and lint a config file.
    #[command(name = "check")]
    Check(CheckArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_level = cli.log_level.as_deref();

    let result = match cli.command {
        Commands::Match(args) => run_match(args, log_level),
        Commands::Rules(args) => run_rules(args, log_level),
        Commands::Check(args) => run_check(args, log_level),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
