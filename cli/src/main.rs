//! prime-vote: drive a stake-weighted voting machine from scenario files.

mod scenario;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use prime_governance::VotingConfig;
use prime_utils::{init_logging, LogFormat};

use crate::scenario::Scenario;

#[derive(Parser)]
#[command(name = "prime-vote", about = "Stake-weighted voting machine simulator")]
struct Cli {
    /// Log level: "trace", "debug", "info", "warn", "error".
    /// Overrides the scenario's `[log]` table.
    #[arg(long, env = "PRIME_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json". Overrides the scenario's `[log]` table.
    #[arg(long, env = "PRIME_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Replay a scenario file, printing each emitted event as a JSON line.
    Run {
        /// Path to the scenario TOML file.
        scenario: PathBuf,
    },
    /// Print the default machine configuration as TOML.
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run { scenario } => {
            let scenario = Scenario::from_toml_file(&scenario)?;
            init_logging(
                cli.log_format.unwrap_or(scenario.log.format),
                cli.log_level.as_deref().unwrap_or(&scenario.log.level),
            );
            tracing::info!(
                steps = scenario.steps.len(),
                accounts = scenario.accounts.len(),
                quorum_bps = scenario.machine.quorum_bps,
                "replaying scenario"
            );

            let events = scenario.run()?;
            for event in &events {
                let line = serde_json::to_string(event).context("failed to encode event")?;
                println!("{line}");
            }
            tracing::info!(events = events.len(), "scenario complete");
        }
        Command::Config => {
            print!("{}", VotingConfig::default().to_toml_string()?);
        }
    }

    Ok(())
}
