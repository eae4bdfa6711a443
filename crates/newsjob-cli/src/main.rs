use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use newsjob_infrastructure::{ConfigService, NewsJobPaths};
use newsjob_telemetry::LogFormat;

mod commands;

#[derive(Parser)]
#[command(name = "newsjob")]
#[command(about = "NEWSJOB CLI - news crew job sessions against a simulated world", long_about = None)]
struct Cli {
    /// Directory holding config.toml (defaults to the platform config dir)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Log output format: pretty or json
    #[arg(long, global = true, default_value = "pretty")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect or create the job configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Play a scripted shift and print what the world saw
    Simulate {
        /// Seconds spent on air in front of observers
        #[arg(long, default_value_t = 130)]
        seconds: u64,
        /// Seed for the payout and upload delay draws
        #[arg(long, default_value_t = 7)]
        seed: u64,
        /// Print the final receipt as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive shell driving one actor's session
    Repl,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Write the default configuration if none exists
    Init,
    /// Print the config file location
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = NewsJobPaths::new(cli.config_dir);
    let config_service = ConfigService::new(&paths)?;

    match cli.command {
        Commands::Config { action } => {
            init_logging(cli.log_format)?;
            match action {
                ConfigAction::Show => commands::config::show(&config_service)?,
                ConfigAction::Init => commands::config::init(&config_service)?,
                ConfigAction::Path => commands::config::path(&config_service),
            }
        }
        Commands::Simulate {
            seconds,
            seed,
            json,
        } => {
            init_logging(cli.log_format)?;
            let config = config_service.load()?;
            commands::simulate::run(config, seconds, seed, json)?;
        }
        Commands::Repl => {
            let events = newsjob_telemetry::init_tracing_with_events()
                .map_err(|err| anyhow!("Failed to install log subscriber: {err}"))?;
            let config = config_service.load()?;
            commands::repl::run(config, events, cli.log_format).await?;
        }
    }

    Ok(())
}

fn init_logging(format: LogFormat) -> Result<()> {
    newsjob_telemetry::init_tracing(format)
        .map_err(|err| anyhow!("Failed to install log subscriber: {err}"))
}
