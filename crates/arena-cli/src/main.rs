//! arena — battle load-test runner.
//!
//! # Usage
//!
//! ```text
//! arena battle --config arena.toml --target 4 --fan-out 2
//! arena backfill --input livestreams.csv
//! arena config init
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::battle::BattleArgs;

const DEFAULT_LOG_FILTER: &str = "info,arena=debug";

#[derive(Parser)]
#[command(
    name = "arena",
    about = "Arena — scale LiveKit load-test pools and start battles",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Scale both pools, derive rooms and start a battle per room pair.
    Battle(BattleArgs),
    /// Publish completed livestream records from a file to Pub/Sub.
    Backfill {
        /// Record file: a header line, then `<id>  <start>  <end>` lines.
        #[arg(short, long)]
        input: PathBuf,
        /// Path to arena.toml (default: ./arena.toml if present).
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override [backfill].project.
        #[arg(long)]
        project: Option<String>,
        /// Override [backfill].topic.
        #[arg(long)]
        topic: Option<String>,
    },
    /// Manage arena.toml.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write an arena.toml scaffold with every default spelled out.
    Init {
        #[arg(short, long, default_value = "arena.toml")]
        path: PathBuf,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    match cli.command {
        Commands::Battle(args) => commands::battle::run(args).await,
        Commands::Backfill {
            input,
            config,
            project,
            topic,
        } => commands::backfill::run(&input, config.as_deref(), project, topic).await,
        Commands::Config { action } => match action {
            ConfigAction::Init { path, force } => commands::config::init(&path, force),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn battle_flags_parse() {
        let cli = Cli::try_parse_from([
            "arena",
            "battle",
            "--target",
            "4",
            "--fan-out",
            "3",
            "--concurrency",
            "2",
            "--namespace",
            "load",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.log_format, LogFormat::Json);
        let Commands::Battle(args) = cli.command else {
            panic!("expected battle");
        };
        assert_eq!(args.target, Some(4));
        assert_eq!(args.fan_out, Some(3));
        assert_eq!(args.concurrency, Some(2));
        assert_eq!(args.namespace.as_deref(), Some("load"));
    }

    #[test]
    fn backfill_requires_input() {
        assert!(Cli::try_parse_from(["arena", "backfill"]).is_err());
        assert!(Cli::try_parse_from(["arena", "backfill", "--input", "x.csv"]).is_ok());
    }

    #[test]
    fn config_init_defaults_path() {
        let cli = Cli::try_parse_from(["arena", "config", "init"]).unwrap();
        match cli.command {
            Commands::Config {
                action: ConfigAction::Init { path, force },
            } => {
                assert_eq!(path, PathBuf::from("arena.toml"));
                assert!(!force);
            }
            _ => panic!("expected config init"),
        }
    }
}
