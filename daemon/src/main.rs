//! Peggy daemon: replays message logs into a bridge store and reports its
//! state.

mod replay;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;

use peggy_node::tracing_spans::replay_span;
use peggy_node::{open_app, NodeConfig};
use peggy_utils::{init_logging, LogFormat};

#[derive(Parser)]
#[command(name = "peggy-daemon", about = "Peggy bridge daemon")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base; CLI
    /// flags and env vars override them.
    #[arg(long, env = "PEGGY_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the LMDB store.
    #[arg(long, env = "PEGGY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level filter, e.g. "info" or "info,peggy_bridge=debug".
    #[arg(long, env = "PEGGY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "PEGGY_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Deliver every message of a JSON-lines log to the store.
    Replay {
        /// The message log.
        file: PathBuf,

        /// Abort at the first rejected message.
        #[arg(long)]
        stop_on_error: bool,

        /// Write the node's Prometheus metrics to this file once the replay
        /// ends.
        #[arg(long)]
        metrics_file: Option<PathBuf>,
    },
    /// Print the bridge state as JSON.
    Status,
    /// Print the effective configuration as TOML.
    ShowConfig,
}

fn resolve_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => NodeConfig::default(),
    };
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    init_logging(config.log_format, &config.log_level)?;

    match cli.command {
        Command::Replay {
            file,
            stop_on_error,
            metrics_file,
        } => {
            let mut app = open_app(&config)?;
            let reader = BufReader::new(
                File::open(&file).with_context(|| format!("opening {}", file.display()))?,
            );
            let summary = {
                let _span = replay_span(&file.display().to_string()).entered();
                replay::replay(&mut app, reader, stop_on_error)
            };
            if let Some(path) = &metrics_file {
                std::fs::write(path, app.metrics().encode_text()?)
                    .with_context(|| format!("writing metrics to {}", path.display()))?;
            }
            let summary = summary?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Status => {
            let app = open_app(&config)?;
            println!("{}", serde_json::to_string_pretty(&app.status()?)?);
        }
        Command::ShowConfig => {
            tracing::debug!(data_dir = %config.data_dir.display(), "resolved config");
            print!("{}", config.to_toml_string()?);
        }
    }
    Ok(())
}
