use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

mod commands;

use commands::adjust::OutputFormat;

#[derive(Parser)]
#[command(name = "cbt")]
#[command(about = "Catalyst backtest CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild split/dividend adjusted closes from a prices CSV
    Adjust {
        /// Prices CSV (ticker,date,close[,dividend][,split_coefficient])
        #[arg(long)]
        prices: String,

        /// Only adjust this ticker
        #[arg(long)]
        ticker: Option<String>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Refuse config keys this command does not read
        #[arg(long, default_value_t = false)]
        strict_config: bool,
    },

    /// Print a data-quality report per ticker
    Inspect {
        #[arg(long)]
        prices: String,
    },

    /// Measure forward returns after catalyst events
    Backtest {
        #[arg(long)]
        prices: String,

        /// Events CSV (ticker,event_date,catalyst)
        #[arg(long)]
        events: String,

        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,

        #[arg(long, default_value_t = false)]
        strict_config: bool,

        /// Window lengths in trading days, e.g. 1,3,5
        #[arg(long, value_delimiter = ',')]
        windows: Vec<u32>,

        /// Keep only events with this catalyst label
        #[arg(long)]
        catalyst: Option<String>,

        /// Keep only events within N calendar days before --as-of
        #[arg(long)]
        lookback_days: Option<u32>,

        /// Reference date for --lookback-days (default: latest bar date)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Emit one result per ticker instead of a combined result
        #[arg(long, default_value_t = false)]
        per_ticker: bool,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> overrides)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Adjust {
            prices,
            ticker,
            format,
            config_paths,
            strict_config,
        } => {
            commands::adjust::run(commands::adjust::AdjustArgs {
                prices,
                ticker,
                format,
                config_paths,
                strict_config,
            })
            .await?;
        }

        Commands::Inspect { prices } => {
            commands::inspect::run(&prices)?;
        }

        Commands::Backtest {
            prices,
            events,
            config_paths,
            strict_config,
            windows,
            catalyst,
            lookback_days,
            as_of,
            per_ticker,
        } => {
            commands::backtest::run(commands::backtest::BacktestArgs {
                prices,
                events,
                config_paths,
                strict_config,
                windows,
                catalyst,
                lookback_days,
                as_of,
                per_ticker,
            })
            .await?;
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = cbt_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}

/// Logs go to stderr; stdout carries only command output.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
