//! band_replay - replay a band strategy over a CSV of bars
//!
//! Prints how often each signal fired and where the paper position ended.

use anyhow::{Context, Result};
use band_trade::config::{load_config, Config};
use band_trade::data::load_bars_csv;
use band_trade::replay::{replay, ReplaySummary};
use band_trade::{AdaptiveMaStrategy, VarBandStrategy};
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

/// Replay a band strategy bar by bar
#[derive(Parser, Debug)]
#[command(
    name = "band_replay",
    version = env!("CARGO_PKG_VERSION"),
    about = "Replay a VaR or adaptive moving-average band strategy over historical bars"
)]
struct Cli {
    /// CSV file with timestamp,open,high,low,close[,volume] rows
    #[arg(short, long, value_name = "FILE")]
    bars: PathBuf,

    /// TOML configuration file; defaults are used when omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Strategy to replay
    #[arg(short, long, value_enum, default_value_t = StrategyKind::VarBand)]
    strategy: StrategyKind,

    /// Paper cash the replay starts with
    #[arg(long, default_value_t = 10_000.0)]
    notional: f64,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Log one level more than configured; repeat for more
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Log at debug level or finer
    #[arg(long)]
    debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyKind {
    /// Log-normal VaR limit bands
    VarBand,
    /// Swing-adaptive moving-average bands
    AdaptiveMa,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    init_logging(cli.verbose, cli.debug, &config.logging.level)?;

    let bars = load_bars_csv(&cli.bars)
        .with_context(|| format!("Failed to load bars from {}", cli.bars.display()))?;
    tracing::info!(bars = bars.len(), strategy = ?cli.strategy, "starting replay");

    let summary = match cli.strategy {
        StrategyKind::VarBand => {
            let strategy = VarBandStrategy::new(config.var_band.clone())
                .context("Invalid VaR band configuration")?;
            replay(&strategy, &bars, cli.notional)
        }
        StrategyKind::AdaptiveMa => {
            let strategy = AdaptiveMaStrategy::new(config.adaptive_ma.clone())
                .context("Invalid adaptive MA configuration")?;
            replay(&strategy, &bars, cli.notional)
        }
    }
    .context("Replay failed")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(())
}

/// Levels from least to most verbose
const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Level after applying the command-line flags to the configured one
fn log_level(configured: &str, verbose: u8, debug: bool) -> Result<&'static str> {
    let configured = configured.to_ascii_lowercase();
    let mut index = LEVELS
        .iter()
        .position(|level| *level == configured)
        .with_context(|| format!("Invalid log level: {}", configured))?;
    if debug {
        index = index.max(3);
    }
    index = (index + usize::from(verbose)).min(LEVELS.len() - 1);
    Ok(LEVELS[index])
}

fn init_logging(verbose: u8, debug: bool, configured: &str) -> Result<()> {
    let level = log_level(configured, verbose, debug)?;
    fmt().with_env_filter(EnvFilter::new(level)).init();
    Ok(())
}

fn print_summary(summary: &ReplaySummary) {
    println!("Strategy:  {}", summary.strategy);
    println!("Evaluated: {}", summary.evaluated);
    println!("Skipped:   {}", summary.skipped);
    println!("Fills:     {}", summary.fills);
    if summary.decisions.is_empty() {
        println!("No signals");
    } else {
        println!("Signals:");
        for (reason, count) in &summary.decisions {
            println!("  {:<18} {}", format!("{:?}", reason), count);
        }
    }
    println!("Final quantity: {:.6}", summary.final_quantity);
    println!("Final exposure: {:.2}", summary.final_exposure);
}
