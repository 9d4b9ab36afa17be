use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use configuration::{load_config, LoggingSettings};
use core_types::StrategyId;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod output;

/// The main entry point for the finscope analytics toolkit.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; FINSCOPE__* variables may come from the shell.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    let _guard = init_logging(&config.logging, cli.verbose)?;

    commands::run(cli.command, &config, cli.json).await
}

/// Installs the stderr logger and, when a log directory is configured, a daily
/// rolling file. `RUST_LOG` overrides the configured level.
fn init_logging(settings: &LoggingSettings, verbose: bool) -> anyhow::Result<Option<WorkerGuard>> {
    let default_level = if verbose { "debug" } else { settings.level.as_str() };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    match &settings.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, &settings.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .try_init()?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stderr_layer).try_init()?;
            Ok(None)
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Financial analytics from the command line: risk, indicators, backtests,
/// portfolio optimization and sentiment.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Print results as JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Risk report (VaR, CVaR, drawdown, ratios) for one price history.
    Risk(RiskArgs),
    /// Latest technical indicators and a market summary for one price history.
    Indicators(PriceInput),
    /// Pearson correlation matrix of daily returns.
    Correlation(UniverseInput),
    /// Replay a strategy over one price history.
    Backtest(BacktestArgs),
    /// Optimal portfolio weights for a set of symbols.
    Optimize(OptimizeArgs),
    /// Minimum-variance portfolios across a range of target returns.
    Frontier(FrontierArgs),
    /// Random portfolios and the best of them.
    MonteCarlo(MonteCarloArgs),
    /// Score the sentiment of headlines or posts.
    Sentiment(SentimentArgs),
    /// List the built-in strategies and optimization methods.
    Strategies,
    /// Call the remote analytics API.
    #[command(subcommand)]
    Remote(RemoteCommands),
}

/// Where a single price history comes from.
#[derive(Args, Clone)]
pub(crate) struct PriceInput {
    /// A CSV file with Date,Open,High,Low,Close,Volume columns.
    #[arg(long, conflicts_with = "symbol", required_unless_present = "symbol")]
    pub csv: Option<PathBuf>,

    /// A ticker to download from the chart API.
    #[arg(long)]
    pub symbol: Option<String>,

    /// Look-back window: 1mo, 3mo, 6mo, 1y, 2y, 5y or max.
    #[arg(long)]
    pub period: Option<String>,
}

/// Where the histories of several symbols come from.
#[derive(Args, Clone)]
pub(crate) struct UniverseInput {
    /// Comma-separated tickers, e.g. AAPL,MSFT,GOOGL.
    #[arg(long, value_delimiter = ',', num_args = 1.., required = true)]
    pub symbols: Vec<String>,

    /// Read `<SYMBOL>.csv` files from this directory instead of downloading.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Look-back window: 1mo, 3mo, 6mo, 1y, 2y, 5y or max.
    #[arg(long)]
    pub period: Option<String>,
}

#[derive(Args)]
pub(crate) struct RiskArgs {
    #[command(flatten)]
    pub input: PriceInput,

    /// Overrides `risk.confidence_level`.
    #[arg(long)]
    pub confidence: Option<f64>,

    /// Overrides `risk.horizon_days`.
    #[arg(long)]
    pub horizon: Option<u32>,
}

#[derive(Args)]
pub(crate) struct BacktestArgs {
    #[command(flatten)]
    pub input: PriceInput,

    /// moving_average or rsi.
    #[arg(long, default_value = "moving_average")]
    pub strategy: StrategyId,

    /// Show every completed trade.
    #[arg(long)]
    pub trades: bool,
}

#[derive(Args)]
pub(crate) struct OptimizeArgs {
    #[command(flatten)]
    pub universe: UniverseInput,

    /// max_sharpe, min_variance, risk_parity, target:<annual return> or compare.
    #[arg(long, default_value = "max_sharpe")]
    pub method: String,
}

#[derive(Args)]
pub(crate) struct FrontierArgs {
    #[command(flatten)]
    pub universe: UniverseInput,

    /// Overrides `portfolio.frontier_points`.
    #[arg(long)]
    pub points: Option<usize>,
}

#[derive(Args)]
pub(crate) struct MonteCarloArgs {
    #[command(flatten)]
    pub universe: UniverseInput,

    /// Overrides `portfolio.monte_carlo_simulations`.
    #[arg(long)]
    pub simulations: Option<usize>,

    /// Overrides `portfolio.seed`.
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args)]
pub(crate) struct SentimentArgs {
    /// Texts to analyze.
    pub texts: Vec<String>,

    /// Also read one text per line from this file.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub(crate) enum RemoteCommands {
    /// Check that the API is up.
    Health,
    /// Strategies the API can backtest.
    Strategies,
    /// Optimization methods the API supports.
    Methods,
    /// Remote market data summary for a list of symbols.
    MarketData {
        #[arg(long, value_delimiter = ',', num_args = 1.., required = true)]
        symbols: Vec<String>,
        #[arg(long, default_value = "1y")]
        period: String,
    },
    /// Remote sentiment scoring; several texts are sent as one batch.
    Sentiment { texts: Vec<String> },
    /// Remote portfolio optimization.
    Optimize {
        #[arg(long, value_delimiter = ',', num_args = 1.., required = true)]
        symbols: Vec<String>,
        #[arg(long, default_value = "max_sharpe")]
        method: String,
    },
    /// Remote backtest between two dates (YYYY-MM-DD).
    Backtest {
        #[arg(long)]
        symbol: String,
        #[arg(long, default_value = "moving_average")]
        strategy: StrategyId,
        #[arg(long)]
        from: chrono::NaiveDate,
        #[arg(long)]
        to: chrono::NaiveDate,
    },
}
