use crate::output;
use crate::{
    BacktestArgs, Commands, FrontierArgs, MonteCarloArgs, OptimizeArgs, PriceInput, RemoteCommands,
    RiskArgs, SentimentArgs, UniverseInput,
};
use anyhow::{bail, Context};
use api_client::{
    fetch_many, load_csv_for_period, BacktestRequest, CsvSource, DashboardApiClient, MarketDataSource, Period,
    PortfolioOptimizationRequest, YahooClient,
};
use backtester::Backtester;
use configuration::Config;
use core_types::{closes, Kline, OptimizationMethod};
use indicators::{MarketSummary, TechnicalSnapshot};
use optimizer::{MarketModel, PortfolioOptimizer};
use risk::RiskAnalyzer;
use rust_decimal::prelude::ToPrimitive;
use sentiment::{summarize, SentimentAnalyzer};
use serde::Serialize;
use strategies::{available_strategies, create_strategy};
use tracing::{info, warn};

/// Dispatches a parsed command.
pub(crate) async fn run(command: Commands, config: &Config, json: bool) -> anyhow::Result<()> {
    match command {
        Commands::Risk(args) => handle_risk(args, config, json).await,
        Commands::Indicators(input) => handle_indicators(input, config, json).await,
        Commands::Correlation(universe) => handle_correlation(universe, config, json).await,
        Commands::Backtest(args) => handle_backtest(args, config, json).await,
        Commands::Optimize(args) => handle_optimize(args, config, json).await,
        Commands::Frontier(args) => handle_frontier(args, config, json).await,
        Commands::MonteCarlo(args) => handle_monte_carlo(args, config, json).await,
        Commands::Sentiment(args) => handle_sentiment(args, config, json),
        Commands::Strategies => handle_strategies(json),
        Commands::Remote(remote) => handle_remote(remote, config, json).await,
    }
}

fn emit<T: Serialize>(json: bool, value: &T, table: impl FnOnce(&T)) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        table(value);
    }
    Ok(())
}

// ==============================================================================
// Data Loading
// ==============================================================================

fn period(raw: Option<&str>, config: &Config) -> anyhow::Result<Period> {
    Ok(raw.unwrap_or(&config.api.default_period).parse()?)
}

/// Loads one history, from a CSV file or the chart API.
async fn load_history(input: &PriceInput, config: &Config) -> anyhow::Result<(String, Vec<Kline>)> {
    let period = period(input.period.as_deref(), config)?;
    if let Some(path) = &input.csv {
        let klines = api_client::clean_klines(&path.display().to_string(), load_csv_for_period(path, period)?);
        let symbol = input
            .symbol
            .clone()
            .or_else(|| path.file_stem().map(|s| s.to_string_lossy().to_uppercase()))
            .unwrap_or_else(|| "CSV".to_string());
        return Ok((symbol, klines));
    }
    let symbol = input.symbol.clone().context("either --csv or --symbol is required")?;
    let client = YahooClient::new(&config.api)?;
    let klines = api_client::clean_klines(&symbol, client.fetch_history(&symbol, period).await?);
    Ok((symbol, klines))
}

/// Loads every symbol of a universe; symbols that fail are dropped with a warning.
async fn load_universe(universe: &UniverseInput, config: &Config) -> anyhow::Result<Vec<(String, Vec<Kline>)>> {
    let period = period(universe.period.as_deref(), config)?;
    let symbols: Vec<String> = universe.symbols.iter().map(|s| s.trim().to_uppercase()).collect();
    let histories = match &universe.data_dir {
        Some(dir) => fetch_many(&CsvSource::new(dir), &symbols, period, config.api.max_concurrency).await,
        None => {
            let client = YahooClient::new(&config.api)?;
            fetch_many(&client, &symbols, period, config.api.max_concurrency).await
        }
    };
    if histories.len() < symbols.len() {
        warn!(requested = symbols.len(), loaded = histories.len(), "Some symbols could not be loaded");
    }
    Ok(histories)
}

async fn load_optimizer(universe: &UniverseInput, config: &Config) -> anyhow::Result<PortfolioOptimizer> {
    let histories = load_universe(universe, config).await?;
    let model = MarketModel::from_price_history(&histories, config.portfolio.trading_days)?;
    Ok(PortfolioOptimizer::new(model, &config.portfolio)?)
}

// ==============================================================================
// Command Handlers
// ==============================================================================

async fn handle_risk(args: RiskArgs, config: &Config, json: bool) -> anyhow::Result<()> {
    let (symbol, klines) = load_history(&args.input, config).await?;
    let mut settings = config.risk.clone();
    if let Some(confidence) = args.confidence {
        settings.confidence_level = confidence;
    }
    if let Some(horizon) = args.horizon {
        settings.horizon_days = horizon;
    }

    let analyzer = RiskAnalyzer::new(settings, config.portfolio.risk_free_rate, config.portfolio.trading_days)?;
    let report = analyzer.analyze_prices(&closes(&klines)?)?;
    info!(%symbol, observations = report.observations, "Risk report ready");
    emit(json, &report, |r| output::print_risk(&symbol, r))
}

async fn handle_indicators(input: PriceInput, config: &Config, json: bool) -> anyhow::Result<()> {
    let (symbol, klines) = load_history(&input, config).await?;
    let snapshot = TechnicalSnapshot::from_closes(&closes(&klines)?)?;
    let summary = MarketSummary::from_klines(&klines)?;

    #[derive(Serialize)]
    struct IndicatorsView<'a> {
        symbol: &'a str,
        summary: &'a MarketSummary,
        technical: &'a TechnicalSnapshot,
    }
    let view = IndicatorsView {
        symbol: &symbol,
        summary: &summary,
        technical: &snapshot,
    };
    emit(json, &view, |v| output::print_indicators(v.symbol, v.summary, v.technical))
}

async fn handle_correlation(universe: UniverseInput, config: &Config, json: bool) -> anyhow::Result<()> {
    let histories = load_universe(&universe, config).await?;
    if histories.len() < 2 {
        bail!("correlation needs at least two symbols with data");
    }
    // Align on common dates through the market model so every column has equal length.
    let model = MarketModel::from_price_history(&histories, config.portfolio.trading_days)?;
    let matrix = risk::correlation_matrix(&model.asset_returns())?;

    #[derive(Serialize)]
    struct CorrelationView<'a> {
        symbols: &'a [String],
        matrix: &'a [Vec<Option<f64>>],
    }
    let view = CorrelationView {
        symbols: model.symbols(),
        matrix: &matrix,
    };
    emit(json, &view, |v| output::print_correlation(v.symbols, v.matrix))
}

async fn handle_backtest(args: BacktestArgs, config: &Config, json: bool) -> anyhow::Result<()> {
    let (symbol, klines) = load_history(&args.input, config).await?;
    let mut strategy = create_strategy(args.strategy, config, &symbol)?;
    let backtester =
        Backtester::new(config.simulation.clone(), config.portfolio.risk_free_rate).with_progress(!json);
    let result = backtester.run(strategy.as_mut(), &klines, &symbol)?;
    info!(%symbol, trades = result.trades.len(), "Backtest complete");
    emit(json, &result, |r| output::print_backtest(r, args.trades))
}

async fn handle_optimize(args: OptimizeArgs, config: &Config, json: bool) -> anyhow::Result<()> {
    let optimizer = load_optimizer(&args.universe, config).await?;

    if args.method.trim().eq_ignore_ascii_case("compare") {
        let results = optimizer.compare_methods();
        if results.is_empty() {
            bail!("every optimization method failed");
        }
        return emit(json, &results, |r| output::print_comparison(r));
    }

    let method: OptimizationMethod = args.method.parse()?;
    let result = optimizer.optimize(method)?;
    let detailed = optimizer.detailed_metrics(&result.weights)?;

    #[derive(Serialize)]
    struct OptimizeView<'a> {
        result: &'a optimizer::OptimizationResult,
        detailed: &'a optimizer::DetailedMetrics,
    }
    let view = OptimizeView {
        result: &result,
        detailed: &detailed,
    };
    emit(json, &view, |v| output::print_optimization(v.result, Some(v.detailed)))
}

async fn handle_frontier(args: FrontierArgs, config: &Config, json: bool) -> anyhow::Result<()> {
    let optimizer = load_optimizer(&args.universe, config).await?;
    let points = args.points.unwrap_or(config.portfolio.frontier_points);
    let frontier = optimizer.efficient_frontier(points)?;
    info!(requested = points, solved = frontier.len(), "Efficient frontier computed");
    emit(json, &frontier, |f| output::print_frontier(optimizer.model().symbols(), f))
}

async fn handle_monte_carlo(args: MonteCarloArgs, config: &Config, json: bool) -> anyhow::Result<()> {
    let optimizer = load_optimizer(&args.universe, config).await?;
    let simulations = args.simulations.unwrap_or(config.portfolio.monte_carlo_simulations);
    let result = optimizer.monte_carlo(simulations, args.seed.or(config.portfolio.seed));
    emit(json, &result, output::print_monte_carlo)
}

fn handle_sentiment(args: SentimentArgs, config: &Config, json: bool) -> anyhow::Result<()> {
    let mut texts = args.texts;
    if let Some(path) = &args.file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        texts.extend(content.lines().filter(|l| !l.trim().is_empty()).map(str::to_string));
    }
    if texts.is_empty() {
        bail!("no text to analyze; pass texts as arguments or --file");
    }

    let analyzer = SentimentAnalyzer::new(config.sentiment.clone())?;
    let results = analyzer.analyze_batch(&texts);
    let summary = summarize(&results);

    #[derive(Serialize)]
    struct SentimentView<'a> {
        results: &'a [sentiment::SentimentResult],
        summary: &'a Option<sentiment::SentimentSummary>,
    }
    let view = SentimentView {
        results: &results,
        summary: &summary,
    };
    emit(json, &view, |v| output::print_sentiment(v.results, v.summary.as_ref()))
}

fn handle_strategies(json: bool) -> anyhow::Result<()> {
    let strategies = available_strategies();
    let methods: Vec<(String, String)> = OptimizationMethod::COMPARED
        .iter()
        .map(|m| (m.name().to_string(), m.description()))
        .chain(std::iter::once((
            "target:<r>".to_string(),
            "Minimum variance with an annual return floor".to_string(),
        )))
        .collect();

    #[derive(Serialize)]
    struct CatalogView<'a> {
        strategies: &'a [strategies::StrategyInfo],
        methods: &'a [(String, String)],
    }
    let view = CatalogView {
        strategies: &strategies,
        methods: &methods,
    };
    emit(json, &view, |v| output::print_catalog(v.strategies, v.methods))
}

// ==============================================================================
// Remote API
// ==============================================================================

async fn handle_remote(command: RemoteCommands, config: &Config, json: bool) -> anyhow::Result<()> {
    let client = DashboardApiClient::new(&config.api)?;
    info!(base_url = client.base_url(), "Calling remote analytics API");

    match command {
        RemoteCommands::Health => {
            let health = client.health().await?;
            emit(json, &health, |h| println!("{} ({})", h.status, h.timestamp))
        }
        RemoteCommands::Strategies => {
            let strategies = client.strategies().await?;
            emit(json, &strategies, |s| output::print_remote_strategies(s))
        }
        RemoteCommands::Methods => {
            let methods = client.optimization_methods().await?;
            emit(json, &methods, |m| output::print_remote_methods(m))
        }
        RemoteCommands::MarketData { symbols, period } => {
            // Validate locally so a typo fails before the round trip.
            let period: Period = period.parse()?;
            let response = client.market_data(&symbols, period.as_str()).await?;
            if !response.success {
                warn!(message = %response.message, "Remote market data request was not successful");
            }
            // The payload is free-form JSON either way.
            println!("{}", serde_json::to_string_pretty(&response.data)?);
            Ok(())
        }
        RemoteCommands::Sentiment { texts } => match texts.as_slice() {
            [] => bail!("no text to analyze"),
            [text] => {
                let result = client.sentiment(text).await?;
                emit(json, &result, |r| output::print_remote_sentiment(std::slice::from_ref(r), None))
            }
            _ => {
                let batch = client.sentiment_batch(&texts).await?;
                emit(json, &batch, |b| output::print_remote_sentiment(&b.results, Some(&b.summary)))
            }
        },
        RemoteCommands::Optimize { symbols, method } => {
            let request =
                PortfolioOptimizationRequest::new(symbols, config.portfolio.risk_free_rate, method.parse()?)?;
            let response = client.optimize_portfolio(&request).await?;
            emit(json, &response, output::print_remote_portfolio)
        }
        RemoteCommands::Backtest { symbol, strategy, from, to } => {
            if from >= to {
                bail!("--from must be before --to");
            }
            let request = BacktestRequest {
                symbol,
                strategy: strategy.name().to_string(),
                start_date: from.format("%Y-%m-%d").to_string(),
                end_date: to.format("%Y-%m-%d").to_string(),
                initial_cash: config
                    .simulation
                    .initial_capital
                    .to_f64()
                    .context("initial_capital does not fit in f64")?,
            };
            let response = client.backtest(&request).await?;
            emit(json, &response, output::print_remote_backtest)
        }
    }
}
