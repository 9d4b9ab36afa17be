//! Table rendering for every report the CLI prints.

use api_client::{BacktestResponse, MethodDescriptor, PortfolioResponse, SentimentResponse, StrategyDescriptor};
use backtester::BacktestResult;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};
use indicators::{MarketSummary, TechnicalSnapshot};
use optimizer::{DetailedMetrics, MonteCarloResult, OptimizationResult, PortfolioMetrics, PortfolioPoint};
use risk::RiskReport;
use sentiment::{SentimentLabel, SentimentResult, SentimentSummary};
use std::collections::BTreeMap;
use strategies::StrategyInfo;

fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn opt(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.decimals$}"))
}

fn signed(value: f64, text: String) -> Cell {
    let cell = Cell::new(text).set_alignment(CellAlignment::Right);
    if value > 0.0 {
        cell.fg(Color::Green)
    } else if value < 0.0 {
        cell.fg(Color::Red)
    } else {
        cell
    }
}

fn key_values(title: &str, rows: Vec<(&str, String)>) {
    let mut t = table();
    t.set_header(vec![title, ""]);
    for (key, value) in rows {
        t.add_row(vec![Cell::new(key), Cell::new(value).set_alignment(CellAlignment::Right)]);
    }
    println!("{t}");
}

// ==============================================================================
// Local Reports
// ==============================================================================

pub(crate) fn print_risk(symbol: &str, r: &RiskReport) {
    let c = pct(r.confidence_level);
    key_values(
        &format!("Risk report: {symbol}"),
        vec![
            ("Observations", r.observations.to_string()),
            ("Mean daily return", pct(r.mean_return)),
            ("Annualized return", pct(r.annualized_return)),
            ("Annualized volatility", pct(r.annualized_volatility)),
            ("Skewness", opt(r.skewness, 3)),
            ("Excess kurtosis", opt(r.excess_kurtosis, 3)),
            ("Sharpe ratio", opt(r.sharpe_ratio, 3)),
            ("Sortino ratio", opt(r.sortino_ratio, 3)),
            ("Max drawdown", pct(r.max_drawdown)),
            ("Horizon (days)", r.horizon_days.to_string()),
            (&format!("Historical VaR {c}"), pct(r.historical_var)),
            (&format!("Parametric VaR {c}"), pct(r.parametric_var)),
            (&format!("Monte Carlo VaR {c}"), pct(r.monte_carlo_var)),
            (&format!("CVaR {c}"), pct(r.conditional_var)),
        ],
    );
}

pub(crate) fn print_indicators(symbol: &str, s: &MarketSummary, t: &TechnicalSnapshot) {
    key_values(
        &format!("Market summary: {symbol}"),
        vec![
            ("Current price", format!("{:.2}", s.current_price)),
            ("Daily change", format!("{:+.2} ({:+.2}%)", s.daily_change, s.daily_change_pct)),
            ("Volume", format!("{:.0}", s.volume)),
            ("Average volume", format!("{:.0}", s.average_volume)),
            ("Period high", format!("{:.2}", s.period_high)),
            ("Period low", format!("{:.2}", s.period_low)),
            ("Annualized volatility", s.annualized_volatility.map_or("n/a".into(), pct)),
        ],
    );

    let band = |f: fn(&indicators::BollingerBand) -> f64| opt(t.bollinger.as_ref().map(f), 2);
    key_values(
        "Technical indicators",
        vec![
            ("SMA 20", opt(t.sma_20, 2)),
            ("SMA 50", opt(t.sma_50, 2)),
            ("EMA 12", opt(t.ema_12, 2)),
            ("EMA 26", opt(t.ema_26, 2)),
            ("RSI 14", opt(t.rsi_14, 2)),
            ("MACD", opt(t.macd, 4)),
            ("MACD signal", opt(t.macd_signal, 4)),
            ("MACD histogram", opt(t.macd_histogram, 4)),
            ("Bollinger upper", band(|b| b.upper)),
            ("Bollinger middle", band(|b| b.middle)),
            ("Bollinger lower", band(|b| b.lower)),
            ("Bollinger %b", opt(t.bollinger_percent_b, 2)),
        ],
    );
}

pub(crate) fn print_correlation(symbols: &[String], matrix: &[Vec<Option<f64>>]) {
    let mut t = table();
    t.set_header(std::iter::once(String::new()).chain(symbols.iter().cloned()));
    for (symbol, row) in symbols.iter().zip(matrix) {
        let mut cells = vec![Cell::new(symbol)];
        cells.extend(row.iter().map(|c| match c {
            Some(v) => signed(*v, format!("{v:.3}")),
            None => Cell::new("n/a"),
        }));
        t.add_row(cells);
    }
    println!("{t}");
}

pub(crate) fn print_backtest(result: &BacktestResult, show_trades: bool) {
    let r = &result.report;
    key_values(
        &format!("Backtest: {} on {}", result.strategy, result.symbol),
        vec![
            ("Initial equity", format!("{:.2}", r.initial_equity)),
            ("Final equity", format!("{:.2}", r.final_equity)),
            ("Total return", pct(r.total_return)),
            ("Annualized return", pct(r.annualized_return)),
            ("Volatility", pct(r.volatility)),
            ("Sharpe ratio", opt(r.sharpe_ratio, 3)),
            ("Max drawdown", pct(r.max_drawdown)),
            ("Calmar ratio", opt(r.calmar_ratio, 3)),
            ("Trades", r.total_trades.to_string()),
            ("Win rate", pct(r.win_rate)),
            ("Net profit", format!("{:.2}", r.total_net_profit)),
            ("Profit factor", opt(r.profit_factor, 2)),
            ("Average win", format!("{:.2}", r.average_win)),
            ("Average loss", format!("{:.2}", r.average_loss)),
            ("Payoff ratio", opt(r.payoff_ratio, 2)),
            ("Average holding (days)", format!("{:.1}", r.average_holding_days())),
        ],
    );

    if show_trades && !result.trades.is_empty() {
        let mut t = table();
        t.set_header(vec!["Entry", "Exit", "Qty", "Entry px", "Exit px", "PnL", "Return", "Days"]);
        for trade in &result.trades {
            t.add_row(vec![
                Cell::new(trade.entry_time.format("%Y-%m-%d")),
                Cell::new(trade.exit_time.format("%Y-%m-%d")),
                Cell::new(trade.quantity),
                Cell::new(format!("{:.2}", trade.entry_price)),
                Cell::new(format!("{:.2}", trade.exit_price)),
                Cell::new(format!("{:.2}", trade.pnl)),
                signed(trade.pnl_pct, pct(trade.pnl_pct)),
                Cell::new(trade.holding_period_days),
            ]);
        }
        println!("{t}");
    }
}

fn metrics_cells(m: &PortfolioMetrics) -> Vec<Cell> {
    vec![
        signed(m.expected_return, pct(m.expected_return)),
        Cell::new(pct(m.volatility)),
        Cell::new(opt(m.sharpe_ratio, 3)),
    ]
}

fn weights_table(symbols: &[String], weights: &[f64]) {
    let mut t = table();
    t.set_header(vec!["Symbol", "Weight"]);
    for (symbol, w) in symbols.iter().zip(weights) {
        t.add_row(vec![Cell::new(symbol), Cell::new(pct(*w)).set_alignment(CellAlignment::Right)]);
    }
    println!("{t}");
}

pub(crate) fn print_optimization(result: &OptimizationResult, detailed: Option<&DetailedMetrics>) {
    let m = &result.metrics;
    key_values(
        &result.method.description(),
        vec![
            ("Expected return", pct(m.expected_return)),
            ("Volatility", pct(m.volatility)),
            ("Sharpe ratio", opt(m.sharpe_ratio, 3)),
            ("Constraints satisfied", result.constraints_satisfied.to_string()),
            ("Iterations", result.iterations.to_string()),
            ("Time", format!("{:.1} ms", result.elapsed.as_secs_f64() * 1e3)),
        ],
    );
    weights_table(&result.symbols, &result.weights);

    if let Some(d) = detailed {
        key_values(
            "Historical risk of this weighting",
            vec![
                ("Skewness", opt(d.skewness, 3)),
                ("Excess kurtosis", opt(d.excess_kurtosis, 3)),
                ("VaR 95% (daily)", pct(d.var_95)),
                ("CVaR 95% (daily)", pct(d.cvar_95)),
                ("Max drawdown", pct(d.max_drawdown)),
            ],
        );
    }
}

pub(crate) fn print_comparison(results: &[OptimizationResult]) {
    let Some(first) = results.first() else {
        return;
    };
    let mut t = table();
    let mut header = vec!["Method".to_string(), "Return".into(), "Volatility".into(), "Sharpe".into()];
    header.extend(first.symbols.iter().cloned());
    t.set_header(header);
    for result in results {
        let mut cells = vec![Cell::new(result.method.name())];
        cells.extend(metrics_cells(&result.metrics));
        cells.extend(result.weights.iter().map(|w| Cell::new(pct(*w)).set_alignment(CellAlignment::Right)));
        t.add_row(cells);
    }
    println!("{t}");
}

pub(crate) fn print_frontier(symbols: &[String], frontier: &[PortfolioPoint]) {
    let mut t = table();
    let mut header = vec!["Return".to_string(), "Volatility".into(), "Sharpe".into()];
    header.extend(symbols.iter().cloned());
    t.set_header(header);
    for point in frontier {
        let mut cells = metrics_cells(&point.metrics);
        cells.extend(point.weights.iter().map(|w| Cell::new(pct(*w)).set_alignment(CellAlignment::Right)));
        t.add_row(cells);
    }
    println!("{t}");
}

pub(crate) fn print_monte_carlo(result: &MonteCarloResult) {
    println!("{} random portfolios", result.portfolios.len());
    let picks = [("Best Sharpe", result.best_sharpe), ("Minimum volatility", result.min_volatility)];
    for (title, index) in picks {
        let Some(point) = index.and_then(|i| result.portfolios.get(i)) else {
            continue;
        };
        let m = &point.metrics;
        key_values(
            title,
            vec![
                ("Expected return", pct(m.expected_return)),
                ("Volatility", pct(m.volatility)),
                ("Sharpe ratio", opt(m.sharpe_ratio, 3)),
            ],
        );
        weights_table(&result.symbols, &point.weights);
    }
}

fn label_cell(label: SentimentLabel) -> Cell {
    let cell = Cell::new(label);
    match label {
        SentimentLabel::Positive => cell.fg(Color::Green),
        SentimentLabel::Negative => cell.fg(Color::Red),
        SentimentLabel::Neutral => cell,
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        format!("{}…", text.chars().take(max - 1).collect::<String>())
    }
}

pub(crate) fn print_sentiment(results: &[SentimentResult], summary: Option<&SentimentSummary>) {
    let mut t = table();
    t.set_header(vec!["Text", "Label", "Polarity", "Compound", "Financial", "Confidence"]);
    for r in results {
        t.add_row(vec![
            Cell::new(truncate(&r.text, 60)),
            label_cell(r.label),
            signed(r.polarity, format!("{:+.3}", r.polarity)),
            Cell::new(format!("{:+.3}", r.compound_score)),
            Cell::new(format!("{:+.3}", r.financial_score)),
            Cell::new(format!("{:.2}", r.confidence)),
        ]);
    }
    println!("{t}");

    if let Some(s) = summary.filter(|s| s.total_analyzed > 1) {
        key_values(
            "Summary",
            vec![
                ("Texts", s.total_analyzed.to_string()),
                ("Average polarity", format!("{:+.3}", s.avg_polarity)),
                ("Polarity std dev", format!("{:.3}", s.std_polarity)),
                ("Average confidence", format!("{:.2}", s.avg_confidence)),
                ("Positive", pct(s.positive_ratio)),
                ("Negative", pct(s.negative_ratio)),
                ("Neutral", pct(s.neutral_ratio)),
            ],
        );
    }
}

pub(crate) fn print_catalog(strategies: &[StrategyInfo], methods: &[(String, String)]) {
    let mut t = table();
    t.set_header(vec!["Strategy", "Description", "Parameters"]);
    for s in strategies {
        t.add_row(vec![s.name.clone(), s.description.clone(), s.parameters.join(", ")]);
    }
    println!("{t}");

    let mut t = table();
    t.set_header(vec!["Optimization method", "Description"]);
    for (name, description) in methods {
        t.add_row(vec![name, description]);
    }
    println!("{t}");
}

// ==============================================================================
// Remote Responses
// ==============================================================================

pub(crate) fn print_remote_strategies(strategies: &[StrategyDescriptor]) {
    let mut t = table();
    t.set_header(vec!["Strategy", "Description", "Parameters"]);
    for s in strategies {
        t.add_row(vec![s.name.clone(), s.description.clone(), s.parameters.join(", ")]);
    }
    println!("{t}");
}

pub(crate) fn print_remote_methods(methods: &[MethodDescriptor]) {
    let mut t = table();
    t.set_header(vec!["Method", "Description"]);
    for m in methods {
        t.add_row(vec![&m.name, &m.description]);
    }
    println!("{t}");
}

pub(crate) fn print_remote_sentiment(results: &[SentimentResponse], summary: Option<&BTreeMap<String, f64>>) {
    let mut t = table();
    t.set_header(vec!["Text", "Label", "Polarity", "Compound", "Confidence"]);
    for r in results {
        t.add_row(vec![
            Cell::new(truncate(&r.text, 60)),
            Cell::new(&r.sentiment),
            signed(r.polarity, format!("{:+.3}", r.polarity)),
            Cell::new(format!("{:+.3}", r.compound_score)),
            Cell::new(format!("{:.2}", r.confidence)),
        ]);
    }
    println!("{t}");

    if let Some(summary) = summary {
        key_values(
            "Summary",
            summary.iter().map(|(k, v)| (k.as_str(), format!("{v:.3}"))).collect(),
        );
    }
}

pub(crate) fn print_remote_portfolio(r: &PortfolioResponse) {
    key_values(
        &format!("Remote optimization: {}", r.method),
        vec![
            ("Expected return", pct(r.expected_return)),
            ("Volatility", pct(r.volatility)),
            ("Sharpe ratio", format!("{:.3}", r.sharpe_ratio)),
            ("Time", format!("{:.1} ms", r.optimization_time * 1e3)),
        ],
    );
    let (symbols, weights): (Vec<String>, Vec<f64>) = r.weights.iter().map(|(s, w)| (s.clone(), *w)).unzip();
    weights_table(&symbols, &weights);
}

pub(crate) fn print_remote_backtest(r: &BacktestResponse) {
    key_values(
        &format!("Remote backtest: {} on {}", r.strategy, r.symbol),
        vec![
            ("Total return", pct(r.total_return)),
            ("Annualized return", pct(r.annualized_return)),
            ("Volatility", pct(r.volatility)),
            ("Sharpe ratio", format!("{:.3}", r.sharpe_ratio)),
            ("Max drawdown", pct(r.max_drawdown)),
            ("Win rate", pct(r.win_rate)),
            ("Trades", r.total_trades.to_string()),
        ],
    );
    if !r.trades.is_empty() {
        let mut t = table();
        t.set_header(vec!["Entry", "Exit", "Qty", "Entry px", "Exit px", "PnL", "Return", "Days"]);
        for trade in &r.trades {
            t.add_row(vec![
                Cell::new(&trade.entry_date),
                Cell::new(&trade.exit_date),
                Cell::new(trade.quantity),
                Cell::new(format!("{:.2}", trade.entry_price)),
                Cell::new(format!("{:.2}", trade.exit_price)),
                Cell::new(format!("{:.2}", trade.pnl)),
                signed(trade.pnl_pct, pct(trade.pnl_pct)),
                Cell::new(trade.holding_period),
            ]);
        }
        println!("{t}");
    }
}
