use crate::error::IndicatorError;
use crate::momentum::{macd, rsi, RsiSmoothing};
use crate::moving_average::{ema, sma};
use crate::volatility::{bollinger_bands, BollingerBand};
use core_types::Kline;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

const TRADING_DAYS: f64 = 252.0;

/// The latest value of each standard indicator for one price series.
///
/// Fields are `None` when the series is too short for the indicator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub ema_12: Option<f64>,
    pub ema_26: Option<f64>,
    pub rsi_14: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub bollinger: Option<BollingerBand>,
    /// Where the last close sits inside the band.
    pub bollinger_percent_b: Option<f64>,
}

impl TechnicalSnapshot {
    pub fn from_closes(closes: &[f64]) -> Result<Self, IndicatorError> {
        if closes.is_empty() {
            return Ok(Self::default());
        }
        let last = |series: Vec<Option<f64>>| series.last().copied().flatten();
        let macd = macd(closes, 12, 26, 9)?;
        let bollinger = bollinger_bands(closes, 20, 2.0)?.last().copied().flatten();
        let close = closes[closes.len() - 1];

        Ok(Self {
            sma_20: last(sma(closes, 20)?),
            sma_50: last(sma(closes, 50)?),
            ema_12: ema(closes, 12)?.last().copied(),
            ema_26: ema(closes, 26)?.last().copied(),
            rsi_14: last(rsi(closes, 14, RsiSmoothing::Simple)?),
            macd: macd.macd.last().copied(),
            macd_signal: macd.signal.last().copied(),
            macd_histogram: macd.histogram.last().copied(),
            bollinger,
            bollinger_percent_b: bollinger.and_then(|b| b.percent_b(close)),
        })
    }
}

/// Headline statistics for a symbol over the fetched window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub current_price: f64,
    pub daily_change: f64,
    pub daily_change_pct: f64,
    pub volume: f64,
    /// Highest high of the window (52 weeks for a one-year fetch).
    pub period_high: f64,
    pub period_low: f64,
    /// Sample standard deviation of daily returns, annualised.
    pub annualized_volatility: Option<f64>,
    pub average_volume: f64,
}

impl MarketSummary {
    pub fn from_klines(klines: &[Kline]) -> Result<Self, IndicatorError> {
        let latest = klines.last().ok_or(IndicatorError::InsufficientData {
            required: 1,
            available: 0,
        })?;
        let closes = core_types::closes(klines)?;
        let to_f64 = |d: rust_decimal::Decimal| d.to_f64().unwrap_or(f64::NAN);

        let current_price = closes[closes.len() - 1];
        let (daily_change, daily_change_pct) = match closes.len() {
            0 | 1 => (0.0, 0.0),
            n => {
                let prev = closes[n - 2];
                (current_price - prev, (current_price - prev) / prev * 100.0)
            }
        };

        let returns: Vec<f64> = closes.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
        let annualized_volatility = (returns.len() >= 2).then(|| {
            let mean = returns.iter().sum::<f64>() / returns.len() as f64;
            let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
                / (returns.len() - 1) as f64;
            var.sqrt() * TRADING_DAYS.sqrt()
        });

        let period_high = klines.iter().map(|k| to_f64(k.high)).fold(f64::MIN, f64::max);
        let period_low = klines.iter().map(|k| to_f64(k.low)).fold(f64::MAX, f64::min);
        let average_volume =
            klines.iter().map(|k| to_f64(k.volume)).sum::<f64>() / klines.len() as f64;

        Ok(Self {
            current_price,
            daily_change,
            daily_change_pct,
            volume: to_f64(latest.volume),
            period_high,
            period_low,
            annualized_volatility,
            average_volume,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn bars(closes: &[Decimal]) -> Vec<Kline> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, close)| Kline {
                timestamp: start + Duration::days(i as i64),
                open: *close,
                high: *close + dec!(1),
                low: *close - dec!(1),
                close: *close,
                volume: Decimal::from(1000 * (i as i64 + 1)),
            })
            .collect()
    }

    #[test]
    fn short_series_leaves_long_indicators_empty() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let snapshot = TechnicalSnapshot::from_closes(&closes).unwrap();
        assert_relative_eq!(snapshot.sma_20.unwrap(), 119.5);
        assert_eq!(snapshot.sma_50, None);
        assert_eq!(snapshot.rsi_14, Some(100.0));
        assert!(snapshot.macd.unwrap() > 0.0);
        assert!(snapshot.bollinger.is_some());
        // last close 129 against a band of roughly 107.7..131.3
        assert_relative_eq!(snapshot.bollinger_percent_b.unwrap(), 0.9014, epsilon = 1e-3);
    }

    #[test]
    fn empty_closes_give_empty_snapshot() {
        assert_eq!(TechnicalSnapshot::from_closes(&[]).unwrap(), TechnicalSnapshot::default());
    }

    #[test]
    fn summary_reports_daily_change_and_range() {
        let summary = MarketSummary::from_klines(&bars(&[dec!(100), dec!(110), dec!(99)])).unwrap();
        assert_relative_eq!(summary.current_price, 99.0);
        assert_relative_eq!(summary.daily_change, -11.0, epsilon = 1e-9);
        assert_relative_eq!(summary.daily_change_pct, -10.0, epsilon = 1e-9);
        assert_relative_eq!(summary.period_high, 111.0);
        assert_relative_eq!(summary.period_low, 98.0);
        assert_relative_eq!(summary.volume, 3000.0);
        assert_relative_eq!(summary.average_volume, 2000.0);
        assert!(summary.annualized_volatility.unwrap() > 0.0);
    }

    #[test]
    fn single_bar_summary_has_no_change() {
        let summary = MarketSummary::from_klines(&bars(&[dec!(50)])).unwrap();
        assert_eq!(summary.daily_change, 0.0);
        assert_eq!(summary.annualized_volatility, None);
    }

    #[test]
    fn summary_of_nothing_is_an_error() {
        assert!(matches!(
            MarketSummary::from_klines(&[]),
            Err(IndicatorError::InsufficientData { .. })
        ));
    }
}
