use crate::error::OptimizerError;
use chrono::{DateTime, Utc};
use core_types::Kline;
use ndarray::{Array1, Array2, Axis};
use std::collections::BTreeMap;
use tracing::info;

/// Annualised return expectations and covariance for a set of assets, plus
/// the aligned daily return history they were estimated from.
#[derive(Debug, Clone)]
pub struct MarketModel {
    symbols: Vec<String>,
    /// Daily simple returns, one row per period and one column per asset.
    returns: Array2<f64>,
    expected_returns: Array1<f64>,
    covariance: Array2<f64>,
}

impl MarketModel {
    /// Builds the model from per-symbol price histories.
    ///
    /// Closes are aligned on the timestamps every symbol has in common before
    /// returns are taken, so a gap in one series drops that date for all.
    pub fn from_price_history(history: &[(String, Vec<Kline>)], trading_days: usize) -> Result<Self, OptimizerError> {
        if history.len() < 2 {
            return Err(OptimizerError::InsufficientAssets(history.len()));
        }

        let mut by_date: BTreeMap<DateTime<Utc>, Vec<Option<f64>>> = BTreeMap::new();
        for (col, (_, klines)) in history.iter().enumerate() {
            for kline in klines {
                let row = by_date
                    .entry(kline.timestamp)
                    .or_insert_with(|| vec![None; history.len()]);
                row[col] = Some(kline.close_f64()?);
            }
        }
        let aligned: Vec<Vec<f64>> = by_date
            .into_values()
            .filter_map(|row| row.into_iter().collect::<Option<Vec<f64>>>())
            .collect();

        if aligned.len() < 3 {
            return Err(OptimizerError::InsufficientData {
                required: 2,
                available: aligned.len().saturating_sub(1),
            });
        }

        let n = history.len();
        let mut returns = Array2::<f64>::zeros((aligned.len() - 1, n));
        for (t, pair) in aligned.windows(2).enumerate() {
            for i in 0..n {
                let (prev, curr) = (pair[0][i], pair[1][i]);
                if prev <= 0.0 {
                    return Err(OptimizerError::InvalidParameters(format!(
                        "non-positive price for {}",
                        history[i].0
                    )));
                }
                returns[[t, i]] = curr / prev - 1.0;
            }
        }

        let symbols = history.iter().map(|(s, _)| s.clone()).collect();
        let model = Self::from_returns(symbols, returns, trading_days)?;
        info!(
            assets = n,
            periods = model.periods(),
            "Prepared market model"
        );
        Ok(model)
    }

    /// Builds the model directly from a `periods x assets` matrix of daily returns.
    pub fn from_returns(symbols: Vec<String>, returns: Array2<f64>, trading_days: usize) -> Result<Self, OptimizerError> {
        let (periods, assets) = returns.dim();
        if symbols.len() != assets {
            return Err(OptimizerError::InvalidParameters(format!(
                "{} symbols for {} return columns",
                symbols.len(),
                assets
            )));
        }
        if assets < 2 {
            return Err(OptimizerError::InsufficientAssets(assets));
        }
        if periods < 2 {
            return Err(OptimizerError::InsufficientData {
                required: 2,
                available: periods,
            });
        }

        let annual = trading_days as f64;
        let mean = returns
            .mean_axis(Axis(0))
            .ok_or(OptimizerError::InsufficientData { required: 2, available: 0 })?;
        let centered = &returns - &mean;
        let covariance = centered.t().dot(&centered) / (periods - 1) as f64 * annual;

        Ok(Self {
            symbols,
            expected_returns: mean * annual,
            covariance,
            returns,
        })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn assets(&self) -> usize {
        self.symbols.len()
    }

    pub fn periods(&self) -> usize {
        self.returns.nrows()
    }

    /// Aligned daily returns, one vector per asset.
    pub fn asset_returns(&self) -> Vec<Vec<f64>> {
        self.returns.columns().into_iter().map(|c| c.to_vec()).collect()
    }

    pub fn expected_returns(&self) -> &Array1<f64> {
        &self.expected_returns
    }

    pub fn covariance(&self) -> &Array2<f64> {
        &self.covariance
    }

    /// Annualised expected return of the weighted portfolio.
    pub fn portfolio_return(&self, weights: &Array1<f64>) -> f64 {
        self.expected_returns.dot(weights)
    }

    pub fn portfolio_variance(&self, weights: &Array1<f64>) -> f64 {
        weights.dot(&self.covariance.dot(weights))
    }

    /// The daily return series the weighted portfolio would have earned.
    pub fn portfolio_history(&self, weights: &Array1<f64>) -> Vec<f64> {
        self.returns.dot(weights).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};
    use ndarray::array;
    use rust_decimal::prelude::FromPrimitive;
    use rust_decimal::Decimal;

    fn klines(closes: &[(i64, f64)]) -> Vec<Kline> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .map(|(day, close)| {
                let c = Decimal::from_f64(*close).unwrap();
                Kline {
                    timestamp: start + Duration::days(*day),
                    open: c,
                    high: c,
                    low: c,
                    close: c,
                    volume: Decimal::ONE,
                }
            })
            .collect()
    }

    #[test]
    fn annualises_mean_and_sample_covariance() {
        let returns = array![[0.01, 0.02], [0.03, 0.00], [0.02, 0.01]];
        let model = MarketModel::from_returns(vec!["A".into(), "B".into()], returns, 252).unwrap();
        assert_relative_eq!(model.expected_returns()[0], 0.02 * 252.0, epsilon = 1e-12);
        // sample variance of A = 0.0001, cov(A, B) = -0.0001
        assert_relative_eq!(model.covariance()[[0, 0]], 0.0001 * 252.0, epsilon = 1e-12);
        assert_relative_eq!(model.covariance()[[0, 1]], -0.0001 * 252.0, epsilon = 1e-12);
        assert_relative_eq!(model.covariance()[[1, 0]], model.covariance()[[0, 1]]);
    }

    #[test]
    fn aligns_histories_on_common_dates() {
        let history = vec![
            ("A".to_string(), klines(&[(0, 100.0), (1, 110.0), (2, 121.0), (3, 133.1)])),
            ("B".to_string(), klines(&[(0, 50.0), (2, 55.0), (3, 60.5)])),
        ];
        let model = MarketModel::from_price_history(&history, 252).unwrap();
        // common dates are days 0, 2 and 3
        assert_eq!(model.periods(), 2);
        assert_relative_eq!(model.portfolio_history(&array![1.0, 0.0])[0], 0.21, epsilon = 1e-9);

        let columns = model.asset_returns();
        assert_eq!(columns.len(), 2);
        assert_relative_eq!(columns[1][0], 0.1, epsilon = 1e-9);
        assert_relative_eq!(columns[1][1], 0.1, epsilon = 1e-9);
    }

    #[test]
    fn rejects_single_asset_and_short_history() {
        let one = vec![("A".to_string(), klines(&[(0, 1.0), (1, 2.0), (2, 3.0)]))];
        assert!(matches!(
            MarketModel::from_price_history(&one, 252),
            Err(OptimizerError::InsufficientAssets(1))
        ));

        let short = vec![
            ("A".to_string(), klines(&[(0, 1.0), (1, 2.0)])),
            ("B".to_string(), klines(&[(0, 1.0), (1, 2.0)])),
        ];
        assert!(matches!(
            MarketModel::from_price_history(&short, 252),
            Err(OptimizerError::InsufficientData { .. })
        ));
    }
}
