use crate::error::StrategyError;
use crate::Strategy;
use configuration::RsiParams;
use core_types::{Kline, OrderSide, Signal};
use indicators::RollingRsi;
use ta::Next;

/// Mean-reversion on RSI threshold crossings.
///
/// Buys when RSI climbs back above the oversold level and sells when it falls
/// back below the overbought level.
pub struct RsiThreshold {
    symbol: String,
    oversold: f64,
    overbought: f64,
    rsi: RollingRsi,
    prev_rsi: Option<f64>,
}

impl RsiThreshold {
    pub fn new(params: RsiParams, symbol: String) -> Result<Self, StrategyError> {
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !in_range(params.oversold) || !in_range(params.overbought) {
            return Err(StrategyError::InvalidParameters(
                "RSI thresholds must lie within [0, 100]".to_string(),
            ));
        }
        if params.oversold >= params.overbought {
            return Err(StrategyError::InvalidParameters(format!(
                "oversold ({}) must be below overbought ({})",
                params.oversold, params.overbought
            )));
        }

        Ok(Self {
            symbol,
            oversold: params.oversold,
            overbought: params.overbought,
            rsi: RollingRsi::new(params.period)?,
            prev_rsi: None,
        })
    }

    fn signal(&self, kline: &Kline, side: OrderSide) -> Signal {
        Signal {
            timestamp: kline.timestamp,
            symbol: self.symbol.clone(),
            side,
            strength: 1.0,
        }
    }
}

impl Strategy for RsiThreshold {
    fn evaluate(&mut self, kline: &Kline) -> Result<Option<Signal>, StrategyError> {
        let current = self.rsi.next(kline.close_f64()?);
        let previous = std::mem::replace(&mut self.prev_rsi, current);

        let (Some(prev), Some(curr)) = (previous, current) else {
            return Ok(None);
        };

        if prev <= self.oversold && curr > self.oversold {
            tracing::debug!(symbol = %self.symbol, prev, curr, "RSI left oversold territory");
            return Ok(Some(self.signal(kline, OrderSide::Buy)));
        }
        if prev >= self.overbought && curr < self.overbought {
            tracing::debug!(symbol = %self.symbol, prev, curr, "RSI left overbought territory");
            return Ok(Some(self.signal(kline, OrderSide::Sell)));
        }
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "RSI Threshold"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::bars;

    fn params(period: usize, oversold: f64, overbought: f64) -> RsiParams {
        RsiParams { period, oversold, overbought }
    }

    #[test]
    fn validates_thresholds() {
        assert!(RsiThreshold::new(params(14, 70.0, 30.0), "X".into()).is_err());
        assert!(RsiThreshold::new(params(14, -1.0, 70.0), "X".into()).is_err());
        assert!(RsiThreshold::new(params(0, 30.0, 70.0), "X".into()).is_err());
    }

    #[test]
    fn buys_after_oversold_and_sells_after_overbought() {
        let mut strategy = RsiThreshold::new(params(2, 30.0, 70.0), "X".into()).unwrap();
        // RSI(2) per bar from index 2: 0, 0, 50, 100, 100, 50
        let closes = [10.0, 9.0, 8.0, 7.0, 8.0, 9.0, 10.0, 9.0];
        let sides: Vec<(usize, OrderSide)> = bars(&closes)
            .iter()
            .enumerate()
            .filter_map(|(i, k)| strategy.evaluate(k).unwrap().map(|s| (i, s.side)))
            .collect();
        assert_eq!(sides, vec![(4, OrderSide::Buy), (7, OrderSide::Sell)]);
    }
}
