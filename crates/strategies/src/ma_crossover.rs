use crate::error::StrategyError;
use crate::Strategy;
use configuration::MACrossoverParams;
use core_types::{Kline, OrderSide, Signal};
use ta::indicators::SimpleMovingAverage as Sma;
use ta::Next;

/// The dual Simple Moving Average crossover strategy.
///
/// The market is in an "up" regime while the short SMA is above the long SMA.
/// A regime change from down to up emits a buy, up to down emits a sell.
pub struct MACrossover {
    symbol: String,
    long_window: usize,
    ma_short: Sma,
    ma_long: Sma,
    bars_seen: usize,
    // Regime of the previous bar; `false` until the long SMA has a full window.
    prev_up: bool,
}

impl MACrossover {
    /// Creates a new `MACrossover` instance with the given parameters.
    pub fn new(params: MACrossoverParams, symbol: String) -> Result<Self, StrategyError> {
        if params.short_window == 0 || params.short_window >= params.long_window {
            return Err(StrategyError::InvalidParameters(format!(
                "short window ({}) must be positive and less than long window ({})",
                params.short_window, params.long_window
            )));
        }
        let sma = |period| Sma::new(period).map_err(|e| StrategyError::InvalidParameters(e.to_string()));

        Ok(Self {
            symbol,
            long_window: params.long_window,
            ma_short: sma(params.short_window)?,
            ma_long: sma(params.long_window)?,
            bars_seen: 0,
            prev_up: false,
        })
    }
}

impl Strategy for MACrossover {
    fn evaluate(&mut self, kline: &Kline) -> Result<Option<Signal>, StrategyError> {
        let close = kline.close_f64()?;
        let short = self.ma_short.next(close);
        let long = self.ma_long.next(close);
        self.bars_seen += 1;

        // `ta` averages over a partial window during warm-up; treat that as no regime.
        let is_up = self.bars_seen >= self.long_window && short > long;
        let was_up = std::mem::replace(&mut self.prev_up, is_up);

        // Only bars after the first full long window may trade, so the previous
        // regime is always a real one.
        if self.bars_seen <= self.long_window || is_up == was_up {
            return Ok(None);
        }

        let side = if is_up { OrderSide::Buy } else { OrderSide::Sell };
        tracing::debug!(symbol = %self.symbol, ?side, short, long, "MACrossover: regime change");
        Ok(Some(Signal {
            timestamp: kline.timestamp,
            symbol: self.symbol.clone(),
            side,
            strength: 1.0,
        }))
    }

    fn name(&self) -> &'static str {
        "Moving Average Crossover"
    }
}
