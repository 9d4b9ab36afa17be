use crate::enums::OrderSide;
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single OHLCV bar. Bars are daily unless the source says otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kline {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Kline {
    /// The closing price as `f64`, for indicator and statistics code.
    pub fn close_f64(&self) -> Result<f64, CoreError> {
        self.close
            .to_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| CoreError::NonFinitePrice(self.close.to_string()))
    }

    /// `true` when every price is strictly positive and volume is non-negative.
    pub fn is_valid(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_sign_positive() && !p.is_zero())
            && !self.volume.is_sign_negative()
    }
}

/// Extracts closing prices from a slice of bars.
pub fn closes(klines: &[Kline]) -> Result<Vec<f64>, CoreError> {
    klines.iter().map(Kline::close_f64).collect()
}

/// A directional instruction emitted by a strategy.
///
/// `strength` scales position sizing; `1.0` means a full-size entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub side: OrderSide,
    pub strength: f64,
}

/// An open long position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: u64,
    pub entry_price: Decimal,
    pub entry_time: DateTime<Utc>,
    /// Total cash paid on entry, commission included.
    pub entry_cost: Decimal,
}

/// A completed round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: Uuid,
    pub symbol: String,
    pub side: OrderSide,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub quantity: u64,
    /// Net proceeds minus entry cost, commissions included.
    pub pnl: Decimal,
    /// Price return of the trade, `(exit - entry) / entry`.
    pub pnl_pct: f64,
    /// Calendar days between entry and exit.
    pub holding_period_days: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn kline(close: Decimal, volume: Decimal) -> Kline {
        Kline {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            open: dec!(10),
            high: dec!(11),
            low: dec!(9),
            close,
            volume,
        }
    }

    #[test]
    fn close_converts_to_f64() {
        let k = kline(dec!(10.25), dec!(100));
        assert_eq!(k.close_f64().unwrap(), 10.25);
        assert_eq!(closes(&[k.clone(), k]).unwrap(), vec![10.25, 10.25]);
    }

    #[test]
    fn validity_rejects_non_positive_prices_and_negative_volume() {
        assert!(kline(dec!(10), dec!(0)).is_valid());
        assert!(!kline(dec!(0), dec!(100)).is_valid());
        assert!(!kline(dec!(-1), dec!(100)).is_valid());
        assert!(!kline(dec!(10), dec!(-5)).is_valid());
    }
}
