use crate::error::PortfolioError;
use chrono::{DateTime, Utc};
use core_types::{OrderSide, Position, Trade};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

/// Cash and long positions of a simulated account.
///
/// Its sole responsibility is to reflect fills accurately: sizing and signal
/// handling live in the backtester. Commission is charged as a fraction of
/// notional on both entry and exit.
#[derive(Debug, Clone)]
pub struct Portfolio {
    pub cash: Decimal,
    pub positions: HashMap<String, Position>,
    commission: Decimal,
}

impl Portfolio {
    pub fn new(initial_capital: Decimal, commission: Decimal) -> Self {
        Self {
            cash: initial_capital,
            positions: HashMap::new(),
            commission,
        }
    }

    /// Total cash needed to buy `quantity` shares at `price`, commission included.
    pub fn entry_cost(&self, quantity: u64, price: Decimal) -> Decimal {
        Decimal::from(quantity) * price * (Decimal::ONE + self.commission)
    }

    /// Opens a long position, debiting the entry cost from cash.
    pub fn open(
        &mut self,
        symbol: &str,
        quantity: u64,
        price: Decimal,
        time: DateTime<Utc>,
    ) -> Result<&Position, PortfolioError> {
        if quantity == 0 {
            return Err(PortfolioError::ZeroQuantity);
        }
        if self.positions.contains_key(symbol) {
            return Err(PortfolioError::PositionAlreadyOpen(symbol.to_string()));
        }
        let cost = self.entry_cost(quantity, price);
        if cost > self.cash {
            return Err(PortfolioError::InsufficientCash {
                required: cost.to_string(),
                available: self.cash.to_string(),
            });
        }

        self.cash -= cost;
        let position = Position {
            symbol: symbol.to_string(),
            quantity,
            entry_price: price,
            entry_time: time,
            entry_cost: cost,
        };
        Ok(self.positions.entry(symbol.to_string()).or_insert(position))
    }

    /// Closes the whole position at `price` and returns the completed trade.
    pub fn close(&mut self, symbol: &str, price: Decimal, time: DateTime<Utc>) -> Result<Trade, PortfolioError> {
        let position = self
            .positions
            .remove(symbol)
            .ok_or_else(|| PortfolioError::PositionNotFound(symbol.to_string()))?;

        let proceeds = Decimal::from(position.quantity) * price * (Decimal::ONE - self.commission);
        self.cash += proceeds;

        let pnl_pct = ((price - position.entry_price) / position.entry_price)
            .to_f64()
            .unwrap_or(0.0);

        Ok(Trade {
            trade_id: Uuid::new_v4(),
            symbol: position.symbol,
            side: OrderSide::Buy,
            entry_time: position.entry_time,
            exit_time: time,
            entry_price: position.entry_price,
            exit_price: price,
            quantity: position.quantity,
            pnl: proceeds - position.entry_cost,
            pnl_pct,
            holding_period_days: (time - position.entry_time).num_days(),
        })
    }

    /// Equity = Cash + market value of all open positions at the given prices.
    pub fn total_equity(&self, market_prices: &HashMap<String, Decimal>) -> Result<Decimal, PortfolioError> {
        let mut positions_value = Decimal::ZERO;
        for (symbol, position) in &self.positions {
            let price = market_prices
                .get(symbol)
                .ok_or_else(|| PortfolioError::PositionNotFound(symbol.clone()))?;
            positions_value += Decimal::from(position.quantity) * *price;
        }
        Ok(self.cash + positions_value)
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }
}
