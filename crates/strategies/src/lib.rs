//! # Strategy Library
//!
//! Trading rules that turn a stream of daily bars into buy and sell signals.
//! It defines a universal `Strategy` trait and the two built-in implementations.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** no data fetching or order execution. It depends only on
//!   `core-types`, `configuration` and `indicators`.
//! - **Strategy agnostic simulation:** the `backtester` drives any `Strategy`
//!   without knowing its internals.
//! - **Extensibility:** a new strategy is a new module, a `StrategyId` variant
//!   and a factory arm.
//!
//! ## Public API
//!
//! - `Strategy`: the core trait all strategies implement.
//! - `create_strategy`: the factory function to construct a strategy instance.
//! - `available_strategies`: descriptions for listings.
//! - The concrete strategies, `MACrossover` and `RsiThreshold`.

pub mod error;
pub mod factory;
pub mod ma_crossover;
pub mod rsi_threshold;

pub use error::StrategyError;
pub use factory::{available_strategies, create_strategy, StrategyInfo};
pub use ma_crossover::MACrossover;
pub use rsi_threshold::RsiThreshold;

pub use core_types::StrategyId;

use core_types::{Kline, Signal};

/// The core trait that all trading strategies must implement.
///
/// The `&mut self` in `evaluate` is crucial, as strategies keep indicator
/// state between bars. `Send` lets a boxed strategy move into a blocking task.
pub trait Strategy: Send {
    /// Evaluates the strategy on the next bar, in chronological order.
    ///
    /// * `Ok(Some(Signal))` - the strategy's entry or exit condition fired.
    /// * `Ok(None)` - no action should be taken.
    /// * `Err(StrategyError)` - the bar could not be evaluated.
    fn evaluate(&mut self, kline: &Kline) -> Result<Option<Signal>, StrategyError>;

    /// Human-readable name for reports.
    fn name(&self) -> &'static str;
}
