//! Shared data model for the finscope workspace.
//!
//! Every other crate depends on this one and nothing here depends on them.

pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{OptimizationMethod, OrderSide, StrategyId};
pub use error::CoreError;
pub use structs::{closes, Kline, Position, Signal, Trade};
