//! # Sentiment
//!
//! Lexicon-based sentiment scoring for financial headlines and posts.
//!
//! Each text is cleaned, then scored three ways: a general opinion polarity
//! with negation and intensifier handling, a compound score normalised into
//! -1..=1, and a finance-specific term score. The blend of the three decides
//! the label, and their agreement decides the confidence.

pub mod analyzer;
pub mod error;
pub mod lexicon;
pub mod preprocess;

pub use analyzer::{summarize, SentimentAnalyzer, SentimentLabel, SentimentResult, SentimentSummary};
pub use error::SentimentError;
pub use preprocess::Preprocessor;
