use crate::error::SentimentError;
use crate::lexicon::Lexicon;
use crate::preprocess::Preprocessor;
use configuration::SentimentSettings;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};

/// Normalisation constant of the compound score, `x / sqrt(x^2 + ALPHA)`.
const COMPOUND_ALPHA: f64 = 15.0;
const VALENCE_SCALE: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub text: String,
    /// Weighted blend of the three scorers, in -1..=1.
    pub polarity: f64,
    pub general_polarity: f64,
    pub subjectivity: f64,
    pub compound_score: f64,
    pub financial_score: f64,
    pub label: SentimentLabel,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub total_analyzed: usize,
    pub avg_polarity: f64,
    pub std_polarity: f64,
    pub avg_confidence: f64,
    pub positive_ratio: f64,
    pub negative_ratio: f64,
    pub neutral_ratio: f64,
}

/// Output of the opinion-word pass shared by the polarity and compound scores.
struct OpinionScores {
    polarity: f64,
    subjectivity: f64,
    compound: f64,
}

pub struct SentimentAnalyzer {
    settings: SentimentSettings,
    preprocessor: Preprocessor,
    lexicon: Lexicon,
}

impl SentimentAnalyzer {
    pub fn new(settings: SentimentSettings) -> Result<Self, SentimentError> {
        let weights = [settings.polarity_weight, settings.compound_weight, settings.financial_weight];
        if weights.iter().any(|w| *w < 0.0) || weights.iter().sum::<f64>() <= 0.0 {
            return Err(SentimentError::InvalidSettings(
                "scorer weights must be non-negative with a positive sum".into(),
            ));
        }
        if settings.negative_threshold > settings.positive_threshold {
            return Err(SentimentError::InvalidSettings(
                "negative threshold exceeds positive threshold".into(),
            ));
        }
        Ok(Self {
            settings,
            preprocessor: Preprocessor::new()?,
            lexicon: Lexicon::default(),
        })
    }

    pub fn preprocess(&self, text: &str) -> String {
        self.preprocessor.preprocess(text)
    }

    #[instrument(skip(self, text), fields(len = text.len()))]
    pub fn analyze(&self, text: &str) -> SentimentResult {
        let cleaned = self.preprocessor.preprocess(text);
        let tokens = self.preprocessor.tokens(&cleaned);
        if tokens.is_empty() {
            return SentimentResult {
                text: text.to_string(),
                polarity: 0.0,
                general_polarity: 0.0,
                subjectivity: 0.0,
                compound_score: 0.0,
                financial_score: 0.0,
                label: SentimentLabel::Neutral,
                confidence: 0.0,
            };
        }

        let opinion = self.score_opinion(&tokens);
        let financial = self.score_financial(&tokens);
        let polarity = self.combine(opinion.polarity, opinion.compound, financial);
        debug!(polarity, compound = opinion.compound, financial, "Scored text");

        SentimentResult {
            text: text.to_string(),
            polarity,
            general_polarity: opinion.polarity,
            subjectivity: opinion.subjectivity,
            compound_score: opinion.compound,
            financial_score: financial,
            label: self.label(polarity),
            confidence: agreement(&[opinion.polarity, opinion.compound, financial]),
        }
    }

    /// Scores every text in parallel, keeping input order.
    pub fn analyze_batch<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Vec<SentimentResult> {
        texts.par_iter().map(|t| self.analyze(t.as_ref())).collect()
    }

    /// A negation flips the next opinion word; an intensifier scales it.
    fn score_opinion(&self, tokens: &[&str]) -> OpinionScores {
        let mut negate = false;
        let mut multiplier = 1.0;
        let mut valences = Vec::new();

        for token in tokens {
            if self.lexicon.is_negation(token) {
                negate = true;
                continue;
            }
            if let Some(m) = self.lexicon.intensifier(token) {
                multiplier = m;
                continue;
            }
            if let Some(mut valence) = self.lexicon.valence(token) {
                if negate {
                    valence = -valence;
                    negate = false;
                }
                valences.push((valence * multiplier).clamp(-VALENCE_SCALE, VALENCE_SCALE));
                multiplier = 1.0;
            }
        }

        if valences.is_empty() {
            return OpinionScores {
                polarity: 0.0,
                subjectivity: 0.0,
                compound: 0.0,
            };
        }
        let sum: f64 = valences.iter().sum();
        OpinionScores {
            polarity: sum / valences.len() as f64 / VALENCE_SCALE,
            subjectivity: valences.len() as f64 / tokens.len() as f64,
            compound: sum / (sum * sum + COMPOUND_ALPHA).sqrt(),
        }
    }

    fn score_financial(&self, tokens: &[&str]) -> f64 {
        let scores: Vec<f64> = tokens
            .iter()
            .filter_map(|t| self.lexicon.financial_score(t))
            .collect();
        if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        }
    }

    fn combine(&self, polarity: f64, compound: f64, financial: f64) -> f64 {
        let s = &self.settings;
        let total = s.polarity_weight + s.compound_weight + s.financial_weight;
        (s.polarity_weight * polarity + s.compound_weight * compound + s.financial_weight * financial) / total
    }

    fn label(&self, polarity: f64) -> SentimentLabel {
        if polarity > self.settings.positive_threshold {
            SentimentLabel::Positive
        } else if polarity < self.settings.negative_threshold {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

/// One minus the population variance of the scorer outputs, clamped to [0, 1].
fn agreement(scores: &[f64]) -> f64 {
    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
    (1.0 - variance).clamp(0.0, 1.0)
}

/// Aggregates a batch of results. `None` for an empty batch.
pub fn summarize(results: &[SentimentResult]) -> Option<SentimentSummary> {
    if results.is_empty() {
        return None;
    }
    let n = results.len() as f64;
    let avg_polarity = results.iter().map(|r| r.polarity).sum::<f64>() / n;
    let variance = results
        .iter()
        .map(|r| (r.polarity - avg_polarity).powi(2))
        .sum::<f64>()
        / n;
    let ratio = |label: SentimentLabel| results.iter().filter(|r| r.label == label).count() as f64 / n;

    Some(SentimentSummary {
        total_analyzed: results.len(),
        avg_polarity,
        std_polarity: variance.sqrt(),
        avg_confidence: results.iter().map(|r| r.confidence).sum::<f64>() / n,
        positive_ratio: ratio(SentimentLabel::Positive),
        negative_ratio: ratio(SentimentLabel::Negative),
        neutral_ratio: ratio(SentimentLabel::Neutral),
    })
}
