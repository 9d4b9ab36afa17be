//! Word lists used by the three scorers.
//!
//! General opinion valences use a -4..=4 scale so the compound scorer can
//! normalise raw sums; the polarity scorer divides them by four. Financial
//! scores are already in -1..=1.

use std::collections::{HashMap, HashSet};

const OPINION_WORDS: &[(&str, f64)] = &[
    // positive
    ("good", 1.9),
    ("great", 3.1),
    ("excellent", 3.2),
    ("amazing", 2.8),
    ("positive", 2.3),
    ("optimistic", 1.9),
    ("promising", 1.7),
    ("impressive", 2.2),
    ("solid", 1.5),
    ("strong", 2.3),
    ("better", 1.9),
    ("best", 3.2),
    ("success", 2.7),
    ("successful", 2.8),
    ("win", 2.8),
    ("confident", 2.2),
    ("happy", 2.7),
    ("pleased", 1.9),
    ("encouraging", 2.4),
    ("robust", 1.6),
    ("healthy", 1.7),
    ("favorable", 2.1),
    ("upbeat", 1.8),
    ("exceeded", 1.5),
    ("benefit", 1.6),
    // negative
    ("bad", -2.5),
    ("poor", -2.1),
    ("terrible", -2.5),
    ("awful", -2.0),
    ("negative", -2.7),
    ("pessimistic", -1.5),
    ("worried", -1.2),
    ("worry", -1.9),
    ("fear", -2.2),
    ("fears", -1.8),
    ("concerns", -1.4),
    ("weak", -1.9),
    ("worse", -2.1),
    ("worst", -3.1),
    ("fail", -2.5),
    ("failure", -2.3),
    ("lose", -1.7),
    ("problem", -1.7),
    ("trouble", -1.7),
    ("disappointing", -2.2),
    ("headwinds", -1.2),
    ("uncertain", -1.2),
    ("volatile", -1.1),
    ("crash", -1.7),
    ("panic", -2.3),
];

const FINANCIAL_TERMS: &[(&str, f64)] = &[
    ("bullish", 0.8),
    ("surge", 0.7),
    ("rally", 0.7),
    ("gain", 0.6),
    ("profit", 0.7),
    ("growth", 0.6),
    ("strong", 0.5),
    ("beat", 0.6),
    ("exceed", 0.6),
    ("outperform", 0.7),
    ("breakthrough", 0.8),
    ("milestone", 0.6),
    ("record", 0.5),
    ("high", 0.4),
    ("bearish", -0.8),
    ("crash", -0.9),
    ("plunge", -0.8),
    ("loss", -0.7),
    ("decline", -0.6),
    ("weak", -0.5),
    ("miss", -0.6),
    ("disappoint", -0.7),
    ("concern", -0.4),
    ("risk", -0.3),
    ("volatile", -0.4),
    ("uncertain", -0.5),
    ("downturn", -0.7),
    ("recession", -0.8),
    ("crisis", -0.9),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "neither", "nor", "none", "nothing", "cannot", "cant", "dont", "doesnt",
    "didnt", "wont", "isnt", "arent", "wasnt", "werent", "hardly", "barely", "without",
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("extremely", 1.5),
    ("highly", 1.3),
    ("really", 1.2),
    ("significantly", 1.3),
    ("substantially", 1.3),
    ("dramatically", 1.5),
    ("slightly", 0.5),
    ("somewhat", 0.7),
    ("marginally", 0.5),
];

/// Inflections tried, in order, when a token is not found as written.
const SUFFIXES: &[&str] = &["ing", "ed", "es", "s"];

#[derive(Debug, Clone)]
pub struct Lexicon {
    opinion: HashMap<&'static str, f64>,
    financial: HashMap<&'static str, f64>,
    negations: HashSet<&'static str>,
    intensifiers: HashMap<&'static str, f64>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            opinion: OPINION_WORDS.iter().copied().collect(),
            financial: FINANCIAL_TERMS.iter().copied().collect(),
            negations: NEGATIONS.iter().copied().collect(),
            intensifiers: INTENSIFIERS.iter().copied().collect(),
        }
    }
}

impl Lexicon {
    /// Valence of a general opinion word on the -4..=4 scale.
    pub fn valence(&self, token: &str) -> Option<f64> {
        self.opinion.get(token).copied()
    }

    /// Score of a finance term. Plurals and simple verb inflections of a
    /// listed stem match too, so "gains" and "exceeded" count.
    pub fn financial_score(&self, token: &str) -> Option<f64> {
        if let Some(score) = self.financial.get(token) {
            return Some(*score);
        }
        SUFFIXES.iter().find_map(|suffix| {
            let stem = token.strip_suffix(suffix)?;
            self.financial
                .get(stem)
                .or_else(|| self.financial.get(format!("{stem}e").as_str()))
                .copied()
        })
    }

    pub fn is_negation(&self, token: &str) -> bool {
        self.negations.contains(token)
    }

    pub fn intensifier(&self, token: &str) -> Option<f64> {
        self.intensifiers.get(token).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inflected_finance_terms_match_their_stem() {
        let lexicon = Lexicon::default();
        assert_eq!(lexicon.financial_score("gains"), Some(0.6));
        assert_eq!(lexicon.financial_score("exceeded"), Some(0.6));
        assert_eq!(lexicon.financial_score("declines"), Some(-0.6));
        assert_eq!(lexicon.financial_score("disappointed"), Some(-0.7));
        assert_eq!(lexicon.financial_score("surged"), Some(0.7));
        assert_eq!(lexicon.financial_score("apple"), None);
    }

    #[test]
    fn negations_and_intensifiers_are_recognised() {
        let lexicon = Lexicon::default();
        assert!(lexicon.is_negation("not"));
        assert!(!lexicon.is_negation("note"));
        assert_eq!(lexicon.intensifier("slightly"), Some(0.5));
    }
}
