use crate::error::SentimentError;
use regex::Regex;

/// Normalises raw headlines and posts before scoring.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    url: Regex,
    disallowed: Regex,
    whitespace: Regex,
}

impl Preprocessor {
    pub fn new() -> Result<Self, SentimentError> {
        Ok(Self {
            url: Regex::new(r"https?://\S+|www\.\S+")?,
            // Ticker and percentage markers survive cleaning.
            disallowed: Regex::new(r"[^a-z0-9\s$%]")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    /// Lowercases, removes URLs, replaces every character outside
    /// `[a-z0-9 $%]` with a space and collapses runs of whitespace.
    pub fn preprocess(&self, text: &str) -> String {
        let lower = text.to_lowercase();
        let no_urls = self.url.replace_all(&lower, " ");
        let filtered = self.disallowed.replace_all(&no_urls, " ");
        self.whitespace.replace_all(&filtered, " ").trim().to_string()
    }

    pub fn tokens<'a>(&self, cleaned: &'a str) -> Vec<&'a str> {
        cleaned.split_whitespace().collect()
    }
}
