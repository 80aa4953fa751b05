//! Headline sentiment scoring
//!
//! Scorers are plain values built once by the caller and passed by reference
//! wherever text needs scoring; nothing here holds a global analyzer.

use std::fmt;
use vader_sentiment::SentimentIntensityAnalyzer;

/// Maps text to a compound sentiment score in `[-1, 1]`
pub trait SentimentScorer {
    fn compound(&self, text: &str) -> f64;
}

impl<F> SentimentScorer for F
where
    F: Fn(&str) -> f64,
{
    fn compound(&self, text: &str) -> f64 {
        self(text)
    }
}

/// VADER lexicon scorer
pub struct VaderScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl VaderScorer {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }
}

impl Default for VaderScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for VaderScorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaderScorer").finish_non_exhaustive()
    }
}

impl SentimentScorer for VaderScorer {
    fn compound(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }
        let scores = self.analyzer.polarity_scores(text);
        scores["compound"].clamp(-1.0, 1.0)
    }
}
