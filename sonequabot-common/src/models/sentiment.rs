// File: sonequabot-common/src/models/sentiment.rs

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

/// Sentiment categories reported by a classifier. `Mixed` can only come from
/// the classifier itself; the smoothing pipeline never derives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSentiment {
    Positive,
    Neutral,
    Negative,
    Mixed,
}

impl TextSentiment {
    /// Lower-case name, as pushed to the overlay.
    pub fn as_str(&self) -> &'static str {
        match self {
            TextSentiment::Positive => "positive",
            TextSentiment::Neutral => "neutral",
            TextSentiment::Negative => "negative",
            TextSentiment::Mixed => "mixed",
        }
    }
}

impl fmt::Display for TextSentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextSentiment::Positive => write!(f, "Positive"),
            TextSentiment::Neutral => write!(f, "Neutral"),
            TextSentiment::Negative => write!(f, "Negative"),
            TextSentiment::Mixed => write!(f, "Mixed"),
        }
    }
}

impl FromStr for TextSentiment {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "positive" => Ok(TextSentiment::Positive),
            "neutral" => Ok(TextSentiment::Neutral),
            "negative" => Ok(TextSentiment::Negative),
            "mixed" => Ok(TextSentiment::Mixed),
            _ => Err(format!("Unknown sentiment: {}", s)),
        }
    }
}

/// Picks the label with the largest magnitude.
///
/// The entries are ranked ascending with a stable sort over the order they are
/// given in and the last one is taken, so among equal values the one listed
/// later wins. NaN ranks below every number.
pub fn strongest(entries: &[(TextSentiment, f64)]) -> Option<(TextSentiment, f64)> {
    let mut winner: Option<(TextSentiment, f64)> = None;
    for &(label, value) in entries {
        winner = match winner {
            None => Some((label, value)),
            Some((_, best)) if best.is_nan() || value >= best => Some((label, value)),
            keep => keep,
        };
    }
    winner
}

/// One classifier result: three relative magnitudes plus the classifier's own label.
///
/// The magnitudes are not required to sum to one. `sentiment` is metadata from
/// the classifier and is never recomputed from the numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentScores {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
    pub sentiment: TextSentiment,
}

impl SentimentScores {
    pub fn new(positive: f64, neutral: f64, negative: f64, sentiment: TextSentiment) -> Self {
        Self { positive, neutral, negative, sentiment }
    }

    /// A sample holding only `value` under `label`, the other two magnitudes zero.
    pub fn single(label: TextSentiment, value: f64) -> Self {
        let mut scores = Self::new(0.0, 0.0, 0.0, label);
        match label {
            TextSentiment::Positive => scores.positive = value,
            TextSentiment::Neutral => scores.neutral = value,
            TextSentiment::Negative => scores.negative = value,
            TextSentiment::Mixed => {}
        }
        scores
    }

    /// Magnitudes in ranking order: positive, neutral, negative.
    pub fn entries(&self) -> [(TextSentiment, f64); 3] {
        [
            (TextSentiment::Positive, self.positive),
            (TextSentiment::Neutral, self.neutral),
            (TextSentiment::Negative, self.negative),
        ]
    }

    /// The winning label and magnitude derived from the numbers alone.
    /// Ties go to the later label (negative over neutral over positive).
    pub fn strongest(&self) -> (TextSentiment, f64) {
        strongest(&self.entries()).unwrap_or((TextSentiment::Neutral, 0.0))
    }

    /// Keeps only the winning magnitude, relabelled with the winning label.
    pub fn dominant_only(&self) -> Self {
        let (label, value) = self.strongest();
        Self::single(label, value)
    }
}

/// Smoothed chat-wide mood, recomputed from the rolling window on every
/// processed message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMood {
    /// Per-label averages over the whole window.
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
    pub dominant: TextSentiment,
    /// Lean toward positive versus lean toward negative, each relative to neutral.
    pub gauge: f64,
    /// Number of window entries the averages were taken over.
    pub samples: usize,
}

impl ChatMood {
    pub fn from_averages(positive: f64, neutral: f64, negative: f64, samples: usize) -> Self {
        let (dominant, _) = strongest(&[
            (TextSentiment::Positive, positive),
            (TextSentiment::Neutral, neutral),
            (TextSentiment::Negative, negative),
        ])
        .unwrap_or((TextSentiment::Neutral, 0.0));
        let gauge = (positive - neutral) - (negative - neutral);
        Self { positive, neutral, negative, dominant, gauge, samples }
    }
}

impl Default for ChatMood {
    /// The mood before any organic message was seen.
    fn default() -> Self {
        Self {
            positive: 0.0,
            neutral: 0.0,
            negative: 0.0,
            dominant: TextSentiment::Neutral,
            gauge: 0.0,
            samples: 0,
        }
    }
}
