//! src/services/sentiment/lexicon.rs
//!
//! Offline word-list classifier (English and Italian chat slang). Good
//! enough to drive the overlay without a cloud subscription.

use std::collections::HashSet;

use async_trait::async_trait;
use sonequabot_common::models::{SentimentScores, TextSentiment};

use crate::Error;
use super::SentimentClassifier;

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "awesome", "amazing", "love", "loved", "nice", "cool", "best", "beautiful",
    "fantastic", "excellent", "happy", "fun", "funny", "wow", "yes", "thanks", "thank", "gg",
    "pog", "poggers", "lol", "lmao", "win", "wonderful", "perfect", "brilliant", "enjoy",
    "bello", "bella", "belli", "belle", "bravo", "brava", "bravi", "grande", "grazie", "ottimo",
    "ottima", "fantastico", "fantastica", "stupendo", "stupenda", "figo", "figata", "adoro",
    "mitico", "mitica", "evviva", "felice", "divertente", "perfetto", "perfetta", "top",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "awful", "terrible", "hate", "hated", "boring", "worst", "ugly", "sad", "angry",
    "stupid", "sucks", "wrong", "broken", "fail", "failed", "lag", "crash", "annoying", "cringe",
    "rip", "no", "horrible", "disgusting", "noob", "trash", "useless",
    "brutto", "brutta", "brutti", "schifo", "odio", "noioso", "noiosa", "pessimo", "pessima",
    "triste", "rotto", "rotta", "sbagliato", "sbagliata", "disagio", "ansia", "paura", "merda",
    "orribile", "inutile", "lento", "lenta", "basta", "uffa",
];

const NEGATORS: &[&str] = &["not", "never", "dont", "don't", "isn't", "non", "mai", "nessuno"];

const POSITIVE_EMOTES: &[&str] = &[":)", ":d", "<3", "xd", "😀", "😂", "😍", "❤️", "❤", "👍", "🔥", "🥳"];
const NEGATIVE_EMOTES: &[&str] = &[":(", ":'(", "d:", "😭", "😡", "😢", "👎", "💀", "🤮"];

/// Weight of the implicit neutral evidence every message starts with.
const NEUTRAL_BASELINE: f64 = 0.5;

pub struct LexiconClassifier {
    positive: HashSet<&'static str>,
    negative: HashSet<&'static str>,
    negators: HashSet<&'static str>,
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconClassifier {
    pub fn new() -> Self {
        Self {
            positive: POSITIVE_WORDS.iter().chain(POSITIVE_EMOTES).copied().collect(),
            negative: NEGATIVE_WORDS.iter().chain(NEGATIVE_EMOTES).copied().collect(),
            negators: NEGATORS.iter().copied().collect(),
        }
    }

    /// Counts positive and negative hits; a negator flips the next hit.
    fn hits(&self, text: &str) -> (u32, u32) {
        let lowered = text.to_lowercase();
        let mut positive = 0;
        let mut negative = 0;
        let mut negate = false;

        for raw in lowered.split_whitespace() {
            let token = if self.positive.contains(raw) || self.negative.contains(raw) {
                raw
            } else {
                raw.trim_matches(|c: char| c.is_ascii_punctuation())
            };
            if token.is_empty() {
                continue;
            }
            if self.negators.contains(token) {
                negate = true;
                continue;
            }

            let polarity = if self.positive.contains(token) {
                Some(true)
            } else if self.negative.contains(token) {
                Some(false)
            } else {
                None
            };

            if let Some(is_positive) = polarity {
                if is_positive != negate {
                    positive += 1;
                } else {
                    negative += 1;
                }
                negate = false;
            }
        }

        (positive, negative)
    }

    pub fn score(&self, text: &str) -> SentimentScores {
        let (p, n) = self.hits(text);
        if p == 0 && n == 0 {
            return SentimentScores::new(0.0, 1.0, 0.0, TextSentiment::Neutral);
        }

        let total = p as f64 + n as f64 + NEUTRAL_BASELINE;
        let mut scores = SentimentScores::new(
            p as f64 / total,
            NEUTRAL_BASELINE / total,
            n as f64 / total,
            TextSentiment::Neutral,
        );
        scores.sentiment = if p == n {
            TextSentiment::Mixed
        } else {
            scores.strongest().0
        };
        scores
    }
}

#[async_trait]
impl SentimentClassifier for LexiconClassifier {
    async fn classify(&self, text: &str) -> Result<SentimentScores, Error> {
        Ok(self.score(text))
    }

    fn name(&self) -> &str {
        "lexicon"
    }
}
