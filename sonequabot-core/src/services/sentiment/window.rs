//! src/services/sentiment/window.rs

use std::collections::VecDeque;
use sonequabot_common::models::{ChatMood, SentimentScores};

/// Window capacity. Small on purpose so the mood reacts quickly to changes.
pub const MAX_SAMPLES: usize = 10;

/// Bounded FIFO of per-message winning magnitudes.
#[derive(Debug, Clone)]
pub struct RollingSentimentWindow {
    samples: VecDeque<SentimentScores>,
    capacity: usize,
}

impl Default for RollingSentimentWindow {
    fn default() -> Self {
        Self::with_capacity(MAX_SAMPLES)
    }
}

impl RollingSentimentWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// A window holding at most `capacity` samples (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a sample, evicting the oldest one first when full.
    /// Returns the evicted sample.
    pub fn push(&mut self, sample: SentimentScores) -> Option<SentimentScores> {
        let evicted = if self.samples.len() >= self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    pub fn iter(&self) -> impl Iterator<Item = &SentimentScores> {
        self.samples.iter()
    }

    /// Mood over the current contents. Every label is averaged over the full
    /// window length, so entries won by another label count as zero.
    pub fn mood(&self) -> ChatMood {
        if self.samples.is_empty() {
            return ChatMood::default();
        }
        let n = self.samples.len() as f64;
        let (pos, neu, neg) = self.samples.iter().fold((0.0, 0.0, 0.0), |(p, u, g), s| {
            (p + s.positive, u + s.neutral, g + s.negative)
        });
        ChatMood::from_averages(pos / n, neu / n, neg / n, self.samples.len())
    }
}
