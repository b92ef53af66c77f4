//! src/services/sentiment/mod.rs
//!
//! Per-message classification and the rolling chat-mood estimate.

pub mod azure;
pub mod lexicon;
pub mod pipeline;
pub mod window;

use async_trait::async_trait;
use sonequabot_common::models::SentimentScores;
use crate::Error;

pub use azure::{AzureTextAnalyticsClassifier, AzureTextAnalyticsConfig};
pub use lexicon::LexiconClassifier;
pub use pipeline::{SentimentPipeline, MIN_ORGANIC_LENGTH};
pub use window::{RollingSentimentWindow, MAX_SAMPLES};

/// Maps raw chat text to a three-way sentiment distribution.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<SentimentScores, Error>;

    fn name(&self) -> &str;
}
