//! src/services/sentiment/pipeline.rs

use std::sync::Arc;
use tracing::{debug, info, warn};

use sonequabot_common::models::{ChatMood, OverlayTask};

use crate::platforms::NotificationSink;
use super::window::RollingSentimentWindow;
use super::SentimentClassifier;

/// Organic messages shorter than this (in characters) are treated as noise.
pub const MIN_ORGANIC_LENGTH: usize = 10;

/// Classifies organic chat and keeps the smoothed chat mood.
///
/// Owns the rolling window; one instance per channel, driven by a single
/// sequential caller.
pub struct SentimentPipeline {
    classifier: Arc<dyn SentimentClassifier>,
    sink: Arc<dyn NotificationSink>,
    window: RollingSentimentWindow,
    current: ChatMood,
}

impl SentimentPipeline {
    pub fn new(classifier: Arc<dyn SentimentClassifier>, sink: Arc<dyn NotificationSink>) -> Self {
        debug!("SentimentPipeline::new() using classifier '{}'", classifier.name());
        Self {
            classifier,
            sink,
            window: RollingSentimentWindow::new(),
            current: ChatMood::default(),
        }
    }

    pub fn current_mood(&self) -> &ChatMood {
        &self.current
    }

    pub fn window(&self) -> &RollingSentimentWindow {
        &self.window
    }

    /// Feeds one organic message through the pipeline.
    ///
    ///  1. Short messages are dropped.
    ///  2. The text is classified; on failure or non-finite scores nothing changes.
    ///  3. The classifier's own label is pushed right away.
    ///  4. The winning magnitude goes into the window.
    ///  5. The mood is recomputed and its gauge pushed.
    ///
    /// Returns the mood after the update, or the previous one when the message
    /// was skipped.
    pub async fn process(&mut self, text: &str) -> ChatMood {
        if text.chars().count() < MIN_ORGANIC_LENGTH {
            debug!("(Sentiment) skipping short message ({} chars)", text.chars().count());
            return self.current.clone();
        }

        let scores = match self.classifier.classify(text).await {
            Ok(s) => s,
            Err(e) => {
                warn!("(Sentiment) classifier '{}' failed => {}", self.classifier.name(), e);
                return self.current.clone();
            }
        };
        if !scores.entries().iter().all(|(_, v)| v.is_finite()) {
            warn!(
                "(Sentiment) classifier '{}' returned non-finite scores {:?}; skipping",
                self.classifier.name(),
                scores
            );
            return self.current.clone();
        }

        self.sink
            .push(OverlayTask::SendSentiment(scores.sentiment.as_str().to_string()));

        let mut ranked = scores.entries();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
        info!(
            "currentScore: {}",
            ranked
                .iter()
                .map(|(label, v)| format!("{}: {}", label, v))
                .collect::<Vec<_>>()
                .join(", ")
        );

        self.window.push(scores.dominant_only());
        let mood = self.window.mood();

        info!(
            "Chat sentiment: {} (Positive: {}, Neutral: {}, Negative: {})",
            mood.dominant, mood.positive, mood.neutral, mood.negative
        );
        info!("({}) - Absolute sentiment: {}", mood.samples, mood.gauge);

        self.sink.push(OverlayTask::SendGaugeSentiment(mood.gauge));
        self.current = mood.clone();
        mood
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::helpers::{RecordingSink, ScriptedClassifier};
    use sonequabot_common::models::{SentimentScores, TextSentiment};

    fn pipeline(classifier: ScriptedClassifier) -> (SentimentPipeline, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        (SentimentPipeline::new(Arc::new(classifier), sink.clone()), sink)
    }

    #[tokio::test]
    async fn short_messages_change_nothing() {
        let classifier = ScriptedClassifier::constant(SentimentScores::new(
            0.9, 0.05, 0.05, TextSentiment::Positive,
        ));
        let (mut p, sink) = pipeline(classifier.clone());

        let mood = p.process("lol ok 👍").await;
        assert_eq!(mood, ChatMood::default());
        assert!(p.window().is_empty());
        assert!(sink.tasks().is_empty());
        assert_eq!(classifier.calls(), 0);
    }

    #[tokio::test]
    async fn short_message_counts_characters_not_bytes() {
        // nine characters, well over ten bytes
        let (mut p, sink) = pipeline(ScriptedClassifier::constant(SentimentScores::new(
            0.9, 0.05, 0.05, TextSentiment::Positive,
        )));
        p.process("àèìòùàèìò").await;
        assert!(sink.tasks().is_empty());
        p.process("àèìòùàèìòù").await;
        assert_eq!(sink.tasks().len(), 2);
    }

    #[tokio::test]
    async fn organic_message_pushes_label_then_gauge() {
        let (mut p, sink) = pipeline(ScriptedClassifier::constant(SentimentScores::new(
            0.9, 0.05, 0.05, TextSentiment::Positive,
        )));

        let mood = p.process("what a great stream today").await;

        let entry = p.window().iter().next().unwrap().clone();
        assert_eq!(entry, SentimentScores::new(0.9, 0.0, 0.0, TextSentiment::Positive));
        assert_eq!(mood.dominant, TextSentiment::Positive);
        assert!((mood.gauge - 0.9).abs() < 1e-12);
        assert_eq!(
            sink.tasks(),
            vec![
                OverlayTask::SendSentiment("positive".into()),
                OverlayTask::SendGaugeSentiment(mood.gauge),
            ]
        );
    }

    #[tokio::test]
    async fn raw_label_comes_from_the_classifier() {
        // the classifier says "mixed" even though neutral has the largest score
        let (mut p, sink) = pipeline(ScriptedClassifier::constant(SentimentScores::new(
            0.3, 0.4, 0.3, TextSentiment::Mixed,
        )));
        let mood = p.process("boh, non saprei proprio").await;
        assert_eq!(sink.tasks()[0], OverlayTask::SendSentiment("mixed".into()));
        assert_eq!(mood.dominant, TextSentiment::Neutral);
    }

    #[tokio::test]
    async fn tie_between_positive_and_neutral_is_neutral() {
        let (mut p, _sink) = pipeline(ScriptedClassifier::constant(SentimentScores::new(
            0.5, 0.5, 0.0, TextSentiment::Positive,
        )));
        p.process("this is fine I guess").await;
        let entry = p.window().iter().next().unwrap();
        assert_eq!(entry.sentiment, TextSentiment::Neutral);
        assert_eq!(entry.neutral, 0.5);
        assert_eq!(entry.positive, 0.0);
    }

    #[tokio::test]
    async fn classifier_failure_skips_the_message() {
        let classifier = ScriptedClassifier::sequence(vec![
            Ok(SentimentScores::new(0.8, 0.1, 0.1, TextSentiment::Positive)),
            Err("service unavailable".into()),
        ]);
        let (mut p, sink) = pipeline(classifier);

        let first = p.process("amazing play right there").await;
        let second = p.process("the classifier is down now").await;

        assert_eq!(first, second);
        assert_eq!(p.window().len(), 1);
        assert_eq!(sink.tasks().len(), 2);
    }

    #[tokio::test]
    async fn non_finite_scores_are_treated_as_a_failure() {
        let classifier = ScriptedClassifier::sequence(vec![
            Ok(SentimentScores::new(0.8, 0.1, 0.1, TextSentiment::Positive)),
            Ok(SentimentScores::new(f64::NAN, f64::NAN, f64::NAN, TextSentiment::Neutral)),
            Ok(SentimentScores::new(0.2, f64::NAN, 0.7, TextSentiment::Negative)),
            Ok(SentimentScores::new(f64::INFINITY, 0.0, 0.0, TextSentiment::Positive)),
        ]);
        let (mut p, sink) = pipeline(classifier.clone());

        let before = p.process("amazing play right there").await;
        for text in ["scores are all nan here", "one nan score in here", "infinitely positive text"] {
            assert_eq!(p.process(text).await, before);
        }

        assert_eq!(classifier.calls(), 4);
        assert_eq!(p.window().len(), 1);
        assert_eq!(sink.tasks().len(), 2);
        assert!(p.current_mood().gauge.is_finite());
    }

    #[tokio::test]
    async fn window_is_capped_at_ten() {
        let (mut p, _sink) = pipeline(ScriptedClassifier::constant(SentimentScores::new(
            0.1, 0.2, 0.7, TextSentiment::Negative,
        )));
        for _ in 0..15 {
            p.process("this is getting boring").await;
        }
        assert_eq!(p.window().len(), 10);
        assert_eq!(p.current_mood().samples, 10);
    }
}
