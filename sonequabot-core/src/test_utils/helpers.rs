// File: sonequabot-core/src/test_utils/helpers.rs
//! In-memory stand-ins for the transport, the overlay sink and the classifier.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sonequabot_common::models::{OverlayTask, SentimentScores};

use crate::Error;
use crate::platforms::{ChatTransport, NotificationSink};
use crate::services::sentiment::SentimentClassifier;

/// Remembers every task pushed to it.
#[derive(Default)]
pub struct RecordingSink {
    tasks: Mutex<Vec<OverlayTask>>,
}

impl RecordingSink {
    pub fn tasks(&self) -> Vec<OverlayTask> {
        self.tasks.lock().map(|t| t.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut t) = self.tasks.lock() {
            t.clear();
        }
    }
}

impl NotificationSink for RecordingSink {
    fn push(&self, task: OverlayTask) {
        if let Ok(mut t) = self.tasks.lock() {
            t.push(task);
        }
    }
}

/// Remembers sent messages and whispers; can be told to fail every send.
#[derive(Default)]
pub struct RecordingTransport {
    messages: Mutex<Vec<(String, String)>>,
    whispers: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingTransport {
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    /// `(channel, text)` pairs.
    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// `(user, text)` pairs.
    pub fn whispers(&self) -> Vec<(String, String)> {
        self.whispers.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_message(&self, channel: &str, message: &str) -> Result<(), Error> {
        if self.fail {
            return Err(Error::Platform("transport is down".into()));
        }
        if let Ok(mut m) = self.messages.lock() {
            m.push((channel.to_string(), message.to_string()));
        }
        Ok(())
    }

    async fn send_whisper(&self, user_name: &str, message: &str) -> Result<(), Error> {
        if self.fail {
            return Err(Error::Platform("transport is down".into()));
        }
        if let Ok(mut w) = self.whispers.lock() {
            w.push((user_name.to_string(), message.to_string()));
        }
        Ok(())
    }
}

/// Classifier returning canned results. `sequence` replays its list in order
/// and then repeats the last entry.
#[derive(Clone)]
pub struct ScriptedClassifier {
    script: Arc<Mutex<VecDeque<Result<SentimentScores, String>>>>,
    last: Arc<Mutex<Option<Result<SentimentScores, String>>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedClassifier {
    pub fn constant(scores: SentimentScores) -> Self {
        Self::sequence(vec![Ok(scores)])
    }

    pub fn sequence(script: Vec<Result<SentimentScores, String>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            last: Arc::new(Mutex::new(None)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SentimentClassifier for ScriptedClassifier {
    async fn classify(&self, _text: &str) -> Result<SentimentScores, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .map_err(|_| Error::Classifier("script lock poisoned".into()))?
            .pop_front();
        let mut last = self
            .last
            .lock()
            .map_err(|_| Error::Classifier("script lock poisoned".into()))?;
        if let Some(entry) = next {
            *last = Some(entry);
        }
        match last.as_ref() {
            Some(Ok(scores)) => Ok(scores.clone()),
            Some(Err(msg)) => Err(Error::Classifier(msg.clone())),
            None => Err(Error::Classifier("empty script".into())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
