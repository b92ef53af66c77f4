// File: sonequabot-common/src/models/mod.rs
pub mod chat;
pub mod overlay;
pub mod sentiment;

pub use chat::{ChatMessage, ConnectedUser};
pub use overlay::OverlayTask;
pub use sentiment::{ChatMood, SentimentScores, TextSentiment};
