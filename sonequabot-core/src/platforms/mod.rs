// File: src/platforms/mod.rs

use async_trait::async_trait;
use sonequabot_common::models::OverlayTask;
use crate::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Reconnecting,
    Error(String),
}

/// Outbound side of the chat connection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Public message in `channel`.
    async fn send_message(&self, channel: &str, message: &str) -> Result<(), Error>;
    /// Private message to a single user, addressed by login.
    async fn send_whisper(&self, user_name: &str, message: &str) -> Result<(), Error>;
}

/// Fire-and-forget pushes toward the visualization frontend.
///
/// Implementations must not block and must never report failures to the
/// caller; a push that cannot be delivered is simply lost.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationSink: Send + Sync {
    fn push(&self, task: OverlayTask);
}

// Re-export submodules
pub mod twitch_irc;
pub mod overlay_hub;
