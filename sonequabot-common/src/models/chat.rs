use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single chat line as received from the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub channel: String,
    /// Lower-case login; the only name Twitch accepts as a whisper target.
    pub user_name: String,
    /// The `display-name` tag, which may be localized.
    pub display_name: Option<String>,
    pub user_id: Option<String>,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(channel: &str, user_name: &str, text: &str) -> Self {
        Self {
            channel: channel.to_string(),
            user_name: user_name.to_string(),
            display_name: None,
            user_id: None,
            text: text.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Someone currently present in the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedUser {
    pub user_name: String,
    pub joined_at: DateTime<Utc>,
}

impl ConnectedUser {
    pub fn new(user_name: &str) -> Self {
        Self {
            user_name: user_name.to_string(),
            joined_at: Utc::now(),
        }
    }
}
