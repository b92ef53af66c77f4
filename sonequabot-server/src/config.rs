// File: sonequabot-server/src/config.rs

use clap::{Parser, ValueEnum};

use sonequabot_common::Error;
use sonequabot_core::platforms::overlay_hub::OverlayHubConfig;
use sonequabot_core::platforms::twitch_irc::TwitchIrcCredentials;
use sonequabot_core::services::chat_event_handler::DEFAULT_GREETING;
use sonequabot_core::services::sentiment::AzureTextAnalyticsConfig;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierKind {
    /// Offline word lists.
    Lexicon,
    /// Azure Cognitive Services Text Analytics v3.0.
    Azure,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "sonequabot")]
#[command(author, version, about = "SonequaBot - Twitch chat bot driving a live sentiment overlay")]
pub struct BotConfig {
    /// Login of the bot account.
    #[arg(long, env = "TWITCH_BOT_USERNAME")]
    pub bot_username: String,

    /// Chat token, with or without the `oauth:` prefix.
    #[arg(long, env = "TWITCH_OAUTH_TOKEN", hide_env_values = true)]
    pub oauth_token: String,

    /// Channel to join, with or without `#`.
    #[arg(long, env = "TWITCH_CHANNEL")]
    pub channel: String,

    /// SignalR hub the overlay listens on.
    #[arg(long, env = "SIGNALR_HUB_URL", default_value = "http://localhost:5000/sonequahub")]
    pub hub_url: String,

    /// Open the WebSocket directly, skipping `/negotiate`.
    #[arg(long, env = "SIGNALR_SKIP_NEGOTIATION", default_value_t = false)]
    pub skip_negotiation: bool,

    #[arg(long, env = "SENTIMENT_CLASSIFIER", value_enum, default_value_t = ClassifierKind::Lexicon)]
    pub classifier: ClassifierKind,

    #[arg(long, env = "AZURE_TEXT_ANALYTICS_ENDPOINT")]
    pub azure_endpoint: Option<String>,

    #[arg(long, env = "AZURE_TEXT_ANALYTICS_KEY", hide_env_values = true)]
    pub azure_key: Option<String>,

    #[arg(long, env = "AZURE_TEXT_ANALYTICS_LANGUAGE", default_value = "it")]
    pub azure_language: String,

    /// Sent once the channel is joined. Empty disables it.
    #[arg(long, env = "BOT_GREETING", default_value = DEFAULT_GREETING)]
    pub greeting: String,

    /// Comma separated logins whose messages are never processed. The bot's
    /// own login is always added.
    #[arg(long, env = "BOT_IGNORED_USERS", value_delimiter = ',')]
    pub ignored_users: Vec<String>,
}

impl BotConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.bot_username.trim().is_empty() {
            return Err(Error::Config("bot username is empty".into()));
        }
        if self.oauth_token.trim().trim_start_matches("oauth:").is_empty() {
            return Err(Error::Config("oauth token is empty".into()));
        }
        if self.channel.trim().trim_start_matches('#').is_empty() {
            return Err(Error::Config("channel is empty".into()));
        }
        if self.classifier == ClassifierKind::Azure {
            self.azure_config()?;
        }
        Ok(())
    }

    pub fn credentials(&self) -> TwitchIrcCredentials {
        let token = self.oauth_token.trim();
        let oauth_token = if token.starts_with("oauth:") {
            token.to_string()
        } else {
            format!("oauth:{}", token)
        };
        TwitchIrcCredentials {
            user_name: self.bot_username.trim().to_lowercase(),
            oauth_token,
        }
    }

    pub fn channel(&self) -> String {
        self.channel.trim().trim_start_matches('#').to_lowercase()
    }

    pub fn overlay_config(&self) -> OverlayHubConfig {
        let mut cfg = OverlayHubConfig::new(&self.hub_url);
        cfg.skip_negotiation = self.skip_negotiation;
        cfg
    }

    pub fn azure_config(&self) -> Result<AzureTextAnalyticsConfig, Error> {
        let endpoint = self
            .azure_endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| Error::Config("AZURE_TEXT_ANALYTICS_ENDPOINT is required for the azure classifier".into()))?;
        let key = self
            .azure_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("AZURE_TEXT_ANALYTICS_KEY is required for the azure classifier".into()))?;
        Ok(AzureTextAnalyticsConfig::new(endpoint, key, &self.azure_language))
    }

    /// Configured ignore list plus the bot's own login.
    pub fn ignored_users(&self) -> Vec<String> {
        let mut users: Vec<String> = self
            .ignored_users
            .iter()
            .map(|u| u.trim().to_lowercase())
            .filter(|u| !u.is_empty())
            .collect();
        let me = self.bot_username.trim().to_lowercase();
        if !users.contains(&me) {
            users.push(me);
        }
        users
    }
}
