//! src/platforms/twitch_irc/runtime.rs
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::Error;
use crate::eventbus::{BotEvent, EventBus};
use crate::platforms::{ChatTransport, ConnectionStatus};

use super::client::TwitchIrcClient;
use super::parser::IrcEvent;

#[derive(Debug, Clone)]
pub struct TwitchIrcCredentials {
    pub user_name: String,
    /// Must start with `oauth:`.
    pub oauth_token: String,
}

pub struct TwitchIrcPlatform {
    pub credentials: TwitchIrcCredentials,
    /// Channel name without the leading `#`.
    pub channel: String,
    pub connection_status: ConnectionStatus,

    client: Option<TwitchIrcClient>,

    /// Forwards parsed IRC events onto the event bus.
    read_loop_handle: Option<JoinHandle<()>>,

    event_bus: Arc<EventBus>,
}

impl TwitchIrcPlatform {
    pub fn new(credentials: TwitchIrcCredentials, channel: &str, event_bus: Arc<EventBus>) -> Self {
        Self {
            credentials,
            channel: channel.trim_start_matches('#').to_lowercase(),
            connection_status: ConnectionStatus::Disconnected,
            client: None,
            read_loop_handle: None,
            event_bus,
        }
    }

    pub async fn connect(&mut self) -> Result<(), Error> {
        if self.client.is_some() {
            info!("(TwitchIrcPlatform) connect => already connected");
            return Ok(());
        }

        let token = &self.credentials.oauth_token;
        if !token.starts_with("oauth:") {
            return Err(Error::Platform("Twitch IRC token must start with 'oauth:'".into()));
        }
        let username = self.credentials.user_name.to_lowercase();
        if username.is_empty() {
            return Err(Error::Platform("Twitch IRC credentials missing user_name".into()));
        }

        let mut client = match TwitchIrcClient::connect(&username, token).await {
            Ok(c) => c,
            Err(e) => {
                let msg = format!("Error connecting to Twitch IRC => {}", e);
                error!("{}", msg);
                self.connection_status = ConnectionStatus::Error(msg);
                return Err(e);
            }
        };

        let mut irc_incoming = client
            .incoming
            .take()
            .ok_or_else(|| Error::Platform("No incoming channel in TwitchIrcClient".into()))?;

        client.join_channel(&self.channel)?;
        self.client = Some(client);
        self.connection_status = ConnectionStatus::Connected;

        let bus = self.event_bus.clone();
        let handle = tokio::spawn(async move {
            while let Some(evt) = irc_incoming.recv().await {
                if let Some(bot_event) = to_bot_event(evt, &username) {
                    bus.publish(bot_event).await;
                }
            }
            info!("(TwitchIrcPlatform) read loop ended.");
            bus.publish(BotEvent::SystemMessage("twitch-irc disconnected".into())).await;
        });
        self.read_loop_handle = Some(handle);

        Ok(())
    }

    pub async fn disconnect(&mut self) -> Result<(), Error> {
        self.connection_status = ConnectionStatus::Disconnected;

        if let Some(cli) = self.client.take() {
            cli.part_channel(&self.channel).ok();
            cli.shutdown();
        }
        if let Some(h) = self.read_loop_handle.take() {
            h.abort();
        }

        Ok(())
    }

    fn active_client(&self) -> Result<&TwitchIrcClient, Error> {
        self.client
            .as_ref()
            .ok_or_else(|| Error::Platform("No active Twitch IRC connection".into()))
    }
}

/// Maps an IRC event to what the rest of the bot listens for.
/// `bot_login` is the lower-case login of our own account.
fn to_bot_event(evt: IrcEvent, bot_login: &str) -> Option<BotEvent> {
    match evt {
        IrcEvent::Message(msg) => Some(BotEvent::ChatMessage(msg)),
        IrcEvent::Join { channel, user_name } => {
            if user_name.eq_ignore_ascii_case(bot_login) {
                Some(BotEvent::ChannelJoined { channel })
            } else {
                Some(BotEvent::UserJoined { channel, user_name })
            }
        }
        IrcEvent::Part { channel, user_name } => {
            if user_name.eq_ignore_ascii_case(bot_login) {
                None
            } else {
                Some(BotEvent::UserLeft { channel, user_name })
            }
        }
        IrcEvent::Welcome => {
            info!("(TwitchIrcPlatform) logged in as {}", bot_login);
            None
        }
        IrcEvent::Notice(text) => {
            warn!("(TwitchIrcPlatform) NOTICE => {}", text);
            None
        }
        IrcEvent::Reconnect => {
            warn!("(TwitchIrcPlatform) server requested a reconnect");
            Some(BotEvent::SystemMessage("twitch-irc reconnect requested".into()))
        }
        IrcEvent::Ping(_) | IrcEvent::Other(_) => {
            debug!("(TwitchIrcPlatform) ignoring {:?}", evt);
            None
        }
    }
}

#[async_trait]
impl ChatTransport for TwitchIrcPlatform {
    async fn send_message(&self, channel: &str, message: &str) -> Result<(), Error> {
        self.active_client()?.send_privmsg(channel, message)
    }

    async fn send_whisper(&self, user_name: &str, message: &str) -> Result<(), Error> {
        self.active_client()?.send_whisper(&self.channel, user_name, message)
    }
}
