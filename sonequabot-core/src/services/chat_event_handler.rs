// File: src/services/chat_event_handler.rs

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use crate::eventbus::BotEvent;
use crate::platforms::ChatTransport;
use crate::services::message_service::{DispatchOutcome, MessageService};
use crate::services::presence_service::PresenceTracker;

pub const DEFAULT_GREETING: &str = "Hi to everyone. I am Sonequabot and I am alive. Again.";

/// The single sequential consumer of transport events. Chat messages are
/// dispatched one at a time, in the order the bus delivered them.
pub struct ChatEventHandler {
    messages: MessageService,
    presence: Arc<PresenceTracker>,
    transport: Arc<dyn ChatTransport>,
    greeting: String,
}

impl ChatEventHandler {
    pub fn new(
        messages: MessageService,
        presence: Arc<PresenceTracker>,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            messages,
            presence,
            transport,
            greeting: DEFAULT_GREETING.to_string(),
        }
    }

    pub fn with_greeting(mut self, greeting: &str) -> Self {
        self.greeting = greeting.to_string();
        self
    }

    pub fn message_service(&self) -> &MessageService {
        &self.messages
    }

    /// Handles one event. Returns the dispatch outcome for chat messages.
    pub async fn handle(&mut self, event: BotEvent) -> Option<DispatchOutcome> {
        match event {
            BotEvent::ChatMessage(msg) => {
                debug!("(ChatEventHandler) #{} <{}> {}", msg.channel, msg.user_name, msg.text);
                Some(self.messages.on_message(&msg).await)
            }
            BotEvent::UserJoined { user_name, .. } => {
                self.presence.on_join(&user_name);
                None
            }
            BotEvent::UserLeft { user_name, .. } => {
                self.presence.on_part(&user_name);
                None
            }
            BotEvent::ChannelJoined { channel } => {
                info!("(ChatEventHandler) joined #{}", channel);
                if !self.greeting.is_empty() {
                    if let Err(e) = self.transport.send_message(&channel, &self.greeting).await {
                        error!("(ChatEventHandler) greeting failed => {}", e);
                    }
                }
                None
            }
            BotEvent::SystemMessage(text) => {
                info!("(ChatEventHandler) system => {}", text);
                None
            }
        }
    }

    /// Runs until the bus closes or shutdown is signalled.
    pub async fn run(mut self, mut rx: mpsc::Receiver<BotEvent>, mut shutdown_rx: watch::Receiver<bool>) {
        info!("ChatEventHandler started, listening on EventBus");
        loop {
            tokio::select! {
                maybe_event = rx.recv() => {
                    match maybe_event {
                        Some(event) => {
                            self.handle(event).await;
                        }
                        None => break,
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
        info!("ChatEventHandler stopped.");
    }
}
