//! src/eventbus/mod.rs
//!
//! In-process event bus. Each subscriber gets its own bounded queue, so a
//! single subscriber sees events in the order they were published.

use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use sonequabot_common::models::ChatMessage;

/// Events published by the chat transport.
#[derive(Debug, Clone)]
pub enum BotEvent {
    ChatMessage(ChatMessage),

    /// Someone else joined the channel.
    UserJoined { channel: String, user_name: String },

    UserLeft { channel: String, user_name: String },

    /// The bot's own JOIN was acknowledged.
    ChannelJoined { channel: String },

    SystemMessage(String),
}

impl BotEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            BotEvent::ChatMessage(_) => "chat_message",
            BotEvent::UserJoined { .. } => "user_joined",
            BotEvent::UserLeft { .. } => "user_left",
            BotEvent::ChannelJoined { .. } => "channel_joined",
            BotEvent::SystemMessage(_) => "system_message",
        }
    }
}

/// Each subscriber gets its own `mpsc::Sender<BotEvent>` for guaranteed delivery.
///
/// - If the subscriber's channel buffer fills, `publish` will await
///   until there's space (backpressure).
/// - If the subscriber has dropped the `Receiver`, sending fails and the
///   event is skipped for that subscriber.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<BotEvent>>>>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Default size for each subscriber's buffer.
const DEFAULT_BUFFER_SIZE: usize = 1000;

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            subscribers: Arc::new(Mutex::new(vec![])),
            shutdown_tx: Arc::new(tx),
            shutdown_rx: rx,
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    pub async fn subscribe(&self, buffer_size: Option<usize>) -> mpsc::Receiver<BotEvent> {
        let size = buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE);
        let (tx, rx) = mpsc::channel(size);
        self.subscribers.lock().await.push(tx);
        rx
    }

    /// Publish an event to all subscribers, dropping the ones that went away.
    pub async fn publish(&self, event: BotEvent) {
        let senders = {
            let subs = self.subscribers.lock().await;
            subs.clone()
        };
        let mut any_closed = false;
        for s in senders {
            if s.send(event.clone()).await.is_err() {
                any_closed = true;
            }
        }
        if any_closed {
            self.subscribers.lock().await.retain(|s| !s.is_closed());
        }
    }

    pub async fn publish_chat(&self, message: ChatMessage) {
        self.publish(BotEvent::ChatMessage(message)).await;
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, timeout, Duration};

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::new();

        let mut rx1 = bus.subscribe(Some(5)).await;
        let mut rx2 = bus.subscribe(Some(5)).await;

        bus.publish(BotEvent::SystemMessage("hello".into())).await;

        for rx in [&mut rx1, &mut rx2] {
            match rx.recv().await.expect("subscriber should get event") {
                BotEvent::SystemMessage(txt) => assert_eq!(txt, "hello"),
                other => panic!("wrong event type: {}", other.event_type()),
            }
        }
    }

    #[tokio::test]
    async fn test_chat_order_is_preserved() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe(Some(10)).await;

        for i in 0..5 {
            bus.publish_chat(ChatMessage::new("sonequa", "viewer", &format!("msg {}", i))).await;
        }
        for i in 0..5 {
            match rx.recv().await.unwrap() {
                BotEvent::ChatMessage(m) => assert_eq!(m.text, format!("msg {}", i)),
                other => panic!("unexpected {}", other.event_type()),
            }
        }
    }

    #[tokio::test]
    async fn test_backpressure_blocking() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe(Some(1)).await;

        bus.publish(BotEvent::SystemMessage("msg1".into())).await;

        let handle = tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            let first = rx.recv().await.expect("expected first message");
            let second = rx.recv().await.expect("expected second message");
            (first, second)
        });

        let second_publish = bus.publish(BotEvent::SystemMessage("msg2".into()));
        let result = timeout(Duration::from_millis(500), second_publish).await;
        assert!(result.is_ok(), "publish should eventually unblock");

        let (evt1, evt2) = handle.await.unwrap();
        assert!(matches!(evt1, BotEvent::SystemMessage(ref t) if t == "msg1"));
        assert!(matches!(evt2, BotEvent::SystemMessage(ref t) if t == "msg2"));
    }

    #[test]
    fn test_publish_stays_pending_while_the_queue_is_full() {
        tokio_test::block_on(async {
            let bus = EventBus::new();
            let mut rx = bus.subscribe(Some(1)).await;
            bus.publish(BotEvent::SystemMessage("msg1".into())).await;

            let mut second = tokio_test::task::spawn(bus.publish(BotEvent::SystemMessage("msg2".into())));
            tokio_test::assert_pending!(second.poll());

            assert!(matches!(rx.recv().await, Some(BotEvent::SystemMessage(ref t)) if t == "msg1"));
            assert!(second.is_woken());
            tokio_test::assert_ready!(second.poll());
            assert!(matches!(rx.recv().await, Some(BotEvent::SystemMessage(ref t)) if t == "msg2"));
        });
    }

    #[tokio::test]
    async fn test_dropped_subscriber_does_not_block_publish() {
        let bus = EventBus::new();
        let rx = bus.subscribe(Some(1)).await;
        drop(rx);

        let res = timeout(
            Duration::from_millis(200),
            bus.publish(BotEvent::SystemMessage("nobody".into())),
        )
        .await;
        assert!(res.is_ok());
        assert!(bus.subscribers.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_flag() {
        let bus = EventBus::new();
        let mut watcher = bus.shutdown_rx.clone();
        assert!(!bus.is_shutdown());
        bus.shutdown();
        watcher.changed().await.unwrap();
        assert!(*watcher.borrow());
        assert!(bus.is_shutdown());
    }
}
