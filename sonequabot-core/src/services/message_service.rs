// File: src/services/message_service.rs

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info};

use sonequabot_common::models::{ChatMessage, ChatMood, OverlayTask};

use crate::Error;
use crate::platforms::{ChatTransport, NotificationSink};
use crate::services::command_service::{CommandContext, CommandRegistry, CommandResponse};
use crate::services::sentiment::SentimentPipeline;

/// What happened to a single chat message.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Sender is on the ignore list.
    Ignored,
    /// A text command answered in chat.
    Replied(String),
    /// A visual command fired an overlay event.
    Visual(String),
    /// A command failed; the error text was whispered to the sender.
    Failed(String),
    /// No command matched and the sentiment pipeline ran.
    Organic(ChatMood),
}

/// Decides, per message, between the command registry and the sentiment
/// pipeline. Errors never leave `on_message`.
pub struct MessageService {
    registry: CommandRegistry,
    pipeline: SentimentPipeline,
    transport: Arc<dyn ChatTransport>,
    sink: Arc<dyn NotificationSink>,
    ignored_users: HashSet<String>,
}

impl MessageService {
    pub fn new(
        registry: CommandRegistry,
        pipeline: SentimentPipeline,
        transport: Arc<dyn ChatTransport>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        debug!("MessageService::new() called with {} commands", registry.len());
        Self {
            registry,
            pipeline,
            transport,
            sink,
            ignored_users: HashSet::new(),
        }
    }

    /// Users whose messages are dropped before dispatch. Compared case-insensitively.
    pub fn with_ignored_users<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ignored_users = users
            .into_iter()
            .map(|u| u.as_ref().trim().to_lowercase())
            .filter(|u| !u.is_empty())
            .collect();
        self
    }

    pub fn is_ignored(&self, user_name: &str) -> bool {
        self.ignored_users.contains(&user_name.to_lowercase())
    }

    pub fn pipeline(&self) -> &SentimentPipeline {
        &self.pipeline
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub async fn on_message(&mut self, msg: &ChatMessage) -> DispatchOutcome {
        if self.is_ignored(&msg.user_name) {
            debug!("(MessageService) ignoring message from '{}'", msg.user_name);
            return DispatchOutcome::Ignored;
        }

        let ctx = CommandContext {
            channel: &msg.channel,
            user_name: &msg.user_name,
            text: &msg.text,
        };

        match self.run_command(&ctx) {
            Ok(Some(CommandResponse::Message(reply))) => {
                if let Err(e) = self.transport.send_message(&msg.channel, &reply).await {
                    error!("(MessageService) failed to send reply to #{} => {}", msg.channel, e);
                }
                DispatchOutcome::Replied(reply)
            }
            Ok(Some(CommandResponse::Visual(event))) => {
                self.sink.push(OverlayTask::Visual(event.clone()));
                DispatchOutcome::Visual(event)
            }
            Ok(None) => DispatchOutcome::Organic(self.pipeline.process(&msg.text).await),
            Err(e) => {
                let reason = e.to_string();
                error!("(MessageService) command from '{}' failed => {}", msg.user_name, reason);
                if let Err(send_err) = self.transport.send_whisper(&msg.user_name, &reason).await {
                    error!("(MessageService) could not whisper '{}' => {}", msg.user_name, send_err);
                }
                DispatchOutcome::Failed(reason)
            }
        }
    }

    /// `Ok(None)` when no command claimed the message.
    fn run_command(&self, ctx: &CommandContext<'_>) -> Result<Option<CommandResponse>, Error> {
        let Some(command) = self.registry.resolve(ctx.text)? else {
            return Ok(None);
        };
        info!("(MessageService) '{}' triggered !{}", ctx.user_name, command.name());
        command.respond(ctx).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::MockChatTransport;
    use crate::services::builtin_commands::default_registry;
    use crate::services::command_service::{Activation, MessageCommand};
    use crate::test_utils::helpers::{RecordingSink, ScriptedClassifier};
    use sonequabot_common::models::{SentimentScores, TextSentiment};

    struct Explodes;

    impl Activation for Explodes {
        fn name(&self) -> &str {
            "explode"
        }
        fn is_activated(&self, text: &str) -> Result<bool, Error> {
            Ok(text.starts_with("!explode"))
        }
    }

    impl MessageCommand for Explodes {
        fn message(&self, _ctx: &CommandContext<'_>) -> Result<String, Error> {
            Err(Error::Command("kaboom".into()))
        }
    }

    struct UnreadableTrigger;

    impl Activation for UnreadableTrigger {
        fn name(&self) -> &str {
            "unreadable"
        }
        fn is_activated(&self, _text: &str) -> Result<bool, Error> {
            Err(Error::Command("cannot parse trigger".into()))
        }
    }

    impl MessageCommand for UnreadableTrigger {
        fn message(&self, _ctx: &CommandContext<'_>) -> Result<String, Error> {
            Ok("never sent".into())
        }
    }

    fn positive() -> ScriptedClassifier {
        ScriptedClassifier::constant(SentimentScores::new(0.9, 0.05, 0.05, TextSentiment::Positive))
    }

    fn service(
        registry: CommandRegistry,
        transport: MockChatTransport,
        classifier: ScriptedClassifier,
    ) -> (MessageService, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let pipeline = SentimentPipeline::new(Arc::new(classifier), sink.clone());
        let svc = MessageService::new(registry, pipeline, Arc::new(transport), sink.clone());
        (svc, sink)
    }

    #[tokio::test]
    async fn text_command_replies_in_channel() {
        let mut transport = MockChatTransport::new();
        transport
            .expect_send_message()
            .withf(|channel, text| channel.to_string() == "sonequa" && text.contains("Pippo"))
            .times(1)
            .returning(|_, _| Ok(()));
        transport.expect_send_whisper().never();
        let classifier = positive();
        let (mut svc, sink) = service(default_registry(), transport, classifier.clone());

        let out = svc.on_message(&ChatMessage::new("sonequa", "viewer", "!slap Pippo")).await;

        assert!(matches!(out, DispatchOutcome::Replied(ref t) if t.contains("Pippo")));
        assert!(sink.tasks().is_empty());
        assert_eq!(classifier.calls(), 0);
    }

    #[tokio::test]
    async fn visual_command_pushes_event_without_payload() {
        let mut transport = MockChatTransport::new();
        transport.expect_send_message().never();
        let (mut svc, sink) = service(default_registry(), transport, positive());

        let out = svc.on_message(&ChatMessage::new("sonequa", "viewer", "!devastante")).await;

        assert_eq!(out, DispatchOutcome::Visual("SendDevastante".into()));
        assert_eq!(sink.tasks(), vec![OverlayTask::Visual("SendDevastante".into())]);
        assert_eq!(svc.pipeline().window().len(), 0);
    }

    #[tokio::test]
    async fn failing_command_whispers_the_sender_once() {
        let mut transport = MockChatTransport::new();
        transport
            .expect_send_whisper()
            .withf(|user, text| user.to_string() == "viewer" && text.to_string() == "kaboom")
            .times(1)
            .returning(|_, _| Ok(()));
        transport.expect_send_message().never();
        let mut registry = CommandRegistry::new();
        registry.register_message(Explodes);
        let classifier = positive();
        let (mut svc, sink) = service(registry, transport, classifier.clone());

        let out = svc.on_message(&ChatMessage::new("sonequa", "viewer", "!explode now please")).await;

        assert_eq!(out, DispatchOutcome::Failed("kaboom".into()));
        assert!(sink.tasks().is_empty());
        assert_eq!(classifier.calls(), 0);
    }

    #[tokio::test]
    async fn activation_error_is_whispered_and_consumes_the_message() {
        let mut transport = MockChatTransport::new();
        transport
            .expect_send_whisper()
            .withf(|user, text| user.to_string() == "viewer" && text.contains("cannot parse trigger"))
            .times(1)
            .returning(|_, _| Ok(()));
        transport.expect_send_message().never();
        let mut registry = CommandRegistry::new();
        registry.register_message(UnreadableTrigger);
        let classifier = positive();
        let (mut svc, sink) = service(registry, transport, classifier.clone());

        let out = svc.on_message(&ChatMessage::new("sonequa", "viewer", "a long organic sentence here")).await;

        assert!(matches!(out, DispatchOutcome::Failed(ref t) if t.contains("cannot parse trigger")));
        assert!(sink.tasks().is_empty());
        assert_eq!(classifier.calls(), 0);
        assert!(svc.pipeline().window().is_empty());
    }

    #[tokio::test]
    async fn errors_are_whispered_to_the_login_not_the_display_name() {
        use crate::platforms::twitch_irc::parser::parse_event;
        use crate::platforms::twitch_irc::IrcEvent;

        let raw = "@display-name=小明;user-id=77 :xiaoming!xiaoming@xiaoming.tmi.twitch.tv PRIVMSG #sonequa :!dice banana";
        let IrcEvent::Message(msg) = parse_event(raw) else {
            panic!("expected a chat message");
        };

        let mut transport = MockChatTransport::new();
        transport
            .expect_send_whisper()
            .withf(|user, _text| user.to_string() == "xiaoming")
            .times(1)
            .returning(|_, _| Ok(()));
        transport.expect_send_message().never();
        let (mut svc, _sink) = service(default_registry(), transport, positive());

        let out = svc.on_message(&msg).await;
        assert!(matches!(out, DispatchOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn organic_text_goes_to_the_pipeline() {
        let transport = MockChatTransport::new();
        let (mut svc, sink) = service(default_registry(), transport, positive());

        let out = svc.on_message(&ChatMessage::new("sonequa", "viewer", "che bella live stasera")).await;

        match out {
            DispatchOutcome::Organic(mood) => assert_eq!(mood.dominant, TextSentiment::Positive),
            other => panic!("expected organic, got {:?}", other),
        }
        assert_eq!(sink.tasks().len(), 2);
    }

    #[tokio::test]
    async fn ignored_users_never_reach_the_pipeline() {
        let transport = MockChatTransport::new();
        let classifier = positive();
        let (svc, sink) = service(default_registry(), transport, classifier.clone());
        let mut svc = svc.with_ignored_users(["SonequaBot", "streamelements"]);

        let out = svc.on_message(&ChatMessage::new("sonequa", "StreamElements", "!java and a long text")).await;

        assert_eq!(out, DispatchOutcome::Ignored);
        assert!(sink.tasks().is_empty());
        assert_eq!(classifier.calls(), 0);
        assert!(svc.is_ignored("sonequabot"));
    }

    #[tokio::test]
    async fn transport_failures_are_swallowed() {
        let mut transport = MockChatTransport::new();
        transport
            .expect_send_message()
            .returning(|_, _| Err(Error::Platform("offline".into())));
        let (mut svc, _sink) = service(default_registry(), transport, positive());

        let out = svc.on_message(&ChatMessage::new("sonequa", "viewer", "!friday")).await;
        assert!(matches!(out, DispatchOutcome::Replied(_)));
    }
}
