//! src/services/command_service.rs
//!
//! The command contract and the ordered registry the dispatcher consults.

use tracing::debug;

use crate::Error;

/// Context passed to command responders.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext<'a> {
    pub channel: &'a str,
    pub user_name: &'a str,
    pub text: &'a str,
}

impl<'a> CommandContext<'a> {
    /// Everything after the first word of the message, trimmed.
    pub fn args(&self) -> &'a str {
        self.text
            .trim()
            .split_once(char::is_whitespace)
            .map(|(_, rest)| rest.trim())
            .unwrap_or("")
    }
}

/// Decides whether a message is meant for a command.
///
/// Must be cheap and must not touch shared state.
pub trait Activation: Send + Sync {
    fn name(&self) -> &str;
    fn is_activated(&self, text: &str) -> Result<bool, Error>;
}

/// A command answering with a line in chat.
pub trait MessageCommand: Activation {
    fn message(&self, ctx: &CommandContext<'_>) -> Result<String, Error>;
}

/// A command triggering a named overlay event.
pub trait VisualCommand: Activation {
    fn visual_event(&self, ctx: &CommandContext<'_>) -> Result<String, Error>;
}

/// A registered command; each one has exactly one kind of response.
pub enum BotCommand {
    Message(Box<dyn MessageCommand>),
    Visual(Box<dyn VisualCommand>),
}

/// What running a command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResponse {
    /// Text for the channel.
    Message(String),
    /// Overlay event name.
    Visual(String),
}

impl BotCommand {
    pub fn name(&self) -> &str {
        match self {
            BotCommand::Message(cmd) => cmd.name(),
            BotCommand::Visual(cmd) => cmd.name(),
        }
    }

    pub fn is_activated(&self, text: &str) -> Result<bool, Error> {
        match self {
            BotCommand::Message(cmd) => cmd.is_activated(text),
            BotCommand::Visual(cmd) => cmd.is_activated(text),
        }
    }

    pub fn respond(&self, ctx: &CommandContext<'_>) -> Result<CommandResponse, Error> {
        match self {
            BotCommand::Message(cmd) => cmd.message(ctx).map(CommandResponse::Message),
            BotCommand::Visual(cmd) => cmd.visual_event(ctx).map(CommandResponse::Visual),
        }
    }
}

/// Ordered command list. Registration order is priority order; the first
/// command that activates wins and nothing after it is consulted.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<BotCommand>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self { commands: Vec::new() }
    }

    pub fn register(&mut self, command: BotCommand) -> &mut Self {
        debug!("Registering command '{}'", command.name());
        self.commands.push(command);
        self
    }

    pub fn register_message<C: MessageCommand + 'static>(&mut self, command: C) -> &mut Self {
        self.register(BotCommand::Message(Box::new(command)))
    }

    pub fn register_visual<C: VisualCommand + 'static>(&mut self, command: C) -> &mut Self {
        self.register(BotCommand::Visual(Box::new(command)))
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().map(BotCommand::name).collect()
    }

    /// First command whose activation accepts `text`. An activation error
    /// stops the search and is returned as is.
    pub fn resolve(&self, text: &str) -> Result<Option<&BotCommand>, Error> {
        for command in &self.commands {
            if command.is_activated(text)? {
                return Ok(Some(command));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Echo {
        name: &'static str,
        needle: &'static str,
        calls: Arc<AtomicUsize>,
    }

    impl Activation for Echo {
        fn name(&self) -> &str {
            self.name
        }
        fn is_activated(&self, text: &str) -> Result<bool, Error> {
            Ok(text.contains(self.needle))
        }
    }

    impl MessageCommand for Echo {
        fn message(&self, _ctx: &CommandContext<'_>) -> Result<String, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.name.to_string())
        }
    }

    struct Flash;

    impl Activation for Flash {
        fn name(&self) -> &str {
            "flash"
        }
        fn is_activated(&self, text: &str) -> Result<bool, Error> {
            Ok(text == "!flash")
        }
    }

    impl VisualCommand for Flash {
        fn visual_event(&self, _ctx: &CommandContext<'_>) -> Result<String, Error> {
            Ok("SendFlash".into())
        }
    }

    struct Broken;

    impl Activation for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        fn is_activated(&self, _text: &str) -> Result<bool, Error> {
            Err(Error::Command("activation exploded".into()))
        }
    }

    impl MessageCommand for Broken {
        fn message(&self, _ctx: &CommandContext<'_>) -> Result<String, Error> {
            unreachable!("never activates")
        }
    }

    fn ctx(text: &str) -> CommandContext<'_> {
        CommandContext { channel: "sonequa", user_name: "viewer", text }
    }

    #[test]
    fn first_registered_match_wins() {
        let first_calls = Arc::new(AtomicUsize::new(0));
        let second_calls = Arc::new(AtomicUsize::new(0));
        let mut registry = CommandRegistry::new();
        registry
            .register_message(Echo { name: "first", needle: "!a", calls: first_calls.clone() })
            .register_message(Echo { name: "second", needle: "!ab", calls: second_calls.clone() });

        let cmd = registry.resolve("!ab").unwrap().expect("should match");
        assert_eq!(cmd.name(), "first");
        assert_eq!(cmd.respond(&ctx("!ab")).unwrap(), CommandResponse::Message("first".into()));
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn no_match_resolves_to_none() {
        let mut registry = CommandRegistry::new();
        registry.register_visual(Flash);
        assert!(registry.resolve("just chatting here").unwrap().is_none());
    }

    #[test]
    fn visual_commands_respond_with_an_event() {
        let mut registry = CommandRegistry::new();
        registry.register_visual(Flash);
        let cmd = registry.resolve("!flash").unwrap().unwrap();
        assert_eq!(cmd.respond(&ctx("!flash")).unwrap(), CommandResponse::Visual("SendFlash".into()));
    }

    #[test]
    fn activation_errors_surface_from_resolve() {
        let mut registry = CommandRegistry::new();
        registry.register_message(Broken).register_visual(Flash);
        assert!(matches!(registry.resolve("!flash"), Err(Error::Command(_))));
    }

    #[test]
    fn earlier_commands_shadow_later_ones() {
        let mut registry = CommandRegistry::new();
        registry.register_visual(Flash).register_message(Broken);
        assert_eq!(registry.resolve("!flash").unwrap().unwrap().name(), "flash");
        assert_eq!(registry.names(), vec!["flash", "broken"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn args_skip_the_trigger_word() {
        assert_eq!(ctx("!slap   Pippo  ").args(), "Pippo");
        assert_eq!(ctx("!dice").args(), "");
    }
}
