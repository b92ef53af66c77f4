use crate::Error;
use crate::services::command_service::{Activation, CommandContext, MessageCommand, VisualCommand};
use super::first_word_is;

/// Fixed overlay event behind a trigger word.
#[derive(Debug, Clone)]
pub struct CannedVisualCommand {
    name: String,
    trigger: String,
    event: String,
}

impl CannedVisualCommand {
    pub fn new(name: &str, trigger: &str, event: &str) -> Self {
        Self {
            name: name.to_string(),
            trigger: trigger.to_string(),
            event: event.to_string(),
        }
    }
}

impl Activation for CannedVisualCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_activated(&self, text: &str) -> Result<bool, Error> {
        Ok(first_word_is(text, &self.trigger))
    }
}

impl VisualCommand for CannedVisualCommand {
    fn visual_event(&self, _ctx: &CommandContext<'_>) -> Result<String, Error> {
        Ok(self.event.clone())
    }
}

/// Fixed reply behind a trigger word. `{user}` is replaced with the sender.
#[derive(Debug, Clone)]
pub struct CannedMessageCommand {
    name: String,
    trigger: String,
    template: String,
}

impl CannedMessageCommand {
    pub fn new(name: &str, trigger: &str, template: &str) -> Self {
        Self {
            name: name.to_string(),
            trigger: trigger.to_string(),
            template: template.to_string(),
        }
    }
}

impl Activation for CannedMessageCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_activated(&self, text: &str) -> Result<bool, Error> {
        Ok(first_word_is(text, &self.trigger))
    }
}

impl MessageCommand for CannedMessageCommand {
    fn message(&self, ctx: &CommandContext<'_>) -> Result<String, Error> {
        Ok(self.template.replace("{user}", ctx.user_name))
    }
}
