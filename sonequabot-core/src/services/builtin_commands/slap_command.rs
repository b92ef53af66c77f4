use crate::Error;
use crate::services::command_service::{Activation, CommandContext, MessageCommand};
use super::first_word_is;

/// `!slap [target]`; without a target the sender slaps themselves.
pub struct SlapCommand;

impl Activation for SlapCommand {
    fn name(&self) -> &str {
        "slap"
    }

    fn is_activated(&self, text: &str) -> Result<bool, Error> {
        Ok(first_word_is(text, "!slap"))
    }
}

impl MessageCommand for SlapCommand {
    fn message(&self, ctx: &CommandContext<'_>) -> Result<String, Error> {
        let target = ctx
            .args()
            .split_whitespace()
            .next()
            .map(|t| t.trim_start_matches('@'))
            .filter(|t| !t.is_empty())
            .unwrap_or(ctx.user_name);
        Ok(format!(
            "{} slaps {} around a bit with a large trout",
            ctx.user_name, target
        ))
    }
}
