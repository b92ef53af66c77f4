// File: sonequabot-core/src/services/builtin_commands/mod.rs
//! Built-in chat commands. Each command lives in its own file;
//! `default_registry` wires them up in priority order.

pub mod canned_commands;
pub mod dice_command;
pub mod slap_command;

use crate::services::command_service::CommandRegistry;

pub use canned_commands::{CannedMessageCommand, CannedVisualCommand};
pub use dice_command::DiceCommand;
pub use slap_command::SlapCommand;

/// True when the first word of `text` is `trigger`, ignoring case.
pub fn first_word_is(text: &str, trigger: &str) -> bool {
    text.split_whitespace()
        .next()
        .map(|word| word.eq_ignore_ascii_case(trigger))
        .unwrap_or(false)
}

/// The stock command set, in the order it is consulted.
pub fn default_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry
        .register_visual(CannedVisualCommand::new("java", "!java", "SendJava"))
        .register_visual(CannedVisualCommand::new("php", "!php", "SendPhp"))
        .register_visual(CannedVisualCommand::new("devastante", "!devastante", "SendDevastante"))
        .register_message(SlapCommand)
        .register_message(DiceCommand::default())
        .register_message(CannedMessageCommand::new(
            "friday",
            "!friday",
            "It's Friday, {user}! Nobody deploys to production today.",
        ))
        .register_visual(CannedVisualCommand::new("disagio", "!disagio", "SendDisagio"))
        .register_visual(CannedVisualCommand::new("gren", "!gren", "SendGren"))
        .register_message(CannedMessageCommand::new(
            "debug",
            "!debug",
            "{user}, have you tried turning it off and on again?",
        ))
        .register_visual(CannedVisualCommand::new("dio", "!dio", "SendDio"))
        .register_visual(CannedVisualCommand::new("paura", "!paura", "SendPaura"))
        .register_visual(CannedVisualCommand::new("kasu", "!kasu", "SendKasu"))
        .register_visual(CannedVisualCommand::new("merda", "!merda", "SendMerda"))
        .register_visual(CannedVisualCommand::new("ansia", "!ansia", "SendAnsia"))
        .register_visual(CannedVisualCommand::new("accompagnare", "!accompagnare", "SendAccompagnare"))
        .register_visual(CannedVisualCommand::new("zinghero", "!zinghero", "SendZinghero"));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::command_service::{CommandContext, CommandResponse};

    #[test]
    fn trigger_must_be_the_first_word() {
        assert!(first_word_is("!PHP is great", "!php"));
        assert!(!first_word_is("I love !php", "!php"));
        assert!(!first_word_is("!phpstorm", "!php"));
        assert!(!first_word_is("   ", "!php"));
    }

    #[test]
    fn default_registry_keeps_priority_order() {
        let registry = default_registry();
        assert_eq!(registry.len(), 16);
        assert_eq!(&registry.names()[..5], &["java", "php", "devastante", "slap", "dice"]);
    }

    #[test]
    fn stock_visual_command_resolves() {
        let registry = default_registry();
        let cmd = registry.resolve("!devastante!!!").unwrap();
        assert!(cmd.is_none(), "trigger must match the whole first word");

        let cmd = registry.resolve("!Devastante davvero").unwrap().unwrap();
        let ctx = CommandContext { channel: "sonequa", user_name: "viewer", text: "!Devastante davvero" };
        assert_eq!(cmd.respond(&ctx).unwrap(), CommandResponse::Visual("SendDevastante".into()));
    }

    #[test]
    fn organic_chat_matches_nothing() {
        let registry = default_registry();
        assert!(registry.resolve("che bella live stasera ragazzi").unwrap().is_none());
    }
}
