use rand::Rng;

use crate::Error;
use crate::services::command_service::{Activation, CommandContext, MessageCommand};
use super::first_word_is;

const MAX_SIDES: u32 = 1000;

/// `!dice [sides]`: rolls a die, six-sided unless told otherwise.
pub struct DiceCommand {
    pub default_sides: u32,
}

impl Default for DiceCommand {
    fn default() -> Self {
        Self { default_sides: 6 }
    }
}

impl DiceCommand {
    fn sides(&self, args: &str) -> Result<u32, Error> {
        let Some(raw) = args.split_whitespace().next() else {
            return Ok(self.default_sides);
        };
        let raw = raw.trim_start_matches(&['d', 'D'][..]);
        match raw.parse::<u32>() {
            Ok(n) if (2..=MAX_SIDES).contains(&n) => Ok(n),
            _ => Err(Error::Command(format!(
                "'{}' is not a die I can roll, pick between 2 and {} sides",
                raw, MAX_SIDES
            ))),
        }
    }
}

impl Activation for DiceCommand {
    fn name(&self) -> &str {
        "dice"
    }

    fn is_activated(&self, text: &str) -> Result<bool, Error> {
        Ok(first_word_is(text, "!dice") || first_word_is(text, "!diceroll"))
    }
}

impl MessageCommand for DiceCommand {
    fn message(&self, ctx: &CommandContext<'_>) -> Result<String, Error> {
        let sides = self.sides(ctx.args())?;
        let roll = rand::rng().random_range(1..=sides);
        Ok(format!("{} rolled a d{} and got {}", ctx.user_name, sides, roll))
    }
}
