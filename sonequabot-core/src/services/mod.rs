// File: src/services/mod.rs

pub mod builtin_commands;
pub mod chat_event_handler;
pub mod command_service;
pub mod message_service;
pub mod presence_service;
pub mod sentiment;

pub use chat_event_handler::ChatEventHandler;
pub use command_service::{BotCommand, CommandRegistry, CommandResponse};
pub use message_service::{DispatchOutcome, MessageService};
pub use presence_service::PresenceTracker;
