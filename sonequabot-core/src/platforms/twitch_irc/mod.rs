pub mod client;
pub mod parser;
pub mod runtime;

pub use client::TwitchIrcClient;
pub use parser::{IrcEvent, IrcLine};
pub use runtime::{TwitchIrcCredentials, TwitchIrcPlatform};
