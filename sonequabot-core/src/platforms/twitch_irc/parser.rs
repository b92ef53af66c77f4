//! src/platforms/twitch_irc/parser.rs
//!
//! Turns raw Twitch IRC lines into typed events.

use chrono::Utc;
use sonequabot_common::models::ChatMessage;

/// One IRC line split into its parts (IRCv3 tags included).
#[derive(Debug, Clone, PartialEq)]
pub struct IrcLine {
    pub tags: Option<String>,
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
    pub trailing: Option<String>,
}

impl IrcLine {
    pub fn parse(line: &str) -> Self {
        let mut rest = line.trim();
        let mut tags = None;
        let mut prefix = None;

        if let Some(tagged) = rest.strip_prefix('@') {
            match tagged.split_once(' ') {
                Some((t, r)) => {
                    tags = Some(t.to_string());
                    rest = r.trim_start();
                }
                None => {
                    tags = Some(tagged.to_string());
                    rest = "";
                }
            }
        }

        if let Some(prefixed) = rest.strip_prefix(':') {
            match prefixed.split_once(' ') {
                Some((p, r)) => {
                    prefix = Some(p.to_string());
                    rest = r.trim_start();
                }
                None => {
                    prefix = Some(prefixed.to_string());
                    rest = "";
                }
            }
        }

        let (command, rest) = rest.split_once(' ').unwrap_or((rest, ""));

        let (middle, trailing) = if let Some(t) = rest.strip_prefix(':') {
            ("", Some(t.to_string()))
        } else if let Some((m, t)) = rest.split_once(" :") {
            (m, Some(t.to_string()))
        } else {
            (rest, None)
        };

        Self {
            tags,
            prefix,
            command: command.to_uppercase(),
            params: middle.split_whitespace().map(str::to_string).collect(),
            trailing,
        }
    }

    /// Value of `key` in the tag section, `None` when absent or empty.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .as_deref()?
            .split(';')
            .filter_map(|kv| kv.split_once('='))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
            .filter(|v| !v.is_empty())
    }

    /// Nickname part of a `nick!user@host` prefix.
    pub fn nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        Some(prefix.split_once('!').map(|(n, _)| n).unwrap_or(prefix))
    }

    /// First parameter with the leading `#` removed.
    pub fn channel(&self) -> Option<&str> {
        self.params.first().map(|c| c.trim_start_matches('#'))
    }
}

/// Events the runtime cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum IrcEvent {
    /// `001`: the server accepted our login.
    Welcome,
    Ping(String),
    Message(ChatMessage),
    Join { channel: String, user_name: String },
    Part { channel: String, user_name: String },
    Notice(String),
    /// The server is about to drop us.
    Reconnect,
    Other(String),
}

impl IrcEvent {
    pub fn from_line(line: &IrcLine) -> Self {
        match line.command.as_str() {
            "001" => IrcEvent::Welcome,
            "PING" => IrcEvent::Ping(
                line.trailing
                    .clone()
                    .or_else(|| line.params.first().cloned())
                    .unwrap_or_default(),
            ),
            "PRIVMSG" => {
                let user_name = line
                    .nick()
                    .filter(|n| !n.is_empty())
                    .or_else(|| line.tag("login"))
                    .unwrap_or_default()
                    .to_lowercase();
                IrcEvent::Message(ChatMessage {
                    channel: line.channel().unwrap_or_default().to_string(),
                    user_name,
                    display_name: line.tag("display-name").map(str::to_string),
                    user_id: line.tag("user-id").map(str::to_string),
                    text: line.trailing.clone().unwrap_or_default(),
                    timestamp: Utc::now(),
                })
            }
            "JOIN" => IrcEvent::Join {
                channel: line.channel().unwrap_or_default().to_string(),
                user_name: line.nick().unwrap_or_default().to_string(),
            },
            "PART" => IrcEvent::Part {
                channel: line.channel().unwrap_or_default().to_string(),
                user_name: line.nick().unwrap_or_default().to_string(),
            },
            "NOTICE" => IrcEvent::Notice(line.trailing.clone().unwrap_or_default()),
            "RECONNECT" => IrcEvent::Reconnect,
            other => IrcEvent::Other(other.to_string()),
        }
    }
}

pub fn parse_event(raw: &str) -> IrcEvent {
    IrcEvent::from_line(&IrcLine::parse(raw))
}
