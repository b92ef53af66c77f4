//! src/platforms/overlay_hub/protocol.rs
//!
//! The subset of the SignalR JSON hub protocol the overlay needs:
//! negotiate, handshake, non-blocking invocations, pings and close.

use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::Error;

/// Terminates every JSON hub message.
pub const RECORD_SEPARATOR: char = '\u{1e}';

/// Hub method the overlay listens on.
pub const SEND_TASK_TARGET: &str = "SendTask";

const INVOCATION: i64 = 1;
const STREAM_ITEM: i64 = 2;
const COMPLETION: i64 = 3;
const PING: i64 = 6;
const CLOSE: i64 = 7;

#[derive(Debug, Clone, PartialEq)]
pub enum HubMessage {
    /// Reply to our handshake; `error` is set when the server refused it.
    Handshake { error: Option<String> },
    Invocation { target: String, arguments: Vec<Value> },
    /// Stream items and completions; we never start invocations that expect them.
    Result,
    Ping,
    Close { error: Option<String>, allow_reconnect: bool },
    Unknown(i64),
}

pub fn handshake_request() -> String {
    format!("{}{}", json!({ "protocol": "json", "version": 1 }), RECORD_SEPARATOR)
}

/// A fire-and-forget invocation (no invocation id, so no completion comes back).
pub fn invocation(target: &str, arguments: &[Value]) -> String {
    format!(
        "{}{}",
        json!({ "type": INVOCATION, "target": target, "arguments": arguments }),
        RECORD_SEPARATOR
    )
}

pub fn ping() -> String {
    format!("{}{}", json!({ "type": PING }), RECORD_SEPARATOR)
}

pub fn close() -> String {
    format!("{}{}", json!({ "type": CLOSE }), RECORD_SEPARATOR)
}

/// Splits a text frame into its records. Empty trailing pieces are dropped.
pub fn split_records(frame: &str) -> impl Iterator<Item = &str> {
    frame.split(RECORD_SEPARATOR).filter(|r| !r.trim().is_empty())
}

pub fn parse_record(record: &str) -> Result<HubMessage, Error> {
    let value: Value = serde_json::from_str(record)?;
    let Some(kind) = value.get("type").and_then(Value::as_i64) else {
        // only the handshake response carries no type
        return Ok(HubMessage::Handshake {
            error: value.get("error").and_then(Value::as_str).map(str::to_string),
        });
    };

    Ok(match kind {
        INVOCATION => HubMessage::Invocation {
            target: value
                .get("target")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            arguments: value
                .get("arguments")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        },
        STREAM_ITEM | COMPLETION => HubMessage::Result,
        PING => HubMessage::Ping,
        CLOSE => HubMessage::Close {
            error: value.get("error").and_then(Value::as_str).map(str::to_string),
            allow_reconnect: value
                .get("allowReconnect")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        },
        other => HubMessage::Unknown(other),
    })
}

/// Body of `POST {hub}/negotiate?negotiateVersion=1`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiateResponse {
    pub connection_id: Option<String>,
    pub connection_token: Option<String>,
    #[serde(default)]
    pub negotiate_version: u32,
    /// Set when the server redirects us to another service (e.g. Azure SignalR).
    pub url: Option<String>,
    pub access_token: Option<String>,
    #[serde(default)]
    pub available_transports: Vec<AvailableTransport>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableTransport {
    pub transport: String,
    #[serde(default)]
    pub transfer_formats: Vec<String>,
}

impl NegotiateResponse {
    /// The id to put on the WebSocket URL; version 1 servers hand out a
    /// separate token, older ones reuse the connection id.
    pub fn connection_token(&self) -> Option<&str> {
        if self.negotiate_version >= 1 {
            self.connection_token.as_deref().or(self.connection_id.as_deref())
        } else {
            self.connection_id.as_deref()
        }
    }

    pub fn supports_websockets(&self) -> bool {
        self.available_transports.is_empty()
            || self
                .available_transports
                .iter()
                .any(|t| t.transport.eq_ignore_ascii_case("WebSockets"))
    }
}

pub fn negotiate_url(hub_url: &str) -> Result<Url, Error> {
    let mut url = Url::parse(hub_url)?;
    let path = format!("{}/negotiate", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.query_pairs_mut().append_pair("negotiateVersion", "1");
    Ok(url)
}

/// Hub URL with an http(s) scheme swapped for ws(s) and the connection id appended.
pub fn websocket_url(hub_url: &str, connection_token: Option<&str>) -> Result<Url, Error> {
    let mut url = Url::parse(hub_url)?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(Error::Config(format!("Unsupported hub URL scheme '{}'", other))),
    };
    url.set_scheme(scheme)
        .map_err(|_| Error::Config(format!("Cannot use scheme '{}' for {}", scheme, hub_url)))?;
    if let Some(token) = connection_token {
        url.query_pairs_mut().append_pair("id", token);
    }
    Ok(url)
}
