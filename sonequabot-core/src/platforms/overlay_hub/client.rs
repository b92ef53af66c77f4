//! src/platforms/overlay_hub/client.rs
//!
//! Long-lived connection to the overlay's SignalR hub. Runs on its own task,
//! fed by an unbounded queue, and reconnects forever after a random delay.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use tokio::net::TcpStream;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, timeout, MissedTickBehavior};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, trace, warn};

use sonequabot_common::models::OverlayTask;

use crate::Error;
use crate::platforms::NotificationSink;
use super::protocol::{self, HubMessage, NegotiateResponse, SEND_TASK_TARGET};

type HubSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone)]
pub struct OverlayHubConfig {
    /// e.g. `http://localhost:5000/sonequahub`
    pub hub_url: String,
    /// Connect the WebSocket directly instead of calling `/negotiate` first.
    pub skip_negotiation: bool,
    /// Reconnect delays are drawn from `0..max_retry_delay_secs` whole seconds.
    pub max_retry_delay_secs: u64,
    pub keepalive_interval: Duration,
    pub handshake_timeout: Duration,
}

impl OverlayHubConfig {
    pub fn new(hub_url: &str) -> Self {
        Self {
            hub_url: hub_url.to_string(),
            skip_negotiation: false,
            max_retry_delay_secs: 5,
            keepalive_interval: Duration::from_secs(15),
            handshake_timeout: Duration::from_secs(10),
        }
    }
}

/// Cheap, cloneable sender side handed to the rest of the bot.
#[derive(Clone)]
pub struct OverlayHubHandle {
    tx: mpsc::UnboundedSender<OverlayTask>,
}

impl OverlayHubHandle {
    pub fn new(tx: mpsc::UnboundedSender<OverlayTask>) -> Self {
        Self { tx }
    }
}

impl NotificationSink for OverlayHubHandle {
    fn push(&self, task: OverlayTask) {
        if let Err(e) = self.tx.send(task) {
            debug!("(OverlayHub) dropped {} => hub task has stopped", e.0.task_name());
        }
    }
}

/// How a connected session ended.
enum SessionEnd {
    /// The server went away or asked us to leave; reconnect.
    Disconnected,
    /// Shutdown was requested or every handle was dropped.
    Stopped,
}

pub struct OverlayHubClient {
    config: OverlayHubConfig,
    http: reqwest::Client,
    rx: mpsc::UnboundedReceiver<OverlayTask>,
    shutdown_rx: watch::Receiver<bool>,
}

impl OverlayHubClient {
    /// Spawns the supervised connection loop and returns the handle used to push tasks.
    pub fn spawn(config: OverlayHubConfig, shutdown_rx: watch::Receiver<bool>) -> (OverlayHubHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = Self {
            config,
            http: reqwest::Client::new(),
            rx,
            shutdown_rx,
        };
        let handle = tokio::spawn(client.run());
        (OverlayHubHandle::new(tx), handle)
    }

    async fn run(mut self) {
        info!("(OverlayHub) starting, hub => {}", self.config.hub_url);

        loop {
            if *self.shutdown_rx.borrow() {
                break;
            }

            match self.open_session().await {
                Ok(ws) => {
                    info!("(OverlayHub) connection started");
                    self.discard_stale_tasks();
                    match self.pump(ws).await {
                        Ok(SessionEnd::Stopped) => break,
                        Ok(SessionEnd::Disconnected) => warn!("(OverlayHub) connection closed"),
                        Err(e) => warn!("(OverlayHub) connection lost => {}", e),
                    }
                }
                Err(e) => error!("(OverlayHub) connect failed => {}", e),
            }

            if self.discard_stale_tasks() {
                break;
            }
            let delay = reconnect_delay(self.config.max_retry_delay_secs);
            debug!("(OverlayHub) reconnecting in {:?}", delay);
            if self.wait_offline(delay).await {
                break;
            }
        }

        info!("(OverlayHub) stopped.");
    }

    /// Negotiate (unless skipped), open the socket and complete the handshake.
    async fn open_session(&self) -> Result<HubSocket, Error> {
        let token = if self.config.skip_negotiation {
            None
        } else {
            let negotiated = self.negotiate().await?;
            if !negotiated.supports_websockets() {
                return Err(Error::Sink("hub does not offer the WebSockets transport".into()));
            }
            negotiated.connection_token().map(str::to_string)
        };

        let url = protocol::websocket_url(&self.config.hub_url, token.as_deref())?;
        let (mut ws, _) = connect_async(url.as_str())
            .await
            .map_err(|e| Error::Sink(format!("websocket connect error: {e}")))?;

        ws.send(Message::text(protocol::handshake_request()))
            .await
            .map_err(|e| Error::Sink(format!("handshake send error: {e}")))?;

        timeout(self.config.handshake_timeout, wait_for_handshake(&mut ws))
            .await
            .map_err(|_| Error::Sink("timed out waiting for handshake response".into()))??;

        Ok(ws)
    }

    async fn negotiate(&self) -> Result<NegotiateResponse, Error> {
        let url = protocol::negotiate_url(&self.config.hub_url)?;
        let resp: NegotiateResponse = self
            .http
            .post(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = resp.error.as_deref() {
            return Err(Error::Sink(format!("negotiate refused: {}", err)));
        }
        if resp.url.is_some() {
            return Err(Error::Sink("negotiate redirects are not supported".into()));
        }
        Ok(resp)
    }

    /// Tasks queued while we were offline describe a mood that is already stale.
    /// Returns true when every handle has been dropped.
    fn discard_stale_tasks(&mut self) -> bool {
        let (dropped, closed) = drain_queue(&mut self.rx);
        if dropped > 0 {
            debug!("(OverlayHub) discarded {} tasks queued while offline", dropped);
        }
        closed
    }

    /// Sleeps out the retry delay, discarding pushes as they arrive so the
    /// queue stays empty while the hub is down. Returns true when the client
    /// should stop.
    async fn wait_offline(&mut self, delay: Duration) -> bool {
        let retry = sleep(delay);
        tokio::pin!(retry);
        loop {
            tokio::select! {
                _ = &mut retry => return false,
                maybe_task = self.rx.recv() => match maybe_task {
                    Some(task) => trace!("(OverlayHub) offline, dropping {}", task.task_name()),
                    None => return true,
                },
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        return true;
                    }
                }
            }
        }
    }

    async fn pump(&mut self, ws: HubSocket) -> Result<SessionEnd, Error> {
        let (mut sink, mut stream) = ws.split();
        let mut keepalive = interval(self.config.keepalive_interval);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);
        keepalive.tick().await;

        loop {
            tokio::select! {
                maybe_task = self.rx.recv() => {
                    let Some(task) = maybe_task else {
                        let _ = sink.send(Message::text(protocol::close())).await;
                        return Ok(SessionEnd::Stopped);
                    };
                    let frame = protocol::invocation(SEND_TASK_TARGET, &task.arguments());
                    trace!("(OverlayHub) >> {}", frame.trim_end_matches(protocol::RECORD_SEPARATOR));
                    sink.send(Message::text(frame))
                        .await
                        .map_err(|e| Error::Sink(format!("send error: {e}")))?;
                }
                incoming = stream.next() => {
                    let Some(msg) = incoming else {
                        return Ok(SessionEnd::Disconnected);
                    };
                    let msg = msg.map_err(|e| Error::Sink(format!("ws error: {e}")))?;
                    match msg {
                        Message::Text(txt) => {
                            if handle_frame(&txt)? {
                                return Ok(SessionEnd::Disconnected);
                            }
                        }
                        Message::Close(_) => return Ok(SessionEnd::Disconnected),
                        _ => {}
                    }
                }
                _ = keepalive.tick() => {
                    sink.send(Message::text(protocol::ping()))
                        .await
                        .map_err(|e| Error::Sink(format!("ping error: {e}")))?;
                }
                _ = self.shutdown_rx.changed() => {
                    let _ = sink.send(Message::text(protocol::close())).await;
                    let _ = sink.close().await;
                    return Ok(SessionEnd::Stopped);
                }
            }
        }
    }
}

async fn wait_for_handshake(ws: &mut HubSocket) -> Result<(), Error> {
    while let Some(msg) = ws.next().await {
        let msg = msg.map_err(|e| Error::Sink(format!("ws error: {e}")))?;
        let txt = match msg {
            Message::Text(txt) => txt,
            Message::Close(_) => return Err(Error::Sink("closed during handshake".into())),
            _ => continue,
        };
        let first = protocol::split_records(&txt).next();
        if let Some(first) = first {
            return match protocol::parse_record(first)? {
                HubMessage::Handshake { error: None } => Ok(()),
                HubMessage::Handshake { error: Some(err) } => {
                    Err(Error::Sink(format!("handshake rejected: {}", err)))
                }
                other => Err(Error::Sink(format!("unexpected message before handshake: {:?}", other))),
            };
        }
    }
    Err(Error::Sink("closed during handshake".into()))
}

/// Processes an incoming text frame; `Ok(true)` means the server closed the session.
fn handle_frame(frame: &str) -> Result<bool, Error> {
    for record in protocol::split_records(frame) {
        match protocol::parse_record(record)? {
            HubMessage::Ping => trace!("(OverlayHub) << ping"),
            HubMessage::Close { error, allow_reconnect } => {
                warn!(
                    "(OverlayHub) server closed the connection (error={:?}, allow_reconnect={})",
                    error, allow_reconnect
                );
                return Ok(true);
            }
            HubMessage::Invocation { target, arguments } => {
                debug!("(OverlayHub) ignoring server invocation {} {:?}", target, arguments);
            }
            other => trace!("(OverlayHub) << {:?}", other),
        }
    }
    Ok(false)
}

/// Empties the queue without blocking. Returns how many tasks were dropped and
/// whether the sending side is gone.
fn drain_queue(rx: &mut mpsc::UnboundedReceiver<OverlayTask>) -> (usize, bool) {
    let mut dropped = 0usize;
    loop {
        match rx.try_recv() {
            Ok(_) => dropped += 1,
            Err(TryRecvError::Empty) => return (dropped, false),
            Err(TryRecvError::Disconnected) => return (dropped, true),
        }
    }
}

/// Random whole-second delay in `0..max_secs`.
pub fn reconnect_delay(max_secs: u64) -> Duration {
    if max_secs == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs(rand::rng().random_range(0..max_secs))
}
