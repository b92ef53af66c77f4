//! src/platforms/twitch_irc/client.rs

use tokio::io::{split, AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_native_tls::TlsConnector;
use tracing::{debug, error, info, warn};

use crate::Error;
use super::parser::{parse_event, IrcEvent};

pub const TWITCH_IRC_HOST: &str = "irc.chat.twitch.tv";
pub const TWITCH_IRC_TLS_PORT: u16 = 6697;

/// Low-level IRC client that connects to Twitch via TLS.
///
/// Reading and writing run on their own tasks; outgoing lines are queued on an
/// unbounded channel so callers never wait on the socket.
pub struct TwitchIrcClient {
    outgoing: mpsc::UnboundedSender<String>,

    /// Parsed events from the read loop. Taken once by the runtime.
    pub incoming: Option<mpsc::UnboundedReceiver<IrcEvent>>,

    read_task: JoinHandle<()>,
    write_task: JoinHandle<()>,
}

impl TwitchIrcClient {
    /// Connects with TLS, logs in with PASS/NICK, requests the Twitch
    /// capabilities and spawns the read/write loops.
    pub async fn connect(username: &str, oauth_token: &str) -> Result<Self, Error> {
        let tcp = TcpStream::connect((TWITCH_IRC_HOST, TWITCH_IRC_TLS_PORT))
            .await
            .map_err(|e| Error::Platform(format!("TCP connect error: {e}")))?;

        let connector = native_tls::TlsConnector::new()
            .map_err(|e| Error::Platform(format!("TLSConnector::new() => {e}")))?;
        let tls_stream = TlsConnector::from(connector)
            .connect(TWITCH_IRC_HOST, tcp)
            .await
            .map_err(|e| Error::Platform(format!("TLS connect() => {e}")))?;

        let (read_half, write_half) = split(tls_stream);

        let (tx_outgoing, rx_outgoing) = mpsc::unbounded_channel::<String>();
        let (tx_incoming, rx_incoming) = mpsc::unbounded_channel::<IrcEvent>();

        let write_task = tokio::spawn(Self::writer_loop(write_half, rx_outgoing));

        tx_outgoing.send(format!("PASS {}", oauth_token)).ok();
        tx_outgoing.send(format!("NICK {}", username.to_lowercase())).ok();
        tx_outgoing
            .send("CAP REQ :twitch.tv/commands twitch.tv/tags twitch.tv/membership".to_string())
            .ok();

        let read_task = tokio::spawn(Self::reader_loop(read_half, tx_incoming, tx_outgoing.clone()));

        Ok(Self {
            outgoing: tx_outgoing,
            incoming: Some(rx_incoming),
            read_task,
            write_task,
        })
    }

    async fn reader_loop<R>(
        read_half: R,
        tx_incoming: mpsc::UnboundedSender<IrcEvent>,
        tx_outgoing: mpsc::UnboundedSender<String>,
    )
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        let mut reader = BufReader::new(read_half);
        let mut line_buffer = String::new();

        loop {
            line_buffer.clear();
            match reader.read_line(&mut line_buffer).await {
                Ok(0) => {
                    info!("(TwitchIrcClient) read_loop => EOF");
                    break;
                }
                Ok(_) => {
                    let line = line_buffer.trim_end();
                    if line.is_empty() {
                        continue;
                    }
                    debug!("<< {}", line);

                    match parse_event(line) {
                        IrcEvent::Ping(token) => {
                            tx_outgoing.send(format!("PONG :{}", token)).ok();
                            debug!("Auto PONG -> {}", token);
                        }
                        IrcEvent::Other(_) => {}
                        evt => {
                            if tx_incoming.send(evt).is_err() {
                                warn!("(TwitchIrcClient) nobody is listening for IRC events");
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    error!("(TwitchIrcClient) read error => {:?}", e);
                    break;
                }
            }
        }

        info!("(TwitchIrcClient) reader_loop ended.");
    }

    async fn writer_loop<W>(write_half: W, mut rx_outgoing: mpsc::UnboundedReceiver<String>)
    where
        W: tokio::io::AsyncWrite + Unpin,
    {
        let mut writer = BufWriter::new(write_half);

        while let Some(line) = rx_outgoing.recv().await {
            if line.starts_with("PASS ") {
                debug!(">> PASS ****");
            } else {
                debug!(">> {}", line);
            }
            let result = async {
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\r\n").await?;
                writer.flush().await
            }
            .await;
            if let Err(e) = result {
                error!("(TwitchIrcClient) writer error => {:?}", e);
                break;
            }
        }

        info!("(TwitchIrcClient) writer_loop ended.");
    }

    pub fn send_raw_line(&self, line: &str) -> Result<(), Error> {
        self.outgoing
            .send(line.to_string())
            .map_err(|_| Error::Platform("Twitch IRC writer has stopped".into()))
    }

    pub fn join_channel(&self, channel: &str) -> Result<(), Error> {
        self.send_raw_line(&format!("JOIN #{}", channel.trim_start_matches('#').to_lowercase()))
    }

    pub fn part_channel(&self, channel: &str) -> Result<(), Error> {
        self.send_raw_line(&format!("PART #{}", channel.trim_start_matches('#').to_lowercase()))
    }

    pub fn send_privmsg(&self, channel: &str, message: &str) -> Result<(), Error> {
        self.send_raw_line(&privmsg_line(channel, message))
    }

    /// Best effort. Twitch no longer delivers `/w` chat commands sent over
    /// IRC, so the server may drop this line silently. Reliable delivery needs
    /// the Helix `POST /whispers` endpoint with a `user:manage:whispers` token.
    pub fn send_whisper(&self, channel: &str, user_name: &str, message: &str) -> Result<(), Error> {
        self.send_raw_line(&whisper_line(channel, user_name, message))
    }

    /// Aborts the read/write tasks.
    pub fn shutdown(self) {
        self.read_task.abort();
        self.write_task.abort();
    }
}

/// Formats a PRIVMSG, folding newlines so a reply can never inject raw commands.
pub fn privmsg_line(channel: &str, message: &str) -> String {
    let flat: String = message
        .chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect();
    format!("PRIVMSG #{} :{}", channel.trim_start_matches('#').to_lowercase(), flat)
}

/// The legacy `/w <login> <text>` chat command, addressed to the lower-case login.
pub fn whisper_line(channel: &str, user_name: &str, message: &str) -> String {
    privmsg_line(channel, &format!("/w {} {}", user_name.trim().to_lowercase(), message))
}
