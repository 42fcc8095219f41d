// Home Assistant websocket control channel
//
// Both flows that use the channel (event subscription and config save) run
// the same handshake: wait for `auth_required`, send the token, and after
// `auth_ok` send exactly one command. `Session` holds that state machine so it
// can be driven without a socket; `Connection` feeds it from a real one.
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

pub const LOVELACE_UPDATED_EVENT: &str = "lovelace_updated";
/// The default dashboard is addressed by a null url_path when saving
pub const DEFAULT_DASHBOARD_URL_PATH: &str = "lovelace";
/// Saves run on a fresh connection, so the id never needs to change
pub const SAVE_REQUEST_ID: u64 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },
    #[error("control channel socket error: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("failed to encode control channel message: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("control channel closed")]
    Closed,
    #[error("authentication rejected: {0}")]
    AuthRejected(String),
    #[error("event subscription rejected: {0}")]
    SubscribeRejected(String),
    #[error("save rejected: {0}")]
    SaveRejected(String),
    #[error("no response within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Auth {
        access_token: String,
    },
    SubscribeEvents {
        id: u64,
        event_type: String,
    },
    #[serde(rename = "lovelace/config/save")]
    SaveConfig {
        id: u64,
        url_path: Option<String>,
        config: Value,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    AuthRequired,
    AuthOk,
    AuthInvalid {
        #[serde(default)]
        message: Option<String>,
    },
    Event {
        event: EventData,
    },
    Result {
        id: u64,
        success: bool,
        #[serde(default)]
        error: Option<Value>,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventData {
    pub event_type: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Socket open, waiting for `auth_required`
    Connecting,
    /// Token sent, waiting for `auth_ok`
    Authenticating,
    /// Command sent; events and results are accepted
    Ready,
    /// Terminal; nothing more is expected
    Done,
}

#[derive(Debug)]
enum Command {
    Subscribe { event_type: String },
    Save { url_path: Option<String>, config: Option<Value> },
}

/// What a single server message meant for the session owner
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Authenticated,
    EventReceived,
    Saved,
    SaveFailed(String),
    SubscribeFailed(String),
    AuthRejected(String),
}

#[derive(Debug, Default, PartialEq)]
pub struct Step {
    pub reply: Option<ClientMessage>,
    pub outcome: Option<Outcome>,
}

#[derive(Debug)]
pub struct Session {
    phase: Phase,
    access_token: String,
    command: Command,
    next_id: u64,
    pending_id: Option<u64>,
}

impl Session {
    pub fn subscriber(access_token: &str, event_type: &str) -> Self {
        Self::new(
            access_token,
            Command::Subscribe {
                event_type: event_type.to_string(),
            },
        )
    }

    pub fn saver(access_token: &str, url_path: &str, config: Value) -> Self {
        let url_path = (url_path != DEFAULT_DASHBOARD_URL_PATH).then(|| url_path.to_string());
        Self::new(
            access_token,
            Command::Save {
                url_path,
                config: Some(config),
            },
        )
    }

    fn new(access_token: &str, command: Command) -> Self {
        Self {
            phase: Phase::Connecting,
            access_token: access_token.to_string(),
            command,
            next_id: 1,
            pending_id: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Advance on one server message.
    pub fn handle(&mut self, message: ServerMessage) -> Step {
        match (self.phase, message) {
            (Phase::Connecting, ServerMessage::AuthRequired) => {
                self.phase = Phase::Authenticating;
                Step {
                    reply: Some(ClientMessage::Auth {
                        access_token: self.access_token.clone(),
                    }),
                    outcome: None,
                }
            }
            (Phase::Authenticating, ServerMessage::AuthOk) => {
                self.phase = Phase::Ready;
                Step {
                    reply: Some(self.command_message()),
                    outcome: Some(Outcome::Authenticated),
                }
            }
            (Phase::Authenticating, ServerMessage::AuthInvalid { message }) => {
                self.phase = Phase::Done;
                Step {
                    reply: None,
                    outcome: Some(Outcome::AuthRejected(
                        message.unwrap_or_else(|| "invalid access token".to_string()),
                    )),
                }
            }
            (Phase::Ready, ServerMessage::Event { event }) => match &self.command {
                Command::Subscribe { event_type } if *event_type == event.event_type => Step {
                    reply: None,
                    outcome: Some(Outcome::EventReceived),
                },
                _ => Step::default(),
            },
            (Phase::Ready, ServerMessage::Result { id, success, error })
                if Some(id) == self.pending_id =>
            {
                self.finish_command(success, error)
            }
            _ => Step::default(),
        }
    }

    fn command_message(&mut self) -> ClientMessage {
        match &mut self.command {
            Command::Subscribe { event_type } => {
                let id = self.next_id;
                self.next_id += 1;
                self.pending_id = Some(id);
                ClientMessage::SubscribeEvents {
                    id,
                    event_type: event_type.clone(),
                }
            }
            Command::Save { url_path, config } => {
                self.pending_id = Some(SAVE_REQUEST_ID);
                ClientMessage::SaveConfig {
                    id: SAVE_REQUEST_ID,
                    url_path: url_path.clone(),
                    config: config.take().unwrap_or(Value::Null),
                }
            }
        }
    }

    fn finish_command(&mut self, success: bool, error: Option<Value>) -> Step {
        self.pending_id = None;
        let outcome = match (&self.command, success) {
            // Subscription confirmed: keep listening
            (Command::Subscribe { .. }, true) => return Step::default(),
            (Command::Subscribe { .. }, false) => {
                Outcome::SubscribeFailed(describe_error(error.as_ref()))
            }
            (Command::Save { .. }, true) => Outcome::Saved,
            (Command::Save { .. }, false) => Outcome::SaveFailed(describe_error(error.as_ref())),
        };
        self.phase = Phase::Done;
        Step {
            reply: None,
            outcome: Some(outcome),
        }
    }
}

/// Home Assistant errors look like `{"code": "...", "message": "..."}`
fn describe_error(error: Option<&Value>) -> String {
    match error {
        Some(Value::Object(map)) => match (map.get("code"), map.get("message")) {
            (Some(Value::String(code)), Some(Value::String(message))) => {
                format!("{}: {}", code, message)
            }
            (_, Some(Value::String(message))) => message.clone(),
            _ => Value::Object(map.clone()).to_string(),
        },
        Some(Value::String(message)) => message.clone(),
        Some(other) => other.to_string(),
        None => "unknown error".to_string(),
    }
}

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// An open control channel socket
pub struct Connection {
    socket: WsStream,
}

impl Connection {
    pub async fn open(url: &str) -> Result<Self, ChannelError> {
        let (socket, _) = connect_async(url)
            .await
            .map_err(|source| ChannelError::Connect {
                url: url.to_string(),
                source,
            })?;
        Ok(Self { socket })
    }

    async fn send(&mut self, message: &ClientMessage) -> Result<(), ChannelError> {
        let text = serde_json::to_string(message)?;
        self.socket.send(Message::Text(text)).await?;
        Ok(())
    }

    /// Read until a message produces an outcome, answering the server as
    /// the session requires. A closed socket is `ChannelError::Closed`.
    pub async fn next_outcome(&mut self, session: &mut Session) -> Result<Outcome, ChannelError> {
        loop {
            let frame = match self.socket.next().await {
                Some(frame) => frame?,
                None => return Err(ChannelError::Closed),
            };

            let text = match frame {
                Message::Text(text) => text,
                Message::Close(_) => return Err(ChannelError::Closed),
                _ => continue,
            };

            let message: ServerMessage = match serde_json::from_str(&text) {
                Ok(message) => message,
                Err(e) => {
                    tracing::debug!("Skipping undecodable control message: {}", e);
                    continue;
                }
            };

            let step = session.handle(message);
            if let Some(reply) = &step.reply {
                self.send(reply).await?;
            }
            if let Some(outcome) = step.outcome {
                return Ok(outcome);
            }
        }
    }

    pub async fn close(mut self) {
        if let Err(e) = self.socket.close(None).await {
            tracing::debug!("Control channel close failed: {}", e);
        }
    }
}
