// Event listener - Long-lived subscription to `lovelace_updated`
use crate::application::live_updates::LiveUpdateBroadcaster;
use crate::infrastructure::control_channel::{
    ChannelError, Connection, LOVELACE_UPDATED_EVENT, Outcome, Session,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct EventListener {
    url: String,
    access_token: String,
    broadcaster: Arc<LiveUpdateBroadcaster>,
    reconnect_delay: Duration,
}

impl EventListener {
    pub fn new(
        url: String,
        access_token: String,
        broadcaster: Arc<LiveUpdateBroadcaster>,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            url,
            access_token,
            broadcaster,
            reconnect_delay,
        }
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Reconnects after a fixed delay for as long as `cancel` is not triggered.
    pub async fn run(self, cancel: CancellationToken) {
        loop {
            tracing::info!("Connecting to Home Assistant event bus at {}", self.url);

            tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.listen() => match result {
                    Err(ChannelError::Closed) => tracing::warn!("Event bus disconnected"),
                    Err(e) => tracing::warn!("Event bus error: {}", e),
                    Ok(()) => {}
                },
            }

            tracing::info!("Reconnecting in {:?}", self.reconnect_delay);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }
        tracing::info!("Event listener stopped");
    }

    /// One connection's worth of listening. Only returns on failure.
    async fn listen(&self) -> Result<(), ChannelError> {
        let mut connection = Connection::open(&self.url).await?;
        let mut session = Session::subscriber(&self.access_token, LOVELACE_UPDATED_EVENT);

        loop {
            match connection.next_outcome(&mut session).await? {
                Outcome::Authenticated => tracing::info!("Event listener authenticated"),
                Outcome::EventReceived => {
                    tracing::info!("Lovelace config updated, notifying streams");
                    self.broadcaster.notify_all();
                }
                Outcome::AuthRejected(reason) => return Err(ChannelError::AuthRejected(reason)),
                Outcome::SubscribeFailed(reason) => {
                    return Err(ChannelError::SubscribeRejected(reason));
                }
                Outcome::Saved | Outcome::SaveFailed(_) => {}
            }
        }
    }
}
