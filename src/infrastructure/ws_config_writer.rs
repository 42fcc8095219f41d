// Config writer over the control channel - One connection per save
use crate::application::storage_repository::ConfigWriter;
use crate::domain::lovelace::LovelaceConfig;
use crate::infrastructure::control_channel::{ChannelError, Connection, Outcome, Session};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WsConfigWriter {
    url: String,
    access_token: String,
    timeout: Duration,
}

impl WsConfigWriter {
    pub fn new(url: String, access_token: String, timeout: Duration) -> Self {
        Self {
            url,
            access_token,
            timeout,
        }
    }

    /// Save `config` for `url_path`. Resolves exactly once: on the correlated
    /// result, on a socket failure, or when the timeout drops the connection.
    pub async fn save(&self, url_path: &str, config: Value) -> Result<(), ChannelError> {
        match tokio::time::timeout(self.timeout, self.exchange(url_path, config)).await {
            Ok(result) => result,
            Err(_) => Err(ChannelError::Timeout(self.timeout)),
        }
    }

    async fn exchange(&self, url_path: &str, config: Value) -> Result<(), ChannelError> {
        let mut connection = Connection::open(&self.url).await?;
        let mut session = Session::saver(&self.access_token, url_path, config);

        let result = loop {
            match connection.next_outcome(&mut session).await {
                Ok(Outcome::Saved) => break Ok(()),
                Ok(Outcome::SaveFailed(reason)) => break Err(ChannelError::SaveRejected(reason)),
                Ok(Outcome::AuthRejected(reason)) => break Err(ChannelError::AuthRejected(reason)),
                Ok(_) => continue,
                Err(e) => break Err(e),
            }
        };

        connection.close().await;
        result
    }
}

#[async_trait]
impl ConfigWriter for WsConfigWriter {
    async fn save_config(&self, url_path: &str, config: &LovelaceConfig) -> anyhow::Result<()> {
        tracing::info!("Saving config for {}", url_path);
        let payload = serde_json::to_value(config)?;

        match self.save(url_path, payload).await {
            Ok(()) => {
                tracing::info!("Config saved for {}", url_path);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Save failed for {}: {}", url_path, e);
                Err(e.into())
            }
        }
    }
}
