use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_HA_URL: &str = "http://homeassistant.local:8123";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SUPERVISOR_TOKEN is missing; the panel must run as a Home Assistant add-on")]
    MissingToken,
    #[error("invalid configuration: {0}")]
    Invalid(#[from] ::config::ConfigError),
    #[error("{0} must be at least one second")]
    ZeroDuration(&'static str),
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub listen_addr: String,
    pub storage_dir: PathBuf,
    pub options_path: PathBuf,
    pub control_url: String,
    #[serde(default)]
    pub supervisor_token: Option<String>,
    #[serde(default)]
    pub ingress_path: Option<String>,
    pub heartbeat_secs: u64,
    pub reconnect_delay_secs: u64,
    pub save_timeout_secs: u64,
}

impl AppConfig {
    /// The validated bearer token for the control channel
    pub fn access_token(&self) -> &str {
        self.supervisor_token.as_deref().unwrap_or_default()
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn save_timeout(&self) -> Duration {
        Duration::from_secs(self.save_timeout_secs)
    }
}

/// Add-on options written by the Supervisor
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AddonOptions {
    #[serde(default = "default_ha_url")]
    pub ha_url: String,
}

fn default_ha_url() -> String {
    DEFAULT_HA_URL.to_string()
}

impl Default for AddonOptions {
    fn default() -> Self {
        Self {
            ha_url: default_ha_url(),
        }
    }
}

impl AddonOptions {
    /// Home Assistant base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.ha_url.strip_suffix('/').unwrap_or(&self.ha_url)
    }
}

pub fn load_config() -> Result<AppConfig, ConfigError> {
    build_config(
        std::env::var("SUPERVISOR_TOKEN").ok(),
        std::env::var("INGRESS_PATH").ok(),
    )
}

/// Defaults, then `config/panel.*`, then `PANEL_*` variables, then the
/// Supervisor-provided token and ingress path.
pub fn build_config(
    supervisor_token: Option<String>,
    ingress_path: Option<String>,
) -> Result<AppConfig, ConfigError> {
    let settings = ::config::Config::builder()
        .set_default("listen_addr", "0.0.0.0:8000")?
        .set_default("storage_dir", "/homeassistant/.storage")?
        .set_default("options_path", "/data/options.json")?
        .set_default("control_url", "ws://supervisor/core/websocket")?
        .set_default("heartbeat_secs", 30_i64)?
        .set_default("reconnect_delay_secs", 5_i64)?
        .set_default("save_timeout_secs", 5_i64)?
        .add_source(::config::File::with_name("config/panel").required(false))
        .add_source(::config::Environment::with_prefix("PANEL"))
        .set_override_option("supervisor_token", supervisor_token)?
        .set_override_option("ingress_path", ingress_path)?
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    config.validated()
}

impl AppConfig {
    /// Check the token and timings, and normalize the ingress path.
    fn validated(mut self) -> Result<Self, ConfigError> {
        if self.supervisor_token.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::MissingToken);
        }
        for (name, secs) in [
            ("heartbeat_secs", self.heartbeat_secs),
            ("reconnect_delay_secs", self.reconnect_delay_secs),
            ("save_timeout_secs", self.save_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::ZeroDuration(name));
            }
        }
        self.ingress_path = self
            .ingress_path
            .map(|p| p.trim_end_matches('/').to_string())
            .filter(|p| !p.is_empty());
        Ok(self)
    }
}

/// Read the add-on options, falling back to defaults when absent or broken.
pub async fn load_addon_options(path: &Path) -> AddonOptions {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(_) => return AddonOptions::default(),
    };
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        tracing::warn!("Ignoring unreadable options file {}: {}", path.display(), e);
        AddonOptions::default()
    })
}
