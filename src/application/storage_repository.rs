// Repository traits for the host's storage and control channel
use crate::domain::dashboard::DashboardSummary;
use crate::domain::lovelace::LovelaceConfig;
use crate::domain::user::AccountRecord;
use async_trait::async_trait;

/// Read-only access to the host's stored documents.
///
/// `Ok(None)` means the document does not exist; `Err` means it exists but
/// could not be read or parsed. Callers decide which of those is fatal.
#[async_trait]
pub trait StorageRepository: Send + Sync {
    /// Entries of the dashboards index
    async fn read_dashboard_index(&self) -> anyhow::Result<Option<Vec<DashboardSummary>>>;

    /// Stored config of a single dashboard
    async fn read_dashboard_config(&self, dashboard_id: &str)
    -> anyhow::Result<Option<LovelaceConfig>>;

    /// Every account known to the host, including system accounts
    async fn read_accounts(&self) -> anyhow::Result<Option<Vec<AccountRecord>>>;
}

/// Persists a dashboard config through the host. Nothing is written locally.
#[async_trait]
pub trait ConfigWriter: Send + Sync {
    async fn save_config(&self, url_path: &str, config: &LovelaceConfig) -> anyhow::Result<()>;
}
