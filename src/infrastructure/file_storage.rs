// File storage repository - Reads the host's `.storage` JSON documents
use crate::application::storage_repository::StorageRepository;
use crate::domain::dashboard::DashboardSummary;
use crate::domain::lovelace::LovelaceConfig;
use crate::domain::user::AccountRecord;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const ACCOUNTS_FILE: &str = "auth";
const DASHBOARDS_INDEX_FILE: &str = "lovelace_dashboards";

/// Every storage document wraps its payload in `data`
#[derive(Debug, Deserialize)]
struct StorageEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct DashboardIndex {
    items: Vec<DashboardSummary>,
}

#[derive(Debug, Deserialize)]
struct DashboardDocument {
    config: LovelaceConfig,
}

#[derive(Debug, Deserialize)]
struct AccountsData {
    users: Vec<AccountRecord>,
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    storage_dir: PathBuf,
}

impl FileStorage {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
        }
    }

    /// `lovelace.<id>`, or `None` for ids that would leave the storage dir
    fn dashboard_path(&self, dashboard_id: &str) -> Option<PathBuf> {
        let safe = !dashboard_id.is_empty()
            && !dashboard_id.contains(['/', '\\'])
            && dashboard_id != ".."
            && dashboard_id != ".";
        safe.then(|| self.storage_dir.join(format!("lovelace.{}", dashboard_id)))
    }

    async fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        let envelope: StorageEnvelope<T> = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(envelope.data))
    }
}

#[async_trait]
impl StorageRepository for FileStorage {
    async fn read_dashboard_index(&self) -> Result<Option<Vec<DashboardSummary>>> {
        let path = self.storage_dir.join(DASHBOARDS_INDEX_FILE);
        let index: Option<DashboardIndex> = Self::read_document(&path).await?;
        Ok(index.map(|i| i.items))
    }

    async fn read_dashboard_config(&self, dashboard_id: &str) -> Result<Option<LovelaceConfig>> {
        let Some(path) = self.dashboard_path(dashboard_id) else {
            tracing::warn!("Refusing suspicious dashboard id {:?}", dashboard_id);
            return Ok(None);
        };
        let document: Option<DashboardDocument> = Self::read_document(&path).await?;
        Ok(document.map(|d| d.config))
    }

    async fn read_accounts(&self) -> Result<Option<Vec<AccountRecord>>> {
        let path = self.storage_dir.join(ACCOUNTS_FILE);
        let accounts: Option<AccountsData> = Self::read_document(&path).await?;
        Ok(accounts.map(|a| a.users))
    }
}
