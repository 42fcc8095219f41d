// In-memory fakes for the repository traits
use crate::application::storage_repository::{ConfigWriter, StorageRepository};
use crate::domain::dashboard::DashboardSummary;
use crate::domain::lovelace::LovelaceConfig;
use crate::domain::user::AccountRecord;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
pub struct InMemoryStorage {
    index: Vec<DashboardSummary>,
    configs: HashMap<String, LovelaceConfig>,
    accounts: Option<Vec<AccountRecord>>,
    failing: AtomicBool,
}

impl InMemoryStorage {
    pub fn summary(id: &str) -> DashboardSummary {
        DashboardSummary {
            id: id.to_string(),
            title: id.to_uppercase(),
            url_path: format!("dashboard-{id}"),
            mode: "storage".to_string(),
            icon: None,
        }
    }

    pub fn with_summary(mut self, id: &str) -> Self {
        self.index.push(Self::summary(id));
        self
    }

    pub fn with_dashboard(mut self, id: &str, config: Value) -> Self {
        self.index.push(Self::summary(id));
        self.configs
            .insert(id.to_string(), serde_json::from_value(config).unwrap());
        self
    }

    pub fn with_accounts(mut self, accounts: Value) -> Self {
        self.accounts = Some(serde_json::from_value(accounts).unwrap());
        self
    }

    /// Every subsequent read reports a parse failure
    pub fn fail_reads(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("expected value at line 1 column 1");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageRepository for InMemoryStorage {
    async fn read_dashboard_index(&self) -> anyhow::Result<Option<Vec<DashboardSummary>>> {
        self.check()?;
        Ok(Some(self.index.clone()))
    }

    async fn read_dashboard_config(
        &self,
        dashboard_id: &str,
    ) -> anyhow::Result<Option<LovelaceConfig>> {
        self.check()?;
        Ok(self.configs.get(dashboard_id).cloned())
    }

    async fn read_accounts(&self) -> anyhow::Result<Option<Vec<AccountRecord>>> {
        self.check()?;
        Ok(self.accounts.clone())
    }
}

/// Records every save and answers with a fixed outcome
pub struct RecordingWriter {
    accept: bool,
    pub saves: Mutex<Vec<(String, LovelaceConfig)>>,
}

impl RecordingWriter {
    pub fn accepting() -> Self {
        Self {
            accept: true,
            saves: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            accept: false,
            saves: Mutex::new(Vec::new()),
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().unwrap().len()
    }

    pub fn last_saved(&self) -> Option<(String, Value)> {
        self.saves
            .lock()
            .unwrap()
            .last()
            .map(|(path, config)| (path.clone(), serde_json::to_value(config).unwrap()))
    }
}

#[async_trait]
impl ConfigWriter for RecordingWriter {
    async fn save_config(&self, url_path: &str, config: &LovelaceConfig) -> anyhow::Result<()> {
        self.saves
            .lock()
            .unwrap()
            .push((url_path.to_string(), config.clone()));
        if self.accept {
            Ok(())
        } else {
            anyhow::bail!("save rejected: Unauthorized")
        }
    }
}
