// Dashboard service - Read side of the panel
//
// Every call reads the storage afresh so edits made elsewhere show up on the
// next fetch. Read failures are logged and turn into empty results.
use crate::application::storage_repository::StorageRepository;
use crate::domain::dashboard::{Dashboard, DashboardSummary};
use crate::domain::user::User;
use futures::future::join_all;
use std::sync::Arc;

#[derive(Clone)]
pub struct DashboardService {
    repository: Arc<dyn StorageRepository>,
}

impl DashboardService {
    pub fn new(repository: Arc<dyn StorageRepository>) -> Self {
        Self { repository }
    }

    pub async fn list_dashboards(&self) -> Vec<DashboardSummary> {
        match self.repository.read_dashboard_index().await {
            Ok(Some(items)) => items,
            Ok(None) => {
                tracing::debug!("No dashboards index found");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Failed to read dashboards index: {:#}", e);
                Vec::new()
            }
        }
    }

    pub async fn load_dashboard_detail(&self, summary: &DashboardSummary) -> Dashboard {
        match self.repository.read_dashboard_config(&summary.id).await {
            Ok(Some(config)) => Dashboard::from_config(summary, &config),
            Ok(None) => {
                tracing::debug!("No stored config for dashboard {}", summary.id);
                Dashboard::empty(summary)
            }
            Err(e) => {
                tracing::warn!("Failed to read dashboard {}: {:#}", summary.id, e);
                Dashboard::empty(summary)
            }
        }
    }

    /// Index entries expanded with their views, in index order
    pub async fn list_dashboard_details(&self) -> Vec<Dashboard> {
        let summaries = self.list_dashboards().await;
        join_all(summaries.iter().map(|s| self.load_dashboard_detail(s))).await
    }

    pub async fn list_users(&self) -> Vec<User> {
        match self.repository.read_accounts().await {
            Ok(Some(accounts)) => accounts.iter().filter_map(User::from_account).collect(),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read accounts: {:#}", e);
                Vec::new()
            }
        }
    }
}
