// Access service - Toggle who can see a dashboard view
use crate::application::storage_repository::{ConfigWriter, StorageRepository};
use crate::domain::access::{AccessError, UpdateRequest};
use std::sync::Arc;

#[derive(Clone)]
pub struct AccessService {
    repository: Arc<dyn StorageRepository>,
    writer: Arc<dyn ConfigWriter>,
}

impl AccessService {
    pub fn new(repository: Arc<dyn StorageRepository>, writer: Arc<dyn ConfigWriter>) -> Self {
        Self { repository, writer }
    }

    /// Load the dashboard config, mutate the target view and push the whole
    /// config back through the host. The loaded copy is discarded either way,
    /// so a rejected save leaves the stored config untouched.
    pub async fn update_access(&self, request: &UpdateRequest) -> Result<(), AccessError> {
        let mut config = match self.repository.read_dashboard_config(&request.dash_id).await {
            Ok(Some(config)) => config,
            Ok(None) => return Err(AccessError::DashboardNotFound),
            Err(e) => {
                tracing::error!("Failed to read dashboard {}: {:#}", request.dash_id, e);
                return Err(AccessError::Malformed(format!("{:#}", e)));
            }
        };

        request.apply(&mut config)?;

        match self.writer.save_config(&request.url_path, &config).await {
            Ok(()) => {
                tracing::info!(
                    "Updated access for view {} of dashboard {}",
                    request.view_path,
                    request.dash_id
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!("Save failed for dashboard {}: {:#}", request.dash_id, e);
                Err(AccessError::SaveRejected)
            }
        }
    }
}
