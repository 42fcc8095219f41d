// Application state for HTTP handlers
use crate::application::access_service::AccessService;
use crate::application::dashboard_service::DashboardService;
use crate::application::live_updates::LiveUpdateBroadcaster;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub dashboard_service: DashboardService,
    pub access_service: AccessService,
    pub broadcaster: Arc<LiveUpdateBroadcaster>,
    pub options_path: PathBuf,
}
