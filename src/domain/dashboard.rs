// Dashboard domain model
use super::lovelace::{LovelaceConfig, LovelaceView};
use serde::{Deserialize, Serialize};

/// One entry of the dashboards index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub id: String,
    pub title: String,
    pub url_path: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub id: String,
    pub title: String,
    pub url: String,
    pub views: Vec<View>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub title: String,
    pub path: String,
    pub icon: String,
    pub is_public: bool,
    pub allowed_user_ids: Vec<String>,
}

impl View {
    pub fn from_lovelace(view: &LovelaceView, index: usize) -> Self {
        let allowed = view.allowed_users();
        Self {
            title: view.effective_title(index),
            path: view.effective_path(index),
            icon: view.effective_icon(),
            is_public: allowed.is_none(),
            allowed_user_ids: allowed.unwrap_or_default(),
        }
    }
}

impl Dashboard {
    /// A dashboard with no views, used when its config can't be read.
    pub fn empty(summary: &DashboardSummary) -> Self {
        Self {
            id: summary.id.clone(),
            title: summary.title.clone(),
            url: summary.url_path.clone(),
            views: Vec::new(),
        }
    }

    pub fn from_config(summary: &DashboardSummary, config: &LovelaceConfig) -> Self {
        let views = config
            .views
            .iter()
            .flatten()
            .enumerate()
            .map(|(index, view)| View::from_lovelace(view, index))
            .collect();

        Self {
            views,
            ..Self::empty(summary)
        }
    }
}
