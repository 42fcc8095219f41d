// Lovelace storage document model
//
// Mirrors the parts of a dashboard's stored config that the panel reads or
// mutates. Every other key is carried through `extra` so a save writes back
// exactly what was loaded, plus the visibility change.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_VIEW_ICON: &str = "mdi:view-dashboard";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LovelaceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<Vec<LovelaceView>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LovelaceView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<ViewVisibility>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `visible` key of a view. Any array restricts the view, whatever its
/// entries look like; a boolean (or anything else the frontend may have
/// written) leaves it public.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ViewVisibility {
    Rules(Vec<VisibilityRule>),
    Flag(bool),
    Other(Value),
}

/// One entry of a restriction list. Anything that is not an object with a
/// string `user` is kept verbatim so a save writes it back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VisibilityRule {
    User(UserRule),
    Raw(Value),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRule {
    pub user: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VisibilityRule {
    pub fn for_user(user_id: &str) -> Self {
        VisibilityRule::User(UserRule {
            user: user_id.to_string(),
            extra: Map::new(),
        })
    }

    /// The user this entry grants, if it names one
    pub fn user(&self) -> Option<&str> {
        match self {
            VisibilityRule::User(rule) if !rule.user.is_empty() => Some(&rule.user),
            _ => None,
        }
    }
}

/// Empty strings count as missing, matching how the frontend falls back.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl LovelaceView {
    /// Path used to address this view: the explicit path, or its position.
    pub fn effective_path(&self, index: usize) -> String {
        non_empty(&self.path)
            .map(str::to_string)
            .unwrap_or_else(|| index.to_string())
    }

    pub fn effective_title(&self, index: usize) -> String {
        non_empty(&self.title)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Tab {}", index + 1))
    }

    pub fn effective_icon(&self) -> String {
        non_empty(&self.icon).unwrap_or(DEFAULT_VIEW_ICON).to_string()
    }

    /// Allowed user ids, or `None` when the view is public.
    pub fn allowed_users(&self) -> Option<Vec<String>> {
        match &self.visible {
            Some(ViewVisibility::Rules(rules)) => Some(
                rules
                    .iter()
                    .filter_map(VisibilityRule::user)
                    .map(str::to_string)
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Edit the restriction rules in place. A view without a rule list gets
    /// an empty one first; existing entries are kept as they are.
    pub fn edit_rules<R>(&mut self, edit: impl FnOnce(&mut Vec<VisibilityRule>) -> R) -> R {
        let mut rules = match self.visible.take() {
            Some(ViewVisibility::Rules(rules)) => rules,
            _ => Vec::new(),
        };
        let result = edit(&mut rules);
        self.visible = Some(ViewVisibility::Rules(rules));
        result
    }
}

impl LovelaceConfig {
    /// First view (in document order) whose effective path equals `path`.
    pub fn find_view_mut(&mut self, path: &str) -> Option<&mut LovelaceView> {
        self.views
            .as_mut()?
            .iter_mut()
            .enumerate()
            .find(|(index, view)| view.effective_path(*index) == path)
            .map(|(_, view)| view)
    }
}
