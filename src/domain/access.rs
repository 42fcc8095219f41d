// Access update requests and the view visibility mutation
use super::lovelace::{LovelaceConfig, LovelaceView, VisibilityRule};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub dash_id: String,
    pub url_path: String,
    pub view_path: String,
    #[serde(flatten)]
    pub change: AccessChange,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccessChange {
    SetPublic {
        #[serde(rename = "isPublic")]
        is_public: bool,
    },
    SetUser {
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(rename = "isAllowed")]
        is_allowed: bool,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("Dashboard file not found")]
    DashboardNotFound,
    #[error("No views found in dashboard")]
    NoViews,
    #[error("View not found")]
    ViewNotFound,
    #[error("Home Assistant refused to save config")]
    SaveRejected,
    #[error("{0}")]
    Malformed(String),
}

impl AccessChange {
    pub fn apply(&self, view: &mut LovelaceView) {
        match self {
            AccessChange::SetPublic { is_public: true } => view.visible = None,
            AccessChange::SetPublic { is_public: false } => view.edit_rules(|_| ()),
            AccessChange::SetUser {
                user_id,
                is_allowed: true,
            } => view.edit_rules(|rules| {
                if !rules.iter().any(|r| r.user() == Some(user_id.as_str())) {
                    rules.push(VisibilityRule::for_user(user_id));
                }
            }),
            AccessChange::SetUser {
                user_id,
                is_allowed: false,
            } => view.edit_rules(|rules| rules.retain(|r| r.user() != Some(user_id.as_str()))),
        }
    }
}

impl UpdateRequest {
    /// Locate the target view and mutate it in place.
    pub fn apply(&self, config: &mut LovelaceConfig) -> Result<(), AccessError> {
        if config.views.is_none() {
            return Err(AccessError::NoViews);
        }
        let view = config
            .find_view_mut(&self.view_path)
            .ok_or(AccessError::ViewNotFound)?;
        self.change.apply(view);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> LovelaceConfig {
        serde_json::from_value(json!({"views": [{"title": "Overview"}]})).unwrap()
    }

    fn request(change: AccessChange) -> UpdateRequest {
        UpdateRequest {
            dash_id: "main".to_string(),
            url_path: "dashboard-main".to_string(),
            view_path: "0".to_string(),
            change,
        }
    }

    fn allow(user: &str, allowed: bool) -> UpdateRequest {
        request(AccessChange::SetUser {
            user_id: user.to_string(),
            is_allowed: allowed,
        })
    }

    fn visible(config: &LovelaceConfig) -> serde_json::Value {
        serde_json::to_value(config).unwrap()["views"][0]["visible"].clone()
    }

    #[test]
    fn test_parse_wire_requests() {
        let public: UpdateRequest = serde_json::from_value(json!({
            "type": "set_public", "dashId": "main", "urlPath": "lovelace",
            "viewPath": "0", "isPublic": false
        }))
        .unwrap();
        assert_eq!(public.change, AccessChange::SetPublic { is_public: false });

        let user: UpdateRequest = serde_json::from_value(json!({
            "type": "set_user", "dashId": "main", "urlPath": "lovelace",
            "viewPath": "0", "userId": "u1", "isAllowed": true
        }))
        .unwrap();
        assert_eq!(user.dash_id, "main");
        assert_eq!(
            user.change,
            AccessChange::SetUser {
                user_id: "u1".to_string(),
                is_allowed: true
            }
        );
    }

    #[test]
    fn test_rejects_unknown_type() {
        let result = serde_json::from_value::<UpdateRequest>(json!({
            "type": "set_owner", "dashId": "main", "urlPath": "x", "viewPath": "0"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_restrict_then_allow_user() {
        let mut config = config();
        request(AccessChange::SetPublic { is_public: false })
            .apply(&mut config)
            .unwrap();
        assert_eq!(visible(&config), json!([]));

        allow("u1", true).apply(&mut config).unwrap();
        assert_eq!(visible(&config), json!([{"user": "u1"}]));
    }

    #[test]
    fn test_allow_is_idempotent() {
        let mut config = config();
        allow("u1", true).apply(&mut config).unwrap();
        allow("u1", true).apply(&mut config).unwrap();
        assert_eq!(visible(&config), json!([{"user": "u1"}]));
    }

    #[test]
    fn test_revoking_absent_user_is_noop() {
        let mut config = config();
        allow("u1", true).apply(&mut config).unwrap();
        let before = config.clone();
        allow("u2", false).apply(&mut config).unwrap();
        assert_eq!(config, before);
    }

    #[test]
    fn test_revoke_removes_user() {
        let mut config = config();
        allow("u1", true).apply(&mut config).unwrap();
        allow("u2", true).apply(&mut config).unwrap();
        allow("u1", false).apply(&mut config).unwrap();
        assert_eq!(visible(&config), json!([{"user": "u2"}]));
    }

    #[test]
    fn test_public_then_restricted_starts_empty() {
        let mut config = config();
        allow("u1", true).apply(&mut config).unwrap();
        request(AccessChange::SetPublic { is_public: true })
            .apply(&mut config)
            .unwrap();
        assert_eq!(visible(&config), serde_json::Value::Null);

        request(AccessChange::SetPublic { is_public: false })
            .apply(&mut config)
            .unwrap();
        assert_eq!(visible(&config), json!([]));
    }

    #[test]
    fn test_restricting_keeps_existing_rules() {
        let mut config = config();
        allow("u1", true).apply(&mut config).unwrap();
        request(AccessChange::SetPublic { is_public: false })
            .apply(&mut config)
            .unwrap();
        assert_eq!(visible(&config), json!([{"user": "u1"}]));
    }

    #[test]
    fn test_boolean_visibility_replaced_by_rules() {
        let mut config: LovelaceConfig =
            serde_json::from_value(json!({"views": [{"visible": true}]})).unwrap();
        allow("u1", true).apply(&mut config).unwrap();
        assert_eq!(visible(&config), json!([{"user": "u1"}]));
    }

    #[test]
    fn test_unrecognised_entries_survive_changes() {
        let mut config: LovelaceConfig = serde_json::from_value(json!({
            "views": [{"visible": [{"user": "u1"}, null, "legacy", {"user": 5}]}]
        }))
        .unwrap();

        allow("u2", true).apply(&mut config).unwrap();
        assert_eq!(
            visible(&config),
            json!([{"user": "u1"}, null, "legacy", {"user": 5}, {"user": "u2"}])
        );

        allow("u1", false).apply(&mut config).unwrap();
        request(AccessChange::SetPublic { is_public: false })
            .apply(&mut config)
            .unwrap();
        assert_eq!(
            visible(&config),
            json!([null, "legacy", {"user": 5}, {"user": "u2"}])
        );
    }

    #[test]
    fn test_missing_view_and_views() {
        let mut config = config();
        let mut missing = allow("u1", true);
        missing.view_path = "9".to_string();
        assert!(matches!(
            missing.apply(&mut config),
            Err(AccessError::ViewNotFound)
        ));

        let mut no_views = LovelaceConfig::default();
        assert!(matches!(
            allow("u1", true).apply(&mut no_views),
            Err(AccessError::NoViews)
        ));
    }
}
