// User domain model
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    Owner,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
}

/// Account record as kept in the host's auth storage.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_owner: bool,
    #[serde(default)]
    pub system_generated: bool,
}

impl User {
    /// Only active, human accounts can be granted view access.
    pub fn from_account(record: &AccountRecord) -> Option<Self> {
        if !record.is_active || record.system_generated {
            return None;
        }

        Some(Self {
            id: record.id.clone(),
            name: record.name.clone().unwrap_or_default(),
            role: if record.is_owner { Role::Owner } else { Role::User },
        })
    }
}
