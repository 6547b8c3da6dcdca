//! Account records returned by the user and admin endpoints.

use serde::{Deserialize, Serialize};

/// Server-assigned account identifier.
pub type UserId = i64;

/// The authenticated account, as reported by the current-user endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CurrentUser {
    #[serde(default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Admin capability. Absent means not an admin.
    #[serde(default)]
    pub is_superuser: bool,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.is_superuser
    }
}

/// A registered account awaiting administrator approval.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PendingUser {
    pub id: UserId,
    pub email: String,
}
