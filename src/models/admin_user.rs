use serde::{Deserialize, Serialize};

use super::enums::lenient_id;
use super::page::PageRequest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: i64,
    pub firebase_uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Shape returned by the legacy `GET /admin/users/{uid}/roles` endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRoles {
    #[serde(default, deserialize_with = "lenient_id")]
    pub firebase_uid: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminUserQuery {
    pub paging: PageRequest,
    /// Free-text search.
    pub q: Option<String>,
    pub roles: Vec<String>,
}

impl AdminUserQuery {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut q = self.paging.to_query();
        if let Some(text) = self.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            q.push(("q".to_string(), text.to_string()));
        }
        for role in self.roles.iter().filter(|r| !r.is_empty()) {
            q.push(("role".to_string(), role.clone()));
        }
        q
    }
}
