use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::enums::lenient_id;

/// Authorization roles known to the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Editor,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Editor => "EDITOR",
            Role::Viewer => "VIEWER",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "EDITOR" => Ok(Role::Editor),
            "VIEWER" => Ok(Role::Viewer),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend identity record (`GET /app-users/me`). Its role set is authoritative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppUser {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub firebase_uid: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl AppUser {
    /// Known roles; unrecognised role strings are skipped.
    pub fn role_set(&self) -> Vec<Role> {
        self.roles
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .filter_map(|r| r.parse().ok())
            .collect()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role_set().contains(&role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_are_matched_exactly() {
        let user: AppUser = serde_json::from_str(
            r#"{"id": 1, "roles": ["EDITOR", "SUPERHERO"], "email": null}"#,
        )
        .unwrap();
        assert!(user.has_role(Role::Editor));
        assert!(!user.has_role(Role::Viewer));
        assert_eq!(user.role_set(), vec![Role::Editor]);
    }

    #[test]
    fn role_spelling_variants_do_not_grant_access() {
        let user: AppUser = serde_json::from_str(
            r#"{"roles": ["admin", "ROLE_ADMIN", " ADMIN", "Editor"]}"#,
        )
        .unwrap();
        assert!(!user.has_role(Role::Admin));
        assert!(!user.has_role(Role::Editor));
        assert!(user.role_set().is_empty());
    }

    #[test]
    fn null_roles_mean_no_roles() {
        let user: AppUser = serde_json::from_str(r#"{"roles": null}"#).unwrap();
        assert!(user.role_set().is_empty());
    }
}
