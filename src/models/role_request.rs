use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::page::PageRequest;

/// Role request statuses, using the backend's display names on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleRequestStatus {
    Pending,
    Approved,
    Rejected,
    Canceled,
}

impl RoleRequestStatus {
    pub const ALL: [RoleRequestStatus; 4] = [
        RoleRequestStatus::Pending,
        RoleRequestStatus::Approved,
        RoleRequestStatus::Rejected,
        RoleRequestStatus::Canceled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleRequestStatus::Pending => "Pending",
            RoleRequestStatus::Approved => "Approved",
            RoleRequestStatus::Rejected => "Rejected",
            RoleRequestStatus::Canceled => "Canceled",
        }
    }

    /// Enum name expected by query filters, e.g. `PENDING`.
    pub fn query_value(&self) -> String {
        self.as_str().to_uppercase()
    }
}

impl FromStr for RoleRequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(RoleRequestStatus::Pending),
            "approved" => Ok(RoleRequestStatus::Approved),
            "rejected" => Ok(RoleRequestStatus::Rejected),
            "canceled" | "cancelled" => Ok(RoleRequestStatus::Canceled),
            other => Err(format!("unknown role request status: {}", other)),
        }
    }
}

impl fmt::Display for RoleRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRequest {
    pub id: String,
    pub requester_uid: String,
    #[serde(default)]
    pub requested_roles: Vec<String>,
    pub status: RoleRequestStatus,
    #[serde(default)]
    pub approver_uid: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub approver_note: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl RoleRequest {
    /// Only pending requests may be withdrawn by their requester.
    pub fn can_cancel(&self) -> bool {
        self.status == RoleRequestStatus::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRequestCreate {
    pub requested_roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRequestDecision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approver_note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleRequestQuery {
    pub paging: PageRequest,
    pub statuses: Vec<RoleRequestStatus>,
    /// Free-text search; honoured by the admin listing only.
    pub q: Option<String>,
}

impl RoleRequestQuery {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut q = self.paging.to_query();
        for status in &self.statuses {
            q.push(("status".to_string(), status.query_value()));
        }
        if let Some(text) = self.q.as_deref().filter(|s| !s.is_empty()) {
            q.push(("q".to_string(), text.to_string()));
        }
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_use_display_names_on_the_wire() {
        let r: RoleRequest = serde_json::from_str(
            r#"{"id":"r1","requesterUid":"u1","requestedRoles":["EDITOR"],"status":"Pending"}"#,
        )
        .unwrap();
        assert!(r.can_cancel());
        assert_eq!(serde_json::to_value(r.status).unwrap(), "Pending");
    }

    #[test]
    fn query_uppercases_status_filters() {
        let q = RoleRequestQuery {
            paging: PageRequest {
                page: Some(0),
                size: Some(20),
                sort: Some("createdAt,desc".into()),
            },
            statuses: vec![RoleRequestStatus::Pending, RoleRequestStatus::Canceled],
            q: None,
        };
        let pairs = q.to_query();
        assert!(pairs.contains(&("status".to_string(), "PENDING".to_string())));
        assert!(pairs.contains(&("status".to_string(), "CANCELED".to_string())));
        assert!(pairs.contains(&("sort".to_string(), "createdAt,desc".to_string())));
    }
}
