use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::enums::{lenient_enum, lenient_id};

// ============================================================================
// Enumerations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Concert,
    Festival,
    Party,
    Other,
}

impl EventType {
    pub const ALL: [EventType; 4] = [
        EventType::Concert,
        EventType::Festival,
        EventType::Party,
        EventType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Concert => "CONCERT",
            EventType::Festival => "FESTIVAL",
            EventType::Party => "PARTY",
            EventType::Other => "OTHER",
        }
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CONCERT" => Ok(EventType::Concert),
            "FESTIVAL" => Ok(EventType::Festival),
            "PARTY" => Ok(EventType::Party),
            "OTHER" => Ok(EventType::Other),
            other => Err(format!("unknown event type: {}", other)),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event lifecycle. CANCELLED is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Draft,
    Published,
    Unpublished,
    Cancelled,
}

impl EventStatus {
    pub const ALL: [EventStatus; 4] = [
        EventStatus::Published,
        EventStatus::Draft,
        EventStatus::Unpublished,
        EventStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "DRAFT",
            EventStatus::Published => "PUBLISHED",
            EventStatus::Unpublished => "UNPUBLISHED",
            EventStatus::Cancelled => "CANCELLED",
        }
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DRAFT" => Ok(EventStatus::Draft),
            "PUBLISHED" => Ok(EventStatus::Published),
            "UNPUBLISHED" => Ok(EventStatus::Unpublished),
            "CANCELLED" => Ok(EventStatus::Cancelled),
            other => Err(format!("unknown event status: {}", other)),
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    StatusChange,
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "CREATE" => Ok(AuditAction::Create),
            "UPDATE" => Ok(AuditAction::Update),
            "DELETE" => Ok(AuditAction::Delete),
            "STATUS_CHANGE" => Ok(AuditAction::StatusChange),
            other => Err(format!("unknown audit action: {}", other)),
        }
    }
}

// ============================================================================
// Event
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event_id: i64,
    pub event_name: String,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_type: Option<EventType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_display_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<EventStatus>,
    /// Raw ISO-8601 timestamp as sent by the backend.
    pub start_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_description: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_by: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_modified_by: Option<String>,
}

impl Event {
    pub fn start_instant(&self) -> Option<DateTime<Utc>> {
        parse_instant(&self.start_at)
    }

    pub fn end_instant(&self) -> Option<DateTime<Utc>> {
        self.end_at.as_deref().and_then(parse_instant)
    }

    pub fn can_publish(&self) -> bool {
        matches!(
            self.status,
            Some(EventStatus::Draft) | Some(EventStatus::Unpublished)
        )
    }

    pub fn can_unpublish(&self) -> bool {
        self.status == Some(EventStatus::Published)
    }

    pub fn can_cancel(&self) -> bool {
        self.status != Some(EventStatus::Cancelled)
    }
}

/// Parse a backend timestamp. Offset-less values are read as UTC.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Body for `POST /events` and `PUT /events/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub event_name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    pub start_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_description: Option<String>,
}

pub type UpdateEventRequest = CreateEventRequest;

// ============================================================================
// Paging
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub number: i64,
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
}

/// Event listing, normalised from either the paging envelope or a bare array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EventPageWire")]
pub struct EventPage {
    pub items: Vec<Event>,
    pub page: PageInfo,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EventPageWire {
    Bare(Vec<Event>),
    Envelope {
        #[serde(default)]
        items: Vec<Event>,
        #[serde(default)]
        page: Option<PageInfo>,
    },
}

impl From<EventPageWire> for EventPage {
    fn from(wire: EventPageWire) -> Self {
        let (items, page) = match wire {
            EventPageWire::Bare(items) => (items, None),
            EventPageWire::Envelope { items, page } => (items, page),
        };
        let page = page.unwrap_or_else(|| {
            let len = items.len() as i64;
            PageInfo {
                number: 0,
                size: len,
                total_elements: len,
                total_pages: if len > 0 { 1 } else { 0 },
            }
        });
        EventPage { items, page }
    }
}

// ============================================================================
// Audit
// ============================================================================

/// Append-only audit entry; read-only on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAudit {
    #[serde(default)]
    pub id: Option<i64>,
    pub event_id: i64,
    #[serde(
        default,
        alias = "actor",
        alias = "actorUid",
        deserialize_with = "lenient_id"
    )]
    pub actor_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_enum")]
    pub action: Option<AuditAction>,
    #[serde(default, alias = "timestamp", alias = "createdAt")]
    pub at: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_enum_values_deserialize_to_none() {
        let e: Event = serde_json::from_value(json!({
            "eventId": 1,
            "eventName": "Gig",
            "type": "RAVE",
            "status": "published",
            "startAt": "2025-01-01T10:00:00Z",
            "createdBy": 7
        }))
        .unwrap();
        assert_eq!(e.event_type, None);
        assert_eq!(e.status, Some(EventStatus::Published));
        assert_eq!(e.created_by.as_deref(), Some("7"));
        assert!(e.can_unpublish());
        assert!(!e.can_publish());
    }

    #[test]
    fn cancelled_events_offer_no_transitions_out() {
        let e: Event = serde_json::from_value(json!({
            "eventId": 2,
            "eventName": "Gone",
            "status": "CANCELLED",
            "startAt": "2025-01-01T10:00:00Z"
        }))
        .unwrap();
        assert!(!e.can_cancel());
        assert!(!e.can_publish());
        assert!(!e.can_unpublish());
    }

    #[test]
    fn page_accepts_envelope_and_bare_array() {
        let envelope: EventPage = serde_json::from_value(json!({
            "items": [{"eventId": 1, "eventName": "A", "startAt": "2025-01-01T10:00:00Z"}],
            "page": {"number": 2, "size": 10, "totalElements": 21, "totalPages": 3}
        }))
        .unwrap();
        assert_eq!(envelope.items.len(), 1);
        assert_eq!(envelope.page.number, 2);
        assert_eq!(envelope.page.total_pages, 3);

        let bare: EventPage = serde_json::from_value(json!([
            {"eventId": 1, "eventName": "A", "startAt": "2025-01-01T10:00:00Z"},
            {"eventId": 2, "eventName": "B", "startAt": "2025-01-02T10:00:00Z"}
        ]))
        .unwrap();
        assert_eq!(bare.items.len(), 2);
        assert_eq!(bare.page.total_elements, 2);
        assert_eq!(bare.page.total_pages, 1);
    }

    #[test]
    fn create_request_omits_absent_fields() {
        let req = CreateEventRequest {
            event_name: "Gig".into(),
            event_type: Some(EventType::Party),
            start_at: "2025-01-01T10:00:00Z".into(),
            end_at: Some("2025-01-01T12:00:00Z".into()),
            event_location: None,
            event_description: None,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["type"], "PARTY");
        assert_eq!(v["eventName"], "Gig");
        assert!(v.get("eventLocation").is_none());
    }

    #[test]
    fn parse_instant_accepts_offsets_and_naive_values() {
        let a = parse_instant("2025-01-01T12:00:00+02:00").unwrap();
        assert_eq!(a.to_rfc3339(), "2025-01-01T10:00:00+00:00");
        assert!(parse_instant("2025-01-01T10:00").is_some());
        assert!(parse_instant("not a date").is_none());
        assert!(parse_instant("").is_none());
    }

    #[test]
    fn audit_accepts_alternate_field_names() {
        let a: EventAudit = serde_json::from_value(json!({
            "eventId": 3,
            "actor": "uid-1",
            "action": "STATUS_CHANGE",
            "timestamp": "2025-01-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(a.actor_id.as_deref(), Some("uid-1"));
        assert_eq!(a.action, Some(AuditAction::StatusChange));
        assert!(a.at.is_some());
    }
}
