use chrono::{DateTime, SecondsFormat, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::error::AppResult;
use crate::models::{CreateEventRequest, Event, EventAudit, EventPage, EventStatus, EventType, UpdateEventRequest};
use crate::services::http::{ApiClient, RequestOptions};

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const DEFAULT_SORT: &str = "startAt,asc";
pub const SORT_FIELDS: [&str; 3] = ["startAt", "eventName", "eventType"];

pub const DEFAULT_AUDIT_LIMIT: i64 = 10;
const MAX_AUDIT_LIMIT: i64 = 100;
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Filters for the event listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    /// `field`, `-field` or `field,asc|desc`.
    pub sort: Option<String>,
    pub event_type: Option<EventType>,
    pub status: Option<EventStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl EventQuery {
    /// Normalised query parameters as sent to the backend.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut q = vec![
            ("page".to_string(), self.page.unwrap_or(0).max(0).to_string()),
            ("size".to_string(), clamp_size(self.size).to_string()),
            ("sort".to_string(), normalize_sort(self.sort.as_deref())),
        ];
        if let Some(t) = self.event_type {
            q.push(("eventType".to_string(), t.as_str().to_string()));
        }
        if let Some(s) = self.status {
            q.push(("status".to_string(), s.as_str().to_string()));
        }
        if let Some(from) = self.from {
            q.push(("from".to_string(), iso(from)));
        }
        if let Some(to) = self.to {
            q.push(("to".to_string(), iso(to)));
        }
        q
    }
}

pub fn clamp_size(size: Option<i64>) -> i64 {
    size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// Whitelist the sort expression; anything unrecognised becomes `startAt,asc`.
pub fn normalize_sort(raw: Option<&str>) -> String {
    let raw = match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s,
        None => return DEFAULT_SORT.to_string(),
    };

    let (field, dir) = if let Some(field) = raw.strip_prefix('-') {
        (field.trim(), "desc".to_string())
    } else if let Some((field, dir)) = raw.split_once(',') {
        (field.trim(), dir.trim().to_lowercase())
    } else {
        (raw, "asc".to_string())
    };

    if SORT_FIELDS.contains(&field) && (dir == "asc" || dir == "desc") {
        format!("{},{}", field, dir)
    } else {
        debug!("Unsupported sort '{}', using {}", raw, DEFAULT_SORT);
        DEFAULT_SORT.to_string()
    }
}

fn iso(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// A confirmed server-side change to some event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventsChanged {
    Created(i64),
    Updated(i64),
    Deleted(i64),
    StatusChanged(i64),
}

impl EventsChanged {
    pub fn event_id(&self) -> i64 {
        match self {
            EventsChanged::Created(id)
            | EventsChanged::Updated(id)
            | EventsChanged::Deleted(id)
            | EventsChanged::StatusChanged(id) => *id,
        }
    }
}

/// Client for the `/events` resource.
#[derive(Clone)]
pub struct EventsService {
    api: ApiClient,
    changes: broadcast::Sender<EventsChanged>,
}

impl EventsService {
    pub fn new(api: ApiClient) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        EventsService { api, changes }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventsChanged> {
        self.changes.subscribe()
    }

    pub fn notify_changed(&self, change: EventsChanged) {
        debug!("Events changed: {:?}", change);
        // No receivers is fine.
        let _ = self.changes.send(change);
    }

    pub async fn list(&self, query: &EventQuery) -> AppResult<EventPage> {
        self.list_with(query, RequestOptions::default()).await
    }

    pub async fn list_with(&self, query: &EventQuery, options: RequestOptions) -> AppResult<EventPage> {
        self.api
            .get(&self.api.url("/events"), &query.to_query(), options)
            .await
    }

    pub async fn list_mine(&self, query: &EventQuery) -> AppResult<EventPage> {
        self.list_mine_with(query, RequestOptions::default()).await
    }

    pub async fn list_mine_with(
        &self,
        query: &EventQuery,
        options: RequestOptions,
    ) -> AppResult<EventPage> {
        self.api
            .get(&self.api.url("/events/mine"), &query.to_query(), options)
            .await
    }

    /// Published upcoming events; sent without credentials.
    pub async fn list_public_upcoming(&self, from: DateTime<Utc>, limit: i64) -> AppResult<Vec<Event>> {
        let query = vec![
            ("from".to_string(), iso(from)),
            ("limit".to_string(), limit.clamp(1, MAX_PAGE_SIZE).to_string()),
        ];
        let page: EventPage = self
            .api
            .get(
                &self.api.url("/events/public-upcoming"),
                &query,
                RequestOptions::anonymous(),
            )
            .await?;
        Ok(page.items)
    }

    pub async fn get(&self, id: i64) -> AppResult<Event> {
        self.get_with(id, RequestOptions::default()).await
    }

    pub async fn get_with(&self, id: i64, options: RequestOptions) -> AppResult<Event> {
        self.api
            .get(&self.api.url(&format!("/events/{}", id)), &[], options)
            .await
    }

    pub async fn create(&self, request: &CreateEventRequest) -> AppResult<Event> {
        self.create_with(request, RequestOptions::default()).await
    }

    pub async fn create_with(
        &self,
        request: &CreateEventRequest,
        options: RequestOptions,
    ) -> AppResult<Event> {
        let event: Event = self.api.post(&self.api.url("/events"), request, options).await?;
        info!("Created event {}", event.event_id);
        self.notify_changed(EventsChanged::Created(event.event_id));
        Ok(event)
    }

    pub async fn update(&self, id: i64, request: &UpdateEventRequest) -> AppResult<Event> {
        self.update_with(id, request, RequestOptions::default()).await
    }

    pub async fn update_with(
        &self,
        id: i64,
        request: &UpdateEventRequest,
        options: RequestOptions,
    ) -> AppResult<Event> {
        let event: Event = self
            .api
            .put(&self.api.url(&format!("/events/{}", id)), request, options)
            .await?;
        info!("Updated event {}", id);
        self.notify_changed(EventsChanged::Updated(id));
        Ok(event)
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.api
            .delete(&self.api.url(&format!("/events/{}", id)), RequestOptions::default())
            .await?;
        info!("Deleted event {}", id);
        self.notify_changed(EventsChanged::Deleted(id));
        Ok(())
    }

    pub async fn publish(&self, id: i64) -> AppResult<Event> {
        self.transition(id, "publish").await
    }

    pub async fn unpublish(&self, id: i64) -> AppResult<Event> {
        self.transition(id, "unpublish").await
    }

    pub async fn cancel(&self, id: i64) -> AppResult<Event> {
        self.transition(id, "cancel").await
    }

    async fn transition(&self, id: i64, action: &str) -> AppResult<Event> {
        let event: Event = self
            .api
            .post_empty(
                &self.api.url(&format!("/events/{}/{}", id, action)),
                RequestOptions::default(),
            )
            .await?;
        info!(
            "Event {} {}: now {}",
            id,
            action,
            event.status.map(|s| s.as_str()).unwrap_or("unknown")
        );
        self.notify_changed(EventsChanged::StatusChanged(id));
        Ok(event)
    }

    /// Most recent audit entries; `limit` is clamped to 1..=100.
    pub async fn get_audits(&self, id: i64, limit: Option<i64>) -> AppResult<Vec<EventAudit>> {
        let limit = limit.unwrap_or(DEFAULT_AUDIT_LIMIT).clamp(1, MAX_AUDIT_LIMIT);
        self.api
            .get(
                &self.api.url(&format!("/events/{}/audits", id)),
                &[("limit".to_string(), limit.to_string())],
                RequestOptions::default(),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::signed_in_client;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn query_value(q: &[(String, String)], key: &str) -> Option<String> {
        q.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    #[test]
    fn page_size_is_clamped() {
        for (requested, effective) in [(Some(0), 1), (Some(-5), 1), (Some(101), 100), (Some(1000), 100), (Some(25), 25), (None, 50)] {
            let q = EventQuery {
                size: requested,
                ..Default::default()
            };
            assert_eq!(
                query_value(&q.to_query(), "size").as_deref(),
                Some(effective.to_string().as_str()),
                "requested {:?}",
                requested
            );
        }
    }

    #[test]
    fn sort_accepts_whitelisted_forms() {
        assert_eq!(normalize_sort(Some("eventName")), "eventName,asc");
        assert_eq!(normalize_sort(Some("-startAt")), "startAt,desc");
        assert_eq!(normalize_sort(Some("eventType,DESC")), "eventType,desc");
        assert_eq!(normalize_sort(None), "startAt,asc");
    }

    #[test]
    fn unknown_sort_falls_back() {
        for raw in ["createdAt", "-createdAt", "createdAt,desc", "eventName,sideways", "", "-"] {
            assert_eq!(normalize_sort(Some(raw)), DEFAULT_SORT, "sort {:?}", raw);
        }
    }

    #[test]
    fn negative_page_becomes_zero() {
        let q = EventQuery {
            page: Some(-3),
            event_type: Some(EventType::Festival),
            ..Default::default()
        };
        let pairs = q.to_query();
        assert_eq!(query_value(&pairs, "page").as_deref(), Some("0"));
        assert_eq!(query_value(&pairs, "eventType").as_deref(), Some("FESTIVAL"));
        assert_eq!(query_value(&pairs, "status"), None);
    }

    #[tokio::test]
    async fn list_sends_normalised_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/events"))
            .and(query_param("size", "100"))
            .and(query_param("sort", "startAt,asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"eventId": 1, "eventName": "A", "startAt": "2025-01-01T10:00:00Z"}],
                "page": {"number": 0, "size": 100, "totalElements": 1, "totalPages": 1}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (api, _) = signed_in_client(&server.uri());
        let events = EventsService::new(api);
        let page = events
            .list(&EventQuery {
                size: Some(500),
                sort: Some("bogus".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn mutations_emit_exactly_one_change() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/events/4/publish"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "eventId": 4, "eventName": "Gig", "status": "PUBLISHED", "startAt": "2025-01-01T10:00:00Z"
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/events/4"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/events/5/cancel"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        let (api, _) = signed_in_client(&server.uri());
        let events = EventsService::new(api);
        let mut rx = events.subscribe();

        let published = events.publish(4).await.unwrap();
        assert_eq!(published.status, Some(EventStatus::Published));
        tokio_test::assert_ok!(events.delete(4).await);
        tokio_test::assert_err!(events.cancel(5).await);

        assert_eq!(rx.try_recv().unwrap(), EventsChanged::StatusChanged(4));
        assert_eq!(rx.try_recv().unwrap(), EventsChanged::Deleted(4));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn get_missing_event_reports_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/events/77"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"status": 404})))
            .mount(&server)
            .await;

        let (api, _) = signed_in_client(&server.uri());
        let err = EventsService::new(api).get(77).await.unwrap_err();
        assert!(err.is_status(404));
    }

    #[tokio::test]
    async fn audit_limit_is_clamped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/events/3/audits"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"eventId": 3, "action": "CREATE", "actor": "u1", "at": "2025-01-01T10:00:00Z"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let (api, _) = signed_in_client(&server.uri());
        let audits = EventsService::new(api).get_audits(3, Some(250)).await.unwrap();
        assert_eq!(audits.len(), 1);
    }

    #[tokio::test]
    async fn public_upcoming_accepts_bare_array() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/events/public-upcoming"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"eventId": 1, "eventName": "A", "startAt": "2030-01-01T10:00:00Z", "status": "PUBLISHED"}
            ])))
            .mount(&server)
            .await;

        let (api, _) = signed_in_client(&server.uri());
        let upcoming = EventsService::new(api)
            .list_public_upcoming(Utc::now(), 5)
            .await
            .unwrap();
        assert_eq!(upcoming[0].event_name, "A");
    }
}
