use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::warn;

use crate::models::{EnumOption, EventStatusOption};
use crate::services::http::{ApiClient, RequestOptions};

/// Lookup lists for the event type and status pickers.
///
/// Successful responses are kept for the life of the service. A failed fetch
/// yields an empty list and is retried on the next call.
#[derive(Clone)]
pub struct EnumsService {
    api: ApiClient,
    event_types: Arc<RwLock<Option<Vec<EnumOption>>>>,
    event_statuses: Arc<RwLock<Option<Vec<EventStatusOption>>>>,
}

impl EnumsService {
    pub fn new(api: ApiClient) -> Self {
        EnumsService {
            api,
            event_types: Arc::new(RwLock::new(None)),
            event_statuses: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn event_types(&self) -> Vec<EnumOption> {
        self.memoized(&self.event_types, "/enums/event-types").await
    }

    pub async fn event_statuses(&self) -> Vec<EventStatusOption> {
        self.memoized(&self.event_statuses, "/enums/event-statuses").await
    }

    async fn memoized(&self, slot: &RwLock<Option<Vec<EnumOption>>>, path: &str) -> Vec<EnumOption> {
        if let Some(cached) = slot.read().await.as_ref() {
            return cached.clone();
        }

        let mut guard = slot.write().await;
        if let Some(cached) = guard.as_ref() {
            return cached.clone();
        }

        match self
            .api
            .get::<Vec<EnumOption>>(&self.api.url(path), &[], RequestOptions::silent())
            .await
        {
            Ok(options) => {
                *guard = Some(options.clone());
                options
            }
            Err(e) => {
                warn!("Failed to load {}: {}", path, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::signed_in_client;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn successful_lookup_is_fetched_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/enums/event-types"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"value": "CONCERT", "label": "Concert"},
                {"value": "PARTY", "label": "Party"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let (api, _) = signed_in_client(&server.uri());
        let enums = EnumsService::new(api);
        assert_eq!(enums.event_types().await.len(), 2);
        assert_eq!(enums.event_types().await[1].label, "Party");
    }

    #[tokio::test]
    async fn failures_degrade_to_empty_and_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/enums/event-statuses"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let (api, memory) = signed_in_client(&server.uri());
        let enums = EnumsService::new(api);
        assert!(enums.event_statuses().await.is_empty());
        assert!(enums.event_statuses().await.is_empty());
        assert!(memory.messages().await.is_empty());
    }
}
