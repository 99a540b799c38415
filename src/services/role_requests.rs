use tracing::info;

use crate::error::AppResult;
use crate::models::{Page, RoleRequest, RoleRequestCreate, RoleRequestDecision, RoleRequestQuery};
use crate::services::http::{ApiClient, RequestOptions};

/// Role elevation requests. These endpoints live outside the versioned API
/// root (`/api/roles/requests`, not `/api/v1/...`).
#[derive(Clone)]
pub struct RoleRequestService {
    api: ApiClient,
}

impl RoleRequestService {
    pub fn new(api: ApiClient) -> Self {
        RoleRequestService { api }
    }

    fn user_base(&self) -> String {
        self.api.unversioned_url("/roles/requests")
    }

    fn admin_base(&self) -> String {
        self.api.unversioned_url("/admin/users/roles/requests")
    }

    pub async fn create(&self, request: &RoleRequestCreate) -> AppResult<RoleRequest> {
        let created: RoleRequest = self
            .api
            .post(&self.user_base(), request, RequestOptions::default())
            .await?;
        info!("Submitted role request {}", created.id);
        Ok(created)
    }

    pub async fn list_mine(&self, query: &RoleRequestQuery) -> AppResult<Page<RoleRequest>> {
        // Free-text search is admin only.
        let user_query = RoleRequestQuery {
            q: None,
            ..query.clone()
        };
        self.api
            .get(&self.user_base(), &user_query.to_query(), RequestOptions::default())
            .await
    }

    pub async fn cancel(&self, id: &str) -> AppResult<RoleRequest> {
        self.api
            .post(
                &format!("{}/{}/cancel", self.user_base(), urlencoding::encode(id)),
                &serde_json::json!({}),
                RequestOptions::default(),
            )
            .await
    }

    pub async fn list(&self, query: &RoleRequestQuery) -> AppResult<Page<RoleRequest>> {
        self.api
            .get(&self.admin_base(), &query.to_query(), RequestOptions::default())
            .await
    }

    pub async fn get(&self, id: &str) -> AppResult<RoleRequest> {
        self.api
            .get(
                &format!("{}/{}", self.admin_base(), urlencoding::encode(id)),
                &[],
                RequestOptions::default(),
            )
            .await
    }

    pub async fn approve(&self, id: &str, decision: &RoleRequestDecision) -> AppResult<RoleRequest> {
        self.decide(id, "approve", decision).await
    }

    pub async fn reject(&self, id: &str, decision: &RoleRequestDecision) -> AppResult<RoleRequest> {
        self.decide(id, "reject", decision).await
    }

    async fn decide(&self, id: &str, action: &str, decision: &RoleRequestDecision) -> AppResult<RoleRequest> {
        let decided: RoleRequest = self
            .api
            .post(
                &format!("{}/{}/{}", self.admin_base(), urlencoding::encode(id), action),
                decision,
                RequestOptions::default(),
            )
            .await?;
        info!("Role request {} is now {}", decided.id, decided.status);
        Ok(decided)
    }
}
