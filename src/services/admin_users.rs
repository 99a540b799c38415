use tracing::debug;

use crate::error::AppResult;
use crate::models::{AdminUser, AdminUserQuery, Page, UserRoles};
use crate::services::http::{ApiClient, RequestOptions};

const DEFAULT_ADMIN_PAGE_SIZE: i64 = 20;

/// Admin view of portal users.
///
/// Deployments without the paged `/admin/users` API only expose
/// `/admin/users/{uid}/roles`; in that mode listing yields an empty page and
/// lookups build a minimal user from the roles response.
#[derive(Clone)]
pub struct AdminUserService {
    api: ApiClient,
}

impl AdminUserService {
    pub fn new(api: ApiClient) -> Self {
        AdminUserService { api }
    }

    fn base(&self) -> String {
        self.api.url("/admin/users")
    }

    pub async fn list(&self, query: &AdminUserQuery) -> AppResult<Page<AdminUser>> {
        if !self.api.use_new_admin_users_api() {
            debug!("Admin users listing unavailable on legacy API");
            return Ok(Page::empty(
                query.paging.page.unwrap_or(0),
                query.paging.size.unwrap_or(DEFAULT_ADMIN_PAGE_SIZE),
            ));
        }
        self.api
            .get(&self.base(), &query.to_query(), RequestOptions::default())
            .await
    }

    pub async fn get(&self, firebase_uid: &str) -> AppResult<AdminUser> {
        let uid = urlencoding::encode(firebase_uid);
        if self.api.use_new_admin_users_api() {
            return self
                .api
                .get(&format!("{}/{}", self.base(), uid), &[], RequestOptions::default())
                .await;
        }

        let roles: UserRoles = self
            .api
            .get(
                &format!("{}/{}/roles", self.base(), uid),
                &[],
                RequestOptions::default(),
            )
            .await?;
        Ok(AdminUser {
            id: -1,
            firebase_uid: roles.firebase_uid.unwrap_or_else(|| firebase_uid.to_string()),
            email: None,
            display_name: None,
            photo_url: None,
            created_at: None,
            updated_at: None,
            roles: roles.roles,
        })
    }
}
