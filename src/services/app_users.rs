use crate::error::AppResult;
use crate::models::AppUser;
use crate::services::http::{ApiClient, RequestOptions};

/// Portal user records; roles come from here.
#[derive(Clone)]
pub struct AppUsersService {
    api: ApiClient,
}

impl AppUsersService {
    pub fn new(api: ApiClient) -> Self {
        AppUsersService { api }
    }

    pub async fn me(&self) -> AppResult<AppUser> {
        self.me_with(RequestOptions::default()).await
    }

    pub async fn me_with(&self, options: RequestOptions) -> AppResult<AppUser> {
        self.api
            .get(&self.api.url("/app-users/me"), &[], options)
            .await
    }
}
