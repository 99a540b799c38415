use tracing::info;

use crate::error::AppResult;
use crate::models::{ProfilePatch, ProfileRequest, ProfileResponse};
use crate::services::http::{ApiClient, RequestOptions};

/// Client for `/profile`: the caller's own profile plus the admin
/// `/profile/{userId}` variants.
#[derive(Clone)]
pub struct ProfileService {
    api: ApiClient,
}

impl ProfileService {
    pub fn new(api: ApiClient) -> Self {
        ProfileService { api }
    }

    fn base(&self) -> String {
        self.api.url("/profile")
    }

    pub async fn me(&self) -> AppResult<ProfileResponse> {
        self.me_with(RequestOptions::default()).await
    }

    pub async fn me_with(&self, options: RequestOptions) -> AppResult<ProfileResponse> {
        self.api
            .get(&format!("{}/me", self.base()), &[], options)
            .await
    }

    /// Create the caller's profile; 409 when one already exists.
    pub async fn create(&self, request: &ProfileRequest, options: RequestOptions) -> AppResult<ProfileResponse> {
        let profile: ProfileResponse = self
            .api
            .post(&format!("{}/create", self.base()), request, options)
            .await?;
        info!("Created profile {}", profile.id);
        Ok(profile)
    }

    /// Full replace.
    pub async fn update(&self, request: &ProfileRequest) -> AppResult<ProfileResponse> {
        self.api
            .put(&self.base(), request, RequestOptions::default())
            .await
    }

    pub async fn patch(&self, patch: &ProfilePatch) -> AppResult<ProfileResponse> {
        self.api
            .patch(&self.base(), patch, RequestOptions::default())
            .await
    }

    pub async fn delete(&self) -> AppResult<()> {
        self.api.delete(&self.base(), RequestOptions::default()).await
    }

    pub async fn get_for_user(&self, user_id: i64) -> AppResult<ProfileResponse> {
        self.api
            .get(&format!("{}/{}", self.base(), user_id), &[], RequestOptions::default())
            .await
    }

    pub async fn create_for_user(&self, user_id: i64, request: &ProfileRequest) -> AppResult<ProfileResponse> {
        self.api
            .post(
                &format!("{}/{}/create", self.base(), user_id),
                request,
                RequestOptions::default(),
            )
            .await
    }

    pub async fn update_for_user(&self, user_id: i64, request: &ProfileRequest) -> AppResult<ProfileResponse> {
        self.api
            .put(
                &format!("{}/{}", self.base(), user_id),
                request,
                RequestOptions::default(),
            )
            .await
    }

    pub async fn patch_for_user(&self, user_id: i64, patch: &ProfilePatch) -> AppResult<ProfileResponse> {
        self.api
            .patch(
                &format!("{}/{}", self.base(), user_id),
                patch,
                RequestOptions::default(),
            )
            .await
    }

    pub async fn delete_for_user(&self, user_id: i64) -> AppResult<()> {
        self.api
            .delete(&format!("{}/{}", self.base(), user_id), RequestOptions::default())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProfileType;
    use crate::services::test_support::signed_in_client;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn profile_json(id: i64) -> serde_json::Value {
        json!({"id": id, "userId": 12, "displayName": "The Venue", "completed": true, "verified": false})
    }

    #[tokio::test]
    async fn create_posts_to_create_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/profile/create"))
            .and(body_json(json!({
                "displayName": "The Venue",
                "profileType": "VENUE",
                "location": "Berlin",
                "socials": [],
                "websites": ["https://venue.example"]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(profile_json(3)))
            .expect(1)
            .mount(&server)
            .await;

        let (api, _) = signed_in_client(&server.uri());
        let created = ProfileService::new(api)
            .create(
                &ProfileRequest {
                    display_name: "The Venue".into(),
                    profile_type: Some(ProfileType::Venue),
                    location: Some("Berlin".into()),
                    description: None,
                    socials: vec![],
                    websites: vec!["https://venue.example".into()],
                },
                RequestOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(created.id, 3);
        assert_eq!(created.user_id.as_deref(), Some("12"));
        assert!(created.completed);
    }

    #[tokio::test]
    async fn admin_variants_address_user_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/profile/12/create"))
            .respond_with(ResponseTemplate::new(201).set_body_json(profile_json(4)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/v1/profile/12"))
            .and(body_json(json!({"description": "Updated"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_json(4)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/profile/12"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let (api, _) = signed_in_client(&server.uri());
        let profiles = ProfileService::new(api);
        profiles
            .create_for_user(12, &ProfileRequest {
                display_name: "The Venue".into(),
                profile_type: Some(ProfileType::Other),
                ..Default::default()
            })
            .await
            .unwrap();
        profiles
            .patch_for_user(12, &ProfilePatch {
                description: Some("Updated".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        profiles.delete_for_user(12).await.unwrap();
    }
}
