use tracing::{debug, info};

use crate::models::Role;
use crate::navigation::AppRoute;
use crate::services::app_users::AppUsersService;
use crate::services::profiles::ProfileService;
use crate::services::session::SessionContext;

/// Outcome of a pre-navigation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(AppRoute),
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }
}

/// Route guards. Role checks fail closed and are re-queried on every call.
#[derive(Clone)]
pub struct Guards {
    session: SessionContext,
    users: AppUsersService,
    profiles: ProfileService,
}

impl Guards {
    pub fn new(session: SessionContext, users: AppUsersService, profiles: ProfileService) -> Self {
        Guards {
            session,
            users,
            profiles,
        }
    }

    pub fn require_auth(&self, url: &str) -> GuardDecision {
        if self.session.is_signed_in() {
            debug!("Auth guard allowed {}", url);
            GuardDecision::Allow
        } else {
            info!("Auth guard: no session for {}", url);
            GuardDecision::Redirect(AppRoute::login_from(url))
        }
    }

    pub async fn require_role(&self, role: Role, url: &str) -> GuardDecision {
        let Some(user) = self.session.current() else {
            info!("Role guard ({}): no session for {}", role, url);
            return GuardDecision::Redirect(AppRoute::unauthorized_from(url));
        };

        match self.users.me().await {
            Ok(me) if me.has_role(role) => {
                debug!("Role guard ({}) allowed {} for {}", role, url, user.uid);
                GuardDecision::Allow
            }
            Ok(_) => {
                info!("Role guard ({}): {} lacks role for {}", role, user.uid, url);
                GuardDecision::Redirect(AppRoute::Forbidden)
            }
            Err(e) => {
                info!("Role guard ({}): lookup failed for {}: {}", role, user.uid, e);
                GuardDecision::Redirect(AppRoute::Forbidden)
            }
        }
    }

    pub async fn require_admin(&self, url: &str) -> GuardDecision {
        self.require_role(Role::Admin, url).await
    }

    pub async fn require_editor(&self, url: &str) -> GuardDecision {
        self.require_role(Role::Editor, url).await
    }

    /// Event creation needs a completed profile.
    pub async fn require_completed_profile(&self, url: &str) -> GuardDecision {
        if !self.session.is_signed_in() {
            info!("Profile guard: no session for {}", url);
            return GuardDecision::Redirect(AppRoute::login_from(url));
        }

        match self.profiles.me().await {
            Ok(profile) if profile.completed => {
                debug!("Profile guard allowed {}", url);
                GuardDecision::Allow
            }
            Ok(_) => {
                info!("Profile guard: profile incomplete, redirecting from {}", url);
                GuardDecision::Redirect(AppRoute::Profile)
            }
            Err(e) => {
                info!("Profile guard: lookup failed ({}), redirecting from {}", e, url);
                GuardDecision::Redirect(AppRoute::Profile)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::session::SessionContext;
    use crate::services::test_support::{api_client, signed_in_session};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn guards(base: &str, session: SessionContext) -> Guards {
        let (api, _) = api_client(base, session.clone());
        Guards::new(
            session,
            AppUsersService::new(api.clone()),
            ProfileService::new(api),
        )
    }

    async fn mount_me(server: &MockServer, roles: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/api/v1/app-users/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1, "firebaseUid": "u1", "roles": roles
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn no_session_redirects_without_role_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/app-users/me"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let g = guards(&server.uri(), SessionContext::new());
        let decision = g.require_admin("/admin").await;
        assert_eq!(
            decision,
            GuardDecision::Redirect(AppRoute::unauthorized_from("/admin"))
        );
        if let GuardDecision::Redirect(route) = decision {
            assert_eq!(route.path(), "/error/401?from=%2Fadmin");
        }
        assert_eq!(
            g.require_auth("/profile"),
            GuardDecision::Redirect(AppRoute::login_from("/profile"))
        );
    }

    #[tokio::test]
    async fn matching_role_is_allowed() {
        let server = MockServer::start().await;
        mount_me(&server, json!(["EDITOR", "VIEWER"])).await;

        let g = guards(&server.uri(), signed_in_session());
        assert!(g.require_editor("/editor").await.is_allowed());
        assert!(g.require_auth("/editor").is_allowed());
    }

    #[tokio::test]
    async fn missing_role_is_forbidden() {
        let server = MockServer::start().await;
        mount_me(&server, json!(["VIEWER"])).await;

        let g = guards(&server.uri(), signed_in_session());
        assert_eq!(
            g.require_admin("/admin").await,
            GuardDecision::Redirect(AppRoute::Forbidden)
        );
    }

    #[tokio::test]
    async fn lookup_failure_fails_closed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/app-users/me"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let g = guards(&server.uri(), signed_in_session());
        assert_eq!(
            g.require_admin("/admin").await,
            GuardDecision::Redirect(AppRoute::Forbidden)
        );

        let offline = guards("http://127.0.0.1:1", signed_in_session());
        assert_eq!(
            offline.require_editor("/editor").await,
            GuardDecision::Redirect(AppRoute::Forbidden)
        );
    }

    #[tokio::test]
    async fn each_guard_call_requeries_roles() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/app-users/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1, "firebaseUid": "u1", "roles": ["ADMIN", "EDITOR"]
            })))
            .expect(2)
            .mount(&server)
            .await;

        let g = guards(&server.uri(), signed_in_session());
        assert!(g.require_admin("/admin").await.is_allowed());
        assert!(g.require_editor("/editor").await.is_allowed());
    }

    #[tokio::test]
    async fn incomplete_profile_redirects_to_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/profile/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1, "displayName": "Ann", "completed": false
            })))
            .mount(&server)
            .await;

        let g = guards(&server.uri(), signed_in_session());
        assert_eq!(
            g.require_completed_profile("/editor/create").await,
            GuardDecision::Redirect(AppRoute::Profile)
        );

        let signed_out = guards(&server.uri(), SessionContext::new());
        assert_eq!(
            signed_out.require_completed_profile("/editor/create").await,
            GuardDecision::Redirect(AppRoute::login_from("/editor/create"))
        );
    }

    #[tokio::test]
    async fn completed_profile_is_allowed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/profile/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1, "displayName": "Ann", "completed": true
            })))
            .mount(&server)
            .await;

        let g = guards(&server.uri(), signed_in_session());
        assert!(g.require_completed_profile("/editor/create").await.is_allowed());
    }
}
