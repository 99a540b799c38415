use std::sync::Arc;

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::notifications::NotificationService;
use crate::services::session::{IdentityProvider, SessionContext};

/// Per-call transport options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// The caller renders its own inline error; skip the global toast.
    pub suppress_global_error: bool,
    /// Never attach a bearer token.
    pub anonymous: bool,
}

impl RequestOptions {
    pub fn silent() -> Self {
        RequestOptions {
            suppress_global_error: true,
            anonymous: false,
        }
    }

    pub fn anonymous() -> Self {
        RequestOptions {
            suppress_global_error: false,
            anonymous: true,
        }
    }
}

/// Shared REST transport: URL roots, bearer attachment and error mapping.
///
/// Requests are issued once; there is no retry or backoff. Failures are
/// mapped to [`AppError`] and, unless suppressed, reported on the global
/// notification channel before being returned to the caller.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    api_base: Url,
    api_url: String,
    unversioned_url: String,
    use_new_admin_users_api: bool,
    session: SessionContext,
    identity: Arc<dyn IdentityProvider>,
    notifications: NotificationService,
}

impl ApiClient {
    pub fn new(
        config: &Config,
        session: SessionContext,
        identity: Arc<dyn IdentityProvider>,
        notifications: NotificationService,
    ) -> AppResult<Self> {
        let api_base = Url::parse(&config.api.base_url)
            .map_err(|e| AppError::Config(format!("Invalid API base URL: {}", e)))?;
        let client = Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(ApiClient {
            client,
            api_base,
            api_url: config.api_url(),
            unversioned_url: config.unversioned_api_url(),
            use_new_admin_users_api: config.api.use_new_admin_users_api,
            session,
            identity,
            notifications,
        })
    }

    /// Versioned endpoint URL, e.g. `url("/events")`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Endpoint URL without the version segment.
    pub fn unversioned_url(&self, path: &str) -> String {
        format!("{}{}", self.unversioned_url, path)
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn notifications(&self) -> &NotificationService {
        &self.notifications
    }

    pub fn use_new_admin_users_api(&self) -> bool {
        self.use_new_admin_users_api
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(String, String)],
        options: RequestOptions,
    ) -> AppResult<T> {
        self.execute(Method::GET, url, query, None, options).await
    }

    pub async fn post<B, T>(&self, url: &str, body: &B, options: RequestOptions) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = to_body(body)?;
        self.execute(Method::POST, url, &[], Some(body), options).await
    }

    /// POST without a request body (status transitions, cancellations).
    pub async fn post_empty<T: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> AppResult<T> {
        self.execute(Method::POST, url, &[], None, options).await
    }

    pub async fn put<B, T>(&self, url: &str, body: &B, options: RequestOptions) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = to_body(body)?;
        self.execute(Method::PUT, url, &[], Some(body), options).await
    }

    pub async fn patch<B, T>(&self, url: &str, body: &B, options: RequestOptions) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = to_body(body)?;
        self.execute(Method::PATCH, url, &[], Some(body), options).await
    }

    pub async fn delete(&self, url: &str, options: RequestOptions) -> AppResult<()> {
        self.execute::<Value>(Method::DELETE, url, &[], None, options)
            .await
            .map(|_| ())
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        query: &[(String, String)],
        body: Option<Value>,
        options: RequestOptions,
    ) -> AppResult<T> {
        let result = match self.dispatch(method, url, query, body, options).await {
            Ok(text) => decode(&text),
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            self.notifications.report(e, options).await;
        }
        result
    }

    async fn dispatch(
        &self,
        method: Method,
        url: &str,
        query: &[(String, String)],
        body: Option<Value>,
        options: RequestOptions,
    ) -> AppResult<String> {
        let mut request = self.client.request(method.clone(), url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        if let Some(token) = self.bearer_for(url, options).await {
            request = request.bearer_auth(token);
        }

        debug!("{} {}", method, url);
        let response = request.send().await.map_err(|e| {
            warn!("{} {} failed: {}", method, url, e);
            AppError::from(e)
        })?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            warn!("{} {} returned {}", method, url, status);
            return Err(AppError::api(status.as_u16(), &text));
        }
        Ok(text)
    }

    /// Token for requests to our own API while a session exists.
    async fn bearer_for(&self, url: &str, options: RequestOptions) -> Option<String> {
        if options.anonymous || !within_api_base(&self.api_base, url) {
            return None;
        }
        let user = self.session.current()?;
        match self.identity.id_token(&user, false).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                debug!("Sending request without token: {}", e);
                None
            }
        }
    }
}

/// Same scheme, host and effective port as `base`, and a path under the
/// base path on a segment boundary.
fn within_api_base(base: &Url, target: &str) -> bool {
    let target = match Url::parse(target) {
        Ok(url) => url,
        Err(_) => return false,
    };
    if target.scheme() != base.scheme()
        || target.host_str() != base.host_str()
        || target.port_or_known_default() != base.port_or_known_default()
    {
        return false;
    }
    let prefix = base.path().trim_end_matches('/');
    let path = target.path();
    prefix.is_empty()
        || path == prefix
        || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}

fn to_body<B: Serialize + ?Sized>(body: &B) -> AppResult<Value> {
    serde_json::to_value(body).map_err(|e| AppError::Unknown(format!("Failed to encode body: {}", e)))
}

/// Empty bodies decode as JSON `null` so `()` and `Option<T>` responses work.
fn decode<T: DeserializeOwned>(text: &str) -> AppResult<T> {
    let source = if text.trim().is_empty() { "null" } else { text };
    serde_json::from_str(source).map_err(|e| AppError::Decode(e.to_string()))
}
