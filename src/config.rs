use std::env;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub runtime: RuntimeConfigSource,
    pub http: HttpConfig,
    pub cache: CacheConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// e.g. "/api"
    pub path_prefix: String,
    /// e.g. "v1"; empty means no version segment.
    pub version: String,
    /// Use the paged `/admin/users` endpoints instead of the legacy per-user roles lookup.
    pub use_new_admin_users_api: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfigSource {
    /// Location of the optional runtime override document.
    pub url: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Freshness window for calendar query results.
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Identity-provider token used by the command-line client. Library users
    /// plug in their own `IdentityProvider` instead.
    pub id_token: Option<String>,
}

/// Optional overrides fetched at startup from `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    pub api_base_url: Option<String>,
    pub api_path_prefix: Option<String>,
    pub api_version: Option<String>,
    pub use_new_admin_users_api: Option<bool>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let base_url =
            env::var("PORTAL_API_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
        Url::parse(&base_url)
            .map_err(|_| ConfigError::InvalidValue("PORTAL_API_BASE_URL".to_string()))?;

        Ok(Config {
            api: ApiConfig {
                base_url,
                path_prefix: env::var("PORTAL_API_PATH_PREFIX")
                    .unwrap_or_else(|_| "/api".to_string()),
                version: env::var("PORTAL_API_VERSION").unwrap_or_else(|_| "v1".to_string()),
                use_new_admin_users_api: match env::var("PORTAL_USE_NEW_ADMIN_USERS_API") {
                    Ok(v) => parse_flag(&v)
                        .ok_or_else(|| ConfigError::InvalidValue("PORTAL_USE_NEW_ADMIN_USERS_API".to_string()))?,
                    Err(_) => false,
                },
            },
            runtime: RuntimeConfigSource {
                url: env::var("PORTAL_CONFIG_URL")
                    .unwrap_or_else(|_| "http://localhost:4200/config.json".to_string()),
                timeout_ms: env::var("PORTAL_CONFIG_TIMEOUT_MS")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
            },
            http: HttpConfig {
                timeout_seconds: env::var("PORTAL_HTTP_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("PORTAL_HTTP_TIMEOUT_SECONDS".to_string()))?,
            },
            cache: CacheConfig {
                ttl_seconds: env::var("PORTAL_CACHE_TTL_SECONDS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()
                    .unwrap_or(300),
            },
            auth: AuthConfig {
                id_token: env::var("PORTAL_ID_TOKEN").ok().filter(|t| !t.trim().is_empty()),
            },
        })
    }

    /// Overlay values from the runtime document; absent keys keep current values.
    pub fn apply_runtime(&mut self, runtime: RuntimeConfig) {
        if let Some(base) = runtime.api_base_url {
            self.api.base_url = base;
        }
        if let Some(prefix) = runtime.api_path_prefix {
            self.api.path_prefix = prefix;
        }
        if let Some(version) = runtime.api_version {
            self.api.version = version;
        }
        if let Some(flag) = runtime.use_new_admin_users_api {
            self.api.use_new_admin_users_api = flag;
        }
    }

    /// Versioned API root, e.g. `http://host/api/v1`.
    pub fn api_url(&self) -> String {
        build_api_url(
            &self.api.base_url,
            Some(&self.api.path_prefix),
            Some(&self.api.version),
        )
    }

    /// API root without the version segment. Role requests live here.
    pub fn unversioned_api_url(&self) -> String {
        let prefix = if self.api.path_prefix.trim().is_empty() {
            "/api"
        } else {
            self.api.path_prefix.as_str()
        };
        build_api_url(&self.api.base_url, Some(prefix), None)
    }

    pub fn runtime_timeout(&self) -> Duration {
        Duration::from_millis(self.runtime.timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_seconds)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Join base URL, path prefix and optional version into an API root.
pub fn build_api_url(base: &str, prefix: Option<&str>, version: Option<&str>) -> String {
    let base_clean = base.trim_end_matches('/');
    let prefix_clean = prefix.unwrap_or("").trim_end_matches('/');
    let version_clean = version.unwrap_or("").trim_matches('/');

    let pv = if version_clean.is_empty() {
        prefix_clean.to_string()
    } else {
        format!("{}/{}", prefix_clean, version_clean)
    };

    if pv.is_empty() {
        base_clean.to_string()
    } else if pv.starts_with('/') {
        format!("{}{}", base_clean, pv)
    } else {
        format!("{}/{}", base_clean, pv)
    }
}

/// Fetch the runtime override document.
///
/// A missing document, timeout or malformed JSON all yield an empty
/// `RuntimeConfig` so startup continues with compiled defaults.
pub async fn load_runtime_config(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> RuntimeConfig {
    let response = match client.get(url).timeout(timeout).send().await {
        Ok(resp) => resp,
        Err(e) => {
            tracing::debug!("Runtime config unavailable at {}: {}", url, e);
            return RuntimeConfig::default();
        }
    };

    if !response.status().is_success() {
        tracing::debug!(
            "Runtime config request to {} returned {}; using defaults",
            url,
            response.status()
        );
        return RuntimeConfig::default();
    }

    match response.json::<RuntimeConfig>().await {
        Ok(cfg) => {
            tracing::info!("Loaded runtime config from {}", url);
            cfg
        }
        Err(e) => {
            tracing::warn!("Ignoring malformed runtime config at {}: {}", url, e);
            RuntimeConfig::default()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api: ApiConfig {
                base_url: "http://localhost:8080".to_string(),
                path_prefix: "/api".to_string(),
                version: "v1".to_string(),
                use_new_admin_users_api: false,
            },
            runtime: RuntimeConfigSource {
                url: "http://localhost:4200/config.json".to_string(),
                timeout_ms: 3000,
            },
            http: HttpConfig {
                timeout_seconds: 30,
            },
            cache: CacheConfig { ttl_seconds: 300 },
            auth: AuthConfig { id_token: None },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn build_api_url_composes_segments() {
        assert_eq!(
            build_api_url("http://host/", Some("/api"), Some("v1")),
            "http://host/api/v1"
        );
        assert_eq!(
            build_api_url("http://host", Some("api/"), Some("/v2/")),
            "http://host/api/v2"
        );
        assert_eq!(build_api_url("http://host", Some("/api"), None), "http://host/api");
        assert_eq!(build_api_url("http://host", None, Some("v1")), "http://host/v1");
        assert_eq!(build_api_url("http://host//", None, None), "http://host");
    }

    #[test]
    fn runtime_overrides_only_present_keys() {
        let mut config = Config::default();
        config.apply_runtime(RuntimeConfig {
            api_base_url: Some("https://api.example.com".to_string()),
            api_version: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(config.api_url(), "https://api.example.com/api");
        assert_eq!(config.unversioned_api_url(), "https://api.example.com/api");
        assert!(!config.api.use_new_admin_users_api);
    }

    #[tokio::test]
    async fn runtime_config_is_loaded_when_present() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/config.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "apiBaseUrl": "https://prod.example.com",
                "apiVersion": "v2",
                "useNewAdminUsersApi": true
            })))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let cfg = load_runtime_config(
            &client,
            &format!("{}/config.json", server.uri()),
            Duration::from_secs(3),
        )
        .await;
        assert_eq!(cfg.api_base_url.as_deref(), Some("https://prod.example.com"));
        assert_eq!(cfg.api_version.as_deref(), Some("v2"));
        assert_eq!(cfg.api_path_prefix, None);
        assert_eq!(cfg.use_new_admin_users_api, Some(true));
    }

    #[tokio::test]
    async fn missing_runtime_config_falls_back_silently() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/config.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let cfg = load_runtime_config(
            &client,
            &format!("{}/config.json", server.uri()),
            Duration::from_secs(3),
        )
        .await;
        assert_eq!(cfg, RuntimeConfig::default());
    }

    #[tokio::test]
    async fn slow_runtime_config_times_out_to_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/config.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"apiBaseUrl": "https://late"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let cfg = load_runtime_config(
            &client,
            &format!("{}/config.json", server.uri()),
            Duration::from_millis(50),
        )
        .await;
        assert_eq!(cfg, RuntimeConfig::default());
    }
}
