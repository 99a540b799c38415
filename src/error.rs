use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::i18n;
use crate::navigation::{AppRoute, ServerErrorDetails};

/// At most this many field issues are spelled out in a formatted message.
const MAX_DETAILS_IN_MESSAGE: usize = 3;

/// Field-level problem reported by the backend (or by local form validation).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldIssue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_value: Option<Value>,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldIssue {
            field: Some(field.into()),
            message: Some(message.into()),
            rejected_value: None,
        }
    }

    fn summary(&self) -> Option<String> {
        let field = self.field.as_deref().filter(|f| !f.is_empty());
        let message = self.message.as_deref().filter(|m| !m.is_empty());
        match (field, message) {
            (Some(f), Some(m)) => Some(format!("{}: {}", f, m)),
            (None, Some(m)) => Some(m.to_string()),
            (Some(f), None) => Some(f.to_string()),
            (None, None) => None,
        }
    }
}

/// Structured error body as emitted by the backend.
///
/// Parsed leniently: values of the wrong JSON type are treated as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiErrorBody {
    pub timestamp: Option<String>,
    pub status: Option<u16>,
    pub error: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
    pub path: Option<String>,
    pub request_id: Option<String>,
    pub details: Vec<FieldIssue>,
}

impl ApiErrorBody {
    /// Recognise an error body. Objects without any of
    /// `status`/`message`/`code`/`details` are not error bodies.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        if !["status", "message", "code", "details"]
            .iter()
            .any(|k| obj.contains_key(*k))
        {
            return None;
        }

        let details = match obj.get("details") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|d| FieldIssue {
                    field: safe_string(d.get("field")),
                    message: safe_string(d.get("message")),
                    rejected_value: d.get("rejectedValue").filter(|v| !v.is_null()).cloned(),
                })
                .collect(),
            _ => Vec::new(),
        };

        Some(ApiErrorBody {
            timestamp: safe_string(obj.get("timestamp")),
            status: safe_status(obj.get("status")),
            error: safe_string(obj.get("error")),
            code: safe_string(obj.get("code")),
            message: safe_string(obj.get("message")),
            path: safe_string(obj.get("path")),
            request_id: safe_string(obj.get("requestId")),
            details,
        })
    }
}

/// Parse a raw response body into a structured error, if it is one.
pub fn parse_api_error(raw: &str) -> Option<ApiErrorBody> {
    serde_json::from_str::<Value>(raw)
        .ok()
        .as_ref()
        .and_then(ApiErrorBody::from_value)
}

fn safe_string(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

fn safe_status(value: Option<&Value>) -> Option<u16> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if n.is_finite() && n.fract() == 0.0 && (0.0..=f64::from(u16::MAX)).contains(&n) {
        Some(n as u16)
    } else {
        None
    }
}

/// A non-success HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiFailure {
    pub status: u16,
    pub body: Option<ApiErrorBody>,
}

impl ApiFailure {
    pub fn new(status: u16, raw_body: &str) -> Self {
        ApiFailure {
            status,
            body: parse_api_error(raw_body),
        }
    }

    pub fn details(&self) -> &[FieldIssue] {
        self.body.as_ref().map(|b| b.details.as_slice()).unwrap_or(&[])
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.body.as_ref().and_then(|b| b.message.as_deref()) {
            Some(message) => write!(f, "HTTP {}: {}", self.status, message),
            None => write!(f, "HTTP {}", self.status),
        }
    }
}

/// Every failure the client can surface.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AppError {
    /// The request never produced a response (status 0).
    #[error("Network error: {0}")]
    Network(String),

    #[error("{0}")]
    Api(ApiFailure),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Local form validation; never reaches the network.
    #[error("Validation failed: {}", summarize_issues(.0))]
    Validation(Vec<FieldIssue>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl AppError {
    pub fn api(status: u16, raw_body: &str) -> Self {
        AppError::Api(ApiFailure::new(status, raw_body))
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldIssue::new(field, message)])
    }

    /// HTTP status, with network failures reported as 0.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Network(_) => Some(0),
            AppError::Api(failure) => Some(failure.status),
            _ => None,
        }
    }

    pub fn api_body(&self) -> Option<&ApiErrorBody> {
        match self {
            AppError::Api(failure) => failure.body.as_ref(),
            _ => None,
        }
    }

    pub fn is_status(&self, status: u16) -> bool {
        self.status() == Some(status)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            AppError::Decode(e.to_string())
        } else if e.is_builder() {
            AppError::Unknown(e.to_string())
        } else {
            AppError::Network(e.to_string())
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

fn summarize_issues(issues: &[FieldIssue]) -> String {
    let summary = issues
        .iter()
        .filter_map(FieldIssue::summary)
        .collect::<Vec<_>>()
        .join("; ");
    if summary.is_empty() {
        i18n::t("error.request_failed")
    } else {
        summary
    }
}

fn format_body(body: &ApiErrorBody) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    if let Some(message) = body.message.as_deref().filter(|m| !m.is_empty()) {
        parts.push(message.to_string());
    }
    if !body.details.is_empty() {
        let summary = body
            .details
            .iter()
            .take(MAX_DETAILS_IN_MESSAGE)
            .filter_map(FieldIssue::summary)
            .collect::<Vec<_>>()
            .join("; ");
        if !summary.is_empty() {
            parts.push(summary);
        }
        if body.details.len() > MAX_DETAILS_IN_MESSAGE {
            parts.push(format!(
                "(+{} more)",
                body.details.len() - MAX_DETAILS_IN_MESSAGE
            ));
        }
    }
    if parts.is_empty() {
        if let Some(error) = body.error.as_deref().filter(|e| !e.is_empty()) {
            parts.push(error.to_string());
        }
    }
    if parts.is_empty() {
        if let Some(status) = body.status {
            parts.push(format!("HTTP {}", status));
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" — "))
    }
}

/// Produce a single human-readable message for any error. Never empty.
pub fn format_api_error(err: &AppError) -> String {
    let formatted = match err {
        // Unstructured bodies fall through to the generic message.
        AppError::Api(failure) => failure
            .body
            .as_ref()
            .map(|body| format_body(body).unwrap_or_else(|| format!("HTTP {}", failure.status))),
        AppError::Validation(issues) => format_body(&ApiErrorBody {
            details: issues.clone(),
            ..Default::default()
        }),
        other => Some(other.to_string()),
    };

    formatted
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| i18n::t("error.request_failed"))
}

/// Whether a failed lookup concerns the page's main resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Primary,
    Secondary,
}

/// How a failure should reach the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorDisposition {
    /// Global notification channel.
    Toast(String),
    /// Rendered next to the form or widget that issued the request.
    Inline(String),
    Redirect(AppRoute),
}

/// Classify an error according to the portal's error taxonomy.
pub fn disposition(err: &AppError, kind: ResourceKind, current_url: &str) -> ErrorDisposition {
    match err {
        AppError::Validation(_) => ErrorDisposition::Inline(format_api_error(err)),
        AppError::Network(_) => ErrorDisposition::Toast(i18n::t("toast.network")),
        AppError::Api(failure) => match failure.status {
            401 => ErrorDisposition::Redirect(AppRoute::login_from(current_url)),
            403 => ErrorDisposition::Redirect(AppRoute::Forbidden),
            404 => match kind {
                ResourceKind::Primary => ErrorDisposition::Redirect(AppRoute::NotFound),
                ResourceKind::Secondary => ErrorDisposition::Inline(i18n::t("toast.not_found")),
            },
            409 => ErrorDisposition::Inline(format_api_error(err)),
            s if s >= 500 => match kind {
                ResourceKind::Primary => {
                    let body = failure.body.clone().unwrap_or_default();
                    ErrorDisposition::Redirect(AppRoute::ServerError(ServerErrorDetails {
                        status: Some(s),
                        message: body.message,
                        request_id: body.request_id,
                        path: body.path,
                    }))
                }
                ResourceKind::Secondary => ErrorDisposition::Toast(i18n::t("toast.server_error")),
            },
            s if (400..500).contains(&s) && !failure.details().is_empty() => {
                ErrorDisposition::Inline(format_api_error(err))
            }
            _ => ErrorDisposition::Toast(format_api_error(err)),
        },
        _ => ErrorDisposition::Toast(format_api_error(err)),
    }
}
