use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{format_api_error, AppError};
use crate::i18n;
use crate::services::http::RequestOptions;

/// Sink for user-facing notifications (toasts).
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn show(&self, message: &str);
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn show(&self, message: &str) {
        warn!("{}", message);
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    messages: Mutex<Vec<String>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn messages(&self) -> Vec<String> {
        self.messages.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn show(&self, message: &str) {
        self.messages.lock().await.push(message.to_string());
    }
}

/// The single global error channel.
#[derive(Clone)]
pub struct NotificationService {
    notifier: Arc<dyn Notifier>,
}

impl NotificationService {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        NotificationService { notifier }
    }

    pub async fn info(&self, message: &str) {
        if !message.trim().is_empty() {
            self.notifier.show(message).await;
        }
    }

    /// Surface a failed request unless the caller renders its own error.
    pub async fn report(&self, err: &AppError, options: RequestOptions) {
        if options.suppress_global_error {
            debug!("Suppressed global notification: {}", err);
            return;
        }
        if let Some(message) = toast_message(err) {
            self.notifier.show(&message).await;
        }
    }
}

impl Default for NotificationService {
    fn default() -> Self {
        Self::new(Arc::new(TracingNotifier))
    }
}

/// Map an error to the toast text shown on the global channel.
pub fn toast_message(err: &AppError) -> Option<String> {
    let message = match err.status() {
        Some(0) => i18n::t("toast.network"),
        Some(401) => i18n::t("toast.sign_in_required"),
        Some(403) => i18n::t("toast.forbidden"),
        Some(404) => i18n::t("toast.not_found"),
        Some(409) => {
            if has_server_message(err) {
                format_api_error(err)
            } else {
                i18n::t("toast.conflict")
            }
        }
        Some(s) if s >= 500 => i18n::t("toast.server_error"),
        Some(s) => {
            if has_server_message(err) {
                format_api_error(err)
            } else {
                i18n::t_with("toast.request_failed_status", &[("status", s.to_string().as_str())])
            }
        }
        None => format_api_error(err),
    };

    if message.trim().is_empty() {
        None
    } else {
        Some(message)
    }
}

fn has_server_message(err: &AppError) -> bool {
    err.api_body().is_some_and(|b| {
        b.message.as_deref().is_some_and(|m| !m.trim().is_empty())
            || !b.details.is_empty()
            || b.error.as_deref().is_some_and(|e| !e.trim().is_empty())
    })
}
