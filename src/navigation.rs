use std::fmt;

use serde::{Deserialize, Serialize};

use crate::i18n;

/// Diagnostic fields carried to the server error page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerErrorDetails {
    pub status: Option<u16>,
    pub message: Option<String>,
    pub request_id: Option<String>,
    pub path: Option<String>,
}

impl ServerErrorDetails {
    /// Heading for the error page, e.g. `Error 502`.
    pub fn title(&self) -> String {
        match self.status {
            Some(status) => {
                i18n::t_with("error.page_title_status", &[("status", status.to_string().as_str())])
            }
            None => i18n::t("error.page_title_default"),
        }
    }

    pub fn display_message(&self) -> String {
        self.message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| i18n::t("error.page_message_default"))
    }
}

/// Portal routes that guards and error handling can redirect to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppRoute {
    Home,
    Events,
    EventDetail(i64),
    Login { from: Option<String> },
    Signup,
    Profile,
    CreateProfile,
    EditorDashboard,
    EditorManage,
    EditorCreate(Option<i64>),
    AdminDashboard,
    /// `/error/401`, remembering where the user was going.
    Unauthorized { from: Option<String> },
    Forbidden,
    NotFound,
    /// Details travel as navigation state, not in the URL.
    ServerError(ServerErrorDetails),
}

impl AppRoute {
    pub fn login_from(url: &str) -> Self {
        AppRoute::Login {
            from: non_empty(url),
        }
    }

    pub fn unauthorized_from(url: &str) -> Self {
        AppRoute::Unauthorized {
            from: non_empty(url),
        }
    }

    /// Render the route as an application path.
    pub fn path(&self) -> String {
        match self {
            AppRoute::Home => "/home".to_string(),
            AppRoute::Events => "/events".to_string(),
            AppRoute::EventDetail(id) => format!("/events/{}", id),
            AppRoute::Login { from } => with_from("/login", from.as_deref()),
            AppRoute::Signup => "/signup".to_string(),
            AppRoute::Profile => "/profile".to_string(),
            AppRoute::CreateProfile => "/create-profile".to_string(),
            AppRoute::EditorDashboard => "/editor".to_string(),
            AppRoute::EditorManage => "/editor/manage".to_string(),
            AppRoute::EditorCreate(None) => "/editor/create".to_string(),
            AppRoute::EditorCreate(Some(id)) => format!("/editor/create/{}", id),
            AppRoute::AdminDashboard => "/admin".to_string(),
            AppRoute::Unauthorized { from } => with_from("/error/401", from.as_deref()),
            AppRoute::Forbidden => "/error/403".to_string(),
            AppRoute::NotFound => "/error/404".to_string(),
            AppRoute::ServerError(_) => "/error/500".to_string(),
        }
    }

    /// The preserved return target, if any.
    pub fn return_target(&self) -> Option<&str> {
        match self {
            AppRoute::Login { from } | AppRoute::Unauthorized { from } => from.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for AppRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

fn non_empty(url: &str) -> Option<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn with_from(base: &str, from: Option<&str>) -> String {
    match from {
        Some(url) => format!("{}?from={}", base, urlencoding::encode(url)),
        None => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_preserves_encoded_target() {
        let route = AppRoute::unauthorized_from("/admin/users?page=2");
        assert_eq!(route.path(), "/error/401?from=%2Fadmin%2Fusers%3Fpage%3D2");
        assert_eq!(route.return_target(), Some("/admin/users?page=2"));
    }

    #[test]
    fn blank_target_is_dropped() {
        assert_eq!(AppRoute::login_from("  ").path(), "/login");
    }

    #[test]
    fn server_error_page_text() {
        let details = ServerErrorDetails {
            status: Some(502),
            ..Default::default()
        };
        assert_eq!(details.title(), "Error 502");
        assert_eq!(details.display_message(), "Please try again later.");
        assert_eq!(ServerErrorDetails::default().title(), "Something went wrong");
    }

    #[test]
    fn editor_create_paths() {
        assert_eq!(AppRoute::EditorCreate(None).path(), "/editor/create");
        assert_eq!(AppRoute::EditorCreate(Some(7)).to_string(), "/editor/create/7");
    }
}
