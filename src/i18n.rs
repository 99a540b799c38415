//! User-facing message catalogue.
//!
//! Messages are looked up by key; `{name}` placeholders are filled by
//! [`t_with`]. An unknown key renders as the key itself so it shows up in logs.

use std::collections::HashMap;
use std::sync::OnceLock;

const MESSAGES: &[(&str, &str)] = &[
    ("toast.network", "Network error. Check your connection."),
    ("toast.sign_in_required", "Sign-in required to continue."),
    ("toast.forbidden", "You don't have permission to perform this action."),
    ("toast.not_found", "Not found."),
    ("toast.conflict", "Conflict. Please refresh and try again."),
    ("toast.server_error", "Something went wrong. Please try again."),
    ("toast.request_failed_status", "Request failed (HTTP {status})."),
    ("error.request_failed", "Request failed."),
    ("error.page_title_status", "Error {status}"),
    ("error.page_title_default", "Something went wrong"),
    ("error.page_message_default", "Please try again later."),
    ("event.save_failed", "Failed to save event"),
    (
        "events.mine_not_authorized",
        "Not authorized for My Events. Showing published events.",
    ),
    ("validation.required", "{field} is required"),
    ("validation.too_short", "{field} must be at least {min} characters"),
    ("validation.too_long", "{field} must be at most {max} characters"),
    ("validation.invalid_datetime", "{field} is not a valid local date and time"),
    ("validation.end_before_start", "End must be after start"),
    ("validation.url_scheme", "{field} must start with http:// or https://"),
    ("profile.create_failed", "Failed to create profile"),
    ("calendar.tooltip.title", "Title"),
    ("calendar.tooltip.location", "Location"),
    ("calendar.tooltip.type", "Type"),
    ("calendar.tooltip.start", "Start"),
    ("calendar.tooltip.end", "End"),
];

static CATALOGUE: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();

fn catalogue() -> &'static HashMap<&'static str, &'static str> {
    CATALOGUE.get_or_init(|| MESSAGES.iter().copied().collect())
}

pub fn t(key: &str) -> String {
    catalogue()
        .get(key)
        .map(|m| m.to_string())
        .unwrap_or_else(|| key.to_string())
}

/// Message for `key` with each `{name}` replaced by its value.
pub fn t_with(key: &str, params: &[(&str, &str)]) -> String {
    params.iter().fold(t(key), |message, (name, value)| {
        message.replace(&format!("{{{}}}", name), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_key_resolves() {
        assert_eq!(t("toast.not_found"), "Not found.");
    }

    #[test]
    fn placeholders_are_filled() {
        assert_eq!(
            t_with("toast.request_failed_status", &[("status", "418")]),
            "Request failed (HTTP 418)."
        );
        assert_eq!(
            t_with("validation.too_short", &[("field", "Name"), ("min", "2")]),
            "Name must be at least 2 characters"
        );
    }

    #[test]
    fn unknown_key_renders_as_itself() {
        assert_eq!(t("non.existent.key"), "non.existent.key");
    }

    #[test]
    fn keys_are_unique() {
        assert_eq!(catalogue().len(), MESSAGES.len());
    }
}
