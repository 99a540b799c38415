//! Form state and local validation for the editor and profile pages.
//!
//! Local validation failures are returned as `AppError::Validation` and never
//! reach the network.

pub mod event_form;
pub mod profile_form;

pub use event_form::{DurationPreview, EventForm, Meridiem, Time12};
pub use profile_form::ProfileForm;

use crate::error::FieldIssue;
use crate::i18n;

pub(crate) fn required(field: &str) -> FieldIssue {
    FieldIssue::new(field, i18n::t_with("validation.required", &[("field", field)]))
}

/// Length bounds on the trimmed value, counted in characters.
pub(crate) fn check_length(field: &str, value: &str, min: usize, max: usize) -> Option<FieldIssue> {
    let len = value.trim().chars().count();
    if len == 0 {
        Some(required(field))
    } else if len < min {
        Some(FieldIssue::new(
            field,
            i18n::t_with(
                "validation.too_short",
                &[("field", field), ("min", min.to_string().as_str())],
            ),
        ))
    } else if len > max {
        Some(FieldIssue::new(
            field,
            i18n::t_with(
                "validation.too_long",
                &[("field", field), ("max", max.to_string().as_str())],
            ),
        ))
    } else {
        None
    }
}
