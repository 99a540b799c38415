use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;

use crate::i18n;
use crate::models::{Event, EventStatus, EventType};

/// Span given to events whose end is not after their start.
pub const MIN_EVENT_SPAN_MINUTES: i64 = 30;
pub const DEFAULT_EVENT_COLOR: &str = "#58a6ff";
const TOOLTIP_TIME_FORMAT: &str = "%b %-d, %Y, %-I:%M %p";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarMode {
    /// Public calendar; coloured by event type.
    Published,
    /// The caller's own events; coloured by lifecycle status.
    Mine,
}

impl CalendarMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarMode::Published => "published",
            CalendarMode::Mine => "mine",
        }
    }
}

/// Colour lookup for calendar entries.
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub status: HashMap<EventStatus, &'static str>,
    pub types: HashMap<EventType, &'static str>,
    pub fallback: &'static str,
}

impl Default for ColorScheme {
    fn default() -> Self {
        ColorScheme {
            status: HashMap::from([
                (EventStatus::Published, "#58a6ff"),
                (EventStatus::Draft, "#e2c76e"),
                (EventStatus::Unpublished, "#a08fe0"),
                (EventStatus::Cancelled, "#ff6b6b"),
            ]),
            types: HashMap::from([
                (EventType::Concert, "#d97706"),
                (EventType::Festival, "#2563eb"),
                (EventType::Party, "#059669"),
                (EventType::Other, "#7c3aed"),
            ]),
            fallback: DEFAULT_EVENT_COLOR,
        }
    }
}

impl ColorScheme {
    pub fn status_color(&self, status: Option<EventStatus>) -> &'static str {
        status
            .and_then(|s| self.status.get(&s).copied())
            .unwrap_or(self.fallback)
    }

    pub fn type_color(&self, event_type: Option<EventType>) -> Option<&'static str> {
        event_type.and_then(|t| self.types.get(&t).copied())
    }

    pub fn color_for(&self, event: &Event, mode: CalendarMode) -> &'static str {
        let status_color = self.status_color(event.status);
        match mode {
            CalendarMode::Mine => status_color,
            CalendarMode::Published => self.type_color(event.event_type).unwrap_or(status_color),
        }
    }

    /// Legend entries in display order.
    pub fn status_legend(&self) -> Vec<LegendEntry> {
        EventStatus::ALL
            .iter()
            .map(|s| LegendEntry {
                key: s.as_str(),
                color: self.status_color(Some(*s)),
            })
            .collect()
    }

    pub fn type_legend(&self) -> Vec<LegendEntry> {
        EventType::ALL
            .iter()
            .map(|t| LegendEntry {
                key: t.as_str(),
                color: self.type_color(Some(*t)).unwrap_or(self.fallback),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub key: &'static str,
    pub color: &'static str,
}

/// Start of a calendar entry; unparsable input is passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CalendarTime {
    Instant(DateTime<Utc>),
    Raw(String),
}

impl CalendarTime {
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            CalendarTime::Instant(dt) => Some(*dt),
            CalendarTime::Raw(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarExtras {
    pub location: Option<String>,
    pub status: Option<EventStatus>,
    #[serde(rename = "type")]
    pub event_type: Option<EventType>,
    pub type_display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: CalendarTime,
    /// Open-ended when the source event has no end.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    pub all_day: bool,
    pub color: &'static str,
    pub extended: CalendarExtras,
}

impl CalendarEvent {
    /// Hover text: one `Label: value` line per known field, or `None` when
    /// there is nothing to show.
    pub fn tooltip<Tz>(&self, tz: &Tz) -> Option<String>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let mut lines = Vec::new();
        let mut push = |label: &str, value: Option<String>| {
            if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
                lines.push(format!("{}: {}", i18n::t(label), v));
            }
        };

        push("calendar.tooltip.title", Some(self.title.clone()));
        push("calendar.tooltip.location", self.extended.location.clone());
        push(
            "calendar.tooltip.type",
            self.extended
                .type_display_name
                .clone()
                .or_else(|| self.extended.event_type.map(|t| t.as_str().to_string())),
        );
        push(
            "calendar.tooltip.start",
            self.start.instant().map(|dt| format_local(dt, tz)),
        );
        push("calendar.tooltip.end", self.end.map(|dt| format_local(dt, tz)));

        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}

fn format_local<Tz>(dt: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    dt.with_timezone(tz).format(TOOLTIP_TIME_FORMAT).to_string()
}

/// Map a backend event onto a calendar entry.
///
/// End handling:
/// - missing end: left unset;
/// - end at or before start, or unparsable: start + 30 minutes;
/// - unparsable start: no adjustment, end kept only if it parses.
pub fn to_calendar_event(event: &Event, mode: CalendarMode, colors: &ColorScheme) -> CalendarEvent {
    let start = event.start_instant();
    let end = match (start, event.end_at.as_deref()) {
        (_, None) => None,
        (Some(start), Some(raw)) => match crate::models::parse_instant(raw) {
            Some(end) if end > start => Some(end),
            _ => Some(start + Duration::minutes(MIN_EVENT_SPAN_MINUTES)),
        },
        (None, Some(raw)) => crate::models::parse_instant(raw),
    };

    CalendarEvent {
        id: event.event_id.to_string(),
        title: event.event_name.clone(),
        start: match start {
            Some(dt) => CalendarTime::Instant(dt),
            None => CalendarTime::Raw(event.start_at.clone()),
        },
        end,
        all_day: false,
        color: colors.color_for(event, mode),
        extended: CalendarExtras {
            location: event.event_location.clone(),
            status: event.status,
            event_type: event.event_type,
            type_display_name: event.type_display_name.clone(),
        },
    }
}

pub fn to_calendar_events(events: &[Event], mode: CalendarMode, colors: &ColorScheme) -> Vec<CalendarEvent> {
    events
        .iter()
        .map(|e| to_calendar_event(e, mode, colors))
        .collect()
}
