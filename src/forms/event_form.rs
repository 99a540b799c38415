use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use tracing::{debug, info};

use crate::error::{format_api_error, AppError, AppResult, FieldIssue};
use crate::forms::{check_length, required};
use crate::i18n;
use crate::models::{CreateEventRequest, Event, EventType};
use crate::services::events::EventsService;
use crate::services::http::RequestOptions;

pub const EVENT_NAME_MAX: usize = 200;
const TIME_STEP_MINUTES: u32 = 15;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Meridiem {
    #[default]
    Am,
    Pm,
}

impl FromStr for Meridiem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "AM" => Ok(Meridiem::Am),
            "PM" => Ok(Meridiem::Pm),
            other => Err(format!("expected AM or PM, got {}", other)),
        }
    }
}

impl fmt::Display for Meridiem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Meridiem::Am => "AM",
            Meridiem::Pm => "PM",
        })
    }
}

/// Clock time as picked in the form: hour 1..=12 plus a separate meridiem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Time12 {
    hour: u32,
    minute: u32,
}

impl Time12 {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        if (1..=12).contains(&hour) && minute < 60 {
            Some(Time12 { hour, minute })
        } else {
            None
        }
    }

    /// Parse `hh:mm`.
    pub fn parse(s: &str) -> Option<Self> {
        let (h, m) = s.trim().split_once(':')?;
        Self::new(h.trim().parse().ok()?, m.trim().parse().ok()?)
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// 12 AM is midnight, 12 PM is noon.
    pub fn to_24h(&self, meridiem: Meridiem) -> NaiveTime {
        let hour = match (meridiem, self.hour) {
            (Meridiem::Am, 12) => 0,
            (Meridiem::Am, h) => h,
            (Meridiem::Pm, 12) => 12,
            (Meridiem::Pm, h) => h + 12,
        };
        NaiveTime::from_hms_opt(hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }

    pub fn from_24h(time: NaiveTime) -> (Self, Meridiem) {
        let (hour, minute) = (time.hour(), time.minute());
        let meridiem = if hour >= 12 { Meridiem::Pm } else { Meridiem::Am };
        let hour12 = match hour {
            0 => 12,
            h if h > 12 => h - 12,
            h => h,
        };
        (Time12 { hour: hour12, minute }, meridiem)
    }
}

impl fmt::Display for Time12 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// `01:00`, `01:15`, ... `12:45`.
pub fn time_options() -> Vec<String> {
    (1..=12)
        .flat_map(|h| (0..60).step_by(TIME_STEP_MINUTES as usize).map(move |m| format!("{:02}:{:02}", h, m)))
        .collect()
}

/// Local date and 12-hour time to an instant. Non-existent local times fail;
/// ambiguous ones resolve to the earlier instant.
pub fn compose<Tz: TimeZone>(date: NaiveDate, time: Time12, meridiem: Meridiem, tz: &Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(time.to_24h(meridiem)))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationPreview {
    pub hours: i64,
    pub minutes: i64,
}

/// Create / edit event form.
#[derive(Debug, Clone, Default)]
pub struct EventForm {
    pub event_name: String,
    pub event_type: Option<EventType>,
    pub date_start: Option<NaiveDate>,
    pub time_start: Option<Time12>,
    pub period_start: Meridiem,
    pub date_end: Option<NaiveDate>,
    pub time_end: Option<Time12>,
    pub period_end: Meridiem,
    pub event_location: String,
    pub event_description: String,

    pub saving: bool,
    pub error: Option<String>,
    pub end_before_start: bool,
}

impl EventForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Utc>> {
        compose(self.date_start?, self.time_start?, self.period_start, tz)
    }

    pub fn end<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Utc>> {
        compose(self.date_end?, self.time_end?, self.period_end, tz)
    }

    /// Length of the composed span; `None` until both ends are set.
    pub fn duration_preview<Tz: TimeZone>(&self, tz: &Tz) -> Option<DurationPreview> {
        let diff = (self.end(tz)? - self.start(tz)?).num_seconds().max(0);
        let minutes = (diff + 30) / 60;
        Some(DurationPreview {
            hours: minutes / 60,
            minutes: minutes % 60,
        })
    }

    /// Move the end to `minutes` after the current start.
    pub fn set_duration_minutes<Tz: TimeZone>(&mut self, minutes: i64, tz: &Tz) {
        let Some(start) = self.start(tz) else {
            return;
        };
        let end = (start + Duration::minutes(minutes)).with_timezone(tz).naive_local();
        let (time, period) = Time12::from_24h(end.time());
        self.date_end = Some(end.date());
        self.time_end = Some(time);
        self.period_end = period;
    }

    /// Fill the form from an existing event for editing.
    pub fn patch_from_event<Tz: TimeZone>(&mut self, event: &Event, tz: &Tz) {
        self.event_name = event.event_name.clone();
        self.event_type = event.event_type;
        self.event_location = event.event_location.clone().unwrap_or_default();
        self.event_description = event.event_description.clone().unwrap_or_default();

        match event.start_instant() {
            Some(start) => {
                let local = start.with_timezone(tz).naive_local();
                let (time, period) = Time12::from_24h(local.time());
                self.date_start = Some(local.date());
                self.time_start = Some(time);
                self.period_start = period;
            }
            None => {
                self.date_start = None;
                self.time_start = None;
                self.period_start = Meridiem::Am;
            }
        }
        match event.end_instant() {
            Some(end) => {
                let local = end.with_timezone(tz).naive_local();
                let (time, period) = Time12::from_24h(local.time());
                self.date_end = Some(local.date());
                self.time_end = Some(time);
                self.period_end = period;
            }
            None => {
                self.date_end = None;
                self.time_end = None;
                self.period_end = Meridiem::Am;
            }
        }
        self.end_before_start = false;
        self.error = None;
    }

    /// Check the form and build the request body.
    pub fn validate<Tz: TimeZone>(&self, tz: &Tz) -> Result<CreateEventRequest, Vec<FieldIssue>> {
        let mut issues = Vec::new();

        if let Some(issue) = check_length("eventName", &self.event_name, 1, EVENT_NAME_MAX) {
            issues.push(issue);
        }

        let start = composed("start", self.date_start, self.time_start, self.period_start, tz, &mut issues);
        let end = composed("end", self.date_end, self.time_end, self.period_end, tz, &mut issues);

        if let (Some(start), Some(end)) = (start, end) {
            if end <= start {
                issues.push(FieldIssue::new("end", i18n::t("validation.end_before_start")));
            }
            if issues.is_empty() {
                return Ok(CreateEventRequest {
                    event_name: self.event_name.trim().to_string(),
                    event_type: self.event_type,
                    start_at: start.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                    end_at: Some(end.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
                    event_location: non_blank(&self.event_location),
                    event_description: non_blank(&self.event_description),
                });
            }
        }
        Err(issues)
    }

    /// Validate locally, then create (or update `edit_id`).
    ///
    /// Invalid input, including an end not after the start, is rejected
    /// without a request.
    pub async fn submit<Tz: TimeZone>(
        &mut self,
        events: &EventsService,
        edit_id: Option<i64>,
        tz: &Tz,
    ) -> AppResult<Event> {
        let request = match self.validate(tz) {
            Ok(request) => request,
            Err(issues) => {
                self.end_before_start =
                    matches!((self.start(tz), self.end(tz)), (Some(s), Some(e)) if e <= s);
                let err = AppError::Validation(issues);
                self.error = Some(format_api_error(&err));
                debug!("Event form rejected locally: {}", err);
                return Err(err);
            }
        };

        self.end_before_start = false;
        self.error = None;
        self.saving = true;
        let result = match edit_id {
            Some(id) => events.update_with(id, &request, RequestOptions::silent()).await,
            None => events.create_with(&request, RequestOptions::silent()).await,
        };
        self.saving = false;

        match result {
            Ok(event) => {
                info!("Saved event {}", event.event_id);
                Ok(event)
            }
            Err(e) => {
                let message = format_api_error(&e);
                self.error = Some(if message.trim().is_empty() {
                    i18n::t("event.save_failed")
                } else {
                    message
                });
                Err(e)
            }
        }
    }
}

fn composed<Tz: TimeZone>(
    field: &str,
    date: Option<NaiveDate>,
    time: Option<Time12>,
    period: Meridiem,
    tz: &Tz,
    issues: &mut Vec<FieldIssue>,
) -> Option<DateTime<Utc>> {
    let (Some(date), Some(time)) = (date, time) else {
        issues.push(required(field));
        return None;
    };
    let composed = compose(date, time, period, tz);
    if composed.is_none() {
        issues.push(FieldIssue::new(
            field,
            i18n::t_with("validation.invalid_datetime", &[("field", field)]),
        ));
    }
    composed
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
