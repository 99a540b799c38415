use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::models::{Event, EventStatus, EventType};
use crate::services::calendar::{to_calendar_events, CalendarEvent, CalendarMode, ColorScheme};
use crate::services::events::{normalize_sort, EventQuery, EventsChanged, EventsService, MAX_PAGE_SIZE};
use crate::services::http::RequestOptions;
use crate::services::query_cache::{CacheKey, QueryCache};

/// What the calendar page is asking for.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarQuery {
    pub mode: CalendarMode,
    /// Any instant inside the month being shown.
    pub reference: DateTime<Utc>,
    pub event_type: Option<EventType>,
    pub sort: Option<String>,
}

/// Events for one month as last confirmed by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    /// Mode actually served; differs from the request after a fallback.
    pub mode: CalendarMode,
    pub events: Vec<Event>,
    /// Message for the page banner, e.g. after falling back to published events.
    pub notice: Option<String>,
}

/// Month-at-a-time calendar data: cache in front of the events client.
///
/// The cache is flushed whenever the events client reports a confirmed
/// mutation, so a change is visible on the next load regardless of TTL.
pub struct EventFeed {
    events: EventsService,
    cache: QueryCache<FeedSnapshot>,
    changes: Mutex<broadcast::Receiver<EventsChanged>>,
    colors: ColorScheme,
    /// Set after the server refused the "mine" listing.
    mine_disabled: AtomicBool,
}

impl EventFeed {
    pub fn new(events: EventsService, ttl: Duration) -> Self {
        Self::with_cache(events, QueryCache::new(ttl))
    }

    pub fn with_cache(events: EventsService, cache: QueryCache<FeedSnapshot>) -> Self {
        let changes = Mutex::new(events.subscribe());
        EventFeed {
            events,
            cache,
            changes,
            colors: ColorScheme::default(),
            mine_disabled: AtomicBool::new(false),
        }
    }

    pub fn colors(&self) -> &ColorScheme {
        &self.colors
    }

    pub fn mine_disabled(&self) -> bool {
        self.mine_disabled.load(Ordering::SeqCst)
    }

    pub async fn invalidate(&self) {
        self.cache.clear().await;
        self.mine_disabled.store(false, Ordering::SeqCst);
    }

    /// Load the month, serving from cache when fresh.
    pub async fn load(&self, query: &CalendarQuery) -> AppResult<FeedSnapshot> {
        self.apply_pending_changes().await;

        let mut notice = None;
        let mut mode = query.mode;
        if mode == CalendarMode::Mine && self.mine_disabled() {
            mode = CalendarMode::Published;
            notice = Some(i18n::t("events.mine_not_authorized"));
        }

        match self.load_mode(query, mode).await {
            Err(e) if mode == CalendarMode::Mine && is_refusal(&e) => {
                info!("My events not available ({}); showing published events", e);
                self.mine_disabled.store(true, Ordering::SeqCst);
                let mut snapshot = self.load_mode(query, CalendarMode::Published).await?;
                snapshot.notice = Some(i18n::t("events.mine_not_authorized"));
                Ok(snapshot)
            }
            Ok(mut snapshot) => {
                if notice.is_some() {
                    snapshot.notice = notice;
                }
                Ok(snapshot)
            }
            Err(e) => Err(e),
        }
    }

    /// Load and adapt for display.
    pub async fn calendar(&self, query: &CalendarQuery) -> AppResult<(FeedSnapshot, Vec<CalendarEvent>)> {
        let snapshot = self.load(query).await?;
        let entries = to_calendar_events(&snapshot.events, snapshot.mode, &self.colors);
        Ok((snapshot, entries))
    }

    async fn load_mode(&self, query: &CalendarQuery, mode: CalendarMode) -> AppResult<FeedSnapshot> {
        let sort = normalize_sort(query.sort.as_deref());
        let key = CacheKey::new(
            mode,
            query.reference,
            query.event_type.map(|t| t.as_str()),
            &sort,
        );
        if let Some(hit) = self.cache.get(&key).await {
            return Ok(hit);
        }

        let (from, to) = month_window(query.reference);
        let request = EventQuery {
            page: Some(0),
            size: Some(MAX_PAGE_SIZE),
            sort: Some(sort),
            event_type: query.event_type,
            status: None,
            from: Some(from),
            to: Some(to),
        };

        let page = match mode {
            CalendarMode::Published => {
                let request = EventQuery {
                    status: Some(EventStatus::Published),
                    ..request
                };
                self.events.list(&request).await?
            }
            CalendarMode::Mine => match self
                .events
                .list_mine_with(&request, RequestOptions::silent())
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    // 401/403 turn into the published fallback in `load`.
                    if !is_refusal(&e) {
                        self.events
                            .api()
                            .notifications()
                            .report(&e, RequestOptions::default())
                            .await;
                    }
                    return Err(e);
                }
            },
        };

        debug!("Fetched {} events for {}", page.items.len(), key);
        let snapshot = FeedSnapshot {
            mode,
            events: page.items,
            notice: None,
        };
        self.cache.insert(key, snapshot.clone()).await;
        Ok(snapshot)
    }

    async fn apply_pending_changes(&self) {
        let mut rx = self.changes.lock().await;
        let mut changed = false;
        loop {
            match rx.try_recv() {
                Ok(change) => {
                    debug!("Invalidating calendar cache after {:?}", change);
                    changed = true;
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => changed = true,
                Err(_) => break,
            }
        }
        drop(rx);
        if changed {
            self.invalidate().await;
        }
    }
}

fn is_refusal(err: &AppError) -> bool {
    err.is_status(401) || err.is_status(403)
}

/// `[first day of month, first day of next month)` in UTC.
pub fn month_window(reference: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let (year, month) = (reference.year(), reference.month());
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let start = first_of_month(year, month).unwrap_or(reference);
    let end = first_of_month(next_year, next_month).unwrap_or(reference);
    (start, end)
}

fn first_of_month(year: i32, month: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
