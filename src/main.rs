use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use event_portal::config::{load_runtime_config, Config};
use event_portal::error::{format_api_error, AppError};
use event_portal::models::{Event, EventType};
use event_portal::services::app_users::AppUsersService;
use event_portal::services::calendar::CalendarMode;
use event_portal::services::event_feed::{CalendarQuery, EventFeed};
use event_portal::services::events::{EventsService, DEFAULT_AUDIT_LIMIT};
use event_portal::services::http::{ApiClient, RequestOptions};
use event_portal::services::notifications::{NotificationService, TracingNotifier};
use event_portal::services::profiles::ProfileService;
use event_portal::services::session::{SessionContext, SessionUser, StaticTokenProvider};

const CLI_SESSION_UID: &str = "cli";

#[derive(Parser)]
#[command(name = "event-portal", version, about = "Command-line client for the event portal API")]
struct Cli {
    /// Bearer token for authenticated calls.
    #[arg(long, env = "PORTAL_ID_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Published upcoming events (no sign-in needed).
    Upcoming {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Calendar entries for one month.
    Events {
        /// Month as YYYY-MM; defaults to the current month.
        #[arg(long)]
        month: Option<String>,
        /// Only events you own.
        #[arg(long)]
        mine: bool,
        #[arg(long = "type")]
        event_type: Option<EventType>,
        /// e.g. `startAt,desc` or `-eventName`.
        #[arg(long)]
        sort: Option<String>,
    },
    Event {
        id: i64,
    },
    Audits {
        id: i64,
        #[arg(long)]
        limit: Option<i64>,
    },
    Publish {
        id: i64,
    },
    Unpublish {
        id: i64,
    },
    Cancel {
        id: i64,
    },
    /// Show the signed-in user, roles and profile.
    Me,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "event_portal=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    let bootstrap = reqwest::Client::new();
    let runtime = load_runtime_config(&bootstrap, &config.runtime.url, config.runtime_timeout()).await;
    config.apply_runtime(runtime);
    tracing::debug!("Using API root {}", config.api_url());

    let token = cli.token.clone().or_else(|| config.auth.id_token.clone());
    let session = SessionContext::new();
    if token.is_some() {
        session.sign_in(SessionUser::new(CLI_SESSION_UID));
    }

    let api = ApiClient::new(
        &config,
        session,
        Arc::new(StaticTokenProvider::new(token)),
        NotificationService::new(Arc::new(TracingNotifier)),
    )?;
    let events = EventsService::new(api.clone());

    let outcome = match cli.command {
        Command::Upcoming { limit } => events
            .list_public_upcoming(Utc::now(), limit)
            .await
            .map(|rows| rows.iter().for_each(print_event)),
        Command::Events {
            month,
            mine,
            event_type,
            sort,
        } => {
            let reference = match month {
                Some(m) => parse_month(&m)?,
                None => Utc::now(),
            };
            let feed = EventFeed::new(events.clone(), config.cache_ttl());
            let query = CalendarQuery {
                mode: if mine { CalendarMode::Mine } else { CalendarMode::Published },
                reference,
                event_type,
                sort,
            };
            feed.calendar(&query).await.map(|(snapshot, entries)| {
                if let Some(notice) = snapshot.notice {
                    println!("{}", notice);
                }
                for entry in entries {
                    println!("{}  {}", entry.id, entry.color);
                    if let Some(tooltip) = entry.tooltip(&Local) {
                        for line in tooltip.lines() {
                            println!("    {}", line);
                        }
                    }
                }
            })
        }
        Command::Event { id } => events.get(id).await.map(|e| print_event(&e)),
        Command::Audits { id, limit } => events
            .get_audits(id, Some(limit.unwrap_or(DEFAULT_AUDIT_LIMIT)))
            .await
            .map(|audits| {
                for a in audits {
                    println!(
                        "{}  {:<14} {}",
                        a.at.as_deref().unwrap_or("-"),
                        a.action.map(|x| format!("{:?}", x)).unwrap_or_else(|| "-".into()),
                        a.actor_id.as_deref().unwrap_or("-")
                    );
                }
            }),
        Command::Publish { id } => events.publish(id).await.map(|e| print_event(&e)),
        Command::Unpublish { id } => events.unpublish(id).await.map(|e| print_event(&e)),
        Command::Cancel { id } => events.cancel(id).await.map(|e| print_event(&e)),
        Command::Me => show_me(&api).await,
    };

    outcome.map_err(|e| anyhow::anyhow!(format_api_error(&e)))
}

async fn show_me(api: &ApiClient) -> Result<(), AppError> {
    let me = AppUsersService::new(api.clone()).me().await?;
    println!(
        "{} <{}>",
        me.display_name
            .as_deref()
            .or(me.firebase_uid.as_deref())
            .unwrap_or("-"),
        me.email.as_deref().unwrap_or("-")
    );
    let roles: Vec<String> = me.role_set().iter().map(|r| r.to_string()).collect();
    println!("roles: {}", if roles.is_empty() { "-".to_string() } else { roles.join(", ") });

    match ProfileService::new(api.clone()).me_with(RequestOptions::silent()).await {
        Ok(profile) => println!(
            "profile: {} (completed: {}, verified: {})",
            profile.display_name, profile.completed, profile.verified
        ),
        Err(e) if e.is_status(404) => println!("profile: none"),
        Err(e) => return Err(e),
    }
    Ok(())
}

fn parse_month(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", raw))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .context("Invalid month start")?;
    Ok(Utc.from_utc_datetime(&midnight))
}

fn print_event(e: &Event) {
    println!(
        "#{:<6} {:<12} {:<10} {}  {}",
        e.event_id,
        e.status.map(|s| s.as_str()).unwrap_or("-"),
        e.type_display_name
            .clone()
            .or_else(|| e.event_type.map(|t| t.as_str().to_string()))
            .unwrap_or_else(|| "-".into()),
        e.start_at,
        e.event_name
    );
}
