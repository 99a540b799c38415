pub mod admin_users;
pub mod app_users;
pub mod calendar;
pub mod enums;
pub mod event_feed;
pub mod events;
pub mod guards;
pub mod http;
pub mod notifications;
pub mod profiles;
pub mod query_cache;
pub mod role_requests;
pub mod session;
