//! Client library for the event management portal API.
//!
//! The HTTP transport lives in [`services::http::ApiClient`]; resource
//! clients, the calendar feed and route guards are built on top of it.
//! Identity and notification sinks are supplied by the host application
//! through [`services::session::IdentityProvider`] and
//! [`services::notifications::Notifier`].

pub mod config;
pub mod error;
pub mod forms;
pub mod i18n;
pub mod models;
pub mod navigation;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
