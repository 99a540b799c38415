#![allow(unused_imports)]

//! Wire models exchanged with the portal backend.
//! Re-exported at `crate::models` so callers can `use crate::models::*;`.

pub mod admin_user;
pub mod app_user;
pub mod enums;
pub mod event;
pub mod page;
pub mod profile;
pub mod role_request;

pub use self::admin_user::*;
pub use self::app_user::*;
pub use self::enums::*;
pub use self::event::*;
pub use self::page::*;
pub use self::profile::*;
pub use self::role_request::*;
