//! Back-office security administration service
//!
//! Settings page, session listings and session deletion for the
//! "Advanced parameters > Security" section of the back office.

pub mod auth;
pub mod bus;
pub mod config;
pub mod error;
pub mod flash;
pub mod forms;
pub mod grid;
pub mod hooks;
pub mod i18n;
pub mod render;
pub mod routes;
pub mod security;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
