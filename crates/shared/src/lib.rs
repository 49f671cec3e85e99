//! Backoffice Shared Types and Utilities
//!
//! Domain types, the session error family, command objects and database
//! helpers shared by the back-office crates.

pub mod commands;
pub mod db;
pub mod error;
pub mod types;

pub use commands::*;
pub use db::*;
pub use error::*;
pub use types::*;
