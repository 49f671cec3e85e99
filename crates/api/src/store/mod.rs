//! Persistence for sessions and security settings
//!
//! Two interchangeable backends implement the store traits: Postgres for
//! deployments and an in-memory map for local runs and tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use backoffice_shared::{CookieSameSite, SecuritySettings, SessionId, SessionKind, SessionRecord};
use serde::Serialize;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Stored data is corrupted: {0}")]
    Corrupted(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Column a session listing can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionColumn {
    SessionId,
    OwnerId,
    Firstname,
    Lastname,
    Email,
    LastActivity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Resolved search criteria for one page of sessions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSearch {
    pub offset: u32,
    pub limit: u32,
    pub order_by: SessionColumn,
    pub sort_order: SortOrder,
    pub session_id: Option<SessionId>,
    pub owner_id: Option<i64>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
}

impl Default for SessionSearch {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
            order_by: SessionColumn::SessionId,
            sort_order: SortOrder::Desc,
            session_id: None,
            owner_id: None,
            firstname: None,
            lastname: None,
            email: None,
        }
    }
}

/// One page of sessions plus the number of records matching the filters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionPage {
    pub records: Vec<SessionRecord>,
    pub total: u64,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn search_sessions(
        &self,
        kind: SessionKind,
        search: &SessionSearch,
    ) -> Result<SessionPage, StoreError>;

    /// Returns false when no session exists for the id
    async fn delete_session(&self, kind: SessionKind, id: SessionId) -> Result<bool, StoreError>;

    /// Deletes every listed session or none of them.
    ///
    /// Returns the ids that have no session; when that list is non-empty
    /// nothing was deleted.
    async fn delete_sessions(
        &self,
        kind: SessionKind,
        ids: &[SessionId],
    ) -> Result<Vec<SessionId>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load_settings(&self) -> Result<SecuritySettings, StoreError>;

    async fn save_settings(&self, settings: &SecuritySettings) -> Result<(), StoreError>;
}

// =============================================================================
// Configuration keys
// =============================================================================

pub const KEY_COOKIE_CHECK_IP: &str = "PS_COOKIE_CHECKIP";
pub const KEY_COOKIE_LIFETIME_FO: &str = "PS_COOKIE_LIFETIME_FO";
pub const KEY_COOKIE_LIFETIME_BO: &str = "PS_COOKIE_LIFETIME_BO";
pub const KEY_COOKIE_SAMESITE: &str = "PS_COOKIE_SAMESITE";
pub const KEY_PASSWORD_MIN_LENGTH: &str = "PS_SECURITY_PASSWORD_POLICY_MINIMUM_LENGTH";
pub const KEY_PASSWORD_MAX_LENGTH: &str = "PS_SECURITY_PASSWORD_POLICY_MAXIMUM_LENGTH";
pub const KEY_PASSWORD_MIN_SCORE: &str = "PS_SECURITY_PASSWORD_POLICY_MINIMUM_SCORE";

pub const SETTINGS_KEYS: [&str; 7] = [
    KEY_COOKIE_CHECK_IP,
    KEY_COOKIE_LIFETIME_FO,
    KEY_COOKIE_LIFETIME_BO,
    KEY_COOKIE_SAMESITE,
    KEY_PASSWORD_MIN_LENGTH,
    KEY_PASSWORD_MAX_LENGTH,
    KEY_PASSWORD_MIN_SCORE,
];

/// Flatten settings into configuration rows
pub fn settings_to_entries(settings: &SecuritySettings) -> Vec<(&'static str, String)> {
    vec![
        (
            KEY_COOKIE_CHECK_IP,
            if settings.check_cookie_ip_address { "1" } else { "0" }.to_string(),
        ),
        (
            KEY_COOKIE_LIFETIME_FO,
            settings.front_office_cookie_lifetime_hours.to_string(),
        ),
        (
            KEY_COOKIE_LIFETIME_BO,
            settings.back_office_cookie_lifetime_hours.to_string(),
        ),
        (KEY_COOKIE_SAMESITE, settings.cookie_samesite.as_str().to_string()),
        (KEY_PASSWORD_MIN_LENGTH, settings.password_minimum_length.to_string()),
        (KEY_PASSWORD_MAX_LENGTH, settings.password_maximum_length.to_string()),
        (KEY_PASSWORD_MIN_SCORE, settings.password_minimum_score.to_string()),
    ]
}

/// Rebuild settings from configuration rows; absent keys keep their defaults
pub fn settings_from_entries<I>(entries: I) -> Result<SecuritySettings, StoreError>
where
    I: IntoIterator<Item = (String, String)>,
{
    fn number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, StoreError> {
        value
            .trim()
            .parse()
            .map_err(|_| StoreError::Corrupted(format!("{} = {:?}", key, value)))
    }

    let mut settings = SecuritySettings::default();
    for (key, value) in entries {
        match key.as_str() {
            KEY_COOKIE_CHECK_IP => {
                settings.check_cookie_ip_address = matches!(value.trim(), "1" | "true")
            }
            KEY_COOKIE_LIFETIME_FO => {
                settings.front_office_cookie_lifetime_hours = number(&key, &value)?
            }
            KEY_COOKIE_LIFETIME_BO => {
                settings.back_office_cookie_lifetime_hours = number(&key, &value)?
            }
            KEY_COOKIE_SAMESITE => {
                settings.cookie_samesite = value
                    .parse::<CookieSameSite>()
                    .map_err(StoreError::Corrupted)?
            }
            KEY_PASSWORD_MIN_LENGTH => settings.password_minimum_length = number(&key, &value)?,
            KEY_PASSWORD_MAX_LENGTH => settings.password_maximum_length = number(&key, &value)?,
            KEY_PASSWORD_MIN_SCORE => settings.password_minimum_score = number(&key, &value)?,
            _ => {}
        }
    }
    Ok(settings)
}
