//! Common types used across the back office

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

// =============================================================================
// ID Wrappers
// =============================================================================

/// Identifier of an employee or customer session record.
///
/// Always strictly positive. Whether a record exists for the id is only known
/// once a command handler looks it up.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(try_from = "i64", into = "i64")]
#[sqlx(transparent)]
pub struct SessionId(i64);

impl SessionId {
    pub fn new(raw: i64) -> Result<Self, InvalidSessionId> {
        if raw <= 0 {
            return Err(InvalidSessionId(raw.to_string()));
        }
        Ok(Self(raw))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for SessionId {
    type Error = InvalidSessionId;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<SessionId> for i64 {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl FromStr for SessionId {
    type Err = InvalidSessionId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: i64 = s
            .trim()
            .parse()
            .map_err(|_| InvalidSessionId(s.to_string()))?;
        Self::new(raw).map_err(|_| InvalidSessionId(s.to_string()))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid session id: {0:?} (expected a positive integer)")]
pub struct InvalidSessionId(pub String);

// =============================================================================
// Enums
// =============================================================================

/// Which population a session belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Employee,
    Customer,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Employee => "employee",
            SessionKind::Customer => "customer",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability granted to a caller on a resource tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Read,
    Create,
    Update,
    Delete,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Read => "read",
            Capability::Create => "create",
            Capability::Update => "update",
            Capability::Delete => "delete",
        }
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "read" => Ok(Capability::Read),
            "create" => Ok(Capability::Create),
            "update" => Ok(Capability::Update),
            "delete" => Ok(Capability::Delete),
            other => Err(format!("Unknown capability: {}", other)),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SameSite attribute applied to shop cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CookieSameSite {
    Strict,
    Lax,
    None,
}

impl CookieSameSite {
    pub const ALL: [CookieSameSite; 3] =
        [CookieSameSite::Strict, CookieSameSite::Lax, CookieSameSite::None];

    pub fn as_str(&self) -> &'static str {
        match self {
            CookieSameSite::Strict => "Strict",
            CookieSameSite::Lax => "Lax",
            CookieSameSite::None => "None",
        }
    }
}

impl FromStr for CookieSameSite {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CookieSameSite::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown SameSite value: {}", s))
    }
}

// =============================================================================
// Records
// =============================================================================

/// One row of an employee or customer session listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SessionRecord {
    pub session_id: SessionId,
    /// Employee id or customer id, depending on the listing
    pub owner_id: i64,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub last_activity: OffsetDateTime,
}

/// General security settings edited on the settings page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecuritySettings {
    pub check_cookie_ip_address: bool,
    pub front_office_cookie_lifetime_hours: u32,
    pub back_office_cookie_lifetime_hours: u32,
    pub cookie_samesite: CookieSameSite,
    pub password_minimum_length: u32,
    pub password_maximum_length: u32,
    pub password_minimum_score: u8,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            check_cookie_ip_address: false,
            front_office_cookie_lifetime_hours: 480,
            back_office_cookie_lifetime_hours: 1,
            cookie_samesite: CookieSameSite::Lax,
            password_minimum_length: 8,
            password_maximum_length: 72,
            password_minimum_score: 3,
        }
    }
}
