//! Query-string filters for the session listings
//!
//! Every value is read as text and resolved leniently: an out-of-range or
//! unknown value falls back to the listing default instead of failing.

use backoffice_shared::SessionId;
use serde::Deserialize;

use crate::store::{SessionColumn, SessionSearch, SortOrder};

pub const ALLOWED_LIMITS: [u32; 6] = [10, 20, 50, 100, 300, 1000];

/// Filters shared by both listings
#[derive(Debug)]
struct CommonFilters {
    offset: Option<String>,
    limit: Option<String>,
    order_by: Option<String>,
    sort_order: Option<String>,
    session_id: Option<String>,
    firstname: Option<String>,
    lastname: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmployeeSessionFilters {
    pub offset: Option<String>,
    pub limit: Option<String>,
    pub order_by: Option<String>,
    pub sort_order: Option<String>,
    pub session_id: Option<String>,
    pub employee_id: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CustomerSessionFilters {
    pub offset: Option<String>,
    pub limit: Option<String>,
    pub order_by: Option<String>,
    pub sort_order: Option<String>,
    pub session_id: Option<String>,
    pub customer_id: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
}

impl From<EmployeeSessionFilters> for SessionSearch {
    fn from(f: EmployeeSessionFilters) -> Self {
        CommonFilters {
            offset: f.offset,
            limit: f.limit,
            order_by: f.order_by,
            sort_order: f.sort_order,
            session_id: f.session_id,
            firstname: f.firstname,
            lastname: f.lastname,
            email: f.email,
        }
        .resolve(f.employee_id.as_deref(), "employee_id")
    }
}

impl From<CustomerSessionFilters> for SessionSearch {
    fn from(f: CustomerSessionFilters) -> Self {
        CommonFilters {
            offset: f.offset,
            limit: f.limit,
            order_by: f.order_by,
            sort_order: f.sort_order,
            session_id: f.session_id,
            firstname: f.firstname,
            lastname: f.lastname,
            email: f.email,
        }
        .resolve(f.customer_id.as_deref(), "customer_id")
    }
}

fn text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CommonFilters {
    fn resolve(self, owner_id: Option<&str>, owner_column: &str) -> SessionSearch {
        let defaults = SessionSearch::default();

        let limit = self
            .limit
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|v| ALLOWED_LIMITS.contains(v))
            .unwrap_or(defaults.limit);

        let order_by = match self.order_by.as_deref().map(str::trim) {
            Some("session_id") => SessionColumn::SessionId,
            Some(column) if column == owner_column => SessionColumn::OwnerId,
            Some("firstname") => SessionColumn::Firstname,
            Some("lastname") => SessionColumn::Lastname,
            Some("email") => SessionColumn::Email,
            Some("last_activity") => SessionColumn::LastActivity,
            _ => defaults.order_by,
        };

        let sort_order = match self.sort_order.as_deref().map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            Some(v) if v.eq_ignore_ascii_case("desc") => SortOrder::Desc,
            _ => defaults.sort_order,
        };

        SessionSearch {
            offset: self
                .offset
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.offset),
            limit,
            order_by,
            sort_order,
            session_id: self.session_id.and_then(|v| v.trim().parse::<SessionId>().ok()),
            owner_id: owner_id.and_then(|v| v.trim().parse().ok()),
            firstname: text(self.firstname),
            lastname: text(self.lastname),
            email: text(self.email),
        }
    }
}
