//! Session listing grids

pub mod filters;

use std::sync::Arc;

use backoffice_shared::{SessionKind, SessionRecord};
use serde::Serialize;

use crate::routes::security::{
    CUSTOMER_SESSIONS_BULK_DELETE_PATH, CUSTOMER_SESSION_DELETE_PATH,
    EMPLOYEE_SESSION_DELETE_PATH,
};
use crate::store::{SessionSearch, SessionStore, StoreError};

pub use filters::{CustomerSessionFilters, EmployeeSessionFilters};

#[derive(Debug, Clone, Serialize)]
pub struct GridColumn {
    pub id: &'static str,
    pub name: &'static str,
    pub sortable: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GridAction {
    pub id: &'static str,
    pub name: &'static str,
    /// Route template; `:session_id` is substituted per row
    pub route: &'static str,
    /// Body field carrying the selected ids, for bulk actions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Grid {
    pub id: &'static str,
    pub name: &'static str,
    pub columns: Vec<GridColumn>,
    pub row_actions: Vec<GridAction>,
    pub bulk_actions: Vec<GridAction>,
    pub records: Vec<SessionRecord>,
    pub records_total: u64,
    pub filters: SessionSearch,
}

/// Builds the grid for one kind of session
#[derive(Clone)]
pub struct SessionGridFactory {
    kind: SessionKind,
    store: Arc<dyn SessionStore>,
}

impl SessionGridFactory {
    pub fn new(kind: SessionKind, store: Arc<dyn SessionStore>) -> Self {
        Self { kind, store }
    }

    pub fn grid_id(&self) -> &'static str {
        match self.kind {
            SessionKind::Employee => "security_sessions_employees",
            SessionKind::Customer => "security_sessions_customers",
        }
    }

    /// Body field the bulk action posts selected ids under
    pub fn bulk_field(&self) -> String {
        format!("{}_bulk[]", self.grid_id())
    }

    fn columns(&self) -> Vec<GridColumn> {
        let (owner_id, owner_name) = match self.kind {
            SessionKind::Employee => ("employee_id", "Employee ID"),
            SessionKind::Customer => ("customer_id", "Customer ID"),
        };
        let column = |id, name| GridColumn {
            id,
            name,
            sortable: true,
        };

        vec![
            column("session_id", "ID"),
            column(owner_id, owner_name),
            column("firstname", "First name"),
            column("lastname", "Last name"),
            column("email", "Email"),
            column("last_activity", "Last activity"),
        ]
    }

    fn row_actions(&self) -> Vec<GridAction> {
        let route = match self.kind {
            SessionKind::Employee => EMPLOYEE_SESSION_DELETE_PATH,
            SessionKind::Customer => CUSTOMER_SESSION_DELETE_PATH,
        };
        vec![GridAction {
            id: "delete",
            name: "Delete",
            route,
            field: None,
        }]
    }

    fn bulk_actions(&self) -> Vec<GridAction> {
        match self.kind {
            SessionKind::Employee => Vec::new(),
            SessionKind::Customer => vec![GridAction {
                id: "delete_selection",
                name: "Delete selected",
                route: CUSTOMER_SESSIONS_BULK_DELETE_PATH,
                field: Some(self.bulk_field()),
            }],
        }
    }

    pub async fn get_grid(&self, filters: impl Into<SessionSearch>) -> Result<Grid, StoreError> {
        let search = filters.into();
        let page = self.store.search_sessions(self.kind, &search).await?;

        tracing::debug!(
            kind = %self.kind,
            total = page.total,
            returned = page.records.len(),
            "Session grid built"
        );

        Ok(Grid {
            id: self.grid_id(),
            name: match self.kind {
                SessionKind::Employee => "Employee sessions",
                SessionKind::Customer => "Customer sessions",
            },
            columns: self.columns(),
            row_actions: self.row_actions(),
            bulk_actions: self.bulk_actions(),
            records: page.records,
            records_total: page.total,
            filters: search,
        })
    }
}
