//! Configure > Advanced parameters > Security
//!
//! Settings page, employee and customer session listings, and session
//! deletion. Every mutating action dispatches a command, reports the outcome
//! as a flash message and redirects to a listing.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    response::Redirect,
};
use backoffice_shared::{
    BulkDeleteCustomerSessionsCommand, Capability, DeleteCustomerSessionCommand,
    DeleteEmployeeSessionCommand, InvalidSessionId, SessionCommand, SessionError,
    SessionErrorKind, SessionId,
};
use serde_json::json;

use crate::auth::{AccessRule, Granted};
use crate::bus::CommandError;
use crate::error::{ApiError, ApiResult};
use crate::flash::Flashes;
use crate::grid::{CustomerSessionFilters, EmployeeSessionFilters};
use crate::hooks::{HOOK_POST_PROCESS_BEFORE, HOOK_POST_PROCESS_GENERAL_BEFORE};
use crate::i18n::Translator;
use crate::render::Page;
use crate::state::AppState;

pub const SETTINGS_PATH: &str = "/configure/advanced/security";
pub const EMPLOYEE_SESSIONS_PATH: &str = "/configure/advanced/security/sessions/employees";
pub const CUSTOMER_SESSIONS_PATH: &str = "/configure/advanced/security/sessions/customers";
pub const EMPLOYEE_SESSION_DELETE_PATH: &str =
    "/configure/advanced/security/sessions/employees/:session_id/delete";
pub const CUSTOMER_SESSION_DELETE_PATH: &str =
    "/configure/advanced/security/sessions/customers/:session_id/delete";
pub const CUSTOMER_SESSIONS_BULK_DELETE_PATH: &str =
    "/configure/advanced/security/sessions/customers/bulk-delete";

const SUCCESS_DOMAIN: &str = "Admin.Notifications.Success";
const ERROR_DOMAIN: &str = "Admin.Notifications.Error";
const MENU_DOMAIN: &str = "Admin.Navigation.Menu";

// =============================================================================
// Access rules
// =============================================================================

pub struct CanRead;

impl AccessRule for CanRead {
    const CAPABILITIES: &'static [Capability] = &[Capability::Read];
}

pub struct CanUpdateSettings;

impl AccessRule for CanUpdateSettings {
    const CAPABILITIES: &'static [Capability] =
        &[Capability::Update, Capability::Create, Capability::Delete];
}

/// Session deletion is granted on its own permission key
pub struct CanDeleteSessions;

impl AccessRule for CanDeleteSessions {
    const CAPABILITIES: &'static [Capability] = &[Capability::Delete];
    const TAG_SUFFIX: &'static str = "_";
    const DENIED_MESSAGE: &'static str = "You do not have permission to edit this.";
}

// =============================================================================
// Error messages
// =============================================================================

/// User-facing messages keyed by session error kind
struct ErrorMessages {
    entries: &'static [(SessionErrorKind, &'static str)],
    /// Used for any kind without an entry, followed by `[<kind> code <n>]`
    default: &'static str,
}

const SESSION_ERROR_MESSAGES: ErrorMessages = ErrorMessages {
    entries: &[(
        SessionErrorKind::NotFound,
        "The object cannot be loaded (or found)",
    )],
    default: "An unexpected error occurred.",
};

pub fn session_error_message(err: &SessionError, translator: &Translator) -> String {
    let kind = err.kind();
    let table = &SESSION_ERROR_MESSAGES;
    match table.entries.iter().find(|(k, _)| *k == kind) {
        Some((_, message)) => translator.trans(message, ERROR_DOMAIN),
        None => format!(
            "{} [{} code {}]",
            translator.trans(table.default, ERROR_DOMAIN),
            kind.name(),
            kind.code()
        ),
    }
}

/// Dispatch a deletion and queue its outcome.
///
/// Only session errors become flash messages; anything else propagates.
async fn dispatch_deletion(
    state: &AppState,
    flashes: &mut Flashes,
    command: SessionCommand,
) -> ApiResult<()> {
    match state.bus.handle(command).await {
        Ok(()) => flashes.success(state.translator.trans("Successful deletion", SUCCESS_DOMAIN)),
        Err(CommandError::Session(err)) => {
            flashes.error(session_error_message(&err, &state.translator))
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

fn parse_session_id(raw: &str) -> ApiResult<SessionId> {
    raw.trim()
        .parse()
        .map_err(|e: InvalidSessionId| ApiError::BadRequest(e.to_string()))
}

/// Read the selected ids of a bulk action.
///
/// Accepts `field[]=1&field[]=2` and indexed `field[0]=1`. A missing field is
/// an empty selection; a scalar `field=1` or a non-positive id is rejected.
fn bulk_session_ids(body: &[u8], field: &str) -> ApiResult<Vec<SessionId>> {
    let name = field.trim_end_matches("[]");
    let mut ids = Vec::new();

    for (key, value) in url::form_urlencoded::parse(body) {
        if key == name {
            return Err(ApiError::BadRequest(format!("{} must be a list", field)));
        }
        let is_entry = key
            .strip_prefix(name)
            .and_then(|rest| rest.strip_prefix('['))
            .and_then(|rest| rest.strip_suffix(']'))
            .map_or(false, |index| index.chars().all(|c| c.is_ascii_digit()));
        if is_entry {
            ids.push(parse_session_id(&value)?);
        }
    }

    Ok(ids)
}

// =============================================================================
// Settings
// =============================================================================

/// Show the settings page
pub async fn show_settings(
    State(state): State<AppState>,
    _granted: Granted<CanRead>,
    mut flashes: Flashes,
) -> ApiResult<(Flashes, Page)> {
    let form = state.general_form.get_form().await?;

    let page = Page::new(
        "security/index",
        state.translator.trans("Security", MENU_DOMAIN),
    )
    .with_flashes(flashes.take())
    .with_content(json!({ "general_form": form.view() }));

    Ok((flashes, page))
}

/// Save the general settings form
pub async fn submit_settings(
    State(state): State<AppState>,
    granted: Granted<CanUpdateSettings>,
    mut flashes: Flashes,
    body: Bytes,
) -> ApiResult<(Flashes, Redirect)> {
    let params = json!({
        "controller": "AdminSecurity",
        "employee_id": granted.user.employee_id,
    });
    state.hooks.dispatch(HOOK_POST_PROCESS_GENERAL_BEFORE, &params);
    state.hooks.dispatch(HOOK_POST_PROCESS_BEFORE, &params);

    let mut form = state.general_form.get_form().await?;
    form.handle_request(&body);

    if form.is_submitted() {
        let errors = state.general_form.save(form.data()).await?;
        if errors.is_empty() {
            tracing::info!(
                employee_id = granted.user.employee_id,
                form = form.name(),
                "Settings saved"
            );
            flashes.success(state.translator.trans("Update successful", SUCCESS_DOMAIN));
        } else {
            for error in errors {
                flashes.error(error.message);
            }
        }
    }

    Ok((flashes, Redirect::to(SETTINGS_PATH)))
}

// =============================================================================
// Session listings
// =============================================================================

pub async fn list_employee_sessions(
    State(state): State<AppState>,
    _granted: Granted<CanRead>,
    mut flashes: Flashes,
    Query(filters): Query<EmployeeSessionFilters>,
) -> ApiResult<(Flashes, Page)> {
    let grid = state.employee_grid.get_grid(filters).await?;

    let page = Page::new(
        "security/employees",
        state.translator.trans("Employees Sessions", MENU_DOMAIN),
    )
    .with_sidebar()
    .with_flashes(flashes.take())
    .with_content(json!({ "grid": grid }));

    Ok((flashes, page))
}

pub async fn list_customer_sessions(
    State(state): State<AppState>,
    _granted: Granted<CanRead>,
    mut flashes: Flashes,
    Query(filters): Query<CustomerSessionFilters>,
) -> ApiResult<(Flashes, Page)> {
    let grid = state.customer_grid.get_grid(filters).await?;

    let page = Page::new(
        "security/customers",
        state.translator.trans("Customers Sessions", MENU_DOMAIN),
    )
    .with_sidebar()
    .with_flashes(flashes.take())
    .with_content(json!({ "grid": grid }));

    Ok((flashes, page))
}

// =============================================================================
// Session deletion
// =============================================================================

pub async fn delete_employee_session(
    State(state): State<AppState>,
    _granted: Granted<CanDeleteSessions>,
    mut flashes: Flashes,
    Path(session_id): Path<String>,
) -> ApiResult<(Flashes, Redirect)> {
    let session_id = parse_session_id(&session_id)?;

    dispatch_deletion(
        &state,
        &mut flashes,
        DeleteEmployeeSessionCommand::new(session_id).into(),
    )
    .await?;

    Ok((flashes, Redirect::to(EMPLOYEE_SESSIONS_PATH)))
}

pub async fn delete_customer_session(
    State(state): State<AppState>,
    _granted: Granted<CanDeleteSessions>,
    mut flashes: Flashes,
    Path(session_id): Path<String>,
) -> ApiResult<(Flashes, Redirect)> {
    let session_id = parse_session_id(&session_id)?;

    dispatch_deletion(
        &state,
        &mut flashes,
        DeleteCustomerSessionCommand::new(session_id).into(),
    )
    .await?;

    Ok((flashes, Redirect::to(CUSTOMER_SESSIONS_PATH)))
}

pub async fn bulk_delete_customer_sessions(
    State(state): State<AppState>,
    _granted: Granted<CanDeleteSessions>,
    mut flashes: Flashes,
    body: Bytes,
) -> ApiResult<(Flashes, Redirect)> {
    let ids = bulk_session_ids(&body, &state.customer_grid.bulk_field())?;

    dispatch_deletion(
        &state,
        &mut flashes,
        BulkDeleteCustomerSessionsCommand::new(ids).into(),
    )
    .await?;

    Ok((flashes, Redirect::to(CUSTOMER_SESSIONS_PATH)))
}
