//! Router-level tests for the security admin section

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use backoffice_api::{
    auth::{Grants, JwtManager},
    bus::{CommandBus, CommandError, CommandHandler},
    config::{Config, LogFormat, StorageBackend},
    create_router,
    hooks::{HookDispatcher, HOOK_POST_PROCESS_BEFORE, HOOK_POST_PROCESS_GENERAL_BEFORE},
    store::{MemoryStore, SettingsStore, StoreError},
    AppState,
};
use backoffice_shared::{
    Capability, CommandKind, CookieSameSite, SecuritySettings, SessionCommand, SessionId,
    SessionKind, SessionRecord,
};
use serde_json::Value;
use time::OffsetDateTime;
use tower::ServiceExt;

const JWT_SECRET: &str = "integration-jwt-secret-at-least-32-chars";
const FLASH_SECRET: &str = "integration-flash-secret-at-least-32-ch";
const TAG: &str = "AdminSecurity";

const SETTINGS: &str = "/configure/advanced/security";
const EMPLOYEES: &str = "/configure/advanced/security/sessions/employees";
const CUSTOMERS: &str = "/configure/advanced/security/sessions/customers";
const BULK_DELETE: &str = "/configure/advanced/security/sessions/customers/bulk-delete";

// =============================================================================
// Fixtures
// =============================================================================

fn config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".to_string(),
        storage_backend: StorageBackend::Memory,
        database_url: None,
        database_max_connections: 1,
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiry_hours: 1,
        flash_secret: FLASH_SECRET.to_string(),
        resource_tag: TAG.to_string(),
        ssl_enabled: true,
        translations_path: None,
        log_format: LogFormat::Pretty,
    }
}

fn record(id: i64, owner_id: i64, lastname: &str) -> SessionRecord {
    SessionRecord {
        session_id: SessionId::new(id).unwrap(),
        owner_id,
        firstname: "Alex".to_string(),
        lastname: lastname.to_string(),
        email: format!("{}@shop.test", lastname.to_lowercase()),
        last_activity: OffsetDateTime::UNIX_EPOCH,
    }
}

async fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .insert_session(SessionKind::Employee, record(1, 10, "Martin"))
        .await;
    store
        .insert_session(SessionKind::Employee, record(2, 11, "Bernard"))
        .await;
    for id in 1..=3 {
        store
            .insert_session(SessionKind::Customer, record(id, 100 + id, &format!("Client{}", id)))
            .await;
    }
    store
}

fn state(store: &MemoryStore) -> AppState {
    AppState::with_stores(config(), Arc::new(store.clone()))
}

/// Token granting `capabilities` on the tag and `suffixed` on `tag_`
fn token(capabilities: &[Capability], suffixed: &[Capability]) -> String {
    let mut grants = Grants::new();
    grants.insert(TAG.to_string(), capabilities.to_vec());
    grants.insert(format!("{}_", TAG), suffixed.to_vec());
    JwtManager::new(JWT_SECRET, 1)
        .generate_token(1, "admin@shop.test", grants)
        .unwrap()
        .0
}

fn superadmin() -> String {
    token(
        &[
            Capability::Read,
            Capability::Create,
            Capability::Update,
            Capability::Delete,
        ],
        &[Capability::Delete],
    )
}

fn get(uri: &str, token: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, token: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

/// `name=value` of the flash cookie set by a response, if any
fn flash_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("backoffice_flash="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

/// Follow a redirect and return the flash messages the page displays
async fn follow(app: &Router, response: &Response, token: &str) -> Vec<(String, String)> {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = flash_cookie(response);
    let page = json(send(app, get(location(response), token, cookie.as_deref())).await).await;

    page["flashes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| {
            (
                f["level"].as_str().unwrap().to_string(),
                f["message"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

fn success(message: &str) -> (String, String) {
    ("success".to_string(), message.to_string())
}

fn error(message: &str) -> (String, String) {
    ("error".to_string(), message.to_string())
}

/// Records every command and answers with a fixed outcome
struct RecordingHandler {
    seen: Arc<Mutex<Vec<SessionCommand>>>,
    fail_with_store_error: bool,
}

#[async_trait]
impl CommandHandler for RecordingHandler {
    async fn handle(&self, command: SessionCommand) -> Result<(), CommandError> {
        self.seen.lock().unwrap().push(command);
        if self.fail_with_store_error {
            return Err(StoreError::Unavailable("connection reset".to_string()).into());
        }
        Ok(())
    }
}

fn recording_bus(kind: CommandKind, fail: bool) -> (CommandBus, Arc<Mutex<Vec<SessionCommand>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let bus = CommandBus::new().register(
        kind,
        Arc::new(RecordingHandler {
            seen: seen.clone(),
            fail_with_store_error: fail,
        }),
    );
    (bus, seen)
}

// =============================================================================
// Access control
// =============================================================================

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = create_router(state(&MemoryStore::new()));
    let response = send(
        &app,
        Request::builder().uri(SETTINGS).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let app = create_router(state(&MemoryStore::new()));
    let response = send(
        &app,
        Request::builder().uri("/health/ready").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_read_grant_does_not_allow_saving_settings() {
    let store = MemoryStore::new();
    let app = create_router(state(&store));
    let reader = token(&[Capability::Read], &[]);

    assert_eq!(
        send(&app, get(SETTINGS, &reader, None)).await.status(),
        StatusCode::OK
    );

    let response = send(
        &app,
        post(SETTINGS, &reader, "general[back_cookie_lifetime]=5"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json(response).await;
    assert_eq!(body["error"]["message"], "Access denied.");
    assert_eq!(
        store.load_settings().await.unwrap(),
        SecuritySettings::default()
    );
}

#[tokio::test]
async fn test_delete_requires_grant_on_suffixed_tag() {
    let store = seeded_store().await;
    let app = create_router(state(&store));

    // Delete on the plain tag only
    let plain = token(&[Capability::Read, Capability::Delete], &[]);
    let response = send(
        &app,
        post(&format!("{}/1/delete", EMPLOYEES), &plain, ""),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json(response).await;
    assert_eq!(
        body["error"]["message"],
        "You do not have permission to edit this."
    );
    assert!(
        store
            .contains_session(SessionKind::Employee, SessionId::new(1).unwrap())
            .await
    );
}

// =============================================================================
// Settings
// =============================================================================

#[tokio::test]
async fn test_settings_page_shows_persisted_values() {
    let store = MemoryStore::new();
    store
        .save_settings(&SecuritySettings {
            cookie_samesite: CookieSameSite::Strict,
            ..SecuritySettings::default()
        })
        .await
        .unwrap();
    let app = create_router(state(&store));

    let response = send(&app, get(SETTINGS, &superadmin(), None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let page = json(response).await;
    assert_eq!(page["template"], "security/index");
    assert_eq!(page["layout_title"], "Security");
    assert_eq!(page["enable_sidebar"], false);
    assert_eq!(page["layout_header_toolbar_btn"], Value::Array(vec![]));
    assert_eq!(
        page["content"]["general_form"]["fields"]["cookie_samesite"],
        "Strict"
    );
}

#[tokio::test]
async fn test_valid_settings_flash_success_once() {
    let store = MemoryStore::new();
    let app = create_router(state(&store));
    let admin = superadmin();

    let response = send(
        &app,
        post(
            SETTINGS,
            &admin,
            "general[back_cookie_lifetime]=6&general[cookie_samesite]=Strict",
        ),
    )
    .await;
    assert_eq!(location(&response), SETTINGS);

    let cookie = flash_cookie(&response).unwrap();
    assert_eq!(follow(&app, &response, &admin).await, vec![success("Update successful")]);

    let saved = store.load_settings().await.unwrap();
    assert_eq!(saved.back_office_cookie_lifetime_hours, 6);
    assert_eq!(saved.cookie_samesite, CookieSameSite::Strict);

    // The rendered page cleared the cookie
    let shown = send(&app, get(SETTINGS, &admin, Some(&cookie))).await;
    assert_eq!(flash_cookie(&shown).as_deref(), Some("backoffice_flash="));
}

#[tokio::test]
async fn test_invalid_settings_flash_one_error_per_field() {
    let store = MemoryStore::new();
    let app = create_router(state(&store));
    let admin = superadmin();

    let response = send(
        &app,
        post(
            SETTINGS,
            &admin,
            "general[front_cookie_lifetime]=0&general[password_minimum_score]=7",
        ),
    )
    .await;

    let flashes = follow(&app, &response, &admin).await;
    assert_eq!(flashes.len(), 2);
    assert!(flashes.iter().all(|(level, _)| level == "error"));
    assert_eq!(
        store.load_settings().await.unwrap(),
        SecuritySettings::default()
    );
}

#[tokio::test]
async fn test_unsubmitted_form_redirects_silently_after_hooks() {
    let store = MemoryStore::new();
    let fired = Arc::new(Mutex::new(Vec::new()));

    let recorder = {
        let fired = fired.clone();
        move |hook: &str, _: &Value| fired.lock().unwrap().push(hook.to_string())
    };
    let recorder: Arc<dyn backoffice_api::hooks::HookListener> = Arc::new(recorder);
    let hooks = HookDispatcher::new()
        .listen(HOOK_POST_PROCESS_BEFORE, recorder.clone())
        .listen(HOOK_POST_PROCESS_GENERAL_BEFORE, recorder);

    let app = create_router(state(&store).with_hooks(hooks));
    let response = send(&app, post(SETTINGS, &superadmin(), "unrelated=1")).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), SETTINGS);
    assert!(flash_cookie(&response).is_none());
    assert_eq!(
        *fired.lock().unwrap(),
        vec![HOOK_POST_PROCESS_GENERAL_BEFORE, HOOK_POST_PROCESS_BEFORE]
    );
}

// =============================================================================
// Listings
// =============================================================================

#[tokio::test]
async fn test_customer_listing_page() {
    let store = seeded_store().await;
    let app = create_router(state(&store));

    let response = send(
        &app,
        get(&format!("{}?limit=10&order_by=lastname&sort_order=asc", CUSTOMERS), &superadmin(), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let page = json(response).await;
    assert_eq!(page["template"], "security/customers");
    assert_eq!(page["layout_title"], "Customers Sessions");
    assert_eq!(page["enable_sidebar"], true);

    let grid = &page["content"]["grid"];
    assert_eq!(grid["records_total"], 3);
    assert_eq!(grid["records"][0]["lastname"], "Client1");
    assert_eq!(
        grid["bulk_actions"][0]["field"],
        "security_sessions_customers_bulk[]"
    );
}

#[tokio::test]
async fn test_employee_listing_filters() {
    let store = seeded_store().await;
    let app = create_router(state(&store));

    let page = json(
        send(
            &app,
            get(&format!("{}?email=MARTIN", EMPLOYEES), &superadmin(), None),
        )
        .await,
    )
    .await;

    assert_eq!(page["template"], "security/employees");
    assert_eq!(page["layout_title"], "Employees Sessions");
    assert_eq!(page["content"]["grid"]["records_total"], 1);
    assert_eq!(page["content"]["grid"]["records"][0]["owner_id"], 10);
}

// =============================================================================
// Deletion
// =============================================================================

#[tokio::test]
async fn test_delete_employee_session() {
    let store = seeded_store().await;
    let app = create_router(state(&store));
    let admin = superadmin();

    let response = send(&app, post(&format!("{}/2/delete", EMPLOYEES), &admin, "")).await;
    assert_eq!(location(&response), EMPLOYEES);
    assert_eq!(follow(&app, &response, &admin).await, vec![success("Successful deletion")]);
    assert!(
        !store
            .contains_session(SessionKind::Employee, SessionId::new(2).unwrap())
            .await
    );
}

#[tokio::test]
async fn test_delete_missing_customer_session_flashes_not_found() {
    let store = seeded_store().await;
    let app = create_router(state(&store));
    let admin = superadmin();

    let response = send(&app, post(&format!("{}/42/delete", CUSTOMERS), &admin, "")).await;
    assert_eq!(location(&response), CUSTOMERS);
    assert_eq!(
        follow(&app, &response, &admin).await,
        vec![error("The object cannot be loaded (or found)")]
    );
    assert_eq!(store.session_count(SessionKind::Customer).await, 3);
}

#[tokio::test]
async fn test_non_positive_session_id_is_bad_request() {
    let app = create_router(state(&seeded_store().await));
    for id in ["0", "-4", "abc"] {
        let response = send(
            &app,
            post(&format!("{}/{}/delete", EMPLOYEES, id), &superadmin(), ""),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "id {}", id);
    }
}

#[tokio::test]
async fn test_bulk_delete_customer_sessions() {
    let store = seeded_store().await;
    let app = create_router(state(&store));
    let admin = superadmin();

    let response = send(
        &app,
        post(
            BULK_DELETE,
            &admin,
            "security_sessions_customers_bulk[]=1&security_sessions_customers_bulk[]=3",
        ),
    )
    .await;

    assert_eq!(location(&response), CUSTOMERS);
    assert_eq!(follow(&app, &response, &admin).await, vec![success("Successful deletion")]);
    assert_eq!(store.session_count(SessionKind::Customer).await, 1);
    assert!(
        store
            .contains_session(SessionKind::Customer, SessionId::new(2).unwrap())
            .await
    );
}

#[tokio::test]
async fn test_bulk_delete_with_unknown_id_deletes_nothing() {
    let store = seeded_store().await;
    let app = create_router(state(&store));
    let admin = superadmin();

    let response = send(
        &app,
        post(
            BULK_DELETE,
            &admin,
            "security_sessions_customers_bulk[]=1&security_sessions_customers_bulk[]=99",
        ),
    )
    .await;

    let flashes = follow(&app, &response, &admin).await;
    assert_eq!(flashes.len(), 1);
    assert_eq!(flashes[0].0, "error");
    assert!(flashes[0]
        .1
        .starts_with("An unexpected error occurred. [CannotBulkDeleteSessions code"));
    assert_eq!(store.session_count(SessionKind::Customer).await, 3);
}

#[tokio::test]
async fn test_bulk_delete_without_selection_still_dispatches() {
    let store = seeded_store().await;
    let (bus, seen) = recording_bus(CommandKind::BulkDeleteCustomerSessions, false);
    let app = create_router(state(&store).with_bus(bus));
    let admin = superadmin();

    let response = send(&app, post(BULK_DELETE, &admin, "")).await;

    assert_eq!(location(&response), CUSTOMERS);
    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    match &seen[0] {
        SessionCommand::BulkDeleteCustomerSessions(command) => {
            assert!(command.session_ids().is_empty())
        }
        other => panic!("Unexpected command {:?}", other),
    }
}

#[tokio::test]
async fn test_scalar_bulk_field_is_bad_request() {
    let store = seeded_store().await;
    let (bus, seen) = recording_bus(CommandKind::BulkDeleteCustomerSessions, false);
    let app = create_router(state(&store).with_bus(bus));

    let response = send(
        &app,
        post(BULK_DELETE, &superadmin(), "security_sessions_customers_bulk=2"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_other_failures_propagate_without_redirect() {
    let store = seeded_store().await;
    let (bus, seen) = recording_bus(CommandKind::DeleteEmployeeSession, true);
    let app = create_router(state(&store).with_bus(bus));

    let response = send(
        &app,
        post(&format!("{}/1/delete", EMPLOYEES), &superadmin(), ""),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.headers().get(header::LOCATION).is_none());
    assert!(flash_cookie(&response).is_none());
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_tampered_flash_cookie_is_ignored() {
    let store = seeded_store().await;
    let app = create_router(state(&store));
    let admin = superadmin();

    let response = send(&app, post(&format!("{}/1/delete", EMPLOYEES), &admin, "")).await;
    let cookie = flash_cookie(&response).unwrap();
    let (name_payload, _) = cookie.rsplit_once('.').unwrap();
    let forged = format!("{}.{}", name_payload, "00".repeat(32));

    let page = json(send(&app, get(EMPLOYEES, &admin, Some(&forged))).await).await;
    assert_eq!(page["flashes"], Value::Array(vec![]));
}
