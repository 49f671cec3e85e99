//! HTTP routes

pub mod health;
pub mod security;

use axum::{middleware, routing::get, routing::post, Router};
use tower_http::trace::TraceLayer;

use crate::{auth::require_auth, security::security_headers_middleware, state::AppState};

use self::security::{
    CUSTOMER_SESSIONS_BULK_DELETE_PATH, CUSTOMER_SESSIONS_PATH, CUSTOMER_SESSION_DELETE_PATH,
    EMPLOYEE_SESSIONS_PATH, EMPLOYEE_SESSION_DELETE_PATH, SETTINGS_PATH,
};

/// Create all routes
pub fn create_router(state: AppState) -> Router {
    // Health check routes (no auth, for infrastructure monitoring)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    // Back-office routes; each handler checks its own access rule
    let admin_routes = Router::new()
        .route(
            SETTINGS_PATH,
            get(security::show_settings).post(security::submit_settings),
        )
        .route(EMPLOYEE_SESSIONS_PATH, get(security::list_employee_sessions))
        .route(CUSTOMER_SESSIONS_PATH, get(security::list_customer_sessions))
        .route(
            EMPLOYEE_SESSION_DELETE_PATH,
            post(security::delete_employee_session),
        )
        .route(
            CUSTOMER_SESSION_DELETE_PATH,
            post(security::delete_customer_session),
        )
        .route(
            CUSTOMER_SESSIONS_BULK_DELETE_PATH,
            post(security::bulk_delete_customer_sessions),
        )
        .route_layer(middleware::from_fn_with_state(state.jwt.clone(), require_auth));

    Router::new()
        .merge(health_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
