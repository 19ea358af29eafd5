//! # Routes
//!
//! Axum router configuration for the storefront.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Storefront:
///   - GET  / - Page with the pay control
///   - POST /pay - Create a payment session, 303 to checkout
///
/// - Return pages:
///   - GET /checkout/success - Verify and show the session status
///   - GET /checkout/cancel - Cancel page
///
/// - API:
///   - GET /api/v1/sessions/{session_id} - Session snapshot as JSON
///
/// - Webhooks:
///   - POST /webhook/chainpe - `payment.success` notification
pub fn create_router(state: AppState) -> Router {
    // Read-only status endpoint may be polled from other origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let checkout_routes = Router::new()
        .route("/success", get(handlers::checkout_success))
        .route("/cancel", get(handlers::checkout_cancel));

    let api_routes = Router::new()
        .route("/sessions/{session_id}", get(handlers::get_session))
        .layer(cors);

    let webhook_routes = Router::new().route("/chainpe", post(handlers::chainpe_webhook));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::pay_page))
        .route("/pay", post(handlers::pay))
        .nest("/checkout", checkout_routes)
        .nest("/api/v1", api_routes)
        .nest("/webhook", webhook_routes)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
