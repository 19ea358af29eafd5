//! # Request Handlers
//!
//! Axum request handlers for the storefront.
//! The pay control runs server-side here: each `POST /pay` drives a fresh
//! `SessionInitiator`, and the return pages ask the `SessionVerifier`.

use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Form, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use pay_core::{Activation, PaymentError, PaymentSession, SessionStatus, WebhookPayload};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

/// Cookie remembering the last created session for the return page
pub const SESSION_COOKIE: &str = "chainpe_session";

// =============================================================================
// Request/Response Types
// =============================================================================

/// Pay form submitted by the shopper
#[derive(Debug, Deserialize)]
pub struct PayForm {
    /// Amount in USDC as typed
    pub amount: String,
    /// Optional merchant order id; generated when blank
    #[serde(default)]
    pub order_id: Option<String>,
}

/// Query string on the return pages
#[derive(Debug, Deserialize)]
pub struct ReturnParams {
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, kind: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            kind: kind.into(),
            code,
            retryable: None,
        }
    }
}

fn payment_error_to_response(err: &PaymentError) -> (StatusCode, Json<ErrorResponse>) {
    let code = err.status_code();
    let mut response = ErrorResponse::new(err.message(), err.kind(), code);
    response.retryable = Some(err.is_retryable());
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "pay-storefront",
        "provider": state.gateway.provider_name(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Storefront page with the pay control
pub async fn pay_page() -> Html<&'static str> {
    Html(PAY_PAGE)
}

/// Create a payment session and send the shopper to checkout
#[instrument(skip(state, form))]
pub async fn pay(
    State(state): State<AppState>,
    Form(form): Form<PayForm>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    // Unparseable input goes through the same validation path as a bad amount
    let amount = form.amount.trim().parse::<f64>().unwrap_or(f64::NAN);
    let config = state.integration_config(amount, form.order_id);

    let initiator = state.initiator();
    let activation = initiator.activate(&config).await.map_err(|e| {
        error!("Failed to create payment session: {}", e);
        payment_error_to_response(&e)
    })?;

    match activation {
        Activation::Redirect(session) => {
            let checkout_url = session
                .redirect_target()
                .map_err(|e| payment_error_to_response(&e))?;
            info!(
                "Redirecting shopper to checkout: session={}",
                session.session_id
            );

            let mut response = Redirect::to(checkout_url).into_response();
            if let Ok(cookie) = HeaderValue::from_str(&format!(
                "{}={}; Path=/checkout; HttpOnly; SameSite=Lax",
                SESSION_COOKIE, session.session_id
            )) {
                response.headers_mut().insert(header::SET_COOKIE, cookie);
            }
            Ok(response)
        }
        Activation::Ignored(phase) => Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse::new(
                format!("Payment control is {}", phase),
                "busy",
                409,
            )),
        )),
    }
}

/// Session id from the query string, falling back to the session cookie
fn return_session_id(params: &ReturnParams, headers: &HeaderMap) -> Option<String> {
    params
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .or_else(|| session_cookie(headers))
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|id| !id.is_empty())
}

/// Return page: verify the session and show its status
#[instrument(skip(state, params, headers))]
pub async fn checkout_success(
    State(state): State<AppState>,
    Query(params): Query<ReturnParams>,
    headers: HeaderMap,
) -> (StatusCode, Html<String>) {
    let Some(session_id) = return_session_id(&params, &headers) else {
        return (
            StatusCode::BAD_REQUEST,
            Html(result_page("❔", "Unknown payment", "No payment session to verify.")),
        );
    };

    match state.verifier.verify(&session_id).await {
        Ok(session) => {
            info!("Return page: session={} status={}", session.session_id, session.status);
            (StatusCode::OK, Html(status_page(&session)))
        }
        Err(e) => {
            error!("Return page verification failed: {}", e);
            let code = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
            (
                code,
                Html(result_page(
                    "⚠️",
                    "Could not verify payment",
                    &format!(
                        "Session <code>{}</code>: {}",
                        escape_html(&session_id),
                        escape_html(&e.message())
                    ),
                )),
            )
        }
    }
}

/// Checkout cancel page
pub async fn checkout_cancel() -> Html<String> {
    Html(result_page("❌", "Payment Cancelled", "No charges were made."))
}

/// Current snapshot of a session, for polling from the page
#[instrument(skip(state))]
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<PaymentSession>, (StatusCode, Json<ErrorResponse>)> {
    state
        .verifier
        .verify(&session_id)
        .await
        .map(Json)
        .map_err(|e| payment_error_to_response(&e))
}

/// Handle the gateway's `payment.success` webhook.
///
/// The payload is unsigned, so it only triggers a verify call; the status
/// reported by the API decides what happens.
#[instrument(skip(state, headers, body))]
pub async fn chainpe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let payload: WebhookPayload = serde_json::from_slice(&body).map_err(|e| {
        warn!("Unparseable webhook payload: {}", e);
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                format!("Invalid webhook payload: {}", e),
                "validation_error",
                400,
            )),
        )
    })?;

    let header_event = headers
        .get("x-webhook-event")
        .and_then(|v| v.to_str().ok());
    if let Some(event) = header_event {
        if event != payload.event {
            warn!(
                "Webhook header event {:?} differs from payload event {:?}",
                event, payload.event
            );
        }
    }

    info!(
        "Received webhook: event={}, session={}",
        payload.event, payload.session_id
    );

    let session = state
        .verifier
        .verify(&payload.session_id)
        .await
        .map_err(|e| {
            error!("Webhook session verification failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new(e.message(), e.kind(), 502)),
            )
        })?;

    if payload.is_payment_success() && session.status == SessionStatus::Completed {
        info!(
            "Payment confirmed: session={}, order={:?}, tx={:?}",
            session.session_id, session.order_id, session.tx_hash
        );
    } else {
        warn!(
            "Webhook {} for session {} not confirmed, API reports {}",
            payload.event, session.session_id, session.status
        );
    }

    Ok(Json(serde_json::json!({
        "received": true,
        "session_id": session.session_id,
        "status": session.status,
    })))
}

// =============================================================================
// Pages
// =============================================================================

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn status_page(session: &PaymentSession) -> String {
    let (icon, title, note) = match session.status {
        SessionStatus::Completed => ("✅", "Payment Successful!", "Your payment was received."),
        SessionStatus::Created | SessionStatus::Pending => (
            "⏳",
            "Payment Processing",
            "We have not seen your payment settle yet. This page can be refreshed.",
        ),
        SessionStatus::Failed => ("❌", "Payment Failed", "No charges were made."),
        SessionStatus::Expired => ("⌛", "Payment Expired", "The checkout session has expired."),
    };

    let mut body = format!(
        "<p>Session: <code>{}</code></p><p>Status: <strong>{}</strong></p><p>Amount: {:.2} USDC</p>",
        escape_html(&session.session_id),
        session.status,
        session.amount_usdc
    );
    if let Some(order_id) = &session.order_id {
        body.push_str(&format!("<p>Order: <code>{}</code></p>", escape_html(order_id)));
    }
    if let Some(tx_hash) = &session.tx_hash {
        body.push_str(&format!("<p>Transaction: <code>{}</code></p>", escape_html(tx_hash)));
    }
    body.push_str(&format!(r#"<p style="color: #666;">{}</p>"#, note));

    result_page(icon, title, &body)
}

fn result_page(icon: &str, title: &str, body: &str) -> String {
    format!(
        r#"
<!DOCTYPE html>
<html>
<head><title>{title}</title></head>
<body style="font-family: system-ui; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);">
    <div style="background: white; padding: 60px; border-radius: 16px; text-align: center;">
        <div style="font-size: 60px;">{icon}</div>
        <h1>{title}</h1>
        {body}
    </div>
</body>
</html>
"#
    )
}

const PAY_PAGE: &str = r#"
<!DOCTYPE html>
<html>
<head><title>Checkout</title></head>
<body style="font-family: system-ui; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0; background: #f5f5f7;">
    <form method="post" action="/pay" style="background: white; padding: 40px; border-radius: 16px; display: grid; gap: 12px;"
          onsubmit="this.querySelector('button').disabled = true; this.querySelector('button').textContent = 'Processing...';">
        <label>Amount (USDC) <input name="amount" type="number" step="0.01" min="0.01" value="50.00" required></label>
        <label>Order ID (optional) <input name="order_id" type="text" placeholder="ORDER-123"></label>
        <button type="submit" style="background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; border: none; padding: 12px 24px; font-size: 16px; font-weight: 600; border-radius: 8px; cursor: pointer;">
            Pay with ChainPe
        </button>
    </form>
</body>
</html>
"#;
