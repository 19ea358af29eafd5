//! # Wire Contract
//!
//! Request body, error body and response classification for the sessions API.
//!
//! ```text
//! POST /api/sessions/create        X-API-Key: <key>   -> PaymentSession
//! GET  /api/sessions/{session_id}  X-API-Key: <key>   -> PaymentSession
//! ```

use crate::error::{PaymentError, PaymentResult};
use crate::session::{IntegrationConfig, PaymentSession};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Credential header sent with every request
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Path of the create-session endpoint
pub const CREATE_SESSION_PATH: &str = "/api/sessions/create";

/// Path prefix of the per-session read endpoint
pub const SESSIONS_PATH: &str = "/api/sessions";

const GENERIC_REJECTION: &str = "Failed to create payment session";

/// JSON body of a create-session request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub amount_usdc: f64,
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl CreateSessionRequest {
    /// Build the body for one activation, resolving the order id
    pub fn from_config(config: &IntegrationConfig) -> Self {
        Self {
            amount_usdc: config.amount,
            order_id: config.resolve_order_id(),
            success_url: config.success_url.clone(),
            cancel_url: config.cancel_url.clone(),
            metadata: config.metadata.clone(),
        }
    }
}

/// Error body returned on 4xx/5xx
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorBody {
    /// `detail` as text. FastAPI validation errors carry a list here.
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::String(_) | Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

fn detail_of(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail_text())
}

/// Turn an HTTP status and body into a session or a typed error.
///
/// - 2xx with a well-formed body is the only success.
/// - 2xx with anything else is a `Protocol` error carrying the raw body.
/// - 4xx is `Rejected` with the server `detail` verbatim when present.
/// - 5xx and other statuses are `Transport`.
pub fn decode_session_response(status: u16, body: &str) -> PaymentResult<PaymentSession> {
    match status {
        200..=299 => serde_json::from_str::<PaymentSession>(body).map_err(|e| {
            PaymentError::protocol(
                format!("Malformed session response: {}", e),
                Some(body.to_string()),
            )
        }),
        400..=499 => Err(PaymentError::Rejected {
            status,
            message: detail_of(body).unwrap_or_else(|| GENERIC_REJECTION.to_string()),
        }),
        _ => Err(PaymentError::Transport(match detail_of(body) {
            Some(detail) => format!("HTTP {}: {}", status, detail),
            None => format!("HTTP {}", status),
        })),
    }
}

/// Like [`decode_session_response`], but also requires what a redirect needs:
/// a non-empty `session_id` and an absolute `checkout_url`.
///
/// Shape failures keep the body exactly as received in `raw`.
pub fn decode_created_session(status: u16, body: &str) -> PaymentResult<PaymentSession> {
    let session = decode_session_response(status, body)?;
    match session.redirect_target() {
        Ok(_) => Ok(session),
        Err(PaymentError::Protocol { message, .. }) => {
            Err(PaymentError::protocol(message, Some(body.to_string())))
        }
        Err(other) => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStatus;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let config = IntegrationConfig::new("key", 50.0).with_order_id("o1");
        let body = serde_json::to_value(CreateSessionRequest::from_config(&config)).unwrap();

        assert_eq!(body, json!({"amount_usdc": 50.0, "order_id": "o1"}));

        let config = config
            .with_success_url("https://shop/ok")
            .with_cancel_url("https://shop/cart")
            .with_metadata_entry("customer_email", "a@example.com");
        let body = serde_json::to_value(CreateSessionRequest::from_config(&config)).unwrap();
        assert_eq!(body["success_url"], "https://shop/ok");
        assert_eq!(body["cancel_url"], "https://shop/cart");
        assert_eq!(body["metadata"]["customer_email"], "a@example.com");
    }

    #[test]
    fn test_decode_success() {
        let body = r#"{"session_id":"s1","amount_usdc":50,"order_id":"o1","status":"created","checkout_url":"https://pay/x"}"#;
        let session = decode_session_response(201, body).unwrap();

        assert_eq!(session.session_id, "s1");
        assert_eq!(session.amount_usdc, 50.0);
        assert_eq!(session.order_id.as_deref(), Some("o1"));
        assert_eq!(session.status, SessionStatus::Created);
        assert_eq!(session.checkout_url.as_deref(), Some("https://pay/x"));
    }

    #[test]
    fn test_decode_malformed_success() {
        let err = decode_session_response(200, r#"{"checkout_url":"https://pay/x"}"#).unwrap_err();
        match err {
            PaymentError::Protocol { raw, .. } => {
                assert_eq!(raw.as_deref(), Some(r#"{"checkout_url":"https://pay/x"}"#))
            }
            other => panic!("expected protocol error, got {:?}", other),
        }

        let err = decode_session_response(200, "<html>oops</html>").unwrap_err();
        assert_eq!(err.kind(), "protocol_error");
    }

    #[test]
    fn test_decode_created_keeps_raw_body() {
        let body = r#"{"session_id":"s1","amount_usdc":50,"order_id":"o1","status":"created","checkout":"https://pay/x"}"#;

        // A lookup may omit checkout_url, a creation may not
        assert!(decode_session_response(200, body).is_ok());

        match decode_created_session(200, body).unwrap_err() {
            PaymentError::Protocol { message, raw } => {
                assert!(message.contains("checkout_url"));
                assert_eq!(raw.as_deref(), Some(body));
            }
            other => panic!("expected protocol error, got {:?}", other),
        }

        let ok = r#"{"session_id":"s1","amount_usdc":50,"order_id":"o1","status":"created","checkout_url":"https://pay/x"}"#;
        assert_eq!(decode_created_session(201, ok).unwrap().session_id, "s1");

        let err = decode_created_session(402, r#"{"detail":"insufficient balance"}"#).unwrap_err();
        assert_eq!(err.kind(), "rejected_error");
    }

    #[test]
    fn test_decode_rejected() {
        let err = decode_session_response(402, r#"{"detail":"insufficient balance"}"#).unwrap_err();
        assert_eq!(
            err,
            PaymentError::Rejected {
                status: 402,
                message: "insufficient balance".into()
            }
        );

        let err = decode_session_response(401, "").unwrap_err();
        assert_eq!(err.message(), GENERIC_REJECTION);

        let err = decode_session_response(422, r#"{"detail":[{"loc":["body","amount_usdc"]}]}"#)
            .unwrap_err();
        assert!(err.message().contains("amount_usdc"));
    }

    #[test]
    fn test_decode_server_error_is_transport() {
        let err = decode_session_response(503, r#"{"detail":"maintenance"}"#).unwrap_err();
        assert_eq!(err, PaymentError::Transport("HTTP 503: maintenance".into()));

        let err = decode_session_response(500, "").unwrap_err();
        assert_eq!(err, PaymentError::Transport("HTTP 500".into()));
    }
}
