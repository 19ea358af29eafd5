//! # Session Verifier
//!
//! Stateless status lookup used on the merchant's return page. Every call is
//! one request and a fresh snapshot; polling and retry belong to the caller.

use crate::error::{PaymentError, PaymentResult};
use crate::gateway::SharedGateway;
use crate::session::{ApiKey, PaymentSession};
use tracing::{debug, instrument, warn};

/// Looks up sessions with the merchant's API key
#[derive(Clone)]
pub struct SessionVerifier {
    gateway: SharedGateway,
    api_key: ApiKey,
}

impl SessionVerifier {
    pub fn new(gateway: SharedGateway, api_key: impl Into<ApiKey>) -> Self {
        Self {
            gateway,
            api_key: api_key.into(),
        }
    }

    /// Fetch the current state of `session_id`.
    ///
    /// Any failure, including a blank id, comes back as `Verification`.
    #[instrument(skip(self))]
    pub async fn verify(&self, session_id: &str) -> PaymentResult<PaymentSession> {
        if session_id.trim().is_empty() {
            return Err(PaymentError::verification(
                session_id,
                PaymentError::validation("Session id is required"),
            ));
        }
        if self.api_key.is_blank() {
            return Err(PaymentError::verification(
                session_id,
                PaymentError::validation("API key is required"),
            ));
        }

        match self.gateway.get_session(&self.api_key, session_id).await {
            Ok(session) => {
                debug!("Session {} is {}", session.session_id, session.status);
                Ok(session)
            }
            Err(err) => {
                warn!("Verification of {} failed: {}", session_id, err);
                Err(PaymentError::verification(session_id, err))
            }
        }
    }
}

impl std::fmt::Debug for SessionVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionVerifier")
            .field("provider", &self.gateway.provider_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStatus;
    use crate::test_support::ScriptedGateway;
    use std::sync::Arc;

    fn session(status: SessionStatus) -> PaymentSession {
        PaymentSession::new("s1", 50.0, "o1", status)
    }

    #[tokio::test]
    async fn test_verify_returns_latest_snapshot() {
        let gateway = Arc::new(ScriptedGateway::with_lookups(vec![
            Ok(session(SessionStatus::Created)),
            Ok(session(SessionStatus::Completed)),
        ]));
        let verifier = SessionVerifier::new(gateway.clone(), "key");

        assert_eq!(verifier.verify("s1").await.unwrap().status, SessionStatus::Created);
        assert_eq!(verifier.verify("s1").await.unwrap().status, SessionStatus::Completed);
        assert_eq!(gateway.lookup_calls(), 2);
    }

    #[tokio::test]
    async fn test_blank_id_is_verification_error() {
        let gateway = Arc::new(ScriptedGateway::with_lookups(vec![]));
        let verifier = SessionVerifier::new(gateway.clone(), "key");

        let err = verifier.verify("").await.unwrap_err();

        assert_eq!(err.kind(), "verification_error");
        assert_eq!(gateway.lookup_calls(), 0);
    }

    #[tokio::test]
    async fn test_not_found_is_wrapped() {
        let gateway = Arc::new(ScriptedGateway::with_lookups(vec![Err(
            PaymentError::Rejected {
                status: 404,
                message: "Payment session not found".into(),
            },
        )]));
        let verifier = SessionVerifier::new(gateway, "key");

        let err = verifier.verify("missing").await.unwrap_err();

        match err {
            PaymentError::Verification { session_id, source } => {
                assert_eq!(session_id, "missing");
                assert_eq!(source.message(), "Payment session not found");
            }
            other => panic!("expected verification error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_wrapped() {
        let gateway = Arc::new(ScriptedGateway::with_lookups(vec![Err(
            PaymentError::Transport("timed out".into()),
        )]));
        let verifier = SessionVerifier::new(gateway, "key");

        let err = verifier.verify("s1").await.unwrap_err();

        assert_eq!(err.kind(), "verification_error");
        assert!(err.is_retryable());
    }
}
