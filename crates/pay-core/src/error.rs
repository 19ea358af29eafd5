//! # Payment Error Types
//!
//! Typed error handling for the pay-button protocol.
//! Every initiation and verification outcome is either a value or a `PaymentError`;
//! nothing is swallowed on the way to the integrator.

use thiserror::Error;

/// Core error type for all session operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaymentError {
    /// Configuration errors (missing env vars, bad base URL)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Caller input rejected before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// The API refused the request (4xx)
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// No usable response: network failure, timeout or 5xx
    #[error("Transport error: {0}")]
    Transport(String),

    /// A response arrived but does not have the expected shape
    #[error("Protocol error: {message}")]
    Protocol {
        message: String,
        /// Raw payload as received, when it could be captured
        raw: Option<String>,
    },

    /// A verify call failed; `source` holds the underlying reason
    #[error("Verification failed for session {session_id}: {source}")]
    Verification {
        session_id: String,
        #[source]
        source: Box<PaymentError>,
    },
}

impl PaymentError {
    pub fn validation(message: impl Into<String>) -> Self {
        PaymentError::Validation(message.into())
    }

    pub fn protocol(message: impl Into<String>, raw: Option<String>) -> Self {
        PaymentError::Protocol {
            message: message.into(),
            raw,
        }
    }

    pub fn verification(session_id: impl Into<String>, source: PaymentError) -> Self {
        PaymentError::Verification {
            session_id: session_id.into(),
            source: Box::new(source),
        }
    }

    /// Stable machine-readable kind, surfaced to integrators next to the message
    pub fn kind(&self) -> &'static str {
        match self {
            PaymentError::Configuration(_) => "configuration_error",
            PaymentError::Validation(_) => "validation_error",
            PaymentError::Rejected { .. } => "rejected_error",
            PaymentError::Transport(_) => "transport_error",
            PaymentError::Protocol { .. } => "protocol_error",
            PaymentError::Verification { .. } => "verification_error",
        }
    }

    /// Human-readable message without the kind prefix.
    ///
    /// For `Rejected` this is the server `detail` verbatim.
    pub fn message(&self) -> String {
        match self {
            PaymentError::Configuration(m)
            | PaymentError::Validation(m)
            | PaymentError::Transport(m) => m.clone(),
            PaymentError::Rejected { message, .. } => message.clone(),
            PaymentError::Protocol { message, .. } => message.clone(),
            PaymentError::Verification { source, .. } => source.message(),
        }
    }

    /// Returns true if re-activating without changing input may succeed.
    ///
    /// The core never retries on its own; this only informs the caller.
    pub fn is_retryable(&self) -> bool {
        match self {
            PaymentError::Transport(_) => true,
            PaymentError::Verification { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Returns the HTTP status code appropriate for relaying this error
    pub fn status_code(&self) -> u16 {
        match self {
            PaymentError::Configuration(_) => 500,
            PaymentError::Validation(_) => 400,
            PaymentError::Rejected { status, .. } => *status,
            PaymentError::Transport(_) => 503,
            PaymentError::Protocol { .. } => 502,
            PaymentError::Verification { source, .. } => match source.as_ref() {
                PaymentError::Validation(_) => 400,
                PaymentError::Rejected { status, .. } => *status,
                _ => 502,
            },
        }
    }
}

/// Result type alias for session operations
pub type PaymentResult<T> = Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(PaymentError::Transport("timeout".into()).is_retryable());
        assert!(!PaymentError::validation("bad amount").is_retryable());
        assert!(!PaymentError::Rejected {
            status: 401,
            message: "Invalid API key".into()
        }
        .is_retryable());
        assert!(
            PaymentError::verification("pay_1", PaymentError::Transport("down".into()))
                .is_retryable()
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(PaymentError::validation("x").status_code(), 400);
        assert_eq!(
            PaymentError::Rejected {
                status: 402,
                message: "insufficient balance".into()
            }
            .status_code(),
            402
        );
        assert_eq!(PaymentError::protocol("bad body", None).status_code(), 502);
        assert_eq!(
            PaymentError::verification(
                "pay_1",
                PaymentError::Rejected {
                    status: 404,
                    message: "Payment session not found".into()
                }
            )
            .status_code(),
            404
        );
    }

    #[test]
    fn test_message_and_kind() {
        let err = PaymentError::Rejected {
            status: 402,
            message: "insufficient balance".into(),
        };
        assert_eq!(err.kind(), "rejected_error");
        assert_eq!(err.message(), "insufficient balance");

        let wrapped = PaymentError::verification("pay_1", err);
        assert_eq!(wrapped.kind(), "verification_error");
        assert_eq!(wrapped.message(), "insufficient balance");
        assert!(wrapped.to_string().contains("pay_1"));
    }
}
