//! # Session Types
//!
//! Integration config supplied by the merchant page and the payment session
//! record returned by the API.

use crate::error::{PaymentError, PaymentResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Merchant credential sent as `X-API-Key`.
///
/// `Debug` never prints the key itself.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Empty or whitespace-only
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl From<&str> for ApiKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ApiKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Options the integrator supplies once for a pay control.
///
/// Field names follow the browser options object (`apiKey`, `orderId`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationConfig {
    /// Merchant API key
    pub api_key: ApiKey,

    /// Amount in USDC, decimal form (e.g. 50.00)
    pub amount: f64,

    /// Merchant order reference; synthesized per activation when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,

    /// Redirect target after a successful payment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,

    /// Redirect target if the shopper cancels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,

    /// Opaque pass-through metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl IntegrationConfig {
    pub fn new(api_key: impl Into<ApiKey>, amount: f64) -> Self {
        Self {
            api_key: api_key.into(),
            amount,
            order_id: None,
            success_url: None,
            cancel_url: None,
            metadata: None,
        }
    }

    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn with_success_url(mut self, url: impl Into<String>) -> Self {
        self.success_url = Some(url.into());
        self
    }

    pub fn with_cancel_url(mut self, url: impl Into<String>) -> Self {
        self.cancel_url = Some(url.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_metadata_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Check the config before anything goes over the wire
    pub fn validate(&self) -> PaymentResult<()> {
        if self.api_key.is_blank() {
            return Err(PaymentError::validation("API key is required"));
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(PaymentError::validation(format!(
                "Amount must be a positive number, got {}",
                self.amount
            )));
        }
        Ok(())
    }

    /// The order id to send for this activation.
    ///
    /// A blank id counts as absent; any other id is sent exactly as given.
    /// Synthesized ids are random so that rapid repeated clicks never collide.
    pub fn resolve_order_id(&self) -> String {
        match &self.order_id {
            Some(id) if !id.trim().is_empty() => id.clone(),
            _ => format!("ORDER-{}", Uuid::new_v4().simple()),
        }
    }
}

/// Server-side status of a payment session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Created, awaiting the shopper
    Created,
    /// Payment seen, not yet settled
    Pending,
    /// Paid
    #[serde(alias = "paid")]
    Completed,
    Failed,
    Expired,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Created => "created",
            SessionStatus::Pending => "pending",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
            SessionStatus::Expired => "expired",
        }
    }

    /// No further transitions are expected from the server
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Failed | SessionStatus::Expired
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment session as reported by the API. Read-only to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSession {
    /// Unique session identifier (`pay_...`)
    pub session_id: String,

    /// Echo of the requested amount
    #[serde(deserialize_with = "amount_from_number_or_string")]
    pub amount_usdc: f64,

    /// Echo of the merchant order id
    #[serde(default)]
    pub order_id: Option<String>,

    /// Authoritative status at read time
    pub status: SessionStatus,

    /// Hosted checkout page; always present on creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,

    #[serde(
        default,
        deserialize_with = "optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<DateTime<Utc>>,

    #[serde(
        default,
        deserialize_with = "optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(
        default,
        deserialize_with = "optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub paid_at: Option<DateTime<Utc>>,

    /// Settlement transaction hash once paid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl PaymentSession {
    pub fn new(
        session_id: impl Into<String>,
        amount_usdc: f64,
        order_id: impl Into<String>,
        status: SessionStatus,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            amount_usdc,
            order_id: Some(order_id.into()),
            status,
            checkout_url: None,
            expires_at: None,
            created_at: None,
            paid_at: None,
            tx_hash: None,
            success_url: None,
            cancel_url: None,
            metadata: None,
        }
    }

    pub fn with_checkout_url(mut self, url: impl Into<String>) -> Self {
        self.checkout_url = Some(url.into());
        self
    }

    /// The absolute checkout URL the shopper must be sent to.
    ///
    /// A session without a non-empty id or an absolute URL cannot be
    /// redirected to and is reported as a `Protocol` error.
    pub fn redirect_target(&self) -> PaymentResult<&str> {
        if self.session_id.trim().is_empty() {
            return Err(PaymentError::protocol("Response is missing session_id", None));
        }
        let url = self
            .checkout_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| PaymentError::protocol("Response is missing checkout_url", None))?;

        match url::Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(url),
            _ => Err(PaymentError::protocol(
                format!("checkout_url is not an absolute http(s) URL: {}", url),
                None,
            )),
        }
    }
}

fn amount_from_number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom("amount_usdc is out of range")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| D::Error::custom(format!("amount_usdc is not a decimal: {:?}", s))),
        other => Err(D::Error::custom(format!(
            "amount_usdc must be a number or decimal string, got {}",
            other
        ))),
    }
}

/// Timestamps arrive either as RFC 3339 or as naive UTC (`2025-01-01T12:00:00.123456`).
fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(|_| D::Error::custom(format!("invalid timestamp: {:?}", raw)))
}

/// Notification the API posts to the merchant's webhook URL.
///
/// The payload is unsigned, so it is only a hint to go and verify the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// e.g. `payment.success`
    pub event: String,
    pub session_id: String,
    pub amount: String,
    pub currency: String,
    #[serde(default)]
    pub tx_hash: String,
}

impl WebhookPayload {
    pub const PAYMENT_SUCCESS: &'static str = "payment.success";

    pub fn is_payment_success(&self) -> bool {
        self.event == Self::PAYMENT_SUCCESS
    }
}
