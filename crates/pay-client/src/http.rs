//! # HTTP Session Gateway
//!
//! `reqwest` implementation of `SessionGateway` against the ChainPe
//! sessions API. One call, one request: no retries, no caching.

use crate::config::ClientConfig;
use async_trait::async_trait;
use pay_core::wire::{API_KEY_HEADER, CREATE_SESSION_PATH, SESSIONS_PATH};
use pay_core::{
    decode_created_session, decode_session_response, ApiKey, CreateSessionRequest, PaymentError,
    PaymentResult, PaymentSession, SessionGateway,
};
use reqwest::{Client, RequestBuilder};
use tracing::{debug, error, info, instrument};
use url::Url;

/// Sessions API over HTTPS
#[derive(Debug, Clone)]
pub struct HttpSessionGateway {
    config: ClientConfig,
    client: Client,
}

impl HttpSessionGateway {
    /// Create a new gateway
    pub fn new(config: ClientConfig) -> PaymentResult<Self> {
        let builder = Client::builder();

        // Browsers own the User-Agent and have no client-wide timeout
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout);

        let client = builder.build().map_err(|e| {
            PaymentError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        let config = ClientConfig::from_env()?;
        Self::new(config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `GET /api/sessions/{id}` with the id as a single escaped path segment.
    ///
    /// `.` and `..` cannot be carried as a segment (URL parsing folds them
    /// into the parent path), so they are refused before any request.
    fn session_url(&self, session_id: &str) -> PaymentResult<Url> {
        if matches!(session_id, "." | "..") {
            return Err(PaymentError::validation(format!(
                "Session id {:?} is not a valid path segment",
                session_id
            )));
        }
        let mut url = Url::parse(&self.config.endpoint(SESSIONS_PATH)).map_err(|e| {
            PaymentError::Configuration(format!("Invalid sessions URL: {}", e))
        })?;
        url.path_segments_mut()
            .map_err(|_| PaymentError::Configuration("API base URL cannot have a path".into()))?
            .push(session_id);
        Ok(url)
    }

    /// Send a prepared request and classify the outcome with `decode`
    async fn execute(
        &self,
        request: RequestBuilder,
        decode: fn(u16, &str) -> PaymentResult<PaymentSession>,
    ) -> PaymentResult<PaymentSession> {
        let response = request.send().await.map_err(|e| {
            error!("Sessions API unreachable: {}", e);
            PaymentError::Transport(describe_send_error(&e))
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::Transport(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            error!("Sessions API error: status={}, body={}", status, body);
        }

        decode(status.as_u16(), &body)
    }
}

fn describe_send_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        return format!("Request timed out: {}", e);
    }
    format!("Network error: {}", e)
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl SessionGateway for HttpSessionGateway {
    #[instrument(skip(self, api_key, request), fields(order_id = %request.order_id))]
    async fn create_session(
        &self,
        api_key: &ApiKey,
        request: &CreateSessionRequest,
    ) -> PaymentResult<PaymentSession> {
        let url = self.config.endpoint(CREATE_SESSION_PATH);
        debug!("POST {}", url);

        let session = self
            .execute(
                self.client
                    .post(&url)
                    .header(API_KEY_HEADER, api_key.expose())
                    .json(request),
                decode_created_session,
            )
            .await?;

        info!(
            "Created session: id={}, url={:?}",
            session.session_id, session.checkout_url
        );
        Ok(session)
    }

    #[instrument(skip(self, api_key))]
    async fn get_session(
        &self,
        api_key: &ApiKey,
        session_id: &str,
    ) -> PaymentResult<PaymentSession> {
        let url = self.session_url(session_id)?;
        debug!("GET {}", url);

        self.execute(
            self.client
                .get(url)
                .header(API_KEY_HEADER, api_key.expose()),
            decode_session_response,
        )
        .await
    }

    fn provider_name(&self) -> &'static str {
        "chainpe"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_url_escapes_id() {
        let gateway =
            HttpSessionGateway::new(ClientConfig::new("http://localhost:8000").unwrap()).unwrap();

        assert_eq!(
            gateway.session_url("pay_abc123").unwrap().as_str(),
            "http://localhost:8000/api/sessions/pay_abc123"
        );
        assert_eq!(
            gateway.session_url("a/b?c").unwrap().as_str(),
            "http://localhost:8000/api/sessions/a%2Fb%3Fc"
        );
        assert_eq!(
            gateway.session_url("..x").unwrap().as_str(),
            "http://localhost:8000/api/sessions/..x"
        );

        for dots in [".", ".."] {
            let err = gateway.session_url(dots).unwrap_err();
            assert_eq!(err.kind(), "validation_error");
        }
    }

    #[test]
    fn test_provider_name() {
        let gateway =
            HttpSessionGateway::new(ClientConfig::new("http://localhost:8000").unwrap()).unwrap();
        assert_eq!(gateway.provider_name(), "chainpe");
    }
}
