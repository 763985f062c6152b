//! Transport for the merchant API.
//!
//! # Feature Flags
//!
//! [`HttpGatewayClient`] needs the `http-client` feature for real requests.
//! Without it every call returns [`VnpayError::Unimplemented`].
//!
//! ```toml
//! [dependencies]
//! vnpay-lib = { version = "0.1", features = ["http-client"] }
//! ```

use async_trait::async_trait;
use std::time::Duration;

use crate::config::GatewayConfig;
use crate::{Result, VnpayError};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Sends a signed JSON request and returns the JSON reply.
///
/// Retries, if any, belong to the implementation.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    async fn post_json(&self, body: &serde_json::Value) -> Result<serde_json::Value>;
}

/// `reqwest`-backed client for the merchant API endpoint.
pub struct HttpGatewayClient {
    endpoint: String,
    timeout: Duration,
    #[cfg(feature = "http-client")]
    client: reqwest::Client,
}

impl HttpGatewayClient {
    /// Create a client posting to `endpoint`.
    #[cfg(feature = "http-client")]
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VnpayError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            timeout,
            client,
        })
    }

    /// Create a client posting to `endpoint` (stub when feature disabled).
    #[cfg(not(feature = "http-client"))]
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            endpoint: endpoint.into(),
            timeout,
        })
    }

    /// Client for the configured `api_url` with the default timeout.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let endpoint = config.require_api_url()?;
        Self::new(endpoint, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[cfg(feature = "http-client")]
    async fn send(&self, body: &serde_json::Value) -> Result<serde_json::Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(VnpayError::Transport(format!(
                "Merchant API returned {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        response.json::<serde_json::Value>().await.map_err(|e| {
            VnpayError::Serialization(format!("Failed to parse merchant API response: {}", e))
        })
    }

    #[cfg(not(feature = "http-client"))]
    async fn send(&self, _body: &serde_json::Value) -> Result<serde_json::Value> {
        Err(VnpayError::Unimplemented(
            "merchant API client not compiled - enable the 'http-client' feature",
        ))
    }

    #[cfg(feature = "http-client")]
    fn map_reqwest_error(&self, e: reqwest::Error) -> VnpayError {
        if e.is_timeout() {
            VnpayError::Transport(format!(
                "Merchant API timed out after {}ms",
                self.timeout.as_millis()
            ))
        } else if e.is_connect() {
            VnpayError::Transport(format!("Cannot reach {}: {}", self.endpoint, e))
        } else {
            VnpayError::transport(e)
        }
    }
}

#[async_trait]
impl GatewayClient for HttpGatewayClient {
    async fn post_json(&self, body: &serde_json::Value) -> Result<serde_json::Value> {
        self.send(body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_requires_api_url() {
        let config = GatewayConfig::new("TMN", "secret", "https://pay.test", "https://shop.test");
        assert!(matches!(
            HttpGatewayClient::from_config(&config),
            Err(VnpayError::Configuration { field: "api_url" })
        ));
    }

    #[test]
    fn test_from_config_uses_default_timeout() {
        let config = GatewayConfig::sandbox("TMN", "secret", "https://shop.test");
        let client = HttpGatewayClient::from_config(&config).unwrap();
        assert_eq!(client.endpoint(), crate::config::SANDBOX_API_URL);
        assert_eq!(client.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[cfg(not(feature = "http-client"))]
    #[tokio::test]
    async fn test_stub_is_unimplemented() {
        let client = HttpGatewayClient::new("http://localhost", Duration::from_secs(1)).unwrap();
        let err = client.post_json(&serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, VnpayError::Unimplemented(_)));
    }
}
