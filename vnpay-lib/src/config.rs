//! Merchant configuration.
//!
//! One immutable [`GatewayConfig`] is built at startup and handed to every
//! component. Nothing reads configuration from global state.
//!
//! # Environment Variables
//!
//! [`GatewayConfig::from_env`] reads:
//! - `VNPAY_TMN_CODE` - merchant (terminal) code
//! - `VNPAY_SECRET_KEY` - shared secret
//! - `VNPAY_PAY_URL` - payment page base URL
//! - `VNPAY_RETURN_URL` - where the gateway sends the customer back
//! - `VNPAY_API_URL` - merchant API endpoint for query/refund (optional)
//! - `VNPAY_LOCALE` - `vn` or `en` (optional)
//! - `VNPAY_EXPIRE_MINUTES` - payment window in minutes (optional)

use serde::{Deserialize, Serialize};

use crate::params::PROTOCOL_VERSION;
use crate::signing::SecretKey;
use crate::{Result, VnpayError};

/// Public sandbox payment page.
pub const SANDBOX_PAY_URL: &str = "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html";

/// Public sandbox merchant API.
pub const SANDBOX_API_URL: &str = "https://sandbox.vnpayment.vn/merchant_webapi/api/transaction";

/// Merchant settings shared by every signing and verification call.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Merchant terminal code (`vnp_TmnCode`).
    pub tmn_code: String,

    /// Shared HMAC secret.
    pub secret_key: SecretKey,

    /// Payment page base URL.
    pub pay_url: String,

    /// Return URL for the customer's browser.
    pub return_url: String,

    /// Merchant API endpoint for query and refund.
    #[serde(default)]
    pub api_url: String,

    /// Protocol version.
    #[serde(default = "default_version")]
    pub version: String,

    /// Payment page language.
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Currency code.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Minutes between creation and expiry of a payment request.
    #[serde(default = "default_expire_minutes")]
    pub expire_minutes: i64,
}

fn default_version() -> String {
    PROTOCOL_VERSION.to_string()
}

fn default_locale() -> String {
    "vn".to_string()
}

fn default_currency() -> String {
    "VND".to_string()
}

fn default_expire_minutes() -> i64 {
    15
}

impl GatewayConfig {
    /// Create a configuration with protocol defaults.
    pub fn new(
        tmn_code: impl Into<String>,
        secret_key: impl Into<SecretKey>,
        pay_url: impl Into<String>,
        return_url: impl Into<String>,
    ) -> Self {
        Self {
            tmn_code: tmn_code.into(),
            secret_key: secret_key.into(),
            pay_url: pay_url.into(),
            return_url: return_url.into(),
            api_url: String::new(),
            version: default_version(),
            locale: default_locale(),
            currency: default_currency(),
            expire_minutes: default_expire_minutes(),
        }
    }

    /// Configuration pointing at the public sandbox.
    pub fn sandbox(
        tmn_code: impl Into<String>,
        secret_key: impl Into<SecretKey>,
        return_url: impl Into<String>,
    ) -> Self {
        Self::new(tmn_code, secret_key, SANDBOX_PAY_URL, return_url).with_api_url(SANDBOX_API_URL)
    }

    /// Load configuration from `VNPAY_*` environment variables.
    ///
    /// Missing variables are left empty and reported by the `require_*`
    /// checks when a component needs them.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).unwrap_or_default();

        let mut config = Self::new(
            var("VNPAY_TMN_CODE"),
            SecretKey::new(var("VNPAY_SECRET_KEY")),
            var("VNPAY_PAY_URL"),
            var("VNPAY_RETURN_URL"),
        )
        .with_api_url(var("VNPAY_API_URL"));

        if let Ok(locale) = std::env::var("VNPAY_LOCALE") {
            if !locale.is_empty() {
                config.locale = locale;
            }
        }
        if let Some(minutes) = std::env::var("VNPAY_EXPIRE_MINUTES")
            .ok()
            .and_then(|m| m.parse::<i64>().ok())
        {
            config.expire_minutes = minutes;
        }
        config
    }

    /// Set the merchant API endpoint.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Set the payment page language.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Set the payment window.
    pub fn with_expire_minutes(mut self, minutes: i64) -> Self {
        self.expire_minutes = minutes;
        self
    }

    pub fn require_tmn_code(&self) -> Result<&str> {
        non_empty(&self.tmn_code, "tmn_code")
    }

    pub fn require_secret(&self) -> Result<&SecretKey> {
        if self.secret_key.is_empty() {
            return Err(VnpayError::configuration("secret_key"));
        }
        Ok(&self.secret_key)
    }

    pub fn require_pay_url(&self) -> Result<&str> {
        non_empty(&self.pay_url, "pay_url")
    }

    pub fn require_return_url(&self) -> Result<&str> {
        non_empty(&self.return_url, "return_url")
    }

    pub fn require_api_url(&self) -> Result<&str> {
        non_empty(&self.api_url, "api_url")
    }

    /// Payment window, rejected unless positive.
    pub fn require_expire_minutes(&self) -> Result<i64> {
        if self.expire_minutes <= 0 {
            return Err(VnpayError::configuration("expire_minutes"));
        }
        Ok(self.expire_minutes)
    }
}

fn non_empty<'a>(value: &'a str, field: &'static str) -> Result<&'a str> {
    if value.trim().is_empty() {
        Err(VnpayError::configuration(field))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::new("TMN01", "secret", "https://pay.test", "https://shop.test/r");
        assert_eq!(config.version, "2.1.0");
        assert_eq!(config.locale, "vn");
        assert_eq!(config.currency, "VND");
        assert_eq!(config.expire_minutes, 15);
        assert!(config.require_api_url().is_err());
    }

    #[test]
    fn test_sandbox_preset() {
        let config = GatewayConfig::sandbox("TMN01", "secret", "https://shop.test/r");
        assert_eq!(config.pay_url, SANDBOX_PAY_URL);
        assert_eq!(config.require_api_url().unwrap(), SANDBOX_API_URL);
    }

    #[test]
    fn test_required_values() {
        let config = GatewayConfig::default();
        assert!(matches!(
            config.require_tmn_code(),
            Err(VnpayError::Configuration { field: "tmn_code" })
        ));
        assert!(matches!(
            config.require_secret(),
            Err(VnpayError::Configuration { field: "secret_key" })
        ));
        assert!(matches!(
            config.require_pay_url(),
            Err(VnpayError::Configuration { field: "pay_url" })
        ));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: GatewayConfig = serde_json::from_value(serde_json::json!({
            "tmn_code": "TMN01",
            "secret_key": "secret",
            "pay_url": "https://pay.test",
            "return_url": "https://shop.test/r"
        }))
        .unwrap();
        assert_eq!(config.expire_minutes, 15);
        assert_eq!(config.require_secret().unwrap().expose_bytes(), b"secret");
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = GatewayConfig::new("TMN01", "hunter2", "https://pay.test", "https://shop.test/r");
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
