//! Payment request building.
//!
//! Turns an order into the signed redirect URL of the gateway's payment page.
//! The query string and the signing input are the same canonical bytes, so
//! the signature always covers exactly what is sent.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::canonical::canonicalize_for_signing;
use crate::clock::{gateway_timestamp, Clock, SystemClock};
use crate::config::GatewayConfig;
use crate::params::{fields, ParameterSet, AMOUNT_SCALE, COMMAND_PAY};
use crate::signing::{Signature, Signer};
use crate::{Result, VnpayError};

/// Order category used when the caller does not choose one.
pub const DEFAULT_ORDER_TYPE: &str = "other";

/// Business fields of one payment attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Merchant order reference, unique per attempt (`vnp_TxnRef`).
    pub order_ref: String,
    /// Amount in VND; scaled by 100 on the wire.
    pub amount: i64,
    /// Order description shown to the customer.
    pub order_info: String,
    /// Order category.
    pub order_type: String,
    /// Customer IP address.
    pub client_ip: String,
    /// Preselected bank or method, if any.
    pub bank_code: Option<String>,
    /// Overrides the configured page language.
    pub locale: Option<String>,
    /// Overrides the configured return URL.
    pub return_url: Option<String>,
}

impl OrderRequest {
    pub fn new(
        order_ref: impl Into<String>,
        amount: i64,
        order_info: impl Into<String>,
        client_ip: impl Into<String>,
    ) -> Self {
        Self {
            order_ref: order_ref.into(),
            amount,
            order_info: order_info.into(),
            order_type: DEFAULT_ORDER_TYPE.to_string(),
            client_ip: client_ip.into(),
            bank_code: None,
            locale: None,
            return_url: None,
        }
    }

    pub fn with_order_type(mut self, order_type: impl Into<String>) -> Self {
        self.order_type = order_type.into();
        self
    }

    pub fn with_bank_code(mut self, bank_code: impl Into<String>) -> Self {
        self.bank_code = Some(bank_code.into());
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_return_url(mut self, return_url: impl Into<String>) -> Self {
        self.return_url = Some(return_url.into());
        self
    }

    /// Amount in the gateway's unit (VND x 100).
    pub fn gateway_amount(&self) -> Result<i64> {
        if self.amount < 0 {
            return Err(VnpayError::validation("amount", "must not be negative"));
        }
        self.amount
            .checked_mul(AMOUNT_SCALE)
            .ok_or_else(|| VnpayError::validation("amount", "too large"))
    }

    fn validate(&self) -> Result<()> {
        if self.order_ref.trim().is_empty() {
            return Err(VnpayError::validation("order_ref", "must not be empty"));
        }
        self.gateway_amount()?;
        Ok(())
    }
}

/// A signed payment request, ready for an HTTP redirect.
#[derive(Clone, Debug)]
pub struct PaymentRedirect {
    /// Full redirect URL including the signature.
    pub url: String,
    /// Every signed parameter.
    pub params: ParameterSet,
    /// Signature appended to the query.
    pub signature: Signature,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Builds signed payment page URLs.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use vnpay_lib::{FixedClock, GatewayConfig, OrderRequest, OrderRequestBuilder};
///
/// let config = GatewayConfig::sandbox("DEMO0001", "testkey", "https://shop.example/return");
/// let builder = OrderRequestBuilder::new(config)
///     .with_clock(FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 3, 0, 0).unwrap()));
///
/// let url = builder
///     .build_redirect_url(&OrderRequest::new("ORDER123", 50_000, "Order 123", "127.0.0.1"))
///     .unwrap();
/// assert!(url.contains("vnp_Amount=5000000"));
/// assert!(url.contains("vnp_CreateDate=20240501100000"));
/// ```
#[derive(Clone)]
pub struct OrderRequestBuilder {
    config: Arc<GatewayConfig>,
    signer: Signer,
    clock: Arc<dyn Clock>,
}

impl OrderRequestBuilder {
    /// Create a builder using the system clock.
    pub fn new(config: GatewayConfig) -> Self {
        Self::from_shared(Arc::new(config))
    }

    pub(crate) fn from_shared(config: Arc<GatewayConfig>) -> Self {
        Self {
            signer: Signer::new(config.secret_key.clone()),
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Assemble the unsigned parameter set for `order` created at `now`.
    pub fn parameters(&self, order: &OrderRequest, now: DateTime<Utc>) -> Result<ParameterSet> {
        self.assemble(order, now).map(|(params, _)| params)
    }

    /// Parameters plus the expiry instant they carry.
    fn assemble(
        &self,
        order: &OrderRequest,
        now: DateTime<Utc>,
    ) -> Result<(ParameterSet, DateTime<Utc>)> {
        let config = &*self.config;
        let tmn_code = config.require_tmn_code()?;
        let return_url = match order.return_url.as_deref().filter(|url| !url.is_empty()) {
            Some(url) => url,
            None => config.require_return_url()?,
        };
        let expire_minutes = config.require_expire_minutes()?;
        order.validate()?;

        let expires_at = Duration::try_minutes(expire_minutes)
            .and_then(|window| now.checked_add_signed(window))
            .ok_or_else(|| VnpayError::configuration("expire_minutes"))?;
        let locale = order.locale.as_deref().unwrap_or(&config.locale);

        let mut params = ParameterSet::new();
        params.insert(fields::VERSION, config.version.as_str());
        params.insert(fields::COMMAND, COMMAND_PAY);
        params.insert(fields::TMN_CODE, tmn_code);
        params.insert(fields::AMOUNT, order.gateway_amount()?.to_string());
        params.insert(fields::CURR_CODE, config.currency.as_str());
        params.insert(fields::LOCALE, locale);
        params.insert(fields::RETURN_URL, return_url);
        params.insert(fields::TXN_REF, order.order_ref.as_str());
        params.insert(fields::ORDER_INFO, order.order_info.as_str());
        params.insert(fields::ORDER_TYPE, order.order_type.as_str());
        params.insert(fields::IP_ADDR, order.client_ip.as_str());
        params.insert_opt(fields::BANK_CODE, order.bank_code.as_deref());
        params.insert(fields::CREATE_DATE, gateway_timestamp(now));
        params.insert(fields::EXPIRE_DATE, gateway_timestamp(expires_at));
        Ok((params, expires_at))
    }

    /// Build and sign the payment request for `order`.
    ///
    /// # Errors
    ///
    /// - [`VnpayError::Configuration`] if the merchant code, secret, pay URL
    ///   or return URL is not set
    /// - [`VnpayError::Validation`] if the amount is negative or the order
    ///   reference is empty
    #[tracing::instrument(skip(self, order), fields(order_ref = %order.order_ref))]
    pub fn build(&self, order: &OrderRequest) -> Result<PaymentRedirect> {
        let pay_url = self.config.require_pay_url()?;
        self.config.require_secret()?;

        let created_at = self.clock.now();
        let (params, expires_at) = self.assemble(order, created_at)?;
        let canonical = canonicalize_for_signing(&params);
        let signature = self.signer.sign(&canonical)?;

        tracing::debug!(signed = %canonical, "payment request signed");

        let url = format!(
            "{}?{}&{}={}",
            pay_url,
            canonical,
            fields::SECURE_HASH,
            signature
        );
        Ok(PaymentRedirect {
            url,
            params,
            signature,
            created_at,
            expires_at,
        })
    }

    /// Convenience wrapper returning only the redirect URL.
    pub fn build_redirect_url(&self, order: &OrderRequest) -> Result<String> {
        self.build(order).map(|redirect| redirect.url)
    }
}
