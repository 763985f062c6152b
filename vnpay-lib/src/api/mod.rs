//! Merchant API: transaction query and refund.
//!
//! Unlike payment redirects, these calls are signed over a fixed, pipe-joined
//! field order and sent as a JSON body to the configured `api_url`.
//!
//! # Example
//!
//! ```rust,ignore
//! use vnpay_lib::api::{HttpGatewayClient, QueryRequest, TransactionApi};
//!
//! let client = HttpGatewayClient::from_config(&config)?;
//! let api = TransactionApi::new(config, client);
//!
//! let response = api
//!     .query(&QueryRequest::new("ORDER123", "20240501100000", "127.0.0.1"))
//!     .await?;
//! println!("{}: {}", response.response_code, response.message);
//! ```

mod client;

pub use client::{GatewayClient, HttpGatewayClient, DEFAULT_TIMEOUT_SECS};

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::clock::{gateway_timestamp, parse_gateway_timestamp, Clock, SystemClock};
use crate::config::GatewayConfig;
use crate::params::{fields, AMOUNT_SCALE, SUCCESS_CODE};
use crate::signing::Signer;
use crate::{Result, VnpayError};

/// `vnp_Command` for a transaction query.
pub const COMMAND_QUERY: &str = "querydr";

/// `vnp_Command` for a refund.
pub const COMMAND_REFUND: &str = "refund";

/// Full or partial refund (`vnp_TransactionType`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundType {
    Full,
    Partial,
}

impl RefundType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "02",
            Self::Partial => "03",
        }
    }
}

/// Look up the gateway's record of a payment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub txn_ref: String,
    /// `vnp_CreateDate` of the original payment, gateway wall time.
    pub transaction_date: String,
    /// IP of the server making the call.
    pub ip_addr: String,
    pub order_info: Option<String>,
}

impl QueryRequest {
    pub fn new(
        txn_ref: impl Into<String>,
        transaction_date: impl Into<String>,
        ip_addr: impl Into<String>,
    ) -> Self {
        Self {
            txn_ref: txn_ref.into(),
            transaction_date: transaction_date.into(),
            ip_addr: ip_addr.into(),
            order_info: None,
        }
    }

    pub fn with_order_info(mut self, order_info: impl Into<String>) -> Self {
        self.order_info = Some(order_info.into());
        self
    }

    fn order_info(&self) -> String {
        self.order_info
            .clone()
            .unwrap_or_else(|| format!("Kiem tra ket qua GD OrderId:{}", self.txn_ref))
    }
}

/// Return money for a settled payment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRequest {
    pub txn_ref: String,
    /// Gateway `vnp_TransactionNo` of the payment.
    pub transaction_no: String,
    /// Amount to refund in VND.
    pub amount: i64,
    pub refund_type: RefundType,
    /// Operator requesting the refund.
    pub create_by: String,
    /// `vnp_CreateDate` of the original payment, gateway wall time.
    pub transaction_date: String,
    pub ip_addr: String,
    pub order_info: Option<String>,
}

impl RefundRequest {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        txn_ref: impl Into<String>,
        transaction_no: impl Into<String>,
        amount: i64,
        refund_type: RefundType,
        create_by: impl Into<String>,
        transaction_date: impl Into<String>,
        ip_addr: impl Into<String>,
    ) -> Self {
        Self {
            txn_ref: txn_ref.into(),
            transaction_no: transaction_no.into(),
            amount,
            refund_type,
            create_by: create_by.into(),
            transaction_date: transaction_date.into(),
            ip_addr: ip_addr.into(),
            order_info: None,
        }
    }

    pub fn with_order_info(mut self, order_info: impl Into<String>) -> Self {
        self.order_info = Some(order_info.into());
        self
    }

    fn order_info(&self) -> String {
        self.order_info
            .clone()
            .unwrap_or_else(|| format!("Hoan tien giao dich {}", self.txn_ref))
    }
}

/// Decoded merchant API reply.
///
/// The reply's own signature is not checked; treat it as informational and
/// confirm state changes through the IPN.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ApiResponse {
    pub response_code: String,
    pub message: String,
    /// Every field of the reply.
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl ApiResponse {
    /// Decode a JSON reply. Anything but an object is rejected.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(map) = value else {
            return Err(VnpayError::Serialization(
                "merchant API reply is not a JSON object".to_string(),
            ));
        };
        let all: BTreeMap<String, serde_json::Value> = map.into_iter().collect();
        let text = |name: &str| match all.get(name) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        Ok(Self {
            response_code: text(fields::RESPONSE_CODE),
            message: text(fields::MESSAGE),
            fields: all,
        })
    }

    pub fn is_success(&self) -> bool {
        self.response_code == SUCCESS_CODE
    }

    /// A string field of the reply, e.g. `vnp_TransactionStatus`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(serde_json::Value::as_str)
    }
}

/// Signs and sends merchant API requests.
pub struct TransactionApi<C> {
    config: Arc<GatewayConfig>,
    signer: Signer,
    client: C,
    clock: Arc<dyn Clock>,
}

impl<C: GatewayClient> TransactionApi<C> {
    pub fn new(config: GatewayConfig, client: C) -> Self {
        Self {
            signer: Signer::new(config.secret_key.clone()),
            config: Arc::new(config),
            client,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source used for `vnp_CreateDate`.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Assemble the signed JSON body for a query.
    pub fn query_body(&self, request: &QueryRequest) -> Result<serde_json::Value> {
        let tmn_code = self.config.require_tmn_code()?;
        self.config.require_secret()?;
        required("txn_ref", &request.txn_ref)?;
        required("ip_addr", &request.ip_addr)?;
        transaction_date(&request.transaction_date)?;

        let request_id = request_id();
        let create_date = gateway_timestamp(self.clock.now());
        let order_info = request.order_info();

        let hash_data = [
            request_id.as_str(),
            self.config.version.as_str(),
            COMMAND_QUERY,
            tmn_code,
            request.txn_ref.as_str(),
            request.transaction_date.as_str(),
            create_date.as_str(),
            request.ip_addr.as_str(),
            order_info.as_str(),
        ]
        .join("|");
        let signature = self.signer.sign_text(&hash_data)?;

        Ok(json_body(
            &[
                (fields::REQUEST_ID, request_id.as_str()),
                (fields::VERSION, self.config.version.as_str()),
                (fields::COMMAND, COMMAND_QUERY),
                (fields::TMN_CODE, tmn_code),
                (fields::TXN_REF, request.txn_ref.as_str()),
                (fields::ORDER_INFO, order_info.as_str()),
                (fields::TRANSACTION_DATE, request.transaction_date.as_str()),
                (fields::CREATE_DATE, create_date.as_str()),
                (fields::IP_ADDR, request.ip_addr.as_str()),
            ],
            signature.as_str(),
        ))
    }

    /// Assemble the signed JSON body for a refund.
    pub fn refund_body(&self, request: &RefundRequest) -> Result<serde_json::Value> {
        let tmn_code = self.config.require_tmn_code()?;
        self.config.require_secret()?;
        required("txn_ref", &request.txn_ref)?;
        required("transaction_no", &request.transaction_no)?;
        required("create_by", &request.create_by)?;
        required("ip_addr", &request.ip_addr)?;
        transaction_date(&request.transaction_date)?;
        if request.amount <= 0 {
            return Err(VnpayError::validation("amount", "refund amount must be positive"));
        }
        let amount = request
            .amount
            .checked_mul(AMOUNT_SCALE)
            .ok_or_else(|| VnpayError::validation("amount", "amount too large"))?
            .to_string();

        let request_id = request_id();
        let create_date = gateway_timestamp(self.clock.now());
        let order_info = request.order_info();

        let hash_data = [
            request_id.as_str(),
            self.config.version.as_str(),
            COMMAND_REFUND,
            tmn_code,
            request.refund_type.as_str(),
            request.txn_ref.as_str(),
            amount.as_str(),
            request.transaction_no.as_str(),
            request.transaction_date.as_str(),
            request.create_by.as_str(),
            create_date.as_str(),
            request.ip_addr.as_str(),
            order_info.as_str(),
        ]
        .join("|");
        let signature = self.signer.sign_text(&hash_data)?;

        Ok(json_body(
            &[
                (fields::REQUEST_ID, request_id.as_str()),
                (fields::VERSION, self.config.version.as_str()),
                (fields::COMMAND, COMMAND_REFUND),
                (fields::TMN_CODE, tmn_code),
                (fields::TRANSACTION_TYPE, request.refund_type.as_str()),
                (fields::TXN_REF, request.txn_ref.as_str()),
                (fields::AMOUNT, amount.as_str()),
                (fields::ORDER_INFO, order_info.as_str()),
                (fields::TRANSACTION_NO, request.transaction_no.as_str()),
                (fields::TRANSACTION_DATE, request.transaction_date.as_str()),
                (fields::CREATE_BY, request.create_by.as_str()),
                (fields::CREATE_DATE, create_date.as_str()),
                (fields::IP_ADDR, request.ip_addr.as_str()),
            ],
            signature.as_str(),
        ))
    }

    /// Query the gateway for a payment's status.
    #[tracing::instrument(skip(self, request), fields(order_ref = %request.txn_ref))]
    pub async fn query(&self, request: &QueryRequest) -> Result<ApiResponse> {
        let body = self.query_body(request)?;
        self.send(body).await
    }

    /// Ask the gateway to refund a payment.
    #[tracing::instrument(skip(self, request), fields(order_ref = %request.txn_ref, amount = request.amount))]
    pub async fn refund(&self, request: &RefundRequest) -> Result<ApiResponse> {
        let body = self.refund_body(request)?;
        self.send(body).await
    }

    async fn send(&self, body: serde_json::Value) -> Result<ApiResponse> {
        let request_id = body[fields::REQUEST_ID].as_str().unwrap_or_default().to_string();
        tracing::debug!(%request_id, "sending merchant API request");

        let response = ApiResponse::from_json(self.client.post_json(&body).await?)?;

        tracing::info!(
            %request_id,
            response_code = %response.response_code,
            "merchant API replied"
        );
        Ok(response)
    }
}

fn json_body(pairs: &[(&str, &str)], signature: &str) -> serde_json::Value {
    let mut body: serde_json::Map<String, serde_json::Value> = pairs
        .iter()
        .map(|(name, value)| (name.to_string(), serde_json::Value::from(*value)))
        .collect();
    body.insert(fields::SECURE_HASH.to_string(), signature.into());
    serde_json::Value::Object(body)
}

/// Fresh 8-digit `vnp_RequestId`.
fn request_id() -> String {
    rand::thread_rng().gen_range(10_000_000..100_000_000u32).to_string()
}

fn required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(VnpayError::validation(field, "must not be empty"));
    }
    Ok(())
}

fn transaction_date(raw: &str) -> Result<()> {
    parse_gateway_timestamp(raw)
        .map(|_| ())
        .map_err(|_| VnpayError::validation("transaction_date", format!("'{}' is not yyyyMMddHHmmss", raw)))
}
