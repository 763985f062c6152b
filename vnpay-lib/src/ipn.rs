//! Acknowledgment body returned to the gateway for an IPN.

use serde::{Deserialize, Serialize};

use crate::errors::GATEWAY_UNKNOWN_ERROR;
use crate::outcome::ApplyResult;
use crate::VnpayError;

/// Acknowledgment codes understood by the gateway.
pub mod codes {
    pub const CONFIRMED: &str = "00";
    pub const ORDER_NOT_FOUND: &str = "01";
    pub const ALREADY_CONFIRMED: &str = "02";
    pub const INVALID_AMOUNT: &str = "04";
    pub const INVALID_SIGNATURE: &str = "97";
    pub const UNKNOWN_ERROR: &str = super::GATEWAY_UNKNOWN_ERROR;
}

/// `{"RspCode":"00","Message":"Confirm Success"}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpnResponse {
    #[serde(rename = "RspCode")]
    pub rsp_code: String,
    #[serde(rename = "Message")]
    pub message: String,
}

impl IpnResponse {
    fn with(code: &str, message: &str) -> Self {
        Self {
            rsp_code: code.to_string(),
            message: message.to_string(),
        }
    }

    pub fn confirmed() -> Self {
        Self::with(codes::CONFIRMED, "Confirm Success")
    }

    pub fn order_not_found() -> Self {
        Self::with(codes::ORDER_NOT_FOUND, "Order not found")
    }

    pub fn already_confirmed() -> Self {
        Self::with(codes::ALREADY_CONFIRMED, "Order already confirmed")
    }

    pub fn invalid_amount() -> Self {
        Self::with(codes::INVALID_AMOUNT, "Invalid amount")
    }

    pub fn invalid_signature() -> Self {
        Self::with(codes::INVALID_SIGNATURE, "Invalid signature")
    }

    pub fn unknown_error() -> Self {
        Self::with(codes::UNKNOWN_ERROR, "Unknown error")
    }

    /// Map an apply result to its acknowledgment.
    pub fn from_apply(result: ApplyResult) -> Self {
        match result {
            ApplyResult::Applied => Self::confirmed(),
            ApplyResult::AlreadyApplied => Self::already_confirmed(),
            ApplyResult::AmountMismatch => Self::invalid_amount(),
            ApplyResult::NotFound => Self::order_not_found(),
        }
    }

    /// Acknowledgment for a failure inside the merchant system.
    pub fn from_error(err: &VnpayError) -> Self {
        Self::with(err.gateway_code(), "Unknown error")
    }

    pub fn is_confirmed(&self) -> bool {
        self.rsp_code == codes::CONFIRMED
    }
}
