//! Verification of gateway callbacks.
//!
//! The browser return and the IPN carry the same signed parameter set. Every
//! value in it is untrusted until the signature has been recomputed with the
//! shared secret and compared in constant time.

use serde::{Deserialize, Serialize};

use crate::canonical::canonicalize_for_signing;
use crate::config::GatewayConfig;
use crate::params::{fields, ParameterSet, AMOUNT_SCALE, SUCCESS_CODE};
use crate::signing::Signer;
use crate::{Result, VnpayError};

/// Verified meaning of a callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    /// Signature valid and the gateway reports success.
    Success,
    /// Signature valid but the payment did not go through.
    Declined,
    /// Signature missing or wrong. Nothing in the callback can be trusted.
    InvalidSignature,
}

impl PaymentOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Declined => "declined",
            Self::InvalidSignature => "invalid_signature",
        }
    }
}

/// Result of verifying one callback. Built once, never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReturnResult {
    /// `vnp_TxnRef` as supplied.
    pub order_ref: Option<String>,
    /// `vnp_ResponseCode` as supplied.
    pub response_code: Option<String>,
    /// `vnp_Amount` in gateway units (VND x 100); zero when missing or unparsable.
    pub amount: i64,
    pub signature_valid: bool,
    pub outcome: PaymentOutcome,
    /// Gateway transaction number, for refunds and support.
    pub transaction_no: Option<String>,
    pub bank_code: Option<String>,
    /// `vnp_PayDate` in gateway wall time.
    pub pay_date: Option<String>,
    pub order_info: Option<String>,
}

impl ReturnResult {
    fn invalid(params: &ParameterSet) -> Self {
        Self::from_params(params, 0, PaymentOutcome::InvalidSignature)
    }

    fn from_params(params: &ParameterSet, amount: i64, outcome: PaymentOutcome) -> Self {
        let owned = |name: &str| params.get(name).map(str::to_string);
        Self {
            order_ref: owned(fields::TXN_REF),
            response_code: owned(fields::RESPONSE_CODE),
            amount,
            signature_valid: outcome != PaymentOutcome::InvalidSignature,
            outcome,
            transaction_no: owned(fields::TRANSACTION_NO),
            bank_code: owned(fields::BANK_CODE),
            pay_date: owned(fields::PAY_DATE),
            order_info: owned(fields::ORDER_INFO),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == PaymentOutcome::Success
    }

    /// Amount in VND for display.
    pub fn display_amount(&self) -> i64 {
        self.amount / AMOUNT_SCALE
    }

    /// Human-readable description of the outcome.
    pub fn message(&self) -> &'static str {
        match self.outcome {
            PaymentOutcome::InvalidSignature => "Invalid signature",
            _ => response_message(self.response_code.as_deref().unwrap_or_default()),
        }
    }
}

/// Description of a gateway response code.
pub fn response_message(code: &str) -> &'static str {
    match code {
        "00" => "Transaction successful",
        "07" => "Amount debited, transaction flagged as suspicious",
        "09" => "Card or account not registered for internet banking",
        "10" => "Card or account authentication failed more than 3 times",
        "11" => "Payment window expired",
        "12" => "Card or account is locked",
        "13" => "Wrong one-time password",
        "24" => "Customer cancelled the transaction",
        "51" => "Insufficient balance",
        "65" => "Daily transaction limit exceeded",
        "75" => "Issuing bank under maintenance",
        "79" => "Wrong payment password entered too many times",
        "" => "No response code",
        _ => "Transaction failed",
    }
}

/// Verifies return and IPN parameter sets.
#[derive(Clone, Debug)]
pub struct ReturnVerifier {
    signer: Signer,
    secret_configured: bool,
}

impl ReturnVerifier {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            signer: Signer::new(config.secret_key.clone()),
            secret_configured: !config.secret_key.is_empty(),
        }
    }

    /// Verify a callback and classify it.
    ///
    /// # Errors
    ///
    /// Only configuration or internal failures. Malformed or tampered input
    /// yields `Ok` with [`PaymentOutcome::InvalidSignature`] or
    /// [`PaymentOutcome::Declined`].
    #[tracing::instrument(skip(self, params), fields(order_ref = params.get(fields::TXN_REF).unwrap_or_default()))]
    pub fn verify(&self, params: &ParameterSet) -> Result<ReturnResult> {
        // An empty key would let anyone mint valid signatures
        if !self.secret_configured {
            return Err(VnpayError::configuration("secret_key"));
        }

        let Some(supplied) = params.get(fields::SECURE_HASH) else {
            tracing::warn!("callback without signature rejected");
            return Ok(ReturnResult::invalid(params));
        };

        let canonical = canonicalize_for_signing(params);
        if !self.signer.verify(&canonical, supplied)? {
            tracing::warn!(
                response_code = params.get(fields::RESPONSE_CODE).unwrap_or_default(),
                "callback signature mismatch"
            );
            return Ok(ReturnResult::invalid(params));
        }

        let amount = params
            .get(fields::AMOUNT)
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|amount| *amount >= 0);
        let code = params.get(fields::RESPONSE_CODE).unwrap_or_default();

        let result = match amount {
            Some(amount) if code == SUCCESS_CODE => {
                ReturnResult::from_params(params, amount, PaymentOutcome::Success)
            }
            Some(amount) => ReturnResult::from_params(params, amount, PaymentOutcome::Declined),
            None => {
                tracing::warn!(
                    raw_amount = params.get(fields::AMOUNT).unwrap_or_default(),
                    "signed callback with unusable amount treated as declined"
                );
                ReturnResult::from_params(params, 0, PaymentOutcome::Declined)
            }
        };

        tracing::debug!(outcome = result.outcome.as_str(), code, "callback verified");
        Ok(result)
    }
}
