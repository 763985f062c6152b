//! Verify command - check a browser return

use anyhow::Result;
use vnpay_lib::{GatewayConfig, PaymentOutcome, ReturnResult, ReturnVerifier};

use crate::ui;

#[tracing::instrument(skip(config, input))]
pub fn run(config: &GatewayConfig, input: &str, verbose: bool) -> Result<()> {
    let params = super::read_callback(input)?;
    tracing::debug!("Verifying callback fields {}", params);
    let result = ReturnVerifier::new(config).verify(&params)?;

    show(&result);
    if verbose {
        ui::json(&serde_json::to_value(&result)?);
    }

    match result.outcome {
        PaymentOutcome::Success => {
            ui::success("Payment verified");
            Ok(())
        }
        PaymentOutcome::Declined => {
            ui::warning(&format!("Payment declined: {}", result.message()));
            Ok(())
        }
        PaymentOutcome::InvalidSignature => {
            tracing::warn!("Rejected callback for order {:?}", result.order_ref);
            ui::error("Signature does not match - do not trust this callback");
            anyhow::bail!("invalid signature")
        }
    }
}

/// Print the fields of a verification result.
pub fn show(result: &ReturnResult) {
    ui::header("Gateway Callback");
    ui::key_value("Outcome", result.outcome.as_str());
    ui::key_value("Signature", if result.signature_valid { "valid" } else { "INVALID" });
    if let Some(order_ref) = &result.order_ref {
        ui::key_value("Order", order_ref);
    }
    if let Some(code) = &result.response_code {
        ui::key_value("Response", &format!("{} ({})", code, result.message()));
    }
    if result.signature_valid {
        ui::key_value("Amount", &ui::vnd(result.display_amount()));
    }
    if let Some(transaction_no) = &result.transaction_no {
        ui::key_value("Transaction", transaction_no);
    }
    if let Some(bank_code) = &result.bank_code {
        ui::key_value("Bank", bank_code);
    }
    if let Some(pay_date) = &result.pay_date {
        ui::key_value("Paid at", pay_date);
    }
}
