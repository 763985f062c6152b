//! Assertion helpers for verification results.

use crate::verify::{PaymentOutcome, ReturnResult};

/// Assert a verified, successful payment.
pub fn assert_success(result: &ReturnResult) {
    assert!(result.signature_valid, "expected a valid signature");
    assert_eq!(
        result.outcome,
        PaymentOutcome::Success,
        "expected success, gateway code {:?}",
        result.response_code
    );
}

/// Assert a verified decline carrying `code`.
pub fn assert_declined(result: &ReturnResult, code: &str) {
    assert!(result.signature_valid, "expected a valid signature");
    assert_eq!(result.outcome, PaymentOutcome::Declined);
    assert_eq!(result.response_code.as_deref(), Some(code));
}

/// Assert a rejected callback.
pub fn assert_invalid_signature(result: &ReturnResult) {
    assert!(!result.signature_valid, "signature unexpectedly accepted");
    assert_eq!(result.outcome, PaymentOutcome::InvalidSignature);
}
