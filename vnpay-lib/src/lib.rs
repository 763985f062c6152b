//! VNPAY merchant library.
//!
//! Signs payment requests for the VNPAY payment page and turns the gateway's
//! browser returns and IPN callbacks into verified outcomes. Order storage and
//! HTTP transport stay with the caller, injected through traits.
//!
//! # Features
//!
//! - **Request signing**: canonical, percent-encoded parameter strings under HMAC-SHA512
//! - **Callback verification**: constant-time signature checks on returns and IPNs
//! - **Idempotent settlement**: amount-checked, once-only order transitions
//! - **Merchant API**: signed transaction query and refund (`http-client` feature)
//!
//! # Example
//!
//! ```
//! use vnpay_lib::{
//!     GatewayConfig, OrderRequest, OrderRequestBuilder, ParameterSet, PaymentOutcome, ReturnVerifier,
//! };
//!
//! let config = GatewayConfig::sandbox("DEMO0001", "testkey", "https://shop.example/return");
//!
//! // Outbound: redirect the customer to the payment page
//! let url = OrderRequestBuilder::new(config.clone())
//!     .build_redirect_url(&OrderRequest::new("ORDER123", 50_000, "Order 123", "127.0.0.1"))
//!     .unwrap();
//!
//! // Inbound: the echoed request verifies, but carries no success code
//! let result = ReturnVerifier::new(&config)
//!     .verify(&ParameterSet::from_url(&url))
//!     .unwrap();
//! assert!(result.signature_valid);
//! assert_eq!(result.outcome, PaymentOutcome::Declined);
//! ```

pub mod api;
pub mod canonical;
pub mod clock;
pub mod config;
pub mod errors;
pub mod ipn;
pub mod order;
pub mod outcome;
pub mod params;
pub mod prelude;
pub mod service;
pub mod signing;
pub mod verify;

/// Test utilities for merchant integrations.
///
/// This module is only available with the `test-utils` feature or in test builds.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use canonical::{canonicalize, canonicalize_for_signing, CanonicalString};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::GatewayConfig;
pub use errors::{VnpayError, VnpayErrorCode};
pub use ipn::IpnResponse;
pub use order::{OrderRequest, OrderRequestBuilder, PaymentRedirect};
pub use outcome::{ApplyResult, InMemoryOrderStore, OrderRecord, OrderState, OrderStore, OutcomeApplier};
pub use params::ParameterSet;
pub use service::{PaymentService, ReturnOutcome};
pub use signing::{SecretKey, Signature, Signer};
pub use verify::{PaymentOutcome, ReturnResult, ReturnVerifier};

/// Common result alias for VNPAY operations.
pub type Result<T> = std::result::Result<T, VnpayError>;
