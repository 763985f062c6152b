//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use vnpay_lib::prelude::*;
//! ```

// Configuration
pub use crate::config::GatewayConfig;
pub use crate::signing::SecretKey;

// Error handling
pub use crate::errors::{VnpayError, VnpayErrorCode};
pub use crate::Result;

// Outbound requests
pub use crate::order::{OrderRequest, OrderRequestBuilder, PaymentRedirect};
pub use crate::params::{fields, ParameterSet};

// Callbacks
pub use crate::ipn::IpnResponse;
pub use crate::verify::{PaymentOutcome, ReturnResult, ReturnVerifier};

// Order state
pub use crate::outcome::{ApplyResult, InMemoryOrderStore, OrderState, OrderStore};
pub use crate::service::PaymentService;

// Merchant API
pub use crate::api::{GatewayClient, QueryRequest, RefundRequest, RefundType, TransactionApi};
