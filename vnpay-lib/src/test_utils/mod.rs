//! Test utilities for VNPAY integrations.
//!
//! Fixtures for a sandbox merchant, a frozen clock, and helpers that sign
//! callbacks the way the gateway does, so return and IPN handling can be
//! exercised without a live gateway.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vnpay_lib::test_utils::{sandbox_config, signed_callback, TEST_SECRET};
//!
//! let callback = signed_callback(TEST_SECRET, &[
//!     ("vnp_TxnRef", "ORDER1"),
//!     ("vnp_Amount", "5000000"),
//!     ("vnp_ResponseCode", "00"),
//! ]);
//! ```

mod assertions;
mod fixtures;

pub use fixtures::{
    callback_from_redirect, fixed_clock, sandbox_config, signed_callback, FIXED_INSTANT_SECS,
    TEST_RETURN_URL, TEST_SECRET, TEST_TMN_CODE,
};

pub use assertions::{assert_declined, assert_invalid_signature, assert_success};
