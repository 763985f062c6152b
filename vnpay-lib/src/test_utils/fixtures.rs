//! Test fixtures and callback generators.

use chrono::DateTime;

use crate::canonical::canonicalize_for_signing;
use crate::clock::FixedClock;
use crate::config::GatewayConfig;
use crate::params::{fields, ParameterSet};
use crate::signing::sign;

/// Sandbox merchant code used across tests.
pub const TEST_TMN_CODE: &str = "DEMO0001";

/// Shared secret used across tests.
pub const TEST_SECRET: &str = "testkey";

pub const TEST_RETURN_URL: &str = "https://shop.example/vnpay/return";

/// 2024-05-01T03:00:00Z, which is 10:00 gateway time.
pub const FIXED_INSTANT_SECS: i64 = 1_714_532_400;

/// Sandbox configuration with the test merchant and secret.
pub fn sandbox_config() -> GatewayConfig {
    GatewayConfig::sandbox(TEST_TMN_CODE, TEST_SECRET, TEST_RETURN_URL)
}

/// A clock frozen at [`FIXED_INSTANT_SECS`].
pub fn fixed_clock() -> FixedClock {
    FixedClock(DateTime::from_timestamp(FIXED_INSTANT_SECS, 0).unwrap_or_default())
}

/// Build a callback and sign it with `secret`, as the gateway would.
pub fn signed_callback(secret: &str, pairs: &[(&str, &str)]) -> ParameterSet {
    let mut params: ParameterSet = pairs.iter().copied().collect();
    sign_in_place(secret, &mut params);
    params
}

/// Turn a payment redirect into the return the gateway would send back.
///
/// Keeps every request parameter, adds `vnp_ResponseCode`, and re-signs.
pub fn callback_from_redirect(redirect_url: &str, response_code: &str, secret: &str) -> ParameterSet {
    let mut params = ParameterSet::from_url(redirect_url);
    params.remove(fields::SECURE_HASH);
    params.insert(fields::RESPONSE_CODE, response_code);
    sign_in_place(secret, &mut params);
    params
}

fn sign_in_place(secret: &str, params: &mut ParameterSet) {
    let canonical = canonicalize_for_signing(params);
    let signature = sign(secret.as_bytes(), canonical.as_bytes())
        .map(|signature| signature.into_string())
        .unwrap_or_default();
    params.insert(fields::SECURE_HASH, signature);
}
