//! CLI command implementations

pub mod ipn;
pub mod merchant_api;
pub mod pay_url;
pub mod verify;

use vnpay_lib::ParameterSet;

/// Parse a callback given as a full URL or a bare query string.
pub fn read_callback(input: &str) -> anyhow::Result<ParameterSet> {
    let params = ParameterSet::parse(input.trim());
    if params.is_empty() {
        anyhow::bail!("No parameters found in '{}'", input);
    }
    Ok(params)
}
