//! Canonical form of a parameter set.
//!
//! The same bytes serve as the signing input and as the query string sent to
//! the gateway, so outbound and inbound paths must both go through
//! [`canonicalize`].
//!
//! Rules:
//! - fields named in the exclusion set, and fields with empty values, are dropped
//! - remaining fields are ordered by raw byte value of their names
//! - names and values are percent-encoded: ASCII letters, digits and `-_.~`
//!   pass through, every other byte becomes `%XX` (uppercase), space is `%20`
//! - pairs are rendered `name=value` and joined with `&`

use std::borrow::Cow;
use std::fmt;

use crate::params::{ParameterSet, SIGNATURE_FIELDS};

/// Deterministic byte string derived from a [`ParameterSet`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CanonicalString(String);

impl CanonicalString {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<[u8]> for CanonicalString {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Display for CanonicalString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Percent-encode a single name or value.
///
/// ```
/// use vnpay_lib::canonical::encode_component;
///
/// assert_eq!(encode_component("Thanh toan #1"), "Thanh%20toan%20%231");
/// assert_eq!(encode_component("a-b_c.d~e"), "a-b_c.d~e");
/// ```
pub fn encode_component(raw: &str) -> Cow<'_, str> {
    urlencoding::encode(raw)
}

/// Canonicalize `params`, leaving out the fields named in `excluded`.
///
/// Never fails: an empty parameter set yields an empty string.
///
/// ```
/// use vnpay_lib::{canonicalize, ParameterSet};
///
/// let params: ParameterSet = [("b", "2"), ("a", "1"), ("vnp_SecureHash", "x")]
///     .into_iter()
///     .collect();
/// assert_eq!(canonicalize(&params, &["vnp_SecureHash"]).as_str(), "a=1&b=2");
/// ```
pub fn canonicalize(params: &ParameterSet, excluded: &[&str]) -> CanonicalString {
    let mut out = String::new();
    for (name, value) in params.iter() {
        if value.is_empty() || excluded.contains(&name) {
            continue;
        }
        if !out.is_empty() {
            out.push('&');
        }
        out.push_str(&encode_component(name));
        out.push('=');
        out.push_str(&encode_component(value));
    }
    CanonicalString(out)
}

/// Canonicalize with the protocol's fixed exclusion set (the signature and
/// signature-type fields). Both the request builder and the return verifier
/// use this, never a variant of it.
pub fn canonicalize_for_signing(params: &ParameterSet) -> CanonicalString {
    canonicalize(params, &SIGNATURE_FIELDS)
}
