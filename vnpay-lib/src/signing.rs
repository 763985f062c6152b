//! HMAC-SHA512 signing of canonical strings.
//!
//! ## Security Model
//!
//! - The shared secret is used as raw bytes, never decoded or logged
//! - Signatures are lowercase hex, 128 characters
//! - Verification compares digests in constant time

use std::fmt;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize, Serializer};
use sha2::Sha512;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::canonical::CanonicalString;
use crate::{Result, VnpayError};

type HmacSha512 = Hmac<Sha512>;

/// Length of a rendered signature in hex characters.
pub const SIGNATURE_HEX_LEN: usize = 128;

/// Shared secret issued by the gateway to the merchant.
///
/// `Debug` and `Serialize` never reveal the value; memory is wiped on drop.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct SecretKey(String);

impl SecretKey {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw key bytes for keying the MAC.
    pub fn expose_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey([redacted])")
    }
}

impl Serialize for SecretKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str("[redacted]")
    }
}

impl From<&str> for SecretKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SecretKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Lowercase hex HMAC-SHA512 digest.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Signature {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn keyed_mac(secret: &[u8], message: &[u8]) -> Result<HmacSha512> {
    let mut mac = HmacSha512::new_from_slice(secret)
        .map_err(|e| VnpayError::Internal(format!("HMAC initialization failed: {}", e)))?;
    mac.update(message);
    Ok(mac)
}

/// Compute `HMAC-SHA512(secret, message)` as lowercase hex.
///
/// # Errors
///
/// Only [`VnpayError::Internal`] when the MAC cannot be keyed.
pub fn sign(secret: &[u8], message: &[u8]) -> Result<Signature> {
    let mac = keyed_mac(secret, message)?;
    Ok(Signature(hex::encode(mac.finalize().into_bytes())))
}

/// Check `candidate` against the signature of `message`.
///
/// The candidate is hex-decoded (either case) and compared to the digest in
/// constant time. Malformed hex or a wrong length is `Ok(false)`.
pub fn verify(secret: &[u8], message: &[u8], candidate: &str) -> Result<bool> {
    let expected = keyed_mac(secret, message)?.finalize().into_bytes();
    let supplied = match hex::decode(candidate) {
        Ok(bytes) => bytes,
        Err(_) => return Ok(false),
    };
    Ok(expected.as_slice().ct_eq(supplied.as_slice()).into())
}

/// Signs and verifies canonical strings with one configured secret.
#[derive(Clone)]
pub struct Signer {
    secret: SecretKey,
}

impl Signer {
    pub fn new(secret: SecretKey) -> Self {
        Self { secret }
    }

    /// Sign a canonical string.
    pub fn sign(&self, canonical: &CanonicalString) -> Result<Signature> {
        sign(self.secret.expose_bytes(), canonical.as_bytes())
    }

    /// Sign arbitrary text (the merchant API uses pipe-joined inputs).
    pub fn sign_text(&self, text: &str) -> Result<Signature> {
        sign(self.secret.expose_bytes(), text.as_bytes())
    }

    /// Verify a supplied signature over a canonical string.
    pub fn verify(&self, canonical: &CanonicalString, candidate: &str) -> Result<bool> {
        verify(self.secret.expose_bytes(), canonical.as_bytes(), candidate)
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN_SIGNATURE: &str = "38b0bc1ea66b14793e39cd58e93d37b799a507442d0dd8d37443fa95dec58e57da6db4742636fea31201c48e57a66e73a308a2e5a5c6bb831e4e39fe2227c00f";

    #[test]
    fn test_known_vector() {
        let signature = sign(b"hmac_secret_1234", br#"{"type":"payment_intent"}"#).unwrap();
        assert_eq!(signature.as_str(), KNOWN_SIGNATURE);
    }

    #[test]
    fn test_lowercase_fixed_length() {
        let signature = sign(b"testkey", b"").unwrap();
        assert_eq!(signature.as_str().len(), SIGNATURE_HEX_LEN);
        assert!(signature
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_verify_accepts_own_signature() {
        let signature = sign(b"testkey", b"a=1&b=2").unwrap();
        assert!(verify(b"testkey", b"a=1&b=2", signature.as_str()).unwrap());
    }

    #[test]
    fn test_verify_is_case_insensitive_on_hex() {
        let upper = KNOWN_SIGNATURE.to_ascii_uppercase();
        assert!(verify(b"hmac_secret_1234", br#"{"type":"payment_intent"}"#, &upper).unwrap());
    }

    #[test]
    fn test_verify_rejects_wrong_key_message_and_garbage() {
        let signature = sign(b"testkey", b"a=1").unwrap();
        assert!(!verify(b"otherkey", b"a=1", signature.as_str()).unwrap());
        assert!(!verify(b"testkey", b"a=2", signature.as_str()).unwrap());
        assert!(!verify(b"testkey", b"a=1", "not-hex").unwrap());
        assert!(!verify(b"testkey", b"a=1", "").unwrap());
        assert!(!verify(b"testkey", b"a=1", &signature.as_str()[..64]).unwrap());
    }

    #[test]
    fn test_secret_never_printed() {
        let secret = SecretKey::new("super-secret");
        assert!(!format!("{:?}", secret).contains("super-secret"));
        assert!(!format!("{:?}", Signer::new(secret.clone())).contains("super-secret"));
        let json = serde_json::to_string(&secret).unwrap();
        assert!(!json.contains("super-secret"));
    }
}
