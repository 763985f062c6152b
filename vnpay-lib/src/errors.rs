//! Error types for VNPAY operations.
//!
//! Only conditions the caller has to act on are errors. An invalid signature,
//! a declined payment or a duplicate notification are ordinary values
//! ([`crate::PaymentOutcome`], [`crate::ApplyResult`]) and never show up here.

use thiserror::Error;

/// Gateway acknowledgment code used for every unexpected failure.
pub const GATEWAY_UNKNOWN_ERROR: &str = "99";

/// Error codes for FFI and service integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum VnpayErrorCode {
    /// Feature not compiled in
    Unimplemented = 1000,
    /// Required configuration value missing
    Configuration = 2000,
    /// Order or request field rejected
    Validation = 3000,
    /// Transport/network layer error
    Transport = 4000,
    /// Serialization error
    Serialization = 5000,
    /// Order store error
    Storage = 6000,
    /// Internal/unexpected error
    Internal = 9999,
}

/// Error type for VNPAY operations.
#[derive(Debug, Error)]
pub enum VnpayError {
    /// Feature not compiled into this build.
    #[error("{0} is not available in this build")]
    Unimplemented(&'static str),

    /// A required configuration value is empty.
    #[error("configuration error: {field} is not set")]
    Configuration {
        /// Name of the missing setting
        field: &'static str,
    },

    /// An order or request field is malformed.
    #[error("invalid {field}: {reason}")]
    Validation {
        /// Field or parameter name
        field: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Transport/network layer error talking to the merchant API.
    #[error("transport error: {0}")]
    Transport(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The injected order store failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal/unexpected error (for example the MAC could not be keyed).
    #[error("internal error: {0}")]
    Internal(String),
}

impl VnpayError {
    /// Get the error code for FFI/service integration.
    pub fn code(&self) -> VnpayErrorCode {
        match self {
            Self::Unimplemented(_) => VnpayErrorCode::Unimplemented,
            Self::Configuration { .. } => VnpayErrorCode::Configuration,
            Self::Validation { .. } => VnpayErrorCode::Validation,
            Self::Transport(_) => VnpayErrorCode::Transport,
            Self::Serialization(_) => VnpayErrorCode::Serialization,
            Self::Storage(_) => VnpayErrorCode::Storage,
            Self::Internal(_) => VnpayErrorCode::Internal,
        }
    }

    /// Returns true if this error is potentially recoverable by retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Storage(_))
    }

    /// Acknowledgment code reported to the gateway when this error aborts
    /// notification handling.
    pub fn gateway_code(&self) -> &'static str {
        GATEWAY_UNKNOWN_ERROR
    }

    /// Create a configuration error for a missing setting.
    pub fn configuration(field: &'static str) -> Self {
        Self::Configuration { field }
    }

    /// Create a validation error.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a transport error from any error type.
    pub fn transport<E: std::error::Error>(err: E) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for VnpayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = VnpayError::Transport("connection reset".into());
        assert_eq!(err.code(), VnpayErrorCode::Transport);
        assert!(err.is_retryable());

        let err = VnpayError::configuration("secret_key");
        assert_eq!(err.code(), VnpayErrorCode::Configuration);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = VnpayError::configuration("tmn_code");
        assert_eq!(err.to_string(), "configuration error: tmn_code is not set");

        let err = VnpayError::validation("amount", "must not be negative");
        assert_eq!(err.to_string(), "invalid amount: must not be negative");
    }

    #[test]
    fn test_every_error_maps_to_unknown_gateway_code() {
        let errors = [
            VnpayError::Internal("mac".into()),
            VnpayError::Storage("db down".into()),
            VnpayError::Unimplemented("http client"),
        ];
        for err in errors {
            assert_eq!(err.gateway_code(), "99");
        }
    }
}
