//! Error types for core value construction

use thiserror::Error;

/// Errors raised when a core value is built from invalid parts
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Decimal text could not be parsed
    #[error("invalid decimal: {0}")]
    InvalidDecimal(String),

    /// Not a three-letter upper-case ISO-4217 code
    #[error("invalid currency code: {0}")]
    InvalidCurrency(String),

    /// Calendar component out of range
    #[error("invalid {field}: {value}")]
    InvalidTemporal {
        /// Component name (month, day, offset, ...)
        field: &'static str,
        /// Offending value
        value: i64,
    },

    /// Zone identifier is empty or malformed
    #[error("invalid zone id: {0:?}")]
    InvalidZone(String),

    /// Certificate bytes are not DER encoded
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// Key material is empty
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Class reference name is not a valid type name
    #[error("invalid class name: {0:?}")]
    InvalidClassName(String),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
