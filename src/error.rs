//! Error types for ferro-negfeat
//!
//! Every failure a run can hit maps onto one [`NegFeatError`] variant. Each
//! variant carries a stable [`ErrorCode`] so scripts driving the CLI can
//! branch on the category without parsing messages.

use std::fmt;
use thiserror::Error;

/// Error codes for categorizing errors
///
/// These codes can be used for programmatic error handling
/// and for documentation lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // Locus errors (E1xxx)
    /// Accession could not be mapped to a gene locus
    LocusUnresolved = 1001,

    // Coordinate errors (E2xxx)
    /// Flanked window collapsed after clamping
    OutOfBounds = 2001,

    // Parameter errors (E3xxx)
    /// Invalid run parameter
    InvalidParameter = 3001,
    /// Invalid configuration file
    InvalidConfig = 3002,

    // Provider errors (E4xxx)
    /// External provider failed
    ProviderUnavailable = 4001,
    /// Offline request missing from the response cache
    CacheMiss = 4002,

    // Output errors (E5xxx)
    /// Output record or sidecar could not be written
    SerializationFailed = 5001,

    // IO errors (E9xxx)
    /// File IO error
    IoError = 9001,
    /// JSON parsing error
    JsonError = 9002,
}

impl ErrorCode {
    /// Get the error code as a string (e.g., "E1001")
    pub fn as_str(&self) -> String {
        format!("E{:04}", *self as u16)
    }

    /// Get a brief description of this error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::LocusUnresolved => "locus could not be resolved",
            ErrorCode::OutOfBounds => "flanked window out of contig bounds",
            ErrorCode::InvalidParameter => "invalid run parameter",
            ErrorCode::InvalidConfig => "invalid configuration file",
            ErrorCode::ProviderUnavailable => "annotation provider unavailable",
            ErrorCode::CacheMiss => "request not present in offline cache",
            ErrorCode::SerializationFailed => "output serialization failed",
            ErrorCode::IoError => "file I/O error",
            ErrorCode::JsonError => "JSON parsing error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for ferro-negfeat
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NegFeatError {
    /// The accession could not be mapped to a genomic locus
    #[error("Locus unresolved for {accession}: {msg}")]
    LocusUnresolved { accession: String, msg: String },

    /// Clamping the flanked window to the contig left nothing
    #[error("Window out of bounds on {contig}: [{start}, {end}) with contig length {contig_length}")]
    OutOfBounds {
        contig: String,
        start: i64,
        end: i64,
        contig_length: u64,
    },

    /// A run parameter failed validation
    #[error("Invalid parameter {name}: {msg}")]
    InvalidParameter { name: String, msg: String },

    /// Configuration file could not be parsed
    #[error("Invalid configuration: {msg}")]
    Config { msg: String },

    /// A network or data provider failed
    #[error("Provider {provider} unavailable: {msg}")]
    ProviderUnavailable { provider: String, msg: String },

    /// Offline mode and the request was never cached
    #[error("Cache miss in offline mode: {key}")]
    CacheMiss { key: String },

    /// Writing an output artifact failed
    #[error("Serialization error: {msg}")]
    Serialization { msg: String },

    /// IO error
    #[error("IO error: {msg}")]
    Io { msg: String },

    /// JSON error
    #[error("JSON error: {msg}")]
    Json { msg: String },
}

impl NegFeatError {
    /// Create an invalid parameter error
    pub fn invalid_parameter(name: impl Into<String>, msg: impl Into<String>) -> Self {
        NegFeatError::InvalidParameter {
            name: name.into(),
            msg: msg.into(),
        }
    }

    /// Create a provider failure
    pub fn provider(provider: impl Into<String>, msg: impl Into<String>) -> Self {
        NegFeatError::ProviderUnavailable {
            provider: provider.into(),
            msg: msg.into(),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            NegFeatError::LocusUnresolved { .. } => ErrorCode::LocusUnresolved,
            NegFeatError::OutOfBounds { .. } => ErrorCode::OutOfBounds,
            NegFeatError::InvalidParameter { .. } => ErrorCode::InvalidParameter,
            NegFeatError::Config { .. } => ErrorCode::InvalidConfig,
            NegFeatError::ProviderUnavailable { .. } => ErrorCode::ProviderUnavailable,
            NegFeatError::CacheMiss { .. } => ErrorCode::CacheMiss,
            NegFeatError::Serialization { .. } => ErrorCode::SerializationFailed,
            NegFeatError::Io { .. } => ErrorCode::IoError,
            NegFeatError::Json { .. } => ErrorCode::JsonError,
        }
    }

    /// Process exit status for this error
    ///
    /// Always non-zero; groups follow the error code thousands digit.
    pub fn exit_code(&self) -> i32 {
        (self.code() as u16 / 1000) as i32
    }
}

impl From<std::io::Error> for NegFeatError {
    fn from(err: std::io::Error) -> Self {
        NegFeatError::Io {
            msg: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for NegFeatError {
    fn from(err: serde_json::Error) -> Self {
        NegFeatError::Json {
            msg: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for NegFeatError {
    fn from(err: toml::de::Error) -> Self {
        NegFeatError::Config {
            msg: err.to_string(),
        }
    }
}
