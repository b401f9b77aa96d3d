//! # Service Errors
//!
//! Error types for the order source and the dashboard service.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Service Error Flow                               │
//! │                                                                         │
//! │  OrderSource::fetch_page ──► SourceError ──┐                           │
//! │                                             │                           │
//! │                                             ▼                           │
//! │                              DashboardService                           │
//! │                              (zeroes that metric, warn!)                │
//! │                                                                         │
//! │  PeriodToken parse ──► CoreError ──────┐                               │
//! │  Inbound store     ──► DbError   ──────┼──► ServiceError ──► caller    │
//! │  Config file       ──► io / toml ──────┘                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Source failures never reach the caller of a dashboard query. A bad period
//! token always does.

use pulse_core::CoreError;
use pulse_store::DbError;
use thiserror::Error;

// =============================================================================
// Order Source Errors
// =============================================================================

/// Failure talking to the order source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// The source could not be reached or answered with an error.
    #[error("Order source unavailable: {0}")]
    Unavailable(String),

    /// A fetch did not complete in time.
    #[error("Order source timed out after {0}s")]
    Timeout(u64),

    /// The source rejected a continuation token.
    #[error("Invalid page token: {0}")]
    InvalidPageToken(String),
}

impl SourceError {
    /// Returns true if retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Unavailable(_) | SourceError::Timeout(_))
    }
}

// =============================================================================
// Service Errors
// =============================================================================

/// Errors surfaced by the service crate.
#[derive(Debug, Error)]
pub enum ServiceError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load configuration file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save configuration file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Domain Errors
    // =========================================================================
    /// Bad period token, unknown timezone, or an out-of-range date.
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Dependency Errors
    // =========================================================================
    /// Inbound order store failure.
    #[error("Store error: {0}")]
    Store(#[from] DbError),

    /// Order source failure that could not be recovered.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Reading an input file failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// Input or output JSON was malformed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ServiceError {
    fn from(err: toml::de::Error) -> Self {
        ServiceError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ServiceError {
    fn from(err: toml::ser::Error) -> Self {
        ServiceError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ServiceError {
    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ServiceError::InvalidConfig(_)
                | ServiceError::ConfigLoadFailed(_)
                | ServiceError::ConfigSaveFailed(_)
                | ServiceError::Core(CoreError::UnknownTimezone(_))
        )
    }

    /// Returns true if the caller sent a request the service cannot answer.
    pub fn is_bad_request(&self) -> bool {
        matches!(self, ServiceError::Core(CoreError::InvalidPeriodToken(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_source_errors() {
        assert!(SourceError::Unavailable("502".into()).is_transient());
        assert!(SourceError::Timeout(20).is_transient());
        assert!(!SourceError::InvalidPageToken("abc".into()).is_transient());
    }

    #[test]
    fn test_error_categories() {
        let bad_token: ServiceError = CoreError::InvalidPeriodToken("fortnight".into()).into();
        assert!(bad_token.is_bad_request());
        assert!(!bad_token.is_config_error());
        assert!(bad_token.to_string().contains("fortnight"));

        let bad_zone: ServiceError = CoreError::UnknownTimezone("Mars/Olympus".into()).into();
        assert!(bad_zone.is_config_error());

        assert!(ServiceError::InvalidConfig("page_size".into()).is_config_error());
    }

    #[test]
    fn test_store_error_conversion() {
        let err: ServiceError = DbError::not_found("InboundOrder", "abc").into();
        assert!(matches!(err, ServiceError::Store(_)));
        assert!(err.to_string().contains("abc"));
    }
}
