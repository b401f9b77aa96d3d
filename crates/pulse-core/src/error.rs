//! # Error Types
//!
//! What the pure analytics code can reject.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Where Errors Live                                │
//! │                                                                         │
//! │  pulse-core errors (this file)                                         │
//! │  ├── CoreError        - Period tokens, timezone, domain failures       │
//! │  └── ValidationError  - Malformed records and inputs                   │
//! │                                                                         │
//! │  pulse-store errors (separate crate)                                   │
//! │  └── DbError          - Inbound order store failures                   │
//! │                                                                         │
//! │  pulse-service errors (separate crate)                                 │
//! │  ├── SourceError      - Order source unavailable / timed out           │
//! │  └── ServiceError     - What the presentation layer sees               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Zero denominators (no previous value, no velocity, empty distributions)
//! are NOT errors here. They resolve to defined sentinel values in the
//! modules that meet them.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core analytics errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The requested period token is not one of the recognised tokens.
    ///
    /// ## When This Occurs
    /// - UI sends a token from a newer build (`"qtd"`)
    /// - Malformed month key (`"2025-13"`, `"2025-1"`)
    ///
    /// Callers must surface this; there is no fallback window.
    #[error("Invalid period token: '{0}'")]
    InvalidPeriodToken(String),

    /// The configured business timezone is not a known IANA zone.
    #[error("Unknown timezone: '{0}'")]
    UnknownTimezone(String),

    /// A computed calendar date fell outside the representable range.
    #[error("Date out of range while computing {0}")]
    DateOutOfRange(String),

    /// Writing a CSV export failed.
    #[error("CSV export failed: {0}")]
    Export(String),

    /// A record or input failed field checks.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Field-level rejection of a single record.
///
/// Used to quarantine malformed order records and reject bad inbound orders
/// before they reach the aggregation code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Missing, or blank after trimming.
    #[error("{field} is required")]
    Required { field: String },

    /// Zero or below where only positive values make sense.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Unparseable amount, date or identifier.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Outside a closed set of accepted strings.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvalidPeriodToken("qtd".to_string());
        assert_eq!(err.to_string(), "Invalid period token: 'qtd'");

        let err = ValidationError::MustNotBeNegative {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must not be negative");
    }

    #[test]
    fn test_validation_wraps_into_core_error() {
        let err: CoreError = ValidationError::Required {
            field: "sku".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Invalid input: sku is required");
    }
}
