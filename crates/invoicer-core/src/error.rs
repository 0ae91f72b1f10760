//! # Error Types
//!
//! Domain-specific error types for invoicer-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  invoicer-core errors (this file)                                      │
//! │  ├── CoreError        - Money arithmetic, currency lookup              │
//! │  └── ValidationError  - Invoice / line item validation failures        │
//! │                                                                         │
//! │  invoicer-layout errors (separate crate)                               │
//! │  └── LayoutError      - Template lookup, configuration loading         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LayoutError → CLI (anyhow)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, currency codes)
//! 3. Errors are enum variants, never String
//! 4. Nothing is logged-and-ignored: every error reaches the caller

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core computation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Two money values with different currencies were combined.
    ///
    /// ## When This Occurs
    /// - `Money::add` / `Money::sub` across currencies
    /// - Summing line items that slipped past validation
    ///
    /// Amounts are never converted implicitly.
    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: String, right: String },

    /// The currency code is not in the currency table.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    /// A textual amount could not be parsed as an exact decimal.
    #[error("Invalid amount '{input}': {reason}")]
    InvalidAmount { input: String, reason: String },

    /// A percentage was requested against a zero base.
    #[error("Division by zero while computing {operation}")]
    DivisionByZero { operation: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Invoice and line item validation errors.
///
/// These are always surfaced from `InvoiceBuilder::build` before any layout
/// work begins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Due date precedes the issue date.
    #[error("due date {due} cannot be before issue date {issue}")]
    DueDateBeforeIssue { issue: String, due: String },

    /// An invoice needs at least one line item.
    #[error("at least one line item is required")]
    NoLineItems,

    /// A money value does not carry the invoice currency.
    #[error("{field} uses {found}, expected {expected}")]
    CurrencyMismatch {
        field: String,
        expected: String,
        found: String,
    },

    /// Invalid format (e.g., malformed currency code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::CurrencyMismatch {
            left: "USD".to_string(),
            right: "EUR".to_string(),
        };
        assert_eq!(err.to_string(), "Currency mismatch: USD vs EUR");

        let err = CoreError::UnknownCurrency("XYZ".to_string());
        assert_eq!(err.to_string(), "Unknown currency: XYZ");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "invoice number".to_string(),
        };
        assert_eq!(err.to_string(), "invoice number is required");

        let err = ValidationError::CurrencyMismatch {
            field: "line item 'Hosting' unit price".to_string(),
            expected: "USD".to_string(),
            found: "EUR".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "line item 'Hosting' unit price uses EUR, expected USD"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::NoLineItems.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
