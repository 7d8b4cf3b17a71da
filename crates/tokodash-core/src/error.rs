//! # Error Types
//!
//! Domain-specific error types for tokodash-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tokodash-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tokodash-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  tokodash-service errors                                               │
//! │  └── ApiError         - What the dashboard sees (serialized)           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → toast                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product variant cannot be found.
    #[error("Product variant not found: {0}")]
    VariantNotFound(String),

    /// Not enough stock to move the requested quantity out.
    ///
    /// ## User Workflow
    /// ```text
    /// Mark order as shipped (2 × KAOS-HITAM-L)
    ///      │
    ///      ▼
    /// Check stock: available=1
    ///      │
    ///      ▼
    /// InsufficientStock { sku: "KAOS-HITAM-L", available: 1, requested: 2 }
    ///      │
    ///      ▼
    /// Status change aborted, nothing written
    /// ```
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Store balance cannot cover a settlement.
    #[error("Insufficient balance for store {store_id}: available {available}, requested {requested}")]
    InsufficientBalance {
        store_id: String,
        available: i64,
        requested: i64,
    },

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Purchase is not in a state that allows the requested operation.
    #[error("Purchase {purchase_id} is {current_status}, cannot perform operation")]
    InvalidPurchaseStatus {
        purchase_id: String,
        current_status: String,
    },

    /// Discount is larger than what the order is worth.
    #[error("Discount {discount} exceeds subtotal plus shipping {gross}")]
    DiscountTooLarge { discount: i64, gross: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Arithmetic on the value would overflow.
    #[error("{field} is too large")]
    TooLarge { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Date range with start after end.
    #[error("date range start {start} is after end {end}")]
    InvalidDateRange { start: String, end: String },

    /// Collection must not be empty.
    #[error("{field} must contain at least one entry")]
    Empty { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            sku: "KAOS-HITAM-L".to_string(),
            available: 1,
            requested: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for KAOS-HITAM-L: available 1, requested 2"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::InvalidDateRange {
            start: "2026-02-01".to_string(),
            end: "2026-01-01".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "date range start 2026-02-01 is after end 2026-01-01"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
