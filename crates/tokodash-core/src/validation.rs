//! # Validation Module
//!
//! Input validation for the back office.
//!
//! ## Where Validation Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Dashboard form (TypeScript)  →  quick feedback (empty, length)         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Service call (Rust)          →  THIS MODULE: business rules            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  SQLite                       →  NOT NULL / CHECK / FOREIGN KEY         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tokodash_core::validation::{validate_quantity, validate_sku};
//!
//! assert!(validate_sku("KAOS-HITAM-L").is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::MAX_LINE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU.
///
/// ## Rules
/// - Must not be empty, at most 50 characters
/// - Letters, digits, hyphens and underscores only
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (store, product, supplier, category ...).
///
/// ## Example
/// ```rust
/// use tokodash_core::validation::validate_name;
///
/// assert!(validate_name("name", "Toko Berkah").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates free-text notes, which may be absent.
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<()> {
    match notes {
        Some(notes) if notes.chars().count() > 1_000 => Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: 1_000,
        }),
        _ => Ok(()),
    }
}

/// Validates that a string is a UUID.
pub fn validate_uuid(field: &str, value: &str) -> ValidationResult<()> {
    uuid::Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|e| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: e.to_string(),
        })
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_LINE_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an on-hand stock level (zero allowed).
pub fn validate_stock_level(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::Negative {
            field: "stock_quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates an amount that may be zero (prices, shipping, discounts).
pub fn validate_non_negative_amount(field: &str, amount: i64) -> ValidationResult<()> {
    if amount < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates an amount that must be strictly positive (expenses,
/// incomes, settlements).
pub fn validate_positive_amount(field: &str, amount: i64) -> ValidationResult<()> {
    if amount <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates that a collection has at least one entry.
pub fn validate_not_empty<T>(field: &str, items: &[T]) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::Empty {
            field: field.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sku() {
        assert!(validate_sku("KAOS_01-L").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku("KAOS HITAM").is_err());
        assert!(validate_sku(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_name() {
        assert!(validate_name("name", "Kemeja Flanel").is_ok());
        assert!(matches!(
            validate_name("store", ""),
            Err(ValidationError::Required { field }) if field == "store"
        ));
        assert!(validate_name("name", &"x".repeat(201)).is_err());
    }

    #[test]
    fn test_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_amounts() {
        assert!(validate_non_negative_amount("price", 0).is_ok());
        assert!(validate_non_negative_amount("price", -1).is_err());
        assert!(validate_positive_amount("amount", 0).is_err());
        assert!(validate_positive_amount("amount", 10).is_ok());
        assert!(validate_stock_level(0).is_ok());
        assert!(validate_stock_level(-1).is_err());
    }

    #[test]
    fn test_uuid_and_collections() {
        assert!(validate_uuid("id", "00000000-0000-0000-0000-000000000001").is_ok());
        assert!(validate_uuid("id", "not-a-uuid").is_err());
        assert!(validate_not_empty::<i64>("items", &[]).is_err());
        assert!(validate_not_empty("items", &[1]).is_ok());
        assert!(validate_notes(None).is_ok());
        assert!(validate_notes(Some(&"n".repeat(1_001))).is_err());
    }
}
