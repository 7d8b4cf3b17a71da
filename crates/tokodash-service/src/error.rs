//! # API Error Type
//!
//! Unified error type for every service operation.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in TokoDash                               │
//! │                                                                         │
//! │  Dashboard                   Rust Backend                               │
//! │  ─────────                   ────────────                               │
//! │                                                                         │
//! │  updateStatus(id, 'shipped')                                            │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Service Method                                                  │  │
//! │  │  ApiResult<T>                                                    │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Database Error? ─── DbError::QueryFailed("...") ──┐            │  │
//! │  │         │                                          │            │  │
//! │  │         ▼                                          ▼            │  │
//! │  │  Rule violated? ─── CoreError::InsufficientStock ─ ApiError ───►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  toast(e.message)  // e.code = "INSUFFICIENT_STOCK"                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tokodash_core::{CoreError, ValidationError};
use tokodash_db::DbError;

/// Error returned from service operations.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for KAOS-HITAM-L: available 1, requested 2"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found
    NotFound,
    /// Input validation failed
    ValidationError,
    /// Database operation failed
    DatabaseError,
    /// Business rule rejected the operation
    BusinessLogic,
    /// Not enough stock for an outgoing movement
    InsufficientStock,
    /// Store balance does not cover a settlement
    InsufficientBalance,
    /// Anything else
    Internal,
}

/// Result alias for service operations.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a business logic error.
    pub fn business(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::BusinessLogic, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::Conflict { entity, id } => ApiError::new(
                ErrorCode::BusinessLogic,
                format!("{} {} was changed by someone else, reload and retry", entity, id),
            ),
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::VariantNotFound(id) => ApiError::not_found("Product variant", &id),
            CoreError::SaleNotFound(id) => ApiError::not_found("Sale", &id),
            e @ CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, e.to_string())
            }
            e @ CoreError::InsufficientBalance { .. } => {
                ApiError::new(ErrorCode::InsufficientBalance, e.to_string())
            }
            e @ CoreError::InvalidPurchaseStatus { .. } => ApiError::business(e.to_string()),
            e @ CoreError::DiscountTooLarge { .. } => ApiError::validation(e.to_string()),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
