//! Unified error codes for the catalog engine
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 3xxx: Tenant errors
//! - 6xxx: Catalog errors (products, categories, images)
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,

    // ==================== 3xxx: Tenant ====================
    /// Tenant not found
    TenantNotFound = 3002,
    /// Projected product count exceeds the tenant quota
    TenantQuotaExceeded = 3010,
    /// Source and target tenant are the same
    SameTenant = 3011,

    // ==================== 6xxx: Catalog ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Product insert failed
    ProductCreateFailed = 6002,
    /// Category batch reduced to nothing valid
    CategoryBatchEmpty = 6102,
    /// Category insert failed
    CategoryCreateFailed = 6103,
    /// Image copy failed
    ImageCopyFailed = 6301,
    /// Settings document write failed after retries
    SettingsWriteFailed = 6401,
    /// Clone was cancelled before completion
    CloneCancelled = 6501,

    // ==================== 9xxx: System ====================
    /// Database error
    DatabaseError = 9002,
    /// Blob storage error
    StorageError = 9003,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",

            // Tenant
            ErrorCode::TenantNotFound => "Tenant not found",
            ErrorCode::TenantQuotaExceeded => "Tenant product quota exceeded",
            ErrorCode::SameTenant => "Source and target tenant must differ",

            // Catalog
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductCreateFailed => "Failed to create product",
            ErrorCode::CategoryBatchEmpty => "No valid category names to create",
            ErrorCode::CategoryCreateFailed => "Failed to create categories",
            ErrorCode::ImageCopyFailed => "Failed to copy product image",
            ErrorCode::SettingsWriteFailed => "Failed to write category display settings",
            ErrorCode::CloneCancelled => "Clone was cancelled",

            // System
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::StorageError => "Storage error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

/// Error returned when converting an unknown u16 into [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),

            3002 => Ok(ErrorCode::TenantNotFound),
            3010 => Ok(ErrorCode::TenantQuotaExceeded),
            3011 => Ok(ErrorCode::SameTenant),

            6001 => Ok(ErrorCode::ProductNotFound),
            6002 => Ok(ErrorCode::ProductCreateFailed),
            6102 => Ok(ErrorCode::CategoryBatchEmpty),
            6103 => Ok(ErrorCode::CategoryCreateFailed),
            6301 => Ok(ErrorCode::ImageCopyFailed),
            6401 => Ok(ErrorCode::SettingsWriteFailed),
            6501 => Ok(ErrorCode::CloneCancelled),

            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::StorageError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::TenantNotFound.code(), 3002);
        assert_eq!(ErrorCode::TenantQuotaExceeded.code(), 3010);
        assert_eq!(ErrorCode::CategoryBatchEmpty.code(), 6102);
        assert_eq!(ErrorCode::SettingsWriteFailed.code(), 6401);
        assert_eq!(ErrorCode::StorageError.code(), 9003);
    }

    #[test]
    fn test_try_from_covers_every_code() {
        let all = [
            ErrorCode::Success,
            ErrorCode::Unknown,
            ErrorCode::ValidationFailed,
            ErrorCode::NotFound,
            ErrorCode::AlreadyExists,
            ErrorCode::TenantNotFound,
            ErrorCode::TenantQuotaExceeded,
            ErrorCode::SameTenant,
            ErrorCode::ProductNotFound,
            ErrorCode::ProductCreateFailed,
            ErrorCode::CategoryBatchEmpty,
            ErrorCode::CategoryCreateFailed,
            ErrorCode::ImageCopyFailed,
            ErrorCode::SettingsWriteFailed,
            ErrorCode::CloneCancelled,
            ErrorCode::DatabaseError,
            ErrorCode::StorageError,
        ];
        for code in all {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
        assert_eq!(
            InvalidErrorCode(4242).to_string(),
            "invalid error code: 4242"
        );
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::TenantQuotaExceeded).unwrap();
        assert_eq!(json, "3010");
        let code: ErrorCode = serde_json::from_str("6102").unwrap();
        assert_eq!(code, ErrorCode::CategoryBatchEmpty);
        assert!(serde_json::from_str::<ErrorCode>("1234").is_err());
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::NotFound.is_success());
    }
}
