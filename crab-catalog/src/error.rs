//! Unified service-layer error type for crab-catalog
//!
//! `ServiceError` bridges store-layer errors (`RepoError`) and the business
//! error (`AppError`), so `?` works across both without manual mapping.

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use crate::store::RepoError;

/// Service-layer error, two variants only.
///
/// - `Repo`: store/infrastructure errors (logged when collapsed into an AppError)
/// - `App`: business-rule errors (passed through unchanged)
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    App(#[from] AppError),
}

impl ServiceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::App(err) => err.code,
            ServiceError::Repo(RepoError::NotFound(_)) => ErrorCode::NotFound,
            ServiceError::Repo(RepoError::Duplicate(_)) => ErrorCode::AlreadyExists,
            ServiceError::Repo(RepoError::Validation(_)) => ErrorCode::ValidationFailed,
            ServiceError::Repo(RepoError::Storage(_)) => ErrorCode::StorageError,
            ServiceError::Repo(RepoError::Database(_)) => ErrorCode::DatabaseError,
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Repo(repo_err) => {
                tracing::error!(error = %repo_err, "Store error");
                match repo_err {
                    RepoError::NotFound(what) => AppError::not_found(what),
                    RepoError::Duplicate(what) => AppError::already_exists(what),
                    RepoError::Validation(msg) => AppError::validation(msg),
                    RepoError::Storage(msg) => AppError::with_message(ErrorCode::StorageError, msg),
                    RepoError::Database(msg) => AppError::database(msg),
                }
            }
        }
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_error_maps_to_code() {
        let err: ServiceError = RepoError::Storage("bucket gone".into()).into();
        assert_eq!(err.code(), ErrorCode::StorageError);
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::StorageError);
        assert_eq!(app.message, "bucket gone");
    }

    #[test]
    fn test_app_error_passes_through() {
        let err: ServiceError = AppError::quota_exceeded("t", 11, 10).into();
        assert_eq!(err.code(), ErrorCode::TenantQuotaExceeded);
        assert_eq!(err.to_string(), "Tenant t would hold 11 products, quota is 10");
    }

    #[test]
    fn test_database_error_keeps_message() {
        let app: AppError = ServiceError::from(RepoError::Database("timeout".into())).into();
        assert_eq!(app.code, ErrorCode::DatabaseError);
        assert_eq!(app.message, "timeout");
    }
}
