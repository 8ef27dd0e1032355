//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Client-facing messages follow the taxonomy: descriptive for input errors,
//! generic for anything whose detail belongs in the server log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;
use crate::services::easypost::EasyPostError;
use crate::services::stripe::StripeError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout orchestration failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// `EasyPost` (address/rates) operation failed.
    #[error("EasyPost error: {0}")]
    Shipping(#[from] EasyPostError),

    /// Stripe (payment intent) operation failed.
    #[error("Stripe error: {0}")]
    Payment(#[from] StripeError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Shipping(_)
                | Self::Payment(_)
                | Self::Checkout(CheckoutError::Repository(_))
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Shipping(_) | Self::Payment(_) => StatusCode::BAD_GATEWAY,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::PasswordHash | AuthError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Checkout(err) => match err {
                CheckoutError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => "Not found".to_string(),
                RepositoryError::Conflict(msg) => msg.clone(),
                _ => "Internal server error".to_string(),
            },
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Shipping(_) | Self::Payment(_) => "External service error".to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    "Invalid credentials".to_string()
                }
                AuthError::UserAlreadyExists => "Email already registered".to_string(),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::PasswordHash | AuthError::Repository(_) => {
                    "Internal server error".to_string()
                }
            },
            Self::Checkout(err) => match err {
                // The order transaction rolled back; payment reconciliation is
                // manual, so the client only learns that checkout failed.
                CheckoutError::Repository(_) => "Checkout failed".to_string(),
                other => other.to_string(),
            },
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order 42".to_string());
        assert_eq!(err.to_string(), "Not found: order 42");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_checkout_rollback_is_generic() {
        let err = AppError::Checkout(CheckoutError::Repository(RepositoryError::NotFound));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_checkout_precondition_is_bad_request() {
        let err = AppError::Checkout(CheckoutError::EmptyCart);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
