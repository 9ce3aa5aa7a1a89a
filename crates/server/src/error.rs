//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::cart::CartError;
use crate::services::checkout::CheckoutError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout operation failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Request lacks a valid access credential.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Authenticated but not allowed to touch the resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error represents an infrastructure fault worth reporting.
    fn is_server_fault(&self) -> bool {
        match self {
            Self::Repository(_) | Self::Internal(_) => true,
            Self::Auth(
                AuthError::Repository(_) | AuthError::PasswordHash | AuthError::TokenIssue(_),
            ) => true,
            Self::Cart(CartError::Repository(_)) => true,
            Self::Checkout(
                CheckoutError::Repository(_) | CheckoutError::CatalogInconsistency(_),
            ) => true,
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Repository(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::InvalidRefreshToken => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::UsernameTaken => StatusCode::CONFLICT,
                AuthError::InvalidUsername(_) | AuthError::WeakPassword(_) => {
                    StatusCode::BAD_REQUEST
                }
                AuthError::Repository(_) | AuthError::PasswordHash | AuthError::TokenIssue(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Cart(err) => match err {
                CartError::UserNotFound(_) | CartError::GameNotFound(_) => StatusCode::NOT_FOUND,
                CartError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Checkout(err) => match err {
                CheckoutError::UserNotFound(_) => StatusCode::NOT_FOUND,
                CheckoutError::EmptyCart
                | CheckoutError::InvalidAddress(_)
                | CheckoutError::InvalidPayment(_) => StatusCode::BAD_REQUEST,
                CheckoutError::CatalogInconsistency(_) | CheckoutError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Client-facing message. Internal detail stays in the logs.
    fn message(&self) -> String {
        match self {
            Self::Repository(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::InvalidRefreshToken => "Invalid refresh token".to_string(),
                AuthError::UsernameTaken => "Username already exists".to_string(),
                AuthError::InvalidUsername(e) => e.to_string(),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::Repository(_) | AuthError::PasswordHash | AuthError::TokenIssue(_) => {
                    "Internal server error".to_string()
                }
            },
            Self::Cart(err) => match err {
                CartError::UserNotFound(_) => "User not found".to_string(),
                CartError::GameNotFound(_) => "Game not found".to_string(),
                CartError::Repository(_) => "Internal server error".to_string(),
            },
            Self::Checkout(err) => match err {
                CheckoutError::UserNotFound(_) => "User not found".to_string(),
                CheckoutError::EmptyCart => "Cart is empty".to_string(),
                CheckoutError::InvalidAddress(reason) => {
                    format!("Invalid shipping address: {reason}")
                }
                CheckoutError::InvalidPayment(reason) => {
                    format!("Invalid payment details: {reason}")
                }
                CheckoutError::CatalogInconsistency(_) | CheckoutError::Repository(_) => {
                    "Internal server error".to_string()
                }
            },
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server faults to Sentry; validation noise stays local
        if self.is_server_fault() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let body = Json(json!({ "message": self.message() }));

        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
