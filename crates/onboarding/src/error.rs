//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Registration outcomes are
//! not errors; the orchestrator always answers with a
//! [`reparto_core::ProvisioningOutcome`], so this type only covers the
//! failures that happen before an orchestrator run can start.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::supabase::SupabaseError;

/// Application-level error type for the onboarding service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend client could not be constructed or reached.
    #[error("Backend error: {0}")]
    Backend(#[from] SupabaseError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        let event_id = sentry::capture_error(&self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Request error"
        );

        let status = match &self {
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Backend(_) => "External service error".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
