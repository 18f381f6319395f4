//! # AppError
//!
//! Centralized error handling for the DevFlow workspace.
//! Every service operation surfaces one of these variants to its caller.

use thiserror::Error;

/// The primary error type for all df-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Referenced entity does not resolve (e.g., Question, Answer, Tag, User)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Malformed input (e.g., empty title, page 0)
    #[error("validation error: {0}")]
    Validation(String),

    /// Uniqueness violation or upsert race (e.g., duplicate username)
    #[error("creation failed: {0}")]
    Creation(String),

    /// Missing identity, or acting on someone else's content
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Infrastructure failure (e.g., database unavailable)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(kind: &str, id: impl ToString) -> Self {
        Self::NotFound(kind.to_string(), id.to_string())
    }
}

/// Port implementations report failures through `anyhow`. A plugin that
/// wants a specific variant wraps an `AppError`, which is recovered here.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<AppError>() {
            Ok(app) => app,
            Err(other) => AppError::Internal(format!("{other:#}")),
        }
    }
}

/// A specialized Result type for DevFlow logic.
pub type Result<T> = std::result::Result<T, AppError>;
