//! # AppError
//!
//! Centralized error handling for recipe-board.
//! Every variant is a per-request outcome; none of them stop the process.

use thiserror::Error;

/// The primary error type for all rb-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Board, Recipe, User)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// The recipe is already on the board
    #[error("recipe {recipe_id} is already on board {board_id}")]
    AlreadyLinked { board_id: i64, recipe_id: i64 },

    /// Username or email already registered
    #[error("{0} already taken")]
    DuplicateIdentity(String),

    /// The external recipe API failed or answered with a non-success status
    #[error("external recipe lookup failed: {0}")]
    ExternalLookupFailure(String),

    /// Validation failure (e.g., board name too long, missing ingredients)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Not logged in, or bad credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Logged in, but acting on somebody else's resource
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Infrastructure failure (e.g., DB down)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(kind: &str, id: impl ToString) -> Self {
        AppError::NotFound(kind.to_string(), id.to_string())
    }
}

/// A specialized Result type for recipe-board logic.
pub type Result<T> = std::result::Result<T, AppError>;
