//! Unified error types for Cache Refresher Core.

use thiserror::Error;

/// Main error type for core operations outside the scheduler loop.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    /// Network request failed (HTTP client).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Result type alias for core operations.
pub type AppResult<T> = Result<T, AppError>;
