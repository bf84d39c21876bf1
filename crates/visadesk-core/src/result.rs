//! Convenience result type alias for VisaDesk.

use crate::error::AppError;

/// A specialized `Result` type for VisaDesk operations.
pub type AppResult<T> = Result<T, AppError>;
