//! Convenience result type alias for PharmaDoc.

use crate::error::AppError;

/// A specialized `Result` type for PharmaDoc operations.
pub type AppResult<T> = Result<T, AppError>;
