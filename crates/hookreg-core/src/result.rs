//! Convenience result type alias for hookreg-core.

use crate::error::CoreError;

/// A specialized `Result` type for configuration and logging setup.
pub type CoreResult<T> = Result<T, CoreError>;
