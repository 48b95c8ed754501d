//! Result type aliases for the gateway.

use crate::CadgateError;

/// A specialized `Result` type for gateway operations.
pub type CadgateResult<T> = Result<T, CadgateError>;
