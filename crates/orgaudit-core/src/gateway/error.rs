//! Error types for platform gateway calls.

use thiserror::Error;

/// Errors produced by a platform gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The requested object does not exist. Callers treat this as absence.
    #[error("not found: {0}")]
    NotFound(String),

    /// The object to create is already there (e.g. a git ref).
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The platform answered with a non-success status.
    #[error("platform API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The platform throttled the request.
    #[error("rate limited by platform, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body did not match the expected shape.
    #[error("failed to decode platform response: {0}")]
    Decode(String),

    /// The platform returned data that breaks an assumption of the auditor.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, GatewayError::AlreadyExists(_))
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Decode(err.to_string())
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Turns the `NotFound` absence signal into `Ok(None)`.
pub trait OptionalExt<T> {
    fn optional(self) -> GatewayResult<Option<T>>;
}

impl<T> OptionalExt<T> for GatewayResult<T> {
    fn optional(self) -> GatewayResult<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(GatewayError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_swallows_not_found_only() {
        let absent: GatewayResult<u32> = Err(GatewayError::NotFound("x".to_string()));
        assert!(matches!(absent.optional(), Ok(None)));

        let present: GatewayResult<u32> = Ok(7);
        assert!(matches!(present.optional(), Ok(Some(7))));

        let failed: GatewayResult<u32> = Err(GatewayError::Api {
            status: 500,
            message: "boom".to_string(),
        });
        assert!(failed.optional().is_err());
    }

    #[test]
    fn test_api_error_displays_status() {
        let err = GatewayError::Api {
            status: 422,
            message: "validation failed".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("422"));
        assert!(msg.contains("validation failed"));
    }
}
