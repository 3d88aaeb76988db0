//! Error types for orgaudit-github

use orgaudit_core::GatewayError;
use thiserror::Error;

/// Errors raised while setting up the GitHub gateway.
#[derive(Error, Debug)]
pub enum GitHubError {
    /// Missing or invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl From<GitHubError> for orgaudit_core::AuditError {
    fn from(err: GitHubError) -> Self {
        orgaudit_core::AuditError::Config(err.to_string())
    }
}

/// Map a transport-level reqwest failure onto the gateway taxonomy.
pub(crate) fn transport(err: reqwest::Error) -> GatewayError {
    if err.is_decode() {
        GatewayError::Decode(err.to_string())
    } else {
        GatewayError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_becomes_audit_config_error() {
        let err: orgaudit_core::AuditError = GitHubError::Config("token is not set".into()).into();
        assert!(matches!(err, orgaudit_core::AuditError::Config(ref m) if m.contains("token")));
    }
}
