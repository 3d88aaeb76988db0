//! Error taxonomy of the audit engine.

use crate::gateway::GatewayError;
use crate::issue::IssueKind;

/// Errors that abort an audit run (or a single fix, when raised by a fixer).
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("fixer for {kind} registered twice")]
    DuplicateFixer { kind: IssueKind },

    #[error("no cached permission for team '{team}' on repository '{repository}'")]
    MissingPermission { team: String, repository: String },

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AuditError {
    /// Whether this error is a data/programming error rather than a platform failure.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            AuditError::MissingPermission { .. }
                | AuditError::Invariant(_)
                | AuditError::Gateway(GatewayError::Invariant(_))
        )
    }
}

/// Result type for audit operations.
pub type Result<T> = std::result::Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_is_transparent() {
        let err: AuditError = GatewayError::Api {
            status: 502,
            message: "bad gateway".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "platform API error (502): bad gateway");
        assert!(!err.is_invariant_violation());
    }

    #[test]
    fn test_missing_permission_is_invariant_violation() {
        let err = AuditError::MissingPermission {
            team: "payments".to_string(),
            repository: "acme/ledger".to_string(),
        };
        assert!(err.is_invariant_violation());
        assert!(err.to_string().contains("acme/ledger"));
    }

    #[test]
    fn test_duplicate_fixer_names_kind() {
        let err = AuditError::DuplicateFixer {
            kind: IssueKind::MissedCodeOwners,
        };
        assert!(err.to_string().contains("MissedCodeOwners"));
    }
}
