//! Typed remediation.
//!
//! Each fixer declares the [`IssueKind`]s it handles. The [`FixerRegistry`]
//! maps every kind to at most one fixer; registering a kind twice is a
//! configuration error reported at startup.

pub mod access;
pub mod branch_protection;
pub mod code_owners;
pub mod pull_requests;
pub mod settings;

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::fix::FixResult;
use crate::issue::{IssueKind, RepositoryIssue};
use crate::metadata::RepositoryMetadata;
use crate::{AuditError, Result};

pub use access::AccessFixer;
pub use branch_protection::BranchProtectionFixer;
pub use code_owners::CodeOwnersFixer;
pub use pull_requests::PullRequestsFixer;
pub use settings::SettingsFixer;

#[async_trait]
pub trait IssueFixer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Issue kinds routed to this fixer.
    fn supported_kinds(&self) -> &'static [IssueKind];

    async fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Remediate `issue`. An `Err` is downgraded to `NotFixed` by the runner.
    async fn fix(&self, issue: &RepositoryIssue, metadata: &RepositoryMetadata)
        -> Result<FixResult>;
}

/// Result for an issue routed to a fixer that does not handle it.
pub(crate) fn unsupported(issue: &RepositoryIssue) -> FixResult {
    FixResult::not_fixed(format!("Unsupported issue: {}", issue.kind()))
}

/// Lookup table from issue kind to fixer, built once at startup.
#[derive(Default)]
pub struct FixerRegistry {
    fixers: Vec<Box<dyn IssueFixer>>,
    routes: HashMap<IssueKind, usize>,
}

impl FixerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `fixer` for all its kinds. Nothing is registered if any kind
    /// is already taken.
    pub fn register(&mut self, fixer: Box<dyn IssueFixer>) -> Result<()> {
        let kinds = fixer.supported_kinds();
        let mut claimed = HashSet::new();
        for &kind in kinds {
            if self.routes.contains_key(&kind) || !claimed.insert(kind) {
                return Err(AuditError::DuplicateFixer { kind });
            }
        }
        let index = self.fixers.len();
        for &kind in kinds {
            self.routes.insert(kind, index);
        }
        tracing::debug!(fixer = fixer.name(), kinds = kinds.len(), "fixer registered");
        self.fixers.push(fixer);
        Ok(())
    }

    /// Builder form of [`FixerRegistry::register`].
    pub fn with(mut self, fixer: impl IssueFixer + 'static) -> Result<Self> {
        self.register(Box::new(fixer))?;
        Ok(self)
    }

    pub async fn initialize(&mut self) -> Result<()> {
        for fixer in &mut self.fixers {
            fixer.initialize().await?;
        }
        Ok(())
    }

    pub fn fixer_for(&self, kind: IssueKind) -> Option<&dyn IssueFixer> {
        self.routes
            .get(&kind)
            .and_then(|index| self.fixers.get(*index))
            .map(|fixer| fixer.as_ref())
    }

    pub fn len(&self) -> usize {
        self.fixers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixers.is_empty()
    }
}
