use std::sync::Arc;

use async_trait::async_trait;

use crate::analyzers::RepositoryAnalyzer;
use crate::gateway::{PlatformGateway, RepositorySettings};
use crate::issue::RepositoryIssue;
use crate::metadata::RepositoryMetadata;
use crate::Result;

/// Merge strategy and feature settings.
pub struct SettingsAnalyzer {
    gateway: Arc<dyn PlatformGateway>,
}

impl SettingsAnalyzer {
    pub fn new(gateway: Arc<dyn PlatformGateway>) -> Self {
        Self { gateway }
    }
}

pub fn evaluate(settings: &RepositorySettings) -> Vec<RepositoryIssue> {
    let mut issues = Vec::new();
    if settings.merge_commit_allowed {
        issues.push(RepositoryIssue::MergeCommitAllowed);
    }
    if !settings.squash_merge_allowed {
        issues.push(RepositoryIssue::SquashMergeDisabled);
    }
    if !settings.auto_merge_allowed {
        issues.push(RepositoryIssue::AutoMergeDisabled);
    }
    if !settings.delete_branch_on_merge {
        issues.push(RepositoryIssue::DeleteBranchOnMergeDisabled);
    }
    if settings.has_wiki {
        issues.push(RepositoryIssue::WikiEnabled);
    }
    issues
}

#[async_trait]
impl RepositoryAnalyzer for SettingsAnalyzer {
    fn name(&self) -> &'static str {
        "settings"
    }

    async fn analyze(&self, metadata: &RepositoryMetadata) -> Result<Vec<RepositoryIssue>> {
        let repository = &metadata.repository;
        let settings = self
            .gateway
            .repository_settings(&repository.owner, &repository.name)
            .await?;
        Ok(evaluate(&settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::compliant_settings;

    #[test]
    fn test_compliant_settings() {
        assert!(evaluate(&compliant_settings()).is_empty());
    }

    #[test]
    fn test_rebase_setting_is_not_policed() {
        let settings = RepositorySettings {
            rebase_merge_allowed: false,
            ..compliant_settings()
        };
        assert!(evaluate(&settings).is_empty());
    }

    #[test]
    fn test_every_violation_is_reported() {
        let settings = RepositorySettings {
            merge_commit_allowed: true,
            rebase_merge_allowed: true,
            squash_merge_allowed: false,
            auto_merge_allowed: false,
            delete_branch_on_merge: false,
            has_wiki: true,
        };
        assert_eq!(
            evaluate(&settings),
            vec![
                RepositoryIssue::MergeCommitAllowed,
                RepositoryIssue::SquashMergeDisabled,
                RepositoryIssue::AutoMergeDisabled,
                RepositoryIssue::DeleteBranchOnMergeDisabled,
                RepositoryIssue::WikiEnabled,
            ]
        );
    }
}
