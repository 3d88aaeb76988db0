use std::sync::Arc;

use async_trait::async_trait;

use crate::fix::FixResult;
use crate::fixers::{unsupported, IssueFixer};
use crate::gateway::{PlatformGateway, RepositorySettingsPatch};
use crate::issue::{IssueKind, RepositoryIssue};
use crate::metadata::RepositoryMetadata;
use crate::Result;

const KINDS: &[IssueKind] = &[
    IssueKind::MergeCommitAllowed,
    IssueKind::SquashMergeDisabled,
    IssueKind::AutoMergeDisabled,
    IssueKind::DeleteBranchOnMergeDisabled,
    IssueKind::WikiEnabled,
];

/// Flips the single offending repository setting.
pub struct SettingsFixer {
    gateway: Arc<dyn PlatformGateway>,
}

impl SettingsFixer {
    pub fn new(gateway: Arc<dyn PlatformGateway>) -> Self {
        Self { gateway }
    }
}

pub fn patch_for(issue: &RepositoryIssue) -> Option<RepositorySettingsPatch> {
    let patch = RepositorySettingsPatch::default();
    Some(match issue {
        RepositoryIssue::MergeCommitAllowed => RepositorySettingsPatch {
            merge_commit_allowed: Some(false),
            ..patch
        },
        RepositoryIssue::SquashMergeDisabled => RepositorySettingsPatch {
            squash_merge_allowed: Some(true),
            ..patch
        },
        RepositoryIssue::AutoMergeDisabled => RepositorySettingsPatch {
            auto_merge_allowed: Some(true),
            ..patch
        },
        RepositoryIssue::DeleteBranchOnMergeDisabled => RepositorySettingsPatch {
            delete_branch_on_merge: Some(true),
            ..patch
        },
        RepositoryIssue::WikiEnabled => RepositorySettingsPatch {
            has_wiki: Some(false),
            ..patch
        },
        _ => return None,
    })
}

#[async_trait]
impl IssueFixer for SettingsFixer {
    fn name(&self) -> &'static str {
        "settings"
    }

    fn supported_kinds(&self) -> &'static [IssueKind] {
        KINDS
    }

    async fn fix(
        &self,
        issue: &RepositoryIssue,
        metadata: &RepositoryMetadata,
    ) -> Result<FixResult> {
        let Some(patch) = patch_for(issue) else {
            return Ok(unsupported(issue));
        };
        self.gateway
            .update_repository_settings(&metadata.repository, &patch)
            .await?;
        Ok(FixResult::fixed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{compliant_settings, repository, InMemoryGateway};
    use crate::gateway::RepositorySettings;

    #[tokio::test]
    async fn test_wiki_fix_leaves_other_settings() {
        let gateway = Arc::new(InMemoryGateway::new());
        let repo = repository(1, "ledger");
        gateway.add_repository(repo.clone(), &[]);
        let drifted = RepositorySettings {
            has_wiki: true,
            merge_commit_allowed: true,
            ..compliant_settings()
        };
        gateway.set_settings(&repo, drifted.clone());

        let fixer = SettingsFixer::new(gateway.clone());
        let metadata = RepositoryMetadata::derive(repo.clone(), &[]);
        let result = fixer
            .fix(&RepositoryIssue::WikiEnabled, &metadata)
            .await
            .unwrap();

        assert_eq!(result, FixResult::fixed());
        assert_eq!(
            gateway.settings_of(&repo).unwrap(),
            RepositorySettings {
                has_wiki: false,
                ..drifted
            }
        );
    }

    #[test]
    fn test_every_kind_has_a_patch() {
        let issues = [
            RepositoryIssue::MergeCommitAllowed,
            RepositoryIssue::SquashMergeDisabled,
            RepositoryIssue::AutoMergeDisabled,
            RepositoryIssue::DeleteBranchOnMergeDisabled,
            RepositoryIssue::WikiEnabled,
        ];
        for issue in &issues {
            assert!(KINDS.contains(&issue.kind()));
            assert!(patch_for(issue).is_some());
        }
        assert!(patch_for(&RepositoryIssue::MissedCodeOwners).is_none());
    }
}
