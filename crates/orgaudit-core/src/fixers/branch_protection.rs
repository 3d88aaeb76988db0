//! Branch-protection remediation with partial patches.
//!
//! A missing rule is created with the full compliant field set. Every other
//! issue updates only the fields tied to that violation, so fields that are
//! already compliant (or changed concurrently) are never overwritten.

use std::sync::Arc;

use async_trait::async_trait;

use crate::fix::FixResult;
use crate::fixers::{unsupported, IssueFixer};
use crate::gateway::{BranchProtectionRulePatch, NewBranchProtectionRule, PlatformGateway, RuleId};
use crate::issue::{IssueKind, RepositoryIssue, EXPECTED_APPROVING_REVIEW_COUNT};
use crate::metadata::RepositoryMetadata;
use crate::Result;

const KINDS: &[IssueKind] = &[
    IssueKind::MissedBranchProtection,
    IssueKind::AdminsAreNotEnforced,
    IssueKind::ApprovingReviewsNonRequired,
    IssueKind::CodeOwnerReviewsNonRequired,
    IssueKind::StaleReviewsAreNotDismissed,
    IssueKind::InvalidApprovingReviewCount,
    IssueKind::StatusChecksNonRequired,
    IssueKind::StrictStatusChecksNonRequired,
];

pub struct BranchProtectionFixer {
    gateway: Arc<dyn PlatformGateway>,
}

impl BranchProtectionFixer {
    pub fn new(gateway: Arc<dyn PlatformGateway>) -> Self {
        Self { gateway }
    }
}

/// Rule id and minimal patch for an update-style issue.
pub fn patch_for(issue: &RepositoryIssue) -> Option<(&RuleId, BranchProtectionRulePatch)> {
    let patch = BranchProtectionRulePatch::default();
    match issue {
        RepositoryIssue::AdminsAreNotEnforced { rule_id } => Some((
            rule_id,
            BranchProtectionRulePatch {
                is_admin_enforced: Some(true),
                ..patch
            },
        )),
        RepositoryIssue::ApprovingReviewsNonRequired { rule_id } => Some((
            rule_id,
            BranchProtectionRulePatch {
                requires_approving_reviews: Some(true),
                requires_code_owner_reviews: Some(true),
                dismisses_stale_reviews: Some(true),
                required_approving_review_count: Some(EXPECTED_APPROVING_REVIEW_COUNT),
                ..patch
            },
        )),
        RepositoryIssue::CodeOwnerReviewsNonRequired { rule_id } => Some((
            rule_id,
            BranchProtectionRulePatch {
                requires_code_owner_reviews: Some(true),
                ..patch
            },
        )),
        RepositoryIssue::StaleReviewsAreNotDismissed { rule_id } => Some((
            rule_id,
            BranchProtectionRulePatch {
                dismisses_stale_reviews: Some(true),
                ..patch
            },
        )),
        RepositoryIssue::InvalidApprovingReviewCount {
            rule_id, expected, ..
        } => Some((
            rule_id,
            BranchProtectionRulePatch {
                required_approving_review_count: Some(*expected),
                ..patch
            },
        )),
        RepositoryIssue::StatusChecksNonRequired { rule_id } => Some((
            rule_id,
            BranchProtectionRulePatch {
                requires_status_checks: Some(true),
                requires_strict_status_checks: Some(true),
                ..patch
            },
        )),
        RepositoryIssue::StrictStatusChecksNonRequired { rule_id } => Some((
            rule_id,
            BranchProtectionRulePatch {
                requires_strict_status_checks: Some(true),
                ..patch
            },
        )),
        _ => None,
    }
}

#[async_trait]
impl IssueFixer for BranchProtectionFixer {
    fn name(&self) -> &'static str {
        "branch_protection"
    }

    fn supported_kinds(&self) -> &'static [IssueKind] {
        KINDS
    }

    async fn fix(
        &self,
        issue: &RepositoryIssue,
        metadata: &RepositoryMetadata,
    ) -> Result<FixResult> {
        let repository = &metadata.repository;

        if let RepositoryIssue::MissedBranchProtection = issue {
            let rule = NewBranchProtectionRule {
                repository_node_id: repository.node_id.clone(),
                pattern: repository.default_branch.clone(),
                fields: BranchProtectionRulePatch::compliant(),
            };
            self.gateway.create_branch_protection_rule(&rule).await?;
            return Ok(FixResult::fixed());
        }

        let Some((rule_id, patch)) = patch_for(issue) else {
            return Ok(unsupported(issue));
        };
        tracing::debug!(
            repository = %repository.full_name,
            rule_id = %rule_id,
            fields = patch.field_count(),
            "updating branch protection rule"
        );
        self.gateway
            .update_branch_protection_rule(rule_id, &patch)
            .await?;
        Ok(FixResult::fixed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{repository, InMemoryGateway, Mutation};

    #[test]
    fn test_single_field_patches() {
        let id = RuleId::new("BPR_1");
        let single = [
            RepositoryIssue::AdminsAreNotEnforced { rule_id: id.clone() },
            RepositoryIssue::CodeOwnerReviewsNonRequired { rule_id: id.clone() },
            RepositoryIssue::StaleReviewsAreNotDismissed { rule_id: id.clone() },
            RepositoryIssue::InvalidApprovingReviewCount {
                rule_id: id.clone(),
                actual: 3,
                expected: 1,
            },
            RepositoryIssue::StrictStatusChecksNonRequired { rule_id: id.clone() },
        ];
        for issue in &single {
            let (rule_id, patch) = patch_for(issue).unwrap();
            assert_eq!(rule_id, &id);
            assert_eq!(patch.field_count(), 1, "{issue:?}");
        }
    }

    #[test]
    fn test_group_patches() {
        let id = RuleId::new("BPR_1");
        let (_, reviews) =
            patch_for(&RepositoryIssue::ApprovingReviewsNonRequired { rule_id: id.clone() })
                .unwrap();
        assert_eq!(reviews.field_count(), 4);
        assert_eq!(reviews.required_approving_review_count, Some(1));

        let (_, checks) =
            patch_for(&RepositoryIssue::StatusChecksNonRequired { rule_id: id }).unwrap();
        assert_eq!(checks.field_count(), 2);
        assert!(patch_for(&RepositoryIssue::MissedBranchProtection).is_none());
    }

    #[tokio::test]
    async fn test_missing_rule_is_created_compliant() {
        let gateway = Arc::new(InMemoryGateway::new());
        let repo = repository(1, "ledger");
        gateway.add_repository(repo.clone(), &[]);
        let fixer = BranchProtectionFixer::new(gateway.clone());

        let metadata = RepositoryMetadata::derive(repo.clone(), &[]);
        let result = fixer
            .fix(&RepositoryIssue::MissedBranchProtection, &metadata)
            .await
            .unwrap();
        assert_eq!(result, FixResult::fixed());
        assert_eq!(
            gateway.mutations(),
            vec![Mutation::CreateRule {
                repository_node_id: repo.node_id.clone(),
                pattern: "main".to_string(),
                fields: BranchProtectionRulePatch::compliant(),
            }]
        );
    }

    #[tokio::test]
    async fn test_fixer_sends_only_relevant_field() {
        let gateway = Arc::new(InMemoryGateway::new());
        let repo = repository(1, "ledger");
        gateway.add_repository(repo.clone(), &[]);
        let fields = BranchProtectionRulePatch {
            is_admin_enforced: Some(false),
            ..BranchProtectionRulePatch::compliant()
        };
        let id = gateway.put_rule(&repo, "main", fields);
        let fixer = BranchProtectionFixer::new(gateway.clone());

        let metadata = RepositoryMetadata::derive(repo, &[]);
        fixer
            .fix(
                &RepositoryIssue::AdminsAreNotEnforced { rule_id: id.clone() },
                &metadata,
            )
            .await
            .unwrap();

        assert_eq!(
            gateway.mutations(),
            vec![Mutation::UpdateRule {
                rule_id: id.clone(),
                patch: BranchProtectionRulePatch {
                    is_admin_enforced: Some(true),
                    ..Default::default()
                },
            }]
        );
        assert_eq!(
            gateway.rule_fields(&id).unwrap(),
            BranchProtectionRulePatch::compliant()
        );
    }
}
