//! Default-branch protection policy.
//!
//! Linear history, conversation resolution and force-push/deletion settings
//! are written when a rule is created but not evaluated here: the REST
//! protection payload the gateway reads does not expose them reliably.

use std::sync::Arc;

use async_trait::async_trait;

use crate::analyzers::RepositoryAnalyzer;
use crate::gateway::{BranchProtection, PlatformGateway, RuleId};
use crate::issue::{RepositoryIssue, EXPECTED_APPROVING_REVIEW_COUNT};
use crate::metadata::RepositoryMetadata;
use crate::Result;

pub struct BranchProtectionAnalyzer {
    gateway: Arc<dyn PlatformGateway>,
}

impl BranchProtectionAnalyzer {
    pub fn new(gateway: Arc<dyn PlatformGateway>) -> Self {
        Self { gateway }
    }
}

/// Evaluate an existing rule; one issue per failing condition.
pub fn evaluate(protection: &BranchProtection, rule_id: &RuleId) -> Vec<RepositoryIssue> {
    let mut issues = Vec::new();
    let rule_id = || rule_id.clone();

    if !protection.enforce_admins {
        issues.push(RepositoryIssue::AdminsAreNotEnforced { rule_id: rule_id() });
    }

    match &protection.required_reviews {
        None => issues.push(RepositoryIssue::ApprovingReviewsNonRequired { rule_id: rule_id() }),
        Some(reviews) => {
            if !reviews.require_code_owner_reviews {
                issues.push(RepositoryIssue::CodeOwnerReviewsNonRequired { rule_id: rule_id() });
            }
            if !reviews.dismiss_stale_reviews {
                issues.push(RepositoryIssue::StaleReviewsAreNotDismissed { rule_id: rule_id() });
            }
            if reviews.required_approving_review_count != EXPECTED_APPROVING_REVIEW_COUNT {
                issues.push(RepositoryIssue::InvalidApprovingReviewCount {
                    rule_id: rule_id(),
                    actual: reviews.required_approving_review_count,
                    expected: EXPECTED_APPROVING_REVIEW_COUNT,
                });
            }
        }
    }

    match &protection.required_status_checks {
        None => issues.push(RepositoryIssue::StatusChecksNonRequired { rule_id: rule_id() }),
        Some(checks) if !checks.strict => {
            issues.push(RepositoryIssue::StrictStatusChecksNonRequired { rule_id: rule_id() })
        }
        Some(_) => {}
    }

    issues
}

#[async_trait]
impl RepositoryAnalyzer for BranchProtectionAnalyzer {
    fn name(&self) -> &'static str {
        "branch_protection"
    }

    async fn analyze(&self, metadata: &RepositoryMetadata) -> Result<Vec<RepositoryIssue>> {
        let repository = &metadata.repository;
        let protection = self
            .gateway
            .branch_protection(
                &repository.owner,
                &repository.name,
                &repository.default_branch,
            )
            .await?;

        Ok(match protection {
            None => vec![RepositoryIssue::MissedBranchProtection],
            Some((protection, rule_id)) => evaluate(&protection, &rule_id),
        })
    }
}
