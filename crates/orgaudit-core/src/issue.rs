//! Closed catalogue of governance issues.
//!
//! Every variant carries what is needed both to display and to remediate it.
//! Identity is structural: two issues are the same if variant and fields match.
//! [`IssueKind`] is the fieldless tag used to route an issue to its fixer.

use std::fmt;

use chrono::Duration;
use serde::{Serialize, Serializer};

use crate::gateway::RuleId;
use crate::permission::Permission;

/// Pull requests open longer than this are reported as stalled.
pub const STALLED_AFTER_DAYS: i64 = 7;

/// Required approving review count on a default branch.
pub const EXPECTED_APPROVING_REVIEW_COUNT: u32 = 1;

/// Issue detected on a single repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RepositoryIssue {
    // topics
    MissedOwnershipTopic,
    UnknownOwnershipTopic {
        topic: String,
    },
    MissedOrInvalidRepositoryType,

    // access
    MissedTeamAccess {
        team: String,
        permission: Permission,
    },
    InvalidTeamAccess {
        team: String,
        actual: Permission,
        expected: Permission,
    },
    ExtensiveCollaboratorAccess {
        login: String,
        permission: Permission,
    },
    MissedAdminAccess {
        login: String,
    },

    // branch protection
    MissedBranchProtection,
    AdminsAreNotEnforced {
        rule_id: RuleId,
    },
    ApprovingReviewsNonRequired {
        rule_id: RuleId,
    },
    CodeOwnerReviewsNonRequired {
        rule_id: RuleId,
    },
    StaleReviewsAreNotDismissed {
        rule_id: RuleId,
    },
    InvalidApprovingReviewCount {
        rule_id: RuleId,
        actual: u32,
        expected: u32,
    },
    StatusChecksNonRequired {
        rule_id: RuleId,
    },
    StrictStatusChecksNonRequired {
        rule_id: RuleId,
    },

    // code owners
    MissedCodeOwners,

    // pull requests
    MissedReviewersOnPullRequest {
        url: String,
        number: u64,
    },
    PullRequestStalled {
        url: String,
        #[serde(rename = "lifetime_secs", serialize_with = "serialize_lifetime")]
        lifetime: Duration,
        author: String,
        requested_reviewers: Vec<String>,
    },

    // settings
    MergeCommitAllowed,
    SquashMergeDisabled,
    AutoMergeDisabled,
    DeleteBranchOnMergeDisabled,
    WikiEnabled,
}

fn serialize_lifetime<S: Serializer>(lifetime: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(lifetime.num_seconds())
}

/// Fieldless tag of a [`RepositoryIssue`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissedOwnershipTopic,
    UnknownOwnershipTopic,
    MissedOrInvalidRepositoryType,
    MissedTeamAccess,
    InvalidTeamAccess,
    ExtensiveCollaboratorAccess,
    MissedAdminAccess,
    MissedBranchProtection,
    AdminsAreNotEnforced,
    ApprovingReviewsNonRequired,
    CodeOwnerReviewsNonRequired,
    StaleReviewsAreNotDismissed,
    InvalidApprovingReviewCount,
    StatusChecksNonRequired,
    StrictStatusChecksNonRequired,
    MissedCodeOwners,
    MissedReviewersOnPullRequest,
    PullRequestStalled,
    MergeCommitAllowed,
    SquashMergeDisabled,
    AutoMergeDisabled,
    DeleteBranchOnMergeDisabled,
    WikiEnabled,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl RepositoryIssue {
    pub fn kind(&self) -> IssueKind {
        match self {
            RepositoryIssue::MissedOwnershipTopic => IssueKind::MissedOwnershipTopic,
            RepositoryIssue::UnknownOwnershipTopic { .. } => IssueKind::UnknownOwnershipTopic,
            RepositoryIssue::MissedOrInvalidRepositoryType => {
                IssueKind::MissedOrInvalidRepositoryType
            }
            RepositoryIssue::MissedTeamAccess { .. } => IssueKind::MissedTeamAccess,
            RepositoryIssue::InvalidTeamAccess { .. } => IssueKind::InvalidTeamAccess,
            RepositoryIssue::ExtensiveCollaboratorAccess { .. } => {
                IssueKind::ExtensiveCollaboratorAccess
            }
            RepositoryIssue::MissedAdminAccess { .. } => IssueKind::MissedAdminAccess,
            RepositoryIssue::MissedBranchProtection => IssueKind::MissedBranchProtection,
            RepositoryIssue::AdminsAreNotEnforced { .. } => IssueKind::AdminsAreNotEnforced,
            RepositoryIssue::ApprovingReviewsNonRequired { .. } => {
                IssueKind::ApprovingReviewsNonRequired
            }
            RepositoryIssue::CodeOwnerReviewsNonRequired { .. } => {
                IssueKind::CodeOwnerReviewsNonRequired
            }
            RepositoryIssue::StaleReviewsAreNotDismissed { .. } => {
                IssueKind::StaleReviewsAreNotDismissed
            }
            RepositoryIssue::InvalidApprovingReviewCount { .. } => {
                IssueKind::InvalidApprovingReviewCount
            }
            RepositoryIssue::StatusChecksNonRequired { .. } => IssueKind::StatusChecksNonRequired,
            RepositoryIssue::StrictStatusChecksNonRequired { .. } => {
                IssueKind::StrictStatusChecksNonRequired
            }
            RepositoryIssue::MissedCodeOwners => IssueKind::MissedCodeOwners,
            RepositoryIssue::MissedReviewersOnPullRequest { .. } => {
                IssueKind::MissedReviewersOnPullRequest
            }
            RepositoryIssue::PullRequestStalled { .. } => IssueKind::PullRequestStalled,
            RepositoryIssue::MergeCommitAllowed => IssueKind::MergeCommitAllowed,
            RepositoryIssue::SquashMergeDisabled => IssueKind::SquashMergeDisabled,
            RepositoryIssue::AutoMergeDisabled => IssueKind::AutoMergeDisabled,
            RepositoryIssue::DeleteBranchOnMergeDisabled => IssueKind::DeleteBranchOnMergeDisabled,
            RepositoryIssue::WikiEnabled => IssueKind::WikiEnabled,
        }
    }

    /// Human-readable one-line description.
    pub fn title(&self) -> String {
        match self {
            RepositoryIssue::MissedOwnershipTopic => "Repository missed ownership topic".into(),
            RepositoryIssue::UnknownOwnershipTopic { topic } => {
                format!("Unknown ownership topic: {topic}")
            }
            RepositoryIssue::MissedOrInvalidRepositoryType => {
                "Repository type missed or invalid".into()
            }
            RepositoryIssue::MissedTeamAccess { team, permission } => {
                format!("Team '{team}' missed '{permission}' access")
            }
            RepositoryIssue::InvalidTeamAccess {
                team,
                actual,
                expected,
            } => format!("Team '{team}' has '{actual}' access instead of '{expected}'"),
            RepositoryIssue::ExtensiveCollaboratorAccess { login, permission } => {
                format!("Collaborator '{login}' has extensive '{permission}' access")
            }
            RepositoryIssue::MissedAdminAccess { login } => {
                format!("Team maintainer '{login}' missed admin access")
            }
            RepositoryIssue::MissedBranchProtection => "Missed branch protection".into(),
            RepositoryIssue::AdminsAreNotEnforced { .. } => "Admins are not enforced".into(),
            RepositoryIssue::ApprovingReviewsNonRequired { .. } => {
                "Approving reviews non-required".into()
            }
            RepositoryIssue::CodeOwnerReviewsNonRequired { .. } => {
                "Code owner reviews non-required".into()
            }
            RepositoryIssue::StaleReviewsAreNotDismissed { .. } => {
                "Stale reviews are not dismissed".into()
            }
            RepositoryIssue::InvalidApprovingReviewCount {
                actual, expected, ..
            } => format!("Invalid approving review count: {actual}/{expected}"),
            RepositoryIssue::StatusChecksNonRequired { .. } => "Status checks non-required".into(),
            RepositoryIssue::StrictStatusChecksNonRequired { .. } => {
                "Strict status checks non-required".into()
            }
            RepositoryIssue::MissedCodeOwners => "Missed code owners configuration".into(),
            RepositoryIssue::MissedReviewersOnPullRequest { url, .. } => {
                format!("Missed reviewers on pull request {url}")
            }
            RepositoryIssue::PullRequestStalled {
                url,
                lifetime,
                author,
                ..
            } => format!(
                "Pull request {url} is stalled for ~{} days from {author}",
                lifetime.num_days()
            ),
            RepositoryIssue::MergeCommitAllowed => "Merge commit allowed".into(),
            RepositoryIssue::SquashMergeDisabled => "Squash merge disabled".into(),
            RepositoryIssue::AutoMergeDisabled => "Auto merge disabled".into(),
            RepositoryIssue::DeleteBranchOnMergeDisabled => {
                "Delete branch on merge disabled".into()
            }
            RepositoryIssue::WikiEnabled => "Wiki enabled".into(),
        }
    }
}

/// Issue detected at organization scope. Reported, never remediated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrganizationIssue {
    MissedTeamMembers { team: String },
    MaintainerMissed { team: String },
}

impl OrganizationIssue {
    pub fn title(&self) -> String {
        match self {
            OrganizationIssue::MissedTeamMembers { team } => format!("Team '{team}' missed members"),
            OrganizationIssue::MaintainerMissed { team } => {
                format!("Maintainer for '{team}' team missed")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_structural() {
        let a = RepositoryIssue::InvalidTeamAccess {
            team: "payments".to_string(),
            actual: Permission::Push,
            expected: Permission::Maintain,
        };
        let b = a.clone();
        let c = RepositoryIssue::InvalidTeamAccess {
            team: "payments".to_string(),
            actual: Permission::Pull,
            expected: Permission::Maintain,
        };
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.kind(), c.kind());
    }

    #[test]
    fn test_stalled_title_rounds_down_to_days() {
        let issue = RepositoryIssue::PullRequestStalled {
            url: "https://example.test/pr/1".to_string(),
            lifetime: Duration::hours(10 * 24 + 5),
            author: "alice".to_string(),
            requested_reviewers: vec![],
        };
        assert_eq!(
            issue.title(),
            "Pull request https://example.test/pr/1 is stalled for ~10 days from alice"
        );
    }

    #[test]
    fn test_serialized_issue_is_tagged() {
        let issue = RepositoryIssue::ExtensiveCollaboratorAccess {
            login: "alice".to_string(),
            permission: Permission::Admin,
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["type"], "extensive_collaborator_access");
        assert_eq!(json["permission"], "admin");
    }

    #[test]
    fn test_stalled_lifetime_serializes_as_seconds() {
        let issue = RepositoryIssue::PullRequestStalled {
            url: "u".to_string(),
            lifetime: Duration::seconds(90),
            author: "a".to_string(),
            requested_reviewers: vec!["@org/core".to_string()],
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["lifetime_secs"], 90);
    }
}
