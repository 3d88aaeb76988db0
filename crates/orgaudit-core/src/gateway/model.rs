//! Platform entities exchanged with the gateway.
//!
//! These are deliberately thin: only the fields the analyzers and fixers read
//! are carried, independent of the wire format of any particular platform.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::permission::Permission;

/// A repository of the audited organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Numeric platform id.
    pub id: u64,
    /// Opaque global id used by the GraphQL API.
    pub node_id: String,
    pub name: String,
    /// `owner/name`.
    pub full_name: String,
    /// Owner login (the organization).
    pub owner: String,
    pub default_branch: String,
    pub archived: bool,
    pub html_url: String,
}

/// A repository as seen through a team, carrying the tier granted to that team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRepository {
    pub repository_id: u64,
    pub full_name: String,
    pub permission: Permission,
}

/// An organization team. `parent` is only ever one level deep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub parent: Option<Box<Team>>,
}

impl Team {
    pub fn new(id: u64, name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            slug: slug.into(),
            parent: None,
        }
    }

    /// Attach a parent team (builder style).
    pub fn with_parent(mut self, parent: Team) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    /// Lowercase team name, the key used for ownership matching.
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }
}

/// Role of a member inside a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    Member,
    Maintainer,
}

/// Membership state of a team member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipState {
    Active,
    Pending,
}

/// A team member together with its role and membership state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub login: String,
    pub role: TeamRole,
    pub state: MembershipState,
}

impl TeamMember {
    /// An active maintainer, i.e. one who counts for maintainer coverage.
    pub fn is_active_maintainer(&self) -> bool {
        self.role == TeamRole::Maintainer && self.state == MembershipState::Active
    }
}

/// A repository collaborator and the effective tier it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collaborator {
    pub login: String,
    pub permission: Permission,
}

/// An organization member without permission data (org owners listing).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub login: String,
}

/// An open pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub html_url: String,
    pub title: String,
    pub author: String,
    /// Source branch name.
    pub head_ref: String,
    pub draft: bool,
    pub created_at: DateTime<Utc>,
    pub requested_reviewers: Vec<String>,
    /// Requested team slugs.
    pub requested_teams: Vec<String>,
}

/// Kind of an entry returned by a directory listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    File,
    Dir,
    Symlink,
    Submodule,
}

/// A directory listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    pub kind: FileKind,
}

/// A team-scoped discussion thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamDiscussion {
    pub title: String,
    pub body: String,
}

/// Identifier of a remote branch-protection rule (GraphQL node id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub String);

impl RuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Review requirements of a protected branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredReviews {
    pub require_code_owner_reviews: bool,
    pub dismiss_stale_reviews: bool,
    pub required_approving_review_count: u32,
}

/// Status-check requirements of a protected branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredStatusChecks {
    pub strict: bool,
}

/// REST-style protection settings of a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchProtection {
    pub enforce_admins: bool,
    pub required_reviews: Option<RequiredReviews>,
    pub required_status_checks: Option<RequiredStatusChecks>,
}

/// Field set of a branch-protection rule mutation.
///
/// Every field is optional: `None` means "leave the remote value untouched".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchProtectionRulePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_approving_reviews: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_code_owner_reviews: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_conversation_resolution: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_approving_review_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dismisses_stale_reviews: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_status_checks: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_strict_status_checks: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_linear_history: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin_enforced: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allows_force_pushes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allows_deletions: Option<bool>,
}

impl BranchProtectionRulePatch {
    /// The full compliant field set used when a rule is created from scratch.
    pub fn compliant() -> Self {
        Self {
            requires_approving_reviews: Some(true),
            requires_code_owner_reviews: Some(true),
            requires_conversation_resolution: Some(true),
            required_approving_review_count: Some(1),
            dismisses_stale_reviews: Some(true),
            requires_status_checks: Some(true),
            requires_strict_status_checks: Some(true),
            requires_linear_history: Some(true),
            is_admin_enforced: Some(true),
            allows_force_pushes: Some(false),
            allows_deletions: Some(false),
        }
    }

    /// Number of fields this patch would write.
    pub fn field_count(&self) -> usize {
        let bools = [
            self.requires_approving_reviews,
            self.requires_code_owner_reviews,
            self.requires_conversation_resolution,
            self.dismisses_stale_reviews,
            self.requires_status_checks,
            self.requires_strict_status_checks,
            self.requires_linear_history,
            self.is_admin_enforced,
            self.allows_force_pushes,
            self.allows_deletions,
        ];
        bools.iter().filter(|f| f.is_some()).count()
            + usize::from(self.required_approving_review_count.is_some())
    }
}

/// Input of a branch-protection rule creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBranchProtectionRule {
    pub repository_node_id: String,
    pub pattern: String,
    pub fields: BranchProtectionRulePatch,
}

/// Merge and feature settings of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySettings {
    pub merge_commit_allowed: bool,
    pub rebase_merge_allowed: bool,
    pub squash_merge_allowed: bool,
    pub auto_merge_allowed: bool,
    pub delete_branch_on_merge: bool,
    pub has_wiki: bool,
}

/// Partial update of [`RepositorySettings`]; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySettingsPatch {
    #[serde(rename = "allow_merge_commit", skip_serializing_if = "Option::is_none")]
    pub merge_commit_allowed: Option<bool>,
    #[serde(rename = "allow_rebase_merge", skip_serializing_if = "Option::is_none")]
    pub rebase_merge_allowed: Option<bool>,
    #[serde(rename = "allow_squash_merge", skip_serializing_if = "Option::is_none")]
    pub squash_merge_allowed: Option<bool>,
    #[serde(rename = "allow_auto_merge", skip_serializing_if = "Option::is_none")]
    pub auto_merge_allowed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_branch_on_merge: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_wiki: Option<bool>,
}

/// Input of a pull request creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPullRequest {
    pub title: String,
    /// Source branch.
    pub head: String,
    /// Target branch.
    pub base: String,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compliant_patch_sets_every_field() {
        assert_eq!(BranchProtectionRulePatch::compliant().field_count(), 11);
        assert_eq!(BranchProtectionRulePatch::default().field_count(), 0);
    }

    #[test]
    fn test_rule_patch_serializes_only_set_fields() {
        let patch = BranchProtectionRulePatch {
            is_admin_enforced: Some(true),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "isAdminEnforced": true }));
    }

    #[test]
    fn test_settings_patch_uses_rest_field_names() {
        let patch = RepositorySettingsPatch {
            merge_commit_allowed: Some(false),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "allow_merge_commit": false }));
    }

    #[test]
    fn test_team_key_is_lowercase_name() {
        let team = Team::new(1, "Payments", "payments");
        assert_eq!(team.key(), "payments");
    }
}
