//! Platform gateway: the contract between the audit engine and the
//! source-control platform.
//!
//! The engine never talks HTTP itself. Everything it reads or mutates goes
//! through [`PlatformGateway`], which keeps analyzers and fixers testable
//! against [`crate::fakes::InMemoryGateway`].
//!
//! - [`model`] - repositories, teams, pull requests, protection settings, patches
//! - [`pagination`] - lazy forward-only page streams
//! - [`error`] - [`GatewayError`] and the [`OptionalExt`] absence helper

pub mod error;
pub mod model;
pub mod pagination;

use async_trait::async_trait;

pub use error::{GatewayError, GatewayResult, OptionalExt};
pub use model::{
    BranchProtection, BranchProtectionRulePatch, Collaborator, FileEntry, FileKind,
    MembershipState, NewBranchProtectionRule, NewPullRequest, PullRequest, Repository,
    RepositorySettings, RepositorySettingsPatch, RequiredReviews, RequiredStatusChecks, RuleId,
    Team, TeamDiscussion, TeamMember, TeamRepository, TeamRole, User,
};
pub use pagination::{open_pull_requests, organization_repositories, paginate};

use crate::permission::Permission;

/// Operations the engine consumes from the source-control platform.
///
/// Implementations must be cheap to share (`Arc<dyn PlatformGateway>`); the
/// engine calls them strictly sequentially.
#[async_trait]
pub trait PlatformGateway: Send + Sync {
    /// Login of the audited organization.
    fn organization(&self) -> &str;

    /// One page (1-based) of organization repositories.
    async fn organization_repositories(
        &self,
        page: u32,
        per_page: u32,
    ) -> GatewayResult<Vec<Repository>>;

    /// Every team of the organization.
    async fn organization_teams(&self) -> GatewayResult<Vec<Team>>;

    /// Teams with any access to `repository`.
    async fn repository_teams(&self, repository: &Repository) -> GatewayResult<Vec<Team>>;

    /// Repositories `team` can access, with the tier granted to the team.
    async fn team_repositories(&self, team: &Team) -> GatewayResult<Vec<TeamRepository>>;

    async fn team_members(&self, team: &Team) -> GatewayResult<Vec<TeamMember>>;

    async fn team_discussions(&self, team: &Team) -> GatewayResult<Vec<TeamDiscussion>>;

    async fn repository_collaborators(
        &self,
        repository: &Repository,
    ) -> GatewayResult<Vec<Collaborator>>;

    /// Members holding the organization admin role.
    async fn organization_owners(&self) -> GatewayResult<Vec<User>>;

    /// Topics of `repository`. Fails with [`GatewayError::Invariant`] if the
    /// platform reports more topics than a single fetch returns.
    async fn repository_topics(&self, repository: &Repository) -> GatewayResult<Vec<String>>;

    /// Raw file content. Fails with [`GatewayError::NotFound`] if `path` is absent.
    async fn raw_file_content(&self, repository_name: &str, path: &str) -> GatewayResult<String>;

    /// Directory listing. Fails with [`GatewayError::NotFound`] if `path` is absent.
    async fn list_all_contents(
        &self,
        repository: &Repository,
        path: &str,
    ) -> GatewayResult<Vec<FileEntry>>;

    /// Protection settings of `branch` plus the id of the matching rule,
    /// `None` when the branch is unprotected.
    async fn branch_protection(
        &self,
        owner: &str,
        repository_name: &str,
        branch: &str,
    ) -> GatewayResult<Option<(BranchProtection, RuleId)>>;

    async fn create_branch_protection_rule(
        &self,
        rule: &NewBranchProtectionRule,
    ) -> GatewayResult<()>;

    /// Writes only the fields set in `patch`.
    async fn update_branch_protection_rule(
        &self,
        rule_id: &RuleId,
        patch: &BranchProtectionRulePatch,
    ) -> GatewayResult<()>;

    async fn repository_settings(
        &self,
        owner: &str,
        repository_name: &str,
    ) -> GatewayResult<RepositorySettings>;

    /// Writes only the fields set in `patch`.
    async fn update_repository_settings(
        &self,
        repository: &Repository,
        patch: &RepositorySettingsPatch,
    ) -> GatewayResult<()>;

    /// One page (1-based) of open pull requests.
    async fn open_pull_requests(
        &self,
        repository: &Repository,
        page: u32,
        per_page: u32,
    ) -> GatewayResult<Vec<PullRequest>>;

    /// Create `branch` pointing at the current head of `from_branch`.
    async fn create_branch(
        &self,
        repository: &Repository,
        branch: &str,
        from_branch: &str,
    ) -> GatewayResult<()>;

    async fn commit_file(
        &self,
        repository: &Repository,
        branch: &str,
        path: &str,
        content: &str,
        message: &str,
    ) -> GatewayResult<()>;

    async fn create_pull_request(
        &self,
        repository: &Repository,
        pull_request: &NewPullRequest,
    ) -> GatewayResult<PullRequest>;

    async fn request_reviewers(
        &self,
        repository: &Repository,
        pull_request_number: u64,
        team_slugs: &[String],
    ) -> GatewayResult<()>;

    async fn add_or_update_team_repository_permission(
        &self,
        team: &Team,
        repository_name: &str,
        permission: Permission,
    ) -> GatewayResult<()>;
}
