//! REST v3 payloads and their mapping onto the gateway model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orgaudit_core::gateway::{
    BranchProtection, Collaborator, FileEntry, FileKind, PullRequest, Repository,
    RepositorySettings, RequiredReviews, RequiredStatusChecks, Team, TeamDiscussion,
    TeamRepository, User,
};
use orgaudit_core::Permission;

#[derive(Debug, Deserialize)]
pub struct Account {
    pub login: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PermissionFlags {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub maintain: bool,
    #[serde(default)]
    pub push: bool,
    #[serde(default)]
    pub triage: bool,
    #[serde(default)]
    pub pull: bool,
}

impl PermissionFlags {
    pub fn highest(&self) -> Option<Permission> {
        Permission::from_flags(self.admin, self.maintain, self.push, self.triage, self.pull)
    }
}

#[derive(Debug, Deserialize)]
pub struct RepositoryPayload {
    pub id: u64,
    pub node_id: String,
    pub name: String,
    pub full_name: String,
    pub owner: Account,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub archived: bool,
    pub html_url: String,
    #[serde(default)]
    pub permissions: Option<PermissionFlags>,
    // Settings are only present for callers with admin rights.
    #[serde(default)]
    pub allow_merge_commit: Option<bool>,
    #[serde(default)]
    pub allow_rebase_merge: Option<bool>,
    #[serde(default)]
    pub allow_squash_merge: Option<bool>,
    #[serde(default)]
    pub allow_auto_merge: Option<bool>,
    #[serde(default)]
    pub delete_branch_on_merge: Option<bool>,
    #[serde(default)]
    pub has_wiki: bool,
}

impl RepositoryPayload {
    pub fn into_repository(self) -> Repository {
        Repository {
            id: self.id,
            node_id: self.node_id,
            name: self.name,
            full_name: self.full_name,
            owner: self.owner.login,
            // Empty repositories report no default branch.
            default_branch: self.default_branch.unwrap_or_else(|| "main".to_string()),
            archived: self.archived,
            html_url: self.html_url,
        }
    }

    /// Settings as GitHub documents their defaults when a field is hidden.
    pub fn settings(&self) -> RepositorySettings {
        RepositorySettings {
            merge_commit_allowed: self.allow_merge_commit.unwrap_or(true),
            rebase_merge_allowed: self.allow_rebase_merge.unwrap_or(true),
            squash_merge_allowed: self.allow_squash_merge.unwrap_or(true),
            auto_merge_allowed: self.allow_auto_merge.unwrap_or(false),
            delete_branch_on_merge: self.delete_branch_on_merge.unwrap_or(false),
            has_wiki: self.has_wiki,
        }
    }

    /// Grant of a team on this repository.
    ///
    /// A listed repository is at least readable by the team, so a payload
    /// without flags counts as `Pull`.
    pub fn into_team_repository(self) -> TeamRepository {
        let permission = match self.permissions.as_ref().and_then(PermissionFlags::highest) {
            Some(permission) => permission,
            None => {
                tracing::warn!(
                    repository = %self.full_name,
                    "team grant without permission flags, assuming pull"
                );
                Permission::Pull
            }
        };
        TeamRepository {
            repository_id: self.id,
            full_name: self.full_name,
            permission,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ParentPayload {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct TeamPayload {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub parent: Option<ParentPayload>,
}

impl From<TeamPayload> for Team {
    fn from(payload: TeamPayload) -> Self {
        let team = Team::new(payload.id, payload.name, payload.slug);
        match payload.parent {
            Some(parent) => team.with_parent(Team::new(parent.id, parent.name, parent.slug)),
            None => team,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CollaboratorPayload {
    pub login: String,
    #[serde(default)]
    pub permissions: PermissionFlags,
}

impl CollaboratorPayload {
    pub fn into_collaborator(self) -> Option<Collaborator> {
        let permission = self.permissions.highest()?;
        Some(Collaborator {
            login: self.login,
            permission,
        })
    }
}

impl From<Account> for User {
    fn from(account: Account) -> Self {
        User {
            login: account.login,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DiscussionPayload {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl From<DiscussionPayload> for TeamDiscussion {
    fn from(payload: DiscussionPayload) -> Self {
        TeamDiscussion {
            title: payload.title,
            body: payload.body,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ContentPayload {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub sha: Option<String>,
}

impl From<ContentPayload> for FileEntry {
    fn from(payload: ContentPayload) -> Self {
        let kind = match payload.kind.as_str() {
            "dir" => FileKind::Dir,
            "symlink" => FileKind::Symlink,
            "submodule" => FileKind::Submodule,
            _ => FileKind::File,
        };
        FileEntry {
            name: payload.name,
            path: payload.path,
            kind,
        }
    }
}

/// A contents response: a listing for directories, one object for files.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ContentsPayload {
    Listing(Vec<ContentPayload>),
    Single(ContentPayload),
}

impl ContentsPayload {
    pub fn into_entries(self) -> Vec<FileEntry> {
        match self {
            ContentsPayload::Listing(entries) => entries.into_iter().map(Into::into).collect(),
            ContentsPayload::Single(entry) => vec![entry.into()],
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HeadPayload {
    #[serde(rename = "ref")]
    pub ref_name: String,
}

#[derive(Debug, Deserialize)]
pub struct TeamRef {
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestPayload {
    pub number: u64,
    pub html_url: String,
    pub title: String,
    pub user: Account,
    pub head: HeadPayload,
    #[serde(default)]
    pub draft: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub requested_reviewers: Vec<Account>,
    #[serde(default)]
    pub requested_teams: Vec<TeamRef>,
}

impl From<PullRequestPayload> for PullRequest {
    fn from(payload: PullRequestPayload) -> Self {
        PullRequest {
            number: payload.number,
            html_url: payload.html_url,
            title: payload.title,
            author: payload.user.login,
            head_ref: payload.head.ref_name,
            draft: payload.draft,
            created_at: payload.created_at,
            requested_reviewers: payload
                .requested_reviewers
                .into_iter()
                .map(|a| a.login)
                .collect(),
            requested_teams: payload
                .requested_teams
                .into_iter()
                .map(|t| t.slug)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Enabled {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct ReviewsPayload {
    #[serde(default)]
    pub dismiss_stale_reviews: bool,
    #[serde(default)]
    pub require_code_owner_reviews: bool,
    #[serde(default)]
    pub required_approving_review_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct StatusChecksPayload {
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Deserialize)]
pub struct ProtectionPayload {
    #[serde(default)]
    pub enforce_admins: Option<Enabled>,
    #[serde(default)]
    pub required_pull_request_reviews: Option<ReviewsPayload>,
    #[serde(default)]
    pub required_status_checks: Option<StatusChecksPayload>,
}

impl From<ProtectionPayload> for BranchProtection {
    fn from(payload: ProtectionPayload) -> Self {
        BranchProtection {
            enforce_admins: payload.enforce_admins.map(|e| e.enabled).unwrap_or(false),
            required_reviews: payload.required_pull_request_reviews.map(|r| RequiredReviews {
                require_code_owner_reviews: r.require_code_owner_reviews,
                dismiss_stale_reviews: r.dismiss_stale_reviews,
                required_approving_review_count: r.required_approving_review_count,
            }),
            required_status_checks: payload
                .required_status_checks
                .map(|c| RequiredStatusChecks { strict: c.strict }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GitObject {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub struct GitRefPayload {
    pub object: GitObject,
}

#[derive(Debug, Serialize)]
pub struct NewGitRef<'a> {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub sha: &'a str,
}

#[derive(Debug, Serialize)]
pub struct PutContent<'a> {
    pub message: &'a str,
    /// Base64 of the file bytes.
    pub content: String,
    pub branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewRequest<'a> {
    pub reviewers: Vec<String>,
    pub team_reviewers: &'a [String],
}

#[derive(Debug, Serialize)]
pub struct TeamPermission<'a> {
    pub permission: &'a str,
}
