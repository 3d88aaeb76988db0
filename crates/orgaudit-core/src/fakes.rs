//! In-memory platform gateway (testing only).
//!
//! [`InMemoryGateway`] satisfies the [`PlatformGateway`] contract over plain
//! collections. Patches are applied field by field, and every mutation call
//! is recorded as a [`Mutation`] so tests can assert exactly what was written.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::gateway::{
    BranchProtection, BranchProtectionRulePatch, Collaborator, FileEntry, FileKind,
    GatewayError, GatewayResult, NewBranchProtectionRule, NewPullRequest, PlatformGateway,
    PullRequest, Repository, RepositorySettings, RepositorySettingsPatch, RequiredReviews,
    RequiredStatusChecks, RuleId, Team, TeamDiscussion, TeamMember, TeamRepository, User,
};
use crate::permission::Permission;

pub const FAKE_ORGANIZATION: &str = "acme";

/// Repository of [`FAKE_ORGANIZATION`] with `main` as default branch.
pub fn repository(id: u64, name: &str) -> Repository {
    Repository {
        id,
        node_id: format!("R_{id}"),
        name: name.to_string(),
        full_name: format!("{FAKE_ORGANIZATION}/{name}"),
        owner: FAKE_ORGANIZATION.to_string(),
        default_branch: "main".to_string(),
        archived: false,
        html_url: format!("https://github.com/{FAKE_ORGANIZATION}/{name}"),
    }
}

/// Open, non-draft pull request without requested reviewers.
pub fn pull_request(
    repository: &Repository,
    number: u64,
    author: &str,
    created_at: DateTime<Utc>,
) -> PullRequest {
    PullRequest {
        number,
        html_url: format!("{}/pull/{number}", repository.html_url),
        title: format!("Change #{number}"),
        author: author.to_string(),
        head_ref: format!("feature-{number}"),
        draft: false,
        created_at,
        requested_reviewers: Vec::new(),
        requested_teams: Vec::new(),
    }
}

/// Settings that raise no settings issue.
pub fn compliant_settings() -> RepositorySettings {
    RepositorySettings {
        merge_commit_allowed: false,
        rebase_merge_allowed: true,
        squash_merge_allowed: true,
        auto_merge_allowed: true,
        delete_branch_on_merge: true,
        has_wiki: false,
    }
}

/// A mutation call received by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateRule {
        repository_node_id: String,
        pattern: String,
        fields: BranchProtectionRulePatch,
    },
    UpdateRule {
        rule_id: RuleId,
        patch: BranchProtectionRulePatch,
    },
    UpdateSettings {
        repository: String,
        patch: RepositorySettingsPatch,
    },
    CreateBranch {
        repository: String,
        branch: String,
        from: String,
    },
    CommitFile {
        repository: String,
        branch: String,
        path: String,
        content: String,
    },
    CreatePullRequest {
        repository: String,
        head: String,
        base: String,
    },
    RequestReviewers {
        repository: String,
        number: u64,
        teams: Vec<String>,
    },
    SetTeamPermission {
        team: String,
        repository: String,
        permission: Permission,
    },
}

#[derive(Debug, Clone)]
struct StoredRule {
    id: RuleId,
    repository_node_id: String,
    pattern: String,
    fields: BranchProtectionRulePatch,
}

#[derive(Debug, Default)]
struct State {
    repositories: Vec<Repository>,
    topics: HashMap<u64, Vec<String>>,
    teams: Vec<Team>,
    access: HashMap<(u64, u64), Permission>,
    members: HashMap<u64, Vec<TeamMember>>,
    discussions: HashMap<u64, Vec<TeamDiscussion>>,
    collaborators: HashMap<u64, Vec<Collaborator>>,
    owners: Vec<User>,
    files: HashMap<(String, String), String>,
    branch_files: HashMap<(String, String, String), String>,
    branches: HashSet<(String, String)>,
    rules: Vec<StoredRule>,
    settings: HashMap<u64, RepositorySettings>,
    pull_requests: HashMap<u64, Vec<PullRequest>>,
    failing: HashSet<&'static str>,
    mutations: Vec<Mutation>,
    next_number: u64,
}

/// In-memory [`PlatformGateway`].
#[derive(Debug)]
pub struct InMemoryGateway {
    organization: String,
    state: Mutex<State>,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(what: impl Into<String>) -> GatewayError {
    GatewayError::NotFound(what.into())
}

fn merge<T: Copy>(target: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *target = value;
    }
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self {
            organization: FAKE_ORGANIZATION.to_string(),
            state: Mutex::new(State {
                next_number: 1000,
                ..State::default()
            }),
        }
    }

    // -- seeding --------------------------------------------------------------

    /// Add a repository with its topics and compliant settings.
    pub fn add_repository(&self, repository: Repository, topics: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.topics.insert(
            repository.id,
            topics.iter().map(|t| t.to_string()).collect(),
        );
        state.settings.insert(repository.id, compliant_settings());
        state
            .branches
            .insert((repository.name.clone(), repository.default_branch.clone()));
        state.repositories.push(repository);
    }

    pub fn add_team(&self, team: Team) {
        self.state.lock().unwrap().teams.push(team);
    }

    /// Grant `team` the tier `permission` on `repository`.
    pub fn grant(&self, team: &Team, repository: &Repository, permission: Permission) {
        self.state
            .lock()
            .unwrap()
            .access
            .insert((team.id, repository.id), permission);
    }

    pub fn set_members(&self, team: &Team, members: Vec<TeamMember>) {
        self.state.lock().unwrap().members.insert(team.id, members);
    }

    pub fn add_discussion(&self, team: &Team, title: &str, body: &str) {
        self.state
            .lock()
            .unwrap()
            .discussions
            .entry(team.id)
            .or_default()
            .push(TeamDiscussion {
                title: title.to_string(),
                body: body.to_string(),
            });
    }

    pub fn add_collaborator(&self, repository: &Repository, login: &str, permission: Permission) {
        self.state
            .lock()
            .unwrap()
            .collaborators
            .entry(repository.id)
            .or_default()
            .push(Collaborator {
                login: login.to_string(),
                permission,
            });
    }

    pub fn add_owner(&self, login: &str) {
        self.state.lock().unwrap().owners.push(User {
            login: login.to_string(),
        });
    }

    /// Put a file on the default branch of `repository`.
    pub fn put_file(&self, repository: &Repository, path: &str, content: &str) {
        self.state.lock().unwrap().files.insert(
            (repository.name.clone(), path.to_string()),
            content.to_string(),
        );
    }

    /// Install a rule matching `pattern` with the given field set.
    pub fn put_rule(
        &self,
        repository: &Repository,
        pattern: &str,
        fields: BranchProtectionRulePatch,
    ) -> RuleId {
        let mut state = self.state.lock().unwrap();
        let id = RuleId::new(format!("BPR_{}", state.rules.len() + 1));
        state.rules.push(StoredRule {
            id: id.clone(),
            repository_node_id: repository.node_id.clone(),
            pattern: pattern.to_string(),
            fields,
        });
        id
    }

    pub fn set_settings(&self, repository: &Repository, settings: RepositorySettings) {
        self.state
            .lock()
            .unwrap()
            .settings
            .insert(repository.id, settings);
    }

    pub fn add_pull_request(&self, repository: &Repository, pull_request: PullRequest) {
        self.state
            .lock()
            .unwrap()
            .pull_requests
            .entry(repository.id)
            .or_default()
            .push(pull_request);
    }

    /// Make every call of the named gateway operation fail with a 500.
    pub fn fail_on(&self, operation: &'static str) {
        self.state.lock().unwrap().failing.insert(operation);
    }

    /// Let `operation` succeed again after [`fail_on`](Self::fail_on).
    pub fn recover(&self, operation: &'static str) {
        self.state.lock().unwrap().failing.remove(operation);
    }

    // -- inspection -----------------------------------------------------------

    pub fn mutations(&self) -> Vec<Mutation> {
        self.state.lock().unwrap().mutations.clone()
    }

    pub fn clear_mutations(&self) {
        self.state.lock().unwrap().mutations.clear();
    }

    /// Current field set of the rule `id`.
    pub fn rule_fields(&self, id: &RuleId) -> Option<BranchProtectionRulePatch> {
        let state = self.state.lock().unwrap();
        state
            .rules
            .iter()
            .find(|rule| &rule.id == id)
            .map(|rule| rule.fields.clone())
    }

    /// Field set of the rule matching `branch` on `repository`.
    pub fn rule_for(
        &self,
        repository: &Repository,
        branch: &str,
    ) -> Option<(RuleId, BranchProtectionRulePatch)> {
        let state = self.state.lock().unwrap();
        state
            .rules
            .iter()
            .find(|rule| rule.repository_node_id == repository.node_id && rule.pattern == branch)
            .map(|rule| (rule.id.clone(), rule.fields.clone()))
    }

    pub fn settings_of(&self, repository: &Repository) -> Option<RepositorySettings> {
        self.state
            .lock()
            .unwrap()
            .settings
            .get(&repository.id)
            .cloned()
    }

    pub fn permission_of(&self, team: &Team, repository: &Repository) -> Option<Permission> {
        self.state
            .lock()
            .unwrap()
            .access
            .get(&(team.id, repository.id))
            .copied()
    }

    /// Content committed to `branch` (not the default branch).
    pub fn branch_file(&self, repository: &Repository, branch: &str, path: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .branch_files
            .get(&(
                repository.name.clone(),
                branch.to_string(),
                path.to_string(),
            ))
            .cloned()
    }

    pub fn pull_requests_of(&self, repository: &Repository) -> Vec<PullRequest> {
        self.state
            .lock()
            .unwrap()
            .pull_requests
            .get(&repository.id)
            .cloned()
            .unwrap_or_default()
    }

    // -- internals ------------------------------------------------------------

    fn check(&self, operation: &'static str) -> GatewayResult<()> {
        if self.state.lock().unwrap().failing.contains(operation) {
            return Err(GatewayError::Api {
                status: 500,
                message: format!("{operation} failed"),
            });
        }
        Ok(())
    }

    fn record(&self, mutation: Mutation) {
        self.state.lock().unwrap().mutations.push(mutation);
    }
}

fn protection_from_fields(fields: &BranchProtectionRulePatch) -> BranchProtection {
    let required_reviews = fields
        .requires_approving_reviews
        .unwrap_or(false)
        .then(|| RequiredReviews {
            require_code_owner_reviews: fields.requires_code_owner_reviews.unwrap_or(false),
            dismiss_stale_reviews: fields.dismisses_stale_reviews.unwrap_or(false),
            required_approving_review_count: fields.required_approving_review_count.unwrap_or(0),
        });
    let required_status_checks = fields
        .requires_status_checks
        .unwrap_or(false)
        .then(|| RequiredStatusChecks {
            strict: fields.requires_strict_status_checks.unwrap_or(false),
        });
    BranchProtection {
        enforce_admins: fields.is_admin_enforced.unwrap_or(false),
        required_reviews,
        required_status_checks,
    }
}

fn apply_rule_patch(fields: &mut BranchProtectionRulePatch, patch: &BranchProtectionRulePatch) {
    merge(
        &mut fields.requires_approving_reviews,
        patch.requires_approving_reviews,
    );
    merge(
        &mut fields.requires_code_owner_reviews,
        patch.requires_code_owner_reviews,
    );
    merge(
        &mut fields.requires_conversation_resolution,
        patch.requires_conversation_resolution,
    );
    merge(
        &mut fields.required_approving_review_count,
        patch.required_approving_review_count,
    );
    merge(
        &mut fields.dismisses_stale_reviews,
        patch.dismisses_stale_reviews,
    );
    merge(
        &mut fields.requires_status_checks,
        patch.requires_status_checks,
    );
    merge(
        &mut fields.requires_strict_status_checks,
        patch.requires_strict_status_checks,
    );
    merge(
        &mut fields.requires_linear_history,
        patch.requires_linear_history,
    );
    merge(&mut fields.is_admin_enforced, patch.is_admin_enforced);
    merge(&mut fields.allows_force_pushes, patch.allows_force_pushes);
    merge(&mut fields.allows_deletions, patch.allows_deletions);
}

fn apply_settings_patch(settings: &mut RepositorySettings, patch: &RepositorySettingsPatch) {
    if let Some(v) = patch.merge_commit_allowed {
        settings.merge_commit_allowed = v;
    }
    if let Some(v) = patch.rebase_merge_allowed {
        settings.rebase_merge_allowed = v;
    }
    if let Some(v) = patch.squash_merge_allowed {
        settings.squash_merge_allowed = v;
    }
    if let Some(v) = patch.auto_merge_allowed {
        settings.auto_merge_allowed = v;
    }
    if let Some(v) = patch.delete_branch_on_merge {
        settings.delete_branch_on_merge = v;
    }
    if let Some(v) = patch.has_wiki {
        settings.has_wiki = v;
    }
}

#[async_trait]
impl PlatformGateway for InMemoryGateway {
    fn organization(&self) -> &str {
        &self.organization
    }

    async fn organization_repositories(
        &self,
        page: u32,
        per_page: u32,
    ) -> GatewayResult<Vec<Repository>> {
        self.check("organization_repositories")?;
        let state = self.state.lock().unwrap();
        let skip = (page.saturating_sub(1) * per_page) as usize;
        Ok(state
            .repositories
            .iter()
            .skip(skip)
            .take(per_page as usize)
            .cloned()
            .collect())
    }

    async fn organization_teams(&self) -> GatewayResult<Vec<Team>> {
        self.check("organization_teams")?;
        Ok(self.state.lock().unwrap().teams.clone())
    }

    async fn repository_teams(&self, repository: &Repository) -> GatewayResult<Vec<Team>> {
        self.check("repository_teams")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .teams
            .iter()
            .filter(|team| state.access.contains_key(&(team.id, repository.id)))
            .cloned()
            .collect())
    }

    async fn team_repositories(&self, team: &Team) -> GatewayResult<Vec<TeamRepository>> {
        self.check("team_repositories")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .repositories
            .iter()
            .filter_map(|repository| {
                state
                    .access
                    .get(&(team.id, repository.id))
                    .map(|permission| TeamRepository {
                        repository_id: repository.id,
                        full_name: repository.full_name.clone(),
                        permission: *permission,
                    })
            })
            .collect())
    }

    async fn team_members(&self, team: &Team) -> GatewayResult<Vec<TeamMember>> {
        self.check("team_members")?;
        let state = self.state.lock().unwrap();
        Ok(state.members.get(&team.id).cloned().unwrap_or_default())
    }

    async fn team_discussions(&self, team: &Team) -> GatewayResult<Vec<TeamDiscussion>> {
        self.check("team_discussions")?;
        let state = self.state.lock().unwrap();
        Ok(state.discussions.get(&team.id).cloned().unwrap_or_default())
    }

    async fn repository_collaborators(
        &self,
        repository: &Repository,
    ) -> GatewayResult<Vec<Collaborator>> {
        self.check("repository_collaborators")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .collaborators
            .get(&repository.id)
            .cloned()
            .unwrap_or_default())
    }

    async fn organization_owners(&self) -> GatewayResult<Vec<User>> {
        self.check("organization_owners")?;
        Ok(self.state.lock().unwrap().owners.clone())
    }

    async fn repository_topics(&self, repository: &Repository) -> GatewayResult<Vec<String>> {
        self.check("repository_topics")?;
        let state = self.state.lock().unwrap();
        Ok(state.topics.get(&repository.id).cloned().unwrap_or_default())
    }

    async fn raw_file_content(&self, repository_name: &str, path: &str) -> GatewayResult<String> {
        self.check("raw_file_content")?;
        let state = self.state.lock().unwrap();
        state
            .files
            .get(&(repository_name.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| not_found(format!("{repository_name}/{path}")))
    }

    async fn list_all_contents(
        &self,
        repository: &Repository,
        path: &str,
    ) -> GatewayResult<Vec<FileEntry>> {
        self.check("list_all_contents")?;
        let state = self.state.lock().unwrap();
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let mut entries: Vec<FileEntry> = state
            .files
            .keys()
            .filter(|(name, _)| name == &repository.name)
            .filter_map(|(_, file)| {
                let rest = file.strip_prefix(&prefix)?;
                let (entry, kind) = match rest.split_once('/') {
                    Some((dir, _)) => (dir, FileKind::Dir),
                    None => (rest, FileKind::File),
                };
                Some(FileEntry {
                    name: entry.to_string(),
                    path: format!("{prefix}{entry}"),
                    kind,
                })
            })
            .collect();
        if entries.is_empty() {
            return Err(not_found(format!("{}/{path}", repository.name)));
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries.dedup();
        Ok(entries)
    }

    async fn branch_protection(
        &self,
        _owner: &str,
        repository_name: &str,
        branch: &str,
    ) -> GatewayResult<Option<(BranchProtection, RuleId)>> {
        self.check("branch_protection")?;
        let state = self.state.lock().unwrap();
        let Some(repository) = state
            .repositories
            .iter()
            .find(|r| r.name == repository_name)
        else {
            return Err(not_found(repository_name));
        };
        Ok(state
            .rules
            .iter()
            .find(|rule| rule.repository_node_id == repository.node_id && rule.pattern == branch)
            .map(|rule| (protection_from_fields(&rule.fields), rule.id.clone())))
    }

    async fn create_branch_protection_rule(
        &self,
        rule: &NewBranchProtectionRule,
    ) -> GatewayResult<()> {
        self.check("create_branch_protection_rule")?;
        self.record(Mutation::CreateRule {
            repository_node_id: rule.repository_node_id.clone(),
            pattern: rule.pattern.clone(),
            fields: rule.fields.clone(),
        });
        let mut state = self.state.lock().unwrap();
        let id = RuleId::new(format!("BPR_{}", state.rules.len() + 1));
        state.rules.push(StoredRule {
            id,
            repository_node_id: rule.repository_node_id.clone(),
            pattern: rule.pattern.clone(),
            fields: rule.fields.clone(),
        });
        Ok(())
    }

    async fn update_branch_protection_rule(
        &self,
        rule_id: &RuleId,
        patch: &BranchProtectionRulePatch,
    ) -> GatewayResult<()> {
        self.check("update_branch_protection_rule")?;
        self.record(Mutation::UpdateRule {
            rule_id: rule_id.clone(),
            patch: patch.clone(),
        });
        let mut state = self.state.lock().unwrap();
        let rule = state
            .rules
            .iter_mut()
            .find(|rule| &rule.id == rule_id)
            .ok_or_else(|| not_found(rule_id.to_string()))?;
        apply_rule_patch(&mut rule.fields, patch);
        Ok(())
    }

    async fn repository_settings(
        &self,
        _owner: &str,
        repository_name: &str,
    ) -> GatewayResult<RepositorySettings> {
        self.check("repository_settings")?;
        let state = self.state.lock().unwrap();
        state
            .repositories
            .iter()
            .find(|r| r.name == repository_name)
            .and_then(|r| state.settings.get(&r.id).cloned())
            .ok_or_else(|| not_found(repository_name))
    }

    async fn update_repository_settings(
        &self,
        repository: &Repository,
        patch: &RepositorySettingsPatch,
    ) -> GatewayResult<()> {
        self.check("update_repository_settings")?;
        self.record(Mutation::UpdateSettings {
            repository: repository.name.clone(),
            patch: patch.clone(),
        });
        let mut state = self.state.lock().unwrap();
        let settings = state
            .settings
            .get_mut(&repository.id)
            .ok_or_else(|| not_found(repository.name.clone()))?;
        apply_settings_patch(settings, patch);
        Ok(())
    }

    async fn open_pull_requests(
        &self,
        repository: &Repository,
        page: u32,
        per_page: u32,
    ) -> GatewayResult<Vec<PullRequest>> {
        self.check("open_pull_requests")?;
        let state = self.state.lock().unwrap();
        let skip = (page.saturating_sub(1) * per_page) as usize;
        Ok(state
            .pull_requests
            .get(&repository.id)
            .map(|prs| {
                prs.iter()
                    .skip(skip)
                    .take(per_page as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create_branch(
        &self,
        repository: &Repository,
        branch: &str,
        from_branch: &str,
    ) -> GatewayResult<()> {
        self.check("create_branch")?;
        self.record(Mutation::CreateBranch {
            repository: repository.name.clone(),
            branch: branch.to_string(),
            from: from_branch.to_string(),
        });
        let mut state = self.state.lock().unwrap();
        if !state
            .branches
            .contains(&(repository.name.clone(), from_branch.to_string()))
        {
            return Err(not_found(format!("{}@{from_branch}", repository.name)));
        }
        if !state
            .branches
            .insert((repository.name.clone(), branch.to_string()))
        {
            return Err(GatewayError::AlreadyExists(format!(
                "{}@{branch}",
                repository.name
            )));
        }
        Ok(())
    }

    async fn commit_file(
        &self,
        repository: &Repository,
        branch: &str,
        path: &str,
        content: &str,
        _message: &str,
    ) -> GatewayResult<()> {
        self.check("commit_file")?;
        self.record(Mutation::CommitFile {
            repository: repository.name.clone(),
            branch: branch.to_string(),
            path: path.to_string(),
            content: content.to_string(),
        });
        let mut state = self.state.lock().unwrap();
        state.branch_files.insert(
            (
                repository.name.clone(),
                branch.to_string(),
                path.to_string(),
            ),
            content.to_string(),
        );
        Ok(())
    }

    async fn create_pull_request(
        &self,
        repository: &Repository,
        pull_request: &NewPullRequest,
    ) -> GatewayResult<PullRequest> {
        self.check("create_pull_request")?;
        self.record(Mutation::CreatePullRequest {
            repository: repository.name.clone(),
            head: pull_request.head.clone(),
            base: pull_request.base.clone(),
        });
        let mut state = self.state.lock().unwrap();
        state.next_number += 1;
        let number = state.next_number;
        let created = PullRequest {
            number,
            html_url: format!("{}/pull/{number}", repository.html_url),
            title: pull_request.title.clone(),
            author: "orgaudit-bot".to_string(),
            head_ref: pull_request.head.clone(),
            draft: false,
            created_at: Utc::now(),
            requested_reviewers: Vec::new(),
            requested_teams: Vec::new(),
        };
        state
            .pull_requests
            .entry(repository.id)
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    async fn request_reviewers(
        &self,
        repository: &Repository,
        pull_request_number: u64,
        team_slugs: &[String],
    ) -> GatewayResult<()> {
        self.check("request_reviewers")?;
        self.record(Mutation::RequestReviewers {
            repository: repository.name.clone(),
            number: pull_request_number,
            teams: team_slugs.to_vec(),
        });
        let mut state = self.state.lock().unwrap();
        let pull_request = state
            .pull_requests
            .get_mut(&repository.id)
            .and_then(|prs| prs.iter_mut().find(|pr| pr.number == pull_request_number))
            .ok_or_else(|| not_found(format!("{}#{pull_request_number}", repository.name)))?;
        pull_request
            .requested_teams
            .extend(team_slugs.iter().cloned());
        Ok(())
    }

    async fn add_or_update_team_repository_permission(
        &self,
        team: &Team,
        repository_name: &str,
        permission: Permission,
    ) -> GatewayResult<()> {
        self.check("add_or_update_team_repository_permission")?;
        self.record(Mutation::SetTeamPermission {
            team: team.slug.clone(),
            repository: repository_name.to_string(),
            permission,
        });
        let mut state = self.state.lock().unwrap();
        let repository_id = state
            .repositories
            .iter()
            .find(|r| r.name == repository_name)
            .map(|r| r.id)
            .ok_or_else(|| not_found(repository_name))?;
        state.access.insert((team.id, repository_id), permission);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rule_update_only_touches_patched_fields() {
        let gateway = InMemoryGateway::new();
        let repo = repository(1, "ledger");
        gateway.add_repository(repo.clone(), &[]);
        let id = gateway.put_rule(&repo, "main", BranchProtectionRulePatch::compliant());

        let patch = BranchProtectionRulePatch {
            is_admin_enforced: Some(false),
            ..Default::default()
        };
        gateway.update_branch_protection_rule(&id, &patch).await.unwrap();

        let fields = gateway.rule_fields(&id).unwrap();
        assert_eq!(fields.is_admin_enforced, Some(false));
        assert_eq!(fields.requires_approving_reviews, Some(true));
        assert_eq!(gateway.mutations().len(), 1);
    }

    #[tokio::test]
    async fn test_list_contents_of_missing_directory_is_not_found() {
        let gateway = InMemoryGateway::new();
        let repo = repository(1, "ledger");
        gateway.add_repository(repo.clone(), &[]);
        let err = gateway
            .list_all_contents(&repo, ".github/workflows")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_contents_returns_direct_children() {
        let gateway = InMemoryGateway::new();
        let repo = repository(1, "ledger");
        gateway.add_repository(repo.clone(), &[]);
        gateway.put_file(&repo, ".github/workflows/ci.yml", "");
        gateway.put_file(&repo, ".github/workflows/release.yml", "");
        gateway.put_file(&repo, ".github/CODEOWNERS", "");

        let entries = gateway
            .list_all_contents(&repo, ".github/workflows")
            .await
            .unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["ci.yml", "release.yml"]);
    }

    #[tokio::test]
    async fn test_failing_operation_returns_api_error() {
        let gateway = InMemoryGateway::new();
        gateway.fail_on("organization_teams");
        let err = gateway.organization_teams().await.unwrap_err();
        assert!(matches!(err, GatewayError::Api { status: 500, .. }));
    }
}
