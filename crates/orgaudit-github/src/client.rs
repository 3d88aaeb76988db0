//! [`PlatformGateway`] over the GitHub REST v3 and GraphQL v4 APIs.

use async_trait::async_trait;
use base64::Engine as _;
use futures::TryStreamExt;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use orgaudit_core::gateway::{
    self, BranchProtection, BranchProtectionRulePatch, Collaborator, FileEntry, GatewayResult,
    MembershipState, NewBranchProtectionRule, NewPullRequest, OptionalExt, PlatformGateway,
    PullRequest, Repository, RepositorySettings, RepositorySettingsPatch, RuleId, Team,
    TeamDiscussion, TeamMember, TeamRepository, TeamRole, User,
};
use orgaudit_core::Permission;

use crate::config::GitHubConfig;
use crate::error::{transport, GitHubError};
use crate::graphql;
use crate::http::{check_response, encode_path, existing_ref};
use crate::wire::{
    Account, CollaboratorPayload, ContentPayload, ContentsPayload, DiscussionPayload,
    GitRefPayload, NewGitRef, ProtectionPayload, PullRequestPayload, PutContent,
    RepositoryPayload, ReviewRequest, TeamPayload, TeamPermission,
};

const API_VERSION: &str = "2022-11-28";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";

/// Page size of list endpoints the engine does not page itself.
const LIST_PAGE_SIZE: u32 = 100;

/// GitHub gateway.
pub struct GitHubGateway {
    config: GitHubConfig,
    http: reqwest::Client,
}

impl GitHubGateway {
    /// Validate `config` and build an authenticated HTTP client.
    pub fn new(config: GitHubConfig) -> Result<Self, GitHubError> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| GitHubError::Config("token contains invalid characters".into()))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(GitHubGateway { config, http })
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url, path)
    }

    fn org(&self) -> &str {
        &self.config.organization
    }

    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> GatewayResult<reqwest::Response> {
        let response = request.send().await.map_err(transport)?;
        check_response(response, what).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> GatewayResult<T> {
        let response = self.send(self.http.get(self.url(path)), path).await?;
        response.json().await.map_err(transport)
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        page: u32,
        per_page: u32,
    ) -> GatewayResult<Vec<T>> {
        let separator = if path.contains('?') { '&' } else { '?' };
        self.get_json(&format!("{path}{separator}per_page={per_page}&page={page}"))
            .await
    }

    /// Every item of a list endpoint.
    async fn get_all<T: DeserializeOwned>(&self, path: &str) -> GatewayResult<Vec<T>> {
        let pages = gateway::paginate(LIST_PAGE_SIZE, |page| {
            self.get_page::<T>(path, page, LIST_PAGE_SIZE)
        });
        let items: Vec<T> = pages.try_concat().await?;
        debug!(path, items = items.len(), "listed");
        Ok(items)
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> GatewayResult<reqwest::Response> {
        self.send(self.http.request(method, self.url(path)).json(body), path)
            .await
    }

    async fn graphql<T: DeserializeOwned>(&self, query: &str, variables: Value) -> GatewayResult<T> {
        let body = self.graphql_raw(query, variables).await?;
        graphql::decode(body)
    }

    async fn graphql_raw(&self, query: &str, variables: Value) -> GatewayResult<Value> {
        let request = self
            .http
            .post(&self.config.graphql_url)
            .json(&graphql::Request { query, variables });
        let response = self.send(request, "graphql").await?;
        response.json().await.map_err(transport)
    }

    fn repo_path(owner: &str, name: &str) -> String {
        format!("/repos/{}/{}", urlencoding::encode(owner), urlencoding::encode(name))
    }

    fn team_path(&self, team: &Team) -> String {
        format!(
            "/orgs/{}/teams/{}",
            urlencoding::encode(self.org()),
            urlencoding::encode(&team.slug)
        )
    }

    async fn members_with_role(&self, team: &Team, role: TeamRole) -> GatewayResult<Vec<TeamMember>> {
        let filter = match role {
            TeamRole::Maintainer => "maintainer",
            TeamRole::Member => "member",
        };
        let accounts: Vec<Account> = self
            .get_all(&format!("{}/members?role={filter}", self.team_path(team)))
            .await?;
        // The members listing only returns accepted memberships.
        Ok(accounts
            .into_iter()
            .map(|account| TeamMember {
                login: account.login,
                role,
                state: MembershipState::Active,
            })
            .collect())
    }
}

#[async_trait]
impl PlatformGateway for GitHubGateway {
    fn organization(&self) -> &str {
        self.org()
    }

    async fn organization_repositories(
        &self,
        page: u32,
        per_page: u32,
    ) -> GatewayResult<Vec<Repository>> {
        let path = format!("/orgs/{}/repos?type=all", urlencoding::encode(self.org()));
        let payloads: Vec<RepositoryPayload> = self.get_page(&path, page, per_page).await?;
        Ok(payloads
            .into_iter()
            .map(RepositoryPayload::into_repository)
            .collect())
    }

    async fn organization_teams(&self) -> GatewayResult<Vec<Team>> {
        let path = format!("/orgs/{}/teams", urlencoding::encode(self.org()));
        let payloads: Vec<TeamPayload> = self.get_all(&path).await?;
        Ok(payloads.into_iter().map(Team::from).collect())
    }

    async fn repository_teams(&self, repository: &Repository) -> GatewayResult<Vec<Team>> {
        let path = format!("{}/teams", Self::repo_path(&repository.owner, &repository.name));
        let payloads: Vec<TeamPayload> = self.get_all(&path).await?;
        Ok(payloads.into_iter().map(Team::from).collect())
    }

    async fn team_repositories(&self, team: &Team) -> GatewayResult<Vec<TeamRepository>> {
        let payloads: Vec<RepositoryPayload> =
            self.get_all(&format!("{}/repos", self.team_path(team))).await?;
        Ok(payloads
            .into_iter()
            .map(RepositoryPayload::into_team_repository)
            .collect())
    }

    async fn team_members(&self, team: &Team) -> GatewayResult<Vec<TeamMember>> {
        let mut members = self.members_with_role(team, TeamRole::Maintainer).await?;
        members.extend(self.members_with_role(team, TeamRole::Member).await?);
        Ok(members)
    }

    async fn team_discussions(&self, team: &Team) -> GatewayResult<Vec<TeamDiscussion>> {
        let payloads: Vec<DiscussionPayload> = self
            .get_all(&format!("{}/discussions", self.team_path(team)))
            .await?;
        Ok(payloads.into_iter().map(TeamDiscussion::from).collect())
    }

    async fn repository_collaborators(
        &self,
        repository: &Repository,
    ) -> GatewayResult<Vec<Collaborator>> {
        let path = format!(
            "{}/collaborators?affiliation=all",
            Self::repo_path(&repository.owner, &repository.name)
        );
        let payloads: Vec<CollaboratorPayload> = self.get_all(&path).await?;
        Ok(payloads
            .into_iter()
            .filter_map(CollaboratorPayload::into_collaborator)
            .collect())
    }

    async fn organization_owners(&self) -> GatewayResult<Vec<User>> {
        let path = format!("/orgs/{}/members?role=admin", urlencoding::encode(self.org()));
        let accounts: Vec<Account> = self.get_all(&path).await?;
        Ok(accounts.into_iter().map(User::from).collect())
    }

    async fn repository_topics(&self, repository: &Repository) -> GatewayResult<Vec<String>> {
        let body = self
            .graphql_raw(
                graphql::REPOSITORY_TOPICS,
                graphql::topics_variables(&repository.owner, &repository.name),
            )
            .await?;
        graphql::parse_topics(body, &repository.full_name)
    }

    async fn raw_file_content(&self, repository_name: &str, path: &str) -> GatewayResult<String> {
        let url = self.url(&format!(
            "{}/contents/{}",
            Self::repo_path(self.org(), repository_name),
            encode_path(path)
        ));
        let request = self
            .http
            .get(url)
            .header(header::ACCEPT, RAW_MEDIA_TYPE);
        let response = self
            .send(request, &format!("{}/{repository_name}/{path}", self.org()))
            .await?;
        response.text().await.map_err(transport)
    }

    async fn list_all_contents(
        &self,
        repository: &Repository,
        path: &str,
    ) -> GatewayResult<Vec<FileEntry>> {
        let contents: ContentsPayload = self
            .get_json(&format!(
                "{}/contents/{}",
                Self::repo_path(&repository.owner, &repository.name),
                encode_path(path)
            ))
            .await?;
        Ok(contents.into_entries())
    }

    async fn branch_protection(
        &self,
        owner: &str,
        repository_name: &str,
        branch: &str,
    ) -> GatewayResult<Option<(BranchProtection, RuleId)>> {
        let path = format!(
            "{}/branches/{}/protection",
            Self::repo_path(owner, repository_name),
            urlencoding::encode(branch)
        );
        let Some(payload) = self.get_json::<ProtectionPayload>(&path).await.optional()? else {
            return Ok(None);
        };

        let body = self
            .graphql_raw(
                graphql::BRANCH_PROTECTION_RULES,
                graphql::rules_variables(owner, repository_name),
            )
            .await?;
        match graphql::parse_rule_id(body, branch)? {
            Some(rule_id) => Ok(Some((BranchProtection::from(payload), rule_id))),
            None => {
                // Protected through a wildcard or a ruleset; nothing to patch.
                warn!(
                    repository = %format!("{owner}/{repository_name}"),
                    branch,
                    "branch is protected but no rule matches its exact name"
                );
                Ok(None)
            }
        }
    }

    async fn create_branch_protection_rule(
        &self,
        rule: &NewBranchProtectionRule,
    ) -> GatewayResult<()> {
        let _: Value = self
            .graphql(
                graphql::CREATE_BRANCH_PROTECTION_RULE,
                graphql::create_rule_input(rule)?,
            )
            .await?;
        Ok(())
    }

    async fn update_branch_protection_rule(
        &self,
        rule_id: &RuleId,
        patch: &BranchProtectionRulePatch,
    ) -> GatewayResult<()> {
        let _: Value = self
            .graphql(
                graphql::UPDATE_BRANCH_PROTECTION_RULE,
                graphql::update_rule_input(rule_id, patch)?,
            )
            .await?;
        Ok(())
    }

    async fn repository_settings(
        &self,
        owner: &str,
        repository_name: &str,
    ) -> GatewayResult<RepositorySettings> {
        let payload: RepositoryPayload = self
            .get_json(&Self::repo_path(owner, repository_name))
            .await?;
        Ok(payload.settings())
    }

    async fn update_repository_settings(
        &self,
        repository: &Repository,
        patch: &RepositorySettingsPatch,
    ) -> GatewayResult<()> {
        self.send_json(
            reqwest::Method::PATCH,
            &Self::repo_path(&repository.owner, &repository.name),
            patch,
        )
        .await?;
        Ok(())
    }

    async fn open_pull_requests(
        &self,
        repository: &Repository,
        page: u32,
        per_page: u32,
    ) -> GatewayResult<Vec<PullRequest>> {
        let path = format!(
            "{}/pulls?state=open",
            Self::repo_path(&repository.owner, &repository.name)
        );
        let payloads: Vec<PullRequestPayload> = self.get_page(&path, page, per_page).await?;
        Ok(payloads.into_iter().map(PullRequest::from).collect())
    }

    async fn create_branch(
        &self,
        repository: &Repository,
        branch: &str,
        from_branch: &str,
    ) -> GatewayResult<()> {
        let repo = Self::repo_path(&repository.owner, &repository.name);
        let head: GitRefPayload = self
            .get_json(&format!("{repo}/git/ref/heads/{}", encode_path(from_branch)))
            .await?;
        let ref_name = format!("refs/heads/{branch}");
        self.send_json(
            reqwest::Method::POST,
            &format!("{repo}/git/refs"),
            &NewGitRef {
                ref_name: ref_name.clone(),
                sha: &head.object.sha,
            },
        )
        .await
        .map_err(|err| existing_ref(err, &format!("{}:{ref_name}", repository.full_name)))?;
        Ok(())
    }

    async fn commit_file(
        &self,
        repository: &Repository,
        branch: &str,
        path: &str,
        content: &str,
        message: &str,
    ) -> GatewayResult<()> {
        let contents_path = format!(
            "{}/contents/{}",
            Self::repo_path(&repository.owner, &repository.name),
            encode_path(path)
        );
        // Updating an existing file requires its blob sha.
        let existing = self
            .get_json::<ContentPayload>(&format!(
                "{contents_path}?ref={}",
                urlencoding::encode(branch)
            ))
            .await
            .optional()?;

        self.send_json(
            reqwest::Method::PUT,
            &contents_path,
            &PutContent {
                message,
                content: base64::engine::general_purpose::STANDARD.encode(content),
                branch,
                sha: existing.and_then(|entry| entry.sha),
            },
        )
        .await?;
        Ok(())
    }

    async fn create_pull_request(
        &self,
        repository: &Repository,
        pull_request: &NewPullRequest,
    ) -> GatewayResult<PullRequest> {
        let response = self
            .send_json(
                reqwest::Method::POST,
                &format!("{}/pulls", Self::repo_path(&repository.owner, &repository.name)),
                pull_request,
            )
            .await?;
        let payload: PullRequestPayload = response.json().await.map_err(transport)?;
        Ok(payload.into())
    }

    async fn request_reviewers(
        &self,
        repository: &Repository,
        pull_request_number: u64,
        team_slugs: &[String],
    ) -> GatewayResult<()> {
        self.send_json(
            reqwest::Method::POST,
            &format!(
                "{}/pulls/{pull_request_number}/requested_reviewers",
                Self::repo_path(&repository.owner, &repository.name)
            ),
            &ReviewRequest {
                reviewers: Vec::new(),
                team_reviewers: team_slugs,
            },
        )
        .await?;
        Ok(())
    }

    async fn add_or_update_team_repository_permission(
        &self,
        team: &Team,
        repository_name: &str,
        permission: Permission,
    ) -> GatewayResult<()> {
        let path = format!(
            "{}/repos/{}/{}",
            self.team_path(team),
            urlencoding::encode(self.org()),
            urlencoding::encode(repository_name)
        );
        self.send_json(
            reqwest::Method::PUT,
            &path,
            &TeamPermission {
                permission: permission.as_str(),
            },
        )
        .await?;
        Ok(())
    }
}
