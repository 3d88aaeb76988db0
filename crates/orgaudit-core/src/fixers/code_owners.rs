//! CODEOWNERS remediation through a pull request.
//!
//! Path rules come from a team discussion titled exactly `CODEOWNERS`, one
//! rule per line of its body. The fix is idempotent: a pull request whose
//! source branch is [`CODEOWNERS_BRANCH`] marks the work as already started,
//! and a leftover branch without a pull request is reused.
//! Each content write (branch, commit, pull request) waits on the shared
//! [`RateLimiter`].

use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;

use crate::analyzers::code_owners::CODEOWNERS_PATH;
use crate::directory::TeamDirectory;
use crate::fix::FixResult;
use crate::fixers::{unsupported, IssueFixer};
use crate::gateway::{self, NewPullRequest, PlatformGateway, PullRequest, Repository};
use crate::issue::{IssueKind, RepositoryIssue};
use crate::metadata::RepositoryMetadata;
use crate::metrics::METRICS;
use crate::rate_limit::RateLimiter;
use crate::Result;

/// Source branch of every pull request opened by this fixer.
pub const CODEOWNERS_BRANCH: &str = "codeowners";

/// Title of the team discussion holding a team's path rules.
pub const CODEOWNERS_DISCUSSION: &str = "CODEOWNERS";

const KINDS: &[IssueKind] = &[IssueKind::MissedCodeOwners];

pub struct CodeOwnersFixer {
    gateway: Arc<dyn PlatformGateway>,
    limiter: Arc<RateLimiter>,
    page_size: u32,
    teams: TeamDirectory,
    default_content: String,
}

impl CodeOwnersFixer {
    pub fn new(gateway: Arc<dyn PlatformGateway>, limiter: Arc<RateLimiter>, page_size: u32) -> Self {
        Self {
            gateway,
            limiter,
            page_size,
            teams: TeamDirectory::default(),
            default_content: String::new(),
        }
    }

    /// Rules aggregated from every team's discussion, one `path @org/team` per line.
    pub fn default_content(&self) -> &str {
        &self.default_content
    }

    async fn existing_pull_request(&self, repository: &Repository) -> Result<Option<PullRequest>> {
        let pages = gateway::open_pull_requests(self.gateway.as_ref(), repository, self.page_size);
        futures::pin_mut!(pages);
        while let Some(page) = pages.try_next().await? {
            if let Some(found) = page.into_iter().find(|pr| pr.head_ref == CODEOWNERS_BRANCH) {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Wait for a content-mutation slot.
    async fn throttle(&self) {
        self.limiter.acquire().await;
        METRICS.inc_content_mutations();
    }
}

/// Non-empty trimmed lines of a discussion body.
fn path_rules(body: &str) -> impl Iterator<Item = &str> {
    body.lines().map(str::trim).filter(|line| !line.is_empty())
}

#[async_trait]
impl IssueFixer for CodeOwnersFixer {
    fn name(&self) -> &'static str {
        "code_owners"
    }

    fn supported_kinds(&self) -> &'static [IssueKind] {
        KINDS
    }

    async fn initialize(&mut self) -> Result<()> {
        let organization = self.gateway.organization().to_string();
        let teams = self.gateway.organization_teams().await?;

        let mut content = String::new();
        for team in &teams {
            let discussions = self.gateway.team_discussions(team).await?;
            let Some(discussion) = discussions
                .iter()
                .find(|discussion| discussion.title == CODEOWNERS_DISCUSSION)
            else {
                continue;
            };
            for rule in path_rules(&discussion.body) {
                content.push_str(&format!("{rule} @{organization}/{}\n", team.slug));
            }
        }

        self.default_content = content;
        self.teams = TeamDirectory::from_teams(teams);
        Ok(())
    }

    async fn fix(
        &self,
        issue: &RepositoryIssue,
        metadata: &RepositoryMetadata,
    ) -> Result<FixResult> {
        if issue.kind() != IssueKind::MissedCodeOwners {
            return Ok(unsupported(issue));
        }
        let repository = &metadata.repository;

        if let Some(existing) = self.existing_pull_request(repository).await? {
            return Ok(FixResult::in_progress(existing.html_url));
        }

        let Some(ownership) = metadata.ownership.as_deref() else {
            return Ok(FixResult::not_fixed("Repository ownership is not known"));
        };
        let Some(team) = self.teams.find(ownership) else {
            return Ok(FixResult::not_fixed(format!(
                "Repository ownership is not known: {ownership}"
            )));
        };

        let organization = self.gateway.organization();
        let content = format!(
            "*    @{organization}/{}\n{}\n",
            team.slug, self.default_content
        );

        self.throttle().await;
        match self
            .gateway
            .create_branch(repository, CODEOWNERS_BRANCH, &repository.default_branch)
            .await
        {
            Ok(()) => {}
            Err(err) if err.is_already_exists() => {
                tracing::info!(
                    repository = %repository.full_name,
                    branch = CODEOWNERS_BRANCH,
                    "reusing existing branch"
                );
            }
            Err(err) => return Err(err.into()),
        }

        self.throttle().await;
        self.gateway
            .commit_file(
                repository,
                CODEOWNERS_BRANCH,
                CODEOWNERS_PATH,
                &content,
                "Add CODEOWNERS",
            )
            .await?;

        self.throttle().await;
        let pull_request = self
            .gateway
            .create_pull_request(
                repository,
                &NewPullRequest {
                    title: "Add CODEOWNERS".to_string(),
                    head: CODEOWNERS_BRANCH.to_string(),
                    base: repository.default_branch.clone(),
                    body: format!(
                        "Assigns repository-wide ownership to @{organization}/{}.",
                        team.slug
                    ),
                },
            )
            .await?;

        tracing::info!(
            repository = %repository.full_name,
            url = %pull_request.html_url,
            "CODEOWNERS pull request opened"
        );
        Ok(FixResult::in_progress(pull_request.html_url))
    }
}
