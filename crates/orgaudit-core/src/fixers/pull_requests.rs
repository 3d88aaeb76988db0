use std::sync::Arc;

use async_trait::async_trait;

use crate::directory::TeamDirectory;
use crate::fix::FixResult;
use crate::fixers::{unsupported, IssueFixer};
use crate::gateway::PlatformGateway;
use crate::issue::{IssueKind, RepositoryIssue};
use crate::metadata::RepositoryMetadata;
use crate::Result;

const KINDS: &[IssueKind] = &[IssueKind::MissedReviewersOnPullRequest];

/// Requests review from the repository's ownership team.
pub struct PullRequestsFixer {
    gateway: Arc<dyn PlatformGateway>,
    teams: TeamDirectory,
}

impl PullRequestsFixer {
    pub fn new(gateway: Arc<dyn PlatformGateway>) -> Self {
        Self {
            gateway,
            teams: TeamDirectory::default(),
        }
    }
}

#[async_trait]
impl IssueFixer for PullRequestsFixer {
    fn name(&self) -> &'static str {
        "pull_requests"
    }

    fn supported_kinds(&self) -> &'static [IssueKind] {
        KINDS
    }

    async fn initialize(&mut self) -> Result<()> {
        self.teams = TeamDirectory::load(self.gateway.as_ref()).await?;
        Ok(())
    }

    async fn fix(
        &self,
        issue: &RepositoryIssue,
        metadata: &RepositoryMetadata,
    ) -> Result<FixResult> {
        let RepositoryIssue::MissedReviewersOnPullRequest { number, .. } = issue else {
            return Ok(unsupported(issue));
        };
        let Some(ownership) = metadata.ownership.as_deref() else {
            return Ok(FixResult::not_fixed("Repository ownership is not known"));
        };
        let Some(team) = self.teams.find(ownership) else {
            return Ok(FixResult::not_fixed("Team not found"));
        };
        self.gateway
            .request_reviewers(&metadata.repository, *number, &[team.slug.clone()])
            .await?;
        Ok(FixResult::fixed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{pull_request, repository, InMemoryGateway, Mutation};
    use crate::gateway::Team;
    use chrono::Utc;

    async fn setup(topics: &[&str]) -> (Arc<InMemoryGateway>, PullRequestsFixer, RepositoryMetadata) {
        let gateway = Arc::new(InMemoryGateway::new());
        let repo = repository(1, "ledger");
        gateway.add_repository(repo.clone(), topics);
        gateway.add_team(Team::new(7, "Payments", "payments"));
        gateway.add_pull_request(&repo, pull_request(&repo, 12, "alice", Utc::now()));
        let mut fixer = PullRequestsFixer::new(gateway.clone());
        fixer.initialize().await.unwrap();
        let topics: Vec<String> = topics.iter().map(|t| t.to_string()).collect();
        (gateway, fixer, RepositoryMetadata::derive(repo, &topics))
    }

    fn issue() -> RepositoryIssue {
        RepositoryIssue::MissedReviewersOnPullRequest {
            url: "https://github.com/acme/ledger/pull/12".to_string(),
            number: 12,
        }
    }

    #[tokio::test]
    async fn test_requests_ownership_team() {
        let (gateway, fixer, metadata) = setup(&["ownership-payments"]).await;
        let result = fixer.fix(&issue(), &metadata).await.unwrap();
        assert_eq!(result, FixResult::fixed());
        assert_eq!(
            gateway.mutations(),
            vec![Mutation::RequestReviewers {
                repository: "ledger".to_string(),
                number: 12,
                teams: vec!["payments".to_string()],
            }]
        );
    }

    #[tokio::test]
    async fn test_unknown_ownership() {
        let (_, fixer, metadata) = setup(&[]).await;
        let result = fixer.fix(&issue(), &metadata).await.unwrap();
        assert_eq!(
            result,
            FixResult::not_fixed("Repository ownership is not known")
        );
    }

    #[tokio::test]
    async fn test_unknown_team() {
        let (gateway, fixer, metadata) = setup(&["ownership-billing"]).await;
        let result = fixer.fix(&issue(), &metadata).await.unwrap();
        assert_eq!(result, FixResult::not_fixed("Team not found"));
        assert!(gateway.mutations().is_empty());
    }
}
