//! Open pull requests without reviewers or open for too long.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use futures::TryStreamExt;

use crate::analyzers::RepositoryAnalyzer;
use crate::gateway::{self, PlatformGateway, PullRequest};
use crate::issue::{RepositoryIssue, STALLED_AFTER_DAYS};
use crate::metadata::RepositoryMetadata;
use crate::Result;

pub struct PullRequestsAnalyzer {
    gateway: Arc<dyn PlatformGateway>,
    page_size: u32,
}

impl PullRequestsAnalyzer {
    pub fn new(gateway: Arc<dyn PlatformGateway>, page_size: u32) -> Self {
        Self { gateway, page_size }
    }

    /// Issues for a single pull request, evaluated at `now`.
    fn evaluate(
        &self,
        pull_request: &PullRequest,
        now: chrono::DateTime<Utc>,
    ) -> Vec<RepositoryIssue> {
        let mut issues = Vec::new();

        if pull_request.requested_reviewers.is_empty()
            && pull_request.requested_teams.is_empty()
            && !pull_request.draft
        {
            issues.push(RepositoryIssue::MissedReviewersOnPullRequest {
                url: pull_request.html_url.clone(),
                number: pull_request.number,
            });
        }

        let lifetime = now - pull_request.created_at;
        if lifetime > Duration::days(STALLED_AFTER_DAYS) {
            let organization = self.gateway.organization();
            let mut reviewers = pull_request.requested_reviewers.clone();
            for slug in &pull_request.requested_teams {
                let team = format!("@{organization}/{slug}");
                if !reviewers.contains(&team) {
                    reviewers.push(team);
                }
            }
            issues.push(RepositoryIssue::PullRequestStalled {
                url: pull_request.html_url.clone(),
                lifetime,
                author: pull_request.author.clone(),
                requested_reviewers: reviewers,
            });
        }

        issues
    }
}

#[async_trait]
impl RepositoryAnalyzer for PullRequestsAnalyzer {
    fn name(&self) -> &'static str {
        "pull_requests"
    }

    async fn analyze(&self, metadata: &RepositoryMetadata) -> Result<Vec<RepositoryIssue>> {
        let now = Utc::now();
        let mut issues = Vec::new();
        let pages = gateway::open_pull_requests(
            self.gateway.as_ref(),
            &metadata.repository,
            self.page_size,
        );
        futures::pin_mut!(pages);
        while let Some(page) = pages.try_next().await? {
            for pull_request in &page {
                issues.extend(self.evaluate(pull_request, now));
            }
        }
        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{pull_request, repository, InMemoryGateway};

    fn setup() -> (Arc<InMemoryGateway>, RepositoryMetadata) {
        let gateway = Arc::new(InMemoryGateway::new());
        let repo = repository(1, "ledger");
        gateway.add_repository(repo.clone(), &[]);
        (gateway, RepositoryMetadata::derive(repo, &[]))
    }

    #[tokio::test]
    async fn test_old_unreviewed_pull_request_yields_both_issues() {
        let (gateway, metadata) = setup();
        let created = Utc::now() - Duration::days(10);
        gateway.add_pull_request(
            &metadata.repository,
            pull_request(&metadata.repository, 7, "alice", created),
        );

        let analyzer = PullRequestsAnalyzer::new(gateway, 100);
        let issues = analyzer.analyze(&metadata).await.unwrap();

        assert_eq!(issues.len(), 2);
        assert!(matches!(
            issues[0],
            RepositoryIssue::MissedReviewersOnPullRequest { number: 7, .. }
        ));
        match &issues[1] {
            RepositoryIssue::PullRequestStalled {
                lifetime, author, ..
            } => {
                assert_eq!(lifetime.num_days(), 10);
                assert_eq!(author, "alice");
            }
            other => panic!("unexpected issue {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_draft_without_reviewers_is_not_reported() {
        let (gateway, metadata) = setup();
        let mut draft = pull_request(&metadata.repository, 3, "bob", Utc::now());
        draft.draft = true;
        gateway.add_pull_request(&metadata.repository, draft);

        let analyzer = PullRequestsAnalyzer::new(gateway, 100);
        assert!(analyzer.analyze(&metadata).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stalled_reviewers_include_team_handles() {
        let (gateway, metadata) = setup();
        let mut pr = pull_request(
            &metadata.repository,
            4,
            "carol",
            Utc::now() - Duration::days(8),
        );
        pr.requested_reviewers = vec!["dave".to_string()];
        pr.requested_teams = vec!["payments".to_string()];
        gateway.add_pull_request(&metadata.repository, pr);

        let analyzer = PullRequestsAnalyzer::new(gateway, 100);
        let issues = analyzer.analyze(&metadata).await.unwrap();
        assert_eq!(issues.len(), 1);
        match &issues[0] {
            RepositoryIssue::PullRequestStalled {
                url,
                requested_reviewers,
                ..
            } => {
                assert_eq!(url, &format!("{}/pull/4", metadata.repository.html_url));
                assert_eq!(
                    requested_reviewers,
                    &vec!["dave".to_string(), "@acme/payments".to_string()]
                );
            }
            other => panic!("unexpected issue {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exactly_seven_days_is_not_stalled() {
        let (gateway, metadata) = setup();
        let mut pr = pull_request(
            &metadata.repository,
            5,
            "erin",
            Utc::now() - Duration::days(7) + Duration::minutes(5),
        );
        pr.requested_reviewers = vec!["frank".to_string()];
        gateway.add_pull_request(&metadata.repository, pr);

        let analyzer = PullRequestsAnalyzer::new(gateway, 100);
        assert!(analyzer.analyze(&metadata).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_all_pages_are_scanned() {
        let (gateway, metadata) = setup();
        for number in 1..=5 {
            gateway.add_pull_request(
                &metadata.repository,
                pull_request(&metadata.repository, number, "gina", Utc::now()),
            );
        }
        let analyzer = PullRequestsAnalyzer::new(gateway, 2);
        let issues = analyzer.analyze(&metadata).await.unwrap();
        assert_eq!(issues.len(), 5);
    }
}
