//! Run report: per-repository outcomes, totals and the stalled pull request list.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::fix::{FixResult, FixStatus};
use crate::issue::{OrganizationIssue, RepositoryIssue};
use crate::metadata::RepositoryMetadata;

const SEPARATOR: &str =
    "--------------------------------------------------------------------------------";

/// One issue and the outcome of its fix dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueOutcome {
    pub title: String,
    pub issue: RepositoryIssue,
    pub result: FixResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryReport {
    pub metadata: RepositoryMetadata,
    pub issues: Vec<IssueOutcome>,
}

impl RepositoryReport {
    pub fn full_name(&self) -> &str {
        self.metadata.full_name()
    }
}

/// A stalled pull request extracted from the whole run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StalledPullRequest {
    pub repository: String,
    pub url: String,
    pub lifetime_days: i64,
    #[serde(skip)]
    pub lifetime: Duration,
    pub author: String,
    pub requested_reviewers: Vec<String>,
}

/// Aggregate counts. `fixed + in_progress + not_fixed == total_issues`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub repositories: usize,
    pub total_issues: usize,
    pub fixed: usize,
    pub in_progress: usize,
    pub not_fixed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub organization: String,
    pub generated_at: DateTime<Utc>,
    pub organization_issues: Vec<OrganizationIssue>,
    pub repositories: Vec<RepositoryReport>,
}

impl RunReport {
    pub fn new(organization: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            generated_at: Utc::now(),
            organization_issues: Vec::new(),
            repositories: Vec::new(),
        }
    }

    fn outcomes(&self) -> impl Iterator<Item = &IssueOutcome> {
        self.repositories.iter().flat_map(|repo| repo.issues.iter())
    }

    fn count(&self, status: FixStatus) -> usize {
        self.outcomes()
            .filter(|outcome| outcome.result.status == status)
            .count()
    }

    pub fn total_issues(&self) -> usize {
        self.repositories.iter().map(|repo| repo.issues.len()).sum()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            repositories: self.repositories.len(),
            total_issues: self.total_issues(),
            fixed: self.count(FixStatus::Fixed),
            in_progress: self.count(FixStatus::InProgress),
            not_fixed: self.count(FixStatus::NotFixed),
        }
    }

    /// Every stalled pull request of the run, longest-lived first.
    pub fn stalled_pull_requests(&self) -> Vec<StalledPullRequest> {
        let mut stalled: Vec<StalledPullRequest> = self
            .repositories
            .iter()
            .flat_map(|repo| {
                repo.issues.iter().filter_map(move |outcome| match &outcome.issue {
                    RepositoryIssue::PullRequestStalled {
                        url,
                        lifetime,
                        author,
                        requested_reviewers,
                    } => Some(StalledPullRequest {
                        repository: repo.full_name().to_string(),
                        url: url.clone(),
                        lifetime_days: lifetime.num_days(),
                        lifetime: *lifetime,
                        author: author.clone(),
                        requested_reviewers: requested_reviewers.clone(),
                    }),
                    _ => None,
                })
            })
            .collect();
        stalled.sort_by(|a, b| b.lifetime.cmp(&a.lifetime));
        stalled
    }

    /// Console rendering of the whole report.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        if !self.organization_issues.is_empty() {
            let _ = writeln!(
                out,
                "{} has {} issues:",
                self.organization,
                self.organization_issues.len()
            );
            for issue in &self.organization_issues {
                let _ = writeln!(out, "\t* {}", issue.title());
            }
        }

        let summary = self.summary();
        let _ = writeln!(
            out,
            "{} issues were found across all repositories",
            summary.total_issues
        );
        let _ = writeln!(out, "{} issues were fixed", summary.fixed);
        let _ = writeln!(out, "{} fixes are in progress", summary.in_progress);

        for repo in self.repositories.iter().filter(|r| !r.issues.is_empty()) {
            let _ = writeln!(out, "{} has issues:", repo.full_name());
            for outcome in &repo.issues {
                let _ = write!(out, "\t* {} - {}", outcome.title, outcome.result.symbol());
                match &outcome.result.message {
                    Some(message) => {
                        let _ = writeln!(out, " ({message})");
                    }
                    None => out.push('\n'),
                }
            }
            let _ = writeln!(out, "{SEPARATOR}");
        }

        let stalled = self.stalled_pull_requests();
        if !stalled.is_empty() {
            let _ = writeln!(out, "Most stalled pull requests:");
            for pr in &stalled {
                let _ = writeln!(
                    out,
                    "\t* ~{} days {} from {} (reviewers: {})",
                    pr.lifetime_days,
                    pr.url,
                    pr.author,
                    if pr.requested_reviewers.is_empty() {
                        "none".to_string()
                    } else {
                        pr.requested_reviewers.join(", ")
                    }
                );
            }
        }

        out
    }
}

#[derive(Serialize)]
struct ReportArtifact<'a> {
    summary: RunSummary,
    stalled_pull_requests: Vec<StalledPullRequest>,
    #[serde(flatten)]
    report: &'a RunReport,
}

/// Write the report, its summary and the stalled list as pretty JSON.
pub fn write_report_json(path: &Path, report: &RunReport) -> Result<()> {
    let artifact = ReportArtifact {
        summary: report.summary(),
        stalled_pull_requests: report.stalled_pull_requests(),
        report,
    };
    let content = serde_json::to_string_pretty(&artifact).context("serialize run report")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::repository;

    fn outcome(issue: RepositoryIssue, result: FixResult) -> IssueOutcome {
        IssueOutcome {
            title: issue.title(),
            issue,
            result,
        }
    }

    fn stalled(days: i64) -> RepositoryIssue {
        RepositoryIssue::PullRequestStalled {
            url: format!("https://github.com/acme/ledger/pull/{days}"),
            lifetime: Duration::days(days),
            author: "alice".to_string(),
            requested_reviewers: vec![],
        }
    }

    fn sample() -> RunReport {
        let mut report = RunReport::new("acme");
        report.organization_issues.push(OrganizationIssue::MaintainerMissed {
            team: "Docs".to_string(),
        });
        report.repositories.push(RepositoryReport {
            metadata: RepositoryMetadata::derive(repository(1, "ledger"), &[]),
            issues: vec![
                outcome(RepositoryIssue::WikiEnabled, FixResult::fixed()),
                outcome(stalled(9), FixResult::not_fixed("No fixer found for issue")),
                outcome(
                    RepositoryIssue::MissedCodeOwners,
                    FixResult::in_progress("https://github.com/acme/ledger/pull/1"),
                ),
            ],
        });
        report.repositories.push(RepositoryReport {
            metadata: RepositoryMetadata::derive(repository(2, "docs"), &[]),
            issues: vec![outcome(stalled(30), FixResult::not_fixed("x"))],
        });
        report.repositories.push(RepositoryReport {
            metadata: RepositoryMetadata::derive(repository(3, "clean"), &[]),
            issues: vec![],
        });
        report
    }

    #[test]
    fn test_summary_counts_partition_total() {
        let summary = sample().summary();
        assert_eq!(summary.total_issues, 4);
        assert_eq!(summary.fixed, 1);
        assert_eq!(summary.in_progress, 1);
        assert_eq!(summary.not_fixed, 2);
        assert_eq!(
            summary.fixed + summary.in_progress + summary.not_fixed,
            summary.total_issues
        );
    }

    #[test]
    fn test_stalled_sorted_longest_first() {
        let stalled = sample().stalled_pull_requests();
        let days: Vec<i64> = stalled.iter().map(|s| s.lifetime_days).collect();
        assert_eq!(days, vec![30, 9]);
        assert_eq!(stalled[0].repository, "acme/docs");
    }

    #[test]
    fn test_render_text_layout() {
        let text = sample().render_text();
        assert!(text.starts_with("acme has 1 issues:\n\t* Maintainer for 'Docs' team missed\n"));
        assert!(text.contains("4 issues were found across all repositories\n"));
        assert!(text.contains("1 issues were fixed\n"));
        assert!(text.contains("acme/ledger has issues:\n\t* Wiki enabled - ✅\n"));
        assert!(!text.contains("acme/clean"));
        assert!(text.contains(SEPARATOR));
        let docs = text.find("~30 days").unwrap();
        let ledger = text.find("~9 days").unwrap();
        assert!(docs < ledger);
    }

    #[test]
    fn test_write_report_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_report_json(&path, &sample()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["organization"], "acme");
        assert_eq!(value["summary"]["total_issues"], 4);
        assert_eq!(value["stalled_pull_requests"][0]["lifetime_days"], 30);
        assert_eq!(value["repositories"][0]["issues"][0]["issue"]["type"], "wiki_enabled");
    }
}
