//! Analysis runner: the audit orchestrator.
//!
//! A run goes through four phases, strictly sequentially:
//!
//! 1. `initialize` every analyzer and fixer
//! 2. organization pass (reported, never remediated)
//! 3. repository pass: page through repositories, skip archived ones, derive
//!    metadata from topics and concatenate the issues of every analyzer
//! 4. remediation: route each issue to its fixer and record the outcome
//!
//! Errors in phases 1-3 abort the run. Errors raised by a fixer are caught
//! and recorded as `NotFixed`, so one failing repository never stops the rest.

use std::sync::Arc;
use std::time::Instant;

use futures::TryStreamExt;
use tracing::Instrument;

use crate::analyzers::{OrganizationAnalyzer, RepositoryAnalyzer};
use crate::fix::FixResult;
use crate::fixers::FixerRegistry;
use crate::gateway::{self, PlatformGateway};
use crate::issue::{OrganizationIssue, RepositoryIssue};
use crate::metadata::RepositoryMetadata;
use crate::metrics::METRICS;
use crate::obs;
use crate::report::{IssueOutcome, RepositoryReport, RunReport};
use crate::Result;

pub const NO_FIXER_MESSAGE: &str = "No fixer found for issue";
pub const DRY_RUN_MESSAGE: &str = "fixes disabled (dry run)";
pub const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// When `false`, every issue is reported `NotFixed` without calling a fixer.
    pub apply_fixes: bool,
    pub page_size: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            apply_fixes: true,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

pub struct AnalysisRunner {
    gateway: Arc<dyn PlatformGateway>,
    organization_analyzers: Vec<Box<dyn OrganizationAnalyzer>>,
    repository_analyzers: Vec<Box<dyn RepositoryAnalyzer>>,
    fixers: FixerRegistry,
    options: RunOptions,
}

impl AnalysisRunner {
    pub fn new(gateway: Arc<dyn PlatformGateway>, options: RunOptions) -> Self {
        Self {
            gateway,
            organization_analyzers: Vec::new(),
            repository_analyzers: Vec::new(),
            fixers: FixerRegistry::new(),
            options,
        }
    }

    pub fn with_organization_analyzer(mut self, analyzer: impl OrganizationAnalyzer + 'static) -> Self {
        self.organization_analyzers.push(Box::new(analyzer));
        self
    }

    pub fn with_repository_analyzer(mut self, analyzer: impl RepositoryAnalyzer + 'static) -> Self {
        self.repository_analyzers.push(Box::new(analyzer));
        self
    }

    pub fn with_fixers(mut self, fixers: FixerRegistry) -> Self {
        self.fixers = fixers;
        self
    }

    /// Run the whole audit and return its report.
    pub async fn run(&mut self) -> Result<RunReport> {
        let span = obs::run_span(self.gateway.organization());
        self.run_phases().instrument(span).await
    }

    async fn run_phases(&mut self) -> Result<RunReport> {
        let started = Instant::now();
        let organization = self.gateway.organization().to_string();

        self.initialize().await?;
        obs::emit_run_started(
            &organization,
            self.organization_analyzers.len() + self.repository_analyzers.len(),
            self.fixers.len(),
            self.options.apply_fixes,
        );

        let mut report = RunReport::new(organization.clone());
        report.organization_issues = self.analyze_organization().await?;

        let analyzed = self.analyze_repositories().await?;
        for (metadata, issues) in analyzed {
            let mut outcomes = Vec::with_capacity(issues.len());
            for issue in issues {
                let result = self.dispatch(&issue, &metadata).await;
                outcomes.push(IssueOutcome {
                    title: issue.title(),
                    issue,
                    result,
                });
            }
            report.repositories.push(RepositoryReport {
                metadata,
                issues: outcomes,
            });
        }

        let summary = report.summary();
        obs::emit_run_finished(
            &organization,
            started.elapsed().as_millis() as u64,
            summary.repositories,
            summary.total_issues,
            summary.fixed,
        );
        METRICS.flush();
        Ok(report)
    }

    async fn initialize(&mut self) -> Result<()> {
        for analyzer in &mut self.repository_analyzers {
            tracing::debug!(analyzer = analyzer.name(), "initializing analyzer");
            analyzer.initialize().await?;
        }
        for analyzer in &mut self.organization_analyzers {
            tracing::debug!(analyzer = analyzer.name(), "initializing analyzer");
            analyzer.initialize().await?;
        }
        self.fixers.initialize().await
    }

    async fn analyze_organization(&self) -> Result<Vec<OrganizationIssue>> {
        let mut issues = Vec::new();
        for analyzer in &self.organization_analyzers {
            issues.extend(analyzer.analyze().await?);
        }
        Ok(issues)
    }

    async fn analyze_repositories(&self) -> Result<Vec<(RepositoryMetadata, Vec<RepositoryIssue>)>> {
        let mut analyzed = Vec::new();
        let pages = gateway::organization_repositories(self.gateway.as_ref(), self.options.page_size);
        futures::pin_mut!(pages);

        while let Some(page) = pages.try_next().await? {
            for repository in page {
                if repository.archived {
                    tracing::debug!(repository = %repository.full_name, "skipping archived repository");
                    continue;
                }
                let topics = self.gateway.repository_topics(&repository).await?;
                let metadata = RepositoryMetadata::derive(repository, &topics);
                let issues = self.analyze_repository(&metadata).await?;
                analyzed.push((metadata, issues));
            }
        }
        Ok(analyzed)
    }

    /// Concatenated issues of every repository analyzer, in registration order.
    pub async fn analyze_repository(&self, metadata: &RepositoryMetadata) -> Result<Vec<RepositoryIssue>> {
        let mut issues = Vec::new();
        for analyzer in &self.repository_analyzers {
            issues.extend(analyzer.analyze(metadata).await?);
        }
        METRICS.inc_repositories_analyzed();
        METRICS.add_issues_found(issues.len() as u64);
        obs::emit_repository_analyzed(metadata.full_name(), issues.len());
        Ok(issues)
    }

    /// Route `issue` to its fixer. Never fails.
    pub async fn dispatch(&self, issue: &RepositoryIssue, metadata: &RepositoryMetadata) -> FixResult {
        if !self.options.apply_fixes {
            return FixResult::not_fixed(DRY_RUN_MESSAGE);
        }
        let kind = issue.kind();
        let Some(fixer) = self.fixers.fixer_for(kind) else {
            return FixResult::not_fixed(NO_FIXER_MESSAGE);
        };

        METRICS.inc_fixes_attempted();
        let result = match fixer.fix(issue, metadata).await {
            Ok(result) => result,
            Err(err) => {
                obs::emit_fix_failed(metadata.full_name(), kind, &err);
                FixResult::not_fixed(format!("Error occurred during fix: {err}"))
            }
        };
        obs::emit_fix_applied(metadata.full_name(), kind, &result);
        result
    }
}
