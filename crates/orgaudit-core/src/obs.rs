//! Structured lifecycle events of an audit run.
//!
//! - Run-scoped span via [`run_span`], attached with `Instrument`
//! - `emit_*` functions for start, per-repository analysis, fix outcome and finish
//!
//! Events are emitted at `info!` (failures at `warn!`) with an `event` field
//! so they can be filtered in JSON log pipelines.

use tracing::{info, warn};

use crate::fix::FixResult;
use crate::issue::IssueKind;

/// Span tagged with the audited organization. Attach it to the run future
/// with `tracing::Instrument` rather than entering it across awaits.
pub fn run_span(organization: &str) -> tracing::Span {
    tracing::info_span!("orgaudit.run", organization = %organization)
}

pub fn emit_run_started(organization: &str, analyzers: usize, fixers: usize, apply_fixes: bool) {
    info!(
        event = "run.started",
        organization = %organization,
        analyzers = analyzers,
        fixers = fixers,
        apply_fixes = apply_fixes,
    );
}

pub fn emit_repository_analyzed(full_name: &str, issues: usize) {
    info!(event = "repository.analyzed", repository = %full_name, issues = issues);
}

/// Emit the outcome of one fix dispatch.
pub fn emit_fix_applied(full_name: &str, kind: IssueKind, result: &FixResult) {
    info!(
        event = "fix.applied",
        repository = %full_name,
        kind = %kind,
        status = ?result.status,
        message = result.message.as_deref().unwrap_or(""),
    );
}

/// Emit a fixer error that was downgraded to `NotFixed` (warning level).
pub fn emit_fix_failed(full_name: &str, kind: IssueKind, error: &dyn std::fmt::Display) {
    warn!(event = "fix.failed", repository = %full_name, kind = %kind, error = %error);
}

pub fn emit_run_finished(
    organization: &str,
    duration_ms: u64,
    repositories: usize,
    total_issues: usize,
    fixed: usize,
) {
    info!(
        event = "run.finished",
        organization = %organization,
        duration_ms = duration_ms,
        repositories = repositories,
        total_issues = total_issues,
        fixed = fixed,
    );
}
