//! orgaudit core library
//!
//! Policy evaluation and remediation engine for organization governance
//! audits. The engine talks to the platform only through
//! [`gateway::PlatformGateway`]; `orgaudit-github` provides the GitHub
//! implementation and [`fakes::InMemoryGateway`] an in-memory one.

pub mod analyzers;
pub mod directory;
pub mod error;
pub mod fakes;
pub mod fix;
pub mod fixers;
pub mod gateway;
pub mod issue;
pub mod metadata;
pub mod metrics;
pub mod obs;
pub mod permission;
pub mod rate_limit;
pub mod report;
pub mod runner;
pub mod secrets;
pub mod telemetry;

pub use error::{AuditError, Result};

pub use analyzers::{
    AccessAnalyzer, AccessSnapshot, BranchProtectionAnalyzer, CodeOwnersAnalyzer,
    OrganizationAnalyzer, PullRequestsAnalyzer, RepositoryAnalyzer, SettingsAnalyzer,
    TeamMaintainersAnalyzer, TopicsAnalyzer,
};
pub use directory::TeamDirectory;
pub use fix::{FixResult, FixStatus};
pub use fixers::{
    AccessFixer, BranchProtectionFixer, CodeOwnersFixer, FixerRegistry, IssueFixer,
    PullRequestsFixer, SettingsFixer,
};
pub use gateway::{GatewayError, GatewayResult, PlatformGateway};
pub use issue::{IssueKind, OrganizationIssue, RepositoryIssue};
pub use metadata::{RepositoryMetadata, RepositoryType};
pub use permission::{Permission, TeamHierarchy};
pub use rate_limit::RateLimiter;
pub use report::{write_report_json, RunReport, RunSummary, StalledPullRequest};
pub use runner::{AnalysisRunner, RunOptions};
pub use secrets::{SecretUsage, SecretUsageScanner};
pub use telemetry::init_tracing;

/// Crate version, as reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
