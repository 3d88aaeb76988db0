//! Pluggable analyzers.
//!
//! A repository analyzer inspects one repository (through its
//! [`RepositoryMetadata`]) and returns typed issues; an organization analyzer
//! runs once per audit. `initialize` is called once before any analysis and
//! must not touch remote state beyond reads.
//!
//! - [`access`]: team and collaborator permission reconciliation
//! - [`branch_protection`]: default-branch rule policy
//! - [`code_owners`]: CODEOWNERS presence
//! - [`pull_requests`]: unreviewed and stalled pull requests
//! - [`settings`]: merge and feature settings
//! - [`topics`]: ownership and type topics
//! - [`team_maintainers`]: organization-wide maintainer coverage

pub mod access;
pub mod branch_protection;
pub mod code_owners;
pub mod pull_requests;
pub mod settings;
pub mod team_maintainers;
pub mod topics;

use async_trait::async_trait;

use crate::issue::{OrganizationIssue, RepositoryIssue};
use crate::metadata::RepositoryMetadata;
use crate::Result;

pub use access::{AccessAnalyzer, AccessSnapshot};
pub use branch_protection::BranchProtectionAnalyzer;
pub use code_owners::CodeOwnersAnalyzer;
pub use pull_requests::PullRequestsAnalyzer;
pub use settings::SettingsAnalyzer;
pub use team_maintainers::TeamMaintainersAnalyzer;
pub use topics::TopicsAnalyzer;

#[async_trait]
pub trait RepositoryAnalyzer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    async fn analyze(&self, metadata: &RepositoryMetadata) -> Result<Vec<RepositoryIssue>>;
}

#[async_trait]
pub trait OrganizationAnalyzer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    async fn analyze(&self) -> Result<Vec<OrganizationIssue>>;
}
