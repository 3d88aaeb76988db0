use std::sync::Arc;

use async_trait::async_trait;

use crate::directory::TeamDirectory;
use crate::fix::FixResult;
use crate::fixers::{unsupported, IssueFixer};
use crate::gateway::PlatformGateway;
use crate::issue::{IssueKind, RepositoryIssue};
use crate::metadata::RepositoryMetadata;
use crate::Result;

const KINDS: &[IssueKind] = &[IssueKind::MissedTeamAccess, IssueKind::InvalidTeamAccess];

/// Grants the expected tier to a team with missing or wrong access.
///
/// Collaborator findings are left for manual review.
pub struct AccessFixer {
    gateway: Arc<dyn PlatformGateway>,
    teams: TeamDirectory,
}

impl AccessFixer {
    pub fn new(gateway: Arc<dyn PlatformGateway>) -> Self {
        Self {
            gateway,
            teams: TeamDirectory::default(),
        }
    }
}

#[async_trait]
impl IssueFixer for AccessFixer {
    fn name(&self) -> &'static str {
        "access"
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
        let (team_key, permission) = match issue {
            RepositoryIssue::MissedTeamAccess { team, permission } => (team, *permission),
            RepositoryIssue::InvalidTeamAccess { team, expected, .. } => (team, *expected),
            _ => return Ok(unsupported(issue)),
        };
        let Some(team) = self.teams.find(team_key) else {
            return Ok(FixResult::not_fixed(format!("Team not found: {team_key}")));
        };
        self.gateway
            .add_or_update_team_repository_permission(team, &metadata.repository.name, permission)
            .await?;
        Ok(FixResult::fixed())
    }
}
