//! Organization-wide maintainer coverage. Reported only, never remediated.

use std::sync::Arc;

use async_trait::async_trait;

use crate::analyzers::OrganizationAnalyzer;
use crate::gateway::PlatformGateway;
use crate::issue::OrganizationIssue;
use crate::Result;

pub struct TeamMaintainersAnalyzer {
    gateway: Arc<dyn PlatformGateway>,
}

impl TeamMaintainersAnalyzer {
    pub fn new(gateway: Arc<dyn PlatformGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl OrganizationAnalyzer for TeamMaintainersAnalyzer {
    fn name(&self) -> &'static str {
        "team_maintainers"
    }

    async fn analyze(&self) -> Result<Vec<OrganizationIssue>> {
        let mut issues = Vec::new();
        for team in self.gateway.organization_teams().await? {
            let members = self.gateway.team_members(&team).await?;
            if members.is_empty() {
                issues.push(OrganizationIssue::MissedTeamMembers { team: team.name });
            } else if !members.iter().any(|member| member.is_active_maintainer()) {
                issues.push(OrganizationIssue::MaintainerMissed { team: team.name });
            }
        }
        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::InMemoryGateway;
    use crate::gateway::{MembershipState, Team, TeamMember, TeamRole};

    fn member(login: &str, role: TeamRole, state: MembershipState) -> TeamMember {
        TeamMember {
            login: login.to_string(),
            role,
            state,
        }
    }

    #[tokio::test]
    async fn test_coverage() {
        let gateway = Arc::new(InMemoryGateway::new());
        let empty = Team::new(1, "Empty", "empty");
        let pending = Team::new(2, "Pending", "pending");
        let healthy = Team::new(3, "Healthy", "healthy");
        for team in [&empty, &pending, &healthy] {
            gateway.add_team(team.clone());
        }
        gateway.set_members(
            &pending,
            vec![
                member("a", TeamRole::Maintainer, MembershipState::Pending),
                member("b", TeamRole::Member, MembershipState::Active),
            ],
        );
        gateway.set_members(
            &healthy,
            vec![member("c", TeamRole::Maintainer, MembershipState::Active)],
        );

        let issues = TeamMaintainersAnalyzer::new(gateway).analyze().await.unwrap();
        assert_eq!(
            issues,
            vec![
                OrganizationIssue::MissedTeamMembers {
                    team: "Empty".to_string()
                },
                OrganizationIssue::MaintainerMissed {
                    team: "Pending".to_string()
                },
            ]
        );
    }
}
