//! Access reconciler: expected vs. actual team and collaborator permissions.
//!
//! The expected tier of a team on a repository follows the ownership
//! hierarchy:
//!
//! - the ownership team gets `Maintain`
//! - the parent of the ownership team gets `Push`
//! - every other team gets `Pull`
//!
//! The ownership team and its parent are resolved to concrete teams with the
//! [`TeamDirectory`] rule (lowercase name, then slug) and compared by id.
//!
//! Everything organization-wide is captured once in an [`AccessSnapshot`] at
//! initialization and only read afterwards. Per repository, only the teams
//! with access and the collaborators are fetched.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;

use crate::analyzers::RepositoryAnalyzer;
use crate::directory::TeamDirectory;
use crate::gateway::{Collaborator, PlatformGateway, Team};
use crate::issue::RepositoryIssue;
use crate::metadata::RepositoryMetadata;
use crate::permission::{Permission, TeamHierarchy};
use crate::{AuditError, Result};

/// Immutable organization-wide access state.
#[derive(Debug, Clone, Default)]
pub struct AccessSnapshot {
    owners: HashSet<String>,
    maintainers_by_team: HashMap<u64, HashSet<String>>,
    /// Keyed by `(repository_id, team_id)`.
    permissions: HashMap<(u64, u64), Permission>,
    hierarchy: TeamHierarchy,
    directory: TeamDirectory,
}

/// Ownership team and parent of one repository, resolved to team ids.
struct Expectation {
    ownership: Option<(String, Option<u64>)>,
    parent: Option<(String, Option<u64>)>,
}

impl Expectation {
    fn owner_id(&self) -> Option<u64> {
        self.ownership.as_ref().and_then(|(_, id)| *id)
    }

    fn parent_id(&self) -> Option<u64> {
        self.parent.as_ref().and_then(|(_, id)| *id)
    }

    fn permission_for(&self, team: &Team) -> Permission {
        if self.owner_id() == Some(team.id) {
            Permission::Maintain
        } else if self.parent_id() == Some(team.id) {
            Permission::Push
        } else {
            Permission::Pull
        }
    }
}

impl AccessSnapshot {
    pub fn new(owners: impl IntoIterator<Item = String>, hierarchy: TeamHierarchy) -> Self {
        Self {
            owners: owners.into_iter().collect(),
            hierarchy,
            ..Self::default()
        }
    }

    /// Set the active maintainers of `team_id`.
    pub fn with_maintainers(
        mut self,
        team_id: u64,
        logins: impl IntoIterator<Item = String>,
    ) -> Self {
        self.maintainers_by_team
            .insert(team_id, logins.into_iter().collect());
        self
    }

    /// Record the tier `team_id` holds on `repository_id`.
    pub fn with_permission(mut self, repository_id: u64, team_id: u64, permission: Permission) -> Self {
        self.permissions
            .insert((repository_id, team_id), permission);
        self
    }

    /// Organization teams used to resolve ownership keys.
    pub fn with_teams(mut self, teams: impl IntoIterator<Item = Team>) -> Self {
        self.directory = TeamDirectory::from_teams(teams);
        self
    }

    /// Fetch owners, team maintainers, team grants and the hierarchy.
    pub async fn load(gateway: &dyn PlatformGateway) -> Result<Self> {
        let owners = gateway
            .organization_owners()
            .await?
            .into_iter()
            .map(|user| user.login);
        let teams = gateway.organization_teams().await?;
        let mut snapshot =
            Self::new(owners, TeamHierarchy::from_teams(&teams)).with_teams(teams.iter().cloned());

        for team in &teams {
            let maintainers: HashSet<String> = gateway
                .team_members(team)
                .await?
                .into_iter()
                .filter(|member| member.is_active_maintainer())
                .map(|member| member.login)
                .collect();
            snapshot.maintainers_by_team.insert(team.id, maintainers);

            for grant in gateway.team_repositories(team).await? {
                snapshot
                    .permissions
                    .insert((grant.repository_id, team.id), grant.permission);
            }
        }

        tracing::debug!(
            owners = snapshot.owners.len(),
            teams = teams.len(),
            grants = snapshot.permissions.len(),
            "access snapshot loaded"
        );
        Ok(snapshot)
    }

    pub fn hierarchy(&self) -> &TeamHierarchy {
        &self.hierarchy
    }

    /// Resolve `key` against the organization teams, then the repository's own.
    fn resolve<'a>(&'a self, key: &str, local: &'a TeamDirectory) -> Option<&'a Team> {
        self.directory.find(key).or_else(|| local.find(key))
    }

    fn expectation(&self, ownership: Option<&str>, local: &TeamDirectory) -> Expectation {
        let Some(ownership) = ownership else {
            return Expectation {
                ownership: None,
                parent: None,
            };
        };
        let owner = self.resolve(ownership, local);
        let owner_key = owner.map_or_else(|| ownership.to_lowercase(), Team::key);
        let parent = self.hierarchy.parent_of(&owner_key).map(|parent| {
            let id = self.resolve(parent, local).map(|team| team.id);
            (parent.to_string(), id)
        });
        Expectation {
            ownership: Some((ownership.to_string(), owner.map(|team| team.id))),
            parent,
        }
    }

    /// Expected tier of `team` on a repository owned by `ownership`.
    pub fn expected_permission(&self, team: &Team, ownership: Option<&str>) -> Permission {
        let local = TeamDirectory::from_teams([team.clone()]);
        self.expectation(ownership, &local).permission_for(team)
    }

    /// Compare the teams and collaborators of one repository against policy.
    ///
    /// Fails with [`AuditError::MissingPermission`] when a team with access
    /// has no cached grant.
    pub fn reconcile(
        &self,
        metadata: &RepositoryMetadata,
        teams: &[Team],
        collaborators: &[Collaborator],
    ) -> Result<Vec<RepositoryIssue>> {
        let repository = &metadata.repository;
        let local = TeamDirectory::from_teams(teams.iter().cloned());
        let expectation = self.expectation(metadata.ownership.as_deref(), &local);

        let mut issues = Vec::new();
        let mut ownership_seen = false;
        let mut parent_seen = false;
        let mut maintainers: HashSet<&str> = HashSet::new();

        for team in teams {
            if expectation.owner_id() == Some(team.id) {
                ownership_seen = true;
            } else if expectation.parent_id() == Some(team.id) {
                parent_seen = true;
            }

            let expected = expectation.permission_for(team);
            let actual = self
                .permissions
                .get(&(repository.id, team.id))
                .copied()
                .ok_or_else(|| AuditError::MissingPermission {
                    team: team.name.clone(),
                    repository: repository.full_name.clone(),
                })?;
            if actual != expected {
                issues.push(RepositoryIssue::InvalidTeamAccess {
                    team: team.name.clone(),
                    actual,
                    expected,
                });
            }

            if let Some(logins) = self.maintainers_by_team.get(&team.id) {
                maintainers.extend(logins.iter().map(String::as_str));
            }
        }

        if let Some((ownership, _)) = expectation.ownership {
            if !ownership_seen {
                issues.push(RepositoryIssue::MissedTeamAccess {
                    team: ownership,
                    permission: Permission::Maintain,
                });
            }
        }
        if let Some((parent, _)) = expectation.parent {
            if !parent_seen {
                issues.push(RepositoryIssue::MissedTeamAccess {
                    team: parent,
                    permission: Permission::Push,
                });
            }
        }

        for collaborator in collaborators {
            let login = collaborator.login.as_str();
            let is_maintainer = maintainers.contains(login);
            let is_admin = collaborator.permission == Permission::Admin;

            if is_admin && !is_maintainer && !self.owners.contains(login) {
                issues.push(RepositoryIssue::ExtensiveCollaboratorAccess {
                    login: login.to_string(),
                    permission: Permission::Admin,
                });
            }
            if is_maintainer && !is_admin {
                issues.push(RepositoryIssue::MissedAdminAccess {
                    login: login.to_string(),
                });
            }
        }

        Ok(issues)
    }
}

/// Repository analyzer backed by an [`AccessSnapshot`].
pub struct AccessAnalyzer {
    gateway: Arc<dyn PlatformGateway>,
    snapshot: Option<AccessSnapshot>,
}

impl AccessAnalyzer {
    pub fn new(gateway: Arc<dyn PlatformGateway>) -> Self {
        Self {
            gateway,
            snapshot: None,
        }
    }

    /// Use a prepared snapshot; `initialize` keeps it instead of loading.
    pub fn with_snapshot(gateway: Arc<dyn PlatformGateway>, snapshot: AccessSnapshot) -> Self {
        Self {
            gateway,
            snapshot: Some(snapshot),
        }
    }
}

#[async_trait]
impl RepositoryAnalyzer for AccessAnalyzer {
    fn name(&self) -> &'static str {
        "access"
    }

    async fn initialize(&mut self) -> Result<()> {
        if self.snapshot.is_none() {
            self.snapshot = Some(AccessSnapshot::load(self.gateway.as_ref()).await?);
        }
        Ok(())
    }

    async fn analyze(&self, metadata: &RepositoryMetadata) -> Result<Vec<RepositoryIssue>> {
        let snapshot = self
            .snapshot
            .as_ref()
            .ok_or_else(|| AuditError::Invariant("access analyzer is not initialized".into()))?;
        let teams = self.gateway.repository_teams(&metadata.repository).await?;
        let collaborators = self
            .gateway
            .repository_collaborators(&metadata.repository)
            .await?;
        snapshot.reconcile(metadata, &teams, &collaborators)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::repository;

    fn owned_by(ownership: &str) -> RepositoryMetadata {
        RepositoryMetadata::derive(
            repository(10, "ledger"),
            &[format!("ownership-{ownership}")],
        )
    }

    fn payments() -> Team {
        Team::new(1, "payments", "payments")
    }

    fn platform() -> Team {
        Team::new(2, "platform", "platform")
    }

    fn docs() -> Team {
        Team::new(3, "docs", "docs")
    }

    fn hierarchy() -> TeamHierarchy {
        TeamHierarchy::new().with_parent("payments", "platform")
    }

    #[test]
    fn test_compliant_grants_produce_no_issues() {
        let snapshot = AccessSnapshot::new([], hierarchy())
            .with_permission(10, 1, Permission::Maintain)
            .with_permission(10, 2, Permission::Push)
            .with_permission(10, 3, Permission::Pull);
        let issues = snapshot
            .reconcile(&owned_by("payments"), &[payments(), platform(), docs()], &[])
            .unwrap();
        assert!(issues.is_empty(), "{issues:?}");
    }

    #[test]
    fn test_ownership_team_with_push_is_invalid() {
        let snapshot = AccessSnapshot::new([], TeamHierarchy::new())
            .with_permission(10, 1, Permission::Push);
        let issues = snapshot
            .reconcile(&owned_by("payments"), &[payments()], &[])
            .unwrap();
        assert_eq!(
            issues,
            vec![RepositoryIssue::InvalidTeamAccess {
                team: "payments".to_string(),
                actual: Permission::Push,
                expected: Permission::Maintain,
            }]
        );
    }

    #[test]
    fn test_other_team_with_more_than_pull_is_invalid() {
        let snapshot = AccessSnapshot::new([], hierarchy())
            .with_permission(10, 1, Permission::Maintain)
            .with_permission(10, 2, Permission::Push)
            .with_permission(10, 3, Permission::Admin);
        let issues = snapshot
            .reconcile(&owned_by("payments"), &[payments(), platform(), docs()], &[])
            .unwrap();
        assert_eq!(
            issues,
            vec![RepositoryIssue::InvalidTeamAccess {
                team: "docs".to_string(),
                actual: Permission::Admin,
                expected: Permission::Pull,
            }]
        );
    }

    #[test]
    fn test_missing_ownership_and_parent_access() {
        let snapshot = AccessSnapshot::new([], hierarchy()).with_permission(10, 3, Permission::Pull);
        let issues = snapshot
            .reconcile(&owned_by("payments"), &[docs()], &[])
            .unwrap();
        assert_eq!(
            issues,
            vec![
                RepositoryIssue::MissedTeamAccess {
                    team: "payments".to_string(),
                    permission: Permission::Maintain,
                },
                RepositoryIssue::MissedTeamAccess {
                    team: "platform".to_string(),
                    permission: Permission::Push,
                },
            ]
        );
    }

    #[test]
    fn test_without_ownership_every_team_expects_pull() {
        let snapshot = AccessSnapshot::new([], hierarchy())
            .with_permission(10, 1, Permission::Maintain)
            .with_permission(10, 3, Permission::Pull);
        let metadata = RepositoryMetadata::derive(repository(10, "ledger"), &[]);
        let issues = snapshot
            .reconcile(&metadata, &[payments(), docs()], &[])
            .unwrap();
        assert_eq!(
            issues,
            vec![RepositoryIssue::InvalidTeamAccess {
                team: "payments".to_string(),
                actual: Permission::Maintain,
                expected: Permission::Pull,
            }]
        );
    }

    #[test]
    fn test_grandparent_is_not_consulted() {
        let hierarchy = TeamHierarchy::new()
            .with_parent("billing", "payments")
            .with_parent("payments", "platform");
        let snapshot = AccessSnapshot::new([], hierarchy)
            .with_permission(10, 1, Permission::Push)
            .with_permission(10, 2, Permission::Pull)
            .with_permission(10, 4, Permission::Maintain);
        let billing = Team::new(4, "billing", "billing");
        let issues = snapshot
            .reconcile(&owned_by("billing"), &[billing, payments(), platform()], &[])
            .unwrap();
        assert!(issues.is_empty(), "{issues:?}");
    }

    #[test]
    fn test_ownership_resolves_by_slug_when_name_differs() {
        let infra = Team::new(6, "Infra", "infrastructure");
        let core = Team::new(5, "Core Platform", "core-platform").with_parent(infra.clone());
        let teams = vec![core.clone(), infra.clone()];
        let snapshot = AccessSnapshot::new([], TeamHierarchy::from_teams(&teams))
            .with_teams(teams)
            .with_permission(10, 5, Permission::Maintain)
            .with_permission(10, 6, Permission::Push);

        let metadata = owned_by("core-platform");
        assert_eq!(
            snapshot.expected_permission(&core, metadata.ownership.as_deref()),
            Permission::Maintain
        );
        let issues = snapshot.reconcile(&metadata, &[core, infra], &[]).unwrap();
        assert!(issues.is_empty(), "{issues:?}");
    }

    #[test]
    fn test_slug_owned_team_without_access_is_missed_once() {
        let core = Team::new(5, "Core Platform", "core-platform");
        let snapshot = AccessSnapshot::new([], TeamHierarchy::new())
            .with_teams([core])
            .with_permission(10, 3, Permission::Pull);
        let issues = snapshot
            .reconcile(&owned_by("core-platform"), &[docs()], &[])
            .unwrap();
        assert_eq!(
            issues,
            vec![RepositoryIssue::MissedTeamAccess {
                team: "core-platform".to_string(),
                permission: Permission::Maintain,
            }]
        );
    }

    #[test]
    fn test_missing_cached_permission_is_fatal() {
        let snapshot = AccessSnapshot::new([], TeamHierarchy::new());
        let err = snapshot
            .reconcile(&owned_by("payments"), &[payments()], &[])
            .unwrap_err();
        assert!(matches!(err, AuditError::MissingPermission { .. }));
    }

    #[test]
    fn test_admin_collaborator_without_standing_is_extensive() {
        let snapshot = AccessSnapshot::new(["root".to_string()], TeamHierarchy::new());
        let metadata = RepositoryMetadata::derive(repository(10, "ledger"), &[]);
        let collaborators = vec![
            Collaborator {
                login: "alice".to_string(),
                permission: Permission::Admin,
            },
            Collaborator {
                login: "root".to_string(),
                permission: Permission::Admin,
            },
            Collaborator {
                login: "bob".to_string(),
                permission: Permission::Push,
            },
        ];
        let issues = snapshot.reconcile(&metadata, &[], &collaborators).unwrap();
        assert_eq!(
            issues,
            vec![RepositoryIssue::ExtensiveCollaboratorAccess {
                login: "alice".to_string(),
                permission: Permission::Admin,
            }]
        );
    }

    #[test]
    fn test_maintainer_without_admin_is_reported() {
        let snapshot = AccessSnapshot::new([], TeamHierarchy::new())
            .with_permission(10, 1, Permission::Maintain)
            .with_maintainers(1, ["carol".to_string(), "dave".to_string()]);
        let collaborators = vec![
            Collaborator {
                login: "carol".to_string(),
                permission: Permission::Maintain,
            },
            Collaborator {
                login: "dave".to_string(),
                permission: Permission::Admin,
            },
        ];
        let issues = snapshot
            .reconcile(&owned_by("payments"), &[payments()], &collaborators)
            .unwrap();
        assert_eq!(
            issues,
            vec![RepositoryIssue::MissedAdminAccess {
                login: "carol".to_string(),
            }]
        );
    }

    #[test]
    fn test_maintainers_of_teams_without_access_do_not_count() {
        let snapshot = AccessSnapshot::new([], TeamHierarchy::new())
            .with_maintainers(9, ["erin".to_string()]);
        let metadata = RepositoryMetadata::derive(repository(10, "ledger"), &[]);
        let collaborators = vec![Collaborator {
            login: "erin".to_string(),
            permission: Permission::Admin,
        }];
        let issues = snapshot.reconcile(&metadata, &[], &collaborators).unwrap();
        assert_eq!(issues.len(), 1);
        assert!(matches!(
            issues[0],
            RepositoryIssue::ExtensiveCollaboratorAccess { .. }
        ));
    }
}
