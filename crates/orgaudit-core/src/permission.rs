//! Permission tiers and the one-level team hierarchy.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::gateway::Team;

/// Repository permission tier, totally ordered by privilege.
///
/// Comparisons go through the derived `Ord` (declaration order), never
/// through string equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Pull,
    Triage,
    Push,
    Maintain,
    Admin,
}

impl Permission {
    pub const ALL: [Permission; 5] = [
        Permission::Pull,
        Permission::Triage,
        Permission::Push,
        Permission::Maintain,
        Permission::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Pull => "pull",
            Permission::Triage => "triage",
            Permission::Push => "push",
            Permission::Maintain => "maintain",
            Permission::Admin => "admin",
        }
    }

    /// Highest tier set in a platform permission flag set.
    ///
    /// Returns `None` when no flag is set.
    pub fn from_flags(
        admin: bool,
        maintain: bool,
        push: bool,
        triage: bool,
        pull: bool,
    ) -> Option<Self> {
        if admin {
            Some(Permission::Admin)
        } else if maintain {
            Some(Permission::Maintain)
        } else if push {
            Some(Permission::Push)
        } else if triage {
            Some(Permission::Triage)
        } else if pull {
            Some(Permission::Pull)
        } else {
            None
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown permission name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission: {0}")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
    type Err = UnknownPermission;

    /// Accepts both tier names and the REST aliases `read` / `write`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pull" | "read" => Ok(Permission::Pull),
            "triage" => Ok(Permission::Triage),
            "push" | "write" => Ok(Permission::Push),
            "maintain" => Ok(Permission::Maintain),
            "admin" => Ok(Permission::Admin),
            _ => Err(UnknownPermission(s.to_string())),
        }
    }
}

/// Child team name → parent team name, both lowercase.
///
/// Exactly one level: the parent of a parent is never consulted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamHierarchy {
    parents: HashMap<String, String>,
}

impl TeamHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the organization team listing.
    pub fn from_teams(teams: &[Team]) -> Self {
        let parents = teams
            .iter()
            .filter_map(|team| {
                team.parent
                    .as_ref()
                    .map(|parent| (team.key(), parent.key()))
            })
            .collect();
        Self { parents }
    }

    /// Register `child` under `parent` (names are lowercased).
    pub fn with_parent(mut self, child: &str, parent: &str) -> Self {
        self.parents
            .insert(child.to_lowercase(), parent.to_lowercase());
        self
    }

    /// Parent of `team`, if any.
    pub fn parent_of(&self, team: &str) -> Option<&str> {
        self.parents.get(team).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_order_is_by_rank() {
        assert!(Permission::Pull < Permission::Triage);
        assert!(Permission::Triage < Permission::Push);
        assert!(Permission::Push < Permission::Maintain);
        assert!(Permission::Maintain < Permission::Admin);
        assert_eq!(Permission::ALL.iter().max(), Some(&Permission::Admin));
    }

    #[test]
    fn test_permission_parse_accepts_rest_aliases() {
        assert_eq!("read".parse::<Permission>().unwrap(), Permission::Pull);
        assert_eq!("write".parse::<Permission>().unwrap(), Permission::Push);
        assert_eq!("Admin".parse::<Permission>().unwrap(), Permission::Admin);
        assert!("owner".parse::<Permission>().is_err());
    }

    #[test]
    fn test_from_flags_picks_highest() {
        assert_eq!(
            Permission::from_flags(false, true, true, true, true),
            Some(Permission::Maintain)
        );
        assert_eq!(
            Permission::from_flags(false, false, false, false, true),
            Some(Permission::Pull)
        );
        assert_eq!(Permission::from_flags(false, false, false, false, false), None);
    }

    #[test]
    fn test_hierarchy_is_one_level() {
        let platform = Team::new(1, "Platform", "platform");
        let payments = Team::new(2, "Payments", "payments").with_parent(platform.clone());
        let billing = Team::new(3, "Billing", "billing")
            .with_parent(Team::new(2, "Payments", "payments"));

        let hierarchy = TeamHierarchy::from_teams(&[platform, payments, billing]);
        assert_eq!(hierarchy.parent_of("payments"), Some("platform"));
        assert_eq!(hierarchy.parent_of("billing"), Some("payments"));
        assert_eq!(hierarchy.parent_of("platform"), None);
        assert_eq!(hierarchy.len(), 2);
    }
}
