//! Lookup of organization teams by ownership key.

use std::collections::HashMap;

use crate::gateway::{PlatformGateway, Team};
use crate::Result;

/// Known teams, addressable by lowercase name or by slug.
///
/// An ownership topic names a team by its lowercase name; slugs are accepted
/// as a fallback because they coincide with the name for most teams.
#[derive(Debug, Clone, Default)]
pub struct TeamDirectory {
    by_name: HashMap<String, Team>,
    slug_to_name: HashMap<String, String>,
}

impl TeamDirectory {
    pub fn from_teams(teams: impl IntoIterator<Item = Team>) -> Self {
        let mut directory = Self::default();
        for team in teams {
            let key = team.key();
            directory.slug_to_name.insert(team.slug.clone(), key.clone());
            directory.by_name.insert(key, team);
        }
        directory
    }

    pub async fn load(gateway: &dyn PlatformGateway) -> Result<Self> {
        Ok(Self::from_teams(gateway.organization_teams().await?))
    }

    /// Team whose lowercase name (or slug) is `key`.
    pub fn find(&self, key: &str) -> Option<&Team> {
        let key = key.to_lowercase();
        self.by_name.get(&key).or_else(|| {
            self.slug_to_name
                .get(&key)
                .and_then(|name| self.by_name.get(name))
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    pub fn teams(&self) -> impl Iterator<Item = &Team> {
        self.by_name.values()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
