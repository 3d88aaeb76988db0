//! Per-repository metadata derived from topics.

use serde::{Deserialize, Serialize};

use crate::gateway::Repository;

const OWNERSHIP_PREFIX: &str = "ownership-";
const TYPE_PREFIX: &str = "type-";

/// Kind of a repository, declared through a `type-*` topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryType {
    Service,
    Library,
    Frontend,
    Documentation,
    Tool,
    Unknown,
}

impl RepositoryType {
    /// Map a `type-` topic suffix; unmapped suffixes are `Unknown`.
    pub fn from_topic_suffix(suffix: &str) -> Self {
        match suffix {
            "service" => RepositoryType::Service,
            "library" => RepositoryType::Library,
            "frontend" => RepositoryType::Frontend,
            "documentation" => RepositoryType::Documentation,
            "tool" => RepositoryType::Tool,
            _ => RepositoryType::Unknown,
        }
    }
}

/// Repository plus its ownership and type, derived once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    pub repository: Repository,
    /// Lowercase team name from the single `ownership-*` topic.
    pub ownership: Option<String>,
    pub kind: RepositoryType,
}

impl RepositoryMetadata {
    /// Derive metadata from the repository topics.
    ///
    /// A field is left unset (`None` / `Unknown`) unless exactly one topic
    /// with its prefix is present.
    pub fn derive(repository: Repository, topics: &[String]) -> Self {
        let mut ownership: Option<String> = None;
        let mut ownership_topics = 0usize;
        let mut kind = RepositoryType::Unknown;
        let mut type_topics = 0usize;

        for topic in topics {
            if let Some(suffix) = topic.strip_prefix(OWNERSHIP_PREFIX) {
                ownership_topics += 1;
                ownership = Some(suffix.to_lowercase());
            } else if let Some(suffix) = topic.strip_prefix(TYPE_PREFIX) {
                type_topics += 1;
                kind = RepositoryType::from_topic_suffix(suffix);
            }
        }

        if ownership_topics > 1 {
            ownership = None;
        }
        if type_topics > 1 {
            kind = RepositoryType::Unknown;
        }

        Self {
            repository,
            ownership,
            kind,
        }
    }

    pub fn full_name(&self) -> &str {
        &self.repository.full_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::repository;

    fn topics(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_ownership_and_type_from_single_topics() {
        let meta = RepositoryMetadata::derive(
            repository(1, "ledger"),
            &topics(&["ownership-payments", "type-service"]),
        );
        assert_eq!(meta.ownership.as_deref(), Some("payments"));
        assert_eq!(meta.kind, RepositoryType::Service);
    }

    #[test]
    fn test_conflicting_ownership_is_unset() {
        let meta = RepositoryMetadata::derive(
            repository(1, "ledger"),
            &topics(&["ownership-payments", "ownership-core"]),
        );
        assert_eq!(meta.ownership, None);
    }

    #[test]
    fn test_conflicting_types_are_unknown_even_if_last_is_valid() {
        let meta = RepositoryMetadata::derive(
            repository(1, "ledger"),
            &topics(&["type-library", "type-service"]),
        );
        assert_eq!(meta.kind, RepositoryType::Unknown);
    }

    #[test]
    fn test_unmapped_type_is_unknown() {
        let meta = RepositoryMetadata::derive(repository(1, "ledger"), &topics(&["type-widget"]));
        assert_eq!(meta.kind, RepositoryType::Unknown);
    }

    #[test]
    fn test_unrelated_topics_are_ignored() {
        let meta = RepositoryMetadata::derive(
            repository(1, "ledger"),
            &topics(&["rust", "ownership-core", "type-tool", "typescript"]),
        );
        assert_eq!(meta.ownership.as_deref(), Some("core"));
        assert_eq!(meta.kind, RepositoryType::Tool);
    }

    #[test]
    fn test_no_topics() {
        let meta = RepositoryMetadata::derive(repository(1, "ledger"), &[]);
        assert_eq!(meta.ownership, None);
        assert_eq!(meta.kind, RepositoryType::Unknown);
    }
}
