//! Ownership and type topics.

use std::sync::Arc;

use async_trait::async_trait;

use crate::analyzers::RepositoryAnalyzer;
use crate::directory::TeamDirectory;
use crate::gateway::PlatformGateway;
use crate::issue::RepositoryIssue;
use crate::metadata::{RepositoryMetadata, RepositoryType};
use crate::Result;

pub struct TopicsAnalyzer {
    gateway: Arc<dyn PlatformGateway>,
    teams: TeamDirectory,
}

impl TopicsAnalyzer {
    pub fn new(gateway: Arc<dyn PlatformGateway>) -> Self {
        Self {
            gateway,
            teams: TeamDirectory::default(),
        }
    }
}

#[async_trait]
impl RepositoryAnalyzer for TopicsAnalyzer {
    fn name(&self) -> &'static str {
        "topics"
    }

    async fn initialize(&mut self) -> Result<()> {
        self.teams = TeamDirectory::load(self.gateway.as_ref()).await?;
        Ok(())
    }

    async fn analyze(&self, metadata: &RepositoryMetadata) -> Result<Vec<RepositoryIssue>> {
        let mut issues = Vec::new();

        match metadata.ownership.as_deref() {
            None => issues.push(RepositoryIssue::MissedOwnershipTopic),
            Some(ownership) if !self.teams.contains(ownership) => {
                issues.push(RepositoryIssue::UnknownOwnershipTopic {
                    topic: ownership.to_string(),
                })
            }
            Some(_) => {}
        }

        if metadata.kind == RepositoryType::Unknown {
            issues.push(RepositoryIssue::MissedOrInvalidRepositoryType);
        }

        Ok(issues)
    }
}
