use std::sync::Arc;

use async_trait::async_trait;

use crate::analyzers::RepositoryAnalyzer;
use crate::gateway::{OptionalExt, PlatformGateway};
use crate::issue::RepositoryIssue;
use crate::metadata::RepositoryMetadata;
use crate::Result;

/// Location of the CODEOWNERS file checked and written by the auditor.
pub const CODEOWNERS_PATH: &str = ".github/CODEOWNERS";

/// Reports repositories without `.github/CODEOWNERS` on the default branch.
pub struct CodeOwnersAnalyzer {
    gateway: Arc<dyn PlatformGateway>,
}

impl CodeOwnersAnalyzer {
    pub fn new(gateway: Arc<dyn PlatformGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl RepositoryAnalyzer for CodeOwnersAnalyzer {
    fn name(&self) -> &'static str {
        "code_owners"
    }

    async fn analyze(&self, metadata: &RepositoryMetadata) -> Result<Vec<RepositoryIssue>> {
        let content = self
            .gateway
            .raw_file_content(&metadata.repository.name, CODEOWNERS_PATH)
            .await
            .optional()?;
        Ok(match content {
            Some(_) => Vec::new(),
            None => vec![RepositoryIssue::MissedCodeOwners],
        })
    }
}
