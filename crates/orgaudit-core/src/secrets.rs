//! Scan of GitHub Actions workflows for references to named secrets.
//!
//! Every repository (archived ones included) is scanned; a missing
//! `.github/workflows` directory just means the repository has no workflows.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::TryStreamExt;
use serde::Serialize;

use crate::gateway::{self, FileKind, OptionalExt, PlatformGateway, Repository};
use crate::Result;

pub const WORKFLOWS_DIR: &str = ".github/workflows";

/// Workflow files of one repository referencing a secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReference {
    pub repository_url: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretUsage {
    pub secret_name: String,
    pub references: Vec<FileReference>,
}

pub struct SecretUsageScanner {
    gateway: Arc<dyn PlatformGateway>,
    page_size: u32,
}

impl SecretUsageScanner {
    pub fn new(gateway: Arc<dyn PlatformGateway>, page_size: u32) -> Self {
        Self { gateway, page_size }
    }

    /// One entry per requested secret, in request order.
    pub async fn scan(&self, secret_names: &[String]) -> Result<Vec<SecretUsage>> {
        let needles: Vec<String> = secret_names
            .iter()
            .map(|name| format!("secrets.{name}"))
            .collect();
        let mut usage: Vec<SecretUsage> = secret_names
            .iter()
            .map(|name| SecretUsage {
                secret_name: name.clone(),
                references: Vec::new(),
            })
            .collect();

        let pages = gateway::organization_repositories(self.gateway.as_ref(), self.page_size);
        futures::pin_mut!(pages);
        while let Some(page) = pages.try_next().await? {
            for repository in page {
                let hits = self.scan_repository(&repository, &needles).await?;
                for (index, files) in hits {
                    usage[index].references.push(FileReference {
                        repository_url: repository.html_url.clone(),
                        files,
                    });
                }
            }
        }
        Ok(usage)
    }

    /// Files matching each needle, keyed by needle index.
    async fn scan_repository(
        &self,
        repository: &Repository,
        needles: &[String],
    ) -> Result<BTreeMap<usize, Vec<String>>> {
        let mut hits: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        let Some(entries) = self
            .gateway
            .list_all_contents(repository, WORKFLOWS_DIR)
            .await
            .optional()?
        else {
            return Ok(hits);
        };

        for entry in entries.iter().filter(|e| e.kind == FileKind::File) {
            let Some(content) = self
                .gateway
                .raw_file_content(&repository.name, &entry.path)
                .await
                .optional()?
            else {
                continue;
            };
            for (index, needle) in needles.iter().enumerate() {
                if content.contains(needle.as_str()) {
                    hits.entry(index).or_default().push(entry.path.clone());
                }
            }
        }
        tracing::debug!(
            repository = %repository.full_name,
            secrets = hits.len(),
            "workflows scanned"
        );
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{repository, InMemoryGateway};

    #[tokio::test]
    async fn test_scan_groups_files_by_secret_and_repository() {
        let gateway = Arc::new(InMemoryGateway::new());
        let ledger = repository(1, "ledger");
        let site = repository(2, "site");
        let bare = repository(3, "bare");
        for repo in [&ledger, &site, &bare] {
            gateway.add_repository(repo.clone(), &[]);
        }
        gateway.put_file(
            &ledger,
            ".github/workflows/deploy.yml",
            "token: ${{ secrets.NPM_TOKEN }}\nkey: ${{ secrets.AWS_KEY }}",
        );
        gateway.put_file(&ledger, ".github/workflows/ci.yml", "run: cargo test");
        gateway.put_file(
            &site,
            ".github/workflows/publish.yml",
            "${{ secrets.NPM_TOKEN }}",
        );

        let scanner = SecretUsageScanner::new(gateway, 100);
        let usage = scanner
            .scan(&["NPM_TOKEN".to_string(), "SLACK_HOOK".to_string()])
            .await
            .unwrap();

        assert_eq!(usage.len(), 2);
        assert_eq!(usage[0].secret_name, "NPM_TOKEN");
        assert_eq!(
            usage[0].references,
            vec![
                FileReference {
                    repository_url: ledger.html_url.clone(),
                    files: vec![".github/workflows/deploy.yml".to_string()],
                },
                FileReference {
                    repository_url: site.html_url.clone(),
                    files: vec![".github/workflows/publish.yml".to_string()],
                },
            ]
        );
        assert!(usage[1].references.is_empty());
    }
}
