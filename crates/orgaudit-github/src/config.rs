//! GitHub connection configuration.

use serde::{Deserialize, Serialize};

use crate::error::GitHubError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = concat!("orgaudit/", env!("CARGO_PKG_VERSION"));

/// Connection settings of the GitHub gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Login of the audited organization
    pub organization: String,
    /// Token with admin rights on the organization
    #[serde(skip_serializing, default)]
    pub token: String,
    /// REST v3 base URL
    pub api_url: String,
    /// GraphQL v4 endpoint
    pub graphql_url: String,
    pub user_agent: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        let api_url = std::env::var("GITHUB_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        GitHubConfig {
            organization: std::env::var("GITHUB_ORGANIZATION").unwrap_or_default(),
            token: std::env::var("GITHUB_TOKEN").unwrap_or_default(),
            graphql_url: graphql_url_for(&api_url),
            api_url,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// GraphQL endpoint next to a REST base URL.
///
/// `https://api.github.com` serves GraphQL at `/graphql`; GitHub Enterprise
/// serves REST at `/api/v3` and GraphQL at `/api/graphql`.
fn graphql_url_for(api_url: &str) -> String {
    let base = api_url.trim_end_matches('/');
    match base.strip_suffix("/v3") {
        Some(api_root) => format!("{api_root}/graphql"),
        None => format!("{base}/graphql"),
    }
}

impl GitHubConfig {
    /// Create a config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for an organization on github.com
    pub fn new(organization: &str, token: &str) -> Self {
        GitHubConfig {
            organization: organization.to_string(),
            token: token.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            graphql_url: graphql_url_for(DEFAULT_API_URL),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Point at another API host; the GraphQL endpoint follows.
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self.graphql_url = graphql_url_for(&self.api_url);
        self
    }

    /// Check every setting and report all problems at once.
    pub fn validate(&self) -> Result<(), GitHubError> {
        let mut problems = Vec::new();
        if self.organization.trim().is_empty() {
            problems.push("organization is not set (--organization or GITHUB_ORGANIZATION)");
        }
        if self.token.trim().is_empty() {
            problems.push("token is not set (--token or GITHUB_TOKEN)");
        }
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            problems.push("api url must be an http(s) URL");
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(GitHubError::Config(problems.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_targets_github_com() {
        let config = GitHubConfig::new("acme", "ghp_x");
        assert_eq!(config.api_url, "https://api.github.com");
        assert_eq!(config.graphql_url, "https://api.github.com/graphql");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_enterprise_graphql_endpoint() {
        let config = GitHubConfig::new("acme", "t").with_api_url("https://ghe.example.com/api/v3/");
        assert_eq!(config.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.graphql_url, "https://ghe.example.com/api/graphql");
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let config = GitHubConfig::new(" ", "").with_api_url("ftp://nope");
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("organization is not set"));
        assert!(err.contains("token is not set"));
        assert!(err.contains("api url"));
    }

    #[test]
    fn test_token_is_never_serialized() {
        let json = serde_json::to_string(&GitHubConfig::new("acme", "secret")).unwrap();
        assert!(!json.contains("secret"));
    }
}
