//! orgaudit-github: the GitHub platform gateway
//!
//! Implements [`orgaudit_core::PlatformGateway`] over the GitHub REST v3 API,
//! with GraphQL v4 for repository topics and branch-protection rules.
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use orgaudit_core::PlatformGateway;
//! use orgaudit_github::{GitHubConfig, GitHubGateway};
//!
//! let gateway = GitHubGateway::new(GitHubConfig::from_env())?;
//! let teams = gateway.organization_teams().await?;
//! println!("{} teams", teams.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod graphql;
pub mod http;
pub mod wire;

pub use client::GitHubGateway;
pub use config::{GitHubConfig, DEFAULT_API_URL};
pub use error::GitHubError;
