//! orgaudit - GitHub organization governance auditor
//!
//! ## Commands
//!
//! - `audit`: analyze every active repository, apply fixes and print the report
//! - `secrets`: list the workflow files that reference given Actions secrets

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

use orgaudit_core::{
    write_report_json, AccessAnalyzer, AccessFixer, AnalysisRunner, BranchProtectionAnalyzer,
    BranchProtectionFixer, CodeOwnersAnalyzer, CodeOwnersFixer, FixerRegistry, PlatformGateway,
    PullRequestsAnalyzer, PullRequestsFixer, RateLimiter, RunOptions, SecretUsageScanner,
    SettingsAnalyzer, SettingsFixer, TeamMaintainersAnalyzer, TopicsAnalyzer,
};
use orgaudit_github::{GitHubConfig, GitHubGateway, DEFAULT_API_URL};

#[derive(Parser)]
#[command(name = "orgaudit")]
#[command(version = orgaudit_core::VERSION)]
#[command(about = "Audit and remediate GitHub organization governance", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Organization to audit
    #[arg(long, global = true, env = "GITHUB_ORGANIZATION", default_value = "")]
    organization: String,

    /// Token with admin rights on the organization
    #[arg(
        long,
        global = true,
        env = "GITHUB_TOKEN",
        hide_env_values = true,
        default_value = ""
    )]
    token: String,

    /// REST API base URL (GitHub Enterprise: https://<host>/api/v3)
    #[arg(long, global = true, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the organization and remediate what can be fixed
    Audit {
        /// Report issues without writing anything to GitHub
        #[arg(long)]
        dry_run: bool,

        /// Page size of repository and pull request listings
        #[arg(long, default_value = "100")]
        page_size: u32,

        /// Write the run report as JSON to this path
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Find workflow files referencing Actions secrets
    Secrets {
        /// Secret name (repeatable)
        #[arg(long = "name", required = true)]
        names: Vec<String>,

        /// Page size of the repository listing
        #[arg(long, default_value = "100")]
        page_size: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    orgaudit_core::init_tracing(cli.json_logs, level);

    let config = GitHubConfig::new(&cli.organization, &cli.token).with_api_url(&cli.api_url);
    let gateway: Arc<dyn PlatformGateway> = Arc::new(
        GitHubGateway::new(config).context("Invalid GitHub configuration")?,
    );

    match cli.command {
        Commands::Audit {
            dry_run,
            page_size,
            export,
        } => cmd_audit(gateway, dry_run, page_size, export.as_deref()).await,
        Commands::Secrets { names, page_size } => cmd_secrets(gateway, &names, page_size).await,
    }
}

fn build_runner(gateway: Arc<dyn PlatformGateway>, options: RunOptions) -> Result<AnalysisRunner> {
    let limiter = Arc::new(RateLimiter::content_mutations());
    let fixers = FixerRegistry::new()
        .with(BranchProtectionFixer::new(gateway.clone()))?
        .with(SettingsFixer::new(gateway.clone()))?
        .with(AccessFixer::new(gateway.clone()))?
        .with(PullRequestsFixer::new(gateway.clone()))?
        .with(CodeOwnersFixer::new(
            gateway.clone(),
            limiter,
            options.page_size,
        ))?;

    Ok(AnalysisRunner::new(gateway.clone(), options)
        .with_organization_analyzer(TeamMaintainersAnalyzer::new(gateway.clone()))
        .with_repository_analyzer(TopicsAnalyzer::new(gateway.clone()))
        .with_repository_analyzer(AccessAnalyzer::new(gateway.clone()))
        .with_repository_analyzer(BranchProtectionAnalyzer::new(gateway.clone()))
        .with_repository_analyzer(CodeOwnersAnalyzer::new(gateway.clone()))
        .with_repository_analyzer(PullRequestsAnalyzer::new(
            gateway.clone(),
            options.page_size,
        ))
        .with_repository_analyzer(SettingsAnalyzer::new(gateway))
        .with_fixers(fixers))
}

/// Run the full audit and print the report
async fn cmd_audit(
    gateway: Arc<dyn PlatformGateway>,
    dry_run: bool,
    page_size: u32,
    export: Option<&Path>,
) -> Result<()> {
    let options = RunOptions {
        apply_fixes: !dry_run,
        page_size,
    };
    if dry_run {
        info!("Dry run: fixes are disabled");
    }

    let mut runner = build_runner(gateway, options).context("Failed to set up the audit")?;
    let report = runner.run().await.context("Audit run failed")?;

    println!("{}", report.render_text());

    if let Some(path) = export {
        write_report_json(path, &report)
            .with_context(|| format!("Failed to export report to {:?}", path))?;
        println!("Report written to {:?}", path);
    }
    Ok(())
}

/// Print, per secret, the repositories and workflow files referencing it
async fn cmd_secrets(
    gateway: Arc<dyn PlatformGateway>,
    names: &[String],
    page_size: u32,
) -> Result<()> {
    let usages = SecretUsageScanner::new(gateway, page_size)
        .scan(names)
        .await
        .context("Secret usage scan failed")?;
    println!("{}", serde_json::to_string_pretty(&usages)?);
    Ok(())
}
