use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mcp_github_batch::batch::ProvisioningPolicy;
use mcp_github_batch::dispatch::{DispatchConfig, Dispatcher};
use mcp_github_batch::github::OctocrabGitHub;
use mcp_github_batch::server;
use rmcp::{transport::stdio, ServiceExt};
use tracing_subscriber::EnvFilter;

/// MCP server for GitHub with batched tools: dashboards, repository analysis,
/// project scaffolding and issue batches in one call each
#[derive(Parser)]
#[command(name = "mcp-github-batch", version, about)]
struct Cli {
    /// GitHub personal access token.
    /// Can also be set via GITHUB_TOKEN environment variable.
    #[arg(long)]
    token: Option<String>,

    /// Read GitHub token from an environment variable.
    /// Default: GITHUB_TOKEN
    #[arg(long = "token-env")]
    token_env: Option<String>,

    /// Page size for list tools called without per_page (capped at 100)
    #[arg(long, default_value = "30")]
    max_results: u32,

    /// Milliseconds to wait after creating a repository before committing files
    #[arg(long, default_value = "1000")]
    settle_delay_ms: u64,

    /// How many times to check a new repository is readable before giving up
    #[arg(long, default_value = "3")]
    readiness_attempts: u32,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve MCP over stdio (default)
    Serve,
    /// Print the authenticated user's dashboard as JSON
    Dashboard,
    /// Print a repository analysis as JSON
    Analyze {
        /// Repository as OWNER/REPO
        repository: String,
    },
}

fn resolve_token(cli: &Cli) -> Result<String> {
    // --token > --token-env > GITHUB_TOKEN
    if let Some(t) = &cli.token {
        return Ok(t.clone());
    }
    let env_name = cli.token_env.as_deref().unwrap_or("GITHUB_TOKEN");
    match std::env::var(env_name) {
        Ok(t) if !t.is_empty() => {
            tracing::info!(env = env_name, "Read GitHub token from environment variable");
            Ok(t)
        }
        _ => anyhow::bail!(
            "{} environment variable is required (or pass --token)",
            env_name
        ),
    }
}

fn split_repository(full_name: &str) -> Result<(&str, &str)> {
    match full_name.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() => Ok((owner, repo)),
        _ => anyhow::bail!("expected OWNER/REPO, got '{}'", full_name),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let token = resolve_token(&cli)?;
    let github = OctocrabGitHub::with_token(token)
        .map_err(|e| anyhow::anyhow!("Failed to create GitHub client: {}", e))?;

    let config = DispatchConfig {
        default_per_page: cli.max_results,
        provisioning: ProvisioningPolicy {
            settle_delay: Duration::from_millis(cli.settle_delay_ms),
            readiness_attempts: cli.readiness_attempts,
        },
    };
    let dispatcher = Dispatcher::new(Arc::new(github), config);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            tracing::info!(
                max_results = cli.max_results,
                settle_delay_ms = cli.settle_delay_ms,
                "Starting mcp-github-batch server"
            );
            let service = server::McpGithubServer::new(dispatcher);
            let running = service.serve(stdio()).await?;
            running.waiting().await?;
        }
        Command::Dashboard => {
            let dashboard = dispatcher
                .aggregator()
                .dashboard()
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            println!("{}", serde_json::to_string_pretty(&dashboard)?);
        }
        Command::Analyze { repository } => {
            let (owner, repo) = split_repository(&repository)?;
            let analysis = dispatcher
                .aggregator()
                .repository_analysis(owner, repo)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_repository() {
        assert_eq!(split_repository("octo/demo").unwrap(), ("octo", "demo"));
        assert!(split_repository("octo").is_err());
        assert!(split_repository("/demo").is_err());
        assert!(split_repository("octo/").is_err());
    }

    #[test]
    fn test_explicit_token_wins() {
        let cli = Cli::parse_from([
            "mcp-github-batch",
            "--token",
            "abc",
            "--token-env",
            "MCP_GITHUB_BATCH_TEST_NO_SUCH_VAR",
        ]);
        assert_eq!(resolve_token(&cli).unwrap(), "abc");
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let cli = Cli::parse_from([
            "mcp-github-batch",
            "--token-env",
            "MCP_GITHUB_BATCH_TEST_NO_SUCH_VAR",
        ]);
        let err = resolve_token(&cli).unwrap_err();
        assert!(err.to_string().contains("MCP_GITHUB_BATCH_TEST_NO_SUCH_VAR"));
    }

    #[test]
    fn test_analyze_subcommand() {
        let cli = Cli::parse_from(["mcp-github-batch", "analyze", "octo/demo"]);
        assert!(matches!(
            cli.command,
            Some(Command::Analyze { ref repository }) if repository == "octo/demo"
        ));
    }
}
