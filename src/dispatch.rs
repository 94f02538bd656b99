//! Routes tool calls to handlers and wraps every outcome in a result envelope.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::batch::{BatchAggregator, ProvisioningPolicy};
use crate::error::McpGithubError;
use crate::format;
use crate::github::GitHubApi;
use crate::models::{NewIssue, NewRepository, RepoListQuery};
use crate::tools::{
    BatchIssueParams, CreateIssueParams, CreateRepositoryParams, ListIssuesParams,
    ListRepositoriesParams, NoParams, QuickCreateParams, RepoParams, ToolDescriptor, ToolName,
};

/// GitHub's maximum page size.
const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Page size used when a list tool is called without `per_page`.
    pub default_per_page: u32,
    pub provisioning: ProvisioningPolicy,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_per_page: 30,
            provisioning: ProvisioningPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

impl ToolCallRequest {
    pub fn new(
        name: impl Into<String>,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

/// Outcome of one tool call: always exactly one text item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub content: Vec<TextContent>,
    pub is_error: bool,
}

impl ToolCallResult {
    pub fn success(text: String) -> Self {
        Self {
            content: vec![TextContent { kind: "text", text }],
            is_error: false,
        }
    }

    pub fn error(err: &McpGithubError) -> Self {
        Self {
            content: vec![TextContent {
                kind: "text",
                text: format!("Error: {}", err),
            }],
            is_error: true,
        }
    }

    pub fn text(&self) -> &str {
        self.content.first().map(|c| c.text.as_str()).unwrap_or("")
    }
}

/// Owns the tool catalog and the injected GitHub client.
#[derive(Clone)]
pub struct Dispatcher {
    github: Arc<dyn GitHubApi>,
    batch: BatchAggregator,
    catalog: Arc<Vec<ToolDescriptor>>,
    default_per_page: u32,
}

impl Dispatcher {
    pub fn new(github: Arc<dyn GitHubApi>, config: DispatchConfig) -> Self {
        let catalog = ToolName::ALL.iter().map(ToolName::descriptor).collect();
        Self {
            batch: BatchAggregator::new(github.clone(), config.provisioning),
            github,
            catalog: Arc::new(catalog),
            default_per_page: config.default_per_page,
        }
    }

    pub fn list_tools(&self) -> &[ToolDescriptor] {
        &self.catalog
    }

    pub fn aggregator(&self) -> &BatchAggregator {
        &self.batch
    }

    /// Run one tool call. Failures never escape: they come back as an
    /// error-flagged result whose text starts with `Error: `.
    pub async fn call(&self, request: ToolCallRequest) -> ToolCallResult {
        let name = request.name.clone();
        tracing::debug!(tool = %name, "Dispatching tool call");

        match self.try_call(request).await {
            Ok(text) => ToolCallResult::success(text),
            Err(e) => {
                tracing::warn!(tool = %name, error = %e, "Tool call failed");
                ToolCallResult::error(&e)
            }
        }
    }

    /// Clamp a requested page size to `1..=100`, falling back to the default.
    fn capped_per_page(&self, per_page: Option<u32>) -> u8 {
        per_page
            .unwrap_or(self.default_per_page)
            .clamp(1, MAX_PER_PAGE) as u8
    }

    async fn try_call(&self, request: ToolCallRequest) -> Result<String, McpGithubError> {
        let tool: ToolName = request.name.parse()?;
        let args = serde_json::Value::Object(request.arguments);

        match tool {
            ToolName::GithubDashboard => {
                let _: NoParams = parse_args(tool, args)?;
                let dashboard = self.batch.dashboard().await?;
                Ok(format::dashboard(&dashboard))
            }
            ToolName::RepositoryAnalysis => {
                let params: RepoParams = parse_args(tool, args)?;
                let analysis = self
                    .batch
                    .repository_analysis(&params.owner, &params.repo)
                    .await?;
                Ok(format::repository_analysis(&analysis))
            }
            ToolName::QuickCreateProject => {
                let params: QuickCreateParams = parse_args(tool, args)?;
                let description = params.description.as_deref().unwrap_or("");
                match self
                    .batch
                    .quick_create(&params.name, description, params.private, &params.options())
                    .await
                {
                    Ok(outcome) => Ok(format::quick_create(&outcome, params.project_type)),
                    Err(failure) => Err(match failure.repository {
                        Some(repository) => McpGithubError::PartialFailure {
                            message: failure.error.to_string(),
                            applied: format::quick_create_applied(
                                &repository,
                                &failure.files_created,
                            ),
                        },
                        None => failure.error,
                    }),
                }
            }
            ToolName::BatchIssueOperations => {
                let params: BatchIssueParams = parse_args(tool, args)?;
                let report = self
                    .batch
                    .batch_issue_operations(&params.owner, &params.repo, &params.operations)
                    .await;
                match &report.failure {
                    Some(failure) => Err(McpGithubError::PartialFailure {
                        message: format!(
                            "operation {} ({}) failed: {}",
                            failure.index, failure.operation, failure.message
                        ),
                        applied: format::batch_operations(&report.results),
                    }),
                    None => Ok(format::batch_report(&params.owner, &params.repo, &report)),
                }
            }
            ToolName::CreateRepository => {
                let params: CreateRepositoryParams = parse_args(tool, args)?;
                let repo = self
                    .github
                    .create_repository(&NewRepository {
                        name: params.name,
                        description: params.description,
                        private: params.private,
                        auto_init: params.auto_init,
                        gitignore_template: None,
                        license_template: None,
                    })
                    .await?;
                tracing::info!(repo = %repo.full_name, "Created repository");
                Ok(format::created_repository(&repo))
            }
            ToolName::ListRepositories => {
                let params: ListRepositoriesParams = parse_args(tool, args)?;
                let repos = self
                    .github
                    .list_my_repositories(RepoListQuery {
                        kind: params.kind.unwrap_or_default(),
                        sort: params.sort.unwrap_or_default(),
                        per_page: self.capped_per_page(params.per_page),
                    })
                    .await?;
                Ok(format::repository_list(&repos))
            }
            ToolName::GetRepository => {
                let params: RepoParams = parse_args(tool, args)?;
                let repo = self
                    .github
                    .get_repository(&params.owner, &params.repo)
                    .await?;
                Ok(format::repository(&repo))
            }
            ToolName::CreateIssue => {
                let params: CreateIssueParams = parse_args(tool, args)?;
                let issue = self
                    .github
                    .create_issue(
                        &params.owner,
                        &params.repo,
                        &NewIssue {
                            title: params.title,
                            body: params.body,
                            labels: params.labels,
                            assignees: Vec::new(),
                        },
                    )
                    .await?;
                Ok(format::created_issue(&issue))
            }
            ToolName::ListIssues => {
                let params: ListIssuesParams = parse_args(tool, args)?;
                let issues = self
                    .github
                    .list_issues(
                        &params.owner,
                        &params.repo,
                        params.state.unwrap_or_default(),
                        self.capped_per_page(params.per_page),
                    )
                    .await?;
                Ok(format::issue_list(&issues))
            }
        }
    }
}

fn parse_args<T: DeserializeOwned>(
    tool: ToolName,
    args: serde_json::Value,
) -> Result<T, McpGithubError> {
    serde_json::from_value(args).map_err(|source| McpGithubError::InvalidArguments {
        tool: tool.as_str(),
        source,
    })
}
