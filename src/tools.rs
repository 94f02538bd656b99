//! The tool catalog: names, parameter types and their JSON schemas.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::batch::{BatchOperation, ProjectType, QuickCreateOptions};
use crate::error::McpGithubError;
use crate::models::{IssueState, RepoSort, RepoType};

/// Every tool this server exposes, in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    GithubDashboard,
    RepositoryAnalysis,
    QuickCreateProject,
    BatchIssueOperations,
    CreateRepository,
    ListRepositories,
    GetRepository,
    CreateIssue,
    ListIssues,
}

impl ToolName {
    pub const ALL: [ToolName; 9] = [
        ToolName::GithubDashboard,
        ToolName::RepositoryAnalysis,
        ToolName::QuickCreateProject,
        ToolName::BatchIssueOperations,
        ToolName::CreateRepository,
        ToolName::ListRepositories,
        ToolName::GetRepository,
        ToolName::CreateIssue,
        ToolName::ListIssues,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::GithubDashboard => "github_dashboard",
            ToolName::RepositoryAnalysis => "repository_analysis",
            ToolName::QuickCreateProject => "quick_create_project",
            ToolName::BatchIssueOperations => "batch_issue_operations",
            ToolName::CreateRepository => "create_repository",
            ToolName::ListRepositories => "list_repositories",
            ToolName::GetRepository => "get_repository",
            ToolName::CreateIssue => "create_issue",
            ToolName::ListIssues => "list_issues",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolName::GithubDashboard => {
                "Get the authenticated user's profile, most recently updated repositories \
                 and latest notifications in one call"
            }
            ToolName::RepositoryAnalysis => {
                "Get repository details with open issues, open pull requests, releases \
                 and top contributors in one call"
            }
            ToolName::QuickCreateProject => {
                "Create a repository and commit starter files (README, package.json) \
                 in one operation"
            }
            ToolName::BatchIssueOperations => {
                "Create, update, or close several issues in one call; operations run \
                 in the order given"
            }
            ToolName::CreateRepository => "Create a new repository for the authenticated user",
            ToolName::ListRepositories => "List repositories of the authenticated user",
            ToolName::GetRepository => "Get repository information",
            ToolName::CreateIssue => "Create a new issue in a repository",
            ToolName::ListIssues => "List issues in a repository, filtered by state",
        }
    }

    fn input_schema(&self) -> serde_json::Map<String, serde_json::Value> {
        match self {
            ToolName::GithubDashboard => schema_object::<NoParams>(),
            ToolName::RepositoryAnalysis | ToolName::GetRepository => schema_object::<RepoParams>(),
            ToolName::QuickCreateProject => schema_object::<QuickCreateParams>(),
            ToolName::BatchIssueOperations => schema_object::<BatchIssueParams>(),
            ToolName::CreateRepository => schema_object::<CreateRepositoryParams>(),
            ToolName::ListRepositories => schema_object::<ListRepositoriesParams>(),
            ToolName::CreateIssue => schema_object::<CreateIssueParams>(),
            ToolName::ListIssues => schema_object::<ListIssuesParams>(),
        }
    }

    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.as_str(),
            description: self.description(),
            input_schema: self.input_schema(),
        }
    }
}

impl FromStr for ToolName {
    type Err = McpGithubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| McpGithubError::UnknownTool(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Map<String, serde_json::Value>,
}

fn schema_object<T: schemars::JsonSchema>() -> serde_json::Map<String, serde_json::Value> {
    match serde_json::to_value(schemars::schema_for!(T)) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => {
            let mut map = serde_json::Map::new();
            map.insert("type".to_string(), serde_json::Value::from("object"));
            map
        }
    }
}

// -- Tool parameter types --

fn default_true() -> bool {
    true
}

fn default_gitignore() -> String {
    "Node".to_string()
}

fn default_license() -> String {
    "mit".to_string()
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct NoParams {}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RepoParams {
    #[schemars(description = "Repository owner")]
    pub owner: String,

    #[schemars(description = "Repository name")]
    pub repo: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct QuickCreateParams {
    #[schemars(description = "Repository name")]
    pub name: String,

    #[schemars(description = "Repository description")]
    #[serde(default)]
    pub description: Option<String>,

    #[schemars(description = "Whether the repository should be private (default: false)")]
    #[serde(default)]
    pub private: bool,

    #[schemars(description = "Type of project to set up: node, python, web, or general (default: general)")]
    #[serde(default)]
    pub project_type: ProjectType,

    #[schemars(description = "Create a README.md file (default: true)")]
    #[serde(default = "default_true")]
    pub create_readme: bool,

    #[schemars(description = "Create package.json for node projects (default: false)")]
    #[serde(default)]
    pub create_package_json: bool,

    #[schemars(description = "Gitignore template, e.g. Node or Python (default: Node)")]
    #[serde(default = "default_gitignore")]
    pub gitignore: String,

    #[schemars(description = "License template (default: mit)")]
    #[serde(default = "default_license")]
    pub license: String,
}

impl QuickCreateParams {
    pub fn options(&self) -> QuickCreateOptions {
        QuickCreateOptions {
            project_type: self.project_type,
            create_readme: self.create_readme,
            create_package_json: self.create_package_json,
            gitignore: self.gitignore.clone(),
            license: self.license.clone(),
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct BatchIssueParams {
    #[schemars(description = "Repository owner")]
    pub owner: String,

    #[schemars(description = "Repository name")]
    pub repo: String,

    #[schemars(description = "Operations to perform, in order")]
    pub operations: Vec<BatchOperation>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateRepositoryParams {
    #[schemars(description = "Repository name")]
    pub name: String,

    #[schemars(description = "Repository description")]
    #[serde(default)]
    pub description: Option<String>,

    #[schemars(description = "Whether the repository should be private (default: false)")]
    #[serde(default)]
    pub private: bool,

    #[schemars(description = "Create an initial commit with an empty README (default: true)")]
    #[serde(default = "default_true")]
    pub auto_init: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListRepositoriesParams {
    #[schemars(description = "Type of repositories to list: all, owner, public, private, or member (default: owner)")]
    #[serde(default, rename = "type")]
    pub kind: Option<RepoType>,

    #[schemars(description = "Sort by: created, updated, pushed, or full_name (default: updated)")]
    #[serde(default)]
    pub sort: Option<RepoSort>,

    #[schemars(
        description = "Number of repositories per page (default: 30, max: 100)",
        range(min = 1, max = 100)
    )]
    #[serde(default)]
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateIssueParams {
    #[schemars(description = "Repository owner")]
    pub owner: String,

    #[schemars(description = "Repository name")]
    pub repo: String,

    #[schemars(description = "Issue title")]
    pub title: String,

    #[schemars(description = "Issue body")]
    #[serde(default)]
    pub body: Option<String>,

    #[schemars(description = "Labels to add to the issue")]
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListIssuesParams {
    #[schemars(description = "Repository owner")]
    pub owner: String,

    #[schemars(description = "Repository name")]
    pub repo: String,

    #[schemars(description = "Filter by state: open, closed, or all (default: open)")]
    #[serde(default)]
    pub state: Option<IssueState>,

    #[schemars(
        description = "Number of issues per page (default: 30, max: 100)",
        range(min = 1, max = 100)
    )]
    #[serde(default)]
    pub per_page: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required(tool: ToolName) -> Vec<String> {
        let schema = tool.descriptor().input_schema;
        let mut names: Vec<String> = schema
            .get("required")
            .and_then(|r| r.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    #[test]
    fn test_names_round_trip() {
        for tool in ToolName::ALL {
            assert_eq!(tool.as_str().parse::<ToolName>().unwrap(), tool);
        }
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let err = "not_a_tool".parse::<ToolName>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: not_a_tool");
    }

    #[test]
    fn test_required_parameters() {
        assert!(required(ToolName::GithubDashboard).is_empty());
        assert_eq!(required(ToolName::RepositoryAnalysis), vec!["owner", "repo"]);
        assert_eq!(required(ToolName::QuickCreateProject), vec!["name"]);
        assert_eq!(
            required(ToolName::BatchIssueOperations),
            vec!["operations", "owner", "repo"]
        );
        assert_eq!(required(ToolName::CreateRepository), vec!["name"]);
        assert!(required(ToolName::ListRepositories).is_empty());
        assert_eq!(required(ToolName::CreateIssue), vec!["owner", "repo", "title"]);
        assert_eq!(required(ToolName::ListIssues), vec!["owner", "repo"]);
    }

    #[test]
    fn test_schemas_are_objects() {
        for tool in ToolName::ALL {
            let schema = tool.descriptor().input_schema;
            assert_eq!(schema.get("type").and_then(|t| t.as_str()), Some("object"));
        }
    }

    #[test]
    fn test_per_page_bounds_are_in_schema() {
        for tool in [ToolName::ListRepositories, ToolName::ListIssues] {
            let schema = tool.descriptor().input_schema;
            let per_page = &schema["properties"]["per_page"];
            assert_eq!(per_page["maximum"], 100, "{}", tool.as_str());
            assert_eq!(per_page["minimum"], 1, "{}", tool.as_str());
        }
    }

    #[test]
    fn test_quick_create_defaults() {
        let params: QuickCreateParams =
            serde_json::from_value(serde_json::json!({ "name": "x" })).unwrap();
        let options = params.options();
        assert!(options.create_readme);
        assert!(!options.create_package_json);
        assert_eq!(options.project_type, ProjectType::General);
        assert_eq!(options.gitignore, "Node");
        assert_eq!(options.license, "mit");
        assert!(!params.private);
    }

    #[test]
    fn test_create_repository_defaults() {
        let params: CreateRepositoryParams =
            serde_json::from_value(serde_json::json!({ "name": "x" })).unwrap();
        assert!(params.auto_init);
        assert!(!params.private);
    }

    #[test]
    fn test_list_repositories_type_field() {
        let params: ListRepositoriesParams =
            serde_json::from_value(serde_json::json!({ "type": "member", "sort": "full_name" }))
                .unwrap();
        assert_eq!(params.kind, Some(RepoType::Member));
        assert_eq!(params.sort, Some(RepoSort::FullName));
    }
}
