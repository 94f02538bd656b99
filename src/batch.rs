//! Aggregate operations: concurrent read fan-outs and sequential write
//! workflows, each presented to the caller as a single tool call.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::McpGithubError;
use crate::github::{GitHubApi, GitHubResult};
use crate::models::{
    Contributor, FileCommit, Issue, IssueState, IssueUpdate, NewIssue, NewRepository,
    Notification, PullRequest, Release, RepoListQuery, RepoSort, RepoType, Repository,
    UserProfile,
};

const DASHBOARD_REPOS: u8 = 10;
const DASHBOARD_NOTIFICATIONS: u8 = 5;
const ANALYSIS_ISSUES: u8 = 10;
const ANALYSIS_PULLS: u8 = 5;
const ANALYSIS_RELEASES: u8 = 3;
const ANALYSIS_CONTRIBUTORS: u8 = 5;

const DEFAULT_GITIGNORE: &str = "Node";
const DEFAULT_LICENSE: &str = "mit";

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub user: UserProfile,
    pub recent_repos: Vec<Repository>,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepositoryAnalysis {
    pub repository: Repository,
    pub open_issues: Vec<Issue>,
    pub pull_requests: Vec<PullRequest>,
    pub releases: Vec<Release>,
    pub contributors: Vec<Contributor>,
}

/// How long to wait for a freshly created repository before writing files.
///
/// The contents API can reject writes for a short while after creation, so
/// the workflow sleeps `settle_delay` and then confirms the repository is
/// readable, retrying up to `readiness_attempts` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisioningPolicy {
    pub settle_delay: Duration,
    pub readiness_attempts: u32,
}

impl Default for ProvisioningPolicy {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(1),
            readiness_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Node,
    Python,
    Web,
    #[default]
    General,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Node => "node",
            ProjectType::Python => "python",
            ProjectType::Web => "web",
            ProjectType::General => "general",
        }
    }
}

/// Scaffolding choices for [`BatchAggregator::quick_create`]. The default
/// stages no files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickCreateOptions {
    pub project_type: ProjectType,
    pub create_readme: bool,
    pub create_package_json: bool,
    pub gitignore: String,
    pub license: String,
}

impl Default for QuickCreateOptions {
    fn default() -> Self {
        Self {
            project_type: ProjectType::General,
            create_readme: false,
            create_package_json: false,
            gitignore: DEFAULT_GITIGNORE.to_string(),
            license: DEFAULT_LICENSE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryIdentity {
    pub name: String,
    pub full_name: String,
    pub html_url: String,
    pub clone_url: String,
    pub ssh_url: String,
}

impl From<&Repository> for RepositoryIdentity {
    fn from(repo: &Repository) -> Self {
        Self {
            name: repo.name.clone(),
            full_name: repo.full_name.clone(),
            html_url: repo.html_url.clone(),
            clone_url: repo.clone_url.clone(),
            ssh_url: repo.ssh_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickCreateOutcome {
    pub repository: RepositoryIdentity,
    pub files_created: Vec<String>,
}

/// A quick-create that stopped early. Nothing is rolled back: `repository`
/// is set once the repository exists upstream.
#[derive(Debug)]
pub struct QuickCreateFailure {
    pub repository: Option<RepositoryIdentity>,
    pub files_created: Vec<String>,
    pub error: McpGithubError,
}

/// One entry of a `batch_issue_operations` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BatchOperation {
    #[schemars(description = "Operation type: create, update, or close")]
    #[serde(rename = "type")]
    pub kind: String,

    #[schemars(description = "Issue title (required for create)")]
    #[serde(default)]
    pub title: Option<String>,

    #[schemars(description = "Issue body")]
    #[serde(default)]
    pub body: Option<String>,

    #[schemars(description = "Issue number (required for update and close)")]
    #[serde(default)]
    pub number: Option<u64>,

    #[schemars(description = "New state for update: open or closed")]
    #[serde(default)]
    pub state: Option<String>,

    #[schemars(description = "Labels to set")]
    #[serde(default)]
    pub labels: Option<Vec<String>>,

    #[schemars(description = "Assignees for create")]
    #[serde(default)]
    pub assignees: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Create,
    Update,
    Close,
}

impl BatchOperation {
    /// `None` for kinds this server does not know; those are skipped.
    pub fn operation_kind(&self) -> Option<OperationKind> {
        match self.kind.as_str() {
            "create" => Some(OperationKind::Create),
            "update" => Some(OperationKind::Update),
            "close" => Some(OperationKind::Close),
            _ => None,
        }
    }

    fn require_number(&self, index: usize) -> GitHubResult<u64> {
        self.number.ok_or_else(|| {
            McpGithubError::InvalidParam(format!(
                "operation {} ({}) requires an issue number",
                index, self.kind
            ))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OperationResult {
    Created { number: u64, title: String, url: String },
    Updated { number: u64, title: String },
    Closed { number: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    /// Position of the failing operation in the submitted sequence.
    pub index: usize,
    pub operation: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchIssueReport {
    pub operations_completed: usize,
    pub results: Vec<OperationResult>,
    pub skipped_operations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<BatchFailure>,
}

#[derive(Serialize)]
struct PackageScripts {
    start: &'static str,
    dev: &'static str,
}

#[derive(Serialize)]
struct PackageManifest<'a> {
    name: String,
    version: &'static str,
    description: &'a str,
    main: &'static str,
    scripts: PackageScripts,
    keywords: Vec<String>,
    author: &'static str,
    license: &'static str,
}

/// Composes several GitHub calls into one logical operation.
#[derive(Clone)]
pub struct BatchAggregator {
    github: Arc<dyn GitHubApi>,
    provisioning: ProvisioningPolicy,
}

impl BatchAggregator {
    pub fn new(github: Arc<dyn GitHubApi>, provisioning: ProvisioningPolicy) -> Self {
        Self {
            github,
            provisioning,
        }
    }

    /// Profile, recently updated repositories and latest notifications of
    /// the authenticated user, fetched concurrently. Any failing fetch fails
    /// the whole dashboard.
    pub async fn dashboard(&self) -> GitHubResult<Dashboard> {
        let query = RepoListQuery {
            kind: RepoType::All,
            sort: RepoSort::Updated,
            per_page: DASHBOARD_REPOS,
        };
        let (user, recent_repos, notifications) = tokio::try_join!(
            self.github.authenticated_user(),
            self.github.list_my_repositories(query),
            self.github.list_notifications(DASHBOARD_NOTIFICATIONS),
        )?;

        tracing::debug!(
            login = %user.login,
            repos = recent_repos.len(),
            notifications = notifications.len(),
            "Fetched dashboard"
        );

        Ok(Dashboard {
            user,
            recent_repos,
            notifications,
        })
    }

    /// Metadata, open issues and pulls, releases and top contributors of one
    /// repository, fetched concurrently with the same all-or-nothing join.
    pub async fn repository_analysis(
        &self,
        owner: &str,
        repo: &str,
    ) -> GitHubResult<RepositoryAnalysis> {
        let github = &self.github;
        let (repository, open_issues, pull_requests, releases, contributors) = tokio::try_join!(
            github.get_repository(owner, repo),
            github.list_issues(owner, repo, IssueState::Open, ANALYSIS_ISSUES),
            github.list_pulls(owner, repo, IssueState::Open, ANALYSIS_PULLS),
            github.list_releases(owner, repo, ANALYSIS_RELEASES),
            github.list_contributors(owner, repo, ANALYSIS_CONTRIBUTORS),
        )?;

        tracing::debug!(
            owner,
            repo,
            issues = open_issues.len(),
            pulls = pull_requests.len(),
            "Fetched repository analysis"
        );

        Ok(RepositoryAnalysis {
            repository,
            open_issues,
            pull_requests,
            releases,
            contributors,
        })
    }

    /// Create a repository and commit the requested scaffold files, one
    /// commit per file, in order.
    ///
    /// The repository is created without an initial commit so the first
    /// file commit establishes the default branch.
    pub async fn quick_create(
        &self,
        name: &str,
        description: &str,
        private: bool,
        options: &QuickCreateOptions,
    ) -> Result<QuickCreateOutcome, QuickCreateFailure> {
        let request = NewRepository {
            name: name.to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            private,
            auto_init: false,
            gitignore_template: Some(options.gitignore.clone()),
            license_template: Some(options.license.clone()),
        };

        let repo = self
            .github
            .create_repository(&request)
            .await
            .map_err(|error| QuickCreateFailure {
                repository: None,
                files_created: Vec::new(),
                error,
            })?;
        let identity = RepositoryIdentity::from(&repo);
        tracing::info!(repo = %repo.full_name, "Created repository");

        let files = match scaffold_files(&repo, description, options) {
            Ok(files) => files,
            Err(error) => {
                return Err(QuickCreateFailure {
                    repository: Some(identity),
                    files_created: Vec::new(),
                    error,
                })
            }
        };
        let mut files_created = Vec::with_capacity(files.len());
        if files.is_empty() {
            return Ok(QuickCreateOutcome {
                repository: identity,
                files_created,
            });
        }

        let owner = repo.owner.login.as_str();
        if let Err(error) = self.wait_until_ready(owner, &repo.name).await {
            return Err(QuickCreateFailure {
                repository: Some(identity),
                files_created,
                error,
            });
        }

        for file in &files {
            if let Err(error) = self.github.create_file(owner, &repo.name, file).await {
                return Err(QuickCreateFailure {
                    repository: Some(identity),
                    files_created,
                    error,
                });
            }
            tracing::debug!(repo = %repo.full_name, path = %file.path, "Committed scaffold file");
            files_created.push(file.path.clone());
        }

        Ok(QuickCreateOutcome {
            repository: identity,
            files_created,
        })
    }

    async fn wait_until_ready(&self, owner: &str, name: &str) -> GitHubResult<()> {
        let attempts = self.provisioning.readiness_attempts.max(1);
        let mut last_error = String::new();
        for attempt in 1..=attempts {
            tokio::time::sleep(self.provisioning.settle_delay).await;
            match self.github.get_repository(owner, name).await {
                Ok(_) => return Ok(()),
                Err(e) => {
                    tracing::debug!(attempt, error = %e, "Repository not readable yet");
                    last_error = e.to_string();
                }
            }
        }
        Err(McpGithubError::RepositoryNotReady {
            full_name: format!("{}/{}", owner, name),
            attempts,
            last_error,
        })
    }

    /// Apply issue operations strictly in order. Stops at the first failure;
    /// the report keeps what was applied before it.
    pub async fn batch_issue_operations(
        &self,
        owner: &str,
        repo: &str,
        operations: &[BatchOperation],
    ) -> BatchIssueReport {
        let mut report = BatchIssueReport::default();

        for (index, operation) in operations.iter().enumerate() {
            let Some(kind) = operation.operation_kind() else {
                tracing::warn!(index, kind = %operation.kind, "Skipping unrecognized issue operation");
                report.skipped_operations += 1;
                continue;
            };

            match self.apply_operation(owner, repo, index, kind, operation).await {
                Ok(result) => report.results.push(result),
                Err(e) => {
                    tracing::warn!(index, kind = %operation.kind, error = %e, "Issue operation failed");
                    report.failure = Some(BatchFailure {
                        index,
                        operation: operation.kind.clone(),
                        message: e.to_string(),
                    });
                    break;
                }
            }
        }

        report.operations_completed = report.results.len();
        report
    }

    async fn apply_operation(
        &self,
        owner: &str,
        repo: &str,
        index: usize,
        kind: OperationKind,
        operation: &BatchOperation,
    ) -> GitHubResult<OperationResult> {
        match kind {
            OperationKind::Create => {
                let title = operation.title.clone().ok_or_else(|| {
                    McpGithubError::InvalidParam(format!(
                        "operation {} (create) requires a title",
                        index
                    ))
                })?;
                let issue = self
                    .github
                    .create_issue(
                        owner,
                        repo,
                        &NewIssue {
                            title,
                            body: operation.body.clone(),
                            labels: operation.labels.clone().unwrap_or_default(),
                            assignees: operation.assignees.clone().unwrap_or_default(),
                        },
                    )
                    .await?;
                Ok(OperationResult::Created {
                    number: issue.number,
                    title: issue.title,
                    url: issue.html_url,
                })
            }
            OperationKind::Update => {
                let number = operation.require_number(index)?;
                let update = IssueUpdate {
                    title: operation.title.clone(),
                    body: operation.body.clone(),
                    state: operation.state.clone(),
                    labels: operation.labels.clone(),
                };
                let issue = self.github.update_issue(owner, repo, number, &update).await?;
                Ok(OperationResult::Updated {
                    number: issue.number,
                    title: issue.title,
                })
            }
            OperationKind::Close => {
                let number = operation.require_number(index)?;
                let update = IssueUpdate {
                    state: Some("closed".to_string()),
                    ..Default::default()
                };
                self.github.update_issue(owner, repo, number, &update).await?;
                Ok(OperationResult::Closed { number })
            }
        }
    }
}

fn scaffold_files(
    repo: &Repository,
    description: &str,
    options: &QuickCreateOptions,
) -> GitHubResult<Vec<FileCommit>> {
    let mut contents = Vec::new();
    if options.create_readme {
        contents.push((
            "README.md",
            format!(
                "# {name}\n\n{description}\n\n## Installation\n\n```bash\ngit clone {url}\ncd {name}\n```\n",
                name = repo.name,
                description = description,
                url = repo.clone_url,
            ),
        ));
    }
    if options.create_package_json && options.project_type == ProjectType::Node {
        let manifest = PackageManifest {
            name: repo.name.to_lowercase(),
            version: "1.0.0",
            description,
            main: "index.js",
            scripts: PackageScripts {
                start: "node index.js",
                dev: "nodemon index.js",
            },
            keywords: Vec::new(),
            author: "",
            license: "MIT",
        };
        contents.push((
            "package.json",
            serde_json::to_string_pretty(&manifest).map_err(|source| {
                McpGithubError::Serialization {
                    what: "package.json",
                    source,
                }
            })?,
        ));
    }

    Ok(contents
        .into_iter()
        .enumerate()
        .map(|(i, (path, content))| FileCommit {
            path: path.to_string(),
            message: if i == 0 {
                format!("Initial commit: Add {}", path)
            } else {
                format!("Add {}", path)
            },
            content,
        })
        .collect())
}
