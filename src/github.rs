//! The GitHub boundary: the calls the tools need, behind a trait so the
//! dispatcher and workflows can be driven without a network.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;

use crate::error::McpGithubError;
use crate::models::{
    Contributor, FileCommit, Issue, IssueState, IssueUpdate, NewIssue, NewRepository,
    Notification, PullRequest, Release, RepoListQuery, Repository, UserProfile,
};

pub type GitHubResult<T> = Result<T, McpGithubError>;

/// GitHub REST operations consumed by the tools.
///
/// Implementations are shared read-only across concurrent tool calls.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    async fn authenticated_user(&self) -> GitHubResult<UserProfile>;

    async fn list_my_repositories(&self, query: RepoListQuery) -> GitHubResult<Vec<Repository>>;

    async fn list_notifications(&self, per_page: u8) -> GitHubResult<Vec<Notification>>;

    async fn get_repository(&self, owner: &str, repo: &str) -> GitHubResult<Repository>;

    async fn list_issues(
        &self,
        owner: &str,
        repo: &str,
        state: IssueState,
        per_page: u8,
    ) -> GitHubResult<Vec<Issue>>;

    async fn list_pulls(
        &self,
        owner: &str,
        repo: &str,
        state: IssueState,
        per_page: u8,
    ) -> GitHubResult<Vec<PullRequest>>;

    async fn list_releases(&self, owner: &str, repo: &str, per_page: u8)
        -> GitHubResult<Vec<Release>>;

    async fn list_contributors(
        &self,
        owner: &str,
        repo: &str,
        per_page: u8,
    ) -> GitHubResult<Vec<Contributor>>;

    async fn create_repository(&self, request: &NewRepository) -> GitHubResult<Repository>;

    /// Create a file through the contents API, as its own commit on the
    /// default branch.
    async fn create_file(&self, owner: &str, repo: &str, file: &FileCommit) -> GitHubResult<()>;

    async fn create_issue(&self, owner: &str, repo: &str, issue: &NewIssue) -> GitHubResult<Issue>;

    async fn update_issue(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        update: &IssueUpdate,
    ) -> GitHubResult<Issue>;
}

/// [`GitHubApi`] over an authenticated octocrab client, using raw REST routes.
#[derive(Clone)]
pub struct OctocrabGitHub {
    github: Arc<octocrab::Octocrab>,
}

impl OctocrabGitHub {
    pub fn new(github: octocrab::Octocrab) -> Self {
        Self {
            github: Arc::new(github),
        }
    }

    /// Build a client authenticated with a personal access token.
    pub fn with_token(token: impl Into<String>) -> GitHubResult<Self> {
        let github = octocrab::OctocrabBuilder::new()
            .personal_token(token.into())
            .build()?;
        Ok(Self::new(github))
    }

    fn repo_route(owner: &str, repo: &str) -> GitHubResult<String> {
        sanitize_github_name(owner, "owner")?;
        sanitize_github_name(repo, "repo")?;
        Ok(format!("/repos/{}/{}", owner, repo))
    }
}

#[async_trait]
impl GitHubApi for OctocrabGitHub {
    async fn authenticated_user(&self) -> GitHubResult<UserProfile> {
        Ok(self.github.get("/user", None::<&()>).await?)
    }

    async fn list_my_repositories(&self, query: RepoListQuery) -> GitHubResult<Vec<Repository>> {
        let route = format!(
            "/user/repos?type={}&sort={}&per_page={}",
            query.kind.as_str(),
            query.sort.as_str(),
            query.per_page
        );
        Ok(self.github.get(route, None::<&()>).await?)
    }

    async fn list_notifications(&self, per_page: u8) -> GitHubResult<Vec<Notification>> {
        let route = format!("/notifications?per_page={}", per_page);
        Ok(self.github.get(route, None::<&()>).await?)
    }

    async fn get_repository(&self, owner: &str, repo: &str) -> GitHubResult<Repository> {
        let route = Self::repo_route(owner, repo)?;
        Ok(self.github.get(route, None::<&()>).await?)
    }

    async fn list_issues(
        &self,
        owner: &str,
        repo: &str,
        state: IssueState,
        per_page: u8,
    ) -> GitHubResult<Vec<Issue>> {
        let route = format!(
            "{}/issues?state={}&per_page={}",
            Self::repo_route(owner, repo)?,
            state.as_str(),
            per_page
        );
        Ok(self.github.get(route, None::<&()>).await?)
    }

    async fn list_pulls(
        &self,
        owner: &str,
        repo: &str,
        state: IssueState,
        per_page: u8,
    ) -> GitHubResult<Vec<PullRequest>> {
        let route = format!(
            "{}/pulls?state={}&per_page={}",
            Self::repo_route(owner, repo)?,
            state.as_str(),
            per_page
        );
        Ok(self.github.get(route, None::<&()>).await?)
    }

    async fn list_releases(
        &self,
        owner: &str,
        repo: &str,
        per_page: u8,
    ) -> GitHubResult<Vec<Release>> {
        let route = format!(
            "{}/releases?per_page={}",
            Self::repo_route(owner, repo)?,
            per_page
        );
        Ok(self.github.get(route, None::<&()>).await?)
    }

    async fn list_contributors(
        &self,
        owner: &str,
        repo: &str,
        per_page: u8,
    ) -> GitHubResult<Vec<Contributor>> {
        let route = format!(
            "{}/contributors?per_page={}",
            Self::repo_route(owner, repo)?,
            per_page
        );
        Ok(self.github.get(route, None::<&()>).await?)
    }

    async fn create_repository(&self, request: &NewRepository) -> GitHubResult<Repository> {
        sanitize_github_name(&request.name, "name")?;
        Ok(self.github.post("/user/repos", Some(request)).await?)
    }

    async fn create_file(&self, owner: &str, repo: &str, file: &FileCommit) -> GitHubResult<()> {
        sanitize_url_value(&file.path, "path")?;
        let route = format!("{}/contents/{}", Self::repo_route(owner, repo)?, file.path);
        let body = serde_json::json!({
            "message": file.message,
            "content": base64::engine::general_purpose::STANDARD.encode(file.content.as_bytes()),
        });
        let _: serde_json::Value = self.github.put(route, Some(&body)).await?;
        Ok(())
    }

    async fn create_issue(&self, owner: &str, repo: &str, issue: &NewIssue) -> GitHubResult<Issue> {
        let route = format!("{}/issues", Self::repo_route(owner, repo)?);
        Ok(self.github.post(route, Some(issue)).await?)
    }

    async fn update_issue(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        update: &IssueUpdate,
    ) -> GitHubResult<Issue> {
        let route = format!("{}/issues/{}", Self::repo_route(owner, repo)?, number);
        Ok(self.github.patch(route, Some(update)).await?)
    }
}

/// Validate that a GitHub owner/repo name doesn't contain characters that
/// could be used for URL injection in raw API routes.
pub(crate) fn sanitize_github_name(name: &str, field: &str) -> Result<(), McpGithubError> {
    if name.is_empty() {
        return Err(McpGithubError::InvalidParam(format!(
            "{} must not be empty",
            field
        )));
    }
    for ch in ['/', '?', '#', '%', '\0', ' ', '\n', '\t'] {
        if name.contains(ch) {
            return Err(McpGithubError::InvalidParam(format!(
                "{} contains invalid character '{}'",
                field, ch
            )));
        }
    }
    Ok(())
}

/// Like `sanitize_github_name`, but slashes are allowed so nested file
/// paths such as `src/main.rs` pass.
pub(crate) fn sanitize_url_value(value: &str, field: &str) -> Result<(), McpGithubError> {
    if value.is_empty() {
        return Err(McpGithubError::InvalidParam(format!(
            "{} must not be empty",
            field
        )));
    }
    if value.split('/').any(|segment| segment == "..") {
        return Err(McpGithubError::InvalidParam(format!(
            "{} must not contain '..' segments",
            field
        )));
    }
    for ch in ['?', '#', '&', '\0', '\n', '\r', '\t'] {
        if value.contains(ch) {
            return Err(McpGithubError::InvalidParam(format!(
                "{} contains invalid character",
                field
            )));
        }
    }
    Ok(())
}
