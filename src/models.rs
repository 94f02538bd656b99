//! GitHub payload shapes consumed by the tools, and the write requests sent back.
//!
//! Only the fields the tools render are modelled; everything else in the
//! REST responses is ignored on deserialization.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub login: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub login: String,
    pub name: Option<String>,
    pub public_repos: u64,
    pub followers: u64,
    pub following: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub owner: Account,
    pub description: Option<String>,
    pub html_url: String,
    pub clone_url: String,
    pub ssh_url: String,
    pub language: Option<String>,
    pub private: bool,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub open_issues_count: u64,
    /// Size in kilobytes, as reported by GitHub.
    pub size: u64,
    pub default_branch: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSubject {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationRepository {
    pub full_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Notification {
    pub subject: NotificationSubject,
    pub repository: NotificationRepository,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub html_url: String,
    pub user: Option<Account>,
    pub labels: Vec<Label>,
    pub created_at: Option<String>,
}

impl Issue {
    pub fn author(&self) -> &str {
        self.user.as_ref().map(|u| u.login.as_str()).unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub user: Option<Account>,
    pub draft: bool,
    pub created_at: Option<String>,
}

impl PullRequest {
    pub fn author(&self) -> &str {
        self.user.as_ref().map(|u| u.login.as_str()).unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Release {
    pub tag_name: String,
    pub name: Option<String>,
    pub prerelease: bool,
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contributor {
    pub login: String,
    pub contributions: u64,
    pub avatar_url: String,
}

// -- Query and write request shapes --

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    #[default]
    Open,
    Closed,
    All,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
            IssueState::All => "all",
        }
    }
}

/// Affiliation filter for the authenticated user's repository listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RepoType {
    All,
    #[default]
    Owner,
    Public,
    Private,
    Member,
}

impl RepoType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepoType::All => "all",
            RepoType::Owner => "owner",
            RepoType::Public => "public",
            RepoType::Private => "private",
            RepoType::Member => "member",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RepoSort {
    Created,
    #[default]
    Updated,
    Pushed,
    FullName,
}

impl RepoSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepoSort::Created => "created",
            RepoSort::Updated => "updated",
            RepoSort::Pushed => "pushed",
            RepoSort::FullName => "full_name",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepoListQuery {
    pub kind: RepoType,
    pub sort: RepoSort,
    pub per_page: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewRepository {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub private: bool,
    pub auto_init: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gitignore_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_template: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewIssue {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
}

/// Partial issue update; `None` fields are left untouched upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IssueUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

/// A file committed through the contents API.
#[derive(Debug, Clone, PartialEq)]
pub struct FileCommit {
    pub path: String,
    pub message: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_ignores_unknown_and_missing_fields() {
        let repo: Repository = serde_json::from_value(serde_json::json!({
            "name": "demo",
            "full_name": "octo/demo",
            "owner": { "login": "octo", "id": 1 },
            "stargazers_count": 7,
            "topics": ["rust"],
        }))
        .unwrap();
        assert_eq!(repo.owner.login, "octo");
        assert_eq!(repo.stargazers_count, 7);
        assert_eq!(repo.description, None);
        assert!(!repo.private);
    }

    #[test]
    fn test_notification_subject_type_rename() {
        let n: Notification = serde_json::from_value(serde_json::json!({
            "subject": { "title": "Fix build", "type": "PullRequest" },
            "repository": { "full_name": "octo/demo" },
            "updated_at": "2024-01-02T03:04:05Z",
        }))
        .unwrap();
        assert_eq!(n.subject.kind, "PullRequest");
        assert_eq!(n.repository.full_name, "octo/demo");
    }

    #[test]
    fn test_issue_author_falls_back_to_unknown() {
        let issue = Issue::default();
        assert_eq!(issue.author(), "unknown");
    }

    #[test]
    fn test_issue_update_skips_unset_fields() {
        let update = IssueUpdate {
            state: Some("closed".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({ "state": "closed" })
        );
    }

    #[test]
    fn test_repo_sort_full_name_wire_value() {
        let sort: RepoSort = serde_json::from_value(serde_json::json!("full_name")).unwrap();
        assert_eq!(sort, RepoSort::FullName);
        assert_eq!(sort.as_str(), "full_name");
    }
}
