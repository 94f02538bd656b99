//! In-memory GitHub used by the unit tests. Records every call in order.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::error::McpGithubError;
use crate::github::{GitHubApi, GitHubResult, OctocrabGitHub};
use crate::models::{
    Account, Contributor, FileCommit, Issue, IssueState, IssueUpdate, Label, NewIssue,
    NewRepository, Notification, NotificationRepository, NotificationSubject, PullRequest,
    Release, RepoListQuery, Repository, UserProfile,
};

pub(crate) const LOGIN: &str = "octocat";

#[derive(Default)]
struct FakeState {
    calls: Vec<String>,
    failures: HashMap<&'static str, usize>,
    issues: BTreeMap<u64, Issue>,
    files: Vec<FileCommit>,
    next_issue: u64,
}

#[derive(Default)]
pub(crate) struct FakeGitHub {
    state: Mutex<FakeState>,
}

impl FakeGitHub {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make every call to `op` fail.
    pub(crate) fn failing(self, op: &'static str) -> Self {
        self.failing_times(op, usize::MAX)
    }

    /// Make the first `times` calls to `op` fail.
    pub(crate) fn failing_times(self, op: &'static str, times: usize) -> Self {
        self.state.lock().unwrap().failures.insert(op, times);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn write_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("create_") || c.starts_with("update_"))
            .collect()
    }

    pub(crate) fn files(&self) -> Vec<FileCommit> {
        self.state.lock().unwrap().files.clone()
    }

    pub(crate) fn issue(&self, number: u64) -> Option<Issue> {
        self.state.lock().unwrap().issues.get(&number).cloned()
    }

    fn record(&self, op: &'static str, detail: String) -> GitHubResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(if detail.is_empty() {
            op.to_string()
        } else {
            format!("{} {}", op, detail)
        });
        match state.failures.get_mut(op) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(McpGithubError::upstream(format!("{} failed", op)))
            }
            _ => Ok(()),
        }
    }
}

pub(crate) fn repository(owner: &str, name: &str) -> Repository {
    Repository {
        name: name.to_string(),
        full_name: format!("{}/{}", owner, name),
        owner: Account {
            login: owner.to_string(),
        },
        description: Some(format!("{} description", name)),
        html_url: format!("https://github.com/{}/{}", owner, name),
        clone_url: format!("https://github.com/{}/{}.git", owner, name),
        ssh_url: format!("git@github.com:{}/{}.git", owner, name),
        language: Some("Rust".to_string()),
        stargazers_count: 42,
        forks_count: 3,
        open_issues_count: 2,
        size: 2048,
        default_branch: Some("main".to_string()),
        created_at: Some("2024-01-02T03:04:05Z".to_string()),
        updated_at: Some("2024-06-07T08:09:10Z".to_string()),
        ..Default::default()
    }
}

#[async_trait]
impl GitHubApi for FakeGitHub {
    async fn authenticated_user(&self) -> GitHubResult<UserProfile> {
        self.record("authenticated_user", String::new())?;
        Ok(UserProfile {
            login: LOGIN.to_string(),
            name: Some("The Octocat".to_string()),
            public_repos: 8,
            followers: 100,
            following: 9,
        })
    }

    async fn list_my_repositories(&self, query: RepoListQuery) -> GitHubResult<Vec<Repository>> {
        self.record(
            "list_my_repositories",
            format!(
                "type={} sort={} per_page={}",
                query.kind.as_str(),
                query.sort.as_str(),
                query.per_page
            ),
        )?;
        Ok(vec![repository(LOGIN, "newest"), repository(LOGIN, "older")])
    }

    async fn list_notifications(&self, per_page: u8) -> GitHubResult<Vec<Notification>> {
        self.record("list_notifications", format!("per_page={}", per_page))?;
        Ok(vec![Notification {
            subject: NotificationSubject {
                title: "Review requested".to_string(),
                kind: "PullRequest".to_string(),
            },
            repository: NotificationRepository {
                full_name: format!("{}/newest", LOGIN),
            },
            updated_at: Some("2024-06-07T08:09:10Z".to_string()),
        }])
    }

    async fn get_repository(&self, owner: &str, repo: &str) -> GitHubResult<Repository> {
        self.record("get_repository", format!("{}/{}", owner, repo))?;
        Ok(repository(owner, repo))
    }

    async fn list_issues(
        &self,
        owner: &str,
        repo: &str,
        state: IssueState,
        per_page: u8,
    ) -> GitHubResult<Vec<Issue>> {
        self.record(
            "list_issues",
            format!("{}/{} state={} per_page={}", owner, repo, state.as_str(), per_page),
        )?;
        Ok(vec![Issue {
            number: 7,
            title: "Crash on empty input".to_string(),
            state: "open".to_string(),
            html_url: format!("https://github.com/{}/{}/issues/7", owner, repo),
            user: Some(Account {
                login: "reporter".to_string(),
            }),
            labels: vec![Label {
                name: "bug".to_string(),
            }],
            created_at: Some("2024-03-01T00:00:00Z".to_string()),
        }])
    }

    async fn list_pulls(
        &self,
        owner: &str,
        repo: &str,
        state: IssueState,
        per_page: u8,
    ) -> GitHubResult<Vec<PullRequest>> {
        self.record(
            "list_pulls",
            format!("{}/{} state={} per_page={}", owner, repo, state.as_str(), per_page),
        )?;
        Ok(vec![PullRequest {
            number: 8,
            title: "Handle empty input".to_string(),
            state: "open".to_string(),
            user: Some(Account {
                login: "fixer".to_string(),
            }),
            draft: true,
            created_at: Some("2024-03-02T00:00:00Z".to_string()),
        }])
    }

    async fn list_releases(
        &self,
        owner: &str,
        repo: &str,
        per_page: u8,
    ) -> GitHubResult<Vec<Release>> {
        self.record("list_releases", format!("{}/{} per_page={}", owner, repo, per_page))?;
        Ok(vec![Release {
            tag_name: "v1.0.0".to_string(),
            name: None,
            prerelease: false,
            published_at: Some("2024-04-01T00:00:00Z".to_string()),
        }])
    }

    async fn list_contributors(
        &self,
        owner: &str,
        repo: &str,
        per_page: u8,
    ) -> GitHubResult<Vec<Contributor>> {
        self.record(
            "list_contributors",
            format!("{}/{} per_page={}", owner, repo, per_page),
        )?;
        Ok(vec![Contributor {
            login: LOGIN.to_string(),
            contributions: 120,
            avatar_url: "https://avatars.example/octocat".to_string(),
        }])
    }

    async fn create_repository(&self, request: &NewRepository) -> GitHubResult<Repository> {
        self.record(
            "create_repository",
            format!("{} auto_init={}", request.name, request.auto_init),
        )?;
        let mut repo = repository(LOGIN, &request.name);
        repo.description = request.description.clone();
        repo.private = request.private;
        Ok(repo)
    }

    async fn create_file(&self, owner: &str, repo: &str, file: &FileCommit) -> GitHubResult<()> {
        self.record("create_file", format!("{}/{} {}", owner, repo, file.path))?;
        self.state.lock().unwrap().files.push(file.clone());
        Ok(())
    }

    async fn create_issue(&self, owner: &str, repo: &str, issue: &NewIssue) -> GitHubResult<Issue> {
        self.record("create_issue", format!("{}/{} {}", owner, repo, issue.title))?;
        let mut state = self.state.lock().unwrap();
        state.next_issue += 1;
        let number = state.next_issue;
        let created = Issue {
            number,
            title: issue.title.clone(),
            state: "open".to_string(),
            html_url: format!("https://github.com/{}/{}/issues/{}", owner, repo, number),
            user: Some(Account {
                login: LOGIN.to_string(),
            }),
            labels: issue
                .labels
                .iter()
                .map(|name| Label { name: name.clone() })
                .collect(),
            created_at: None,
        };
        state.issues.insert(number, created.clone());
        Ok(created)
    }

    async fn update_issue(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        update: &IssueUpdate,
    ) -> GitHubResult<Issue> {
        self.record("update_issue", format!("{}/{} #{}", owner, repo, number))?;
        let mut state = self.state.lock().unwrap();
        let issue = state
            .issues
            .get_mut(&number)
            .ok_or_else(|| McpGithubError::upstream("Not Found"))?;
        if let Some(title) = &update.title {
            issue.title = title.clone();
        }
        if let Some(s) = &update.state {
            issue.state = s.clone();
        }
        if let Some(labels) = &update.labels {
            issue.labels = labels
                .iter()
                .map(|name| Label { name: name.clone() })
                .collect();
        }
        Ok(issue.clone())
    }
}

/// One-shot HTTP endpoint standing in for api.github.com. Answers the first
/// request with `status` and `body`; the handle resolves to the raw request.
pub(crate) async fn stub_github(
    status: &'static str,
    body: &'static str,
) -> (OctocrabGitHub, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        request
    });

    let github = octocrab::OctocrabBuilder::new()
        .base_uri(format!("http://{}", addr))
        .unwrap()
        .personal_token("test-token".to_string())
        .build()
        .unwrap();
    (OctocrabGitHub::new(github), handle)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if request_complete(&buf) {
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn request_complete(buf: &[u8]) -> bool {
    let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let headers = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
    if headers.contains("transfer-encoding: chunked") {
        return buf.ends_with(b"0\r\n\r\n");
    }
    let length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    buf.len() >= end + 4 + length
}
