//! Text rendering of tool results.

use crate::batch::{
    BatchIssueReport, Dashboard, OperationResult, ProjectType, QuickCreateOutcome,
    RepositoryAnalysis, RepositoryIdentity,
};
use crate::models::{Issue, Repository};

const ANALYSIS_ISSUES_SHOWN: usize = 5;

/// Date part of an ISO-8601 timestamp.
fn date(timestamp: Option<&str>) -> &str {
    timestamp
        .and_then(|t| t.split('T').next())
        .unwrap_or("unknown")
}

fn or_placeholder<'a>(value: Option<&'a str>, placeholder: &'a str) -> &'a str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => placeholder,
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

pub fn dashboard(dashboard: &Dashboard) -> String {
    let user = &dashboard.user;
    let repos = dashboard
        .recent_repos
        .iter()
        .map(|r| {
            format!(
                "• {} ({}) - ⭐ {} - {}\n  {}\n  📅 Updated: {}",
                r.name,
                or_placeholder(r.language.as_deref(), "N/A"),
                r.stargazers_count,
                if r.private { "🔒 Private" } else { "🌍 Public" },
                or_placeholder(r.description.as_deref(), "No description"),
                date(r.updated_at.as_deref()),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    let notifications = dashboard
        .notifications
        .iter()
        .map(|n| {
            format!(
                "• {}: {}\n  📁 {}",
                n.subject.kind, n.subject.title, n.repository.full_name
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "🚀 GitHub Dashboard for {} (@{})\n\n\
         📊 Profile Summary:\n\
         • Repositories: {}\n\
         • Followers: {}\n\
         • Following: {}\n\n\
         📁 Recent Repositories ({}):\n\n{}\n\n\
         🔔 Recent Notifications ({}):\n\n{}",
        or_placeholder(user.name.as_deref(), &user.login),
        user.login,
        user.public_repos,
        user.followers,
        user.following,
        dashboard.recent_repos.len(),
        or_placeholder(Some(repos.as_str()), "No repositories"),
        dashboard.notifications.len(),
        or_placeholder(Some(notifications.as_str()), "No recent notifications"),
    )
}

pub fn repository_analysis(analysis: &RepositoryAnalysis) -> String {
    let repo = &analysis.repository;
    let issues = analysis
        .open_issues
        .iter()
        .take(ANALYSIS_ISSUES_SHOWN)
        .map(|i| {
            let labels: Vec<&str> = i.labels.iter().map(|l| l.name.as_str()).collect();
            format!(
                "• #{}: {}\n  👤 {} - 📅 {}\n  🏷️ {}",
                i.number,
                i.title,
                i.author(),
                date(i.created_at.as_deref()),
                if labels.is_empty() {
                    "No labels".to_string()
                } else {
                    labels.join(", ")
                },
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    let pulls = analysis
        .pull_requests
        .iter()
        .map(|p| {
            format!(
                "• #{}: {}{}\n  👤 {} - 📅 {}",
                p.number,
                p.title,
                if p.draft { " (Draft)" } else { "" },
                p.author(),
                date(p.created_at.as_deref()),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    let releases = analysis
        .releases
        .iter()
        .map(|r| {
            format!(
                "• {}: {}\n  📅 {}{}",
                r.tag_name,
                or_placeholder(r.name.as_deref(), "No title"),
                date(r.published_at.as_deref()),
                if r.prerelease { " (Pre-release)" } else { "" },
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    let contributors = analysis
        .contributors
        .iter()
        .map(|c| format!("• {} ({} contributions)", c.login, c.contributions))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "📊 Repository Analysis: {}\n\n\
         📋 Repository Info:\n\
         • Description: {}\n\
         • Language: {}\n\
         • Stars: ⭐ {}\n\
         • Forks: 🍴 {}\n\
         • Open Issues: 🐛 {}\n\
         • Size: 📦 {} MB\n\
         • Created: 📅 {}\n\
         • Last Updated: 📅 {}\n\n\
         🐛 Recent Open Issues ({}):\n\n{}\n\n\
         🔄 Open Pull Requests ({}):\n\n{}\n\n\
         🏷️ Recent Releases ({}):\n\n{}\n\n\
         👥 Top Contributors ({}):\n\n{}",
        repo.full_name,
        or_placeholder(repo.description.as_deref(), "No description"),
        or_placeholder(repo.language.as_deref(), "N/A"),
        repo.stargazers_count,
        repo.forks_count,
        repo.open_issues_count,
        (repo.size + 512) / 1024,
        date(repo.created_at.as_deref()),
        date(repo.updated_at.as_deref()),
        analysis.open_issues.len(),
        or_placeholder(Some(issues.as_str()), "No open issues"),
        analysis.pull_requests.len(),
        or_placeholder(Some(pulls.as_str()), "No open pull requests"),
        analysis.releases.len(),
        or_placeholder(Some(releases.as_str()), "No releases"),
        analysis.contributors.len(),
        or_placeholder(Some(contributors.as_str()), "No contributors"),
    )
}

pub fn quick_create(outcome: &QuickCreateOutcome, project_type: ProjectType) -> String {
    let repo = &outcome.repository;
    let files = if outcome.files_created.is_empty() {
        "• (none)".to_string()
    } else {
        outcome
            .files_created
            .iter()
            .map(|f| format!("• {}", f))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!(
        "🚀 Project Created Successfully!\n\n\
         📁 Repository: {}\n\
         🌐 URL: {}\n\
         📥 Clone URL: {}\n\
         🔑 SSH URL: {}\n\n\
         📄 Files Created:\n{}\n\n\
         ✅ Your {} project is ready to go!\n\n\
         🛠️ Next steps:\n\
         1. Clone the repository: git clone {}\n\
         2. Navigate to project: cd {}\n\
         3. Start coding! 🎉",
        repo.full_name,
        repo.html_url,
        repo.clone_url,
        repo.ssh_url,
        files,
        project_type.as_str(),
        repo.clone_url,
        repo.name,
    )
}

/// What a stopped quick-create already left on GitHub.
pub fn quick_create_applied(repository: &RepositoryIdentity, files: &[String]) -> String {
    let mut lines = vec![format!(
        "• Repository {} created: {}",
        repository.full_name, repository.html_url
    )];
    lines.extend(files.iter().map(|f| format!("• Committed {}", f)));
    lines.join("\n")
}

fn operation_line(result: &OperationResult) -> String {
    match result {
        OperationResult::Created { number, title, url } => {
            format!("✅ Created issue #{}: {}\n   🔗 {}", number, title, url)
        }
        OperationResult::Updated { number, title } => {
            format!("📝 Updated issue #{}: {}", number, title)
        }
        OperationResult::Closed { number } => format!("✅ Closed issue #{}", number),
    }
}

pub fn batch_operations(results: &[OperationResult]) -> String {
    if results.is_empty() {
        return "• (none)".to_string();
    }
    results
        .iter()
        .map(operation_line)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn batch_report(owner: &str, repo: &str, report: &BatchIssueReport) -> String {
    let mut text = format!(
        "🚀 Batch Operations Completed!\n\n\
         📊 Summary:\n\
         • Repository: {}/{}\n\
         • Operations completed: {}\n",
        owner, repo, report.operations_completed
    );
    if report.skipped_operations > 0 {
        text.push_str(&format!(
            "• Unrecognized operations skipped: {}\n",
            report.skipped_operations
        ));
    }
    text.push_str(&format!(
        "\n📋 Operations Details:\n\n{}",
        batch_operations(&report.results)
    ));
    text
}

pub fn created_repository(repo: &Repository) -> String {
    format!(
        "Repository created successfully!\n\n\
         Name: {}\n\
         URL: {}\n\
         Clone URL: {}\n\
         Private: {}\n\
         Created: {}",
        repo.name,
        repo.html_url,
        repo.clone_url,
        yes_no(repo.private),
        repo.created_at.as_deref().unwrap_or("unknown"),
    )
}

pub fn repository_list(repos: &[Repository]) -> String {
    let list = repos
        .iter()
        .map(|r| {
            format!(
                "• {} ({}) - {}",
                r.name,
                if r.private { "Private" } else { "Public" },
                r.html_url
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("Found {} repositories:\n\n{}", repos.len(), list)
}

pub fn repository(repo: &Repository) -> String {
    format!(
        "Repository Information:\n\n\
         Name: {}\n\
         Description: {}\n\
         URL: {}\n\
         Private: {}\n\
         Stars: {}\n\
         Forks: {}\n\
         Language: {}\n\
         Created: {}\n\
         Updated: {}",
        repo.full_name,
        or_placeholder(repo.description.as_deref(), "No description"),
        repo.html_url,
        yes_no(repo.private),
        repo.stargazers_count,
        repo.forks_count,
        or_placeholder(repo.language.as_deref(), "Not specified"),
        repo.created_at.as_deref().unwrap_or("unknown"),
        repo.updated_at.as_deref().unwrap_or("unknown"),
    )
}

pub fn created_issue(issue: &Issue) -> String {
    format!(
        "Issue created successfully!\n\n\
         Title: {}\n\
         Number: #{}\n\
         URL: {}\n\
         State: {}",
        issue.title, issue.number, issue.html_url, issue.state
    )
}

pub fn issue_list(issues: &[Issue]) -> String {
    let list = issues
        .iter()
        .map(|i| format!("• #{}: {} ({}) - {}", i.number, i.title, i.state, i.html_url))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Found {} issues:\n\n{}", issues.len(), list)
}
