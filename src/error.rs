#[derive(Debug, thiserror::Error)]
pub enum McpGithubError {
    #[error("{0}")]
    GitHub(octocrab::Error),

    /// Upstream failure that did not originate from an octocrab call.
    #[error("{0}")]
    Upstream(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize {what}: {source}")]
    Serialization {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Repository {full_name} was not ready after {attempts} attempts: {last_error}")]
    RepositoryNotReady {
        full_name: String,
        attempts: u32,
        last_error: String,
    },

    /// A sequential workflow stopped midway; `applied` describes the effects
    /// that already reached GitHub.
    #[error("{message}\n\nApplied before the failure:\n{applied}")]
    PartialFailure { message: String, applied: String },
}

/// An API error response is reported by its GitHub message. octocrab's own
/// display for that variant is just `GitHub`.
impl From<octocrab::Error> for McpGithubError {
    fn from(err: octocrab::Error) -> Self {
        match err {
            octocrab::Error::GitHub { source, .. } => McpGithubError::Upstream(source.to_string()),
            other => McpGithubError::GitHub(other),
        }
    }
}

impl McpGithubError {
    pub fn upstream(message: impl Into<String>) -> Self {
        McpGithubError::Upstream(message.into())
    }
}
