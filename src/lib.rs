//! MCP server that exposes batched GitHub operations as LLM tools.
//!
//! Aggregate tools (dashboard, repository analysis, project scaffolding,
//! issue batches) collapse several GitHub API calls into one tool call;
//! simple tools pass a single call through.

pub mod batch;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod github;
pub mod models;
pub mod server;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;
