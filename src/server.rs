use std::sync::Arc;

use rmcp::model::*;
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler};

use crate::dispatch::{Dispatcher, ToolCallRequest, ToolCallResult};
use crate::tools::ToolDescriptor;

/// MCP front end: hands `tools/list` and `tools/call` to the [`Dispatcher`].
#[derive(Clone)]
pub struct McpGithubServer {
    dispatcher: Arc<Dispatcher>,
    tools: Arc<Vec<Tool>>,
}

impl McpGithubServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        let tools = dispatcher.list_tools().iter().map(to_mcp_tool).collect();
        Self {
            dispatcher: Arc::new(dispatcher),
            tools: Arc::new(tools),
        }
    }
}

fn to_mcp_tool(descriptor: &ToolDescriptor) -> Tool {
    Tool::new(
        descriptor.name,
        descriptor.description,
        Arc::new(descriptor.input_schema.clone()),
    )
}

fn to_call_tool_result(result: ToolCallResult) -> CallToolResult {
    let content = result
        .content
        .into_iter()
        .map(|c| Content::text(c.text))
        .collect();
    if result.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

impl ServerHandler for McpGithubServer {
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.tools.as_ref().clone()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let request = ToolCallRequest {
            name: request.name.to_string(),
            arguments: request.arguments.unwrap_or_default(),
        };
        Ok(to_call_tool_result(self.dispatcher.call(request).await))
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "mcp-github-batch".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "GitHub server with batched tools. Use github_dashboard for an overview of the \
                 authenticated account, repository_analysis for a full picture of one repository, \
                 quick_create_project to create and scaffold a repository, and \
                 batch_issue_operations to create, update, or close several issues at once. \
                 create_repository, list_repositories, get_repository, create_issue and \
                 list_issues wrap single API calls."
                    .to_string(),
            ),
        }
    }
}
