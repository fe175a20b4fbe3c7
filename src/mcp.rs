use crate::tool::{Arguments, ParameterSchema, Tool, ToolError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Lazy, pull-based sequence of partial tool results. The remote side
/// closing the stream ends iteration; abandoning it mid-stream is a valid,
/// silent cancellation.
pub type ValueStream<'a> = Box<dyn Iterator<Item = Result<Value, ToolError>> + 'a>;

/// Opaque authentication blob handed through to the client.
///
/// The adapter carries it, it never inspects or mutates it — transport and
/// verification belong to the client implementation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpAuthConfig {
    /// Scheme identifier, e.g. "bearer" or "api_key". Interpreted only by
    /// the client.
    pub auth_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl McpAuthConfig {
    pub fn new(auth_type: impl Into<String>) -> Self {
        Self {
            auth_type: auth_type.into(),
            token: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

/// Client capability for a remote tool server. Consumed, not implemented,
/// by this crate — back it with whatever transport you have.
pub trait McpClient: Send + Sync {
    /// Invoke a tool exposed by a server.
    fn call_tool(
        &self,
        server_name: &str,
        tool_name: &str,
        arguments: &Arguments,
        auth: Option<&McpAuthConfig>,
    ) -> Result<Value, ToolError>;

    /// Stream partial results. The default wraps
    /// [`call_tool`](Self::call_tool) in a single-element stream for
    /// clients without streaming support.
    fn stream_tool<'a>(
        &'a self,
        server_name: &str,
        tool_name: &str,
        arguments: &Arguments,
        auth: Option<&McpAuthConfig>,
    ) -> Result<ValueStream<'a>, ToolError> {
        let value = self.call_tool(server_name, tool_name, arguments, auth)?;
        Ok(Box::new(std::iter::once(Ok(value))))
    }

    /// Fetch the parameter schema for a remote tool, when the client can.
    fn tool_schema(&self, _server_name: &str, _tool_name: &str) -> Option<ParameterSchema> {
        None
    }
}

/// Configuration for one adapted remote tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpToolConfig {
    /// Server identifier, e.g. a configured connection name.
    pub server_name: String,
    /// Tool name as the server exposes it; also the local tool name.
    pub tool_name: String,
    pub description: String,
    /// Fallback schema when the client can't provide one.
    #[serde(default)]
    pub parameters: ParameterSchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<McpAuthConfig>,
}

impl McpToolConfig {
    pub fn new(
        server_name: impl Into<String>,
        tool_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            server_name: server_name.into(),
            tool_name: tool_name.into(),
            description: description.into(),
            parameters: ParameterSchema::new(),
            auth: None,
        }
    }

    pub fn with_parameters(mut self, parameters: ParameterSchema) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_auth(mut self, auth: McpAuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }
}

/// Adapts a remote tool to the [`Tool`] capability, so agents and
/// workflows use it like any local tool.
pub struct McpTool {
    config: McpToolConfig,
    parameters: ParameterSchema,
    client: Arc<dyn McpClient>,
}

impl McpTool {
    /// The remote schema wins when the client can provide one; otherwise
    /// the configured fallback applies.
    pub fn new(config: McpToolConfig, client: Arc<dyn McpClient>) -> Self {
        let parameters = client
            .tool_schema(&config.server_name, &config.tool_name)
            .unwrap_or_else(|| config.parameters.clone());
        Self {
            config,
            parameters,
            client,
        }
    }

    /// Streaming variant of [`execute`](Tool::execute).
    pub fn stream(&self, args: &Arguments) -> Result<ValueStream<'_>, ToolError> {
        self.client.stream_tool(
            &self.config.server_name,
            &self.config.tool_name,
            args,
            self.config.auth.as_ref(),
        )
    }
}

impl Tool for McpTool {
    fn name(&self) -> &str {
        &self.config.tool_name
    }

    fn description(&self) -> &str {
        &self.config.description
    }

    fn parameters(&self) -> ParameterSchema {
        self.parameters.clone()
    }

    fn execute(&self, args: &Arguments) -> Result<Value, ToolError> {
        self.client.call_tool(
            &self.config.server_name,
            &self.config.tool_name,
            args,
            self.config.auth.as_ref(),
        )
    }
}
