use agent_loom::providers::MockModelProvider;
use agent_loom::{
    Agent, Arguments, McpAuthConfig, McpClient, McpTool, McpToolConfig, Message,
    ParameterSchema, PropertySchema, Runner, ToolError, ValueStream,
};
use serde_json::{Value, json};
use std::sync::Arc;

/// Stands in for a real MCP transport: answers documentation searches from
/// a canned table and streams results one match at a time.
struct InProcessClient;

impl McpClient for InProcessClient {
    fn call_tool(
        &self,
        server_name: &str,
        tool_name: &str,
        arguments: &Arguments,
        auth: Option<&McpAuthConfig>,
    ) -> Result<Value, ToolError> {
        let query = arguments
            .get("query")
            .and_then(Value::as_str)
            .unwrap_or_default();
        println!(
            "  [client] {server_name}/{tool_name} query={query:?} auth={}",
            auth.map(|a| a.auth_type.as_str()).unwrap_or("none")
        );
        Ok(json!([
            format!("{query}: Getting started"),
            format!("{query}: API reference"),
        ]))
    }

    fn stream_tool<'a>(
        &'a self,
        server_name: &str,
        tool_name: &str,
        arguments: &Arguments,
        auth: Option<&McpAuthConfig>,
    ) -> Result<ValueStream<'a>, ToolError> {
        let matches = self.call_tool(server_name, tool_name, arguments, auth)?;
        let chunks: Vec<Value> = matches.as_array().cloned().unwrap_or_default();
        Ok(Box::new(chunks.into_iter().map(Ok)))
    }
}

fn main() {
    let config = McpToolConfig::new("docs-server", "search_docs", "Search the documentation")
        .with_parameters(
            ParameterSchema::new()
                .required("query", PropertySchema::string().describe("Search terms")),
        )
        .with_auth(McpAuthConfig::new("bearer").with_token("demo-token"));

    let search = McpTool::new(config, Arc::new(InProcessClient));

    // Stream the tool directly: pull-based, ends when the client closes.
    println!("=== Streaming ===");
    let mut args = Arguments::new();
    args.insert("query".into(), json!("workflows"));
    for chunk in search.stream(&args).unwrap() {
        println!("  chunk: {}", chunk.unwrap());
    }

    // Or hand it to an agent like any local tool.
    println!("\n=== Through an agent ===");
    let agent = Agent::builder("librarian", MockModelProvider::default())
        .system_prompt("You answer questions from the documentation.")
        .tool(search)
        .build()
        .unwrap();

    let response = Runner::new()
        .with_tracing()
        .run(&agent, Message::user("Where do I start?"))
        .unwrap();
    println!("{}", response.content);
}
