//! A batteries-included Rust library for building LLM agents and tool
//! workflows.
//!
//! Bind a model provider, tools, and a system prompt into an [`Agent`] and
//! let the [`Runner`] drive the tool-calling loop, or describe a
//! [`Workflow`] of typed steps and interpret it with a [`WorkflowRunner`]
//! against shared [`WorkflowContext`] state. Remote tools plug in through
//! the [`McpTool`] adapter.
//!
//! # Quick start
//!
//! ```rust
//! use agent_loom::providers::MockModelProvider;
//! use agent_loom::tools::CalculatorTool;
//! use agent_loom::{Agent, Message, Runner};
//!
//! let agent = Agent::builder("assistant", MockModelProvider::default())
//!     .system_prompt("You are a helpful assistant.")
//!     .tool(CalculatorTool)
//!     .build()
//!     .unwrap();
//!
//! let response = Runner::new()
//!     .run(&agent, Message::user("What is 15 plus 27?"))
//!     .unwrap();
//!
//! assert!(response.content.contains("42"));
//! ```
//!
//! # Declarative workflows
//!
//! ```rust
//! use agent_loom::tools::CalculatorTool;
//! use agent_loom::{
//!     ToolRegistry, Workflow, WorkflowContext, WorkflowRunner, WorkflowStep,
//! };
//!
//! let mut tools = ToolRegistry::new();
//! tools.register(CalculatorTool);
//!
//! let mut wf = Workflow::new("sum", "Sum two numbers", "calculate");
//! wf.add_step(
//!     WorkflowStep::tool("calculate", "calculator")
//!         .with_param("operation", "add")
//!         .with_param("a", 15)
//!         .with_param("b", 27)
//!         .with_output_key("sum_result"),
//! )
//! .unwrap();
//!
//! let mut ctx = WorkflowContext::new();
//! WorkflowRunner::new().run(&wf, &tools, &mut ctx).unwrap();
//! assert_eq!(ctx.get("sum_result").and_then(|v| v.as_f64()), Some(42.0));
//! ```

mod agent;
mod ctx;
mod mcp;
mod message;
mod model;
pub mod providers;
mod runner;
mod tool;
pub mod tools;
mod workflow;
mod workflow_runner;

pub use agent::{Agent, AgentBuilder, AgentCard, AgentError};
pub use ctx::WorkflowContext;
pub use mcp::{McpAuthConfig, McpClient, McpTool, McpToolConfig, ValueStream};
pub use message::{Message, Role, ToolCallRequest};
pub use model::{MessageStream, ModelError, ModelProvider};
pub use runner::{ErrorEvent, ModelEvent, RunError, Runner, ToolEvent};
pub use tool::{
    Arguments, ParameterSchema, PropertySchema, Tool, ToolError, ToolRegistry, ToolSchema,
};
pub use workflow::{ParamValue, Predicate, StepType, Workflow, WorkflowError, WorkflowStep};
pub use workflow_runner::{WorkflowErrorEvent, WorkflowRunner, WorkflowStepEvent};
