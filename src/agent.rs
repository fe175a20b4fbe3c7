use crate::model::ModelProvider;
use crate::tool::{Tool, ToolRegistry, ToolSchema};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// AgentError
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum AgentError {
    DuplicateTool(String),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateTool(name) => write!(f, "duplicate tool name: {name}"),
        }
    }
}

impl std::error::Error for AgentError {}

// ---------------------------------------------------------------------------
// AgentBuilder
// ---------------------------------------------------------------------------

pub struct AgentBuilder {
    name: String,
    description: Option<String>,
    system_prompt: Option<String>,
    provider: Box<dyn ModelProvider>,
    tools: Vec<Arc<dyn Tool>>,
    duplicate: Option<String>,
}

impl AgentBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn tool(self, tool: impl Tool + 'static) -> Self {
        self.tool_shared(Arc::new(tool))
    }

    /// Add an already-shared tool, e.g. one also registered in a
    /// [`ToolRegistry`].
    pub fn tool_shared(mut self, tool: Arc<dyn Tool>) -> Self {
        if self.tools.iter().any(|t| t.name() == tool.name()) {
            self.duplicate = Some(tool.name().to_string());
        }
        self.tools.push(tool);
        self
    }

    pub fn build(self) -> Result<Agent, AgentError> {
        if let Some(name) = self.duplicate {
            return Err(AgentError::DuplicateTool(name));
        }

        Ok(Agent {
            name: self.name,
            description: self.description,
            system_prompt: self.system_prompt,
            provider: self.provider,
            tools: self.tools,
        })
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// A reusable configuration binding a model provider, a set of tools, and a
/// system prompt. Immutable after construction; the runner never mutates it.
pub struct Agent {
    name: String,
    description: Option<String>,
    system_prompt: Option<String>,
    provider: Box<dyn ModelProvider>,
    tools: Vec<Arc<dyn Tool>>,
}

impl Agent {
    pub fn builder(
        name: impl Into<String>,
        provider: impl ModelProvider + 'static,
    ) -> AgentBuilder {
        AgentBuilder {
            name: name.into(),
            description: None,
            system_prompt: None,
            provider: Box::new(provider),
            tools: Vec::new(),
            duplicate: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    /// Tools in registration order, the order their schemas are presented in.
    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn tool(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(AsRef::as_ref)
    }

    pub fn tool_schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    pub fn provider(&self) -> &dyn ModelProvider {
        self.provider.as_ref()
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field(
                "tools",
                &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// AgentCard
// ---------------------------------------------------------------------------

/// Declarative, serializable description of an agent: identity plus the
/// names of the tools it may use. Instantiate against a tool registry to
/// obtain a concrete [`Agent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCard {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_names: Vec<String>,
}

impl AgentCard {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            system_prompt: None,
            tool_names: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn tool_name(mut self, name: impl Into<String>) -> Self {
        self.tool_names.push(name.into());
        self
    }

    /// Build an [`Agent`] from this card. Tool names are resolved against
    /// the registry; names the registry doesn't know are skipped.
    pub fn instantiate(
        &self,
        provider: impl ModelProvider + 'static,
        registry: &ToolRegistry,
    ) -> Result<Agent, AgentError> {
        let mut builder = Agent::builder(self.name.clone(), provider);
        if let Some(description) = &self.description {
            builder = builder.description(description.clone());
        }
        if let Some(prompt) = &self.system_prompt {
            builder = builder.system_prompt(prompt.clone());
        }
        for name in &self.tool_names {
            if let Some(tool) = registry.get(name) {
                builder = builder.tool_shared(Arc::clone(tool));
            }
        }
        builder.build()
    }
}
