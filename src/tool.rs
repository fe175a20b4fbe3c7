use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Keyed arguments passed to a tool invocation.
pub type Arguments = Map<String, Value>;

// ---------------------------------------------------------------------------
// ToolError
// ---------------------------------------------------------------------------

/// Failure raised by a tool's own execution. Opaque to the runners: they
/// wrap it, they never inspect it.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolError {
    /// Name of the tool that failed.
    pub tool_name: String,
    /// What went wrong, in the tool's own words.
    pub message: String,
}

impl ToolError {
    pub fn new(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tool '{}' failed: {}", self.tool_name, self.message)
    }
}

impl std::error::Error for ToolError {}

// ---------------------------------------------------------------------------
// Parameter schemas
// ---------------------------------------------------------------------------

/// Structural description of one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    /// JSON type tag: "string", "number", "integer", "boolean", "array", "object".
    #[serde(rename = "type")]
    pub value_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Closed set of accepted values, when the parameter is an enumeration.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl PropertySchema {
    fn typed(value_type: &str) -> Self {
        Self {
            value_type: value_type.to_string(),
            description: None,
            allowed_values: None,
            default: None,
        }
    }

    pub fn string() -> Self {
        Self::typed("string")
    }

    pub fn number() -> Self {
        Self::typed("number")
    }

    pub fn integer() -> Self {
        Self::typed("integer")
    }

    pub fn boolean() -> Self {
        Self::typed("boolean")
    }

    pub fn array() -> Self {
        Self::typed("array")
    }

    pub fn object() -> Self {
        Self::typed("object")
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    fn accepts(&self, value: &Value) -> Result<(), String> {
        let ok = match self.value_type.as_str() {
            "string" => value.is_string(),
            "number" => value.is_number(),
            "integer" => value.is_i64() || value.is_u64(),
            "boolean" => value.is_boolean(),
            "array" => value.is_array(),
            "object" => value.is_object(),
            // Unknown type tags don't constrain the value.
            _ => true,
        };
        if !ok {
            return Err(format!("expected {}", self.value_type));
        }
        if let Some(allowed) = &self.allowed_values
            && !allowed.contains(value)
        {
            return Err(format!("not one of the accepted values: {value}"));
        }
        Ok(())
    }
}

/// JSON-Schema-shaped description of a tool's parameters: an object with
/// named properties and a required set. Used both for presenting tools to
/// the model and for runner-side validation before invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(rename = "type")]
    schema_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, PropertySchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    required: Vec<String>,
}

impl ParameterSchema {
    /// An empty object schema: no properties, nothing required.
    pub fn new() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    pub fn required(mut self, key: impl Into<String>, property: PropertySchema) -> Self {
        let key = key.into();
        self.required.push(key.clone());
        self.properties.insert(key, property);
        self
    }

    pub fn optional(mut self, key: impl Into<String>, property: PropertySchema) -> Self {
        self.properties.insert(key.into(), property);
        self
    }

    /// Check an argument mapping against this schema. Required keys must be
    /// present; provided values must match their property's type and enum.
    /// Keys without a declared property pass through unchecked.
    pub fn validate(&self, args: &Arguments) -> Result<(), String> {
        for key in &self.required {
            if !args.contains_key(key) {
                return Err(format!("missing required parameter '{key}'"));
            }
        }
        for (key, value) in args {
            if let Some(property) = self.properties.get(key)
                && let Err(reason) = property.accepts(value)
            {
                return Err(format!("parameter '{key}': {reason}"));
            }
        }
        Ok(())
    }
}

impl Default for ParameterSchema {
    fn default() -> Self {
        Self::new()
    }
}

/// A tool definition as presented to a model provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: ParameterSchema,
}

// ---------------------------------------------------------------------------
// Tool
// ---------------------------------------------------------------------------

/// A named, schema-described capability invocable with a keyed argument
/// mapping.
///
/// Implementations may hold their own internal state (connections, caches);
/// the runners treat `execute` as a pure function of its arguments.
pub trait Tool: Send + Sync {
    /// Unique name within a registry or agent.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Parameter schema, used for presentation and pre-invocation
    /// validation. Defaults to an empty object schema.
    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
    }

    /// Run the tool. A domain failure is a [`ToolError`], which the agent
    /// loop surfaces back to the model rather than aborting the run.
    fn execute(&self, args: &Arguments) -> Result<Value, ToolError>;

    /// The full definition handed to model providers.
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

// ---------------------------------------------------------------------------
// ToolRegistry
// ---------------------------------------------------------------------------

/// Name-to-tool mapping handed to the workflow runner and to
/// [`crate::AgentCard`] instantiation.
///
/// Registering a name twice silently shadows the earlier tool — last
/// registered wins, so callers must prevent unintended collisions.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.insert(Arc::new(tool));
    }

    pub fn insert(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Registered names, sorted for deterministic presentation.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
