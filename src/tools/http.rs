use crate::tool::{Arguments, ParameterSchema, PropertySchema, Tool, ToolError};
use serde_json::{Value, json};
use std::time::Duration;

/// Fetches a URL and returns the response body as text.
pub struct HttpGetTool {
    timeout: Duration,
}

impl HttpGetTool {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for HttpGetTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for HttpGetTool {
    fn name(&self) -> &str {
        "http_get"
    }

    fn description(&self) -> &str {
        "Sends a GET request and returns the response body"
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
            .required("url", PropertySchema::string().describe("The URL to fetch"))
    }

    fn execute(&self, args: &Arguments) -> Result<Value, ToolError> {
        let url = args
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::new(self.name(), "'url' must be a string"))?;

        let config = ureq::Agent::config_builder()
            .timeout_global(Some(self.timeout))
            .build();
        let agent: ureq::Agent = config.into();

        let body = agent
            .get(url)
            .call()
            .map_err(|e| ToolError::new(self.name(), e.to_string()))?
            .body_mut()
            .read_to_string()
            .map_err(|e| ToolError::new(self.name(), e.to_string()))?;

        Ok(json!(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_host_is_a_tool_error() {
        let mut args = Arguments::new();
        args.insert("url".into(), json!("http://localhost:1/nope"));
        let err = HttpGetTool::new().execute(&args).unwrap_err();
        assert_eq!(err.tool_name, "http_get");
    }

    #[test]
    fn missing_url_is_rejected_by_schema() {
        let err = HttpGetTool::new()
            .parameters()
            .validate(&Arguments::new())
            .unwrap_err();
        assert!(err.contains("url"));
    }
}
