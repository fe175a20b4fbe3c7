use crate::tool::{Arguments, ParameterSchema, PropertySchema, Tool, ToolError};
use serde_json::{Value, json};

/// Canned weather lookups for demos and tests. A real deployment would
/// swap this for a tool backed by an actual weather API.
pub struct WeatherTool;

impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "weather"
    }

    fn description(&self) -> &str {
        "Gets the current weather for a given location"
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
            .required(
                "location",
                PropertySchema::string().describe("The city and state, e.g. San Francisco, CA"),
            )
            .optional(
                "units",
                PropertySchema::string()
                    .describe("Temperature units")
                    .one_of(["celsius", "fahrenheit"])
                    .default_value("celsius"),
            )
    }

    fn execute(&self, args: &Arguments) -> Result<Value, ToolError> {
        let location = args
            .get("location")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::new(self.name(), "'location' must be a string"))?;
        let units = args
            .get("units")
            .and_then(Value::as_str)
            .unwrap_or("celsius");

        let temperature = if units == "celsius" { 22 } else { 72 };
        let unit_letter = units.chars().next().unwrap_or('c').to_ascii_uppercase();

        Ok(json!(format!(
            "Weather in {location}: {temperature}°{unit_letter}, Sunny, Humidity: 65%"
        )))
    }
}
