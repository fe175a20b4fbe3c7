use crate::message::{Message, ToolCallRequest};
use crate::model::{ModelError, ModelProvider};
use crate::tool::{Arguments, ToolSchema};
use serde_json::json;

/// Simulates an LLM for tests and demos by pattern-matching the last user
/// message: arithmetic phrasing becomes a calculator call, a weather
/// question becomes a weather call, anything else an echo. Replace with a
/// real provider in production.
pub struct MockModelProvider {
    name: String,
}

impl MockModelProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for MockModelProvider {
    fn default() -> Self {
        Self::new("mock-model")
    }
}

impl ModelProvider for MockModelProvider {
    fn generate(&self, messages: &[Message], tools: &[ToolSchema]) -> Result<Message, ModelError> {
        let Some(last) = messages.last() else {
            return Ok(Message::assistant("Hello! How can I help you?"));
        };
        let content = last.content.to_lowercase();

        let has_tool = |name: &str| tools.iter().any(|t| t.name == name);

        if has_tool("calculator")
            && ["add", "plus", "+", "sum"].iter().any(|op| content.contains(op))
        {
            let numbers = extract_numbers(&content);
            if numbers.len() >= 2 {
                let mut args = Arguments::new();
                args.insert("operation".into(), json!("add"));
                args.insert("a".into(), json!(numbers[0]));
                args.insert("b".into(), json!(numbers[1]));
                return Ok(Message::assistant_with_calls(
                    "",
                    vec![ToolCallRequest::new("call_1", "calculator", args)],
                ));
            }
        }

        if has_tool("weather") && content.contains("weather") {
            let mut args = Arguments::new();
            args.insert(
                "location".into(),
                json!(extract_location(&content).unwrap_or("San Francisco, CA")),
            );
            return Ok(Message::assistant_with_calls(
                "",
                vec![ToolCallRequest::new("call_1", "weather", args)],
            ));
        }

        Ok(Message::assistant(format!(
            "I understand you said: '{}'. This is a mock response.",
            last.content
        )))
    }
}

/// Pull numeric literals out of free text, in order of appearance.
fn extract_numbers(text: &str) -> Vec<f64> {
    let mut numbers = Vec::new();
    let mut token = String::new();
    for ch in text.chars() {
        if ch.is_ascii_digit() || (ch == '.' && !token.is_empty()) {
            token.push(ch);
        } else if !token.is_empty() {
            if let Ok(n) = token.parse() {
                numbers.push(n);
            }
            token.clear();
        }
    }
    if let Ok(n) = token.parse() {
        numbers.push(n);
    }
    numbers
}

fn extract_location(text: &str) -> Option<&'static str> {
    if text.contains("san francisco") {
        Some("San Francisco, CA")
    } else if text.contains("new york") {
        Some("New York, NY")
    } else if text.contains("oslo") {
        Some("Oslo, Norway")
    } else {
        None
    }
}
