use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Shared key-value state threaded through one workflow run.
///
/// Created by the caller, moved into [`crate::WorkflowRunner::run`], and
/// returned as the final artifact. Single-writer: only the currently
/// executing step mutates it, and ownership moves with the run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowContext {
    data: HashMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_step_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_result: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    log: Vec<String>,
}

impl WorkflowContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value before the run starts.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn data(&self) -> &HashMap<String, Value> {
        &self.data
    }

    pub fn into_data(self) -> HashMap<String, Value> {
        self.data
    }

    /// Id of the most recently executed step, if any step has run.
    pub fn last_step_id(&self) -> Option<&str> {
        self.last_step_id.as_deref()
    }

    /// Result of the most recent successful tool step.
    pub fn last_result(&self) -> Option<&Value> {
        self.last_result.as_ref()
    }

    pub(crate) fn record_step(&mut self, step_id: &str) {
        self.last_step_id = Some(step_id.to_string());
    }

    pub(crate) fn record_result(&mut self, result: Option<Value>) {
        self.last_result = result;
    }

    pub fn log(&mut self, msg: impl Into<String>) {
        self.log.push(msg.into());
    }

    pub fn logs(&self) -> &[String] {
        &self.log
    }

    pub fn clear_logs(&mut self) {
        self.log.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_get_remove() {
        let mut ctx = WorkflowContext::new();
        ctx.set("k", json!({"nested": true}));
        assert!(ctx.contains_key("k"));
        assert_eq!(ctx.get("k").unwrap()["nested"], json!(true));
        assert_eq!(ctx.remove("k"), Some(json!({"nested": true})));
        assert!(ctx.get("k").is_none());
    }

    #[test]
    fn with_value_seeds_data() {
        let ctx = WorkflowContext::new()
            .with_value("count", 0)
            .with_value("label", "start");
        assert_eq!(ctx.get("count"), Some(&json!(0)));
        assert_eq!(ctx.get("label"), Some(&json!("start")));
    }

    #[test]
    fn log_accumulates_and_clears() {
        let mut ctx = WorkflowContext::new();
        ctx.log("first");
        ctx.log("second");
        assert_eq!(ctx.logs(), ["first", "second"]);
        ctx.clear_logs();
        assert!(ctx.logs().is_empty());
    }

    #[test]
    fn bookkeeping_stays_out_of_data() {
        let mut ctx = WorkflowContext::new();
        ctx.record_step("s1");
        ctx.record_result(Some(json!(42.0)));
        assert_eq!(ctx.last_step_id(), Some("s1"));
        assert_eq!(ctx.last_result(), Some(&json!(42.0)));
        assert!(ctx.data().is_empty());
    }
}
