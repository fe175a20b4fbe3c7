use crate::tool::ToolError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

// ---------------------------------------------------------------------------
// WorkflowError
// ---------------------------------------------------------------------------

/// Everything that can go wrong defining or running a workflow. Each
/// variant carries the step id / tool name / key needed to diagnose the
/// failure without re-running.
#[derive(Debug, PartialEq)]
pub enum WorkflowError {
    /// A step id was registered twice.
    DuplicateStep { workflow: String, step: String },
    /// Bad start id, dangling target, or a step missing a field its type
    /// requires. Detected at run start, before any step executes.
    InvalidWorkflow { workflow: String, detail: String },
    /// A tool step named a tool the registry doesn't know.
    UnknownTool { step: String, tool: String },
    /// Resolved arguments failed the tool's parameter schema.
    InvalidArguments {
        step: String,
        tool: String,
        reason: String,
    },
    /// A context reference in `tool_params` pointed at an absent key.
    MissingContextKey { step: String, key: String },
    /// A step type appeared somewhere the interpreter does not support it.
    UnsupportedStepType { step: String, detail: String },
    /// The overall step budget ran out.
    StepLimitExceeded { workflow: String, limit: usize },
    /// The tool itself failed and the step had no error route. The inner
    /// error is wrapped, never interpreted.
    ToolFailed { step: String, error: ToolError },
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateStep { workflow, step } => {
                write!(f, "duplicate step '{step}' in workflow '{workflow}'")
            }
            Self::InvalidWorkflow { workflow, detail } => {
                write!(f, "invalid workflow '{workflow}': {detail}")
            }
            Self::UnknownTool { step, tool } => {
                write!(f, "step '{step}': unknown tool '{tool}'")
            }
            Self::InvalidArguments { step, tool, reason } => {
                write!(f, "step '{step}': invalid arguments for tool '{tool}': {reason}")
            }
            Self::MissingContextKey { step, key } => {
                write!(f, "step '{step}': context key '{key}' not found")
            }
            Self::UnsupportedStepType { step, detail } => {
                write!(f, "step '{step}': unsupported step type: {detail}")
            }
            Self::StepLimitExceeded { workflow, limit } => {
                write!(
                    f,
                    "max steps exceeded ({limit}, possible infinite loop) in workflow '{workflow}'"
                )
            }
            Self::ToolFailed { step, error } => {
                write!(f, "step '{step}': {error}")
            }
        }
    }
}

impl std::error::Error for WorkflowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ToolFailed { error, .. } => Some(error),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Predicate
// ---------------------------------------------------------------------------

/// Serializable boolean expression over workflow context keys.
///
/// Workflows stay data-describable: a predicate is a small expression tree,
/// not executable code. Evaluation is deterministic — a missing key or a
/// non-numeric operand makes the comparison node false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// The key is present in the context.
    Exists(String),
    /// The value under `key` equals `value`. Numbers compare by value, so
    /// `42` and `42.0` are equal.
    Eq { key: String, value: Value },
    /// The value under `key` is a number greater than `value`.
    Gt { key: String, value: f64 },
    /// The value under `key` is a number less than `value`.
    Lt { key: String, value: f64 },
    Not(Box<Predicate>),
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
}

impl Predicate {
    pub fn exists(key: impl Into<String>) -> Self {
        Self::Exists(key.into())
    }

    pub fn eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn gt(key: impl Into<String>, value: f64) -> Self {
        Self::Gt {
            key: key.into(),
            value,
        }
    }

    pub fn lt(key: impl Into<String>, value: f64) -> Self {
        Self::Lt {
            key: key.into(),
            value,
        }
    }

    pub fn not(inner: Predicate) -> Self {
        Self::Not(Box::new(inner))
    }

    pub fn all(preds: impl IntoIterator<Item = Predicate>) -> Self {
        Self::All(preds.into_iter().collect())
    }

    pub fn any(preds: impl IntoIterator<Item = Predicate>) -> Self {
        Self::Any(preds.into_iter().collect())
    }

    pub fn evaluate(&self, data: &HashMap<String, Value>) -> bool {
        match self {
            Self::Exists(key) => data.contains_key(key),
            Self::Eq { key, value } => data.get(key).is_some_and(|v| values_equal(v, value)),
            Self::Gt { key, value } => {
                data.get(key).and_then(Value::as_f64).is_some_and(|n| n > *value)
            }
            Self::Lt { key, value } => {
                data.get(key).and_then(Value::as_f64).is_some_and(|n| n < *value)
            }
            Self::Not(inner) => !inner.evaluate(data),
            Self::All(preds) => preds.iter().all(|p| p.evaluate(data)),
            Self::Any(preds) => preds.iter().any(|p| p.evaluate(data)),
        }
    }
}

/// Equality with cross-representation numeric comparison: a step that
/// stored `42.0` matches a predicate written as `42`.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    Tool,
    Condition,
    Loop,
    Parallel,
    Terminal,
}

/// One parameter of a tool step: either a literal value or a reference
/// resolved from the workflow context at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamValue {
    Literal(Value),
    ContextRef(String),
}

/// A node in a workflow graph. Construct with the type-specific
/// constructors and chain the `with_*` methods; which fields are required
/// per type is checked by [`Workflow::validate`] at run start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub(crate) id: String,
    pub(crate) step_type: StepType,
    pub(crate) name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) description: Option<String>,

    // Tool fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) tool_params: BTreeMap<String, ParamValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) output_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) next_step_id: Option<String>,

    // Condition fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) predicate: Option<Predicate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) on_true: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) on_false: Option<String>,

    // Loop fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) body_step_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) exit_step_id: Option<String>,

    // Parallel fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) parallel_step_ids: Vec<String>,

    // Error routing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) on_error: Option<String>,
    #[serde(default)]
    pub(crate) continue_on_error: bool,
}

impl WorkflowStep {
    fn base(id: impl Into<String>, step_type: StepType) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            step_type,
            description: None,
            tool_name: None,
            tool_params: BTreeMap::new(),
            output_key: None,
            next_step_id: None,
            predicate: None,
            on_true: None,
            on_false: None,
            body_step_id: None,
            exit_step_id: None,
            parallel_step_ids: Vec::new(),
            on_error: None,
            continue_on_error: false,
        }
    }

    /// A step that invokes a named tool against the context.
    pub fn tool(id: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: Some(tool_name.into()),
            ..Self::base(id, StepType::Tool)
        }
    }

    /// A step that branches on a predicate over context data.
    pub fn condition(id: impl Into<String>, predicate: Predicate) -> Self {
        Self {
            predicate: Some(predicate),
            ..Self::base(id, StepType::Condition)
        }
    }

    /// A step that re-enters `body_step_id` while the predicate holds, then
    /// falls through to the exit target. The body chain runs to its end
    /// each iteration; every body step counts against the run's step budget.
    pub fn loop_while(
        id: impl Into<String>,
        predicate: Predicate,
        body_step_id: impl Into<String>,
    ) -> Self {
        Self {
            predicate: Some(predicate),
            body_step_id: Some(body_step_id.into()),
            ..Self::base(id, StepType::Loop)
        }
    }

    /// A group of tool steps executed in declaration order.
    pub fn parallel<I, S>(id: impl Into<String>, step_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parallel_step_ids: step_ids.into_iter().map(Into::into).collect(),
            ..Self::base(id, StepType::Parallel)
        }
    }

    /// A step that ends the run.
    pub fn terminal(id: impl Into<String>) -> Self {
        Self::base(id, StepType::Terminal)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Bind a parameter to a literal value.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.tool_params
            .insert(key.into(), ParamValue::Literal(value.into()));
        self
    }

    /// Bind a parameter to a context key, resolved at execution time.
    pub fn with_param_from(
        mut self,
        key: impl Into<String>,
        context_key: impl Into<String>,
    ) -> Self {
        self.tool_params
            .insert(key.into(), ParamValue::ContextRef(context_key.into()));
        self
    }

    /// Store the tool result under this context key.
    pub fn with_output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = Some(key.into());
        self
    }

    pub fn with_next(mut self, step_id: impl Into<String>) -> Self {
        self.next_step_id = Some(step_id.into());
        self
    }

    pub fn with_on_true(mut self, step_id: impl Into<String>) -> Self {
        self.on_true = Some(step_id.into());
        self
    }

    pub fn with_on_false(mut self, step_id: impl Into<String>) -> Self {
        self.on_false = Some(step_id.into());
        self
    }

    pub fn with_exit(mut self, step_id: impl Into<String>) -> Self {
        self.exit_step_id = Some(step_id.into());
        self
    }

    /// Jump to this step instead of failing when the tool errors.
    pub fn with_on_error(mut self, step_id: impl Into<String>) -> Self {
        self.on_error = Some(step_id.into());
        self
    }

    /// Advance to the next step even when the tool errors.
    pub fn with_continue_on_error(mut self) -> Self {
        self.continue_on_error = true;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn step_type(&self) -> StepType {
        self.step_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every step id this step can hand control to.
    fn targets(&self) -> impl Iterator<Item = &String> {
        self.next_step_id
            .iter()
            .chain(self.on_true.iter())
            .chain(self.on_false.iter())
            .chain(self.body_step_id.iter())
            .chain(self.exit_step_id.iter())
            .chain(self.on_error.iter())
            .chain(self.parallel_step_ids.iter())
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// A named graph of steps with a designated start step.
///
/// Construction is incremental: `add_step` only rejects duplicate ids, and
/// dangling branch targets stay legal until [`Workflow::validate`] runs —
/// which the runner does before executing anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    id: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    steps: HashMap<String, WorkflowStep>,
    start_step_id: String,
}

impl Workflow {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        start_step_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            steps: HashMap::new(),
            start_step_id: start_step_id.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn add_step(&mut self, step: WorkflowStep) -> Result<(), WorkflowError> {
        if self.steps.contains_key(&step.id) {
            return Err(WorkflowError::DuplicateStep {
                workflow: self.id.clone(),
                step: step.id,
            });
        }
        self.steps.insert(step.id.clone(), step);
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_step_id(&self) -> &str {
        &self.start_step_id
    }

    pub fn step(&self, id: &str) -> Option<&WorkflowStep> {
        self.steps.get(id)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Check the graph is runnable: the start step exists, every referenced
    /// target resolves, and each step carries the fields its type requires.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        let invalid = |detail: String| WorkflowError::InvalidWorkflow {
            workflow: self.id.clone(),
            detail,
        };

        if !self.steps.contains_key(&self.start_step_id) {
            return Err(invalid(format!(
                "start step '{}' is not in the step map",
                self.start_step_id
            )));
        }

        for step in self.steps.values() {
            match step.step_type {
                StepType::Tool => {
                    if step.tool_name.is_none() {
                        return Err(invalid(format!(
                            "step '{}' is tool-typed but names no tool",
                            step.id
                        )));
                    }
                }
                StepType::Condition => {
                    if step.predicate.is_none() {
                        return Err(invalid(format!(
                            "step '{}' is condition-typed but has no predicate",
                            step.id
                        )));
                    }
                }
                StepType::Loop => {
                    if step.predicate.is_none() || step.body_step_id.is_none() {
                        return Err(invalid(format!(
                            "step '{}' is loop-typed but lacks a predicate or body",
                            step.id
                        )));
                    }
                }
                StepType::Parallel | StepType::Terminal => {}
            }

            for target in step.targets() {
                if !self.steps.contains_key(target) {
                    return Err(invalid(format!(
                        "step '{}' references unknown step '{target}'",
                        step.id
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    // --- Predicate ---

    #[test]
    fn exists_checks_presence() {
        let d = data(&[("x", json!(1))]);
        assert!(Predicate::exists("x").evaluate(&d));
        assert!(!Predicate::exists("y").evaluate(&d));
    }

    #[test]
    fn eq_compares_numbers_across_representations() {
        let d = data(&[("sum", json!(42.0))]);
        assert!(Predicate::eq("sum", 42).evaluate(&d));
        assert!(!Predicate::eq("sum", 41).evaluate(&d));
    }

    #[test]
    fn eq_compares_strings() {
        let d = data(&[("mode", json!("fast"))]);
        assert!(Predicate::eq("mode", "fast").evaluate(&d));
        assert!(!Predicate::eq("mode", "slow").evaluate(&d));
    }

    #[test]
    fn comparisons_are_false_on_missing_or_non_numeric() {
        let d = data(&[("label", json!("abc"))]);
        assert!(!Predicate::gt("missing", 0.0).evaluate(&d));
        assert!(!Predicate::gt("label", 0.0).evaluate(&d));
        assert!(!Predicate::lt("label", 10.0).evaluate(&d));
    }

    #[test]
    fn boolean_combinators() {
        let d = data(&[("n", json!(5))]);
        let p = Predicate::all([Predicate::gt("n", 1.0), Predicate::lt("n", 10.0)]);
        assert!(p.evaluate(&d));
        assert!(!Predicate::not(p).evaluate(&d));
        assert!(
            Predicate::any([Predicate::exists("missing"), Predicate::exists("n")]).evaluate(&d)
        );
    }

    #[test]
    fn evaluation_is_deterministic() {
        let d = data(&[("n", json!(3))]);
        let p = Predicate::gt("n", 2.0);
        let first = p.evaluate(&d);
        for _ in 0..10 {
            assert_eq!(p.evaluate(&d), first);
        }
    }

    // --- Workflow construction ---

    #[test]
    fn add_step_rejects_duplicate_id() {
        let mut wf = Workflow::new("wf", "test", "a");
        wf.add_step(WorkflowStep::terminal("a")).unwrap();
        let err = wf.add_step(WorkflowStep::terminal("a")).err().unwrap();
        assert!(matches!(err, WorkflowError::DuplicateStep { step, .. } if step == "a"));
    }

    #[test]
    fn dangling_target_is_legal_until_validate() {
        let mut wf = Workflow::new("wf", "test", "a");
        wf.add_step(WorkflowStep::tool("a", "calc").with_next("later"))
            .unwrap();
        // Incremental construction: the reference is checked at run start.
        let err = wf.validate().err().unwrap();
        assert!(matches!(
            err,
            WorkflowError::InvalidWorkflow { detail, .. } if detail.contains("unknown step 'later'")
        ));

        let mut wf2 = wf.clone();
        wf2.add_step(WorkflowStep::terminal("later")).unwrap();
        assert!(wf2.validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_start() {
        let mut wf = Workflow::new("wf", "test", "missing");
        wf.add_step(WorkflowStep::terminal("a")).unwrap();
        let err = wf.validate().err().unwrap();
        assert!(matches!(err, WorkflowError::InvalidWorkflow { .. }));
    }

    #[test]
    fn validate_rejects_tool_step_without_tool() {
        let mut wf = Workflow::new("wf", "test", "a");
        let mut step = WorkflowStep::terminal("a");
        step.step_type = StepType::Tool;
        wf.add_step(step).unwrap();
        let err = wf.validate().err().unwrap();
        assert!(matches!(
            err,
            WorkflowError::InvalidWorkflow { detail, .. } if detail.contains("names no tool")
        ));
    }

    #[test]
    fn validate_rejects_loop_without_body() {
        let mut wf = Workflow::new("wf", "test", "l");
        let mut step = WorkflowStep::condition("l", Predicate::exists("x"));
        step.step_type = StepType::Loop;
        wf.add_step(step).unwrap();
        let err = wf.validate().err().unwrap();
        assert!(matches!(
            err,
            WorkflowError::InvalidWorkflow { detail, .. } if detail.contains("lacks a predicate or body")
        ));
    }

    #[test]
    fn workflow_round_trips_through_json() {
        let mut wf = Workflow::new("calc_flow", "Calculator flow", "add");
        wf.add_step(
            WorkflowStep::tool("add", "calculator")
                .with_param("operation", "add")
                .with_param("a", 15)
                .with_param_from("b", "seed")
                .with_output_key("sum_result")
                .with_next("check"),
        )
        .unwrap();
        wf.add_step(
            WorkflowStep::condition("check", Predicate::gt("sum_result", 30.0))
                .with_on_true("done"),
        )
        .unwrap();
        wf.add_step(WorkflowStep::terminal("done")).unwrap();

        let text = serde_json::to_string(&wf).unwrap();
        let back: Workflow = serde_json::from_str(&text).unwrap();
        assert_eq!(back.id(), "calc_flow");
        assert_eq!(back.start_step_id(), "add");
        assert_eq!(back.step("add").unwrap(), wf.step("add").unwrap());
        assert!(back.validate().is_ok());
    }
}
