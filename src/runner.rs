use crate::agent::Agent;
use crate::message::Message;
use crate::model::ModelError;
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// RunError
// ---------------------------------------------------------------------------

/// Fatal failures of the agent loop. Tool-domain errors are not here: a
/// failing tool is reported back to the model as a tool-result message so
/// the loop can self-correct.
#[derive(Debug, PartialEq)]
pub enum RunError {
    /// The model requested a tool the agent doesn't have.
    UnknownTool { agent: String, tool: String },
    /// The model's arguments failed the tool's parameter schema.
    InvalidArguments {
        agent: String,
        tool: String,
        reason: String,
    },
    /// The tool-calling loop hit its iteration budget.
    LoopLimitExceeded { agent: String, limit: usize },
    /// A multi-agent conversation hit its hop budget.
    RoutingLimitExceeded { limit: usize },
    /// A routing strategy returned an out-of-bounds agent index.
    InvalidRoute { index: usize, agents: usize },
    /// The model provider itself failed. Wrapped, never interpreted.
    Model { agent: String, error: ModelError },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTool { agent, tool } => {
                write!(f, "agent '{agent}': unknown tool '{tool}'")
            }
            Self::InvalidArguments {
                agent,
                tool,
                reason,
            } => {
                write!(f, "agent '{agent}': invalid arguments for tool '{tool}': {reason}")
            }
            Self::LoopLimitExceeded { agent, limit } => {
                write!(
                    f,
                    "agent '{agent}' exceeded max iterations ({limit}) without a final answer"
                )
            }
            Self::RoutingLimitExceeded { limit } => {
                write!(f, "multi-agent conversation exceeded max hops ({limit})")
            }
            Self::InvalidRoute { index, agents } => {
                write!(f, "routing strategy chose agent {index} of {agents}")
            }
            Self::Model { agent, error } => {
                write!(f, "agent '{agent}': {error}")
            }
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Model { error, .. } => Some(error),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Passed to the `on_step` hook after each model call.
pub struct ModelEvent<'a> {
    pub agent: &'a str,
    pub iteration: usize,
    pub duration: Duration,
    /// Tool calls the model requested in this response; 0 means final.
    pub tool_calls: usize,
}

/// Passed to the `on_tool` hook after each tool execution.
pub struct ToolEvent<'a> {
    pub agent: &'a str,
    pub tool: &'a str,
    pub call_id: &'a str,
    pub duration: Duration,
    /// True when the tool itself failed and the failure was reported back
    /// to the model.
    pub failed: bool,
}

/// Passed to the `on_error` hook before any fatal return.
pub struct ErrorEvent<'a> {
    pub agent: &'a str,
    pub error: &'a RunError,
    pub iteration: usize,
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Drives the agent tool-calling loop and multi-agent handoff.
///
/// The runner holds configuration and hooks only — no state survives a
/// call, so one runner can drive any number of independent runs.
pub struct Runner {
    max_iterations: usize,
    max_hops: usize,
    on_step: Option<Box<dyn FnMut(&ModelEvent)>>,
    on_tool: Option<Box<dyn FnMut(&ToolEvent)>>,
    on_error: Option<Box<dyn FnMut(&ErrorEvent)>>,
}

impl Runner {
    pub fn new() -> Self {
        Self {
            max_iterations: 10,
            max_hops: 10,
            on_step: None,
            on_tool: None,
            on_error: None,
        }
    }

    /// Bound the model-call loop. Prevents infinite tool-call cycles.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Bound the number of agent runs in one multi-agent conversation.
    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Register a callback that fires after each model call.
    pub fn on_step(mut self, cb: impl FnMut(&ModelEvent) + 'static) -> Self {
        self.on_step = Some(Box::new(cb));
        self
    }

    /// Register a callback that fires after each tool execution.
    pub fn on_tool(mut self, cb: impl FnMut(&ToolEvent) + 'static) -> Self {
        self.on_tool = Some(Box::new(cb));
        self
    }

    /// Register a callback that fires when the run fails.
    pub fn on_error(mut self, cb: impl FnMut(&ErrorEvent) + 'static) -> Self {
        self.on_error = Some(Box::new(cb));
        self
    }

    /// Wire all hooks to print to stderr.
    pub fn with_tracing(self) -> Self {
        self.on_step(|e| {
            eprintln!(
                "[model {}] {} -> {} tool call(s) ({:.3}s)",
                e.iteration,
                e.agent,
                e.tool_calls,
                e.duration.as_secs_f64()
            );
        })
        .on_tool(|e| {
            eprintln!(
                "[tool] {} ran {} ({}) {} ({:.3}s)",
                e.agent,
                e.tool,
                e.call_id,
                if e.failed { "failed" } else { "ok" },
                e.duration.as_secs_f64()
            );
        })
        .on_error(|e| {
            eprintln!("[error] {} at iteration {}: {}", e.agent, e.iteration, e.error);
        })
    }

    /// Run one agent to a final answer.
    ///
    /// Seeds a fresh conversation with the agent's system prompt and the
    /// input message, then alternates model calls and tool executions until
    /// the model answers without requesting tools.
    pub fn run(&mut self, agent: &Agent, message: Message) -> Result<Message, RunError> {
        let mut history = Vec::with_capacity(2);
        if let Some(prompt) = agent.system_prompt() {
            history.push(Message::system(prompt));
        }
        history.push(message);

        let schemas = agent.tool_schemas();

        for iteration in 1..=self.max_iterations {
            let started = Instant::now();
            let response = match agent.provider().generate(&history, &schemas) {
                Ok(response) => response,
                Err(error) => {
                    let err = RunError::Model {
                        agent: agent.name().to_string(),
                        error,
                    };
                    self.emit_error(agent.name(), &err, iteration);
                    return Err(err);
                }
            };
            self.emit_model(
                agent.name(),
                iteration,
                started.elapsed(),
                response.tool_calls.len(),
            );

            if !response.has_tool_calls() {
                return Ok(response);
            }

            history.push(response.clone());

            for call in &response.tool_calls {
                let Some(tool) = agent.tool(&call.tool_name) else {
                    let err = RunError::UnknownTool {
                        agent: agent.name().to_string(),
                        tool: call.tool_name.clone(),
                    };
                    self.emit_error(agent.name(), &err, iteration);
                    return Err(err);
                };

                if let Err(reason) = tool.parameters().validate(&call.arguments) {
                    let err = RunError::InvalidArguments {
                        agent: agent.name().to_string(),
                        tool: call.tool_name.clone(),
                        reason,
                    };
                    self.emit_error(agent.name(), &err, iteration);
                    return Err(err);
                }

                let tool_started = Instant::now();
                let (content, failed) = match tool.execute(&call.arguments) {
                    Ok(value) => (render(&value), false),
                    // The tool's own failure goes back to the model, which
                    // may retry with different arguments or give up.
                    Err(error) => (format!("Error: {error}"), true),
                };
                self.emit_tool(
                    agent.name(),
                    &call.tool_name,
                    &call.id,
                    tool_started.elapsed(),
                    failed,
                );
                history.push(Message::tool(content, call.id.as_str(), call.tool_name.as_str()));
            }
        }

        let err = RunError::LoopLimitExceeded {
            agent: agent.name().to_string(),
            limit: self.max_iterations,
        };
        self.emit_error(agent.name(), &err, self.max_iterations);
        Err(err)
    }

    /// Run a linear pipeline: each agent exactly once, in order, feeding
    /// every response to the next agent. Returns one response per agent.
    pub fn run_multi_agent(
        &mut self,
        agents: &[Agent],
        initial_message: Message,
    ) -> Result<Vec<Message>, RunError> {
        let mut responses = Vec::with_capacity(agents.len());
        let mut current = initial_message;
        let mut hops = 0;

        for agent in agents {
            hops += 1;
            if hops > self.max_hops {
                let err = RunError::RoutingLimitExceeded {
                    limit: self.max_hops,
                };
                self.emit_error(agent.name(), &err, hops);
                return Err(err);
            }
            let response = self.run(agent, current)?;
            responses.push(response.clone());
            current = response;
        }

        Ok(responses)
    }

    /// Run a routed conversation: `route` picks the next agent for each
    /// message (the initial one included) and ends the conversation by
    /// returning `None`. Each agent run counts one hop.
    pub fn run_multi_agent_with<F>(
        &mut self,
        agents: &[Agent],
        initial_message: Message,
        mut route: F,
    ) -> Result<Vec<Message>, RunError>
    where
        F: FnMut(&Message, &[Agent]) -> Option<usize>,
    {
        let mut responses = Vec::new();
        let mut current = initial_message;
        let mut hops = 0;

        while let Some(index) = route(&current, agents) {
            let Some(agent) = agents.get(index) else {
                let err = RunError::InvalidRoute {
                    index,
                    agents: agents.len(),
                };
                self.emit_error("", &err, hops);
                return Err(err);
            };

            hops += 1;
            if hops > self.max_hops {
                let err = RunError::RoutingLimitExceeded {
                    limit: self.max_hops,
                };
                self.emit_error(agent.name(), &err, hops);
                return Err(err);
            }

            let response = self.run(agent, current)?;
            responses.push(response.clone());
            current = response;
        }

        Ok(responses)
    }

    fn emit_model(&mut self, agent: &str, iteration: usize, duration: Duration, tool_calls: usize) {
        if let Some(cb) = &mut self.on_step {
            cb(&ModelEvent {
                agent,
                iteration,
                duration,
                tool_calls,
            });
        }
    }

    fn emit_tool(
        &mut self,
        agent: &str,
        tool: &str,
        call_id: &str,
        duration: Duration,
        failed: bool,
    ) {
        if let Some(cb) = &mut self.on_tool {
            cb(&ToolEvent {
                agent,
                tool,
                call_id,
                duration,
                failed,
            });
        }
    }

    fn emit_error(&mut self, agent: &str, error: &RunError, iteration: usize) {
        if let Some(cb) = &mut self.on_error {
            cb(&ErrorEvent {
                agent,
                error,
                iteration,
            });
        }
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

/// Tool results become message content: strings as-is, everything else as
/// compact JSON.
fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Role, ToolCallRequest};
    use crate::model::ModelProvider;
    use crate::tool::{Arguments, ParameterSchema, PropertySchema, Tool, ToolError, ToolSchema};
    use serde_json::{Map, json};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Replays a fixed script of responses and records every history it was
    /// called with.
    struct ScriptedProvider {
        script: Mutex<VecDeque<Message>>,
        histories: Arc<Mutex<Vec<Vec<Message>>>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Message>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                histories: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn with_recorder(script: Vec<Message>, histories: Arc<Mutex<Vec<Vec<Message>>>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                histories,
            }
        }
    }

    impl ModelProvider for ScriptedProvider {
        fn generate(
            &self,
            messages: &[Message],
            _tools: &[ToolSchema],
        ) -> Result<Message, ModelError> {
            self.histories.lock().unwrap().push(messages.to_vec());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ModelError::new("script exhausted"))
        }
    }

    struct AddTool {
        calls: Arc<AtomicUsize>,
    }

    impl Tool for AddTool {
        fn name(&self) -> &str {
            "add"
        }
        fn description(&self) -> &str {
            "Adds two numbers"
        }
        fn parameters(&self) -> ParameterSchema {
            ParameterSchema::new()
                .required("a", PropertySchema::number())
                .required("b", PropertySchema::number())
        }
        fn execute(&self, args: &Arguments) -> Result<Value, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let a = args.get("a").and_then(Value::as_f64).unwrap_or(0.0);
            let b = args.get("b").and_then(Value::as_f64).unwrap_or(0.0);
            Ok(json!(a + b))
        }
    }

    struct BrokenTool;

    impl Tool for BrokenTool {
        fn name(&self) -> &str {
            "broken"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        fn execute(&self, _args: &Arguments) -> Result<Value, ToolError> {
            Err(ToolError::new("broken", "out of service"))
        }
    }

    fn call(id: &str, tool: &str, pairs: &[(&str, Value)]) -> ToolCallRequest {
        let mut args = Map::new();
        for (k, v) in pairs {
            args.insert(k.to_string(), v.clone());
        }
        ToolCallRequest::new(id, tool, args)
    }

    #[test]
    fn terminates_after_two_model_calls_and_one_tool_invocation() {
        let tool_calls = Arc::new(AtomicUsize::new(0));
        let histories = Arc::new(Mutex::new(Vec::new()));

        let provider = ScriptedProvider::with_recorder(
            vec![
                Message::assistant_with_calls(
                    "",
                    vec![call("call_1", "add", &[("a", json!(2)), ("b", json!(3))])],
                ),
                Message::assistant("the sum is 5"),
            ],
            Arc::clone(&histories),
        );

        let agent = Agent::builder("calc", provider)
            .tool(AddTool {
                calls: Arc::clone(&tool_calls),
            })
            .build()
            .unwrap();

        let response = Runner::new().run(&agent, Message::user("2+3?")).unwrap();

        assert_eq!(response.content, "the sum is 5");
        assert_eq!(tool_calls.load(Ordering::SeqCst), 1);

        let histories = histories.lock().unwrap();
        assert_eq!(histories.len(), 2);
        // Second model call sees the assistant request plus the tool result.
        let second = &histories[1];
        let tool_msg = second.last().unwrap();
        assert_eq!(tool_msg.role, Role::Tool);
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(tool_msg.content, "5.0");
    }

    #[test]
    fn system_prompt_seeds_the_history() {
        let histories = Arc::new(Mutex::new(Vec::new()));
        let provider = ScriptedProvider::with_recorder(
            vec![Message::assistant("ok")],
            Arc::clone(&histories),
        );

        let agent = Agent::builder("polite", provider)
            .system_prompt("Be brief.")
            .build()
            .unwrap();

        Runner::new().run(&agent, Message::user("hi")).unwrap();

        let histories = histories.lock().unwrap();
        assert_eq!(histories[0][0].role, Role::System);
        assert_eq!(histories[0][0].content, "Be brief.");
        assert_eq!(histories[0][1].role, Role::User);
    }

    #[test]
    fn tool_calls_execute_in_emission_order() {
        let order = Arc::new(Mutex::new(Vec::new()));

        struct OrderedTool {
            name: &'static str,
            order: Arc<Mutex<Vec<&'static str>>>,
        }
        impl Tool for OrderedTool {
            fn name(&self) -> &str {
                self.name
            }
            fn description(&self) -> &str {
                "records execution order"
            }
            fn execute(&self, _args: &Arguments) -> Result<Value, ToolError> {
                self.order.lock().unwrap().push(self.name);
                Ok(json!(null))
            }
        }

        let provider = ScriptedProvider::new(vec![
            Message::assistant_with_calls(
                "",
                vec![call("c1", "second", &[]), call("c2", "first", &[])],
            ),
            Message::assistant("done"),
        ]);

        let agent = Agent::builder("ordered", provider)
            .tool(OrderedTool {
                name: "first",
                order: Arc::clone(&order),
            })
            .tool(OrderedTool {
                name: "second",
                order: Arc::clone(&order),
            })
            .build()
            .unwrap();

        Runner::new().run(&agent, Message::user("go")).unwrap();
        // Emission order, not registration order.
        assert_eq!(*order.lock().unwrap(), ["second", "first"]);
    }

    #[test]
    fn unknown_tool_is_fatal() {
        let provider = ScriptedProvider::new(vec![Message::assistant_with_calls(
            "",
            vec![call("c1", "nonexistent", &[])],
        )]);
        let agent = Agent::builder("bare", provider).build().unwrap();

        let err = Runner::new()
            .run(&agent, Message::user("go"))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            RunError::UnknownTool { tool, .. } if tool == "nonexistent"
        ));
    }

    #[test]
    fn schema_violation_is_fatal_before_execution() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = ScriptedProvider::new(vec![Message::assistant_with_calls(
            "",
            vec![call("c1", "add", &[("a", json!("not a number")), ("b", json!(1))])],
        )]);

        let agent = Agent::builder("calc", provider)
            .tool(AddTool {
                calls: Arc::clone(&calls),
            })
            .build()
            .unwrap();

        let err = Runner::new()
            .run(&agent, Message::user("go"))
            .err()
            .unwrap();
        assert!(matches!(err, RunError::InvalidArguments { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn tool_failure_is_reported_to_the_model_not_the_caller() {
        let histories = Arc::new(Mutex::new(Vec::new()));
        let provider = ScriptedProvider::with_recorder(
            vec![
                Message::assistant_with_calls("", vec![call("c1", "broken", &[])]),
                Message::assistant("giving up"),
            ],
            Arc::clone(&histories),
        );

        let agent = Agent::builder("resilient", provider)
            .tool(BrokenTool)
            .build()
            .unwrap();

        let response = Runner::new().run(&agent, Message::user("go")).unwrap();
        assert_eq!(response.content, "giving up");

        let histories = histories.lock().unwrap();
        let tool_msg = histories[1].last().unwrap();
        assert_eq!(tool_msg.role, Role::Tool);
        assert!(tool_msg.content.starts_with("Error:"));
        assert!(tool_msg.content.contains("out of service"));
    }

    #[test]
    fn loop_budget_exhaustion_is_fatal() {
        // The model asks for the same tool forever.
        let looping: Vec<Message> = (0..5)
            .map(|i| {
                Message::assistant_with_calls(
                    "",
                    vec![call(
                        &format!("c{i}"),
                        "add",
                        &[("a", json!(1)), ("b", json!(1))],
                    )],
                )
            })
            .collect();
        let provider = ScriptedProvider::new(looping);

        let agent = Agent::builder("spinner", provider)
            .tool(AddTool {
                calls: Arc::new(AtomicUsize::new(0)),
            })
            .build()
            .unwrap();

        let err = Runner::new()
            .with_max_iterations(3)
            .run(&agent, Message::user("go"))
            .err()
            .unwrap();
        assert!(matches!(err, RunError::LoopLimitExceeded { limit: 3, .. }));
    }

    #[test]
    fn provider_failure_is_wrapped() {
        let provider = ScriptedProvider::new(vec![]);
        let agent = Agent::builder("dead", provider).build().unwrap();
        let err = Runner::new()
            .run(&agent, Message::user("go"))
            .err()
            .unwrap();
        assert!(matches!(err, RunError::Model { .. }));
    }

    // --- multi-agent ---

    fn echo_agent(name: &str, reply: &str) -> Agent {
        Agent::builder(name, ScriptedProvider::new(vec![Message::assistant(reply)]))
            .build()
            .unwrap()
    }

    #[test]
    fn pipeline_runs_each_agent_once_in_order() {
        let agents = vec![echo_agent("one", "first reply"), echo_agent("two", "second reply")];

        let responses = Runner::new()
            .run_multi_agent(&agents, Message::user("start"))
            .unwrap();

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].content, "first reply");
        assert_eq!(responses[1].content, "second reply");
    }

    #[test]
    fn pipeline_feeds_each_response_forward() {
        let histories = Arc::new(Mutex::new(Vec::new()));
        let first = echo_agent("one", "from one");
        let second = Agent::builder(
            "two",
            ScriptedProvider::with_recorder(
                vec![Message::assistant("from two")],
                Arc::clone(&histories),
            ),
        )
        .build()
        .unwrap();

        Runner::new()
            .run_multi_agent(&[first, second], Message::user("start"))
            .unwrap();

        let histories = histories.lock().unwrap();
        // Agent two's input is agent one's response.
        assert_eq!(histories[0][0].content, "from one");
    }

    #[test]
    fn routing_strategy_none_ends_immediately() {
        let agents = vec![echo_agent("only", "never used")];
        let responses = Runner::new()
            .run_multi_agent_with(&agents, Message::user("start"), |_msg, _agents| None)
            .unwrap();
        assert!(responses.is_empty());
    }

    #[test]
    fn routing_strategy_drives_agent_selection() {
        let agents = vec![
            Agent::builder(
                "first",
                ScriptedProvider::new(vec![
                    Message::assistant("round 1"),
                    Message::assistant("round 2"),
                ]),
            )
            .build()
            .unwrap(),
        ];

        let mut remaining = 2;
        let responses = Runner::new()
            .run_multi_agent_with(&agents, Message::user("start"), move |_msg, _agents| {
                if remaining == 0 {
                    None
                } else {
                    remaining -= 1;
                    Some(0)
                }
            })
            .unwrap();

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[1].content, "round 2");
    }

    #[test]
    fn routing_limit_is_fatal() {
        let agents = vec![Agent::builder(
            "loopy",
            ScriptedProvider::new((0..10).map(|i| Message::assistant(format!("r{i}"))).collect()),
        )
        .build()
        .unwrap()];

        let err = Runner::new()
            .with_max_hops(3)
            .run_multi_agent_with(&agents, Message::user("start"), |_m, _a| Some(0))
            .err()
            .unwrap();
        assert!(matches!(err, RunError::RoutingLimitExceeded { limit: 3 }));
    }

    #[test]
    fn out_of_bounds_route_is_fatal() {
        let agents = vec![echo_agent("only", "hi")];
        let err = Runner::new()
            .run_multi_agent_with(&agents, Message::user("start"), |_m, _a| Some(7))
            .err()
            .unwrap();
        assert_eq!(err, RunError::InvalidRoute { index: 7, agents: 1 });
    }

    // --- hooks ---

    #[test]
    fn hooks_fire_for_model_and_tool_events() {
        let model_events = Arc::new(Mutex::new(Vec::new()));
        let tool_events = Arc::new(Mutex::new(Vec::new()));
        let model_clone = Arc::clone(&model_events);
        let tool_clone = Arc::clone(&tool_events);

        let provider = ScriptedProvider::new(vec![
            Message::assistant_with_calls(
                "",
                vec![call("c1", "add", &[("a", json!(1)), ("b", json!(2))])],
            ),
            Message::assistant("3"),
        ]);
        let agent = Agent::builder("calc", provider)
            .tool(AddTool {
                calls: Arc::new(AtomicUsize::new(0)),
            })
            .build()
            .unwrap();

        Runner::new()
            .on_step(move |e| {
                model_clone.lock().unwrap().push((e.iteration, e.tool_calls));
            })
            .on_tool(move |e| {
                tool_clone.lock().unwrap().push((e.tool.to_string(), e.failed));
            })
            .run(&agent, Message::user("1+2?"))
            .unwrap();

        assert_eq!(*model_events.lock().unwrap(), [(1, 1), (2, 0)]);
        assert_eq!(*tool_events.lock().unwrap(), [("add".to_string(), false)]);
    }

    #[test]
    fn on_error_fires_on_loop_limit() {
        let count = Arc::new(Mutex::new(0usize));
        let count_clone = Arc::clone(&count);

        let provider = ScriptedProvider::new(vec![Message::assistant_with_calls(
            "",
            vec![call("c1", "add", &[("a", json!(1)), ("b", json!(1))])],
        )]);
        let agent = Agent::builder("spinner", provider)
            .tool(AddTool {
                calls: Arc::new(AtomicUsize::new(0)),
            })
            .build()
            .unwrap();

        let _ = Runner::new()
            .with_max_iterations(1)
            .on_error(move |e| {
                assert!(matches!(e.error, RunError::LoopLimitExceeded { .. }));
                *count_clone.lock().unwrap() += 1;
            })
            .run(&agent, Message::user("go"));

        assert_eq!(*count.lock().unwrap(), 1);
    }
}
