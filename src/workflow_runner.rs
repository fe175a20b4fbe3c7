use crate::ctx::WorkflowContext;
use crate::tool::{Arguments, ToolRegistry};
use crate::workflow::{ParamValue, StepType, Workflow, WorkflowError, WorkflowStep};
use serde_json::Value;
use std::time::{Duration, Instant};

/// Passed to the `on_step` hook after each executed step.
pub struct WorkflowStepEvent<'a> {
    pub step: &'a str,
    pub step_type: StepType,
    pub duration: Duration,
    pub step_number: usize,
}

/// Passed to the `on_error` hook when a step fails or a limit is exceeded.
pub struct WorkflowErrorEvent<'a> {
    /// Step being executed when the run failed; `None` for run-start
    /// validation failures.
    pub step: Option<&'a str>,
    pub error: &'a WorkflowError,
    pub step_number: usize,
}

/// Interprets a [`Workflow`] against a context and a tool registry.
///
/// The runner holds configuration only; each call to [`run`](Self::run) is
/// an independent, synchronous walk of the graph. The workflow definition
/// is never mutated — only the context is, and only by the currently
/// executing step.
pub struct WorkflowRunner {
    max_steps: usize,
    on_step: Option<Box<dyn FnMut(&WorkflowStepEvent)>>,
    on_error: Option<Box<dyn FnMut(&WorkflowErrorEvent)>>,
}

impl WorkflowRunner {
    pub fn new() -> Self {
        Self {
            max_steps: 10_000,
            on_step: None,
            on_error: None,
        }
    }

    /// Prevent accidental infinite loops. The budget covers every executed
    /// step, loop bodies and parallel children included.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Register a callback that fires after each executed step.
    pub fn on_step(mut self, cb: impl FnMut(&WorkflowStepEvent) + 'static) -> Self {
        self.on_step = Some(Box::new(cb));
        self
    }

    /// Register a callback that fires when a step fails or a limit is exceeded.
    pub fn on_error(mut self, cb: impl FnMut(&WorkflowErrorEvent) + 'static) -> Self {
        self.on_error = Some(Box::new(cb));
        self
    }

    /// Set both hooks to print step transitions and errors to stderr.
    pub fn with_tracing(self) -> Self {
        self.on_step(|e| {
            eprintln!(
                "[step {}] {} ({:?}) ({:.3}s)",
                e.step_number,
                e.step,
                e.step_type,
                e.duration.as_secs_f64()
            );
        })
        .on_error(|e| {
            eprintln!(
                "[error] step {} (#{}): {}",
                e.step.unwrap_or("-"),
                e.step_number,
                e.error
            );
        })
    }

    /// Walk the workflow from its start step, mutating `ctx` in place. On
    /// success the caller's context holds every `output_key` written along
    /// the taken path.
    pub fn run(
        &mut self,
        workflow: &Workflow,
        tools: &ToolRegistry,
        ctx: &mut WorkflowContext,
    ) -> Result<(), WorkflowError> {
        // Validate the whole graph up front: a structurally broken workflow
        // fails before any step runs, with no side effects on the context.
        if let Err(err) = workflow.validate() {
            self.emit_error(None, &err, 0);
            return Err(err);
        }

        let mut current: Option<&str> = Some(workflow.start_step_id());
        // Loop headers awaiting the end of their body chain, innermost last.
        let mut loop_stack: Vec<&str> = Vec::new();
        let mut step_number: usize = 0;

        while let Some(step_id) = current {
            let step = match workflow.step(step_id) {
                Some(step) => step,
                None => {
                    let err = self.invalid(workflow, format!("step '{step_id}' vanished"));
                    self.emit_error(Some(step_id), &err, step_number);
                    return Err(err);
                }
            };

            step_number += 1;
            if step_number > self.max_steps {
                let err = WorkflowError::StepLimitExceeded {
                    workflow: workflow.id().to_string(),
                    limit: self.max_steps,
                };
                self.emit_error(Some(step_id), &err, step_number);
                return Err(err);
            }

            ctx.record_step(step_id);
            let started = Instant::now();

            let next: Option<&str> = match step.step_type() {
                StepType::Tool => match apply_tool_step(step, tools, ctx) {
                    Ok(next) => next,
                    Err(err) => {
                        self.emit_error(Some(step_id), &err, step_number);
                        return Err(err);
                    }
                },
                StepType::Condition => {
                    let Some(predicate) = &step.predicate else {
                        let err = self.invalid(
                            workflow,
                            format!("step '{step_id}' is condition-typed but has no predicate"),
                        );
                        self.emit_error(Some(step_id), &err, step_number);
                        return Err(err);
                    };
                    if predicate.evaluate(ctx.data()) {
                        step.on_true.as_deref()
                    } else {
                        step.on_false.as_deref()
                    }
                }
                StepType::Loop => {
                    let (Some(predicate), Some(body)) = (&step.predicate, &step.body_step_id)
                    else {
                        let err = self.invalid(
                            workflow,
                            format!("step '{step_id}' is loop-typed but lacks a predicate or body"),
                        );
                        self.emit_error(Some(step_id), &err, step_number);
                        return Err(err);
                    };
                    if predicate.evaluate(ctx.data()) {
                        // Re-enter the body; control returns here when the
                        // body chain runs out of successors.
                        loop_stack.push(step.id());
                        Some(body.as_str())
                    } else {
                        step.exit_step_id.as_deref()
                    }
                }
                StepType::Parallel => {
                    for child_id in &step.parallel_step_ids {
                        step_number += 1;
                        if step_number > self.max_steps {
                            let err = WorkflowError::StepLimitExceeded {
                                workflow: workflow.id().to_string(),
                                limit: self.max_steps,
                            };
                            self.emit_error(Some(child_id.as_str()), &err, step_number);
                            return Err(err);
                        }

                        let Some(child) = workflow.step(child_id) else {
                            let err = self
                                .invalid(workflow, format!("step '{child_id}' vanished"));
                            self.emit_error(Some(child_id.as_str()), &err, step_number);
                            return Err(err);
                        };
                        if child.step_type() != StepType::Tool {
                            let err = WorkflowError::UnsupportedStepType {
                                step: child_id.clone(),
                                detail: "only tool steps may run in a parallel group".to_string(),
                            };
                            self.emit_error(Some(child_id.as_str()), &err, step_number);
                            return Err(err);
                        }

                        ctx.record_step(child_id);
                        let child_started = Instant::now();
                        match resolve_and_execute(child, tools, ctx) {
                            Ok(result) => {
                                if let Some(key) = &child.output_key {
                                    ctx.set(key.clone(), result.clone());
                                }
                                ctx.record_result(Some(result));
                            }
                            Err(err @ WorkflowError::ToolFailed { .. })
                                if child.continue_on_error =>
                            {
                                ctx.record_result(None);
                                ctx.log(format!("{err}; continuing"));
                            }
                            Err(err) => {
                                self.emit_error(Some(child_id.as_str()), &err, step_number);
                                return Err(err);
                            }
                        }
                        self.emit_step(child, child_started.elapsed(), step_number);
                    }
                    step.next_step_id.as_deref()
                }
                StepType::Terminal => {
                    loop_stack.clear();
                    None
                }
            };

            self.emit_step(step, started.elapsed(), step_number);

            current = match next {
                Some(id) => Some(id),
                // End of a loop body chain: hand control back to the
                // innermost loop header. An empty stack ends the run.
                None => loop_stack.pop(),
            };
        }

        Ok(())
    }

    fn invalid(&self, workflow: &Workflow, detail: String) -> WorkflowError {
        WorkflowError::InvalidWorkflow {
            workflow: workflow.id().to_string(),
            detail,
        }
    }

    fn emit_step(&mut self, step: &WorkflowStep, duration: Duration, step_number: usize) {
        if let Some(cb) = &mut self.on_step {
            cb(&WorkflowStepEvent {
                step: step.id(),
                step_type: step.step_type(),
                duration,
                step_number,
            });
        }
    }

    fn emit_error(&mut self, step: Option<&str>, error: &WorkflowError, step_number: usize) {
        if let Some(cb) = &mut self.on_error {
            cb(&WorkflowErrorEvent {
                step,
                error,
                step_number,
            });
        }
    }
}

impl Default for WorkflowRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Execute a tool step and route its outcome: store the result, or follow
/// the step's error route when the tool itself fails. Structural errors
/// pass through untouched — they are fatal regardless of routing.
fn apply_tool_step<'w>(
    step: &'w WorkflowStep,
    tools: &ToolRegistry,
    ctx: &mut WorkflowContext,
) -> Result<Option<&'w str>, WorkflowError> {
    match resolve_and_execute(step, tools, ctx) {
        Ok(result) => {
            if let Some(key) = &step.output_key {
                ctx.set(key.clone(), result.clone());
            }
            ctx.record_result(Some(result));
            Ok(step.next_step_id.as_deref())
        }
        Err(err @ WorkflowError::ToolFailed { .. }) => {
            ctx.record_result(None);
            if let Some(handler) = &step.on_error {
                ctx.log(format!("{err}; routing to '{handler}'"));
                Ok(Some(handler.as_str()))
            } else if step.continue_on_error {
                ctx.log(format!("{err}; continuing"));
                Ok(step.next_step_id.as_deref())
            } else {
                Err(err)
            }
        }
        Err(err) => Err(err),
    }
}

/// Resolve a tool step's parameters against the context, look the tool up,
/// validate, and execute. Reads the context, never writes it.
fn resolve_and_execute(
    step: &WorkflowStep,
    tools: &ToolRegistry,
    ctx: &WorkflowContext,
) -> Result<Value, WorkflowError> {
    let mut args = Arguments::new();
    for (key, value) in &step.tool_params {
        let resolved = match value {
            ParamValue::Literal(v) => v.clone(),
            ParamValue::ContextRef(context_key) => ctx
                .get(context_key)
                .cloned()
                .ok_or_else(|| WorkflowError::MissingContextKey {
                    step: step.id().to_string(),
                    key: context_key.clone(),
                })?,
        };
        args.insert(key.clone(), resolved);
    }

    let Some(tool_name) = &step.tool_name else {
        return Err(WorkflowError::UnknownTool {
            step: step.id().to_string(),
            tool: String::new(),
        });
    };
    let tool = tools
        .get(tool_name)
        .ok_or_else(|| WorkflowError::UnknownTool {
            step: step.id().to_string(),
            tool: tool_name.clone(),
        })?;

    tool.parameters()
        .validate(&args)
        .map_err(|reason| WorkflowError::InvalidArguments {
            step: step.id().to_string(),
            tool: tool_name.clone(),
            reason,
        })?;

    tool.execute(&args).map_err(|error| WorkflowError::ToolFailed {
        step: step.id().to_string(),
        error,
    })
}
