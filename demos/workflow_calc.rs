use agent_loom::tools::{CalculatorTool, WeatherTool};
use agent_loom::{
    Predicate, ToolRegistry, Workflow, WorkflowContext, WorkflowRunner, WorkflowStep,
};

/// 1. Compute 15 + 27 and store it as `sum_result`.
/// 2. If the sum is above 30, fetch the San Francisco weather.
/// 3. Count down `countdown` with a loop before finishing.
fn build_workflow() -> Workflow {
    let mut wf = Workflow::new("calc_weather", "Calculator + Weather", "calculate_sum");

    wf.add_step(
        WorkflowStep::tool("calculate_sum", "calculator")
            .with_name("Calculate Sum")
            .with_param("operation", "add")
            .with_param("a", 15)
            .with_param("b", 27)
            .with_output_key("sum_result")
            .with_next("check_sum"),
    )
    .unwrap();

    wf.add_step(
        WorkflowStep::condition("check_sum", Predicate::gt("sum_result", 30.0))
            .with_name("Check Sum > 30")
            .with_on_true("weather_sf")
            .with_on_false("countdown_loop"),
    )
    .unwrap();

    wf.add_step(
        WorkflowStep::tool("weather_sf", "weather")
            .with_name("Get SF Weather")
            .with_param("location", "San Francisco, CA")
            .with_output_key("sf_weather")
            .with_next("countdown_loop"),
    )
    .unwrap();

    wf.add_step(
        WorkflowStep::loop_while("countdown_loop", Predicate::gt("countdown", 0.0), "decrement")
            .with_exit("done"),
    )
    .unwrap();

    wf.add_step(
        WorkflowStep::tool("decrement", "calculator")
            .with_param("operation", "subtract")
            .with_param_from("a", "countdown")
            .with_param("b", 1)
            .with_output_key("countdown"),
    )
    .unwrap();

    wf.add_step(WorkflowStep::terminal("done")).unwrap();

    wf
}

fn main() {
    let mut tools = ToolRegistry::new();
    tools.register(CalculatorTool);
    tools.register(WeatherTool);

    let workflow = build_workflow();
    let mut ctx = WorkflowContext::new().with_value("countdown", 3);

    let mut runner = WorkflowRunner::new().with_tracing();
    match runner.run(&workflow, &tools, &mut ctx) {
        Ok(()) => {
            println!("=== Workflow Execution ===");
            println!("Last step:  {:?}", ctx.last_step_id());
            println!("Sum result: {:?}", ctx.get("sum_result"));
            println!("SF weather: {:?}", ctx.get("sf_weather"));
            println!("Countdown:  {:?}", ctx.get("countdown"));
        }
        Err(e) => println!("workflow failed: {e}"),
    }
}
