use agent_loom::providers::MockModelProvider;
use agent_loom::tools::{CalculatorTool, WeatherTool};
use agent_loom::{Agent, AgentCard, Message, Runner, ToolRegistry};

fn build_agents() -> Vec<Agent> {
    let mut registry = ToolRegistry::new();
    registry.register(CalculatorTool);
    registry.register(WeatherTool);

    let planner = AgentCard::new("planner")
        .description("Understands user goals and proposes a plan.")
        .system_prompt(
            "You are a planning agent. Describe what the executor should do; \
             do not call tools yourself.",
        );

    let executor = AgentCard::new("executor")
        .description("Executes concrete steps using tools.")
        .system_prompt(
            "You are an executor agent. Call tools to get concrete results \
             and answer as specifically as possible.",
        )
        .tool_name("calculator")
        .tool_name("weather");

    vec![
        planner
            .instantiate(MockModelProvider::new("planner-model"), &registry)
            .unwrap(),
        executor
            .instantiate(MockModelProvider::new("executor-model"), &registry)
            .unwrap(),
    ]
}

fn main() {
    let agents = build_agents();
    let mut runner = Runner::new().with_tracing();

    // Linear pipeline: planner first, executor second, each exactly once.
    println!("=== Pipeline ===");
    let responses = runner
        .run_multi_agent(&agents, Message::user("Please add 15 and 27 for me."))
        .unwrap();
    for (agent, response) in agents.iter().zip(&responses) {
        println!("{}: {}", agent.name(), response.content);
    }

    // Routed conversation: bounce to the executor twice, then stop.
    println!("\n=== Routed ===");
    let mut remaining = 2;
    let responses = runner
        .run_multi_agent_with(
            &agents,
            Message::user("What is 3 plus 4?"),
            move |_message, _agents| {
                if remaining == 0 {
                    None
                } else {
                    remaining -= 1;
                    Some(1)
                }
            },
        )
        .unwrap();
    for response in &responses {
        println!("executor: {}", response.content);
    }
}
