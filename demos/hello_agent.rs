use agent_loom::providers::MockModelProvider;
use agent_loom::tools::{CalculatorTool, WeatherTool};
use agent_loom::{Agent, Message, Runner};

fn main() {
    let agent = Agent::builder("assistant", MockModelProvider::default())
        .description("A general-purpose assistant with calculator and weather tools")
        .system_prompt("You are a helpful assistant. Use tools when they help.")
        .tool(CalculatorTool)
        .tool(WeatherTool)
        .build()
        .unwrap();

    let mut runner = Runner::new().with_tracing();

    for question in [
        "What is 15 plus 27?",
        "How is the weather in San Francisco?",
        "Tell me something nice.",
    ] {
        println!("> {question}");
        match runner.run(&agent, Message::user(question)) {
            Ok(response) => println!("  {}", response.content),
            Err(e) => println!("  Error: {e}"),
        }
        println!();
    }
}
