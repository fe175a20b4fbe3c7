pub mod calculator;
pub mod http;
pub mod weather;

pub use calculator::CalculatorTool;
pub use http::HttpGetTool;
pub use weather::WeatherTool;
