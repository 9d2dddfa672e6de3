//! Built-in tools shipped with the registry.

mod calculator;
mod weather;

pub use calculator::CalculatorTool;
pub use weather::WeatherTool;
