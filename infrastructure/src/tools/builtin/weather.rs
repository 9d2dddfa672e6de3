//! Builtin weather tool with canned data.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use conductor_domain::tool::{
    ExecutionContext, ParameterType, Tool, ToolDefinition, ToolOutput, ToolParameter,
};
use serde_json::{Value, json};
use tracing::debug;

/// Canned conditions per known location: (condition, temp °C, humidity %, wind km/h).
const CONDITIONS: &[(&str, &str, f64, u32, f64)] = &[
    ("tokyo", "partly-cloudy", 21.0, 65, 12.0),
    ("london", "light-rain", 14.5, 78, 18.5),
    ("oslo", "snow", -3.0, 70, 9.0),
    ("cairo", "clear", 31.5, 22, 14.0),
    ("sydney", "clear", 24.0, 55, 20.0),
    ("seattle", "overcast", 12.0, 82, 11.0),
    ("singapore", "thunderstorm", 28.5, 88, 8.0),
];

/// Deterministic weather lookup for a fixed set of locations.
///
/// There is no upstream service; the tool serves the canned table above and
/// fails for locations it does not know, which makes it a convenient failure
/// source in chain tests.
pub struct WeatherTool {
    definition: ToolDefinition,
}

impl WeatherTool {
    pub fn new() -> Self {
        let definition = ToolDefinition::new(
            "weather",
            "Get current weather conditions for a known location",
        )
        .with_timeout(5.0)
        .with_category("information")
        .with_parameter(
            ToolParameter::new("location", ParameterType::String, "Location name")
                .required()
                .with_length(2, 100),
        )
        .with_parameter(
            ToolParameter::new("units", ParameterType::String, "Temperature units")
                .with_default("celsius")
                .with_enum(["celsius", "fahrenheit", "kelvin"]),
        );
        Self { definition }
    }

    fn convert(temp_c: f64, units: &str) -> f64 {
        let converted = match units {
            "fahrenheit" => temp_c * 9.0 / 5.0 + 32.0,
            "kelvin" => temp_c + 273.15,
            _ => temp_c,
        };
        (converted * 10.0).round() / 10.0
    }
}

impl Default for WeatherTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, params: HashMap<String, Value>, _ctx: &ExecutionContext) -> ToolOutput {
        let location = params
            .get("location")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        let units = params
            .get("units")
            .and_then(Value::as_str)
            .unwrap_or("celsius")
            .to_string();

        let key = location.to_lowercase();
        let Some(&(_, condition, temp_c, humidity, wind)) =
            CONDITIONS.iter().find(|(name, ..)| *name == key)
        else {
            return ToolOutput::fail(format!("no weather data available for '{location}'"));
        };

        debug!(%location, condition, "served canned weather");

        ToolOutput::ok(json!({
            "location": location,
            "timestamp": Utc::now().to_rfc3339(),
            "units": { "temperature": units, "wind_speed": "km/h" },
            "current_weather": {
                "condition": condition,
                "temperature": Self::convert(temp_c, &units),
                "humidity": humidity,
                "wind_speed": wind,
            },
        }))
        .with_metadata("tool_version", self.definition.version.clone())
    }
}
