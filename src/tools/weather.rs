//! Mock weather lookup backed by a fixed three-city table.

use tracing::info;

use super::arguments::ToolArguments;
use super::result::ToolResult;
use super::tool::Tool;
use super::types::ToolParameters;

pub const WEATHER_TOOL_NAME: &str = "get_weather";

const WEATHER_TABLE: [(&str, &str); 3] = [
    (
        "newyork",
        "The weather in New York is sunny with a temperature of 25°C.",
    ),
    ("london", "It's cloudy in London with a temperature of 15°C."),
    (
        "tokyo",
        "Tokyo is experiencing light rain and a temperature of 18°C.",
    ),
];

/// Lowercase and drop every space so `"New York"` and `"newyork"` match.
pub fn normalize_city(city: &str) -> String {
    city.to_lowercase().replace(' ', "")
}

/// Look up the report for a city. Never fails: a miss is an `Error` result
/// that echoes the caller's original spelling.
pub fn lookup_weather(city: &str) -> ToolResult {
    info!(tool = WEATHER_TOOL_NAME, city, "tool called");
    let key = normalize_city(city);
    match WEATHER_TABLE.iter().find(|(name, _)| *name == key) {
        Some((_, report)) => ToolResult::success(*report),
        None => ToolResult::error(format!(
            "Sorry, I don't have weather information for '{city}'."
        )),
    }
}

/// `get_weather(city)` exposed to the model.
#[derive(Debug, Clone)]
pub struct WeatherTool {
    parameters: ToolParameters,
}

impl WeatherTool {
    pub fn new() -> Self {
        Self {
            parameters: ToolParameters::object()
                .string(
                    "city",
                    "The name of the city (e.g., \"New York\", \"London\", \"Tokyo\").",
                    true,
                )
                .build(),
        }
    }
}

impl Default for WeatherTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for WeatherTool {
    fn name(&self) -> &str {
        WEATHER_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Retrieves the current weather report for a specified city."
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    fn call(&self, args: &ToolArguments) -> ToolResult {
        match args.get_str("city") {
            Ok(city) => lookup_weather(city),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}
