//! Tool system for function calling.

pub mod arguments;
pub mod registry;
pub mod result;
pub mod tool;
pub mod types;
pub mod weather;

pub use arguments::ToolArguments;
pub use registry::ToolRegistry;
pub use result::ToolResult;
pub use tool::{FunctionTool, Tool};
pub use types::ToolParameters;
pub use weather::{lookup_weather, normalize_city, WeatherTool, WEATHER_TOOL_NAME};
