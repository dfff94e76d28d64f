//! Structured tool outcomes.

use serde::{Deserialize, Serialize};

/// Outcome of exactly one tool invocation.
///
/// An unsuccessful lookup is a normal `Error` result, not a fault.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResult {
    Success {
        report: String,
    },
    Error {
        #[serde(rename = "error_message")]
        message: String,
    },
}

impl ToolResult {
    pub fn success(report: impl Into<String>) -> Self {
        Self::Success {
            report: report.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Key/value form handed back to the model.
    pub fn to_value(&self) -> serde_json::Value {
        match self {
            Self::Success { report } => serde_json::json!({
                "status": "success",
                "report": report,
            }),
            Self::Error { message } => serde_json::json!({
                "status": "error",
                "error_message": message,
            }),
        }
    }
}
