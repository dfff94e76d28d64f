//! Events produced while processing one turn.

use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AgentError;
use crate::tools::ToolResult;
use crate::types::{Content, ToolCall, Usage};

/// Lazy, forward-only stream of one turn's events.
///
/// An `Err` item ends the turn just like a terminal event does.
pub type EventStream = BoxStream<'static, Result<Event, AgentError>>;

/// Concrete event payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// The model asked for a tool.
    ToolCall { call: ToolCall },
    /// A tool finished and its result was fed back to the model.
    ToolResult {
        call_id: String,
        name: String,
        result: ToolResult,
    },
    /// Streaming model output.
    PartialResponse { text: String },
    /// Terminal: the model completed the turn.
    FinalResponse {
        content: Content,
        #[serde(default)]
        usage: Usage,
    },
    /// Terminal: the turn could not be completed normally.
    Escalation {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

/// Envelope for streamed events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: Uuid,
    /// Shared by every event of one turn.
    pub invocation_id: Uuid,
    /// Position within the turn, starting at 1.
    pub seq: u64,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

impl Event {
    /// Whether this event ends the turn.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.payload,
            EventPayload::FinalResponse { .. } | EventPayload::Escalation { .. }
        )
    }

    pub fn is_final_response(&self) -> bool {
        matches!(self.payload, EventPayload::FinalResponse { .. })
    }

    pub fn is_escalation(&self) -> bool {
        matches!(self.payload, EventPayload::Escalation { .. })
    }
}

/// Stamps payloads with the turn's identity and sequence numbers.
#[derive(Debug)]
pub struct EventEmitter {
    invocation_id: Uuid,
    author: String,
    seq: u64,
}

impl EventEmitter {
    pub fn new(author: impl Into<String>) -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            author: author.into(),
            seq: 0,
        }
    }

    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    pub fn emit(&mut self, payload: EventPayload) -> Event {
        self.seq += 1;
        Event {
            id: Uuid::new_v4(),
            invocation_id: self.invocation_id,
            seq: self.seq,
            author: self.author.clone(),
            timestamp: Utc::now(),
            payload,
        }
    }
}
