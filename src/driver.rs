//! Submits a query and reduces the event stream to response text.

use futures::{Stream, StreamExt};
use tracing::debug;

use crate::error::Result;
use crate::runner::{Event, EventPayload, Runner};
use crate::types::Content;

/// Returned when the stream ends without a terminal event.
pub const NO_FINAL_RESPONSE: &str = "Agent did not produce a final response.";

/// Escalation reason used when the agent gave none.
pub const NO_ESCALATION_MESSAGE: &str = "no specific message.";

/// Sends queries for one user/session pair through a [`Runner`].
#[derive(Debug)]
pub struct ConversationDriver {
    runner: Runner,
    user_id: String,
    session_id: String,
}

impl ConversationDriver {
    pub fn new(runner: Runner, user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            runner,
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    /// Run one turn and return the human-readable response.
    pub async fn submit_query(&self, query: &str) -> Result<String> {
        debug!(user = %self.user_id, session = %self.session_id, query, "submitting query");
        let events = self
            .runner
            .run(&self.user_id, &self.session_id, Content::user(query))?;
        final_response_text(events).await
    }
}

/// Consume events in order until the first terminal one.
///
/// - `FinalResponse` with parts: the first part's text.
/// - `Escalation`: `"Agent escalated: <reason>"`.
/// - Exhausted without either: [`NO_FINAL_RESPONSE`].
///
/// Nothing after the terminal event is read. An `Err` item is returned as-is.
pub async fn final_response_text<S>(events: S) -> Result<String>
where
    S: Stream<Item = Result<Event>>,
{
    futures::pin_mut!(events);
    while let Some(event) = events.next().await {
        match event?.payload {
            EventPayload::FinalResponse { content, .. } => {
                if !content.parts.is_empty() {
                    let text = content
                        .first_text()
                        .map(str::to_string)
                        .unwrap_or_else(|| content.text());
                    return Ok(text);
                }
            }
            EventPayload::Escalation { reason } => {
                return Ok(format!(
                    "Agent escalated: {}",
                    reason.as_deref().unwrap_or(NO_ESCALATION_MESSAGE)
                ));
            }
            _ => {}
        }
    }
    Ok(NO_FINAL_RESPONSE.to_string())
}
