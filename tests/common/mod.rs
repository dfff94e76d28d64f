//! Shared test utilities.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use weather_agent::prelude::*;
use weather_agent::provider::{DeltaStream, ProviderRequest};
use weather_agent::types::ToolCall;

pub const APP: &str = "weather_tutorial_app";
pub const USER: &str = "user_1";
pub const SESSION: &str = "session_001";

/// One scripted model round.
pub enum Round {
    /// Items yielded in order by the delta stream.
    Deltas(Vec<Result<TextStreamDelta>>),
    /// `stream_text` itself fails.
    Fail(AgentError),
}

/// Provider that replays queued rounds and records every request.
///
/// Once the script runs out it answers with a plain "Mock response".
pub struct ScriptedProvider {
    rounds: Mutex<VecDeque<Round>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(rounds: Vec<Round>) -> Arc<Self> {
        Arc::new(Self {
            rounds: Mutex::new(rounds.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted-model"
    }

    async fn stream_text(&self, request: &ProviderRequest) -> Result<DeltaStream> {
        self.requests.lock().unwrap().push(request.clone());
        let round = self
            .rounds
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| text_round("Mock response"));
        match round {
            Round::Deltas(items) => Ok(Box::pin(futures::stream::iter(items))),
            Round::Fail(err) => Err(err),
        }
    }
}

/// A round that streams `text` in two pieces and stops.
pub fn text_round(text: &str) -> Round {
    let mid = text
        .char_indices()
        .nth(text.chars().count() / 2)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let (head, tail) = text.split_at(mid);
    let mut items = Vec::new();
    for piece in [head, tail] {
        if !piece.is_empty() {
            items.push(Ok(TextStreamDelta::text(piece)));
        }
    }
    items.push(Ok(TextStreamDelta::done(
        Some(FinishReason::Stop),
        Some(Usage {
            input_tokens: 10,
            output_tokens: 5,
            total_tokens: 15,
        }),
    )));
    Round::Deltas(items)
}

/// A round that requests one tool call.
pub fn call_round(id: &str, name: &str, arguments: serde_json::Value) -> Round {
    Round::Deltas(vec![
        Ok(TextStreamDelta::tool_call(ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        })),
        Ok(TextStreamDelta::done(Some(FinishReason::ToolCalls), None)),
    ])
}

/// A round that ends with the given finish reason and no output.
pub fn finish_round(reason: FinishReason) -> Round {
    Round::Deltas(vec![Ok(TextStreamDelta::done(Some(reason), None))])
}

/// The stock weather agent over a fresh session store holding the default session.
pub fn weather_runner(provider: Arc<ScriptedProvider>) -> (Runner, Arc<InMemorySessionService>) {
    let agent = weather_agent("google:gemini-2.5-flash".parse().unwrap()).unwrap();
    let sessions = Arc::new(InMemorySessionService::new());
    sessions.create_session(APP, USER, SESSION).unwrap();
    let runner = Runner::new(APP, Arc::new(agent), Arc::clone(&sessions), provider);
    (runner, sessions)
}

pub fn session_key() -> SessionKey {
    SessionKey::new(APP, USER, SESSION)
}
