//! Drives one conversational turn against an agent and a session.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, warn};

use crate::agent::AgentDefinition;
use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::provider::{self, ModelProvider, ProviderRequest};
use crate::session::{InMemorySessionService, SessionKey};
use crate::tools::ToolArguments;
use crate::types::{
    Content, FinishReason, GenerationSettings, Part, Role, StreamEventType, ToolResponse, Usage,
};

use super::events::{EventEmitter, EventPayload, EventStream};

/// Maximum model rounds per turn before the turn escalates.
pub const MAX_TOOL_ITERATIONS: usize = 20;

/// Executes turns for one agent within one application.
///
/// Each turn appends the user message, then every tool call, tool response,
/// and the final agent message to the session as they happen.
pub struct Runner {
    app_name: String,
    agent: Arc<AgentDefinition>,
    sessions: Arc<InMemorySessionService>,
    provider: Arc<dyn ModelProvider>,
    settings: GenerationSettings,
}

impl Runner {
    pub fn new(
        app_name: impl Into<String>,
        agent: Arc<AgentDefinition>,
        sessions: Arc<InMemorySessionService>,
        provider: Arc<dyn ModelProvider>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            agent,
            sessions,
            provider,
            settings: GenerationSettings::default(),
        }
    }

    /// Build a runner whose provider is resolved from the agent's model.
    pub fn from_config(
        app_name: impl Into<String>,
        agent: Arc<AgentDefinition>,
        sessions: Arc<InMemorySessionService>,
        config: &AgentConfig,
    ) -> Result<Self> {
        let provider = provider::create_provider(agent.model(), config)?;
        Ok(Self::new(app_name, agent, sessions, Arc::from(provider)))
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn agent(&self) -> &Arc<AgentDefinition> {
        &self.agent
    }

    pub fn sessions(&self) -> &Arc<InMemorySessionService> {
        &self.sessions
    }

    /// Start one turn. Fails up front if the session does not exist;
    /// otherwise nothing happens until the returned stream is polled.
    pub fn run(&self, user_id: &str, session_id: &str, new_message: Content) -> Result<EventStream> {
        let key = SessionKey::new(self.app_name.as_str(), user_id, session_id);
        if self.sessions.get(&key).is_none() {
            return Err(AgentError::SessionNotFound(key.to_string()));
        }

        let agent = Arc::clone(&self.agent);
        let sessions = Arc::clone(&self.sessions);
        let provider = Arc::clone(&self.provider);
        let settings = self.settings.clone();

        let stream = async_stream::stream! {
            let mut emitter = EventEmitter::new(agent.name());
            debug!(
                invocation_id = %emitter.invocation_id(),
                session = %key,
                model = %agent.model(),
                "turn start"
            );

            if let Err(e) = sessions.append_content(&key, new_message) {
                yield Err(e);
                return;
            }

            let tool_defs = (!agent.tools().is_empty()).then(|| agent.tools().definitions());
            let mut usage = Usage::default();

            for iteration in 1..=MAX_TOOL_ITERATIONS {
                let Some(session) = sessions.get(&key) else {
                    yield Err(AgentError::SessionNotFound(key.to_string()));
                    return;
                };
                let request = ProviderRequest {
                    system_instruction: Some(agent.instruction().to_string())
                        .filter(|s| !s.is_empty()),
                    messages: session.history,
                    settings: settings.clone(),
                    tools: tool_defs.clone(),
                };

                let mut deltas = match provider.stream_text(&request).await {
                    Ok(deltas) => deltas,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };

                let mut text = String::new();
                let mut calls = Vec::new();
                let mut finish_reason = None;
                while let Some(delta) = deltas.next().await {
                    let delta = match delta {
                        Ok(delta) => delta,
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    };
                    match delta.event_type {
                        StreamEventType::TextDelta => {
                            if !delta.text.is_empty() {
                                text.push_str(&delta.text);
                                yield Ok(emitter.emit(EventPayload::PartialResponse { text: delta.text }));
                            }
                        }
                        StreamEventType::ToolCallDelta => {
                            if let Some(call) = delta.tool_call {
                                calls.push(call);
                            }
                        }
                        StreamEventType::Done => {
                            finish_reason = delta.finish_reason;
                            if let Some(u) = delta.usage {
                                usage.merge(&u);
                            }
                            break;
                        }
                        StreamEventType::Error => {
                            let message = if delta.text.is_empty() {
                                "stream error".to_string()
                            } else {
                                delta.text
                            };
                            yield Err(AgentError::Stream(message));
                            return;
                        }
                    }
                }

                debug!(
                    invocation_id = %emitter.invocation_id(),
                    iteration,
                    tool_calls = calls.len(),
                    text_len = text.len(),
                    finish_reason = ?finish_reason,
                    "model round complete"
                );

                if finish_reason == Some(FinishReason::ContentFilter) {
                    warn!(invocation_id = %emitter.invocation_id(), "response blocked by content filter");
                    yield Ok(emitter.emit(EventPayload::Escalation {
                        reason: Some("response blocked by content filter".to_string()),
                    }));
                    return;
                }

                if calls.is_empty() {
                    let parts = if text.is_empty() { Vec::new() } else { vec![Part::text(text)] };
                    let content = Content::new(Role::Agent, parts);
                    // Backends reject replayed messages with no parts.
                    if !content.parts.is_empty() {
                        if let Err(e) = sessions.append_content(&key, content.clone()) {
                            yield Err(e);
                            return;
                        }
                    }
                    debug!(invocation_id = %emitter.invocation_id(), "turn complete");
                    yield Ok(emitter.emit(EventPayload::FinalResponse { content, usage }));
                    return;
                }

                // Every call must be answerable before any of them is recorded,
                // so history never holds a call without its response.
                if let Some(unknown) = calls.iter().find(|c| !agent.tools().contains(&c.name)) {
                    warn!(invocation_id = %emitter.invocation_id(), tool = %unknown.name, "model requested an unregistered tool");
                    let reason = AgentError::UnknownTool(unknown.name.clone()).to_string();
                    yield Ok(emitter.emit(EventPayload::ToolCall { call: unknown.clone() }));
                    yield Ok(emitter.emit(EventPayload::Escalation { reason: Some(reason) }));
                    return;
                }

                let mut parts = Vec::with_capacity(calls.len() + 1);
                if !text.is_empty() {
                    parts.push(Part::text(text));
                }
                parts.extend(calls.iter().cloned().map(Part::FunctionCall));
                if let Err(e) = sessions.append_content(&key, Content::new(Role::Agent, parts)) {
                    yield Err(e);
                    return;
                }

                for call in calls {
                    yield Ok(emitter.emit(EventPayload::ToolCall { call: call.clone() }));

                    let args = ToolArguments::new(call.arguments.clone());
                    let result = match agent.tools().call(&call.name, &args) {
                        Ok(result) => result,
                        Err(e) => {
                            yield Ok(emitter.emit(EventPayload::Escalation {
                                reason: Some(e.to_string()),
                            }));
                            return;
                        }
                    };
                    let response = ToolResponse {
                        call_id: call.id.clone(),
                        name: call.name.clone(),
                        response: result.to_value(),
                    };
                    if let Err(e) = sessions.append_content(&key, Content::tool_response(response)) {
                        yield Err(e);
                        return;
                    }
                    yield Ok(emitter.emit(EventPayload::ToolResult {
                        call_id: call.id,
                        name: call.name,
                        result,
                    }));
                }
            }

            warn!(invocation_id = %emitter.invocation_id(), "tool loop exceeded max iterations");
            yield Ok(emitter.emit(EventPayload::Escalation {
                reason: Some("tool loop exceeded max iterations".to_string()),
            }));
        };

        Ok(Box::pin(stream))
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("app_name", &self.app_name)
            .field("agent", &self.agent.name())
            .field("provider", &self.provider.provider_name())
            .finish()
    }
}
