//! OpenAI Chat Completions transport, shared by OpenAI and Groq.

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::types::*;

use super::http::{bearer_headers, shared_client, status_to_error, SseBuffer, StreamErrorBody};
use super::{DeltaStream, ModelProvider, ProviderRequest};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

pub struct OpenAiCompatibleProvider {
    provider_name: &'static str,
    model_id: String,
    api_key: String,
    base_url: String,
}

impl OpenAiCompatibleProvider {
    pub fn openai(model_id: String, api_key: String, base_url: Option<String>) -> Self {
        Self::new("openai", model_id, api_key, base_url.unwrap_or_else(|| OPENAI_BASE_URL.to_string()))
    }

    pub fn groq(model_id: String, api_key: String, base_url: Option<String>) -> Self {
        Self::new("groq", model_id, api_key, base_url.unwrap_or_else(|| GROQ_BASE_URL.to_string()))
    }

    pub fn new(
        provider_name: &'static str,
        model_id: String,
        api_key: String,
        base_url: String,
    ) -> Self {
        Self {
            provider_name,
            model_id,
            api_key,
            base_url,
        }
    }

    pub(crate) fn build_request_body(&self, request: &ProviderRequest) -> serde_json::Value {
        let mut messages = Vec::new();
        if let Some(ref instruction) = request.system_instruction {
            messages.push(serde_json::json!({ "role": "system", "content": instruction }));
        }
        for content in &request.messages {
            messages.extend(content_to_openai(content));
        }

        let mut body = serde_json::Map::new();
        body.insert("model".into(), self.model_id.clone().into());
        body.insert("messages".into(), serde_json::Value::Array(messages));
        body.insert("stream".into(), true.into());

        if let Some(max) = request.settings.max_tokens {
            body.insert("max_tokens".into(), max.into());
        }
        if let Some(temp) = request.settings.temperature {
            body.insert("temperature".into(), temp.into());
        }
        if let Some(top_p) = request.settings.top_p {
            body.insert("top_p".into(), top_p.into());
        }
        if let Some(ref stops) = request.settings.stop_sequences {
            body.insert("stop".into(), serde_json::json!(stops));
        }

        if let Some(ref tools) = request.tools {
            if !tools.is_empty() {
                let defs: Vec<serde_json::Value> = tools
                    .iter()
                    .map(|t| {
                        serde_json::json!({
                            "type": "function",
                            "function": {
                                "name": t.name,
                                "description": t.description,
                                "parameters": t.parameters,
                            }
                        })
                    })
                    .collect();
                body.insert("tools".into(), serde_json::Value::Array(defs));
            }
        }

        serde_json::Value::Object(body)
    }
}

#[async_trait]
impl ModelProvider for OpenAiCompatibleProvider {
    fn provider_name(&self) -> &str {
        self.provider_name
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn stream_text(&self, request: &ProviderRequest) -> Result<DeltaStream, AgentError> {
        let body = self.build_request_body(request);
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        debug!(provider = self.provider_name, model = %self.model_id, "stream_text");

        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let byte_stream = resp.bytes_stream();

        let provider_name = self.provider_name;
        let stream = async_stream::stream! {
            let mut sse = SseBuffer::new();
            let mut state = ChunkState::default();
            futures::pin_mut!(byte_stream);

            loop {
                let (payloads, drained) = match byte_stream.next().await {
                    Some(Ok(chunk)) => (sse.push(&chunk), false),
                    Some(Err(e)) => {
                        yield Err(AgentError::Network(e));
                        return;
                    }
                    None => (sse.finish().into_iter().collect(), true),
                };
                for data in payloads {
                    match state.apply(&data) {
                        Ok(Some(delta)) => yield Ok(delta),
                        Ok(None) => {}
                        Err(message) => {
                            warn!(provider = provider_name, %message, "stream failed");
                            yield Ok(TextStreamDelta::error(message));
                            return;
                        }
                    }
                }
                if drained {
                    break;
                }
            }

            for call in state.take_tool_calls() {
                yield Ok(TextStreamDelta::tool_call(call));
            }
            yield Ok(TextStreamDelta::done(state.finish_reason, state.usage));
        };

        Ok(Box::pin(stream))
    }
}

/// A tool call assembled from indexed fragments.
#[derive(Debug, Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

impl PartialToolCall {
    fn merge(&mut self, fragment: OpenAiToolCallDelta) {
        if let Some(id) = fragment.id.filter(|id| !id.is_empty()) {
            self.id = id;
        }
        if let Some(function) = fragment.function {
            if let Some(name) = function.name.filter(|n| !n.is_empty()) {
                self.name = name;
            }
            if let Some(args) = function.arguments {
                self.arguments.push_str(&args);
            }
        }
    }

    fn finish(self) -> ToolCall {
        let arguments = if self.arguments.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&self.arguments)
                .unwrap_or(serde_json::Value::String(self.arguments))
        };
        let id = if self.id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            self.id
        };
        ToolCall {
            id,
            name: self.name,
            arguments,
        }
    }
}

#[derive(Debug, Default)]
struct ChunkState {
    tool_calls: BTreeMap<u32, PartialToolCall>,
    finish_reason: Option<FinishReason>,
    usage: Option<Usage>,
}

impl ChunkState {
    /// Fold one chunk in; returns a text delta if it carried content.
    ///
    /// An error object or an unreadable chunk is returned as `Err(message)`.
    fn apply(&mut self, data: &str) -> Result<Option<TextStreamDelta>, String> {
        let chunk = serde_json::from_str::<OpenAiStreamChunk>(data)
            .map_err(|e| format!("malformed stream chunk: {e}"))?;
        if let Some(error) = chunk.error {
            return Err(error.describe());
        }
        if let Some(u) = chunk.usage {
            self.usage = Some(Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            });
        }
        let Some(choice) = chunk.choices.into_iter().next() else {
            return Ok(None);
        };
        if let Some(reason) = choice.finish_reason.as_deref() {
            self.finish_reason = Some(parse_finish_reason(reason));
        }
        for fragment in choice.delta.tool_calls.unwrap_or_default() {
            self.tool_calls.entry(fragment.index).or_default().merge(fragment);
        }
        Ok(choice
            .delta
            .content
            .filter(|text| !text.is_empty())
            .map(TextStreamDelta::text))
    }

    fn take_tool_calls(&mut self) -> Vec<ToolCall> {
        std::mem::take(&mut self.tool_calls)
            .into_values()
            .map(PartialToolCall::finish)
            .collect()
    }
}

fn parse_finish_reason(s: &str) -> FinishReason {
    match s {
        "stop" => FinishReason::Stop,
        "length" => FinishReason::Length,
        "tool_calls" | "function_call" => FinishReason::ToolCalls,
        "content_filter" => FinishReason::ContentFilter,
        _ => FinishReason::Error,
    }
}

fn content_to_openai(content: &Content) -> Vec<serde_json::Value> {
    match content.role {
        Role::User => vec![serde_json::json!({ "role": "user", "content": content.text() })],
        Role::Agent => {
            let text = content.text();
            let mut message = serde_json::json!({
                "role": "assistant",
                "content": if text.is_empty() { serde_json::Value::Null } else { serde_json::Value::String(text) },
            });
            let calls: Vec<serde_json::Value> = content
                .tool_calls()
                .into_iter()
                .map(|tc| {
                    serde_json::json!({
                        "id": tc.id,
                        "type": "function",
                        "function": {
                            "name": tc.name,
                            "arguments": tc.arguments.to_string(),
                        }
                    })
                })
                .collect();
            if !calls.is_empty() {
                message["tool_calls"] = serde_json::Value::Array(calls);
            }
            vec![message]
        }
        Role::Tool => content
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::FunctionResponse(resp) => Some(serde_json::json!({
                    "role": "tool",
                    "tool_call_id": resp.call_id,
                    "content": resp.response.to_string(),
                })),
                _ => None,
            })
            .collect(),
    }
}

// OpenAI API stream types (internal)

#[derive(Deserialize)]
struct OpenAiStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAiStreamChoice>,
    usage: Option<OpenAiUsage>,
    error: Option<StreamErrorBody>,
}

#[derive(Deserialize)]
struct OpenAiStreamChoice {
    delta: OpenAiStreamDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiStreamDelta {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiToolCallDelta>>,
}

#[derive(Deserialize)]
struct OpenAiToolCallDelta {
    #[serde(default)]
    index: u32,
    id: Option<String>,
    function: Option<OpenAiFunctionDelta>,
}

#[derive(Deserialize)]
struct OpenAiFunctionDelta {
    name: Option<String>,
    arguments: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
