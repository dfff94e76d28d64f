//! Google Gemini API provider.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::types::*;

use super::http::{shared_client, status_to_error, SseBuffer, StreamErrorBody};
use super::{DeltaStream, ModelProvider, ProviderRequest};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GoogleProvider {
    model_id: String,
    api_key: String,
    base_url: String,
}

impl GoogleProvider {
    pub fn new(model_id: String, api_key: String, base_url: Option<String>) -> Self {
        Self {
            model_id,
            api_key,
            base_url: base_url.unwrap_or_else(|| BASE_URL.to_string()),
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(val) = HeaderValue::from_str(&self.api_key) {
            headers.insert("x-goog-api-key", val);
        }
        headers
    }

    pub(crate) fn build_request_body(&self, request: &ProviderRequest) -> serde_json::Value {
        let contents: Vec<serde_json::Value> = request.messages.iter().map(content_to_gemini).collect();

        let mut body = serde_json::Map::new();
        body.insert("contents".into(), serde_json::Value::Array(contents));

        if let Some(ref instruction) = request.system_instruction {
            body.insert(
                "systemInstruction".into(),
                serde_json::json!({ "parts": [{ "text": instruction }] }),
            );
        }

        let mut gen_config = serde_json::Map::new();
        if let Some(max) = request.settings.max_tokens {
            gen_config.insert("maxOutputTokens".into(), max.into());
        }
        if let Some(temp) = request.settings.temperature {
            gen_config.insert("temperature".into(), temp.into());
        }
        if let Some(top_p) = request.settings.top_p {
            gen_config.insert("topP".into(), top_p.into());
        }
        if let Some(ref stops) = request.settings.stop_sequences {
            gen_config.insert("stopSequences".into(), serde_json::json!(stops));
        }
        if !gen_config.is_empty() {
            body.insert("generationConfig".into(), serde_json::Value::Object(gen_config));
        }

        if let Some(ref tools) = request.tools {
            if !tools.is_empty() {
                let fn_decls: Vec<serde_json::Value> = tools
                    .iter()
                    .map(|t| {
                        serde_json::json!({
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        })
                    })
                    .collect();
                body.insert(
                    "tools".into(),
                    serde_json::json!([{ "functionDeclarations": fn_decls }]),
                );
            }
        }

        serde_json::Value::Object(body)
    }
}

#[async_trait]
impl ModelProvider for GoogleProvider {
    fn provider_name(&self) -> &str {
        "google"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn stream_text(&self, request: &ProviderRequest) -> Result<DeltaStream, AgentError> {
        let body = self.build_request_body(request);
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url.trim_end_matches('/'),
            self.model_id
        );

        debug!(model = %self.model_id, "Google stream_text");

        let resp = shared_client()
            .post(&url)
            .headers(self.headers())
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let byte_stream = resp.bytes_stream();

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
                        Ok(deltas) => {
                            for delta in deltas {
                                yield Ok(delta);
                            }
                        }
                        Err(message) => {
                            warn!(%message, "Gemini stream failed");
                            yield Ok(TextStreamDelta::error(message));
                            return;
                        }
                    }
                }
                if drained {
                    break;
                }
            }

            yield Ok(TextStreamDelta::done(state.finish_reason, state.usage));
        };

        Ok(Box::pin(stream))
    }
}

/// Finish reason and usage carried across SSE chunks.
#[derive(Default)]
struct ChunkState {
    finish_reason: Option<FinishReason>,
    usage: Option<Usage>,
}

impl ChunkState {
    /// Fold one chunk in. An error object or an unreadable chunk is `Err(message)`.
    fn apply(&mut self, data: &str) -> Result<Vec<TextStreamDelta>, String> {
        let chunk = serde_json::from_str::<GeminiResponse>(data)
            .map_err(|e| format!("malformed Gemini chunk: {e}"))?;
        if let Some(error) = chunk.error {
            return Err(error.describe());
        }
        if let Some(u) = chunk.usage_metadata {
            self.usage = Some(u.into());
        }
        if chunk
            .prompt_feedback
            .as_ref()
            .is_some_and(|f| f.block_reason.is_some())
        {
            self.finish_reason = Some(FinishReason::ContentFilter);
        }
        Ok(candidate_deltas(chunk.candidates, &mut self.finish_reason))
    }
}

fn candidate_deltas(
    candidates: Vec<GeminiCandidate>,
    finish_reason: &mut Option<FinishReason>,
) -> Vec<TextStreamDelta> {
    let mut deltas = Vec::new();
    let Some(candidate) = candidates.into_iter().next() else {
        return deltas;
    };
    for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
        if let Some(text) = part.text.filter(|t| !t.is_empty()) {
            deltas.push(TextStreamDelta::text(text));
        }
        if let Some(fc) = part.function_call {
            deltas.push(TextStreamDelta::tool_call(ToolCall {
                id: uuid::Uuid::new_v4().to_string(),
                name: fc.name,
                arguments: fc
                    .args
                    .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
            }));
        }
    }
    if let Some(reason) = candidate.finish_reason.as_deref() {
        *finish_reason = Some(parse_finish_reason(reason));
    }
    deltas
}

fn parse_finish_reason(s: &str) -> FinishReason {
    match s {
        "STOP" => FinishReason::Stop,
        "MAX_TOKENS" => FinishReason::Length,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" => {
            FinishReason::ContentFilter
        }
        _ => FinishReason::Error,
    }
}

fn content_to_gemini(content: &Content) -> serde_json::Value {
    let role = match content.role {
        Role::User => "user",
        Role::Agent => "model",
        Role::Tool => "function",
    };
    let parts: Vec<serde_json::Value> = content
        .parts
        .iter()
        .map(|part| match part {
            Part::Text { text } => serde_json::json!({ "text": text }),
            Part::FunctionCall(call) => serde_json::json!({
                "functionCall": { "name": call.name, "args": call.arguments }
            }),
            Part::FunctionResponse(resp) => serde_json::json!({
                "functionResponse": { "name": resp.name, "response": resp.response }
            }),
        })
        .collect();
    serde_json::json!({ "role": role, "parts": parts })
}

// Internal Gemini response types

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
    prompt_feedback: Option<GeminiPromptFeedback>,
    error: Option<StreamErrorBody>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Deserialize)]
struct GeminiFunctionCall {
    name: String,
    args: Option<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

impl From<GeminiUsage> for Usage {
    fn from(u: GeminiUsage) -> Self {
        Usage {
            input_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        }
    }
}
