//! OpenAI Gateway for LLM interactions.
//!
//! This module provides a gateway for OpenAI-compatible chat completion APIs,
//! with tool calling and server-sent-event streaming.

use crate::error::{Result, VizAgentError};
use crate::llm::gateway::{ChunkStream, CompletionConfig, LlmGateway, StreamChunk};
use crate::llm::gateways::openai_messages_adapter::{
    adapt_messages_to_openai, convert_tool_calls, parse_arguments,
};
use crate::llm::models::{LlmGatewayResponse, LlmMessage, LlmToolCall};
use crate::llm::tools::LlmTool;
use async_trait::async_trait;
use futures::stream::StreamExt;
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Configuration for connecting to OpenAI API.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Option<std::time::Duration>,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            base_url: std::env::var("OPENAI_API_ENDPOINT")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            timeout: None,
        }
    }
}

/// Gateway for OpenAI LLM service.
pub struct OpenAIGateway {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIGateway {
    /// Create a new OpenAI gateway with default configuration.
    pub fn new() -> Self {
        Self::with_config(OpenAIConfig::default())
    }

    /// Create a new OpenAI gateway with custom configuration.
    pub fn with_config(config: OpenAIConfig) -> Self {
        let mut client_builder = Client::builder();

        if let Some(timeout) = config.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        let client = client_builder.build().unwrap_or_default();

        Self { client, config }
    }

    /// Create gateway with custom API key and base URL.
    pub fn with_api_key_and_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self::with_config(OpenAIConfig {
            api_key: api_key.into(),
            base_url: base_url.into(),
            ..Default::default()
        })
    }

    fn request_body(
        &self,
        model: &str,
        messages: &[LlmMessage],
        tools: Option<&[Box<dyn LlmTool>]>,
        config: &CompletionConfig,
        stream: bool,
    ) -> Result<Value> {
        let mut body = serde_json::json!({
            "model": model,
            "messages": adapt_messages_to_openai(messages)?,
            "temperature": config.temperature,
            "max_tokens": config.max_tokens,
        });

        if stream {
            body["stream"] = Value::Bool(true);
        }

        // An empty tools array is rejected by the API
        if let Some(tools) = tools.filter(|t| !t.is_empty()) {
            let tool_defs: Vec<_> = tools.iter().map(|t| t.descriptor()).collect();
            body["tools"] = serde_json::to_value(tool_defs)?;
        }

        Ok(body)
    }

    async fn post_chat(&self, body: &Value) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VizAgentError::ApiError(format!(
                "OpenAI API error: {} - {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

impl Default for OpenAIGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmGateway for OpenAIGateway {
    async fn complete(
        &self,
        model: &str,
        messages: &[LlmMessage],
        tools: Option<&[Box<dyn LlmTool>]>,
        config: &CompletionConfig,
    ) -> Result<LlmGatewayResponse> {
        info!("Delegating to OpenAI for completion");
        debug!("Model: {}, Message count: {}", model, messages.len());

        let body = self.request_body(model, messages, tools, config, false)?;
        let response_body: Value = self.post_chat(&body).await?.json().await?;

        let message = &response_body["choices"][0]["message"];
        let content = message["content"].as_str().map(String::from);
        let tool_calls = message["tool_calls"]
            .as_array()
            .map(|calls| convert_tool_calls(calls))
            .unwrap_or_default();

        Ok(LlmGatewayResponse {
            content,
            tool_calls,
        })
    }

    fn complete_stream<'a>(
        &'a self,
        model: &'a str,
        messages: &'a [LlmMessage],
        tools: Option<&'a [Box<dyn LlmTool>]>,
        config: &'a CompletionConfig,
    ) -> ChunkStream<'a> {
        Box::pin(async_stream::stream! {
            info!("Starting OpenAI streaming completion");
            debug!("Model: {}, Message count: {}", model, messages.len());

            let body = match self.request_body(model, messages, tools, config, true) {
                Ok(body) => body,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            let response = match self.post_chat(&body).await {
                Ok(r) => r,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            let mut stream = response.bytes_stream();
            let mut decoder = SseDecoder::default();

            while let Some(chunk_result) = stream.next().await {
                match chunk_result {
                    Ok(bytes) => {
                        for chunk in decoder.feed(&bytes) {
                            yield Ok(chunk);
                        }
                    }
                    Err(e) => {
                        yield Err(e.into());
                        return;
                    }
                }
            }

            if let Some(chunk) = decoder.finish() {
                yield Ok(chunk);
            }
        })
    }

    async fn get_available_models(&self) -> Result<Vec<String>> {
        debug!("Fetching available OpenAI models");

        let response = self
            .client
            .get(format!("{}/models", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VizAgentError::ApiError(format!(
                "Failed to get models: {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;

        let mut models = body["data"]
            .as_array()
            .ok_or_else(|| VizAgentError::GatewayError("Invalid response format".to_string()))?
            .iter()
            .filter_map(|m| m["id"].as_str().map(String::from))
            .collect::<Vec<_>>();

        models.sort();
        Ok(models)
    }
}

/// Accumulator for one streamed tool call.
#[derive(Default)]
struct ToolCallAccumulator {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

/// Incremental decoder for the chat-completions SSE stream.
///
/// Content deltas are emitted immediately; tool-call fragments are accumulated by
/// index and emitted as one `ToolCalls` chunk when the model finishes.
#[derive(Default)]
struct SseDecoder {
    buffer: Vec<u8>,
    tool_calls: BTreeMap<usize, ToolCallAccumulator>,
}

impl SseDecoder {
    fn feed(&mut self, bytes: &[u8]) -> Vec<StreamChunk> {
        self.buffer.extend_from_slice(bytes);
        let mut chunks = Vec::new();

        // Split on whole lines so multi-byte characters never straddle a decode
        while let Some(line_end) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&raw);
            let Some(data) = line.trim().strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();

            if data == "[DONE]" {
                chunks.extend(self.finish());
                continue;
            }

            match serde_json::from_str::<Value>(data) {
                Ok(json) => self.apply(&json, &mut chunks),
                Err(e) => warn!("Failed to parse streaming chunk: {}", e),
            }
        }

        chunks
    }

    fn apply(&mut self, json: &Value, chunks: &mut Vec<StreamChunk>) {
        let Some(choice) = json["choices"].as_array().and_then(|c| c.first()) else {
            return;
        };
        let delta = &choice["delta"];

        if let Some(content) = delta["content"].as_str().filter(|c| !c.is_empty()) {
            chunks.push(StreamChunk::Content(content.to_string()));
        }

        for tc in delta["tool_calls"].as_array().into_iter().flatten() {
            let Some(index) = tc["index"].as_u64() else {
                continue;
            };
            let acc = self.tool_calls.entry(index as usize).or_default();
            if let Some(id) = tc["id"].as_str() {
                acc.id = Some(id.to_string());
            }
            if let Some(name) = tc["function"]["name"].as_str() {
                acc.name = Some(name.to_string());
            }
            if let Some(args) = tc["function"]["arguments"].as_str() {
                acc.arguments.push_str(args);
            }
        }

        if choice["finish_reason"].as_str() == Some("tool_calls") {
            chunks.extend(self.finish());
        }
    }

    /// Emit any accumulated tool calls, leaving the decoder empty.
    fn finish(&mut self) -> Option<StreamChunk> {
        let calls: Vec<LlmToolCall> = std::mem::take(&mut self.tool_calls)
            .into_values()
            .filter_map(|acc| {
                let name = acc.name?;
                Some(LlmToolCall {
                    id: acc.id,
                    arguments: parse_arguments(&name, &acc.arguments),
                    name,
                })
            })
            .collect();

        (!calls.is_empty()).then_some(StreamChunk::ToolCalls(calls))
    }
}
