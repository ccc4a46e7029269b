use crate::error::{Result, VizAgentError};
use crate::llm::gateway::{CompletionConfig, LlmGateway, StreamChunk};
use crate::llm::models::{LlmMessage, LlmToolCall};
use crate::llm::tools::LlmTool;
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_MAX_TOOL_ROUNDS: usize = 16;

/// Main interface for LLM interactions
///
/// The broker owns the model binding and drives the tool-call loop: when the model
/// asks for tools, matching tools are executed, their output is appended to the
/// conversation and the model is called again.
#[derive(Clone)]
pub struct LlmBroker {
    model: String,
    gateway: Arc<dyn LlmGateway>,
    max_tool_rounds: usize,
}

impl LlmBroker {
    /// Create a new LLM broker
    pub fn new(model: impl Into<String>, gateway: Arc<dyn LlmGateway>) -> Self {
        Self {
            model: model.into(),
            gateway,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    /// Limit how many consecutive tool-call rounds a single request may take
    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate text response from LLM
    pub async fn generate(
        &self,
        messages: &[LlmMessage],
        tools: Option<&[Box<dyn LlmTool>]>,
        config: Option<CompletionConfig>,
    ) -> Result<String> {
        let config = config.unwrap_or_default();
        let mut current_messages = messages.to_vec();

        for round in 0..=self.max_tool_rounds {
            let response =
                self.gateway.complete(&self.model, &current_messages, tools, &config).await?;

            let tools = match tools {
                Some(tools) if !response.tool_calls.is_empty() => tools,
                _ => return Ok(response.content.unwrap_or_default()),
            };

            if round == self.max_tool_rounds {
                break;
            }

            info!("Tool calls requested: {}", response.tool_calls.len());
            current_messages.push(LlmMessage::assistant_tool_calls(
                response.content.clone(),
                response.tool_calls.clone(),
            ));
            execute_tool_calls(&response.tool_calls, tools, &mut current_messages)?;
        }

        Err(VizAgentError::ToolError(format!(
            "Exceeded {} tool-call rounds without a final answer",
            self.max_tool_rounds
        )))
    }

    /// Generate streaming text response from LLM
    ///
    /// Content chunks are yielded as they arrive. When tool calls are detected, the
    /// broker executes them and streams the model's follow-up response.
    pub fn generate_stream<'a>(
        &'a self,
        messages: &'a [LlmMessage],
        tools: Option<&'a [Box<dyn LlmTool>]>,
        config: Option<CompletionConfig>,
    ) -> Pin<Box<dyn Stream<Item = Result<String>> + 'a>> {
        let config = config.unwrap_or_default();

        Box::pin(async_stream::stream! {
            let mut current_messages = messages.to_vec();

            for round in 0..=self.max_tool_rounds {
                let mut accumulated_content = String::new();
                let mut accumulated_tool_calls = Vec::new();

                {
                    let mut stream = self.gateway.complete_stream(
                        &self.model,
                        &current_messages,
                        tools,
                        &config,
                    );

                    while let Some(chunk_result) = stream.next().await {
                        match chunk_result {
                            Ok(StreamChunk::Content(content)) => {
                                accumulated_content.push_str(&content);
                                yield Ok(content);
                            }
                            Ok(StreamChunk::ToolCalls(tool_calls)) => {
                                accumulated_tool_calls = tool_calls;
                            }
                            Err(e) => {
                                yield Err(e);
                                return;
                            }
                        }
                    }
                }

                if accumulated_tool_calls.is_empty() {
                    return;
                }

                let tools = match tools {
                    Some(tools) => tools,
                    None => {
                        warn!("LLM requested tool calls but no tools provided");
                        return;
                    }
                };

                if round == self.max_tool_rounds {
                    break;
                }

                info!("Processing {} tool call(s) in stream", accumulated_tool_calls.len());
                let content = (!accumulated_content.is_empty()).then_some(accumulated_content);
                current_messages.push(LlmMessage::assistant_tool_calls(
                    content,
                    accumulated_tool_calls.clone(),
                ));

                if let Err(e) = execute_tool_calls(&accumulated_tool_calls, tools, &mut current_messages) {
                    warn!("Tool execution failed: {}", e);
                    yield Err(e);
                    return;
                }
            }

            yield Err(VizAgentError::ToolError(format!(
                "Exceeded {} tool-call rounds without a final answer",
                self.max_tool_rounds
            )));
        })
    }
}

/// Run each requested tool and append its output as a tool message
fn execute_tool_calls(
    tool_calls: &[LlmToolCall],
    tools: &[Box<dyn LlmTool>],
    messages: &mut Vec<LlmMessage>,
) -> Result<()> {
    for tool_call in tool_calls {
        match tools.iter().find(|t| t.matches(&tool_call.name)) {
            Some(tool) => {
                info!("Executing tool: {}", tool_call.name);
                let output = tool.run(&tool_call.arguments)?;
                messages.push(LlmMessage::tool_result(tool_call, serde_json::to_string(&output)?));
            }
            None => {
                warn!("Tool not found: {}", tool_call.name);
                let output = serde_json::json!({
                    "status": "error",
                    "error": format!("Tool '{}' is not available", tool_call.name)
                });
                messages.push(LlmMessage::tool_result(tool_call, output.to_string()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::gateway::ChunkStream;
    use crate::llm::models::{LlmGatewayResponse, MessageRole};
    use crate::llm::tools::ToolDescriptor;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct ScriptedGateway {
        responses: Vec<LlmGatewayResponse>,
        streams: Vec<Vec<StreamChunk>>,
        call_count: Mutex<usize>,
        seen: Mutex<Vec<Vec<LlmMessage>>>,
    }

    impl ScriptedGateway {
        fn new(responses: Vec<LlmGatewayResponse>) -> Self {
            Self::with_streams(responses, vec![])
        }

        fn with_streams(responses: Vec<LlmGatewayResponse>, streams: Vec<Vec<StreamChunk>>) -> Self {
            Self {
                responses,
                streams,
                call_count: Mutex::new(0),
                seen: Mutex::new(vec![]),
            }
        }

        fn next_index(&self, messages: &[LlmMessage]) -> usize {
            self.seen.lock().unwrap().push(messages.to_vec());
            let mut count = self.call_count.lock().unwrap();
            let idx = *count;
            *count += 1;
            idx
        }
    }

    #[async_trait::async_trait]
    impl LlmGateway for ScriptedGateway {
        async fn complete(
            &self,
            _model: &str,
            messages: &[LlmMessage],
            _tools: Option<&[Box<dyn LlmTool>]>,
            _config: &CompletionConfig,
        ) -> Result<LlmGatewayResponse> {
            let idx = self.next_index(messages);
            Ok(self.responses.get(idx).cloned().unwrap_or(LlmGatewayResponse {
                content: Some("default response".to_string()),
                tool_calls: vec![],
            }))
        }

        fn complete_stream<'a>(
            &'a self,
            _model: &'a str,
            messages: &'a [LlmMessage],
            _tools: Option<&'a [Box<dyn LlmTool>]>,
            _config: &'a CompletionConfig,
        ) -> ChunkStream<'a> {
            let idx = self.next_index(messages);
            let chunks = self.streams.get(idx).cloned().unwrap_or_default();
            Box::pin(futures::stream::iter(chunks.into_iter().map(Ok)))
        }

        async fn get_available_models(&self) -> Result<Vec<String>> {
            Ok(vec!["test-model".to_string()])
        }
    }

    struct RecordingTool {
        name: String,
        calls: Arc<Mutex<usize>>,
    }

    impl LlmTool for RecordingTool {
        fn run(&self, _args: &HashMap<String, Value>) -> Result<Value> {
            *self.calls.lock().unwrap() += 1;
            Ok(serde_json::json!({"status": "success"}))
        }

        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor::function(self.name.clone(), "A recording tool", serde_json::json!({}))
        }
    }

    fn tool_call(name: &str) -> LlmToolCall {
        LlmToolCall {
            id: Some(format!("call_{}", name)),
            name: name.to_string(),
            arguments: HashMap::new(),
        }
    }

    fn recording_tools(name: &str) -> (Vec<Box<dyn LlmTool>>, Arc<Mutex<usize>>) {
        let calls = Arc::new(Mutex::new(0));
        let tool = RecordingTool {
            name: name.to_string(),
            calls: Arc::clone(&calls),
        };
        (vec![Box::new(tool)], calls)
    }

    #[tokio::test]
    async fn test_generate_simple_response() {
        let gateway = Arc::new(ScriptedGateway::new(vec![LlmGatewayResponse {
            content: Some("Hello, World!".to_string()),
            tool_calls: vec![],
        }]));
        let broker = LlmBroker::new("test-model", gateway);

        let result = broker.generate(&[LlmMessage::user("Hi")], None, None).await.unwrap();

        assert_eq!(result, "Hello, World!");
        assert_eq!(broker.model(), "test-model");
    }

    #[tokio::test]
    async fn test_generate_executes_every_requested_tool() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            LlmGatewayResponse {
                content: None,
                tool_calls: vec![tool_call("create_bar_chart"), tool_call("create_bar_chart")],
            },
            LlmGatewayResponse {
                content: Some("Both charts are ready".to_string()),
                tool_calls: vec![],
            },
        ]));
        let broker = LlmBroker::new("test-model", gateway.clone());
        let (tools, calls) = recording_tools("create_bar_chart");

        let result =
            broker.generate(&[LlmMessage::user("Chart it")], Some(&tools), None).await.unwrap();

        assert_eq!(result, "Both charts are ready");
        assert_eq!(*calls.lock().unwrap(), 2);

        let seen = gateway.seen.lock().unwrap();
        let follow_up = &seen[1];
        assert_eq!(follow_up.len(), 4);
        assert_eq!(follow_up[1].role, MessageRole::Assistant);
        assert_eq!(follow_up[2].role, MessageRole::Tool);
        assert_eq!(follow_up[3].role, MessageRole::Tool);
    }

    #[tokio::test]
    async fn test_generate_reports_missing_tool_to_model() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            LlmGatewayResponse {
                content: None,
                tool_calls: vec![tool_call("create_heatmap")],
            },
            LlmGatewayResponse {
                content: Some("Heatmaps are not available".to_string()),
                tool_calls: vec![],
            },
        ]));
        let broker = LlmBroker::new("test-model", gateway.clone());
        let (tools, calls) = recording_tools("create_bar_chart");

        let result =
            broker.generate(&[LlmMessage::user("Heatmap")], Some(&tools), None).await.unwrap();

        assert_eq!(result, "Heatmaps are not available");
        assert_eq!(*calls.lock().unwrap(), 0);
        let seen = gateway.seen.lock().unwrap();
        let tool_msg = seen[1].last().unwrap();
        assert!(tool_msg.content.as_deref().unwrap().contains("not available"));
    }

    #[tokio::test]
    async fn test_generate_with_tool_call_no_tools_provided() {
        let gateway = Arc::new(ScriptedGateway::new(vec![LlmGatewayResponse {
            content: Some("fallback".to_string()),
            tool_calls: vec![tool_call("create_bar_chart")],
        }]));
        let broker = LlmBroker::new("test-model", gateway);

        let result = broker.generate(&[LlmMessage::user("Chart")], None, None).await.unwrap();

        assert_eq!(result, "fallback");
    }

    #[tokio::test]
    async fn test_generate_stops_after_max_tool_rounds() {
        let looping = LlmGatewayResponse {
            content: None,
            tool_calls: vec![tool_call("create_bar_chart")],
        };
        let gateway = Arc::new(ScriptedGateway::new(vec![looping.clone(), looping.clone(), looping]));
        let broker = LlmBroker::new("test-model", gateway.clone()).with_max_tool_rounds(1);
        let (tools, calls) = recording_tools("create_bar_chart");

        let result = broker.generate(&[LlmMessage::user("Loop")], Some(&tools), None).await;

        assert!(matches!(result, Err(VizAgentError::ToolError(_))));
        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(*gateway.call_count.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_generate_with_zero_tool_rounds_runs_no_tools() {
        let gateway = Arc::new(ScriptedGateway::new(vec![LlmGatewayResponse {
            content: None,
            tool_calls: vec![tool_call("create_bar_chart")],
        }]));
        let broker = LlmBroker::new("test-model", gateway).with_max_tool_rounds(0);
        let (tools, calls) = recording_tools("create_bar_chart");

        let result = broker.generate(&[LlmMessage::user("Chart")], Some(&tools), None).await;

        assert!(matches!(result, Err(VizAgentError::ToolError(_))));
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_generate_stream_stops_after_max_tool_rounds() {
        let looping = vec![StreamChunk::ToolCalls(vec![tool_call("create_histogram")])];
        let gateway = Arc::new(ScriptedGateway::with_streams(
            vec![],
            vec![looping.clone(), looping.clone(), looping],
        ));
        let broker = LlmBroker::new("test-model", gateway).with_max_tool_rounds(2);
        let (tools, calls) = recording_tools("create_histogram");

        let messages = vec![LlmMessage::user("Loop")];
        let mut stream = broker.generate_stream(&messages, Some(&tools), None);

        let mut errors = 0;
        while let Some(chunk) = stream.next().await {
            if let Err(e) = chunk {
                assert!(matches!(e, VizAgentError::ToolError(_)));
                errors += 1;
            }
        }

        assert_eq!(errors, 1);
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_generate_stream_with_tool_calls() {
        let gateway = Arc::new(ScriptedGateway::with_streams(
            vec![],
            vec![
                vec![
                    StreamChunk::Content("Rendering ".to_string()),
                    StreamChunk::ToolCalls(vec![tool_call("create_pie_chart")]),
                ],
                vec![
                    StreamChunk::Content("Pie chart ".to_string()),
                    StreamChunk::Content("saved".to_string()),
                ],
            ],
        ));
        let broker = LlmBroker::new("test-model", gateway);
        let (tools, calls) = recording_tools("create_pie_chart");

        let messages = vec![LlmMessage::user("Market share")];
        let mut stream = broker.generate_stream(&messages, Some(&tools), None);

        let mut result = String::new();
        while let Some(chunk) = stream.next().await {
            result.push_str(&chunk.unwrap());
        }

        assert_eq!(result, "Rendering Pie chart saved");
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_generate_stream_without_tools() {
        let gateway = Arc::new(ScriptedGateway::with_streams(
            vec![],
            vec![vec![
                StreamChunk::Content("Simple ".to_string()),
                StreamChunk::Content("stream".to_string()),
            ]],
        ));
        let broker = LlmBroker::new("test-model", gateway);

        let messages = vec![LlmMessage::user("Test")];
        let mut stream = broker.generate_stream(&messages, None, None);

        let mut result = String::new();
        while let Some(chunk) = stream.next().await {
            result.push_str(&chunk.unwrap());
        }

        assert_eq!(result, "Simple stream");
    }
}
