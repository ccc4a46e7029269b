//! A tool-using conversational agent.
//!
//! An [`Agent`] pairs an [`LlmBroker`] with a fixed instruction list and a set of
//! tools. Each prompt is answered independently: the conversation is the system
//! instructions followed by the prompt, passed through unchanged.

use crate::error::Result;
use crate::llm::gateway::CompletionConfig;
use crate::llm::models::LlmMessage;
use crate::llm::tools::LlmTool;
use crate::llm::LlmBroker;
use futures::stream::StreamExt;
use std::io::Write;
use tracing::debug;

const MARKDOWN_INSTRUCTION: &str = "Use markdown to format your answers.";

pub struct Agent {
    broker: LlmBroker,
    instructions: Vec<String>,
    tools: Vec<Box<dyn LlmTool>>,
    markdown: bool,
    config: Option<CompletionConfig>,
}

impl Agent {
    pub fn builder(broker: LlmBroker) -> AgentBuilder {
        AgentBuilder::new(broker)
    }

    pub fn instructions(&self) -> &[String] {
        &self.instructions
    }

    pub fn tools(&self) -> &[Box<dyn LlmTool>] {
        &self.tools
    }

    /// The system prompt: one instruction per line, plus the markdown hint if enabled.
    pub fn system_prompt(&self) -> Option<String> {
        let mut lines: Vec<&str> = self.instructions.iter().map(String::as_str).collect();
        if self.markdown {
            lines.push(MARKDOWN_INSTRUCTION);
        }
        (!lines.is_empty()).then(|| lines.join("\n"))
    }

    fn messages(&self, prompt: &str) -> Vec<LlmMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.system_prompt() {
            messages.push(LlmMessage::system(system));
        }
        messages.push(LlmMessage::user(prompt));
        messages
    }

    fn tool_slice(&self) -> Option<&[Box<dyn LlmTool>]> {
        (!self.tools.is_empty()).then_some(self.tools.as_slice())
    }

    /// Answer a prompt, running any tools the model asks for.
    pub async fn run(&self, prompt: &str) -> Result<String> {
        debug!(tools = self.tools.len(), "Running agent prompt");
        let messages = self.messages(prompt);
        self.broker.generate(&messages, self.tool_slice(), self.config.clone()).await
    }

    /// Answer a prompt and write the response to `out`, chunk by chunk when streaming.
    ///
    /// Returns the full response text.
    pub async fn write_response<W: Write>(&self, prompt: &str, stream: bool, out: &mut W) -> Result<String> {
        if !stream {
            let response = self.run(prompt).await?;
            writeln!(out, "{}", response)?;
            return Ok(response);
        }

        let messages = self.messages(prompt);
        let mut chunks = self.broker.generate_stream(&messages, self.tool_slice(), self.config.clone());
        let mut response = String::new();

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            write!(out, "{}", chunk)?;
            out.flush()?;
            response.push_str(&chunk);
        }
        writeln!(out)?;

        Ok(response)
    }

    /// Answer a prompt, printing the response to stdout.
    pub async fn print_response(&self, prompt: &str, stream: bool) -> Result<String> {
        self.write_response(prompt, stream, &mut std::io::stdout()).await
    }
}

pub struct AgentBuilder {
    broker: LlmBroker,
    instructions: Vec<String>,
    tools: Vec<Box<dyn LlmTool>>,
    markdown: bool,
    config: Option<CompletionConfig>,
}

impl AgentBuilder {
    fn new(broker: LlmBroker) -> Self {
        Self {
            broker,
            instructions: Vec::new(),
            tools: Vec::new(),
            markdown: false,
            config: None,
        }
    }

    pub fn instructions<I, S>(mut self, instructions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instructions.extend(instructions.into_iter().map(Into::into));
        self
    }

    pub fn tools(mut self, tools: Vec<Box<dyn LlmTool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn markdown(mut self, markdown: bool) -> Self {
        self.markdown = markdown;
        self
    }

    pub fn completion_config(mut self, config: CompletionConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Agent {
        Agent {
            broker: self.broker,
            instructions: self.instructions,
            tools: self.tools,
            markdown: self.markdown,
            config: self.config,
        }
    }
}
