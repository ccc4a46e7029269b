//! # vizagent
//!
//! Chart-generation tools for LLM agents.
//!
//! A [`VisualizationTools`](llm::tools::visualization::VisualizationTools) toolkit
//! exposes one tool per enabled chart type. An [`Agent`](agent::Agent) hands those
//! tools to an [`LlmBroker`](llm::LlmBroker), which runs the tool-call loop against
//! an OpenAI-compatible gateway.
//!
//! ```ignore
//! use vizagent::prelude::*;
//! use std::sync::Arc;
//!
//! let toolkit = VisualizationTools::new(
//!     VisualizationConfig::builder().all().output_dir("business_charts").build(),
//! )?;
//! let agent = Agent::builder(LlmBroker::new("gpt-4o", Arc::new(OpenAIGateway::new())))
//!     .instructions(["You are a data visualization expert."])
//!     .tools(toolkit.tools())
//!     .markdown(true)
//!     .build();
//!
//! agent.print_response("Create a bar chart of Q4 sales: Oct 42k, Nov 38k, Dec 45k", true).await?;
//! ```

pub mod agent;
pub mod demo;
pub mod error;
pub mod llm;

pub use error::{Result, VizAgentError};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::agent::Agent;
    pub use crate::error::{Result, VizAgentError};
    pub use crate::llm::gateways::OpenAIGateway;
    pub use crate::llm::tools::visualization::{
        CapabilitySet, ChartCapability, VisualizationConfig, VisualizationTools,
    };
    pub use crate::llm::tools::{FunctionDescriptor, LlmTool, ToolDescriptor};
    pub use crate::llm::{CompletionConfig, LlmBroker, LlmGateway, LlmMessage, MessageRole};
}
