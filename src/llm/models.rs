use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Message role in LLM conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

/// Tool call requested by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmToolCall {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub arguments: HashMap<String, serde_json::Value>,
}

/// Message in LLM conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmMessage {
    #[serde(default = "default_role")]
    pub role: MessageRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<LlmToolCall>>,
}

fn default_role() -> MessageRole {
    MessageRole::User
}

/// Response from LLM gateway
#[derive(Debug, Clone, Default)]
pub struct LlmGatewayResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<LlmToolCall>,
}

impl LlmMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::User, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::System, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::Assistant, content)
    }

    /// Assistant turn that carries the tool calls it requested
    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<LlmToolCall>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content,
            tool_calls: Some(tool_calls),
        }
    }

    /// Tool result answering a single tool call
    pub fn tool_result(tool_call: &LlmToolCall, output: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Tool,
            content: Some(output.into()),
            tool_calls: Some(vec![tool_call.clone()]),
        }
    }

    fn with_role(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_serialization() {
        assert_eq!(serde_json::to_string(&MessageRole::System).unwrap(), "\"system\"");
        assert_eq!(serde_json::to_string(&MessageRole::Tool).unwrap(), "\"tool\"");
    }

    #[test]
    fn test_system_message() {
        let msg = LlmMessage::system("You are a data visualization expert");
        assert_eq!(msg.role, MessageRole::System);
        assert_eq!(msg.content.as_deref(), Some("You are a data visualization expert"));
        assert!(msg.tool_calls.is_none());
    }

    #[test]
    fn test_tool_result_message() {
        let call = LlmToolCall {
            id: Some("call_9".to_string()),
            name: "create_pie_chart".to_string(),
            arguments: HashMap::new(),
        };

        let msg = LlmMessage::tool_result(&call, "{\"status\":\"success\"}");

        assert_eq!(msg.role, MessageRole::Tool);
        assert_eq!(msg.tool_calls.unwrap()[0].id.as_deref(), Some("call_9"));
    }

    #[test]
    fn test_llm_tool_call_without_id() {
        let tool_call = LlmToolCall {
            id: None,
            name: "create_histogram".to_string(),
            arguments: HashMap::new(),
        };

        let json = serde_json::to_string(&tool_call).unwrap();
        assert!(!json.contains("\"id\""));
        assert!(json.contains("create_histogram"));
    }

    #[test]
    fn test_llm_message_default_role() {
        let msg: LlmMessage = serde_json::from_str(r#"{"content":"chart this"}"#).unwrap();
        assert_eq!(msg.role, MessageRole::User);
    }
}
