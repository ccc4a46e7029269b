//! Error types and result aliases for the vizagent library.
//!
//! This module defines the core error type [`VizAgentError`] and the [`Result`] type alias
//! used throughout the library. All public APIs that can fail return `Result<T>` for
//! consistent error handling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VizAgentError {
    #[error("LLM gateway error: {0}")]
    GatewayError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Tool error: {0}")]
    ToolError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    #[error("Invalid chart data: {0}")]
    DataError(String),
}

pub type Result<T> = std::result::Result<T, VizAgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_display() {
        let err = VizAgentError::GatewayError("connection failed".to_string());
        assert_eq!(err.to_string(), "LLM gateway error: connection failed");
    }

    #[test]
    fn test_unknown_capability_display() {
        let err = VizAgentError::UnknownCapability("create_3d_plot".to_string());
        assert_eq!(err.to_string(), "Unknown capability: create_3d_plot");
    }

    #[test]
    fn test_data_error_display() {
        let err = VizAgentError::DataError("expected a number".to_string());
        assert_eq!(err.to_string(), "Invalid chart data: expected a number");
    }

    #[test]
    fn test_api_error_display() {
        let err = VizAgentError::ApiError("429 Too Many Requests".to_string());
        assert_eq!(err.to_string(), "API error: 429 Too Many Requests");
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: VizAgentError = json_err.into();

        match err {
            VizAgentError::SerializationError(_) => {}
            _ => panic!("Expected SerializationError"),
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: VizAgentError = io_err.into();

        match err {
            VizAgentError::IoError(_) => {}
            _ => panic!("Expected IoError"),
        }
    }
}
