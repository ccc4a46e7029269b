mod tool;
pub mod visualization;

pub use tool::{FunctionDescriptor, LlmTool, ToolDescriptor};
