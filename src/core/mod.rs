pub mod llm;
pub mod message;
pub mod prompt;
