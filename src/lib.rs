pub mod cli;
pub mod config;
pub mod core;
pub mod git;
pub mod logger;
pub mod tui;

// Re-export important structs and functions for easier testing
pub use config::{Config, ConfigOverrides, ReviewSettings};
pub use crate::core::llm::{DryRunGenerator, LlmGenerator, MessageGenerator};
pub use crate::core::message::normalize_draft;
pub use git::{BridgeError, GitCli, VcsBridge};
pub use tui::{Outcome, ReviewSession, run_review};
