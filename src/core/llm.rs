use crate::config::Config;
use crate::core::prompt::{self, PromptTurn, Role};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use llm::{
    LLMProvider,
    builder::{LLMBackend, LLMBuilder},
    chat::ChatMessage,
};
use log::debug;
use std::time::Duration;

/// Produces a commit message for a staged diff.
///
/// Each call is a single request: no retries, one text or one error.
#[async_trait]
pub trait MessageGenerator: Send + Sync {
    async fn generate(&self, diff: &str) -> Result<String>;
}

/// Split role-tagged turns into the provider system prompt and the chat history
pub fn split_turns(turns: &[PromptTurn]) -> (String, Vec<ChatMessage>) {
    let mut system = Vec::new();
    let mut messages = Vec::new();

    for turn in turns {
        match turn.role {
            Role::System => system.push(turn.content.as_str()),
            Role::User => messages.push(ChatMessage::user().content(turn.content.clone()).build()),
            Role::Assistant => {
                messages.push(ChatMessage::assistant().content(turn.content.clone()).build());
            }
        }
    }

    (system.join("\n\n"), messages)
}

/// Generator backed by an OpenAI chat model through the `llm` crate
pub struct LlmGenerator {
    provider: Box<dyn LLMProvider>,
    preamble: Vec<ChatMessage>,
    timeout: Duration,
}

impl LlmGenerator {
    pub fn new(config: &Config) -> Result<Self> {
        config.require_api_key()?;

        let (system, preamble) = split_turns(&prompt::preamble(config));

        debug!("Building provider for model: {}", config.model);
        let provider = LLMBuilder::new()
            .backend(LLMBackend::OpenAI)
            .api_key(config.api_key.clone())
            .model(config.model.clone())
            .system(system)
            .temperature(config.temperature)
            .top_p(config.top_p)
            .max_tokens(config.max_tokens)
            .build()
            .map_err(|e| anyhow!("Failed to build provider: {e}"))?;

        Ok(Self {
            provider,
            preamble,
            timeout: config.generation_timeout(),
        })
    }
}

#[async_trait]
impl MessageGenerator for LlmGenerator {
    async fn generate(&self, diff: &str) -> Result<String> {
        debug!("Requesting commit message for {} bytes of diff", diff.len());

        let mut messages = self.preamble.clone();
        messages.push(ChatMessage::user().content(diff.to_string()).build());

        match tokio::time::timeout(self.timeout, self.provider.chat(&messages)).await {
            Ok(Ok(response)) => {
                debug!("Received response from provider");
                response
                    .text()
                    .filter(|text| !text.trim().is_empty())
                    .ok_or_else(|| anyhow!("Provider returned an empty response"))
            }
            Ok(Err(e)) => {
                debug!("Provider error: {e}");
                Err(anyhow!("Provider error: {e}"))
            }
            Err(_) => {
                debug!("Provider timed out");
                Err(anyhow!(
                    "Provider timed out after {}s",
                    self.timeout.as_secs()
                ))
            }
        }
    }
}

/// Generator that never leaves the machine, for exercising the review UI
pub struct DryRunGenerator {
    delay: Duration,
}

impl Default for DryRunGenerator {
    fn default() -> Self {
        Self::new(Duration::from_millis(1500))
    }
}

impl DryRunGenerator {
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl MessageGenerator for DryRunGenerator {
    async fn generate(&self, diff: &str) -> Result<String> {
        tokio::time::sleep(self.delay).await;

        let files = diff
            .lines()
            .filter(|line| line.starts_with("diff --git "))
            .count();
        let noun = if files == 1 { "file" } else { "files" };

        Ok(format!(
            "chore: update {files} staged {noun}\n\n\
             Drafted in dry-run mode, no request was sent to the provider."
        ))
    }
}
