use crate::git::is_inside_work_tree;

use anyhow::{Context, Result, anyhow};
use git2::Config as GitConfig;
use log::debug;
use std::fmt;
use std::time::Duration;

/// Section used for every key this tool reads from or writes to git config
const CONFIG_SECTION: &str = "lattes";

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_LANGUAGE: &str = "en-US";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_TOKENS: u32 = 196;

/// Get a configuration value with layered priority: env var > local git config > global git config
fn get_layered_value(
    key: &str,
    env_var: Option<&str>,
    local_config: Option<&GitConfig>,
    global_config: Option<&GitConfig>,
) -> Option<String> {
    if let Some(env) = env_var
        && let Ok(val) = std::env::var(env)
    {
        return Some(val);
    }

    if let Some(local) = local_config
        && let Ok(val) = local.get_string(key)
    {
        return Some(val);
    }

    if let Some(global) = global_config
        && let Ok(val) = global.get_string(key)
    {
        return Some(val);
    }

    None
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" | "" => Ok(false),
        other => Err(anyhow!("Invalid boolean for {key}: {other}")),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse::<T>()
        .with_context(|| format!("Invalid number for {key}: {value}"))
}

fn key(name: &str) -> String {
    format!("{CONFIG_SECTION}.{name}")
}

/// Settings for the interactive review loop
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewSettings {
    /// Interval between spinner frames while waiting for the model
    pub tick_rate: Duration,
    /// Maximum number of characters the draft buffer accepts
    pub char_limit: usize,
    /// Height of the draft pane before a commit resizes it
    pub draft_height: u16,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            tick_rate: Duration::from_millis(100),
            char_limit: 5000,
            draft_height: 6,
        }
    }
}

/// Configuration structure
#[derive(Clone, Debug)]
pub struct Config {
    /// API key for the completion provider
    pub api_key: String,
    /// Model used for generation
    pub model: String,
    /// Language the commit message is written in
    pub language: String,
    /// Prefix the subject with an emoji
    pub emoji: bool,
    /// Add a body describing the change below the subject
    pub description: bool,
    /// Upper bound for one generation request
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub review: ReviewSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            emoji: false,
            description: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: 0.0,
            top_p: 0.1,
            review: ReviewSettings::default(),
        }
    }
}

/// Values given on the command line; `None` keeps the loaded value
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub language: Option<String>,
    pub emoji: Option<bool>,
    pub description: Option<bool>,
    pub timeout_secs: Option<u64>,
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.api_key.is_none()
            && self.model.is_none()
            && self.language.is_none()
            && self.emoji.is_none()
            && self.description.is_none()
            && self.timeout_secs.is_none()
    }

    /// Save the given values to the global git config
    pub fn save(&self) -> Result<()> {
        let mut config = GitConfig::open_default()?;
        self.save_to_config(&mut config, true)?;
        debug!("Configuration saved to global git config");
        Ok(())
    }

    /// Save the given values to the repository's local git config, never
    /// including the API key
    pub fn save_as_project_config(&self) -> Result<()> {
        let repo = git2::Repository::discover(".")?;
        let mut config = repo.config()?;
        self.save_to_config(&mut config, false)?;
        debug!("Project configuration saved to local git config");
        Ok(())
    }

    /// Write each value that was given under the `lattes` section of `config`.
    ///
    /// Values left as `None` are not touched, so settings that only came from
    /// the environment never end up in a file.
    pub fn save_to_config(&self, config: &mut GitConfig, include_api_key: bool) -> Result<()> {
        if include_api_key && let Some(api_key) = &self.api_key {
            config.set_str(&key("apikey"), api_key)?;
        }
        if let Some(model) = &self.model {
            config.set_str(&key("model"), model)?;
        }
        if let Some(language) = &self.language {
            config.set_str(&key("language"), language)?;
        }
        if let Some(emoji) = self.emoji {
            config.set_bool(&key("emoji"), emoji)?;
        }
        if let Some(description) = self.description {
            config.set_bool(&key("description"), description)?;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.set_i64(
                &key("timeout"),
                i64::try_from(timeout_secs).context("Timeout exceeds i64 range")?,
            )?;
        }
        Ok(())
    }
}

impl Config {
    /// Load the configuration with layered priority: env > local git > global git
    pub fn load() -> Result<Self> {
        let global_config = GitConfig::open_default().ok();
        let local_config = git2::Repository::discover(".")
            .ok()
            .and_then(|repo| repo.config().ok());

        Self::from_lookup(|key, env| {
            get_layered_value(key, env, local_config.as_ref(), global_config.as_ref())
        })
    }

    /// Build a configuration from a key lookup.
    ///
    /// `lookup` receives the git config key and the environment variable that
    /// may override it, and returns the winning raw value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str, Option<&str>) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(api_key) = lookup(&key("apikey"), Some("OPENAI_API_KEY")) {
            config.api_key = api_key.trim().to_string();
        }
        if let Some(model) = lookup(&key("model"), Some("LATTES_MODEL"))
            && !model.trim().is_empty()
        {
            config.model = model.trim().to_string();
        }
        if let Some(language) = lookup(&key("language"), Some("LATTES_LANGUAGE"))
            && !language.trim().is_empty()
        {
            config.language = language.trim().to_string();
        }
        if let Some(emoji) = lookup(&key("emoji"), Some("LATTES_EMOJI")) {
            config.emoji = parse_bool(&key("emoji"), &emoji)?;
        }
        if let Some(description) = lookup(&key("description"), Some("LATTES_DESCRIPTION")) {
            config.description = parse_bool(&key("description"), &description)?;
        }
        if let Some(timeout) = lookup(&key("timeout"), Some("LATTES_TIMEOUT")) {
            config.timeout_secs = parse_number(&key("timeout"), &timeout)?;
        }
        if let Some(max_tokens) = lookup(&key("maxtokens"), None) {
            config.max_tokens = parse_number(&key("maxtokens"), &max_tokens)?;
        }

        debug!("Configuration loaded: {config}");
        Ok(config)
    }

    /// Apply command-line values on top of the loaded ones
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(api_key) = overrides.api_key {
            self.api_key = api_key;
        }
        if let Some(model) = overrides.model {
            self.model = model;
        }
        if let Some(language) = overrides.language {
            self.language = language;
        }
        if let Some(emoji) = overrides.emoji {
            self.emoji = emoji;
        }
        if let Some(description) = overrides.description {
            self.description = description;
        }
        if let Some(timeout_secs) = overrides.timeout_secs {
            self.timeout_secs = timeout_secs;
        }
        debug!("Configuration updated: {self}");
    }

    /// Fail unless an API key is available
    pub fn require_api_key(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(anyhow!("`OPENAI_API_KEY` env var not set"));
        }
        Ok(())
    }

    /// Check the environment for necessary prerequisites
    pub fn check_environment(&self) -> Result<()> {
        if !is_inside_work_tree() {
            return Err(anyhow!(
                "Not in a Git repository. Please run this command from within a Git repository."
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The API key with everything but the last four characters hidden
    #[must_use]
    pub fn masked_api_key(&self) -> String {
        let count = self.api_key.chars().count();
        if count == 0 {
            return "(not set)".to_string();
        }
        if count <= 4 {
            return "*".repeat(count);
        }
        let tail: String = self.api_key.chars().skip(count - 4).collect();
        format!("{}{tail}", "*".repeat(count - 4))
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "api key:     {}", self.masked_api_key())?;
        writeln!(f, "model:       {}", self.model)?;
        writeln!(f, "language:    {}", self.language)?;
        writeln!(f, "emoji:       {}", self.emoji)?;
        writeln!(f, "description: {}", self.description)?;
        writeln!(f, "timeout:     {}s", self.timeout_secs)?;
        write!(f, "max tokens:  {}", self.max_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(
        values: &[(&'static str, &'static str)],
    ) -> impl Fn(&str, Option<&str>) -> Option<String> {
        let map: HashMap<&str, &str> = values.iter().copied().collect();
        move |key: &str, env: Option<&str>| {
            env.and_then(|env| map.get(env))
                .or_else(|| map.get(key))
                .map(|v| (*v).to_string())
        }
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = Config::from_lookup(lookup_from(&[])).expect("empty lookup should load");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.language, DEFAULT_LANGUAGE);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert!(!config.emoji);
        assert!(config.require_api_key().is_err());
    }

    #[test]
    fn test_env_takes_precedence_over_git_key() {
        let config = Config::from_lookup(lookup_from(&[
            ("lattes.model", "from-git"),
            ("LATTES_MODEL", "from-env"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .expect("config should load");
        assert_eq!(config.model, "from-env");
        assert!(config.require_api_key().is_ok());
    }

    #[test]
    fn test_invalid_boolean_names_the_key() {
        let err = Config::from_lookup(lookup_from(&[("lattes.emoji", "maybe")]))
            .expect_err("invalid boolean should fail");
        assert!(err.to_string().contains("lattes.emoji"));
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("lattes.timeout", "soon")]))
            .expect_err("invalid timeout should fail");
        assert!(err.to_string().contains("lattes.timeout"));
    }

    #[test]
    fn test_masked_api_key() {
        let mut config = Config::default();
        assert_eq!(config.masked_api_key(), "(not set)");
        config.api_key = "abc".to_string();
        assert_eq!(config.masked_api_key(), "***");
        config.api_key = "sk-123456".to_string();
        assert_eq!(config.masked_api_key(), "*****3456");
    }

    #[test]
    fn test_overrides_replace_only_given_values() {
        let mut config = Config::default();
        config.apply(ConfigOverrides {
            model: Some("gpt-4o-mini".to_string()),
            emoji: Some(true),
            ..Default::default()
        });
        assert_eq!(config.model, "gpt-4o-mini");
        assert!(config.emoji);
        assert_eq!(config.language, DEFAULT_LANGUAGE);
    }
}
