use crate::config::{Config, ConfigOverrides};
use crate::core::llm::{DryRunGenerator, LlmGenerator, MessageGenerator};
use crate::core::message::normalize_draft;
use crate::git::{GitCli, VcsBridge};
use crate::logger;
use crate::tui::run_review;

use anyhow::{Result, bail};
use clap::builder::{Styles, styling::AnsiColor};
use clap::{Args, Parser, Subcommand, crate_version};
use colored::Colorize;
use log::debug;
use std::sync::Arc;

/// CLI structure defining the available commands and global arguments
#[derive(Parser)]
#[command(
    author,
    version = crate_version!(),
    about = "Lattes: review and commit AI-generated commit messages",
    args_conflicts_with_subcommands = true,
    styles = get_styles(),
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Lattes>,

    /// Options for the default `commit` command
    #[command(flatten)]
    pub commit: CommitArgs,

    /// Log debug messages to a file
    #[arg(
        short = 'l',
        long = "log",
        global = true,
        help = "Log debug messages to a file"
    )]
    pub log: bool,

    /// Specify a custom log file path
    #[arg(
        long = "log-file",
        global = true,
        help = "Specify a custom log file path"
    )]
    pub log_file: Option<String>,
}

#[derive(Subcommand)]
pub enum Lattes {
    /// Generate a commit message for the staged changes, review it and commit
    #[command(
        about = "Generate, review and commit a message for the staged changes",
        long_about = "Generate a commit message from `git diff --staged`, then accept (enter), \
                      edit (space), open it in $EDITOR (ctrl+e) or cancel (esc) before committing."
    )]
    Commit(CommitArgs),

    /// Show or change the saved configuration
    #[command(about = "Show or change the saved configuration")]
    Config(ConfigArgs),
}

#[derive(Args, Clone, Debug, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct CommitArgs {
    /// Override the configured model
    #[arg(long, help = "Override the configured model")]
    pub model: Option<String>,

    /// Override the language of the message (e.g. en-US, pt-BR)
    #[arg(long, help = "Override the language of the message (e.g. en-US, pt-BR)")]
    pub language: Option<String>,

    /// Start the subject with a gitmoji
    #[arg(long, help = "Start the subject with a gitmoji")]
    pub emoji: bool,

    /// Add a short body below the subject
    #[arg(long, help = "Add a short body below the subject")]
    pub description: bool,

    /// Generation timeout in seconds
    #[arg(long, value_name = "SECS", help = "Generation timeout in seconds")]
    pub timeout: Option<u64>,

    /// Print the generated message to stdout and exit
    #[arg(short, long, help = "Print the generated message to stdout and exit")]
    pub print: bool,

    /// Dry run mode: do not make real HTTP requests, for UI testing
    #[arg(
        long,
        help = "Dry run mode: do not make real HTTP requests, for UI testing"
    )]
    pub dry_run: bool,
}

impl CommitArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_key: None,
            model: self.model.clone(),
            language: self.language.clone(),
            emoji: self.emoji.then_some(true),
            description: self.description.then_some(true),
            timeout_secs: self.timeout,
        }
    }
}

#[derive(Args, Clone, Debug, Default)]
pub struct ConfigArgs {
    /// API key for the provider
    #[arg(long, help = "API key for the provider")]
    pub api_key: Option<String>,

    /// Default model
    #[arg(long, help = "Default model")]
    pub model: Option<String>,

    /// Default message language
    #[arg(long, help = "Default message language")]
    pub language: Option<String>,

    /// Prefix subjects with a gitmoji
    #[arg(long, value_name = "BOOL", help = "Prefix subjects with a gitmoji")]
    pub emoji: Option<bool>,

    /// Add a body below the subject
    #[arg(long, value_name = "BOOL", help = "Add a body below the subject")]
    pub description: Option<bool>,

    /// Generation timeout in seconds
    #[arg(long, value_name = "SECS", help = "Generation timeout in seconds")]
    pub timeout: Option<u64>,

    /// Save to the repository's git config instead of the global one
    #[arg(
        long,
        help = "Save to the repository's git config instead of the global one (API keys are never saved there)"
    )]
    pub local: bool,
}

impl ConfigArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            language: self.language.clone(),
            emoji: self.emoji,
            description: self.description,
            timeout_secs: self.timeout,
        }
    }
}

/// Define custom styles for Clap
fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Magenta.on_default().bold())
        .usage(AnsiColor::Cyan.on_default().bold())
        .literal(AnsiColor::Green.on_default().bold())
        .placeholder(AnsiColor::Yellow.on_default())
        .valid(AnsiColor::Blue.on_default().bold())
        .invalid(AnsiColor::Red.on_default().bold())
        .error(AnsiColor::Red.on_default().bold())
}

/// Main function to parse arguments and handle the command
pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.log {
        logger::init(cli.log_file.as_deref())?;
    }

    match cli.command {
        Some(Lattes::Commit(args)) => handle_commit(args).await,
        Some(Lattes::Config(args)) => handle_config(&args),
        None => handle_commit(cli.commit).await,
    }
}

/// Handle the `commit` command
pub async fn handle_commit(args: CommitArgs) -> Result<()> {
    debug!("Handling 'commit' command with args: {args:?}");

    let mut config = Config::load()?;
    config.apply(args.overrides());
    config.check_environment()?;

    let generator: Arc<dyn MessageGenerator> = if args.dry_run {
        Arc::new(DryRunGenerator::default())
    } else {
        Arc::new(LlmGenerator::new(&config)?)
    };
    let bridge = GitCli::new();

    if args.print {
        println!("{}", generate_message(&bridge, generator.as_ref()).await?);
        return Ok(());
    }

    let outcome = run_review(bridge, generator, &config.review).await?;
    debug!("Review finished with outcome {outcome:?}");
    Ok(())
}

/// Generate a normalized message for the staged changes without any UI
pub async fn generate_message(
    bridge: &impl VcsBridge,
    generator: &dyn MessageGenerator,
) -> Result<String> {
    let diff = bridge.fetch_diff()?;
    let message = generator.generate(&diff).await?;
    Ok(normalize_draft(&message))
}

/// Handle the `config` command
pub fn handle_config(args: &ConfigArgs) -> Result<()> {
    debug!("Handling 'config' command with local: {}", args.local);

    let mut config = Config::load()?;
    let overrides = args.overrides();

    if overrides.is_empty() {
        println!("{config}");
        return Ok(());
    }

    if args.local && overrides.api_key.is_some() {
        bail!("API keys are never stored in a project configuration; drop --local to save it");
    }

    if args.local {
        config.check_environment()?;
        overrides.save_as_project_config()?;
        println!("{}", "Project configuration saved".green().bold());
    } else {
        overrides.save()?;
        println!("{}", "Configuration saved".green().bold());
    }
    config.apply(overrides);
    println!("{config}");
    Ok(())
}
