use anyhow::Result;
use lattes::cli::generate_message;
use lattes::core::prompt::{Role, preamble, with_diff};
use lattes::{Config, DryRunGenerator, GitCli};
use std::time::Duration;

use test_utils::{RecordingBridge, setup_git_repo, stage_file};

#[tokio::test]
async fn test_generated_message_is_normalized() -> Result<()> {
    let bridge = RecordingBridge {
        diff: "diff --git a/src/main.rs b/src/main.rs\n+fn main() {}\n".to_string(),
        ..RecordingBridge::default()
    };
    let generator = DryRunGenerator::new(Duration::ZERO);

    let message = generate_message(&bridge, &generator).await?;
    assert_eq!(
        message,
        "chore: update 1 staged file\nDrafted in dry-run mode, no request was sent to the provider."
    );
    assert_eq!(bridge.calls.borrow().as_slice(), ["diff"]);
    Ok(())
}

#[tokio::test]
async fn test_generation_reads_the_real_staged_diff() -> Result<()> {
    let (temp_dir, repo) = setup_git_repo()?;
    stage_file(&repo, "one.txt", "1\n")?;
    stage_file(&repo, "two.txt", "2\n")?;

    let bridge = GitCli::new().with_workdir(temp_dir.path());
    let message = generate_message(&bridge, &DryRunGenerator::new(Duration::ZERO)).await?;
    assert!(message.starts_with("chore: update 2 staged files"));
    Ok(())
}

#[test]
fn test_request_ends_with_the_diff() {
    let config = Config {
        emoji: true,
        ..Config::default()
    };
    let turns = with_diff(preamble(&config), "diff --git a/x b/x");

    assert_eq!(turns.first().map(|t| t.role), Some(Role::System));
    let last = turns.last().expect("request has turns");
    assert_eq!(last.role, Role::User);
    assert_eq!(last.content, "diff --git a/x b/x");
}

#[cfg(feature = "integration")]
mod live {
    use lattes::{Config, LlmGenerator, MessageGenerator};

    #[tokio::test]
    async fn test_openai_generates_a_subject() -> anyhow::Result<()> {
        let config = Config::load()?;
        let generator = LlmGenerator::new(&config)?;

        let diff = "diff --git a/README.md b/README.md\n\
                    --- a/README.md\n+++ b/README.md\n\
                    @@ -1 +1 @@\n-# Lattes\n+# Lattes, commit messages reviewed\n";
        let message = generator.generate(diff).await?;

        assert!(!message.trim().is_empty());
        Ok(())
    }
}
