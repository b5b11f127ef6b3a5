use crate::config::Config;

use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged turn of the conversation sent to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTurn {
    pub role: Role,
    pub content: String,
}

impl PromptTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

const FIX_EXAMPLE_DIFF: &str = "\
diff --git a/src/parser.rs b/src/parser.rs
--- a/src/parser.rs
+++ b/src/parser.rs
@@ -10,7 +10,7 @@ fn parse_header(input: &str) -> Option<Header> {
-    let end = input.find(':').unwrap();
+    let end = input.find(':')?;";

const FEAT_EXAMPLE_DIFF: &str = "\
diff --git a/src/cli.rs b/src/cli.rs
--- a/src/cli.rs
+++ b/src/cli.rs
@@ -4,6 +4,9 @@ pub struct Args {
+    /// Print the result as JSON
+    #[arg(long)]
+    pub json: bool,";

fn system_prompt(config: &Config) -> String {
    let mut prompt = format!(
        "You are an assistant that writes git commit messages following the \
         Conventional Commits specification.\n\
         Read the staged diff sent by the user and reply with the commit message only, \
         no explanations and no code fences.\n\
         The subject line has the form `<type>(<optional scope>): <summary>`, uses the \
         imperative mood and stays under 72 characters.\n\
         Valid types: feat, fix, docs, style, refactor, perf, test, build, ci, chore, revert.\n\
         Write the message in the language identified by `{}`.",
        config.language
    );

    if config.emoji {
        prompt.push_str(
            "\nStart the subject with one gitmoji that matches the type, e.g. \
             `🐛 fix:` or `✨ feat:`.",
        );
    }

    if config.description {
        prompt.push_str(
            "\nAfter the subject add a short body of one to three lines explaining what \
             changed and why.",
        );
    } else {
        prompt.push_str("\nReply with the subject line only.");
    }

    prompt
}

fn example_answer(config: &Config, subject: &str, emoji: &str, body: &str) -> String {
    let subject = if config.emoji {
        format!("{emoji} {subject}")
    } else {
        subject.to_string()
    };
    if config.description {
        format!("{subject}\n\n{body}")
    } else {
        subject
    }
}

/// The fixed preamble that precedes the diff in every request
pub fn preamble(config: &Config) -> Vec<PromptTurn> {
    let turns = vec![
        PromptTurn::new(Role::System, system_prompt(config)),
        PromptTurn::new(Role::User, FIX_EXAMPLE_DIFF),
        PromptTurn::new(
            Role::Assistant,
            example_answer(
                config,
                "fix(parser): return None on headers without a colon",
                "🐛",
                "Parsing no longer panics on malformed headers.",
            ),
        ),
        PromptTurn::new(Role::User, FEAT_EXAMPLE_DIFF),
        PromptTurn::new(
            Role::Assistant,
            example_answer(
                config,
                "feat(cli): add --json output flag",
                "✨",
                "Lets scripts consume the result without scraping text.",
            ),
        ),
    ];
    debug!("Built prompt preamble with {} turns", turns.len());
    turns
}

/// Append the final user turn carrying the staged diff
pub fn with_diff(mut turns: Vec<PromptTurn>, diff: &str) -> Vec<PromptTurn> {
    turns.push(PromptTurn::new(Role::User, diff));
    turns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preamble_starts_with_system_turn() {
        let turns = preamble(&Config::default());
        assert_eq!(turns[0].role, Role::System);
        assert!(turns[0].content.contains("en-US"));
        assert!(turns[0].content.contains("subject line only"));
    }

    #[test]
    fn test_examples_alternate_user_and_assistant() {
        let turns = preamble(&Config::default());
        let roles: Vec<Role> = turns.iter().skip(1).map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
    }

    #[test]
    fn test_emoji_and_description_shape_examples() {
        let config = Config {
            emoji: true,
            description: true,
            language: "pt-BR".to_string(),
            ..Config::default()
        };
        let turns = preamble(&config);
        assert!(turns[0].content.contains("gitmoji"));
        assert!(turns[0].content.contains("pt-BR"));
        assert!(turns[2].content.starts_with("🐛 fix(parser)"));
        assert!(turns[2].content.contains("\n\n"));
    }

    #[test]
    fn test_diff_is_the_last_user_turn() {
        let turns = with_diff(preamble(&Config::default()), "");
        let last = turns.last().expect("turns should not be empty");
        assert_eq!(last.role, Role::User);
        assert_eq!(last.content, "");
    }
}
