//! Prompt construction for model-generated commit messages.

use std::fmt::Write;

use super::message::{CommitType, MAX_SUBJECT_LENGTH};
use crate::git::StagedFile;

/// Build the fixed system instruction: rules, commit types, output schema
/// and worked examples.
pub fn build_system_prompt() -> String {
    let types: String = CommitType::ALL
        .iter()
        .map(|t| format!("- {}: {}\n", t.as_str(), t.description()))
        .collect();

    format!(
        r#"You are an expert software engineer writing Git commit messages that follow the Conventional Commits specification.

## Rules
- Pick exactly one type from the list below.
- Scope is optional: the primary module or area affected (e.g. files in `src/auth/` give scope `auth`). Use null when no single area fits.
- Subject: imperative mood ("add", "fix", "remove"), lowercase, no period at the end, at most {max} characters.
- Body: a list of short bullet points describing the notable changes. Use an empty list for trivial changes.
- Describe only what the diff shows. Do not invent changes.

## Commit types
{types}
## Output format
Respond with ONLY a JSON object (no markdown, no explanation) matching this schema:
{{"type": "<one of the types above>", "scope": "<string or null>", "subject": "<string>", "body": ["<string>", ...]}}

## Examples
{{"type": "feat", "scope": "auth", "subject": "add two-factor login", "body": ["add totp verification step", "store recovery codes hashed"]}}
{{"type": "fix", "scope": "parser", "subject": "handle empty input", "body": ["return early when the buffer is empty"]}}
{{"type": "docs", "scope": null, "subject": "fix typo in readme", "body": []}}"#,
        max = MAX_SUBJECT_LENGTH,
    )
}

/// Build the per-request instruction from the analyzed files, the diff
/// statistics and an already-summarized diff.
pub fn build_user_prompt(files: &[StagedFile], stats: &str, diff: &str) -> String {
    let mut files_section = String::new();
    for file in files {
        let _ = writeln!(files_section, "- {} ({})", file.path, file.status);
    }

    format!(
        "Generate a commit message for these staged changes.\n\n\
         ## Files ({count})\n{files_section}\n\
         ## Stats\n{stats}\n\n\
         ## Diff\n```diff\n{diff}\n```",
        count = files.len(),
        stats = sanitize(stats.trim_end()),
        diff = sanitize(diff.trim_end()),
    )
}

/// Remove ANSI escape sequences and control characters other than newline
/// and tab.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            // CSI sequence: ESC [ params final-byte
            if chars.peek() == Some(&'[') {
                chars.next();
                for next in chars.by_ref() {
                    if ('\u{40}'..='\u{7e}').contains(&next) {
                        break;
                    }
                }
            }
            continue;
        }
        if c.is_control() && c != '\n' && c != '\t' {
            continue;
        }
        out.push(c);
    }

    out
}
