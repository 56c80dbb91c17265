//! Turn whatever the model replied with into a well-formed [`CommitRecord`].
//!
//! Normalization is total. A reply is tried, in order, as a JSON object
//! (possibly fenced or wrapped in prose), as a conventional `type(scope):
//! subject` line with bullet points, and finally taken verbatim as the subject
//! of a `chore` commit.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use super::message::{CommitRecord, CommitType, MAX_SUBJECT_LENGTH};
use crate::llm::json::{locate_object, strip_code_fences};

/// Subject used when a reply has no usable text at all.
pub const PLACEHOLDER_SUBJECT: &str = "update files";

static CONVENTIONAL_LINE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(feat|fix|docs|style|refactor|perf|test|build|ci|chore|revert)(?:\(([^)]*)\))?!?:\s*(.*)$",
    )
    .ok()
});

/// A normalized record, tagged with the path that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedCommit {
    /// Parsed from a JSON object and repaired.
    Structured(CommitRecord),
    /// Recovered from a conventional-commit text line.
    Heuristic(CommitRecord),
    /// Nothing recognizable; first line used as a `chore` subject.
    LastResort(CommitRecord),
}

impl NormalizedCommit {
    pub fn record(&self) -> &CommitRecord {
        match self {
            NormalizedCommit::Structured(r)
            | NormalizedCommit::Heuristic(r)
            | NormalizedCommit::LastResort(r) => r,
        }
    }

    pub fn into_record(self) -> CommitRecord {
        match self {
            NormalizedCommit::Structured(r)
            | NormalizedCommit::Heuristic(r)
            | NormalizedCommit::LastResort(r) => r,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            NormalizedCommit::Structured(_) => "structured",
            NormalizedCommit::Heuristic(_) => "heuristic",
            NormalizedCommit::LastResort(_) => "last-resort",
        }
    }
}

/// Normalize a raw model reply. Never fails.
pub fn normalize(raw: &str) -> NormalizedCommit {
    let text = strip_code_fences(raw);

    let normalized = if let Some(record) = parse_structured(text) {
        NormalizedCommit::Structured(record)
    } else if let Some(record) = parse_conventional_text(text) {
        NormalizedCommit::Heuristic(record)
    } else {
        NormalizedCommit::LastResort(last_resort(text))
    };

    debug!(
        "Normalized model reply via {} path: {}",
        normalized.path(),
        normalized.record().title()
    );
    normalized
}

/// Collapse every run of whitespace, newlines included, into one space.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Flatten to one line, lower-case, cap at the subject limit and drop
/// trailing periods.
///
/// Returns `None` when nothing is left, which callers treat as a missing
/// subject.
pub fn clean_subject(subject: &str) -> Option<String> {
    let lowered = single_line(subject).to_lowercase();
    let capped: String = lowered.chars().take(MAX_SUBJECT_LENGTH).collect();
    let cleaned = capped
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace())
        .trim_start();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

fn parse_structured(text: &str) -> Option<CommitRecord> {
    let span = locate_object(text)?;
    let value: Value = serde_json::from_str(span).ok()?;
    let object = value.as_object()?;

    let raw_type = object.get("type")?.as_str()?;
    let subject = clean_subject(object.get("subject")?.as_str()?)?;

    // From here on the object is repaired, never rejected.
    let commit_type = CommitType::from_loose(raw_type).unwrap_or(CommitType::Chore);
    Some(CommitRecord {
        commit_type,
        scope: repair_scope(object),
        subject,
        body: repair_body(object),
    })
}

fn repair_scope(object: &Map<String, Value>) -> Option<String> {
    object
        .get("scope")
        .and_then(Value::as_str)
        .map(single_line)
        .filter(|s| !s.is_empty())
}

fn repair_body(object: &Map<String, Value>) -> Vec<String> {
    let items: Vec<&str> = match object.get("body") {
        Some(Value::String(single)) => vec![single.as_str()],
        Some(Value::Array(values)) => values.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };

    items
        .into_iter()
        .map(single_line)
        .filter(|item| !item.is_empty())
        .collect()
}

fn parse_conventional_text(text: &str) -> Option<CommitRecord> {
    let re = CONVENTIONAL_LINE.as_ref()?;
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    let caps = re.captures(lines.next()?)?;
    let commit_type = caps.get(1)?.as_str().parse().ok()?;
    let subject = clean_subject(caps.get(3).map_or("", |m| m.as_str()))?;
    let scope = caps
        .get(2)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(String::from);

    let body = lines
        .filter_map(|line| line.strip_prefix('-').or_else(|| line.strip_prefix('*')))
        .map(single_line)
        .filter(|item| !item.is_empty())
        .collect();

    Some(CommitRecord {
        commit_type,
        scope,
        subject,
        body,
    })
}

fn last_resort(text: &str) -> CommitRecord {
    let subject = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .and_then(clean_subject)
        .unwrap_or_else(|| PLACEHOLDER_SUBJECT.to_string());

    CommitRecord {
        commit_type: CommitType::Chore,
        scope: None,
        subject,
        body: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_json_object() {
        let raw = r#"{"type": "fix", "scope": "auth", "subject": "handle null token", "body": ["guard against empty header"]}"#;
        let normalized = normalize(raw);
        assert!(matches!(normalized, NormalizedCommit::Structured(_)));
        let record = normalized.into_record();
        assert_eq!(record.commit_type, CommitType::Fix);
        assert_eq!(record.scope.as_deref(), Some("auth"));
        assert_eq!(record.subject, "handle null token");
        assert_eq!(record.body, vec!["guard against empty header"]);
    }

    #[test]
    fn test_synonym_type_is_remapped() {
        let record = normalize(r#"{"type":"feature","subject":"x"}"#).into_record();
        assert_eq!(record.commit_type, CommitType::Feat);
        assert_eq!(record.subject, "x");
        assert!(record.scope.is_none());
        assert!(record.body.is_empty());
    }

    #[test]
    fn test_unknown_type_defaults_to_chore() {
        let record = normalize(r#"{"type":"banana","subject":"peel it"}"#).into_record();
        assert_eq!(record.commit_type, CommitType::Chore);
    }

    #[test]
    fn test_fenced_json_with_prose() {
        let raw = "Sure! Here you go:\n```json\n{\"type\": \"docs\", \"subject\": \"Fix Typo.\"}\n```";
        let normalized = normalize(raw);
        assert_eq!(normalized.path(), "structured");
        assert_eq!(normalized.record().subject, "fix typo");
    }

    #[test]
    fn test_subject_is_lowercased_truncated_and_unpunctuated() {
        let long = "A".repeat(80);
        let raw = format!(r#"{{"type":"feat","subject":"{long}"}}"#);
        let record = normalize(&raw).into_record();
        assert_eq!(record.subject, "a".repeat(50));

        let record = normalize(r#"{"type":"feat","subject":"Add Login."}"#).into_record();
        assert_eq!(record.subject, "add login");
    }

    #[test]
    fn test_repeated_trailing_periods_are_dropped() {
        let record = normalize(r#"{"type":"fix","subject":"Handle token.. "}"#).into_record();
        assert_eq!(record.subject, "handle token");

        let record = normalize(r#"{"type":"fix","subject":"handle token. ."}"#).into_record();
        assert_eq!(record.subject, "handle token");
    }

    #[test]
    fn test_embedded_newlines_are_flattened() {
        let raw = r#"{"type":"fix","scope":"auth\nlayer","subject":"handle token\n\nmore detail","body":["a\nb"]}"#;
        let record = normalize(raw).into_record();
        assert_eq!(record.subject, "handle token more detail");
        assert_eq!(record.scope.as_deref(), Some("auth layer"));
        assert_eq!(
            record.format(),
            "fix(auth layer): handle token more detail\n\n- a b"
        );
    }

    #[test]
    fn test_single_line_fence_keeps_commit_type() {
        let normalized = normalize("```feat: add login```");
        assert_eq!(normalized.path(), "heuristic");
        let record = normalized.into_record();
        assert_eq!(record.commit_type, CommitType::Feat);
        assert_eq!(record.subject, "add login");
    }

    #[test]
    fn test_body_repairs() {
        let record =
            normalize(r#"{"type":"fix","subject":"x","body":"  one line  "}"#).into_record();
        assert_eq!(record.body, vec!["one line"]);

        let record = normalize(r#"{"type":"fix","subject":"x","body":42}"#).into_record();
        assert!(record.body.is_empty());

        let record =
            normalize(r#"{"type":"fix","subject":"x","body":["a", 1, "  ", null, " b "]}"#)
                .into_record();
        assert_eq!(record.body, vec!["a", "b"]);
    }

    #[test]
    fn test_non_string_scope_dropped() {
        let record = normalize(r#"{"type":"fix","scope":["api"],"subject":"x"}"#).into_record();
        assert!(record.scope.is_none());

        let record = normalize(r#"{"type":"fix","scope":"  ","subject":"x"}"#).into_record();
        assert!(record.scope.is_none());
    }

    #[test]
    fn test_missing_subject_falls_through_to_text() {
        let normalized = normalize(r#"{"type":"fix"}"#);
        assert!(matches!(normalized, NormalizedCommit::LastResort(_)));
        assert_eq!(normalized.record().subject, r#"{"type":"fix"}"#);
    }

    #[test]
    fn test_non_string_type_falls_through() {
        let normalized = normalize(r#"{"type": 3, "subject": "x"}"#);
        assert!(!matches!(normalized, NormalizedCommit::Structured(_)));
    }

    #[test]
    fn test_conventional_text_fallback() {
        let normalized = normalize("feat(auth): add login\n- step one\n- step two");
        assert!(matches!(normalized, NormalizedCommit::Heuristic(_)));
        let record = normalized.into_record();
        assert_eq!(record.commit_type, CommitType::Feat);
        assert_eq!(record.scope.as_deref(), Some("auth"));
        assert_eq!(record.subject, "add login");
        assert_eq!(record.body, vec!["step one", "step two"]);
    }

    #[test]
    fn test_conventional_text_is_case_insensitive_and_skips_prose_lines() {
        let record =
            normalize("\n\nFIX: Resolve crash\nsome explanation\n* guard input\n").into_record();
        assert_eq!(record.commit_type, CommitType::Fix);
        assert!(record.scope.is_none());
        assert_eq!(record.subject, "resolve crash");
        assert_eq!(record.body, vec!["guard input"]);
    }

    #[test]
    fn test_breaking_marker_accepted() {
        let record = normalize("refactor(api)!: drop v1 routes").into_record();
        assert_eq!(record.commit_type, CommitType::Refactor);
        assert_eq!(record.subject, "drop v1 routes");
    }

    #[test]
    fn test_last_resort() {
        let normalized = normalize("no structure here at all");
        assert!(matches!(normalized, NormalizedCommit::LastResort(_)));
        let record = normalized.into_record();
        assert_eq!(record.commit_type, CommitType::Chore);
        assert_eq!(record.subject, "no structure here at all");
        assert!(record.body.is_empty());
    }

    #[test]
    fn test_empty_reply_uses_placeholder() {
        for raw in ["", "   \n\t", "```\n```", "."] {
            let record = normalize(raw).into_record();
            assert_eq!(record.commit_type, CommitType::Chore);
            assert_eq!(record.subject, PLACEHOLDER_SUBJECT, "input: {raw:?}");
        }
    }

    #[test]
    fn test_totality_over_odd_inputs() {
        let inputs = [
            "{",
            "}{",
            "{\"type\": null, \"subject\": null}",
            "[1, 2, 3]",
            "feat:",
            "feat(): ",
            "\u{1b}[31mred text\u{1b}[0m",
            "日本語のコミットメッセージ",
        ];
        for raw in inputs {
            let record = normalize(raw).into_record();
            assert!(!record.subject.is_empty(), "input: {raw:?}");
            assert!(record.subject.chars().count() <= MAX_SUBJECT_LENGTH);
            assert!(CommitType::ALL.contains(&record.commit_type));
        }
    }
}
