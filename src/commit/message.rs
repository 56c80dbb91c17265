//! Conventional commit records and their rendering as commit message text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Maximum subject length in characters.
pub const MAX_SUBJECT_LENGTH: usize = 50;

/// Conventional commit types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitType {
    Feat,
    Fix,
    Docs,
    Style,
    Refactor,
    Perf,
    Test,
    Build,
    Ci,
    Chore,
    Revert,
}

impl CommitType {
    pub const ALL: [CommitType; 11] = [
        CommitType::Feat,
        CommitType::Fix,
        CommitType::Docs,
        CommitType::Style,
        CommitType::Refactor,
        CommitType::Perf,
        CommitType::Test,
        CommitType::Build,
        CommitType::Ci,
        CommitType::Chore,
        CommitType::Revert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommitType::Feat => "feat",
            CommitType::Fix => "fix",
            CommitType::Docs => "docs",
            CommitType::Style => "style",
            CommitType::Refactor => "refactor",
            CommitType::Perf => "perf",
            CommitType::Test => "test",
            CommitType::Build => "build",
            CommitType::Ci => "ci",
            CommitType::Chore => "chore",
            CommitType::Revert => "revert",
        }
    }

    /// One-line meaning, used when listing the types in the prompt.
    pub fn description(&self) -> &'static str {
        match self {
            CommitType::Feat => "a new feature",
            CommitType::Fix => "a bug fix",
            CommitType::Docs => "documentation only changes",
            CommitType::Style => "formatting, whitespace, no code meaning change",
            CommitType::Refactor => "code change that neither fixes a bug nor adds a feature",
            CommitType::Perf => "a performance improvement",
            CommitType::Test => "adding or correcting tests",
            CommitType::Build => "build system or external dependency changes",
            CommitType::Ci => "CI configuration and scripts",
            CommitType::Chore => "maintenance that does not touch src or tests",
            CommitType::Revert => "reverts a previous commit",
        }
    }

    /// Resolve a canonical name or a known synonym, case-insensitively.
    pub fn from_loose(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        if let Ok(t) = lower.parse() {
            return Some(t);
        }
        let mapped = match lower.as_str() {
            "feature" | "features" | "add" | "new" => CommitType::Feat,
            "bugfix" | "bug" | "hotfix" | "fixes" | "patch" => CommitType::Fix,
            "doc" | "documentation" => CommitType::Docs,
            "tests" | "testing" => CommitType::Test,
            "performance" | "optimization" => CommitType::Perf,
            "refactoring" | "cleanup" => CommitType::Refactor,
            "format" | "formatting" | "lint" => CommitType::Style,
            "deps" | "dependencies" => CommitType::Build,
            "maintenance" | "update" | "wip" | "misc" => CommitType::Chore,
            _ => return None,
        };
        Some(mapped)
    }
}

impl FromStr for CommitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "feat" => Ok(Self::Feat),
            "fix" => Ok(Self::Fix),
            "docs" => Ok(Self::Docs),
            "style" => Ok(Self::Style),
            "refactor" => Ok(Self::Refactor),
            "perf" => Ok(Self::Perf),
            "test" => Ok(Self::Test),
            "build" => Ok(Self::Build),
            "ci" => Ok(Self::Ci),
            "chore" => Ok(Self::Chore),
            "revert" => Ok(Self::Revert),
            _ => Err(format!("Unknown commit type: {}", s)),
        }
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured conventional commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRecord {
    #[serde(rename = "type")]
    pub commit_type: CommitType,
    pub scope: Option<String>,
    pub subject: String,
    pub body: Vec<String>,
}

impl CommitRecord {
    /// Render the commit message exactly as it will be committed.
    ///
    /// Produces:
    /// ```text
    /// type(scope): subject
    ///
    /// - body item
    /// - body item
    /// ```
    pub fn format(&self) -> String {
        let mut text = self.title();
        if !self.body.is_empty() {
            text.push_str("\n\n");
            let items: Vec<String> = self.body.iter().map(|item| format!("- {item}")).collect();
            text.push_str(&items.join("\n"));
        }
        text
    }

    /// The first line of the message.
    pub fn title(&self) -> String {
        match self.scope {
            Some(ref scope) => format!("{}({}): {}", self.commit_type, scope, self.subject),
            None => format!("{}: {}", self.commit_type, self.subject),
        }
    }
}

impl fmt::Display for CommitRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(commit_type: CommitType, scope: Option<&str>, subject: &str, body: &[&str]) -> CommitRecord {
        CommitRecord {
            commit_type,
            scope: scope.map(String::from),
            subject: subject.to_string(),
            body: body.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_format_with_scope_and_body() {
        let msg = record(
            CommitType::Fix,
            Some("auth"),
            "handle null token",
            &["guard against empty header"],
        );
        assert_eq!(
            msg.format(),
            "fix(auth): handle null token\n\n- guard against empty header"
        );
    }

    #[test]
    fn test_format_subject_only() {
        let msg = record(CommitType::Chore, None, "bump deps", &[]);
        assert_eq!(msg.format(), "chore: bump deps");
    }

    #[test]
    fn test_format_preserves_body_order() {
        let msg = record(CommitType::Feat, None, "add export", &["first", "second", "third"]);
        assert_eq!(msg.format(), "feat: add export\n\n- first\n- second\n- third");
    }

    #[test]
    fn test_commit_type_from_str_is_case_insensitive() {
        assert_eq!("FEAT".parse::<CommitType>().unwrap(), CommitType::Feat);
        assert_eq!("Revert".parse::<CommitType>().unwrap(), CommitType::Revert);
        assert!("feature".parse::<CommitType>().is_err());
    }

    #[test]
    fn test_all_types_round_trip_through_as_str() {
        for t in CommitType::ALL {
            assert_eq!(t.as_str().parse::<CommitType>().unwrap(), t);
        }
    }

    #[test]
    fn test_from_loose_synonyms() {
        assert_eq!(CommitType::from_loose("feature"), Some(CommitType::Feat));
        assert_eq!(CommitType::from_loose("Bugfix"), Some(CommitType::Fix));
        assert_eq!(CommitType::from_loose("bug"), Some(CommitType::Fix));
        assert_eq!(CommitType::from_loose("documentation"), Some(CommitType::Docs));
        assert_eq!(CommitType::from_loose("doc"), Some(CommitType::Docs));
        assert_eq!(CommitType::from_loose("testing"), Some(CommitType::Test));
        assert_eq!(CommitType::from_loose("performance"), Some(CommitType::Perf));
        assert_eq!(CommitType::from_loose("wip"), Some(CommitType::Chore));
        assert_eq!(CommitType::from_loose("update"), Some(CommitType::Chore));
        assert_eq!(CommitType::from_loose(" fix "), Some(CommitType::Fix));
        assert_eq!(CommitType::from_loose("banana"), None);
    }

    #[test]
    fn test_record_serializes_type_key() {
        let msg = record(CommitType::Docs, None, "fix typo", &[]);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "docs");
        assert!(json["scope"].is_null());
    }
}
