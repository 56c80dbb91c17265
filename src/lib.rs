//! ollama-commit - drafts conventional commit messages from staged changes
//! using a model served by a local Ollama instance.
//!
//! # Overview
//!
//! The staged diff is collected through the `git` CLI with lockfiles, build
//! output and other noise excluded, summarized to fit the prompt, and sent to
//! Ollama. Whatever the model replies is normalized into a conventional
//! commit, shown for review, and committed once accepted.

pub mod commit;
pub mod config;
pub mod error;
pub mod exclude;
pub mod git;
pub mod llm;
pub mod ui;

// Re-export commonly used types
pub use commit::{CommitRecord, CommitType, DiffOutcome, DiffPayload, NormalizedCommit};
pub use config::{ConfigStore, Settings};
pub use error::{CommitError, ConfigError, GitError, OllamaError};
pub use exclude::{ExclusionSet, Resolution};
pub use git::{GitBackend, GitCli, StagedFile};
pub use llm::{ChatModel, ModelInfo, OllamaClient};
