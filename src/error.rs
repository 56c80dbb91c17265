//! Error types for ollama-commit modules using thiserror.

use thiserror::Error;

/// Errors from the git collaborator.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not a git repository. Run ollama-commit from within a git working tree.")]
    NotARepository,

    #[error("git executable not found in PATH")]
    NotInstalled,

    #[error("Staged diff exceeds the {limit} byte capture limit. Stage fewer files or exclude large ones.")]
    DiffTooLarge { limit: usize },

    #[error("git {operation} failed: {stderr}")]
    ToolFailed { operation: String, stderr: String },

    #[error("Failed to spawn git process: {0}")]
    SpawnFailed(#[source] std::io::Error),
}

/// Errors from the Ollama endpoint.
#[derive(Error, Debug)]
pub enum OllamaError {
    #[error("Cannot reach Ollama at {url}. Is `ollama serve` running?")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Ollama request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Ollama returned HTTP {status}: {body}")]
    Endpoint { status: u16, body: String },

    #[error("Model '{model}' is not installed. Available: {}", format_available(.available))]
    ModelNotFound {
        model: String,
        available: Vec<String>,
    },

    #[error("Ollama returned an unexpected payload: {0}")]
    InvalidResponse(String),

    #[error("HTTP error talking to Ollama: {0}")]
    Http(#[source] reqwest::Error),
}

fn format_available(available: &[String]) -> String {
    if available.is_empty() {
        "(none, pull one with `ollama pull <model>`)".to_string()
    } else {
        available.join(", ")
    }
}

/// Errors from configuration loading and mutation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port {0}: must be an integer between 1 and 65535")]
    InvalidPort(String),

    #[error("Could not determine the configuration directory")]
    DirectoryNotFound,

    #[error("Failed to read config file: {0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[source] toml_edit::TomlError),

    #[error("Failed to write config file: {0}")]
    Write(#[source] std::io::Error),
}

/// Errors from the generate-and-commit flow.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Ollama(#[from] OllamaError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to write commit message file: {0}")]
    MessageFile(#[source] std::io::Error),

    #[error("Interactive prompt failed: {0}")]
    Prompt(String),
}
