//! HTTP client for a local Ollama server.

use std::env;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::OllamaError;

/// Host the Ollama server listens on.
pub const DEFAULT_HOST: &str = "localhost";

/// Default bound on a single model request (2 minutes). Local inference is
/// slow, but an unbounded wait would hang the interactive loop.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Environment variable to override the default timeout.
pub const TIMEOUT_ENV_VAR: &str = "OLLAMA_COMMIT_TIMEOUT";

const TEMPERATURE: f64 = 0.2;
const TOP_P: f64 = 0.9;
const MAX_OUTPUT_TOKENS: u32 = 512;

/// Get the configured timeout duration.
///
/// Reads from `OLLAMA_COMMIT_TIMEOUT` if set, otherwise uses the default of
/// 120 seconds. Logs a warning for values that do not parse.
fn get_timeout() -> Duration {
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    TIMEOUT_ENV_VAR, v, DEFAULT_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            }
        },
        _ => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    }
}

/// A chat-style text generator serving named models on a local port.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send one system + user exchange and return the raw reply text.
    async fn chat(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
        port: u16,
    ) -> Result<String, OllamaError>;

    /// List installed models.
    async fn list_models(&self, port: u16) -> Result<Vec<ModelInfo>, OllamaError>;
}

/// An installed model as reported by `/api/tags`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: String,
    pub size: u64,
}

impl ModelInfo {
    /// Size formatted for display, e.g. `4.7 GB`.
    pub fn human_size(&self) -> String {
        const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
        let mut size = self.size as f64;
        let mut unit = 0;
        while size >= 1000.0 && unit < UNITS.len() - 1 {
            size /= 1000.0;
            unit += 1;
        }
        if unit == 0 {
            format!("{} B", self.size)
        } else {
            format!("{:.1} {}", size, UNITS[unit])
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
    format: &'static str,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f64,
    num_predict: u32,
    top_p: f64,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ReplyMessage>,
    response: Option<String>,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<RawModel>,
}

#[derive(Deserialize)]
struct RawModel {
    name: Option<String>,
    model: Option<String>,
    #[serde(default)]
    size: u64,
}

/// Client for the Ollama HTTP API.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    host: String,
    timeout: Duration,
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OllamaClient {
    pub fn new() -> Self {
        Self::with_host(DEFAULT_HOST)
    }

    pub fn with_host(host: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            host: host.into(),
            timeout: get_timeout(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url(&self, port: u16, endpoint: &str) -> String {
        format!("http://{}:{}{}", self.host, port, endpoint)
    }

    /// Send a request and return the body of a successful response.
    ///
    /// The whole exchange (connect, send, read body) is bounded by the client
    /// timeout; on expiry the in-flight future is dropped, which aborts the
    /// request.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<String, OllamaError> {
        let timeout_secs = self.timeout.as_secs();

        let exchange = async {
            let response = request.send().await.map_err(|e| classify(e, url))?;
            let status = response.status();
            let body = response.text().await.map_err(|e| classify(e, url))?;
            if !status.is_success() {
                return Err(OllamaError::Endpoint {
                    status: status.as_u16(),
                    body,
                });
            }
            Ok(body)
        };

        timeout(self.timeout, exchange)
            .await
            .map_err(|_| OllamaError::Timeout(timeout_secs))?
    }

    /// Check that `model` is installed. `llama3.2` also matches
    /// `llama3.2:latest`.
    pub async fn check_model_exists(&self, port: u16, model: &str) -> Result<(), OllamaError> {
        let models = self.list_models(port).await?;
        if models.iter().any(|m| same_model(&m.name, model)) {
            return Ok(());
        }
        Err(OllamaError::ModelNotFound {
            model: model.to_string(),
            available: models.into_iter().map(|m| m.name).collect(),
        })
    }
}

#[async_trait]
impl ChatModel for OllamaClient {
    async fn chat(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
        port: u16,
    ) -> Result<String, OllamaError> {
        let url = self.url(port, "/api/chat");
        let request = ChatRequest {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            stream: false,
            format: "json",
            options: ChatOptions {
                temperature: TEMPERATURE,
                num_predict: MAX_OUTPUT_TOKENS,
                top_p: TOP_P,
            },
        };

        debug!(
            "Ollama chat: model={} system_chars={} user_chars={}",
            model,
            system_prompt.len(),
            user_prompt.len()
        );
        let started = Instant::now();
        let body = self.send(self.http.post(&url).json(&request), &url).await?;
        debug!("Ollama replied in {:.1}s", started.elapsed().as_secs_f64());

        let reply: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| OllamaError::InvalidResponse(format!("{}: {}", e, preview(&body))))?;

        match (reply.message, reply.response) {
            (Some(message), _) => Ok(message.content),
            (None, Some(response)) => Ok(response),
            (None, None) => Err(OllamaError::InvalidResponse(format!(
                "no message content: {}",
                preview(&body)
            ))),
        }
    }

    async fn list_models(&self, port: u16) -> Result<Vec<ModelInfo>, OllamaError> {
        let url = self.url(port, "/api/tags");
        let body = self.send(self.http.get(&url), &url).await?;

        let tags: TagsResponse = serde_json::from_str(&body)
            .map_err(|e| OllamaError::InvalidResponse(format!("{}: {}", e, preview(&body))))?;

        Ok(tags
            .models
            .into_iter()
            .filter_map(|m| {
                let name = m.name.or(m.model)?;
                Some(ModelInfo { name, size: m.size })
            })
            .collect())
    }
}

fn classify(err: reqwest::Error, url: &str) -> OllamaError {
    if err.is_connect() {
        OllamaError::Unreachable {
            url: url.to_string(),
            source: err,
        }
    } else {
        OllamaError::Http(err)
    }
}

fn same_model(installed: &str, requested: &str) -> bool {
    let strip = |s: &str| s.strip_suffix(":latest").unwrap_or(s).to_string();
    installed == requested || strip(installed) == strip(requested)
}

fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}
