//! Language model access: the Ollama client and reply helpers.

pub mod json;
pub mod ollama;

pub use json::{locate_object, strip_code_fences};
pub use ollama::{ChatModel, ModelInfo, OllamaClient};
