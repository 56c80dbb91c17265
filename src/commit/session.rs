//! The interactive generate / review / commit loop.

use std::io::Write;

use tracing::{debug, info};

use super::diff::DiffPayload;
use super::normalize::{NormalizedCommit, normalize};
use super::prompt::{build_system_prompt, build_user_prompt};
use super::summarize::{DEFAULT_MAX_LENGTH, summarize};
use crate::config::ConfigStore;
use crate::error::{CommitError, ConfigError};
use crate::git::GitBackend;
use crate::llm::{ChatModel, ModelInfo};

/// What the user wants to do with the current draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Accept,
    Regenerate,
    Edit,
    ChangeModel,
    ChangePort,
    Cancel,
}

impl MenuAction {
    pub const ALL: [MenuAction; 6] = [
        MenuAction::Accept,
        MenuAction::Regenerate,
        MenuAction::Edit,
        MenuAction::ChangeModel,
        MenuAction::ChangePort,
        MenuAction::Cancel,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::Accept => "Commit with this message",
            MenuAction::Regenerate => "Regenerate",
            MenuAction::Edit => "Edit message",
            MenuAction::ChangeModel => "Change model",
            MenuAction::ChangePort => "Change Ollama port",
            MenuAction::Cancel => "Cancel",
        }
    }
}

/// The draft shown to the user before they pick an action.
#[derive(Debug, Clone)]
pub struct Preview<'a> {
    pub message: &'a str,
    pub model: &'a str,
    /// Which normalizer path produced the draft.
    pub source: &'static str,
    pub skipped: &'a [String],
}

/// User interaction needed by [`CommitSession::run`].
pub trait Menu {
    fn choose(&mut self, preview: &Preview<'_>) -> Result<MenuAction, CommitError>;

    /// Edit `message`. `None` means the edit was abandoned.
    fn edit(&mut self, message: &str) -> Result<Option<String>, CommitError>;

    /// Pick one of `models`. `None` keeps the current model.
    fn select_model(
        &mut self,
        models: &[ModelInfo],
        current: &str,
    ) -> Result<Option<String>, CommitError>;

    fn input_port(&mut self, current: u16) -> Result<i64, CommitError>;

    /// Report a recoverable problem and keep the menu open.
    fn notify(&mut self, message: &str);

    /// Called around each model request.
    fn generation_started(&mut self, _model: &str) {}
    fn generation_finished(&mut self) {}
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Committed(String),
    Cancelled,
}

/// One generate-and-commit run over a fixed diff.
///
/// The prompts are built once; regenerating only repeats the model call.
pub struct CommitSession<'a> {
    payload: DiffPayload,
    system_prompt: String,
    user_prompt: String,
    config: &'a mut ConfigStore,
    model: &'a dyn ChatModel,
    git: &'a dyn GitBackend,
}

impl<'a> CommitSession<'a> {
    pub fn new(
        payload: DiffPayload,
        config: &'a mut ConfigStore,
        model: &'a dyn ChatModel,
        git: &'a dyn GitBackend,
    ) -> Self {
        let excerpt = summarize(&payload.raw_diff, DEFAULT_MAX_LENGTH);
        if excerpt.len() < payload.raw_diff.len() {
            debug!(
                "Diff summarized from {} to {} bytes",
                payload.raw_diff.len(),
                excerpt.len()
            );
        }
        let user_prompt = build_user_prompt(&payload.analyzed_files, &payload.stats, &excerpt);

        Self {
            payload,
            system_prompt: build_system_prompt(),
            user_prompt,
            config,
            model,
            git,
        }
    }

    pub fn payload(&self) -> &DiffPayload {
        &self.payload
    }

    pub fn user_prompt(&self) -> &str {
        &self.user_prompt
    }

    /// Ask the configured model for a draft and normalize the reply.
    pub async fn generate(&self) -> Result<NormalizedCommit, CommitError> {
        let settings = self.config.settings();
        let raw = self
            .model
            .chat(
                &self.system_prompt,
                &self.user_prompt,
                &settings.ollama_model,
                settings.ollama_port,
            )
            .await?;
        debug!("Raw model reply: {}", raw);
        Ok(normalize(&raw))
    }

    async fn generate_with(&self, menu: &mut dyn Menu) -> Result<NormalizedCommit, CommitError> {
        menu.generation_started(&self.config.settings().ollama_model);
        let result = self.generate().await;
        menu.generation_finished();
        result
    }

    /// Drive the menu until the user commits or cancels.
    pub async fn run(&mut self, menu: &mut dyn Menu) -> Result<SessionOutcome, CommitError> {
        let mut draft = self.generate_with(menu).await?;

        loop {
            let message = draft.record().format();
            let action = menu.choose(&Preview {
                message: &message,
                model: &self.config.settings().ollama_model,
                source: draft.path(),
                skipped: &self.payload.excluded_files,
            })?;
            debug!("Menu action: {:?}", action);

            match action {
                MenuAction::Accept => {
                    self.commit(&message).await?;
                    return Ok(SessionOutcome::Committed(message));
                }
                MenuAction::Regenerate => {
                    draft = self.generate_with(menu).await?;
                }
                MenuAction::Edit => match menu.edit(&message)? {
                    Some(edited) if !edited.trim().is_empty() => {
                        let edited = edited.trim().to_string();
                        self.commit(&edited).await?;
                        return Ok(SessionOutcome::Committed(edited));
                    }
                    _ => menu.notify("Edit aborted, keeping the current message"),
                },
                MenuAction::ChangeModel => {
                    let settings = self.config.settings();
                    let models = self.model.list_models(settings.ollama_port).await?;
                    let current = settings.ollama_model.clone();
                    if let Some(name) = menu.select_model(&models, &current)? {
                        if name != current {
                            self.config.set_model(&name)?;
                            info!("Switched model to {}", name);
                        }
                        draft = self.generate_with(menu).await?;
                    }
                }
                MenuAction::ChangePort => {
                    let requested = menu.input_port(self.config.settings().ollama_port)?;
                    match self.config.set_port(requested) {
                        Ok(port) => {
                            info!("Switched Ollama port to {}", port);
                            draft = self.generate_with(menu).await?;
                        }
                        Err(e @ ConfigError::InvalidPort(_)) => menu.notify(&e.to_string()),
                        Err(e) => return Err(e.into()),
                    }
                }
                MenuAction::Cancel => return Ok(SessionOutcome::Cancelled),
            }
        }
    }

    /// Hand `message` to git through a uniquely named temp file, removed
    /// when it goes out of scope whether or not the commit succeeds.
    async fn commit(&self, message: &str) -> Result<(), CommitError> {
        let mut file = tempfile::Builder::new()
            .prefix("ollama-commit-")
            .suffix(".txt")
            .tempfile()
            .map_err(CommitError::MessageFile)?;
        writeln!(file, "{message}").map_err(CommitError::MessageFile)?;
        file.flush().map_err(CommitError::MessageFile)?;

        self.git.commit(file.path()).await?;
        Ok(())
    }
}
