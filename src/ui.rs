//! Terminal presentation: the interactive menu and the busy spinner.

use std::time::Duration;

use console::style;
use dialoguer::{Editor, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};

use crate::commit::{Menu, MenuAction, Preview};
use crate::error::CommitError;
use crate::llm::ModelInfo;

/// Start a spinner with `message`. The caller finishes it.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner()
        .tick_strings(&["-", "\\", "|", "/", "-"])
        .template("{spinner:.blue} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn prompt_error(e: dialoguer::Error) -> CommitError {
    CommitError::Prompt(e.to_string())
}

/// [`Menu`] rendered with dialoguer on the controlling terminal.
#[derive(Default)]
pub struct DialoguerMenu {
    spinner: Option<ProgressBar>,
    show_source: bool,
}

impl DialoguerMenu {
    pub fn new(show_source: bool) -> Self {
        Self {
            spinner: None,
            show_source,
        }
    }
}

impl Menu for DialoguerMenu {
    fn choose(&mut self, preview: &Preview<'_>) -> Result<MenuAction, CommitError> {
        println!();
        if !preview.skipped.is_empty() {
            println!(
                "{} {}",
                style("Skipped:").dim(),
                style(preview.skipped.join(", ")).dim()
            );
        }
        if self.show_source {
            println!(
                "{}",
                style(format!("model {} ({} parse)", preview.model, preview.source)).dim()
            );
        }
        println!("{}", style("Proposed commit message:").bold());
        println!();
        for line in preview.message.lines() {
            println!("  {}", style(line).cyan());
        }
        println!();

        let labels: Vec<&str> = MenuAction::ALL.iter().map(|a| a.label()).collect();
        let choice = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact_opt()
            .map_err(prompt_error)?;

        Ok(choice.map_or(MenuAction::Cancel, |i| MenuAction::ALL[i]))
    }

    fn edit(&mut self, message: &str) -> Result<Option<String>, CommitError> {
        Editor::new()
            .extension(".txt")
            .edit(message)
            .map_err(prompt_error)
    }

    fn select_model(
        &mut self,
        models: &[ModelInfo],
        current: &str,
    ) -> Result<Option<String>, CommitError> {
        if models.is_empty() {
            self.notify("No models installed. Pull one with `ollama pull <model>`.");
            return Ok(None);
        }

        let labels: Vec<String> = models
            .iter()
            .map(|m| format!("{} ({})", m.name, m.human_size()))
            .collect();
        let default = models.iter().position(|m| m.name == current).unwrap_or(0);

        let choice = Select::new()
            .with_prompt("Select a model")
            .items(&labels)
            .default(default)
            .interact_opt()
            .map_err(prompt_error)?;

        Ok(choice.map(|i| models[i].name.clone()))
    }

    fn input_port(&mut self, current: u16) -> Result<i64, CommitError> {
        Input::<i64>::new()
            .with_prompt("Ollama port")
            .default(i64::from(current))
            .interact_text()
            .map_err(prompt_error)
    }

    fn notify(&mut self, message: &str) {
        eprintln!("{} {}", style("!").yellow().bold(), message);
    }

    fn generation_started(&mut self, model: &str) {
        self.spinner = Some(spinner(format!("Generating commit message with {model}...")));
    }

    fn generation_finished(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }
}
