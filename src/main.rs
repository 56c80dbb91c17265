//! ollama-commit - CLI entry point.

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use console::style;
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

use ollama_commit::commit::{CommitSession, DiffOutcome, Menu, SessionOutcome, acquire};
use ollama_commit::config::{ConfigStore, ExcludeChange, parse_port};
use ollama_commit::exclude::FIXED_PATTERNS;
use ollama_commit::git::GitCli;
use ollama_commit::llm::{ChatModel, OllamaClient};
use ollama_commit::ui::{DialoguerMenu, spinner};

const QUIET_FILTER: &str = "warn";
const DEBUG_FILTER: &str = "warn,ollama_commit=debug";

/// Draft a conventional commit message for the staged changes with a local
/// Ollama model.
#[derive(Parser, Debug)]
#[command(name = "ollama-commit")]
#[command(about = "Generate conventional commit messages from staged changes using Ollama")]
#[command(version)]
struct Cli {
    /// Show the current configuration
    #[arg(long)]
    config: bool,

    /// List models installed in Ollama
    #[arg(long)]
    list_models: bool,

    /// Set the model to use (pick interactively when no name is given)
    #[arg(long, value_name = "MODEL", num_args = 0..=1)]
    set_model: Option<Option<String>>,

    /// Set the Ollama port (1-65535)
    #[arg(long, value_name = "PORT", allow_hyphen_values = true)]
    set_port: Option<String>,

    /// List configured and built-in exclusion patterns
    #[arg(long)]
    list_excludes: bool,

    /// Add a file name or glob to the exclusion list
    #[arg(long, value_name = "PATTERN")]
    add_exclude: Option<String>,

    /// Remove a pattern from the exclusion list
    #[arg(long, value_name = "PATTERN")]
    remove_exclude: Option<String>,

    /// Restore the default exclusion list
    #[arg(long)]
    reset_excludes: bool,

    /// Enable debug logging for this run
    #[arg(long)]
    debug: bool,

    /// Persist debug logging on or off
    #[arg(long, value_name = "STATE")]
    set_debug: Option<Toggle>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

/// Log filter that can be raised to debug once the config has been read.
struct Logging {
    handle: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl Logging {
    /// Logs go to stderr without timestamps. `RUST_LOG` wins over the flags.
    fn init(debug: bool) -> Self {
        let from_env = std::env::var_os("RUST_LOG").is_some();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(if debug { DEBUG_FILTER } else { QUIET_FILTER }));
        let (filter, handle) = reload::Layer::new(filter);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).without_time())
            .init();

        Self { handle, from_env }
    }

    fn enable_debug(&self) {
        if !self.from_env {
            let _ = self.handle.reload(EnvFilter::new(DEBUG_FILTER));
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let logging = Logging::init(cli.debug);

    let mut config = ConfigStore::load().context("Failed to load configuration")?;
    let debug_enabled = cli.debug || config.settings().debug;
    if debug_enabled {
        logging.enable_debug();
    }
    debug!("Using config at {}", config.path().display());

    let client = OllamaClient::new();

    if cli.config {
        print_config(&config);
        return Ok(());
    }

    if cli.list_models {
        return list_models(&client, config.settings().ollama_port).await;
    }

    if let Some(model) = cli.set_model {
        return set_model(&mut config, &client, model).await;
    }

    if let Some(raw) = cli.set_port {
        let port = config.set_port(i64::from(parse_port(&raw)?))?;
        println!("{} Ollama port set to {}", style("✓").green(), port);
        return Ok(());
    }

    if let Some(toggle) = cli.set_debug {
        let enabled = matches!(toggle, Toggle::On);
        config.set_debug(enabled)?;
        println!(
            "{} Debug logging {}",
            style("✓").green(),
            if enabled { "enabled" } else { "disabled" }
        );
        return Ok(());
    }

    if cli.list_excludes {
        print_excludes(&config);
        return Ok(());
    }

    if let Some(pattern) = cli.add_exclude {
        match config.add_exclude(&pattern)? {
            ExcludeChange::AlreadyPresent => println!("'{}' is already excluded", pattern),
            _ => println!("{} Added '{}' to exclusions", style("✓").green(), pattern),
        }
        return Ok(());
    }

    if let Some(pattern) = cli.remove_exclude {
        match config.remove_exclude(&pattern)? {
            ExcludeChange::NotPresent => println!("'{}' is not in the exclusion list", pattern),
            _ => println!("{} Removed '{}' from exclusions", style("✓").green(), pattern),
        }
        return Ok(());
    }

    if cli.reset_excludes {
        config.reset_excludes()?;
        println!("{} Exclusions reset to defaults", style("✓").green());
        return Ok(());
    }

    run_commit(&mut config, &client, debug_enabled).await
}

/// Generate a message for the staged changes and commit it once accepted.
async fn run_commit(config: &mut ConfigStore, client: &OllamaClient, debug: bool) -> Result<()> {
    GitCli::check_installed()?;
    let git = GitCli::new();

    let excludes = config.settings().exclude_files.clone();
    let payload = match acquire(&git, &excludes).await? {
        DiffOutcome::NothingStaged => {
            println!("No staged changes. Stage files with `git add` first.");
            return Ok(());
        }
        DiffOutcome::AllExcluded { skipped } => {
            println!("All staged files are excluded from analysis:");
            for path in skipped {
                println!("  {}", style(path).dim());
            }
            println!("Commit them manually, or adjust exclusions with --remove-exclude.");
            return Ok(());
        }
        DiffOutcome::EmptyDiff => {
            println!("The staged changes produced an empty diff. Nothing to describe.");
            return Ok(());
        }
        DiffOutcome::Ready(payload) => payload,
    };

    let settings = config.settings();
    client
        .check_model_exists(settings.ollama_port, &settings.ollama_model)
        .await?;

    let mut menu = DialoguerMenu::new(debug);
    let mut session = CommitSession::new(payload, config, client, &git);
    match session.run(&mut menu).await? {
        SessionOutcome::Committed(message) => {
            let title = message.lines().next().unwrap_or_default();
            println!("{} Committed: {}", style("✓").green(), title);
        }
        SessionOutcome::Cancelled => println!("Commit cancelled."),
    }
    Ok(())
}

async fn list_models(client: &OllamaClient, port: u16) -> Result<()> {
    let pb = spinner("Fetching models...");
    let models = client.list_models(port).await;
    pb.finish_and_clear();
    let models = models?;

    if models.is_empty() {
        println!("No models installed. Pull one with `ollama pull <model>`.");
        return Ok(());
    }

    println!("{}", style("Installed models:").bold());
    for model in models {
        println!("  {:<40} {}", model.name, style(model.human_size()).dim());
    }
    Ok(())
}

async fn set_model(
    config: &mut ConfigStore,
    client: &OllamaClient,
    requested: Option<String>,
) -> Result<()> {
    let port = config.settings().ollama_port;
    let name = match requested {
        Some(name) => {
            let name = name.trim().to_string();
            if name.is_empty() {
                bail!("Model name must not be empty");
            }
            client.check_model_exists(port, &name).await?;
            name
        }
        None => {
            let models = client.list_models(port).await?;
            let current = config.settings().ollama_model.clone();
            match DialoguerMenu::default().select_model(&models, &current)? {
                Some(name) => name,
                None => {
                    println!("Model unchanged ({}).", current);
                    return Ok(());
                }
            }
        }
    };

    config.set_model(&name)?;
    println!("{} Model set to {}", style("✓").green(), name);
    Ok(())
}

fn print_config(config: &ConfigStore) {
    let settings = config.settings();
    println!("{}", style("Configuration").bold());
    println!("  file:     {}", display_path(config.path()));
    println!("  port:     {}", settings.ollama_port);
    println!("  model:    {}", settings.ollama_model);
    println!("  debug:    {}", settings.debug);
    println!("  excludes: {}", settings.exclude_files.join(", "));
}

fn print_excludes(config: &ConfigStore) {
    println!("{}", style("Configured exclusions:").bold());
    let configured = &config.settings().exclude_files;
    if configured.is_empty() {
        println!("  (none)");
    }
    for pattern in configured {
        println!("  {}", pattern);
    }

    println!(
        "{}",
        style("Built-in exclusions (always applied, leading / = repository root only):").bold()
    );
    for pattern in FIXED_PATTERNS {
        println!("  {}", style(pattern).dim());
    }
}

fn display_path(path: &Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not created yet)", path.display())
    }
}
