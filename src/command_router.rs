//! The REPL: reads a line, decides what it is, and hands it to the right
//! handler.
//!
//! Routing order for one line:
//! 1. blank input is ignored
//! 2. `exit` / `quit` leave the loop
//! 3. builtin tokens (`!learn`, `!provider`, ...) run their handler
//! 4. `!<cmd>` runs `<cmd>` directly, skipping classification
//! 5. otherwise the classifier picks shell execution or translation

use crate::builtins::{Builtin, print_help};
use crate::cancel::CancelToken;
use crate::classifier::{Classification, classify};
use crate::config::{Config, ConfigStore};
use crate::console::ask_with_io;
use crate::executor::Executor;
use crate::http_client::HttpClient;
use crate::llm_client::{Assistant, DEFAULT_OPENROUTER_MODEL, Provider, build_assistant};
use crate::provider_setup::setup_provider_with_io;
use crate::session_log::SessionLog;
use crate::system::{InstallPaths, self_update_with_io, toggle_autolaunch_with_io, uninstall_with_io};
use crate::translator::{TranslationContext, host_shell_dialect, translate};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const RATE_LIMIT_MESSAGE: &str = "rate limit hit - wait a moment and try again";
const UNTRANSLATABLE_MESSAGE: &str = "couldn't translate that - try rephrasing or use !<cmd>";
const ERROR_EXCERPT_CHARS: usize = 100;

/// Whether the REPL keeps going after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

/// Mode flags and history, owned by the router and lent to handlers.
pub struct SessionState {
    /// Provider, model and learning mode live here alongside the keys.
    pub config: Config,
    pub log: SessionLog,
}

impl SessionState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            log: SessionLog::new(),
        }
    }
}

pub struct CommandRouter {
    state: SessionState,
    store: Box<dyn ConfigStore>,
    http: Arc<dyn HttpClient>,
    assistant: Box<dyn Assistant>,
    executor: Executor,
    cancel: CancelToken,
    install_paths: Option<InstallPaths>,
}

impl CommandRouter {
    pub fn new(
        config: Config,
        store: Box<dyn ConfigStore>,
        http: Arc<dyn HttpClient>,
        assistant: Box<dyn Assistant>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            state: SessionState::new(config),
            store,
            http,
            assistant,
            executor: Executor::new(),
            cancel,
            install_paths: None,
        }
    }

    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    /// Overrides where `!autolaunch` and `!uninstall` look for files.
    pub fn with_install_paths(mut self, paths: InstallPaths) -> Self {
        self.install_paths = Some(paths);
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The prompt for the current directory and modes.
    pub fn prompt(&self) -> String {
        let cwd = std::env::current_dir().unwrap_or_default();
        prompt_for(&self.state.config, &cwd)
    }

    // =========================================================================
    // REPL loop
    // =========================================================================

    /// Reads and handles lines until `exit`, `quit`, end of input or a
    /// successful uninstall.
    pub async fn run_with_io<R: BufRead, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
    ) -> Result<()> {
        loop {
            if self.cancel.take() {
                debug!("Prompt restarted after interrupt");
            }

            write!(output, "{}", self.prompt())?;
            output.flush()?;

            let mut line = String::new();
            match input.read_line(&mut line) {
                Ok(0) => {
                    writeln!(output)?;
                    writeln!(output, "bye 👋")?;
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
            // an interrupt while the prompt was waiting belongs to that prompt
            self.cancel.take();

            match self.handle_line_with_io(&line, input, output).await {
                Ok(LoopControl::Continue) => {}
                Ok(LoopControl::Exit) => return Ok(()),
                Err(e) => {
                    warn!("Line failed: {:#}", e);
                    if let Some(message) = describe_failure(&e) {
                        writeln!(output, "{}", message.red())?;
                    }
                }
            }
        }
    }

    /// Routes one line of input.
    pub async fn handle_line_with_io<R: BufRead, W: Write>(
        &mut self,
        line: &str,
        input: &mut R,
        output: &mut W,
    ) -> Result<LoopControl> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(LoopControl::Continue);
        }
        if line == "exit" || line == "quit" {
            writeln!(output, "bye 👋")?;
            return Ok(LoopControl::Exit);
        }
        if let Some(builtin) = Builtin::parse(line) {
            info!("Builtin: {}", builtin.token());
            return self.run_builtin_with_io(builtin, input, output).await;
        }
        if let Some(forced) = line.strip_prefix('!') {
            let forced = forced.trim();
            if !forced.is_empty() {
                info!("Forced shell execution: {}", forced);
                self.executor
                    .run_direct_with_io(forced, &mut self.state.log, output)?;
            }
            return Ok(LoopControl::Continue);
        }

        match classify(line) {
            Classification::Shell => {
                info!("Classified as shell: {}", line);
                self.executor
                    .run_direct_with_io(line, &mut self.state.log, output)?;
            }
            Classification::Natural => {
                info!("Classified as natural language: {}", line);
                self.translate_and_run_with_io(line, input, output).await?;
            }
            Classification::Builtin => {
                debug!("Nothing to do for '{}'", line);
            }
        }
        Ok(LoopControl::Continue)
    }

    // =========================================================================
    // Translation
    // =========================================================================

    async fn translate_and_run_with_io<R: BufRead, W: Write>(
        &mut self,
        request: &str,
        input: &mut R,
        output: &mut W,
    ) -> Result<()> {
        let cwd = std::env::current_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| ".".to_string());
        let session_context = self.state.log.render_context();
        let ctx = TranslationContext {
            cwd: &cwd,
            shell_dialect: host_shell_dialect(),
            learning_mode: self.state.config.learning_mode,
            session_context: &session_context,
        };

        let result = translate(request, &ctx, self.assistant.as_ref()).await?;
        if self.cancel.is_cancelled() {
            info!("Discarding translation of '{}' after interrupt", request);
            return Ok(());
        }

        match result.commands.as_slice() {
            [] => writeln!(output, "{}", UNTRANSLATABLE_MESSAGE.yellow())?,
            [command] => {
                if let Some(explanation) = &result.explanation {
                    writeln!(output, "{}", explanation.dimmed())?;
                }
                self.executor
                    .confirm_and_run_with_io(
                        command,
                        &mut self.state.log,
                        &self.cancel,
                        input,
                        output,
                    )?;
            }
            commands => {
                self.run_plan_with_io(commands, result.explanation.as_deref(), input, output)?
            }
        }
        Ok(())
    }

    /// Shows a numbered plan and runs it all at once or step by step.
    fn run_plan_with_io<R: BufRead, W: Write>(
        &mut self,
        commands: &[String],
        explanation: Option<&str>,
        input: &mut R,
        output: &mut W,
    ) -> Result<()> {
        writeln!(
            output,
            "{}",
            format!("Multi-step workflow ({} commands):", commands.len()).cyan()
        )?;
        for (index, command) in commands.iter().enumerate() {
            writeln!(output, "  {} {}", format!("{}.", index + 1).dimmed(), command)?;
        }
        if let Some(explanation) = explanation {
            writeln!(output, "{}", explanation.dimmed())?;
        }

        let prompt = format!("{} ", "Run all? [y/n/step]".yellow());
        let answer = match ask_with_io(&prompt, input, output)? {
            Some(answer) => answer.trim().to_lowercase(),
            None => return Ok(()),
        };

        let summary = match answer.as_str() {
            "" | "y" | "yes" => self.executor.run_sequence_with_io(
                commands,
                &mut self.state.log,
                &self.cancel,
                output,
            )?,
            "s" | "step" => self.executor.run_stepping_with_io(
                commands,
                &mut self.state.log,
                &self.cancel,
                input,
                output,
            )?,
            _ => {
                writeln!(output, "{}", "Cancelled".dimmed())?;
                return Ok(());
            }
        };

        info!(
            "Plan finished: {} run, {} skipped, failed at {:?}, aborted {}",
            summary.executed, summary.skipped, summary.failed_at, summary.aborted
        );
        Ok(())
    }

    // =========================================================================
    // Builtins
    // =========================================================================

    async fn run_builtin_with_io<R: BufRead, W: Write>(
        &mut self,
        builtin: Builtin,
        input: &mut R,
        output: &mut W,
    ) -> Result<LoopControl> {
        match builtin {
            Builtin::Learn => self.toggle_learning_with_io(output)?,
            Builtin::Model => self.change_model_with_io(input, output)?,
            Builtin::Provider => self.switch_provider_with_io(input, output).await?,
            Builtin::Autolaunch => {
                let paths = self.install_paths()?;
                toggle_autolaunch_with_io(&paths.rc_files, output)?;
            }
            Builtin::Update => {
                self_update_with_io(
                    self.http.as_ref(),
                    &self.executor,
                    env!("CARGO_PKG_VERSION"),
                    input,
                    output,
                )
                .await?
            }
            Builtin::Uninstall => {
                let paths = self.install_paths()?;
                if uninstall_with_io(&paths, input, output)? {
                    return Ok(LoopControl::Exit);
                }
            }
            Builtin::Help => print_help(output)?,
        }
        Ok(LoopControl::Continue)
    }

    fn toggle_learning_with_io<W: Write>(&mut self, output: &mut W) -> Result<()> {
        let config = &mut self.state.config;
        config.learning_mode = !config.learning_mode;
        self.persist()?;

        if self.state.config.learning_mode {
            writeln!(output, "{}", "💡 Learning mode enabled".green())?;
            writeln!(output, "{}", "Each translation now comes with an explanation".dimmed())?;
        } else {
            writeln!(output, "{}", "Learning mode disabled".dimmed())?;
        }
        Ok(())
    }

    fn change_model_with_io<R: BufRead, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
    ) -> Result<()> {
        if self.state.config.provider != Provider::OpenRouter {
            writeln!(output, "{}", "Model selection is only available with OpenRouter".yellow())?;
            writeln!(output, "{}", "Use !provider to switch".dimmed())?;
            return Ok(());
        }

        writeln!(
            output,
            "{}",
            format!("Current model: {}", self.state.config.openrouter_model).dimmed()
        )?;
        let prompt = format!("{} ", "New model (Enter to keep):".yellow());
        let model = ask_with_io(&prompt, input, output)?
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());

        match model {
            None => writeln!(output, "{}", "Model unchanged".dimmed())?,
            Some(model) => {
                self.state.config.openrouter_model = model;
                self.persist()?;
                self.rebuild_assistant()?;
                writeln!(
                    output,
                    "{}",
                    format!("✓ Model set to {}", self.state.config.openrouter_model).green()
                )?;
            }
        }
        Ok(())
    }

    async fn switch_provider_with_io<R: BufRead, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
    ) -> Result<()> {
        let choice = setup_provider_with_io(
            self.http.clone(),
            &self.state.config.openrouter_model,
            input,
            output,
        )
        .await?;

        let Some(choice) = choice else {
            writeln!(output, "{}", "Provider unchanged".dimmed())?;
            return Ok(());
        };

        // nothing changes unless the new assistant can be built and saved
        let mut updated = self.state.config.clone();
        choice.apply_to(&mut updated);
        let assistant = build_assistant(&updated, self.http.clone())?;
        self.store
            .save(&updated)
            .context("could not save config")?;

        self.state.config = updated;
        self.assistant = assistant;
        writeln!(
            output,
            "{}",
            format!("Now using {}", self.state.config.provider.label()).green()
        )?;
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        self.store
            .save(&self.state.config)
            .context("could not save config")
    }

    fn rebuild_assistant(&mut self) -> Result<()> {
        self.assistant = build_assistant(&self.state.config, self.http.clone())?;
        Ok(())
    }

    fn install_paths(&self) -> Result<InstallPaths> {
        match &self.install_paths {
            Some(paths) => Ok(paths.clone()),
            None => InstallPaths::detect(),
        }
    }
}

/// `dir [learn] [model] > ` for the given config and directory.
pub fn prompt_for(config: &Config, cwd: &Path) -> String {
    let dir = cwd
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "/".to_string());

    let mut prompt = dir.cyan().bold().to_string();
    if config.learning_mode {
        prompt.push_str(&format!(" {}", "[learn]".magenta()));
    }
    if config.provider == Provider::OpenRouter && config.openrouter_model != DEFAULT_OPENROUTER_MODEL {
        let short = config
            .openrouter_model
            .rsplit('/')
            .next()
            .unwrap_or(&config.openrouter_model);
        prompt.push_str(&format!(" {}", format!("[{}]", short).dimmed()));
    }
    prompt.push_str(&format!(" {} ", ">".green()));
    prompt
}

/// The user-facing message for a failed line, or `None` when the failure
/// came from an interrupt and should pass silently.
pub fn describe_failure(error: &anyhow::Error) -> Option<String> {
    let interrupted = error.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .is_some_and(|e| e.kind() == io::ErrorKind::Interrupted)
    });
    if interrupted {
        return None;
    }
    let message = format!("{:#}", error);
    let lower = message.to_lowercase();
    if lower.contains("429") || lower.contains("quota") {
        return Some(RATE_LIMIT_MESSAGE.to_string());
    }
    let excerpt: String = message.chars().take(ERROR_EXCERPT_CHARS).collect();
    Some(format!("error: {}", excerpt))
}
