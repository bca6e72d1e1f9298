//! Natural language to shell commands.

use crate::llm_client::Assistant;
use anyhow::Result;
use tracing::{debug, info};

/// Ordered commands for one request, plus an optional learning-mode note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationResult {
    pub commands: Vec<String>,
    pub explanation: Option<String>,
}

impl TranslationResult {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Everything the prompt needs besides the request itself.
#[derive(Debug, Clone)]
pub struct TranslationContext<'a> {
    pub cwd: &'a str,
    /// e.g. `Linux/bash`.
    pub shell_dialect: &'a str,
    pub learning_mode: bool,
    /// Rendered session digest.
    pub session_context: &'a str,
}

/// Shell dialect of the host, as named in prompts.
pub fn host_shell_dialect() -> &'static str {
    if cfg!(target_os = "macos") {
        "macOS/zsh"
    } else {
        "Linux/bash"
    }
}

pub fn build_prompt(request: &str, ctx: &TranslationContext<'_>) -> String {
    format!(
        "Convert the following request into executable {dialect} commands.
Working directory: {cwd}

Session context:
{context}

Guidelines:
- Return ONLY raw commands, one per line. No markdown, no backticks, no commentary
- For multi-step tasks, put each command on its own line
- Leverage session context for references like \"do that again\" or \"undo that\"
- When ambiguous, choose the simplest standard approach

Request: {request}",
        dialect = ctx.shell_dialect,
        cwd = ctx.cwd,
        context = ctx.session_context,
        request = request,
    )
}

pub fn build_explanation_prompt(commands: &[String]) -> String {
    let shown = if commands.len() == 1 {
        commands[0].clone()
    } else {
        commands.join(" && ")
    };
    format!(
        "In 1-2 sentences, explain what this command does for someone learning the terminal.
Command: {}
Include a practical tip about the flags or options used. Start with 💡",
        shown
    )
}

/// Splits a reply into commands: one per line, trimmed, blanks dropped.
pub fn parse_commands(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Translates `request` with one call to `assistant`, plus a second call
/// for an explanation in learning mode.
///
/// # Errors
///
/// Only failures of the first call are returned. An empty reply is not an
/// error; it yields an empty command list. A failed explanation request is
/// dropped.
pub async fn translate(
    request: &str,
    ctx: &TranslationContext<'_>,
    assistant: &dyn Assistant,
) -> Result<TranslationResult> {
    let prompt = build_prompt(request, ctx);
    let reply = match assistant.ask(&prompt).await? {
        Some(reply) => reply,
        None => {
            info!("Assistant returned nothing for: {}", request);
            return Ok(TranslationResult::default());
        }
    };

    let commands = parse_commands(&reply);
    info!("Translated '{}' into {} command(s)", request, commands.len());

    let mut explanation = None;
    if ctx.learning_mode && !commands.is_empty() {
        match assistant.ask(&build_explanation_prompt(&commands)).await {
            Ok(tip) => explanation = tip,
            Err(e) => debug!("Explanation request failed: {:#}", e),
        }
    }

    Ok(TranslationResult {
        commands,
        explanation,
    })
}
