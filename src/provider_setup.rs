//! Interactive provider selection, used on first run and by `!provider`.

use crate::builtins::{print_banner, print_help};
use crate::config::{Config, ConfigStore};
use crate::console::ask_with_io;
use crate::http_client::HttpClient;
use crate::llm_client::{DEFAULT_OPENROUTER_MODEL, KeyCheck, Provider, validate_key};
use anyhow::{Context, Result, anyhow};
use owo_colors::OwoColorize;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::info;

/// What the user picked. Applied to the config by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderChoice {
    pub provider: Provider,
    pub api_key: String,
    /// Only meaningful for OpenRouter.
    pub model: String,
}

impl ProviderChoice {
    /// Makes this choice the active provider in `config`.
    pub fn apply_to(self, config: &mut Config) {
        config.provider = self.provider;
        if self.provider == Provider::OpenRouter {
            config.openrouter_model = self.model;
        }
        config.set_api_key(self.provider, self.api_key);
    }
}

/// Walks the user through picking a provider and entering a key.
///
/// Returns `None` if the user gave no key, the key was rejected, or input
/// ended. `current_model` is kept when the user picks Gemini.
pub async fn setup_provider_with_io<R: BufRead, W: Write>(
    http: Arc<dyn HttpClient>,
    current_model: &str,
    input: &mut R,
    output: &mut W,
) -> Result<Option<ProviderChoice>> {
    writeln!(output)?;
    writeln!(output, "{}", "Choose your AI provider:".bold())?;
    writeln!(output, "  {} Gemini {}", "1.".cyan(), "(free, recommended)".dimmed())?;
    writeln!(output, "  {} OpenRouter {}", "2.".cyan(), "(200+ models)".dimmed())?;
    writeln!(output)?;

    let choice = match ask_with_io(&format!("{}", "> ".yellow()), input, output)? {
        Some(choice) => choice,
        None => return Ok(None),
    };
    let provider = if choice.trim() == "2" {
        Provider::OpenRouter
    } else {
        Provider::Gemini
    };

    writeln!(output)?;
    writeln!(output, "{}", format!("Get your key at: {}", provider.key_url()).cyan())?;
    writeln!(output)?;

    let prompt = format!("{} ", format!("Enter your {} API key:", provider.label()).yellow());
    let api_key = ask_with_io(&prompt, input, output)?
        .map(|k| k.trim().to_string())
        .unwrap_or_default();
    if api_key.is_empty() {
        writeln!(output, "No API key provided.")?;
        return Ok(None);
    }

    writeln!(output, "{}", "Validating key...".dimmed())?;
    match validate_key(http, provider, &api_key).await {
        KeyCheck::Valid => writeln!(output, "{}", "✓ API key validated!".green())?,
        KeyCheck::Unverified => writeln!(
            output,
            "{}",
            "⚠ Could not validate (network issue?), saving anyway".yellow()
        )?,
        KeyCheck::Invalid => {
            writeln!(output, "{}", "✗ Invalid API key".red())?;
            writeln!(output, "{}", "Please check your key and try again".dimmed())?;
            return Ok(None);
        }
    }

    let model = if provider == Provider::OpenRouter {
        writeln!(output)?;
        let prompt = format!(
            "{} {}{} ",
            "Enter model".yellow(),
            format!("(default: {})", DEFAULT_OPENROUTER_MODEL).dimmed(),
            ":".yellow()
        );
        ask_with_io(&prompt, input, output)?
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.to_string())
    } else {
        current_model.to_string()
    };

    writeln!(output, "{}", "✓ Provider configured!".green())?;
    writeln!(output)?;
    info!("Configured provider {} (model {})", provider, model);

    Ok(Some(ProviderChoice {
        provider,
        api_key,
        model,
    }))
}

/// Setup for a user with no key yet: pick a provider, save it, then greet.
///
/// # Errors
///
/// Fails when no provider was configured, since termnl cannot translate
/// anything without one.
pub async fn first_run_with_io<R: BufRead, W: Write>(
    config: &mut Config,
    store: &dyn ConfigStore,
    http: Arc<dyn HttpClient>,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    info!("No key for {}, running first-time setup", config.provider);
    let choice = setup_provider_with_io(http, &config.openrouter_model, input, output)
        .await?
        .ok_or_else(|| anyhow!("No provider configured. Run termnl again to set one up."))?;
    choice.apply_to(config);
    store.save(config).context("could not save config")?;

    print_banner(output)?;
    print_help(output)?;
    Ok(())
}
