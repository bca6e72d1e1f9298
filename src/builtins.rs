//! Control commands handled by termnl itself.

use anyhow::Result;
use owo_colors::OwoColorize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Provider,
    Model,
    Learn,
    Autolaunch,
    Update,
    Uninstall,
    Help,
}

impl Builtin {
    pub const ALL: [Builtin; 7] = [
        Builtin::Learn,
        Builtin::Provider,
        Builtin::Model,
        Builtin::Autolaunch,
        Builtin::Update,
        Builtin::Uninstall,
        Builtin::Help,
    ];

    /// Exact match on the literal token, e.g. `!learn`.
    pub fn parse(input: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.token() == input)
    }

    pub fn token(&self) -> &'static str {
        match self {
            Builtin::Provider => "!provider",
            Builtin::Model => "!model",
            Builtin::Learn => "!learn",
            Builtin::Autolaunch => "!autolaunch",
            Builtin::Update => "!update",
            Builtin::Uninstall => "!uninstall",
            Builtin::Help => "!help",
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            Builtin::Provider => "Switch AI provider (Gemini/OpenRouter)",
            Builtin::Model => "Change OpenRouter model",
            Builtin::Learn => "Toggle learning mode",
            Builtin::Autolaunch => "Toggle auto-launch on terminal start",
            Builtin::Update => "Update to latest version",
            Builtin::Uninstall => "Remove termnl",
            Builtin::Help => "Show this help",
        }
    }
}

pub fn print_banner<W: Write>(output: &mut W) -> Result<()> {
    writeln!(output)?;
    writeln!(
        output,
        "{} {}",
        "termnl".cyan().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    )?;
    writeln!(output, "{}", "Type commands or describe what you want in plain English".dimmed())?;
    writeln!(output)?;
    Ok(())
}

pub fn print_help<W: Write>(output: &mut W) -> Result<()> {
    writeln!(output, "{}", "Commands:".bold())?;
    writeln!(output, "  {}{:<10} - Force run command without AI", "!".cyan(), "<cmd>")?;
    for builtin in Builtin::ALL {
        writeln!(output, "  {:<11} - {}", builtin.token().cyan(), builtin.summary())?;
    }
    writeln!(
        output,
        "  {:<11} - Exit termnl, return to normal shell",
        "exit/quit".cyan()
    )?;
    writeln!(output)?;
    Ok(())
}
