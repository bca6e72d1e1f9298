//! Installation housekeeping: auto-launch, self-update and uninstall.
//!
//! These touch files outside termnl's own config (shell rc files, the
//! installed binary), so every path is passed in and tests point them at a
//! temporary directory.

use crate::console::confirm_with_io;
use crate::executor::Executor;
use crate::http_client::HttpClient;
use anyhow::{Result, anyhow};
use owo_colors::OwoColorize;
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const UPSTREAM_REPO: &str = "https://github.com/nithinworks/termnl";

const AUTOLAUNCH_MARKER: &str = "termnl # auto-launch";
const AUTOLAUNCH_COMMENT: &str = "# termnl - auto-launch on terminal start";
const AUTOLAUNCH_LINE: &str = "[ -t 0 ] && [ -z \"$TERMNL_RUNNING\" ] && command -v termnl >/dev/null 2>&1 && export TERMNL_RUNNING=1 && termnl # auto-launch";

const RC_FILES: &[&str] = &[".zshrc", ".bashrc", ".zprofile", ".bash_profile"];

/// Shell startup files in the user's home directory, existing or not.
pub fn shell_rc_files() -> Result<Vec<PathBuf>> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
    Ok(RC_FILES.iter().map(|name| home.join(name)).collect())
}

// =============================================================================
// Auto-launch
// =============================================================================

/// True when any existing rc file carries the launch marker.
pub fn autolaunch_enabled(rc_files: &[PathBuf]) -> Result<bool> {
    for path in rc_files.iter().filter(|p| p.exists()) {
        if fs::read_to_string(path)?.contains(AUTOLAUNCH_MARKER) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Flips auto-launch in every existing rc file and returns the new state.
pub fn toggle_autolaunch_with_io<W: Write>(rc_files: &[PathBuf], output: &mut W) -> Result<bool> {
    if autolaunch_enabled(rc_files)? {
        for path in rc_files.iter().filter(|p| p.exists()) {
            let content = fs::read_to_string(path)?;
            let cleaned = strip_autolaunch(&content);
            if cleaned != content {
                fs::write(path, cleaned)?;
                info!("Removed auto-launch from {}", path.display());
            }
        }
        writeln!(output, "{}", "✗ Auto-launch disabled".yellow())?;
        writeln!(output, "{}", "Type 'termnl' to start manually".dimmed())?;
        return Ok(false);
    }

    let mut touched = 0;
    for path in rc_files.iter().filter(|p| p.exists()) {
        let mut content = fs::read_to_string(path)?;
        content.push_str(&format!("\n{}\n{}\n", AUTOLAUNCH_COMMENT, AUTOLAUNCH_LINE));
        fs::write(path, content)?;
        info!("Added auto-launch to {}", path.display());
        touched += 1;
    }

    if touched == 0 {
        writeln!(output, "{}", "⚠ No shell config files found".yellow())?;
        return Ok(false);
    }
    writeln!(output, "{}", "✓ Auto-launch enabled".green())?;
    writeln!(output, "{}", "termnl will start when you open a new terminal".dimmed())?;
    Ok(true)
}

/// Drops the marker and comment lines and the blank lines around them.
fn strip_autolaunch(content: &str) -> String {
    let mut kept = String::with_capacity(content.len());
    let mut skip_next_blank = false;
    for line in content.split_inclusive('\n') {
        if line.contains(AUTOLAUNCH_MARKER) || line.contains(AUTOLAUNCH_COMMENT) {
            // the blank line written in front of the block goes too
            if kept.ends_with("\n\n") {
                kept.pop();
            }
            skip_next_blank = true;
            continue;
        }
        if skip_next_blank && line.trim().is_empty() {
            skip_next_blank = false;
            continue;
        }
        skip_next_blank = false;
        kept.push_str(line);
    }
    kept
}

// =============================================================================
// Self-update
// =============================================================================

/// `[package].version` from a Cargo manifest.
pub fn parse_package_version(manifest: &str) -> Option<String> {
    let value: toml::Value = toml::from_str(manifest).ok()?;
    value
        .get("package")?
        .get("version")?
        .as_str()
        .map(str::to_string)
}

/// Checks the published version and reinstalls with cargo when it differs.
pub async fn self_update_with_io<R: BufRead, W: Write>(
    http: &dyn HttpClient,
    executor: &Executor,
    current_version: &str,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    writeln!(output, "{}", "Checking for updates...".cyan())?;
    writeln!(output, "{}", format!("Current version: v{}", current_version).dimmed())?;

    let url = format!("{}/raw/main/Cargo.toml", UPSTREAM_REPO);
    let latest = match http.get_text(&url).await {
        Ok(response) if response.is_success() => parse_package_version(&response.body),
        Ok(response) => {
            warn!("Update check returned {}", response.status);
            None
        }
        Err(e) => {
            warn!("Update check failed: {:#}", e);
            None
        }
    };

    let latest = match latest {
        Some(version) => version,
        None => {
            writeln!(
                output,
                "{}",
                "✗ Could not check for updates - check your internet connection".red()
            )?;
            return Ok(());
        }
    };

    writeln!(output, "{}", format!("Latest version: v{}", latest).dimmed())?;
    if latest == current_version {
        writeln!(output, "{}", "✓ Already up to date!".green())?;
        return Ok(());
    }

    if !confirm_with_io(&format!("Install v{}?", latest), input, output)? {
        return Ok(());
    }

    let command = format!("cargo install --git {} --force", UPSTREAM_REPO);
    writeln!(output, "{}", command.dimmed())?;
    let outcome = executor.run_in_terminal(&command);
    if outcome.success() {
        writeln!(output, "{}", "✓ Update complete!".green())?;
        writeln!(output, "{}", "Restart termnl to use the new version".dimmed())?;
    } else {
        writeln!(
            output,
            "{}",
            format!("✗ Update failed (exit {})", outcome.exit_code).red()
        )?;
    }
    Ok(())
}

// =============================================================================
// Uninstall
// =============================================================================

/// Everything an uninstall removes.
#[derive(Debug, Clone)]
pub struct InstallPaths {
    pub config_dir: PathBuf,
    pub binary: Option<PathBuf>,
    pub rc_files: Vec<PathBuf>,
}

impl InstallPaths {
    pub fn detect() -> Result<Self> {
        Ok(Self {
            config_dir: crate::config::Config::get_config_dir()?,
            binary: std::env::current_exe().ok(),
            rc_files: shell_rc_files()?,
        })
    }
}

/// Asks for confirmation, then removes termnl. Returns whether it did.
pub fn uninstall_with_io<R: BufRead, W: Write>(
    paths: &InstallPaths,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    if !confirm_with_io("Remove termnl?", input, output)? {
        return Ok(false);
    }

    if paths.config_dir.exists() {
        fs::remove_dir_all(&paths.config_dir)?;
        info!("Removed {}", paths.config_dir.display());
    }
    if let Some(binary) = paths.binary.as_deref().filter(|b| b.exists()) {
        remove_binary(binary)?;
    }
    for path in paths.rc_files.iter().filter(|p| p.exists()) {
        let content = fs::read_to_string(path)?;
        let cleaned: String = content
            .split_inclusive('\n')
            .filter(|line| !line.contains("termnl"))
            .collect();
        if cleaned != content {
            fs::write(path, cleaned)?;
        }
    }

    writeln!(output, "{}", "✓ termnl uninstalled".green())?;
    Ok(true)
}

fn remove_binary(binary: &Path) -> Result<()> {
    fs::remove_file(binary)?;
    info!("Removed {}", binary.display());
    Ok(())
}
