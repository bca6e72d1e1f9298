//! Line-oriented prompts over injected streams.
//!
//! Every interactive question in termnl goes through these helpers so the
//! same code path runs against stdin/stdout in production and against a
//! `Cursor` and a `Vec<u8>` in tests.

use anyhow::Result;
use owo_colors::OwoColorize;
use std::io::{BufRead, Write};

/// Writes `prompt`, then reads one line.
///
/// Returns `None` at end of input. The trailing newline is stripped but
/// other whitespace is preserved so callers can decide how strict to be.
pub fn ask_with_io<R: BufRead, W: Write>(
    prompt: &str,
    input: &mut R,
    output: &mut W,
) -> Result<Option<String>> {
    write!(output, "{}", prompt)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}

/// Asks a `[y/N]` question. Anything but `y`/`yes` is a no.
pub fn confirm_with_io<R: BufRead, W: Write>(
    question: &str,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    let prompt = format!("{} ", format!("{} [y/N]", question).yellow());
    let answer = ask_with_io(&prompt, input, output)?;
    Ok(matches!(
        answer.as_deref().map(|a| a.trim().to_lowercase()).as_deref(),
        Some("y") | Some("yes")
    ))
}

/// Writes `text`, adding a newline if it does not already end with one.
pub fn write_block<W: Write>(output: &mut W, text: &str) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    write!(output, "{}", text)?;
    if !text.ends_with('\n') {
        writeln!(output)?;
    }
    Ok(())
}
