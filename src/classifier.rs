//! Input classification.
//!
//! Decides whether a line typed at the prompt is a builtin control command,
//! literal shell syntax, or a natural-language request. This is a scored
//! heuristic over coarse lexical signals, not a shell grammar.
//!
//! The weights below are load-bearing: changing any of them changes which
//! inputs get sent to the AI provider.

use std::collections::HashSet;

/// Category assigned to a single input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Empty input, `!`-prefixed control commands, `exit` and `quit`.
    Builtin,
    /// Run as-is through the shell.
    Shell,
    /// Translate into shell commands first.
    Natural,
}

/// Token starts with `./`, `/` or `~`.
pub const PATH_INVOCATION_WEIGHT: f64 = 3.0;
/// Token starts with `$`.
pub const VARIABLE_EXPANSION_WEIGHT: f64 = 2.5;
/// Token resolves on `PATH`.
pub const EXECUTABLE_ON_PATH_WEIGHT: f64 = 2.0;
/// Any of [`SHELL_OPERATORS`] present.
pub const SHELL_OPERATOR_WEIGHT: f64 = 2.5;
/// A lone `>` redirection.
pub const REDIRECTION_WEIGHT: f64 = 2.0;
/// Two or more stop words.
pub const STOP_WORDS_PENALTY: f64 = -2.0;
/// Exactly one stop word in more than two distinct tokens.
pub const SINGLE_STOP_WORD_PENALTY: f64 = -0.5;
/// Four or more words without strong shell signals.
pub const LONG_SENTENCE_PENALTY: f64 = -1.5;
/// Score below which the long-sentence penalty applies.
pub const LONG_SENTENCE_CEILING: f64 = 2.0;
/// Sentence-cased multi-word input.
pub const SENTENCE_CASE_PENALTY: f64 = -1.0;
/// Contains a question mark.
pub const QUESTION_PENALTY: f64 = -3.0;
/// Up to three lowercase words with no stop words.
pub const SHORT_LOWERCASE_BONUS: f64 = 1.0;
/// Minimum score for [`Classification::Shell`].
pub const SHELL_THRESHOLD: f64 = 1.0;

pub const SHELL_OPERATORS: &[&str] = &["|", "&&", "||", ">>", ">;", ";", "$(", "`"];

pub const STOP_WORDS: &[&str] = &[
    "how", "what", "why", "where", "when", "who", "which", "can", "could", "would", "should",
    "please", "help", "tell", "give", "is", "are", "do", "does", "the", "my", "me", "all",
    "about", "need", "want",
];

/// Classifies `text`, consulting `PATH` for the command token.
pub fn classify(text: &str) -> Classification {
    classify_with(text, |token| which::which(token).is_ok())
}

/// Classifies `text` with an injected executable lookup.
pub fn classify_with(text: &str, is_executable: impl Fn(&str) -> bool) -> Classification {
    let stripped = text.trim();
    if stripped.is_empty() || stripped.starts_with('!') || stripped == "exit" || stripped == "quit" {
        return Classification::Builtin;
    }

    // `cd` only makes sense in-process, never through translation.
    if is_cd(stripped) {
        return Classification::Shell;
    }

    if score_with(stripped, is_executable) >= SHELL_THRESHOLD {
        Classification::Shell
    } else {
        Classification::Natural
    }
}

/// True for `cd` alone or `cd <args>`.
pub fn is_cd(command: &str) -> bool {
    command == "cd" || command.starts_with("cd ")
}

/// Raw heuristic score for an already trimmed, non-empty line.
pub fn score_with(stripped: &str, is_executable: impl Fn(&str) -> bool) -> f64 {
    let words: Vec<&str> = stripped.split_whitespace().collect();
    let effective = effective_token(&words);

    let mut score = 0.0;

    if effective.starts_with("./") || effective.starts_with('/') || effective.starts_with('~') {
        score += PATH_INVOCATION_WEIGHT;
    }
    if effective.starts_with('$') {
        score += VARIABLE_EXPANSION_WEIGHT;
    }
    if !effective.is_empty() && is_executable(effective) {
        score += EXECUTABLE_ON_PATH_WEIGHT;
    }
    if SHELL_OPERATORS.iter().any(|op| stripped.contains(op)) {
        score += SHELL_OPERATOR_WEIGHT;
    }
    if stripped.contains('>') && !stripped.contains(">>") && !stripped.contains('→') {
        score += REDIRECTION_WEIGHT;
    }

    let lowered = stripped.to_lowercase();
    let distinct: HashSet<&str> = lowered.split_whitespace().collect();
    let overlap = distinct.iter().filter(|t| STOP_WORDS.contains(t)).count();

    if overlap >= 2 {
        score += STOP_WORDS_PENALTY;
    } else if overlap == 1 && distinct.len() > 2 {
        score += SINGLE_STOP_WORD_PENALTY;
    }

    let word_count = words.len();
    if word_count >= 4 && score < LONG_SENTENCE_CEILING {
        score += LONG_SENTENCE_PENALTY;
    }

    if stripped.chars().next().is_some_and(char::is_uppercase) && word_count > 1 {
        score += SENTENCE_CASE_PENALTY;
    }

    if stripped.contains('?') {
        score += QUESTION_PENALTY;
    }

    if word_count <= 3 && overlap == 0 && is_all_lowercase(stripped) {
        score += SHORT_LOWERCASE_BONUS;
    }

    score
}

/// Skips leading `NAME=value` assignments so `FOO=bar ls` scores on `ls`.
fn effective_token<'a>(words: &[&'a str]) -> &'a str {
    let first = words.first().copied().unwrap_or("");
    if !is_assignment(first) {
        return first;
    }
    words
        .iter()
        .copied()
        .find(|w| !is_assignment(w))
        .unwrap_or(first)
}

fn is_assignment(token: &str) -> bool {
    token.contains('=') && !token.starts_with('=')
}

// At least one cased character and none uppercase.
fn is_all_lowercase(text: &str) -> bool {
    let mut cased = false;
    for c in text.chars() {
        if c.is_uppercase() {
            return false;
        }
        if c.is_lowercase() {
            cased = true;
        }
    }
    cased
}
