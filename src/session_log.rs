//! Bounded log of recently executed commands.
//!
//! The log is the only memory the translator gets between requests. It keeps
//! at most [`SESSION_CAPACITY`] entries and, once it holds more than one,
//! never more than [`TOKEN_BUDGET`] characters of command plus output.
//! Eviction is strictly oldest-first.

use crate::providers::{SystemTimeProvider, TimeProvider};
use std::collections::VecDeque;

pub const SESSION_CAPACITY: usize = 12;
/// Rough character budget for the context window.
pub const TOKEN_BUDGET: usize = 5000;
/// Output is cut to this many characters before it is stored.
pub const OUTPUT_LIMIT: usize = 600;
pub const CONTEXT_ENTRIES: usize = 6;
pub const CONTEXT_OUTPUT_LINES: usize = 3;
pub const EMPTY_CONTEXT: &str = "(no previous commands)";

/// One executed command. Never modified after it is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub command: String,
    pub output: String,
    pub exit_code: i32,
    /// Unix seconds.
    pub timestamp: u64,
}

impl HistoryEntry {
    fn weight(&self) -> usize {
        self.command.chars().count() + self.output.chars().count()
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

pub struct SessionLog {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    token_budget: usize,
    clock: Box<dyn TimeProvider>,
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLog {
    pub fn new() -> Self {
        Self::with_limits(SESSION_CAPACITY, TOKEN_BUDGET)
    }

    pub fn with_limits(capacity: usize, token_budget: usize) -> Self {
        Self::with_clock(capacity, token_budget, Box::new(SystemTimeProvider))
    }

    pub fn with_clock(capacity: usize, token_budget: usize, clock: Box<dyn TimeProvider>) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            token_budget,
            clock,
        }
    }

    /// Appends a command and its combined output, then evicts from the front
    /// until both the count and the character budget hold.
    pub fn record(&mut self, command: &str, output: &str, exit_code: i32) {
        self.entries.push_back(HistoryEntry {
            command: command.to_string(),
            output: output.chars().take(OUTPUT_LIMIT).collect(),
            exit_code,
            timestamp: self.clock.now(),
        });

        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }

        while self.entries.len() > 1 && self.total_chars() > self.token_budget {
            self.entries.pop_front();
        }
    }

    /// Compact digest of the last few entries for the translation prompt.
    ///
    /// Each entry becomes a `[✓] $ cmd` (or `[✗]`) line followed by up to
    /// three indented non-blank lines of its output.
    pub fn render_context(&self) -> String {
        if self.entries.is_empty() {
            return EMPTY_CONTEXT.to_string();
        }

        let skip = self.entries.len().saturating_sub(CONTEXT_ENTRIES);
        let mut parts = Vec::new();
        for entry in self.entries.iter().skip(skip) {
            let status = if entry.succeeded() { "✓" } else { "✗" };
            parts.push(format!("[{}] $ {}", status, entry.command));
            // only the block as a whole is trimmed; inner indentation stays
            for line in entry
                .output
                .trim()
                .lines()
                .map(str::trim_end)
                .filter(|l| !l.trim().is_empty())
                .take(CONTEXT_OUTPUT_LINES)
            {
                parts.push(format!("    {}", line));
            }
        }
        parts.join("\n")
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn token_budget(&self) -> usize {
        self.token_budget
    }

    /// Combined character length of every stored command and output.
    pub fn total_chars(&self) -> usize {
        self.entries.iter().map(HistoryEntry::weight).sum()
    }
}
