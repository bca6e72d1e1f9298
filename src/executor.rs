//! Shell command execution.
//!
//! One primitive, [`Executor::run`], hands an opaque command string to
//! `sh -c`. Screen-owning programs (editors, pagers, remote shells) are run
//! attached to the terminal; everything else has its output captured.
//!
//! On top of that primitive sit the three ways a translated plan is run:
//! - **single confirm**: show one command, run it on Enter
//! - **sequential**: run a whole plan, stop at the first failure
//! - **stepping**: ask `y/n/q` before every command
//!
//! Every command that actually runs, in every mode, is recorded in the
//! [`SessionLog`]. `cd` never spawns a process; it changes this process's
//! working directory instead.

use crate::cancel::CancelToken;
use crate::classifier::is_cd;
use crate::console::{ask_with_io, write_block};
use crate::session_log::SessionLog;
use anyhow::{Context, Result, anyhow};
use owo_colors::OwoColorize;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Output, Stdio};
use tracing::{info, warn};

/// Programs that need the controlling terminal and must not be captured.
pub const TERMINAL_COMMANDS: &[&str] = &[
    "clear", "top", "htop", "vim", "vi", "nvim", "nano", "less", "more", "man", "ssh", "tmux",
    "screen", "watch",
];

/// Exit code reported when the shell itself could not be started.
pub const SPAWN_FAILURE_CODE: i32 = 127;

/// What one command produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecutionOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// stdout followed by stderr, the form stored in the session log.
    pub fn combined_output(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// How a multi-command run ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub executed: usize,
    pub skipped: usize,
    /// 1-based position of the first command that exited non-zero.
    pub failed_at: Option<usize>,
    /// The user quit, input ended, or an interrupt arrived.
    pub aborted: bool,
}

// =============================================================================
// Traits for Dependency Injection
// =============================================================================

/// Runs shell command strings.
///
/// This abstraction enables testing without spawning real processes.
pub trait ProcessRunner: Send + Sync {
    /// Runs `command` and captures both streams.
    fn run_captured(&self, command: &str) -> Result<Output>;

    /// Runs `command` with the terminal's stdin, stdout and stderr.
    fn run_attached(&self, command: &str) -> Result<ExitStatus>;
}

/// Runs commands through `sh -c`.
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run_captured(&self, command: &str) -> Result<Output> {
        // commands like `rm -i` still prompt on the terminal
        Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::inherit())
            .output()
            .with_context(|| format!("failed to start shell for '{}'", command))
    }

    fn run_attached(&self, command: &str) -> Result<ExitStatus> {
        Command::new("sh")
            .arg("-c")
            .arg(command)
            .status()
            .with_context(|| format!("failed to start shell for '{}'", command))
    }
}

/// Exit code, mapping signal deaths to `128 + signal` like a shell does.
pub fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

// =============================================================================
// Executor Implementation
// =============================================================================

pub struct Executor {
    runner: Box<dyn ProcessRunner>,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    pub fn new() -> Self {
        Self::with_runner(Box::new(SystemProcessRunner))
    }

    pub fn with_runner(runner: Box<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    /// True when the first word of `command` is in [`TERMINAL_COMMANDS`].
    pub fn needs_terminal(command: &str) -> bool {
        command
            .split_whitespace()
            .next()
            .is_some_and(|first| TERMINAL_COMMANDS.contains(&first))
    }

    /// Runs one command. Never fails: a shell that cannot be started is
    /// reported as exit code [`SPAWN_FAILURE_CODE`] with the error on stderr.
    pub fn run(&self, command: &str) -> ExecutionOutcome {
        if Self::needs_terminal(command) {
            return self.run_in_terminal(command);
        }

        info!("Running captured: {}", command);
        match self.runner.run_captured(command) {
            Ok(output) => ExecutionOutcome {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                exit_code: exit_code(&output.status),
            },
            Err(e) => Self::spawn_failure(command, e),
        }
    }

    /// Runs `command` attached to the terminal. Only the exit code is kept.
    pub fn run_in_terminal(&self, command: &str) -> ExecutionOutcome {
        info!("Running attached to terminal: {}", command);
        match self.runner.run_attached(command) {
            Ok(status) => ExecutionOutcome {
                exit_code: exit_code(&status),
                ..Default::default()
            },
            Err(e) => Self::spawn_failure(command, e),
        }
    }

    fn spawn_failure(command: &str, error: anyhow::Error) -> ExecutionOutcome {
        warn!("Could not run '{}': {:#}", command, error);
        ExecutionOutcome {
            stdout: String::new(),
            stderr: format!("{:#}\n", error),
            exit_code: SPAWN_FAILURE_CODE,
        }
    }

    /// Changes the working directory of this process.
    ///
    /// An empty target means the home directory; a leading `~` is expanded.
    pub fn change_directory(target: &str) -> Result<PathBuf> {
        let target = target.trim();
        let home = || dirs::home_dir().ok_or_else(|| anyhow!("could not find home directory"));

        let path = if target.is_empty() || target == "~" {
            home()?
        } else if let Some(rest) = target.strip_prefix("~/") {
            home()?.join(rest)
        } else {
            PathBuf::from(target)
        };

        std::env::set_current_dir(&path).with_context(|| format!("{}", path.display()))?;
        info!("Changed directory to {}", path.display());
        Ok(path)
    }

    /// Runs `command` (or performs the `cd`) and records it in `log`.
    pub fn execute(&self, command: &str, log: &mut SessionLog) -> ExecutionOutcome {
        let outcome = if is_cd(command) {
            match Self::change_directory(&command[2..]) {
                Ok(_) => ExecutionOutcome::default(),
                Err(e) => ExecutionOutcome {
                    stdout: String::new(),
                    stderr: format!("cd: {:#}\n", e),
                    exit_code: 1,
                },
            }
        } else {
            self.run(command)
        };

        log.record(command, &outcome.combined_output(), outcome.exit_code);
        outcome
    }

    /// Runs a command typed (or forced with `!`) at the prompt and prints
    /// what it produced, with a failure marker on a non-zero exit.
    pub fn run_direct_with_io<W: Write>(
        &self,
        command: &str,
        log: &mut SessionLog,
        output: &mut W,
    ) -> Result<ExecutionOutcome> {
        let outcome = self.execute(command, log);
        write_block(output, &outcome.stdout)?;
        write_block(output, &outcome.stderr)?;
        if !outcome.success() {
            writeln!(output, "{}", format!("✗ exit {}", outcome.exit_code).red())?;
        }
        Ok(outcome)
    }

    /// Shows a single proposed command and runs it only on Enter (or `y`).
    ///
    /// Returns `None` when the user declines, input ends, or an interrupt
    /// arrived while the prompt was waiting.
    pub fn confirm_and_run_with_io<R: BufRead, W: Write>(
        &self,
        command: &str,
        log: &mut SessionLog,
        cancel: &CancelToken,
        input: &mut R,
        output: &mut W,
    ) -> Result<Option<ExecutionOutcome>> {
        let prompt = format!("{} {} ", format!("→ {}", command).yellow(), "[Enter]".dimmed());
        let answer = match ask_with_io(&prompt, input, output)? {
            Some(answer) => answer,
            None => return Ok(None),
        };

        let confirmed = matches!(answer.trim().to_lowercase().as_str(), "" | "y" | "yes");
        if cancel.is_cancelled() || !confirmed {
            writeln!(output, "{}", "Cancelled".dimmed())?;
            return Ok(None);
        }

        self.run_direct_with_io(command, log, output).map(Some)
    }

    /// Runs every command in order, stopping at the first non-zero exit.
    pub fn run_sequence_with_io<W: Write>(
        &self,
        commands: &[String],
        log: &mut SessionLog,
        cancel: &CancelToken,
        output: &mut W,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let total = commands.len();

        for (index, command) in commands.iter().enumerate() {
            if cancel.is_cancelled() {
                summary.aborted = true;
                break;
            }

            let step = index + 1;
            writeln!(output, "{} {}", format!("[{}/{}]", step, total).dimmed(), command)?;

            let outcome = self.execute(command, log);
            summary.executed += 1;
            Self::write_step_result(&outcome, output)?;

            if !outcome.success() {
                info!("Sequence stopped at step {} (exit {})", step, outcome.exit_code);
                summary.failed_at = Some(step);
                break;
            }
        }

        Ok(summary)
    }

    /// Asks before each command: `y`/Enter runs it, `n` skips it, `q` stops.
    pub fn run_stepping_with_io<R: BufRead, W: Write>(
        &self,
        commands: &[String],
        log: &mut SessionLog,
        cancel: &CancelToken,
        input: &mut R,
        output: &mut W,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let total = commands.len();

        for (index, command) in commands.iter().enumerate() {
            if cancel.is_cancelled() {
                summary.aborted = true;
                break;
            }

            let step = index + 1;
            let prompt = format!(
                "{} {} ",
                format!("[{}/{}] {}", step, total, command).yellow(),
                "[y/n/q]".dimmed()
            );
            let answer = match ask_with_io(&prompt, input, output)? {
                Some(answer) => answer.trim().to_lowercase(),
                None => {
                    summary.aborted = true;
                    break;
                }
            };
            if cancel.is_cancelled() {
                writeln!(output, "{}", "Stopped".dimmed())?;
                summary.aborted = true;
                break;
            }

            match answer.as_str() {
                "" | "y" | "yes" => {
                    let outcome = self.execute(command, log);
                    summary.executed += 1;
                    Self::write_step_result(&outcome, output)?;
                    if !outcome.success() && summary.failed_at.is_none() {
                        summary.failed_at = Some(step);
                    }
                }
                "q" | "quit" => {
                    writeln!(output, "{}", "Stopped".dimmed())?;
                    summary.aborted = true;
                    break;
                }
                _ => summary.skipped += 1,
            }
        }

        Ok(summary)
    }

    fn write_step_result<W: Write>(outcome: &ExecutionOutcome, output: &mut W) -> Result<()> {
        write_block(output, &outcome.stdout)?;
        if !outcome.stderr.is_empty() {
            write_block(output, &outcome.stderr.red().to_string())?;
        }
        if outcome.success() {
            writeln!(output, "{}", "✓".green())?;
        } else {
            writeln!(output, "{}", "✗".red())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::tests::InterruptingReader;
    use std::io::Cursor;
    use std::os::unix::process::ExitStatusExt;
    use std::sync::Mutex;

    // =========================================================================
    // Mock implementations
    // =========================================================================

    /// Records every command and fails the ones listed in `failing`.
    #[derive(Default)]
    struct MockProcessRunner {
        failing: Vec<String>,
        captured: Mutex<Vec<String>>,
        attached: Mutex<Vec<String>>,
    }

    impl MockProcessRunner {
        fn failing(commands: &[&str]) -> Self {
            Self {
                failing: commands.iter().map(|c| c.to_string()).collect(),
                ..Default::default()
            }
        }

        fn status_for(&self, command: &str) -> ExitStatus {
            if self.failing.iter().any(|c| c == command) {
                ExitStatus::from_raw(1 << 8)
            } else {
                ExitStatus::from_raw(0)
            }
        }
    }

    impl ProcessRunner for MockProcessRunner {
        fn run_captured(&self, command: &str) -> Result<Output> {
            self.captured.lock().unwrap().push(command.to_string());
            let status = self.status_for(command);
            Ok(Output {
                status,
                stdout: format!("ran {}\n", command).into_bytes(),
                stderr: if status.success() {
                    vec![]
                } else {
                    format!("{} failed\n", command).into_bytes()
                },
            })
        }

        fn run_attached(&self, command: &str) -> Result<ExitStatus> {
            self.attached.lock().unwrap().push(command.to_string());
            Ok(self.status_for(command))
        }
    }

    /// Shares the mock with the executor so tests can inspect it afterwards.
    struct SharedRunner(std::sync::Arc<MockProcessRunner>);

    impl ProcessRunner for SharedRunner {
        fn run_captured(&self, command: &str) -> Result<Output> {
            self.0.run_captured(command)
        }

        fn run_attached(&self, command: &str) -> Result<ExitStatus> {
            self.0.run_attached(command)
        }
    }

    struct BrokenRunner;

    impl ProcessRunner for BrokenRunner {
        fn run_captured(&self, _command: &str) -> Result<Output> {
            Err(anyhow!("no shell"))
        }

        fn run_attached(&self, _command: &str) -> Result<ExitStatus> {
            Err(anyhow!("no shell"))
        }
    }

    fn executor_with(runner: MockProcessRunner) -> (Executor, std::sync::Arc<MockProcessRunner>) {
        let shared = std::sync::Arc::new(runner);
        (Executor::with_runner(Box::new(SharedRunner(shared.clone()))), shared)
    }

    fn plan(commands: &[&str]) -> Vec<String> {
        commands.iter().map(|c| c.to_string()).collect()
    }

    fn ran(runner: &MockProcessRunner) -> Vec<String> {
        runner.captured.lock().unwrap().clone()
    }

    // =========================================================================
    // Single command tests
    // =========================================================================

    #[test]
    fn test_needs_terminal_checks_first_word() {
        assert!(Executor::needs_terminal("vim notes.md"));
        assert!(Executor::needs_terminal("ssh host"));
        assert!(!Executor::needs_terminal("ls -la"));
        assert!(!Executor::needs_terminal("echo vim"));
        assert!(!Executor::needs_terminal(""));
    }

    #[test]
    fn test_run_captures_output() {
        let (executor, _) = executor_with(MockProcessRunner::default());
        let outcome = executor.run("ls");
        assert_eq!(outcome.stdout, "ran ls\n");
        assert_eq!(outcome.exit_code, 0);
    }

    #[test]
    fn test_run_terminal_command_is_attached() {
        let (executor, runner) = executor_with(MockProcessRunner::default());
        let outcome = executor.run("less README.md");

        assert_eq!(outcome, ExecutionOutcome::default());
        assert_eq!(*runner.attached.lock().unwrap(), vec!["less README.md"]);
        assert!(ran(&runner).is_empty());
    }

    #[test]
    fn test_spawn_failure_becomes_outcome() {
        let executor = Executor::with_runner(Box::new(BrokenRunner));
        let outcome = executor.run("ls");
        assert_eq!(outcome.exit_code, SPAWN_FAILURE_CODE);
        assert!(outcome.stderr.contains("no shell"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_captured_command_shares_stdin() {
        let ours = match std::fs::read_link("/proc/self/fd/0") {
            Ok(path) => path,
            // no stdin to hand down
            Err(_) => return,
        };

        let outcome = Executor::new().run("readlink /proc/self/fd/0");

        assert!(outcome.success());
        assert_eq!(outcome.stdout.trim(), ours.to_string_lossy());
    }

    #[test]
    fn test_exit_code_from_signal() {
        // raw wait status 9 = killed by SIGKILL
        assert_eq!(exit_code(&ExitStatus::from_raw(9)), 137);
        assert_eq!(exit_code(&ExitStatus::from_raw(3 << 8)), 3);
    }

    #[test]
    fn test_execute_records_combined_output() {
        let (executor, _) = executor_with(MockProcessRunner::failing(&["make"]));
        let mut log = SessionLog::new();

        executor.execute("make", &mut log);

        let entry = log.last().unwrap();
        assert_eq!(entry.command, "make");
        assert_eq!(entry.output, "ran make\nmake failed\n");
        assert_eq!(entry.exit_code, 1);
    }

    #[test]
    fn test_execute_terminal_command_records_empty_output() {
        let (executor, _) = executor_with(MockProcessRunner::default());
        let mut log = SessionLog::new();

        executor.execute("top", &mut log);

        assert_eq!(log.last().unwrap().output, "");
    }

    #[test]
    fn test_direct_run_marks_failure() {
        let (executor, _) = executor_with(MockProcessRunner::failing(&["false"]));
        let mut log = SessionLog::new();
        let mut output = Vec::new();

        let outcome = executor.run_direct_with_io("false", &mut log, &mut output).unwrap();

        assert!(!outcome.success());
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("false failed"));
        assert!(text.contains("✗ exit 1"));
    }

    #[test]
    fn test_cd_changes_process_directory() {
        let (executor, runner) = executor_with(MockProcessRunner::default());
        let mut log = SessionLog::new();
        let original = std::env::current_dir().unwrap();
        let dir = tempfile::tempdir().unwrap();

        let outcome = executor.execute(&format!("cd {}", dir.path().display()), &mut log);
        let now = std::env::current_dir().unwrap();
        std::env::set_current_dir(&original).unwrap();

        assert!(outcome.success());
        assert_eq!(now.canonicalize().unwrap(), dir.path().canonicalize().unwrap());
        assert!(ran(&runner).is_empty());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_cd_to_missing_directory_fails() {
        let (executor, _) = executor_with(MockProcessRunner::default());
        let mut log = SessionLog::new();

        let outcome = executor.execute("cd /definitely/not/a/real/dir", &mut log);

        assert_eq!(outcome.exit_code, 1);
        assert!(outcome.stderr.starts_with("cd: "));
        assert_eq!(log.last().unwrap().exit_code, 1);
    }

    // =========================================================================
    // Single confirm tests
    // =========================================================================

    #[test]
    fn test_confirm_runs_on_enter() {
        let (executor, runner) = executor_with(MockProcessRunner::default());
        let mut log = SessionLog::new();
        let mut input = Cursor::new(b"\n");
        let mut output = Vec::new();

        let outcome = executor
            .confirm_and_run_with_io("ls -la", &mut log, &CancelToken::new(), &mut input, &mut output)
            .unwrap();

        assert!(outcome.is_some());
        assert_eq!(ran(&runner), vec!["ls -la"]);
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("→ ls -la"));
        assert!(text.contains("ran ls -la"));
    }

    #[test]
    fn test_confirm_cancels_on_other_input() {
        let (executor, runner) = executor_with(MockProcessRunner::default());
        let mut log = SessionLog::new();
        let mut input = Cursor::new(b"no thanks\n");
        let mut output = Vec::new();

        let outcome = executor
            .confirm_and_run_with_io(
                "rm -rf build",
                &mut log,
                &CancelToken::new(),
                &mut input,
                &mut output,
            )
            .unwrap();

        assert!(outcome.is_none());
        assert!(ran(&runner).is_empty());
        assert!(log.is_empty());
    }

    #[test]
    fn test_confirm_cancels_at_eof() {
        let (executor, runner) = executor_with(MockProcessRunner::default());
        let mut log = SessionLog::new();
        let mut input = Cursor::new(b"");
        let mut output = Vec::new();

        let outcome = executor
            .confirm_and_run_with_io("ls", &mut log, &CancelToken::new(), &mut input, &mut output)
            .unwrap();

        assert!(outcome.is_none());
        assert!(ran(&runner).is_empty());
    }

    #[test]
    fn test_confirm_interrupted_at_prompt_does_not_run() {
        let (executor, runner) = executor_with(MockProcessRunner::default());
        let mut log = SessionLog::new();
        let cancel = CancelToken::new();
        let mut input = InterruptingReader::new(b"\n", cancel.clone());
        let mut output = Vec::new();

        let outcome = executor
            .confirm_and_run_with_io("rm -rf build", &mut log, &cancel, &mut input, &mut output)
            .unwrap();

        assert!(outcome.is_none());
        assert!(ran(&runner).is_empty());
        assert!(log.is_empty());
        assert!(String::from_utf8(output).unwrap().contains("Cancelled"));
    }

    // =========================================================================
    // Sequential tests
    // =========================================================================

    #[test]
    fn test_sequence_stops_at_failed_cd() {
        let (executor, runner) = executor_with(MockProcessRunner::default());
        let mut log = SessionLog::new();
        let mut output = Vec::new();

        let summary = executor
            .run_sequence_with_io(
                &plan(&["cd /definitely/not/a/real/dir", "b"]),
                &mut log,
                &CancelToken::new(),
                &mut output,
            )
            .unwrap();

        assert!(ran(&runner).is_empty());
        assert_eq!(summary.failed_at, Some(1));
        assert_eq!(log.len(), 1);
        let entry = log.last().unwrap();
        assert_eq!(entry.command, "cd /definitely/not/a/real/dir");
        assert_eq!(entry.exit_code, 1);
    }

    #[test]
    fn test_sequence_stops_at_first_failure() {
        let (executor, runner) = executor_with(MockProcessRunner::failing(&["b"]));
        let mut log = SessionLog::new();
        let mut output = Vec::new();

        let summary = executor
            .run_sequence_with_io(&plan(&["a", "b", "c"]), &mut log, &CancelToken::new(), &mut output)
            .unwrap();

        assert_eq!(ran(&runner), vec!["a", "b"]);
        assert_eq!(summary.failed_at, Some(2));
        assert_eq!(summary.executed, 2);
        assert_eq!(log.len(), 2);

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("[1/3]"));
        assert!(text.contains("[2/3]"));
        assert!(!text.contains("[3/3]"));
    }

    #[test]
    fn test_sequence_runs_everything_on_success() {
        let (executor, runner) = executor_with(MockProcessRunner::default());
        let mut log = SessionLog::new();
        let mut output = Vec::new();

        let summary = executor
            .run_sequence_with_io(&plan(&["a", "b", "c"]), &mut log, &CancelToken::new(), &mut output)
            .unwrap();

        assert_eq!(ran(&runner), vec!["a", "b", "c"]);
        assert_eq!(summary.failed_at, None);
        assert_eq!(summary.executed, 3);
    }

    #[test]
    fn test_sequence_observes_cancellation() {
        let (executor, runner) = executor_with(MockProcessRunner::default());
        let mut log = SessionLog::new();
        let mut output = Vec::new();
        let cancel = CancelToken::new();
        cancel.cancel();

        let summary = executor
            .run_sequence_with_io(&plan(&["a", "b"]), &mut log, &cancel, &mut output)
            .unwrap();

        assert!(summary.aborted);
        assert!(ran(&runner).is_empty());
    }

    // =========================================================================
    // Stepping tests
    // =========================================================================

    #[test]
    fn test_stepping_quit_stops_remaining() {
        let (executor, runner) = executor_with(MockProcessRunner::default());
        let mut log = SessionLog::new();
        let mut input = Cursor::new(b"y\nq\n");
        let mut output = Vec::new();

        let summary = executor
            .run_stepping_with_io(
                &plan(&["a", "b", "c"]),
                &mut log,
                &CancelToken::new(),
                &mut input,
                &mut output,
            )
            .unwrap();

        assert_eq!(ran(&runner), vec!["a"]);
        assert!(summary.aborted);
        assert!(String::from_utf8(output).unwrap().contains("Stopped"));
    }

    #[test]
    fn test_stepping_skip_continues() {
        let (executor, runner) = executor_with(MockProcessRunner::default());
        let mut log = SessionLog::new();
        let mut input = Cursor::new(b"y\nn\ny\n");
        let mut output = Vec::new();

        let summary = executor
            .run_stepping_with_io(
                &plan(&["a", "b", "c"]),
                &mut log,
                &CancelToken::new(),
                &mut input,
                &mut output,
            )
            .unwrap();

        assert_eq!(ran(&runner), vec!["a", "c"]);
        assert_eq!(summary.executed, 2);
        assert_eq!(summary.skipped, 1);
        assert!(!summary.aborted);

        // a skipped command leaves no trace in the log
        let logged: Vec<String> = log.entries().map(|e| e.command.clone()).collect();
        assert_eq!(logged, vec!["a", "c"]);
    }

    #[test]
    fn test_stepping_enter_runs_and_failure_does_not_stop() {
        let (executor, runner) = executor_with(MockProcessRunner::failing(&["a"]));
        let mut log = SessionLog::new();
        let mut input = Cursor::new(b"\nyes\n");
        let mut output = Vec::new();

        let summary = executor
            .run_stepping_with_io(
                &plan(&["a", "b"]),
                &mut log,
                &CancelToken::new(),
                &mut input,
                &mut output,
            )
            .unwrap();

        assert_eq!(ran(&runner), vec!["a", "b"]);
        assert_eq!(summary.failed_at, Some(1));
        assert_eq!(log.last().unwrap().exit_code, 0);
    }

    #[test]
    fn test_stepping_interrupted_at_prompt_aborts() {
        let (executor, runner) = executor_with(MockProcessRunner::default());
        let mut log = SessionLog::new();
        let cancel = CancelToken::new();
        let mut input = InterruptingReader::new(b"y\ny\n", cancel.clone());
        let mut output = Vec::new();

        let summary = executor
            .run_stepping_with_io(&plan(&["a", "b"]), &mut log, &cancel, &mut input, &mut output)
            .unwrap();

        assert!(summary.aborted);
        assert_eq!(summary.executed, 0);
        assert!(ran(&runner).is_empty());
    }

    #[test]
    fn test_stepping_eof_aborts() {
        let (executor, runner) = executor_with(MockProcessRunner::default());
        let mut log = SessionLog::new();
        let mut input = Cursor::new(b"y\n");
        let mut output = Vec::new();

        let summary = executor
            .run_stepping_with_io(
                &plan(&["a", "b"]),
                &mut log,
                &CancelToken::new(),
                &mut input,
                &mut output,
            )
            .unwrap();

        assert_eq!(ran(&runner), vec!["a"]);
        assert!(summary.aborted);
    }
}
