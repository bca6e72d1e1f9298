//! termnl - a natural language shell.
//!
//! Each line typed at the prompt is either run as a shell command, handled as
//! a builtin (`!learn`, `!provider`, ...), or sent to an AI provider and
//! translated into one or more shell commands that run after confirmation.
//!
//! # Architecture
//!
//! - [`classifier`] - Decides whether a line is shell, builtin or natural language
//! - [`session_log`] - Bounded history of recent commands, rendered as prompt context
//! - [`executor`] - Runs commands with single-confirm, sequential and stepping modes
//! - [`translator`] - Builds the translation prompt and parses the reply
//! - [`command_router`] - The REPL loop that ties everything together
//! - [`builtins`] - The `!` control commands and help screen
//! - [`cancel`] - Ctrl-C handling via a cancellation token
//! - [`llm_client`] - Gemini and OpenRouter clients plus an offline mock
//! - [`provider_setup`] - Interactive provider and key selection
//! - [`config`] - Configuration file and environment overrides
//! - [`system`] - Auto-launch, self-update and uninstall
//! - [`console`] - Prompt helpers over injected streams
//! - [`providers`] - Shared dependency injection traits
//! - [`http_client`] - HTTP client abstraction
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use termnl::cancel::CancelToken;
//! use termnl::command_router::CommandRouter;
//! use termnl::config::{Config, FileConfigStore};
//! use termnl::http_client::{HttpClient, ReqwestHttpClient};
//! use termnl::llm_client::build_assistant;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());
//!     let assistant = build_assistant(&config, http.clone())?;
//!     let store = Box::new(FileConfigStore::default_location()?);
//!
//!     let mut router = CommandRouter::new(config, store, http, assistant, CancelToken::new());
//!     router
//!         .run_with_io(&mut std::io::stdin().lock(), &mut std::io::stdout())
//!         .await
//! }
//! ```

pub mod builtins;
pub mod cancel;
pub mod classifier;
pub mod command_router;
pub mod config;
pub mod console;
pub mod executor;
pub mod http_client;
pub mod llm_client;
pub mod provider_setup;
pub mod providers;
pub mod session_log;
pub mod system;
pub mod translator;
