use clap::{Arg, ArgAction, Command};
use std::io;
use std::sync::Arc;
use termnl::cancel::{CancelToken, listen_for_interrupts};
use termnl::command_router::CommandRouter;
use termnl::config::{Config, FileConfigStore};
use termnl::http_client::{HttpClient, ReqwestHttpClient};
use termnl::llm_client::build_assistant;
use termnl::provider_setup::first_run_with_io;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let matches = Command::new("termnl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Natural language shell - type commands or describe what you want")
        .long_about(
            "termnl runs shell commands as typed and translates plain-English requests \
             into shell commands, asking before it runs anything it generated",
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Show configuration information")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    if matches.get_flag("config") {
        Config::show_config_info()?;
        return Ok(());
    }

    let mut config = Config::load()?;
    let store = FileConfigStore::default_location()?;
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    if config.api_key().is_none() && !config.is_mock_mode() {
        first_run_with_io(&mut config, &store, http.clone(), &mut input, &mut output).await?;
    }

    let assistant = build_assistant(&config, http.clone())?;
    let cancel = CancelToken::new();
    listen_for_interrupts(cancel.clone());

    let mut router = CommandRouter::new(config, Box::new(store), http, assistant, cancel);
    router.run_with_io(&mut input, &mut output).await
}
