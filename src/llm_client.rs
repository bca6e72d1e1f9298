//! The AI provider collaborator.
//!
//! The rest of termnl only ever sees [`Assistant::ask`]: one prompt in,
//! optional text out. This module speaks Gemini and OpenRouter over
//! [`HttpClient`], and provides a deterministic offline stand-in.

use crate::config::Config;
use crate::http_client::{HttpClient, HttpResponse};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_OPENROUTER_MODEL: &str = "google/gemini-2.5-flash";

const GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const VALIDATION_PROMPT: &str = "respond with just the word ok";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Gemini,
    OpenRouter,
}

impl Provider {
    pub fn label(&self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::OpenRouter => "OpenRouter",
        }
    }

    pub fn key_url(&self) -> &'static str {
        match self {
            Provider::Gemini => "https://aistudio.google.com/apikey",
            Provider::OpenRouter => "https://openrouter.ai/keys",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Gemini => write!(f, "gemini"),
            Provider::OpenRouter => write!(f, "openrouter"),
        }
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Provider::Gemini),
            "openrouter" => Ok(Provider::OpenRouter),
            other => Err(anyhow!("unknown provider '{}'", other)),
        }
    }
}

/// Anything that can answer a text prompt.
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Sends `prompt` and returns the trimmed reply, or `None` if the reply
    /// was empty.
    ///
    /// # Errors
    ///
    /// Network, authentication and quota failures. HTTP failures carry the
    /// status code in the message.
    async fn ask(&self, prompt: &str) -> Result<Option<String>>;
}

// Gemini generateContent format
#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

// OpenAI-compatible chat format
#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

pub struct LlmClient {
    http: Arc<dyn HttpClient>,
    provider: Provider,
    model: String,
    api_key: String,
}

impl LlmClient {
    pub fn new(http: Arc<dyn HttpClient>, provider: Provider, model: &str, api_key: &str) -> Self {
        let model = match provider {
            Provider::Gemini => GEMINI_MODEL.to_string(),
            Provider::OpenRouter => model.to_string(),
        };
        Self {
            http,
            provider,
            model,
            api_key: api_key.to_string(),
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn ask_gemini(&self, prompt: &str) -> Result<Option<String>> {
        let url = format!("{}/{}:generateContent", GEMINI_URL, self.model);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });
        let response = self
            .http
            .post_json(
                &url,
                &[
                    ("x-goog-api-key", self.api_key.as_str()),
                    ("content-type", "application/json"),
                ],
                &body,
            )
            .await?;
        self.check_status(&response)?;

        let parsed: GeminiResponse = serde_json::from_str(&response.body)
            .map_err(|e| anyhow!("Unexpected Gemini response: {}", e))?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        Ok(non_empty(text))
    }

    async fn ask_openrouter(&self, prompt: &str) -> Result<Option<String>> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }]
        });
        let auth = format!("Bearer {}", self.api_key);
        let response = self
            .http
            .post_json(
                OPENROUTER_URL,
                &[
                    ("Authorization", auth.as_str()),
                    ("content-type", "application/json"),
                ],
                &body,
            )
            .await?;
        self.check_status(&response)?;

        let parsed: ChatResponse = serde_json::from_str(&response.body)
            .map_err(|e| anyhow!("Unexpected OpenRouter response: {}", e))?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        Ok(non_empty(text))
    }

    fn check_status(&self, response: &HttpResponse) -> Result<()> {
        if response.is_success() {
            return Ok(());
        }
        let excerpt: String = response.body.chars().take(200).collect();
        warn!("{} returned {}: {}", self.provider.label(), response.status, excerpt);
        Err(anyhow!(
            "{} API error {}: {}",
            self.provider.label(),
            response.status,
            excerpt
        ))
    }
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[async_trait]
impl Assistant for LlmClient {
    async fn ask(&self, prompt: &str) -> Result<Option<String>> {
        debug!("Asking {} ({} chars)", self.provider.label(), prompt.len());
        match self.provider {
            Provider::Gemini => self.ask_gemini(prompt).await,
            Provider::OpenRouter => self.ask_openrouter(prompt).await,
        }
    }
}

/// Offline assistant used when `use_mock` is set.
///
/// Recognizes a handful of requests by keyword so the whole loop can be
/// exercised without network access.
pub struct MockAssistant;

impl MockAssistant {
    pub fn new() -> Self {
        Self
    }

    pub fn respond(&self, prompt: &str) -> Option<String> {
        if let Some(command) = prompt.lines().find_map(|l| l.strip_prefix("Command: ")) {
            return Some(format!("💡 `{}` runs the command shown; try `man` for its flags.", command));
        }

        let request = prompt
            .lines()
            .rev()
            .find_map(|l| l.strip_prefix("Request: "))
            .unwrap_or(prompt)
            .to_lowercase();

        let reply = if request.contains("directory") || request.contains("where am i") {
            "pwd"
        } else if request.contains("list") && request.contains("file") {
            "ls -la"
        } else if request.contains("disk") {
            "df -h"
        } else if request.contains("date") || request.contains("time") {
            "date"
        } else if request.contains("new project") {
            "mkdir -p demo\ncd demo\ngit init"
        } else {
            return None;
        };
        Some(reply.to_string())
    }
}

impl Default for MockAssistant {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Assistant for MockAssistant {
    async fn ask(&self, prompt: &str) -> Result<Option<String>> {
        Ok(self.respond(prompt))
    }
}

/// Builds the assistant described by `config`.
///
/// # Errors
///
/// Returns an error if no key is configured for the active provider and
/// mock mode is off.
pub fn build_assistant(config: &Config, http: Arc<dyn HttpClient>) -> Result<Box<dyn Assistant>> {
    if config.is_mock_mode() {
        info!("Using mock assistant (TERMNL_USE_MOCK)");
        return Ok(Box::new(MockAssistant::new()));
    }

    let key = config.api_key().ok_or_else(|| {
        anyhow!(
            "No {} API key configured. Run !provider or set {}.",
            config.provider.label(),
            match config.provider {
                Provider::Gemini => "GEMINI_API_KEY",
                Provider::OpenRouter => "OPENROUTER_API_KEY",
            }
        )
    })?;
    info!("Using {} for translation", config.provider.label());
    Ok(Box::new(LlmClient::new(
        http,
        config.provider,
        &config.openrouter_model,
        key,
    )))
}

/// Result of a key validation round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCheck {
    Valid,
    Invalid,
    /// The request failed for a reason unrelated to the key.
    Unverified,
}

/// Sends a tiny prompt with `key` to see whether the provider accepts it.
pub async fn validate_key(http: Arc<dyn HttpClient>, provider: Provider, key: &str) -> KeyCheck {
    let client = LlmClient::new(http, provider, DEFAULT_OPENROUTER_MODEL, key);
    match client.ask(VALIDATION_PROMPT).await {
        Ok(_) => KeyCheck::Valid,
        Err(e) => {
            let message = format!("{:#}", e).to_lowercase();
            if ["401", "invalid", "unauthorized", "api_key"]
                .iter()
                .any(|s| message.contains(s))
            {
                KeyCheck::Invalid
            } else {
                warn!("Could not validate {} key: {}", provider.label(), message);
                KeyCheck::Unverified
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::tests::MockHttpClient;

    fn client_with(
        provider: Provider,
        responses: Vec<Result<HttpResponse>>,
    ) -> (LlmClient, Arc<MockHttpClient>) {
        let http = Arc::new(MockHttpClient::with_responses(responses));
        let client = LlmClient::new(http.clone(), provider, "meta/llama-3", "secret");
        (client, http)
    }

    #[test]
    fn test_provider_parse_and_display() {
        assert_eq!("OpenRouter".parse::<Provider>().unwrap(), Provider::OpenRouter);
        assert_eq!(" gemini ".parse::<Provider>().unwrap(), Provider::Gemini);
        assert!("other".parse::<Provider>().is_err());
        assert_eq!(Provider::OpenRouter.to_string(), "openrouter");
    }

    #[tokio::test]
    async fn test_gemini_request_and_response() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"ls -la\n"}]}}]}"#;
        let (client, http) = client_with(Provider::Gemini, vec![MockHttpClient::ok(200, body)]);

        let reply = client.ask("list files").await.unwrap();

        assert_eq!(reply.as_deref(), Some("ls -la"));
        let requests = http.requests.lock().unwrap();
        assert!(requests[0].url.ends_with("/gemini-2.5-flash:generateContent"));
        assert!(requests[0]
            .headers
            .contains(&("x-goog-api-key".to_string(), "secret".to_string())));
        assert_eq!(
            requests[0].body.as_ref().unwrap()["contents"][0]["parts"][0]["text"],
            "list files"
        );
    }

    #[tokio::test]
    async fn test_openrouter_uses_configured_model() {
        let body = r#"{"choices":[{"message":{"content":"  pwd  "}}]}"#;
        let (client, http) = client_with(Provider::OpenRouter, vec![MockHttpClient::ok(200, body)]);

        let reply = client.ask("where am i").await.unwrap();

        assert_eq!(reply.as_deref(), Some("pwd"));
        let requests = http.requests.lock().unwrap();
        assert_eq!(requests[0].url, OPENROUTER_URL);
        assert_eq!(requests[0].body.as_ref().unwrap()["model"], "meta/llama-3");
        assert!(requests[0]
            .headers
            .contains(&("Authorization".to_string(), "Bearer secret".to_string())));
    }

    #[tokio::test]
    async fn test_empty_reply_is_none() {
        let body = r#"{"choices":[{"message":{"content":"   "}}]}"#;
        let (client, _) = client_with(Provider::OpenRouter, vec![MockHttpClient::ok(200, body)]);
        assert!(client.ask("anything").await.unwrap().is_none());

        let (client, _) = client_with(Provider::Gemini, vec![MockHttpClient::ok(200, "{}")]);
        assert!(client.ask("anything").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_error_status_is_in_message() {
        let (client, _) = client_with(
            Provider::OpenRouter,
            vec![MockHttpClient::ok(429, r#"{"error":"quota exceeded"}"#)],
        );

        let err = client.ask("anything").await.unwrap_err();

        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("OpenRouter"));
    }

    #[tokio::test]
    async fn test_validate_key_outcomes() {
        let ok = r#"{"candidates":[{"content":{"parts":[{"text":"ok"}]}}]}"#;
        let http = Arc::new(MockHttpClient::with_responses(vec![
            MockHttpClient::ok(200, ok),
            MockHttpClient::ok(401, "unauthorized"),
            Err(anyhow!("connection refused")),
        ]));

        assert_eq!(validate_key(http.clone(), Provider::Gemini, "k").await, KeyCheck::Valid);
        assert_eq!(validate_key(http.clone(), Provider::Gemini, "k").await, KeyCheck::Invalid);
        assert_eq!(validate_key(http, Provider::Gemini, "k").await, KeyCheck::Unverified);
    }

    #[test]
    fn test_build_assistant_requires_key() {
        let http: Arc<dyn HttpClient> = Arc::new(MockHttpClient::default());
        let mut config = Config::default();
        assert!(build_assistant(&config, http.clone()).is_err());

        config.set_api_key(Provider::Gemini, "key".to_string());
        assert!(build_assistant(&config, http.clone()).is_ok());

        let mock = Config {
            use_mock: true,
            ..Config::default()
        };
        assert!(build_assistant(&mock, http).is_ok());
    }

    #[test]
    fn test_mock_assistant_reads_request_line() {
        let mock = MockAssistant::new();
        assert_eq!(
            mock.respond("Guidelines: list\n\nRequest: show the current directory").as_deref(),
            Some("pwd")
        );
        assert_eq!(mock.respond("Request: sing a song"), None);
        assert!(mock.respond("explain\nCommand: pwd").unwrap().starts_with("💡"));
    }
}
