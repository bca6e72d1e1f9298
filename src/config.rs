use crate::llm_client::{DEFAULT_OPENROUTER_MODEL, Provider};
use anyhow::{Result, anyhow};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: Provider,
    #[serde(default = "default_openrouter_model")]
    pub openrouter_model: String,
    #[serde(default)]
    pub learning_mode: bool,
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub openrouter_api_key: Option<String>,
    #[serde(default)]
    pub use_mock: bool,
}

fn default_openrouter_model() -> String {
    DEFAULT_OPENROUTER_MODEL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            openrouter_model: default_openrouter_model(),
            learning_mode: false,
            gemini_api_key: None,
            openrouter_api_key: None,
            use_mock: false,
        }
    }
}

impl Config {
    /// Load configuration from file, then apply environment overrides
    pub fn load() -> Result<Self> {
        let path = Self::get_config_path()?;
        Ok(Self::load_from(&path))
    }

    /// Load from `path`, falling back to defaults when it is missing or broken
    pub fn load_from(path: &Path) -> Self {
        let mut config = Self::read_file(path).unwrap_or_else(|e| {
            info!("Using default config ({})", e);
            Self::default()
        });
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config
    }

    fn read_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow!("{} not found", path.display()));
        }
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Environment variables override the config file
    pub fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(key) = var("GEMINI_API_KEY").filter(|k| !k.is_empty()) {
            self.gemini_api_key = Some(key);
        }
        if let Some(key) = var("OPENROUTER_API_KEY").filter(|k| !k.is_empty()) {
            self.openrouter_api_key = Some(key);
        }
        if let Some(name) = var("TERMNL_PROVIDER") {
            match name.parse() {
                Ok(provider) => self.provider = provider,
                Err(e) => warn!("Ignoring TERMNL_PROVIDER: {}", e),
            }
        }
        if let Some(model) = var("OPENROUTER_MODEL").filter(|m| !m.is_empty()) {
            self.openrouter_model = model;
        }
        if var("TERMNL_USE_MOCK").is_some() {
            self.use_mock = true;
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved config to: {}", path.display());
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::get_config_dir()?.join("config.toml"))
    }

    pub fn get_config_dir() -> Result<PathBuf> {
        let home = home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
        Ok(home.join(".termnl"))
    }

    /// Key for the active provider, if one is configured
    pub fn api_key(&self) -> Option<&str> {
        self.api_key_for(self.provider)
    }

    pub fn api_key_for(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::Gemini => self.gemini_api_key.as_deref(),
            Provider::OpenRouter => self.openrouter_api_key.as_deref(),
        }
    }

    pub fn set_api_key(&mut self, provider: Provider, key: String) {
        match provider {
            Provider::Gemini => self.gemini_api_key = Some(key),
            Provider::OpenRouter => self.openrouter_api_key = Some(key),
        }
    }

    pub fn is_mock_mode(&self) -> bool {
        self.use_mock
    }

    pub fn show_config_info() -> Result<()> {
        let config_path = Self::get_config_path()?;
        println!("Configuration file: {}", config_path.display());

        if config_path.exists() {
            println!("Status: Found");
        } else {
            println!("Status: Not found (using defaults)");
        }

        let config = Self::load_from(&config_path);
        let set = |key: Option<&String>| if key.is_some() { "Set" } else { "Not set" };
        println!("Provider: {}", config.provider);
        println!("OpenRouter model: {}", config.openrouter_model);
        println!("Learning mode: {}", config.learning_mode);
        println!("Gemini API key: {}", set(config.gemini_api_key.as_ref()));
        println!("OpenRouter API key: {}", set(config.openrouter_api_key.as_ref()));
        println!("Mock mode: {}", config.use_mock);

        println!("\nTo choose a provider, start termnl and type:");
        println!("  !provider");
        println!("\nOr set environment variables:");
        println!("  export GEMINI_API_KEY=<your-key>");
        println!("  export OPENROUTER_API_KEY=<your-key> TERMNL_PROVIDER=openrouter");

        Ok(())
    }
}

/// Where the router writes settings it changes.
pub trait ConfigStore: Send + Sync {
    fn save(&self, config: &Config) -> Result<()>;
}

/// Persists to a TOML file, by default `~/.termnl/config.toml`.
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_location() -> Result<Self> {
        Ok(Self::new(Config::get_config_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for FileConfigStore {
    fn save(&self, config: &Config) -> Result<()> {
        config.save_to(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.openrouter_model, "google/gemini-2.5-flash");
        assert!(!config.learning_mode);
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.provider = Provider::OpenRouter;
        config.learning_mode = true;
        config.openrouter_model = "anthropic/claude-3-haiku".to_string();
        config.set_api_key(Provider::OpenRouter, "sk-or-test".to_string());

        FileConfigStore::new(path.clone()).save(&config).unwrap();
        let loaded = Config::read_file(&path).unwrap();

        assert_eq!(loaded, config);
        assert_eq!(loaded.api_key(), Some("sk-or-test"));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = toml::from_str("learning_mode = true\n").unwrap();
        assert!(config.learning_mode);
        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.openrouter_model, DEFAULT_OPENROUTER_MODEL);
    }

    #[test]
    fn test_unreadable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "provider = [not toml").unwrap();
        assert!(Config::read_file(&path).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env_overrides(env(&[
            ("OPENROUTER_API_KEY", "sk-or-env"),
            ("TERMNL_PROVIDER", "openrouter"),
            ("OPENROUTER_MODEL", "meta/llama"),
            ("TERMNL_USE_MOCK", "1"),
        ]));

        assert_eq!(config.provider, Provider::OpenRouter);
        assert_eq!(config.api_key(), Some("sk-or-env"));
        assert_eq!(config.openrouter_model, "meta/llama");
        assert!(config.is_mock_mode());
    }

    #[test]
    fn test_invalid_provider_override_is_ignored() {
        let mut config = Config::default();
        config.apply_env_overrides(env(&[("TERMNL_PROVIDER", "clippy"), ("GEMINI_API_KEY", "")]));
        assert_eq!(config.provider, Provider::Gemini);
        assert!(config.gemini_api_key.is_none());
    }
}
