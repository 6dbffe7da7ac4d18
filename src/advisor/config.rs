// Advisor configuration
//
// Layers, later wins:
// 1. Built-in defaults
// 2. <config_dir>/format-advisor/config.json
// 3. Environment variables

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::AdvisorError;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Which advisors run, and in what order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Model only, failures surface to the caller
    Generative,
    /// Deterministic ranking only
    Ranked,
    /// Model first, ranking if the model fails or no key is set
    #[default]
    Auto,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generative => write!(f, "generative"),
            Self::Ranked => write!(f, "ranked"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for Strategy {
    type Err = AdvisorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generative" | "ai" => Ok(Self::Generative),
            "ranked" | "ranking" => Ok(Self::Ranked),
            "auto" => Ok(Self::Auto),
            other => Err(AdvisorError::Config(format!("unknown strategy '{}'", other))),
        }
    }
}

#[derive(Clone)]
pub struct AdvisorConfig {
    pub strategy: Strategy,
    /// Model id, e.g. "gemini-2.5-flash"
    pub model: String,
    pub api_key: Option<String>,
    /// Base URL of the Generative Language API
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
    pub temperature: f32,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Auto,
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_seconds: 30,
            proxy: None,
            temperature: 0.2,
        }
    }
}

// Keeps the key out of logs
impl fmt::Debug for AdvisorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdvisorConfig")
            .field("strategy", &self.strategy)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("proxy", &self.proxy)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// On-disk form, every field optional
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
struct FileConfig {
    strategy: Option<Strategy>,
    model: Option<String>,
    api_key: Option<String>,
    endpoint: Option<String>,
    timeout_seconds: Option<u64>,
    proxy: Option<String>,
    temperature: Option<f32>,
}

impl AdvisorConfig {
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("format-advisor").join("config.json"))
    }

    /// Defaults, then the config file if present, then the environment
    pub fn load() -> Result<Self, AdvisorError> {
        let mut config = Self::default();

        if let Some(path) = Self::default_path() {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading config file");
                config = config.merge_file(&path)?;
            }
        }

        config.apply_env()
    }

    /// Defaults overlaid with one JSON file
    pub fn load_file(path: &Path) -> Result<Self, AdvisorError> {
        Self::default().merge_file(path)
    }

    fn merge_file(mut self, path: &Path) -> Result<Self, AdvisorError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AdvisorError::Config(format!("{}: {}", path.display(), e)))?;
        let file: FileConfig = serde_json::from_str(&content)
            .map_err(|e| AdvisorError::Config(format!("{}: {}", path.display(), e)))?;

        if let Some(v) = file.strategy {
            self.strategy = v;
        }
        if let Some(v) = file.model {
            self.model = v;
        }
        if file.api_key.is_some() {
            self.api_key = file.api_key;
        }
        if let Some(v) = file.endpoint {
            self.endpoint = v;
        }
        if let Some(v) = file.timeout_seconds {
            self.timeout_seconds = v;
        }
        if file.proxy.is_some() {
            self.proxy = file.proxy;
        }
        if let Some(v) = file.temperature {
            self.temperature = v;
        }
        Ok(self)
    }

    /// Overlay process environment variables
    pub fn apply_env(self) -> Result<Self, AdvisorError> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    fn apply_vars<F>(mut self, lookup: F) -> Result<Self, AdvisorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("FORMAT_ADVISOR_STRATEGY") {
            self.strategy = v.parse()?;
        }
        if let Some(key) = var("GEMINI_API_KEY").or_else(|| var("GOOGLE_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(v) = var("FORMAT_ADVISOR_MODEL") {
            self.model = v;
        }
        if let Some(v) = var("FORMAT_ADVISOR_TIMEOUT") {
            self.timeout_seconds = v.trim().parse().map_err(|_| {
                AdvisorError::Config(format!("FORMAT_ADVISOR_TIMEOUT is not a number: {}", v))
            })?;
        }
        if let Some(v) = var("FORMAT_ADVISOR_PROXY") {
            self.proxy = Some(v);
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AdvisorConfig::default();
        assert_eq!(config.strategy, Strategy::Auto);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout_seconds, 30);
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("Ranked".parse::<Strategy>().unwrap(), Strategy::Ranked);
        assert_eq!("ai".parse::<Strategy>().unwrap(), Strategy::Generative);
        assert!("random".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_env_overlay() {
        let config = AdvisorConfig::default()
            .apply_vars(vars(&[
                ("FORMAT_ADVISOR_STRATEGY", "generative"),
                ("GOOGLE_API_KEY", "google"),
                ("FORMAT_ADVISOR_MODEL", "gemini-pro"),
                ("FORMAT_ADVISOR_TIMEOUT", "5"),
            ]))
            .unwrap();

        assert_eq!(config.strategy, Strategy::Generative);
        assert_eq!(config.api_key.as_deref(), Some("google"));
        assert_eq!(config.model, "gemini-pro");
        assert_eq!(config.timeout_seconds, 5);
    }

    #[test]
    fn test_gemini_key_wins() {
        let config = AdvisorConfig::default()
            .apply_vars(vars(&[("GEMINI_API_KEY", "gemini"), ("GOOGLE_API_KEY", "google")]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("gemini"));
    }

    #[test]
    fn test_bad_env_timeout() {
        let result = AdvisorConfig::default().apply_vars(vars(&[("FORMAT_ADVISOR_TIMEOUT", "soon")]));
        assert!(matches!(result, Err(AdvisorError::Config(_))));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"strategy": "ranked", "timeout_seconds": 10, "proxy": "socks5://127.0.0.1:1080"}}"#
        )
        .unwrap();

        let config = AdvisorConfig::load_file(file.path()).unwrap();
        assert_eq!(config.strategy, Strategy::Ranked);
        assert_eq!(config.timeout_seconds, 10);
        assert_eq!(config.proxy.as_deref(), Some("socks5://127.0.0.1:1080"));
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_load_file_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "strategy = ranked").unwrap();
        assert!(matches!(
            AdvisorConfig::load_file(file.path()),
            Err(AdvisorError::Config(_))
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = AdvisorConfig::default().with_api_key(Some("secret-value".to_string()));
        let printed = format!("{:?}", config);
        assert!(!printed.contains("secret-value"));
        assert!(printed.contains("<redacted>"));
    }
}
