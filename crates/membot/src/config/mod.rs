use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{MembotError, Result};

/// Lowest accepted value for `memory.max_tokens`
pub const MIN_MEMORY_TOKENS: usize = 100;
/// Highest accepted value for `memory.max_tokens`
pub const MAX_MEMORY_TOKENS: usize = 10_000;
/// Added on top of two external call timeouts for the request bound
const REQUEST_TIMEOUT_SLACK_SECS: u64 = 30;

/// Main configuration structure for Membot
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// LLM provider configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Assistant identity
    #[serde(default)]
    pub chatbot: ChatbotConfig,
    /// Conversation memory configuration
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Input and upload limits
    #[serde(default)]
    pub security: SecurityConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from an explicit path or the default search locations,
    /// then apply environment overrides and validate.
    ///
    /// Search order when `path` is `None`: `~/.membot/config.toml`,
    /// `<config dir>/membot/config.toml`, `./config.toml`. Falls back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                tracing::info!("Loading config from: {}", path.display());
                Self::from_file(path)?
            }
            None => {
                let default_paths = [
                    dirs::home_dir().map(|h| h.join(".membot").join("config.toml")),
                    dirs::config_dir().map(|c| c.join("membot").join("config.toml")),
                    Some(PathBuf::from("config.toml")),
                ];

                match default_paths.iter().flatten().find(|p| p.exists()) {
                    Some(found) => {
                        tracing::info!("Loading config from: {}", found.display());
                        Self::from_file(found)?
                    }
                    None => {
                        tracing::info!("No config file found, using defaults");
                        Self::default()
                    }
                }
            }
        };

        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MembotError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content)
            .map_err(|e| MembotError::Config(format!("Failed to parse config: {e}")))
    }

    /// Apply the well-known environment variables on top of file values.
    ///
    /// `lookup` returns the value for a variable name, if set.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("CHATBOT_NAME") {
            self.chatbot.name = name;
        }
        if let Some(personality) = lookup("CHATBOT_PERSONALITY") {
            self.chatbot.personality = personality;
        }
        if let Some(raw) = lookup("MEMORY_MAX_TOKENS") {
            self.memory.max_tokens = parse_number("MEMORY_MAX_TOKENS", &raw)?;
        }
        if let Some(raw) = lookup("MEMORY_RETURN_MESSAGES") {
            self.memory.return_messages = raw.trim().eq_ignore_ascii_case("true");
        }
        if let Some(raw) = lookup("MAX_INPUT_LENGTH") {
            self.security.max_input_length = parse_number("MAX_INPUT_LENGTH", &raw)?;
        }
        if let Some(raw) = lookup("ALLOWED_FILE_TYPES") {
            self.security.allowed_file_types = raw
                .split(',')
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect();
        }
        if let Some(raw) = lookup("MAX_FILE_SIZE_MB") {
            self.security.max_file_size_mb = parse_number("MAX_FILE_SIZE_MB", &raw)?;
        }
        Ok(())
    }

    /// Reject values the rest of the system cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(MIN_MEMORY_TOKENS..=MAX_MEMORY_TOKENS).contains(&self.memory.max_tokens) {
            return Err(MembotError::Config(format!(
                "Memory max tokens must be between {MIN_MEMORY_TOKENS} and {MAX_MEMORY_TOKENS}"
            )));
        }
        if self.memory.window_size == 0 {
            return Err(MembotError::Config(
                "Memory window size must be at least 1".to_string(),
            ));
        }
        if self.security.max_input_length == 0 {
            return Err(MembotError::Config(
                "Max input length must be at least 1".to_string(),
            ));
        }
        if self.server.max_sessions == 0 {
            return Err(MembotError::Config(
                "Max sessions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Whole-request bound for the web server.
    ///
    /// Never shorter than one chat's two external calls plus slack, so the
    /// server does not give up on a chat the orchestrator is still bounding.
    pub fn request_timeout(&self) -> Duration {
        let floor = self
            .llm
            .timeout_secs
            .saturating_mul(2)
            .saturating_add(REQUEST_TIMEOUT_SLACK_SECS);
        Duration::from_secs(self.server.request_timeout_secs.max(floor))
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| MembotError::Config(format!("{key} must be a number, got '{raw}'")))
}

/// OpenAI-compatible chat completion provider settings
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// API base URL; `/chat/completions` is appended
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Inline API key (takes precedence over `api_key_env`)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature for replies
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens per reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature for the summarizer
    #[serde(default = "default_summary_temperature")]
    pub summary_temperature: f32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl LlmConfig {
    /// Resolve the API key from the inline value or the configured env var.
    ///
    /// A missing key is fatal at startup.
    pub fn resolve_api_key(&self) -> Result<String> {
        self.resolve_api_key_with(|key| env::var(key).ok())
    }

    /// Same as [`resolve_api_key`](Self::resolve_api_key) with an explicit lookup
    pub fn resolve_api_key_with<F>(&self, lookup: F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| lookup(&self.api_key_env).filter(|k| !k.trim().is_empty()))
            .ok_or_else(|| {
                MembotError::Config(format!(
                    "API key is required. Please set the {} environment variable.",
                    self.api_key_env
                ))
            })
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            api_key_env: default_api_key_env(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            summary_temperature: default_summary_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_summary_temperature() -> f32 {
    0.5
}

fn default_timeout_secs() -> u64 {
    60
}

/// Assistant name and persona used in the system preamble
#[derive(Debug, Clone, Deserialize)]
pub struct ChatbotConfig {
    #[serde(default = "default_chatbot_name")]
    pub name: String,
    #[serde(default = "default_chatbot_personality")]
    pub personality: String,
}

impl Default for ChatbotConfig {
    fn default() -> Self {
        Self {
            name: default_chatbot_name(),
            personality: default_chatbot_personality(),
        }
    }
}

fn default_chatbot_name() -> String {
    "MemoryBot".to_string()
}

fn default_chatbot_personality() -> String {
    "You are a helpful AI assistant with memory capabilities. You remember conversations and provide contextual responses.".to_string()
}

/// Conversation memory configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Number of turns retained in the window; an exchange is two turns
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Token budget for the summarizer (100-10000)
    #[serde(default = "default_memory_max_tokens")]
    pub max_tokens: usize,
    /// Send history as structured messages rather than one flattened transcript
    #[serde(default = "default_return_messages")]
    pub return_messages: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            max_tokens: default_memory_max_tokens(),
            return_messages: default_return_messages(),
        }
    }
}

fn default_window_size() -> usize {
    20
}

fn default_memory_max_tokens() -> usize {
    2000
}

fn default_return_messages() -> bool {
    true
}

/// Input and upload limits
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Maximum input length in characters
    #[serde(default = "default_max_input_length")]
    pub max_input_length: usize,
    /// Accepted upload extensions (lowercase, no dot)
    #[serde(default = "default_allowed_file_types")]
    pub allowed_file_types: Vec<String>,
    /// Maximum upload size in MiB
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_input_length: default_max_input_length(),
            allowed_file_types: default_allowed_file_types(),
            max_file_size_mb: default_max_file_size_mb(),
        }
    }
}

fn default_max_input_length() -> usize {
    1000
}

fn default_allowed_file_types() -> Vec<String> {
    ["txt", "pdf", "doc", "docx"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_file_size_mb() -> u64 {
    10
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "127.0.0.1:8501")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Whole-request timeout in seconds; see [`Config::request_timeout`]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Sessions untouched for this long are dropped
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
    /// Upper bound on live sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            request_timeout_secs: default_request_timeout_secs(),
            session_idle_secs: default_session_idle_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:8501".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_session_idle_secs() -> u64 {
    3600
}

fn default_max_sessions() -> usize {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.llm.api_url, "https://api.openai.com/v1");
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert!((config.llm.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.llm.max_tokens, 1000);
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.chatbot.name, "MemoryBot");
        assert!(config.chatbot.personality.contains("memory capabilities"));
        assert_eq!(config.memory.window_size, 20);
        assert_eq!(config.memory.max_tokens, 2000);
        assert!(config.memory.return_messages);
        assert_eq!(config.security.max_input_length, 1000);
        assert_eq!(
            config.security.allowed_file_types,
            vec!["txt", "pdf", "doc", "docx"]
        );
        assert_eq!(config.security.max_file_size_mb, 10);
        assert_eq!(config.server.listen_addr, "127.0.0.1:8501");
        assert_eq!(config.server.session_idle_secs, 3600);
        assert_eq!(config.server.max_sessions, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
[llm]
api_url = "http://localhost:8080/v1"
model = "gpt-4o-mini"
temperature = 0.2
max_tokens = 256
timeout_secs = 15

[chatbot]
name = "Ada"
personality = "a terse assistant."

[memory]
window_size = 6
max_tokens = 500
return_messages = false

[security]
max_input_length = 200
allowed_file_types = ["md"]
max_file_size_mb = 2

[server]
listen_addr = "0.0.0.0:9000"
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to parse TOML");

        assert_eq!(config.llm.api_url, "http://localhost:8080/v1");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.max_tokens, 256);
        assert_eq!(config.llm.timeout_secs, 15);
        assert_eq!(config.chatbot.name, "Ada");
        assert_eq!(config.memory.window_size, 6);
        assert_eq!(config.memory.max_tokens, 500);
        assert!(!config.memory.return_messages);
        assert_eq!(config.security.max_input_length, 200);
        assert_eq!(config.security.allowed_file_types, vec!["md"]);
        assert_eq!(config.server.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.server.request_timeout_secs, 120);
    }

    #[test]
    fn test_toml_partial_deserialization() {
        let toml_str = r#"
[chatbot]
name = "Partial"
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to parse partial TOML");

        assert_eq!(config.chatbot.name, "Partial");
        assert!(config.chatbot.personality.contains("helpful"));
        assert_eq!(config.memory.window_size, 20);
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup_from(&[
                ("CHATBOT_NAME", "EnvBot"),
                ("MEMORY_MAX_TOKENS", "3000"),
                ("MEMORY_RETURN_MESSAGES", "False"),
                ("MAX_INPUT_LENGTH", "500"),
                ("ALLOWED_FILE_TYPES", "TXT, md,,"),
                ("MAX_FILE_SIZE_MB", "5"),
            ]))
            .unwrap();

        assert_eq!(config.chatbot.name, "EnvBot");
        assert_eq!(config.memory.max_tokens, 3000);
        assert!(!config.memory.return_messages);
        assert_eq!(config.security.max_input_length, 500);
        assert_eq!(config.security.allowed_file_types, vec!["txt", "md"]);
        assert_eq!(config.security.max_file_size_mb, 5);
    }

    #[test]
    fn test_env_override_rejects_non_numeric() {
        let mut config = Config::default();
        let result = config.apply_overrides(lookup_from(&[("MAX_INPUT_LENGTH", "lots")]));
        assert!(matches!(result, Err(MembotError::Config(_))));
    }

    #[test]
    fn test_validate_memory_token_range() {
        let mut config = Config::default();

        config.memory.max_tokens = 99;
        assert!(config.validate().is_err());

        config.memory.max_tokens = 10_001;
        assert!(config.validate().is_err());

        config.memory.max_tokens = 100;
        assert!(config.validate().is_ok());

        config.memory.max_tokens = 10_000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let mut config = Config::default();
        config.memory.window_size = 0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("window size"));
    }

    #[test]
    fn test_validate_rejects_zero_max_sessions() {
        let mut config = Config::default();
        config.server.max_sessions = 0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("Max sessions"));
    }

    #[test]
    fn test_resolve_api_key_prefers_inline() {
        let config = LlmConfig {
            api_key: Some("inline-key".to_string()),
            ..LlmConfig::default()
        };
        let key = config
            .resolve_api_key_with(lookup_from(&[("OPENAI_API_KEY", "env-key")]))
            .unwrap();
        assert_eq!(key, "inline-key");
    }

    #[test]
    fn test_resolve_api_key_from_env() {
        let config = LlmConfig::default();
        let key = config
            .resolve_api_key_with(lookup_from(&[("OPENAI_API_KEY", "env-key")]))
            .unwrap();
        assert_eq!(key, "env-key");
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let config = LlmConfig::default();
        let err = config
            .resolve_api_key_with(lookup_from(&[("OPENAI_API_KEY", "  ")]))
            .unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[memory]\nwindow_size = 4\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.memory.window_size, 4);
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[memory\nwindow_size = ").unwrap();

        let err = Config::from_file(&path).unwrap_err().to_string();
        assert!(err.contains("Failed to parse config"));
    }

    #[test]
    fn test_request_timeout_covers_two_external_calls() {
        let config = Config::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(150));

        let mut config = Config::default();
        config.llm.timeout_secs = 10;
        config.server.request_timeout_secs = 300;
        assert_eq!(config.request_timeout(), Duration::from_secs(300));

        config.server.request_timeout_secs = 5;
        assert_eq!(config.request_timeout(), Duration::from_secs(50));
    }
}
