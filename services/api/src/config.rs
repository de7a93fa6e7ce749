use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1/";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// OpenAI-compatible backends the generation and embedding clients can target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Gemini,
}

impl Provider {
    pub fn api_base(&self) -> &'static str {
        match self {
            Provider::OpenAI => OPENAI_API_BASE,
            Provider::Gemini => GEMINI_API_BASE,
        }
    }

    fn default_chat_model(&self) -> &'static str {
        match self {
            Provider::OpenAI => "gpt-4o",
            Provider::Gemini => "gemini-flash-latest",
        }
    }

    fn default_embedding_model(&self) -> &'static str {
        match self {
            Provider::OpenAI => "text-embedding-3-small",
            Provider::Gemini => "text-embedding-004",
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub provider: Provider,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub chat_model: String,
    pub embedding_model: String,
    pub index_url: String,
    pub index_collection: String,
    pub index_api_key: Option<String>,
    pub elevenlabs_api_key: Option<String>,
    pub retrieval_top_k: usize,
    pub context_limit: usize,
    pub retrieval_timeout: Duration,
    pub generation_timeout: Duration,
    pub log_level: Level,
    pub prompts_path: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let provider_str =
            std::env::var("GENERATION_PROVIDER").unwrap_or_else(|_| "gemini".to_string());
        let provider = match provider_str.to_lowercase().as_str() {
            "gemini" => Provider::Gemini,
            "openai" => Provider::OpenAI,
            other => {
                return Err(ConfigError::InvalidValue(
                    "GENERATION_PROVIDER".to_string(),
                    format!("'{}' is not one of 'gemini', 'openai'", other),
                ));
            }
        };

        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let gemini_api_key = std::env::var("GEMINI_API_KEY").ok();

        let chat_model = std::env::var("CHAT_MODEL")
            .unwrap_or_else(|_| provider.default_chat_model().to_string());
        let embedding_model = std::env::var("EMBEDDING_MODEL")
            .unwrap_or_else(|_| provider.default_embedding_model().to_string());

        let index_url =
            std::env::var("INDEX_URL").unwrap_or_else(|_| "http://localhost:6333".to_string());
        let index_collection =
            std::env::var("INDEX_COLLECTION").unwrap_or_else(|_| "docs".to_string());
        let index_api_key = std::env::var("INDEX_API_KEY").ok();
        let elevenlabs_api_key = std::env::var("ELEVENLABS_API_KEY").ok();

        let retrieval_top_k = positive_var("RETRIEVAL_TOP_K", 5)?;
        let context_limit = positive_var("CONTEXT_LIMIT", 3)?;
        let retrieval_timeout = Duration::from_secs(parsed_var("RETRIEVAL_TIMEOUT_SECS", 10)?);
        let generation_timeout = Duration::from_secs(parsed_var("GENERATION_TIMEOUT_SECS", 60)?);

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let prompts_path = std::env::var("PROMPTS_PATH").ok().map(PathBuf::from);

        match provider {
            Provider::OpenAI => {
                if openai_api_key.is_none() {
                    return Err(ConfigError::MissingVar(
                        "OPENAI_API_KEY must be set for 'openai' provider".to_string(),
                    ));
                }
            }
            Provider::Gemini => {
                if gemini_api_key.is_none() {
                    return Err(ConfigError::MissingVar(
                        "GEMINI_API_KEY must be set for 'gemini' provider".to_string(),
                    ));
                }
            }
        }

        Ok(Self {
            bind_address,
            provider,
            openai_api_key,
            gemini_api_key,
            chat_model,
            embedding_model,
            index_url,
            index_collection,
            index_api_key,
            elevenlabs_api_key,
            retrieval_top_k,
            context_limit,
            retrieval_timeout,
            generation_timeout,
            log_level,
            prompts_path,
        })
    }

    /// The API key of the selected provider.
    pub fn provider_api_key(&self) -> Option<&str> {
        match self.provider {
            Provider::OpenAI => self.openai_api_key.as_deref(),
            Provider::Gemini => self.gemini_api_key.as_deref(),
        }
    }
}

fn parsed_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

fn positive_var(name: &str, default: usize) -> Result<usize, ConfigError> {
    let value = parsed_var(name, default)?;
    if value == 0 {
        return Err(ConfigError::InvalidValue(
            name.to_string(),
            "must be at least 1".to_string(),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tracing::Level;

    const VARS: [&str; 16] = [
        "BIND_ADDRESS",
        "GENERATION_PROVIDER",
        "OPENAI_API_KEY",
        "GEMINI_API_KEY",
        "CHAT_MODEL",
        "EMBEDDING_MODEL",
        "INDEX_URL",
        "INDEX_COLLECTION",
        "INDEX_API_KEY",
        "ELEVENLABS_API_KEY",
        "RETRIEVAL_TOP_K",
        "CONTEXT_LIMIT",
        "RETRIEVAL_TIMEOUT_SECS",
        "GENERATION_TIMEOUT_SECS",
        "RUST_LOG",
        "PROMPTS_PATH",
    ];

    fn clear_env_vars() {
        unsafe {
            for var in VARS {
                env::remove_var(var);
            }
        }
    }

    fn set_minimal_env_gemini() {
        unsafe {
            env::set_var("GEMINI_API_KEY", "test-gemini-key");
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing_var = ConfigError::MissingVar("TEST_VAR".to_string());
        assert_eq!(
            format!("{}", missing_var),
            "Missing environment variable: TEST_VAR"
        );

        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    fn test_provider_api_base() {
        assert_eq!(Provider::OpenAI.api_base(), OPENAI_API_BASE);
        assert_eq!(Provider::Gemini.api_base(), GEMINI_API_BASE);
    }

    #[test]
    #[serial]
    fn test_config_from_env_defaults() {
        clear_env_vars();
        set_minimal_env_gemini();

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:8000");
        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.provider_api_key(), Some("test-gemini-key"));
        assert_eq!(config.chat_model, "gemini-flash-latest");
        assert_eq!(config.embedding_model, "text-embedding-004");
        assert_eq!(config.index_url, "http://localhost:6333");
        assert_eq!(config.index_collection, "docs");
        assert_eq!(config.index_api_key, None);
        assert_eq!(config.elevenlabs_api_key, None);
        assert_eq!(config.retrieval_top_k, 5);
        assert_eq!(config.context_limit, 3);
        assert_eq!(config.retrieval_timeout, Duration::from_secs(10));
        assert_eq!(config.generation_timeout, Duration::from_secs(60));
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.prompts_path, None);
    }

    #[test]
    #[serial]
    fn test_config_from_env_openai_provider() {
        clear_env_vars();
        unsafe {
            env::set_var("GENERATION_PROVIDER", "OpenAI");
            env::set_var("OPENAI_API_KEY", "test-openai-key");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.provider, Provider::OpenAI);
        assert_eq!(config.provider_api_key(), Some("test-openai-key"));
        assert_eq!(config.gemini_api_key, None);
        assert_eq!(config.chat_model, "gpt-4o");
        assert_eq!(config.embedding_model, "text-embedding-3-small");
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("BIND_ADDRESS", "127.0.0.1:8080");
            env::set_var("GENERATION_PROVIDER", "gemini");
            env::set_var("GEMINI_API_KEY", "custom-gemini-key");
            env::set_var("CHAT_MODEL", "gemini-2.5-pro");
            env::set_var("EMBEDDING_MODEL", "gemini-embedding-001");
            env::set_var("INDEX_URL", "http://qdrant:6333");
            env::set_var("INDEX_COLLECTION", "astronomy");
            env::set_var("INDEX_API_KEY", "index-key");
            env::set_var("ELEVENLABS_API_KEY", "voice-key");
            env::set_var("RETRIEVAL_TOP_K", "8");
            env::set_var("CONTEXT_LIMIT", "2");
            env::set_var("RETRIEVAL_TIMEOUT_SECS", "3");
            env::set_var("GENERATION_TIMEOUT_SECS", "90");
            env::set_var("RUST_LOG", "debug");
            env::set_var("PROMPTS_PATH", "/custom/prompts");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8080");
        assert_eq!(config.chat_model, "gemini-2.5-pro");
        assert_eq!(config.embedding_model, "gemini-embedding-001");
        assert_eq!(config.index_url, "http://qdrant:6333");
        assert_eq!(config.index_collection, "astronomy");
        assert_eq!(config.index_api_key, Some("index-key".to_string()));
        assert_eq!(config.elevenlabs_api_key, Some("voice-key".to_string()));
        assert_eq!(config.retrieval_top_k, 8);
        assert_eq!(config.context_limit, 2);
        assert_eq!(config.retrieval_timeout, Duration::from_secs(3));
        assert_eq!(config.generation_timeout, Duration::from_secs(90));
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.prompts_path, Some(PathBuf::from("/custom/prompts")));
    }

    #[test]
    #[serial]
    fn test_config_invalid_bind_address() {
        clear_env_vars();
        set_minimal_env_gemini();
        unsafe {
            env::set_var("BIND_ADDRESS", "not-a-valid-address");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "BIND_ADDRESS"),
            _ => panic!("Expected InvalidValue for BIND_ADDRESS"),
        }
    }

    #[test]
    #[serial]
    fn test_config_unknown_provider() {
        clear_env_vars();
        set_minimal_env_gemini();
        unsafe {
            env::set_var("GENERATION_PROVIDER", "anthropic");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "GENERATION_PROVIDER"),
            _ => panic!("Expected InvalidValue for GENERATION_PROVIDER"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        set_minimal_env_gemini();
        unsafe {
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
            _ => panic!("Expected InvalidValue for RUST_LOG"),
        }
    }

    #[test]
    #[serial]
    fn test_config_rejects_zero_limits() {
        clear_env_vars();
        set_minimal_env_gemini();
        unsafe {
            env::set_var("CONTEXT_LIMIT", "0");
        }

        match Config::from_env().unwrap_err() {
            ConfigError::InvalidValue(var, reason) => {
                assert_eq!(var, "CONTEXT_LIMIT");
                assert_eq!(reason, "must be at least 1");
            }
            _ => panic!("Expected InvalidValue for CONTEXT_LIMIT"),
        }

        unsafe {
            env::remove_var("CONTEXT_LIMIT");
            env::set_var("RETRIEVAL_TOP_K", "many");
        }
        match Config::from_env().unwrap_err() {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RETRIEVAL_TOP_K"),
            _ => panic!("Expected InvalidValue for RETRIEVAL_TOP_K"),
        }
    }

    #[test]
    #[serial]
    fn test_config_missing_openai_key() {
        clear_env_vars();
        unsafe {
            env::set_var("GENERATION_PROVIDER", "openai");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(msg) => {
                assert!(msg.contains("OPENAI_API_KEY"));
            }
            _ => panic!("Expected MissingVar for OPENAI_API_KEY"),
        }
    }

    #[test]
    #[serial]
    fn test_config_missing_gemini_key() {
        clear_env_vars();

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(msg) => {
                assert!(msg.contains("GEMINI_API_KEY"));
            }
            _ => panic!("Expected MissingVar for GEMINI_API_KEY"),
        }
    }
}
