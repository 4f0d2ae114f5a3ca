use serde::Deserialize;
use std::env;
use std::path::Path;
use config; // Explicitly import the config crate

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    Gemini,
    Groq,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub web: WebConfig,
    // These fields will be populated from the .env file
    pub backend_base_url: String,
    pub ai_provider: AiProvider,
    pub gemini_api_base: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub groq_api_base: String,
    pub groq_api_key: String,
    pub groq_model: String,
    pub ai_request_timeout_secs: u64,
    pub backend_request_timeout_secs: u64,
    pub session_idle_timeout_mins: u64,
    pub trial_generation_limit: u32,
    pub max_upload_size_mb: u64,
    pub allowed_origins: String,
    pub log_level: String,
    pub session_secret_key: String,
    pub use_secure_cookies: bool,
}

fn required_var(name: &str) -> Result<String, config::ConfigError> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| config::ConfigError::Message(format!(
            "FATAL: Environment variable '{}' is not set in your .env file.", name
        )))
}

fn optional_var(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn numeric_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, config::ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse::<T>().map_err(|_| {
            config::ConfigError::Message(format!("FATAL: '{}' must be a whole number.", name))
        }),
        _ => Ok(default),
    }
}

impl Config {
    pub fn from_env(env_path: &Path) -> Result<Self, config::ConfigError> {
        // Load the specified .env file. Propagate an error if it fails.
        dotenvy::from_path(env_path)
            .map_err(|e| config::ConfigError::Message(format!(
                "FATAL: Failed to load .env file from '{}'. Error: {}", env_path.display(), e
            )))?;

        Self::from_process_env("config/default.toml")
    }

    /// Builds the configuration from variables already present in the process
    /// environment, layered over the TOML file at `defaults_path`.
    pub fn from_process_env(defaults_path: &str) -> Result<Self, config::ConfigError> {
        let backend_base_url = required_var("BACKEND_BASE_URL")?;
        match url::Url::parse(&backend_base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            _ => {
                return Err(config::ConfigError::Message(format!(
                    "FATAL: 'BACKEND_BASE_URL' must be an absolute http(s) URL, got '{}'.",
                    backend_base_url
                )))
            }
        }

        let session_secret_key = required_var("SESSION_SECRET_KEY")?;
        // It must be 128 hex characters (64 bytes).
        if session_secret_key.len() != 128 || !session_secret_key.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(config::ConfigError::Message(
                "FATAL: 'SESSION_SECRET_KEY' must be 128 hexadecimal characters long (64 bytes).".to_string()
            ));
        }

        let ai_provider = match optional_var("AI_PROVIDER", "gemini").to_lowercase().as_str() {
            "gemini" => "gemini",
            "groq" => "groq",
            other => {
                return Err(config::ConfigError::Message(format!(
                    "FATAL: Unknown AI_PROVIDER '{}'. Use 'gemini' or 'groq'.", other
                )))
            }
        };

        // Only the selected provider's key is mandatory.
        let (gemini_api_key, groq_api_key) = if ai_provider == "gemini" {
            (required_var("GEMINI_API_KEY")?, optional_var("GROQ_API_KEY", ""))
        } else {
            (optional_var("GEMINI_API_KEY", ""), required_var("GROQ_API_KEY")?)
        };

        let ai_request_timeout_secs = numeric_var::<u64>("AI_REQUEST_TIMEOUT_SECS", 60)?;
        let backend_request_timeout_secs = numeric_var::<u64>("BACKEND_REQUEST_TIMEOUT_SECS", 15)?;
        let session_idle_timeout_mins = numeric_var::<u64>("SESSION_IDLE_TIMEOUT_MINS", 24 * 60)?;
        let trial_generation_limit = numeric_var::<u32>("TRIAL_GENERATION_LIMIT", 10)?;
        let max_upload_size_mb = numeric_var::<u64>("MAX_UPLOAD_SIZE_MB", 10)?;

        // Defaulting to false if not set or invalid.
        let use_secure_cookies = optional_var("USE_SECURE_COOKIES", "false")
            .parse::<bool>()
            .unwrap_or(false);

        let builder = config::Config::builder()
            // Load base settings from the TOML file (e.g., for web host/port).
            .add_source(config::File::new(defaults_path, config::FileFormat::Toml))
            .set_override("backend_base_url", backend_base_url)?
            .set_override("ai_provider", ai_provider)?
            .set_override("gemini_api_base", optional_var("GEMINI_API_BASE", "https://generativelanguage.googleapis.com/v1beta"))?
            .set_override("gemini_api_key", gemini_api_key)?
            .set_override("gemini_model", optional_var("GEMINI_MODEL", "gemini-2.0-flash"))?
            .set_override("groq_api_base", optional_var("GROQ_API_BASE", "https://api.groq.com/openai/v1"))?
            .set_override("groq_api_key", groq_api_key)?
            .set_override("groq_model", optional_var("GROQ_MODEL", "llama-3.3-70b-versatile"))?
            .set_override("ai_request_timeout_secs", ai_request_timeout_secs)?
            .set_override("backend_request_timeout_secs", backend_request_timeout_secs)?
            .set_override("session_idle_timeout_mins", session_idle_timeout_mins)?
            .set_override("trial_generation_limit", trial_generation_limit)?
            .set_override("max_upload_size_mb", max_upload_size_mb)?
            .set_override("allowed_origins", optional_var("ALLOWED_ORIGINS", ""))?
            .set_override("log_level", optional_var("LOG_LEVEL", "info"))?
            .set_override("session_secret_key", session_secret_key)?
            .set_override("use_secure_cookies", use_secure_cookies)?
            .build()?;

        builder.try_deserialize()
    }

    pub fn max_upload_bytes(&self) -> usize {
        (self.max_upload_size_mb as usize).saturating_mul(1024 * 1024)
    }

    pub fn session_idle_timeout(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session_idle_timeout_mins.min(i64::MAX as u64 / 60_000) as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "00000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000";

    // The only test touching process env vars, so nothing races it.
    #[test]
    fn backend_and_ai_timeouts_are_independent() {
        env::set_var("BACKEND_BASE_URL", "https://api.example.com/v1");
        env::set_var("SESSION_SECRET_KEY", KEY);
        env::set_var("AI_PROVIDER", "gemini");
        env::set_var("GEMINI_API_KEY", "g-key");
        env::set_var("AI_REQUEST_TIMEOUT_SECS", "90");
        env::remove_var("BACKEND_REQUEST_TIMEOUT_SECS");
        env::remove_var("SESSION_IDLE_TIMEOUT_MINS");

        let config = Config::from_process_env("config/default.toml").unwrap();
        assert_eq!(config.ai_request_timeout_secs, 90);
        assert_eq!(config.backend_request_timeout_secs, 15);
        assert_eq!(config.session_idle_timeout(), chrono::Duration::hours(24));
        assert_eq!(config.web.port, 8080);

        env::set_var("BACKEND_REQUEST_TIMEOUT_SECS", "5");
        let config = Config::from_process_env("config/default.toml").unwrap();
        assert_eq!(config.backend_request_timeout_secs, 5);

        env::set_var("BACKEND_REQUEST_TIMEOUT_SECS", "soon");
        assert!(Config::from_process_env("config/default.toml").is_err());
        env::remove_var("BACKEND_REQUEST_TIMEOUT_SECS");
    }
}
