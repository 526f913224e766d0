use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub max_file_mb: usize,
    pub upload_body_limit_mb: usize,
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
    /// Key the rate limiter on `X-Forwarded-For` / `X-Real-IP`. Only safe
    /// behind a proxy that overwrites them.
    pub trust_proxy_headers: bool,
    pub match_probability: f64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let match_probability: f64 = parse_env("MATCH_PROBABILITY", 0.3)?;
        if !(0.0..=1.0).contains(&match_probability) {
            anyhow::bail!("MATCH_PROBABILITY must be between 0 and 1");
        }

        Ok(Config {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://lockedin.db".to_string()),
            redis_url: std::env::var("REDIS_URL").ok().filter(|s| !s.is_empty()),
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            jwt_secret: require_env("JWT_SECRET")?,
            jwt_ttl_hours: parse_env("JWT_TTL_HOURS", 168)?,
            max_file_mb: parse_env("MAX_FILE_MB", 10)?,
            upload_body_limit_mb: parse_env("UPLOAD_BODY_LIMIT_MB", 50)?,
            rate_limit_max: parse_env("RATE_LIMIT_MAX", 20)?,
            rate_limit_window_secs: parse_env("RATE_LIMIT_WINDOW_SECS", 60)?,
            trust_proxy_headers: parse_env("TRUST_PROXY_HEADERS", false)?,
            match_probability,
            port: parse_env("PORT", 3001)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Configuration used by router-level tests. Nothing here touches the network.
    pub fn for_tests() -> Self {
        Config {
            database_url: "sqlite::memory:".to_string(),
            redis_url: None,
            openai_api_key: "sk-test".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            openai_base_url: "http://127.0.0.1:9".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_ttl_hours: 1,
            max_file_mb: 10,
            upload_body_limit_mb: 50,
            rate_limit_max: 20,
            rate_limit_window_secs: 60,
            trust_proxy_headers: false,
            match_probability: 0.3,
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}
