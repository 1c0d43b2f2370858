use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

/// Battle selection settings.
#[derive(Debug, Deserialize, Clone)]
pub struct SelectionConfig {
    /// Battles returned by `GET /battles`. Default: 10.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Task used when `GET /battles` is called without one. Default: "a-en".
    #[serde(default = "default_task")]
    pub default_task: String,
    /// Randomly swap the presented A/B sides. Default: true.
    #[serde(default = "default_randomize_sides")]
    pub randomize_sides: bool,
}

fn default_batch_size() -> usize {
    10
}
fn default_task() -> String {
    "a-en".into()
}
fn default_randomize_sides() -> bool {
    true
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            default_task: default_task(),
            randomize_sides: default_randomize_sides(),
        }
    }
}

/// Anonymous session cookie settings.
#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Default: "id".
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Default: 1000 weeks.
    #[serde(default = "default_session_max_age")]
    pub max_age_secs: i64,
}

fn default_cookie_name() -> String {
    "id".into()
}
fn default_session_max_age() -> i64 {
    1000 * 7 * 24 * 60 * 60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            max_age_secs: default_session_max_age(),
        }
    }
}

/// Anti-automation token verification (Cloudflare Turnstile).
#[derive(Debug, Deserialize, Clone)]
pub struct VerificationConfig {
    /// When false every vote passes verification (local development).
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default = "default_verification_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_verification_timeout")]
    pub timeout_secs: u64,
}

fn default_verification_endpoint() -> String {
    "https://challenges.cloudflare.com/turnstile/v0/siteverify".into()
}
fn default_verification_timeout() -> u64 {
    5
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            secret_key: String::new(),
            endpoint: default_verification_endpoint(),
            timeout_secs: default_verification_timeout(),
        }
    }
}

/// Recruited-participant study settings.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProlificConfig {
    /// Where `POST /prolific-finish` redirects. Without one it answers 204.
    #[serde(default)]
    pub completion_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
    #[serde(default)]
    pub prolific: ProlificConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("server.cors.allow_origins", vec!["http://localhost:5000"])?
            .set_default("server.cors.max_age", 600)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., VOTEARENA__DATABASE__URL)
            .add_source(
                Environment::with_prefix("VOTEARENA")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
