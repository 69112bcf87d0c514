//! Server configuration loading from file and environment variables.

use capitolcall_types::Language;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Voice webhook settings.
    #[serde(default)]
    pub voice: VoiceConfig,

    /// Upstream data API settings.
    #[serde(default)]
    pub congress: CongressApiConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Busy timeout for SQLite connections, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled SQLite connections.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "capitolcall_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Voice webhook configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    /// Public base URL the provider posts webhooks to. Signature
    /// verification reconstructs request URLs against this.
    #[serde(default = "default_public_url")]
    pub public_url: String,

    /// Provider account auth token used to verify webhook signatures.
    #[serde(default)]
    pub auth_token: String,

    /// Whether to verify webhook signatures. Disable only for local
    /// development and tests.
    #[serde(default = "default_true")]
    pub validate_signatures: bool,

    /// Seconds to wait for digit input before a prompt falls through.
    #[serde(default = "default_input_timeout")]
    pub input_timeout: u32,

    /// Locale used before the caller picks a language, and the one whose
    /// prompts are spoken untranslated.
    #[serde(default = "default_language_code")]
    pub default_language: String,

    /// Text-to-speech voice, when the provider should not use its default.
    #[serde(default)]
    pub tts_voice: Option<String>,

    /// Path to the pre-rendered audio clip manifest. Absent means every
    /// prompt is spoken by text-to-speech.
    #[serde(default)]
    pub audio_manifest: Option<String>,

    /// Languages offered by the language gate, in menu order.
    #[serde(default = "default_languages")]
    pub languages: Vec<Language>,
}

/// Upstream data API configuration. Empty keys are omitted from requests,
/// which the public sandboxes accept for light use.
#[derive(Debug, Clone, Deserialize)]
pub struct CongressApiConfig {
    #[serde(default = "default_congress_base")]
    pub congress_base: String,
    #[serde(default)]
    pub congress_api_key: String,
    #[serde(default = "default_influence_base")]
    pub influence_base: String,
    #[serde(default)]
    pub influence_api_key: String,
    #[serde(default = "default_elections_base")]
    pub elections_base: String,
    #[serde(default)]
    pub elections_api_key: String,
    /// SMS bill-update subscription service. Absent disables subscriptions.
    #[serde(default)]
    pub subscriptions_base: Option<String>,
    /// Freshness window for cached zip-code lookups, in hours.
    #[serde(default = "default_zip_cache_hours")]
    pub zip_cache_hours: i64,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "capitolcall.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_public_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_true() -> bool {
    true
}

fn default_input_timeout() -> u32 {
    6
}

fn default_language_code() -> String {
    capitolcall_types::DEFAULT_LANGUAGE.to_string()
}

fn default_languages() -> Vec<Language> {
    vec![
        Language {
            code: "en".to_string(),
            label: "English".to_string(),
            prompt: "Press {digit} to continue in English.".to_string(),
        },
        Language {
            code: "es".to_string(),
            label: "Spanish".to_string(),
            prompt: "Presione {digit} para continuar en espanol.".to_string(),
        },
    ]
}

fn default_congress_base() -> String {
    "https://congress.api.sunlightfoundation.com".to_string()
}

fn default_influence_base() -> String {
    "https://transparencydata.com/api/1.0".to_string()
}

fn default_elections_base() -> String {
    "https://elections.api.sunlightfoundation.com".to_string()
}

fn default_zip_cache_hours() -> i64 {
    24
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            public_url: default_public_url(),
            auth_token: String::new(),
            validate_signatures: true,
            input_timeout: default_input_timeout(),
            default_language: default_language_code(),
            tts_voice: None,
            audio_manifest: None,
            languages: default_languages(),
        }
    }
}

impl Default for CongressApiConfig {
    fn default() -> Self {
        Self {
            congress_base: default_congress_base(),
            congress_api_key: String::new(),
            influence_base: default_influence_base(),
            influence_api_key: String::new(),
            elections_base: default_elections_base(),
            elections_api_key: String::new(),
            subscriptions_base: None,
            zip_cache_hours: default_zip_cache_hours(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `CAPITOLCALL_HOST` overrides `server.host`
/// - `CAPITOLCALL_PORT` overrides `server.port`
/// - `CAPITOLCALL_DB_PATH` overrides `database.path`
/// - `CAPITOLCALL_LOG_LEVEL` overrides `logging.level`
/// - `CAPITOLCALL_LOG_JSON` overrides `logging.json` (set to "true")
/// - `CAPITOLCALL_PUBLIC_URL` overrides `voice.public_url`
/// - `CAPITOLCALL_AUTH_TOKEN` overrides `voice.auth_token`
/// - `CAPITOLCALL_VALIDATE_SIGNATURES` overrides `voice.validate_signatures`
/// - `CAPITOLCALL_CONGRESS_API_KEY` overrides `congress.congress_api_key`
/// - `CAPITOLCALL_INFLUENCE_API_KEY` overrides `congress.influence_api_key`
/// - `CAPITOLCALL_ELECTIONS_API_KEY` overrides `congress.elections_api_key`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("CAPITOLCALL_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("CAPITOLCALL_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(db_path) = std::env::var("CAPITOLCALL_DB_PATH") {
        config.database.path = db_path;
    }
    if let Ok(level) = std::env::var("CAPITOLCALL_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("CAPITOLCALL_LOG_JSON") {
        config.logging.json = json == "true";
    }
    if let Ok(public_url) = std::env::var("CAPITOLCALL_PUBLIC_URL") {
        config.voice.public_url = public_url;
    }
    if let Ok(auth_token) = std::env::var("CAPITOLCALL_AUTH_TOKEN") {
        config.voice.auth_token = auth_token;
    }
    if let Ok(validate) = std::env::var("CAPITOLCALL_VALIDATE_SIGNATURES") {
        config.voice.validate_signatures = validate != "false";
    }
    if let Ok(key) = std::env::var("CAPITOLCALL_CONGRESS_API_KEY") {
        config.congress.congress_api_key = key;
    }
    if let Ok(key) = std::env::var("CAPITOLCALL_INFLUENCE_API_KEY") {
        config.congress.influence_api_key = key;
    }
    if let Ok(key) = std::env::var("CAPITOLCALL_ELECTIONS_API_KEY") {
        config.congress.elections_api_key = key;
    }

    Ok(config)
}
