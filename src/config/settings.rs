use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RendererConfig {
    /// "local" renders in-process, "remote" delegates to `remote_url`
    #[serde(default = "default_renderer_mode")]
    pub mode: String,
    /// Base URL of the remote render processor
    #[serde(default)]
    pub remote_url: Option<String>,
    /// Upper bound for a remote render call in milliseconds
    #[serde(default = "default_render_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewConfig {
    /// Live preview sessions unused for this long are evicted
    #[serde(default = "default_session_idle_timeout")]
    pub session_idle_timeout_secs: u64,
    /// Interval between idle session sweeps
    #[serde(default = "default_session_cleanup_interval")]
    pub session_cleanup_interval_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_renderer_mode() -> String {
    "local".to_string()
}

fn default_render_timeout_ms() -> u64 {
    3_000 // 3 seconds
}

fn default_session_idle_timeout() -> u64 {
    900 // 15 minutes
}

fn default_session_cleanup_interval() -> u64 {
    60
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8082)?
            .set_default("renderer.mode", "local")?
            .set_default("renderer.timeout_ms", 3000)?
            .set_default("logging.format", "text")?
            .set_default("preview.session_idle_timeout_secs", 900)?
            .set_default("preview.session_cleanup_interval_secs", 60)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // SERVER__PORT, RENDERER__MODE, RENDERER__REMOTE_URL, LOGGING__FORMAT,
            // PREVIEW__SESSION_IDLE_TIMEOUT_SECS, ...
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins"),
            );

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            mode: default_renderer_mode(),
            remote_url: None,
            timeout_ms: default_render_timeout_ms(),
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            session_idle_timeout_secs: default_session_idle_timeout(),
            session_cleanup_interval_secs: default_session_cleanup_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}
