//! Configuration loading: `autoflow.config.json` with `AUTOFLOW_*` env overrides

use figment::{
    providers::{Env, Format, Json},
    Figment,
};
use serde::Deserialize;

use crate::error::{AutoflowError, Result};

/// Name of the JSON config file looked up in the working directory.
pub const CONFIG_FILE: &str = "autoflow.config.json";

/// Client configuration.
///
/// Field aliases accept the uppercase keys used in `autoflow.config.json`
/// (`TOKEN`, `WEBSOCKET_HOST`, ...); environment variables use the same keys
/// prefixed with `AUTOFLOW_` and take precedence over the file.
#[derive(Debug, Clone, Deserialize)]
pub struct AutoflowConfig {
    /// API token embedded in the connection URL. Empty means unconfigured.
    #[serde(default, alias = "TOKEN")]
    pub token: String,

    /// Planner host, `host:port`.
    #[serde(default = "default_websocket_host", alias = "WEBSOCKET_HOST")]
    pub websocket_host: String,

    /// `ws` or `wss`.
    #[serde(default = "default_websocket_protocol", alias = "WEBSOCKET_PROTOCOL")]
    pub websocket_protocol: String,

    /// Name used to prefix error messages and log lines.
    #[serde(default = "default_package_name", alias = "PACKAGE_NAME")]
    pub package_name: String,

    /// When true, every sent/received frame is logged (truncated).
    #[serde(default = "default_logs_enabled", alias = "LOGS_ENABLED")]
    pub logs_enabled: bool,

    /// Maximum accepted task description length, in characters.
    #[serde(default = "default_max_task_chars", alias = "MAX_TASK_CHARS")]
    pub max_task_chars: usize,
}

fn default_websocket_host() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_websocket_protocol() -> String {
    "ws".to_string()
}

fn default_package_name() -> String {
    "autoflow".to_string()
}

fn default_logs_enabled() -> bool {
    true
}

fn default_max_task_chars() -> usize {
    1000
}

impl Default for AutoflowConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            websocket_host: default_websocket_host(),
            websocket_protocol: default_websocket_protocol(),
            package_name: default_package_name(),
            logs_enabled: default_logs_enabled(),
            max_task_chars: default_max_task_chars(),
        }
    }
}

impl AutoflowConfig {
    /// Load configuration from `autoflow.config.json` (if present) merged
    /// with `AUTOFLOW_*` environment variables. Env wins on conflict.
    pub fn load() -> Result<Self> {
        Figment::new()
            .merge(Json::file(CONFIG_FILE))
            .merge(Env::prefixed("AUTOFLOW_"))
            .extract()
            .map_err(|e| AutoflowError::Configuration(e.to_string()))
    }

    /// Whether an API token is configured.
    pub fn has_token(&self) -> bool {
        !self.token.trim().is_empty()
    }

    /// Full planner endpoint URL, token in the query string.
    pub fn websocket_url(&self) -> String {
        format!(
            "{}://{}/ws/socket-server/?key={}",
            self.websocket_protocol, self.websocket_host, self.token
        )
    }
}
