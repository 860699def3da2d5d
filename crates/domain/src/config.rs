//! Top-level configuration for the Pryx core gateway.
//!
//! Loaded from `<home>/.pryx/config.yaml` (serde_yaml) with a handful of
//! environment variable overrides. `Config::validate()` returns a list of
//! issues; `Error`-severity issues abort startup, `Warning`-severity issues
//! are logged and startup proceeds.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub skills: SkillsConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub websocket: WebSocketConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            skills: SkillsConfig::default(),
            router: RouterConfig::default(),
            memory: MemoryConfig::default(),
            scheduler: SchedulerConfig::default(),
            websocket: WebSocketConfig::default(),
        }
    }
}

impl Config {
    /// Load from a YAML file, applying environment variable overrides.
    pub fn load(path: &std::path::Path) -> crate::error::Result<Config> {
        let mut cfg: Config = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            serde_yaml::from_str(&raw)?
        } else {
            Config::default()
        };
        if let Ok(addr) = std::env::var("PRYX_LISTEN_ADDR") {
            cfg.server.listen_addr = addr;
        }
        if let Ok(db) = std::env::var("PRYX_DATABASE_PATH") {
            cfg.store.database_path = PathBuf::from(db);
        }
        Ok(cfg)
    }

    /// Validate the configuration, returning every issue found. Does not
    /// short-circuit on the first error so callers see the full picture.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut issues = Vec::new();

        if self.server.listen_addr.is_empty() {
            issues.push(ConfigError::error(
                "server.listen_addr",
                "must not be empty",
            ));
        }

        if self.store.database_path.as_os_str().is_empty() {
            issues.push(ConfigError::error(
                "store.database_path",
                "must not be empty",
            ));
        }

        if self.scheduler.max_agents == 0 {
            issues.push(ConfigError::error(
                "scheduler.max_agents",
                "must be at least 1",
            ));
        }

        if self.memory.flush_threshold_info >= self.memory.flush_threshold_warn {
            issues.push(ConfigError::error(
                "memory.flush_threshold_info",
                "must be strictly less than flush_threshold_warn",
            ));
        }
        if self.memory.flush_threshold_warn >= self.memory.flush_threshold_critical {
            issues.push(ConfigError::error(
                "memory.flush_threshold_warn",
                "must be strictly less than flush_threshold_critical",
            ));
        }

        if self.websocket.max_message_size_bytes == 0 {
            issues.push(ConfigError::warning(
                "websocket.max_message_size_bytes",
                "0 disables all websocket messages; likely a misconfiguration",
            ));
        }

        if self
            .server
            .allowed_origins
            .iter()
            .any(|o| o == "*")
        {
            issues.push(ConfigError::warning(
                "server.allowed_origins",
                "wildcard origin allows any site to connect; avoid in production",
            ));
        }

        issues
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSeverity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl ConfigError {
    pub fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Warning => "WARN",
            ConfigSeverity::Error => "ERROR",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// `":0"` binds a dynamic port; the chosen port is written to
    /// `<home>/.pryx/runtime.port` for client discovery.
    #[serde(default = "d_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "d_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: d_listen_addr(),
            allowed_origins: d_allowed_origins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "d_database_path")]
    pub database_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: d_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillsConfig {
    /// Ships with the binary; lowest precedence.
    #[serde(default = "d_bundled_skills_path")]
    pub bundled_path: PathBuf,
    /// User install directory, e.g. `~/.pryx/skills`.
    #[serde(default = "d_skills_path")]
    pub managed_path: PathBuf,
    /// `<cwd>/.pryx/skills`; highest precedence.
    #[serde(default = "d_workspace_skills_path")]
    pub workspace_path: PathBuf,
    /// Worker pool size for concurrent skill discovery. `0` = CPU count.
    #[serde(default)]
    pub discovery_workers: usize,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            bundled_path: d_bundled_skills_path(),
            managed_path: d_skills_path(),
            workspace_path: d_workspace_skills_path(),
            discovery_workers: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    pub model_provider: Option<String>,
    pub model_name: Option<String>,
    pub ollama_endpoint: Option<String>,
    /// §9 open question 1: unknown models are allowed with a warning by
    /// default; flip to `false` for a strict deny-on-unknown policy.
    #[serde(default = "d_true")]
    pub allow_unknown_models: bool,
    /// §9 open question 4: the `vision` substring heuristic is load-bearing
    /// for a handful of unknown vendors; kept on by default, can be disabled.
    #[serde(default = "d_true")]
    pub enable_vision_heuristic: bool,
    /// Per-request cap on tool count; requests above this are denied.
    #[serde(default = "d_32")]
    pub max_tools_per_request: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            model_provider: None,
            model_name: None,
            ollama_endpoint: None,
            allow_unknown_models: true,
            enable_vision_heuristic: true,
            max_tools_per_request: 32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "d_true")]
    pub enabled: bool,
    #[serde(default = "d_true")]
    pub auto_flush: bool,
    #[serde(default = "d_context_window")]
    pub max_context_tokens: u32,
    /// Absolute-token override; when set, takes precedence over the
    /// percentage thresholds below.
    pub flush_threshold_tokens: Option<u32>,
    #[serde(default = "d_flush_info")]
    pub flush_threshold_info: f64,
    #[serde(default = "d_flush_warn")]
    pub flush_threshold_warn: f64,
    #[serde(default = "d_flush_critical")]
    pub flush_threshold_critical: f64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_flush: true,
            max_context_tokens: d_context_window(),
            flush_threshold_tokens: None,
            flush_threshold_info: d_flush_info(),
            flush_threshold_warn: d_flush_warn(),
            flush_threshold_critical: d_flush_critical(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "d_max_agents")]
    pub max_agents: usize,
    /// Default wait timeout (ms) before a caller gets a status snapshot
    /// instead of blocking for a sub-agent's result.
    #[serde(default = "d_wait_timeout_ms")]
    pub wait_timeout_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_agents: d_max_agents(),
            wait_timeout_ms: d_wait_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketConfig {
    #[serde(default = "d_max_connections")]
    pub max_connections: usize,
    #[serde(default = "d_max_message_size")]
    pub max_message_size_bytes: usize,
    #[serde(default = "d_rate_limit")]
    pub rate_limit_per_minute: u32,
    #[serde(default = "d_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_connections: d_max_connections(),
            max_message_size_bytes: d_max_message_size(),
            rate_limit_per_minute: d_rate_limit(),
            allowed_origins: d_allowed_origins(),
        }
    }
}

fn d_listen_addr() -> String {
    ":0".into()
}
fn d_allowed_origins() -> Vec<String> {
    vec!["http://localhost".into(), "http://127.0.0.1".into()]
}
fn d_database_path() -> PathBuf {
    PathBuf::from("pryx.db")
}
fn d_skills_path() -> PathBuf {
    PathBuf::from("skills")
}
fn d_bundled_skills_path() -> PathBuf {
    PathBuf::from("skills/bundled")
}
fn d_workspace_skills_path() -> PathBuf {
    PathBuf::from(".pryx/skills")
}
fn d_true() -> bool {
    true
}
fn d_32() -> usize {
    32
}
fn d_context_window() -> u32 {
    128_000
}
fn d_flush_info() -> f64 {
    0.80
}
fn d_flush_warn() -> f64 {
    0.90
}
fn d_flush_critical() -> f64 {
    1.0
}
fn d_max_agents() -> usize {
    10
}
fn d_wait_timeout_ms() -> u64 {
    5 * 60 * 1000
}
fn d_max_connections() -> usize {
    256
}
fn d_max_message_size() -> usize {
    10 * 1024 * 1024
}
fn d_rate_limit() -> u32 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config::default()
    }

    fn find_issue<'a>(issues: &'a [ConfigError], field_prefix: &str) -> Option<&'a ConfigError> {
        issues.iter().find(|i| i.field.starts_with(field_prefix))
    }

    #[test]
    fn default_config_has_no_errors() {
        let issues = valid_config().validate();
        assert!(
            issues.iter().all(|i| i.severity == ConfigSeverity::Warning),
            "unexpected error-severity issues: {issues:?}"
        );
    }

    #[test]
    fn empty_listen_addr_is_an_error() {
        let mut cfg = valid_config();
        cfg.server.listen_addr = String::new();
        let issues = cfg.validate();
        let issue = find_issue(&issues, "server.listen_addr").expect("issue present");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn zero_max_agents_is_an_error() {
        let mut cfg = valid_config();
        cfg.scheduler.max_agents = 0;
        let issues = cfg.validate();
        assert!(find_issue(&issues, "scheduler.max_agents").is_some());
    }

    #[test]
    fn out_of_order_flush_thresholds_is_an_error() {
        let mut cfg = valid_config();
        cfg.memory.flush_threshold_info = 0.95;
        let issues = cfg.validate();
        let issue = find_issue(&issues, "memory.flush_threshold_info").expect("issue present");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn wildcard_origin_is_a_warning_not_an_error() {
        let mut cfg = valid_config();
        cfg.server.allowed_origins = vec!["*".into()];
        let issues = cfg.validate();
        let issue = find_issue(&issues, "server.allowed_origins").expect("issue present");
        assert_eq!(issue.severity, ConfigSeverity::Warning);
    }

    #[test]
    fn display_format_matches_tag_field_message() {
        let issue = ConfigError::error("x.y", "bad value");
        assert_eq!(issue.to_string(), "[ERROR] x.y: bad value");
    }
}
