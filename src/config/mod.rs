//! Configuration system (layered: defaults < TOML file < env < code).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::backend::BackendSettings;
use crate::error::DispatchError;

const DEFAULT_BASE_URL: &str = "http://localhost:4000";
const DEFAULT_MODEL: &str = "xLAM";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_SMTP_PORT: u16 = 587;
const REDACTED: &str = "[redacted]";

/// Settings for one tool-calling agent.
#[derive(Clone, PartialEq)]
pub struct DispatchConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Upper bound on a single backend call.
    pub timeout: Duration,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    /// Directory the file-touching capabilities are confined to.
    pub workspace_root: PathBuf,
    /// WebDriver endpoint for the browser capabilities (feature `browser`).
    pub webdriver_url: Option<String>,
    pub smtp: SmtpConfig,
}

/// Outgoing mail relay. `send_email` is registered only when `host` and
/// `from` are both set.
#[derive(Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
}

impl SmtpConfig {
    pub fn is_configured(&self) -> bool {
        self.host.is_some() && self.from.is_some()
    }

    /// STARTTLS submission port unless overridden.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_SMTP_PORT)
    }

    fn overlay(&mut self, other: SmtpConfig) {
        if other.host.is_some() {
            self.host = other.host;
        }
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.username.is_some() {
            self.username = other.username;
        }
        if other.password.is_some() {
            self.password = other.password;
        }
        if other.from.is_some() {
            self.from = other.from;
        }
    }
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .field("from", &self.from)
            .finish()
    }
}

impl std::fmt::Debug for DispatchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .field("timeout", &self.timeout)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("workspace_root", &self.workspace_root)
            .field("webdriver_url", &self.webdriver_url)
            .field("smtp", &self.smtp)
            .finish()
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            temperature: None,
            max_tokens: None,
            workspace_root: PathBuf::from("."),
            webdriver_url: None,
            smtp: SmtpConfig::default(),
        }
    }
}

/// On-disk shape; every field optional so a file may override just one.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    base_url: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    workspace_root: Option<PathBuf>,
    webdriver_url: Option<String>,
    smtp: Option<SmtpConfig>,
}

impl DispatchConfig {
    /// Full layered load: defaults, then the TOML file (explicit path, or the
    /// default location when it exists), then environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, DispatchError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();

        match path {
            Some(path) => config.apply_file(path)?,
            None => {
                let default_path = default_config_path();
                if default_path.is_file() {
                    config.apply_file(&default_path)?;
                }
            }
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Defaults overlaid with environment variables only.
    pub fn from_env() -> Result<Self, DispatchError> {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay values from a TOML file.
    pub fn apply_file(&mut self, path: &Path) -> Result<(), DispatchError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DispatchError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        self.apply_toml(&raw)
            .map_err(|e| DispatchError::Configuration(format!("{}: {e}", path.display())))
    }

    /// Overlay values from TOML text.
    pub fn apply_toml(&mut self, raw: &str) -> Result<(), DispatchError> {
        let file: FileConfig =
            toml::from_str(raw).map_err(|e| DispatchError::Configuration(e.to_string()))?;

        if let Some(v) = file.base_url {
            self.base_url = v;
        }
        if let Some(v) = file.model {
            self.model = v;
        }
        if let Some(v) = file.api_key {
            self.api_key = Some(v);
        }
        if let Some(v) = file.timeout_secs {
            self.timeout = Duration::from_secs(v);
        }
        if let Some(v) = file.temperature {
            self.temperature = Some(v);
        }
        if let Some(v) = file.max_tokens {
            self.max_tokens = Some(v);
        }
        if let Some(v) = file.workspace_root {
            self.workspace_root = v;
        }
        if let Some(v) = file.webdriver_url {
            self.webdriver_url = Some(v);
        }
        if let Some(v) = file.smtp {
            self.smtp.overlay(v);
        }
        self.check()
    }

    /// Overlay `TOOLDISPATCH_*` variables read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), DispatchError> {
        if let Some(v) = lookup("TOOLDISPATCH_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = lookup("TOOLDISPATCH_MODEL") {
            self.model = v;
        }
        if let Some(v) = lookup("TOOLDISPATCH_API_KEY") {
            self.api_key = Some(v);
        }
        if let Some(v) = lookup("TOOLDISPATCH_TIMEOUT_SECS") {
            self.timeout = Duration::from_secs(parse_env("TOOLDISPATCH_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = lookup("TOOLDISPATCH_TEMPERATURE") {
            self.temperature = Some(parse_env("TOOLDISPATCH_TEMPERATURE", &v)?);
        }
        if let Some(v) = lookup("TOOLDISPATCH_MAX_TOKENS") {
            self.max_tokens = Some(parse_env("TOOLDISPATCH_MAX_TOKENS", &v)?);
        }
        if let Some(v) = lookup("TOOLDISPATCH_WORKSPACE_ROOT") {
            self.workspace_root = PathBuf::from(v);
        }
        if let Some(v) = lookup("TOOLDISPATCH_WEBDRIVER_URL") {
            self.webdriver_url = Some(v);
        }
        self.smtp.overlay(SmtpConfig {
            host: lookup("TOOLDISPATCH_SMTP_HOST"),
            port: lookup("TOOLDISPATCH_SMTP_PORT")
                .map(|v| parse_env("TOOLDISPATCH_SMTP_PORT", &v))
                .transpose()?,
            username: lookup("TOOLDISPATCH_SMTP_USERNAME"),
            password: lookup("TOOLDISPATCH_SMTP_PASSWORD"),
            from: lookup("TOOLDISPATCH_SMTP_FROM"),
        });
        self.check()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = root.into();
        self
    }

    /// Sampling settings to forward with each request.
    pub fn backend_settings(&self) -> BackendSettings {
        BackendSettings {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    fn check(&self) -> Result<(), DispatchError> {
        if self.base_url.trim().is_empty() {
            return Err(DispatchError::Configuration("base_url must not be empty".into()));
        }
        if self.model.trim().is_empty() {
            return Err(DispatchError::Configuration("model must not be empty".into()));
        }
        if self.timeout.is_zero() {
            return Err(DispatchError::Configuration("timeout must be greater than zero".into()));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, DispatchError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| DispatchError::Configuration(format!("{key}={value:?}: {e}")))
}

/// `~/.tooldispatch/config.toml`, or a relative fallback without a home dir.
pub fn default_config_path() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".tooldispatch"))
        .unwrap_or_else(|| PathBuf::from(".tooldispatch"))
        .join("config.toml")
}
