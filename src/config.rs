//! Top-level application configuration.
//!
//! Configuration is stored in `config.yaml` under the platform config
//! directory (or an explicit path) and includes:
//! - Search API location, credentials and timeouts
//! - Controller timing and paging settings

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{LexError, Result};

/// Environment variable overriding `api.base_url`
pub const API_URL_ENV: &str = "LEXSCROLL_API_URL";
/// Environment variable overriding `api.token`
pub const API_TOKEN_ENV: &str = "LEXSCROLL_API_TOKEN";

/// Scroll events closer together than this are collapsed
const MIN_SCROLL_THROTTLE_MS: u64 = 150;
const MAX_SCROLL_THROTTLE_MS: u64 = 200;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Search API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Controller timing and paging settings
    #[serde(default)]
    pub controller: ControllerConfig,
}

/// Search API settings
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is joined onto
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Total request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connect timeout in seconds (default: 10)
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000/".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl ApiConfig {
    /// Resolved base URL, environment first.
    ///
    /// The path always ends with `/` so endpoint paths join underneath it.
    pub fn base_url(&self) -> Result<Url> {
        let raw = match env::var(API_URL_ENV) {
            Ok(url) if !url.is_empty() => url,
            _ => self.base_url.clone(),
        };

        let mut url = Url::parse(&raw)
            .map_err(|e| LexError::Config(format!("invalid api.base_url '{raw}': {e}")))?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// Get the API token from environment variable or config
    pub fn token(&self) -> Option<SecretString> {
        // First check environment variable
        if let Ok(token) = env::var(API_TOKEN_ENV)
            && !token.is_empty()
        {
            return Some(SecretString::from(token));
        }

        // Fall back to config file
        self.token.clone().map(SecretString::from)
    }
}

/// Controller timing and paging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Debounce delay for free-text fields in milliseconds (default: 300)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Scroll observation throttle in milliseconds, 150-200 (default: 200)
    #[serde(default = "default_scroll_throttle_ms")]
    pub scroll_throttle_ms: u64,

    /// Distance from the bottom, in pixels, that counts as "near the end" (default: 300)
    #[serde(default = "default_scroll_threshold_px")]
    pub scroll_threshold_px: u32,

    /// Items requested per page (default: 20)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Drop appended items whose id is already displayed (default: false)
    #[serde(default)]
    pub dedupe: bool,
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_scroll_throttle_ms() -> u64 {
    200
}

fn default_scroll_threshold_px() -> u32 {
    300
}

fn default_page_size() -> u32 {
    20
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            scroll_throttle_ms: default_scroll_throttle_ms(),
            scroll_threshold_px: default_scroll_threshold_px(),
            page_size: default_page_size(),
            dedupe: false,
        }
    }
}

impl ControllerConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn scroll_throttle(&self) -> Duration {
        Duration::from_millis(self.scroll_throttle_ms)
    }
}

impl Config {
    /// Default config file location for this platform
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "lexscroll", "lexscroll")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Load configuration from `path` (or the default location).
    ///
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Config::default().validated(),
            },
        };

        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Config::default().validated();
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            LexError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config at {}: {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        config.validated()
    }

    /// Save configuration to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content)?;

        // Set restrictive permissions on Unix (owner read/write only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, permissions)?;
        }

        Ok(())
    }

    /// Reject unusable values; clamp the scroll throttle into its window.
    pub fn validated(mut self) -> Result<Self> {
        if self.controller.page_size == 0 {
            return Err(LexError::Config(
                "controller.page_size must be at least 1".to_string(),
            ));
        }

        let throttle = self.controller.scroll_throttle_ms;
        let clamped = throttle.clamp(MIN_SCROLL_THROTTLE_MS, MAX_SCROLL_THROTTLE_MS);
        if clamped != throttle {
            tracing::warn!(
                configured = throttle,
                used = clamped,
                min = MIN_SCROLL_THROTTLE_MS,
                max = MAX_SCROLL_THROTTLE_MS,
                "controller.scroll_throttle_ms out of range"
            );
            self.controller.scroll_throttle_ms = clamped;
        }

        self.api.base_url()?;
        Ok(self)
    }

    /// YAML rendering with the token redacted, for display
    pub fn to_redacted_yaml(&self) -> Result<String> {
        let mut shown = self.clone();
        if shown.api.token.is_some() {
            shown.api.token = Some("[REDACTED]".to_string());
        }
        Ok(serde_yaml_ng::to_string(&shown)?)
    }
}
