//! Settings structures for multisearch-rs configuration

use crate::providers::ProviderName;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main settings structure, loaded from settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub search: SearchSettings,
    pub server: ServerSettings,
    pub outgoing: OutgoingSettings,
    pub browser: BrowserSettings,
    pub providers: Vec<ProviderConfig>,
    pub credentials: CredentialSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("MULTISEARCH_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Ok(val) = std::env::var("MULTISEARCH_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("MULTISEARCH_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Ok(val) = std::env::var("CHROME_PATH") {
            if !val.trim().is_empty() {
                self.browser.chrome_path = Some(PathBuf::from(val));
            }
        }
        if let Ok(val) = std::env::var("ZHIHU_COOKIE") {
            if !val.trim().is_empty() {
                self.credentials.zhihu_cookie = Some(val);
            }
        }
    }

    /// Reject values that cannot be turned into durations
    pub fn validate(&self) -> Result<()> {
        let secs = self.outgoing.request_timeout;
        if !secs.is_finite() || secs <= 0.0 {
            anyhow::bail!("outgoing.request_timeout must be a positive number of seconds, got {secs}");
        }
        for provider in &self.providers {
            if let Some(secs) = provider.timeout {
                if Duration::try_from_secs_f64(secs).is_err() {
                    anyhow::bail!(
                        "providers[{}].timeout must be a non-negative number of seconds, got {secs}",
                        provider.name
                    );
                }
            }
        }
        Ok(())
    }

    /// Get provider config by name
    pub fn get_provider(&self, name: ProviderName) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Whether a provider has been switched off
    pub fn is_disabled(&self, name: ProviderName) -> bool {
        self.get_provider(name).map(|p| p.disabled).unwrap_or(false)
    }

    /// Base URL override for a provider
    pub fn base_url(&self, name: ProviderName) -> Option<&str> {
        self.get_provider(name).and_then(|p| p.base_url.as_deref())
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Instance name reported by /health
    pub instance_name: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "multisearch".to_string(),
        }
    }
}

/// Search behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Locale for boundary messages when the caller sends no Accept-Language
    pub default_locale: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_locale: "zh".to_string(),
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8888,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Pool max size
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
    /// Extra headers to send
    pub extra_headers: HashMap<String, String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 10.0,
            pool_maxsize: 20,
            verify_ssl: true,
            proxies: ProxySettings::default(),
            extra_headers: HashMap::new(),
        }
    }
}

impl OutgoingSettings {
    /// Request timeout, falling back to the default when the configured value is unusable
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.request_timeout)
            .ok()
            .filter(|timeout| !timeout.is_zero())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Headless browser settings for automated providers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Chrome/Chromium executable (auto-detected when unset)
    pub chrome_path: Option<PathBuf>,
    /// Run without a visible window
    pub headless: bool,
    /// Navigation timeout in milliseconds
    pub navigation_timeout_ms: u64,
    /// How long to wait for the intercepted API response, in milliseconds
    pub response_timeout_ms: u64,
    /// Pause after navigation so in-page requests can settle, in milliseconds
    pub settle_delay_ms: u64,
    pub window_width: u32,
    pub window_height: u32,
    /// Additional Chrome command-line arguments
    pub extra_args: Vec<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            navigation_timeout_ms: 30_000,
            response_timeout_ms: 10_000,
            settle_delay_ms: 1_000,
            window_width: 1920,
            window_height: 1080,
            extra_args: Vec::new(),
        }
    }
}

impl BrowserSettings {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Individual provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name
    pub name: ProviderName,
    /// Whether provider is disabled
    #[serde(default)]
    pub disabled: bool,
    /// Override for the provider's base URL
    #[serde(default)]
    pub base_url: Option<String>,
    /// Custom timeout for this provider, in seconds
    #[serde(default)]
    pub timeout: Option<f64>,
}

impl ProviderConfig {
    pub fn new(name: ProviderName) -> Self {
        Self {
            name,
            disabled: false,
            base_url: None,
            timeout: None,
        }
    }
}

/// Session credentials replayed to providers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialSettings {
    /// Raw `name=value; name=value` cookie string for zhihu
    pub zhihu_cookie: Option<String>,
}
