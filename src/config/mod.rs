//! Configuration management.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `MCP_GATEWAYS__SECTION__KEY` environment variables. Upstream credentials
//! are not part of the file; they are read from their own environment
//! variables when the domain that needs them starts.

mod file_config;

pub use file_config::{find_config_file, save_config, to_toml, CONFIG_FILE_NAME};

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment prefix for configuration overrides
pub const ENV_PREFIX: &str = "MCP_GATEWAYS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    MissingEnv(&'static str),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub weather: WeatherConfig,
    pub fetch: FetchConfig,
    pub ip: IpConfig,
    pub registry: RegistryConfig,
    pub ufc: UfcConfig,
    pub yandex: YandexConfig,
    pub search: SearchConfig,
    pub wikipedia: WikipediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub geocoding_url: String,
    pub forecast_url: String,
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            geocoding_url: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Timeout used when a call does not give one
    pub default_timeout_secs: u64,
    /// Characters of a non-HTML body returned as a preview
    pub preview_chars: usize,
    /// Permit loopback and private-network URLs
    pub allow_private_hosts: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: 30,
            preview_chars: 2000,
            allow_private_hosts: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IpConfig {
    pub lookup_timeout_secs: u64,
    pub self_ip_timeout_secs: u64,
    pub ip_api_com_url: String,
    pub ipapi_co_url: String,
    pub ipwhois_url: String,
    pub ipify_url: String,
    pub httpbin_url: String,
    pub icanhazip_url: String,
    pub icanhazip_v4_url: String,
}

impl Default for IpConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_secs: 15,
            self_ip_timeout_secs: 10,
            ip_api_com_url: "http://ip-api.com".to_string(),
            ipapi_co_url: "https://ipapi.co".to_string(),
            ipwhois_url: "http://ipwhois.app".to_string(),
            ipify_url: "https://api.ipify.org".to_string(),
            httpbin_url: "https://httpbin.org".to_string(),
            icanhazip_url: "https://icanhazip.com".to_string(),
            icanhazip_v4_url: "https://ipv4.icanhazip.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub iam_url: String,
    pub api_url: String,
    pub timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            iam_url: "https://iam.api.cloud.ru".to_string(),
            api_url: "https://ar.api.cloud.ru".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UfcConfig {
    pub espn_url: String,
    pub ufcstats_url: String,
    pub timeout_secs: u64,
}

impl Default for UfcConfig {
    fn default() -> Self {
        Self {
            espn_url: "https://site.api.espn.com/apis/site/v2/sports/mma/ufc".to_string(),
            ufcstats_url: "http://ufcstats.com".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YandexConfig {
    pub search_url: String,
    pub timeout_secs: u64,
}

impl Default for YandexConfig {
    fn default() -> Self {
        Self {
            search_url: "https://searchapi.api.cloud.yandex.net/v2/web/search".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub html_url: String,
    pub lite_url: String,
    /// Host of the vqd token page and the news/image/video JSON endpoints
    pub api_url: String,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            html_url: "https://html.duckduckgo.com".to_string(),
            lite_url: "https://lite.duckduckgo.com".to_string(),
            api_url: "https://duckduckgo.com".to_string(),
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WikipediaConfig {
    /// Site root; `{lang}` is replaced by the requested language
    pub site_url: String,
    pub timeout_secs: u64,
    /// Longer timeout for full article content
    pub content_timeout_secs: u64,
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            site_url: "https://{lang}.wikipedia.org".to_string(),
            timeout_secs: 10,
            content_timeout_secs: 20,
        }
    }
}

/// Seconds to [`Duration`], never zero
pub fn secs(value: u64) -> Duration {
    Duration::from_secs(value.max(1))
}

/// Cloud.ru service-account credentials
#[derive(Clone)]
pub struct RegistryCredentials {
    pub key_id: String,
    pub secret: String,
    pub project_id: String,
}

impl std::fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("key_id", &self.key_id)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl RegistryCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            key_id: required(&lookup, "CLOUD_RU_KEY_ID")?,
            secret: required(&lookup, "CLOUD_RU_SECRET")?,
            project_id: required(&lookup, "CLOUD_RU_PROJECT_ID")?,
        })
    }
}

/// Yandex Cloud Search API credentials
#[derive(Clone)]
pub struct YandexCredentials {
    pub api_key: String,
    pub folder_id: String,
    pub verify_ssl: bool,
}

impl std::fmt::Debug for YandexCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YandexCredentials")
            .field("folder_id", &self.folder_id)
            .field("verify_ssl", &self.verify_ssl)
            .finish_non_exhaustive()
    }
}

impl YandexCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let verify_ssl = lookup("YANDEX_VERIFY_SSL")
            .map(|v| !matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(true);
        Ok(Self {
            api_key: required(&lookup, "YANDEX_API_KEY")?,
            folder_id: required(&lookup, "YANDEX_FOLDER_ID")?,
            verify_ssl,
        })
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingEnv(name))
}

/// Load configuration from defaults, an optional file and the environment
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut builder = ::config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(::config::File::from(path).required(true));
    }

    let settings = builder
        .add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
