//! Tool handlers, one module per server.
//!
//! Each module turns a shared upstream client into the [`Tool`]s of its
//! server. Arguments are validated before the client is touched.

pub mod fetch;
pub mod ip;
pub mod registry;
pub mod search;
pub mod ufc;
pub mod weather;
pub mod wikipedia;
pub mod yandex;

use std::sync::Arc;

use tracing::info;

use crate::config::{secs, Config, ConfigError, RegistryCredentials, YandexCredentials};
use crate::mcp::domain::Domain;
use crate::mcp::tools::{Tool, ToolRegistry};
use crate::sources::{
    ArtifactRegistryClient, IpClient, PageFetcher, SearchClient, UfcClient, WeatherClient,
    WikipediaClient, YandexSearchClient,
};
use crate::utils::HttpClient;

/// Build the clients of `domain` and collect its tools.
///
/// Domains with credentials read them from the environment here, so a
/// missing variable only stops the server that needs it.
pub fn tools_for(domain: Domain, config: &Config) -> Result<ToolRegistry, ConfigError> {
    let tools: Vec<Tool> = match domain {
        Domain::Weather => {
            let http = HttpClient::new(secs(config.weather.timeout_secs))?;
            weather::tools(Arc::new(WeatherClient::new(http, &config.weather)))
        }
        Domain::Fetch => {
            let http = HttpClient::guarded_browser(
                secs(fetch::MAX_TIMEOUT_SECS as u64),
                config.fetch.allow_private_hosts,
            )?;
            fetch::tools(Arc::new(PageFetcher::new(http, &config.fetch)), &config.fetch)
        }
        Domain::Ip => {
            let http = HttpClient::new(secs(config.ip.lookup_timeout_secs))?;
            ip::tools(Arc::new(IpClient::new(http, &config.ip)))
        }
        Domain::Registry => {
            let credentials = RegistryCredentials::from_env()?;
            let http = HttpClient::new(secs(config.registry.timeout_secs))?;
            registry::tools(Arc::new(ArtifactRegistryClient::new(
                http,
                &config.registry,
                credentials,
            )))
        }
        Domain::Ufc => {
            let http = HttpClient::browser(secs(config.ufc.timeout_secs))?;
            ufc::tools(Arc::new(UfcClient::new(http, &config.ufc)))
        }
        Domain::Yandex => {
            let credentials = YandexCredentials::from_env()?;
            let http = HttpClient::with_tls_verification(
                secs(config.yandex.timeout_secs),
                credentials.verify_ssl,
            )?;
            yandex::tools(Arc::new(YandexSearchClient::new(
                http,
                &config.yandex,
                credentials,
            )))
        }
        Domain::Search => {
            let http = HttpClient::browser(secs(config.search.timeout_secs))?;
            search::tools(Arc::new(SearchClient::new(http, &config.search)))
        }
        Domain::Wikipedia => {
            let http = HttpClient::new(secs(config.wikipedia.content_timeout_secs))?;
            wikipedia::tools(Arc::new(WikipediaClient::new(http, &config.wikipedia)))
        }
    };

    info!(domain = %domain, tools = tools.len(), "Registered tools");
    Ok(tools.into_iter().collect())
}
