//! The tool servers this binary can run.

use std::fmt;

use clap::ValueEnum;

/// One MCP server: a family of tools over one external API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Domain {
    /// Open-Meteo weather
    Weather,
    /// Web page text extraction
    Fetch,
    /// IP geolocation
    Ip,
    /// Cloud.ru Artifact Registry
    Registry,
    /// UFC fighters and events
    Ufc,
    /// Yandex Cloud web search
    Yandex,
    /// DuckDuckGo web, news, image and video search
    Search,
    /// Wikipedia articles
    Wikipedia,
}

impl Domain {
    pub const ALL: [Domain; 8] = [
        Domain::Weather,
        Domain::Fetch,
        Domain::Ip,
        Domain::Registry,
        Domain::Ufc,
        Domain::Yandex,
        Domain::Search,
        Domain::Wikipedia,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Domain::Weather => "weather",
            Domain::Fetch => "fetch",
            Domain::Ip => "ip",
            Domain::Registry => "registry",
            Domain::Ufc => "ufc",
            Domain::Yandex => "yandex",
            Domain::Search => "search",
            Domain::Wikipedia => "wikipedia",
        }
    }

    /// Port the HTTP transport listens on unless told otherwise
    pub fn default_port(self) -> u16 {
        match self {
            Domain::Weather => 8001,
            Domain::Fetch => 8002,
            Domain::Ip => 8003,
            Domain::Registry => 8004,
            Domain::Ufc => 8005,
            Domain::Yandex => 8006,
            Domain::Search => 8007,
            Domain::Wikipedia => 8008,
        }
    }

    /// MCP server name announced to clients
    pub fn server_name(self) -> String {
        format!("{}-mcp", self.name())
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
