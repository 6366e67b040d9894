//! Canonical records, one set per domain.
//!
//! Upstream payloads are mapped onto these types whichever provider answered.
//! Fields a provider does not supply stay `None` and are shown as [`UNKNOWN`].

mod ip;
mod page;
mod registry;
mod search;
mod ufc;
mod weather;
mod wiki;

pub use ip::{IpFlags, IpRecord};
pub use page::PageText;
pub use registry::RegistryType;
pub use search::{HitExtras, SearchHit, SearchKind, SearchResults, YandexDoc};
pub use ufc::{EventSummary, FighterRecord, NewsItem, TitleFightReport};
pub use weather::{describe_weather_code, CurrentConditions, DailyForecast, Location, WeatherReport};
pub use wiki::{WikiArticle, WikiLinks, WikiSearchHit, WikiSection, WikiSections, WikiSummary, WIKI_LANGUAGES};

/// Placeholder shown for a field no source supplied
pub const UNKNOWN: &str = "unknown";

/// Borrow an optional field, falling back to [`UNKNOWN`]
pub fn or_unknown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(UNKNOWN)
}
