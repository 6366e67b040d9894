//! Upstream clients, one per domain.
//!
//! Each client owns its endpoint configuration and a shared [`HttpClient`],
//! speaks its provider's wire format and maps the payload onto the canonical
//! records in [`crate::models`]. Domains with interchangeable providers hold
//! an [`Orchestrator`](crate::gateway::Orchestrator) over them.
//!
//! [`HttpClient`]: crate::utils::HttpClient

pub mod cloudru;
pub mod duckduckgo;
pub mod fetch;
pub mod ip;
pub mod ufc;
pub mod weather;
pub mod wikipedia;
pub mod yandex;

pub use cloudru::ArtifactRegistryClient;
pub use duckduckgo::SearchClient;
pub use fetch::PageFetcher;
pub use ip::IpClient;
pub use ufc::UfcClient;
pub use weather::WeatherClient;
pub use wikipedia::WikipediaClient;
pub use yandex::YandexSearchClient;
