//! UFC data from the ESPN MMA API and ufcstats.com.

use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{secs, UfcConfig};
use crate::gateway::{
    ensure_success, GatewayError, Orchestrator, SourceError, SourceFailure, UpstreamSource,
};
use crate::models::{EventSummary, FighterRecord, NewsItem, TitleFightReport};
use crate::normalize::{clean_text, lenient};
use crate::utils::HttpClient;

const ESPN_ID: &str = "espn";
const UFCSTATS_ID: &str = "ufcstats";

const RANKING_KEYWORDS: &[&str] = &["ranking", "champion", "title", "belt"];
const TITLE_KEYWORDS: &[&str] = &["title", "championship", "belt", "champion"];

/// Where an event listing is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventsParser {
    EspnScoreboard,
    UfcStatsUpcoming,
    UfcStatsCompleted,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Scoreboard {
    events: Vec<EspnEvent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EspnEvent {
    #[serde(deserialize_with = "lenient::string")]
    name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    date: Option<String>,
    competitions: Vec<Competition>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Competition {
    venue: Option<Venue>,
    competitors: Vec<Competitor>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Venue {
    #[serde(deserialize_with = "lenient::string")]
    full_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Competitor {
    athlete: Option<Athlete>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Athlete {
    #[serde(deserialize_with = "lenient::string")]
    display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NewsFeed {
    articles: Vec<Article>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Article {
    #[serde(deserialize_with = "lenient::string")]
    headline: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    description: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    published: Option<String>,
    links: Option<Value>,
}

fn parse_scoreboard(data: Value) -> Result<Vec<EventSummary>, SourceError> {
    let board: Scoreboard = serde_json::from_value(data)?;
    Ok(board
        .events
        .into_iter()
        .filter_map(|event| {
            let main = event.competitions.into_iter().next().unwrap_or_default();
            Some(EventSummary {
                name: event.name?,
                date: event.date.as_deref().map(format_espn_date),
                venue: main.venue.and_then(|v| v.full_name),
                headliners: main
                    .competitors
                    .into_iter()
                    .filter_map(|c| c.athlete.and_then(|a| a.display_name))
                    .collect(),
                source: ESPN_ID.to_string(),
            })
        })
        .collect())
}

fn parse_news(data: Value) -> Result<Vec<NewsItem>, SourceError> {
    let feed: NewsFeed = serde_json::from_value(data)?;
    Ok(feed
        .articles
        .into_iter()
        .filter_map(|article| {
            Some(NewsItem {
                url: article
                    .links
                    .as_ref()
                    .and_then(|l| l.pointer("/web/href"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                headline: article.headline?,
                description: article.description,
                published: article.published.as_deref().map(format_espn_date),
            })
        })
        .collect())
}

/// ESPN stamps look like `2024-05-11T22:00Z`
fn format_espn_date(raw: &str) -> String {
    if let Ok(t) = chrono::DateTime::parse_from_rfc3339(raw) {
        return t.format("%Y-%m-%d %H:%M UTC").to_string();
    }
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%MZ")
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Parse(format!("selector {}: {}", css, e)))
}

fn cell_text(cell: Option<&ElementRef<'_>>) -> Option<String> {
    cell.map(|c| clean_text(&c.text().collect::<Vec<_>>().join(" ")))
        .filter(|t| !t.is_empty() && t != "--")
}

/// Event listing rows: name link and date in the first cell, location in the second
fn parse_event_rows(html: &str) -> Result<Vec<EventSummary>, SourceError> {
    let document = Html::parse_document(html);
    let rows = selector("tr.b-statistics__table-row")?;
    let cells = selector("td")?;
    let link = selector("a")?;
    let date = selector("span.b-statistics__date")?;

    let mut events = Vec::new();
    for row in document.select(&rows) {
        let row_cells: Vec<ElementRef<'_>> = row.select(&cells).collect();
        let Some(first) = row_cells.first() else {
            continue;
        };
        let Some(name) = cell_text(first.select(&link).next().as_ref()) else {
            continue;
        };
        events.push(EventSummary {
            name,
            date: cell_text(first.select(&date).next().as_ref()),
            venue: cell_text(row_cells.get(1)),
            headliners: Vec::new(),
            source: UFCSTATS_ID.to_string(),
        });
    }
    Ok(events)
}

fn count(cell: Option<&ElementRef<'_>>) -> u32 {
    cell_text(cell)
        .and_then(|t| t.parse::<u32>().ok())
        .unwrap_or_default()
}

/// Fighter search table: first, last, nickname, height, weight, reach,
/// stance, W, L, D
fn parse_fighter_rows(html: &str) -> Result<Vec<FighterRecord>, SourceError> {
    let document = Html::parse_document(html);
    let rows = selector("tr.b-statistics__table-row")?;
    let cells = selector("td")?;

    let mut fighters = Vec::new();
    for row in document.select(&rows) {
        let c: Vec<ElementRef<'_>> = row.select(&cells).collect();
        if c.len() < 10 {
            continue;
        }
        let name = [cell_text(c.first()), cell_text(c.get(1))]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            continue;
        }
        fighters.push(FighterRecord {
            name,
            nickname: cell_text(c.get(2)),
            height: cell_text(c.get(3)),
            weight: cell_text(c.get(4)),
            reach: cell_text(c.get(5)),
            stance: cell_text(c.get(6)),
            wins: count(c.get(7)),
            losses: count(c.get(8)),
            draws: count(c.get(9)),
            source: UFCSTATS_ID.to_string(),
        });
    }
    Ok(fighters)
}

#[derive(Debug, Clone)]
pub struct UfcClient {
    http: HttpClient,
    espn_url: String,
    ufcstats_url: String,
    timeout: Duration,
    upcoming: Orchestrator<EventsParser>,
    event_search: Orchestrator<EventsParser>,
}

impl UfcClient {
    pub fn new(http: HttpClient, config: &UfcConfig) -> Self {
        let timeout = secs(config.timeout_secs);
        let espn = UpstreamSource::new(ESPN_ID, &config.espn_url, timeout, EventsParser::EspnScoreboard);

        let upcoming = vec![
            espn.clone(),
            UpstreamSource::new(UFCSTATS_ID, &config.ufcstats_url, timeout, EventsParser::UfcStatsUpcoming),
        ];
        let event_search = vec![
            espn,
            UpstreamSource::new(UFCSTATS_ID, &config.ufcstats_url, timeout, EventsParser::UfcStatsCompleted),
        ];

        Self {
            http,
            espn_url: config.espn_url.trim_end_matches('/').to_string(),
            ufcstats_url: config.ufcstats_url.trim_end_matches('/').to_string(),
            timeout,
            upcoming: Orchestrator::new("ufc upcoming events", upcoming),
            event_search: Orchestrator::new("ufc event search", event_search),
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value, SourceError> {
        debug!(url, "UFC request");
        let response = self.http.get(url).timeout(self.timeout).send().await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn get_html(&self, url: &str, query: &[(&str, &str)]) -> Result<String, SourceError> {
        debug!(url, "UFC request");
        let response = self
            .http
            .get(url)
            .query(query)
            .timeout(self.timeout)
            .send()
            .await?;
        Ok(ensure_success(response).await?.text().await?)
    }

    async fn events_from(&self, source: &UpstreamSource<EventsParser>) -> Result<Vec<EventSummary>, SourceError> {
        match source.parser() {
            EventsParser::EspnScoreboard => {
                parse_scoreboard(self.get_json(&source.endpoint("/scoreboard")).await?)
            }
            EventsParser::UfcStatsUpcoming => {
                parse_event_rows(&self.get_html(&source.endpoint("/statistics/events/upcoming"), &[]).await?)
            }
            EventsParser::UfcStatsCompleted => parse_event_rows(
                &self
                    .get_html(&source.endpoint("/statistics/events/completed"), &[("page", "all")])
                    .await?,
            ),
        }
    }

    async fn news(&self) -> Result<Vec<NewsItem>, SourceError> {
        parse_news(self.get_json(&format!("{}/news", self.espn_url)).await?)
    }

    /// Scheduled events, from the ESPN scoreboard or else ufcstats
    pub async fn upcoming_events(&self) -> Result<Vec<EventSummary>, GatewayError> {
        info!("Fetching upcoming UFC events");
        self.upcoming
            .resolve(|source| async move {
                let events = self.events_from(source).await?;
                if events.is_empty() && source.parser() == EventsParser::EspnScoreboard {
                    return Err(SourceError::rejected("scoreboard lists no events"));
                }
                Ok(events)
            })
            .await
    }

    /// Find an event by (partial, case-insensitive) name on the scoreboard
    /// or among completed events
    pub async fn find_event(&self, event_name: &str) -> Result<Option<EventSummary>, GatewayError> {
        info!(event_name, "Searching UFC event");
        let needle = event_name.trim().to_lowercase();
        self.event_search
            .resolve(|source| {
                let needle = needle.clone();
                async move {
                    let found = self
                        .events_from(source)
                        .await?
                        .into_iter()
                        .find(|e| e.name.to_lowercase().contains(&needle));
                    match (found, source.parser()) {
                        (None, EventsParser::EspnScoreboard) => {
                            Err(SourceError::rejected("event not on scoreboard"))
                        }
                        (found, _) => Ok(found),
                    }
                }
            })
            .await
    }

    /// Look a fighter up on ufcstats; every word of `name` must match.
    pub async fn search_fighter(&self, name: &str) -> Result<Option<FighterRecord>, GatewayError> {
        info!(name, "Searching fighter");
        let tokens: Vec<String> = name.split_whitespace().map(str::to_lowercase).collect();
        let Some(last) = tokens.last() else {
            return Ok(None);
        };

        let html = self
            .get_html(
                &format!("{}/statistics/fighters/search", self.ufcstats_url),
                &[("query", last.as_str())],
            )
            .await
            .map_err(|e| GatewayError::upstream(UFCSTATS_ID, e))?;

        let fighters = parse_fighter_rows(&html).map_err(|e| GatewayError::upstream(UFCSTATS_ID, e))?;
        Ok(fighters.into_iter().find(|f| {
            let full = f.name.to_lowercase();
            tokens.iter().all(|t| full.contains(t.as_str()))
        }))
    }

    /// ESPN headlines about rankings and champions
    pub async fn ranking_news(&self) -> Result<Vec<NewsItem>, GatewayError> {
        info!("Fetching UFC ranking news");
        let news = self
            .news()
            .await
            .map_err(|e| GatewayError::upstream(ESPN_ID, e))?;
        Ok(news
            .into_iter()
            .filter(|item| item.mentions_any(RANKING_KEYWORDS))
            .take(5)
            .collect())
    }

    /// Championship news and upcoming cards. Either feed may fail on its
    /// own; only when both fail is the call an error.
    ///
    /// The two feeds carry different data, so they are queried together
    /// rather than one after the other as fallbacks.
    pub async fn title_fights(&self) -> Result<TitleFightReport, GatewayError> {
        info!("Fetching UFC title fights");
        let scoreboard_url = format!("{}/scoreboard", self.espn_url);
        let (events, news) = tokio::join!(
            async { parse_scoreboard(self.get_json(&scoreboard_url).await?) },
            self.news(),
        );

        let mut failures = Vec::new();
        let events = events.unwrap_or_else(|e| {
            warn!(error = %e, "Scoreboard unavailable");
            failures.push(SourceFailure::new("espn scoreboard", &e));
            Vec::new()
        });
        let news = news.unwrap_or_else(|e| {
            warn!(error = %e, "News feed unavailable");
            failures.push(SourceFailure::new("espn news", &e));
            Vec::new()
        });
        if failures.len() == 2 {
            return Err(GatewayError::AllSourcesUnavailable {
                domain: "ufc title fights".to_string(),
                attempts: failures,
            });
        }

        Ok(TitleFightReport {
            news: news
                .into_iter()
                .filter(|item| item.mentions_any(TITLE_KEYWORDS))
                .take(3)
                .collect(),
            events: events
                .into_iter()
                .filter(|e| {
                    let name = e.name.to_lowercase();
                    name.contains("ufc") || TITLE_KEYWORDS.iter().any(|k| name.contains(k))
                })
                .take(3)
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    const FIGHTERS_PAGE: &str = r##"<table class="b-statistics__table">
        <tr class="b-statistics__table-row"><td></td></tr>
        <tr class="b-statistics__table-row">
          <td><a href="#">Jon</a></td><td><a href="#">Jones</a></td><td><a href="#">Bones</a></td>
          <td>6' 4"</td><td>248 lbs.</td><td>84.5"</td><td>Orthodox</td>
          <td>27</td><td>1</td><td>0</td><td></td>
        </tr>
        <tr class="b-statistics__table-row">
          <td><a href="#">Jon</a></td><td><a href="#">Tuck</a></td><td></td>
          <td>5' 10"</td><td>155 lbs.</td><td>--</td><td>Orthodox</td>
          <td>11</td><td>7</td><td>0</td><td></td>
        </tr>
    </table>"##;

    const EVENTS_PAGE: &str = r##"<table>
        <tr class="b-statistics__table-row"><td></td></tr>
        <tr class="b-statistics__table-row">
          <td><i class="b-statistics__table-content"><a href="#">UFC 305: Du Plessis vs. Adesanya</a>
              <span class="b-statistics__date">August 17, 2024</span></i></td>
          <td>Perth, Western Australia, Australia</td>
        </tr>
    </table>"##;

    fn client(server: &mockito::Server) -> UfcClient {
        let config = UfcConfig {
            espn_url: format!("{}/espn", server.url()),
            ufcstats_url: server.url(),
            timeout_secs: 5,
        };
        UfcClient::new(HttpClient::browser(Duration::from_secs(5)).unwrap(), &config)
    }

    #[test]
    fn test_parse_fighter_rows() {
        let fighters = parse_fighter_rows(FIGHTERS_PAGE).unwrap();
        assert_eq!(fighters.len(), 2);
        assert_eq!(fighters[0].name, "Jon Jones");
        assert_eq!(fighters[0].nickname.as_deref(), Some("Bones"));
        assert_eq!(fighters[0].record(), "27-1-0");
        assert_eq!(fighters[1].reach, None);
    }

    #[test]
    fn test_parse_event_rows() {
        let events = parse_event_rows(EVENTS_PAGE).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "UFC 305: Du Plessis vs. Adesanya");
        assert_eq!(events[0].date.as_deref(), Some("August 17, 2024"));
        assert_eq!(events[0].venue.as_deref(), Some("Perth, Western Australia, Australia"));
    }

    #[test]
    fn test_parse_scoreboard() {
        let events = parse_scoreboard(json!({
            "events": [{
                "name": "UFC 306",
                "date": "2024-09-15T02:00Z",
                "competitions": [{
                    "venue": {"fullName": "Sphere"},
                    "competitors": [
                        {"athlete": {"displayName": "Sean O'Malley"}},
                        {"athlete": {"displayName": "Merab Dvalishvili"}}
                    ]
                }]
            }, {"date": "nameless"}]
        }))
        .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].date.as_deref(), Some("2024-09-15 02:00 UTC"));
        assert_eq!(events[0].venue.as_deref(), Some("Sphere"));
        assert_eq!(events[0].headliners, vec!["Sean O'Malley", "Merab Dvalishvili"]);
    }

    #[tokio::test]
    async fn test_search_fighter_matches_all_words() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/statistics/fighters/search")
            .match_query(Matcher::UrlEncoded("query".into(), "jones".into()))
            .with_body(FIGHTERS_PAGE)
            .create_async()
            .await;

        let fighter = client(&server).search_fighter("Jon Jones").await.unwrap().unwrap();
        assert_eq!(fighter.name, "Jon Jones");
        assert_eq!(fighter.source, "ufcstats");
    }

    #[tokio::test]
    async fn test_upcoming_falls_back_to_ufcstats() {
        let mut server = mockito::Server::new_async().await;
        let espn = server
            .mock("GET", "/espn/scoreboard")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;
        server
            .mock("GET", "/statistics/events/upcoming")
            .with_body(EVENTS_PAGE)
            .create_async()
            .await;

        let events = client(&server).upcoming_events().await.unwrap();
        espn.assert_async().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source, "ufcstats");
    }

    #[tokio::test]
    async fn test_title_fights_tolerate_one_feed_failing() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/espn/scoreboard")
            .with_status(503)
            .create_async()
            .await;
        server
            .mock("GET", "/espn/news")
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"articles": [
                    {"headline": "Champion retains belt", "description": "Main event recap"},
                    {"headline": "Prelim results"}
                ]}"#,
            )
            .create_async()
            .await;

        let report = client(&server).title_fights().await.unwrap();
        assert!(report.events.is_empty());
        assert_eq!(report.news.len(), 1);
        assert_eq!(report.news[0].headline, "Champion retains belt");
    }
}
