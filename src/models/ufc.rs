//! Mixed martial arts records.

use serde::Serialize;

/// Career summary of one fighter
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FighterRecord {
    pub name: String,
    pub nickname: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub reach: Option<String>,
    pub stance: Option<String>,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub source: String,
}

impl FighterRecord {
    pub fn total_fights(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    /// Share of fights won, in percent
    pub fn win_rate(&self) -> Option<f64> {
        let total = self.total_fights();
        (total > 0).then(|| f64::from(self.wins) * 100.0 / f64::from(total))
    }

    /// `W-L-D`
    pub fn record(&self) -> String {
        format!("{}-{}-{}", self.wins, self.losses, self.draws)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventSummary {
    pub name: String,
    pub date: Option<String>,
    pub venue: Option<String>,
    /// Names of the billed fighters, main event first
    pub headliners: Vec<String>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsItem {
    pub headline: String,
    pub description: Option<String>,
    pub published: Option<String>,
    pub url: Option<String>,
}

impl NewsItem {
    /// Whether the headline or description mentions any of `keywords` (lowercase)
    pub fn mentions_any(&self, keywords: &[&str]) -> bool {
        let text = format!(
            "{} {}",
            self.headline,
            self.description.as_deref().unwrap_or_default()
        )
        .to_lowercase();
        keywords.iter().any(|k| text.contains(k))
    }
}

/// Championship news and billed events, gathered from whichever feeds answered
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TitleFightReport {
    pub news: Vec<NewsItem>,
    pub events: Vec<EventSummary>,
}
