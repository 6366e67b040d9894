//! UFC fighters, events and news.

use std::fmt::Write as _;

use super::{push_line, RULE};
use crate::gateway::truncate_chars;
use crate::models::{or_unknown, EventSummary, FighterRecord, NewsItem, TitleFightReport};

const DESCRIPTION_CHARS: usize = 150;

pub fn fighter_not_found(name: &str) -> String {
    format!(
        "Fighter \"{}\" was not found on ufcstats.com. Check the spelling or use the full name, e.g. \"Jon Jones\".",
        name
    )
}

pub fn fighter(fighter: &FighterRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", fighter.name);
    push_line(&mut out, "Nickname", fighter.nickname.as_deref());
    let _ = writeln!(out, "Record: {}", fighter.record());
    let _ = writeln!(out, "Height: {}", or_unknown(&fighter.height));
    let _ = writeln!(out, "Weight: {}", or_unknown(&fighter.weight));
    let _ = writeln!(out, "Reach: {}", or_unknown(&fighter.reach));
    let _ = writeln!(out, "Stance: {}", or_unknown(&fighter.stance));
    if let Some(rate) = fighter.win_rate() {
        let _ = writeln!(out, "Win rate: {:.1}% over {} fights", rate, fighter.total_fights());
    }
    let _ = write!(out, "Source: {}", fighter.source);
    out
}

/// Side-by-side summary of two fighters, either of which may be unknown
pub fn comparison(
    (name1, first): (&str, Option<&FighterRecord>),
    (name2, second): (&str, Option<&FighterRecord>),
) -> String {
    let mut out = String::new();
    let label = |name: &str, record: Option<&FighterRecord>| {
        record.map(|r| r.name.clone()).unwrap_or_else(|| name.to_string())
    };
    let _ = writeln!(out, "{} vs {}\n", label(name1, first), label(name2, second));

    for (name, record) in [(name1, first), (name2, second)] {
        match record {
            Some(record) => {
                let _ = writeln!(out, "{}\n{}", fighter(record), RULE);
            }
            None => {
                let _ = writeln!(out, "{}\n{}", fighter_not_found(name), RULE);
            }
        }
    }

    if let (Some(a), Some(b)) = (first, second) {
        let verdict = match a.wins.cmp(&b.wins) {
            std::cmp::Ordering::Greater => format!("{} has more wins", a.name),
            std::cmp::Ordering::Less => format!("{} has more wins", b.name),
            std::cmp::Ordering::Equal => "Both have the same number of wins".to_string(),
        };
        let _ = writeln!(out, "{}", verdict);
        if let (Some(wa), Some(wb)) = (&a.weight, &b.weight) {
            if wa == wb {
                let _ = writeln!(out, "Same weight: {}", wa);
            } else {
                let _ = writeln!(out, "Different weights: {} vs {}", wa, wb);
            }
        }
    }
    out
}

fn push_event(out: &mut String, event: &EventSummary) {
    let _ = writeln!(out, "{}", event.name);
    let _ = writeln!(out, "Date: {}", or_unknown(&event.date));
    let _ = writeln!(out, "Venue: {}", or_unknown(&event.venue));
    if event.headliners.len() >= 2 {
        let _ = writeln!(out, "Main event: {} vs {}", event.headliners[0], event.headliners[1]);
    }
}

pub fn events(events: &[EventSummary]) -> String {
    if events.is_empty() {
        return "No upcoming UFC events are listed".to_string();
    }

    let mut out = String::from("Upcoming UFC events\n");
    for event in events.iter().take(5) {
        let _ = writeln!(out, "\n{}", RULE);
        push_event(&mut out, event);
    }
    if let Some(first) = events.first() {
        let _ = write!(out, "\nSource: {}", first.source);
    }
    out
}

pub fn event(event: &EventSummary) -> String {
    let mut out = String::new();
    push_event(&mut out, event);
    let _ = write!(out, "Source: {}", event.source);
    out
}

pub fn event_not_found(name: &str) -> String {
    format!("Event \"{}\" was not found on the schedule or among completed events", name)
}

fn push_news(out: &mut String, item: &NewsItem) {
    let _ = writeln!(out, "\n{}", item.headline);
    if let Some(description) = &item.description {
        let _ = writeln!(out, "{}", truncate_chars(description, DESCRIPTION_CHARS));
    }
    push_line(out, "Published", item.published.as_deref());
    push_line(out, "Link", item.url.as_deref());
}

pub fn ranking_news(news: &[NewsItem]) -> String {
    if news.is_empty() {
        return "No ranking news right now. Full rankings: https://www.ufc.com/rankings".to_string();
    }
    let mut out = String::from("UFC ranking news\n");
    for item in news {
        push_news(&mut out, item);
    }
    out.push_str("\nFull rankings: https://www.ufc.com/rankings");
    out
}

pub fn title_fights(report: &TitleFightReport) -> String {
    if report.news.is_empty() && report.events.is_empty() {
        return "No title fight news or billed events right now".to_string();
    }

    let mut out = String::from("UFC title fights\n");
    if !report.news.is_empty() {
        out.push_str("\nChampionship news\n");
        for item in &report.news {
            push_news(&mut out, item);
        }
    }
    if !report.events.is_empty() {
        out.push_str("\nUpcoming cards\n");
        for event in &report.events {
            let _ = writeln!(out, "\n{}", RULE);
            push_event(&mut out, event);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jones() -> FighterRecord {
        FighterRecord {
            name: "Jon Jones".into(),
            weight: Some("248 lbs.".into()),
            wins: 27,
            losses: 1,
            source: "ufcstats".into(),
            ..FighterRecord::default()
        }
    }

    #[test]
    fn test_fighter_card() {
        let text = fighter(&jones());
        assert!(text.contains("Record: 27-1-0"));
        assert!(text.contains("Reach: unknown"));
        assert!(text.contains("Win rate: 96.4% over 28 fights"));
    }

    #[test]
    fn test_comparison_with_missing_fighter() {
        let text = comparison(("jon jones", Some(&jones())), ("nobody", None));
        assert!(text.starts_with("Jon Jones vs nobody"));
        assert!(text.contains("Fighter \"nobody\" was not found"));
        assert!(!text.contains("more wins"));
    }
}
