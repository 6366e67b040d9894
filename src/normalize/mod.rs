//! Turning heterogeneous upstream payloads into canonical records and text.
//!
//! - [`html`]: readable text from web pages
//! - [`wiki`]: wikitext markup removal
//! - [`yandex_xml`]: result documents from the Yandex XML envelope
//! - [`lenient`]: serde adapters that never let one bad field sink a record

pub mod html;
pub mod lenient;
pub mod wiki;
pub mod yandex_xml;

pub use html::{clean_text, extract_text, ExtractedText};
pub use wiki::clean_wikitext;
pub use yandex_xml::parse_documents;

use regex::Regex;
use std::sync::OnceLock;

/// Drop HTML tags from a short fragment such as a search snippet
pub fn strip_tags(fragment: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid regex"));
    let text = tag.replace_all(fragment, "");
    decode_basic_entities(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_basic_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
