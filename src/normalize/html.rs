//! Readable text extraction from HTML pages.

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::OnceLock;

/// Elements whose text never belongs to the readable content
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "meta", "link", "noscript", "header", "footer", "nav",
];

/// Title and main text of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub title: String,
    pub content: String,
}

/// Pull the title and the main readable text out of an HTML document.
///
/// The content root is the first of `<main>`, `<article>`, a `<div>` whose
/// class mentions "content" or "main", `<body>`, falling back to the whole
/// document. Scripts, styles and page chrome are dropped.
pub fn extract_text(html: &str) -> ExtractedText {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|el| collapse_spaces(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_string());

    let root = content_root(&document).unwrap_or_else(|| document.root_element());

    let mut pieces = Vec::new();
    collect_text(root, &mut pieces);

    ExtractedText {
        title,
        content: clean_text(&pieces.join(" ")),
    }
}

fn content_root(document: &Html) -> Option<ElementRef<'_>> {
    for css in ["main", "article"] {
        if let Some(found) = first_visible(document, css) {
            return Some(found);
        }
    }

    if let Ok(divs) = Selector::parse("div[class]") {
        let content_class = content_class_pattern();
        let found = document.select(&divs).find(|div| {
            !inside_skipped(div)
                && div
                    .value()
                    .attr("class")
                    .is_some_and(|class| content_class.is_match(class))
        });
        if found.is_some() {
            return found;
        }
    }

    first_visible(document, "body")
}

fn first_visible<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    document.select(&selector).find(|el| !inside_skipped(el))
}

fn inside_skipped(element: &ElementRef<'_>) -> bool {
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
    })
}

fn collect_text(element: ElementRef<'_>, out: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    out.push(text.to_string());
                }
            }
            Node::Element(el) if SKIPPED_ELEMENTS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, out);
                }
            }
            _ => {}
        }
    }
}

fn content_class_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)content|main").expect("valid regex"))
}

fn collapse_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapse runs of whitespace inside lines and drop empty lines
pub fn clean_text(text: &str) -> String {
    text.lines()
        .map(collapse_spaces)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_is_dropped_and_spaces_collapse() {
        let page = extract_text(
            "<html><head><title>T</title></head><body><script>x()</script><p>Hello   world</p></body></html>",
        );
        assert_eq!(page.title, "T");
        assert_eq!(page.content, "Hello world");
    }

    #[test]
    fn test_main_wins_over_body() {
        let page = extract_text(
            "<html><body><nav>Menu</nav><main><h1>Heading</h1><p>Body text</p></main><p>Aside</p></body></html>",
        );
        assert_eq!(page.content, "Heading Body text");
    }

    #[test]
    fn test_content_div_is_preferred_over_body() {
        let page = extract_text(
            r#"<html><body><div class="sidebar">Links</div><div class="Page-Content">Article</div></body></html>"#,
        );
        assert_eq!(page.content, "Article");
    }

    #[test]
    fn test_missing_title_is_untitled() {
        let page = extract_text("<html><body><footer>(c)</footer><p>Only text</p></body></html>");
        assert_eq!(page.title, "Untitled");
        assert_eq!(page.content, "Only text");
    }

    #[test]
    fn test_clean_text_drops_blank_lines() {
        assert_eq!(clean_text("  a   b \n\n\n   \n c\t\td  "), "a b\nc d");
    }
}
