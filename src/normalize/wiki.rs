//! Wikitext to plain text.

use regex::Regex;
use std::sync::OnceLock;

struct Patterns {
    spaces: Regex,
    category: Regex,
    piped_link: Regex,
    plain_link: Regex,
    titled_external: Regex,
    bare_external: Regex,
    bold_italic: Regex,
    bold: Regex,
    italic: Regex,
    self_closing_ref: Regex,
    paired_ref: Regex,
    tag: Regex,
    newlines: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("valid regex");
        Patterns {
            spaces: re(r"[ \t]+"),
            category: re(r"(?i)\[\[Category:[^\]]*\]\]"),
            piped_link: re(r"\[\[([^|\]]+)\|([^\]]+)\]\]"),
            plain_link: re(r"\[\[([^|\]]+)\]\]"),
            titled_external: re(r"\[https?://[^\s\]]+ ([^\]]+)\]"),
            bare_external: re(r"\[https?://[^\s\]]+\]"),
            bold_italic: re(r"'''''(.+?)'''''"),
            bold: re(r"'''(.+?)'''"),
            italic: re(r"''(.+?)''"),
            self_closing_ref: re(r"(?i)<ref[^>]*/>"),
            paired_ref: re(r"(?is)<ref[^>]*>.*?</ref>"),
            tag: re(r"<[^>]+>"),
            newlines: re(r"\n+"),
        }
    })
}

/// Strip wiki markup, keeping the human-readable text.
///
/// Runs of spaces are collapsed before markup is removed, so the gap left by
/// a removed template stays visible as a double space.
pub fn clean_wikitext(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let p = patterns();

    let text = p.spaces.replace_all(text, " ");
    let text = p.category.replace_all(&text, "");
    let text = remove_balanced(&text, "{{", "}}", |_| true);
    let text = remove_balanced(&text, "[[", "]]", is_media_link);
    let text = p.piped_link.replace_all(&text, "$2");
    let text = p.plain_link.replace_all(&text, "$1");
    let text = p.titled_external.replace_all(&text, "$1");
    let text = p.bare_external.replace_all(&text, "");
    let text = p.bold_italic.replace_all(&text, "$1");
    let text = p.bold.replace_all(&text, "$1");
    let text = p.italic.replace_all(&text, "$1");
    let text = p.self_closing_ref.replace_all(&text, "");
    let text = p.paired_ref.replace_all(&text, "");
    let text = p.tag.replace_all(&text, "");
    let text = p.newlines.replace_all(&text, "\n");

    text.trim().to_string()
}

fn is_media_link(at: &str) -> bool {
    let head: String = at.chars().take(8).collect::<String>().to_ascii_lowercase();
    head.starts_with("[[file:") || head.starts_with("[[image:")
}

/// Remove every balanced `open ... close` span whose start satisfies `is_target`.
///
/// Nesting is tracked by depth. An unbalanced span and everything after it is
/// left untouched.
fn remove_balanced(text: &str, open: &str, close: &str, is_target: impl Fn(&str) -> bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = find_target(rest, open, &is_target) {
        match balanced_len(&rest.as_bytes()[start..], open.as_bytes(), close.as_bytes()) {
            Some(len) => {
                out.push_str(&rest[..start]);
                rest = &rest[start + len..];
            }
            None => break,
        }
    }

    out.push_str(rest);
    out
}

fn find_target(text: &str, open: &str, is_target: &impl Fn(&str) -> bool) -> Option<usize> {
    let mut offset = 0;
    while let Some(found) = text[offset..].find(open) {
        let idx = offset + found;
        if is_target(&text[idx..]) {
            return Some(idx);
        }
        offset = idx + open.len();
    }
    None
}

fn balanced_len(bytes: &[u8], open: &[u8], close: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i..].starts_with(open) {
            depth += 1;
            i += open.len();
        } else if bytes[i..].starts_with(close) {
            depth = depth.saturating_sub(1);
            i += close.len();
            if depth == 0 {
                return Some(i);
            }
        } else {
            i += 1;
        }
    }
    None
}
