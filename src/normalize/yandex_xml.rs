//! Parsing of the Yandex search XML envelope.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::gateway::SourceError;
use crate::models::YandexDoc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Url,
    Title,
    Passage,
    ExtendedText,
    SavedCopyUrl,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"url" => Some(Field::Url),
            b"title" => Some(Field::Title),
            b"passage" => Some(Field::Passage),
            b"extended-text" => Some(Field::ExtendedText),
            b"saved-copy-url" => Some(Field::SavedCopyUrl),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct DocBuilder {
    url: Option<String>,
    title: Option<String>,
    passages: Vec<String>,
    extended_text: Vec<String>,
    saved_copy_url: Option<String>,
}

impl DocBuilder {
    fn set(&mut self, field: Field, text: String) {
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            return;
        }
        let slot = match field {
            Field::Passage => {
                self.passages.push(text);
                return;
            }
            Field::ExtendedText => {
                self.extended_text.push(text);
                return;
            }
            Field::Url => &mut self.url,
            Field::Title => &mut self.title,
            Field::SavedCopyUrl => &mut self.saved_copy_url,
        };
        if slot.is_none() {
            *slot = Some(text);
        }
    }

    fn build(self) -> Option<YandexDoc> {
        let url = self.url?;
        Some(YandexDoc {
            url,
            title: self.title,
            snippet: (!self.passages.is_empty()).then(|| self.passages.join(" ")),
            extended_text: (!self.extended_text.is_empty()).then(|| self.extended_text.join(" ")),
            saved_copy_url: self.saved_copy_url,
        })
    }
}

/// Extract the result documents from a Yandex search XML response.
///
/// Highlight markup inside titles and passages is flattened to its text.
/// Documents without a URL are skipped.
pub fn parse_documents(xml: &str) -> Result<Vec<YandexDoc>, SourceError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut documents = Vec::new();
    let mut current: Option<DocBuilder> = None;
    // field being captured and how many nested elements deep we are inside it
    let mut capture: Option<(Field, usize)> = None;
    let mut buffer = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let name = start.local_name();
                if let Some((field, depth)) = capture {
                    capture = Some((field, depth + 1));
                } else if name.as_ref() == b"doc" {
                    current = Some(DocBuilder::default());
                } else if current.is_some() {
                    if let Some(field) = Field::from_tag(name.as_ref()) {
                        capture = Some((field, 0));
                        buffer.clear();
                    }
                }
            }
            Event::End(end) => match capture {
                Some((field, depth)) if depth > 0 => capture = Some((field, depth - 1)),
                Some((field, _)) => {
                    capture = None;
                    if let Some(doc) = current.as_mut() {
                        doc.set(field, std::mem::take(&mut buffer));
                    }
                }
                None if end.local_name().as_ref() == b"doc" => {
                    if let Some(document) = current.take().and_then(DocBuilder::build) {
                        documents.push(document);
                    }
                }
                None => {}
            },
            Event::Text(text) if capture.is_some() => {
                buffer.push_str(&text.unescape()?);
            }
            Event::CData(data) if capture.is_some() => {
                buffer.push_str(&String::from_utf8_lossy(&data));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<yandexsearch version="1.0">
  <response>
    <results>
      <grouping>
        <group>
          <doc id="1">
            <url>https://www.rust-lang.org/</url>
            <title><hlword>Rust</hlword> Programming Language</title>
            <passages>
              <passage>A language empowering everyone.</passage>
              <passage>Fast &amp; reliable.</passage>
            </passages>
            <properties>
              <extended-text>Build reliable software.</extended-text>
            </properties>
            <saved-copy-url>https://hghltd.yandex.net/copy</saved-copy-url>
          </doc>
        </group>
        <group>
          <doc id="2">
            <title>No address here</title>
          </doc>
        </group>
        <group>
          <doc id="3">
            <url>https://doc.rust-lang.org/book/</url>
          </doc>
        </group>
      </grouping>
    </results>
  </response>
</yandexsearch>"#;

    #[test]
    fn test_parse_documents() {
        let docs = parse_documents(SAMPLE).unwrap();
        assert_eq!(docs.len(), 2);

        let first = &docs[0];
        assert_eq!(first.url, "https://www.rust-lang.org/");
        assert_eq!(first.title.as_deref(), Some("Rust Programming Language"));
        assert_eq!(
            first.snippet.as_deref(),
            Some("A language empowering everyone. Fast & reliable.")
        );
        assert_eq!(first.extended_text.as_deref(), Some("Build reliable software."));
        assert_eq!(
            first.saved_copy_url.as_deref(),
            Some("https://hghltd.yandex.net/copy")
        );

        let second = &docs[1];
        assert_eq!(second.url, "https://doc.rust-lang.org/book/");
        assert!(second.title.is_none());
        assert!(second.snippet.is_none());
    }

    #[test]
    fn test_empty_results() {
        let docs = parse_documents("<yandexsearch><response><results/></response></yandexsearch>")
            .unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        let err = parse_documents("<yandexsearch><doc><url>x</doc>").unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }
}
