//! Minimal XML helpers for getter responses.
//!
//! The firmware sometimes emits malformed XML when settings hold unusual
//! values, so lookups tolerate mismatched end tags and bad entities.

use std::borrow::Cow;

use quick_xml::events::Event;
use quick_xml::{Reader, Writer};

use crate::error::{Error, Result};

/// Name of the document's root element.
pub fn root_tag(xml: &[u8]) -> Result<String> {
    let mut reader = Reader::from_reader(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                return Ok(String::from_utf8_lossy(e.name().as_ref()).into_owned());
            }
            Event::Eof => return Err(Error::Xml("document has no root element".into())),
            _ => {}
        }
    }
}

/// Text content of the first element called `name`.
pub fn element_text(xml: &[u8], name: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_reader(xml);
    reader.check_end_names(false);
    let mut depth = 0usize;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if depth > 0 {
                    depth += 1;
                } else if e.name().as_ref() == name.as_bytes() {
                    depth = 1;
                }
            }
            Event::Empty(e) if depth == 0 && e.name().as_ref() == name.as_bytes() => {
                return Ok(Some(String::new()));
            }
            Event::Text(t) if depth > 0 => match t.unescape() {
                Ok(unescaped) => text.push_str(&unescaped),
                Err(_) => text.push_str(&String::from_utf8_lossy(&t)),
            },
            Event::CData(c) if depth > 0 => text.push_str(&String::from_utf8_lossy(&c.into_inner())),
            Event::End(_) if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return Ok(Some(text.trim().to_string()));
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Decode HTML entities in `text`. Unknown entities and bare `&` are kept.
pub fn unescape(text: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(text)
}

/// Re-indent a document with three spaces per level.
pub fn pretty_print(xml: &[u8]) -> Result<String> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 3);

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
    }
    String::from_utf8(writer.into_inner()).map_err(|e| Error::Xml(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_tag() {
        let xml = br#"<?xml version="1.0" encoding="utf-8"?><cm_system_info><a>1</a></cm_system_info>"#;
        assert_eq!(root_tag(xml).unwrap(), "cm_system_info");
        assert_eq!(root_tag(b"<empty/>").unwrap(), "empty");
        assert!(root_tag(b"").is_err());
    }

    #[test]
    fn test_element_text() {
        let xml = b"<GlobalSettings><AccessLevel>1</AccessLevel><ConfigVenderModel> CH7465LG </ConfigVenderModel></GlobalSettings>";
        assert_eq!(
            element_text(xml, "ConfigVenderModel").unwrap().as_deref(),
            Some("CH7465LG")
        );
        assert_eq!(element_text(xml, "Missing").unwrap(), None);
        assert_eq!(
            element_text(b"<a><b/></a>", "b").unwrap().as_deref(),
            Some("")
        );
    }

    #[test]
    fn test_element_text_skips_malformed_siblings() {
        let xml = b"<GlobalSettings><Note>x<br></Note><ConfigVenderModel>CH7465LG</ConfigVenderModel></GlobalSettings>";
        assert_eq!(
            element_text(xml, "ConfigVenderModel").unwrap().as_deref(),
            Some("CH7465LG")
        );

        let xml = b"<a><Name>Tom &amp Jerry &bogus;</Name></a>";
        assert_eq!(
            element_text(xml, "Name").unwrap().as_deref(),
            Some("Tom &amp Jerry &bogus;")
        );
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("&lt;1ms&gt; &amp; up"), "<1ms> & up");
        assert_eq!(unescape("64 bytes&nbsp;from 8.8.8.8"), "64 bytes\u{a0}from 8.8.8.8");
        assert_eq!(unescape("loss 0% & rtt 1ms"), "loss 0% & rtt 1ms");
        assert_eq!(unescape("&bogus;"), "&bogus;");
    }

    #[test]
    fn test_pretty_print() {
        let pretty = pretty_print(b"<root><a>1</a><b/></root>").unwrap();
        assert!(pretty.starts_with("<root>"));
        assert!(pretty.contains("\n   <a>1</a>"));
        assert!(pretty.contains("\n   <b/>"));
        assert_eq!(pretty_print(b"<fun22/>").unwrap(), "<fun22/>");
    }
}
