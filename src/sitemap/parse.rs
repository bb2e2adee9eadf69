// src/sitemap/parse.rs
// =============================================================================
// This module pulls <loc> entries out of sitemap XML and decides what each
// entry is.
//
// Sitemaps come in two shapes:
// - <sitemapindex>: each <sitemap><loc> points at another sitemap document
// - <urlset>: each <url><loc> is a real page on the site
//
// We don't care which shape we got. Every <loc> is collected, and the URL
// itself tells us whether to recurse (path ends in "xml") or keep it.
//
// We use the `quick-xml` crate which:
// - Streams events (start tag, text, end tag) without building a DOM
// - Reports mismatched tags and bad entities as errors
// =============================================================================

use quick_xml::events::Event;
use quick_xml::Reader;
use url::Url;

// Anything under this path is theme or media noise, never a page
const NOISE_MARKER: &str = "wp-content";

// Extracts the text of every <loc> element in document order
//
// Parameters:
//   xml: the raw response body
//
// Returns: Err(message) if the document is malformed. Locations seen before
// the error are dropped, the caller treats the whole document as unusable.
//
// Example:
//   "<urlset><url><loc>https://a.com/</loc></url></urlset>"
//   result = ["https://a.com/"]
pub fn extract_locs(xml: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut locs = Vec::new();
    // Some(text) while we are inside a <loc> element
    let mut current: Option<String> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("{} at byte {}", e, reader.buffer_position()))?;

        match event {
            Event::Start(ref e) if e.local_name().as_ref() == b"loc" => {
                current = Some(String::new());
            }
            Event::Text(e) => {
                if let Some(text) = current.as_mut() {
                    let unescaped = e.unescape().map_err(|err| err.to_string())?;
                    text.push_str(&unescaped);
                }
            }
            Event::CData(e) => {
                if let Some(text) = current.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(ref e) if e.local_name().as_ref() == b"loc" => {
                if let Some(text) = current.take() {
                    let text = text.trim();
                    if !text.is_empty() {
                        locs.push(text.to_string());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(locs)
}

// True for URLs we drop before classification (uploads, theme assets)
pub fn is_noise(url: &str) -> bool {
    url.contains(NOISE_MARKER)
}

// True if the URL points at another sitemap document
//
// The check is on the URL path so "sitemap.xml?page=2" still recurses.
// Strings that don't parse as URLs fall back to a plain suffix check.
pub fn is_sitemap_document(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().ends_with("xml"),
        Err(_) => url.ends_with("xml"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_sitemap_index() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap>
    <loc>https://example.com/post-sitemap.xml</loc>
    <lastmod>2024-01-01T00:00:00+00:00</lastmod>
  </sitemap>
  <sitemap>
    <loc>https://example.com/page-sitemap.xml</loc>
  </sitemap>
</sitemapindex>"#;

        let locs = extract_locs(xml).unwrap();
        assert_eq!(
            locs,
            vec![
                "https://example.com/post-sitemap.xml",
                "https://example.com/page-sitemap.xml",
            ]
        );
    }

    #[test]
    fn test_extract_handles_prefix_entities_and_cdata() {
        let xml = r#"<ns:urlset xmlns:ns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <ns:url><ns:loc>https://example.com/?a=1&amp;b=2</ns:loc></ns:url>
  <ns:url><ns:loc><![CDATA[https://example.com/cdata/]]></ns:loc></ns:url>
  <ns:url><ns:loc>
      https://example.com/padded/
  </ns:loc></ns:url>
</ns:urlset>"#;

        let locs = extract_locs(xml).unwrap();
        assert_eq!(
            locs,
            vec![
                "https://example.com/?a=1&b=2",
                "https://example.com/cdata/",
                "https://example.com/padded/",
            ]
        );
    }

    #[test]
    fn test_ignores_text_outside_loc() {
        let xml = "<urlset><url><lastmod>2024-01-01</lastmod><loc>https://example.com/a</loc></url></urlset>";
        assert_eq!(extract_locs(xml).unwrap(), vec!["https://example.com/a"]);
    }

    #[test]
    fn test_empty_body_has_no_locs() {
        assert!(extract_locs("").unwrap().is_empty());
    }

    #[test]
    fn test_mismatched_tags_are_an_error() {
        let xml = "<urlset><url><loc>https://example.com/a</loc></urlset>";
        assert!(extract_locs(xml).is_err());
    }

    #[test]
    fn test_noise_filter() {
        assert!(is_noise("https://example.com/wp-content/uploads/2024/01/cat.jpg"));
        assert!(!is_noise("https://example.com/blog/wp-guide/"));
    }

    #[test]
    fn test_sitemap_document_detection() {
        assert!(is_sitemap_document("https://example.com/post-sitemap.xml"));
        assert!(is_sitemap_document("https://example.com/sitemap.xml?page=2"));
        assert!(!is_sitemap_document("https://example.com/about/"));
        assert!(!is_sitemap_document("https://example.com/feed?format=xml"));
        assert!(is_sitemap_document("not a url but ends in xml"));
    }
}
