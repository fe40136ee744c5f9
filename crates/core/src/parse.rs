//! HTML parsing and DOM querying.
//!
//! This module provides the [`Document`] and [`Element`] types for parsing
//! fetched HTML and querying it with CSS selectors. Parsing is delegated to
//! scraper (html5ever), which recovers from unclosed tags, stray end tags and
//! unknown elements the same way browsers do.
//!
//! # Example
//!
//! ```rust
//! use readlog_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <head><meta property="og:title" content="Hello"></head>
//!         <body><p class="lead">Paragraph</p></body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html);
//! assert_eq!(doc.meta_content("og:title"), Some("Hello".to_string()));
//! assert_eq!(doc.select("p.lead").unwrap().len(), 1);
//! ```

use scraper::{Html, Selector};

use crate::{PreviewError, Result};

/// Represents a parsed HTML document.
///
/// # Example
///
/// ```rust
/// use readlog_core::parse::Document;
///
/// let html = "<html><head><title>Test</title></head><body><p>Hello</p></body></html>";
/// let doc = Document::parse(html);
/// assert_eq!(doc.title(), Some("Test".to_string()));
/// ```
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses HTML from a string.
    ///
    /// Never fails: html5ever recovers from any input, replacing NUL and
    /// other invalid characters the way browsers do.
    pub fn parse(html: &str) -> Self {
        Self { html: Html::parse_document(html) }
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`PreviewError::Other`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use readlog_core::parse::Document;
    ///
    /// let html = r#"<p class="content">First</p><p class="content">Second</p>"#;
    /// let doc = Document::parse(html);
    /// let elements = doc.select("p.content").unwrap();
    /// assert_eq!(elements.len(), 2);
    /// ```
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = compile(selector)?;
        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Selects the first element matching a CSS selector.
    pub fn select_first(&'_ self, selector: &str) -> Option<Element<'_>> {
        let sel = compile(selector).ok()?;
        self.html.select(&sel).next().map(|el| Element { element: el })
    }

    /// Gets the trimmed text of the first `<title>` element.
    ///
    /// Returns `None` when there is no title or it is blank.
    pub fn title(&self) -> Option<String> {
        self.select_first("title").and_then(|el| non_empty(&el.text()))
    }

    /// Gets the trimmed `content` of the first `<meta>` tag whose `property`
    /// or `name` attribute equals `key` and whose content is not blank.
    ///
    /// Sites disagree on which attribute carries Open Graph and Twitter keys,
    /// so both are consulted, `property` first.
    pub fn meta_content(&self, key: &str) -> Option<String> {
        ["property", "name"].iter().find_map(|attr| {
            let selector = format!("meta[{}=\"{}\"]", attr, key);
            self.select(&selector)
                .ok()?
                .iter()
                .find_map(|el| el.attr("content").and_then(non_empty))
        })
    }
}

/// A wrapper around scraper's ElementRef.
///
/// # Example
///
/// ```rust
/// use readlog_core::parse::Document;
///
/// let html = r#"<img src="/a.png" alt="A">"#;
/// let doc = Document::parse(html);
/// let img = &doc.select("img").unwrap()[0];
///
/// assert_eq!(img.attr("src"), Some("/a.png"));
/// ```
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: scraper::ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Gets the text content of this element.
    ///
    /// Returns the concatenation of all text nodes within this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the value of an attribute, or `None` if it is not present.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`PreviewError::Other`] if the selector is invalid.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = compile(selector)?;
        Ok(self.element.select(&sel).map(|el| Element { element: el }).collect())
    }
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| PreviewError::Other(format!("Invalid selector: {}", e)))
}

/// Trims `text`, mapping blank strings to `None`.
pub(crate) fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() { None } else { Some(text.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <title>  Test Page  </title>
            <meta property="og:title" content="  OG Title ">
            <meta name="twitter:title" content="Card Title">
            <meta property="og:description" content="   ">
            <meta property="og:description" content="Second description">
        </head>
        <body>
            <h1>Heading</h1>
            <p class="content">Paragraph 1</p>
            <p class="content">Paragraph 2</p>
            <img src="/hero.jpg">
        </body>
        </html>
    "#;

    #[test]
    fn test_title_is_trimmed() {
        let doc = Document::parse(SAMPLE_HTML);
        assert_eq!(doc.title(), Some("Test Page".to_string()));
    }

    #[test]
    fn test_blank_title_is_none() {
        let doc = Document::parse("<html><head><title>   </title></head></html>");
        assert_eq!(doc.title(), None);
    }

    #[test]
    fn test_meta_content_by_property_and_name() {
        let doc = Document::parse(SAMPLE_HTML);
        assert_eq!(doc.meta_content("og:title"), Some("OG Title".to_string()));
        assert_eq!(doc.meta_content("twitter:title"), Some("Card Title".to_string()));
        assert_eq!(doc.meta_content("og:image"), None);
    }

    #[test]
    fn test_meta_content_skips_blank_tags() {
        let doc = Document::parse(SAMPLE_HTML);
        assert_eq!(doc.meta_content("og:description"), Some("Second description".to_string()));
    }

    #[test]
    fn test_select_elements() {
        let doc = Document::parse(SAMPLE_HTML);
        let elements = doc.select("p.content").unwrap();

        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].text(), "Paragraph 1");
        assert_eq!(elements[1].text(), "Paragraph 2");
    }

    #[test]
    fn test_element_attributes() {
        let doc = Document::parse(SAMPLE_HTML);
        let img = doc.select_first("img").unwrap();
        assert_eq!(img.attr("src"), Some("/hero.jpg"));
        assert_eq!(img.attr("alt"), None);
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE_HTML);
        let result = doc.select("[[invalid");

        assert!(matches!(result, Err(PreviewError::Other(_))));
        assert!(doc.select_first("[[invalid").is_none());
    }

    #[test]
    fn test_malformed_markup_still_parses() {
        let html = "<html><head><title>Broken</title><body><p>unclosed <b>bold <custom-tag>text</div></span>";
        let doc = Document::parse(html);
        assert!(doc.select_first("p").is_some());
    }

    #[test]
    fn test_stray_nul_does_not_discard_document() {
        let doc = Document::parse("<head><title>Kept</title></head><body><p>x\u{0}y</p><p class=\"lead\">after</p></body>");
        assert_eq!(doc.title(), Some("Kept".to_string()));
        assert_eq!(doc.select("p.lead").unwrap().len(), 1);
    }
}
