//! HTML documents matched against patterns.
//!
//! Parsing is delegated to `scraper` (html5ever underneath). The matching
//! engine only needs element children, attributes, subtree text and inner
//! markup, all of which `scraper::ElementRef` provides.

use scraper::{ElementRef, Html};
use std::io::{self, Read};

/// A parsed HTML document.
#[derive(Debug, Clone)]
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses a complete HTML document.
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    /// Parses an HTML fragment, such as a single list item.
    pub fn fragment(source: &str) -> Self {
        Self {
            html: Html::parse_fragment(source),
        }
    }

    /// Reads a document to the end and parses it. Invalid UTF-8 is replaced.
    pub fn from_reader<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self::parse(&String::from_utf8_lossy(&bytes)))
    }

    /// The top-level `<html>` element.
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }
}

/// Element children of `element`, in document order.
pub(crate) fn child_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element.children().filter_map(ElementRef::wrap)
}

/// Concatenated text of every text node below `element`.
pub(crate) fn text_content(element: ElementRef<'_>) -> String {
    element.text().collect()
}
