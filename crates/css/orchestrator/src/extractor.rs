//! Stylesheet extraction from the input document.

use crate::config::StylesheetSource;
use anyhow::Result;
use html::{Document, NodeId};
use log::{debug, error, warn};

/// Host capability resolving a `<link>` href to stylesheet text.
pub trait StylesheetFetcher {
    /// # Errors
    /// Returns an error when the stylesheet cannot be retrieved.
    fn fetch(&self, href: &str) -> Result<String>;
}

/// Collect stylesheet texts in document order, removing their source elements.
///
/// External sheets that fail to load are logged and skipped. In external mode
/// without a fetcher nothing is collected and the links are left in place.
pub fn extract_styles(
    doc: &mut Document,
    source: StylesheetSource,
    fetcher: Option<&dyn StylesheetFetcher>,
) -> Vec<String> {
    match source {
        StylesheetSource::Embedded => extract_embedded(doc),
        StylesheetSource::External => match fetcher {
            Some(fetcher) => extract_external(doc, fetcher),
            None => {
                warn!("external stylesheets requested but no fetcher is configured");
                Vec::new()
            }
        },
    }
}

fn extract_embedded(doc: &mut Document) -> Vec<String> {
    let mut sheets = Vec::new();
    for style in doc.elements_by_tag("style") {
        sheets.push(doc.text_content(style));
        doc.remove(style);
    }
    debug!("extracted {} embedded stylesheet(s)", sheets.len());
    sheets
}

fn is_stylesheet_link(doc: &Document, link: NodeId) -> bool {
    doc.attr(link, "rel")
        .is_some_and(|rel| rel.trim().eq_ignore_ascii_case("stylesheet"))
}

fn extract_external(doc: &mut Document, fetcher: &dyn StylesheetFetcher) -> Vec<String> {
    let mut sheets = Vec::new();
    for link in doc.elements_by_tag("link") {
        if !is_stylesheet_link(doc, link) {
            continue;
        }
        let Some(href) = doc
            .attr(link, "href")
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(str::to_owned)
        else {
            continue;
        };
        match fetcher.fetch(&href) {
            Ok(css) => sheets.push(css),
            Err(err) => error!("cannot load stylesheet `{href}`: {err:#}"),
        }
        doc.remove(link);
    }
    sheets
}
