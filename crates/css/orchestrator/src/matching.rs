//! Selector matching against the document arena.

use anyhow::{Context as _, Result};
use css_selectors::{ElementAdapter, parse_selector_list, select_all};
use html::{Document, NodeId};
use std::collections::HashSet;

/// Read-only view of a [`Document`] for the selector engine.
///
/// `<style>` elements are never candidates.
#[derive(Clone, Copy)]
pub struct DomAdapter<'doc>(pub &'doc Document);

impl ElementAdapter for DomAdapter<'_> {
    type Handle = NodeId;

    fn elements(&self) -> Vec<NodeId> {
        let mut elements = self.0.elements();
        elements.retain(|element| self.0.tag_name(*element) != Some("style"));
        elements
    }

    fn parent(&self, element: NodeId) -> Option<NodeId> {
        self.0.parent_element(element)
    }

    fn previous_sibling_element(&self, element: NodeId) -> Option<NodeId> {
        self.0.previous_sibling_element(element)
    }

    fn tag_name(&self, element: NodeId) -> &str {
        self.0.tag_name(element).unwrap_or_default()
    }

    fn element_id(&self, element: NodeId) -> Option<&str> {
        self.0.attr(element, "id")
    }

    fn has_class(&self, element: NodeId, class: &str) -> bool {
        self.0.has_class(element, class)
    }

    fn attr(&self, element: NodeId, name: &str) -> Option<&str> {
        self.0.attr(element, name)
    }
}

/// Elements matching `selector` in document order. `<style>` elements never match.
///
/// # Errors
/// Returns an error if `selector` is not supported by the selector engine.
pub fn select(doc: &Document, selector: &str) -> Result<Vec<NodeId>> {
    let list = parse_selector_list(selector)
        .with_context(|| format!("unsupported selector `{selector}`"))?;
    let adapter = DomAdapter(doc);
    if let [single] = list.selectors.as_slice() {
        return Ok(select_all(&adapter, single));
    }
    let matched: HashSet<NodeId> = list
        .selectors
        .iter()
        .flat_map(|member| select_all(&adapter, member))
        .collect();
    Ok(adapter
        .elements()
        .into_iter()
        .filter(|element| matched.contains(element))
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "test assertions")]

    use super::*;

    #[test]
    fn selects_through_the_document() {
        let doc = Document::parse(
            "<style>p { }</style><table class=\"main\"><tr><td id=\"x\">a</td><td>b</td></tr></table>",
        )
        .unwrap();
        assert_eq!(select(&doc, "table td").unwrap().len(), 2);
        assert_eq!(select(&doc, "table.main > tbody > tr > #x").unwrap().len(), 1);
        assert_eq!(select(&doc, "td + td").unwrap().len(), 1);
        assert!(select(&doc, "style").unwrap().is_empty());
        assert!(select(&doc, "p[title^=x]").is_err());
    }

    #[test]
    fn lists_match_once_in_document_order() {
        let doc = Document::parse("<style>h1 { }</style><p id=\"a\">1</p><h1>2</h1><p>3</p>").unwrap();
        let matched = select(&doc, "h1, p, #a, style").unwrap();
        let tags: Vec<_> = matched
            .iter()
            .filter_map(|element| doc.tag_name(*element))
            .collect();
        assert_eq!(tags, ["p", "h1", "p"]);
        assert_eq!(doc.attr(matched[0], "id"), Some("a"));
    }
}
