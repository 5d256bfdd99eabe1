//! HTML5 parsing into the arena DOM.
//!
//! html5ever builds an `RcDom` first; the tree is then walked once and copied
//! into the `indextree` arena so later passes never touch reference-counted
//! nodes.

use crate::dom::{Attributes, DOMNode, Document, NodeKind};
use anyhow::{Error, anyhow};
use html5ever::tendril::TendrilSink as _;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{ParseOpts, parse_document};
use indextree::NodeId;
use log::trace;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

impl Document {
    /// Parse an HTML string with the HTML5 tree-construction algorithm.
    ///
    /// Missing `html`, `head` and `body` elements are synthesized by the parser.
    ///
    /// # Errors
    /// Returns an error if the input cannot be read or the tree cannot be built.
    pub fn parse(html: &str) -> Result<Self, Error> {
        let opts = ParseOpts {
            tree_builder: TreeBuilderOpts {
                scripting_enabled: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let rcdom = parse_document(RcDom::default(), opts)
            .from_utf8()
            .read_from(&mut html.as_bytes())?;
        let mut document = Self::new();
        let root = document.root;
        trace!("converting parsed tree into arena");
        for child in rcdom.document.children.borrow().iter() {
            walk_tree(child, root, &mut document)?;
        }
        Ok(document)
    }
}

fn walk_tree(handle: &Handle, parent: NodeId, document: &mut Document) -> Result<(), Error> {
    let node = match &handle.data {
        NodeData::Document => {
            for child in handle.children.borrow().iter() {
                walk_tree(child, parent, document)?;
            }
            return Ok(());
        }
        NodeData::ProcessingInstruction { .. } => return Ok(()),
        NodeData::Doctype { name, .. } => DOMNode {
            kind: NodeKind::Doctype {
                name: name.to_string(),
            },
            attrs: Attributes::new(),
        },
        NodeData::Text { contents } => DOMNode::text(&contents.borrow()),
        NodeData::Comment { contents } => DOMNode {
            kind: NodeKind::Comment {
                text: contents.to_string(),
            },
            attrs: Attributes::new(),
        },
        NodeData::Element { name, attrs, .. } => {
            let mut element = DOMNode::element(&name.local);
            for attr in attrs.borrow().iter() {
                let attr_name = match &attr.name.prefix {
                    Some(prefix) => format!("{prefix}:{}", attr.name.local),
                    None => attr.name.local.to_string(),
                };
                element.attrs.push((attr_name, attr.value.to_string()));
            }
            element
        }
    };

    let id = document.create_node(node);
    parent
        .checked_append(id, &mut document.dom)
        .map_err(|err| anyhow!("malformed tree from parser: {err}"))?;

    if let NodeData::Element {
        template_contents, ..
    } = &handle.data
        && let Some(contents) = template_contents.borrow().as_ref()
    {
        for child in contents.children.borrow().iter() {
            walk_tree(child, id, document)?;
        }
    }
    for child in handle.children.borrow().iter() {
        walk_tree(child, id, document)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "test assertions")]

    use super::*;

    #[test]
    fn synthesizes_document_structure() {
        let doc = Document::parse("<p>hello</p>").unwrap();
        assert!(doc.first_by_tag("html").is_some());
        assert!(doc.head().is_some());
        let body = doc.first_by_tag("body").unwrap();
        assert_eq!(doc.text_content(body), "hello");
    }

    #[test]
    fn keeps_doctype_and_comments() {
        let doc = Document::parse("<!DOCTYPE html><!-- note --><html><body></body></html>").unwrap();
        let kinds: Vec<&NodeKind> = doc
            .children(doc.root())
            .into_iter()
            .filter_map(|id| doc.node(id).map(|node| &node.kind))
            .collect();
        assert!(matches!(kinds.first(), Some(NodeKind::Doctype { name }) if name == "html"));
        assert!(matches!(kinds.get(1), Some(NodeKind::Comment { text }) if text == " note "));
    }

    #[test]
    fn lowercases_tags_and_keeps_attribute_order() {
        let doc = Document::parse(r#"<DIV Class="a" id="b" style="color: red"></DIV>"#).unwrap();
        let div = doc.first_by_tag("div").unwrap();
        let names: Vec<&str> = doc
            .node(div)
            .unwrap()
            .attrs
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(names, vec!["class", "id", "style"]);
    }
}
