use core::fmt;

use super::{Attributes, DOMNode, Document, NodeKind};
use indextree::NodeId;

// -----------------------
// Module-scope helpers
// -----------------------

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose text children are written without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "iframe",
    "noembed",
    "noframes",
    "plaintext",
    "script",
    "style",
    "xmp",
];

fn escape_into(out: &mut String, text: &str, in_attribute: bool) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if in_attribute => out.push_str("&quot;"),
            '<' if !in_attribute => out.push_str("&lt;"),
            '>' if !in_attribute => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn write_attrs(out: &mut String, attrs: &Attributes) {
    for (name, value) in attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_into(out, value, true);
        out.push('"');
    }
}

fn write_node(doc: &Document, id: NodeId, out: &mut String, raw_text: bool) {
    let Some(DOMNode { kind, attrs }) = doc.node(id) else {
        return;
    };
    match kind {
        NodeKind::Document => write_children(doc, id, out, false),
        NodeKind::Doctype { name } => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        NodeKind::Comment { text } => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeKind::Text { text } => {
            if raw_text {
                out.push_str(text);
            } else {
                escape_into(out, text, false);
            }
        }
        NodeKind::Element { tag } => {
            out.push('<');
            out.push_str(tag);
            write_attrs(out, attrs);
            out.push('>');
            if VOID_ELEMENTS.contains(&tag.as_str()) {
                return;
            }
            write_children(doc, id, out, RAW_TEXT_ELEMENTS.contains(&tag.as_str()));
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

fn write_children(doc: &Document, id: NodeId, out: &mut String, raw_text: bool) {
    for child in doc.children(id) {
        write_node(doc, child, out, raw_text);
    }
}

impl Document {
    /// Serialize the whole document back to HTML.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        write_node(self, self.root, &mut out, false);
        out
    }

    /// Serialize a single node and its subtree.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        let raw_text = self
            .parent_element(id)
            .and_then(|parent| self.tag_name(parent))
            .is_some_and(|tag| RAW_TEXT_ELEMENTS.contains(&tag));
        write_node(self, id, &mut out, raw_text);
        out
    }
}

impl fmt::Display for Document {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.serialize())
    }
}
