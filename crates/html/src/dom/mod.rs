//! Arena-backed DOM used by every inlining pass.

mod printing;
mod updating;

use indextree::{Arena, Node, NodeId};
use smallvec::SmallVec;

/// Attribute storage for an element, in source order.
pub type Attributes = SmallVec<(String, String), 4>;

#[derive(Debug, Clone, Default)]
pub enum NodeKind {
    #[default]
    Document,
    Doctype {
        name: String,
    },
    Element {
        tag: String,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct DOMNode {
    pub kind: NodeKind,
    pub attrs: Attributes,
}

impl DOMNode {
    /// Build an element node with no attributes.
    pub fn element(tag: &str) -> Self {
        Self {
            kind: NodeKind::Element {
                tag: tag.to_ascii_lowercase(),
            },
            attrs: Attributes::new(),
        }
    }

    /// Build a text node.
    pub fn text(text: &str) -> Self {
        Self {
            kind: NodeKind::Text {
                text: text.to_owned(),
            },
            attrs: Attributes::new(),
        }
    }
}

/// A parsed HTML document.
///
/// Node ids stay stable for the lifetime of the document, so passes can key
/// per-element state by `NodeId` while they mutate the tree.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) dom: Arena<DOMNode>,
    pub(crate) root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only the document node.
    pub fn new() -> Self {
        let mut dom = Arena::new();
        let root = dom.new_node(DOMNode::default());
        Self { dom, root }
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Node data for `id`, or `None` if it was removed.
    pub fn node(&self, id: NodeId) -> Option<&DOMNode> {
        self.dom
            .get(id)
            .filter(|node| !node.is_removed())
            .map(Node::get)
    }

    /// Lowercase tag name when `id` is an element.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.kind {
            NodeKind::Element { tag } => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.tag_name(id).is_some()
    }

    /// Attribute value by case-insensitive name.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id)?
            .attrs
            .iter()
            .find(|(attr_name, _)| attr_name.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// True if the element's `class` attribute contains `class` as a whole token.
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|item| item == class))
    }

    /// Direct children of `id`, including text and comments.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        if self.node(id).is_none() {
            return Vec::new();
        }
        id.children(&self.dom).collect()
    }

    /// Direct element children of `id`.
    pub fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .into_iter()
            .filter(|child| self.is_element(*child))
            .collect()
    }

    /// Every element in document order.
    pub fn elements(&self) -> Vec<NodeId> {
        self.root
            .descendants(&self.dom)
            .filter(|id| self.is_element(*id))
            .collect()
    }

    /// Every element with the given tag name, in document order.
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.root
            .descendants(&self.dom)
            .filter(|id| {
                self.tag_name(*id)
                    .is_some_and(|name| name.eq_ignore_ascii_case(tag))
            })
            .collect()
    }

    /// First element with the given tag name.
    pub fn first_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.elements_by_tag(tag).into_iter().next()
    }

    /// The `<head>` element, if the document has one.
    pub fn head(&self) -> Option<NodeId> {
        self.first_by_tag("head")
    }

    /// Closest ancestor that is an element.
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.dom.get(id)?.parent()?;
        self.is_element(parent).then_some(parent)
    }

    /// Closest preceding sibling that is an element.
    pub fn previous_sibling_element(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.dom.get(id)?.previous_sibling();
        while let Some(sibling) = current {
            if self.is_element(sibling) {
                return Some(sibling);
            }
            current = self.dom.get(sibling)?.previous_sibling();
        }
        None
    }

    /// Concatenated text of every text node below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if self.node(id).is_none() {
            return out;
        }
        for descendant in id.descendants(&self.dom) {
            if let Some(DOMNode {
                kind: NodeKind::Text { text },
                ..
            }) = self.node(descendant)
            {
                out.push_str(text);
            }
        }
        out
    }
}
