//! In-place DOM mutations used by the inlining passes.

use super::{DOMNode, Document, NodeKind};
use anyhow::{Error, anyhow};
use indextree::{Node, NodeId};

impl Document {
    fn node_mut(&mut self, id: NodeId) -> Option<&mut DOMNode> {
        self.dom
            .get_mut(id)
            .filter(|node| !node.is_removed())
            .map(Node::get_mut)
    }

    /// Set an attribute, replacing an existing value in place or appending a new one.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        if !matches!(node.kind, NodeKind::Element { .. }) {
            return;
        }
        if let Some(slot) = node
            .attrs
            .iter_mut()
            .find(|(attr_name, _)| attr_name.eq_ignore_ascii_case(name))
        {
            value.clone_into(&mut slot.1);
            return;
        }
        node.attrs.push((name.to_ascii_lowercase(), value.to_owned()));
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        let node = self.node_mut(id)?;
        let index = node
            .attrs
            .iter()
            .position(|(attr_name, _)| attr_name.eq_ignore_ascii_case(name))?;
        Some(node.attrs.remove(index).1)
    }

    /// Append `child` as the last child of `parent`.
    ///
    /// # Errors
    /// Returns an error if either node is missing or the append would create a cycle.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), Error> {
        parent
            .checked_append(child, &mut self.dom)
            .map_err(|err| anyhow!("cannot append node: {err}"))
    }

    /// Create a detached node.
    pub fn create_node(&mut self, node: DOMNode) -> NodeId {
        self.dom.new_node(node)
    }

    /// Create an element and append it to `parent`.
    ///
    /// # Errors
    /// Returns an error if `parent` is not part of the document.
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, Error> {
        let element = self.create_node(DOMNode::element(tag));
        self.append_child(parent, element)?;
        Ok(element)
    }

    /// Replace every child of `id` with a single text node.
    ///
    /// # Errors
    /// Returns an error if `id` is not part of the document.
    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<(), Error> {
        for child in self.children(id) {
            child.remove_subtree(&mut self.dom);
        }
        let text_node = self.create_node(DOMNode::text(text));
        self.append_child(id, text_node)
    }

    /// Remove `id` together with its subtree.
    pub fn remove(&mut self, id: NodeId) {
        if self.node(id).is_some() && id != self.root {
            id.remove_subtree(&mut self.dom);
        }
    }

    /// Replace `id` with its own children, keeping their order and position.
    pub fn unwrap(&mut self, id: NodeId) {
        if self.node(id).is_some() && id != self.root {
            // indextree re-parents the children into the removed node's slot.
            id.remove(&mut self.dom);
        }
    }

    /// The `<head>` element, creating one under `<html>` (or the document) if missing.
    ///
    /// # Errors
    /// Returns an error if the new element cannot be attached.
    pub fn ensure_head(&mut self) -> Result<NodeId, Error> {
        if let Some(head) = self.head() {
            return Ok(head);
        }
        let parent = self.first_by_tag("html").unwrap_or(self.root);
        let head = self.create_node(DOMNode::element("head"));
        match self.dom.get(parent).and_then(|node| node.first_child()) {
            Some(first) => first
                .checked_insert_before(head, &mut self.dom)
                .map_err(|err| anyhow!("cannot insert head: {err}"))?,
            None => self.append_child(parent, head)?,
        }
        Ok(head)
    }
}
