#![allow(
    clippy::missing_docs_in_private_items,
    reason = "Internal implementation details don't need public documentation"
)]
#![allow(
    clippy::missing_inline_in_public_items,
    reason = "Inlining decisions left to compiler for this crate"
)]

//! HTML document model for the styles inliner.
//!
//! Documents are parsed with html5ever, copied into an `indextree` arena and
//! mutated in place by the inlining passes before being serialized back to
//! HTML text.

pub mod dom;
pub mod parser;
pub mod sanitizer;

pub use dom::{DOMNode, Document, NodeKind};
pub use indextree::NodeId;
pub use sanitizer::{HtmlSanitizingMode, sanitize};
