//! Selector parsing, element matching and specificity for the styles inliner.
//!
//! Supported subset:
//! - Type, universal, class, id, `[attr]` and `[attr=value]` selectors
//! - Combinators: descendant, child, adjacent sibling, general sibling
//! - A simplified, text-based specificity walk (see [`specificity_of`])
//!
//! Pseudo-classes, pseudo-elements and functional notation are rejected by
//! the parser; callers keep such rules out of the inlining path.

mod matcher;
mod parser;
mod specificity;

// Re-export public API
pub use matcher::{matches_complex, matches_compound, select_all};
pub use parser::{parse_complex_selector, parse_selector_list};
pub use specificity::{StyleSpecificity, specificity_of};

/// An adapter that abstracts DOM access for selector matching.
/// Implement this for your DOM layer.
pub trait ElementAdapter {
    type Handle: Copy + Eq;

    /// Elements [`select_all`] may return, in document order.
    fn elements(&self) -> Vec<Self::Handle>;

    /// Parent element if any.
    fn parent(&self, element: Self::Handle) -> Option<Self::Handle>;

    /// Previous sibling element, skipping text and comments.
    fn previous_sibling_element(&self, element: Self::Handle) -> Option<Self::Handle>;

    /// Tag name in ASCII lowercase.
    fn tag_name(&self, element: Self::Handle) -> &str;

    /// Returns Some(id) if the element has an id attribute, else None.
    fn element_id(&self, element: Self::Handle) -> Option<&str>;

    /// True if the element has the given class token.
    fn has_class(&self, element: Self::Handle, class: &str) -> bool;

    /// Returns the attribute value if present.
    fn attr(&self, element: Self::Handle, name: &str) -> Option<&str>;
}

/// Simple selectors (subset).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SimpleSelector {
    Type(String),
    Class(String),
    IdSelector(String),
    /// `[name]`
    AttrExists(String),
    /// `[name=value]`
    AttrEquals { name: String, value: String },
    Universal,
}

/// A compound selector is a sequence of simple selectors (no combinators).
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    pub simples: Vec<SimpleSelector>,
}

/// Combinators between compounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

/// A complex selector is one or more compounds separated by combinators.
///
/// `rest` holds each following compound together with the combinator that
/// links it to the compound on its left.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ComplexSelector {
    pub first: CompoundSelector,
    pub rest: Vec<(Combinator, CompoundSelector)>,
}

/// A selector list separated by commas.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}
