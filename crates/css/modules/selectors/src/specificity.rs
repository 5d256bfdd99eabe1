//! Selector specificity as used by the cascade merger.
//!
//! This is a text-level walk over whitespace-separated compound tokens rather
//! than a walk over parsed selectors, so it also works for selectors the
//! matcher rejects (pseudo-classes, attribute operators). Comma-separated
//! lists accumulate across every member.

use core::fmt;

/// Specificity 4-tuple `(style_attribute, id, class_attribute, elements)`.
///
/// Ordering is lexicographic over the fields in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct StyleSpecificity {
    /// 1 for declarations from an element's own `style` attribute.
    pub style_attribute: u32,
    pub id: u32,
    /// Classes, attribute selectors and pseudo-classes.
    pub class_attribute: u32,
    /// Type selectors.
    pub elements: u32,
}

impl StyleSpecificity {
    /// Specificity of a declaration taken from a `style` attribute.
    pub const STYLE_ATTRIBUTE: Self = Self::new(1, 0, 0, 0);

    pub const fn new(style_attribute: u32, id: u32, class_attribute: u32, elements: u32) -> Self {
        Self {
            style_attribute,
            id,
            class_attribute,
            elements,
        }
    }
}

impl fmt::Display for StyleSpecificity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "({},{},{},{})",
            self.style_attribute, self.id, self.class_attribute, self.elements
        )
    }
}

const ID_MARKER: char = '#';
const CLASS_MARKER: char = '.';
const ATTRIBUTE_MARKER: char = '[';
const PSEUDO_CLASS_MARKER: char = ':';
const PSEUDO_ELEMENT_MARKER: &str = "::";

fn count_of(token: &str, marker: char) -> u32 {
    u32::try_from(token.matches(marker).count()).unwrap_or(u32::MAX)
}

/// A marker fused onto a type name (`td.x`, `p#y`) also counts the type.
fn is_fused(token: &str, marker: char) -> bool {
    token.contains(marker) && !token.starts_with(marker)
}

fn is_class_like(token: &str) -> bool {
    token.contains(ATTRIBUTE_MARKER)
        || token.contains(CLASS_MARKER)
        || (token.contains(PSEUDO_CLASS_MARKER) && !token.contains(PSEUDO_ELEMENT_MARKER))
}

/// Compute the specificity of a selector text.
///
/// `style_attribute` is always 0 here.
pub fn specificity_of(selector: &str) -> StyleSpecificity {
    let mut total = StyleSpecificity::default();
    let tokens = selector
        .split(',')
        .flat_map(str::split_whitespace)
        .filter(|token| !token.is_empty());
    for token in tokens {
        if token.contains(ID_MARKER) {
            total.id = total.id.saturating_add(count_of(token, ID_MARKER));
            if is_fused(token, ID_MARKER) {
                total.elements = total.elements.saturating_add(1);
            }
        } else if is_class_like(token) {
            let classes = if token.contains(CLASS_MARKER) {
                count_of(token, CLASS_MARKER)
            } else {
                1
            };
            total.class_attribute = total.class_attribute.saturating_add(classes);
            if is_fused(token, CLASS_MARKER) {
                total.elements = total.elements.saturating_add(1);
            }
        } else {
            total.elements = total.elements.saturating_add(1);
        }
    }
    total
}
