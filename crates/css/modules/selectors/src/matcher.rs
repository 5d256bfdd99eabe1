//! CSS selector matching engine.
//!
//! Complex selectors are matched right-to-left: the rightmost compound must
//! match the candidate element, then each combinator walks towards the root
//! looking for an element that satisfies the compound on its left. Descendant
//! and general-sibling combinators backtrack over every candidate.

use crate::{Combinator, ComplexSelector, CompoundSelector, ElementAdapter, SimpleSelector};

/// Every element of [`ElementAdapter::elements`] matching `sel`, in that order.
pub fn select_all<A: ElementAdapter>(adapter: &A, sel: &ComplexSelector) -> Vec<A::Handle> {
    adapter
        .elements()
        .into_iter()
        .filter(|element| matches_complex(adapter, *element, sel))
        .collect()
}

/// Match a complex selector against an element.
pub fn matches_complex<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    sel: &ComplexSelector,
) -> bool {
    matches_from(adapter, element, sel, sel.rest.len())
}

/// The compound at `index` (0 is `sel.first`).
fn compound_at(sel: &ComplexSelector, index: usize) -> Option<&CompoundSelector> {
    match index.checked_sub(1) {
        None => Some(&sel.first),
        Some(rest_index) => sel.rest.get(rest_index).map(|pair| &pair.1),
    }
}

/// Match compounds `0..=index` with the compound at `index` anchored on `element`.
fn matches_from<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    sel: &ComplexSelector,
    index: usize,
) -> bool {
    let Some(compound) = compound_at(sel, index) else {
        return false;
    };
    if !matches_compound(adapter, element, compound) {
        return false;
    }
    let Some(left_index) = index.checked_sub(1) else {
        return true;
    };
    let Some(&(combinator, _)) = sel.rest.get(left_index) else {
        return false;
    };
    match combinator {
        Combinator::Descendant => {
            let mut current_parent = adapter.parent(element);
            while let Some(ancestor_element) = current_parent {
                if matches_from(adapter, ancestor_element, sel, left_index) {
                    return true;
                }
                current_parent = adapter.parent(ancestor_element);
            }
            false
        }
        Combinator::Child => adapter
            .parent(element)
            .is_some_and(|parent_el| matches_from(adapter, parent_el, sel, left_index)),
        Combinator::AdjacentSibling => adapter
            .previous_sibling_element(element)
            .is_some_and(|prev_el| matches_from(adapter, prev_el, sel, left_index)),
        Combinator::GeneralSibling => {
            let mut current_sibling = adapter.previous_sibling_element(element);
            while let Some(sibling_element) = current_sibling {
                if matches_from(adapter, sibling_element, sel, left_index) {
                    return true;
                }
                current_sibling = adapter.previous_sibling_element(sibling_element);
            }
            false
        }
    }
}

/// Match a compound selector against a single element.
pub fn matches_compound<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    compound: &CompoundSelector,
) -> bool {
    compound.simples.iter().all(|simple| match simple {
        SimpleSelector::Universal => true,
        SimpleSelector::Type(type_name) => adapter.tag_name(element) == type_name.as_str(),
        SimpleSelector::Class(class_name) => adapter.has_class(element, class_name),
        SimpleSelector::IdSelector(id_value) => adapter
            .element_id(element)
            .is_some_and(|value| value == id_value.as_str()),
        SimpleSelector::AttrExists(name) => adapter.attr(element, name).is_some(),
        SimpleSelector::AttrEquals { name, value } => adapter
            .attr(element, name)
            .is_some_and(|attr_value| attr_value == value.as_str()),
    })
}
