//! Cascade resolution between an element's inline style and matching rules.
//!
//! Declarations are resolved per property name under one of three
//! [`MergeMode`]s. Under [`MergeMode::ProcessSpecificity`] the winner is the
//! declaration with the higher [`CascadePriority`]; on an exact tie the
//! later-processed declaration wins and keeps the earlier one's position.
//!
//! A [`DeclarationMap`] used as a per-element accumulator takes each newly
//! matched rule through [`DeclarationMap::merge_rule`], which processes the
//! rule first and the already-resolved declarations after it, so an earlier
//! resolution survives an exact tie.

#![forbid(unsafe_code)]

use core::cmp::Ordering;
use css_selectors::StyleSpecificity;
use css_style_attr::{parse_declarations, split_important_tail};
use css_syntax::StyleToken;
use log::debug;
use serde::{Deserialize, Serialize};

/// How conflicting declarations for the same property are resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MergeMode {
    /// `!important`, then specificity, then processing order.
    #[default]
    ProcessSpecificity,
    /// Last processed declaration wins.
    IgnoreSpecificity,
    /// Keep every declaration, duplicates included.
    AlwaysAppend,
}

impl MergeMode {
    /// Resolve a mode by its configuration name, falling back to [`Self::ProcessSpecificity`].
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "IGNORE_SPECIFICITY" => Self::IgnoreSpecificity,
            "ALWAYS_APPEND" => Self::AlwaysAppend,
            _ => Self::ProcessSpecificity,
        }
    }
}

/// Priority tuple used to order two declarations of the same property.
#[derive(Clone, Copy, Debug)]
pub struct CascadePriority {
    pub important: bool,
    pub specificity: StyleSpecificity,
}

/// Compare two priorities; `Ordering::Greater` means `left` wins.
pub fn compare_priority(left: &CascadePriority, right: &CascadePriority) -> Ordering {
    // Importance first (important wins)
    if left.important != right.important {
        return bool_order_desc(left.important, right.important);
    }
    left.specificity.cmp(&right.specificity)
}

/// Return ordering where true > false.
const fn bool_order_desc(a_true_wins: bool, b_true_wins: bool) -> Ordering {
    match (a_true_wins, b_true_wins) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

/// One declaration taken apart for merging.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleProperty {
    /// Lowercased property name, the merge key.
    pub name: String,
    pub value: String,
    pub important: bool,
    /// The declaration as written.
    pub full_property: String,
    /// Specificity of the rule (or inline style) the declaration came from.
    pub specificity: StyleSpecificity,
}

impl StyleProperty {
    /// Split a raw `name: value [!important]` string.
    ///
    /// `value` excludes the `!important` marker, which only counts at the end
    /// of the value. Text without a colon keeps its whole trimmed text as the
    /// name so it never collides with a real property.
    pub fn parse(property: &str, specificity: StyleSpecificity) -> Self {
        let full_property = property.trim();
        let (name, value, important) = match parse_declarations(full_property).into_iter().next() {
            Some(declaration) => (declaration.property, declaration.value, declaration.important),
            None => {
                let (name, value) = full_property
                    .split_once(':')
                    .map_or((full_property, ""), |(name, value)| (name.trim(), value));
                let (value, important) = split_important_tail(value);
                (name.to_ascii_lowercase(), value, important)
            }
        };
        Self {
            name,
            value,
            important,
            full_property: full_property.to_owned(),
            specificity,
        }
    }

    pub const fn priority(&self) -> CascadePriority {
        CascadePriority {
            important: self.important,
            specificity: self.specificity,
        }
    }

    /// True if `self`, processed after `existing`, should replace it.
    pub fn overrides(&self, existing: &Self) -> bool {
        compare_priority(&self.priority(), &existing.priority()) != Ordering::Less
    }
}

/// Ordered per-element declarations, resolved as tokens are applied.
#[derive(Clone, Debug, Default)]
pub struct DeclarationMap {
    mode: MergeMode,
    declarations: Vec<StyleProperty>,
}

impl DeclarationMap {
    pub const fn new(mode: MergeMode) -> Self {
        Self {
            mode,
            declarations: Vec::new(),
        }
    }

    /// Map seeded from a `style` attribute value at inline specificity.
    pub fn from_inline(style: &str, mode: MergeMode) -> Self {
        let mut map = Self::new(mode);
        map.apply(&StyleToken::inline(style));
        map
    }

    /// Process every property of `token` after what is already present.
    pub fn apply(&mut self, token: &StyleToken) {
        for property in &token.properties {
            self.insert(StyleProperty::parse(property, token.specificity));
        }
    }

    /// Process one declaration after what is already present.
    pub fn insert(&mut self, candidate: StyleProperty) {
        self.resolve(candidate, false);
    }

    /// Merge a rule matched after everything already resolved.
    ///
    /// The rule's own duplicates are resolved first. Its declarations then
    /// count as processed before the present ones, so under
    /// [`MergeMode::ProcessSpecificity`] they replace a present declaration
    /// only with a strictly higher priority.
    pub fn merge_rule(&mut self, token: &StyleToken) {
        let mut incoming = Self::new(self.mode);
        incoming.apply(token);
        for candidate in incoming.declarations {
            self.resolve(candidate, true);
        }
    }

    fn resolve(&mut self, candidate: StyleProperty, present_wins_ties: bool) {
        if self.mode == MergeMode::AlwaysAppend {
            self.declarations.push(candidate);
            return;
        }
        let Some(slot) = self
            .declarations
            .iter_mut()
            .find(|existing| existing.name == candidate.name)
        else {
            self.declarations.push(candidate);
            return;
        };
        let replace = match self.mode {
            MergeMode::IgnoreSpecificity => true,
            _ if present_wins_ties => {
                compare_priority(&candidate.priority(), &slot.priority()) == Ordering::Greater
            }
            _ => candidate.overrides(slot),
        };
        if replace {
            *slot = candidate;
        } else {
            debug!(
                "keeping `{}` {} over `{}` {}",
                slot.full_property, slot.specificity, candidate.full_property, candidate.specificity
            );
        }
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Resolved declarations as a token, in resolution order.
    pub fn to_token(&self) -> StyleToken {
        let mut token = StyleToken::default();
        for declaration in &self.declarations {
            token.push_property(declaration.full_property.clone());
        }
        token
    }

    /// Value for a `style` attribute, or `None` if empty or carrying nested rules.
    pub fn to_inline_style(&self) -> Option<String> {
        let style = self.to_token().inlinable_properties();
        if style.is_none() && !self.is_empty() {
            debug!("discarding merge result with nested rule markers");
        }
        style
    }
}

/// Merge an element's own style with a matching rule.
///
/// Under [`MergeMode::ProcessSpecificity`] the rule's declarations are
/// processed first and the element's after; the other modes process the
/// element first. Missing tokens count as empty.
pub fn merge(
    element: Option<&StyleToken>,
    token: Option<&StyleToken>,
    mode: MergeMode,
) -> Option<String> {
    let mut map = DeclarationMap::new(mode);
    let (first, second) = match mode {
        MergeMode::ProcessSpecificity => (token, element),
        MergeMode::IgnoreSpecificity | MergeMode::AlwaysAppend => (element, token),
    };
    for source in [first, second].into_iter().flatten() {
        map.apply(source);
    }
    map.to_inline_style()
}
