use css_selectors::{StyleSpecificity, specificity_of};
use css_style_attr::parse_declarations;

/// One parsed CSS rule: a selector and its ordered declaration strings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleToken {
    /// Selector text as written, e.g. `h1, p.note`.
    pub selector: String,
    /// Comma-separated members of `selector`, trimmed, with any pseudo suffix removed.
    pub simple_selectors: Vec<String>,
    /// Raw `name: value` declarations in source order, without duplicates.
    /// Nested rules appear as a single `selector { ... }` entry.
    pub properties: Vec<String>,
    pub specificity: StyleSpecificity,
    /// Selector contains `@`.
    pub is_media_query: bool,
    /// Selector contains `:` and is not a media query.
    pub is_pseudo_selector: bool,
    /// At least one nested rule was captured into `properties`.
    pub is_nested: bool,
    /// Always kept in the residual stylesheet, even when it also gets inlined.
    pub force_usage: bool,
}

impl StyleToken {
    /// Build a token for `selector`, classifying it and splitting its members.
    pub fn new(selector: &str) -> Self {
        let selector = selector.trim();
        let is_media_query = selector.contains('@');
        let is_pseudo_selector = !is_media_query && selector.contains(':');
        let simple_selectors = selector
            .split(',')
            .map(|member| {
                if is_pseudo_selector {
                    member.split(':').next().unwrap_or_default()
                } else {
                    member
                }
            })
            .map(str::trim)
            .filter(|member| !member.is_empty())
            .map(str::to_owned)
            .collect();
        Self {
            selector: selector.to_owned(),
            simple_selectors,
            is_media_query,
            is_pseudo_selector,
            ..Self::default()
        }
    }

    /// Like [`Self::new`], flagging the token as forced when `force_usage` accepts its selector.
    pub fn with_force_usage<F>(selector: &str, force_usage: F) -> Self
    where
        F: Fn(&str) -> bool,
    {
        let mut token = Self::new(selector);
        token.force_usage = force_usage(&token.selector);
        token
    }

    /// Token holding an element's `style` attribute declarations.
    pub fn inline(style: &str) -> Self {
        let mut token = Self {
            specificity: StyleSpecificity::STYLE_ATTRIBUTE,
            ..Self::default()
        };
        token.add_properties(style);
        token
    }

    /// Parse a declaration list and append each declaration not already present.
    pub fn add_properties(&mut self, declarations: &str) {
        for declaration in parse_declarations(declarations) {
            self.push_property(declaration.raw);
        }
    }

    /// Append one raw property string unless an identical one is present.
    pub fn push_property(&mut self, property: String) {
        let property = property.split_whitespace().collect::<Vec<_>>().join(" ");
        if !property.is_empty() && !self.properties.contains(&property) {
            self.properties.push(property);
        }
    }

    /// Assign the selector's specificity. Media queries and pseudo selectors keep the default.
    pub fn compute_specificity(&mut self) {
        if !self.is_media_query && !self.is_pseudo_selector {
            self.specificity = specificity_of(&self.selector);
        }
    }

    /// Every property joined as `a; b; nested { ... } c;`.
    pub fn all_properties(&self) -> String {
        let mut out = String::new();
        for property in &self.properties {
            out.push_str(property);
            if out.trim_end().ends_with('}') {
                out.push(' ');
            } else {
                out.push_str("; ");
            }
        }
        out.trim().to_owned()
    }

    /// Properties safe to place in a `style` attribute.
    ///
    /// Double quotes become single quotes. Returns `None` when empty or when a
    /// nested rule would leak braces into the attribute.
    pub fn inlinable_properties(&self) -> Option<String> {
        let all = self.all_properties();
        if all.is_empty() || all.contains(['{', '}']) {
            return None;
        }
        Some(all.replace('"', "'"))
    }

    /// True when any property carries a nested rule.
    pub fn has_nested_rules(&self) -> bool {
        self.properties
            .iter()
            .any(|property| property.contains(['{', '}']))
    }

    /// Render as a stylesheet rule followed by a newline.
    pub fn to_css(&self) -> String {
        let properties = self.all_properties();
        let mut out = format!("{} {{", self.selector);
        if !properties.is_empty() {
            out.push(' ');
            out.push_str(&properties);
        }
        out.push_str(" }\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_selectors() {
        let media = StyleToken::new("@media screen and (max-width: 600px)");
        assert!(media.is_media_query);
        assert!(!media.is_pseudo_selector);

        let pseudo = StyleToken::new("a:hover, p.note::before");
        assert!(pseudo.is_pseudo_selector);
        assert_eq!(pseudo.simple_selectors, vec!["a", "p.note"]);

        let list = StyleToken::new(" h1 , ,table td ");
        assert_eq!(list.selector, "h1 , ,table td");
        assert_eq!(list.simple_selectors, vec!["h1", "table td"]);
    }

    #[test]
    fn properties_are_deduplicated_in_order() {
        let mut token = StyleToken::new("p");
        token.add_properties("color: red;  margin:  0 ; color: red");
        token.add_properties("color: blue");
        assert_eq!(token.properties, vec!["color: red", "margin: 0", "color: blue"]);
        assert_eq!(token.all_properties(), "color: red; margin: 0; color: blue;");
    }

    #[test]
    fn nested_rules_block_inlining() {
        let mut token = StyleToken::new("@media (max-width: 600px)");
        token.push_property("td.layout { display: block !important; }".to_owned());
        token.push_property("p { margin: 0; }".to_owned());
        assert!(token.has_nested_rules());
        assert_eq!(token.inlinable_properties(), None);
        assert_eq!(
            token.to_css(),
            "@media (max-width: 600px) { td.layout { display: block !important; } p { margin: 0; } }\n"
        );
    }

    #[test]
    fn inlinable_properties_swap_quotes() {
        let token = StyleToken::inline("font-family: \"Gill Sans\", sans-serif");
        assert_eq!(token.specificity, StyleSpecificity::STYLE_ATTRIBUTE);
        assert_eq!(
            token.inlinable_properties().as_deref(),
            Some("font-family: 'Gill Sans', sans-serif;")
        );
        assert_eq!(StyleToken::inline("").inlinable_properties(), None);
    }

    #[test]
    fn force_usage_predicate() {
        let token = StyleToken::with_force_usage(".keep-me", |selector| selector.starts_with(".keep"));
        assert!(token.force_usage);
        assert!(!StyleToken::with_force_usage("p", |_| false).force_usage);
    }
}
