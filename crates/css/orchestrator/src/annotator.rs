//! Applies stylesheet tokens to matching elements as `style` attributes.
//!
//! Every element touched by a rule gets one [`DeclarationMap`], seeded from
//! its own `style` attribute and fed each matching rule in stylesheet order.
//! Rules that cannot be expressed inline are handed back as residual tokens
//! for the document's `<style>` block.

use crate::matching::select;
use anyhow::Result;
use css_cascade::{DeclarationMap, MergeMode};
use css_selectors::specificity_of;
use css_syntax::StyleToken;
use html::{Document, NodeId};
use log::{debug, warn};
use std::collections::HashMap;

/// Token for one comma member of `token`, at that member's own specificity.
fn member_token(token: &StyleToken, selector: &str) -> StyleToken {
    let mut member = StyleToken::new(selector);
    member.properties.clone_from(&token.properties);
    member.specificity = specificity_of(selector);
    member.force_usage = token.force_usage;
    member
}

fn is_inlinable(token: &StyleToken) -> bool {
    !token.is_media_query && !token.is_pseudo_selector && !token.has_nested_rules()
}

/// Merge `tokens` into the `style` attributes of the elements they match.
///
/// Returns the tokens to keep in the residual stylesheet, in order: media
/// queries, pseudo selectors and nested rules whole; forced tokens whole; and
/// the comma members that matched nothing or could not be parsed.
pub fn annotate(doc: &mut Document, tokens: &[StyleToken], mode: MergeMode) -> Vec<StyleToken> {
    let mut residual = Vec::new();
    let mut styles: HashMap<NodeId, DeclarationMap> = HashMap::new();
    let mut touched = Vec::new();

    for token in tokens {
        if !is_inlinable(token) {
            residual.push(token.clone());
            continue;
        }
        if token.force_usage {
            residual.push(token.clone());
        }
        for selector in &token.simple_selectors {
            let member = member_token(token, selector);
            let matched = match select(doc, selector) {
                Ok(matched) => matched,
                Err(err) => {
                    warn!("{err:#}");
                    Vec::new()
                }
            };
            if matched.is_empty() {
                if !token.force_usage {
                    residual.push(member);
                }
                continue;
            }
            for element in matched {
                let map = styles.entry(element).or_insert_with(|| {
                    touched.push(element);
                    DeclarationMap::from_inline(doc.attr(element, "style").unwrap_or_default(), mode)
                });
                map.merge_rule(&member);
            }
        }
    }

    for element in touched {
        let Some(style) = styles.get(&element).and_then(DeclarationMap::to_inline_style) else {
            debug!("leaving style of {element:?} unchanged");
            continue;
        };
        doc.set_attr(element, "style", &style);
    }
    residual
}

/// Escape every `</style` (any case) as `<\/style` so raw text cannot close the element.
fn escape_style_end(css: &str) -> String {
    const END_TAG: &str = "</style";
    let lower = css.to_ascii_lowercase();
    let mut out = String::with_capacity(css.len());
    let mut last = 0;
    for (start, _) in lower.match_indices(END_TAG) {
        out.push_str(&css[last..=start]);
        out.push('\\');
        last = start + 1;
    }
    out.push_str(&css[last..]);
    out
}

/// Append the residual tokens as one `<style type="text/css">` in `<head>`.
///
/// Nothing is written when `residual` is empty. End tags inside the rules are
/// escaped so the block cannot be closed early.
///
/// # Errors
/// Returns an error if the element cannot be attached to the document.
pub fn write_residual_styles(doc: &mut Document, residual: &[StyleToken]) -> Result<()> {
    if residual.is_empty() {
        return Ok(());
    }
    let css: String = residual.iter().map(StyleToken::to_css).collect();
    let css = escape_style_end(&css);
    let head = doc.ensure_head()?;
    let style = doc.append_element(head, "style")?;
    doc.set_attr(style, "type", "text/css");
    doc.set_text(style, &css)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "test assertions")]

    use super::*;
    use css_syntax::{tokenize, tokenize_with};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn style_of(doc: &Document, tag: &str) -> Option<String> {
        doc.first_by_tag(tag)
            .and_then(|element| doc.attr(element, "style"))
            .map(str::to_owned)
    }

    #[test]
    fn rules_accumulate_in_stylesheet_order() {
        init();
        let mut doc = Document::parse("<p class=\"note\" style=\"margin: 0\">x</p>").unwrap();
        let tokens = tokenize("p { color: black; padding: 1px } .note { color: green } p { color: red }");
        let residual = annotate(&mut doc, &tokens, MergeMode::ProcessSpecificity);
        assert!(residual.is_empty());
        assert_eq!(
            style_of(&doc, "p").as_deref(),
            Some("margin: 0; color: green; padding: 1px;")
        );
    }

    #[test]
    fn unmatched_members_become_residual() {
        init();
        let mut doc = Document::parse("<h1>t</h1>").unwrap();
        let tokens = tokenize("h1, .absent { color: red } a:hover { color: blue } p[x~=y] { a: b }");
        let residual = annotate(&mut doc, &tokens, MergeMode::ProcessSpecificity);
        assert_eq!(style_of(&doc, "h1").as_deref(), Some("color: red;"));
        let selectors: Vec<_> = residual.iter().map(|token| token.selector.as_str()).collect();
        assert_eq!(selectors, [".absent", "a:hover", "p[x~=y]"]);
        assert_eq!(residual[0].specificity, specificity_of(".absent"));
    }

    #[test]
    fn forced_tokens_are_inlined_and_kept() {
        init();
        let mut doc = Document::parse("<table><tr><td class=\"keep\">t</td></tr></table>").unwrap();
        let tokens = tokenize_with(".keep, .gone { width: 10px }", |_| true);
        let residual = annotate(&mut doc, &tokens, MergeMode::ProcessSpecificity);
        assert_eq!(residual.len(), 1);
        assert_eq!(residual[0].selector, ".keep, .gone");
        assert_eq!(style_of(&doc, "td").as_deref(), Some("width: 10px;"));
    }

    #[test]
    fn media_rules_go_to_the_style_block() {
        init();
        let mut doc = Document::parse("<table><tr><td class=\"a\">t</td></tr></table>").unwrap();
        let tokens = tokenize("@media (max-width: 600px) { td.a { width: 100% !important } }");
        let residual = annotate(&mut doc, &tokens, MergeMode::ProcessSpecificity);
        assert_eq!(style_of(&doc, "td"), None);
        write_residual_styles(&mut doc, &residual).unwrap();

        let style = doc.first_by_tag("style").unwrap();
        assert_eq!(doc.parent_element(style), doc.head());
        assert_eq!(doc.attr(style, "type"), Some("text/css"));
        assert_eq!(
            doc.text_content(style),
            "@media (max-width: 600px) { td.a { width: 100% !important; } }\n"
        );
    }

    #[test]
    fn equal_specificity_keeps_the_first_rule() {
        init();
        let mut doc = Document::parse("<p class=\"a b\">x</p>").unwrap();
        annotate(&mut doc, &tokenize(".a { color: red } .b { color: blue }"), MergeMode::ProcessSpecificity);
        assert_eq!(style_of(&doc, "p").as_deref(), Some("color: red;"));

        let mut doc = Document::parse("<p class=\"a b\">x</p>").unwrap();
        let tokens = tokenize(".a { color: red !important } .b { color: blue !important }");
        annotate(&mut doc, &tokens, MergeMode::ProcessSpecificity);
        assert_eq!(style_of(&doc, "p").as_deref(), Some("color: red !important;"));
    }

    #[test]
    fn higher_specificity_still_wins_later() {
        init();
        let mut doc = Document::parse("<p id=\"x\" class=\"a\">x</p>").unwrap();
        annotate(&mut doc, &tokenize(".a { color: red } #x { color: blue }"), MergeMode::ProcessSpecificity);
        assert_eq!(style_of(&doc, "p").as_deref(), Some("color: blue;"));
    }

    #[test]
    fn style_end_tags_are_escaped() {
        assert_eq!(escape_style_end("a { }"), "a { }");
        assert_eq!(
            escape_style_end("x</style><script></STYLE"),
            "x<\\/style><script><\\/STYLE"
        );
    }

    #[test]
    fn no_block_without_residual_tokens() {
        let mut doc = Document::parse("<p>x</p>").unwrap();
        write_residual_styles(&mut doc, &[]).unwrap();
        assert!(doc.first_by_tag("style").is_none());
    }
}
