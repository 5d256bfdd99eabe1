//! Brace-driven stylesheet tokenizer.

use crate::StyleToken;
use css_style_attr::parse_declarations;
use log::debug;

/// Strip `/* ... */` comments, collapse whitespace runs to one space and trim.
///
/// An unterminated comment swallows the rest of the input.
pub fn normalize(css: &str) -> String {
    let mut without_comments = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        without_comments.push_str(rest.get(..start).unwrap_or_default());
        rest = rest
            .get(start.saturating_add(2)..)
            .and_then(|tail| tail.find("*/").and_then(|end| tail.get(end.saturating_add(2)..)))
            .unwrap_or_default();
    }
    without_comments.push_str(rest);
    without_comments.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split into trimmed, non-empty segments; each brace is a segment of its own.
fn segments(css: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    for (index, ch) in css.char_indices() {
        if ch == '{' || ch == '}' {
            if let Some(text) = css.get(start..index) {
                out.push(text.trim());
            }
            if let Some(brace) = css.get(index..index.saturating_add(1)) {
                out.push(brace);
            }
            start = index.saturating_add(1);
        }
    }
    if let Some(text) = css.get(start..) {
        out.push(text.trim());
    }
    out.retain(|segment| !segment.is_empty());
    out
}

/// A rule nested inside the current token, recorded verbatim.
#[derive(Default)]
struct NestedCapture {
    text: String,
    depth: usize,
}

impl NestedCapture {
    fn push_selector(&mut self, selector: &str) {
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(selector);
    }

    fn push_declarations(&mut self, declarations: &str) {
        for declaration in parse_declarations(declarations) {
            self.text.push(' ');
            self.text.push_str(&declaration.raw);
            self.text.push(';');
        }
    }

    fn open(&mut self) {
        self.text.push_str(" {");
        self.depth = self.depth.saturating_add(1);
    }

    fn close(&mut self) {
        self.text.push_str(" }");
        self.depth = self.depth.saturating_sub(1);
    }
}

/// Split `text` preceding a block into `(statements, selector)` at its last `;`.
fn split_selector(text: &str) -> (Option<&str>, &str) {
    match text.rsplit_once(';') {
        Some((statements, selector)) => (Some(statements), selector.trim()),
        None => (None, text),
    }
}

/// Tokenize a stylesheet with no forced selectors.
pub fn tokenize(css: &str) -> Vec<StyleToken> {
    tokenize_with(css, |_| false)
}

/// Tokenize a stylesheet into one token per top-level rule, in source order.
///
/// `force_usage` is asked once per top-level selector.
pub fn tokenize_with<F>(css: &str, force_usage: F) -> Vec<StyleToken>
where
    F: Fn(&str) -> bool,
{
    let normalized = normalize(css);
    let parts = segments(&normalized);
    let mut tokens = Vec::new();
    let mut current: Option<StyleToken> = None;
    let mut capture: Option<NestedCapture> = None;
    let mut level = 0_usize;

    for (index, part) in parts.iter().enumerate() {
        let opens_block = parts.get(index.saturating_add(1)) == Some(&"{");
        match *part {
            "{" => {
                level = level.saturating_add(1);
                if let Some(nested) = capture.as_mut() {
                    nested.open();
                }
            }
            "}" => {
                if level == 0 {
                    debug!("ignoring unbalanced closing brace");
                    continue;
                }
                level -= 1;
                if let Some(nested) = capture.as_mut() {
                    nested.close();
                    if nested.depth == 0
                        && let (Some(token), Some(done)) = (current.as_mut(), capture.take())
                    {
                        token.push_property(done.text);
                    }
                }
                if level == 0 {
                    capture = None;
                    if let Some(mut token) = current.take() {
                        token.compute_specificity();
                        tokens.push(token);
                    }
                }
            }
            text if level == 0 => {
                if !opens_block {
                    debug!("skipping text outside of any rule: {text}");
                    continue;
                }
                let (statements, selector) = split_selector(text);
                if let Some(statements) = statements {
                    debug!("skipping block-less statements: {statements}");
                }
                current = Some(StyleToken::with_force_usage(selector, &force_usage));
            }
            text => {
                let Some(token) = current.as_mut() else {
                    continue;
                };
                if opens_block {
                    let (declarations, selector) = split_selector(text);
                    if let Some(declarations) = declarations {
                        match capture.as_mut() {
                            Some(nested) => nested.push_declarations(declarations),
                            None => token.add_properties(declarations),
                        }
                    }
                    token.is_nested = true;
                    capture
                        .get_or_insert_with(NestedCapture::default)
                        .push_selector(selector);
                } else if text.contains([':', ';']) {
                    match capture.as_mut() {
                        Some(nested) => nested.push_declarations(text),
                        None => token.add_properties(text),
                    }
                }
            }
        }
    }

    if let Some(token) = current {
        debug!("dropping unterminated rule `{}`", token.selector);
    }
    tokens
}
