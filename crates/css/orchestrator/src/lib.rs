//! Styles inliner for HTML email.
//!
//! [`StylesInliner`] rewrites a document so that every element matched by a
//! stylesheet rule carries the resolved declarations in its own `style`
//! attribute. Rules that cannot live in an attribute (media queries,
//! pseudo selectors, selectors matching nothing) are kept in a single
//! `<style>` block in the head.

#![allow(
    clippy::missing_docs_in_private_items,
    reason = "Internal implementation details don't need public documentation"
)]
#![allow(
    clippy::missing_inline_in_public_items,
    reason = "Inlining decisions left to compiler for this crate"
)]

use anyhow::{Context as _, Result};
use css_syntax::{StyleToken, tokenize_with};
use fancy_regex::Regex;
use html::{Document, sanitize};
use log::{debug, warn};
use serde_json::Value;

pub mod annotator;
pub mod config;
pub mod extractor;
pub mod matching;
pub mod projector;
pub mod wrapper;

pub use config::{HtmlInlinerConfiguration, InlinerConfig, StylesheetSource};
pub use extractor::StylesheetFetcher;

/// Configured inlining pipeline. Holds no per-document state.
pub struct StylesInliner {
    config: InlinerConfig,
    fetcher: Option<Box<dyn StylesheetFetcher>>,
    projections: Vec<HtmlInlinerConfiguration>,
    force_usage: Vec<Regex>,
}

impl StylesInliner {
    /// Build an inliner. `fetcher` is only consulted for external stylesheets.
    ///
    /// Malformed projection rules and force-usage patterns are logged and ignored.
    pub fn new(config: InlinerConfig, fetcher: Option<Box<dyn StylesheetFetcher>>) -> Self {
        let projections = config.projections();
        let force_usage = config
            .force_usage_selectors
            .iter()
            .filter_map(|pattern| match Regex::new(&format!("^(?:{pattern})$")) {
                Ok(regex) => Some(regex),
                Err(err) => {
                    warn!("ignoring force usage pattern `{pattern}`: {err}");
                    None
                }
            })
            .collect();
        Self {
            config,
            fetcher,
            projections,
            force_usage,
        }
    }

    fn is_forced(&self, selector: &str) -> bool {
        self.force_usage
            .iter()
            .any(|regex| matches!(regex.is_match(selector), Ok(true)))
    }

    /// Inline the stylesheets of `html` and return the rewritten document.
    ///
    /// # Errors
    /// Returns an error only if the document cannot be parsed or the residual
    /// style block cannot be attached; every other failure is logged and skipped.
    pub fn inline_styles(&self, html: &str) -> Result<String> {
        let mut doc = Document::parse(html).context("cannot parse HTML document")?;

        let sheets = extractor::extract_styles(
            &mut doc,
            self.config.stylesheet_source,
            self.fetcher.as_deref(),
        );
        let tokens: Vec<StyleToken> = sheets
            .iter()
            .flat_map(|css| tokenize_with(css, |selector| self.is_forced(selector)))
            .collect();
        debug!("{} stylesheet(s), {} rule(s)", sheets.len(), tokens.len());

        sanitize(&mut doc, self.config.html_sanitizing_mode);
        let residual = annotator::annotate(&mut doc, &tokens, self.config.styles_merging_mode);
        projector::project_attributes(&mut doc, &self.projections);
        annotator::write_residual_styles(&mut doc, &residual)
            .context("cannot write residual styles")?;
        wrapper::remove_wrapper_divs(&mut doc, &self.config.wrapper_div_classes_to_be_removed);

        let mut out = doc.serialize();
        if self.config.strip_line_breaks {
            out.retain(|ch| !matches!(ch, '\n' | '\r' | '\t'));
        }
        Ok(out)
    }

    /// Inline a document that may be wrapped in a JSON object with an `html` member.
    ///
    /// The other members are returned unchanged and in order. Anything else is
    /// treated as raw HTML.
    ///
    /// # Errors
    /// Returns an error if [`Self::inline_styles`] fails.
    pub fn inline_styles_json(&self, content: &str) -> Result<String> {
        let Ok(Value::Object(mut envelope)) = serde_json::from_str::<Value>(content) else {
            return self.inline_styles(content);
        };
        let Some(Value::String(html)) = envelope.get("html") else {
            return self.inline_styles(content);
        };
        let inlined = self.inline_styles(html)?;
        envelope.insert("html".to_owned(), Value::String(inlined));
        Ok(Value::Object(envelope).to_string())
    }
}

impl Default for StylesInliner {
    fn default() -> Self {
        Self::new(InlinerConfig::default(), None)
    }
}
