//! Inliner configuration.
//!
//! Configuration documents use camelCase member names and the enum names of
//! the hosting service (`PROCESS_SPECIFICITY`, `REMOVE_SCRIPT_TAGS_ONLY`, ...).
//! Unknown mode names fall back to each mode's default instead of failing.

use anyhow::{Context as _, Result};
use css_cascade::MergeMode;
use html::HtmlSanitizingMode;
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};

/// Rule projecting the first image width in pixels or percent onto `width`.
pub const IMG_WIDTH_DEFAULT: &str = r#"{"elementType":"img","cssPropertyRegEx":"width","cssPropertyOutputRegEx":"[0-9]+(?=px)|[0-9]+(?=PX)|[0-9]+[%]","htmlAttributeName":"width","overrideIfAlreadyExisting":true}"#;

/// Wrapper classes emitted by the page authoring grid.
pub const DEFAULT_WRAPPER_CLASSES: [&str; 2] = ["aem-Grid", "aem-GridColumn"];

/// Where stylesheets are looked up in the input document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StylesheetSource {
    /// `<style>` elements.
    #[default]
    Embedded,
    /// `<link rel="stylesheet">` elements, fetched through the host.
    External,
}

/// Top-level configuration of a [`crate::StylesInliner`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InlinerConfig {
    pub stylesheet_source: StylesheetSource,
    #[serde(deserialize_with = "merge_mode_by_name")]
    pub styles_merging_mode: MergeMode,
    #[serde(deserialize_with = "sanitizing_mode_by_name")]
    pub html_sanitizing_mode: HtmlSanitizingMode,
    pub wrapper_div_classes_to_be_removed: Vec<String>,
    /// JSON documents, each one [`HtmlInlinerConfiguration`].
    pub html_inliner_configuration: Vec<String>,
    /// Patterns matched against a rule's whole selector text.
    pub force_usage_selectors: Vec<String>,
    /// Remove `\n`, `\r` and `\t` from the output.
    pub strip_line_breaks: bool,
}

impl Default for InlinerConfig {
    fn default() -> Self {
        Self {
            stylesheet_source: StylesheetSource::default(),
            styles_merging_mode: MergeMode::default(),
            html_sanitizing_mode: HtmlSanitizingMode::default(),
            wrapper_div_classes_to_be_removed: DEFAULT_WRAPPER_CLASSES
                .iter()
                .map(|class| (*class).to_owned())
                .collect(),
            html_inliner_configuration: vec![IMG_WIDTH_DEFAULT.to_owned()],
            force_usage_selectors: Vec::new(),
            strip_line_breaks: true,
        }
    }
}

impl InlinerConfig {
    /// Parse a configuration document. Missing members keep their defaults.
    ///
    /// # Errors
    /// Returns an error if `json` is not a valid configuration object.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid inliner configuration")
    }

    /// Attribute projection rules, skipping malformed entries.
    pub fn projections(&self) -> Vec<HtmlInlinerConfiguration> {
        self.html_inliner_configuration
            .iter()
            .filter_map(|json| HtmlInlinerConfiguration::parse(json))
            .collect()
    }
}

fn merge_mode_by_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<MergeMode, D::Error> {
    String::deserialize(deserializer).map(|name| MergeMode::from_name(&name))
}

fn sanitizing_mode_by_name<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<HtmlSanitizingMode, D::Error> {
    String::deserialize(deserializer).map(|name| HtmlSanitizingMode::from_name(&name))
}

/// Projection of a CSS property value onto a legacy HTML attribute.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlInlinerConfiguration {
    /// Tag the rule applies to.
    pub element_type: String,
    /// Pattern a property name must match in full.
    pub css_property_reg_ex: String,
    /// Pattern whose first match in the property value becomes the attribute value.
    pub css_property_output_reg_ex: String,
    pub html_attribute_name: String,
    /// Replace an attribute that already has a value.
    pub override_if_already_existing: bool,
}

impl HtmlInlinerConfiguration {
    /// Parse one rule, logging and returning `None` when `json` is malformed.
    pub fn parse(json: &str) -> Option<Self> {
        match serde_json::from_str(json) {
            Ok(configuration) => Some(configuration),
            Err(err) => {
                warn!("skipping malformed attribute projection `{json}`: {err}");
                None
            }
        }
    }

    /// True when every text field is populated.
    pub fn is_valid(&self) -> bool {
        [
            &self.element_type,
            &self.css_property_reg_ex,
            &self.css_property_output_reg_ex,
            &self.html_attribute_name,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }
}
