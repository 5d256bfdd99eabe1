//! Projection of inlined CSS values onto legacy HTML attributes.
//!
//! Some mail clients ignore `style="width: 500px"` on images and tables but
//! honour `width="500"`. Each [`HtmlInlinerConfiguration`] names a tag, a
//! property pattern and an extraction pattern for the value.

use crate::config::HtmlInlinerConfiguration;
use anyhow::{Context as _, Result, bail};
use css_style_attr::find_declaration;
use css_syntax::StyleToken;
use fancy_regex::Regex;
use html::{Document, NodeId};
use log::{debug, warn};

/// A valid configuration with both patterns compiled.
pub struct Projection<'cfg> {
    configuration: &'cfg HtmlInlinerConfiguration,
    property: Regex,
    output: Regex,
}

impl<'cfg> Projection<'cfg> {
    /// Compile `configuration`. The property pattern must match a whole property name.
    ///
    /// # Errors
    /// Returns an error if the configuration is incomplete or a pattern does not compile.
    pub fn compile(configuration: &'cfg HtmlInlinerConfiguration) -> Result<Self> {
        if !configuration.is_valid() {
            bail!("incomplete attribute projection {configuration:?}");
        }
        let property = Regex::new(&format!("^(?:{})$", configuration.css_property_reg_ex))
            .with_context(|| format!("bad property pattern `{}`", configuration.css_property_reg_ex))?;
        let output = Regex::new(&configuration.css_property_output_reg_ex).with_context(|| {
            format!("bad output pattern `{}`", configuration.css_property_output_reg_ex)
        })?;
        Ok(Self {
            configuration,
            property,
            output,
        })
    }

    /// Whether this projection targets `element`.
    pub fn applies_to(&self, doc: &Document, element: NodeId) -> bool {
        doc.tag_name(element)
            .is_some_and(|tag| tag.eq_ignore_ascii_case(&self.configuration.element_type))
    }

    /// The attribute value projected from `token`'s first matching property.
    ///
    /// # Errors
    /// Returns an error if the output pattern fails while matching.
    pub fn value_for(&self, token: &StyleToken) -> Result<Option<String>> {
        let Some(declaration) = find_declaration(&token.all_properties(), |name| {
            matches!(self.property.is_match(name), Ok(true))
        }) else {
            return Ok(None);
        };
        let found = self
            .output
            .find(&declaration.value)
            .with_context(|| format!("cannot match `{}`", declaration.value))?;
        Ok(found.map(|value| value.as_str().to_owned()))
    }

    /// Write the projected attribute on `element` from its declarations in `token`.
    ///
    /// # Errors
    /// Returns an error if the output pattern fails while matching.
    pub fn apply(&self, doc: &mut Document, element: NodeId, token: &StyleToken) -> Result<()> {
        let Some(value) = self.value_for(token)? else {
            return Ok(());
        };
        let name = &self.configuration.html_attribute_name;
        let present = doc.attr(element, name).is_some_and(|current| !current.is_empty());
        if present && !self.configuration.override_if_already_existing {
            debug!("keeping existing `{name}` on {element:?}");
            return Ok(());
        }
        doc.set_attr(element, name, &value);
        Ok(())
    }
}

/// Compile every usable configuration, logging and skipping the rest.
pub fn compile_all(configurations: &[HtmlInlinerConfiguration]) -> Vec<Projection<'_>> {
    configurations
        .iter()
        .filter_map(|configuration| match Projection::compile(configuration) {
            Ok(projection) => Some(projection),
            Err(err) => {
                warn!("skipping attribute projection: {err:#}");
                None
            }
        })
        .collect()
}

/// Apply every projection that targets `element`, reading declarations from `token`.
pub fn project_element(
    doc: &mut Document,
    element: NodeId,
    token: &StyleToken,
    projections: &[Projection<'_>],
) {
    for projection in projections {
        if !projection.applies_to(doc, element) {
            continue;
        }
        if let Err(err) = projection.apply(doc, element, token) {
            warn!("attribute projection failed on {element:?}: {err:#}");
        }
    }
}

/// Project attributes onto every element of each configured type from its `style` attribute.
pub fn project_attributes(doc: &mut Document, configurations: &[HtmlInlinerConfiguration]) {
    let projections = compile_all(configurations);
    if projections.is_empty() {
        return;
    }
    for element in doc.elements() {
        if !projections
            .iter()
            .any(|projection| projection.applies_to(doc, element))
        {
            continue;
        }
        let token = StyleToken::inline(doc.attr(element, "style").unwrap_or_default());
        project_element(doc, element, &token, &projections);
    }
}
