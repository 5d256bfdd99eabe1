//! Removal of executable content before styles are inlined.

use crate::dom::Document;
use indextree::NodeId;
use log::debug;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How aggressively executable content is stripped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HtmlSanitizingMode {
    /// Remove `<script>` elements, event-handler attributes and `javascript:` URLs.
    #[default]
    Full,
    /// Remove `<script>` elements only.
    RemoveScriptTagsOnly,
    /// Leave the document untouched.
    None,
}

impl HtmlSanitizingMode {
    /// Resolve a mode by its configuration name, falling back to [`Self::Full`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "REMOVE_SCRIPT_TAGS_ONLY" => Self::RemoveScriptTagsOnly,
            "NONE" => Self::None,
            _ => Self::Full,
        }
    }
}

static EVENT_ATTRIBUTES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "onabort", "onafterprint", "onbeforeprint", "onbeforeunload", "onblur", "oncanplay",
        "oncanplaythrough", "onchange", "onclick", "oncontextmenu", "oncopy", "oncut",
        "ondblclick", "ondrag", "ondragend", "ondragenter", "ondragleave", "ondragover",
        "ondragstart", "ondrop", "ondurationchange", "onended", "onerror", "onfocus",
        "onhashchange", "oninput", "oninvalid", "onkeydown", "onkeypress", "onkeyup", "onload",
        "onloadeddata", "onloadedmetadata", "onloadstart", "onmessage", "onmousedown",
        "onmouseenter", "onmouseleave", "onmousemove", "onmouseout", "onmouseover", "onmouseup",
        "onmousewheel", "onoffline", "ononline", "onpagehide", "onpageshow", "onpaste",
        "onpause", "onplay", "onplaying", "onpopstate", "onprogress", "onratechange", "onreset",
        "onresize", "onscroll", "onsearch", "onseeked", "onseeking", "onselect", "onstalled",
        "onstorage", "onsubmit", "onsuspend", "ontimeupdate", "ontoggle", "onunload",
        "onvolumechange", "onwaiting", "onwheel",
    ]
    .into_iter()
    .collect()
});

const URL_ATTRIBUTES: &[&str] = &["href", "src", "action", "formaction"];

fn is_javascript_url(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace() && !ch.is_ascii_control())
        .collect();
    compact.to_ascii_lowercase().starts_with("javascript:")
}

/// Strip executable content from `doc` according to `mode`.
pub fn sanitize(doc: &mut Document, mode: HtmlSanitizingMode) {
    if mode == HtmlSanitizingMode::None {
        return;
    }
    let scripts = doc.elements_by_tag("script");
    debug!("sanitizer removing {} script element(s)", scripts.len());
    for script in scripts {
        doc.remove(script);
    }
    if mode == HtmlSanitizingMode::Full {
        for element in doc.elements() {
            strip_attributes(doc, element);
        }
    }
}

fn strip_attributes(doc: &mut Document, element: NodeId) {
    let Some(node) = doc.node(element) else {
        return;
    };
    let doomed: Vec<String> = node
        .attrs
        .iter()
        .filter(|(name, value)| {
            let lower = name.to_ascii_lowercase();
            EVENT_ATTRIBUTES.contains(lower.as_str())
                || (URL_ATTRIBUTES.contains(&lower.as_str()) && is_javascript_url(value))
        })
        .map(|(name, _)| name.clone())
        .collect();
    for name in doomed {
        doc.remove_attr(element, &name);
    }
}
