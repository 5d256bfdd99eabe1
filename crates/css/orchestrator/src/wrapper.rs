//! Removal of layout-only wrapper `<div>` elements.

use html::{Document, NodeId};

/// Replace every `<div>` carrying one of `classes` with its children.
///
/// Children are processed before their parent, so nested wrappers collapse
/// bottom-up and sibling order is preserved.
pub fn remove_wrapper_divs<S: AsRef<str>>(doc: &mut Document, classes: &[S]) {
    if classes.is_empty() {
        return;
    }
    let root = doc.root();
    unwrap_below(doc, root, classes);
}

fn is_wrapper<S: AsRef<str>>(doc: &Document, element: NodeId, classes: &[S]) -> bool {
    doc.tag_name(element) == Some("div")
        && classes
            .iter()
            .any(|class| doc.has_class(element, class.as_ref()))
}

fn unwrap_below<S: AsRef<str>>(doc: &mut Document, parent: NodeId, classes: &[S]) {
    for child in doc.child_elements(parent) {
        unwrap_below(doc, child, classes);
        if is_wrapper(doc, child, classes) {
            doc.unwrap(child);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "test assertions")]

    use super::*;

    fn body_html(doc: &Document) -> String {
        doc.first_by_tag("body")
            .map(|body| doc.outer_html(body))
            .unwrap_or_default()
    }

    #[test]
    fn unwraps_in_place() {
        let mut doc = Document::parse("<p>a</p><div class=\"aem-Grid\"><p>x</p></div><p>b</p>").unwrap();
        remove_wrapper_divs(&mut doc, &["aem-Grid"]);
        assert_eq!(body_html(&doc), "<body><p>a</p><p>x</p><p>b</p></body>");
    }

    #[test]
    fn nested_wrappers_collapse() {
        let mut doc = Document::parse(
            "<div class=\"aem-Grid x\"><div class=\"aem-GridColumn\"><span>1</span></div>\
             <div class=\"keep\"><div class=\"aem-GridColumn\">2</div></div></div>",
        )
        .unwrap();
        remove_wrapper_divs(&mut doc, &["aem-Grid", "aem-GridColumn"]);
        assert_eq!(
            body_html(&doc),
            "<body><span>1</span><div class=\"keep\">2</div></body>"
        );
    }

    #[test]
    fn only_whole_class_tokens_on_divs() {
        let html = "<div class=\"aem-Grid-extra\">a</div><section class=\"aem-Grid\">b</section>";
        let mut doc = Document::parse(html).unwrap();
        remove_wrapper_divs(&mut doc, &["aem-Grid"]);
        assert_eq!(body_html(&doc), format!("<body>{html}</body>"));

        let empty: [&str; 0] = [];
        remove_wrapper_divs(&mut doc, &empty);
        assert_eq!(doc.elements_by_tag("div").len(), 1);
    }
}
