#![cfg(test)]

use anyhow::anyhow;
use core::error::Error;
use css_cascade::MergeMode;
use css_orchestrator::{InlinerConfig, StylesInliner, StylesheetFetcher, StylesheetSource};
use serde_json::Value;
use std::collections::HashMap;

type TestResult = Result<(), Box<dyn Error>>;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn inline(html: &str) -> Result<String, Box<dyn Error>> {
    Ok(StylesInliner::default().inline_styles(html)?)
}

/// Serves stylesheets from memory; unknown hrefs fail.
struct MemoryFetcher(HashMap<String, String>);

impl StylesheetFetcher for MemoryFetcher {
    fn fetch(&self, href: &str) -> anyhow::Result<String> {
        self.0
            .get(href)
            .cloned()
            .ok_or_else(|| anyhow!("no stylesheet at {href}"))
    }
}

#[test]
fn heading_rule_is_inlined() -> TestResult {
    init();
    let out = inline(
        "<html><head><style>h1 { font-size: 20px; color: #004488; }</style></head>\
         <body><h1>Title</h1></body></html>",
    )?;
    assert_eq!(
        out,
        "<html><head></head><body><h1 style=\"font-size: 20px; color: #004488;\">Title</h1></body></html>"
    );
    Ok(())
}

#[test]
fn important_rule_beats_inline_declaration() -> TestResult {
    init();
    let css = "<style>table { text-align: center !important; width: 100%; }</style>";
    let out = inline(&format!("{css}<table><tr><td>x</td></tr></table>"))?;
    assert!(out.contains("<table style=\"text-align: center !important; width: 100%;\">"));

    let out = inline(&format!(
        "{css}<table style=\"width: 50%; text-align: left\"><tr><td>x</td></tr></table>"
    ))?;
    assert!(out.contains("<table style=\"width: 50%; text-align: center !important;\">"));
    Ok(())
}

#[test]
fn specificity_orders_rules() -> TestResult {
    init();
    let out = inline(
        "<style>#red { color: red } table td { color: blue; padding: 0 } td { color: green }</style>\
         <table><tr><td id=\"red\">a</td><td>b</td></tr></table>",
    )?;
    assert!(out.contains("<td id=\"red\" style=\"color: red; padding: 0;\">a</td>"));
    assert!(out.contains("<td style=\"color: blue; padding: 0;\">b</td>"));
    Ok(())
}

#[test]
fn merging_modes() -> TestResult {
    init();
    let html = "<style>p { color: red; color: blue }</style><p style=\"color: black\">x</p>";
    let expectations = [
        (MergeMode::ProcessSpecificity, "color: black;"),
        (MergeMode::IgnoreSpecificity, "color: blue;"),
        (MergeMode::AlwaysAppend, "color: black; color: red; color: blue;"),
    ];
    for (mode, style) in expectations {
        let config = InlinerConfig {
            styles_merging_mode: mode,
            ..InlinerConfig::default()
        };
        let out = StylesInliner::new(config, None).inline_styles(html)?;
        assert!(out.contains(&format!("<p style=\"{style}\">x</p>")), "{mode:?}: {out}");
    }
    Ok(())
}

#[test]
fn image_width_is_projected() -> TestResult {
    init();
    let out = inline("<img style=\"width:500px\">")?;
    assert!(out.contains("<img style=\"width:500px\" width=\"500\">"));

    let out = inline("<style>img.hero { width: 80% }</style><img class=\"hero\" width=\"10\">")?;
    assert!(out.contains("<img class=\"hero\" width=\"80%\" style=\"width: 80%;\">"));
    Ok(())
}

#[test]
fn wrapper_divs_are_removed() -> TestResult {
    init();
    let out = inline("<div class=\"aem-Grid\"><p>x</p></div>")?;
    assert_eq!(out, "<html><head></head><body><p>x</p></body></html>");
    Ok(())
}

#[test]
fn non_inlinable_rules_stay_in_head() -> TestResult {
    init();
    let out = inline(
        "<html><head><style>\n\
           td.full { width: 100% }\n\
           a:hover { color: red }\n\
           @media only screen and (max-width: 600px) { td.full { display: block !important; } }\n\
           .unused { margin: 0 }\n\
         </style></head><body><table><tr><td class=\"full\">x</td></tr></table></body></html>",
    )?;
    assert!(out.starts_with(
        "<html><head><style type=\"text/css\">a:hover { color: red; }\
         @media only screen and (max-width: 600px) { td.full { display: block !important; } }\
         .unused { margin: 0; }</style></head>"
    ));
    assert!(out.contains("<td class=\"full\" style=\"width: 100%;\">x</td>"));
    Ok(())
}

#[test]
fn forced_rules_are_inlined_and_kept() -> TestResult {
    init();
    let config = InlinerConfig::from_json(r#"{"forceUsageSelectors":["\\.keep.*"]}"#)?;
    let out = StylesInliner::new(config, None)
        .inline_styles("<style>.keep-me { color: red } p { margin: 0 }</style><p class=\"keep-me\">x</p>")?;
    assert!(out.contains("<style type=\"text/css\">.keep-me { color: red; }</style>"));
    assert!(out.contains("<p class=\"keep-me\" style=\"color: red; margin: 0;\">x</p>"));
    Ok(())
}

#[test]
fn external_stylesheets_are_fetched() -> TestResult {
    init();
    let fetcher = MemoryFetcher(HashMap::from([(
        "/etc/clientlibs/email.css".to_owned(),
        "p { color: red }".to_owned(),
    )]));
    let config = InlinerConfig {
        stylesheet_source: StylesheetSource::External,
        ..InlinerConfig::default()
    };
    let inliner = StylesInliner::new(config, Some(Box::new(fetcher)));
    let out = inliner.inline_styles(
        "<head><link rel=\"stylesheet\" href=\"/etc/clientlibs/email.css\">\
         <link rel=\"stylesheet\" href=\"/missing.css\"></head><body><p>x</p></body>",
    )?;
    assert_eq!(
        out,
        "<html><head></head><body><p style=\"color: red;\">x</p></body></html>"
    );
    Ok(())
}

#[test]
fn scripts_are_sanitized() -> TestResult {
    init();
    let out = inline(
        "<p onclick=\"steal()\">a</p><script>alert(1)</script><a href=\" JavaScript:alert(1)\">l</a>",
    )?;
    assert_eq!(out, "<html><head></head><body><p>a</p><a>l</a></body></html>");
    Ok(())
}

#[test]
fn line_breaks_are_optional() -> TestResult {
    init();
    let html = "<p>a</p>\n\t<p>b</p>";
    assert!(!inline(html)?.contains('\n'));

    let config = InlinerConfig {
        strip_line_breaks: false,
        ..InlinerConfig::default()
    };
    let out = StylesInliner::new(config, None).inline_styles(html)?;
    assert!(out.contains("<p>a</p>\n\t<p>b</p>"));
    Ok(())
}

#[test]
fn json_envelope_keeps_other_members() -> TestResult {
    init();
    let inliner = StylesInliner::default();
    let out = inliner.inline_styles_json(
        r#"{"id":7,"html":"<style>p { color: red }</style><p>x</p>","tail":true}"#,
    )?;
    let value: Value = serde_json::from_str(&out)?;
    let object = value.as_object().ok_or("not an object")?;
    assert_eq!(object.keys().collect::<Vec<_>>(), ["id", "html", "tail"]);
    assert_eq!(object["id"], 7);
    assert_eq!(
        object["html"],
        "<html><head></head><body><p style=\"color: red;\">x</p></body></html>"
    );

    let raw = inliner.inline_styles_json("<p>plain</p>")?;
    assert_eq!(raw, "<html><head></head><body><p>plain</p></body></html>");
    Ok(())
}

#[test]
fn fetched_rules_cannot_close_the_style_block() -> TestResult {
    init();
    let fetcher = MemoryFetcher(HashMap::from([(
        "/hostile.css".to_owned(),
        "a:hover { content: \"</style><script>alert(1)</script>\" }".to_owned(),
    )]));
    let config = InlinerConfig {
        stylesheet_source: StylesheetSource::External,
        ..InlinerConfig::default()
    };
    let out = StylesInliner::new(config, Some(Box::new(fetcher)))
        .inline_styles("<link rel=\"stylesheet\" href=\"/hostile.css\"><a>x</a>")?;
    assert!(!out.contains("</style><script>"), "{out}");
    assert!(out.contains("<\\/style><script>"), "{out}");
    let reparsed = html::Document::parse(&out)?;
    assert!(reparsed.elements_by_tag("script").is_empty());
    assert_eq!(reparsed.elements_by_tag("style").len(), 1);
    Ok(())
}
