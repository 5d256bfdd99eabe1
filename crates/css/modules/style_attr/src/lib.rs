//! Declaration lists: the body of a `style="..."` attribute or of a rule block.
//!
//! Parsing goes through `cssparser`'s rule-body parser so that semicolons and
//! colons inside strings, `url(...)` and other blocks never split a
//! declaration.

#![forbid(unsafe_code)]

use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseError, Parser, ParserInput, ParserState,
    QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser,
};

/// A single CSS declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// Property name normalized to ASCII lowercase.
    pub property: String,
    /// Value text without a trailing `!important`.
    pub value: String,
    pub important: bool,
    /// The declaration as written, `name: value [!important]`, trimmed.
    pub raw: String,
}

/// Split a trailing `!important` off a value, returning `(value, important)`.
pub fn split_important_tail(value: &str) -> (String, bool) {
    let trimmed = value.trim();
    let lower = trimmed.to_ascii_lowercase();
    if let Some(pos) = lower.rfind("!important")
        && lower.get(pos..).is_some_and(|tail| tail.trim_end() == "!important")
        && let Some(prefix) = trimmed.get(..pos)
    {
        let head = prefix.trim_end();
        return (head.to_owned(), true);
    }
    (trimmed.to_owned(), false)
}

/// A declaration parser that records property name, raw value and source text.
struct BodyDeclParser;

impl<'input> DeclarationParser<'input> for BodyDeclParser {
    type Declaration = Declaration;
    type Error = ();

    fn parse_value<'token>(
        &mut self,
        name: CowRcStr<'input>,
        input: &mut Parser<'input, 'token>,
        declaration_start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'input, Self::Error>> {
        let start = input.position();
        // Consume until end of the declaration item.
        while input.next_including_whitespace_and_comments().is_ok() {}
        let (value, important) = split_important_tail(input.slice_from(start));
        Ok(Declaration {
            property: name.to_ascii_lowercase(),
            value,
            important,
            raw: input
                .slice_from(declaration_start.position())
                .trim()
                .to_owned(),
        })
    }
}

impl AtRuleParser<'_> for BodyDeclParser {
    type Prelude = ();
    type AtRule = Declaration;
    type Error = ();
}

impl QualifiedRuleParser<'_> for BodyDeclParser {
    type Prelude = ();
    type QualifiedRule = Declaration;
    type Error = ();
}

impl RuleBodyItemParser<'_, Declaration, ()> for BodyDeclParser {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

/// Parse a declaration list into declarations, in source order.
///
/// Invalid items (no colon, a name that is not an identifier, nested blocks)
/// are skipped. Declarations with an empty value are dropped as well.
pub fn parse_declarations(input: &str) -> Vec<Declaration> {
    if input.trim().is_empty() {
        return Vec::new();
    }
    let mut parser_input = ParserInput::new(input);
    let mut parser = Parser::new(&mut parser_input);
    let mut body = BodyDeclParser;
    RuleBodyParser::new(&mut parser, &mut body)
        .flatten()
        .filter(|decl| !decl.value.is_empty())
        .collect()
}

/// The value of the first declaration whose property satisfies `matches`.
pub fn find_declaration<F>(input: &str, mut matches: F) -> Option<Declaration>
where
    F: FnMut(&str) -> bool,
{
    parse_declarations(input)
        .into_iter()
        .find(|decl| matches(&decl.property))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_values_and_importance() {
        let decls = parse_declarations("Color: Red ; margin:0 auto!important;; bogus; width: ");
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].property, "color");
        assert_eq!(decls[0].value, "Red");
        assert_eq!(decls[0].raw, "Color: Red");
        assert!(!decls[0].important);
        assert_eq!(decls[1].value, "0 auto");
        assert!(decls[1].important);
        assert_eq!(decls[1].raw, "margin:0 auto!important");
    }

    #[test]
    fn semicolons_inside_strings_and_urls_do_not_split() {
        let decls = parse_declarations(
            "background: url(data:image/png;base64,AAA); font-family: 'a;b', \"Gill Sans\"",
        );
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].value, "url(data:image/png;base64,AAA)");
        assert_eq!(decls[1].value, "'a;b', \"Gill Sans\"");
    }

    #[test]
    fn important_tail_is_case_insensitive() {
        assert_eq!(split_important_tail(" red !IMPORTANT "), ("red".to_owned(), true));
        assert_eq!(split_important_tail("red"), ("red".to_owned(), false));
        assert_eq!(
            split_important_tail("'!important' x"),
            ("'!important' x".to_owned(), false)
        );
    }

    #[test]
    fn finds_first_matching_property() {
        let found = find_declaration("height: 2px; width:500px; width: 3px", |name| name == "width");
        assert_eq!(found.map(|decl| decl.value), Some("500px".to_owned()));
    }
}
