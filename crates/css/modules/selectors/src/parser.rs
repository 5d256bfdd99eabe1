//! CSS selector parsing.

use crate::{Combinator, ComplexSelector, CompoundSelector, SelectorList, SimpleSelector};
use anyhow::{Error, anyhow, bail};
use core::mem::take;

#[derive(Clone, Debug, PartialEq, Eq)]
/// Internal tokenizer token kinds.
pub enum Tok {
    /// A combinator token like child/adjacent/general sibling.
    Combinator(Combinator),
    /// Whitespace that implies a descendant combinator.
    DescendantWS,
    /// A simple selector token (type, class, id, attribute, universal).
    Simple(SimpleSelector),
}

/// Tokenizer over a selector string.
pub struct SelectorTokenizer<'input> {
    /// Source text, kept for error messages.
    input: &'input str,
    /// Underlying bytes for the selector.
    input_bytes: &'input [u8],
    /// Current cursor index into `input_bytes`.
    index: usize,
    /// Whether we should emit a descendant whitespace token on `next()` call.
    pending_whitespace: bool,
}

impl<'input> SelectorTokenizer<'input> {
    /// Construct a tokenizer from input.
    #[inline]
    pub(crate) const fn new(input: &'input str) -> Self {
        Self {
            input,
            input_bytes: input.as_bytes(),
            index: 0,
            pending_whitespace: false,
        }
    }

    /// Return the next selector token, if any.
    ///
    /// # Errors
    /// Returns an error on characters outside the supported selector subset.
    #[inline]
    pub(crate) fn next(&mut self) -> Result<Option<Tok>, Error> {
        self.skip_whitespace_descendant();
        if self.pending_whitespace && self.index >= self.input_bytes.len() {
            // Trailing whitespace is not a combinator.
            self.pending_whitespace = false;
        }
        if self.pending_whitespace {
            self.pending_whitespace = false;
            return Ok(Some(Tok::DescendantWS));
        }
        let Some(&current) = self.input_bytes.get(self.index) else {
            return Ok(None);
        };
        let token = match current {
            b'*' => {
                self.index = self.index.saturating_add(1);
                Tok::Simple(SimpleSelector::Universal)
            }
            b'.' => self.consume_class()?,
            b'#' => self.consume_id()?,
            b'[' => self.consume_attr()?,
            b'>' => {
                self.index = self.index.saturating_add(1);
                Tok::Combinator(Combinator::Child)
            }
            b'+' => {
                self.index = self.index.saturating_add(1);
                Tok::Combinator(Combinator::AdjacentSibling)
            }
            b'~' => {
                self.index = self.index.saturating_add(1);
                Tok::Combinator(Combinator::GeneralSibling)
            }
            _ => self.consume_type()?,
        };
        Ok(Some(token))
    }

    /// Skip whitespace and mark that a descendant combinator should be emitted next.
    #[inline]
    fn skip_whitespace_descendant(&mut self) {
        let mut saw = false;
        while let Some(&byte) = self.input_bytes.get(self.index) {
            if byte.is_ascii_whitespace() {
                saw = true;
                self.index = self.index.saturating_add(1);
            } else {
                break;
            }
        }
        if saw && self.index > 0 {
            self.pending_whitespace = true;
        }
    }

    /// Consume an identifier of ASCII alphanumerics, '-', '_' and non-ASCII bytes.
    #[inline]
    fn consume_ident(&mut self) -> String {
        let start = self.index;
        while let Some(&byte) = self.input_bytes.get(self.index) {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' || !byte.is_ascii() {
                self.index = self.index.saturating_add(1);
            } else {
                break;
            }
        }
        let slice = self.input_bytes.get(start..self.index).unwrap_or(&[]);
        String::from_utf8_lossy(slice).into_owned()
    }

    fn required_ident(&mut self, what: &str) -> Result<String, Error> {
        let ident = self.consume_ident();
        if ident.is_empty() {
            let found = self
                .input
                .get(self.index..)
                .and_then(|rest| rest.chars().next())
                .map_or_else(|| String::from("end of input"), |ch| format!("'{ch}'"));
            bail!(
                "expected {what} in selector `{}` at offset {}, found {found}",
                self.input,
                self.index
            );
        }
        Ok(ident)
    }

    /// Parse a type selector identifier into a `SimpleSelector::Type`.
    #[inline]
    fn consume_type(&mut self) -> Result<Tok, Error> {
        let ident = self.required_ident("a type selector")?;
        Ok(Tok::Simple(SimpleSelector::Type(ident.to_ascii_lowercase())))
    }

    /// Parse a class selector following '.' into `SimpleSelector::Class`.
    #[inline]
    fn consume_class(&mut self) -> Result<Tok, Error> {
        // skip '.'
        self.index = self.index.saturating_add(1);
        let ident = self.required_ident("a class name")?;
        Ok(Tok::Simple(SimpleSelector::Class(ident)))
    }

    /// Parse an id selector following '#' into `SimpleSelector::IdSelector`.
    #[inline]
    fn consume_id(&mut self) -> Result<Tok, Error> {
        // skip '#'
        self.index = self.index.saturating_add(1);
        let ident = self.required_ident("an id")?;
        Ok(Tok::Simple(SimpleSelector::IdSelector(ident)))
    }

    /// Parse an attribute selector, supporting `[name]` and `[name=value]` (quoted or unquoted).
    #[inline]
    fn consume_attr(&mut self) -> Result<Tok, Error> {
        // skip '['
        self.index = self.index.saturating_add(1);
        self.skip_spaces();
        let name = self.required_ident("an attribute name")?.to_ascii_lowercase();
        self.skip_spaces();
        let value = if self.peek() == Some(b'=') {
            self.index = self.index.saturating_add(1);
            self.skip_spaces();
            match self.peek() {
                Some(quote @ (b'"' | b'\'')) => {
                    self.index = self.index.saturating_add(1);
                    Some(self.consume_quoted_attr_value(quote)?)
                }
                _ => Some(self.consume_unquoted_attr_value()),
            }
        } else {
            None
        };
        self.skip_spaces();
        if self.peek() != Some(b']') {
            bail!("unterminated attribute selector in `{}`", self.input);
        }
        self.index = self.index.saturating_add(1);
        Ok(Tok::Simple(match value {
            Some(value) => SimpleSelector::AttrEquals { name, value },
            None => SimpleSelector::AttrExists(name),
        }))
    }

    /// Consume an unquoted attribute value until whitespace or a closing bracket.
    #[inline]
    fn consume_unquoted_attr_value(&mut self) -> String {
        let start = self.index;
        while let Some(&byte) = self.input_bytes.get(self.index) {
            if byte.is_ascii_whitespace() || byte == b']' {
                break;
            }
            self.index = self.index.saturating_add(1);
        }
        let slice = self.input_bytes.get(start..self.index).unwrap_or(&[]);
        String::from_utf8_lossy(slice).into_owned()
    }

    /// Consume a quoted attribute value until the matching quote byte.
    #[inline]
    fn consume_quoted_attr_value(&mut self, quote: u8) -> Result<String, Error> {
        let start = self.index;
        while matches!(self.input_bytes.get(self.index), Some(&byte) if byte != quote) {
            self.index = self.index.saturating_add(1);
        }
        if self.peek().is_none() {
            bail!("unterminated string in `{}`", self.input);
        }
        let slice = self.input_bytes.get(start..self.index).unwrap_or(&[]);
        self.index = self.index.saturating_add(1);
        Ok(String::from_utf8_lossy(slice).into_owned())
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.input_bytes.get(self.index).copied()
    }

    /// Skip ASCII whitespace.
    #[inline]
    fn skip_spaces(&mut self) {
        while matches!(self.input_bytes.get(self.index), Some(byte) if byte.is_ascii_whitespace()) {
            self.index = self.index.saturating_add(1);
        }
    }
}

/// Parse a comma-separated selector list.
///
/// # Errors
/// Returns an error if any member of the list fails to parse.
pub fn parse_selector_list(input: &str) -> Result<SelectorList, Error> {
    let mut list = SelectorList::default();
    for part in input.split(',') {
        list.selectors.push(parse_complex_selector(part.trim())?);
    }
    Ok(list)
}

/// Parse one complex selector.
///
/// # Errors
/// Returns an error for empty input, dangling combinators, or syntax outside
/// the supported subset.
pub fn parse_complex_selector(input: &str) -> Result<ComplexSelector, Error> {
    let mut tokens = SelectorTokenizer::new(input.trim());
    let mut current = CompoundSelector::default();
    let mut first: Option<CompoundSelector> = None;
    let mut rest: Vec<(Combinator, CompoundSelector)> = Vec::new();
    let mut pending_combinator: Option<Combinator> = None;

    while let Some(token) = tokens.next()? {
        match token {
            Tok::Combinator(comb) => {
                if current.simples.is_empty() {
                    if first.is_none() || pending_combinator != Some(Combinator::Descendant) {
                        bail!("selector `{input}` has a misplaced combinator");
                    }
                    // `a > b`: the whitespace before `>` only set a provisional descendant.
                    pending_combinator = Some(comb);
                    continue;
                }
                finish_compound(&mut first, &mut rest, pending_combinator, take(&mut current));
                pending_combinator = Some(comb);
            }
            Tok::DescendantWS => {
                if !current.simples.is_empty() {
                    finish_compound(&mut first, &mut rest, pending_combinator, take(&mut current));
                    pending_combinator = Some(Combinator::Descendant);
                }
            }
            Tok::Simple(simple) => current.simples.push(simple),
        }
    }

    if current.simples.is_empty() {
        return Err(if first.is_none() {
            anyhow!("empty selector")
        } else {
            anyhow!("selector `{input}` ends with a combinator")
        });
    }
    finish_compound(&mut first, &mut rest, pending_combinator, current);

    Ok(ComplexSelector {
        first: first.unwrap_or_default(),
        rest,
    })
}

fn finish_compound(
    first: &mut Option<CompoundSelector>,
    rest: &mut Vec<(Combinator, CompoundSelector)>,
    combinator: Option<Combinator>,
    compound: CompoundSelector,
) {
    if first.is_none() {
        *first = Some(compound);
    } else {
        rest.push((combinator.unwrap_or(Combinator::Descendant), compound));
    }
}
