//! Stylesheet tokenization for the styles inliner.
//!
//! A stylesheet is split on braces into one [`StyleToken`] per top-level
//! rule. Rule bodies nested inside another rule (the contents of `@media`,
//! `@supports` and friends) are kept verbatim as brace-carrying property
//! strings on the owning token so they can be written back out unchanged.

mod token;
mod tokenizer;

pub use token::StyleToken;
pub use tokenizer::{normalize, tokenize, tokenize_with};
