//! Incremental JavaScript/TypeScript tokenizer.
//!
//! Splits source text into lexical tokens (identifiers, numbers,
//! strings, template fragments, regular expressions, comments,
//! operators) without building a syntax tree. The tokenizer is
//! resumable: it can be fed the source in arbitrary chunks and
//! suspends instead of guessing whenever a token could extend past the
//! text seen so far. Every token carries its exact source text, a
//! 1-based line and column, and the structure-nesting depth at which
//! it appeared.
//!
//! # Quick start
//!
//! ## Tokenize a complete string
//!
//! ```
//! use jslex_rs::{TokenKind, tokenize};
//!
//! let tokens = tokenize("let x = 1 / 2;");
//! let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
//! assert_eq!(
//!     texts,
//!     ["let", " ", "x", " ", "=", " ", "1", " ", "/", " ", "2", ";"]
//! );
//! // After a number, `/` is division, not the start of a regex.
//! assert_eq!(tokens[8].kind, TokenKind::Other);
//! ```
//!
//! ## Feed source in chunks
//!
//! ```
//! use jslex_rs::{TokenKind, Tokenizer};
//!
//! let mut tokenizer = Tokenizer::new("hel");
//! let pending = tokenizer.next_token(None, false).unwrap();
//! assert_eq!(pending.kind, TokenKind::MoreInputNeeded);
//!
//! // Still suspended: "hello" touches the new end as well.
//! let pending = tokenizer.next_token(Some("lo"), false).unwrap();
//! assert_eq!(pending.kind, TokenKind::MoreInputNeeded);
//!
//! // No more input: the pending token settles.
//! let token = tokenizer.next_token(None, false).unwrap();
//! assert_eq!(token.text, "hello");
//! assert_eq!(token.kind, TokenKind::Identifier);
//! ```
//!
//! To tokenize from a file or socket without loading it whole, wrap it
//! in a [`TokenReader`], which drives the suspension protocol
//! internally.

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod reader;
pub mod token;
pub mod tokenizer;

pub use reader::{Encoding, ReadError, TokenReader};
pub use token::{NumberValue, RegExpLiteral, Token, TokenKind};
pub use tokenizer::{Options, Tokenizer};

/// Tokenizes a complete source string.
///
/// Suspension tokens are elided and error tokens are discarded and
/// skipped, so the returned stream always covers the whole input and
/// concatenating the token texts reconstructs it.
#[must_use]
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokenizer = Tokenizer::new(input);
    let mut tokens = Vec::new();
    while let Some(token) = tokenizer.next_token(None, true) {
        if token.kind != TokenKind::MoreInputNeeded {
            tokens.push(token);
        }
    }
    tokens
}
