#![allow(dead_code)]

use jslex_rs::{Token, TokenKind, Tokenizer, tokenize};

pub fn texts(tokens: &[Token]) -> Vec<&str> {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

pub fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
    tokens.iter().map(|t| t.kind).collect()
}

/// Tokenizes `input` fed in chunks of `size` characters. The result
/// must match [`tokenize`] on the whole string no matter where the
/// cuts fall.
pub fn tokenize_chunked(input: &str, size: usize) -> Vec<Token> {
    let mut pieces = Vec::new();
    let mut rest = input;
    while !rest.is_empty() {
        let cut = rest
            .char_indices()
            .nth(size)
            .map_or(rest.len(), |(i, _)| i);
        pieces.push(&rest[..cut]);
        rest = &rest[cut..];
    }
    tokenize_pieces(&pieces)
}

/// Drives the resumption protocol over pre-cut pieces, answering each
/// suspension with the next piece (or the end-of-input signal), and
/// discarding errors like [`tokenize`] does.
pub fn tokenize_pieces(pieces: &[&str]) -> Vec<Token> {
    let mut queue = pieces.iter();
    let mut tokenizer = Tokenizer::new(*queue.next().unwrap_or(&""));
    let mut tokens = Vec::new();
    let mut more: Option<&str> = None;
    while let Some(token) = tokenizer.next_token(more.take(), true) {
        if token.kind == TokenKind::MoreInputNeeded {
            more = queue.next().copied();
        } else {
            tokens.push(token);
        }
    }
    tokens
}

/// Asserts that chunked tokenization agrees with whole-string
/// tokenization for every chunk size in `1..=max_size`.
pub fn assert_chunking_idempotent(input: &str, max_size: usize) {
    let whole = tokenize(input);
    for size in 1..=max_size {
        assert_eq!(
            tokenize_chunked(input, size),
            whole,
            "chunk size {size} diverged on {input:?}"
        );
    }
}
