//! Property-based tests with proptest.
//!
//! Two stream-level guarantees are checked against arbitrary input:
//! concatenating the token texts reconstructs the input exactly, and
//! tokenizing the same input through any chunking produces the same
//! token stream as tokenizing it whole.

mod common;

use common::tokenize_chunked;
use jslex_rs::{TokenKind, tokenize};
use proptest::prelude::*;

/// Printable ASCII plus the line break and tab forms, which exercise
/// position tracking and every single-character token path.
fn ascii_source() -> impl Strategy<Value = String> {
    "[ -~\\t\\r\\n]{0,120}"
}

/// Source leaning on the tricky constructs: strings, templates,
/// regexes, numbers with lookahead, and multi-character operators.
fn lexical_source() -> impl Strategy<Value = String> {
    let fragment = prop_oneof![
        Just("'s'".to_string()),
        Just("\"d\\n\"".to_string()),
        Just("`t${1}u`".to_string()),
        Just("/r[/]/g".to_string()),
        Just("= /a(b)/i".to_string()),
        Just("0x2BE".to_string()),
        Just("1e5".to_string()),
        Just("1.".to_string()),
        Just(".5".to_string()),
        Just("9n".to_string()),
        Just("...".to_string()),
        Just(">>>=".to_string()),
        Just("?.".to_string()),
        Just("return".to_string()),
        Just("ident".to_string()),
        Just("// c\n".to_string()),
        Just("/* b */".to_string()),
        Just(" ".to_string()),
        Just("\n".to_string()),
    ];
    prop::collection::vec(fragment, 0..24).prop_map(|parts| parts.concat())
}

/// Balanced bracket structures with harmless filler between them.
fn balanced_source() -> impl Strategy<Value = String> {
    let leaf = "[a-z0-9 ]{0,6}".prop_map(|s| s);
    leaf.prop_recursive(5, 64, 3, |inner| {
        (
            inner.clone(),
            inner,
            prop_oneof![Just(('(', ')')), Just(('[', ']')), Just(('{', '}'))],
        )
            .prop_map(|(a, b, (open, close))| format!("{a}{open}{b}{close}"))
    })
}

proptest! {
    #[test]
    fn round_trip_reconstructs_arbitrary_input(input in ascii_source()) {
        let joined: String = tokenize(&input).iter().map(ToString::to_string).collect();
        prop_assert_eq!(joined, input);
    }

    #[test]
    fn round_trip_reconstructs_lexical_input(input in lexical_source()) {
        let joined: String = tokenize(&input).iter().map(ToString::to_string).collect();
        prop_assert_eq!(joined, input);
    }

    #[test]
    fn chunking_is_idempotent_on_arbitrary_input(
        input in ascii_source(),
        size in 1usize..8,
    ) {
        prop_assert_eq!(tokenize_chunked(&input, size), tokenize(&input));
    }

    #[test]
    fn chunking_is_idempotent_on_lexical_input(
        input in lexical_source(),
        size in 1usize..8,
    ) {
        prop_assert_eq!(tokenize_chunked(&input, size), tokenize(&input));
    }

    #[test]
    fn balanced_input_has_balanced_depths(input in balanced_source()) {
        let tokens = tokenize(&input);
        let mut depth = 0usize;
        for token in &tokens {
            prop_assert_ne!(token.kind, TokenKind::Error);
            match token.text.as_str() {
                "(" | "[" | "{" => {
                    prop_assert_eq!(token.depth, depth);
                    depth += 1;
                }
                ")" | "]" | "}" => {
                    depth -= 1;
                    prop_assert_eq!(token.depth, depth);
                }
                _ => prop_assert_eq!(token.depth, depth),
            }
        }
        prop_assert_eq!(depth, 0);
    }
}
