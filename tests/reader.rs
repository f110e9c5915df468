use std::io::Cursor;

use jslex_rs::{Encoding, Options, TokenKind, TokenReader, tokenize};

/// Several 16 KiB chunks worth of source must tokenize exactly like
/// the whole string.
#[test]
fn large_stream_matches_whole_string() {
    let mut source = String::new();
    for i in 0..2000 {
        source.push_str(&format!("const v{i} = `n=${{{i}}}`; // {i}\n"));
    }
    let streamed = TokenReader::new(Cursor::new(source.clone()))
        .into_tokens()
        .expect("stream");
    assert_eq!(streamed, tokenize(&source));
}

#[test]
fn utf16le_with_bom() {
    let source = "let greet = '\u{1F44B} world';\n";
    let mut bytes = vec![0xFF, 0xFE];
    for unit in source.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    let tokens = TokenReader::with_encoding(Cursor::new(bytes), Encoding::Utf16Le)
        .into_tokens()
        .expect("stream");
    assert_eq!(tokens, tokenize(source));
}

#[test]
fn utf16be_without_bom() {
    let source = "a + b";
    let mut bytes = Vec::new();
    for unit in source.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    let tokens = TokenReader::with_encoding(Cursor::new(bytes), Encoding::Utf16Be)
        .into_tokens()
        .expect("stream");
    assert_eq!(tokens, tokenize(source));
}

#[test]
fn latin1_bytes() {
    // "café / 2" in ISO-8859-1.
    let bytes: &[u8] = &[b'c', b'a', b'f', 0xE9, b' ', b'/', b' ', b'2'];
    let tokens = TokenReader::with_encoding(Cursor::new(bytes), Encoding::Latin1)
        .into_tokens()
        .expect("stream");
    assert_eq!(tokens, tokenize("caf\u{E9} / 2"));
    assert_eq!(tokens[0].text, "caf\u{E9}");
    assert_eq!(tokens[2].kind, TokenKind::Other);
}

#[test]
fn reader_honors_options() {
    let options = Options {
        tab_width: 8,
        start_line: 100,
        start_column: 1,
    };
    let tokens = TokenReader::with_options(Cursor::new("\tx"), Encoding::Utf8, options)
        .into_tokens()
        .expect("stream");
    assert_eq!((tokens[1].line, tokens[1].column), (100, 9));
}

#[test]
fn stream_reconstructs_input() {
    let source = "function f() { return /x/.test('y'); }\n";
    let joined: String = TokenReader::new(Cursor::new(source))
        .into_tokens()
        .expect("stream")
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(joined, source);
}
