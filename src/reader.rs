use std::io::Read;

use crate::token::{Token, TokenKind};
use crate::tokenizer::{Options, Tokenizer};

/// Chunk size used when pulling from the underlying reader.
const CHUNK_SIZE: usize = 16 * 1024;

/// Byte encoding of the source being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
}

/// Error produced while pulling source bytes.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// The underlying reader failed.
    #[error("failed to read source: {0}")]
    Io(#[from] std::io::Error),
}

/// Streaming tokenizer over any [`Read`] source.
///
/// Pulls bytes in chunks, decodes them, and feeds the tokenizer's
/// resumption protocol, so [`TokenKind::MoreInputNeeded`] never reaches
/// the consumer: a token is only produced once enough bytes have been
/// read to settle it. `Error` tokens appear in the stream and are
/// discarded automatically, so tokenization continues past them.
/// Chunk cuts never split a character; undecodable
/// tail bytes (an incomplete UTF-8 sequence, an odd UTF-16 byte, an
/// unpaired high surrogate) are carried into the next chunk. A leading
/// byte-order mark is stripped and invalid sequences decode to U+FFFD.
///
/// ```no_run
/// use std::fs::File;
/// use jslex_rs::TokenReader;
///
/// # fn run() -> std::io::Result<()> {
/// let file = File::open("app.ts")?;
/// for token in TokenReader::new(file) {
///     let token = token.expect("read failure");
///     println!("{:?} {:?}", token.kind, token.text);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TokenReader<R> {
    reader: R,
    decoder: Decoder,
    tokenizer: Tokenizer,
    chunk: Vec<u8>,
    exhausted: bool,
    done: bool,
}

impl<R: Read> TokenReader<R> {
    /// Streams UTF-8 source from `reader`.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self::with_encoding(reader, Encoding::default())
    }

    /// Streams source in the given encoding.
    #[must_use]
    pub fn with_encoding(reader: R, encoding: Encoding) -> Self {
        Self::with_options(reader, encoding, Options::default())
    }

    /// Streams source with explicit tokenizer options.
    #[must_use]
    pub fn with_options(reader: R, encoding: Encoding, options: Options) -> Self {
        Self {
            reader,
            decoder: Decoder::new(encoding),
            tokenizer: Tokenizer::with_options(String::new(), options),
            chunk: vec![0; CHUNK_SIZE],
            exhausted: false,
            done: false,
        }
    }

    /// Drains the stream into a vector, stopping at the first read
    /// failure.
    pub fn into_tokens(self) -> Result<Vec<Token>, ReadError> {
        let mut tokens = Vec::new();
        for token in self {
            tokens.push(token?);
        }
        Ok(tokens)
    }

    /// Reads and decodes until some text is available. `None` means the
    /// reader is exhausted and the decoder has nothing left to flush.
    fn fill(&mut self) -> Result<Option<String>, ReadError> {
        if self.exhausted {
            return Ok(None);
        }
        loop {
            let n = match self.reader.read(&mut self.chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if n == 0 {
                self.exhausted = true;
                let tail = self.decoder.flush();
                return Ok(if tail.is_empty() { None } else { Some(tail) });
            }
            let text = self.decoder.decode(&self.chunk[..n]);
            // A chunk may decode to nothing when every byte was carried.
            if !text.is_empty() {
                return Ok(Some(text));
            }
        }
    }
}

impl<R: Read> Iterator for TokenReader<R> {
    type Item = Result<Token, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut more: Option<String> = None;
        loop {
            // Errors are surfaced as tokens and then discarded, so the
            // stream continues past them.
            match self.tokenizer.next_token(more.as_deref(), true) {
                None => {
                    self.done = true;
                    return None;
                }
                Some(token) if token.kind == TokenKind::MoreInputNeeded => match self.fill() {
                    Ok(text) => more = text,
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                },
                Some(token) => return Some(Ok(token)),
            }
        }
    }
}

/// Incremental text decoder with cross-chunk carry.
#[derive(Debug)]
struct Decoder {
    encoding: Encoding,
    /// Bytes held back from the previous chunk.
    carry: Vec<u8>,
    /// UTF-16 high surrogate held back in case its pair follows.
    pending_high: Option<u16>,
    at_start: bool,
}

impl Decoder {
    const fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            carry: Vec::new(),
            pending_high: None,
            at_start: true,
        }
    }

    fn decode(&mut self, chunk: &[u8]) -> String {
        let text = match self.encoding {
            Encoding::Utf8 => self.decode_utf8(chunk),
            Encoding::Utf16Le => self.decode_utf16(chunk, u16::from_le_bytes),
            Encoding::Utf16Be => self.decode_utf16(chunk, u16::from_be_bytes),
            Encoding::Latin1 => chunk.iter().map(|&b| char::from(b)).collect(),
        };
        self.strip_bom(text)
    }

    /// Flushes whatever is still held back once the byte stream ends.
    /// Leftover partial sequences become U+FFFD.
    fn flush(&mut self) -> String {
        let mut text = String::new();
        if let Some(high) = self.pending_high.take() {
            text.push_str(&String::from_utf16_lossy(&[high]));
        }
        if !self.carry.is_empty() {
            match self.encoding {
                Encoding::Utf8 => text.push_str(&String::from_utf8_lossy(&self.carry)),
                // An odd trailing byte cannot form a code unit.
                Encoding::Utf16Le | Encoding::Utf16Be => text.push('\u{FFFD}'),
                Encoding::Latin1 => {}
            }
            self.carry.clear();
        }
        self.strip_bom(text)
    }

    fn decode_utf8(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.carry);
        bytes.extend_from_slice(chunk);
        let cut = utf8_boundary(&bytes);
        self.carry = bytes[cut..].to_vec();
        String::from_utf8_lossy(&bytes[..cut]).into_owned()
    }

    fn decode_utf16(&mut self, chunk: &[u8], unit: impl Fn([u8; 2]) -> u16) -> String {
        let mut bytes = std::mem::take(&mut self.carry);
        bytes.extend_from_slice(chunk);
        let even = bytes.len() & !1;
        self.carry = bytes[even..].to_vec();

        let mut units: Vec<u16> = Vec::with_capacity(even / 2 + 1);
        if let Some(high) = self.pending_high.take() {
            units.push(high);
        }
        for pair in bytes[..even].chunks_exact(2) {
            units.push(unit([pair[0], pair[1]]));
        }
        // Hold back a trailing high surrogate; its low half may open
        // the next chunk.
        if let Some(&last) = units.last() {
            if (0xD800..0xDC00).contains(&last) {
                self.pending_high = Some(last);
                units.pop();
            }
        }
        String::from_utf16_lossy(&units)
    }

    fn strip_bom(&mut self, mut text: String) -> String {
        if !self.at_start || text.is_empty() {
            return text;
        }
        self.at_start = false;
        if text.starts_with('\u{FEFF}') {
            text.drain(..'\u{FEFF}'.len_utf8());
        }
        text
    }
}

/// Largest prefix length of `bytes` that does not split a UTF-8
/// sequence. At most three bytes are ever held back.
fn utf8_boundary(bytes: &[u8]) -> usize {
    let mut i = bytes.len();
    for _ in 0..4 {
        if i == 0 {
            return bytes.len();
        }
        let b = bytes[i - 1];
        if b & 0xC0 == 0x80 {
            // Continuation byte: keep looking for the lead.
            i -= 1;
            continue;
        }
        let len = if b < 0x80 {
            1
        } else if b & 0xE0 == 0xC0 {
            2
        } else if b & 0xF0 == 0xE0 {
            3
        } else if b & 0xF8 == 0xF0 {
            4
        } else {
            // Stray byte; let the lossy decode handle it.
            1
        };
        return if bytes.len() - (i - 1) < len {
            i - 1
        } else {
            bytes.len()
        };
    }
    // Four continuation bytes in a row cannot open a sequence.
    bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Reader that yields one byte per call, forcing every carry path.
    struct OneByte<'a>(&'a [u8]);

    impl Read for OneByte<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let Some((&first, rest)) = self.0.split_first() else {
                return Ok(0);
            };
            buf[0] = first;
            self.0 = rest;
            Ok(1)
        }
    }

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn utf8_stream() {
        let tokens = TokenReader::new(Cursor::new("let x = 1;"))
            .into_tokens()
            .unwrap();
        assert_eq!(texts(&tokens), ["let", " ", "x", " ", "=", " ", "1", ";"]);
        assert!(tokens.iter().all(|t| t.kind != TokenKind::MoreInputNeeded));
    }

    #[test]
    fn one_byte_chunks_match_whole_input() {
        let input = "const s = `a${1 + 2}b`; // fin\u{E9}\n";
        let whole = TokenReader::new(Cursor::new(input)).into_tokens().unwrap();
        let trickled = TokenReader::new(OneByte(input.as_bytes()))
            .into_tokens()
            .unwrap();
        assert_eq!(whole, trickled);
        let joined: String = whole.iter().map(ToString::to_string).collect();
        assert_eq!(joined, input);
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let tokens = TokenReader::new(Cursor::new("\u{FEFF}x"))
            .into_tokens()
            .unwrap();
        assert_eq!(texts(&tokens), ["x"]);
    }

    #[test]
    fn utf16le_stream() {
        let mut bytes = vec![0xFF, 0xFE]; // BOM
        for unit in "a = 1".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let tokens = TokenReader::with_encoding(OneByte(&bytes), Encoding::Utf16Le)
            .into_tokens()
            .unwrap();
        assert_eq!(texts(&tokens), ["a", " ", "=", " ", "1"]);
    }

    #[test]
    fn utf16be_astral_across_chunks() {
        let input = "'\u{1F600}'";
        let mut bytes = Vec::new();
        for unit in input.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        let tokens = TokenReader::with_encoding(OneByte(&bytes), Encoding::Utf16Be)
            .into_tokens()
            .unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, input);
    }

    #[test]
    fn latin1_stream() {
        let tokens = TokenReader::with_encoding(Cursor::new(&[0xE9u8, 0x3Bu8][..]), Encoding::Latin1)
            .into_tokens()
            .unwrap();
        assert_eq!(texts(&tokens), ["\u{E9}", ";"]);
    }

    #[test]
    fn truncated_utf8_tail_becomes_replacement() {
        // 0xC3 opens a two-byte sequence that never completes.
        let tokens = TokenReader::new(Cursor::new(&[b'x', 0xC3][..]))
            .into_tokens()
            .unwrap();
        assert_eq!(texts(&tokens), ["x", "\u{FFFD}"]);
        assert_eq!(tokens[1].kind, TokenKind::Error);
    }

    #[test]
    fn stream_error_token_surfaces() {
        let tokens = TokenReader::new(Cursor::new("`open")).into_tokens().unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens[0].text, "`open");
    }

    #[test]
    fn stream_continues_past_error() {
        let tokens = TokenReader::new(Cursor::new("(] x")).into_tokens().unwrap();
        assert_eq!(texts(&tokens), ["(", "]", " ", "x", ""]);
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(tokens[3].kind, TokenKind::Identifier);
        // The `(` never closes, reported once the stream ends.
        assert_eq!(tokens[4].kind, TokenKind::Error);
        assert_eq!(tokens[4].depth, 1);
    }

    #[test]
    fn io_failure_surfaces() {
        struct Failing;
        impl Read for Failing {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("boom"))
            }
        }
        let mut reader = TokenReader::new(Failing);
        let result = reader.next().unwrap();
        assert!(matches!(result, Err(ReadError::Io(_))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn empty_stream() {
        let tokens = TokenReader::new(Cursor::new("")).into_tokens().unwrap();
        assert!(tokens.is_empty());
    }
}
