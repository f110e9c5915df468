use std::fmt;

use num_bigint::BigInt;

/// Token kinds produced by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A run of whitespace characters. Two `Whitespace` tokens never
    /// appear in sequence.
    Whitespace,
    /// Line comment (`// ...`), block comment (`/* ... */`), or a
    /// shebang line (`#! ...`) at the very start of the input.
    Comment,
    /// Decorator-style attribute (`@name`).
    Attribute,
    /// Identifier, including private names (`#name`). May contain
    /// Unicode letters.
    Identifier,
    /// Numeric literal, including bigint (`1n`) and prefixed
    /// (`0x`/`0o`/`0b`) forms.
    Number,
    /// Single- or double-quoted string.
    String,
    /// Whole backtick string without `${}` interpolations.
    TemplateString,
    /// First fragment of an interpolated backtick string, up to and
    /// including the first `${`.
    TemplateStringBegin,
    /// Fragment between two interpolations (`}...${`).
    TemplateStringMid,
    /// Last fragment of an interpolated backtick string (`` }...` ``).
    TemplateStringEnd,
    /// Regular expression literal.
    RegExp,
    /// Operator or punctuation (`+`, `?.`, `=>`, brackets, ...).
    Other,
    /// Suspension marker: the token matched so far touches the end of
    /// the buffer. Resume with more text, or signal end-of-input to
    /// finalize it.
    MoreInputNeeded,
    /// Invalid character, unbalanced bracket, unterminated template
    /// string, or a comment inside a template interpolation.
    Error,
}

/// A single token with its kind, exact source text, and position.
///
/// `line` and `column` are 1-based and refer to the token's first
/// character. `depth` is the structure-nesting depth at the token's
/// start: `(`, `[`, `{` and `${` each open one level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
    pub depth: usize,
}

/// Decoded numeric value of a [`TokenKind::Number`] token.
#[derive(Debug, Clone, PartialEq)]
pub enum NumberValue {
    /// Regular numeric literal.
    Number(f64),
    /// Bigint literal (`n` suffix).
    BigInt(BigInt),
}

/// Source and flags of a [`TokenKind::RegExp`] token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegExpLiteral {
    pub source: String,
    pub flags: String,
}

impl fmt::Display for Token {
    /// Writes the original token text, except for
    /// [`TokenKind::MoreInputNeeded`], which writes nothing. Thanks to
    /// that exception, concatenating a complete token stream
    /// reconstructs the tokenized input exactly.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind == TokenKind::MoreInputNeeded {
            Ok(())
        } else {
            f.write_str(&self.text)
        }
    }
}

impl Token {
    /// Decodes the semantic value carried by the token text.
    ///
    /// For comments, the text after `//` or `#!`, or between `/*` and
    /// `*/`. For strings and template fragments, the unescaped string
    /// value with the delimiters removed. For `MoreInputNeeded`, an
    /// empty string. For every other kind, the raw token text.
    #[must_use]
    pub fn value(&self) -> String {
        match self.kind {
            TokenKind::Comment => comment_body(&self.text).to_string(),
            TokenKind::String => decode_string(&self.text, string_closer(&self.text), false),
            TokenKind::TemplateString | TokenKind::TemplateStringEnd => {
                decode_string(&self.text, '`', false)
            }
            TokenKind::TemplateStringBegin | TokenKind::TemplateStringMid => {
                decode_string(&self.text, '`', true)
            }
            TokenKind::MoreInputNeeded => String::new(),
            _ => self.text.clone(),
        }
    }

    /// Decodes a [`TokenKind::Number`] token.
    ///
    /// `_` separators are stripped; `0x`/`0o`/`0b` prefixes and the
    /// legacy-octal rule (leading `0`, digits, none of them `8`/`9`)
    /// are applied. Returns `None` for other token kinds and for
    /// bigint literals without digits; malformed non-bigint literals
    /// decode to NaN.
    #[must_use]
    pub fn number_value(&self) -> Option<NumberValue> {
        if self.kind != TokenKind::Number {
            return None;
        }
        let text = if self.text.contains('_') {
            self.text.replace('_', "")
        } else {
            self.text.clone()
        };
        if let Some(digits) = text.strip_suffix('n') {
            let (digits, radix) = split_radix_prefix(digits);
            return BigInt::parse_bytes(digits.as_bytes(), radix).map(NumberValue::BigInt);
        }
        let (digits, radix) = split_radix_prefix(&text);
        if radix != 10 {
            return Some(NumberValue::Number(fold_radix(digits, radix)));
        }
        if is_legacy_octal(&text) {
            return Some(NumberValue::Number(fold_radix(&text[1..], 8)));
        }
        Some(NumberValue::Number(
            text.parse::<f64>().unwrap_or(f64::NAN),
        ))
    }

    /// Splits a [`TokenKind::RegExp`] token into its source and flags
    /// at the last `/`. Returns `None` for other token kinds.
    #[must_use]
    pub fn regexp_value(&self) -> Option<RegExpLiteral> {
        if self.kind != TokenKind::RegExp {
            return None;
        }
        let pos = self.text.rfind('/')?;
        Some(RegExpLiteral {
            source: self.text[1..pos].to_string(),
            flags: self.text[pos + 1..].to_string(),
        })
    }
}

fn comment_body(text: &str) -> &str {
    if let Some(body) = text.strip_prefix("/*") {
        body.strip_suffix("*/").unwrap_or(body)
    } else if text.len() >= 2 {
        // `//` or `#!`
        &text[2..]
    } else {
        text
    }
}

fn string_closer(text: &str) -> char {
    text.chars().next().unwrap_or('"')
}

/// Splits an `0x`/`0o`/`0b` prefix off a numeric literal, returning
/// the remaining digits and the radix.
fn split_radix_prefix(text: &str) -> (&str, u32) {
    let mut chars = text.chars();
    if chars.next() == Some('0') {
        match chars.next() {
            Some('x' | 'X') => return (&text[2..], 16),
            Some('o' | 'O') => return (&text[2..], 8),
            Some('b' | 'B') => return (&text[2..], 2),
            _ => {}
        }
    }
    (text, 10)
}

/// Leading `0` followed by digits, none of them `8` or `9`.
fn is_legacy_octal(text: &str) -> bool {
    text.len() > 1 && text.starts_with('0') && text[1..].chars().all(|c| ('0'..='7').contains(&c))
}

/// Folds digits in the given radix into an `f64`, so that oversized
/// literals lose precision instead of overflowing. An empty digit run
/// (a bare prefix like `0x`) is NaN.
fn fold_radix(digits: &str, radix: u32) -> f64 {
    if digits.is_empty() {
        return f64::NAN;
    }
    let mut value = 0.0f64;
    for c in digits.chars() {
        let Some(d) = c.to_digit(radix) else {
            return f64::NAN;
        };
        value = value * f64::from(radix) + f64::from(d);
    }
    value
}

/// Unescapes a string or template-fragment body.
///
/// The first character is the opening delimiter (quote, backtick, or
/// the `}` that reenters a template). Decoding stops at the first
/// unescaped `closer`, at `${` when `stop_at_interp` is set, or at the
/// end of the text (unterminated strings keep their content).
///
/// Escapes are decoded through a UTF-16 buffer, so adjacent surrogate
/// escapes (a `\u` high surrogate followed by a `\u` low surrogate)
/// combine into one astral character.
fn decode_string(text: &str, closer: char, stop_at_interp: bool) -> String {
    if text.len() < 2 {
        return String::new();
    }
    let body = &text[1..];
    if !body.contains('\\') {
        let end = body
            .char_indices()
            .find(|&(i, c)| {
                c == closer || (stop_at_interp && c == '$' && body[i + 1..].starts_with('{'))
            })
            .map_or(body.len(), |(i, _)| i);
        return body[..end].to_string();
    }

    let mut units: Vec<u16> = Vec::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == closer {
            break;
        }
        if stop_at_interp && c == '$' && chars.peek() == Some(&'{') {
            break;
        }
        if c != '\\' {
            push_char(&mut units, c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            break;
        };
        match escaped {
            // Line continuation: backslash plus line break vanishes.
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\n' => {}
            'r' => units.push(u16::from(b'\r')),
            'n' => units.push(u16::from(b'\n')),
            't' => units.push(u16::from(b'\t')),
            'v' => units.push(0x0B),
            'b' => units.push(0x08),
            'f' => units.push(0x0C),
            'x' => push_fixed_hex(&mut units, &mut chars, 'x', 2),
            'u' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    let mut code: u32 = 0;
                    while let Some(&c) = chars.peek() {
                        if c == '}' {
                            chars.next();
                            break;
                        }
                        let Some(d) = c.to_digit(16) else {
                            break;
                        };
                        chars.next();
                        code = (code << 4) | d;
                    }
                    push_code_point(&mut units, code);
                } else {
                    push_fixed_hex(&mut units, &mut chars, 'u', 4);
                }
            }
            '0'..='7' => {
                let mut code = u32::from(escaped) - u32::from(b'0');
                for _ in 0..2 {
                    let Some(d) = chars.peek().and_then(|c| c.to_digit(8)) else {
                        break;
                    };
                    chars.next();
                    code = (code << 3) | d;
                }
                push_code_point(&mut units, code);
            }
            other => push_char(&mut units, other),
        }
    }
    String::from_utf16_lossy(&units)
}

fn push_char(units: &mut Vec<u16>, c: char) {
    let mut buf = [0u16; 2];
    units.extend_from_slice(c.encode_utf16(&mut buf));
}

/// `\u{...}` and octal escapes may name any code point, including
/// halves of a surrogate pair; astral code points are split so the
/// final UTF-16 decode reassembles them.
fn push_code_point(units: &mut Vec<u16>, code: u32) {
    if code > 0x10_FFFF {
        units.push(0xFFFD);
    } else if code >= 0x10000 {
        let c = code - 0x10000;
        units.push(0xD800 | u16::try_from((c >> 10) & 0x3FF).unwrap_or(0));
        units.push(0xDC00 | u16::try_from(c & 0x3FF).unwrap_or(0));
    } else {
        units.push(u16::try_from(code).unwrap_or(0xFFFD));
    }
}

/// Reads exactly `count` hex digits after a `\x`/`\u` introducer. A
/// malformed escape keeps the consumed characters literally.
fn push_fixed_hex(
    units: &mut Vec<u16>,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    introducer: char,
    count: usize,
) {
    let mut code: u32 = 0;
    let mut taken = Vec::with_capacity(count);
    for _ in 0..count {
        let Some(d) = chars.peek().and_then(|c| c.to_digit(16)) else {
            break;
        };
        let Some(c) = chars.next() else {
            break;
        };
        taken.push(c);
        code = (code << 4) | d;
    }
    if taken.len() == count {
        push_code_point(units, code);
    } else {
        push_char(units, introducer);
        for c in taken {
            push_char(units, c);
        }
    }
}
