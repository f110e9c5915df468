use crate::token::{Token, TokenKind};

/// Scanner configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Tab stop distance used for column tracking.
    pub tab_width: usize,
    /// Line number reported for the first character.
    pub start_line: usize,
    /// Column number reported for the first character.
    pub start_column: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            tab_width: 4,
            start_line: 1,
            start_column: 1,
        }
    }
}

/// One open structure: `(`, `[`, `{`, or the `${` of a template string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Paren,
    Bracket,
    Brace,
    Template,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Ready to scan the next token.
    Lexing,
    /// A candidate token reached the end of the buffer; waiting for
    /// more text or the end-of-input signal.
    Suspended,
    /// An `Error` token was reported; waiting for the discard flag.
    Halted,
    /// The buffer is exhausted after end-of-input.
    Finished,
}

/// Incremental JavaScript/TypeScript tokenizer.
///
/// Produces one token per [`next_token`](Self::next_token) call. When a
/// candidate token touches the end of the buffered text, the scan
/// suspends with a [`TokenKind::MoreInputNeeded`] token instead of
/// guessing; the caller answers with more text (the pending token is
/// rescanned from its start, so a longer match absorbs the appended
/// text) or with `None` to finalize it. This makes the token stream
/// independent of how the source was chunked.
///
/// [`Iterator`] is implemented as `next_token(None, false)`: the first
/// pull past the buffered text yields the suspension token, the next
/// one answers it with the end-of-input signal. Suspension tokens
/// therefore appear in the iterated stream; they render as empty text,
/// so concatenation still reconstructs the input.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    /// Buffered source text. Consumed text before a suspension point is
    /// dropped, so `pos` is always inside the pending tail.
    source: String,
    /// Byte offset of the next token.
    pos: usize,
    line: usize,
    column: usize,
    tab_width: usize,
    /// Open structures, innermost last.
    stack: Vec<Frame>,
    /// `/` starts a regular expression here; otherwise it is division.
    regexp_allowed: bool,
    /// End-of-input has been signalled; never suspend again.
    eof: bool,
    /// A shebang comment is only recognized before the first token.
    at_start: bool,
    state: State,
}

impl Tokenizer {
    /// Creates a tokenizer over an initial (possibly partial) buffer.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self::with_options(source, Options::default())
    }

    /// Creates a tokenizer with an explicit tab width and start
    /// position, for tokenizing an excerpt of a larger document.
    #[must_use]
    pub fn with_options(source: impl Into<String>, options: Options) -> Self {
        Self {
            source: source.into(),
            pos: 0,
            line: options.start_line,
            column: options.start_column,
            tab_width: options.tab_width.max(1),
            stack: Vec::new(),
            regexp_allowed: true,
            eof: false,
            at_start: true,
            state: State::Lexing,
        }
    }

    /// Current structure-nesting depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Scans the next token.
    ///
    /// `more` appends text to the buffer. While suspended it resumes
    /// the pending token; `None` instead signals that no more input is
    /// forthcoming, after which the signal is sticky and further `more`
    /// text is ignored. After an `Error` token the scan halts and
    /// returns `None` until a call passes `discard_error`, which skips
    /// past the reported text and continues.
    ///
    /// Returns `None` once the input is exhausted (and, while halted,
    /// until the error is discarded).
    pub fn next_token(&mut self, more: Option<&str>, discard_error: bool) -> Option<Token> {
        match self.state {
            State::Finished => return None,
            State::Halted => {
                if !discard_error {
                    return None;
                }
                self.state = State::Lexing;
            }
            State::Suspended => {
                match more {
                    Some(text) if !text.is_empty() => self.source.push_str(text),
                    _ => self.eof = true,
                }
                self.state = State::Lexing;
                return self.lex();
            }
            State::Lexing => {}
        }
        if !self.eof {
            if let Some(text) = more {
                self.source.push_str(text);
            }
        }
        self.lex()
    }

    fn lex(&mut self) -> Option<Token> {
        if self.pos >= self.source.len() {
            return self.finish();
        }
        let (scanned, end, touched_end) = self.scan_token();
        if (end == self.source.len() || touched_end) && !self.eof {
            // The decision depended on text that does not exist yet.
            let token = Token {
                text: self.source[self.pos..].to_string(),
                kind: TokenKind::MoreInputNeeded,
                line: self.line,
                column: self.column,
                depth: self.stack.len(),
            };
            self.source.drain(..self.pos);
            self.pos = 0;
            self.state = State::Suspended;
            return Some(token);
        }

        let text = self.source[self.pos..end].to_string();
        self.pos = end;
        let mut depth = self.stack.len();
        let kind = self.classify(scanned, &text, &mut depth);
        let token = Token {
            text,
            kind,
            line: self.line,
            column: self.column,
            depth,
        };
        self.at_start = false;
        self.advance_position(&token.text);
        if kind == TokenKind::Error {
            self.state = State::Halted;
        }
        Some(token)
    }

    /// Turns a raw scan result into a token kind, updating the
    /// structure stack and the regex-vs-division state. `depth` comes
    /// in as the pre-token stack depth; closers adjust it to the depth
    /// they return to.
    fn classify(&mut self, scanned: Scanned, text: &str, depth: &mut usize) -> TokenKind {
        match scanned {
            Scanned::Whitespace => TokenKind::Whitespace,
            Scanned::Comment => {
                if self.stack.last() == Some(&Frame::Template) {
                    TokenKind::Error
                } else {
                    TokenKind::Comment
                }
            }
            Scanned::UnterminatedComment | Scanned::Template(TemplateEnd::Cut) => TokenKind::Error,
            Scanned::Attribute => {
                self.regexp_allowed = true;
                TokenKind::Attribute
            }
            Scanned::Ident => {
                // `return /x/` and `yield /x/` take regexes; any other
                // identifier is a value, so `/` after it divides.
                self.regexp_allowed = text == "return" || text == "yield";
                TokenKind::Identifier
            }
            Scanned::Number => {
                self.regexp_allowed = false;
                TokenKind::Number
            }
            Scanned::Str => {
                if text.len() == 1 {
                    // A bare quote before a line break or at the final
                    // end of input.
                    TokenKind::Error
                } else {
                    self.regexp_allowed = false;
                    TokenKind::String
                }
            }
            Scanned::Template(TemplateEnd::Backtick) => {
                self.regexp_allowed = false;
                TokenKind::TemplateString
            }
            Scanned::Template(TemplateEnd::Interp) => {
                self.stack.push(Frame::Template);
                self.regexp_allowed = true;
                TokenKind::TemplateStringBegin
            }
            Scanned::Fragment(end) => self.classify_fragment(end, depth),
            Scanned::Regex => {
                self.regexp_allowed = false;
                TokenKind::RegExp
            }
            Scanned::SlashOp => {
                self.regexp_allowed = true;
                TokenKind::Other
            }
            Scanned::Open(frame) => {
                self.stack.push(frame);
                self.regexp_allowed = true;
                TokenKind::Other
            }
            Scanned::Close(expected) => {
                // `)` and `]` end an expression, so a slash after them
                // divides; after `}` a regex may start.
                self.regexp_allowed = expected == Frame::Brace;
                if self.stack.last() == Some(&expected) {
                    self.stack.pop();
                    *depth = self.stack.len();
                    TokenKind::Other
                } else {
                    // Mismatched closer: report it, keep the stack.
                    TokenKind::Error
                }
            }
            Scanned::Punct => {
                // `++`/`--` bind to an operand on either side and leave
                // the division question to their neighbor.
                if text != "++" && text != "--" {
                    self.regexp_allowed = true;
                }
                TokenKind::Other
            }
            Scanned::Invalid => {
                self.regexp_allowed = true;
                TokenKind::Error
            }
        }
    }

    /// A `}` reached while the innermost frame is a template.
    fn classify_fragment(&mut self, end: TemplateEnd, depth: &mut usize) -> TokenKind {
        match end {
            TemplateEnd::Backtick => {
                self.stack.pop();
                *depth = self.stack.len();
                self.regexp_allowed = false;
                TokenKind::TemplateStringEnd
            }
            TemplateEnd::Interp => {
                // The frame closes and reopens in one token.
                *depth = self.stack.len() - 1;
                self.regexp_allowed = true;
                TokenKind::TemplateStringMid
            }
            TemplateEnd::Cut => {
                self.stack.pop();
                *depth = self.stack.len();
                TokenKind::Error
            }
        }
    }

    fn finish(&mut self) -> Option<Token> {
        if !self.eof {
            // An empty buffer still needs the end-of-input signal.
            self.state = State::Suspended;
            return Some(Token {
                text: String::new(),
                kind: TokenKind::MoreInputNeeded,
                line: self.line,
                column: self.column,
                depth: self.stack.len(),
            });
        }
        self.state = State::Finished;
        if self.stack.is_empty() {
            None
        } else {
            Some(Token {
                text: String::new(),
                kind: TokenKind::Error,
                line: self.line,
                column: self.column,
                depth: self.stack.len(),
            })
        }
    }

    /// Scans one raw token at `self.pos`, returning its classification,
    /// its end offset, and whether the scan examined the end of the
    /// buffer. Named so it cannot be shadowed by the `Iterator::scan`
    /// adapter on `&mut Self`.
    fn scan_token(&self) -> (Scanned, usize, bool) {
        let mut cur = Cursor::new(&self.source, self.pos);
        let Some(c) = cur.peek() else {
            return (Scanned::Invalid, self.pos, true);
        };
        let scanned = match c {
            '(' => {
                cur.bump();
                Scanned::Open(Frame::Paren)
            }
            '[' => {
                cur.bump();
                Scanned::Open(Frame::Bracket)
            }
            '{' => {
                cur.bump();
                Scanned::Open(Frame::Brace)
            }
            ')' => {
                cur.bump();
                Scanned::Close(Frame::Paren)
            }
            ']' => {
                cur.bump();
                Scanned::Close(Frame::Bracket)
            }
            '}' if self.stack.last() == Some(&Frame::Template) => {
                Scanned::Fragment(scan_template(&mut cur))
            }
            '}' => {
                cur.bump();
                Scanned::Close(Frame::Brace)
            }
            '`' => Scanned::Template(scan_template(&mut cur)),
            '\'' | '"' => scan_string(&mut cur, c),
            '/' => self.scan_slash(&mut cur),
            '#' if self.at_start && cur.peek_second() == Some('!') => {
                cur.eat_while(|c| c != '\r' && c != '\n');
                Scanned::Comment
            }
            '@' | '#' if cur.peek_second().is_some_and(is_ident_start) => {
                cur.bump();
                scan_ident(&mut cur);
                if c == '@' {
                    Scanned::Attribute
                } else {
                    Scanned::Ident
                }
            }
            _ if c.is_whitespace() => {
                cur.eat_while(char::is_whitespace);
                Scanned::Whitespace
            }
            _ if is_ident_start(c) => {
                scan_ident(&mut cur);
                Scanned::Ident
            }
            _ if c.is_ascii_digit() => {
                scan_number(&mut cur);
                Scanned::Number
            }
            '.' if cur.peek_second().is_some_and(|c| c.is_ascii_digit()) => {
                scan_number(&mut cur);
                Scanned::Number
            }
            _ => scan_punct(&mut cur, c),
        };
        (scanned, cur.pos, cur.touched_end)
    }

    fn scan_slash(&self, cur: &mut Cursor<'_>) -> Scanned {
        cur.bump();
        match cur.peek() {
            Some('/') => {
                cur.eat_while(|c| c != '\r' && c != '\n');
                Scanned::Comment
            }
            Some('*') => {
                cur.bump();
                scan_block_comment(cur)
            }
            _ => {
                cur.eat('=');
                let op_end = cur.pos;
                if self.regexp_allowed && scan_regex_tail(cur) {
                    Scanned::Regex
                } else {
                    // Not a regex after all: just `/` or `/=`.
                    cur.pos = op_end;
                    Scanned::SlashOp
                }
            }
        }
    }

    /// Updates line and column past the emitted token text. `\r`,
    /// `\n` and `\r\n` each count as one line break; a tab advances to
    /// the next tab stop; any other character is one column.
    fn advance_position(&mut self, text: &str) {
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\r' => {
                    self.line += 1;
                    self.column = 1;
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                }
                '\n' => {
                    self.line += 1;
                    self.column = 1;
                }
                '\t' => {
                    self.column += self.tab_width - (self.column - 1) % self.tab_width;
                }
                _ => self.column += 1,
            }
        }
    }
}

impl Iterator for Tokenizer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token(None, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scanned {
    Whitespace,
    Comment,
    UnterminatedComment,
    Attribute,
    Ident,
    Number,
    /// String body ran to a closer, a line break, or the buffer end;
    /// the text length distinguishes a bare quote.
    Str,
    /// Backtick-opened template fragment.
    Template(TemplateEnd),
    /// `}`-opened template fragment (the top frame is a template).
    Fragment(TemplateEnd),
    Regex,
    /// `/` or `/=` as an operator.
    SlashOp,
    Open(Frame),
    Close(Frame),
    Punct,
    Invalid,
}

/// How a template fragment ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TemplateEnd {
    /// Closing backtick.
    Backtick,
    /// `${` interpolation opener.
    Interp,
    /// End of the buffer.
    Cut,
}

/// Byte cursor over the buffered source. `touched_end` records whether
/// any peek ran past the last character, which is exactly the condition
/// under which the scan result could change with more input.
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    touched_end: bool,
}

impl<'a> Cursor<'a> {
    const fn new(src: &'a str, pos: usize) -> Self {
        Self {
            src,
            pos,
            touched_end: false,
        }
    }

    fn peek(&mut self) -> Option<char> {
        let c = self.src[self.pos..].chars().next();
        if c.is_none() {
            self.touched_end = true;
        }
        c
    }

    fn peek_second(&mut self) -> Option<char> {
        let c = self.src[self.pos..].chars().nth(1);
        if c.is_none() {
            self.touched_end = true;
        }
        c
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        let mut count = 0;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
            count += 1;
        }
        count
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    is_ident_start(c) || c.is_numeric()
}

fn is_digit_or_sep(c: char) -> bool {
    c.is_ascii_digit() || c == '_'
}

/// Consumes an identifier: the start character is already validated.
fn scan_ident(cur: &mut Cursor<'_>) {
    cur.bump();
    cur.eat_while(is_ident_continue);
}

fn scan_number(cur: &mut Cursor<'_>) {
    if cur.eat('.') {
        cur.eat_while(is_digit_or_sep);
        scan_exponent(cur);
        return;
    }
    if cur.eat('0') {
        match cur.peek() {
            Some('x' | 'X') => scan_radix_digits(cur, |c| c.is_ascii_hexdigit() || c == '_'),
            Some('o' | 'O') => scan_radix_digits(cur, |c| ('0'..='7').contains(&c) || c == '_'),
            Some('b' | 'B') => scan_radix_digits(cur, |c| c == '0' || c == '1' || c == '_'),
            Some('.') => {
                cur.bump();
                cur.eat_while(is_digit_or_sep);
                scan_exponent(cur);
            }
            _ => {
                // Legacy octal form; 8 and 9 are accepted here and
                // resolved during value decoding.
                cur.eat_while(is_digit_or_sep);
                cur.eat('n');
            }
        }
        return;
    }
    cur.bump();
    cur.eat_while(is_digit_or_sep);
    if cur.eat('n') {
        return;
    }
    if cur.peek() == Some('.') {
        cur.bump();
        cur.eat_while(is_digit_or_sep);
    }
    scan_exponent(cur);
}

/// Radix prefix (`x`/`o`/`b`) and its digits. A prefix with no digits
/// only stands when the buffer ends right after it; mid-buffer the
/// number backtracks to the bare `0`.
fn scan_radix_digits(cur: &mut Cursor<'_>, digit: impl Fn(char) -> bool) {
    let mark = cur.pos;
    cur.bump();
    if cur.eat_while(digit) == 0 {
        if cur.peek().is_some() {
            cur.pos = mark;
        }
    } else {
        cur.eat('n');
    }
}

/// `e`/`E`, optional sign, at least one digit; otherwise no exponent.
fn scan_exponent(cur: &mut Cursor<'_>) {
    if !matches!(cur.peek(), Some('e' | 'E')) {
        return;
    }
    let mark = cur.pos;
    cur.bump();
    if !cur.eat('+') {
        cur.eat('-');
    }
    if cur.eat_while(|c| c.is_ascii_digit() || c == '_') == 0 {
        cur.pos = mark;
    }
}

/// String body after the opening quote. Stops past the closing quote,
/// before a line break, or at the buffer end; the caller sorts out
/// which of those makes a `String` and which an `Error`.
fn scan_string(cur: &mut Cursor<'_>, quote: char) -> Scanned {
    cur.bump();
    loop {
        match cur.peek() {
            None | Some('\r' | '\n') => return Scanned::Str,
            Some('\\') => {
                cur.bump();
                // An escaped `\r\n` pair is one line continuation.
                if cur.bump() == Some('\r') {
                    cur.eat('\n');
                }
            }
            Some(c) => {
                cur.bump();
                if c == quote {
                    return Scanned::Str;
                }
            }
        }
    }
}

/// Template fragment starting at a backtick or a reentering `}`.
fn scan_template(cur: &mut Cursor<'_>) -> TemplateEnd {
    cur.bump();
    loop {
        match cur.peek() {
            None => return TemplateEnd::Cut,
            Some('\\') => {
                cur.bump();
                cur.bump();
            }
            Some('`') => {
                cur.bump();
                return TemplateEnd::Backtick;
            }
            Some('$') => {
                cur.bump();
                if cur.eat('{') {
                    return TemplateEnd::Interp;
                }
            }
            Some(_) => {
                cur.bump();
            }
        }
    }
}

/// Block comment body after the opening `/*`.
fn scan_block_comment(cur: &mut Cursor<'_>) -> Scanned {
    loop {
        match cur.peek() {
            None => return Scanned::UnterminatedComment,
            Some('*') => {
                cur.bump();
                if cur.eat('/') {
                    return Scanned::Comment;
                }
            }
            Some(_) => {
                cur.bump();
            }
        }
    }
}

/// Forward scan for a regex literal after `/` or `/=`. Finds the
/// terminating unescaped `/` plus flags, tracking character classes and
/// group nesting; a line break, an unbalanced `)`, or the buffer end
/// abandons the attempt.
fn scan_regex_tail(cur: &mut Cursor<'_>) -> bool {
    let mut groups = 0u32;
    loop {
        match cur.peek() {
            None | Some('\r' | '\n') => return false,
            Some('/') => {
                cur.bump();
                cur.eat_while(|c| c.is_ascii_lowercase());
                return groups == 0;
            }
            Some('\\') => {
                cur.bump();
                cur.bump();
            }
            Some('(') => {
                groups += 1;
                cur.bump();
            }
            Some(')') => {
                if groups == 0 {
                    return false;
                }
                groups -= 1;
                cur.bump();
            }
            Some('[') => {
                cur.bump();
                loop {
                    match cur.peek() {
                        None | Some('\r' | '\n') => return false,
                        Some('\\') => {
                            cur.bump();
                            cur.bump();
                        }
                        Some(']') => {
                            cur.bump();
                            break;
                        }
                        Some(_) => {
                            cur.bump();
                        }
                    }
                }
            }
            Some(_) => {
                cur.bump();
            }
        }
    }
}

/// Operators and punctuation, longest match first, matching the
/// JavaScript operator set (`**=`, `>>>=`, `?.`, `!.`, `=>`, `...`,
/// compound assignments). Any other printable ASCII character is a
/// one-character token; everything else cannot start a token.
fn scan_punct(cur: &mut Cursor<'_>, c: char) -> Scanned {
    cur.bump();
    match c {
        '*' | '<' | '&' | '|' => {
            cur.eat(c);
            cur.eat('=');
        }
        '>' => {
            if cur.eat('>') {
                cur.eat('>');
            }
            cur.eat('=');
        }
        '?' => {
            if !cur.eat('.') {
                cur.eat('?');
                cur.eat('=');
            }
        }
        '!' => {
            if !cur.eat('.') && cur.eat('=') {
                cur.eat('=');
            }
        }
        '+' | '-' => {
            if !cur.eat('=') {
                cur.eat(c);
            }
        }
        '%' | '^' => {
            cur.eat('=');
        }
        '=' => {
            if !cur.eat('>') && cur.eat('=') {
                cur.eat('=');
            }
        }
        '.' => {
            if cur.peek() == Some('.') && cur.peek_second() == Some('.') {
                cur.bump();
                cur.bump();
            }
        }
        _ => {
            if u32::from(c) < 0x20 || u32::from(c) >= 0x7F {
                return Scanned::Invalid;
            }
        }
    }
    Scanned::Punct
}
