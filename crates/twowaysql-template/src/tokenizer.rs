//! Directive-aware tokenizer for two-way SQL templates.
//!
//! SQL itself is opaque: the tokenizer only separates literal SQL text from
//! directive comments (`/*IF ...*/`, `/*pmb.x*/`, ...). Quoted SQL literals are
//! copied verbatim and never scanned for directives. Block comments that are not
//! directives (optimizer hints, prose) stay part of the literal text.
//!
//! Bind and embedded directives are followed by a *test value*: the literal the
//! directive comments out so that the template stays runnable in a SQL client.
//! The tokenizer measures and records it; the evaluator never emits it.

use crate::error::ParseError;

/// The literal SQL a bind or embedded directive stands in for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestValue {
    /// The raw test value text, possibly empty.
    pub text: String,
    /// The test value is (or its first list element is) a quoted string.
    pub quoted: bool,
    /// The test value is a parenthesized list: an in-clause context.
    pub in_scope: bool,
}

/// Token classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Literal SQL text, including non-directive comments.
    Sql(String),
    /// `/*pmb.path*/test`: bound variable.
    Bind {
        /// Expression path.
        expression: String,
        /// Trailing test value.
        test_value: TestValue,
    },
    /// `/*$pmb.path*/test`: embedded variable.
    Embedded {
        /// Expression path.
        expression: String,
        /// Trailing test value.
        test_value: TestValue,
    },
    /// `/*IF condition*/`
    If(String),
    /// `-- ELSE` line comment, with its raw text.
    Else(String),
    /// `/*BEGIN*/`
    Begin,
    /// `/*END*/`
    End,
    /// `/*FOR pmb.list*/`
    For(String),
    /// `/*NEXT 'connector'*/`, with the raw argument.
    Next(String),
    /// `/*FIRST*/`
    First,
    /// `/*LAST*/`
    Last,
}

/// A token and the byte offset where it starts in the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Classification and payload.
    pub kind: TokenKind,
    /// Byte offset in the source text.
    pub offset: usize,
}

/// Scanner over a template's bytes. Every cut happens at an ASCII delimiter,
/// so slicing the source by the recorded positions is always char-aligned.
struct Tokenizer<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    literal_start: usize,
    tokens: Vec<Token>,
}

impl<'a> Tokenizer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            literal_start: 0,
            tokens: Vec::new(),
        }
    }

    fn peek_at(&self, i: usize) -> Option<u8> {
        self.bytes.get(i).copied()
    }

    fn starts_with_at(&self, i: usize, pat: &[u8]) -> bool {
        self.bytes.get(i..i + pat.len()) == Some(pat)
    }

    fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\'' => self.pos = skip_quoted(self.bytes, self.pos),
                b'/' if self.peek_at(self.pos + 1) == Some(b'*') => self.read_block_comment()?,
                b'-' if self.peek_at(self.pos + 1) == Some(b'-') => self.read_line_comment(),
                _ => self.pos += 1,
            }
        }
        self.flush_literal(self.bytes.len());
        Ok(self.tokens)
    }

    fn flush_literal(&mut self, end: usize) {
        if end > self.literal_start {
            self.tokens.push(Token {
                kind: TokenKind::Sql(self.text[self.literal_start..end].to_owned()),
                offset: self.literal_start,
            });
        }
    }

    fn push_directive(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.flush_literal(start);
        self.tokens.push(Token {
            kind,
            offset: start,
        });
        self.pos = end;
        self.literal_start = end;
    }

    /// Offset of the `*/` closing the comment opened at `start`, tracking
    /// nesting depth. Quoted strings are skipped only when `skip_quotes` is
    /// set, so prose comments may contain apostrophes.
    fn comment_body_end(&self, start: usize, skip_quotes: bool) -> Option<usize> {
        let mut depth = 1;
        let mut i = start + 2;
        while i < self.bytes.len() {
            if self.starts_with_at(i, b"/*") {
                depth += 1;
                i += 2;
            } else if self.starts_with_at(i, b"*/") {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
                i += 2;
            } else if skip_quotes && self.bytes[i] == b'\'' && has_closing_quote(self.bytes, i) {
                i = skip_quoted(self.bytes, i);
            } else {
                i += 1;
            }
        }
        None
    }

    /// Read a `/* ... */` comment starting at `self.pos`. Only `IF` and
    /// `NEXT` bodies hold string literals, so only they are scanned
    /// quote-aware.
    fn read_block_comment(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        let body = &self.text[start + 2..];
        let skip_quotes = body.starts_with("IF ") || body.starts_with("NEXT ");
        let body_end = self
            .comment_body_end(start, skip_quotes)
            .ok_or(ParseError::UnclosedDirective { offset: start })?;
        let end = body_end + 2;
        let body = &self.text[start + 2..body_end];

        let Some(kind) = classify(body) else {
            // Plain comment: stays in the literal run.
            self.pos = end;
            return Ok(());
        };

        match kind {
            Directive::Bind(expression) => {
                let (test_value, after) = read_test_value(self.text, end)?;
                self.push_directive(
                    TokenKind::Bind {
                        expression,
                        test_value,
                    },
                    start,
                    after,
                );
            }
            Directive::Embedded(expression) => {
                let (test_value, after) = read_test_value(self.text, end)?;
                self.push_directive(
                    TokenKind::Embedded {
                        expression,
                        test_value,
                    },
                    start,
                    after,
                );
            }
            Directive::Other(kind) => self.push_directive(kind, start, end),
        }
        Ok(())
    }

    /// `-- ELSE` is a directive; any other line comment is literal SQL.
    fn read_line_comment(&mut self) {
        let start = self.pos;
        let line_end = self.text[start..]
            .find('\n')
            .map_or(self.bytes.len(), |n| start + n);
        let body = self.text[start + 2..line_end].trim();
        if body == "ELSE" {
            let raw = self.text[start..line_end].to_owned();
            self.push_directive(TokenKind::Else(raw), start, line_end);
        } else {
            self.pos = line_end;
        }
    }
}

enum Directive {
    Bind(String),
    Embedded(String),
    Other(TokenKind),
}

/// Classify a comment body, or `None` for an ordinary comment.
fn classify(body: &str) -> Option<Directive> {
    match body {
        "BEGIN" => return Some(Directive::Other(TokenKind::Begin)),
        "END" => return Some(Directive::Other(TokenKind::End)),
        "FIRST" => return Some(Directive::Other(TokenKind::First)),
        "LAST" => return Some(Directive::Other(TokenKind::Last)),
        // Keywords missing their argument; the parser reports them.
        "IF" => return Some(Directive::Other(TokenKind::If(String::new()))),
        "FOR" => return Some(Directive::Other(TokenKind::For(String::new()))),
        "NEXT" => return Some(Directive::Other(TokenKind::Next(String::new()))),
        _ => {}
    }
    if let Some(cond) = body.strip_prefix("IF ") {
        return Some(Directive::Other(TokenKind::If(cond.trim().to_owned())));
    }
    if let Some(path) = body.strip_prefix("FOR ") {
        return Some(Directive::Other(TokenKind::For(path.trim().to_owned())));
    }
    if let Some(arg) = body.strip_prefix("NEXT ") {
        return Some(Directive::Other(TokenKind::Next(arg.trim().to_owned())));
    }
    if let Some(path) = body.strip_prefix('$') {
        return is_path_like(path).then(|| Directive::Embedded(path.to_owned()));
    }
    is_path_like(body).then(|| Directive::Bind(body.to_owned()))
}

/// Identifier-ish payloads (`pmb.memberId`, `#current`) are variables;
/// anything with spaces or punctuation is prose.
fn is_path_like(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_' || first == '#')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '#'))
}

/// Measure the test value starting at `start`; returns it and the offset just
/// past it.
fn read_test_value(text: &str, start: usize) -> Result<(TestValue, usize), ParseError> {
    let bytes = text.as_bytes();
    let Some(&first) = bytes.get(start) else {
        return Ok((TestValue::default(), start));
    };
    let end = match first {
        b'\'' => skip_quoted(bytes, start),
        b'(' => skip_parenthesized(bytes, start)
            .ok_or(ParseError::UnbalancedTestValue { offset: start })?,
        _ => {
            let mut i = start;
            while i < bytes.len() {
                let b = bytes[i];
                if b.is_ascii_whitespace()
                    || matches!(b, b',' | b')' | b';')
                    || bytes[i..].starts_with(b"/*")
                    || bytes[i..].starts_with(b"--")
                {
                    break;
                }
                i += 1;
            }
            i
        }
    };
    let raw = &text[start..end];
    let in_scope = first == b'(';
    let quoted = if in_scope {
        raw[1..].trim_start().starts_with('\'')
    } else {
        first == b'\''
    };
    Ok((
        TestValue {
            text: raw.to_owned(),
            quoted,
            in_scope,
        },
        end,
    ))
}

/// Offset just past the quoted string opening at `start` (`''` is an escaped
/// quote). An unterminated string runs to end of input.
fn skip_quoted(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn has_closing_quote(bytes: &[u8], start: usize) -> bool {
    bytes[start + 1..].contains(&b'\'')
}

/// Offset just past the `)` matching the `(` at `start`, or `None` when a
/// comment opener or end of input comes first.
fn skip_parenthesized(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0_usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' => {
                i = skip_quoted(bytes, i);
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => return None,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Split a template into literal and directive tokens.
///
/// # Errors
///
/// Returns [`ParseError::UnclosedDirective`] if a block comment never closes,
/// or [`ParseError::UnbalancedTestValue`] if a list test value never closes.
pub fn tokenize(text: &str) -> Result<Vec<Token>, ParseError> {
    Tokenizer::new(text).tokenize()
}
