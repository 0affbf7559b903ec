//! A hand-rolled lexer for the line-oriented netlist format.
//!
//! The format is deliberately flat: every statement fits on one line, so
//! newlines are significant and are produced as tokens. Comments start with
//! `#` or `;` and run to the end of the line. The controlled-source type
//! mnemonics `U(U)`, `U(I)`, `I(U)` and `I(I)` are lexed as single
//! identifier tokens so the parser sees device types uniformly.

use std::fmt;

use miden_diagnostics::{
    ByteIndex, Diagnostic, SourceId, SourceIndex, SourceSpan, ToDiagnostic,
};

#[cfg(test)]
mod tests;

/// The token type produced by the [Lexer].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A bare word: device type, device name, node name or keyword.
    Ident(String),
    /// A leading-dot directive, e.g. `.result` is `Directive("result")`.
    Directive(String),
    /// An opaque value annotation: everything following `=` up to the end
    /// of the line, trimmed.
    Value(String),
    /// A double-quoted string literal (without the quotes).
    Str(String),
    /// `/`, separating dependent and independent in a Bode result.
    Slash,
    /// End of line.
    Newline,
}
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Ident(s) => f.write_str(s),
            Self::Directive(s) => write!(f, ".{s}"),
            Self::Value(s) => write!(f, "= {s}"),
            Self::Str(s) => write!(f, "\"{s}\""),
            Self::Slash => f.write_str("/"),
            Self::Newline => f.write_str("end of line"),
        }
    }
}

/// Errors that may occur during tokenization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexicalError {
    #[error("invalid character '{found}'")]
    InvalidCharacter { span: SourceSpan, found: char },
    #[error("unterminated string literal")]
    UnterminatedString { span: SourceSpan },
}
impl LexicalError {
    pub fn span(&self) -> SourceSpan {
        match self {
            Self::InvalidCharacter { span, .. } => *span,
            Self::UnterminatedString { span } => *span,
        }
    }
}
impl ToDiagnostic for LexicalError {
    fn to_diagnostic(self) -> Diagnostic {
        Diagnostic::error().with_message(self.to_string())
    }
}

/// Characters permitted in identifiers. Leading digits are allowed so that
/// SPICE-style numeric node names lex as plain identifiers.
fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-' | '.')
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// The lexer: an iterator over spanned tokens.
pub struct Lexer<'a> {
    source_id: SourceId,
    src: &'a str,
    pos: usize,
}
impl<'a> Lexer<'a> {
    pub fn new(source_id: SourceId, src: &'a str) -> Self {
        Self { source_id, src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(offset)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn span(&self, start: usize, end: usize) -> SourceSpan {
        SourceSpan::new(
            SourceIndex::new(self.source_id, ByteIndex(start as u32)),
            SourceIndex::new(self.source_id, ByteIndex(end as u32)),
        )
    }

    fn skip_to_eol(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn lex_ident(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_ident_char(c) {
                self.bump();
            } else {
                break;
            }
        }
        let mut ident = self.src[start..self.pos].to_string();
        // Controlled-source mnemonics: U(U), U(I), I(U), I(I) lex as one
        // identifier when the parentheses follow without whitespace.
        if (ident == "U" || ident == "I")
            && self.peek() == Some('(')
            && matches!(self.peek_at(1), Some('U') | Some('I'))
            && self.peek_at(2) == Some(')')
        {
            self.bump();
            let inner = self.bump().unwrap();
            self.bump();
            ident.push('(');
            ident.push(inner);
            ident.push(')');
        }
        ident
    }

    fn lex_value(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '\n' || c == '#' || c == ';' {
                break;
            }
            self.bump();
        }
        self.src[start..self.pos].trim().to_string()
    }

    fn lex_string(&mut self, start: usize) -> Result<(SourceSpan, Token), LexicalError> {
        let content_start = self.pos;
        loop {
            match self.peek() {
                Some('"') => {
                    let content = self.src[content_start..self.pos].to_string();
                    self.bump();
                    return Ok((self.span(start, self.pos), Token::Str(content)));
                }
                Some('\n') | None => {
                    return Err(LexicalError::UnterminatedString {
                        span: self.span(start, self.pos),
                    });
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<(SourceSpan, Token), LexicalError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let start = self.pos;
            let c = self.peek()?;
            match c {
                '\n' => {
                    self.bump();
                    return Some(Ok((self.span(start, self.pos), Token::Newline)));
                }
                c if c.is_whitespace() => {
                    self.bump();
                }
                '#' | ';' => {
                    self.skip_to_eol();
                }
                '/' => {
                    self.bump();
                    return Some(Ok((self.span(start, self.pos), Token::Slash)));
                }
                '=' => {
                    self.bump();
                    let value = self.lex_value();
                    return Some(Ok((self.span(start, self.pos), Token::Value(value))));
                }
                '"' => {
                    self.bump();
                    return Some(self.lex_string(start));
                }
                '.' => {
                    self.bump();
                    if self.peek().is_some_and(is_ident_start) {
                        let name = self.lex_ident();
                        return Some(Ok((self.span(start, self.pos), Token::Directive(name))));
                    }
                    return Some(Err(LexicalError::InvalidCharacter {
                        span: self.span(start, self.pos),
                        found: '.',
                    }));
                }
                c if is_ident_start(c) => {
                    let ident = self.lex_ident();
                    return Some(Ok((self.span(start, self.pos), Token::Ident(ident))));
                }
                c => {
                    self.bump();
                    return Some(Err(LexicalError::InvalidCharacter {
                        span: self.span(start, self.pos),
                        found: c,
                    }));
                }
            }
        }
    }
}
