//! Token definitions for the grape language
//!
//! Scanning is modal. Outside brackets a bare run of characters is a
//! selector, handed verbatim to the selector compiler. Inside brackets the
//! same run is an identifier, additionally delimited by `(`, `)` and `=`.
//! Each mode is its own logos enum and the scanner morphs between them on
//! `(` and `)`. Both share a newline counter as lexer extras.

use crate::error::ScanErrorKind;
use logos::{Lexer, Logos};
use std::fmt;

/// Tokens produced by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A run of leading tabs, one depth level per tab.
    Indent(usize),
    QuestionMark,
    Identifier(String),
    Selector(String),
    /// The unescaped source of a `=/.../` literal.
    Regexp(String),
    LeftBracket,
    RightBracket,
    /// A newline, absorbing any blank lines that follow it.
    LineBreak,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Indent(depth) => write!(f, "<indent:{}>", depth),
            Token::QuestionMark => write!(f, "<question-mark>"),
            Token::Identifier(text) => write!(f, "<identifier:{}>", text),
            Token::Selector(text) => write!(f, "<selector:{}>", text),
            Token::Regexp(text) => write!(f, "<regexp:{}>", text),
            Token::LeftBracket => write!(f, "<left-bracket>"),
            Token::RightBracket => write!(f, "<right-bracket>"),
            Token::LineBreak => write!(f, "<line-break>"),
            Token::Eof => write!(f, "<eof>"),
        }
    }
}

/// Tokens recognised outside brackets.
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(extras = usize)]
#[logos(error = ScanErrorKind)]
#[logos(skip r"[ \r]+")]
pub(crate) enum LineToken {
    #[regex(r"\t+", |lex| lex.slice().len())]
    Indent(usize),

    #[regex(r"\n[ \r\n]*", |lex| lex.extras += newlines(lex.slice()))]
    LineBreak,

    #[token("?")]
    QuestionMark,

    #[token("(")]
    LeftBracket,

    #[token(")")]
    RightBracket,

    #[regex(r"[^ \t\r\n()?][^ \t\r\n]*", |lex| lex.slice().to_owned())]
    Selector(String),
}

/// Tokens recognised between `(` and `)`.
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(extras = usize)]
#[logos(error = ScanErrorKind)]
#[logos(skip r"[ \t\r]+")]
pub(crate) enum CaptureToken {
    #[token("?")]
    QuestionMark,

    #[token("(")]
    LeftBracket,

    #[token(")")]
    RightBracket,

    #[token("=/", regex_literal)]
    Regexp(String),

    #[regex(r"[^ \t\r\n()=?][^ \t\r\n()=]*", |lex| lex.slice().to_owned())]
    Identifier(String),
}

fn newlines(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count()
}

/// Consumes a regex literal body up to the first unescaped `/`.
///
/// `\/`, `\\`, `\n` and `\t` are unescaped. Any other escape is kept as a
/// backslash followed by the character, so it still reads as a regex escape.
fn regex_literal(lex: &mut Lexer<'_, CaptureToken>) -> Result<String, ScanErrorKind> {
    let rest = lex.remainder();
    let mut text = String::new();
    let mut escaped = false;
    let mut end = None;

    for (i, c) in rest.char_indices() {
        if escaped {
            match c {
                '/' => text.push('/'),
                '\\' => text.push('\\'),
                'n' => text.push('\n'),
                't' => text.push('\t'),
                other => {
                    text.push('\\');
                    text.push(other);
                }
            }
            escaped = false;
            continue;
        }
        match c {
            '/' => {
                end = Some(i + 1);
                break;
            }
            '\\' => escaped = true,
            other => text.push(other),
        }
    }

    let consumed = end.unwrap_or(rest.len());
    lex.extras += newlines(&rest[..consumed]);
    lex.bump(consumed);
    match end {
        Some(_) => Ok(text),
        None => Err(ScanErrorKind::UnterminatedRegex),
    }
}
