//! Scanner
//!
//!     Turns grape source into a flat stream of [`Token`]s. The heavy lifting is done by the two
//!     logos lexers in [tokens](tokens); this module owns the mode switch between them and the
//!     line bookkeeping used for error reporting.
//!
//! Modes
//!
//!     The scanner starts in line mode, where bare words are selectors. A `(` morphs the lexer
//!     into capture mode, where bare words are identifiers and `=/` opens a regex literal. A `)`
//!     morphs it back. Both lexers count consumed newlines in their extras, so the count
//!     survives every morph.
//!
//! Indentation
//!
//!     Indentation is only ever tabs. Spaces are skipped wherever they appear, including at the
//!     start of a line, so `"  \tdiv"` sits at depth one. A newline followed by spaces and
//!     further newlines is a single line break, which is how blank lines disappear before the
//!     compiler sees them.

pub mod tokens;

pub use tokens::Token;

use crate::error::{CompileError, ScanErrorKind};
use logos::{Lexer, Logos};
use tokens::{CaptureToken, LineToken};
use tracing::trace;

enum Mode<'s> {
    Line(Lexer<'s, LineToken>),
    Capture(Lexer<'s, CaptureToken>),
}

/// Modal scanner over grape source.
pub struct Scanner<'s> {
    mode: Option<Mode<'s>>,
    line: usize,
}

impl<'s> Scanner<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            mode: Some(Mode::Line(LineToken::lexer(source))),
            line: 1,
        }
    }

    /// 1-based line on which the most recently scanned token starts.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Scans the next token. After the end of input, or after an error, every call yields
    /// [`Token::Eof`].
    pub fn scan(&mut self) -> Result<Token, CompileError> {
        let (token, mode) = match self.mode.take() {
            None => return Ok(Token::Eof),
            Some(Mode::Line(lexer)) => self.scan_line(lexer)?,
            Some(Mode::Capture(lexer)) => self.scan_capture(lexer)?,
        };
        self.mode = mode;
        trace!(line = self.line, token = %token, "scanned token");
        Ok(token)
    }

    fn scan_line(
        &mut self,
        mut lexer: Lexer<'s, LineToken>,
    ) -> Result<(Token, Option<Mode<'s>>), CompileError> {
        self.line = lexer.extras + 1;
        let token = match lexer.next() {
            None => return Ok((Token::Eof, None)),
            Some(Err(kind)) => return Err(self.error(kind, lexer.slice())),
            Some(Ok(token)) => token,
        };
        let token = match token {
            LineToken::LeftBracket => {
                return Ok((Token::LeftBracket, Some(Mode::Capture(lexer.morph()))))
            }
            LineToken::Indent(depth) => Token::Indent(depth),
            LineToken::LineBreak => Token::LineBreak,
            LineToken::QuestionMark => Token::QuestionMark,
            LineToken::RightBracket => Token::RightBracket,
            LineToken::Selector(text) => Token::Selector(text),
        };
        Ok((token, Some(Mode::Line(lexer))))
    }

    fn scan_capture(
        &mut self,
        mut lexer: Lexer<'s, CaptureToken>,
    ) -> Result<(Token, Option<Mode<'s>>), CompileError> {
        self.line = lexer.extras + 1;
        let token = match lexer.next() {
            None => return Ok((Token::Eof, None)),
            Some(Err(ScanErrorKind::UnterminatedRegex)) => {
                // Reported where scanning stopped, not where the literal opened
                self.line = lexer.extras + 1;
                return Err(self.error(ScanErrorKind::UnterminatedRegex, lexer.slice()));
            }
            Some(Err(kind)) => return Err(self.error(kind, lexer.slice())),
            Some(Ok(token)) => token,
        };
        let token = match token {
            CaptureToken::RightBracket => {
                return Ok((Token::RightBracket, Some(Mode::Line(lexer.morph()))))
            }
            CaptureToken::QuestionMark => Token::QuestionMark,
            CaptureToken::LeftBracket => Token::LeftBracket,
            CaptureToken::Regexp(text) => Token::Regexp(text),
            CaptureToken::Identifier(text) => Token::Identifier(text),
        };
        Ok((token, Some(Mode::Capture(lexer))))
    }

    fn error(&self, kind: ScanErrorKind, slice: &str) -> CompileError {
        let kind = match kind {
            ScanErrorKind::Unexpected if slice.starts_with('=') => ScanErrorKind::ExpectedSlash,
            ScanErrorKind::Unexpected if slice.starts_with('\n') => ScanErrorKind::UnclosedCapture,
            other => other,
        };
        CompileError::new(self.line, kind)
    }
}

/// Scans a whole source, pairing each token with its line. The trailing [`Token::Eof`] is not
/// included.
pub fn tokenize(source: &str) -> Result<Vec<(Token, usize)>, CompileError> {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = scanner.scan()?;
        if token == Token::Eof {
            return Ok(tokens);
        }
        tokens.push((token, scanner.line()));
    }
}
