//! Compiler
//!
//!     Builds a [`Pattern`] from grape source in two passes over the token stream.
//!
//! Lines
//!
//!     The first pass folds tokens into logical lines. Each line records its leading tab depth
//!     and its source line, and compiles into a [`PatternNode`]: the selector goes through
//!     `scraper::Selector::parse`, capture regexes through `regex::Regex::new`. A line without
//!     a selector contributes nothing. Blank and whitespace-only lines are dropped here, before
//!     they can affect nesting.
//!
//! Nesting
//!
//!     The second pass is a recursive descent over lines, driven by depth alone. A block owns
//!     every line at its own depth. A deeper line opens a nested block under the node appended
//!     just before it. A shallower line closes the block and is left in place for the
//!     enclosing block to pick up.
//!
//!         li.item (data-id ID)          <- depth 0, top-level rule
//!             a.title (title Name)      <- depth 1, child of li.item
//!             span.attribution          <- depth 1, sibling of a.title
//!                 a (href Author)       <- depth 2, child of span.attribution
//!         div.footer (text Footer)      <- depth 0, second top-level rule

use crate::error::{CompileError, CompileErrorKind, ScanErrorKind};
use crate::lexing::{Scanner, Token};
use crate::pattern::{Attribute, Capture, Pattern, PatternNode, Target};
use regex::Regex;
use scraper::Selector;
use std::iter::Peekable;
use std::vec::IntoIter;
use tracing::{debug, warn};

/// Compiles grape source into a pattern tree.
pub fn compile(source: &str) -> Result<Pattern, CompileError> {
    let lines = read_lines(Scanner::new(source))?;
    let mut lines = lines.into_iter().peekable();
    let mut rules = Vec::new();
    build_block(0, &mut lines, &mut rules)?;

    let pattern = Pattern::new(rules);
    debug!(
        rules = pattern.rules().len(),
        nodes = pattern.node_count(),
        "compiled pattern"
    );
    Ok(pattern)
}

/// A compiled line waiting to be placed in the tree.
struct Line {
    number: usize,
    depth: usize,
    node: PatternNode,
}

fn read_lines(mut scanner: Scanner<'_>) -> Result<Vec<Line>, CompileError> {
    let mut lines = Vec::new();
    let mut current = LineBuilder::default();
    loop {
        let token = scanner.scan()?;
        let line = scanner.line();
        let eof = token == Token::Eof;
        match token {
            Token::LineBreak | Token::Eof => {
                lines.extend(std::mem::take(&mut current).finish(line)?);
                if eof {
                    return Ok(lines);
                }
            }
            other => current.push(other, line)?,
        }
    }
}

fn build_block(
    depth: usize,
    lines: &mut Peekable<IntoIter<Line>>,
    siblings: &mut Vec<PatternNode>,
) -> Result<(), CompileError> {
    while let Some(next) = lines.peek() {
        if next.depth < depth {
            return Ok(());
        }
        if next.depth > depth {
            let (number, deeper) = (next.number, next.depth);
            let parent = siblings
                .last_mut()
                .ok_or_else(|| CompileError::new(number, CompileErrorKind::UnexpectedIndent))?;
            build_block(deeper, lines, &mut parent.children)?;
            continue;
        }
        if let Some(line) = lines.next() {
            siblings.push(line.node);
        }
    }
    Ok(())
}

/// Accumulates the tokens of one logical line.
#[derive(Default)]
struct LineBuilder {
    number: Option<usize>,
    depth: usize,
    selector: Option<(String, Selector)>,
    optional: bool,
    captures: Vec<Capture>,
    open: Option<CaptureBuilder>,
}

impl LineBuilder {
    fn push(&mut self, token: Token, line: usize) -> Result<(), CompileError> {
        let first = self.number.is_none();
        self.number.get_or_insert(line);
        let fail = |kind: CompileErrorKind| CompileError::new(line, kind);

        match token {
            // Only leading tabs count; a tab after the selector is plain whitespace
            Token::Indent(depth) => {
                if first {
                    self.depth = depth;
                }
            }
            Token::Selector(text) => {
                if self.selector.is_some() {
                    return Err(fail(CompileErrorKind::ExtraSelector(text)));
                }
                // scraper's Display for selector errors panics on some tokens; Debug is total
                let parsed = Selector::parse(&text).map_err(|err| format!("{:?}", err));
                let selector = match parsed {
                    Ok(selector) => selector,
                    Err(message) => {
                        return Err(fail(CompileErrorKind::Selector {
                            selector: text,
                            message,
                        }));
                    }
                };
                self.selector = Some((text, selector));
            }
            Token::QuestionMark => self.optional = true,
            Token::LeftBracket => {
                if self.open.is_some() {
                    return Err(fail(CompileErrorKind::NestedCapture));
                }
                self.open = Some(CaptureBuilder::default());
            }
            Token::RightBracket => {
                let capture = self
                    .open
                    .take()
                    .ok_or_else(|| fail(CompileErrorKind::UnmatchedBracket))?;
                self.captures.push(capture.finish().map_err(fail)?);
            }
            Token::Identifier(text) => {
                let capture = self
                    .open
                    .as_mut()
                    .ok_or_else(|| fail(CompileErrorKind::UnexpectedToken(format!("identifier `{}`", text))))?;
                capture.identifier(&text).map_err(fail)?;
            }
            Token::Regexp(source) => {
                let capture = self
                    .open
                    .as_mut()
                    .ok_or_else(|| fail(CompileErrorKind::UnexpectedToken("regular expression".to_string())))?;
                capture.regex(&source).map_err(fail)?;
            }
            Token::LineBreak | Token::Eof => {}
        }
        Ok(())
    }

    fn finish(self, line: usize) -> Result<Option<Line>, CompileError> {
        if self.open.is_some() {
            return Err(CompileError::new(line, ScanErrorKind::UnclosedCapture));
        }
        let number = self.number.unwrap_or(line);
        let Some((source, selector)) = self.selector else {
            if !self.captures.is_empty() {
                warn!(line = number, "ignoring captures on a line without a selector");
            }
            return Ok(None);
        };
        Ok(Some(Line {
            number,
            depth: self.depth,
            node: PatternNode::new(source, selector, self.optional, self.captures),
        }))
    }
}

/// Accumulates one `( ... )` capture.
#[derive(Default)]
struct CaptureBuilder {
    attr: Option<String>,
    regex: Option<Regex>,
    targets: Vec<Target>,
}

impl CaptureBuilder {
    /// The first identifier names the attribute; every later one is a target.
    fn identifier(&mut self, text: &str) -> Result<(), CompileErrorKind> {
        if self.attr.is_none() {
            self.attr = Some(text.to_lowercase());
            return Ok(());
        }
        self.targets.push(Target::parse(text)?);
        Ok(())
    }

    fn regex(&mut self, source: &str) -> Result<(), CompileErrorKind> {
        if self.attr.is_none() {
            return Err(CompileErrorKind::EmptyCapture);
        }
        if self.regex.is_some() {
            return Err(CompileErrorKind::DuplicateRegex);
        }
        self.regex = Some(Regex::new(source)?);
        Ok(())
    }

    fn finish(self) -> Result<Capture, CompileErrorKind> {
        let attr = self.attr.ok_or(CompileErrorKind::EmptyCapture)?;
        if self.targets.is_empty() {
            return Err(CompileErrorKind::NoTargets(attr));
        }
        if let Some(regex) = &self.regex {
            let groups = regex.captures_len() - 1;
            if groups < self.targets.len() {
                return Err(CompileErrorKind::MissingGroups {
                    groups,
                    targets: self.targets.len(),
                });
            }
        }
        Ok(Capture::new(Attribute::from_key(&attr), self.regex, self.targets))
    }
}
