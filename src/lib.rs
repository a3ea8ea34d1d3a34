//! # grape
//!
//! An indentation-structured extraction language for pulling records out of HTML.
//!
//! A grape source is a tree of CSS selectors, one per line, nested with tabs. Each line may
//! carry captures that read an attribute, the text or the inner markup of the matched element,
//! optionally cut with a regex, and store the result into named record fields:
//!
//!     li.item (data-id ID)
//!         a.title (title Name.strip)
//!         ?span.price (text=/([0-9]+)/ Price)
//!
//! File Layout
//!
//!     src/lexing     Modal logos scanner: source text to tokens
//!     src/parsing    Compiler: tokens to a pattern tree
//!     src/pattern    The compiled tree shared by compiler and matcher
//!     src/matching   Matching engine: pattern tree plus document to records
//!     src/filters    Builtin and pattern-local value transforms
//!     src/record     Destination records and string coercion
//!     src/document   HTML documents, parsed by scraper
//!
//! Usage
//!
//!     let pattern = grape::compile(source)?;
//!     let document = grape::Document::parse(html);
//!     let mut items: Vec<Item> = Vec::new();
//!     pattern.find_all(&document, &mut items)?;
//!
//!     Record types implement [`Record`], usually through the [`record!`] macro.

pub mod document;
pub mod error;
pub mod filters;
pub mod lexing;
mod matching;
pub mod parsing;
pub mod pattern;
pub mod record;

pub use document::Document;
pub use error::{
    CompileError, CompileErrorKind, FieldError, FilterError, FindError, ScanErrorKind,
};
pub use filters::Filters;
pub use parsing::compile;
pub use pattern::{Attribute, Capture, Pattern, PatternNode, Target};
pub use record::{FieldValue, Record};
