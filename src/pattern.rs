//! Pattern tree
//!
//! The compiled form of a grape source and the contract between the compiler and the
//! matching engine. A [`Pattern`] is the root: it holds no selector or captures, only the
//! top-level rules and the filters registered for this tree. Everything below it is a
//! [`PatternNode`].
//!
//! Trees are read-only once compiled. Filter registration needs `&mut Pattern`, so it can
//! never overlap a find call running over a shared tree.

use crate::error::{CompileError, CompileErrorKind, FilterError};
use crate::filters::Filters;
use regex::Regex;
use scraper::Selector;
use std::str::FromStr;

/// A compiled grape expression.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub(crate) rules: Vec<PatternNode>,
    pub(crate) filters: Filters,
}

impl Pattern {
    pub(crate) fn new(rules: Vec<PatternNode>) -> Self {
        Self {
            rules,
            filters: Filters::new(),
        }
    }

    /// Top-level rules, each matched independently against the whole document.
    pub fn rules(&self) -> &[PatternNode] {
        &self.rules
    }

    /// Filters scoped to this tree. Builtins are not included.
    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    /// Adds filters to this tree, replacing any local filter of the same name.
    pub fn register_filters(&mut self, filters: Filters) {
        tracing::debug!(count = filters.len(), "registering pattern filters");
        self.filters.extend(filters);
    }

    /// Adds one filter to this tree.
    pub fn register_filter<F>(&mut self, name: &str, filter: F) -> Result<&mut Self, FilterError>
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.filters.insert(name, filter)?;
        Ok(self)
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.register_filters(filters);
        self
    }

    /// Number of pattern nodes below the root.
    pub fn node_count(&self) -> usize {
        self.rules.iter().map(PatternNode::node_count).sum()
    }
}

impl FromStr for Pattern {
    type Err = CompileError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        crate::parsing::compile(source)
    }
}

/// One line of a pattern: a selector, its captures, and the lines nested under it.
#[derive(Debug, Clone)]
pub struct PatternNode {
    pub(crate) source: String,
    pub(crate) selector: Selector,
    pub(crate) optional: bool,
    pub(crate) captures: Vec<Capture>,
    pub(crate) children: Vec<PatternNode>,
}

impl PatternNode {
    pub(crate) fn new(
        source: String,
        selector: Selector,
        optional: bool,
        captures: Vec<Capture>,
    ) -> Self {
        Self {
            source,
            selector,
            optional,
            captures,
            children: Vec::new(),
        }
    }

    /// The selector text as written in the source.
    pub fn selector_text(&self) -> &str {
        &self.source
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn captures(&self) -> &[Capture] {
        &self.captures
    }

    pub fn children(&self) -> &[PatternNode] {
        &self.children
    }

    fn node_count(&self) -> usize {
        1 + self.children.iter().map(PatternNode::node_count).sum::<usize>()
    }
}

/// Where a capture reads its raw value from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    /// Concatenated text of the node's subtree.
    Text,
    /// Serialized markup of the node's children.
    Html,
    /// An attribute lookup by lower-cased key.
    Named(String),
}

impl Attribute {
    pub fn from_key(key: &str) -> Self {
        match key.to_lowercase().as_str() {
            "text" => Attribute::Text,
            "html" => Attribute::Html,
            other => Attribute::Named(other.to_string()),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Attribute::Text => "text",
            Attribute::Html => "html",
            Attribute::Named(key) => key,
        }
    }
}

/// One `( ... )` group of a line.
#[derive(Debug, Clone)]
pub struct Capture {
    pub(crate) attr: Attribute,
    pub(crate) regex: Option<Regex>,
    pub(crate) targets: Vec<Target>,
}

impl Capture {
    pub(crate) fn new(attr: Attribute, regex: Option<Regex>, targets: Vec<Target>) -> Self {
        Self {
            attr,
            regex,
            targets,
        }
    }

    pub fn attribute(&self) -> &Attribute {
        &self.attr
    }

    pub fn regex(&self) -> Option<&Regex> {
        self.regex.as_ref()
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }
}

/// A destination field and the filters its value passes through first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub(crate) field: String,
    pub(crate) filters: Vec<String>,
}

impl Target {
    /// Parses `Field.filter.filter`.
    pub fn parse(text: &str) -> Result<Self, CompileErrorKind> {
        let mut segments = text.split('.');
        let field = segments.next().unwrap_or_default();
        let filters: Vec<String> = segments.map(str::to_string).collect();
        if field.is_empty() || filters.iter().any(String::is_empty) {
            return Err(CompileErrorKind::EmptySegment(text.to_string()));
        }
        Ok(Self {
            field: field.to_string(),
            filters,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn filters(&self) -> &[String] {
        &self.filters
    }
}
