//! Matching engine
//!
//!     Walks a document under the guidance of a compiled [`Pattern`] and fills records with
//!     what it captures.
//!
//! Search
//!
//!     A pattern node is searched for in the whole subtree below its context, not just among
//!     the context's children. For every child of the context, in document order, the engine
//!     first searches that child's own subtree and only then tests the child itself. A nested
//!     `div.item` inside another `div.item` is therefore found before its ancestor.
//!
//!     Top-level rules use the document as their context. Child rules use the element their
//!     parent matched.
//!
//! Candidates
//!
//!     An element that satisfies the selector is a candidate. It is accepted only if every
//!     capture resolves and every required child rule matches somewhere below it. A missing
//!     attribute, a regex miss or a required child with no match turns it back into a
//!     non-match, and the search moves on. Unknown filters and failed field assignments are
//!     hard errors and abort the call. Targets naming a field the record does not declare are
//!     caught before the document is touched.
//!
//! Destinations
//!
//!     With a list destination each accepted candidate gets a fresh record, pushed once the
//!     candidate is accepted. The list only reaches the caller if the whole call succeeds. With a single record every candidate writes into the same
//!     record, so later matches overwrite earlier ones, and a rejected candidate may already
//!     have written some fields.

mod sink;

use crate::document::{child_elements, text_content, Document};
use crate::error::{FieldError, FindError};
use crate::pattern::{Attribute, Capture, Pattern, PatternNode, Target};
use crate::record::Record;
use scraper::ElementRef;
use sink::Sink;
use tracing::{debug, trace};

/// Outcome of searching for one pattern node below a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Matched,
    NoMatch,
}

impl Pattern {
    /// Extracts into a single record. Repeated matches overwrite fields.
    pub fn find<R: Record>(&self, document: &Document, record: &mut R) -> Result<(), FindError> {
        self.run(document, Sink::Record(record))
    }

    /// Extracts one record per match of each top-level rule, appended in match order.
    /// `records` is left untouched when the call fails.
    pub fn find_all<R: Record>(
        &self,
        document: &Document,
        records: &mut Vec<R>,
    ) -> Result<(), FindError> {
        let mut found = Vec::new();
        self.run(document, Sink::List(&mut found))?;
        records.extend(found);
        Ok(())
    }

    fn run<R: Record>(&self, document: &Document, mut sink: Sink<'_, R>) -> Result<(), FindError> {
        self.check_fields::<R>()?;
        let matcher = Matcher { pattern: self };
        for (index, rule) in self.rules.iter().enumerate() {
            debug!(rule = index, selector = %rule.source, "matching top-level rule");
            let verdict = matcher.search(rule, std::iter::once(document.root()), sink.reborrow())?;
            if verdict == Verdict::NoMatch {
                return Err(FindError::NoMatch {
                    selector: rule.source.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Pattern {
    /// Fails on the first target naming a field `R` does not declare.
    fn check_fields<R: Record>(&self) -> Result<(), FindError> {
        let declared = R::field_names();
        if declared.is_empty() {
            return Ok(());
        }
        let mut pending: Vec<&PatternNode> = self.rules.iter().collect();
        while let Some(node) = pending.pop() {
            for target in node.captures.iter().flat_map(|capture| &capture.targets) {
                if !declared.contains(&target.field.as_str()) {
                    return Err(FindError::Assign {
                        field: target.field.clone(),
                        source: FieldError::UnknownField(target.field.clone()),
                    });
                }
            }
            pending.extend(&node.children);
        }
        Ok(())
    }
}

struct Matcher<'p> {
    pattern: &'p Pattern,
}

impl Matcher<'_> {
    /// Searches the subtrees rooted at `candidates` for `node`.
    fn search<'d, R: Record>(
        &self,
        node: &PatternNode,
        candidates: impl Iterator<Item = ElementRef<'d>>,
        mut sink: Sink<'_, R>,
    ) -> Result<Verdict, FindError> {
        let mut findings = 0usize;
        for candidate in candidates {
            if self.search(node, child_elements(candidate), sink.reborrow())? == Verdict::Matched {
                findings += 1;
            }
            if !node.selector.matches(&candidate) {
                continue;
            }
            if self.accept(node, candidate, sink.reborrow())? {
                findings += 1;
            }
        }

        if node.optional || findings > 0 {
            Ok(Verdict::Matched)
        } else {
            Ok(Verdict::NoMatch)
        }
    }

    fn accept<R: Record>(
        &self,
        node: &PatternNode,
        candidate: ElementRef<'_>,
        sink: Sink<'_, R>,
    ) -> Result<bool, FindError> {
        match sink {
            Sink::Record(record) => self.populate(node, candidate, record),
            Sink::List(records) => {
                let mut record = R::default();
                let accepted = self.populate(node, candidate, &mut record)?;
                if accepted {
                    records.push(record);
                }
                Ok(accepted)
            }
        }
    }

    /// Applies the node's captures and child rules to one candidate. `Ok(false)` rejects it.
    fn populate<R: Record>(
        &self,
        node: &PatternNode,
        candidate: ElementRef<'_>,
        record: &mut R,
    ) -> Result<bool, FindError> {
        for capture in &node.captures {
            if !self.capture(capture, candidate, record)? {
                return Ok(false);
            }
        }

        for child in &node.children {
            if self.search(child, child_elements(candidate), Sink::Record(&mut *record))?
                == Verdict::NoMatch
            {
                trace!(
                    selector = %node.source,
                    child = %child.source,
                    "candidate rejected: required child missing"
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn capture<R: Record>(
        &self,
        capture: &Capture,
        candidate: ElementRef<'_>,
        record: &mut R,
    ) -> Result<bool, FindError> {
        let raw = match &capture.attr {
            Attribute::Text => text_content(candidate),
            Attribute::Html => candidate.inner_html(),
            Attribute::Named(key) => match candidate.value().attr(key) {
                Some(value) => value.to_string(),
                None => {
                    trace!(attr = %key, "candidate rejected: attribute missing");
                    return Ok(false);
                }
            },
        };

        let Some(regex) = &capture.regex else {
            for target in &capture.targets {
                self.bind(target, raw.clone(), record)?;
            }
            return Ok(true);
        };

        // Every group needs a target to land in
        if regex.captures_len() - 1 > capture.targets.len() {
            trace!(regex = %regex, "candidate rejected: more groups than targets");
            return Ok(false);
        }
        let Some(groups) = regex.captures(&raw) else {
            trace!(regex = %regex, "candidate rejected: regex did not match");
            return Ok(false);
        };
        for (index, target) in capture.targets.iter().enumerate() {
            // A group that took no part in the match binds the empty string
            let value = groups.get(index + 1).map_or("", |group| group.as_str());
            self.bind(target, value.to_string(), record)?;
        }
        Ok(true)
    }

    fn bind<R: Record>(&self, target: &Target, value: String, record: &mut R) -> Result<(), FindError> {
        let value = self.apply_filters(&target.filters, value)?;
        record
            .assign(&target.field, value)
            .map_err(|source| FindError::Assign {
                field: target.field.clone(),
                source,
            })
    }

    fn apply_filters(&self, names: &[String], mut value: String) -> Result<String, FindError> {
        for name in names {
            let filter = self
                .pattern
                .filters
                .resolve(name)
                .ok_or_else(|| FindError::UnknownFilter(name.clone()))?;
            value = filter(&value);
        }
        Ok(value)
    }
}
