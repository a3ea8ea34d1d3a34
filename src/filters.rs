//! Filter registry
//!
//! Filters are named `&str -> String` transforms chained onto capture targets
//! (`Name.strip.lower`). Lookup has two levels: the pattern's own [`Filters`]
//! first, then the builtins below.

use crate::error::FilterError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type FilterFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag regex is valid"));

static BUILTINS: Lazy<HashMap<&'static str, fn(&str) -> String>> = Lazy::new(|| {
    let mut builtins: HashMap<&'static str, fn(&str) -> String> = HashMap::new();
    builtins.insert("lower", |s| s.to_lowercase());
    builtins.insert("upper", |s| s.to_uppercase());
    builtins.insert("strip", |s| s.trim().to_string());
    builtins.insert("nocomma", |s| s.replace(',', ""));
    builtins.insert("notags", |s| TAG.replace_all(s, "").into_owned());
    builtins.insert("tag2space", |s| TAG.replace_all(s, " ").into_owned());
    builtins
});

/// Reports whether `name` is a valid filter identifier: a letter or `_`,
/// followed by letters, digits or `_`.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}

/// Filters scoped to one pattern.
#[derive(Clone, Default)]
pub struct Filters {
    map: HashMap<String, FilterFn>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<F>(&mut self, name: &str, filter: F) -> Result<&mut Self, FilterError>
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        if !is_valid_name(name) {
            return Err(FilterError::InvalidName(name.to_string()));
        }
        self.map.insert(name.to_string(), Arc::new(filter));
        Ok(self)
    }

    /// Moves every filter of `other` into this registry. Names were validated when they
    /// were inserted into `other`.
    pub fn extend(&mut self, other: Filters) {
        self.map.extend(other.map);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Resolves `name` locally, falling back to the builtins.
    pub fn resolve(&self, name: &str) -> Option<&(dyn Fn(&str) -> String + Send + Sync)> {
        if let Some(filter) = self.map.get(name) {
            return Some(&**filter);
        }
        BUILTINS
            .get(name)
            .map(|filter| filter as &(dyn Fn(&str) -> String + Send + Sync))
    }
}

impl fmt::Debug for Filters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.map.keys().collect();
        names.sort();
        f.debug_struct("Filters").field("names", &names).finish()
    }
}
