//! Configuration loader for the grape command line tool.
//!
//! `defaults/grape.default.toml` is embedded into the binary so that the documented defaults
//! and runtime behavior stay in sync. The CLI layers a user file and its flags on top of those
//! defaults via [`Loader`] before deserializing into [`GrapeConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

const DEFAULT_TOML: &str = include_str!("../defaults/grape.default.toml");

/// Top-level configuration consumed by the CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct GrapeConfig {
    pub output: OutputConfig,
    pub logging: LoggingConfig,
    /// Regex-replace filters keyed by filter name.
    #[serde(default)]
    pub filters: BTreeMap<String, ReplaceFilter>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub pretty: bool,
    pub mode: OutputMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// One record per match.
    List,
    /// Every match written into one record.
    Single,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
}

/// A filter that replaces every match of `pattern` with `replacement`.
///
/// `replacement` may refer to groups as `$1` or `$name`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceFilter {
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
}

/// A configured filter that could not be turned into a pattern filter.
#[derive(Error, Debug)]
pub enum FilterConfigError {
    #[error("filter `{name}` has an invalid pattern: {source}")]
    Pattern { name: String, source: regex::Error },

    #[error(transparent)]
    Name(#[from] grape::FilterError),
}

impl GrapeConfig {
    /// Compiles the configured filters, ready for [`grape::Pattern::register_filters`].
    pub fn filters(&self) -> Result<grape::Filters, FilterConfigError> {
        let mut filters = grape::Filters::new();
        for (name, filter) in &self.filters {
            let regex = Regex::new(&filter.pattern).map_err(|source| FilterConfigError::Pattern {
                name: name.clone(),
                source,
            })?;
            let replacement = filter.replacement.clone();
            filters.insert(name, move |value| {
                regex.replace_all(value, replacement.as_str()).into_owned()
            })?;
        }
        Ok(filters)
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override, such as a CLI flag.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<GrapeConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
