//! Exclusion-pattern filtering for catalog names.
//!
//! Patterns are case-insensitive shell globs (`*`, `?`, `[...]`) matched
//! against the literal name at one hierarchy level. Exclusion cascades
//! downward: a hidden database hides every schema and table beneath it, and
//! nothing at a lower level can re-include it.

use std::{error::Error, fmt};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::Deserialize;

use crate::name::QualifiedName;

/// Raw exclusion patterns, one list per hierarchy level.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExclusionPatterns {
    #[serde(default)]
    pub databases: Vec<String>,
    #[serde(default)]
    pub schemas: Vec<String>,
    #[serde(default)]
    pub tables: Vec<String>,
}

impl ExclusionPatterns {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.databases.is_empty() && self.schemas.is_empty() && self.tables.is_empty()
    }
}

/// A pattern that failed to compile into a glob.
#[derive(Debug)]
pub struct PatternError {
    pattern: String,
    source: globset::Error,
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid exclusion pattern '{}': {}",
            self.pattern, self.source
        )
    }
}

impl Error for PatternError {}

/// Hierarchy level a name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameLevel {
    Database,
    Schema,
    Table,
}

/// Compiled exclusion rules, immutable after startup.
#[derive(Debug, Clone)]
pub struct ExclusionRules {
    databases: GlobSet,
    schemas: GlobSet,
    tables: GlobSet,
}

impl ExclusionRules {
    /// Compiles one glob set per level.
    ///
    /// # Errors
    /// Returns `PatternError` for the first pattern that is not a valid glob.
    pub fn compile(patterns: &ExclusionPatterns) -> Result<Self, PatternError> {
        Ok(Self {
            databases: build_set(&patterns.databases)?,
            schemas: build_set(&patterns.schemas)?,
            tables: build_set(&patterns.tables)?,
        })
    }

    /// Whether `name` is excluded at exactly this level.
    #[must_use]
    pub fn excludes(&self, level: NameLevel, name: &str) -> bool {
        let set = match level {
            NameLevel::Database => &self.databases,
            NameLevel::Schema => &self.schemas,
            NameLevel::Table => &self.tables,
        };
        set.is_match(name)
    }

    /// Whether a qualified name is visible: no level up to and including its
    /// own may match an exclusion pattern.
    #[must_use]
    pub fn is_visible(&self, name: &QualifiedName) -> bool {
        if self.excludes(NameLevel::Database, &name.database) {
            return false;
        }
        if let Some(schema) = name.schema.as_deref() {
            if self.excludes(NameLevel::Schema, schema) {
                return false;
            }
        }
        if let Some(table) = name.table.as_deref() {
            if self.excludes(NameLevel::Table, table) {
                return false;
            }
        }
        true
    }
}

fn build_set(patterns: &[String]) -> Result<GlobSet, PatternError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .literal_separator(false)
            .build()
            .map_err(|source| PatternError {
                pattern: pattern.clone(),
                source,
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| PatternError {
        pattern: String::new(),
        source,
    })
}
