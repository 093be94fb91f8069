//! Pattern-pack ingestion
//!
//! Parses pack definitions (TOML), validates every pattern, deduplicates by
//! id and produces an immutable [`PatternRegistry`]. The guard itself never
//! sees a malformed pattern: everything is rejected here, at load time.

use std::collections::HashMap;
use std::path::Path;

use regex::{RegexBuilder, RegexSetBuilder};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::rules::base;
use crate::rules::packs;
use crate::rules::{Action, Pattern, PatternRegistry, Rule, Severity};

/// Upper bound on the compiled size of a single pattern.
pub const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Upper bound on the compiled size of the whole registry.
pub const REGISTRY_SIZE_LIMIT: usize = 64 << 20;

/// Errors raised while loading or validating packs
#[derive(Debug, Error)]
pub enum PackError {
    #[error("failed to read pack file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse pack definition: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("pack '{pack}' contains a pattern with an empty id")]
    EmptyId { pack: String },

    #[error("pattern '{id}' has an invalid regex: {source}")]
    InvalidRegex {
        id: String,
        #[source]
        source: regex::Error,
    },

    #[error("pattern '{id}' exceeds the compiled regex size limit")]
    RegexTooComplex { id: String },

    #[error("registry exceeds the compiled regex size limit")]
    RegistryTooComplex,

    #[error("unknown built-in pack: {0}")]
    UnknownPack(String),
}

/// Pack header
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PackMeta {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// One pattern as written in a pack file
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PatternDef {
    pub id: String,
    pub regex: String,
    pub action: Action,
    pub severity: Severity,
    #[serde(default)]
    pub message: String,
}

/// A parsed, not yet validated pack
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PackDefinition {
    pub pack: PackMeta,

    #[serde(default)]
    pub patterns: Vec<PatternDef>,
}

impl PackDefinition {
    /// Parse a pack from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, PackError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a pack from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, PackError> {
        let content = std::fs::read_to_string(path).map_err(|source| PackError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Build a pack from a built-in rule table
    pub fn from_rules(pack: PackMeta, rules: &[Rule]) -> Self {
        let patterns = rules
            .iter()
            .map(|r| PatternDef {
                id: r.id.to_string(),
                regex: r.pattern.to_string(),
                action: r.action,
                severity: r.severity,
                message: r.message.to_string(),
            })
            .collect();
        Self { pack, patterns }
    }

    fn validate(&self) -> Result<(), PackError> {
        for def in &self.patterns {
            if def.id.trim().is_empty() {
                return Err(PackError::EmptyId {
                    pack: self.pack.name.clone(),
                });
            }
            compile_single(&def.id, &def.regex)?;
        }
        Ok(())
    }
}

fn compile_single(id: &str, pattern: &str) -> Result<(), PackError> {
    match RegexBuilder::new(pattern)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
    {
        Ok(_) => Ok(()),
        Err(regex::Error::CompiledTooBig(_)) => {
            Err(PackError::RegexTooComplex { id: id.to_string() })
        }
        Err(source) => Err(PackError::InvalidRegex {
            id: id.to_string(),
            source,
        }),
    }
}

/// Accumulates packs and produces a [`PatternRegistry`].
///
/// Duplicate ids: the later definition replaces the earlier one but keeps the
/// earlier registration slot.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    patterns: Vec<Pattern>,
    index: HashMap<String, usize>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the always-present core set.
    pub fn with_core(mut self) -> Self {
        // Core rules are checked by the tests in `rules::base`.
        self.insert_pack(base::core_pack());
        self
    }

    /// Add a built-in extension pack by name.
    pub fn add_builtin(self, name: &str) -> Result<Self, PackError> {
        let def = packs::builtin(name).ok_or_else(|| PackError::UnknownPack(name.to_string()))?;
        self.add_pack(def)
    }

    /// Validate and add a pack. A pack with any invalid pattern is rejected
    /// as a whole.
    pub fn add_pack(mut self, def: PackDefinition) -> Result<Self, PackError> {
        def.validate()?;
        self.insert_pack(def);
        Ok(self)
    }

    /// Load, validate and add a pack file.
    pub fn add_pack_file(self, path: &Path) -> Result<Self, PackError> {
        let def = PackDefinition::from_file(path)?;
        self.add_pack(def)
    }

    fn insert_pack(&mut self, def: PackDefinition) {
        let pack_name = def.pack.name;
        for p in def.patterns {
            let pattern = Pattern {
                id: p.id,
                regex: p.regex,
                action: p.action,
                severity: p.severity,
                message: p.message,
                pack: pack_name.clone(),
            };

            match self.index.get(&pattern.id) {
                Some(&slot) => {
                    warn!(
                        id = %pattern.id,
                        previous_pack = %self.patterns[slot].pack,
                        pack = %pattern.pack,
                        "duplicate pattern id, last registration wins"
                    );
                    self.patterns[slot] = pattern;
                }
                None => {
                    self.index.insert(pattern.id.clone(), self.patterns.len());
                    self.patterns.push(pattern);
                }
            }
        }
    }

    /// Compile every pattern into one set.
    pub fn build(self) -> Result<PatternRegistry, PackError> {
        let set = RegexSetBuilder::new(self.patterns.iter().map(|p| p.regex.as_str()))
            .size_limit(REGISTRY_SIZE_LIMIT)
            .build()
            .map_err(|e| match e {
                regex::Error::CompiledTooBig(_) => PackError::RegistryTooComplex,
                source => PackError::InvalidRegex {
                    id: "<registry>".to_string(),
                    source,
                },
            })?;

        Ok(PatternRegistry::from_parts(self.patterns, set))
    }
}
