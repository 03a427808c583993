//! Record store
//!
//! The store is a single JSON file holding an array of objects. Each object
//! carries a unique `identifier` string and any number of other attributes.
//! The file is read in full before every operation and rewritten in full
//! after every mutation.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::KiaError;

/// Reserved key carried by every record
pub const IDENTIFIER_KEY: &str = "identifier";

/// Sentinel accepted wherever an identifier is expected, meaning every record
pub const ALL_SENTINEL: &str = "[ALL]";

/// Which records an operation applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    One(String),
    All,
}

impl Selector {
    pub fn parse(raw: &str) -> Self {
        if raw == ALL_SENTINEL {
            Self::All
        } else {
            Self::One(raw.to_string())
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::All => true,
            Self::One(id) => record.identifier == *id,
        }
    }
}

/// A single item and its attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub identifier: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Record {
    pub fn new(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            attributes: Map::new(),
        }
    }
}

/// A typed value bound for one key
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub key: String,
    pub value: Value,
}

/// Outcome of removing keys across the selected records
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Removal {
    /// (identifier, key) pairs that were removed
    pub removed: Vec<(String, String)>,
    /// (identifier, key) pairs that were not present
    pub missing: Vec<(String, String)>,
}

/// A record that matched a search term
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub identifier: String,
    /// Matching attributes as (key, unquoted textual value)
    pub attributes: Vec<(String, String)>,
}

/// Textual form of a value with string quoting removed
pub fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse the on-disk representation. Anything that is not an array of
/// objects carrying a string `identifier` is a format error.
pub fn parse_records(content: &[u8]) -> Result<Vec<Record>> {
    let document: Value = match serde_json::from_slice(content) {
        Ok(doc) => doc,
        Err(e) => bail!(KiaError::StoreFormat(e.to_string())),
    };

    if !document.is_array() {
        bail!(KiaError::StoreFormat("top level is not an array".to_string()));
    }

    match serde_json::from_value(document) {
        Ok(records) => Ok(records),
        Err(e) => bail!(KiaError::StoreFormat(e.to_string())),
    }
}

/// The loaded store, bound to the file it came from
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    records: Vec<Record>,
}

impl Store {
    /// Read and parse the store file
    pub fn open(path: &Path) -> Result<Self> {
        debug!("Loading store from {}", path.display());

        let content = fs::read(path)
            .with_context(|| format!("Failed to read store: {}", path.display()))?;
        let records = parse_records(&content)?;

        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    /// Rewrite the whole store file
    pub fn save(&self) -> Result<()> {
        debug!(
            "Writing {} record(s) to {}",
            self.records.len(),
            self.path.display()
        );

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.records
            .serialize(&mut serializer)
            .context("Failed to serialize store")?;
        buf.push(b'\n');

        fs::write(&self.path, buf)
            .with_context(|| format!("Failed to write store: {}", self.path.display()))
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.records.iter().any(|r| r.identifier == identifier)
    }

    /// Fail unless the selector names an existing record (`All` always passes)
    pub fn ensure_selected(&self, selector: &Selector) -> Result<()> {
        if let Selector::One(id) = selector {
            if !self.contains(id) {
                bail!(KiaError::ItemNotFound(id.clone()));
            }
        }
        Ok(())
    }

    /// Append a new record holding only its identifier
    pub fn add(&mut self, identifier: &str) -> Result<()> {
        if identifier == ALL_SENTINEL {
            bail!(KiaError::ReservedIdentifier(identifier.to_string()));
        }
        if self.contains(identifier) {
            bail!(KiaError::DuplicateItem(identifier.to_string()));
        }

        self.records.push(Record::new(identifier));
        Ok(())
    }

    /// Remove the selected records, returning their identifiers
    pub fn erase(&mut self, selector: &Selector) -> Result<Vec<String>> {
        if self.records.is_empty() {
            bail!(KiaError::NoItemsToRemove);
        }

        let mut removed = Vec::new();
        self.records.retain(|record| {
            if selector.matches(record) {
                removed.push(record.identifier.clone());
                false
            } else {
                true
            }
        });

        Ok(removed)
    }

    /// Assign every value to every selected record. Returns the identifiers
    /// of the records touched, in store order.
    pub fn assign(&mut self, selector: &Selector, assignments: &[Assignment]) -> Result<Vec<String>> {
        if assignments.iter().any(|a| a.key == IDENTIFIER_KEY) {
            bail!(KiaError::ReservedKey);
        }

        let mut touched = Vec::new();
        for record in self.records.iter_mut().filter(|r| selector.matches(r)) {
            for assignment in assignments {
                record
                    .attributes
                    .insert(assignment.key.clone(), assignment.value.clone());
            }
            touched.push(record.identifier.clone());
        }

        Ok(touched)
    }

    /// Remove keys from every selected record. Keys missing from a record
    /// are collected rather than treated as errors.
    pub fn remove_keys(&mut self, selector: &Selector, keys: &[String]) -> Result<Removal> {
        if keys.iter().any(|k| k == IDENTIFIER_KEY) {
            bail!(KiaError::ReservedKey);
        }

        let mut removal = Removal::default();
        for record in self.records.iter_mut().filter(|r| selector.matches(r)) {
            for key in keys {
                let pair = (record.identifier.clone(), key.clone());
                if record.attributes.remove(key).is_some() {
                    removal.removed.push(pair);
                } else {
                    removal.missing.push(pair);
                }
            }
        }

        Ok(removal)
    }

    /// Find records whose identifier, or any attribute key or value,
    /// contains the term
    pub fn search(&self, term: &str) -> Vec<SearchHit> {
        self.records
            .iter()
            .filter_map(|record| {
                let attributes: Vec<(String, String)> = record
                    .attributes
                    .iter()
                    .map(|(key, value)| (key.clone(), plain_text(value)))
                    .filter(|(key, text)| key.contains(term) || text.contains(term))
                    .collect();

                if record.identifier.contains(term) || !attributes.is_empty() {
                    Some(SearchHit {
                        identifier: record.identifier.clone(),
                        attributes,
                    })
                } else {
                    None
                }
            })
            .collect()
    }
}
