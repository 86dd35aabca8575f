//! # Catalog Module
//!
//! The catalog is the set of canonical item names lines are resolved against.
//! It is fetched once per resolution batch from a [`CatalogSource`] and then
//! treated as an immutable value shared by every line of the batch.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::errors::{AppError, AppResult};
use crate::text_processing::normalize;
use crate::validation::validate_catalog_name;

/// Overlapping two-character substrings of a case-folded string
pub fn bigrams(folded: &str) -> BTreeSet<String> {
    let chars: Vec<char> = folded.chars().collect();
    chars
        .windows(2)
        .map(|pair| pair.iter().collect::<String>())
        .collect()
}

/// A canonical catalog name together with its precomputed match data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Name as stored, case preserved
    name: String,
    /// Cleaned and case-folded form used by every matching tier
    key: String,
    /// Bigram set of `key`
    bigrams: BTreeSet<String>,
}

impl CatalogEntry {
    /// Build an entry from a stored name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let key = normalize(&name);
        let bigrams = bigrams(&key);
        Self { name, key, bigrams }
    }

    /// Display name, exactly as stored
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized match key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Bigram set of the match key
    pub fn bigrams(&self) -> &BTreeSet<String> {
        &self.bigrams
    }
}

/// Immutable, case-insensitively unique catalog snapshot
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Build a catalog from raw names.
    ///
    /// Names are deduplicated case-insensitively (first occurrence wins) and
    /// invalid names are skipped with a warning. Enumeration order follows input order.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        let mut skipped = 0usize;

        for name in names {
            let name: String = name.into();
            let name = match validate_catalog_name(&name) {
                Ok(valid) => valid.to_string(),
                Err(reason) => {
                    warn!(name = %name, reason = %reason, "Skipping invalid catalog entry");
                    skipped += 1;
                    continue;
                }
            };

            if seen.insert(name.to_lowercase()) {
                entries.push(CatalogEntry::new(name));
            } else {
                debug!(name = %name, "Dropping case-insensitive duplicate catalog entry");
            }
        }

        debug!(entries = entries.len(), skipped, "Catalog snapshot built");
        Self { entries }
    }

    /// All entries in stable enumeration order
    pub fn all(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive lookup of a stored name
    pub fn find(&self, name: &str) -> Option<&CatalogEntry> {
        let wanted = name.trim().to_lowercase();
        self.entries.iter().find(|e| e.name.to_lowercase() == wanted)
    }

    /// Display names in enumeration order
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }
}

/// Supplier of catalog snapshots.
///
/// Implementations must either return the complete catalog or fail; a stale
/// or partial snapshot is never substituted for one that could not be fetched.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch a fresh snapshot
    async fn fetch_catalog(&self) -> AppResult<Catalog>;

    /// Short description used in logs
    fn describe(&self) -> String;
}

/// Catalog held in memory, mainly for embedding callers and tests
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogSource {
    names: Vec<String>,
}

impl StaticCatalogSource {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalogSource {
    async fn fetch_catalog(&self) -> AppResult<Catalog> {
        Ok(Catalog::new(self.names.iter().cloned()))
    }

    fn describe(&self) -> String {
        format!("static({} names)", self.names.len())
    }
}

/// Catalog document layouts accepted by [`JsonFileCatalogSource`]
#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
enum CatalogDocument {
    List(Vec<String>),
    Wrapped { catalog: Vec<String> },
}

/// Catalog read from a JSON file: either `["A", "B"]` or `{"catalog": ["A", "B"]}`
#[derive(Debug, Clone)]
pub struct JsonFileCatalogSource {
    path: PathBuf,
}

impl JsonFileCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for JsonFileCatalogSource {
    async fn fetch_catalog(&self) -> AppResult<Catalog> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AppError::Catalog(format!(
                "failed to read catalog file '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        let names = match serde_json::from_str::<CatalogDocument>(&content)? {
            CatalogDocument::List(names) => names,
            CatalogDocument::Wrapped { catalog } => catalog,
        };

        info!(
            path = %self.path.display(),
            names = names.len(),
            "Loaded catalog from JSON file"
        );
        Ok(Catalog::new(names))
    }

    fn describe(&self) -> String {
        format!("json({})", self.path.display())
    }
}
