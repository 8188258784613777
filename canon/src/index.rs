//! Term-frequency index over canon documents.
//!
//! The `CanonIndex` holds a small corpus in memory and scores documents by
//! raw term occurrence. It is rebuilt wholesale on reload and never mutated
//! in place.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{CanonError, Result};
use crate::snippet::{DEFAULT_SNIPPET_WINDOW, count_terms, extract_snippet, tokenize};

/// File extensions picked up by the canon loader.
const CANON_EXTENSIONS: &[&str] = &["md", "markdown", "txt", "json"];

/// File name suffix of persisted vector indexes. Such files are never lore.
pub const VECTOR_INDEX_SUFFIX: &str = ".index.json";

/// A single document of canon material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonDocument {
    /// Identifier, unique within the index.
    pub id: String,

    /// Path the document was loaded from.
    pub source_path: PathBuf,

    /// Text used for scoring and snippets.
    pub text: String,
}

/// A scored search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonHit<'a> {
    /// The matched document.
    pub document: &'a CanonDocument,

    /// Sum of term occurrences in the document.
    pub score: usize,
}

/// In-memory lexical index. Load order is the tie-break order for equal scores.
#[derive(Debug, Clone, Default)]
pub struct CanonIndex {
    docs: Vec<CanonDocument>,
}

impl CanonIndex {
    /// Create an index from already loaded documents.
    pub fn from_documents(docs: Vec<CanonDocument>) -> Self {
        Self { docs }
    }

    /// Load every text-bearing file under `root`.
    ///
    /// Loading is best-effort: a missing root gives an empty index, and files
    /// that cannot be read or parsed are skipped while the walk continues.
    /// Files named `*.index.json` are vector indexes and are skipped too.
    pub fn load(root: impl AsRef<Path>) -> Self {
        Self::load_excluding(root, &[])
    }

    /// Like [`CanonIndex::load`], also skipping every path in `excluded`.
    pub fn load_excluding(root: impl AsRef<Path>, excluded: &[PathBuf]) -> Self {
        let root = root.as_ref();
        if !root.exists() {
            warn!("Canon directory not found: {}", root.display());
            return Self::default();
        }

        let excluded: Vec<PathBuf> = excluded.iter().map(|p| normalize(p)).collect();
        let mut docs = Vec::new();
        let walker = WalkDir::new(root).sort_by_file_name().into_iter();

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() || !is_canon_file(entry.path()) {
                continue;
            }
            if is_vector_index(entry.path()) || is_excluded(entry.path(), &excluded) {
                debug!("Skipping excluded file {}", entry.path().display());
                continue;
            }

            match read_canon_text(entry.path()) {
                Ok(text) => docs.push(CanonDocument {
                    id: docs.len().to_string(),
                    source_path: entry.path().to_path_buf(),
                    text,
                }),
                Err(e) => debug!("Skipping canon file {}: {e}", entry.path().display()),
            }
        }

        info!("Loaded {} canon documents from {}", docs.len(), root.display());
        Self { docs }
    }

    /// Documents in load order.
    pub fn documents(&self) -> &[CanonDocument] {
        &self.docs
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Score documents against `query`, best first, at most `top_k`.
    pub fn rank(&self, query: &str, top_k: usize) -> Vec<CanonHit<'_>> {
        let terms = tokenize(query);
        if terms.is_empty() || self.docs.is_empty() {
            return Vec::new();
        }
        self.rank_terms(&terms, top_k)
    }

    /// Return up to `top_k` snippets for `query`, using the default window.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<String> {
        self.search_with_window(query, top_k, DEFAULT_SNIPPET_WINDOW)
    }

    /// Return up to `top_k` snippets of `window` characters for `query`.
    pub fn search_with_window(&self, query: &str, top_k: usize, window: usize) -> Vec<String> {
        let terms = tokenize(query);
        if terms.is_empty() || self.docs.is_empty() {
            return Vec::new();
        }

        let snippets: Vec<String> = self
            .rank_terms(&terms, top_k)
            .into_iter()
            .map(|hit| extract_snippet(&hit.document.text, &terms, window).text)
            .collect();

        debug!("Canon search for {query:?} returned {} snippets", snippets.len());
        snippets
    }

    fn rank_terms(&self, terms: &[String], top_k: usize) -> Vec<CanonHit<'_>> {
        let mut hits: Vec<CanonHit<'_>> = self
            .docs
            .iter()
            .map(|document| CanonHit {
                document,
                score: count_terms(&document.text.to_ascii_lowercase(), terms),
            })
            .filter(|hit| hit.score > 0)
            .collect();

        // Stable sort keeps load order among equal scores.
        hits.sort_by(|a, b| b.score.cmp(&a.score));
        hits.truncate(top_k);
        hits
    }
}

fn is_canon_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            CANON_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

fn is_vector_index(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.to_ascii_lowercase().ends_with(VECTOR_INDEX_SUFFIX))
}

fn is_excluded(path: &Path, excluded: &[PathBuf]) -> bool {
    !excluded.is_empty() && excluded.contains(&normalize(path))
}

/// Canonical form when the path exists, the path as given otherwise.
fn normalize(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Read a canon file, rendering JSON documents in a canonical pretty form.
fn read_canon_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    let text =
        String::from_utf8(bytes).map_err(|_| CanonError::NotText(path.display().to_string()))?;

    if is_json(path) {
        let value: serde_json::Value = serde_json::from_str(&text)?;
        return Ok(serde_json::to_string_pretty(&value)?);
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(id: &str, text: &str) -> CanonDocument {
        CanonDocument {
            id: id.to_string(),
            source_path: PathBuf::from(format!("{id}.md")),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_empty_query_and_empty_index() {
        let index = CanonIndex::from_documents(vec![doc("0", "the tower")]);
        assert!(index.search("", 3).is_empty());
        assert!(index.search("!!!", 3).is_empty());
        assert!(CanonIndex::default().search("tower", 3).is_empty());
    }

    #[test]
    fn test_rank_orders_by_score_then_load_order() {
        let index = CanonIndex::from_documents(vec![
            doc("0", "a tower"),
            doc("1", "tower tower tower"),
            doc("2", "no match here"),
            doc("3", "another tower"),
        ]);

        let hits = index.rank("Tower", 10);
        let ids: Vec<&str> = hits.iter().map(|h| h.document.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "0", "3"]);
        assert_eq!(hits[0].score, 3);
    }

    #[test]
    fn test_search_respects_top_k() {
        let index = CanonIndex::from_documents(vec![
            doc("0", "moon"),
            doc("1", "moon moon"),
            doc("2", "moon moon moon"),
        ]);
        let snippets = index.search("moon", 2);
        assert_eq!(snippets, vec!["moon moon moon", "moon moon"]);
    }

    #[test]
    fn test_search_sums_all_terms() {
        let index = CanonIndex::from_documents(vec![
            doc("0", "silver silver silver"),
            doc("1", "silver gate gate gate"),
        ]);
        let hits = index.rank("silver gate", 2);
        assert_eq!(hits[0].document.id, "1");
        assert_eq!(hits[0].score, 4);
        assert_eq!(hits[1].score, 3);
    }
}
