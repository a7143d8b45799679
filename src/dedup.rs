//! Identity-based deduplication.
//!
//! Dedup state lives in externally-owned block storage on the
//! note-taking side; this module defines the query/update contract and
//! the namespace derivation, not the storage mechanics. A namespace is
//! derived deterministically from the target document's name, so the
//! same document always maps to the same dedup scope.
//!
//! Known correctness gap, kept deliberately: with
//! [`IdentityMode::Fresh`](crate::record::IdentityMode::Fresh) the
//! identity token is assigned anew on every extraction pass, so
//! re-extracting the same physical annotation produces a token the
//! processed-set has never seen. `ContentDerived` mode closes the gap;
//! the choice is a [`Settings`](crate::config::Settings) field rather
//! than a silent fix.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::error::Result;

/// Marker prefix for highlight note pages, shared with the host's own
/// highlight convention.
pub const NAMESPACE_PREFIX: &str = "hls__";

/// Derive the dedup namespace for a document name.
///
/// A fixed transform: strip the `.pdf`/`.md`/`.edn` extension and
/// prefix the highlight marker. Plain string surgery, not path-aware.
///
/// # Examples
///
/// ```
/// use hlsync::dedup::dedup_namespace;
///
/// assert_eq!(dedup_namespace("paper.pdf"), "hls__paper");
/// assert_eq!(dedup_namespace("paper.md"), "hls__paper");
/// assert_eq!(dedup_namespace("paper"), "hls__paper");
/// ```
pub fn dedup_namespace(doc_name: &str) -> String {
    let stem = doc_name
        .strip_suffix(".pdf")
        .or_else(|| doc_name.strip_suffix(".md"))
        .or_else(|| doc_name.strip_suffix(".edn"))
        .unwrap_or(doc_name);
    format!("{}{}", NAMESPACE_PREFIX, stem)
}

/// The dedup contract implemented by the external block storage.
///
/// Marking is append-only: once an identity is marked processed for a
/// namespace, later [`already_processed`](DedupStore::already_processed)
/// calls include it until an external, user-triggered overwrite clears
/// the namespace (out of scope here).
pub trait DedupStore {
    /// The set of identities already materialized downstream for this
    /// namespace.
    ///
    /// # Errors
    ///
    /// [`Error::DedupStorage`](crate::error::Error::DedupStorage) when
    /// the external storage is unavailable.
    fn already_processed(&self, namespace: &str) -> Result<HashSet<Uuid>>;

    /// Record that `identity` has been materialized for `namespace`.
    fn mark_processed(&mut self, namespace: &str, identity: Uuid) -> Result<()>;
}

/// In-memory dedup store, for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryDedupStore {
    processed: HashMap<String, HashSet<Uuid>>,
}

impl MemoryDedupStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every identity recorded under `namespace`. This is the
    /// explicit overwrite operation; nothing else removes entries.
    pub fn clear_namespace(&mut self, namespace: &str) {
        self.processed.remove(namespace);
    }
}

impl DedupStore for MemoryDedupStore {
    fn already_processed(&self, namespace: &str) -> Result<HashSet<Uuid>> {
        Ok(self.processed.get(namespace).cloned().unwrap_or_default())
    }

    fn mark_processed(&mut self, namespace: &str, identity: Uuid) -> Result<()> {
        self.processed
            .entry(namespace.to_string())
            .or_default()
            .insert(identity);
        Ok(())
    }
}
