//! Interfaces to the note-taking host.
//!
//! The host application owns block/page storage, user messaging, and
//! command dispatch. The core never depends on the host's dispatch
//! mechanism directly; it receives these capability traits and calls
//! through them. Only the operations the import/embed workflow needs
//! are specified here.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use uuid::Uuid;

use crate::dedup::{DedupStore, MemoryDedupStore};
use crate::error::Result;

/// Severity of a user-visible status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Operation completed (possibly as a no-op).
    Success,
    /// Something was off but the pass continued.
    Warning,
    /// The pass aborted.
    Error,
}

/// User-visible status reporting.
pub trait HostNotifier {
    /// Surface a message to the user.
    fn notify(&self, status: Status, message: &str);
}

/// Block and page storage owned by the host.
///
/// Notes pages are keyed by title (the `hls__` namespace); blocks
/// within a page are ordered text. Marking a source block records that
/// its PDF has been imported at least once.
pub trait BlockStore {
    /// The text content of a block, or `None` when the block does not
    /// exist or is empty.
    fn block_content(&self, block_ref: &str) -> Result<Option<String>>;

    /// Whether the block carries the given marker property.
    fn has_marker(&self, block_ref: &str, marker: &str) -> Result<bool>;

    /// Set the marker property on a block.
    fn set_marker(&mut self, block_ref: &str, marker: &str) -> Result<()>;

    /// Whether a notes page with this title exists.
    fn page_exists(&self, title: &str) -> Result<bool>;

    /// Create an empty notes page headed by the asset link line.
    fn create_page(&mut self, title: &str, asset_link: &str) -> Result<()>;

    /// Delete a notes page and everything on it. This is the external
    /// overwrite operation that clears the page's dedup namespace.
    fn delete_page(&mut self, title: &str) -> Result<()>;

    /// Append one block to a notes page.
    fn append_block(&mut self, title: &str, content: &str) -> Result<()>;

    /// Remove the blocks previously generated by this workflow (those
    /// carrying the marker), leaving the user's own blocks in place.
    fn remove_marked_blocks(&mut self, title: &str, marker: &str) -> Result<()>;
}

/// Everything the import/embed commands need from the host.
pub trait Host: BlockStore + DedupStore + HostNotifier {}
impl<T: BlockStore + DedupStore + HostNotifier> Host for T {}

/// In-memory host, for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryHost {
    /// Block contents keyed by block reference.
    pub blocks: HashMap<String, String>,
    /// Marker properties set on blocks.
    pub block_markers: HashMap<String, HashSet<String>>,
    /// Notes pages: title -> ordered block contents.
    pub pages: IndexMap<String, Vec<String>>,
    dedup: MemoryDedupStore,
    notices: RefCell<Vec<(Status, String)>>,
}

impl MemoryHost {
    /// Create an empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a block with content.
    pub fn insert_block(&mut self, block_ref: impl Into<String>, content: impl Into<String>) {
        self.blocks.insert(block_ref.into(), content.into());
    }

    /// Messages surfaced so far.
    pub fn notices(&self) -> Vec<(Status, String)> {
        self.notices.borrow().clone()
    }
}

impl HostNotifier for MemoryHost {
    fn notify(&self, status: Status, message: &str) {
        self.notices.borrow_mut().push((status, message.to_string()));
    }
}

impl BlockStore for MemoryHost {
    fn block_content(&self, block_ref: &str) -> Result<Option<String>> {
        Ok(self.blocks.get(block_ref).cloned().filter(|c| !c.is_empty()))
    }

    fn has_marker(&self, block_ref: &str, marker: &str) -> Result<bool> {
        Ok(self
            .block_markers
            .get(block_ref)
            .is_some_and(|markers| markers.contains(marker)))
    }

    fn set_marker(&mut self, block_ref: &str, marker: &str) -> Result<()> {
        self.block_markers
            .entry(block_ref.to_string())
            .or_default()
            .insert(marker.to_string());
        Ok(())
    }

    fn page_exists(&self, title: &str) -> Result<bool> {
        Ok(self.pages.contains_key(title))
    }

    fn create_page(&mut self, title: &str, asset_link: &str) -> Result<()> {
        self.pages
            .insert(title.to_string(), vec![asset_link.to_string()]);
        Ok(())
    }

    fn delete_page(&mut self, title: &str) -> Result<()> {
        self.pages.shift_remove(title);
        // The page is the namespace's materialization; removing it
        // resets dedup state for that namespace.
        self.dedup.clear_namespace(title);
        Ok(())
    }

    fn append_block(&mut self, title: &str, content: &str) -> Result<()> {
        self.pages
            .entry(title.to_string())
            .or_default()
            .push(content.to_string());
        Ok(())
    }

    fn remove_marked_blocks(&mut self, title: &str, marker: &str) -> Result<()> {
        let needle = format!("{}:: true", marker);
        if let Some(blocks) = self.pages.get_mut(title) {
            blocks.retain(|block| !block.contains(&needle));
        }
        self.dedup.clear_namespace(title);
        Ok(())
    }
}

impl DedupStore for MemoryHost {
    fn already_processed(&self, namespace: &str) -> Result<HashSet<Uuid>> {
        self.dedup.already_processed(namespace)
    }

    fn mark_processed(&mut self, namespace: &str, identity: Uuid) -> Result<()> {
        self.dedup.mark_processed(namespace, identity)
    }
}
