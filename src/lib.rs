//! # hlsync
//!
//! Two-way synchronization between PDF highlight annotations and a
//! note-taking host.
//!
//! ## Core Features
//!
//! ### Import
//! - **Extraction**: pull `/Highlight` annotations out of a PDF into
//!   canonical records (top-left origin, classified palette color,
//!   author, selected text, stable identity)
//! - **Interchange**: EDN sidecar files readable by other tooling
//! - **Notes**: one annotation block per highlight on a namespaced
//!   notes page, marked so a re-import can tell its own blocks apart
//!   from the user's
//!
//! ### Embed
//! - **Incremental save**: new annotations are appended to the PDF;
//!   the original bytes survive untouched as a prefix
//! - **Geometry**: records carry their source page size, so embedding
//!   into a differently-sized rendition of the page rescales correctly
//! - **Dedup**: identities already materialized for a document are
//!   skipped, so repeated embed passes are no-ops
//!
//! ## Quick Start
//!
//! ```no_run
//! use hlsync::{extract_from_bytes, to_edn, IdentityMode};
//!
//! # fn main() -> hlsync::Result<()> {
//! let bytes = std::fs::read("paper.pdf")?;
//! let records = extract_from_bytes(&bytes, IdentityMode::ContentDerived)?;
//! println!("{}", to_edn(&records));
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 (<http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license (<http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Canonical highlight model
pub mod color;
pub mod geometry;
pub mod record;

// PDF passes
pub mod embed;
pub mod extract;

// Interchange and notes output
pub mod edn;
pub mod notes;

// Asset directory access
pub mod assets;

// Dedup bookkeeping
pub mod dedup;

// Host integration
pub mod commands;
pub mod config;
pub mod host;

pub use color::{classify, ColorName};
pub use commands::{import_annotations, embed_annotations, Command, CommandContext, CommandOutcome};
pub use config::Settings;
pub use dedup::{dedup_namespace, DedupStore};
pub use edn::{from_edn, to_edn};
pub use embed::{embed_highlights, EmbedRequest};
pub use error::{Error, Result};
pub use extract::{extract_from_bytes, extract_highlights};
pub use geometry::{normalize, Origin, PageSize, Rect};
pub use record::{HighlightRecord, IdentityMode};
