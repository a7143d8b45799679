//! Canonical highlight records.
//!
//! The [`HighlightRecord`] is the interchange unit shared by extraction
//! output, the persisted EDN sidecar, and embedding input. Identity
//! tokens are assigned when a record is created and are never
//! recomputed from content afterward.

use uuid::Uuid;

use crate::color::ColorName;
use crate::geometry::{PageSize, Rect};

/// How identity tokens are assigned to freshly extracted records.
///
/// The original workflow assigns a fresh token on every extraction
/// pass, which means re-extracting the same physical annotation twice
/// produces two distinct identities and defeats the dedup check.
/// [`IdentityMode::ContentDerived`] closes that gap by hashing stable
/// content (page, rounded rect, colour) into a v5 UUID instead. Both
/// behaviours are kept; callers pick one via
/// [`Settings`](crate::config::Settings).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentityMode {
    /// A random v4 UUID per extraction pass (compatible with the
    /// original workflow, not idempotent across passes).
    #[default]
    Fresh,
    /// A v5 UUID derived from page, rect rounded to two decimals, and
    /// colour name (idempotent across passes over an unchanged PDF).
    ContentDerived,
}

/// One highlight, independent of any PDF library.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightRecord {
    /// 1-based page number the highlight belongs to.
    pub page: u32,
    /// Size of the page the rectangle was captured against. Embedding
    /// may target a page of different size or orientation, so the
    /// capture geometry travels with the record.
    pub page_size: PageSize,
    /// Rectangle in the top-left-origin convention, relative to
    /// `page_size`.
    pub rect: Rect,
    /// Classified palette colour.
    pub color: ColorName,
    /// Annotation author, when the library exposed one.
    pub author: Option<String>,
    /// Overlaid text captured at extraction time; not required for
    /// embedding.
    pub text: Option<String>,
    /// Stable unique identity token for deduplication.
    pub id: Uuid,
}

impl HighlightRecord {
    /// Assign an identity token for a highlight with the given stable
    /// content, according to `mode`.
    pub fn assign_identity(mode: IdentityMode, page: u32, rect: Rect, color: ColorName) -> Uuid {
        match mode {
            IdentityMode::Fresh => Uuid::new_v4(),
            IdentityMode::ContentDerived => {
                // Two-decimal rounding keeps the token stable across
                // float noise introduced by coordinate normalization.
                let key = format!(
                    "{}:{:.2}:{:.2}:{:.2}:{:.2}:{}",
                    page, rect.x0, rect.y0, rect.x1, rect.y1, color
                );
                Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
            },
        }
    }
}
