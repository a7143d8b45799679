//! Error types for highlight reconciliation.
//!
//! This module defines all error types that can occur while extracting
//! highlights from a PDF, embedding records back, or talking to the
//! external storage collaborators.

/// Result type alias for hlsync operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during highlight reconciliation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A page size with a non-positive dimension was supplied to the
    /// geometry normalizer.
    #[error("Invalid page geometry: {width}x{height} (dimensions must be positive)")]
    Geometry {
        /// Offending page width in points
        width: f64,
        /// Offending page height in points
        height: f64,
    },

    /// The PDF could not be opened or parsed at all.
    #[error("Failed to parse PDF document: {0}")]
    DocumentParse(#[from] lopdf::Error),

    /// A record referenced a page that does not exist in the embedding
    /// target. Carries the failing record's identity so callers can
    /// report precisely which highlight aborted the pass.
    #[error("Cannot embed highlight {identity}: page {page} does not exist in target document")]
    Embed {
        /// Identity token of the failing record
        identity: uuid::Uuid,
        /// 1-based page number the record referenced
        page: u32,
    },

    /// File-handle access was denied.
    #[error("Permission denied for {path}")]
    Permission {
        /// Path the handle was requested for
        path: String,
    },

    /// The external deduplication storage is unavailable.
    #[error("Deduplication storage error: {0}")]
    DedupStorage(String),

    /// The interchange text is not well-formed EDN (or not the expected
    /// highlight document shape).
    #[error("Invalid interchange text: {0}")]
    Interchange(String),

    /// A referenced asset (PDF or sidecar) could not be located.
    #[error("Asset not found: {0}")]
    MissingAsset(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_error_reports_dimensions() {
        let err = Error::Geometry {
            width: 0.0,
            height: 792.0,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("0"));
        assert!(msg.contains("792"));
    }

    #[test]
    fn test_embed_error_carries_identity_and_page() {
        let id = uuid::Uuid::new_v4();
        let err = Error::Embed {
            identity: id,
            page: 42,
        };
        let msg = format!("{}", err);
        assert!(msg.contains(&id.to_string()));
        assert!(msg.contains("42"));
    }

    #[test]
    fn test_permission_error_names_path() {
        let err = Error::Permission {
            path: "assets/paper.pdf".to_string(),
        };
        assert!(format!("{}", err).contains("assets/paper.pdf"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
