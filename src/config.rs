//! Typed workflow settings.
//!
//! The original workflow kept its options in a dynamic, string-keyed
//! settings bag; here they are a typed structure enumerated once at
//! startup and validated against the schema. Settings gate optional
//! behaviour in the import/embed callers, never in the core geometry,
//! colour, or extraction algorithms.

use crate::error::{Error, Result};
use crate::record::IdentityMode;

/// Workflow configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Identity token appended to generated blocks and checked when
    /// looking for duplicates.
    pub marker: String,

    /// Skip records whose identity is already marked processed.
    pub check_duplicate: bool,

    /// Replace an existing notes page on import instead of appending.
    pub overwrite_existing: bool,

    /// After embedding, also hand the updated PDF bytes back for an
    /// exported copy.
    pub export_embedded_copy: bool,

    /// How extraction assigns identity tokens.
    pub identity_mode: IdentityMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl Settings {
    /// Create settings with the workflow defaults.
    pub fn new() -> Self {
        Self {
            marker: "pam".to_string(),
            check_duplicate: true,
            overwrite_existing: false,
            export_embedded_copy: false,
            identity_mode: IdentityMode::Fresh,
        }
    }

    /// Set the duplicate marker.
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Enable or disable duplicate checking.
    pub fn with_check_duplicate(mut self, enable: bool) -> Self {
        self.check_duplicate = enable;
        self
    }

    /// Enable or disable overwriting existing notes on import.
    pub fn with_overwrite_existing(mut self, enable: bool) -> Self {
        self.overwrite_existing = enable;
        self
    }

    /// Enable or disable the exported embedded copy.
    pub fn with_export_embedded_copy(mut self, enable: bool) -> Self {
        self.export_embedded_copy = enable;
        self
    }

    /// Choose the identity assignment strategy.
    pub fn with_identity_mode(mut self, mode: IdentityMode) -> Self {
        self.identity_mode = mode;
        self
    }

    /// Validate the settings once at startup.
    ///
    /// The marker doubles as the duplicate-check property name, so it
    /// must be a non-empty token without whitespace.
    ///
    /// # Errors
    ///
    /// [`Error::Interchange`] describing the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.marker.is_empty() || self.marker.chars().any(char::is_whitespace) {
            return Err(Error::Interchange(format!(
                "invalid marker {:?}: must be a non-empty token without whitespace",
                self.marker
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_workflow() {
        let settings = Settings::new();
        assert_eq!(settings.marker, "pam");
        assert!(settings.check_duplicate);
        assert!(!settings.overwrite_existing);
        assert!(!settings.export_embedded_copy);
        assert_eq!(settings.identity_mode, IdentityMode::Fresh);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let settings = Settings::new()
            .with_marker("imported")
            .with_check_duplicate(false)
            .with_overwrite_existing(true)
            .with_export_embedded_copy(true)
            .with_identity_mode(IdentityMode::ContentDerived);
        assert_eq!(settings.marker, "imported");
        assert!(!settings.check_duplicate);
        assert!(settings.overwrite_existing);
        assert!(settings.export_embedded_copy);
        assert_eq!(settings.identity_mode, IdentityMode::ContentDerived);
    }

    #[test]
    fn test_invalid_marker_is_rejected() {
        assert!(Settings::new().with_marker("").validate().is_err());
        assert!(Settings::new().with_marker("two words").validate().is_err());
    }
}
