//! Asset location and scoped file access.
//!
//! The workflow's documents live in an assets directory owned by the
//! note-taking host. The PDF to operate on is named by the first
//! Markdown-style link in a block's text; sidecar files (the EDN
//! interchange document and the generated notes file) derive their
//! names from the PDF's by exact extension substitution.
//!
//! Directory access follows an ask-once-per-session model: the
//! directory handle is validated when acquired and then reused for the
//! process lifetime, while individual file reads and writes are scoped
//! acquisitions validated per call.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};

lazy_static! {
    /// Matches the target of a Markdown link ending in `.pdf`.
    static ref PDF_LINK: Regex = Regex::new(r"\]\(([^)]+\.pdf)").unwrap();
}

/// Extract the relative PDF path from a block's text content.
///
/// Only the first match is used when the blob holds multiple links.
///
/// # Examples
///
/// ```
/// use hlsync::assets::resolve_pdf_path;
///
/// let block = "notes ![paper.pdf](../assets/paper.pdf) and more";
/// assert_eq!(resolve_pdf_path(block), Some("../assets/paper.pdf".to_string()));
/// assert_eq!(resolve_pdf_path("no links here"), None);
/// ```
pub fn resolve_pdf_path(block_content: &str) -> Option<String> {
    PDF_LINK
        .captures(block_content)
        .map(|caps| caps[1].to_string())
}

/// The final path segment of a resolved PDF path.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Derive a sidecar filename by substituting the `.pdf` extension.
///
/// Exact string substitution, not a path-aware rename: `name.pdf`
/// becomes `name.edn` or `name.md`. Names without the extension are
/// returned with the new extension appended.
pub fn sidecar_name(pdf_name: &str, extension: &str) -> String {
    match pdf_name.strip_suffix(".pdf") {
        Some(stem) => format!("{}.{}", stem, extension),
        None => format!("{}.{}", pdf_name, extension),
    }
}

/// A process-lifetime assets-directory session.
///
/// Holds the directory handle once acquired; `acquire` validates it
/// (existence and readability) and caches it, `get` hands it back
/// without re-prompting. The handle is never revoked programmatically.
#[derive(Debug, Default)]
pub struct AssetSession {
    dir: Option<PathBuf>,
}

impl AssetSession {
    /// Create a session with no directory acquired yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and cache the assets directory.
    ///
    /// Re-acquiring with a directory already held keeps the held one;
    /// ask once per session.
    ///
    /// # Errors
    ///
    /// [`Error::Permission`] when the directory is unreadable,
    /// [`Error::MissingAsset`] when it does not exist or is not a
    /// directory.
    pub fn acquire(&mut self, dir: impl Into<PathBuf>) -> Result<&Path> {
        if self.dir.is_none() {
            let dir = dir.into();
            match fs::read_dir(&dir) {
                Ok(_) => {},
                Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                    return Err(Error::Permission {
                        path: dir.display().to_string(),
                    });
                },
                Err(_) => {
                    return Err(Error::MissingAsset(dir.display().to_string()));
                },
            }
            self.dir = Some(dir);
        }
        Ok(self.dir.as_deref().unwrap_or(Path::new("")))
    }

    /// The held directory, if one was acquired.
    pub fn get(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    fn resolve(&self, name: &str) -> Result<PathBuf> {
        let dir = self
            .dir
            .as_deref()
            .ok_or_else(|| Error::MissingAsset("no assets directory acquired".to_string()))?;
        Ok(dir.join(name))
    }

    /// Read a file from the assets directory. The handle is validated
    /// for this call only and not cached.
    ///
    /// # Errors
    ///
    /// [`Error::Permission`] on access denial, [`Error::MissingAsset`]
    /// when the file does not exist.
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.resolve(name)?;
        fs::read(&path).map_err(|e| file_error(e, &path))
    }

    /// Read a file as UTF-8 text.
    pub fn read_text(&self, name: &str) -> Result<String> {
        let path = self.resolve(name)?;
        fs::read_to_string(&path).map_err(|e| file_error(e, &path))
    }

    /// Write a file into the assets directory, replacing any previous
    /// content.
    pub fn write(&self, name: &str, contents: &[u8]) -> Result<()> {
        let path = self.resolve(name)?;
        fs::write(&path, contents).map_err(|e| file_error(e, &path))
    }
}

fn file_error(e: std::io::Error, path: &Path) -> Error {
    match e.kind() {
        ErrorKind::PermissionDenied => Error::Permission {
            path: path.display().to_string(),
        },
        ErrorKind::NotFound => Error::MissingAsset(path.display().to_string()),
        _ => Error::Io(e),
    }
}
