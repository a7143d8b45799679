//! Highlight extraction from a PDF's native annotation layer.
//!
//! Enumerates pages in ascending 1-based order, filters each page's
//! annotations to the `Highlight` subtype, and produces canonical
//! [`HighlightRecord`]s with top-left-origin rectangles, classified
//! palette colours, and freshly assigned identity tokens. Other markup
//! subtypes (underline, strikeout, ...) are skipped silently.

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::color::{classify, normalize_channels};
use crate::error::{Error, Result};
use crate::geometry::{normalize, Origin, PageSize, Rect};
use crate::record::{HighlightRecord, IdentityMode};

/// Extract every highlight annotation in the document.
///
/// Pages are visited ascending; within a page, annotations keep their
/// `/Annots` enumeration order. A document with zero highlight
/// annotations yields an empty vector, not an error.
///
/// # Errors
///
/// Returns [`Error::DocumentParse`](crate::error::Error::DocumentParse)
/// when the page tree itself is unreadable. Individual malformed
/// annotations are skipped with a warning instead of aborting the pass.
pub fn extract_highlights(doc: &Document, mode: IdentityMode) -> Result<Vec<HighlightRecord>> {
    let mut records = Vec::new();
    for (page_num, page_id) in doc.get_pages() {
        let page_size = page_size(doc, page_id)?;
        for annot in page_annotations(doc, page_id)? {
            match highlight_from_dict(annot, page_num, &page_size, mode) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}, // not a highlight
                Err(e) => {
                    log::warn!(
                        "Skipping malformed annotation on page {}: {}",
                        page_num,
                        e
                    );
                },
            }
        }
    }
    log::debug!("Extracted {} highlight record(s)", records.len());
    Ok(records)
}

/// Extract highlights from raw PDF bytes.
///
/// # Errors
///
/// Returns [`Error::DocumentParse`](crate::error::Error::DocumentParse)
/// if the bytes are not an openable PDF.
pub fn extract_from_bytes(bytes: &[u8], mode: IdentityMode) -> Result<Vec<HighlightRecord>> {
    let doc = Document::load_mem(bytes)?;
    extract_highlights(&doc, mode)
}

/// Look up a page attribute, walking `/Parent` links for inheritable
/// entries like `/MediaBox` and `/Rotate`.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Result<Option<&'a Object>> {
    let mut dict = doc.get_object(page_id)?.as_dict()?;
    loop {
        if let Ok(value) = dict.get(key) {
            return Ok(Some(value));
        }
        match dict.get(b"Parent") {
            Ok(parent) => {
                let parent_id = parent.as_reference()?;
                dict = doc.get_object(parent_id)?.as_dict()?;
            },
            Err(_) => return Ok(None),
        }
    }
}

fn object_to_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(*f as f64),
        _ => None,
    }
}

/// The page's size in points, post-rotation.
pub(crate) fn page_size(doc: &Document, page_id: ObjectId) -> Result<PageSize> {
    // A page without a MediaBox anywhere in its ancestry has no usable
    // dimensions to normalize against.
    let Some(media_box_obj) = inherited(doc, page_id, b"MediaBox")? else {
        return Err(Error::Geometry {
            width: 0.0,
            height: 0.0,
        });
    };
    let media_box = media_box_obj.as_array()?;
    let edge = |i: usize| media_box.get(i).and_then(object_to_f64).unwrap_or(0.0);
    let width = edge(2) - edge(0);
    let height = edge(3) - edge(1);

    let rotate = match inherited(doc, page_id, b"Rotate")? {
        Some(Object::Integer(deg)) => *deg,
        _ => 0,
    };
    Ok(PageSize::with_rotation(width, height, rotate))
}

/// The page's annotation dictionaries, in `/Annots` order. Entries may
/// be inline dictionaries or indirect references; both are accepted.
fn page_annotations<'a>(doc: &'a Document, page_id: ObjectId) -> Result<Vec<&'a Dictionary>> {
    let page_dict = doc.get_object(page_id)?.as_dict()?;
    let annots = match page_dict.get(b"Annots") {
        Ok(Object::Array(arr)) => arr,
        Ok(Object::Reference(r)) => match doc.get_object(*r)? {
            Object::Array(arr) => arr,
            _ => return Ok(Vec::new()),
        },
        _ => return Ok(Vec::new()),
    };

    let mut dicts = Vec::new();
    for entry in annots {
        match entry {
            Object::Dictionary(dict) => dicts.push(dict),
            Object::Reference(r) => {
                if let Ok(Object::Dictionary(dict)) = doc.get_object(*r) {
                    dicts.push(dict);
                }
            },
            _ => {},
        }
    }
    Ok(dicts)
}

fn dict_string(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key) {
        Ok(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).to_string()),
        _ => None,
    }
}

/// Build a canonical record from one annotation dictionary, or `None`
/// when the subtype is not exactly `Highlight`.
fn highlight_from_dict(
    dict: &Dictionary,
    page_num: u32,
    page_size: &PageSize,
    mode: IdentityMode,
) -> Result<Option<HighlightRecord>> {
    match dict.get(b"Subtype") {
        Ok(Object::Name(name)) if name == b"Highlight" => {},
        _ => return Ok(None),
    }

    let rect_arr = dict.get(b"Rect").and_then(Object::as_array)?;
    let edge = |i: usize| rect_arr.get(i).and_then(object_to_f64).unwrap_or(0.0);
    // Rect corners are not guaranteed ordered in the wild.
    let native = Rect::new(
        edge(0).min(edge(2)),
        edge(1).min(edge(3)),
        edge(0).max(edge(2)),
        edge(1).max(edge(3)),
    );
    // Source and target page are the same here: origin flip only.
    let rect = normalize(
        native,
        page_size,
        Origin::BottomLeft,
        page_size,
        Origin::TopLeft,
    )?;

    let channels: Vec<f64> = match dict.get(b"C") {
        Ok(Object::Array(arr)) => arr.iter().filter_map(object_to_f64).collect(),
        _ => Vec::new(),
    };
    let color = classify(normalize_channels(&channels));

    let author = dict_string(dict, b"T");
    let text = dict_string(dict, b"Contents").filter(|t| !t.is_empty());

    let id = HighlightRecord::assign_identity(mode, page_num, rect, color);
    Ok(Some(HighlightRecord {
        page: page_num,
        page_size: *page_size,
        rect,
        color,
        author,
        text,
        id,
    }))
}
