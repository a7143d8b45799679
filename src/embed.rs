//! Embedding canonical records into a PDF's annotation layer.
//!
//! Each record is re-normalized from its capture geometry to the target
//! page's geometry, converted to quad points, and written as a brand
//! new `Highlight` annotation. Pre-existing annotations are never
//! edited or removed. The updated document is persisted as an
//! incremental revision: the original bytes are kept verbatim and the
//! new objects are appended.

use lopdf::{dictionary, Document, IncrementalDocument, Object, ObjectId};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::extract::page_size;
use crate::geometry::{normalize, Origin, PageSize, Rect};
use crate::record::HighlightRecord;

/// Embedding input: one highlight with its colour already resolved to
/// an RGB triple.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedRequest {
    /// 1-based page number to place the highlight on.
    pub page: u32,
    /// Page size the rectangle was captured against.
    pub page_size: PageSize,
    /// Rectangle in top-left-origin coordinates relative to `page_size`.
    pub rect: Rect,
    /// Resolved RGB colour.
    pub color: (u8, u8, u8),
    /// Optional author written to the annotation's title entry.
    pub author: Option<String>,
    /// Identity token, reported on failure.
    pub id: Uuid,
}

impl From<&HighlightRecord> for EmbedRequest {
    fn from(record: &HighlightRecord) -> Self {
        Self {
            page: record.page,
            page_size: record.page_size,
            rect: record.rect,
            color: record.color.rgb(),
            author: record.author.clone(),
            id: record.id,
        }
    }
}

/// The record's rectangle in the target page's top-left-origin
/// coordinate system.
///
/// Scale step only: canonical records never store native-origin rects,
/// so both sides are already top-left here.
fn normalized_placement(req: &EmbedRequest, target: &PageSize) -> Result<Rect> {
    normalize(
        req.rect,
        &req.page_size,
        Origin::TopLeft,
        target,
        Origin::TopLeft,
    )
}

/// Embed `requests` into `pdf_bytes`, in the given order, and return
/// the bytes of the incrementally updated document.
///
/// Application is strictly sequential; the underlying document state
/// machine is not safe for concurrent mutation. A request referencing
/// a page the target does not have aborts the pass with
/// [`Error::Embed`] carrying that request's identity; nothing is
/// persisted in that case (whether to keep earlier partial work is the
/// caller's decision, and this function only returns bytes on full
/// success).
///
/// # Errors
///
/// - [`Error::DocumentParse`] if `pdf_bytes` is not an openable PDF.
/// - [`Error::Embed`] for the first out-of-range page reference.
pub fn embed_highlights(pdf_bytes: &[u8], requests: &[EmbedRequest]) -> Result<Vec<u8>> {
    let prev = Document::load_mem(pdf_bytes)?;
    let mut doc = IncrementalDocument::create_from(pdf_bytes.to_vec(), prev);
    // New object ids must continue after the previous revision's.
    doc.new_document.max_id = doc.get_prev_documents().max_id;

    let pages = doc.get_prev_documents().get_pages();
    for req in requests {
        let page_id = *pages.get(&req.page).ok_or(Error::Embed {
            identity: req.id,
            page: req.page,
        })?;
        apply_request(&mut doc, page_id, req)?;
        log::debug!("Embedded highlight {} on page {}", req.id, req.page);
    }

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

fn apply_request(doc: &mut IncrementalDocument, page_id: ObjectId, req: &EmbedRequest) -> Result<()> {
    let target_size = page_size(doc.get_prev_documents(), page_id)?;
    let rect = normalized_placement(req, &target_size)?;

    // The annotation dictionary itself is PDF-native: flip back to the
    // bottom-left convention before writing Rect and QuadPoints.
    let native = Rect::new(
        rect.x0,
        target_size.height - rect.y1,
        rect.x1,
        target_size.height - rect.y0,
    );
    let native_quad = [
        native.x0, native.y1, // upper left (y grows upward here)
        native.x1, native.y1, // upper right
        native.x0, native.y0, // lower left
        native.x1, native.y0, // lower right
    ];

    let mut annot = dictionary! {
        "Type" => "Annot",
        "Subtype" => "Highlight",
        "Rect" => Object::Array(
            native.to_array().iter().map(|v| Object::Real(*v as f32)).collect(),
        ),
        "QuadPoints" => Object::Array(
            native_quad.iter().map(|v| Object::Real(*v as f32)).collect(),
        ),
        "C" => Object::Array(vec![
            Object::Real(req.color.0 as f32 / 255.0),
            Object::Real(req.color.1 as f32 / 255.0),
            Object::Real(req.color.2 as f32 / 255.0),
        ]),
    };
    if let Some(author) = &req.author {
        annot.set("T", Object::string_literal(author.as_str()));
    }
    let annot_id = doc.new_document.add_object(Object::Dictionary(annot));

    // Bring the page into the new revision and append to its /Annots.
    // Existing entries are carried over untouched; when the previous
    // revision stored them behind a reference, the array is resolved
    // from there.
    doc.opt_clone_object_to_new_document(page_id)?;
    let existing: Vec<Object> = {
        let page_dict = doc.new_document.get_object(page_id)?.as_dict()?;
        match page_dict.get(b"Annots") {
            Ok(Object::Array(arr)) => arr.clone(),
            Ok(Object::Reference(r)) => match doc.get_prev_documents().get_object(*r) {
                Ok(Object::Array(arr)) => arr.clone(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    };

    let mut annots = existing;
    annots.push(Object::Reference(annot_id));
    let page_dict = doc.new_document.get_object_mut(page_id)?.as_dict_mut()?;
    page_dict.set("Annots", Object::Array(annots));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a document with the given page sizes and save it to bytes.
    fn pdf_with_pages(sizes: &[(f64, f64)]) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let mut kids = Vec::new();
        let mut page_ids = Vec::new();
        for (w, h) in sizes {
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "MediaBox" => Object::Array(vec![
                    Object::Real(0.0), Object::Real(0.0),
                    Object::Real(*w as f32), Object::Real(*h as f32),
                ]),
            });
            kids.push(Object::Reference(page_id));
            page_ids.push(page_id);
        }
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => sizes.len() as i64,
        });
        for page_id in page_ids {
            if let Ok(page) = doc.get_object_mut(page_id) {
                if let Ok(dict) = page.as_dict_mut() {
                    dict.set("Parent", Object::Reference(pages_id));
                }
            }
        }
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn request(page: u32) -> EmbedRequest {
        EmbedRequest {
            page,
            page_size: PageSize::new(612.0, 792.0),
            rect: Rect::new(100.0, 42.0, 300.0, 92.0),
            color: (255, 255, 0),
            author: Some("Reviewer".to_string()),
            id: Uuid::new_v4(),
        }
    }

    fn as_f64(obj: &Object) -> f64 {
        match obj {
            Object::Integer(i) => *i as f64,
            Object::Real(f) => *f as f64,
            other => panic!("not a number: {other:?}"),
        }
    }

    fn number_array(dict: &lopdf::Dictionary, key: &[u8]) -> Vec<f64> {
        dict.get(key)
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(as_f64)
            .collect()
    }

    fn highlight_dicts(doc: &Document, page: u32) -> Vec<lopdf::Dictionary> {
        let pages = doc.get_pages();
        let page_id = pages[&page];
        let page_dict = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let mut found = Vec::new();
        if let Ok(Object::Array(annots)) = page_dict.get(b"Annots") {
            for entry in annots {
                if let Object::Reference(r) = entry {
                    if let Ok(Object::Dictionary(dict)) = doc.get_object(*r) {
                        if matches!(dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Highlight")
                        {
                            found.push(dict.clone());
                        }
                    }
                }
            }
        }
        found
    }

    #[test]
    fn test_update_is_append_only() {
        let original = pdf_with_pages(&[(612.0, 792.0)]);
        let updated = embed_highlights(&original, &[request(1)]).unwrap();
        // Incremental revision: the original bytes survive verbatim as
        // a prefix of the updated file.
        assert!(updated.len() > original.len());
        assert_eq!(&updated[..original.len()], &original[..]);
    }

    #[test]
    fn test_embed_on_page_one_boundary() {
        let original = pdf_with_pages(&[(612.0, 792.0)]);
        let updated = embed_highlights(&original, &[request(1)]).unwrap();
        let doc = Document::load_mem(&updated).unwrap();
        assert_eq!(highlight_dicts(&doc, 1).len(), 1);
    }

    #[test]
    fn test_written_geometry_is_scaled_and_pdf_native() {
        // Same-orientation 2x target: top-left [100,700,300,750] scales
        // to [200,1400,600,1500], written as bottom-left
        // [200, 84, 600, 184] against H = 1584.
        let original = pdf_with_pages(&[(1224.0, 1584.0)]);
        let mut req = request(1);
        req.rect = Rect::new(100.0, 700.0, 300.0, 750.0);
        let updated = embed_highlights(&original, &[req]).unwrap();
        let doc = Document::load_mem(&updated).unwrap();
        let annot = &highlight_dicts(&doc, 1)[0];

        let rect = number_array(annot, b"Rect");
        assert_eq!(rect, vec![200.0, 84.0, 600.0, 184.0]);

        let quad = number_array(annot, b"QuadPoints");
        assert_eq!(
            quad,
            vec![200.0, 184.0, 600.0, 184.0, 200.0, 84.0, 600.0, 84.0]
        );
    }

    #[test]
    fn test_colour_and_author_are_written() {
        let original = pdf_with_pages(&[(612.0, 792.0)]);
        let updated = embed_highlights(&original, &[request(1)]).unwrap();
        let doc = Document::load_mem(&updated).unwrap();
        let annot = &highlight_dicts(&doc, 1)[0];

        let c = number_array(annot, b"C");
        assert_eq!(c, vec![1.0, 1.0, 0.0]);
        assert!(
            matches!(annot.get(b"T"), Ok(Object::String(bytes, _)) if bytes == b"Reviewer")
        );
    }

    #[test]
    fn test_out_of_range_page_fails_with_identity() {
        let original = pdf_with_pages(&[(612.0, 792.0)]);
        let bad = request(2);
        let bad_id = bad.id;
        let err = embed_highlights(&original, &[request(1), bad]).unwrap_err();
        match err {
            Error::Embed { identity, page } => {
                assert_eq!(identity, bad_id);
                assert_eq!(page, 2);
            },
            other => panic!("expected Embed error, got {other}"),
        }
    }

    #[test]
    fn test_multiple_records_on_one_page_all_land() {
        let original = pdf_with_pages(&[(612.0, 792.0)]);
        let updated =
            embed_highlights(&original, &[request(1), request(1), request(1)]).unwrap();
        let doc = Document::load_mem(&updated).unwrap();
        assert_eq!(highlight_dicts(&doc, 1).len(), 3);
    }

    #[test]
    fn test_records_spread_across_pages() {
        let original = pdf_with_pages(&[(612.0, 792.0), (612.0, 792.0)]);
        let updated = embed_highlights(&original, &[request(2), request(1)]).unwrap();
        let doc = Document::load_mem(&updated).unwrap();
        assert_eq!(highlight_dicts(&doc, 1).len(), 1);
        assert_eq!(highlight_dicts(&doc, 2).len(), 1);
    }

    #[test]
    fn test_request_from_record_resolves_palette_colour() {
        let record = HighlightRecord {
            page: 1,
            page_size: PageSize::new(612.0, 792.0),
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            color: crate::color::ColorName::Purple,
            author: None,
            text: None,
            id: Uuid::new_v4(),
        };
        let req = EmbedRequest::from(&record);
        assert_eq!(req.color, (128, 0, 128));
    }
}
