//! Generated notes content for the host's highlight pages.
//!
//! Each imported highlight becomes one block on a `hls__`-prefixed
//! notes page, carrying the host's annotation properties plus the
//! user's duplicate marker. Only the data is specified here; how the
//! host renders or stores blocks is its own business.

use crate::assets::sidecar_name;
use crate::dedup::dedup_namespace;
use crate::record::HighlightRecord;

/// The notes page title for a PDF, e.g. `hls__paper` for `paper.pdf`.
pub fn notes_page_title(pdf_name: &str) -> String {
    dedup_namespace(pdf_name)
}

/// The asset link line placed at the top of a fresh notes page.
pub fn asset_link(pdf_name: &str) -> String {
    format!("![{name}](../assets/{name})", name = pdf_name)
}

/// Render one highlight as a notes block.
///
/// The block body is the overlaid text (empty when none was captured)
/// followed by the annotation properties and the duplicate marker.
pub fn highlight_block(record: &HighlightRecord, marker: &str) -> String {
    format!(
        "{text}\n  ls-type:: annotation\n  hl-page:: {page}\n  hl-color:: {color}\n  id:: {id}\n  {marker}:: true",
        text = record.text.as_deref().unwrap_or(""),
        page = record.page,
        color = record.color,
        id = record.id,
        marker = marker,
    )
}

/// Render every record as notes blocks, in record order.
pub fn highlight_blocks(records: &[HighlightRecord], marker: &str) -> Vec<String> {
    records
        .iter()
        .map(|record| highlight_block(record, marker))
        .collect()
}

/// The generated notes filename for a PDF (`name.pdf` -> `name.md`).
pub fn notes_file_name(pdf_name: &str) -> String {
    sidecar_name(pdf_name, "md")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorName;
    use crate::geometry::{PageSize, Rect};
    use uuid::Uuid;

    fn sample_record() -> HighlightRecord {
        HighlightRecord {
            page: 4,
            page_size: PageSize::new(612.0, 792.0),
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            color: ColorName::Green,
            author: Some("Reviewer".to_string()),
            text: Some("the key sentence".to_string()),
            id: Uuid::parse_str("8fe019b1-77a9-4e23-a224-74db45f4cdb6").unwrap(),
        }
    }

    #[test]
    fn test_block_carries_all_annotation_properties() {
        let block = highlight_block(&sample_record(), "pam");
        assert!(block.starts_with("the key sentence\n"));
        assert!(block.contains("ls-type:: annotation"));
        assert!(block.contains("hl-page:: 4"));
        assert!(block.contains("hl-color:: green"));
        assert!(block.contains("id:: 8fe019b1-77a9-4e23-a224-74db45f4cdb6"));
        assert!(block.contains("pam:: true"));
    }

    #[test]
    fn test_block_without_text_keeps_properties() {
        let record = HighlightRecord {
            text: None,
            ..sample_record()
        };
        let block = highlight_block(&record, "pam");
        assert!(block.starts_with("\n  ls-type:: annotation"));
    }

    #[test]
    fn test_page_title_and_link_derivation() {
        assert_eq!(notes_page_title("paper.pdf"), "hls__paper");
        assert_eq!(asset_link("paper.pdf"), "![paper.pdf](../assets/paper.pdf)");
        assert_eq!(notes_file_name("paper.pdf"), "paper.md");
    }
}
