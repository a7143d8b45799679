//! Page-coordinate normalization.
//!
//! Highlight rectangles live in two coordinate conventions: PDF-native
//! annotation rectangles are bottom-left-origin, while the canonical
//! record model (and the note-taking host it feeds) is top-left-origin.
//! Extraction and embedding may also see pages of different sizes on
//! each side, so rectangles are rescaled componentwise between page
//! geometries. Rotated pages (90/270) report swapped dimensions before
//! any scale factor is derived.

use crate::error::{Error, Result};

/// Page dimensions in page-native units (points).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    /// Page width in points
    pub width: f64,
    /// Page height in points
    pub height: f64,
}

impl PageSize {
    /// Create a new page size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Create a page size honouring the page's /Rotate entry.
    ///
    /// For 90 and 270 degree rotations width and height are swapped.
    /// This must happen before any scale-factor derivation, otherwise
    /// the aspect ratio of normalized rectangles is corrupted.
    ///
    /// # Examples
    ///
    /// ```
    /// use hlsync::geometry::PageSize;
    ///
    /// let size = PageSize::with_rotation(612.0, 792.0, 90);
    /// assert_eq!(size.width, 792.0);
    /// assert_eq!(size.height, 612.0);
    /// ```
    pub fn with_rotation(width: f64, height: f64, rotate: i64) -> Self {
        let rotate = rotate.rem_euclid(360);
        if rotate == 90 || rotate == 270 {
            Self::new(height, width)
        } else {
            Self::new(width, height)
        }
    }

    /// Whether both dimensions are positive.
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    fn ensure_valid(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(Error::Geometry {
                width: self.width,
                height: self.height,
            })
        }
    }
}

/// Which corner of the page a rectangle's coordinates are measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// PDF-native convention: y grows upward from the bottom-left corner.
    BottomLeft,
    /// Canonical convention: y grows downward from the top-left corner.
    TopLeft,
}

/// An axis-aligned rectangle `[x0, y0, x1, y1]`.
///
/// The coordinate system and origin convention are stated by whoever
/// holds the rectangle; `x0 <= x1` always, and `y0 <= y1` within a
/// single convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Left edge
    pub x0: f64,
    /// First y edge (bottom in bottom-left origin, top in top-left)
    pub y0: f64,
    /// Right edge
    pub x1: f64,
    /// Second y edge
    pub y1: f64,
}

impl Rect {
    /// Create a rectangle from its four edges.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Create a rectangle from a `[x0, y0, x1, y1]` array.
    pub fn from_array(a: [f64; 4]) -> Self {
        Self::new(a[0], a[1], a[2], a[3])
    }

    /// The rectangle as a `[x0, y0, x1, y1]` array.
    pub fn to_array(&self) -> [f64; 4] {
        [self.x0, self.y0, self.x1, self.y1]
    }

    /// Rectangle width.
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Rectangle height.
    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Convert to the 8-tuple quad points the highlight-annotation
    /// primitive requires: `(ulx,uly, urx,ury, llx,lly, lrx,lry)`.
    ///
    /// One quad per rectangle; multi-rect highlights use one quad per
    /// rect, though only the first rect of a highlight's rect list is
    /// carried through this system.
    ///
    /// # Examples
    ///
    /// ```
    /// use hlsync::geometry::Rect;
    ///
    /// let quad = Rect::new(200.0, 1400.0, 600.0, 1500.0).to_quad_points();
    /// assert_eq!(quad, [200.0, 1400.0, 600.0, 1400.0, 200.0, 1500.0, 600.0, 1500.0]);
    /// ```
    pub fn to_quad_points(&self) -> [f64; 8] {
        [
            self.x0, self.y0, // upper left
            self.x1, self.y0, // upper right
            self.x0, self.y1, // lower left
            self.x1, self.y1, // lower right
        ]
    }
}

/// Convert a rectangle between two page coordinate systems.
///
/// Two steps, in order:
///
/// 1. Origin flip, when `source_origin != target_origin`: each y edge
///    maps through `y' = H - y` against the source page height, and the
///    two y edges swap so the invariant `y0 <= y1` holds in the target
///    convention. Rectangle height is preserved.
/// 2. Componentwise scale by `target.width / source.width` and
///    `target.height / source.height`. For identical page sizes the
///    factors are exactly 1 and the rectangle is unchanged.
///
/// Rotated source pages must be described with [`PageSize::with_rotation`]
/// so the swap has already happened by the time factors are derived.
///
/// # Errors
///
/// Returns [`Error::Geometry`] if either page size has a non-positive
/// dimension.
///
/// # Examples
///
/// ```
/// use hlsync::geometry::{normalize, Origin, PageSize, Rect};
///
/// // 2x upscale, both sides already top-left origin.
/// let rect = Rect::new(100.0, 700.0, 300.0, 750.0);
/// let out = normalize(
///     rect,
///     &PageSize::new(612.0, 792.0),
///     Origin::TopLeft,
///     &PageSize::new(1224.0, 1584.0),
///     Origin::TopLeft,
/// )?;
/// assert_eq!(out.to_array(), [200.0, 1400.0, 600.0, 1500.0]);
/// # Ok::<(), hlsync::error::Error>(())
/// ```
pub fn normalize(
    rect: Rect,
    source: &PageSize,
    source_origin: Origin,
    target: &PageSize,
    target_origin: Origin,
) -> Result<Rect> {
    source.ensure_valid()?;
    target.ensure_valid()?;

    let flipped = if source_origin != target_origin {
        // y edges flip against the source height and swap so the output
        // keeps y0 <= y1 in the target convention.
        Rect::new(
            rect.x0,
            source.height - rect.y1,
            rect.x1,
            source.height - rect.y0,
        )
    } else {
        rect
    };

    let scale_x = target.width / source.width;
    let scale_y = target.height / source.height;
    Ok(Rect::new(
        flipped.x0 * scale_x,
        flipped.y0 * scale_y,
        flipped.x1 * scale_x,
        flipped.y1 * scale_y,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_rect_eq(a: Rect, b: [f64; 4]) {
        let a = a.to_array();
        for i in 0..4 {
            assert!((a[i] - b[i]).abs() < EPS, "edge {}: {} != {}", i, a[i], b[i]);
        }
    }

    #[test]
    fn test_origin_flip_preserves_height() {
        let page = PageSize::new(612.0, 792.0);
        let rect = Rect::new(100.0, 700.0, 300.0, 750.0);
        let flipped =
            normalize(rect, &page, Origin::BottomLeft, &page, Origin::TopLeft).unwrap();
        assert_rect_eq(flipped, [100.0, 42.0, 300.0, 92.0]);
        assert!((flipped.height() - rect.height()).abs() < EPS);
    }

    #[test]
    fn test_origin_flip_round_trips() {
        let page = PageSize::new(595.0, 842.0);
        let rect = Rect::new(72.0, 100.5, 523.0, 130.25);
        let there = normalize(rect, &page, Origin::BottomLeft, &page, Origin::TopLeft).unwrap();
        let back = normalize(there, &page, Origin::TopLeft, &page, Origin::BottomLeft).unwrap();
        assert_rect_eq(back, rect.to_array());
    }

    #[test]
    fn test_identical_sizes_scale_is_exact_identity() {
        let page = PageSize::new(612.0, 792.0);
        let rect = Rect::new(10.0, 20.0, 30.0, 40.0);
        let out = normalize(rect, &page, Origin::TopLeft, &page, Origin::TopLeft).unwrap();
        // Exact, not within-epsilon: factors must be exactly 1.
        assert_eq!(out, rect);
    }

    #[test]
    fn test_two_x_scale_matches_reference_values() {
        let out = normalize(
            Rect::new(100.0, 700.0, 300.0, 750.0),
            &PageSize::new(612.0, 792.0),
            Origin::TopLeft,
            &PageSize::new(1224.0, 1584.0),
            Origin::TopLeft,
        )
        .unwrap();
        assert_rect_eq(out, [200.0, 1400.0, 600.0, 1500.0]);
        assert_eq!(
            out.to_quad_points(),
            [200.0, 1400.0, 600.0, 1400.0, 200.0, 1500.0, 600.0, 1500.0]
        );
    }

    #[test]
    fn test_rotated_page_swaps_dimensions() {
        assert_eq!(
            PageSize::with_rotation(612.0, 792.0, 270),
            PageSize::new(792.0, 612.0)
        );
        assert_eq!(
            PageSize::with_rotation(612.0, 792.0, 180),
            PageSize::new(612.0, 792.0)
        );
        // Rotation values normalize modulo 360.
        assert_eq!(
            PageSize::with_rotation(612.0, 792.0, 450),
            PageSize::new(792.0, 612.0)
        );
    }

    #[test]
    fn test_non_positive_dimension_is_geometry_error() {
        let bad = PageSize::new(0.0, 792.0);
        let good = PageSize::new(612.0, 792.0);
        let rect = Rect::new(0.0, 0.0, 1.0, 1.0);
        let err = normalize(rect, &bad, Origin::TopLeft, &good, Origin::TopLeft).unwrap_err();
        assert!(matches!(err, Error::Geometry { .. }));
        let err = normalize(rect, &good, Origin::TopLeft, &bad, Origin::TopLeft).unwrap_err();
        assert!(matches!(err, Error::Geometry { .. }));
    }

    #[test]
    fn test_quad_point_corner_order() {
        let quad = Rect::new(1.0, 2.0, 3.0, 4.0).to_quad_points();
        // (ulx,uly, urx,ury, llx,lly, lrx,lry)
        assert_eq!(quad, [1.0, 2.0, 3.0, 2.0, 1.0, 4.0, 3.0, 4.0]);
    }
}
