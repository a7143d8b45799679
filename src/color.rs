//! Colour classification against the closed highlight palette.
//!
//! Highlight colours sampled out of a PDF are rarely the exact palette
//! values the note-taking side understands, so every sampled RGB triple
//! is snapped to the nearest member of a fixed five-colour palette.
//! Nearest means smallest Delta-E in CIE Lab (a perceptually uniform
//! space), not raw Euclidean RGB distance; ties break toward the
//! earlier palette entry.

use palette::color_difference::EuclideanDistance;
use palette::{IntoColor, Lab, Srgb};

/// A member of the closed highlight palette.
///
/// The declaration order is the tie-break order for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorName {
    /// rgb(255, 0, 0)
    Red,
    /// rgb(0, 255, 0)
    Green,
    /// rgb(0, 0, 255)
    Blue,
    /// rgb(255, 255, 0)
    Yellow,
    /// rgb(128, 0, 128)
    Purple,
}

/// The palette in declaration (tie-break) order with canonical RGB values.
pub const PALETTE: [(ColorName, (u8, u8, u8)); 5] = [
    (ColorName::Red, (255, 0, 0)),
    (ColorName::Green, (0, 255, 0)),
    (ColorName::Blue, (0, 0, 255)),
    (ColorName::Yellow, (255, 255, 0)),
    (ColorName::Purple, (128, 0, 128)),
];

impl ColorName {
    /// The canonical RGB triple for this palette member.
    pub fn rgb(&self) -> (u8, u8, u8) {
        PALETTE
            .iter()
            .find(|(name, _)| name == self)
            .map(|(_, rgb)| *rgb)
            .unwrap_or((0, 0, 0))
    }

    /// The lowercase palette name used in interchange text.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorName::Red => "red",
            ColorName::Green => "green",
            ColorName::Blue => "blue",
            ColorName::Yellow => "yellow",
            ColorName::Purple => "purple",
        }
    }

    /// Parse an interchange colour name.
    pub fn from_str_name(name: &str) -> Option<Self> {
        match name {
            "red" => Some(ColorName::Red),
            "green" => Some(ColorName::Green),
            "blue" => Some(ColorName::Blue),
            "yellow" => Some(ColorName::Yellow),
            "purple" => Some(ColorName::Purple),
            _ => None,
        }
    }
}

impl std::fmt::Display for ColorName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn to_lab(rgb: (u8, u8, u8)) -> Lab {
    Srgb::new(
        rgb.0 as f32 / 255.0,
        rgb.1 as f32 / 255.0,
        rgb.2 as f32 / 255.0,
    )
    .into_color()
}

/// Map a sampled RGB colour to the nearest palette member.
///
/// Total over all inputs: even far-out-of-gamut colours resolve to a
/// palette member, never to "unknown". The palette's own canonical
/// values are fixed points.
///
/// # Examples
///
/// ```
/// use hlsync::color::{classify, ColorName};
///
/// assert_eq!(classify((255, 255, 0)), ColorName::Yellow);
/// assert_eq!(classify((250, 220, 40)), ColorName::Yellow);
/// ```
pub fn classify(rgb: (u8, u8, u8)) -> ColorName {
    let lab = to_lab(rgb);
    nearest(lab, &PALETTE)
}

/// Pick the candidate with minimum Lab distance; strict comparison so
/// earlier entries win ties (naive sorts are unstable here).
fn nearest(lab: Lab, candidates: &[(ColorName, (u8, u8, u8))]) -> ColorName {
    let mut best = candidates[0].0;
    let mut best_dist = f32::INFINITY;
    for (name, rgb) in candidates {
        let dist = lab.distance_squared(to_lab(*rgb));
        if dist < best_dist {
            best = *name;
            best_dist = dist;
        }
    }
    best
}

/// Normalize library-sampled colour channels to 0-255 integers.
///
/// PDF libraries expose annotation colours either as 0-1 floats (the
/// native /C entry scale) or as 0-255 values. Channels all at or below
/// 1.0 are treated as unit scale; anything else is taken as already
/// 0-255. Missing channels default to zero.
pub fn normalize_channels(channels: &[f64]) -> (u8, u8, u8) {
    let ch = |i: usize| -> f64 { channels.get(i).copied().unwrap_or(0.0) };
    let unit_scale = !channels.is_empty() && channels.iter().all(|c| *c <= 1.0);
    let convert = |v: f64| -> u8 {
        let v = if unit_scale { v * 255.0 } else { v };
        v.round().clamp(0.0, 255.0) as u8
    };
    (convert(ch(0)), convert(ch(1)), convert(ch(2)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_values_are_fixed_points() {
        for (name, rgb) in PALETTE {
            assert_eq!(classify(rgb), name, "palette colour {} moved", name);
        }
    }

    #[test]
    fn test_always_returns_a_palette_member() {
        // A coarse sweep over the cube; classification is total.
        for r in (0..=255).step_by(51) {
            for g in (0..=255).step_by(51) {
                for b in (0..=255).step_by(51) {
                    let name = classify((r as u8, g as u8, b as u8));
                    assert!(PALETTE.iter().any(|(n, _)| *n == name));
                }
            }
        }
    }

    #[test]
    fn test_near_misses_snap_to_expected_member() {
        assert_eq!(classify((250, 220, 40)), ColorName::Yellow);
        assert_eq!(classify((200, 30, 30)), ColorName::Red);
        assert_eq!(classify((40, 200, 60)), ColorName::Green);
        assert_eq!(classify((30, 40, 220)), ColorName::Blue);
        assert_eq!(classify((140, 20, 130)), ColorName::Purple);
    }

    #[test]
    fn test_tie_breaks_toward_earlier_palette_entry() {
        // Identical candidate colours produce identical distances; the
        // strict < comparison must keep the first one.
        let candidates = [
            (ColorName::Red, (10u8, 20u8, 30u8)),
            (ColorName::Green, (10u8, 20u8, 30u8)),
        ];
        assert_eq!(nearest(to_lab((10, 20, 30)), &candidates), ColorName::Red);
    }

    #[test]
    fn test_normalize_channels_unit_scale() {
        assert_eq!(normalize_channels(&[1.0, 1.0, 0.0]), (255, 255, 0));
        assert_eq!(normalize_channels(&[0.5, 0.0, 0.5]), (128, 0, 128));
    }

    #[test]
    fn test_normalize_channels_byte_scale() {
        assert_eq!(normalize_channels(&[255.0, 0.0, 0.0]), (255, 0, 0));
        assert_eq!(normalize_channels(&[128.0, 0.0, 128.0]), (128, 0, 128));
    }

    #[test]
    fn test_normalize_channels_short_or_empty() {
        assert_eq!(normalize_channels(&[]), (0, 0, 0));
        assert_eq!(normalize_channels(&[1.0]), (255, 0, 0));
    }

    #[test]
    fn test_name_round_trip() {
        for (name, _) in PALETTE {
            assert_eq!(ColorName::from_str_name(name.as_str()), Some(name));
        }
        assert_eq!(ColorName::from_str_name("chartreuse"), None);
    }
}
