//! Pure value-extraction pipeline: pixel offset → unit interval → derived values.
//!
//! Everything here is side-effect free. The sampler feeds in validated raw
//! readings; this module turns them into the normalized index, the shifted
//! seed value, and the color label shown on the chart legend.

use serde::{Deserialize, Serialize};

/// Map a marker offset into `[0.0, 1.0]` by linear interpolation against the
/// container height.
///
/// Valid inputs satisfy `0 <= raw_offset < container_height` (the sampler
/// retries overflowed readings before they reach this point), so the clamp
/// only guards against float noise at the edges.
pub fn normalize(raw_offset: f64, container_height: f64) -> f64 {
    (raw_offset / container_height).clamp(0.0, 1.0)
}

/// Derive the shifted seed value from the decimal digits of a normalized value.
///
/// The decimal text of the value is taken; if it is longer than 3 characters
/// (`0.X…`), the digits from index 3 onward become the fractional digits of a
/// new value in `[0, 1]`. Shorter values pass through unchanged. The shift
/// decouples the seed from the coarse dot position, which moves slowly.
pub fn shifted_value(normalized: f64) -> f64 {
    let text = format!("{normalized}");
    if text.len() > 3 {
        format!("0.{}", &text[3..]).parse().unwrap_or(normalized)
    } else {
        normalized
    }
}

/// Color bucket of a normalized dot position, matching the chart legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorLabel {
    Gray,
    Red,
    Orange,
    Yellow,
    Green,
    Teal,
    Blue,
}

impl std::fmt::Display for ColorLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gray => write!(f, "gray"),
            Self::Red => write!(f, "red"),
            Self::Orange => write!(f, "orange"),
            Self::Yellow => write!(f, "yellow"),
            Self::Green => write!(f, "green"),
            Self::Teal => write!(f, "teal"),
            Self::Blue => write!(f, "blue"),
        }
    }
}

impl ColorLabel {
    /// CSS color used when rendering the label.
    pub fn css(self) -> &'static str {
        match self {
            Self::Gray => "#9e9e9e",
            Self::Red => "#e53935",
            Self::Orange => "#fb8c00",
            Self::Yellow => "#fdd835",
            Self::Green => "#43a047",
            Self::Teal => "#00897b",
            Self::Blue => "#1e88e5",
        }
    }
}

/// Total mapping from normalized value to color label.
///
/// Branches are evaluated top-down, so the boundary values 0.90 and 0.95
/// (which the legend lists under two buckets) resolve to teal. Values outside
/// `[0, 1]` fall back to gray.
pub fn color_label(value: f64) -> ColorLabel {
    if value == 0.0 {
        ColorLabel::Gray
    } else if value < 0.05 {
        ColorLabel::Red
    } else if value < 0.10 {
        ColorLabel::Orange
    } else if value < 0.40 {
        ColorLabel::Yellow
    } else if value < 0.90 {
        ColorLabel::Green
    } else if value <= 0.95 {
        ColorLabel::Teal
    } else if value <= 1.0 {
        ColorLabel::Blue
    } else {
        ColorLabel::Gray
    }
}
