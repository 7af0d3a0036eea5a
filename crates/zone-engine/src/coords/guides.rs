//! Trim, bleed and safe-area guide lines on the editing canvas
//!
//! The canvas shows the trimmed page. Bleed extends past the canvas edges;
//! the safe area sits inside them. Guides are drawn only and never clip
//! zone geometry.

use super::CoordinateSystem;
use crate::dimensions::BleedSettings;
use crate::geometry::Rect;
use crate::units::Unit;

/// Guide rectangles in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideLines {
    /// Outer edge of the printed area including bleed
    pub bleed: Rect,
    /// Final page edge after trimming
    pub trim: Rect,
    /// Area content should stay inside
    pub safe: Rect,
}

/// Compute guides for the page shown by `system`
pub fn compute_guides(
    system: &CoordinateSystem,
    bleed: &BleedSettings,
    safe_margin_mm: f64,
) -> GuideLines {
    let (canvas_width, canvas_height) = system.canvas_size();
    let trim = Rect::new(0.0, 0.0, canvas_width, canvas_height);

    let horizontal = |length: f64, unit: Unit| system.physical_to_canvas(length, 0.0, unit).0;
    let vertical = |length: f64, unit: Unit| system.physical_to_canvas(0.0, length, unit).1;

    let bleed_rect = trim.inset(
        -vertical(bleed.top, bleed.unit),
        -horizontal(bleed.right, bleed.unit),
        -vertical(bleed.bottom, bleed.unit),
        -horizontal(bleed.left, bleed.unit),
    );

    let safe_x = horizontal(safe_margin_mm, Unit::Millimeter);
    let safe_y = vertical(safe_margin_mm, Unit::Millimeter);
    let safe = trim.inset(safe_y, safe_x, safe_y, safe_x);

    GuideLines {
        bleed: bleed_rect,
        trim,
        safe,
    }
}
