//! Zone geometry: rectangles, the editable zone model and default placement
//!
//! - `Rect` is a plain axis-aligned box with a top-left origin
//! - `ZoneGeometry` is the mutable record the editing surface manipulates
//! - `placement` lays out newly created zones on an implicit grid

mod placement;
mod zone;

pub use placement::*;
pub use zone::*;

use crate::types::{Result, ZoneError};

/// A rectangular area, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    /// X position (left edge)
    pub x: f64,
    /// Y position (top edge)
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge x coordinate
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge y coordinate
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Center x coordinate
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    /// Center y coordinate
    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Scale position and size independently per axis
    pub fn scale(&self, sx: f64, sy: f64) -> Rect {
        Rect::new(self.x * sx, self.y * sy, self.width * sx, self.height * sy)
    }

    /// Shrink (positive) or grow (negative) every edge by the given amounts
    pub fn inset(&self, top: f64, right: f64, bottom: f64, left: f64) -> Rect {
        Rect::new(
            self.x + left,
            self.y + top,
            self.width - left - right,
            self.height - top - bottom,
        )
    }

    /// Whether the two rectangles share any area
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Fail with `DegenerateGeometry` unless both axes are strictly positive
    pub fn ensure_positive(&self) -> Result<()> {
        if self.width > 0.0 && self.height > 0.0 {
            Ok(())
        } else {
            Err(ZoneError::DegenerateGeometry {
                width: self.width,
                height: self.height,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_and_center() {
        let rect = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(rect.right(), 110.0);
        assert_eq!(rect.bottom(), 70.0);
        assert_eq!(rect.center_x(), 60.0);
        assert_eq!(rect.center_y(), 45.0);
    }

    #[test]
    fn test_inset_negative_grows() {
        let rect = Rect::new(10.0, 10.0, 100.0, 100.0);
        let grown = rect.inset(-5.0, -5.0, -5.0, -5.0);
        assert_eq!(grown, Rect::new(5.0, 5.0, 110.0, 110.0));
    }

    #[test]
    fn test_intersects() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Rect::new(5.0, 5.0, 10.0, 10.0)));
        // Touching edges do not overlap
        assert!(!a.intersects(&Rect::new(10.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn test_ensure_positive() {
        assert!(Rect::new(0.0, 0.0, 1.0, 1.0).ensure_positive().is_ok());
        assert!(Rect::new(0.0, 0.0, 0.0, 1.0).ensure_positive().is_err());
        assert!(Rect::new(0.0, 0.0, 1.0, -5.0).ensure_positive().is_err());
    }
}
