//! Default placement for newly created zones
//!
//! Zones created in quick succession are laid out on an implicit grid
//! instead of stacking at one origin. The grid cell is large enough for
//! either zone type, so an image zone never lands on top of a text zone.

use super::Rect;
use crate::constants::{
    DEFAULT_IMAGE_ZONE_HEIGHT, DEFAULT_IMAGE_ZONE_WIDTH, DEFAULT_TEXT_ZONE_HEIGHT,
    DEFAULT_TEXT_ZONE_WIDTH, PLACEMENT_GRID_COLUMNS, PLACEMENT_GRID_ORIGIN, PLACEMENT_GRID_SPACING,
};
use crate::types::ZoneType;

/// Default zone sizes per type, in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZoneDefaults {
    pub image_size: (f64, f64),
    pub text_size: (f64, f64),
}

impl Default for ZoneDefaults {
    fn default() -> Self {
        Self {
            image_size: (DEFAULT_IMAGE_ZONE_WIDTH, DEFAULT_IMAGE_ZONE_HEIGHT),
            text_size: (DEFAULT_TEXT_ZONE_WIDTH, DEFAULT_TEXT_ZONE_HEIGHT),
        }
    }
}

impl ZoneDefaults {
    pub fn size_for(&self, zone_type: ZoneType) -> (f64, f64) {
        match zone_type {
            ZoneType::Image => self.image_size,
            ZoneType::Text => self.text_size,
        }
    }

    /// The largest default footprint of any type
    fn cell_size(&self) -> (f64, f64) {
        (
            self.image_size.0.max(self.text_size.0),
            self.image_size.1.max(self.text_size.1),
        )
    }
}

/// Grid used to place new zones
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlacementGrid {
    pub columns: usize,
    pub origin: (f64, f64),
    pub spacing: f64,
}

impl Default for PlacementGrid {
    fn default() -> Self {
        Self {
            columns: PLACEMENT_GRID_COLUMNS,
            origin: PLACEMENT_GRID_ORIGIN,
            spacing: PLACEMENT_GRID_SPACING,
        }
    }
}

impl PlacementGrid {
    /// Row and column of the `count`-th created zone (0-based)
    pub fn cell(&self, count: usize) -> (usize, usize) {
        let columns = self.columns.max(1);
        (count / columns, count % columns)
    }

    /// Initial geometry for the `count`-th created zone of the given type
    pub fn place(&self, count: usize, zone_type: ZoneType, defaults: &ZoneDefaults) -> Rect {
        let (row, col) = self.cell(count);
        let (cell_width, cell_height) = defaults.cell_size();
        let (width, height) = defaults.size_for(zone_type);

        Rect::new(
            self.origin.0 + col as f64 * (cell_width + self.spacing),
            self.origin.1 + row as f64 * (cell_height + self.spacing),
            width,
            height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_defaults_larger_than_text() {
        let defaults = ZoneDefaults::default();
        let (iw, ih) = defaults.size_for(ZoneType::Image);
        let (tw, th) = defaults.size_for(ZoneType::Text);
        assert!(iw * ih > tw * th);
    }

    #[test]
    fn test_grid_wraps_rows() {
        let grid = PlacementGrid::default();
        assert_eq!(grid.cell(0), (0, 0));
        assert_eq!(grid.cell(2), (0, 2));
        assert_eq!(grid.cell(3), (1, 0));
    }

    #[test]
    fn test_successive_zones_do_not_overlap() {
        let grid = PlacementGrid::default();
        let defaults = ZoneDefaults::default();
        let rects: Vec<Rect> = (0..7)
            .map(|i| {
                let zone_type = if i % 2 == 0 { ZoneType::Image } else { ZoneType::Text };
                grid.place(i, zone_type, &defaults)
            })
            .collect();

        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                assert!(!a.intersects(b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn test_first_zone_at_origin() {
        let grid = PlacementGrid::default();
        let rect = grid.place(0, ZoneType::Text, &ZoneDefaults::default());
        assert_eq!((rect.x, rect.y), PLACEMENT_GRID_ORIGIN);
        assert_eq!((rect.width, rect.height), (200.0, 50.0));
    }
}
