//! Coordinate spaces and the conversions between them
//!
//! Three spaces are involved when placing a zone:
//! - canvas pixels on the editing surface
//! - the uploaded document's native (vector) units, usually points
//! - physical print units (mm, in, pt) of the template
//!
//! Canvas and document spaces share a top-left origin and differ only by a
//! per-axis scale, so a zone keeps its relative position whatever the
//! canvas size.

mod guides;
mod mismatch;

pub use guides::*;
pub use mismatch::*;

use crate::constants::{CANVAS_DECIMALS, DEFAULT_MISMATCH_TOLERANCE, VECTOR_DECIMALS};
use crate::dimensions::PhysicalSize;
use crate::geometry::Rect;
use crate::types::{Result, ZoneError};
use crate::units::{Unit, UnitConverter};

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Map a canvas point into document units, rounded to vector precision (3 dp)
pub fn canvas_to_vector_coordinates(
    cx: f64,
    cy: f64,
    canvas_width: f64,
    canvas_height: f64,
    document_width: f64,
    document_height: f64,
) -> (f64, f64) {
    (
        round_to(cx * (document_width / canvas_width), VECTOR_DECIMALS),
        round_to(cy * (document_height / canvas_height), VECTOR_DECIMALS),
    )
}

/// Map a document point onto the canvas, rounded to pixel precision (2 dp)
pub fn vector_to_canvas_coordinates(
    vx: f64,
    vy: f64,
    canvas_width: f64,
    canvas_height: f64,
    document_width: f64,
    document_height: f64,
) -> (f64, f64) {
    (
        round_to(vx * (canvas_width / document_width), CANVAS_DECIMALS),
        round_to(vy * (canvas_height / document_height), CANVAS_DECIMALS),
    )
}

/// Mapping between an editing canvas and one document page.
///
/// Construction validates every axis; once built, all conversions are total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateSystem {
    canvas_width: f64,
    canvas_height: f64,
    document: PhysicalSize,
    declared: Option<PhysicalSize>,
    converter: UnitConverter,
}

impl CoordinateSystem {
    /// Build from the canvas size in pixels and the document's native page
    /// size in points.
    pub fn new(
        canvas_width: f64,
        canvas_height: f64,
        document_width: f64,
        document_height: f64,
    ) -> Result<Self> {
        let axes = [canvas_width, canvas_height, document_width, document_height];
        if axes.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(ZoneError::InvalidDimensions(format!(
                "canvas {canvas_width}x{canvas_height}px, document {document_width}x{document_height}"
            )));
        }

        Ok(Self {
            canvas_width,
            canvas_height,
            document: PhysicalSize {
                width: document_width,
                height: document_height,
                unit: Unit::Point,
            },
            declared: None,
            converter: UnitConverter::default(),
        })
    }

    /// Build for a document page whose native size is not in points
    pub fn for_document(canvas_width: f64, canvas_height: f64, document: PhysicalSize) -> Result<Self> {
        let mut system = Self::new(canvas_width, canvas_height, document.width, document.height)?;
        system.document.unit = document.unit;
        Ok(system)
    }

    /// Attach the template's declared physical size for mismatch detection
    pub fn with_declared_size(mut self, declared: PhysicalSize) -> Self {
        self.declared = Some(declared);
        self
    }

    pub fn with_converter(mut self, converter: UnitConverter) -> Self {
        self.converter = converter;
        self
    }

    pub fn canvas_size(&self) -> (f64, f64) {
        (self.canvas_width, self.canvas_height)
    }

    pub fn document(&self) -> PhysicalSize {
        self.document
    }

    pub fn declared(&self) -> Option<PhysicalSize> {
        self.declared
    }

    pub fn converter(&self) -> &UnitConverter {
        &self.converter
    }

    /// Document units per canvas pixel on the x axis
    pub fn scale_x(&self) -> f64 {
        self.document.width / self.canvas_width
    }

    /// Document units per canvas pixel on the y axis
    pub fn scale_y(&self) -> f64 {
        self.document.height / self.canvas_height
    }

    /// Canvas point in the requested physical unit.
    ///
    /// The scale comes from the document/canvas ratio rather than a fixed
    /// pixel density, so the result matches what will print.
    pub fn canvas_to_physical(&self, x: f64, y: f64, target: Unit) -> (f64, f64) {
        self.converter.convert_point(
            (x * self.scale_x(), y * self.scale_y()),
            self.document.unit,
            target,
        )
    }

    /// Inverse of [`canvas_to_physical`](Self::canvas_to_physical)
    pub fn physical_to_canvas(&self, x: f64, y: f64, source: Unit) -> (f64, f64) {
        let (dx, dy) = self
            .converter
            .convert_point((x, y), source, self.document.unit);
        (dx / self.scale_x(), dy / self.scale_y())
    }

    /// Canvas point in document units, rounded to vector precision
    pub fn canvas_to_vector(&self, x: f64, y: f64) -> (f64, f64) {
        canvas_to_vector_coordinates(
            x,
            y,
            self.canvas_width,
            self.canvas_height,
            self.document.width,
            self.document.height,
        )
    }

    /// Document point on the canvas, rounded to pixel precision
    pub fn vector_to_canvas(&self, x: f64, y: f64) -> (f64, f64) {
        vector_to_canvas_coordinates(
            x,
            y,
            self.canvas_width,
            self.canvas_height,
            self.document.width,
            self.document.height,
        )
    }

    pub fn canvas_rect_to_vector(&self, rect: &Rect) -> Rect {
        let (x, y) = self.canvas_to_vector(rect.x, rect.y);
        let (width, height) = self.canvas_to_vector(rect.width, rect.height);
        Rect::new(x, y, width, height)
    }

    pub fn vector_rect_to_canvas(&self, rect: &Rect) -> Rect {
        let (x, y) = self.vector_to_canvas(rect.x, rect.y);
        let (width, height) = self.vector_to_canvas(rect.width, rect.height);
        Rect::new(x, y, width, height)
    }

    /// Whether the document's aspect ratio agrees with the declared size
    /// within `tolerance` (a fraction, e.g. 0.05 for 5%).
    ///
    /// Always true when no declared size is attached.
    pub fn dimensions_match(&self, tolerance: f64) -> bool {
        self.mismatch_warning(tolerance).is_none()
    }

    /// [`dimensions_match`](Self::dimensions_match) with the default 5% tolerance
    pub fn dimensions_match_default(&self) -> bool {
        self.dimensions_match(DEFAULT_MISMATCH_TOLERANCE)
    }

    pub fn mismatch_warning(&self, tolerance: f64) -> Option<DimensionMismatchWarning> {
        let declared = self.declared?;
        compare_dimensions(&declared, &self.document, tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_positive_axes() {
        assert!(CoordinateSystem::new(0.0, 600.0, 595.0, 842.0).is_err());
        assert!(CoordinateSystem::new(800.0, -1.0, 595.0, 842.0).is_err());
        assert!(CoordinateSystem::new(800.0, 600.0, 0.0, 842.0).is_err());
        assert!(CoordinateSystem::new(800.0, 600.0, 595.0, f64::NAN).is_err());
        assert!(CoordinateSystem::new(800.0, 600.0, 595.0, 842.0).is_ok());
    }

    #[test]
    fn test_canvas_to_vector_precision() {
        let (vx, vy) = canvas_to_vector_coordinates(100.0, 100.0, 800.0, 600.0, 595.0, 842.0);
        assert_eq!(vx, 74.375);
        assert_eq!(vy, 140.333);
    }

    #[test]
    fn test_vector_to_canvas_precision() {
        let (cx, cy) = vector_to_canvas_coordinates(74.375, 140.333, 800.0, 600.0, 595.0, 842.0);
        assert_eq!(cx, 100.0);
        assert_eq!(cy, 100.0);
    }

    #[test]
    fn test_canvas_to_physical_uses_document_ratio() {
        // An A4 page in points shown on a 595x842 canvas maps 1px to 1pt
        let system = CoordinateSystem::new(595.0, 842.0, 595.0, 842.0).unwrap();
        let (x, y) = system.canvas_to_physical(72.0, 144.0, Unit::Inch);
        assert!((x - 1.0).abs() < 1e-9);
        assert!((y - 2.0).abs() < 1e-9);

        let (cx, cy) = system.physical_to_canvas(1.0, 2.0, Unit::Inch);
        assert!((cx - 72.0).abs() < 1e-9);
        assert!((cy - 144.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_point_document_unit() {
        let page = PhysicalSize::new(210.0, 297.0, Unit::Millimeter).unwrap();
        let system = CoordinateSystem::for_document(420.0, 594.0, page).unwrap();
        let (x, _) = system.canvas_to_physical(420.0, 0.0, Unit::Millimeter);
        assert!((x - 210.0).abs() < 1e-9);
    }
}
