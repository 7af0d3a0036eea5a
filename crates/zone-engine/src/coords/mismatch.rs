//! Detection of documents whose page size disagrees with the template
//!
//! Templates declare a physical size before any document exists. The
//! uploaded document may have a different page size or orientation, in
//! which case zones would print in the wrong place. Only aspect ratios are
//! compared, with a tolerance, because PDF producers round page sizes.

use crate::dimensions::PhysicalSize;
use std::fmt;

/// Advisory raised when the document aspect ratio is outside tolerance.
///
/// This is not an error: the operator may carry on, but zone placement may
/// not line up with the printed page.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionMismatchWarning {
    /// Size the template declares
    pub declared: PhysicalSize,
    /// Size reported by the uploaded document
    pub document: PhysicalSize,
    pub declared_aspect: f64,
    pub document_aspect: f64,
    /// `|document - declared| / declared`
    pub relative_difference: f64,
    /// Portrait declared but landscape uploaded, or the reverse
    pub orientation_flipped: bool,
}

impl fmt::Display for DimensionMismatchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Document page size {} (aspect {:.3}) differs from the template size {} (aspect {:.3}) by {:.1}%",
            self.document,
            self.document_aspect,
            self.declared,
            self.declared_aspect,
            self.relative_difference * 100.0
        )?;
        if self.orientation_flipped {
            write!(f, "; the orientation is different")?;
        }
        write!(f, ". Zone placement may not align with the printed page.")
    }
}

/// Relative difference between two aspect ratios, measured against `declared`
pub fn aspect_difference(declared: &PhysicalSize, document: &PhysicalSize) -> f64 {
    let declared_aspect = declared.aspect_ratio();
    (document.aspect_ratio() - declared_aspect).abs() / declared_aspect
}

/// Compare a declared size with a document size.
///
/// Returns `None` when the aspect ratios agree within `tolerance`.
pub fn compare_dimensions(
    declared: &PhysicalSize,
    document: &PhysicalSize,
    tolerance: f64,
) -> Option<DimensionMismatchWarning> {
    let relative_difference = aspect_difference(declared, document);
    if relative_difference <= tolerance {
        return None;
    }

    Some(DimensionMismatchWarning {
        declared: *declared,
        document: *document,
        declared_aspect: declared.aspect_ratio(),
        document_aspect: document.aspect_ratio(),
        relative_difference,
        orientation_flipped: declared.orientation() != document.orientation(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Unit;

    fn size(w: f64, h: f64, unit: Unit) -> PhysicalSize {
        PhysicalSize::new(w, h, unit).unwrap()
    }

    #[test]
    fn test_letter_against_a4_is_mismatch() {
        let declared = size(210.0, 297.0, Unit::Millimeter);
        let warning = compare_dimensions(&declared, &size(612.0, 792.0, Unit::Point), 0.05)
            .expect("letter should not pass as A4");
        assert!(warning.relative_difference > 0.09 && warning.relative_difference < 0.1);
        assert!(!warning.orientation_flipped);
    }

    #[test]
    fn test_a4_points_match_a4_mm() {
        let declared = size(210.0, 297.0, Unit::Millimeter);
        assert!(compare_dimensions(&declared, &size(595.0, 842.0, Unit::Point), 0.05).is_none());
    }

    #[test]
    fn test_orientation_flip_reported() {
        let declared = size(210.0, 297.0, Unit::Millimeter);
        let warning = compare_dimensions(&declared, &size(842.0, 595.0, Unit::Point), 0.05).unwrap();
        assert!(warning.orientation_flipped);
        assert!(warning.to_string().contains("orientation"));
    }
}
