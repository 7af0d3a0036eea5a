//! Shared constants for the zone engine
//!
//! This module centralizes the unit factors, rounding precisions and
//! default zone sizes used across coordinate conversion and editing.

// =============================================================================
// Unit Conversion
// =============================================================================

/// Millimeters per inch
pub const MM_PER_INCH: f64 = 25.4;

/// Points per inch (PDF user space)
pub const POINTS_PER_INCH: f64 = 72.0;

/// Reference screen resolution used when pixels take part in a conversion
pub const DEFAULT_DPI: f64 = 96.0;

/// Points per millimeter (1 inch = 72 points, 1 inch = 25.4mm)
pub const POINTS_PER_MM: f64 = POINTS_PER_INCH / MM_PER_INCH; // ≈ 2.83465

/// Pixels per point at the reference resolution
pub const PIXELS_PER_POINT: f64 = DEFAULT_DPI / POINTS_PER_INCH; // ≈ 1.333

// =============================================================================
// Precision
// =============================================================================

/// Decimal places kept for document (vector) coordinates
pub const VECTOR_DECIMALS: i32 = 3;

/// Decimal places kept for canvas coordinates
pub const CANVAS_DECIMALS: i32 = 2;

/// Relative aspect-ratio difference tolerated before a dimension mismatch is reported
pub const DEFAULT_MISMATCH_TOLERANCE: f64 = 0.05;

// =============================================================================
// Default Page Dimensions
// =============================================================================

/// Default page width in points (US Letter: 8.5" × 11")
pub const DEFAULT_PAGE_WIDTH_PT: f64 = 612.0;

/// Default page height in points (US Letter)
pub const DEFAULT_PAGE_HEIGHT_PT: f64 = 792.0;

/// Default page dimensions as tuple (width, height)
pub const DEFAULT_PAGE_DIMENSIONS: (f64, f64) = (DEFAULT_PAGE_WIDTH_PT, DEFAULT_PAGE_HEIGHT_PT);

// =============================================================================
// Zone Defaults (canvas pixels)
// =============================================================================

pub const DEFAULT_IMAGE_ZONE_WIDTH: f64 = 200.0;
pub const DEFAULT_IMAGE_ZONE_HEIGHT: f64 = 150.0;

pub const DEFAULT_TEXT_ZONE_WIDTH: f64 = 200.0;
pub const DEFAULT_TEXT_ZONE_HEIGHT: f64 = 50.0;

/// Columns in the placement grid for newly created zones
pub const PLACEMENT_GRID_COLUMNS: usize = 3;

/// Top-left corner of the first grid cell
pub const PLACEMENT_GRID_ORIGIN: (f64, f64) = (50.0, 50.0);

/// Gap between grid cells
pub const PLACEMENT_GRID_SPACING: f64 = 20.0;

// =============================================================================
// Guides
// =============================================================================

/// Inset from the trim edge that content should stay inside (mm)
pub const DEFAULT_SAFE_MARGIN_MM: f64 = 5.0;

// =============================================================================
// Canvas
// =============================================================================

/// Default canvas width in pixels (US Letter at the reference DPI)
pub const DEFAULT_CANVAS_WIDTH: f64 = 816.0;

/// Default canvas height in pixels
pub const DEFAULT_CANVAS_HEIGHT: f64 = 1056.0;
