//! Length conversion between pixels, millimeters, inches and points
//!
//! Physical units convert through inches. Pixels are not physical, so any
//! conversion that involves them goes through a reference resolution.

use crate::constants::{DEFAULT_DPI, MM_PER_INCH, POINTS_PER_INCH};
use crate::types::{Result, ZoneError};
use std::fmt;
use std::str::FromStr;

/// A supported length unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Unit {
    #[cfg_attr(feature = "serde", serde(rename = "px"))]
    Pixel,
    #[cfg_attr(feature = "serde", serde(rename = "mm"))]
    Millimeter,
    #[cfg_attr(feature = "serde", serde(rename = "in"))]
    Inch,
    #[cfg_attr(feature = "serde", serde(rename = "pt"))]
    Point,
}

impl Unit {
    pub const ALL: [Unit; 4] = [Unit::Pixel, Unit::Millimeter, Unit::Inch, Unit::Point];

    /// Short suffix used in dimension strings
    pub fn abbreviation(self) -> &'static str {
        match self {
            Unit::Pixel => "px",
            Unit::Millimeter => "mm",
            Unit::Inch => "in",
            Unit::Point => "pt",
        }
    }

    /// Whether the unit has a fixed physical length
    pub fn is_physical(self) -> bool {
        !matches!(self, Unit::Pixel)
    }

    fn per_inch(self, dpi: f64) -> f64 {
        match self {
            Unit::Pixel => dpi,
            Unit::Millimeter => MM_PER_INCH,
            Unit::Inch => 1.0,
            Unit::Point => POINTS_PER_INCH,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

impl FromStr for Unit {
    type Err = ZoneError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "px" => Ok(Unit::Pixel),
            "mm" => Ok(Unit::Millimeter),
            "in" => Ok(Unit::Inch),
            "pt" => Ok(Unit::Point),
            _ => Err(ZoneError::UnsupportedUnitKind(s.to_string())),
        }
    }
}

/// Converts lengths at a fixed pixel resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConverter {
    dpi: f64,
}

impl Default for UnitConverter {
    fn default() -> Self {
        Self { dpi: DEFAULT_DPI }
    }
}

impl UnitConverter {
    /// Create a converter for the given pixels-per-inch.
    ///
    /// A non-positive resolution is a configuration error.
    pub fn with_dpi(dpi: f64) -> Result<Self> {
        if !(dpi.is_finite() && dpi > 0.0) {
            return Err(ZoneError::Config(format!(
                "Reference DPI must be positive, got {dpi}"
            )));
        }
        Ok(Self { dpi })
    }

    pub fn dpi(&self) -> f64 {
        self.dpi
    }

    /// Convert a length between two units
    pub fn convert(&self, value: f64, from: Unit, to: Unit) -> f64 {
        if from == to {
            return value;
        }
        value / from.per_inch(self.dpi) * to.per_inch(self.dpi)
    }

    /// Convert a point `(x, y)` between two units
    pub fn convert_point(&self, point: (f64, f64), from: Unit, to: Unit) -> (f64, f64) {
        (
            self.convert(point.0, from, to),
            self.convert(point.1, from, to),
        )
    }
}

/// Convert a length at the default 96 DPI reference resolution
pub fn convert(value: f64, from: Unit, to: Unit) -> f64 {
    UnitConverter::default().convert(value, from, to)
}

/// Convert a length whose units are given as strings.
///
/// Fails with `UnsupportedUnitKind` if either unit is not one of
/// `px`, `mm`, `in` or `pt`.
pub fn convert_str(value: f64, from: &str, to: &str) -> Result<f64> {
    let from: Unit = from.parse()?;
    let to: Unit = to.parse()?;
    Ok(convert(value, from, to))
}

/// Convert millimeters to points
#[inline]
pub fn mm_to_pt(mm: f64) -> f64 {
    convert(mm, Unit::Millimeter, Unit::Point)
}

/// Convert points to millimeters
#[inline]
pub fn pt_to_mm(pt: f64) -> f64 {
    convert(pt, Unit::Point, Unit::Millimeter)
}
