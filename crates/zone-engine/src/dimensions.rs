//! Physical sizes and bleed settings attached to templates
//!
//! Template sizes are persisted as compact strings of the form
//! `"{width}x{height}{unit}"`, e.g. `"210x297mm"` or `"8.5x11in"`.

use crate::types::{Orientation, Result, ZoneError};
use crate::units::{Unit, UnitConverter};
use std::fmt;
use std::str::FromStr;

/// A width and height in a given unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalSize {
    pub width: f64,
    pub height: f64,
    pub unit: Unit,
}

impl PhysicalSize {
    /// Create a size, rejecting non-positive or non-finite axes
    pub fn new(width: f64, height: f64, unit: Unit) -> Result<Self> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(ZoneError::InvalidDimensions(format!(
                "size {width}x{height}{unit} must be positive"
            )));
        }
        Ok(Self {
            width,
            height,
            unit,
        })
    }

    /// Width divided by height
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::of(self.width, self.height)
    }

    /// The same size expressed in another unit
    pub fn to_unit(&self, unit: Unit, converter: &UnitConverter) -> PhysicalSize {
        PhysicalSize {
            width: converter.convert(self.width, self.unit, unit),
            height: converter.convert(self.height, self.unit, unit),
            unit,
        }
    }
}

impl fmt::Display for PhysicalSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}{}", self.width, self.height, self.unit)
    }
}

impl FromStr for PhysicalSize {
    type Err = ZoneError;

    fn from_str(s: &str) -> Result<Self> {
        let unparsable = || ZoneError::DimensionParse(s.to_string());

        // Every supported unit suffix is two ASCII characters
        let split = s.len().checked_sub(2).ok_or_else(unparsable)?;
        let (body, suffix) = match (s.get(..split), s.get(split..)) {
            (Some(body), Some(suffix)) => (body, suffix),
            _ => return Err(unparsable()),
        };
        let unit = match suffix {
            "px" => Unit::Pixel,
            "mm" => Unit::Millimeter,
            "in" => Unit::Inch,
            "pt" => Unit::Point,
            _ => return Err(unparsable()),
        };

        let (width, height) = body.split_once('x').ok_or_else(unparsable)?;
        let width = parse_plain_number(width).ok_or_else(unparsable)?;
        let height = parse_plain_number(height).ok_or_else(unparsable)?;

        PhysicalSize::new(width, height, unit)
    }
}

/// Accepts digits with at most one decimal point; no sign, exponent or whitespace.
fn parse_plain_number(text: &str) -> Option<f64> {
    let digits = text.chars().filter(char::is_ascii_digit).count();
    let dots = text.chars().filter(|&c| c == '.').count();
    if digits == 0 || dots > 1 || digits + dots != text.len() {
        return None;
    }
    text.parse().ok()
}

#[cfg(feature = "serde")]
impl serde::Serialize for PhysicalSize {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for PhysicalSize {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Extra print margin beyond the trim edge.
///
/// Purely descriptive: used to draw trim/bleed/safe guides, never to clip
/// zone geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BleedSettings {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
    pub unit: Unit,
}

impl Default for BleedSettings {
    fn default() -> Self {
        Self::uniform(0.0, Unit::Millimeter)
    }
}

impl BleedSettings {
    /// Same offset on every edge
    pub fn uniform(offset: f64, unit: Unit) -> Self {
        Self {
            top: offset,
            right: offset,
            bottom: offset,
            left: offset,
            unit,
        }
    }

    /// Edge offsets `(top, right, bottom, left)` converted to `unit`
    pub fn edges_in(&self, unit: Unit, converter: &UnitConverter) -> (f64, f64, f64, f64) {
        (
            converter.convert(self.top, self.unit, unit),
            converter.convert(self.right, self.unit, unit),
            converter.convert(self.bottom, self.unit, unit),
            converter.convert(self.left, self.unit, unit),
        )
    }

    pub fn is_zero(&self) -> bool {
        self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0 && self.left == 0.0
    }

    pub fn validate(&self) -> Result<()> {
        for edge in [self.top, self.right, self.bottom, self.left] {
            if !(edge.is_finite() && edge >= 0.0) {
                return Err(ZoneError::Config(format!(
                    "Bleed offsets must be non-negative, got {edge}"
                )));
            }
        }
        Ok(())
    }
}
