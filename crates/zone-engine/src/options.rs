use crate::constants::*;
use crate::geometry::{PlacementGrid, ZoneDefaults};
use crate::types::*;
use crate::units::UnitConverter;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Editor configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EditorOptions {
    // Units
    pub dpi: f64,

    // Dimension checks
    pub mismatch_tolerance: f64,

    // New zones
    pub zone_defaults: ZoneDefaults,
    pub placement_grid: PlacementGrid,

    // Guides
    pub safe_margin_mm: f64,

    // Canvas
    pub canvas_width: f64,
    pub canvas_height: f64,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            mismatch_tolerance: DEFAULT_MISMATCH_TOLERANCE,
            zone_defaults: ZoneDefaults::default(),
            placement_grid: PlacementGrid::default(),
            safe_margin_mm: DEFAULT_SAFE_MARGIN_MM,
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
        }
    }
}

impl EditorOptions {
    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options: Self = serde_json::from_slice(&bytes)
            .map_err(|e| ZoneError::Config(format!("Failed to parse config: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ZoneError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        let positive = |value: f64| value.is_finite() && value > 0.0;

        if !positive(self.dpi) {
            return Err(ZoneError::Config(format!(
                "Reference DPI must be positive, got {}",
                self.dpi
            )));
        }
        if !(self.mismatch_tolerance.is_finite() && self.mismatch_tolerance >= 0.0) {
            return Err(ZoneError::Config(
                "Mismatch tolerance cannot be negative".to_string(),
            ));
        }

        let defaults = &self.zone_defaults;
        for (kind, (w, h)) in [("image", defaults.image_size), ("text", defaults.text_size)] {
            if !positive(w) || !positive(h) {
                return Err(ZoneError::Config(format!(
                    "Default {} zone size must be positive, got {}x{}",
                    kind, w, h
                )));
            }
        }

        if self.placement_grid.columns == 0 {
            return Err(ZoneError::Config(
                "Placement grid needs at least one column".to_string(),
            ));
        }
        if self.placement_grid.spacing < 0.0 {
            return Err(ZoneError::Config(
                "Placement grid spacing cannot be negative".to_string(),
            ));
        }

        if self.safe_margin_mm < 0.0 {
            return Err(ZoneError::Config(
                "Safe margin cannot be negative".to_string(),
            ));
        }

        if !positive(self.canvas_width) || !positive(self.canvas_height) {
            return Err(ZoneError::Config(format!(
                "Canvas size must be positive, got {}x{}",
                self.canvas_width, self.canvas_height
            )));
        }

        Ok(())
    }

    /// Unit converter at the configured resolution
    pub fn converter(&self) -> Result<UnitConverter> {
        UnitConverter::with_dpi(self.dpi)
    }
}
