//! Persisted rows and the drafts/patches used to write them
//!
//! Mirrors the logical schema: `templates`, `template_pages`,
//! `customization_zones` and `zone_page_assignments`.

use crate::dimensions::{BleedSettings, PhysicalSize};
use crate::geometry::Rect;
use crate::types::{AssignmentId, PageId, TemplateId, ZoneId, ZoneType};
use crate::units::Unit;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A print template (e.g. a calendar) owning pages and zones
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub is_active: bool,
    /// Declared physical size, stored as `"{w}x{h}{unit}"`
    pub dimensions: PhysicalSize,
    pub bleed_settings: BleedSettings,
    pub original_document_url: Option<String>,
    pub document_metadata: BTreeMap<String, String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTemplate {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub dimensions: PhysicalSize,
    pub bleed_settings: BleedSettings,
    pub created_by: Option<String>,
}

impl NewTemplate {
    pub fn new(name: impl Into<String>, category: impl Into<String>, dimensions: PhysicalSize) -> Self {
        Self {
            name: name.into(),
            description: None,
            category: category.into(),
            dimensions,
            bleed_settings: BleedSettings::default(),
            created_by: None,
        }
    }

    pub fn with_bleed(mut self, bleed_settings: BleedSettings) -> Self {
        self.bleed_settings = bleed_settings;
        self
    }
}

/// Changes applied to a template after its document is (re)ingested
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplatePatch {
    pub original_document_url: Option<String>,
    pub document_metadata: Option<BTreeMap<String, String>>,
    pub is_active: Option<bool>,
}

/// One page of a template's source document
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TemplatePage {
    pub id: PageId,
    pub template_id: TemplateId,
    /// 1-based
    pub page_number: u32,
    pub preview_image_url: Option<String>,
    pub native_page_width: Option<f64>,
    pub native_page_height: Option<f64>,
    pub native_units: Option<Unit>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TemplatePage {
    /// Native page size as reported by the document, if known and valid
    pub fn native_size(&self) -> Option<PhysicalSize> {
        let width = self.native_page_width?;
        let height = self.native_page_height?;
        PhysicalSize::new(width, height, self.native_units.unwrap_or(Unit::Point)).ok()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPage {
    pub template_id: TemplateId,
    pub page_number: u32,
    pub preview_image_url: Option<String>,
    pub native_size: Option<PhysicalSize>,
}

/// Reusable placeholder definition; where it sits on each page lives in
/// [`ZonePageAssignment`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CustomizationZone {
    pub id: ZoneId,
    pub template_id: TemplateId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub zone_type: ZoneType,
    /// Reference geometry in canvas pixels at definition time
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub rect: Rect,
    pub z_index: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewZone {
    pub template_id: TemplateId,
    pub name: String,
    pub zone_type: ZoneType,
    pub rect: Rect,
    pub z_index: i32,
}

/// Partial update of a zone row. The type is not patchable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZonePatch {
    pub name: Option<String>,
    pub rect: Option<Rect>,
    pub z_index: Option<i32>,
}

impl ZonePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.rect.is_none() && self.z_index.is_none()
    }
}

/// Where one zone sits on one page, in that page's native units
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZonePageAssignment {
    pub id: AssignmentId,
    pub zone_id: ZoneId,
    pub page_id: PageId,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub rect: Rect,
    pub z_index: i32,
    /// The single canonical placement for every page of the template
    pub is_repeating: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAssignment {
    pub zone_id: ZoneId,
    pub page_id: PageId,
    pub rect: Rect,
    pub z_index: i32,
    pub is_repeating: bool,
}

/// Assignment fields known before the zone row exists
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentDraft {
    pub page_id: PageId,
    pub rect: Rect,
    pub z_index: i32,
    pub is_repeating: bool,
}

impl AssignmentDraft {
    pub fn for_zone(&self, zone_id: ZoneId) -> NewAssignment {
        NewAssignment {
            zone_id,
            page_id: self.page_id,
            rect: self.rect,
            z_index: self.z_index,
            is_repeating: self.is_repeating,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentPatch {
    pub rect: Option<Rect>,
    pub z_index: Option<i32>,
    pub is_repeating: Option<bool>,
}

impl AssignmentPatch {
    pub fn is_empty(&self) -> bool {
        self.rect.is_none() && self.z_index.is_none() && self.is_repeating.is_none()
    }
}

/// A zone joined with its placement on a specific page
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneWithAssignment {
    pub zone: CustomizationZone,
    pub assignment: ZonePageAssignment,
    /// Geometry on the requested page, in that page's native units.
    ///
    /// Equal to `assignment.rect` unless the assignment is a repeating one
    /// anchored on another page, in which case it has been rescaled.
    pub geometry: Rect,
    /// True when the placement comes from a repeating assignment anchored
    /// on a different page
    pub inherited: bool,
}
