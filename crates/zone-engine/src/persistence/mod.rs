//! Zone persistence: keeping the in-memory zone set and the row store in step
//!
//! This module owns every write the editor makes:
//! 1. Create a zone definition together with its first page placement
//! 2. Load a page's placements (own and repeating) in native units
//! 3. Update or delete single rows
//! 4. Reconcile the desired zone set of one page against storage (see `reconcile`)
//!
//! Canvas geometry is converted to the page's native units before it is
//! written, and back again when it is loaded.

mod reconcile;
mod repeating;

pub use reconcile::*;
pub use repeating::*;

use crate::constants::DEFAULT_PAGE_DIMENSIONS;
use crate::coords::CoordinateSystem;
use crate::dimensions::PhysicalSize;
use crate::geometry::{Rect, ZoneGeometry};
use crate::model::{
    AssignmentDraft, AssignmentPatch, CustomizationZone, NewPage, NewTemplate, NewZone, Template,
    TemplatePage, TemplatePatch, ZonePageAssignment, ZonePatch, ZoneWithAssignment,
};
use crate::store::{StoreError, ZoneStore};
use crate::types::{AssignmentId, PageId, Result, TemplateId, ZoneError, ZoneId};
use crate::units::{Unit, UnitConverter};
use std::collections::HashMap;
use std::sync::Arc;

/// The page being edited and how its canvas maps onto it
#[derive(Debug, Clone, PartialEq)]
pub struct PageContext {
    pub page: TemplatePage,
    pub system: CoordinateSystem,
}

impl PageContext {
    /// Context for a page shown on a `canvas_width` x `canvas_height` canvas.
    ///
    /// Pages without a recorded native size are treated as US Letter.
    pub fn new(page: TemplatePage, canvas_width: f64, canvas_height: f64) -> Result<Self> {
        let native = page.native_size().unwrap_or_else(|| {
            log::warn!(
                "Page {} has no native size, assuming {}x{}pt",
                page.page_number,
                DEFAULT_PAGE_DIMENSIONS.0,
                DEFAULT_PAGE_DIMENSIONS.1
            );
            PhysicalSize {
                width: DEFAULT_PAGE_DIMENSIONS.0,
                height: DEFAULT_PAGE_DIMENSIONS.1,
                unit: Unit::Point,
            }
        });
        let system = CoordinateSystem::for_document(canvas_width, canvas_height, native)?;
        Ok(Self { page, system })
    }

    pub fn page_id(&self) -> PageId {
        self.page.id
    }

    /// How far a stored vector rect may drift through one canvas round trip
    pub(crate) fn vector_tolerance(&self) -> f64 {
        let scale = self.system.scale_x().max(self.system.scale_y());
        scale * 0.005 + 0.0005 + 1e-9
    }
}

/// Ids of a freshly created zone and its first placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedZone {
    pub zone_id: ZoneId,
    pub assignment_id: AssignmentId,
}

/// Result of one half of a two-row delete
#[derive(Debug)]
pub enum StepOutcome {
    Skipped,
    Deleted,
    Failed(ZoneError),
}

impl StepOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }
}

/// What happened to each row in [`ZonePersistence::delete_zone`].
///
/// The two deletes are independent; either may fail on its own.
#[derive(Debug)]
pub struct DeleteOutcome {
    pub assignment: StepOutcome,
    pub zone: StepOutcome,
}

impl DeleteOutcome {
    /// True when neither step failed
    pub fn succeeded(&self) -> bool {
        !self.assignment.is_failed() && !self.zone.is_failed()
    }
}

/// Row-level operations on templates, pages, zones and assignments
#[derive(Clone)]
pub struct ZonePersistence {
    store: Arc<dyn ZoneStore>,
    converter: UnitConverter,
}

impl std::fmt::Debug for ZonePersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZonePersistence")
            .field("converter", &self.converter)
            .finish_non_exhaustive()
    }
}

impl ZonePersistence {
    pub fn new(store: Arc<dyn ZoneStore>) -> Self {
        Self {
            store,
            converter: UnitConverter::default(),
        }
    }

    pub fn with_converter(mut self, converter: UnitConverter) -> Self {
        self.converter = converter;
        self
    }

    pub fn store(&self) -> &Arc<dyn ZoneStore> {
        &self.store
    }

    pub fn converter(&self) -> &UnitConverter {
        &self.converter
    }

    // =========================================================================
    // Templates and pages
    // =========================================================================

    pub async fn create_template(&self, template: NewTemplate) -> Result<Template> {
        template.bleed_settings.validate()?;
        let name = template.name.clone();
        let row = self
            .store
            .insert_template(template)
            .await
            .map_err(|e| failure(format!("creating template {name:?}"), e))?;
        log::info!("Created template {:?} ({})", row.name, row.dimensions);
        Ok(row)
    }

    pub async fn get_template(&self, id: TemplateId) -> Result<Template> {
        self.store
            .get_template(id)
            .await
            .map_err(|e| failure(format!("loading template {id}"), e))
    }

    /// Delete a template with its pages, zones and assignments
    pub async fn delete_template(&self, id: TemplateId) -> Result<()> {
        self.store
            .delete_template(id)
            .await
            .map_err(|e| failure(format!("deleting template {id}"), e))?;
        log::info!("Deleted template {}", id);
        Ok(())
    }

    pub async fn update_template(&self, id: TemplateId, patch: TemplatePatch) -> Result<Template> {
        self.store
            .update_template(id, patch)
            .await
            .map_err(|e| failure(format!("updating template {id}"), e))
    }

    pub async fn create_page(&self, page: NewPage) -> Result<TemplatePage> {
        let number = page.page_number;
        self.store
            .insert_page(page)
            .await
            .map_err(|e| failure(format!("creating page {number}"), e))
    }

    pub async fn get_page(&self, id: PageId) -> Result<TemplatePage> {
        self.store
            .get_page(id)
            .await
            .map_err(|e| failure(format!("loading page {id}"), e))
    }

    /// Delete a page and every placement on it
    pub async fn delete_page(&self, id: PageId) -> Result<()> {
        self.store
            .delete_page(id)
            .await
            .map_err(|e| failure(format!("deleting page {id}"), e))
    }

    pub async fn list_pages(&self, template_id: TemplateId) -> Result<Vec<TemplatePage>> {
        self.store
            .list_pages(template_id)
            .await
            .map_err(|e| failure(format!("listing pages of template {template_id}"), e))
    }

    pub async fn list_zones(&self, template_id: TemplateId) -> Result<Vec<CustomizationZone>> {
        self.store
            .list_zones(template_id)
            .await
            .map_err(|e| failure(format!("listing zones of template {template_id}"), e))
    }

    /// Page context carrying the template's declared size for mismatch checks
    pub async fn page_context(
        &self,
        page_id: PageId,
        canvas_width: f64,
        canvas_height: f64,
    ) -> Result<PageContext> {
        let page = self.get_page(page_id).await?;
        let template = self.get_template(page.template_id).await?;
        let mut context = PageContext::new(page, canvas_width, canvas_height)?;
        context.system = context
            .system
            .with_declared_size(template.dimensions)
            .with_converter(self.converter);
        Ok(context)
    }

    // =========================================================================
    // Zones
    // =========================================================================

    /// Insert a zone definition and its placement on `page`.
    ///
    /// The placement is stored in the page's native units. When the store
    /// cannot insert both rows atomically and the placement insert fails,
    /// the zone row is deleted again so no orphan definition is left.
    pub async fn create_zone(
        &self,
        template_id: TemplateId,
        zone: &ZoneGeometry,
        page: &PageContext,
    ) -> Result<CreatedZone> {
        let rect = zone.rect();
        rect.ensure_positive()?;

        let new_zone = NewZone {
            template_id,
            name: zone.name().to_string(),
            zone_type: zone.zone_type(),
            rect,
            z_index: zone.z_index(),
        };
        let draft = AssignmentDraft {
            page_id: page.page_id(),
            rect: page.system.canvas_rect_to_vector(&rect),
            z_index: zone.z_index(),
            is_repeating: zone.is_repeating(),
        };
        let context = || {
            format!(
                "creating zone {:?} on page {}",
                zone.name(),
                page.page.page_number
            )
        };

        if self.store.supports_transactions() {
            let (zone_row, assignment_row) = self
                .store
                .insert_zone_with_assignment(new_zone, draft)
                .await
                .map_err(|e| failure(context(), e))?;
            log::debug!("Created zone {} atomically", zone_row.id);
            return Ok(CreatedZone {
                zone_id: zone_row.id,
                assignment_id: assignment_row.id,
            });
        }

        let zone_row = self
            .store
            .insert_zone(new_zone)
            .await
            .map_err(|e| failure(context(), e))?;

        match self.store.insert_assignment(draft.for_zone(zone_row.id)).await {
            Ok(assignment_row) => {
                log::debug!(
                    "Created zone {} with assignment {}",
                    zone_row.id,
                    assignment_row.id
                );
                Ok(CreatedZone {
                    zone_id: zone_row.id,
                    assignment_id: assignment_row.id,
                })
            }
            Err(source) => {
                log::warn!(
                    "Assignment insert for zone {} failed, rolling back zone row: {}",
                    zone_row.id,
                    source
                );
                if let Err(rollback) = self.store.delete_zone(zone_row.id).await {
                    log::error!(
                        "Compensating delete of zone {} failed, row is orphaned: {}",
                        zone_row.id,
                        rollback
                    );
                }
                Err(failure(context(), source))
            }
        }
    }

    pub async fn update_zone(&self, zone_id: ZoneId, patch: ZonePatch) -> Result<CustomizationZone> {
        if let Some(rect) = &patch.rect {
            rect.ensure_positive()?;
        }
        self.store
            .update_zone(zone_id, patch)
            .await
            .map_err(|e| failure(format!("updating zone {zone_id}"), e))
    }

    /// Partial update of one assignment's geometry, z-index or repeating flag
    pub async fn update_assignment(
        &self,
        assignment_id: AssignmentId,
        patch: AssignmentPatch,
    ) -> Result<ZonePageAssignment> {
        if let Some(rect) = &patch.rect {
            rect.ensure_positive()?;
        }
        self.store
            .update_assignment(assignment_id, patch)
            .await
            .map_err(|e| failure(format!("updating assignment {assignment_id}"), e))
    }

    /// Delete an assignment (if given) and then its zone.
    ///
    /// Both steps are attempted even if the first fails; the outcome says
    /// which side failed and each failure is logged.
    pub async fn delete_zone(
        &self,
        zone_id: ZoneId,
        assignment_id: Option<AssignmentId>,
    ) -> DeleteOutcome {
        let assignment = match assignment_id {
            None => StepOutcome::Skipped,
            Some(id) => match self.store.delete_assignment(id).await {
                Ok(()) => StepOutcome::Deleted,
                Err(e) => StepOutcome::Failed(failure(
                    format!("deleting assignment {id} of zone {zone_id}"),
                    e,
                )),
            },
        };

        let zone = match self.store.delete_zone(zone_id).await {
            Ok(()) => StepOutcome::Deleted,
            Err(e) => StepOutcome::Failed(failure(format!("deleting zone {zone_id}"), e)),
        };

        DeleteOutcome { assignment, zone }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Zones placed on a page, bottom to top, with geometry in the page's
    /// native units.
    ///
    /// Includes repeating zones anchored on other pages of the template,
    /// rescaled to this page's size.
    pub async fn load_zones_for_page(&self, page_id: PageId) -> Result<Vec<ZoneWithAssignment>> {
        let page = self.get_page(page_id).await?;
        let context = |what: &str| format!("loading {what} for page {}", page.page_number);

        let zones: HashMap<ZoneId, CustomizationZone> = self
            .store
            .list_zones(page.template_id)
            .await
            .map_err(|e| failure(context("zones"), e))?
            .into_iter()
            .map(|z| (z.id, z))
            .collect();
        let own = self
            .store
            .list_page_assignments(page_id)
            .await
            .map_err(|e| failure(context("assignments"), e))?;
        let repeating: Vec<ZonePageAssignment> = self
            .store
            .list_template_assignments(page.template_id)
            .await
            .map_err(|e| failure(context("repeating assignments"), e))?
            .into_iter()
            .filter(|a| a.is_repeating && a.page_id != page_id)
            .collect();

        let mut anchors: HashMap<PageId, TemplatePage> = HashMap::new();
        for assignment in &repeating {
            if !anchors.contains_key(&assignment.page_id) {
                let anchor = self.get_page(assignment.page_id).await?;
                anchors.insert(anchor.id, anchor);
            }
        }

        let mut placed: Vec<ZoneWithAssignment> = Vec::new();
        for assignment in own {
            let Some(zone) = zones.get(&assignment.zone_id) else {
                log::warn!("Assignment {} references a missing zone", assignment.id);
                continue;
            };
            placed.push(ZoneWithAssignment {
                zone: zone.clone(),
                geometry: assignment.rect,
                assignment,
                inherited: false,
            });
        }

        for assignment in repeating {
            if placed.iter().any(|p| p.zone.id == assignment.zone_id) {
                continue;
            }
            let Some(zone) = zones.get(&assignment.zone_id) else {
                continue;
            };
            let geometry = match anchors.get(&assignment.page_id) {
                Some(anchor) => rescale_for_page(&assignment.rect, anchor, &page),
                None => assignment.rect,
            };
            placed.push(ZoneWithAssignment {
                zone: zone.clone(),
                geometry,
                assignment,
                inherited: true,
            });
        }

        placed.sort_by_key(|p| p.assignment.z_index);
        Ok(placed)
    }

    /// Reload a page's placements as canvas-space geometry objects
    pub async fn load_canvas_zones(&self, page: &PageContext) -> Result<Vec<ZoneGeometry>> {
        let placed = self.load_zones_for_page(page.page_id()).await?;
        let mut zones = Vec::with_capacity(placed.len());
        for item in placed {
            let rect: Rect = page.system.vector_rect_to_canvas(&item.geometry);
            match ZoneGeometry::new(item.zone.zone_type, item.zone.name.clone(), rect) {
                Ok(zone) => zones.push(
                    zone.with_ids(item.zone.id, Some(item.assignment.id))
                        .with_z_index(item.assignment.z_index)
                        .with_repeating(item.assignment.is_repeating),
                ),
                Err(e) => log::warn!("Skipping stored zone {:?}: {}", item.zone.name, e),
            }
        }
        Ok(zones)
    }
}

pub(crate) fn failure(context: impl Into<String>, source: StoreError) -> ZoneError {
    let context = context.into();
    log::error!("Persistence failure while {}: {}", context, source);
    ZoneError::persistence(context, source)
}
