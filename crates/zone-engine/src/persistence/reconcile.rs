//! Bulk "save template": diff the desired zone set against storage
//!
//! Zones are matched by id against what is placed on the edited page:
//! - no id, or an id storage does not know → insert
//! - id known to storage → update, but only the rows that actually changed
//! - on the page but not desired → remove from the page
//!
//! Every row operation is its own call. A failure is recorded and the
//! remaining zones are still processed, so one bad zone cannot block its
//! siblings. Nothing is retried.

use super::{PageContext, StepOutcome, ZonePersistence};
use crate::geometry::{Rect, ZoneGeometry};
use crate::model::{AssignmentPatch, CustomizationZone, NewAssignment, ZonePatch, ZoneWithAssignment};
use crate::types::{AssignmentId, Result, TemplateId, ZoneError, ZoneId};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Kind of row operation attempted for a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for ReconcileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReconcileAction::Insert => "insert",
            ReconcileAction::Update => "update",
            ReconcileAction::Delete => "delete",
        })
    }
}

/// One zone operation that did not go through
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileFailure {
    pub action: ReconcileAction,
    pub zone_name: String,
    pub zone_id: Option<ZoneId>,
    pub message: String,
}

/// A zone inserted during reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertedZone {
    /// Position of the zone in the desired list
    pub index: usize,
    pub zone_id: ZoneId,
    pub assignment_id: AssignmentId,
}

/// Outcome of [`ZonePersistence::reconcile_zone_set`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub inserted: Vec<InsertedZone>,
    pub updated: Vec<ZoneId>,
    /// Zones taken off the page; the zone row goes too once no placement is left
    pub deleted: Vec<ZoneId>,
    /// Matched zones for which no call was needed
    pub unchanged: Vec<ZoneId>,
    pub failures: Vec<ReconcileFailure>,
}

impl ReconcileReport {
    /// Zone operations attempted, successful or not
    pub fn attempted(&self) -> usize {
        self.inserted.len() + self.updated.len() + self.deleted.len() + self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// `PartialReconciliationFailure` if any zone operation failed
    pub fn into_result(self) -> Result<Self> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(ZoneError::PartialReconciliationFailure {
                attempted: self.attempted(),
                failures: self.failures,
            })
        }
    }

    fn fail(
        &mut self,
        action: ReconcileAction,
        zone_name: &str,
        zone_id: Option<ZoneId>,
        error: &ZoneError,
    ) {
        log::warn!("Could not {} zone {:?}: {}", action, zone_name, error);
        self.failures.push(ReconcileFailure {
            action,
            zone_name: zone_name.to_string(),
            zone_id,
            message: error.to_string(),
        });
    }
}

fn rect_close(a: &Rect, b: &Rect, tolerance: f64) -> bool {
    (a.x - b.x).abs() <= tolerance
        && (a.y - b.y).abs() <= tolerance
        && (a.width - b.width).abs() <= tolerance
        && (a.height - b.height).abs() <= tolerance
}

/// Canvas reference geometry is kept at pixel precision
const CANVAS_TOLERANCE: f64 = 0.005;

impl ZonePersistence {
    /// Bring `page` in line with `desired`, the zones currently rendered
    /// on it.
    ///
    /// The diff is scoped to the page: only zones placed on `page` (its own
    /// placements plus repeating zones inherited from other pages) can be
    /// updated or removed. Zones placed only on other pages are left alone,
    /// and so is a desired zone that still carries another page's placement
    /// id. A stored zone without a placement id is placed on `page`.
    ///
    /// Removing a zone from the page deletes just that placement when the
    /// zone is still placed elsewhere, and the whole zone otherwise.
    ///
    /// With `is_new_template` the stored set is known to be empty and is
    /// not read. An error is returned only if the stored set cannot be
    /// read; individual zone failures are collected in the report.
    pub async fn reconcile_zone_set(
        &self,
        desired: &[ZoneGeometry],
        template_id: TemplateId,
        is_new_template: bool,
        page: &PageContext,
    ) -> Result<ReconcileReport> {
        let (persisted, placements) = if is_new_template {
            (HashMap::new(), HashMap::new())
        } else {
            let persisted: HashMap<ZoneId, CustomizationZone> = self
                .list_zones(template_id)
                .await?
                .into_iter()
                .map(|z| (z.id, z))
                .collect();
            let placements: HashMap<ZoneId, ZoneWithAssignment> = self
                .load_zones_for_page(page.page_id())
                .await?
                .into_iter()
                .map(|p| (p.zone.id, p))
                .collect();
            (persisted, placements)
        };

        let mut report = ReconcileReport::default();
        let mut kept: HashSet<ZoneId> = HashSet::new();

        for (index, zone) in desired.iter().enumerate() {
            let existing = zone.id().and_then(|id| persisted.get(&id));
            let placement = existing.and_then(|row| placements.get(&row.id));

            if let (Some(row), None, Some(other)) = (existing, placement, zone.assignment_id()) {
                log::debug!(
                    "Zone {:?} is placed on another page (assignment {}), leaving it alone",
                    row.name,
                    other
                );
                report.unchanged.push(row.id);
                continue;
            }

            let action = if existing.is_some() {
                ReconcileAction::Update
            } else {
                ReconcileAction::Insert
            };

            if let Err(e) = zone.rect().ensure_positive() {
                if let Some(row) = existing {
                    kept.insert(row.id);
                }
                report.fail(action, zone.name(), zone.id(), &e);
                continue;
            }

            match existing {
                None => match self.create_zone(template_id, zone, page).await {
                    Ok(created) => report.inserted.push(InsertedZone {
                        index,
                        zone_id: created.zone_id,
                        assignment_id: created.assignment_id,
                    }),
                    Err(e) => report.fail(action, zone.name(), zone.id(), &e),
                },
                Some(row) => {
                    kept.insert(row.id);
                    match self.update_existing(row, placement, zone, page).await {
                        Ok(true) => report.updated.push(row.id),
                        Ok(false) => report.unchanged.push(row.id),
                        Err(e) => report.fail(action, zone.name(), Some(row.id), &e),
                    }
                }
            }
        }

        for placed in placements.values().filter(|p| !kept.contains(&p.zone.id)) {
            match self.remove_from_page(placed, page).await {
                Ok(()) => report.deleted.push(placed.zone.id),
                Err(e) => {
                    report.fail(ReconcileAction::Delete, &placed.zone.name, Some(placed.zone.id), &e)
                }
            }
        }

        log::info!(
            "Saved page {} of template {}: {} inserted, {} updated, {} deleted, {} unchanged, {} failed",
            page.page.page_number,
            template_id,
            report.inserted.len(),
            report.updated.len(),
            report.deleted.len(),
            report.unchanged.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Take a zone off `page`: drop only this placement if the zone sits on
    /// other pages too, else delete the zone with its placement.
    async fn remove_from_page(&self, placed: &ZoneWithAssignment, page: &PageContext) -> Result<()> {
        let zone = &placed.zone;
        let assignment = &placed.assignment;

        // A repeating zone is on every page through its single anchor row
        if !assignment.is_repeating {
            let others = self
                .store()
                .list_zone_assignments(zone.id)
                .await
                .map_err(|e| super::failure(format!("listing placements of zone {:?}", zone.name), e))?
                .into_iter()
                .filter(|a| a.id != assignment.id)
                .count();
            if others > 0 {
                return self
                    .store()
                    .delete_assignment(assignment.id)
                    .await
                    .map_err(|e| {
                        super::failure(
                            format!(
                                "removing zone {:?} from page {}",
                                zone.name, page.page.page_number
                            ),
                            e,
                        )
                    });
            }
        }

        let outcome = self.delete_zone(zone.id, Some(assignment.id)).await;
        for step in [outcome.assignment, outcome.zone] {
            if let StepOutcome::Failed(e) = step {
                return Err(e);
            }
        }
        Ok(())
    }

    /// Write whatever differs between a stored zone and its desired state.
    /// Returns whether any call was made.
    async fn update_existing(
        &self,
        row: &CustomizationZone,
        placement: Option<&ZoneWithAssignment>,
        zone: &ZoneGeometry,
        page: &PageContext,
    ) -> Result<bool> {
        if row.zone_type != zone.zone_type() {
            return Err(ZoneError::Config(format!(
                "zone {:?} cannot change type from {} to {}; delete and recreate it",
                row.name,
                row.zone_type,
                zone.zone_type()
            )));
        }

        let vector = page.system.canvas_rect_to_vector(&zone.rect());
        let placement_changed = match placement {
            Some(p) => {
                !rect_close(&p.geometry, &vector, page.vector_tolerance())
                    || p.assignment.z_index != zone.z_index()
            }
            None => true,
        };
        let mut changed = false;

        let mut patch = ZonePatch::default();
        if row.name != zone.name() {
            patch.name = Some(zone.name().to_string());
        }
        if row.z_index != zone.z_index() {
            patch.z_index = Some(zone.z_index());
        }
        if placement_changed && !rect_close(&row.rect, &zone.rect(), CANVAS_TOLERANCE) {
            patch.rect = Some(zone.rect());
        }
        if !patch.is_empty() {
            self.update_zone(row.id, patch).await?;
            changed = true;
        }

        match placement {
            None => {
                self.store()
                    .insert_assignment(NewAssignment {
                        zone_id: row.id,
                        page_id: page.page_id(),
                        rect: vector,
                        z_index: zone.z_index(),
                        is_repeating: zone.is_repeating(),
                    })
                    .await
                    .map_err(|e| {
                        super::failure(
                            format!(
                                "placing zone {:?} on page {}",
                                row.name, page.page.page_number
                            ),
                            e,
                        )
                    })?;
                return Ok(true);
            }
            Some(p) if placement_changed => {
                if p.assignment.is_repeating {
                    self.update_repeating_geometry(
                        &p.assignment,
                        &page.page,
                        vector,
                        Some(zone.z_index()),
                    )
                    .await?;
                } else {
                    self.update_assignment(
                        p.assignment.id,
                        AssignmentPatch {
                            rect: Some(vector),
                            z_index: Some(zone.z_index()),
                            is_repeating: None,
                        },
                    )
                    .await?;
                }
                changed = true;
            }
            Some(_) => {}
        }

        if let Some(p) = placement {
            if p.assignment.is_repeating != zone.is_repeating() {
                self.set_repeating(&p.assignment, zone.is_repeating()).await?;
                changed = true;
            }
        }

        Ok(changed)
    }
}
