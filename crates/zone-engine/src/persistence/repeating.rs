//! Repeating zones
//!
//! A repeating zone has exactly one assignment, flagged `is_repeating`, on
//! its anchor page. That row is the canonical geometry for every page of
//! the template; no per-page rows exist. Other pages derive their geometry
//! from it by scaling between the two pages' native sizes, and an edit
//! made on any page is scaled back into the anchor's units before it is
//! written.

use super::{ZonePersistence, failure};
use crate::constants::VECTOR_DECIMALS;
use crate::coords::round_to;
use crate::dimensions::PhysicalSize;
use crate::geometry::Rect;
use crate::model::{AssignmentPatch, TemplatePage, ZonePageAssignment};
use crate::types::Result;

/// Map a rect between two page sizes by keeping its relative position.
///
/// Relative positions do not depend on units, so the two sizes may be in
/// different units.
pub fn rescale_between(rect: &Rect, from: &PhysicalSize, to: &PhysicalSize) -> Rect {
    let scaled = rect.scale(to.width / from.width, to.height / from.height);
    Rect::new(
        round_to(scaled.x, VECTOR_DECIMALS),
        round_to(scaled.y, VECTOR_DECIMALS),
        round_to(scaled.width, VECTOR_DECIMALS),
        round_to(scaled.height, VECTOR_DECIMALS),
    )
}

/// Map a rect from one page's native units onto another page.
///
/// Left unchanged when either page has no recorded native size.
pub fn rescale_for_page(rect: &Rect, from: &TemplatePage, to: &TemplatePage) -> Rect {
    match (from.native_size(), to.native_size()) {
        (Some(from), Some(to)) => rescale_between(rect, &from, &to),
        _ => *rect,
    }
}

impl ZonePersistence {
    /// Write geometry edited on `edited_page` into a repeating zone's
    /// canonical row, converting it to the anchor page's units first.
    pub async fn update_repeating_geometry(
        &self,
        anchor: &ZonePageAssignment,
        edited_page: &TemplatePage,
        rect: Rect,
        z_index: Option<i32>,
    ) -> Result<ZonePageAssignment> {
        rect.ensure_positive()?;
        let rect = if anchor.page_id == edited_page.id {
            rect
        } else {
            let anchor_page = self.get_page(anchor.page_id).await?;
            rescale_for_page(&rect, edited_page, &anchor_page)
        };
        self.update_assignment(
            anchor.id,
            AssignmentPatch {
                rect: Some(rect),
                z_index,
                is_repeating: None,
            },
        )
        .await
    }

    /// Turn the repeating flag of a placement on or off.
    ///
    /// Turning it on makes `assignment` the canonical row and removes the
    /// zone's placements on other pages. Turning it off keeps only the
    /// anchor placement as an ordinary one.
    pub async fn set_repeating(
        &self,
        assignment: &ZonePageAssignment,
        repeating: bool,
    ) -> Result<ZonePageAssignment> {
        let updated = self
            .update_assignment(
                assignment.id,
                AssignmentPatch {
                    is_repeating: Some(repeating),
                    ..AssignmentPatch::default()
                },
            )
            .await?;

        if repeating {
            let siblings = self
                .store()
                .list_zone_assignments(assignment.zone_id)
                .await
                .map_err(|e| failure(format!("listing placements of zone {}", assignment.zone_id), e))?;
            for sibling in siblings.into_iter().filter(|a| a.id != assignment.id) {
                self.store().delete_assignment(sibling.id).await.map_err(|e| {
                    failure(
                        format!("removing per-page placement {} of repeating zone", sibling.id),
                        e,
                    )
                })?;
            }
            log::debug!("Zone {} is now repeating", assignment.zone_id);
        }

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Unit;

    #[test]
    fn test_rescale_between_page_sizes() {
        let a4 = PhysicalSize::new(595.0, 842.0, Unit::Point).unwrap();
        let a5 = PhysicalSize::new(420.0, 595.0, Unit::Point).unwrap();
        let rect = Rect::new(59.5, 84.2, 119.0, 168.4);
        let scaled = rescale_between(&rect, &a4, &a5);
        assert_eq!(scaled, Rect::new(42.0, 59.5, 84.0, 119.0));
    }

    #[test]
    fn test_rescale_across_units() {
        let points = PhysicalSize::new(595.0, 842.0, Unit::Point).unwrap();
        let mm = PhysicalSize::new(210.0, 297.0, Unit::Millimeter).unwrap();
        let rect = Rect::new(0.0, 0.0, 595.0, 842.0);
        assert_eq!(rescale_between(&rect, &points, &mm), Rect::new(0.0, 0.0, 210.0, 297.0));
    }
}
