//! In-process store backed by ordered maps
//!
//! Used by the CLI (persisted as a JSON snapshot) and by tests. Every call
//! is recorded in a journal, and individual operations can be made to fail
//! to exercise partial-failure paths.

use super::{StoreError, StoreOp, StoreResult, ZoneStore};
use crate::model::{
    AssignmentDraft, AssignmentPatch, CustomizationZone, NewAssignment, NewPage, NewTemplate,
    NewZone, Template, TemplatePage, TemplatePatch, ZonePageAssignment, ZonePatch,
};
use crate::types::{AssignmentId, PageId, TemplateId, ZoneId};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::Mutex;

/// One recorded store call
#[derive(Debug, Clone, PartialEq)]
pub struct StoreCall {
    pub op: StoreOp,
    /// Id or name of the row the call was about
    pub target: String,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    templates: BTreeMap<TemplateId, Template>,
    pages: BTreeMap<PageId, TemplatePage>,
    zones: BTreeMap<ZoneId, CustomizationZone>,
    assignments: BTreeMap<AssignmentId, ZonePageAssignment>,
}

impl Tables {
    fn template(&self, id: TemplateId) -> StoreResult<&Template> {
        self.templates.get(&id).ok_or_else(|| not_found("templates", id))
    }

    fn page(&self, id: PageId) -> StoreResult<&TemplatePage> {
        self.pages.get(&id).ok_or_else(|| not_found("template_pages", id))
    }

    fn zone(&self, id: ZoneId) -> StoreResult<&CustomizationZone> {
        self.zones
            .get(&id)
            .ok_or_else(|| not_found("customization_zones", id))
    }

    fn remove_assignments_where(&mut self, predicate: impl Fn(&ZonePageAssignment) -> bool) {
        self.assignments.retain(|_, a| !predicate(a));
    }

    fn remove_zone(&mut self, id: ZoneId) {
        self.zones.remove(&id);
        self.remove_assignments_where(|a| a.zone_id == id);
    }

    fn remove_page(&mut self, id: PageId) {
        self.pages.remove(&id);
        self.remove_assignments_where(|a| a.page_id == id);
    }

    fn insert_assignment(&mut self, assignment: NewAssignment) -> StoreResult<ZonePageAssignment> {
        self.zone(assignment.zone_id)?;
        let page_template = self.page(assignment.page_id)?.template_id;
        if self.zones[&assignment.zone_id].template_id != page_template {
            return Err(StoreError::Constraint(format!(
                "zone {} and page {} belong to different templates",
                assignment.zone_id, assignment.page_id
            )));
        }
        if self
            .assignments
            .values()
            .any(|a| a.zone_id == assignment.zone_id && a.page_id == assignment.page_id)
        {
            return Err(StoreError::Constraint(format!(
                "zone {} already has an assignment on page {}",
                assignment.zone_id, assignment.page_id
            )));
        }

        let row = ZonePageAssignment {
            id: AssignmentId::new(),
            zone_id: assignment.zone_id,
            page_id: assignment.page_id,
            rect: assignment.rect,
            z_index: assignment.z_index,
            is_repeating: assignment.is_repeating,
            created_at: Utc::now(),
        };
        self.assignments.insert(row.id, row.clone());
        Ok(row)
    }

    fn insert_zone(&mut self, zone: NewZone) -> StoreResult<CustomizationZone> {
        self.template(zone.template_id)?;
        let now = Utc::now();
        let row = CustomizationZone {
            id: ZoneId::new(),
            template_id: zone.template_id,
            name: zone.name,
            zone_type: zone.zone_type,
            rect: zone.rect,
            z_index: zone.z_index,
            created_at: now,
            updated_at: now,
        };
        self.zones.insert(row.id, row.clone());
        Ok(row)
    }
}

#[derive(Debug, Default)]
struct Inner {
    tables: Tables,
    journal: Vec<StoreCall>,
    faults: HashSet<StoreOp>,
}

impl Inner {
    /// Record the call, then fail it if a fault is armed for `op`
    fn begin(&mut self, op: StoreOp, target: impl ToString) -> StoreResult<()> {
        self.journal.push(StoreCall {
            op,
            target: target.to_string(),
        });
        if self.faults.contains(&op) {
            return Err(StoreError::Backend(format!("injected failure for {op}")));
        }
        Ok(())
    }
}

fn not_found(table: &'static str, id: impl ToString) -> StoreError {
    StoreError::NotFound {
        table,
        id: id.to_string(),
    }
}

/// A [`ZoneStore`] held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    transactional: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that also offers the atomic zone + assignment insert
    pub fn transactional() -> Self {
        Self {
            inner: Mutex::default(),
            transactional: true,
        }
    }

    /// Make every subsequent call of `op` fail with a backend error
    pub async fn inject_fault(&self, op: StoreOp) {
        self.inner.lock().await.faults.insert(op);
    }

    pub async fn clear_faults(&self) {
        self.inner.lock().await.faults.clear();
    }

    /// All calls made so far, in order
    pub async fn journal(&self) -> Vec<StoreCall> {
        self.inner.lock().await.journal.clone()
    }

    /// Write calls made so far, in order
    pub async fn writes(&self) -> Vec<StoreCall> {
        self.inner
            .lock()
            .await
            .journal
            .iter()
            .filter(|call| call.op.is_write())
            .cloned()
            .collect()
    }

    pub async fn clear_journal(&self) {
        self.inner.lock().await.journal.clear();
    }

    pub async fn zone_count(&self) -> usize {
        self.inner.lock().await.tables.zones.len()
    }

    pub async fn assignment_count(&self) -> usize {
        self.inner.lock().await.tables.assignments.len()
    }
}

#[async_trait]
impl ZoneStore for MemoryStore {
    async fn insert_template(&self, template: NewTemplate) -> StoreResult<Template> {
        let mut inner = self.inner.lock().await;
        inner.begin(StoreOp::InsertTemplate, &template.name)?;
        let now = Utc::now();
        let row = Template {
            id: TemplateId::new(),
            name: template.name,
            description: template.description,
            category: template.category,
            is_active: true,
            dimensions: template.dimensions,
            bleed_settings: template.bleed_settings,
            original_document_url: None,
            document_metadata: BTreeMap::new(),
            created_by: template.created_by,
            created_at: now,
            updated_at: now,
        };
        inner.tables.templates.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_template(&self, id: TemplateId) -> StoreResult<Template> {
        let mut inner = self.inner.lock().await;
        inner.begin(StoreOp::GetTemplate, id)?;
        inner.tables.template(id).cloned()
    }

    async fn update_template(&self, id: TemplateId, patch: TemplatePatch) -> StoreResult<Template> {
        let mut inner = self.inner.lock().await;
        inner.begin(StoreOp::UpdateTemplate, id)?;
        let row = inner
            .tables
            .templates
            .get_mut(&id)
            .ok_or_else(|| not_found("templates", id))?;
        if let Some(url) = patch.original_document_url {
            row.original_document_url = Some(url);
        }
        if let Some(metadata) = patch.document_metadata {
            row.document_metadata = metadata;
        }
        if let Some(is_active) = patch.is_active {
            row.is_active = is_active;
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete_template(&self, id: TemplateId) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner.begin(StoreOp::DeleteTemplate, id)?;
        inner.tables.template(id)?;

        let tables = &mut inner.tables;
        let zone_ids: Vec<ZoneId> = tables
            .zones
            .values()
            .filter(|z| z.template_id == id)
            .map(|z| z.id)
            .collect();
        for zone_id in zone_ids {
            tables.remove_zone(zone_id);
        }
        let page_ids: Vec<PageId> = tables
            .pages
            .values()
            .filter(|p| p.template_id == id)
            .map(|p| p.id)
            .collect();
        for page_id in page_ids {
            tables.remove_page(page_id);
        }
        tables.templates.remove(&id);
        Ok(())
    }

    async fn insert_page(&self, page: NewPage) -> StoreResult<TemplatePage> {
        let mut inner = self.inner.lock().await;
        inner.begin(StoreOp::InsertPage, page.page_number)?;
        inner.tables.template(page.template_id)?;
        if page.page_number == 0 {
            return Err(StoreError::Constraint("page numbers are 1-based".into()));
        }
        if inner
            .tables
            .pages
            .values()
            .any(|p| p.template_id == page.template_id && p.page_number == page.page_number)
        {
            return Err(StoreError::Constraint(format!(
                "template {} already has page {}",
                page.template_id, page.page_number
            )));
        }

        let now = Utc::now();
        let row = TemplatePage {
            id: PageId::new(),
            template_id: page.template_id,
            page_number: page.page_number,
            preview_image_url: page.preview_image_url,
            native_page_width: page.native_size.map(|s| s.width),
            native_page_height: page.native_size.map(|s| s.height),
            native_units: page.native_size.map(|s| s.unit),
            created_at: now,
            updated_at: now,
        };
        inner.tables.pages.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_page(&self, id: PageId) -> StoreResult<TemplatePage> {
        let mut inner = self.inner.lock().await;
        inner.begin(StoreOp::GetPage, id)?;
        inner.tables.page(id).cloned()
    }

    async fn list_pages(&self, template_id: TemplateId) -> StoreResult<Vec<TemplatePage>> {
        let mut inner = self.inner.lock().await;
        inner.begin(StoreOp::ListPages, template_id)?;
        let mut pages: Vec<TemplatePage> = inner
            .tables
            .pages
            .values()
            .filter(|p| p.template_id == template_id)
            .cloned()
            .collect();
        pages.sort_by_key(|p| p.page_number);
        Ok(pages)
    }

    async fn delete_page(&self, id: PageId) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner.begin(StoreOp::DeletePage, id)?;
        inner.tables.page(id)?;
        inner.tables.remove_page(id);
        Ok(())
    }

    async fn insert_zone(&self, zone: NewZone) -> StoreResult<CustomizationZone> {
        let mut inner = self.inner.lock().await;
        inner.begin(StoreOp::InsertZone, &zone.name)?;
        inner.tables.insert_zone(zone)
    }

    async fn get_zone(&self, id: ZoneId) -> StoreResult<CustomizationZone> {
        let mut inner = self.inner.lock().await;
        inner.begin(StoreOp::GetZone, id)?;
        inner.tables.zone(id).cloned()
    }

    async fn list_zones(&self, template_id: TemplateId) -> StoreResult<Vec<CustomizationZone>> {
        let mut inner = self.inner.lock().await;
        inner.begin(StoreOp::ListZones, template_id)?;
        let mut zones: Vec<CustomizationZone> = inner
            .tables
            .zones
            .values()
            .filter(|z| z.template_id == template_id)
            .cloned()
            .collect();
        zones.sort_by_key(|z| (z.z_index, z.created_at));
        Ok(zones)
    }

    async fn update_zone(&self, id: ZoneId, patch: ZonePatch) -> StoreResult<CustomizationZone> {
        let mut inner = self.inner.lock().await;
        inner.begin(StoreOp::UpdateZone, id)?;
        let row = inner
            .tables
            .zones
            .get_mut(&id)
            .ok_or_else(|| not_found("customization_zones", id))?;
        if let Some(name) = patch.name {
            row.name = name;
        }
        if let Some(rect) = patch.rect {
            row.rect = rect;
        }
        if let Some(z_index) = patch.z_index {
            row.z_index = z_index;
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete_zone(&self, id: ZoneId) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner.begin(StoreOp::DeleteZone, id)?;
        inner.tables.zone(id)?;
        inner.tables.remove_zone(id);
        Ok(())
    }

    async fn insert_assignment(
        &self,
        assignment: NewAssignment,
    ) -> StoreResult<ZonePageAssignment> {
        let mut inner = self.inner.lock().await;
        inner.begin(StoreOp::InsertAssignment, assignment.zone_id)?;
        inner.tables.insert_assignment(assignment)
    }

    async fn list_page_assignments(&self, page_id: PageId) -> StoreResult<Vec<ZonePageAssignment>> {
        let mut inner = self.inner.lock().await;
        inner.begin(StoreOp::ListPageAssignments, page_id)?;
        Ok(inner
            .tables
            .assignments
            .values()
            .filter(|a| a.page_id == page_id)
            .cloned()
            .collect())
    }

    async fn list_zone_assignments(&self, zone_id: ZoneId) -> StoreResult<Vec<ZonePageAssignment>> {
        let mut inner = self.inner.lock().await;
        inner.begin(StoreOp::ListZoneAssignments, zone_id)?;
        Ok(inner
            .tables
            .assignments
            .values()
            .filter(|a| a.zone_id == zone_id)
            .cloned()
            .collect())
    }

    async fn list_template_assignments(
        &self,
        template_id: TemplateId,
    ) -> StoreResult<Vec<ZonePageAssignment>> {
        let mut inner = self.inner.lock().await;
        inner.begin(StoreOp::ListTemplateAssignments, template_id)?;
        let tables = &inner.tables;
        Ok(tables
            .assignments
            .values()
            .filter(|a| {
                tables
                    .zones
                    .get(&a.zone_id)
                    .is_some_and(|z| z.template_id == template_id)
            })
            .cloned()
            .collect())
    }

    async fn update_assignment(
        &self,
        id: AssignmentId,
        patch: AssignmentPatch,
    ) -> StoreResult<ZonePageAssignment> {
        let mut inner = self.inner.lock().await;
        let zone_id = inner.tables.assignments.get(&id).map(|a| a.zone_id);
        match zone_id {
            Some(zone_id) => inner.begin(StoreOp::UpdateAssignment, zone_id)?,
            None => inner.begin(StoreOp::UpdateAssignment, id)?,
        }
        let row = inner
            .tables
            .assignments
            .get_mut(&id)
            .ok_or_else(|| not_found("zone_page_assignments", id))?;
        if let Some(rect) = patch.rect {
            row.rect = rect;
        }
        if let Some(z_index) = patch.z_index {
            row.z_index = z_index;
        }
        if let Some(is_repeating) = patch.is_repeating {
            row.is_repeating = is_repeating;
        }
        Ok(row.clone())
    }

    async fn delete_assignment(&self, id: AssignmentId) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        let zone_id = inner.tables.assignments.get(&id).map(|a| a.zone_id);
        match zone_id {
            Some(zone_id) => inner.begin(StoreOp::DeleteAssignment, zone_id)?,
            None => inner.begin(StoreOp::DeleteAssignment, id)?,
        }
        inner
            .tables
            .assignments
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("zone_page_assignments", id))
    }

    fn supports_transactions(&self) -> bool {
        self.transactional
    }

    async fn insert_zone_with_assignment(
        &self,
        zone: NewZone,
        assignment: AssignmentDraft,
    ) -> StoreResult<(CustomizationZone, ZonePageAssignment)> {
        if !self.transactional {
            return Err(StoreError::Unsupported("insert_zone_with_assignment"));
        }
        let mut inner = self.inner.lock().await;
        inner.begin(StoreOp::InsertZoneWithAssignment, &zone.name)?;

        // Work on a copy so a failed assignment leaves no trace
        let mut staged = inner.tables.clone();
        let zone_row = staged.insert_zone(zone)?;
        let assignment_row = staged.insert_assignment(assignment.for_zone(zone_row.id))?;
        inner.tables = staged;
        Ok((zone_row, assignment_row))
    }
}

#[cfg(feature = "serde")]
mod snapshot {
    use super::*;
    use crate::types::{Result, ZoneError};
    use serde::{Deserialize, Serialize};
    use std::path::Path;

    #[derive(Serialize, Deserialize, Default)]
    struct Snapshot {
        templates: Vec<Template>,
        pages: Vec<TemplatePage>,
        zones: Vec<CustomizationZone>,
        assignments: Vec<ZonePageAssignment>,
    }

    impl MemoryStore {
        /// Load a store from a JSON snapshot; a missing file yields an empty store
        pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
            let path = path.as_ref();
            if !tokio::fs::try_exists(path).await? {
                log::debug!("No snapshot at {}, starting empty", path.display());
                return Ok(Self::new());
            }
            let bytes = tokio::fs::read(path).await?;
            let snapshot: Snapshot = serde_json::from_slice(&bytes)
                .map_err(|e| ZoneError::Config(format!("Failed to parse store snapshot: {}", e)))?;

            let tables = Tables {
                templates: snapshot.templates.into_iter().map(|t| (t.id, t)).collect(),
                pages: snapshot.pages.into_iter().map(|p| (p.id, p)).collect(),
                zones: snapshot.zones.into_iter().map(|z| (z.id, z)).collect(),
                assignments: snapshot.assignments.into_iter().map(|a| (a.id, a)).collect(),
            };
            Ok(Self {
                inner: Mutex::new(Inner {
                    tables,
                    ..Inner::default()
                }),
                transactional: false,
            })
        }

        /// Write the current rows to a JSON snapshot
        pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
            let json = {
                let inner = self.inner.lock().await;
                let tables = &inner.tables;
                let snapshot = Snapshot {
                    templates: tables.templates.values().cloned().collect(),
                    pages: tables.pages.values().cloned().collect(),
                    zones: tables.zones.values().cloned().collect(),
                    assignments: tables.assignments.values().cloned().collect(),
                };
                serde_json::to_string_pretty(&snapshot).map_err(|e| {
                    ZoneError::Config(format!("Failed to serialize store snapshot: {}", e))
                })?
            };
            tokio::fs::write(path, json).await?;
            Ok(())
        }
    }
}
