//! Customer-facing customization flow
//!
//! The customer walks the template's pages and fills each zone placed on
//! them. Content is keyed by zone and page, so a repeating zone can hold
//! different content on every page it appears on.

use super::SessionScope;
use crate::geometry::ZoneGeometry;
use crate::model::{Template, TemplatePage, ZoneWithAssignment};
use crate::persistence::{PageContext, ZonePersistence};
use crate::types::{PageId, Result, TemplateId, ZoneError, ZoneId, ZoneType};
use std::collections::{BTreeMap, HashMap};

/// What a customer put into a zone
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "lowercase"))]
pub enum ZoneContent {
    Image { uri: String },
    Text { text: String },
}

impl ZoneContent {
    pub fn zone_type(&self) -> ZoneType {
        match self {
            ZoneContent::Image { .. } => ZoneType::Image,
            ZoneContent::Text { .. } => ZoneType::Text,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ZoneContent::Image { uri } => uri.trim().is_empty(),
            ZoneContent::Text { text } => text.trim().is_empty(),
        }
    }
}

/// Filled placements out of those visited so far
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Completion {
    pub filled: usize,
    pub total: usize,
}

impl Completion {
    pub fn is_complete(&self) -> bool {
        self.filled == self.total
    }
}

#[derive(Debug)]
pub struct CustomizationSession {
    service: ZonePersistence,
    scope: SessionScope,
    template: Template,
    pages: Vec<TemplatePage>,
    current: usize,
    canvas: (f64, f64),
    context: PageContext,
    placements: Vec<ZoneWithAssignment>,
    seen: BTreeMap<(ZoneId, PageId), ZoneType>,
    content: HashMap<(ZoneId, PageId), ZoneContent>,
    unsaved: bool,
}

impl CustomizationSession {
    /// Open a template on its first page
    pub async fn open(
        service: ZonePersistence,
        scope: SessionScope,
        template_id: TemplateId,
        canvas_width: f64,
        canvas_height: f64,
    ) -> Result<Self> {
        let template = scope.run_result(service.get_template(template_id)).await?;
        let pages = scope.run_result(service.list_pages(template_id)).await?;
        let Some(first) = pages.first().cloned() else {
            return Err(ZoneError::NoPages);
        };
        let context = PageContext::new(first, canvas_width, canvas_height)?;

        let mut session = Self {
            service,
            scope,
            template,
            pages,
            current: 0,
            canvas: (canvas_width, canvas_height),
            context,
            placements: Vec::new(),
            seen: BTreeMap::new(),
            content: HashMap::new(),
            unsaved: false,
        };
        session.load_current().await?;
        Ok(session)
    }

    async fn load_current(&mut self) -> Result<()> {
        let page = self.pages[self.current].clone();
        let placements = self
            .scope
            .run_result(self.service.load_zones_for_page(page.id))
            .await?;
        self.context = PageContext::new(page, self.canvas.0, self.canvas.1)?;
        for placement in &placements {
            self.seen.insert(
                (placement.zone.id, self.context.page_id()),
                placement.zone.zone_type,
            );
        }
        self.placements = placements;
        log::debug!(
            "Showing page {} of {} with {} zones",
            self.current + 1,
            self.pages.len(),
            self.placements.len()
        );
        Ok(())
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn pages(&self) -> &[TemplatePage] {
        &self.pages
    }

    pub fn current_page(&self) -> &TemplatePage {
        &self.context.page
    }

    /// 0-based position in the page list
    pub fn page_index(&self) -> usize {
        self.current
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Move forward; `false` when already on the last page
    pub async fn next_page(&mut self) -> Result<bool> {
        if self.current + 1 >= self.pages.len() {
            return Ok(false);
        }
        self.go_to_index(self.current + 1).await?;
        Ok(true)
    }

    /// Move back; `false` when already on the first page
    pub async fn previous_page(&mut self) -> Result<bool> {
        if self.current == 0 {
            return Ok(false);
        }
        self.go_to_index(self.current - 1).await?;
        Ok(true)
    }

    pub async fn go_to_page(&mut self, page_number: u32) -> Result<()> {
        let index = self
            .pages
            .iter()
            .position(|p| p.page_number == page_number)
            .ok_or_else(|| ZoneError::NotFound {
                entity: "page",
                id: page_number.to_string(),
            })?;
        self.go_to_index(index).await
    }

    async fn go_to_index(&mut self, index: usize) -> Result<()> {
        let previous = self.current;
        self.current = index;
        if let Err(e) = self.load_current().await {
            self.current = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Zones on the current page, bottom to top, in native units
    pub fn placements(&self) -> &[ZoneWithAssignment] {
        &self.placements
    }

    /// Zones on the current page in canvas pixels
    pub fn canvas_zones(&self) -> Vec<ZoneGeometry> {
        self.placements
            .iter()
            .filter_map(|p| {
                let rect = self.context.system.vector_rect_to_canvas(&p.geometry);
                ZoneGeometry::new(p.zone.zone_type, p.zone.name.clone(), rect)
                    .ok()
                    .map(|z| {
                        z.with_ids(p.zone.id, Some(p.assignment.id))
                            .with_z_index(p.assignment.z_index)
                            .with_repeating(p.assignment.is_repeating)
                    })
            })
            .collect()
    }

    /// Fill a zone on the current page.
    ///
    /// The content kind must match the zone type.
    pub fn set_content(&mut self, zone_id: ZoneId, content: ZoneContent) -> Result<()> {
        let placement = self
            .placements
            .iter()
            .find(|p| p.zone.id == zone_id)
            .ok_or_else(|| ZoneError::NotFound {
                entity: "zone on this page",
                id: zone_id.to_string(),
            })?;
        if placement.zone.zone_type != content.zone_type() {
            return Err(ZoneError::ContentTypeMismatch {
                zone: placement.zone.name.clone(),
                expected: placement.zone.zone_type,
            });
        }
        self.content
            .insert((zone_id, self.context.page_id()), content);
        self.unsaved = true;
        Ok(())
    }

    /// Remove content from a zone on the current page
    pub fn clear_content(&mut self, zone_id: ZoneId) -> bool {
        let removed = self
            .content
            .remove(&(zone_id, self.context.page_id()))
            .is_some();
        self.unsaved |= removed;
        removed
    }

    pub fn content(&self, zone_id: ZoneId, page_id: PageId) -> Option<&ZoneContent> {
        self.content.get(&(zone_id, page_id))
    }

    /// All content entered so far
    pub fn contents(&self) -> impl Iterator<Item = (&(ZoneId, PageId), &ZoneContent)> {
        self.content.iter()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    pub fn mark_saved(&mut self) {
        self.unsaved = false;
    }

    pub fn completion(&self) -> Completion {
        let filled = self
            .seen
            .keys()
            .filter(|key| self.content.get(key).is_some_and(|c| !c.is_empty()))
            .count();
        Completion {
            filled,
            total: self.seen.len(),
        }
    }

    /// Stop accepting results from pending loads
    pub fn close(&self) {
        self.scope.teardown();
    }
}
