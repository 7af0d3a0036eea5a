//! Row storage seam
//!
//! The engine never talks to a database directly. Everything goes through
//! [`ZoneStore`], a row-level CRUD interface over the four tables. Every
//! call is one round trip; nothing here retries.
//!
//! Deleting a zone or a page removes its assignments, and deleting a
//! template removes its pages and zones, matching the cascade rules of the
//! logical schema.

mod memory;

pub use memory::*;

use crate::model::{
    AssignmentDraft, AssignmentPatch, CustomizationZone, NewAssignment, NewPage, NewTemplate,
    NewZone, Template, TemplatePage, TemplatePatch, ZonePageAssignment, ZonePatch,
};
use crate::types::{AssignmentId, PageId, TemplateId, ZoneId};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{table} row not found: {id}")]
    NotFound { table: &'static str, id: String },
    #[error("Constraint violation: {0}")]
    Constraint(String),
    #[error("Operation not supported by this store: {0}")]
    Unsupported(&'static str),
    #[error("Backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Every operation a store exposes, used for journaling and fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    InsertTemplate,
    GetTemplate,
    UpdateTemplate,
    DeleteTemplate,
    InsertPage,
    GetPage,
    ListPages,
    DeletePage,
    InsertZone,
    GetZone,
    ListZones,
    UpdateZone,
    DeleteZone,
    InsertAssignment,
    ListPageAssignments,
    ListZoneAssignments,
    ListTemplateAssignments,
    UpdateAssignment,
    DeleteAssignment,
    InsertZoneWithAssignment,
}

impl StoreOp {
    /// Whether the operation writes
    pub fn is_write(self) -> bool {
        !matches!(
            self,
            StoreOp::GetTemplate
                | StoreOp::GetPage
                | StoreOp::ListPages
                | StoreOp::GetZone
                | StoreOp::ListZones
                | StoreOp::ListPageAssignments
                | StoreOp::ListZoneAssignments
                | StoreOp::ListTemplateAssignments
        )
    }
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[async_trait]
pub trait ZoneStore: Send + Sync {
    // Templates
    async fn insert_template(&self, template: NewTemplate) -> StoreResult<Template>;
    async fn get_template(&self, id: TemplateId) -> StoreResult<Template>;
    async fn update_template(&self, id: TemplateId, patch: TemplatePatch) -> StoreResult<Template>;
    async fn delete_template(&self, id: TemplateId) -> StoreResult<()>;

    // Pages
    async fn insert_page(&self, page: NewPage) -> StoreResult<TemplatePage>;
    async fn get_page(&self, id: PageId) -> StoreResult<TemplatePage>;
    /// Pages of a template ordered by page number
    async fn list_pages(&self, template_id: TemplateId) -> StoreResult<Vec<TemplatePage>>;
    async fn delete_page(&self, id: PageId) -> StoreResult<()>;

    // Zones
    async fn insert_zone(&self, zone: NewZone) -> StoreResult<CustomizationZone>;
    async fn get_zone(&self, id: ZoneId) -> StoreResult<CustomizationZone>;
    async fn list_zones(&self, template_id: TemplateId) -> StoreResult<Vec<CustomizationZone>>;
    async fn update_zone(&self, id: ZoneId, patch: ZonePatch) -> StoreResult<CustomizationZone>;
    async fn delete_zone(&self, id: ZoneId) -> StoreResult<()>;

    // Assignments
    async fn insert_assignment(&self, assignment: NewAssignment)
    -> StoreResult<ZonePageAssignment>;
    async fn list_page_assignments(&self, page_id: PageId) -> StoreResult<Vec<ZonePageAssignment>>;
    async fn list_zone_assignments(&self, zone_id: ZoneId) -> StoreResult<Vec<ZonePageAssignment>>;
    /// Every assignment whose zone belongs to the template
    async fn list_template_assignments(
        &self,
        template_id: TemplateId,
    ) -> StoreResult<Vec<ZonePageAssignment>>;
    async fn update_assignment(
        &self,
        id: AssignmentId,
        patch: AssignmentPatch,
    ) -> StoreResult<ZonePageAssignment>;
    async fn delete_assignment(&self, id: AssignmentId) -> StoreResult<()>;

    /// Whether [`insert_zone_with_assignment`](Self::insert_zone_with_assignment)
    /// is available
    fn supports_transactions(&self) -> bool {
        false
    }

    /// Insert a zone and its first assignment atomically
    async fn insert_zone_with_assignment(
        &self,
        _zone: NewZone,
        _assignment: AssignmentDraft,
    ) -> StoreResult<(CustomizationZone, ZonePageAssignment)> {
        Err(StoreError::Unsupported("insert_zone_with_assignment"))
    }
}
