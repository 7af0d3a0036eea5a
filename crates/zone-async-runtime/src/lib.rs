use std::path::PathBuf;

mod worker;

pub use worker::worker_task;

// Re-export types from the engine
pub use zone_engine::session::{DesiredSet, SessionScope};
pub use zone_engine::{
    AssignmentId, DimensionMismatchWarning, EditorOptions, IngestOutcome, PageId, ReconcileReport,
    TemplateId, ZoneGeometry, ZoneId, ZonePersistence,
};

/// Commands sent from the editing surface to the worker
#[derive(Debug)]
pub enum ZoneCommand {
    /// Load a page's zones onto a canvas of the given size
    LoadPage {
        page_id: PageId,
        canvas_width: f64,
        canvas_height: f64,
    },
    /// Reconcile the zones shown on one page with storage.
    ///
    /// Back-to-back queued saves of the same page collapse to the newest one.
    SaveTemplate {
        template_id: TemplateId,
        page_id: PageId,
        canvas_width: f64,
        canvas_height: f64,
        desired: DesiredSet,
        is_new_template: bool,
    },
    DeleteZone {
        zone_id: ZoneId,
        assignment_id: Option<AssignmentId>,
    },
    IngestDocument {
        template_id: TemplateId,
        path: PathBuf,
    },
    LoadOptions {
        path: PathBuf,
    },
}

/// Updates sent from the worker back to the surface
#[derive(Debug, Clone)]
pub enum ZoneUpdate {
    PageLoaded {
        page_id: PageId,
        zones: Vec<ZoneGeometry>,
        mismatch: Option<DimensionMismatchWarning>,
    },
    /// The save ran; `report` lists any zone that failed
    Saved {
        desired: DesiredSet,
        report: ReconcileReport,
    },
    ZoneDeleted {
        zone_id: ZoneId,
        succeeded: bool,
    },
    DocumentIngested {
        template_id: TemplateId,
        outcome: IngestOutcome,
    },
    OptionsLoaded {
        options: EditorOptions,
    },
    Error {
        message: String,
    },
}
