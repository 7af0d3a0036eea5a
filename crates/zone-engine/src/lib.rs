pub mod constants;
pub mod coords;
mod dimensions;
pub mod geometry;
mod ingest;
mod model;
mod options;
pub mod persistence;
pub mod session;
pub mod store;
mod types;
mod units;

pub use coords::{
    CoordinateSystem, DimensionMismatchWarning, GuideLines, canvas_to_vector_coordinates,
    compare_dimensions, compute_guides, vector_to_canvas_coordinates,
};
pub use dimensions::*;
pub use geometry::{PlacementGrid, Rect, ZoneDefaults, ZoneField, ZoneGeometry};
pub use ingest::{IngestOutcome, ingest_document, load_pdf, page_sizes};
pub use model::*;
pub use options::*;
pub use persistence::{
    CreatedZone, DeleteOutcome, PageContext, ReconcileReport, StepOutcome, ZonePersistence,
};
pub use store::{MemoryStore, StoreError, ZoneStore};
pub use types::*;
pub use units::*;
