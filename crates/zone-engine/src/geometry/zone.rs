use super::{PlacementGrid, Rect, ZoneDefaults};
use crate::types::{AssignmentId, Result, ZoneId, ZoneType};

/// A single typed field edit coming from a property panel.
///
/// There is deliberately no variant for the zone type: the type is fixed at
/// creation and changing it means deleting and recreating the zone.
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneField {
    Name(String),
    X(f64),
    Y(f64),
    Width(f64),
    Height(f64),
    ZIndex(i32),
    Repeating(bool),
}

/// In-memory zone as seen by the editing surface, in canvas pixels.
///
/// Every mutation that changes the size goes through `ensure_positive`
/// first; a rejected edit leaves the zone untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneGeometry {
    id: Option<ZoneId>,
    assignment_id: Option<AssignmentId>,
    zone_type: ZoneType,
    name: String,
    rect: Rect,
    z_index: i32,
    is_repeating: bool,
}

impl ZoneGeometry {
    pub fn new(zone_type: ZoneType, name: impl Into<String>, rect: Rect) -> Result<Self> {
        rect.ensure_positive()?;
        Ok(Self {
            id: None,
            assignment_id: None,
            zone_type,
            name: name.into(),
            rect,
            z_index: 0,
            is_repeating: false,
        })
    }

    /// A new zone sized by type and placed at grid cell `count`
    pub fn with_defaults(
        zone_type: ZoneType,
        name: impl Into<String>,
        count: usize,
        grid: &PlacementGrid,
        defaults: &ZoneDefaults,
    ) -> Result<Self> {
        let mut zone = Self::new(zone_type, name, grid.place(count, zone_type, defaults))?;
        zone.z_index = count as i32;
        Ok(zone)
    }

    /// Attach the row ids once the zone has been persisted
    pub fn with_ids(mut self, id: ZoneId, assignment_id: Option<AssignmentId>) -> Self {
        self.id = Some(id);
        self.assignment_id = assignment_id;
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn with_repeating(mut self, is_repeating: bool) -> Self {
        self.is_repeating = is_repeating;
        self
    }

    pub fn id(&self) -> Option<ZoneId> {
        self.id
    }

    pub fn assignment_id(&self) -> Option<AssignmentId> {
        self.assignment_id
    }

    pub fn zone_type(&self) -> ZoneType {
        self.zone_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn is_repeating(&self) -> bool {
        self.is_repeating
    }

    pub(crate) fn set_ids(&mut self, id: ZoneId, assignment_id: Option<AssignmentId>) {
        self.id = Some(id);
        self.assignment_id = assignment_id;
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.rect.x = x;
        self.rect.y = y;
    }

    pub fn move_by(&mut self, dx: f64, dy: f64) {
        self.rect.x += dx;
        self.rect.y += dy;
    }

    pub fn resize(&mut self, width: f64, height: f64) -> Result<()> {
        self.set_rect(Rect::new(self.rect.x, self.rect.y, width, height))
    }

    pub fn set_rect(&mut self, rect: Rect) -> Result<()> {
        rect.ensure_positive()?;
        self.rect = rect;
        Ok(())
    }

    /// Commit a drag-handle transform: the surface reports scale factors
    /// relative to the current size plus the new top-left corner.
    pub fn commit_transform(&mut self, x: f64, y: f64, scale_x: f64, scale_y: f64) -> Result<()> {
        self.set_rect(Rect::new(
            x,
            y,
            self.rect.width * scale_x,
            self.rect.height * scale_y,
        ))
    }

    pub fn apply(&mut self, field: ZoneField) -> Result<()> {
        match field {
            ZoneField::Name(name) => self.name = name,
            ZoneField::X(x) => self.rect.x = x,
            ZoneField::Y(y) => self.rect.y = y,
            ZoneField::Width(width) => self.resize(width, self.rect.height)?,
            ZoneField::Height(height) => self.resize(self.rect.width, height)?,
            ZoneField::ZIndex(z_index) => self.z_index = z_index,
            ZoneField::Repeating(is_repeating) => self.is_repeating = is_repeating,
        }
        Ok(())
    }
}
