//! Zone editing session
//!
//! The editor owns every zone being edited in one arena. The surface never
//! holds zones itself; it addresses them through opaque [`ZoneHandle`]s and
//! changes them by sending [`EditIntent`]s. Saving takes a [`DesiredSet`]
//! snapshot of the arena, reconciles it, and feeds the report back so new
//! zones learn their persisted ids.

use crate::geometry::{PlacementGrid, ZoneDefaults, ZoneField, ZoneGeometry};
use crate::options::EditorOptions;
use crate::persistence::ReconcileReport;
use crate::types::{Result, ZoneError, ZoneId, ZoneType};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque reference to a zone held by a [`ZoneEditor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneHandle(u64);

impl fmt::Display for ZoneHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A change requested by the editing surface
#[derive(Debug, Clone, PartialEq)]
pub enum EditIntent {
    /// Add a zone at the next free grid cell; `name` defaults to "Image Zone 1" style
    Create {
        zone_type: ZoneType,
        name: Option<String>,
    },
    Select(Option<ZoneHandle>),
    Move {
        handle: ZoneHandle,
        x: f64,
        y: f64,
    },
    Resize {
        handle: ZoneHandle,
        width: f64,
        height: f64,
    },
    /// Drag-handle transform committed by the surface
    Transform {
        handle: ZoneHandle,
        x: f64,
        y: f64,
        scale_x: f64,
        scale_y: f64,
    },
    Rename {
        handle: ZoneHandle,
        name: String,
    },
    SetZIndex {
        handle: ZoneHandle,
        z_index: i32,
    },
    SetRepeating {
        handle: ZoneHandle,
        repeating: bool,
    },
    Delete(ZoneHandle),
}

/// What an applied intent did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditEvent {
    Created(ZoneHandle),
    Selected(Option<ZoneHandle>),
    Changed(ZoneHandle),
    Deleted(ZoneHandle),
}

/// Snapshot of the arena handed to reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredSet {
    pub handles: Vec<ZoneHandle>,
    pub zones: Vec<ZoneGeometry>,
    revision: u64,
}

#[derive(Debug, Clone)]
pub struct ZoneEditor {
    zones: BTreeMap<ZoneHandle, ZoneGeometry>,
    next_handle: u64,
    selection: Option<ZoneHandle>,
    created: usize,
    revision: u64,
    saved_revision: u64,
    defaults: ZoneDefaults,
    grid: PlacementGrid,
}

impl Default for ZoneEditor {
    fn default() -> Self {
        Self::new(ZoneDefaults::default(), PlacementGrid::default())
    }
}

impl ZoneEditor {
    pub fn new(defaults: ZoneDefaults, grid: PlacementGrid) -> Self {
        Self {
            zones: BTreeMap::new(),
            next_handle: 1,
            selection: None,
            created: 0,
            revision: 0,
            saved_revision: 0,
            defaults,
            grid,
        }
    }

    pub fn from_options(options: &EditorOptions) -> Self {
        Self::new(options.zone_defaults, options.placement_grid)
    }

    /// Replace the arena with zones loaded from storage.
    ///
    /// Handles from a previous load are invalidated.
    pub fn load(&mut self, zones: impl IntoIterator<Item = ZoneGeometry>) {
        self.zones.clear();
        self.selection = None;
        for zone in zones {
            let handle = self.allocate();
            self.zones.insert(handle, zone);
        }
        self.created = self.zones.len();
        self.revision += 1;
        self.saved_revision = self.revision;
    }

    fn allocate(&mut self) -> ZoneHandle {
        let handle = ZoneHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    fn zone_mut(&mut self, handle: ZoneHandle) -> Result<&mut ZoneGeometry> {
        self.zones.get_mut(&handle).ok_or_else(|| ZoneError::NotFound {
            entity: "zone handle",
            id: handle.to_string(),
        })
    }

    /// Apply one intent. A rejected intent leaves the arena unchanged.
    pub fn apply(&mut self, intent: EditIntent) -> Result<EditEvent> {
        let event = match intent {
            EditIntent::Create { zone_type, name } => {
                let count = self.created;
                let name = name.unwrap_or_else(|| {
                    let label = match zone_type {
                        ZoneType::Image => "Image",
                        ZoneType::Text => "Text",
                    };
                    format!("{} Zone {}", label, count + 1)
                });
                let z_index = self.zones.values().map(|z| z.z_index() + 1).max().unwrap_or(0);
                let zone = ZoneGeometry::with_defaults(zone_type, name, count, &self.grid, &self.defaults)?
                    .with_z_index(z_index);
                let handle = self.allocate();
                self.zones.insert(handle, zone);
                self.created += 1;
                self.selection = Some(handle);
                EditEvent::Created(handle)
            }
            EditIntent::Select(selection) => {
                if let Some(handle) = selection {
                    self.zone_mut(handle)?;
                }
                self.selection = selection;
                return Ok(EditEvent::Selected(selection));
            }
            EditIntent::Move { handle, x, y } => {
                self.zone_mut(handle)?.move_to(x, y);
                EditEvent::Changed(handle)
            }
            EditIntent::Resize {
                handle,
                width,
                height,
            } => {
                self.zone_mut(handle)?.resize(width, height)?;
                EditEvent::Changed(handle)
            }
            EditIntent::Transform {
                handle,
                x,
                y,
                scale_x,
                scale_y,
            } => {
                self.zone_mut(handle)?
                    .commit_transform(x, y, scale_x, scale_y)?;
                EditEvent::Changed(handle)
            }
            EditIntent::Rename { handle, name } => {
                self.zone_mut(handle)?.apply(ZoneField::Name(name))?;
                EditEvent::Changed(handle)
            }
            EditIntent::SetZIndex { handle, z_index } => {
                self.zone_mut(handle)?.apply(ZoneField::ZIndex(z_index))?;
                EditEvent::Changed(handle)
            }
            EditIntent::SetRepeating { handle, repeating } => {
                self.zone_mut(handle)?
                    .apply(ZoneField::Repeating(repeating))?;
                EditEvent::Changed(handle)
            }
            EditIntent::Delete(handle) => {
                self.zone_mut(handle)?;
                self.zones.remove(&handle);
                if self.selection == Some(handle) {
                    self.selection = None;
                }
                EditEvent::Deleted(handle)
            }
        };
        self.revision += 1;
        Ok(event)
    }

    pub fn get(&self, handle: ZoneHandle) -> Option<&ZoneGeometry> {
        self.zones.get(&handle)
    }

    /// Handle of the zone with a persisted id
    pub fn handle_of(&self, id: ZoneId) -> Option<ZoneHandle> {
        self.zones
            .iter()
            .find(|(_, z)| z.id() == Some(id))
            .map(|(h, _)| *h)
    }

    /// Zones bottom to top; ties keep creation order
    pub fn zones(&self) -> Vec<(ZoneHandle, &ZoneGeometry)> {
        let mut zones: Vec<_> = self.zones.iter().map(|(h, z)| (*h, z)).collect();
        zones.sort_by_key(|(h, z)| (z.z_index(), *h));
        zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn selection(&self) -> Option<ZoneHandle> {
        self.selection
    }

    pub fn selected(&self) -> Option<&ZoneGeometry> {
        self.selection.and_then(|h| self.zones.get(&h))
    }

    /// Topmost zone containing a canvas point
    pub fn hit_test(&self, x: f64, y: f64) -> Option<ZoneHandle> {
        self.zones()
            .into_iter()
            .rev()
            .find(|(_, z)| {
                let r = z.rect();
                x >= r.x && x <= r.right() && y >= r.y && y <= r.bottom()
            })
            .map(|(h, _)| h)
    }

    pub fn bring_to_front(&mut self, handle: ZoneHandle) -> Result<EditEvent> {
        let top = self
            .zones
            .iter()
            .filter(|(h, _)| **h != handle)
            .map(|(_, z)| z.z_index() + 1)
            .max()
            .unwrap_or(0);
        self.apply(EditIntent::SetZIndex {
            handle,
            z_index: top,
        })
    }

    pub fn send_to_back(&mut self, handle: ZoneHandle) -> Result<EditEvent> {
        let bottom = self
            .zones
            .iter()
            .filter(|(h, _)| **h != handle)
            .map(|(_, z)| z.z_index() - 1)
            .min()
            .unwrap_or(0);
        self.apply(EditIntent::SetZIndex {
            handle,
            z_index: bottom,
        })
    }

    /// Whether the arena changed since it was loaded or last saved
    pub fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    /// Snapshot the arena for saving.
    ///
    /// Zones deleted in this session are simply absent, which is what makes
    /// reconciliation delete their rows.
    pub fn desired_set(&self) -> DesiredSet {
        let (handles, zones): (Vec<_>, Vec<_>) = self
            .zones()
            .into_iter()
            .map(|(h, z)| (h, z.clone()))
            .unzip();
        DesiredSet {
            handles,
            zones,
            revision: self.revision,
        }
    }

    /// Attach persisted ids to zones inserted by a save of `set`.
    ///
    /// The editor stays dirty if the save had failures or the arena changed
    /// while it was running.
    pub fn apply_report(&mut self, set: &DesiredSet, report: &ReconcileReport) {
        for inserted in &report.inserted {
            let Some(handle) = set.handles.get(inserted.index) else {
                continue;
            };
            if let Some(zone) = self.zones.get_mut(handle) {
                zone.set_ids(inserted.zone_id, Some(inserted.assignment_id));
            }
        }
        if report.is_complete() && set.revision == self.revision {
            self.saved_revision = self.revision;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::persistence::InsertedZone;
    use crate::types::AssignmentId;

    fn create(editor: &mut ZoneEditor, zone_type: ZoneType) -> ZoneHandle {
        match editor
            .apply(EditIntent::Create {
                zone_type,
                name: None,
            })
            .unwrap()
        {
            EditEvent::Created(handle) => handle,
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_create_names_places_and_selects() {
        let mut editor = ZoneEditor::default();
        let a = create(&mut editor, ZoneType::Image);
        let b = create(&mut editor, ZoneType::Text);

        assert_eq!(editor.get(a).unwrap().name(), "Image Zone 1");
        assert_eq!(editor.get(b).unwrap().name(), "Text Zone 2");
        assert!(!editor.get(a).unwrap().rect().intersects(&editor.get(b).unwrap().rect()));
        assert!(editor.get(b).unwrap().z_index() > editor.get(a).unwrap().z_index());
        assert_eq!(editor.selection(), Some(b));
        assert!(editor.is_dirty());
    }

    #[test]
    fn test_rejected_resize_leaves_arena_unchanged() {
        let mut editor = ZoneEditor::default();
        let a = create(&mut editor, ZoneType::Image);
        let before = editor.get(a).unwrap().clone();
        assert!(
            editor
                .apply(EditIntent::Resize {
                    handle: a,
                    width: 0.0,
                    height: 10.0
                })
                .is_err()
        );
        assert_eq!(editor.get(a), Some(&before));
    }

    #[test]
    fn test_delete_clears_selection_and_stale_handle_fails() {
        let mut editor = ZoneEditor::default();
        let a = create(&mut editor, ZoneType::Image);
        editor.apply(EditIntent::Delete(a)).unwrap();
        assert_eq!(editor.selection(), None);
        assert!(matches!(
            editor.apply(EditIntent::Move { handle: a, x: 1.0, y: 1.0 }),
            Err(ZoneError::NotFound { .. })
        ));
    }

    #[test]
    fn test_z_order_helpers_and_hit_test() {
        let mut editor = ZoneEditor::default();
        let a = create(&mut editor, ZoneType::Image);
        let b = create(&mut editor, ZoneType::Image);
        editor.apply(EditIntent::Move { handle: b, x: 60.0, y: 60.0 }).unwrap();

        assert_eq!(editor.hit_test(100.0, 100.0), Some(b));
        editor.bring_to_front(a).unwrap();
        assert_eq!(editor.hit_test(100.0, 100.0), Some(a));
        editor.send_to_back(a).unwrap();
        assert_eq!(editor.zones()[0].0, a);
        assert_eq!(editor.hit_test(5.0, 5.0), None);
    }

    #[test]
    fn test_apply_report_assigns_ids_and_clears_dirty() {
        let mut editor = ZoneEditor::default();
        let a = create(&mut editor, ZoneType::Text);
        let set = editor.desired_set();
        let zone_id = ZoneId::new();
        let report = ReconcileReport {
            inserted: vec![InsertedZone {
                index: 0,
                zone_id,
                assignment_id: AssignmentId::new(),
            }],
            ..ReconcileReport::default()
        };
        editor.apply_report(&set, &report);
        assert_eq!(editor.get(a).unwrap().id(), Some(zone_id));
        assert_eq!(editor.handle_of(zone_id), Some(a));
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_edit_during_save_keeps_dirty() {
        let mut editor = ZoneEditor::default();
        let a = create(&mut editor, ZoneType::Text);
        let set = editor.desired_set();
        editor
            .apply(EditIntent::Rename {
                handle: a,
                name: "Title".into(),
            })
            .unwrap();
        editor.apply_report(&set, &ReconcileReport::default());
        assert!(editor.is_dirty());
    }

    #[test]
    fn test_load_resets_state() {
        let mut editor = ZoneEditor::default();
        let zone = ZoneGeometry::new(ZoneType::Image, "Photo", Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap()
            .with_ids(ZoneId::new(), None);
        editor.load(vec![zone]);
        assert_eq!(editor.len(), 1);
        assert!(!editor.is_dirty());
        let b = create(&mut editor, ZoneType::Image);
        assert_eq!(editor.get(b).unwrap().name(), "Image Zone 2");
    }
}
