// Grid layout model - 12-column collision-aware placement
use serde::{Deserialize, Serialize};

/// Number of columns in the dashboard grid.
pub const GRID_COLUMNS: u32 = 12;

fn default_min() -> u32 {
    1
}

fn default_max_h() -> u32 {
    12
}

/// One widget's placement on the grid. Width and height are in grid units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    #[serde(default)]
    pub id: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    #[serde(default = "default_min")]
    pub min_w: u32,
    #[serde(default = "default_min")]
    pub min_h: u32,
    #[serde(default = "default_max_h")]
    pub max_h: u32,
}

impl GridCell {
    pub fn new(id: impl Into<String>, x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            w,
            h,
            min_w: default_min(),
            min_h: default_min(),
            max_h: default_max_h(),
        }
    }

    /// Clamp size and position into valid ranges. Inputs are sanitized,
    /// never rejected.
    fn sanitize(&mut self) {
        self.min_w = self.min_w.max(1);
        self.min_h = self.min_h.max(1);
        self.max_h = self.max_h.max(self.min_h);
        self.w = self.w.clamp(self.min_w, GRID_COLUMNS);
        self.h = self.h.clamp(self.min_h, self.max_h);
        self.x = self.x.min(GRID_COLUMNS - self.w);
    }

    fn overlaps(&self, other: &GridCell) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

/// The set of placements for one dashboard. Mutations are gated on the
/// lock flag: a locked layout ignores every mutating call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridLayout {
    pub cells: Vec<GridCell>,
    #[serde(default)]
    pub locked: bool,
}

impl GridLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn cell(&self, id: &str) -> Option<&GridCell> {
        self.cells.iter().find(|c| c.id == id)
    }

    /// Insert a cell at its requested position, clamping out-of-bounds
    /// coordinates. A cell with an already-present id replaces the old one.
    pub fn place(&mut self, mut cell: GridCell) {
        if self.locked {
            return;
        }
        cell.sanitize();
        self.cells.retain(|c| c.id != cell.id);
        self.cells.push(cell);
        self.compact();
    }

    /// Apply a drag or resize update to an existing cell, then re-pack.
    /// Updates for unknown ids are ignored.
    pub fn apply_change(&mut self, mut updated: GridCell) {
        if self.locked {
            return;
        }
        updated.sanitize();
        let Some(slot) = self.cells.iter_mut().find(|c| c.id == updated.id) else {
            return;
        };
        *slot = updated;
        self.compact();
    }

    pub fn remove(&mut self, id: &str) {
        if self.locked {
            return;
        }
        self.cells.retain(|c| c.id != id);
        self.compact();
    }

    /// Vertical compaction: visit cells in stable (y, x) order and drop each
    /// one to the lowest row where it fits without overlapping an already
    /// packed cell. Transient overlaps from a drag in progress resolve here.
    pub fn compact(&mut self) {
        self.cells.sort_by_key(|c| (c.y, c.x));
        let mut packed: Vec<GridCell> = Vec::with_capacity(self.cells.len());
        for cell in self.cells.drain(..) {
            let mut candidate = cell;
            candidate.y = 0;
            while packed.iter().any(|p| candidate.overlaps(p)) {
                candidate.y += 1;
            }
            packed.push(candidate);
        }
        self.cells = packed;
        debug_assert!(self.is_collision_free());
    }

    /// True when no two committed cells overlap.
    pub fn is_collision_free(&self) -> bool {
        for (i, a) in self.cells.iter().enumerate() {
            if self.cells.iter().skip(i + 1).any(|b| a.overlaps(b)) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds_ok(layout: &GridLayout) -> bool {
        layout.cells.iter().all(|c| c.x + c.w <= GRID_COLUMNS)
    }

    #[test]
    fn test_place_clamps_horizontal_overflow() {
        let mut layout = GridLayout::new();
        layout.place(GridCell::new("a", 10, 0, 4, 2));

        let cell = layout.cell("a").unwrap();
        assert_eq!(cell.x, 8);
        assert!(bounds_ok(&layout));
    }

    #[test]
    fn test_place_resolves_overlap_by_pushing_down() {
        let mut layout = GridLayout::new();
        layout.place(GridCell::new("a", 0, 0, 6, 2));
        layout.place(GridCell::new("b", 0, 0, 6, 2));

        assert!(layout.is_collision_free());
        assert_eq!(layout.cell("a").unwrap().y, 0);
        assert_eq!(layout.cell("b").unwrap().y, 2);
    }

    #[test]
    fn test_compaction_packs_upward() {
        let mut layout = GridLayout::new();
        layout.place(GridCell::new("a", 0, 5, 4, 2));

        assert_eq!(layout.cell("a").unwrap().y, 0);
    }

    #[test]
    fn test_compaction_is_stable_by_row_then_column() {
        let mut layout = GridLayout::new();
        layout.place(GridCell::new("right", 6, 0, 6, 2));
        layout.place(GridCell::new("left", 0, 0, 6, 2));
        layout.place(GridCell::new("below", 0, 2, 12, 2));

        let ids: Vec<&str> = layout.cells.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["left", "right", "below"]);
        assert!(layout.is_collision_free());
    }

    #[test]
    fn test_resize_clamps_to_min_and_max() {
        let mut layout = GridLayout::new();
        let mut cell = GridCell::new("a", 0, 0, 4, 2);
        cell.min_w = 2;
        cell.max_h = 4;
        layout.place(cell.clone());

        cell.w = 0;
        cell.h = 99;
        layout.apply_change(cell);

        let cell = layout.cell("a").unwrap();
        assert_eq!(cell.w, 2);
        assert_eq!(cell.h, 4);
        assert!(bounds_ok(&layout));
    }

    #[test]
    fn test_drag_out_of_bounds_is_clamped() {
        let mut layout = GridLayout::new();
        layout.place(GridCell::new("a", 0, 0, 5, 2));

        let mut moved = layout.cell("a").unwrap().clone();
        moved.x = 11;
        layout.apply_change(moved);

        assert_eq!(layout.cell("a").unwrap().x, 7);
        assert!(bounds_ok(&layout));
    }

    #[test]
    fn test_locked_layout_ignores_mutations() {
        let mut layout = GridLayout::new();
        layout.place(GridCell::new("a", 0, 0, 4, 2));
        layout.lock();

        layout.place(GridCell::new("b", 0, 0, 4, 2));
        let mut moved = layout.cell("a").unwrap().clone();
        moved.x = 4;
        layout.apply_change(moved);
        layout.remove("a");

        assert_eq!(layout.cells.len(), 1);
        assert_eq!(layout.cell("a").unwrap().x, 0);
    }

    #[test]
    fn test_place_replaces_duplicate_id() {
        let mut layout = GridLayout::new();
        layout.place(GridCell::new("a", 0, 0, 4, 2));
        layout.place(GridCell::new("a", 4, 0, 6, 3));

        assert_eq!(layout.cells.len(), 1);
        assert_eq!(layout.cell("a").unwrap().w, 6);
    }

    #[test]
    fn test_remove_then_compact_closes_gap() {
        let mut layout = GridLayout::new();
        layout.place(GridCell::new("a", 0, 0, 12, 2));
        layout.place(GridCell::new("b", 0, 2, 12, 2));
        layout.remove("a");

        assert_eq!(layout.cell("b").unwrap().y, 0);
    }
}
