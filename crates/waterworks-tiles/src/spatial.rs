//! Uniform hash grid over tile pivots.

use hashbrown::{HashMap, HashSet};
use waterworks_geom::{Aabb, Vec3};

use crate::constants::{GRID_CELL_SIZE, SEARCH_RADIUS, VERTICAL_MAX, VERTICAL_SEARCH_PAD};
use crate::tile::TileId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CellCoord {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Cell containing `p` for the given edge length.
    #[inline]
    pub fn containing(p: Vec3, cell_size: f32) -> Self {
        Self {
            x: (p.x / cell_size).floor() as i32,
            y: (p.y / cell_size).floor() as i32,
            z: (p.z / cell_size).floor() as i32,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    cell: CellCoord,
    /// Farthest distance from the pivot to the tile's footprint, on any axis.
    reach: f32,
}

/// Each tile lives in exactly one cell, chosen by its pivot. Queries widen by the
/// largest registered reach so tiles whose pivot sits far from their edges are still found.
#[derive(Clone, Debug)]
pub struct SpatialIndex {
    cell_size: f32,
    cells: HashMap<CellCoord, HashSet<TileId>>,
    entries: HashMap<TileId, Entry>,
    max_reach: f32,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(GRID_CELL_SIZE)
    }
}

impl SpatialIndex {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: if cell_size > 0.0 { cell_size } else { GRID_CELL_SIZE },
            cells: HashMap::new(),
            entries: HashMap::new(),
            max_reach: 0.0,
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of non-empty cells.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn cell_of(&self, id: TileId) -> Option<CellCoord> {
        self.entries.get(&id).map(|e| e.cell)
    }

    #[inline]
    pub fn contains(&self, id: TileId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Registering twice behaves like `relocate`.
    pub fn register(&mut self, id: TileId, pivot: Vec3, reach: f32) {
        self.relocate(id, pivot, reach);
    }

    /// Moves `id` to the cell of `pivot`. Returns true when the cell changed or the tile
    /// was not registered before.
    pub fn relocate(&mut self, id: TileId, pivot: Vec3, reach: f32) -> bool {
        let cell = CellCoord::containing(pivot, self.cell_size);
        let reach = if reach.is_finite() { reach.max(0.0) } else { 0.0 };
        let old = self.entries.insert(id, Entry { cell, reach });
        if reach > self.max_reach {
            self.max_reach = reach;
        } else if old.is_some_and(|o| o.reach >= self.max_reach && reach < o.reach) {
            self.recompute_reach();
        }
        match old {
            Some(o) if o.cell == cell => false,
            Some(o) => {
                self.remove_from_cell(id, o.cell);
                self.cells.entry(cell).or_default().insert(id);
                true
            }
            None => {
                self.cells.entry(cell).or_default().insert(id);
                true
            }
        }
    }

    /// Removes `id`; unknown ids are ignored.
    pub fn unregister(&mut self, id: TileId) -> bool {
        let Some(old) = self.entries.remove(&id) else {
            return false;
        };
        self.remove_from_cell(id, old.cell);
        if old.reach >= self.max_reach {
            self.recompute_reach();
        }
        true
    }

    fn remove_from_cell(&mut self, id: TileId, cell: CellCoord) {
        if let Some(set) = self.cells.get_mut(&cell) {
            set.remove(&id);
            if set.is_empty() {
                self.cells.remove(&cell);
            }
        }
    }

    fn recompute_reach(&mut self) {
        self.max_reach = self.entries.values().map(|e| e.reach).fold(0.0, f32::max);
    }

    /// Tiles registered in any cell overlapping `[min, max]`, sorted by id.
    pub fn collect_in_range(&self, min: Vec3, max: Vec3) -> Vec<TileId> {
        let lo = CellCoord::containing(min, self.cell_size);
        let hi = CellCoord::containing(max, self.cell_size);
        let mut out = Vec::new();
        let extent = |a: i32, b: i32| (b as i64 - a as i64 + 1).max(0);
        let span = extent(lo.x, hi.x)
            .saturating_mul(extent(lo.y, hi.y))
            .saturating_mul(extent(lo.z, hi.z));
        if span > self.cells.len() as i64 {
            // Cheaper to scan the occupied cells than the whole range
            for (c, set) in &self.cells {
                if c.x >= lo.x && c.x <= hi.x && c.y >= lo.y && c.y <= hi.y && c.z >= lo.z && c.z <= hi.z {
                    out.extend(set.iter().copied());
                }
            }
        } else {
            for x in lo.x..=hi.x {
                for y in lo.y..=hi.y {
                    for z in lo.z..=hi.z {
                        if let Some(set) = self.cells.get(&CellCoord::new(x, y, z)) {
                            out.extend(set.iter().copied());
                        }
                    }
                }
            }
        }
        out.sort_unstable();
        out
    }

    /// Candidates whose footprint could touch `bounds`.
    pub fn query_box(&self, bounds: &Aabb) -> Vec<TileId> {
        let grown = bounds.expanded(Vec3::splat(self.max_reach * 2.0));
        self.collect_in_range(grown.min, grown.max)
    }

    /// Candidates for adjacency with a tile occupying `bounds`.
    pub fn query_near(&self, bounds: &Aabb) -> Vec<TileId> {
        let pad = Vec3::new(
            SEARCH_RADIUS * 2.0,
            (VERTICAL_MAX + VERTICAL_SEARCH_PAD) * 2.0,
            SEARCH_RADIUS * 2.0,
        );
        self.query_box(&bounds.expanded(pad))
    }
}

/// Farthest distance from `pivot` to any face of `bounds`.
pub fn reach_from(pivot: Vec3, bounds: &Aabb) -> f32 {
    let a = (bounds.min - pivot).max(pivot - bounds.min);
    let b = (bounds.max - pivot).max(pivot - bounds.max);
    let m = a.max(b);
    m.x.max(m.y).max(m.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_floor_negative_coordinates() {
        assert_eq!(CellCoord::containing(Vec3::new(-0.1, 0.0, 3.9), 4.0), CellCoord::new(-1, 0, 0));
        assert_eq!(CellCoord::containing(Vec3::new(4.0, -4.0, -4.1), 4.0), CellCoord::new(1, -1, -2));
    }

    #[test]
    fn register_is_idempotent() {
        let mut idx = SpatialIndex::default();
        idx.register(TileId(1), Vec3::new(1.0, 0.0, 1.0), 1.0);
        idx.register(TileId(1), Vec3::new(1.0, 0.0, 1.0), 1.0);
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.cell_count(), 1);
    }

    #[test]
    fn relocate_moves_between_cells_and_drops_empty_ones() {
        let mut idx = SpatialIndex::default();
        idx.register(TileId(7), Vec3::new(1.0, 0.0, 1.0), 1.0);
        assert!(!idx.relocate(TileId(7), Vec3::new(2.0, 0.0, 2.0), 1.0));
        assert!(idx.relocate(TileId(7), Vec3::new(9.0, 0.0, 1.0), 1.0));
        assert_eq!(idx.cell_of(TileId(7)), Some(CellCoord::new(2, 0, 0)));
        assert_eq!(idx.cell_count(), 1);
        assert!(idx.unregister(TileId(7)));
        assert!(!idx.unregister(TileId(7)));
        assert!(idx.is_empty());
        assert_eq!(idx.cell_count(), 0);
    }

    #[test]
    fn query_near_finds_neighbor_across_cell_border() {
        let mut idx = SpatialIndex::default();
        let a = Aabb::new(Vec3::new(0.0, -0.2, 0.0), Vec3::new(2.0, 0.0, 2.0));
        idx.register(TileId(1), a.center(), reach_from(a.center(), &a));
        // Neighbor one unit past A's +X face, pivot in the next cell
        let b = Aabb::new(Vec3::new(3.0, -0.2, 0.0), Vec3::new(5.0, 0.0, 2.0));
        idx.register(TileId(2), b.center(), reach_from(b.center(), &b));
        assert_eq!(idx.query_near(&a), vec![TileId(1), TileId(2)]);
        assert_eq!(idx.query_near(&b), vec![TileId(1), TileId(2)]);
        let far = Aabb::from_center_size(Vec3::new(40.0, 0.0, 40.0), Vec3::splat(1.0));
        assert!(idx.query_near(&far).is_empty());
    }

    #[test]
    fn reach_shrinks_after_large_tile_leaves() {
        let mut idx = SpatialIndex::default();
        idx.register(TileId(1), Vec3::ZERO, 25.0);
        idx.register(TileId(2), Vec3::new(100.0, 0.0, 0.0), 1.0);
        let probe = Aabb::from_center_size(Vec3::new(20.0, 0.0, 0.0), Vec3::splat(0.1));
        assert_eq!(idx.query_box(&probe), vec![TileId(1)]);
        idx.unregister(TileId(1));
        assert!(idx.query_box(&probe).is_empty());
    }
}
