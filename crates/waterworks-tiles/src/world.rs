//! The water service: owns every tile, the grid, generated meshes and the clock.

use hashbrown::HashMap;
use waterworks_geom::{Aabb, Vec3};

use crate::bounds::{TransformSnapshot, VolumeMetrics};
use crate::config::WaterConfig;
use crate::constants::TERRAIN_REFRESH_MARGIN;
use crate::error::TileError;
use crate::mesh_store::MeshStore;
use crate::spatial::{SpatialIndex, reach_from};
use crate::tile::{Pose, Tile, TileElement, TileId, TileSpec};

/// Area whose ground decoration should be regenerated after a tile disappeared.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainRefresh {
    pub center: Vec3,
    pub radius: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    pub tiles: usize,
    pub cells: usize,
    pub connectors: usize,
    pub surface_owners: usize,
    pub meshes: usize,
}

pub struct WaterWorld {
    pub(crate) config: WaterConfig,
    pub(crate) index: SpatialIndex,
    pub(crate) tiles: HashMap<TileId, Tile>,
    pub(crate) meshes: MeshStore,
    pub(crate) clock: f64,
    next_id: u64,
    terrain_refresh: Vec<TerrainRefresh>,
}

impl Default for WaterWorld {
    fn default() -> Self {
        Self::new(WaterConfig::default())
    }
}

impl WaterWorld {
    pub fn new(config: WaterConfig) -> Self {
        Self {
            config: config.sanitized(),
            index: SpatialIndex::default(),
            tiles: HashMap::new(),
            meshes: MeshStore::default(),
            clock: 0.0,
            next_id: 1,
            terrain_refresh: Vec::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &WaterConfig {
        &self.config
    }

    /// Seconds of simulated time since creation.
    #[inline]
    pub fn clock(&self) -> f64 {
        self.clock
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    #[inline]
    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(&id)
    }

    #[inline]
    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    #[inline]
    pub fn meshes(&self) -> &MeshStore {
        &self.meshes
    }

    /// All tile ids in creation order.
    pub fn tile_ids(&self) -> Vec<TileId> {
        let mut ids: Vec<TileId> = self.tiles.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn stats(&self) -> WorldStats {
        WorldStats {
            tiles: self.tiles.len(),
            cells: self.index.cell_count(),
            connectors: self.tiles.values().map(|t| t.connectors.len()).sum(),
            surface_owners: self.tiles.values().filter(|t| t.surface_owner).count(),
            meshes: self.meshes.len(),
        }
    }

    /// Places a tile. Its connectors and cluster are built on later ticks.
    pub fn register_tile(&mut self, spec: TileSpec) -> TileId {
        let id = TileId(self.next_id);
        self.next_id += 1;
        let volume = VolumeMetrics::measure(&spec.pose, &spec.elements, &self.config);
        let pivot = spec.pose.pos;
        self.index.register(id, pivot, reach_from(pivot, &volume.bounds));
        self.tiles.insert(id, Tile::new(id, spec, volume));
        self.notify_neighbors(id, &volume.bounds);
        log::debug!(
            target: "tiles",
            "registered tile {} at ({:.2}, {:.2}, {:.2}) surface {:.2}",
            id,
            pivot.x,
            pivot.y,
            pivot.z,
            volume.surface_y
        );
        id
    }

    /// Removes a tile and everything generated for it. Unknown ids are a no-op.
    pub fn unregister_tile(&mut self, id: TileId) -> bool {
        let Some(mut tile) = self.tiles.remove(&id) else {
            return false;
        };
        self.index.unregister(id);
        for c in tile.connectors.drain() {
            if let Some(mesh) = c.mesh {
                self.meshes.release(mesh);
            }
        }
        if let Some(s) = tile.surface.take() {
            self.meshes.release(s.mesh);
        }
        if let Some(m) = tile.highlight.mesh.take() {
            self.meshes.release(m);
        }
        let bounds = tile.volume.bounds;
        self.notify_neighbors(id, &bounds);
        let ext = bounds.extents();
        self.terrain_refresh.push(TerrainRefresh {
            center: bounds.center(),
            radius: ext.x.max(ext.z) + TERRAIN_REFRESH_MARGIN,
        });
        log::debug!(target: "tiles", "unregistered tile {} ({} left)", id, self.tiles.len());
        true
    }

    /// Updates the placement; the change is picked up by the next bounds refresh.
    pub fn set_pose(&mut self, id: TileId, pose: Pose) -> Result<(), TileError> {
        let tile = self.tiles.get_mut(&id).ok_or(TileError::UnknownTile(id))?;
        tile.pose = pose;
        Ok(())
    }

    /// Replaces the tile geometry, e.g. after the host swaps its model.
    pub fn set_elements(&mut self, id: TileId, elements: Vec<TileElement>) -> Result<(), TileError> {
        let tile = self.tiles.get_mut(&id).ok_or(TileError::UnknownTile(id))?;
        tile.elements = elements;
        tile.sched.mark_bounds_dirty();
        Ok(())
    }

    /// Applies new settings to every tile and schedules a full rebuild.
    pub fn set_config(&mut self, config: WaterConfig) {
        let config = config.sanitized();
        if config == self.config {
            return;
        }
        let mode_changed = config.features != self.config.features || config.enabled != self.config.enabled;
        self.config = config;
        if mode_changed {
            for id in self.tile_ids() {
                self.release_surface(id);
                if let Some(t) = self.tiles.get_mut(&id) {
                    t.surface_owner = false;
                }
                if !self.config.enabled {
                    // Drains without rebuilding while disabled
                    self.rebuild_connections(id);
                }
            }
        }
        self.notify_config_changed();
    }

    /// Re-reads offset, depth and padding for every tile and marks all of them dirty.
    pub fn notify_config_changed(&mut self) {
        for id in self.tile_ids() {
            self.refresh_bounds(id);
            if let Some(t) = self.tiles.get_mut(&id) {
                t.snapshot = TransformSnapshot::capture(&t.pose, &t.volume);
                t.sched.mark_dirty();
                t.cluster_cache = None;
                let pivot = t.pose.pos;
                let reach = reach_from(pivot, &t.volume.bounds);
                self.index.relocate(id, pivot, reach);
            }
        }
        log::info!(target: "tiles", "config applied to {} tiles", self.tiles.len());
    }

    /// Regions the host should refresh ground decoration in.
    pub fn drain_terrain_refresh(&mut self) -> Vec<TerrainRefresh> {
        std::mem::take(&mut self.terrain_refresh)
    }

    /// Marks every tile near `bounds` (except `source`) dirty.
    pub(crate) fn notify_neighbors(&mut self, source: TileId, bounds: &Aabb) {
        for n in self.index.query_near(bounds) {
            if n == source {
                continue;
            }
            if let Some(t) = self.tiles.get_mut(&n) {
                t.sched.mark_dirty();
                t.cluster_cache = None;
            }
        }
    }

    pub(crate) fn refresh_bounds(&mut self, id: TileId) {
        let cfg = &self.config;
        let Some(tile) = self.tiles.get_mut(&id) else {
            return;
        };
        tile.volume = VolumeMetrics::measure(&tile.pose, &tile.elements, cfg);
        tile.geometry_rev = tile.geometry_rev.wrapping_add(1).max(1);
    }

    /// Compares the live state against the last snapshot and propagates a change.
    pub(crate) fn track_transform_changes(&mut self, id: TileId) {
        let Some(tile) = self.tiles.get_mut(&id) else {
            return;
        };
        if !tile.snapshot.changed(&tile.pose, &tile.volume) {
            return;
        }
        let old_bounds = tile.snapshot.bounds;
        let new_bounds = tile.volume.bounds;
        let pivot = tile.pose.pos;
        tile.snapshot = TransformSnapshot::capture(&tile.pose, &tile.volume);
        tile.sched.mark_dirty();
        tile.cluster_cache = None;
        self.index.relocate(id, pivot, reach_from(pivot, &new_bounds));
        self.notify_neighbors(id, &old_bounds);
        self.notify_neighbors(id, &new_bounds);
        self.invalidate_outline(id);
        log::debug!(target: "tiles", "tile {} moved, neighbors notified", id);
    }

    /// Advances every tile's timers and runs whatever rebuilds came due.
    /// Per tile: move detection, bounds refresh, connectors, then cluster surface.
    pub fn tick(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.clock += dt as f64;
        if !self.config.enabled {
            return;
        }
        for id in self.tile_ids() {
            let refresh = match self.tiles.get_mut(&id) {
                Some(t) => {
                    if t.snapshot.pose_moved(&t.pose) {
                        t.sched.mark_bounds_dirty();
                    }
                    t.sched.advance_bounds(dt)
                }
                None => continue,
            };
            if refresh {
                self.refresh_bounds(id);
                self.track_transform_changes(id);
            }
            if self.tiles.get_mut(&id).is_some_and(|t| t.sched.advance_connections(dt)) {
                self.rebuild_connections(id);
            }
            if self.tiles.get_mut(&id).is_some_and(|t| t.sched.advance_cluster(dt)) {
                self.rebuild_cluster_surface(id);
            }
        }
    }

    /// Runs every pending rebuild immediately, ignoring the debounce timers.
    pub fn flush(&mut self) {
        let ids = self.tile_ids();
        for &id in &ids {
            self.refresh_bounds(id);
            self.track_transform_changes(id);
        }
        for &id in &ids {
            self.rebuild_connections(id);
        }
        for &id in &ids {
            self.rebuild_cluster_surface(id);
        }
        for &id in &ids {
            if let Some(t) = self.tiles.get_mut(&id) {
                t.sched.settle();
            }
        }
    }

    /// Rebuilds the connectors of one tile right away.
    pub fn rebuild_connectors_now(&mut self, id: TileId) -> Result<(), TileError> {
        if !self.tiles.contains_key(&id) {
            return Err(TileError::UnknownTile(id));
        }
        self.rebuild_connections(id);
        Ok(())
    }
}
