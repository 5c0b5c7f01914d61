//! Point-in-water queries for movement, physics and terrain collaborators.

use waterworks_geom::{Aabb, Vec3};

use crate::constants::{
    GRID_CELL_SIZE, LIQUID_CHECK_INTERVAL, VERTICAL_SIZE_MAX, VOLUME_DEPTH_BASE, VOLUME_DEPTH_MIN,
};
use crate::tile::Tile;
use crate::world::WaterWorld;

/// Ground height provider owned by the host.
pub trait TerrainHeight {
    fn height_at(&self, x: f32, z: f32) -> Option<f32>;
}

impl<F> TerrainHeight for F
where
    F: Fn(f32, f32) -> Option<f32>,
{
    #[inline]
    fn height_at(&self, x: f32, z: f32) -> Option<f32> {
        self(x, z)
    }
}

/// Inside the footprint and within the vertical band of the volume.
fn inside_volume(t: &Tile, p: Vec3) -> bool {
    let b = &t.volume.bounds;
    let surface = t.volume.surface_y;
    let depth = t.volume.depth_below.max(VOLUME_DEPTH_MIN);
    p.x >= b.min.x
        && p.x <= b.max.x
        && p.z >= b.min.z
        && p.z <= b.max.z
        && p.y >= surface - depth
        && p.y <= surface + t.volume.above
}

impl WaterWorld {
    fn tiles_around(&self, p: Vec3, half_xz: f32, half_y: f32) -> impl Iterator<Item = &Tile> {
        let probe = Aabb::from_center_size(p, Vec3::new(half_xz * 2.0, half_y * 2.0, half_xz * 2.0));
        self.index
            .query_box(&probe)
            .into_iter()
            .filter_map(|id| self.tiles.get(&id))
    }

    /// Highest surface among the volumes accepted by `inside` and every connector
    /// collider containing `p`; tiles and connectors compete on equal terms.
    fn highest_surface_at(
        &self,
        p: Vec3,
        half_xz: f32,
        half_y: f32,
        inside: impl Fn(&Tile) -> bool,
    ) -> Option<f32> {
        let near: Vec<&Tile> = self.tiles_around(p, half_xz, half_y).collect();
        let volumes = near.iter().copied().filter(|&t| inside(t)).map(|t| t.volume.surface_y);
        let connectors = near
            .iter()
            .flat_map(|t| t.connectors.iter())
            .filter(|c| c.collider.contains(p))
            .map(|c| c.surface_y);
        volumes.chain(connectors).reduce(f32::max)
    }

    /// Strict test: the highest surface among volumes and connectors containing `p`.
    pub fn is_point_immersed(&self, p: Vec3) -> Option<f32> {
        if !self.config.enabled || self.index.is_empty() || !p.is_finite() {
            return None;
        }
        // Deepest possible volume plus the allowance above it
        let half_y = self.config.water_depth.max(VOLUME_DEPTH_BASE + VERTICAL_SIZE_MAX)
            + self.config.player_check_above_surface;
        let found = self.highest_surface_at(p, GRID_CELL_SIZE, half_y, |t| inside_volume(t, p));
        if let Some(s) = found {
            log::trace!(target: "immersion", "({:.2}, {:.2}, {:.2}) immersed under {:.2}", p.x, p.y, p.z, s);
        }
        found
    }

    /// Lenient test used by terrain and spawners: `p` may sit up to the influence
    /// radius outside a footprint and down to the influence depth below the surface.
    pub fn try_get_surface_height_at(&self, p: Vec3) -> Option<f32> {
        if !self.config.enabled || self.index.is_empty() || !p.is_finite() {
            return None;
        }
        let radius = self.config.terrain_influence_radius;
        let max_depth = self.config.terrain_influence_max_depth;
        let half_xz = radius + GRID_CELL_SIZE;
        let half_y = max_depth + self.config.player_check_above_surface;
        let r2 = radius * radius;
        self.highest_surface_at(p, half_xz, half_y, |t| {
            let s = t.volume.surface_y;
            t.volume.bounds.distance_sq_xz(p) <= r2 && p.y >= s - max_depth && p.y <= s + t.volume.above
        })
    }

    /// Depth of water above the terrain at `(x, z)`.
    pub fn water_depth_at(&self, x: f32, z: f32, terrain: &impl TerrainHeight) -> Option<f32> {
        let ground = terrain.height_at(x, z)?;
        let surface = self.try_get_surface_height_at(Vec3::new(x, ground, z))?;
        Some((surface - ground).max(0.0))
    }

    /// Deepest water over the four corners of a footprint.
    pub fn water_depth_under(&self, footprint: &Aabb, terrain: &impl TerrainHeight) -> Option<f32> {
        let (a, b) = (footprint.min, footprint.max);
        [(a.x, a.z), (b.x, a.z), (a.x, b.z), (b.x, b.z)]
            .into_iter()
            .filter_map(|(x, z)| self.water_depth_at(x, z, terrain))
            .reduce(f32::max)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LiquidChange {
    Entered { surface_y: f32 },
    SurfaceMoved { surface_y: f32 },
    Exited,
}

/// Polls one point (typically the player) and reports liquid transitions.
#[derive(Clone, Debug, Default)]
pub struct LiquidTracker {
    timer: f32,
    current: Option<f32>,
}

impl LiquidTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface height the point is currently under, if any.
    #[inline]
    pub fn current(&self) -> Option<f32> {
        self.current
    }

    pub fn update(&mut self, world: &WaterWorld, dt: f32, point: Vec3) -> Option<LiquidChange> {
        self.timer += dt;
        if self.timer < LIQUID_CHECK_INTERVAL {
            return None;
        }
        self.timer = 0.0;
        let next = world.is_point_immersed(point);
        let change = match (self.current, next) {
            (None, Some(s)) => Some(LiquidChange::Entered { surface_y: s }),
            (Some(_), None) => Some(LiquidChange::Exited),
            (Some(a), Some(b)) if (a - b).abs() > 1e-3 => Some(LiquidChange::SurfaceMoved { surface_y: b }),
            _ => None,
        };
        self.current = next;
        if let Some(c) = change {
            log::debug!(target: "immersion", "liquid change {:?}", c);
        }
        change
    }
}
