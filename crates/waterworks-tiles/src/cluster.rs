//! Adjacency, connected components and surface ownership.

use std::collections::VecDeque;

use hashbrown::HashSet;
use waterworks_geom::{Aabb, delta_angle_deg, overlap, separation};
use waterworks_mesh::{MeshKind, SyntheticMesh};

use crate::constants::*;
use crate::error::TileError;
use crate::tile::{ClusterCache, TileId};
use crate::world::WaterWorld;

/// The part of a tile that adjacency and connector planning look at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Footprint {
    pub bounds: Aabb,
    pub surface_y: f32,
    pub yaw_deg: f32,
}

#[inline]
pub fn is_square(b: &Aabb) -> bool {
    let s = b.size();
    (s.x - s.z).abs() <= s.x.max(s.z) * SQUARE_TOLERANCE
}

/// Square footprints always line up; anything else needs matching yaw.
pub fn surfaces_aligned(a: &Footprint, b: &Footprint) -> bool {
    if is_square(&a.bounds) && is_square(&b.bounds) {
        return true;
    }
    let d = delta_angle_deg(a.yaw_deg, b.yaw_deg)
        .abs()
        .min(delta_angle_deg(b.yaw_deg, a.yaw_deg).abs());
    d <= ANGLE_TOLERANCE_DEG
}

/// Symmetric adjacency: level surfaces whose footprints touch or nearly touch along one
/// axis while sharing enough edge on the other.
pub fn tiles_adjacent(a: &Footprint, b: &Footprint, strict_yaw: bool) -> bool {
    if (a.surface_y - b.surface_y).abs() > LEVEL_TOLERANCE {
        return false;
    }
    if strict_yaw && !surfaces_aligned(a, b) {
        return false;
    }
    let (p, q) = (&a.bounds, &b.bounds);
    let gx = separation(p.min.x, p.max.x, q.min.x, q.max.x);
    let gz = separation(p.min.z, p.max.z, q.min.z, q.max.z);
    let ox = overlap(p.min.x, p.max.x, q.min.x, q.max.x).len();
    let oz = overlap(p.min.z, p.max.z, q.min.z, q.max.z).len();
    (gx <= CONNECTION_GAP_MAX && oz >= CONNECTION_MIN_OVERLAP)
        || (gz <= CONNECTION_GAP_MAX && ox >= CONNECTION_MIN_OVERLAP)
}

/// Result of a bounded flood fill.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterScan {
    /// Sorted by id; the first entry owns the surface.
    pub members: Vec<TileId>,
    /// The fill stopped at its cap with more tiles still reachable.
    pub saturated: bool,
}

impl ClusterScan {
    #[inline]
    pub fn owner(&self) -> Option<TileId> {
        self.members.first().copied()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClusterCount {
    pub count: usize,
    pub saturated: bool,
}

impl WaterWorld {
    pub(crate) fn footprint(&self, id: TileId) -> Option<Footprint> {
        self.tiles.get(&id).map(|t| Footprint {
            bounds: t.volume.bounds,
            surface_y: t.volume.surface_y,
            yaw_deg: t.pose.yaw_deg,
        })
    }

    /// Neighbors of `id` satisfying the adjacency predicate, sorted.
    pub fn adjacent_tiles(&self, id: TileId) -> Vec<TileId> {
        let Some(me) = self.footprint(id) else {
            return Vec::new();
        };
        let strict = self.config.features.strict_cluster_yaw;
        self.index
            .query_near(&me.bounds)
            .into_iter()
            .filter(|&n| n != id)
            .filter(|&n| {
                self.footprint(n)
                    .is_some_and(|other| tiles_adjacent(&me, &other, strict))
            })
            .collect()
    }

    /// Breadth-first fill from `seed`, visiting at most `limit` tiles.
    pub fn scan_cluster(&self, seed: TileId, limit: Option<usize>) -> ClusterScan {
        if !self.tiles.contains_key(&seed) {
            return ClusterScan {
                members: Vec::new(),
                saturated: false,
            };
        }
        let cap = limit.unwrap_or(usize::MAX);
        let mut visited: HashSet<TileId> = HashSet::new();
        let mut queue = VecDeque::new();
        let mut saturated = false;
        if cap > 0 {
            visited.insert(seed);
            queue.push_back(seed);
        } else {
            saturated = true;
        }
        'fill: while let Some(cur) = queue.pop_front() {
            for n in self.adjacent_tiles(cur) {
                if visited.contains(&n) {
                    continue;
                }
                if visited.len() >= cap {
                    saturated = true;
                    break 'fill;
                }
                visited.insert(n);
                queue.push_back(n);
            }
        }
        let mut members: Vec<TileId> = visited.into_iter().collect();
        members.sort_unstable();
        ClusterScan { members, saturated }
    }

    /// Size of the cluster containing `id`, counting at most `limit` tiles.
    /// Fresh cached sizes (younger than half a second) are served without a fill.
    pub fn cluster_size(&mut self, id: TileId, limit: usize) -> Result<ClusterCount, TileError> {
        let clock = self.clock;
        let tile = self.tiles.get(&id).ok_or(TileError::UnknownTile(id))?;
        if limit == 0 {
            return Ok(ClusterCount {
                count: 0,
                saturated: false,
            });
        }
        if let Some(c) = tile.cluster_cache {
            let fresh = c.count > 0 && clock - c.stamp < CLUSTER_CACHE_TTL;
            if fresh && (!c.saturated || c.count >= limit) {
                return Ok(ClusterCount {
                    count: c.count.min(limit),
                    saturated: c.count > limit || (c.saturated && c.count >= limit),
                });
            }
        }
        let scan = self.scan_cluster(id, Some(limit));
        let count = ClusterCount {
            count: scan.members.len(),
            saturated: scan.saturated,
        };
        if let Some(tile) = self.tiles.get_mut(&id) {
            tile.cluster_cache = Some(ClusterCache {
                count: count.count,
                saturated: count.saturated,
                stamp: clock,
            });
        }
        Ok(count)
    }

    /// A tile is supported while its water body stays within the support limit.
    pub fn has_support(&mut self, id: TileId) -> Result<bool, TileError> {
        let c = self.cluster_size(id, SUPPORT_LIMIT)?;
        Ok(!c.saturated)
    }

    #[inline]
    pub fn is_surface_owner(&self, id: TileId) -> bool {
        self.tiles.get(&id).is_some_and(|t| t.surface_owner)
    }

    /// Recomputes the cluster around `seed`, hands out ownership and regenerates the
    /// merged surface when `seed` is the owner.
    pub(crate) fn rebuild_cluster_surface(&mut self, seed: TileId) {
        if !self.tiles.contains_key(&seed) {
            return;
        }
        if !self.config.enabled {
            self.release_surface(seed);
            return;
        }
        if !self.config.features.cluster_surfaces {
            self.rebuild_tile_surface(seed);
            return;
        }
        let scan = self.scan_cluster(seed, None);
        let Some(owner) = scan.owner() else {
            return;
        };
        let clock = self.clock;
        let count = scan.members.len();
        for &m in &scan.members {
            let lost = match self.tiles.get_mut(&m) {
                Some(t) => {
                    t.cluster_cache = Some(ClusterCache {
                        count,
                        saturated: false,
                        stamp: clock,
                    });
                    let lost = t.surface_owner && m != owner;
                    t.surface_owner = m == owner;
                    lost || (m != owner && t.surface.is_some())
                }
                None => false,
            };
            if lost {
                self.release_surface(m);
            }
        }
        let signature = self.signature(&scan.members);
        if seed == owner {
            let mesh = self.build_cluster_mesh(&scan.members);
            self.store_surface(owner, SyntheticMesh::new(MeshKind::ClusterSurface, mesh), signature);
            log::debug!(
                target: "cluster",
                "tile {} owns a cluster of {} (surface rebuilt)",
                owner,
                count
            );
        } else if let Some(t) = self.tiles.get_mut(&owner) {
            let stale = t.surface.as_ref().is_none_or(|s| s.signature != signature);
            if stale {
                t.sched.mark_cluster_dirty();
            }
        }
    }

    /// Members paired with their geometry revision; changes whenever any member's
    /// shape or the membership changes.
    pub(crate) fn signature(&self, members: &[TileId]) -> Vec<(TileId, u64)> {
        members
            .iter()
            .filter_map(|m| self.tiles.get(m).map(|t| (*m, t.geometry_rev)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waterworks_geom::Vec3;

    fn foot(cx: f32, cz: f32, y: f32, sx: f32, sz: f32, yaw: f32) -> Footprint {
        Footprint {
            bounds: Aabb::from_center_size(Vec3::new(cx, y - 0.1, cz), Vec3::new(sx, 0.2, sz)),
            surface_y: y,
            yaw_deg: yaw,
        }
    }

    #[test]
    fn adjacency_is_symmetric_for_unequal_sizes() {
        let big = foot(0.0, 0.0, 0.0, 6.0, 6.0, 0.0);
        let small = foot(3.8, 2.5, 0.1, 1.0, 1.0, 0.0);
        assert!(tiles_adjacent(&big, &small, false));
        assert!(tiles_adjacent(&small, &big, false));
    }

    #[test]
    fn corner_contact_is_not_adjacent() {
        let a = foot(0.0, 0.0, 0.0, 2.0, 2.0, 0.0);
        let b = foot(2.3, 2.3, 0.0, 2.0, 2.0, 0.0);
        assert!(!tiles_adjacent(&a, &b, false));
    }

    #[test]
    fn level_tolerance_separates_steps() {
        let a = foot(0.0, 0.0, 0.0, 2.0, 2.0, 0.0);
        let b = foot(2.3, 0.0, 0.3, 2.0, 2.0, 0.0);
        assert!(!tiles_adjacent(&a, &b, false));
    }

    #[test]
    fn square_footprints_ignore_yaw() {
        let a = foot(0.0, 0.0, 0.0, 2.0, 2.0, 0.0);
        let b = foot(2.2, 0.0, 0.0, 2.0, 2.0, 45.0);
        assert!(surfaces_aligned(&a, &b));
        assert!(tiles_adjacent(&a, &b, true));
        let long_a = foot(0.0, 0.0, 0.0, 4.0, 2.0, 0.0);
        let long_b = foot(0.0, 2.2, 0.0, 4.0, 2.0, 30.0);
        assert!(!surfaces_aligned(&long_a, &long_b));
        assert!(!tiles_adjacent(&long_a, &long_b, true));
        assert!(tiles_adjacent(&long_a, &long_b, false));
    }

    #[test]
    fn yaw_wraps_around() {
        let a = foot(0.0, 0.0, 0.0, 4.0, 2.0, 355.0);
        let b = foot(0.0, 2.2, 0.0, 4.0, 2.0, 3.0);
        assert!(surfaces_aligned(&a, &b));
    }
}
