//! Surface meshes: one merged mesh per cluster, or one padded quad per tile.

use waterworks_geom::{Vec3, face_gap, overlap, rotate_aabb_yaw};
use waterworks_mesh::constants::SURFACE_UV_SCALE;
use waterworks_mesh::{
    Curtain, CurtainCorner, MeshBuild, MeshKind, QuadExtents, SurfaceRect, SyntheticMesh,
    append_curtain, append_curtain_corner, append_surface_quad, curtain_depth, double_sided_quad,
};

use crate::cluster::{Footprint, surfaces_aligned};
use crate::constants::*;
use crate::tile::{OwnedSurface, TileId};
use crate::world::WaterWorld;

/// The four open-edge directions of a tile, in X/Z.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    PosX,
    NegX,
    PosZ,
    NegZ,
}

impl Side {
    const ALL: [Side; 4] = [Side::PosX, Side::NegX, Side::PosZ, Side::NegZ];

    #[inline]
    fn outward(self) -> Vec3 {
        match self {
            Side::PosX => Vec3::new(1.0, 0.0, 0.0),
            Side::NegX => Vec3::new(-1.0, 0.0, 0.0),
            Side::PosZ => Vec3::new(0.0, 0.0, 1.0),
            Side::NegZ => Vec3::new(0.0, 0.0, -1.0),
        }
    }
}

/// Picks, among `candidates`, the tile sitting one tile-width away in direction `side`
/// with the closest surface height.
fn edge_neighbor(me: &Footprint, side: Side, candidates: &[Footprint]) -> Option<Footprint> {
    let mc = me.bounds.center();
    let my_size = me.bounds.size().x.max(me.bounds.size().z);
    candidates
        .iter()
        .filter(|other| {
            let tile_size = my_size.max(other.bounds.size().x.max(other.bounds.size().z));
            if tile_size <= 0.01 {
                return false;
            }
            let tol = tile_size * CLUSTER_ADJACENCY_TOLERANCE;
            let oc = other.bounds.center();
            let (along, across) = match side {
                Side::PosX => (oc.x - mc.x, oc.z - mc.z),
                Side::NegX => (mc.x - oc.x, oc.z - mc.z),
                Side::PosZ => (oc.z - mc.z, oc.x - mc.x),
                Side::NegZ => (mc.z - oc.z, oc.x - mc.x),
            };
            (along - tile_size).abs() <= tol && across.abs() <= tol
        })
        .min_by(|a, b| {
            let da = (a.surface_y - me.surface_y).abs();
            let db = (b.surface_y - me.surface_y).abs();
            da.total_cmp(&db)
        })
        .copied()
}

/// Bottom of the curtain hanging off one edge, or `None` when the edge needs none.
fn curtain_bottom(top: f32, volume_bottom: f32, min_depth: f32, neighbor: Option<&Footprint>) -> Option<f32> {
    let mut bottom = (top - min_depth).min(volume_bottom);
    if let Some(n) = neighbor {
        if top <= n.surface_y + LEVEL_TOLERANCE {
            return None;
        }
        bottom = bottom.min(n.surface_y - CURTAIN_NEIGHBOR_OVERLAP);
    }
    if top - bottom <= CURTAIN_MIN_HEIGHT {
        return None;
    }
    Some(bottom)
}

impl WaterWorld {
    /// World-space mesh covering every member: one quad each plus curtains on open edges.
    pub(crate) fn build_cluster_mesh(&self, members: &[TileId]) -> MeshBuild {
        let feet: Vec<Footprint> = members.iter().filter_map(|m| self.footprint(*m)).collect();
        let mut mb = MeshBuild::default();
        if feet.is_empty() {
            return mb;
        }
        mb.reserve_quads(feet.len() * 2);
        let min_x = feet.iter().map(|f| f.bounds.min.x).fold(f32::INFINITY, f32::min);
        let min_z = feet.iter().map(|f| f.bounds.min.z).fold(f32::INFINITY, f32::min);
        for f in &feet {
            let rect = SurfaceRect {
                min_x: f.bounds.min.x - CLUSTER_EDGE_OVERLAP,
                max_x: f.bounds.max.x + CLUSTER_EDGE_OVERLAP,
                min_z: f.bounds.min.z - CLUSTER_EDGE_OVERLAP,
                max_z: f.bounds.max.z + CLUSTER_EDGE_OVERLAP,
                y: f.surface_y,
            };
            append_surface_quad(&mut mb, rect, (min_x, min_z), SURFACE_UV_SCALE);
        }
        if self.config.features.cluster_curtains {
            for &m in members {
                self.append_curtains(&mut mb, m);
            }
        }
        mb
    }

    fn append_curtains(&self, mb: &mut MeshBuild, id: TileId) {
        let Some(tile) = self.tiles.get(&id) else {
            return;
        };
        let Some(me) = self.footprint(id) else {
            return;
        };
        let candidates: Vec<Footprint> = self
            .index
            .query_near(&me.bounds)
            .into_iter()
            .filter(|&n| n != id)
            .filter_map(|n| self.footprint(n))
            .collect();
        let top = me.surface_y;
        let b = me.bounds;
        let (x0, x1) = (b.min.x - CLUSTER_EDGE_OVERLAP, b.max.x + CLUSTER_EDGE_OVERLAP);
        let (z0, z1) = (b.min.z - CLUSTER_EDGE_OVERLAP, b.max.z + CLUSTER_EDGE_OVERLAP);
        let min_depth = self.config.curtain_min_depth;
        let bottoms = Side::ALL.map(|side| {
            let neighbor = edge_neighbor(&me, side, &candidates);
            curtain_bottom(top, tile.volume_bottom(), min_depth, neighbor.as_ref())
        });
        for (side, bottom) in Side::ALL.iter().zip(bottoms) {
            let Some(bottom) = bottom else {
                continue;
            };
            let (start, end) = match side {
                Side::PosX => (Vec3::new(x1, top, z0), Vec3::new(x1, top, z1)),
                Side::NegX => (Vec3::new(x0, top, z0), Vec3::new(x0, top, z1)),
                Side::PosZ => (Vec3::new(x0, top, z1), Vec3::new(x1, top, z1)),
                Side::NegZ => (Vec3::new(x0, top, z0), Vec3::new(x1, top, z0)),
            };
            let curtain = Curtain {
                start,
                end,
                top,
                bottom,
                outward: side.outward(),
                segments: CURTAIN_SEGMENTS,
                depth: curtain_depth(top - bottom),
            };
            append_curtain(mb, &curtain, SURFACE_UV_SCALE);
        }
        // Corners between two curtained perpendicular edges
        let corners = [
            (0usize, 2usize, Vec3::new(x1, top, z1)),
            (0, 3, Vec3::new(x1, top, z0)),
            (1, 2, Vec3::new(x0, top, z1)),
            (1, 3, Vec3::new(x0, top, z0)),
        ];
        for (a, c, corner) in corners {
            let (Some(ba), Some(bc)) = (bottoms[a], bottoms[c]) else {
                continue;
            };
            // Shallower of the two, so the patch never hangs below either curtain
            let bottom = ba.max(bc);
            let patch = CurtainCorner {
                corner,
                top,
                bottom,
                outward_a: Side::ALL[a].outward(),
                outward_b: Side::ALL[c].outward(),
                segments: CURTAIN_SEGMENTS,
                depth: curtain_depth(top - bottom),
            };
            append_curtain_corner(mb, &patch, SURFACE_UV_SCALE);
        }
    }

    /// Per-side padding toward aligned, level neighbors across small gaps, in the
    /// tile's yaw frame: `[left, right, back, forward]`.
    pub(crate) fn edge_padding(&self, id: TileId) -> [f32; 4] {
        let mut pad = [0.0f32; 4];
        let Some(me) = self.footprint(id) else {
            return pad;
        };
        let la = rotate_aabb_yaw(&me.bounds, -me.yaw_deg);
        for n in self.index.query_near(&me.bounds) {
            if n == id {
                continue;
            }
            let Some(other) = self.footprint(n) else {
                continue;
            };
            if (me.surface_y - other.surface_y).abs() > LEVEL_TOLERANCE || !surfaces_aligned(&me, &other) {
                continue;
            }
            let lb = rotate_aabb_yaw(&other.bounds, -me.yaw_deg);
            let oz = overlap(la.min.z, la.max.z, lb.min.z, lb.max.z).len();
            let ox = overlap(la.min.x, la.max.x, lb.min.x, lb.max.x).len();
            let sides = [
                (face_gap(lb.max.x, la.min.x), oz, 0),
                (face_gap(la.max.x, lb.min.x), oz, 1),
                (face_gap(lb.max.z, la.min.z), ox, 2),
                (face_gap(la.max.z, lb.min.z), ox, 3),
            ];
            for (gap, shared, slot) in sides {
                let Some(g) = gap else {
                    continue;
                };
                if g.gap <= CONNECTION_GAP_MAX && shared >= CONNECTION_MIN_OVERLAP {
                    pad[slot] = pad[slot].max(g.gap + EDGE_OVERLAP);
                }
            }
        }
        pad
    }

    /// Individual surface used when clusters are not merged: every tile shows its own
    /// quad, stretched toward its neighbors.
    pub(crate) fn rebuild_tile_surface(&mut self, id: TileId) {
        let Some(tile) = self.tiles.get(&id) else {
            return;
        };
        let yaw = tile.pose.yaw_deg;
        let local = rotate_aabb_yaw(&tile.volume.bounds, -yaw).size();
        let center = tile.volume.surface_center();
        let rev = tile.geometry_rev;
        let pad = self.edge_padding(id);
        let ext = QuadExtents {
            left: local.x * 0.5 + pad[0],
            right: local.x * 0.5 + pad[1],
            back: local.z * 0.5 + pad[2],
            forward: local.z * 0.5 + pad[3],
        };
        let mut mb = double_sided_quad(ext);
        mb.transform_yaw_translate(yaw, center + Vec3::new(0.0, SURFACE_Y_OFFSET, 0.0));
        if let Some(t) = self.tiles.get_mut(&id) {
            t.surface_owner = true;
            t.cluster_cache = None;
        }
        self.store_surface(id, SyntheticMesh::new(MeshKind::TileSurface, mb), vec![(id, rev)]);
    }

    pub(crate) fn store_surface(&mut self, id: TileId, mesh: SyntheticMesh, signature: Vec<(TileId, u64)>) {
        let Some(tile) = self.tiles.get_mut(&id) else {
            return;
        };
        let old = tile.surface.take().map(|s| s.mesh);
        let mesh = self.meshes.replace(old, mesh);
        tile.surface = Some(OwnedSurface { mesh, signature });
    }

    pub(crate) fn release_surface(&mut self, id: TileId) {
        if let Some(tile) = self.tiles.get_mut(&id) {
            if let Some(old) = tile.surface.take() {
                self.meshes.release(old.mesh);
            }
        }
    }

    /// The mesh currently drawn for `id`'s surface, if it owns one.
    pub fn surface_mesh(&self, id: TileId) -> Option<&SyntheticMesh> {
        let tile = self.tiles.get(&id)?;
        if !tile.surface_owner {
            return None;
        }
        self.meshes.get(tile.surface.as_ref()?.mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waterworks_geom::Aabb;

    fn foot(cx: f32, cz: f32, y: f32) -> Footprint {
        Footprint {
            bounds: Aabb::new(Vec3::new(cx - 1.0, y - 0.2, cz - 1.0), Vec3::new(cx + 1.0, y, cz + 1.0)),
            surface_y: y,
            yaw_deg: 0.0,
        }
    }

    #[test]
    fn edge_neighbor_prefers_closest_height() {
        let me = foot(0.0, 0.0, 0.0);
        let cands = [foot(2.0, 0.0, -3.0), foot(2.1, 0.1, 0.1), foot(0.0, 2.0, 0.0)];
        let n = edge_neighbor(&me, Side::PosX, &cands).unwrap();
        assert!((n.surface_y - 0.1).abs() < 1e-6);
        assert!(edge_neighbor(&me, Side::NegX, &cands).is_none());
        assert!(edge_neighbor(&me, Side::PosZ, &cands).is_some());
    }

    #[test]
    fn curtain_skipped_toward_level_or_higher_neighbor() {
        let level = foot(2.0, 0.0, 0.1);
        assert_eq!(curtain_bottom(0.0, -3.0, 10.0, Some(&level)), None);
        let open = curtain_bottom(0.0, -3.0, 10.0, None).unwrap();
        assert!((open + 10.0).abs() < 1e-6);
        let lower = foot(2.0, 0.0, -12.0);
        let b = curtain_bottom(0.0, -3.0, 10.0, Some(&lower)).unwrap();
        assert!((b - (-12.0 - CURTAIN_NEIGHBOR_OVERLAP)).abs() < 1e-5);
        // Too short to draw
        assert_eq!(curtain_bottom(0.0, -0.05, 0.05, None), None);
    }
}
