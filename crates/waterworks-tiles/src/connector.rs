//! Bridges and cascades filling the gaps between a tile and its higher-id neighbors.

use std::collections::BTreeMap;

use waterworks_geom::{Aabb, FaceGap, Overlap, Vec3, face_gap, overlap, rotate_aabb_yaw, rotate_yaw, transform_aabb};
use waterworks_mesh::{MeshKind, SyntheticMesh, curved_cascade, double_sided_quad_sized};

use crate::cluster::{Footprint, surfaces_aligned};
use crate::constants::*;
use crate::mesh_store::MeshId;
use crate::tile::TileId;
use crate::world::WaterWorld;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnectorKind {
    Bridge,
    Cascade,
}

/// Axis the gap runs along.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Z,
}

impl Axis {
    #[inline]
    fn tag(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Z => "z",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Connector {
    pub key: String,
    pub kind: ConnectorKind,
    pub axis: Axis,
    pub neighbor: TileId,
    /// World center of the visual quad (bridge) or ribbon (cascade).
    pub center: Vec3,
    /// Extent across the gap, edge overlap included.
    pub span: f32,
    /// Extent along the shared edge, edge overlap included. For cascades, the ribbon width.
    pub length: f32,
    /// Vertical drop of a cascade; zero for bridges.
    pub height: f32,
    pub yaw_deg: f32,
    /// Trigger volume used for immersion.
    pub collider: Aabb,
    pub surface_y: f32,
    /// Whether the connector draws its own geometry.
    pub visual: bool,
    pub mesh: Option<MeshId>,
}

impl Connector {
    /// Visual footprint in the connector's own frame, floored so it never vanishes.
    #[inline]
    pub fn mesh_size(&self) -> (f32, f32) {
        let (sx, sz) = match self.axis {
            Axis::X => (self.span, self.length),
            Axis::Z => (self.length, self.span),
        };
        (sx.max(CONNECTOR_MIN_SIZE), sz.max(CONNECTOR_MIN_SIZE))
    }

    fn build_mesh(&self) -> SyntheticMesh {
        match self.kind {
            ConnectorKind::Bridge => {
                let (sx, sz) = self.mesh_size();
                let mut mb = double_sided_quad_sized(sx, sz);
                mb.transform_yaw_translate(self.yaw_deg, self.center);
                SyntheticMesh::new(MeshKind::Bridge, mb)
            }
            ConnectorKind::Cascade => {
                let depth = (self.height * CASCADE_DEPTH_SCALE).clamp(CASCADE_DEPTH_MIN, CASCADE_DEPTH_MAX);
                let mut mb = curved_cascade(self.length, self.height, CASCADE_SEGMENTS, depth);
                // Back off half the bow so the ribbon straddles the gap
                let back = rotate_yaw(Vec3::new(0.0, 0.0, depth * 0.5), self.yaw_deg);
                mb.transform_yaw_translate(self.yaw_deg, self.center - back);
                SyntheticMesh::new(MeshKind::Cascade, mb)
            }
        }
    }
}

/// Connectors owned by one tile, keyed canonically so rebuilds deduplicate.
#[derive(Clone, Debug, Default)]
pub struct ConnectorSet {
    by_key: BTreeMap<String, Connector>,
}

impl ConnectorSet {
    #[inline]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&Connector> {
        self.by_key.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.by_key.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connector> {
        self.by_key.values()
    }

    /// Inserts unless the key already exists.
    pub(crate) fn insert(&mut self, c: Connector) -> bool {
        if self.by_key.contains_key(&c.key) {
            return false;
        }
        self.by_key.insert(c.key.clone(), c);
        true
    }

    pub(crate) fn drain(&mut self) -> Vec<Connector> {
        std::mem::take(&mut self.by_key).into_values().collect()
    }
}

struct GapCandidate {
    axis: Axis,
    gap: FaceGap,
    overlap: Overlap,
    /// True when the neighbor lies on the positive side of the gap.
    neighbor_positive: bool,
}

/// Every face pair where `b` sits at or beyond a face of `a`.
fn gap_candidates(a: &Aabb, b: &Aabb) -> Vec<GapCandidate> {
    let ox = overlap(a.min.x, a.max.x, b.min.x, b.max.x);
    let oz = overlap(a.min.z, a.max.z, b.min.z, b.max.z);
    let pairs = [
        (Axis::X, face_gap(a.max.x, b.min.x), oz, true),
        (Axis::X, face_gap(b.max.x, a.min.x), oz, false),
        (Axis::Z, face_gap(a.max.z, b.min.z), ox, true),
        (Axis::Z, face_gap(b.max.z, a.min.z), ox, false),
    ];
    pairs
        .into_iter()
        .filter_map(|(axis, gap, overlap, neighbor_positive)| {
            gap.map(|gap| GapCandidate {
                axis,
                gap,
                overlap,
                neighbor_positive,
            })
        })
        .collect()
}

#[inline]
fn key_for(neighbor: TileId, prefix: &str, axis: Axis, c: &GapCandidate, suffix: &str) -> String {
    format!(
        "{}:{}{}:{:.2}:{:.2}:{:.2}{}",
        neighbor,
        prefix,
        axis.tag(),
        c.gap.center,
        c.overlap.min,
        c.overlap.max,
        suffix
    )
}

#[inline]
fn plane_point(axis: Axis, along_gap: f32, along_edge: f32, y: f32) -> Vec3 {
    match axis {
        Axis::X => Vec3::new(along_gap, y, along_edge),
        Axis::Z => Vec3::new(along_edge, y, along_gap),
    }
}

fn trigger_box(axis: Axis, span: f32, length: f32) -> Vec3 {
    let (sx, sz) = match axis {
        Axis::X => (span, length),
        Axis::Z => (length, span),
    };
    Vec3::new(sx.max(CONNECTOR_MIN_SIZE), CONNECTOR_TRIGGER_HEIGHT, sz.max(CONNECTOR_MIN_SIZE))
}

/// Flat bridges in world axes. Used with merged cluster surfaces, which draw the water
/// themselves, so these only carry trigger volumes.
pub fn plan_world_aligned(a: &Footprint, neighbor: TileId, b: &Footprint) -> Vec<Connector> {
    if (a.surface_y - b.surface_y).abs() > LEVEL_TOLERANCE {
        return Vec::new();
    }
    let surface_y = (a.surface_y + b.surface_y) * 0.5;
    let mut out = Vec::new();
    for c in gap_candidates(&a.bounds, &b.bounds) {
        if c.gap.gap > CONNECTION_GAP_MAX || c.overlap.len() < BRIDGE_MIN_OVERLAP {
            continue;
        }
        let span = c.gap.gap.max(GAP_VISUAL_MIN) + EDGE_OVERLAP * 2.0;
        let length = c.overlap.len() + EDGE_OVERLAP * 2.0;
        let center = plane_point(c.axis, c.gap.center, c.overlap.mid(), surface_y + SURFACE_Y_OFFSET);
        out.push(Connector {
            key: key_for(neighbor, "w", c.axis, &c, ""),
            kind: ConnectorKind::Bridge,
            axis: c.axis,
            neighbor,
            center,
            span,
            length,
            height: 0.0,
            yaw_deg: 0.0,
            collider: Aabb::from_center_size(center, trigger_box(c.axis, span, length)),
            surface_y,
            visual: false,
            mesh: None,
        });
    }
    out
}

/// Bridges (and optionally cascades) in the frame of `a`'s yaw, each drawing its own mesh.
pub fn plan_oriented(a: &Footprint, neighbor: TileId, b: &Footprint, cascades: bool) -> Vec<Connector> {
    if !surfaces_aligned(a, b) {
        return Vec::new();
    }
    let yaw = a.yaw_deg;
    let la = rotate_aabb_yaw(&a.bounds, -yaw);
    let lb = rotate_aabb_yaw(&b.bounds, -yaw);
    let diff = a.surface_y - b.surface_y;
    let level = diff.abs() <= LEVEL_TOLERANCE;
    if !level && !(cascades && diff.abs() <= VERTICAL_MAX) {
        return Vec::new();
    }
    let mut out = Vec::new();
    for c in gap_candidates(&la, &lb) {
        if c.gap.gap > CONNECTION_GAP_MAX || c.overlap.len() < CONNECTION_MIN_OVERLAP {
            continue;
        }
        let local = plane_point(c.axis, c.gap.center, c.overlap.mid(), 0.0);
        let flat = rotate_yaw(local, yaw);
        if level {
            let surface_y = (a.surface_y + b.surface_y) * 0.5;
            let span = c.gap.gap.max(GAP_VISUAL_MIN) + EDGE_OVERLAP * 2.0;
            let length = c.overlap.len() + EDGE_OVERLAP * 2.0;
            let center = Vec3::new(flat.x, surface_y + SURFACE_Y_OFFSET, flat.z);
            let local_box = Aabb::from_center_size(Vec3::ZERO, trigger_box(c.axis, span, length));
            out.push(Connector {
                key: key_for(neighbor, "", c.axis, &c, ":h"),
                kind: ConnectorKind::Bridge,
                axis: c.axis,
                neighbor,
                center,
                span,
                length,
                height: 0.0,
                yaw_deg: yaw,
                collider: transform_aabb(&local_box, center, yaw, Vec3::ONE),
                surface_y,
                visual: true,
                mesh: None,
            });
        } else {
            let height = diff.abs();
            let width = c.overlap.len();
            let center = Vec3::new(flat.x, (a.surface_y + b.surface_y) * 0.5, flat.z);
            // The ribbon bows away from the higher tile.
            let bow_positive = c.neighbor_positive == (diff > 0.0);
            let turn = match (c.axis, bow_positive) {
                (Axis::X, true) => -90.0,
                (Axis::X, false) => 90.0,
                (Axis::Z, true) => 0.0,
                (Axis::Z, false) => 180.0,
            };
            let wall = match c.axis {
                Axis::X => Vec3::new(WALL_THICKNESS, height, width),
                Axis::Z => Vec3::new(width, height, WALL_THICKNESS),
            };
            out.push(Connector {
                key: key_for(neighbor, "", c.axis, &c, ":v"),
                kind: ConnectorKind::Cascade,
                axis: c.axis,
                neighbor,
                center,
                span: WALL_THICKNESS,
                length: width,
                height,
                yaw_deg: yaw + turn,
                collider: transform_aabb(&Aabb::from_center_size(Vec3::ZERO, wall), center, yaw, Vec3::ONE),
                surface_y: a.surface_y.max(b.surface_y),
                visual: true,
                mesh: None,
            });
        }
    }
    out
}

impl WaterWorld {
    /// Drops every connector owned by `id` and rebuilds them against higher-id neighbors.
    pub(crate) fn rebuild_connections(&mut self, id: TileId) {
        let Some(tile) = self.tiles.get_mut(&id) else {
            return;
        };
        for old in tile.connectors.drain() {
            if let Some(mesh) = old.mesh {
                self.meshes.release(mesh);
            }
        }
        if !self.config.enabled {
            return;
        }
        let Some(me) = self.footprint(id) else {
            return;
        };
        let cluster_surfaces = self.config.features.cluster_surfaces;
        let cascades = self.config.features.cascades;
        let mut planned = Vec::new();
        for n in self.index.query_near(&me.bounds) {
            // The lower id owns the pair.
            if n <= id {
                continue;
            }
            let Some(other) = self.footprint(n) else {
                continue;
            };
            if cluster_surfaces {
                planned.extend(plan_world_aligned(&me, n, &other));
            } else {
                planned.extend(plan_oriented(&me, n, &other, cascades));
            }
        }
        let mut created = 0usize;
        let Some(tile) = self.tiles.get_mut(&id) else {
            return;
        };
        for mut c in planned {
            if tile.connectors.contains(&c.key) {
                continue;
            }
            if c.visual {
                c.mesh = Some(self.meshes.insert(c.build_mesh()));
            }
            tile.connectors.insert(c);
            created += 1;
        }
        log::debug!(target: "connectors", "tile {} rebuilt {} connectors", id, created);
    }

    /// Connectors currently owned by `id`.
    pub fn connectors(&self, id: TileId) -> Option<&ConnectorSet> {
        self.tiles.get(&id).map(|t| &t.connectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slab(center: Vec3, sx: f32, sz: f32) -> Footprint {
        Footprint {
            bounds: Aabb::new(
                Vec3::new(center.x - sx * 0.5, center.y - 0.2, center.z - sz * 0.5),
                Vec3::new(center.x + sx * 0.5, center.y, center.z + sz * 0.5),
            ),
            surface_y: center.y,
            yaw_deg: 0.0,
        }
    }

    #[test]
    fn world_aligned_bridge_spans_the_gap() {
        let a = slab(Vec3::ZERO, 2.0, 2.0);
        let b = slab(Vec3::new(2.3, 0.0, 0.0), 2.0, 2.0);
        let out = plan_world_aligned(&a, TileId(2), &b);
        assert_eq!(out.len(), 1);
        let c = &out[0];
        assert_eq!(c.axis, Axis::X);
        assert!((c.center.x - 1.15).abs() < 1e-4);
        assert!((c.center.y - SURFACE_Y_OFFSET).abs() < 1e-5);
        assert!((c.span - (0.3 + 2.0 * EDGE_OVERLAP)).abs() < 1e-4);
        assert!((c.length - (2.0 + 2.0 * EDGE_OVERLAP)).abs() < 1e-4);
        assert_eq!(c.key, "2:wx:1.15:-1.00:1.00");
        assert!(!c.visual);
        assert!(c.collider.contains(Vec3::new(1.15, 0.0, 0.5)));
    }

    #[test]
    fn touching_tiles_get_minimum_visual_gap() {
        let a = slab(Vec3::ZERO, 2.0, 2.0);
        let b = slab(Vec3::new(0.0, 0.0, 2.0), 2.0, 2.0);
        let out = plan_world_aligned(&a, TileId(9), &b);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].axis, Axis::Z);
        assert!((out[0].span - (GAP_VISUAL_MIN + 2.0 * EDGE_OVERLAP)).abs() < 1e-5);
    }

    #[test]
    fn no_bridge_for_wide_gaps_or_height_steps() {
        let a = slab(Vec3::ZERO, 2.0, 2.0);
        let far = slab(Vec3::new(3.5, 0.0, 0.0), 2.0, 2.0);
        assert!(plan_world_aligned(&a, TileId(2), &far).is_empty());
        let high = slab(Vec3::new(2.3, 5.0, 0.0), 2.0, 2.0);
        assert!(plan_world_aligned(&a, TileId(2), &high).is_empty());
        assert!(plan_oriented(&a, TileId(2), &high, false).is_empty());
    }

    #[test]
    fn diagonal_neighbors_do_not_bridge() {
        let a = slab(Vec3::ZERO, 2.0, 2.0);
        let b = slab(Vec3::new(2.3, 0.0, 2.3), 2.0, 2.0);
        assert!(plan_world_aligned(&a, TileId(2), &b).is_empty());
    }

    #[test]
    fn oriented_bridge_is_visual_and_suffixed() {
        let a = slab(Vec3::ZERO, 2.0, 2.0);
        let b = slab(Vec3::new(0.0, 0.1, -2.5), 2.0, 2.0);
        let out = plan_oriented(&a, TileId(4), &b, false);
        assert_eq!(out.len(), 1);
        assert!(out[0].visual);
        assert!(out[0].key.ends_with(":h"));
        assert!((out[0].center.z + 1.25).abs() < 1e-4);
        assert!((out[0].surface_y - 0.05).abs() < 1e-5);
    }

    #[test]
    fn cascade_only_when_enabled() {
        let a = slab(Vec3::new(0.0, 1.0, 0.0), 2.0, 2.0);
        let b = slab(Vec3::new(2.2, 0.0, 0.0), 2.0, 2.0);
        assert!(plan_oriented(&a, TileId(2), &b, false).is_empty());
        let out = plan_oriented(&a, TileId(2), &b, true);
        assert_eq!(out.len(), 1);
        let c = &out[0];
        assert_eq!(c.kind, ConnectorKind::Cascade);
        assert!(c.key.ends_with(":v"));
        assert!((c.height - 1.0).abs() < 1e-5);
        assert!((c.surface_y - 1.0).abs() < 1e-5);
        let mesh = c.build_mesh();
        let bounds = mesh.build.bounds().unwrap();
        // Falls toward the lower tile on +X
        assert!(bounds.max.x > c.center.x + 0.05);
        assert!((bounds.max.y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn cascade_ribbon_straddles_the_gap() {
        let a = slab(Vec3::new(0.0, 1.0, 0.0), 2.0, 2.0);
        let b = slab(Vec3::new(2.2, 0.0, 0.0), 2.0, 2.0);
        let c = plan_oriented(&a, TileId(2), &b, true).remove(0);
        let half = (c.height * CASCADE_DEPTH_SCALE).clamp(CASCADE_DEPTH_MIN, CASCADE_DEPTH_MAX) * 0.5;
        let mb = c.build_mesh().build;
        let mut top = 0;
        let mut bottom = 0;
        for i in 0..mb.vertex_count() {
            let v = mb.vertex(i);
            if (v.y - 1.0).abs() < 1e-4 {
                // Lip starts half a bow behind the gap center
                assert!((v.x - (c.center.x - half)).abs() < 1e-4, "top x {}", v.x);
                top += 1;
            } else if v.y.abs() < 1e-4 {
                assert!((v.x - (c.center.x + half)).abs() < 1e-4, "bottom x {}", v.x);
                bottom += 1;
            }
        }
        assert!(top > 0 && bottom > 0);
    }
}
