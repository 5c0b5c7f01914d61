//! Vertical ribbons: curtains hanging off open cluster edges and face-to-face cascades.

use core::f32::consts::PI;

use waterworks_geom::Vec3;

use crate::constants::{CASCADE_SEGMENTS_MIN, CURTAIN_BULGE, CURTAIN_SEGMENTS_MAX};
use crate::mesh_build::MeshBuild;

pub const CURTAIN_DEPTH_SCALE: f32 = 0.35;
pub const CURTAIN_DEPTH_MIN: f32 = 0.05;
pub const CURTAIN_DEPTH_MAX: f32 = 0.45;

/// Outward displacement of a ribbon row at parameter `t` in `[0, 1]` (top to bottom).
#[inline]
pub fn curtain_offset(t: f32, depth: f32) -> f32 {
    t * depth + (t * PI).sin() * depth * CURTAIN_BULGE
}

/// How far a curtain of the given height leans out at its bottom.
#[inline]
pub fn curtain_depth(height: f32) -> f32 {
    (height * CURTAIN_DEPTH_SCALE).clamp(CURTAIN_DEPTH_MIN, CURTAIN_DEPTH_MAX)
}

/// One hanging ribbon along a horizontal edge.
#[derive(Clone, Copy, Debug)]
pub struct Curtain {
    /// Edge endpoints; only X/Z are used, heights come from `top`/`bottom`.
    pub start: Vec3,
    pub end: Vec3,
    pub top: f32,
    pub bottom: f32,
    /// Unit horizontal direction pointing away from the water body.
    pub outward: Vec3,
    pub segments: usize,
    pub depth: f32,
}

/// Appends a double-sided ribbon. U spans the edge centered on zero, V grows downward.
pub fn append_curtain(mb: &mut MeshBuild, c: &Curtain, uv_scale: f32) {
    let segs = c.segments.clamp(1, CURTAIN_SEGMENTS_MAX);
    let scale = if uv_scale > 0.0 { uv_scale } else { 1.0 };
    let half_u = (c.end - c.start).length_xz() * 0.5 / scale;
    let mut rows = Vec::with_capacity(segs + 1);
    let mut uvs = Vec::with_capacity(segs + 1);
    for i in 0..=segs {
        let t = i as f32 / segs as f32;
        let y = c.top + (c.bottom - c.top) * t;
        let push = c.outward * curtain_offset(t, c.depth);
        let l = Vec3::new(c.start.x, y, c.start.z) + push;
        let r = Vec3::new(c.end.x, y, c.end.z) + push;
        let v = (c.top - y) / scale;
        rows.push((l, r));
        uvs.push(((-half_u, v), (half_u, v)));
    }
    mb.add_strip(&rows, &uvs, c.outward);
    mb.add_strip(&rows, &uvs, -c.outward);
}

/// Patch closing the seam where two perpendicular curtains meet at `corner`.
#[derive(Clone, Copy, Debug)]
pub struct CurtainCorner {
    pub corner: Vec3,
    pub top: f32,
    pub bottom: f32,
    pub outward_a: Vec3,
    pub outward_b: Vec3,
    pub segments: usize,
    pub depth: f32,
}

pub fn append_curtain_corner(mb: &mut MeshBuild, c: &CurtainCorner, uv_scale: f32) {
    let segs = c.segments.clamp(1, CURTAIN_SEGMENTS_MAX);
    let scale = if uv_scale > 0.0 { uv_scale } else { 1.0 };
    let normal = (c.outward_a + c.outward_b).normalized();
    let mut rows = Vec::with_capacity(segs + 1);
    let mut uvs = Vec::with_capacity(segs + 1);
    for i in 0..=segs {
        let t = i as f32 / segs as f32;
        let y = c.top + (c.bottom - c.top) * t;
        let off = curtain_offset(t, c.depth);
        let base = Vec3::new(c.corner.x, y, c.corner.z);
        let v = (c.top - y) / scale;
        rows.push((base + c.outward_a * off, base + c.outward_b * off));
        uvs.push(((0.0, v), (1.0, v)));
    }
    mb.add_strip(&rows, &uvs, normal);
    mb.add_strip(&rows, &uvs, -normal);
}

/// Standalone cascade centered on its origin: spans X, falls along -Y, bows toward +Z.
pub fn curved_cascade(width: f32, height: f32, segments: usize, depth: f32) -> MeshBuild {
    let segs = segments.clamp(CASCADE_SEGMENTS_MIN, CURTAIN_SEGMENTS_MAX);
    let hw = width * 0.5;
    let hh = height * 0.5;
    let mut mb = MeshBuild::default();
    mb.reserve_quads(segs * 2);
    let c = Curtain {
        start: Vec3::new(-hw, 0.0, 0.0),
        end: Vec3::new(hw, 0.0, 0.0),
        top: hh,
        bottom: -hh,
        outward: Vec3::new(0.0, 0.0, 1.0),
        segments: segs,
        depth,
    };
    append_curtain(&mut mb, &c, 1.0);
    mb
}
