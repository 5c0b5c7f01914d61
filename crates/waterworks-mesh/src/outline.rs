use waterworks_geom::{Aabb, Vec3};

use crate::constants::{OUTLINE_THICKNESS, OUTLINE_THICKNESS_MAX_RATIO, OUTLINE_THICKNESS_MIN};
use crate::emit::emit_box_centered;
use crate::mesh_build::MeshBuild;

/// Bar thickness for an outline around `bounds`.
pub fn outline_thickness(bounds: &Aabb) -> f32 {
    let s = bounds.size();
    let cap = s.x.min(s.y).min(s.z) * OUTLINE_THICKNESS_MAX_RATIO;
    OUTLINE_THICKNESS.min(cap).max(OUTLINE_THICKNESS_MIN)
}

/// Wireframe of the twelve box edges, each a thin solid bar.
pub fn outline_wireframe(bounds: &Aabb) -> MeshBuild {
    let t = outline_thickness(bounds);
    let (min, max) = (bounds.min, bounds.max);
    let c = bounds.center();
    let s = bounds.size();
    let mut mb = MeshBuild::default();
    mb.reserve_quads(12 * 6);
    for &y in &[min.y, max.y] {
        for &z in &[min.z, max.z] {
            emit_box_centered(&mut mb, Vec3::new(c.x, y, z), Vec3::new(s.x + t, t, t));
        }
    }
    for &x in &[min.x, max.x] {
        for &z in &[min.z, max.z] {
            emit_box_centered(&mut mb, Vec3::new(x, c.y, z), Vec3::new(t, s.y + t, t));
        }
    }
    for &x in &[min.x, max.x] {
        for &y in &[min.y, max.y] {
            emit_box_centered(&mut mb, Vec3::new(x, y, c.z), Vec3::new(t, t, s.z + t));
        }
    }
    mb
}
