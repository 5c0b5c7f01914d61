use waterworks_geom::Vec3;

use crate::mesh_build::MeshBuild;

/// Distances from the quad origin to each edge in the local X/Z plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadExtents {
    pub left: f32,
    pub right: f32,
    pub back: f32,
    pub forward: f32,
}

impl QuadExtents {
    #[inline]
    pub fn symmetric(size_x: f32, size_z: f32) -> Self {
        let hx = size_x * 0.5;
        let hz = size_z * 0.5;
        Self {
            left: hx,
            right: hx,
            back: hz,
            forward: hz,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.left + self.right
    }

    #[inline]
    pub fn depth(&self) -> f32 {
        self.back + self.forward
    }
}

/// Flat quad at y = 0 with an upward face and a downward face sharing the unit UV square.
pub fn double_sided_quad(ext: QuadExtents) -> MeshBuild {
    let mut mb = MeshBuild::default();
    mb.reserve_quads(2);
    let a = Vec3::new(-ext.left, 0.0, -ext.back);
    let b = Vec3::new(ext.right, 0.0, -ext.back);
    let c = Vec3::new(ext.right, 0.0, ext.forward);
    let d = Vec3::new(-ext.left, 0.0, ext.forward);
    let uvs = [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)];
    mb.add_double_sided_quad_uv(a, b, c, d, Vec3::UP, uvs);
    mb
}

#[inline]
pub fn double_sided_quad_sized(size_x: f32, size_z: f32) -> MeshBuild {
    double_sided_quad(QuadExtents::symmetric(size_x, size_z))
}

/// Horizontal rectangle in world space for merged surfaces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceRect {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
    pub y: f32,
}

/// Appends a double-sided rectangle with UVs anchored at `uv_origin` (world X/Z) and
/// divided by `uv_scale`, so adjacent rectangles tile continuously.
pub fn append_surface_quad(mb: &mut MeshBuild, r: SurfaceRect, uv_origin: (f32, f32), uv_scale: f32) {
    let scale = if uv_scale > 0.0 { uv_scale } else { 1.0 };
    let uv = |x: f32, z: f32| ((x - uv_origin.0) / scale, (z - uv_origin.1) / scale);
    let a = Vec3::new(r.min_x, r.y, r.min_z);
    let b = Vec3::new(r.max_x, r.y, r.min_z);
    let c = Vec3::new(r.max_x, r.y, r.max_z);
    let d = Vec3::new(r.min_x, r.y, r.max_z);
    // add_quad_uv pairs UVs with [a, d, c, b]
    let uvs = [
        uv(r.min_x, r.min_z),
        uv(r.min_x, r.max_z),
        uv(r.max_x, r.max_z),
        uv(r.max_x, r.min_z),
    ];
    mb.add_double_sided_quad_uv(a, b, c, d, Vec3::UP, uvs);
}
