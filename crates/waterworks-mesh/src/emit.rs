use waterworks_geom::Vec3;

use crate::mesh_build::MeshBuild;

/// Corner indices into `box_corners` and the outward normal for each box face.
const BOX_FACES: [([usize; 4], Vec3); 6] = [
    ([0, 2, 6, 4], Vec3::new(0.0, 1.0, 0.0)),
    ([5, 7, 3, 1], Vec3::new(0.0, -1.0, 0.0)),
    ([6, 2, 3, 7], Vec3::new(1.0, 0.0, 0.0)),
    ([0, 4, 5, 1], Vec3::new(-1.0, 0.0, 0.0)),
    ([4, 6, 7, 5], Vec3::new(0.0, 0.0, 1.0)),
    ([2, 0, 1, 3], Vec3::new(0.0, 0.0, -1.0)),
];

const UNIT_UVS: [(f32, f32); 4] = [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)];

#[inline]
fn box_corners(min: Vec3, max: Vec3) -> [Vec3; 8] {
    [
        Vec3::new(min.x, max.y, min.z),
        Vec3::new(min.x, min.y, min.z),
        Vec3::new(max.x, max.y, min.z),
        Vec3::new(max.x, min.y, min.z),
        Vec3::new(min.x, max.y, max.z),
        Vec3::new(min.x, min.y, max.z),
        Vec3::new(max.x, max.y, max.z),
        Vec3::new(max.x, min.y, max.z),
    ]
}

/// Emits the six outward faces of a solid box.
pub(crate) fn emit_box_faces(mb: &mut MeshBuild, min: Vec3, max: Vec3) {
    let corners = box_corners(min, max);
    for (idx, n) in BOX_FACES {
        let [a, b, c, d] = idx.map(|i| corners[i]);
        mb.add_quad_uv(a, b, c, d, n, UNIT_UVS);
    }
}

#[inline]
pub(crate) fn emit_box_centered(mb: &mut MeshBuild, center: Vec3, size: Vec3) {
    let half = size * 0.5;
    emit_box_faces(mb, center - half, center + half);
}
