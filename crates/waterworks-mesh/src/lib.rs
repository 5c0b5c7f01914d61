//! CPU mesh synthesis for water connectors, merged surfaces and highlight outlines.
#![forbid(unsafe_code)]

pub mod constants;
mod emit;
mod mesh_build;
mod outline;
mod quad;
mod ribbon;

pub use mesh_build::MeshBuild;
pub use outline::{outline_thickness, outline_wireframe};
pub use quad::{QuadExtents, SurfaceRect, append_surface_quad, double_sided_quad, double_sided_quad_sized};
pub use ribbon::{
    CURTAIN_DEPTH_MAX, CURTAIN_DEPTH_MIN, CURTAIN_DEPTH_SCALE, Curtain, CurtainCorner,
    append_curtain, append_curtain_corner, curtain_depth, curtain_offset, curved_cascade,
};

/// What a generated mesh is for. Every mesh produced here is synthetic: owned by the
/// water system and safe to drop and regenerate wholesale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshKind {
    TileSurface,
    Bridge,
    Cascade,
    ClusterSurface,
    Outline,
}

#[derive(Clone, Debug)]
pub struct SyntheticMesh {
    pub kind: MeshKind,
    pub build: MeshBuild,
}

impl SyntheticMesh {
    #[inline]
    pub fn new(kind: MeshKind, build: MeshBuild) -> Self {
        Self { kind, build }
    }
}
