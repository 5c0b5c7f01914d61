use std::fmt;

use waterworks_geom::{Aabb, Vec3};

use crate::bounds::{TransformSnapshot, VolumeMetrics};
use crate::connector::ConnectorSet;
use crate::highlight::HighlightState;
use crate::mesh_store::MeshId;
use crate::scheduler::RebuildState;

/// Stable creation-order key. Lower ids win ownership ties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub u64);

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Placement of a tile: translation, yaw about +Y, per-axis scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub pos: Vec3,
    pub yaw_deg: f32,
    pub scale: Vec3,
}

impl Pose {
    #[inline]
    pub const fn new(pos: Vec3, yaw_deg: f32) -> Self {
        Self {
            pos,
            yaw_deg,
            scale: Vec3::ONE,
        }
    }

    #[inline]
    pub const fn at(x: f32, y: f32, z: f32) -> Self {
        Self::new(Vec3::new(x, y, z), 0.0)
    }

    #[inline]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 0.0)
    }
}

/// What a piece of tile geometry is. Only solid geometry shapes the water volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementRole {
    Visual,
    SolidCollider,
    TriggerCollider,
    WaterSurface,
    ConnectorRoot,
    HighlightRoot,
    GhostOnly,
}

impl ElementRole {
    #[inline]
    pub fn shapes_volume(self) -> bool {
        matches!(self, ElementRole::Visual | ElementRole::SolidCollider)
    }
}

/// A box of tile geometry in tile-local space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileElement {
    pub local: Aabb,
    pub role: ElementRole,
}

impl TileElement {
    #[inline]
    pub const fn new(local: Aabb, role: ElementRole) -> Self {
        Self { local, role }
    }
}

/// Everything the host hands over when a tile is placed.
#[derive(Clone, Debug, PartialEq)]
pub struct TileSpec {
    pub pose: Pose,
    pub elements: Vec<TileElement>,
}

impl TileSpec {
    /// A plain slab whose top face sits at the pivot height.
    pub fn slab(pose: Pose, size: Vec3) -> Self {
        let local = Aabb::new(
            Vec3::new(-size.x * 0.5, -size.y, -size.z * 0.5),
            Vec3::new(size.x * 0.5, 0.0, size.z * 0.5),
        );
        Self {
            pose,
            elements: vec![TileElement::new(local, ElementRole::Visual)],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ClusterCache {
    pub count: usize,
    pub saturated: bool,
    pub stamp: f64,
}

/// Merged or individual surface currently owned by a tile.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct OwnedSurface {
    pub mesh: MeshId,
    /// Members and their geometry revisions when the mesh was built.
    pub signature: Vec<(TileId, u64)>,
}

/// One placed water tile and its derived state.
#[derive(Clone, Debug)]
pub struct Tile {
    pub(crate) id: TileId,
    pub(crate) pose: Pose,
    pub(crate) elements: Vec<TileElement>,
    pub(crate) volume: VolumeMetrics,
    pub(crate) snapshot: TransformSnapshot,
    pub(crate) sched: RebuildState,
    pub(crate) geometry_rev: u64,
    pub(crate) cluster_cache: Option<ClusterCache>,
    pub(crate) surface_owner: bool,
    pub(crate) surface: Option<OwnedSurface>,
    pub(crate) connectors: ConnectorSet,
    pub(crate) highlight: HighlightState,
}

impl Tile {
    pub(crate) fn new(id: TileId, spec: TileSpec, volume: VolumeMetrics) -> Self {
        let snapshot = TransformSnapshot::capture(&spec.pose, &volume);
        Self {
            id,
            pose: spec.pose,
            elements: spec.elements,
            volume,
            snapshot,
            sched: RebuildState::fresh(),
            geometry_rev: 1,
            cluster_cache: None,
            surface_owner: false,
            surface: None,
            connectors: ConnectorSet::default(),
            highlight: HighlightState::default(),
        }
    }

    #[inline]
    pub fn id(&self) -> TileId {
        self.id
    }

    #[inline]
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    #[inline]
    pub fn elements(&self) -> &[TileElement] {
        &self.elements
    }

    /// Padded world footprint used for adjacency, gaps and immersion.
    #[inline]
    pub fn bounds(&self) -> Aabb {
        self.volume.bounds
    }

    #[inline]
    pub fn surface_y(&self) -> f32 {
        self.volume.surface_y
    }

    /// Lowest point still counted as inside the water volume.
    #[inline]
    pub fn volume_bottom(&self) -> f32 {
        self.volume.surface_y - self.volume.depth_below
    }

    #[inline]
    pub fn volume(&self) -> &VolumeMetrics {
        &self.volume
    }

    /// Whether this tile renders the surface for its cluster.
    #[inline]
    pub fn is_surface_owner(&self) -> bool {
        self.surface_owner
    }

    #[inline]
    pub fn surface_mesh(&self) -> Option<MeshId> {
        self.surface.as_ref().map(|s| s.mesh)
    }

    #[inline]
    pub fn connectors(&self) -> &ConnectorSet {
        &self.connectors
    }

    #[inline]
    pub fn rebuild_state(&self) -> &RebuildState {
        &self.sched
    }

    #[inline]
    pub fn highlight_visible(&self) -> bool {
        self.highlight.visible
    }

    #[inline]
    pub fn geometry_rev(&self) -> u64 {
        self.geometry_rev
    }
}
