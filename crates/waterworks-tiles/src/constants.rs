//! Shared constants for waterworks-tiles. Distances are world units, times are seconds.

use waterworks_geom::Vec3;

// Spatial grid
pub const GRID_CELL_SIZE: f32 = 4.0;
pub(crate) const SEARCH_RADIUS: f32 = 1.2; // horizontal neighbor search beyond the bounds
pub(crate) const VERTICAL_MAX: f32 = 1.25;
pub(crate) const VERTICAL_SEARCH_PAD: f32 = 0.5; // added to VERTICAL_MAX for queries

// Connectors
pub const CONNECTION_GAP_MAX: f32 = 1.0;
pub const GAP_VISUAL_MIN: f32 = 0.06;
pub const SURFACE_Y_OFFSET: f32 = 0.01;
pub const EDGE_OVERLAP: f32 = 0.03;
pub const BRIDGE_MIN_OVERLAP: f32 = 0.05;
pub const CONNECTION_MIN_OVERLAP: f32 = 0.2;
pub const LEVEL_TOLERANCE: f32 = 0.25;
pub const SQUARE_TOLERANCE: f32 = 0.15;
pub const ANGLE_TOLERANCE_DEG: f32 = 12.0;
pub(crate) const CONNECTOR_MIN_SIZE: f32 = 0.1;
pub(crate) const CONNECTOR_TRIGGER_HEIGHT: f32 = 0.5;
pub(crate) const WALL_THICKNESS: f32 = 0.25;
pub(crate) const CASCADE_SEGMENTS: usize = 8;
pub(crate) const CASCADE_DEPTH_SCALE: f32 = 0.45;
pub(crate) const CASCADE_DEPTH_MIN: f32 = 0.08;
pub(crate) const CASCADE_DEPTH_MAX: f32 = 0.6;

// Clusters
pub(crate) const CLUSTER_EDGE_OVERLAP: f32 = 0.01;
pub(crate) const CLUSTER_ADJACENCY_TOLERANCE: f32 = 0.35; // fraction of tile size
pub(crate) const CURTAIN_SEGMENTS: usize = 6;
pub(crate) const CURTAIN_NEIGHBOR_OVERLAP: f32 = 0.35;
pub(crate) const CURTAIN_MIN_HEIGHT: f32 = 0.08;
pub const SUPPORT_LIMIT: usize = 100;
pub(crate) const CLUSTER_CACHE_TTL: f64 = 0.5;

// Rebuild timers
pub(crate) const BOUNDS_REFRESH_INTERVAL: f32 = 0.5;
pub(crate) const CONNECTION_REBUILD_INTERVAL: f32 = 0.4;
pub(crate) const CLUSTER_REBUILD_INTERVAL: f32 = 0.5;
pub(crate) const HIGHLIGHT_INTERVAL: f32 = 0.1;
pub(crate) const LIQUID_CHECK_INTERVAL: f32 = 0.25;

// Change detection
pub(crate) const MOVE_EPSILON: f32 = 0.05;
pub(crate) const ROTATE_EPSILON_DEG: f32 = 1.0;
pub(crate) const SCALE_EPSILON: f32 = 0.02;
pub(crate) const SURFACE_EPSILON: f32 = 0.05;
pub(crate) const SIZE_EPSILON: f32 = 0.05;

// Bounds normalization
pub(crate) const FALLBACK_TILE_SIZE: Vec3 = Vec3::new(2.0, 0.2, 2.0);
pub(crate) const DEGENERATE_SIZE_SQ: f32 = 1e-4;
pub(crate) const HORIZONTAL_SIZE_MIN: f32 = 0.25;
pub(crate) const HORIZONTAL_SIZE_MAX: f32 = 50.0;
pub(crate) const VERTICAL_SIZE_MIN: f32 = 0.05;
pub(crate) const VERTICAL_SIZE_MAX: f32 = 10.0;
pub(crate) const CENTER_SNAP_MIN: f32 = 0.5;
pub(crate) const PIVOT_XZ_SNAP: f32 = 0.5;
pub(crate) const SURFACE_PIVOT_MIN: f32 = 1.0;
pub(crate) const PADDED_SIZE_MIN: f32 = 0.05;
pub(crate) const PADDING_EPSILON: f32 = 1e-4;

// Volume
pub(crate) const VOLUME_DEPTH_BASE: f32 = 3.0; // added to the raw bounds height
pub(crate) const VOLUME_DEPTH_MIN: f32 = 0.1;
pub(crate) const ABOVE_SURFACE_FALLBACK: f32 = 0.5; // when the configured allowance is not positive

// Highlight
pub(crate) const HIGHLIGHT_INSET: f32 = 0.005;
pub const HIGHLIGHT_DISTANCE: f32 = 6.0;

// Grass/terrain refresh margin around a destroyed tile
pub(crate) const TERRAIN_REFRESH_MARGIN: f32 = 4.0;
