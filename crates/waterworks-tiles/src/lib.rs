//! Water tile bookkeeping: spatial grid, adjacency clusters, connector planning,
//! debounced rebuilds and point-in-water queries.
//!
//! Everything runs on the caller's thread; `WaterWorld::tick` is the only driver.
#![forbid(unsafe_code)]

pub mod bounds;
pub mod cluster;
pub mod config;
pub mod connector;
pub mod constants;
pub mod error;
pub mod highlight;
pub mod immersion;
pub mod mesh_store;
pub mod scheduler;
pub mod spatial;
mod surface;
pub mod tile;
pub mod world;

pub use bounds::{TransformSnapshot, VolumeMetrics};
pub use cluster::{ClusterCount, ClusterScan, Footprint, tiles_adjacent};
pub use config::{FeatureFlags, WaterConfig};
pub use connector::{Axis, Connector, ConnectorKind, ConnectorSet};
pub use error::TileError;
pub use highlight::Observer;
pub use immersion::{LiquidChange, LiquidTracker, TerrainHeight};
pub use mesh_store::{MeshId, MeshStore, MeshStoreStats};
pub use scheduler::RebuildState;
pub use spatial::{CellCoord, SpatialIndex};
pub use tile::{ElementRole, Pose, Tile, TileElement, TileId, TileSpec};
pub use world::{TerrainRefresh, WaterWorld, WorldStats};

pub use waterworks_geom::{Aabb, Vec3};
pub use waterworks_mesh::{MeshBuild, MeshKind, SyntheticMesh};
