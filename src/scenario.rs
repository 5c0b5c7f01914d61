//! Scenario files: tiles to place and scripted edits, loaded from TOML.

use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

use waterworks_tiles::{Aabb, ElementRole, Pose, TileElement, TileSpec, Vec3};

#[derive(Clone, Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub tiles: Vec<TileDef>,
    #[serde(default)]
    pub moves: Vec<MoveDef>,
    #[serde(default)]
    pub removals: Vec<RemovalDef>,
    #[serde(default)]
    pub probes: Vec<ProbeDef>,
    #[serde(default)]
    pub observer: Option<ObserverDef>,
    #[serde(default)]
    pub terrain: TerrainDef,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TileDef {
    pub pos: [f32; 3],
    #[serde(default)]
    pub yaw: f32,
    #[serde(default = "default_size")]
    pub size: [f32; 3],
    /// Extra solid collider stacked under the slab, e.g. a basin wall.
    #[serde(default)]
    pub collider_depth: Option<f32>,
}

fn default_size() -> [f32; 3] {
    [2.0, 0.2, 2.0]
}

/// Moves tile number `tile` (1-based, in file order) once the clock reaches `at`.
#[derive(Clone, Debug, Deserialize)]
pub struct MoveDef {
    pub at: f64,
    pub tile: usize,
    pub pos: [f32; 3],
    #[serde(default)]
    pub yaw: Option<f32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RemovalDef {
    pub at: f64,
    pub tile: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProbeDef {
    pub name: String,
    pub pos: [f32; 3],
}

#[derive(Clone, Debug, Deserialize)]
pub struct ObserverDef {
    pub pos: [f32; 3],
    #[serde(default)]
    pub build_mode: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TerrainDef {
    #[serde(default = "default_seed")]
    pub seed: i32,
    #[serde(default = "default_base_height")]
    pub base_height: f32,
    #[serde(default = "default_amplitude")]
    pub amplitude: f32,
    #[serde(default = "default_frequency")]
    pub frequency: f32,
}

fn default_seed() -> i32 {
    1337
}
fn default_base_height() -> f32 {
    -2.0
}
fn default_amplitude() -> f32 {
    1.5
}
fn default_frequency() -> f32 {
    0.05
}

impl Default for TerrainDef {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            base_height: default_base_height(),
            amplitude: default_amplitude(),
            frequency: default_frequency(),
        }
    }
}

#[inline]
pub fn vec3(v: [f32; 3]) -> Vec3 {
    Vec3::new(v[0], v[1], v[2])
}

impl TileDef {
    pub fn spec(&self) -> TileSpec {
        let pose = Pose::new(vec3(self.pos), self.yaw);
        let size = vec3(self.size);
        let mut spec = TileSpec::slab(pose, size);
        if let Some(depth) = self.collider_depth.filter(|d| *d > 0.0) {
            let local = Aabb::new(
                Vec3::new(-size.x * 0.5, -size.y - depth, -size.z * 0.5),
                Vec3::new(size.x * 0.5, -size.y, size.z * 0.5),
            );
            spec.elements.push(TileElement::new(local, ElementRole::SolidCollider));
        }
        spec
    }
}

impl Scenario {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let s: Scenario = toml::from_str(toml_str)?;
        for m in &s.moves {
            check_index(m.tile, s.tiles.len())?;
        }
        for r in &s.removals {
            check_index(r.tile, s.tiles.len())?;
        }
        Ok(s)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }
}

fn check_index(tile: usize, count: usize) -> Result<(), Box<dyn Error>> {
    if tile == 0 || tile > count {
        return Err(format!("tile index {} out of range 1..={}", tile, count).into());
    }
    Ok(())
}
