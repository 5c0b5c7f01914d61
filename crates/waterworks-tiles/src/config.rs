use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

/// Runtime tuning for every placed water tile. Read again on each rebuild.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct WaterConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Vertical offset applied to every computed surface height.
    #[serde(default)]
    pub surface_offset: f32,
    /// Minimum depth of the water volume below the surface.
    #[serde(default = "default_water_depth")]
    pub water_depth: f32,
    /// Horizontal padding added to each side of a tile footprint (negative shrinks).
    #[serde(default = "default_surface_padding")]
    pub surface_padding: f32,
    #[serde(default = "default_terrain_influence_radius")]
    pub terrain_influence_radius: f32,
    #[serde(default = "default_terrain_influence_max_depth")]
    pub terrain_influence_max_depth: f32,
    /// How far above the surface a point still counts as immersed.
    #[serde(default = "default_above_surface")]
    pub player_check_above_surface: f32,
    /// Minimum drop of a curtain hanging off an open cluster edge.
    #[serde(default = "default_curtain_min_depth")]
    pub curtain_min_depth: f32,
    #[serde(default)]
    pub features: FeatureFlags,
}

fn default_enabled() -> bool {
    true
}
fn default_water_depth() -> f32 {
    3.0
}
fn default_surface_padding() -> f32 {
    -0.010_504_2
}
fn default_terrain_influence_radius() -> f32 {
    1.0
}
fn default_terrain_influence_max_depth() -> f32 {
    3.0
}
fn default_above_surface() -> f32 {
    1.0
}
fn default_curtain_min_depth() -> f32 {
    10.0
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            surface_offset: 0.0,
            water_depth: default_water_depth(),
            surface_padding: default_surface_padding(),
            terrain_influence_radius: default_terrain_influence_radius(),
            terrain_influence_max_depth: default_terrain_influence_max_depth(),
            player_check_above_surface: default_above_surface(),
            curtain_min_depth: default_curtain_min_depth(),
            features: FeatureFlags::default(),
        }
    }
}

/// Which connector strategies are active.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Merge each cluster into one surface owned by its lowest-id tile.
    #[serde(default = "default_true")]
    pub cluster_surfaces: bool,
    /// Hang curtains off open cluster edges.
    #[serde(default = "default_true")]
    pub cluster_curtains: bool,
    /// Face-to-face cascades between tiles at different heights.
    #[serde(default)]
    pub cascades: bool,
    /// Clusters also require matching yaw (square footprints exempt).
    #[serde(default)]
    pub strict_cluster_yaw: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            cluster_surfaces: true,
            cluster_curtains: true,
            cascades: false,
            strict_cluster_yaw: false,
        }
    }
}

impl WaterConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: WaterConfig = toml::from_str(toml_str)?;
        Ok(cfg.sanitized())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    /// Clamps every value into its accepted range; non-finite values fall back to defaults.
    pub fn sanitized(self) -> Self {
        let d = WaterConfig::default();
        let fix = |v: f32, fallback: f32, lo: f32, hi: f32| {
            if v.is_finite() { v.clamp(lo, hi) } else { fallback }
        };
        Self {
            enabled: self.enabled,
            surface_offset: fix(self.surface_offset, d.surface_offset, -5.0, 5.0),
            water_depth: fix(self.water_depth, d.water_depth, 0.5, 20.0),
            surface_padding: fix(self.surface_padding, d.surface_padding, -2.0, 0.5),
            terrain_influence_radius: fix(
                self.terrain_influence_radius,
                d.terrain_influence_radius,
                0.0,
                3.0,
            ),
            terrain_influence_max_depth: fix(
                self.terrain_influence_max_depth,
                d.terrain_influence_max_depth,
                0.1,
                20.0,
            ),
            player_check_above_surface: fix(
                self.player_check_above_surface,
                d.player_check_above_surface,
                0.0,
                5.0,
            ),
            curtain_min_depth: fix(self.curtain_min_depth, d.curtain_min_depth, 0.5, 30.0),
            features: self.features,
        }
    }
}
