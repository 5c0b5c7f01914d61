use fastnoise_lite::{FastNoiseLite, NoiseType};

use waterworks_tiles::TerrainHeight;

use crate::scenario::TerrainDef;

/// Rolling ground under the scenario, sampled from 2D simplex noise.
pub struct NoiseTerrain {
    noise: FastNoiseLite,
    base_height: f32,
    amplitude: f32,
}

impl NoiseTerrain {
    pub fn new(def: &TerrainDef) -> Self {
        let mut noise = FastNoiseLite::with_seed(def.seed);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(def.frequency));
        Self {
            noise,
            base_height: def.base_height,
            amplitude: def.amplitude,
        }
    }
}

impl TerrainHeight for NoiseTerrain {
    fn height_at(&self, x: f32, z: f32) -> Option<f32> {
        let h = self.base_height + self.noise.get_noise_2d(x, z) * self.amplitude;
        h.is_finite().then_some(h)
    }
}
