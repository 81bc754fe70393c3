use glam::IVec3;
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use crate::world::block::{self, Block};

/// A source of world blocks for chunk reloads. Must be pure and
/// deterministic: the same position always yields the same block, with no
/// side effects, so reloading a chunk twice is harmless.
pub trait TerrainSource {
    fn block_at(&self, pos: IVec3) -> Block;
}

/// Closures work as terrain sources, which keeps test worlds one-liners.
impl<F> TerrainSource for F
where
    F: Fn(IVec3) -> Block,
{
    fn block_at(&self, pos: IVec3) -> Block {
        self(pos)
    }
}

pub const SEA_LEVEL: i32 = -5;
/// Mean dirt-layer thickness and its noise-driven variation.
const DIRT_MID: i32 = 6;
const DIRT_VAR: f64 = 5.0;
const HEIGHT_SCALE: f64 = 24.0;
const NOISE_SCALE: f64 = 96.0;

/// Default height-field generator: fractal surface height around z = 0,
/// water filling everything below sea level, a dirt band of varying depth
/// under the surface and stone beneath.
pub struct NoiseTerrain {
    height: Fbm<Perlin>,
    dirt: Fbm<Perlin>,
}

impl NoiseTerrain {
    pub fn new(seed: u32) -> Self {
        let height = Fbm::<Perlin>::new(seed)
            .set_frequency(1.0)
            .set_persistence(0.45)
            .set_octaves(5);
        let dirt = Fbm::<Perlin>::new(seed.wrapping_add(1))
            .set_frequency(0.6)
            .set_octaves(2);

        Self { height, dirt }
    }

    /// Surface height and dirt depth of a column; z plays no part.
    fn column(&self, x: i32, y: i32) -> (i32, i32) {
        let nx = x as f64 / NOISE_SCALE;
        let ny = y as f64 / NOISE_SCALE;
        let surface = (self.height.get([nx, ny]) * HEIGHT_SCALE) as i32;
        let dirt = DIRT_MID + (self.dirt.get([nx, ny]) * DIRT_VAR) as i32;
        (surface, dirt.max(1))
    }
}

impl TerrainSource for NoiseTerrain {
    fn block_at(&self, pos: IVec3) -> Block {
        let (surface, dirt) = self.column(pos.x, pos.y);
        if pos.z > surface {
            if pos.z > SEA_LEVEL {
                block::AIR
            } else {
                block::WATER
            }
        } else if pos.z == surface {
            if pos.z >= SEA_LEVEL {
                block::GRASS
            } else {
                block::DIRT
            }
        } else if surface - pos.z < dirt {
            block::DIRT
        } else {
            block::STONE
        }
    }
}
