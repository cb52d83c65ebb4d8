use glam::{DVec2, Vec3Swizzles};
use noise::{NoiseFn, SuperSimplex};

use crate::{
    voxels::{
        chunk::{CHUNK_SIZE, ChunkData},
        coord::{ChunkPos, LocalPos},
        voxel::Voxel,
    },
    worldgen::world_generator::WorldGenerator,
};

/// Rolling terrain from a 2D SuperSimplex heightmap
pub struct NoiseWorldGenerator {
    noise: SuperSimplex,
}

const HORIZONTAL_SCALE: f64 = 0.01;
const HEIGHT_SCALE: f64 = 32.0;
const DIRT_DEPTH: i32 = 3;

impl NoiseWorldGenerator {
    pub fn height_at(&self, x: i32, z: i32) -> i32 {
        let pos = DVec2::new(x as f64, z as f64) * HORIZONTAL_SCALE;
        (self.noise.get(pos.to_array()) * HEIGHT_SCALE) as i32
    }
}

impl WorldGenerator for NoiseWorldGenerator {
    fn new(seed: u32) -> Self {
        Self {
            noise: SuperSimplex::new(seed),
        }
    }

    fn generate_chunk(&self, chunk_pos: ChunkPos) -> ChunkData {
        let mut chunk = ChunkData::empty();
        let origin = chunk_pos.origin().0;

        // Entirely above the highest possible terrain
        if origin.y > HEIGHT_SCALE as i32 {
            return chunk;
        }

        for x in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                let column = origin.xz() + glam::IVec2::new(x as i32, z as i32);
                let height = self.height_at(column.x, column.y);

                for y in 0..CHUNK_SIZE {
                    let world_y = origin.y + y as i32;

                    let voxel = if world_y < height - DIRT_DEPTH {
                        Voxel::STONE
                    } else if world_y < height {
                        Voxel::DIRT
                    } else if world_y == height {
                        Voxel::GRASS
                    } else {
                        // Air from now on
                        break;
                    };

                    chunk.set_voxel(LocalPos::new(x, y, z), voxel);
                }
            }
        }

        chunk
    }
}
