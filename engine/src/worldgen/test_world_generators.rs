use crate::{
    voxels::{chunk::ChunkData, coord::ChunkPos, voxel::Voxel},
    worldgen::WorldGenerator,
};

/// Stone below y = 0, air above. `seed` is ignored.
pub struct FlatWorldGenerator;

impl WorldGenerator for FlatWorldGenerator {
    fn new(_seed: u32) -> Self {
        FlatWorldGenerator
    }

    fn generate_chunk(&self, chunk_pos: ChunkPos) -> ChunkData {
        let mut chunk = ChunkData::empty();
        chunk.fill_where(chunk_pos.origin(), |pos| {
            (pos.0.y < 0).then_some(Voxel::STONE)
        });
        chunk
    }
}

/// Every voxel whose coordinates sum to an even number is solid.
/// Produces the largest possible number of faces per chunk.
pub struct TortureTestWorldGenerator;

impl WorldGenerator for TortureTestWorldGenerator {
    fn new(_seed: u32) -> Self {
        TortureTestWorldGenerator
    }

    fn generate_chunk(&self, chunk_pos: ChunkPos) -> ChunkData {
        let mut chunk = ChunkData::empty();
        chunk.fill_where(chunk_pos.origin(), |pos| {
            ((pos.0.x + pos.0.y + pos.0.z).rem_euclid(2) == 0).then_some(Voxel::GRASS)
        });
        chunk
    }
}

/// Nothing but air.
pub struct EmptyWorldGenerator;

impl WorldGenerator for EmptyWorldGenerator {
    fn new(_seed: u32) -> Self {
        EmptyWorldGenerator
    }

    fn generate_chunk(&self, _chunk_pos: ChunkPos) -> ChunkData {
        ChunkData::empty()
    }
}
