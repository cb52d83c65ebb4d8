use ahash::AHashMap;
use thiserror::Error;

use crate::{
    voxels::{chunk::ChunkData, coord::ChunkPos},
    worldgen::WorldGenerator,
};

#[derive(Debug, Error)]
pub enum ChunkLoadError {
    /// The chunk was never stored and has to be generated
    #[error("chunk {0:?} not found in storage")]
    NotFound(ChunkPos),
    #[error("failed to read chunk {pos:?}: {message}")]
    Corrupt { pos: ChunkPos, message: String },
}

/// Where the loader gets chunk data from. Only ever called from the loader thread.
pub trait WorldStorage: Send + 'static {
    fn load_chunk(&mut self, pos: ChunkPos) -> Result<ChunkData, ChunkLoadError>;

    fn generate_chunk(&mut self, pos: ChunkPos) -> ChunkData;

    /// Hint that every chunk in the inclusive box is about to be requested.
    fn prepare_region(&mut self, _min: ChunkPos, _max: ChunkPos) {}
}

/// Storage with nothing persisted: every chunk comes from the generator.
pub struct GeneratedWorldStorage<G: WorldGenerator> {
    generator: G,
}

impl<G: WorldGenerator> GeneratedWorldStorage<G> {
    pub fn new(generator: G) -> Self {
        GeneratedWorldStorage { generator }
    }
}

impl<G: WorldGenerator> WorldStorage for GeneratedWorldStorage<G> {
    fn load_chunk(&mut self, pos: ChunkPos) -> Result<ChunkData, ChunkLoadError> {
        Err(ChunkLoadError::NotFound(pos))
    }

    fn generate_chunk(&mut self, pos: ChunkPos) -> ChunkData {
        self.generator.generate_chunk(pos)
    }
}

/// Chunks kept in memory, falling back to a generator for everything else.
pub struct MemoryWorldStorage<G: WorldGenerator> {
    chunks: AHashMap<ChunkPos, ChunkData>,
    generator: G,
    loads: usize,
    generations: usize,
}

impl<G: WorldGenerator> MemoryWorldStorage<G> {
    pub fn new(generator: G) -> Self {
        MemoryWorldStorage {
            chunks: AHashMap::new(),
            generator,
            loads: 0,
            generations: 0,
        }
    }

    pub fn insert(&mut self, pos: ChunkPos, data: ChunkData) {
        self.chunks.insert(pos, data);
    }

    pub fn loads(&self) -> usize {
        self.loads
    }

    pub fn generations(&self) -> usize {
        self.generations
    }
}

impl<G: WorldGenerator> WorldStorage for MemoryWorldStorage<G> {
    fn load_chunk(&mut self, pos: ChunkPos) -> Result<ChunkData, ChunkLoadError> {
        let chunk = self
            .chunks
            .get(&pos)
            .cloned()
            .ok_or(ChunkLoadError::NotFound(pos))?;
        self.loads += 1;
        Ok(chunk)
    }

    fn generate_chunk(&mut self, pos: ChunkPos) -> ChunkData {
        self.generations += 1;
        let chunk = self.generator.generate_chunk(pos);
        self.chunks.insert(pos, chunk.clone());
        chunk
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkSource {
    Storage,
    Generated,
}

/// Loads a chunk, generating it when storage doesn't have it.
pub fn load_or_generate(storage: &mut dyn WorldStorage, pos: ChunkPos) -> (ChunkData, ChunkSource) {
    match storage.load_chunk(pos) {
        Ok(chunk) => (chunk, ChunkSource::Storage),
        Err(ChunkLoadError::NotFound(_)) => (storage.generate_chunk(pos), ChunkSource::Generated),
        Err(e) => {
            log::error!("{}, regenerating", e);
            (storage.generate_chunk(pos), ChunkSource::Generated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        voxels::voxel::Voxel,
        worldgen::test_world_generators::FlatWorldGenerator,
    };

    #[test]
    fn test_memory_storage_generates_once() {
        let mut storage = MemoryWorldStorage::new(FlatWorldGenerator::new(0));
        let pos = ChunkPos::new(0, -1, 0);

        let (first, first_source) = load_or_generate(&mut storage, pos);
        let (second, second_source) = load_or_generate(&mut storage, pos);
        assert_eq!(first_source, ChunkSource::Generated);
        assert_eq!(second_source, ChunkSource::Storage);
        assert_eq!(first.voxels[..], second.voxels[..]);
        assert_eq!(storage.generations(), 1);
        assert_eq!(storage.loads(), 1);
    }

    #[test]
    fn test_stored_chunks_win_over_generation() {
        let mut storage = MemoryWorldStorage::new(FlatWorldGenerator::new(0));
        let pos = ChunkPos::new(0, 5, 0);
        storage.insert(pos, ChunkData::solid(Voxel::DIRT));

        let (chunk, source) = load_or_generate(&mut storage, pos);
        assert_eq!(source, ChunkSource::Storage);
        assert!(chunk.voxels.iter().all(|voxel| *voxel == Voxel::DIRT));
        assert_eq!(storage.generations(), 0);
    }

    struct CorruptStorage;

    impl WorldStorage for CorruptStorage {
        fn load_chunk(&mut self, pos: ChunkPos) -> Result<ChunkData, ChunkLoadError> {
            Err(ChunkLoadError::Corrupt {
                pos,
                message: "bad checksum".to_string(),
            })
        }

        fn generate_chunk(&mut self, _pos: ChunkPos) -> ChunkData {
            ChunkData::solid(Voxel::STONE)
        }
    }

    #[test]
    fn test_corrupt_chunks_are_regenerated() {
        let (chunk, source) = load_or_generate(&mut CorruptStorage, ChunkPos::ZERO);
        assert_eq!(source, ChunkSource::Generated);
        assert!(!chunk.is_empty());
    }
}
