use glam::IVec3;

use crate::voxels::{
    chunk::{CHUNK_SIZE, ChunkData},
    coord::{ChunkPos, WorldPos},
    voxel::Voxel,
};

/// Mesh cells are shifted by half a chunk on every axis, so a cell and its one-voxel border
/// always lie within the eight chunks at `position + {0,1}³`.
pub const MESH_OFFSET: i32 = CHUNK_SIZE as i32 / 2;

/// Everything from the world required to mesh one cell: read-only views of the eight chunks
/// it overlaps, in `ChunkPos::mesh_dependencies` order.
pub struct ChunkMeshGeneratorInput<'a> {
    pub position: ChunkPos,
    chunks: [&'a ChunkData; 8],
}

impl<'a> ChunkMeshGeneratorInput<'a> {
    pub fn new(position: ChunkPos, chunks: [&'a ChunkData; 8]) -> Self {
        ChunkMeshGeneratorInput { position, chunks }
    }

    /// Builds the input from a lookup, returning None if any dependency is missing.
    pub fn try_from_lookup(
        position: ChunkPos,
        mut lookup: impl FnMut(ChunkPos) -> Option<&'a ChunkData>,
    ) -> Option<Self> {
        let dependencies = position.mesh_dependencies();
        let mut chunks = [lookup(dependencies[0])?; 8];
        for (chunk, dependency) in chunks.iter_mut().zip(dependencies).skip(1) {
            *chunk = lookup(dependency)?;
        }
        Some(Self::new(position, chunks))
    }

    /// The world position of the cell's local (0, 0, 0) voxel
    pub fn cell_origin(&self) -> WorldPos {
        WorldPos(self.position.origin().0 + IVec3::splat(MESH_OFFSET))
    }

    /// Reads a voxel relative to the cell origin. Valid for -1..=CHUNK_SIZE on every axis.
    pub fn get_voxel(&self, local: IVec3) -> Voxel {
        let world = WorldPos(self.cell_origin().0 + local);
        let offset = world.to_chunk_pos().0 - self.position.0;
        assert!(
            offset.cmpge(IVec3::ZERO).all() && offset.cmple(IVec3::ONE).all(),
            "Voxel {:?} is outside the mesh input of {:?}",
            local,
            self.position
        );
        let index = (offset.x * 4 + offset.y * 2 + offset.z) as usize;
        self.chunks[index].get_voxel(world.to_local_pos())
    }
}
