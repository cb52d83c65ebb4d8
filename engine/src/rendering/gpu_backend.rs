use crate::{mesh_generation::chunk_mesh::ChunkMeshData, voxels::coord::ChunkPos};

/// The GPU side of mesh streaming. Only ever called from the thread that owns the
/// `MeshRenderer`.
pub trait GpuBackend {
    type Handle;

    fn upload(&mut self, mesh: &ChunkMeshData) -> Self::Handle;
    fn release(&mut self, handle: Self::Handle);
    fn draw(&mut self, handle: &Self::Handle, position: ChunkPos);
}

#[derive(Debug)]
pub struct MeshRecord<H> {
    pub handle: H,
    pub face_count: u32,
    pub position: ChunkPos,
}
