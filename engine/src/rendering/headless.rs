use ahash::AHashMap;

use crate::{
    mesh_generation::chunk_mesh::ChunkMeshData, rendering::gpu_backend::GpuBackend,
    voxels::coord::ChunkPos,
};

/// A `GpuBackend` that keeps meshes in memory and counts what it is asked to do.
/// Used by the headless client and by tests.
#[derive(Debug, Default)]
pub struct HeadlessGpuBackend {
    next_handle: u64,
    live: AHashMap<u64, LiveMesh>,
    pub uploads: u64,
    pub releases: u64,
    pub draws: u64,
    pub uploaded_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveMesh {
    pub position: ChunkPos,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeadlessHandle(u64);

impl HeadlessGpuBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_meshes(&self) -> impl Iterator<Item = &LiveMesh> + '_ {
        self.live.values()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_bytes(&self) -> u64 {
        self.live.values().map(|mesh| mesh.size_bytes).sum()
    }
}

impl GpuBackend for HeadlessGpuBackend {
    type Handle = HeadlessHandle;

    fn upload(&mut self, mesh: &ChunkMeshData) -> HeadlessHandle {
        let id = self.next_handle;
        self.next_handle += 1;

        let size_bytes = mesh.as_bytes().len() as u64;
        self.live.insert(
            id,
            LiveMesh {
                position: mesh.position,
                size_bytes,
            },
        );
        self.uploads += 1;
        self.uploaded_bytes += size_bytes;
        HeadlessHandle(id)
    }

    fn release(&mut self, handle: HeadlessHandle) {
        let removed = self.live.remove(&handle.0);
        assert!(removed.is_some(), "Released unknown mesh handle {:?}", handle);
        self.releases += 1;
    }

    fn draw(&mut self, handle: &HeadlessHandle, position: ChunkPos) {
        let Some(mesh) = self.live.get(&handle.0) else {
            panic!("Drew released mesh handle {:?}", handle);
        };
        assert_eq!(mesh.position, position, "Handle drawn at the wrong position");
        self.draws += 1;
    }
}
