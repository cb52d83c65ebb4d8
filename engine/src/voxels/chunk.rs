use crate::voxels::{
    coord::{LocalPos, WorldPos},
    voxel::Voxel,
};

pub const CHUNK_SIZE: u8 = 16;

pub const CHUNK_VOLUME: usize = (CHUNK_SIZE as usize).pow(3);

/// Raw block array of a single chunk, stored in YZX order.
#[derive(Clone)]
pub struct ChunkData {
    pub voxels: Box<[Voxel; CHUNK_VOLUME]>,
}

impl ChunkData {
    pub fn empty() -> Self {
        Self::solid(Voxel::AIR)
    }

    pub fn solid(voxel: Voxel) -> Self {
        ChunkData {
            voxels: Box::new([voxel; CHUNK_VOLUME]),
        }
    }

    pub fn get_voxel(&self, pos: LocalPos) -> Voxel {
        self.voxels[pos.to_chunk_data_index()]
    }

    pub fn set_voxel(&mut self, pos: LocalPos, voxel: Voxel) {
        self.voxels[pos.to_chunk_data_index()] = voxel;
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.iter().all(Voxel::is_air)
    }

    /// Fills every voxel whose world position satisfies the predicate.
    pub fn fill_where(
        &mut self,
        origin: WorldPos,
        mut predicate: impl FnMut(WorldPos) -> Option<Voxel>,
    ) {
        for y in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                for x in 0..CHUNK_SIZE {
                    let local = LocalPos::new(x, y, z);
                    let world = origin + WorldPos::new(x as i32, y as i32, z as i32);
                    if let Some(voxel) = predicate(world) {
                        self.set_voxel(local, voxel);
                    }
                }
            }
        }
    }
}

impl Default for ChunkData {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for ChunkData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let solid = self.voxels.iter().filter(|voxel| voxel.is_opaque()).count();
        f.debug_struct("ChunkData")
            .field("solid_voxels", &solid)
            .finish()
    }
}
