use std::ops::{Add, Sub};

use glam::{IVec3, U8Vec3, Vec3};

use crate::voxels::chunk::CHUNK_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// A position of a voxel within a chunk
pub struct LocalPos(pub U8Vec3);

impl LocalPos {
    pub fn new(x: u8, y: u8, z: u8) -> Self {
        if x >= CHUNK_SIZE || y >= CHUNK_SIZE || z >= CHUNK_SIZE {
            panic!("LocalPos out of bounds: ({}, {}, {})", x, y, z);
        }
        LocalPos(U8Vec3 { x, y, z })
    }

    /// Linear index into chunk data, which is stored in YZX order
    pub fn to_chunk_data_index(&self) -> usize {
        let size = CHUNK_SIZE as usize;
        (self.0.y as usize * size * size) + (self.0.z as usize * size) + self.0.x as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
/// Coordinates identifying a chunk (or a mesh cell) on the world grid.
/// World coordinates divided by chunk size and floored.
pub struct ChunkPos(pub IVec3);

impl ChunkPos {
    pub const ZERO: ChunkPos = ChunkPos(IVec3::ZERO);

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        ChunkPos(IVec3 { x, y, z })
    }

    pub fn x(&self) -> i32 {
        self.0.x
    }

    pub fn y(&self) -> i32 {
        self.0.y
    }

    pub fn z(&self) -> i32 {
        self.0.z
    }

    pub fn origin(&self) -> WorldPos {
        WorldPos(self.0 * IVec3::splat(CHUNK_SIZE as i32))
    }

    pub fn distance_squared(&self, other: ChunkPos) -> i32 {
        (self.0 - other.0).length_squared()
    }

    pub fn min(&self, other: ChunkPos) -> ChunkPos {
        ChunkPos(self.0.min(other.0))
    }

    pub fn max(&self, other: ChunkPos) -> ChunkPos {
        ChunkPos(self.0.max(other.0))
    }

    /// The eight chunks a mesh cell at this position overlaps, in {0,1}³ order (x outermost).
    pub fn mesh_dependencies(&self) -> [ChunkPos; 8] {
        let mut dependencies = [*self; 8];
        for (i, dependency) in dependencies.iter_mut().enumerate() {
            let offset = IVec3::new((i >> 2) as i32 & 1, (i >> 1) as i32 & 1, i as i32 & 1);
            *dependency = ChunkPos(self.0 + offset);
        }
        dependencies
    }
}

impl Add for ChunkPos {
    type Output = ChunkPos;

    fn add(self, other: ChunkPos) -> ChunkPos {
        ChunkPos(self.0 + other.0)
    }
}

impl Sub for ChunkPos {
    type Output = ChunkPos;

    fn sub(self, other: ChunkPos) -> ChunkPos {
        ChunkPos(self.0 - other.0)
    }
}

impl From<IVec3> for ChunkPos {
    fn from(value: IVec3) -> Self {
        ChunkPos(value)
    }
}

/// A position of a voxel in world space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorldPos(pub IVec3);

impl WorldPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        WorldPos(IVec3 { x, y, z })
    }

    pub fn to_chunk_pos(&self) -> ChunkPos {
        ChunkPos(self.0.div_euclid(IVec3::splat(CHUNK_SIZE as i32)))
    }

    pub fn to_local_pos(&self) -> LocalPos {
        LocalPos(self.0.rem_euclid(IVec3::splat(CHUNK_SIZE as i32)).as_u8vec3())
    }
}

impl Add for WorldPos {
    type Output = WorldPos;

    fn add(self, other: WorldPos) -> WorldPos {
        WorldPos(self.0 + other.0)
    }
}

impl Sub for WorldPos {
    type Output = WorldPos;

    fn sub(self, other: WorldPos) -> WorldPos {
        WorldPos(self.0 - other.0)
    }
}

/// A floating point position in world space, such as the observer's eye
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorldPosF(pub Vec3);

impl WorldPosF {
    pub fn to_world_pos(&self) -> WorldPos {
        WorldPos(self.0.floor().as_ivec3())
    }

    pub fn to_chunk_pos(&self) -> ChunkPos {
        self.to_world_pos().to_chunk_pos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_world_pos_floors_to_chunk() {
        let pos = WorldPos::new(-1, 0, CHUNK_SIZE as i32);
        assert_eq!(pos.to_chunk_pos(), ChunkPos::new(-1, 0, 1));
        assert_eq!(pos.to_local_pos(), LocalPos::new(CHUNK_SIZE - 1, 0, 0));
    }

    #[test]
    fn test_float_position_to_chunk() {
        let eye = WorldPosF(Vec3::new(-0.5, 17.0, 31.9));
        assert_eq!(eye.to_chunk_pos(), ChunkPos::new(-1, 1, 1));
    }

    #[test]
    fn test_mesh_dependencies_cover_forward_cube() {
        let deps = ChunkPos::new(2, -3, 5).mesh_dependencies();
        assert_eq!(deps[0], ChunkPos::new(2, -3, 5));
        assert_eq!(deps[7], ChunkPos::new(3, -2, 6));

        let mut unique = deps.to_vec();
        unique.sort_by_key(|pos| (pos.x(), pos.y(), pos.z()));
        unique.dedup();
        assert_eq!(unique.len(), 8);
    }
}
