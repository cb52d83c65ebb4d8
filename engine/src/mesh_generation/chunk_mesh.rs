use bytemuck::{Pod, Zeroable};
use glam::U8Vec3;

use crate::voxels::{coord::ChunkPos, face::Face};

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, PartialEq, Eq, Debug)]
/// A voxel face packed into 6 bytes (48 bits).
/// Stored as a byte array to avoid padding & alignment issues.
///
/// Layout:
/// - Bytes 0-1: Geometry data (16 bits, little-endian)
///   - bits 0-3:   position.x (0-15)
///   - bits 4-7:   position.y (0-15)
///   - bits 8-11:  position.z (0-15)
///   - bits 12-14: face_id (0-5)
/// - Bytes 2-3: Reserved, zero
/// - Bytes 4-5: Block type (16 bits, little-endian)
pub struct PackedVoxelFace {
    bytes: [u8; 6],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoxelFace {
    /// Position within the mesh cell
    pub position: U8Vec3,
    pub face_direction: Face,
    pub block_type: u16,
}

impl From<VoxelFace> for PackedVoxelFace {
    fn from(value: VoxelFace) -> Self {
        let mut geometry = 0u16;
        geometry |= (value.position.x as u16) & 0xF;
        geometry |= ((value.position.y as u16) & 0xF) << 4;
        geometry |= ((value.position.z as u16) & 0xF) << 8;
        geometry |= ((value.face_direction as u16) & 0x7) << 12;

        let mut bytes = [0u8; 6];
        bytes[0..2].copy_from_slice(&geometry.to_le_bytes());
        bytes[4..6].copy_from_slice(&value.block_type.to_le_bytes());
        PackedVoxelFace { bytes }
    }
}

impl PackedVoxelFace {
    /// Should only be used for debugging and tests.
    pub fn unpack(&self) -> VoxelFace {
        let geometry = u16::from_le_bytes([self.bytes[0], self.bytes[1]]);
        let block_type = u16::from_le_bytes([self.bytes[4], self.bytes[5]]);

        let position = U8Vec3::new(
            (geometry & 0xF) as u8,
            ((geometry >> 4) & 0xF) as u8,
            ((geometry >> 8) & 0xF) as u8,
        );
        let face_id = ((geometry >> 12) & 0x7) as u8;

        VoxelFace {
            position,
            face_direction: Face::try_from(face_id).unwrap_or_default(),
            block_type,
        }
    }
}

/// The vertex payload of one mesh cell, ready to be uploaded by the render side.
#[derive(Clone, Default, Debug)]
pub struct ChunkMeshData {
    pub position: ChunkPos,
    pub faces: Vec<PackedVoxelFace>,
}

impl ChunkMeshData {
    pub fn from_position(position: ChunkPos) -> Self {
        ChunkMeshData {
            position,
            faces: Vec::new(),
        }
    }

    pub fn total_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_packing() {
        let face = VoxelFace {
            position: U8Vec3::new(15, 7, 1),
            face_direction: Face::Back,
            block_type: 0x0ABC,
        };
        let packed = PackedVoxelFace::from(face);
        assert_eq!(packed.unpack(), face);
        assert_eq!(size_of::<PackedVoxelFace>(), 6);
    }
}
