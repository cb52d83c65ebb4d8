use glam::{IVec3, U8Vec3};

use crate::{
    mesh_generation::{
        chunk_mesh::{ChunkMeshData, PackedVoxelFace, VoxelFace},
        chunk_mesh_generator_input::ChunkMeshGeneratorInput,
    },
    voxels::{chunk::CHUNK_SIZE, face::Face},
};

/// Emits one face for every side of a solid voxel that touches air.
/// Faces on the cell border look into the neighboring chunks, so cells join without seams.
#[derive(Default)]
pub struct ChunkMeshGenerator;

impl ChunkMeshGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate_mesh(&self, input: &ChunkMeshGeneratorInput) -> ChunkMeshData {
        let mut mesh = ChunkMeshData::from_position(input.position);
        const N: i32 = CHUNK_SIZE as i32;

        for y in 0..N {
            for z in 0..N {
                for x in 0..N {
                    let local = IVec3::new(x, y, z);
                    let voxel = input.get_voxel(local);
                    if voxel.is_air() {
                        continue;
                    }

                    for face in Face::all() {
                        if input.get_voxel(local + face.to_ivec3()).is_opaque() {
                            continue;
                        }
                        mesh.faces.push(PackedVoxelFace::from(VoxelFace {
                            position: U8Vec3::new(x as u8, y as u8, z as u8),
                            face_direction: face,
                            block_type: voxel.block_type(),
                        }));
                    }
                }
            }
        }

        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mesh_generation::chunk_mesh_generator_input::MESH_OFFSET,
        voxels::{
            chunk::ChunkData,
            coord::{ChunkPos, WorldPos},
            voxel::Voxel,
        },
        worldgen::{WorldGenerator, test_world_generators::FlatWorldGenerator},
    };

    fn chunks_for(
        position: ChunkPos,
        mut make: impl FnMut(ChunkPos) -> ChunkData,
    ) -> Vec<(ChunkPos, ChunkData)> {
        position
            .mesh_dependencies()
            .into_iter()
            .map(|pos| (pos, make(pos)))
            .collect()
    }

    fn mesh(position: ChunkPos, chunks: &[(ChunkPos, ChunkData)]) -> ChunkMeshData {
        let input = ChunkMeshGeneratorInput::try_from_lookup(position, |pos| {
            chunks.iter().find(|(p, _)| *p == pos).map(|(_, data)| data)
        })
        .unwrap();
        ChunkMeshGenerator::new().generate_mesh(&input)
    }

    #[test]
    fn test_empty_cell_has_no_faces() {
        let position = ChunkPos::new(4, 4, 4);
        let chunks = chunks_for(position, |_| ChunkData::empty());
        assert!(mesh(position, &chunks).is_empty());
    }

    #[test]
    fn test_single_voxel_has_six_faces() {
        let position = ChunkPos::ZERO;
        let mut chunks = chunks_for(position, |_| ChunkData::empty());

        // Cell local (0, 0, 0) is world (MESH_OFFSET, MESH_OFFSET, MESH_OFFSET) in chunk (0, 0, 0)
        let world = WorldPos::new(MESH_OFFSET, MESH_OFFSET, MESH_OFFSET);
        chunks[0].1.set_voxel(world.to_local_pos(), Voxel::DIRT);

        let mesh = mesh(position, &chunks);
        assert_eq!(mesh.total_faces(), 6);
        for face in mesh.faces.iter().map(|face| face.unpack()) {
            assert_eq!(face.position, U8Vec3::ZERO);
            assert_eq!(face.block_type, Voxel::DIRT.block_type());
        }
    }

    #[test]
    fn test_faces_across_chunk_border_are_culled() {
        let position = ChunkPos::ZERO;
        let mut chunks = chunks_for(position, |_| ChunkData::empty());

        // Two voxels on either side of the x = CHUNK_SIZE chunk border
        let left = WorldPos::new(CHUNK_SIZE as i32 - 1, MESH_OFFSET, MESH_OFFSET);
        let right = WorldPos::new(CHUNK_SIZE as i32, MESH_OFFSET, MESH_OFFSET);
        chunks[0].1.set_voxel(left.to_local_pos(), Voxel::STONE);
        // Index 4 is the +x neighbor
        assert_eq!(chunks[4].0, ChunkPos::new(1, 0, 0));
        chunks[4].1.set_voxel(right.to_local_pos(), Voxel::STONE);

        assert_eq!(mesh(position, &chunks).total_faces(), 10);
    }

    #[test]
    fn test_flat_ground_has_only_top_faces() {
        let generator = FlatWorldGenerator::new(0);
        let position = ChunkPos::new(0, -1, 0);
        let chunks = chunks_for(position, |pos| generator.generate_chunk(pos));

        let mesh = mesh(position, &chunks);
        assert_eq!(mesh.total_faces(), (CHUNK_SIZE as usize).pow(2));
        assert!(
            mesh.faces
                .iter()
                .all(|face| face.unpack().face_direction == Face::Top)
        );
    }
}
