pub mod chunk_mesh;
pub mod chunk_mesh_generator;
pub mod chunk_mesh_generator_input;
