pub mod chunk_loader;
pub mod clock;
pub mod collections;
pub mod config;
pub mod job_order;
pub mod limits;
pub mod memory;
pub mod mesh_generation;
pub mod rendering;
pub mod sync;
pub mod task_buffer;
pub mod voxels;
pub mod world;
pub mod world_stats;
pub mod world_storage;
pub mod worldgen;
