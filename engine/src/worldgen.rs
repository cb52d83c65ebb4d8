pub mod noise_world_generator;
pub mod test_world_generators;
pub mod world_generator;

pub use world_generator::WorldGenerator;
