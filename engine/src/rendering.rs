pub mod gpu_backend;
pub mod headless;
pub mod mesh_renderer;
