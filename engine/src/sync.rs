pub mod barrier;
pub mod ring_buffer;
pub mod triple_buffer;
