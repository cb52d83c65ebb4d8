pub mod dense_bitset;
pub mod sparse_set;
pub mod wrapping_grid;
