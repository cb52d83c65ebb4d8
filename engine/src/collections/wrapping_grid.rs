use glam::IVec3;

use crate::voxels::coord::ChunkPos;

/// Maps grid positions onto dense keys in `0..side³` by wrapping each axis.
///
/// Any set of positions that fits inside a `side`-wide window (on every axis) maps to distinct keys,
/// no matter where the window is. This lets fixed-size containers track positions around a moving
/// center without hashing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WrappingGrid {
    side: i32,
}

impl WrappingGrid {
    pub fn new(side: u32) -> Self {
        assert!(side > 0, "WrappingGrid side must be positive");
        assert!(
            (side as u64).pow(3) <= u32::MAX as u64,
            "WrappingGrid side {} is too large",
            side
        );
        WrappingGrid { side: side as i32 }
    }

    /// A grid wide enough for every chunk a sphere of the given radius depends on.
    /// Mesh cells span -(radius - 1)..=(radius - 1) and their chunks reach one further.
    pub fn for_radius(radius: u32) -> Self {
        Self::new(2 * radius.max(1))
    }

    pub fn side(&self) -> u32 {
        self.side as u32
    }

    pub fn capacity(&self) -> usize {
        (self.side as usize).pow(3)
    }

    /// Whether `pos` lies in the window this grid keys uniquely around `center`, which spans
    /// `-(side / 2 - 1)..=side / 2` on every axis.
    pub fn in_window(&self, center: ChunkPos, pos: ChunkPos) -> bool {
        let half = self.side / 2;
        let offset = (pos - center).0;
        offset.cmpgt(IVec3::splat(-half)).all() && offset.cmple(IVec3::splat(half)).all()
    }

    pub fn key(&self, pos: ChunkPos) -> usize {
        let IVec3 { x, y, z } = pos.0.rem_euclid(IVec3::splat(self.side));
        let side = self.side as usize;
        (x as usize * side * side) + (y as usize * side) + z as usize
    }
}
