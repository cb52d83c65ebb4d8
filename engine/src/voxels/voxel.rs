use bitfield_struct::bitfield;

/// A single block in the world. Type 0 is air.
#[bitfield(u16, hash = true)]
pub struct Voxel {
    #[bits(12)]
    pub block_type: u16,
    #[bits(4)]
    pub metadata: u8,
}

impl Voxel {
    pub const fn from_type(block_type: u16) -> Self {
        let mut voxel = Voxel::new();
        voxel.set_block_type(block_type);
        voxel
    }

    pub const AIR: Voxel = Voxel::new();
    pub const STONE: Voxel = Voxel::from_type(1);
    pub const DIRT: Voxel = Voxel::from_type(2);
    pub const GRASS: Voxel = Voxel::from_type(3);

    pub const fn is_air(&self) -> bool {
        self.block_type() == 0
    }

    pub const fn is_opaque(&self) -> bool {
        !self.is_air()
    }
}

impl PartialEq for Voxel {
    fn eq(&self, other: &Self) -> bool {
        self.into_bits() == other.into_bits()
    }
}

impl Eq for Voxel {}
