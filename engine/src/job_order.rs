use crate::voxels::coord::ChunkPos;

pub mod cache;
pub mod sphere_iterator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum JobKind {
    Sync = 0,
    /// Last sync of a region. Carries the bounding box of the region's chunks.
    LastSyncAndLoadRegion = 1,
    GenerateChunk = 2,
    GenerateMesh = 3,
    EndMarker = 4,
}

impl TryFrom<u32> for JobKind {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(JobKind::Sync),
            1 => Ok(JobKind::LastSyncAndLoadRegion),
            2 => Ok(JobKind::GenerateChunk),
            3 => Ok(JobKind::GenerateMesh),
            4 => Ok(JobKind::EndMarker),
            other => Err(other),
        }
    }
}

/// One entry of the precomputed job order, relative to the observer's cell.
///
/// For `GenerateChunk` and `GenerateMesh`, `position` is the offset of the chunk or mesh cell.
/// For `LastSyncAndLoadRegion`, `position` and `extent` are the inclusive min and max corners
/// of the chunks generated in that region; an empty region has its max below its min.
/// Otherwise both are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Job {
    pub kind: JobKind,
    pub position: ChunkPos,
    pub extent: ChunkPos,
}

impl Job {
    pub const fn marker(kind: JobKind) -> Self {
        Job {
            kind,
            position: ChunkPos::ZERO,
            extent: ChunkPos::ZERO,
        }
    }

    pub const fn generate_chunk(position: ChunkPos) -> Self {
        Job {
            kind: JobKind::GenerateChunk,
            position,
            extent: ChunkPos::ZERO,
        }
    }

    pub const fn generate_mesh(position: ChunkPos) -> Self {
        Job {
            kind: JobKind::GenerateMesh,
            position,
            extent: ChunkPos::ZERO,
        }
    }

    pub const EMPTY_REGION: (ChunkPos, ChunkPos) = (ChunkPos::ZERO, ChunkPos::new(-1, -1, -1));

    pub fn is_sync(&self) -> bool {
        matches!(
            self.kind,
            JobKind::Sync | JobKind::LastSyncAndLoadRegion
        )
    }

    /// Region bounds of a `LastSyncAndLoadRegion` marker, or None for an empty region.
    pub fn region(&self) -> Option<(ChunkPos, ChunkPos)> {
        assert_eq!(
            self.kind,
            JobKind::LastSyncAndLoadRegion,
            "Only region markers carry bounds"
        );
        let min = self.position;
        let max = self.extent;
        if max.0.cmplt(min.0).any() {
            return None;
        }
        Some((min, max))
    }
}
