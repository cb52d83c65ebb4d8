use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Counters updated by the chunk loader thread and read by whoever holds the `Arc`.
#[derive(Debug, Default)]
pub struct LoaderStatistics {
    laps: AtomicU64,
    swaps: AtomicU64,
    chunks_loaded: AtomicU64,
    chunks_generated: AtomicU64,
    chunks_evicted: AtomicU64,
    meshes_built: AtomicU64,
    uploads: AtomicU64,
    removals: AtomicU64,
    dropped_reports: AtomicU64,
    resident_chunks: AtomicU32,
    resident_meshes: AtomicU32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoaderStatisticsSnapshot {
    pub laps: u64,
    pub swaps: u64,
    /// Chunks that came out of storage
    pub chunks_loaded: u64,
    /// Chunks storage did not have and the generator produced
    pub chunks_generated: u64,
    /// Chunks dropped after leaving the window around the observer
    pub chunks_evicted: u64,
    pub meshes_built: u64,
    pub uploads: u64,
    pub removals: u64,
    pub dropped_reports: u64,
    pub resident_chunks: u32,
    /// Meshes tracked by the loader, including empty ones that were never uploaded
    pub resident_meshes: u32,
}

impl LoaderStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_lap(&self) {
        self.laps.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_swap(&self) {
        self.swaps.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_chunk(&self, from_storage: bool) {
        if from_storage {
            self.chunks_loaded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.chunks_generated.fetch_add(1, Ordering::Relaxed);
        }
        self.resident_chunks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_chunk_evicted(&self) {
        self.chunks_evicted.fetch_add(1, Ordering::Relaxed);
        self.resident_chunks.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn record_mesh_built(&self, uploaded: bool) {
        self.meshes_built.fetch_add(1, Ordering::Relaxed);
        self.resident_meshes.fetch_add(1, Ordering::Relaxed);
        if uploaded {
            self.uploads.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_mesh_removed(&self, had_upload: bool) {
        self.resident_meshes.fetch_sub(1, Ordering::Relaxed);
        if had_upload {
            self.removals.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_dropped_report(&self) {
        self.dropped_reports.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> LoaderStatisticsSnapshot {
        LoaderStatisticsSnapshot {
            laps: self.laps.load(Ordering::Relaxed),
            swaps: self.swaps.load(Ordering::Relaxed),
            chunks_loaded: self.chunks_loaded.load(Ordering::Relaxed),
            chunks_generated: self.chunks_generated.load(Ordering::Relaxed),
            chunks_evicted: self.chunks_evicted.load(Ordering::Relaxed),
            meshes_built: self.meshes_built.load(Ordering::Relaxed),
            uploads: self.uploads.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
            dropped_reports: self.dropped_reports.load(Ordering::Relaxed),
            resident_chunks: self.resident_chunks.load(Ordering::Relaxed),
            resident_meshes: self.resident_meshes.load(Ordering::Relaxed),
        }
    }
}
