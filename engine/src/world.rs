use std::sync::Arc;

use crate::{
    chunk_loader::{ChunkLoader, ChunkLoaderHandle, ChunkLoaderSetup, LapReport},
    clock::{Clock, SystemClock},
    config::{config_manager::Config, streaming_config::StreamingConfig},
    rendering::{gpu_backend::GpuBackend, mesh_renderer::MeshRenderer},
    sync::{
        barrier::{BarrierWait, TwoPhaseBarrier},
        ring_buffer::{RingConsumer, ring_buffer},
        triple_buffer::{TripleWriter, triple_buffer},
    },
    task_buffer::task_exchange,
    voxels::coord::WorldPosF,
    world_stats::{LoaderStatistics, LoaderStatisticsSnapshot},
    world_storage::WorldStorage,
};

/// Owner-side handle of a streaming world: moves the observer, collects lap reports and
/// statistics, and shuts the chunk loader down when dropped. The matching `MeshRenderer`
/// returned by [`World::start`] goes to whichever thread owns the GPU.
pub struct World {
    chunk_loader: ChunkLoaderHandle,
    observer: TripleWriter<WorldPosF>,
    reports: RingConsumer<LapReport>,
    statistics: Arc<LoaderStatistics>,
    startup: Arc<TwoPhaseBarrier>,
    config: StreamingConfig,
}

impl World {
    pub fn start<G: GpuBackend>(
        config: &StreamingConfig,
        storage: impl WorldStorage,
        observer: WorldPosF,
    ) -> anyhow::Result<(World, MeshRenderer<G>)> {
        Self::start_with_clock(config, storage, observer, Arc::new(SystemClock))
    }

    /// Starts the chunk loader thread and waits until it has its job order ready.
    pub fn start_with_clock<G: GpuBackend>(
        config: &StreamingConfig,
        storage: impl WorldStorage,
        observer: WorldPosF,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<(World, MeshRenderer<G>)> {
        anyhow::ensure!(config.is_valid(), "Invalid streaming config: {:?}", config);

        let (producer, consumer) = task_exchange(config.min_swap_interval(), clock);
        let (observer_writer, observer_reader) = triple_buffer(observer);
        let (report_producer, report_consumer) = ring_buffer(config.report_capacity);
        let statistics = Arc::new(LoaderStatistics::new());
        let startup = Arc::new(TwoPhaseBarrier::new(2));

        let mut chunk_loader = ChunkLoader::start(ChunkLoaderSetup {
            config: config.clone(),
            storage: Box::new(storage),
            producer,
            observer: observer_reader,
            reports: report_producer,
            statistics: statistics.clone(),
            startup: startup.clone(),
        })?;

        if startup.wait() == BarrierWait::Disabled {
            chunk_loader.shutdown();
            anyhow::bail!("Chunk loader exited during startup");
        }

        log::info!(
            "World started with radius {} and {} sync repetitions",
            config.radius,
            config.sync_repetitions
        );

        let world = World {
            chunk_loader,
            observer: observer_writer,
            reports: report_consumer,
            statistics,
            startup,
            config: config.clone(),
        };

        Ok((world, MeshRenderer::new(consumer)))
    }

    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    /// Moves the observer. The loader picks the latest position up at the start of its next lap.
    pub fn set_observer(&mut self, eye: WorldPosF) {
        self.observer.write(eye);
    }

    /// Lap reports published since the last call, oldest first
    pub fn poll_reports(&mut self) -> impl Iterator<Item = LapReport> + '_ {
        self.reports.drain()
    }

    pub fn statistics(&self) -> LoaderStatisticsSnapshot {
        self.statistics.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.chunk_loader.is_running()
    }

    /// Stops the chunk loader, interrupting it if it is waiting for the renderer.
    pub fn shutdown(&mut self) {
        self.startup.disable();
        self.chunk_loader.shutdown();
    }
}

impl Drop for World {
    fn drop(&mut self) {
        self.shutdown();
    }
}
