use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::JoinHandle,
    time::{Duration, Instant},
};

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::{
    collections::{
        dense_bitset::DenseBitset, sparse_set::SparseMembershipSet, wrapping_grid::WrappingGrid,
    },
    config::streaming_config::StreamingConfig,
    job_order::{JobKind, sphere_iterator::SphereIterator},
    memory::pool::Pool,
    mesh_generation::{
        chunk_mesh_generator::ChunkMeshGenerator,
        chunk_mesh_generator_input::ChunkMeshGeneratorInput,
    },
    sync::{
        barrier::{BarrierWait, TwoPhaseBarrier},
        ring_buffer::RingProducer,
        triple_buffer::TripleReader,
    },
    task_buffer::{RemoveTask, RenderTask, TaskProducer, UploadTask},
    voxels::{
        chunk::ChunkData,
        coord::{ChunkPos, WorldPosF},
    },
    world_stats::LoaderStatistics,
    world_storage::{ChunkSource, WorldStorage, load_or_generate},
};

// Used by the main thread to communicate with the chunk loader thread
pub enum LoaderCommand {
    Shutdown,
}

/// Residency of a position in the loader's bookkeeping. Positions missing from the
/// membership containers are `Unloaded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Unloaded,
    Loaded,
    /// Confirmed in range during the current lap's re-scan
    Checked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LapOutcome {
    /// Walked the whole job order
    Completed,
    /// Stopped at a sync point after reaching the per-lap upload budget
    BudgetExhausted,
    /// Stopped at a sync point because of shutdown; the lap is never published
    Interrupted,
}

/// Summary of one loader lap, sent to the owner of the `World` through a ring buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LapReport {
    pub lap: u64,
    pub center: ChunkPos,
    pub chunks_loaded: u32,
    pub chunks_generated: u32,
    pub chunks_evicted: u32,
    pub meshes_built: u32,
    pub empty_meshes: u32,
    pub uploads: u32,
    pub renders: u32,
    pub removals: u32,
    pub elapsed: Duration,
    pub outcome: LapOutcome,
}

#[derive(Debug, Clone, Copy)]
struct MeshEntry {
    position: ChunkPos,
    // Empty meshes are tracked so they aren't rebuilt every lap, but never uploaded
    slot: Option<u32>,
    status: Status,
}

struct CachedChunk {
    position: ChunkPos,
    data: ChunkData,
}

pub struct ChunkLoaderHandle {
    command_sender: Sender<LoaderCommand>,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ChunkLoaderHandle {
    pub fn is_running(&self) -> bool {
        self.thread
            .as_ref()
            .is_some_and(|thread| !thread.is_finished())
    }

    /// Stops the loader and waits for the thread to exit. Safe to call more than once.
    pub fn shutdown(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };

        self.shutdown.store(true, Ordering::Release);
        // The loader may already be gone, in which case the channel is disconnected
        let _ = self.command_sender.send(LoaderCommand::Shutdown);

        if thread.join().is_err() {
            log::error!("Chunk loader thread panicked");
        }
    }
}

impl Drop for ChunkLoaderHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Everything the loader thread takes ownership of when it starts.
pub struct ChunkLoaderSetup {
    pub config: StreamingConfig,
    pub storage: Box<dyn WorldStorage>,
    pub producer: TaskProducer,
    pub observer: TripleReader<WorldPosF>,
    pub reports: RingProducer<LapReport>,
    pub statistics: Arc<LoaderStatistics>,
    /// Two-party barrier the loader waits on once the job order is ready
    pub startup: Arc<TwoPhaseBarrier>,
}

// Releases whoever waits on the startup barrier if the loader exits early, panics included.
struct DisableOnExit(Arc<TwoPhaseBarrier>);

impl Drop for DisableOnExit {
    fn drop(&mut self) {
        self.0.disable();
    }
}

/// Walks the precomputed job order around the observer, lap after lap, loading chunks,
/// building meshes and filling the task buffer it owns. Lives in its own thread.
pub struct ChunkLoader {
    iterator: SphereIterator,
    storage: Box<dyn WorldStorage>,
    grid: WrappingGrid,
    // Center the cached chunks were last checked against
    window_center: Option<ChunkPos>,
    loaded_chunks: DenseBitset,
    chunks: Vec<Option<CachedChunk>>,
    meshes: SparseMembershipSet<MeshEntry>,
    slots: Pool,
    mesh_generator: ChunkMeshGenerator,
    producer: TaskProducer,
    observer: TripleReader<WorldPosF>,
    reports: RingProducer<LapReport>,
    statistics: Arc<LoaderStatistics>,
    command_receiver: Receiver<LoaderCommand>,
    shutdown: Arc<AtomicBool>,
    lap_upload_budget: usize,
}

impl ChunkLoader {
    pub fn start(setup: ChunkLoaderSetup) -> anyhow::Result<ChunkLoaderHandle> {
        let (command_sender, command_receiver) = crossbeam_channel::unbounded();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let thread = std::thread::Builder::new()
            .name("Chunk loader".to_string())
            .spawn(move || {
                let _disable_on_exit = DisableOnExit(setup.startup.clone());

                let iterator = SphereIterator::load_or_build(
                    setup.config.radius,
                    setup.config.sync_repetitions,
                    &setup.config.cache_dir,
                );

                let chunk_loader = ChunkLoader::new(
                    iterator,
                    setup.storage,
                    setup.producer,
                    setup.observer,
                    setup.reports,
                    setup.statistics,
                    command_receiver,
                    shutdown_clone,
                    setup.config.lap_upload_budget,
                );

                if setup.startup.wait() == BarrierWait::Disabled {
                    log::info!("Chunk loader startup cancelled");
                    return;
                }

                chunk_loader.run()
            })
            .context("Failed to spawn chunk loader thread")?;

        Ok(ChunkLoaderHandle {
            command_sender,
            shutdown,
            thread: Some(thread),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn new(
        iterator: SphereIterator,
        storage: Box<dyn WorldStorage>,
        producer: TaskProducer,
        observer: TripleReader<WorldPosF>,
        reports: RingProducer<LapReport>,
        statistics: Arc<LoaderStatistics>,
        command_receiver: Receiver<LoaderCommand>,
        shutdown: Arc<AtomicBool>,
        lap_upload_budget: usize,
    ) -> Self {
        let grid = WrappingGrid::for_radius(iterator.radius());
        let capacity = grid.capacity();

        ChunkLoader {
            iterator,
            storage,
            grid,
            window_center: None,
            loaded_chunks: DenseBitset::new(capacity),
            chunks: (0..capacity).map(|_| None).collect(),
            meshes: SparseMembershipSet::new(capacity),
            slots: Pool::new(capacity as u32),
            mesh_generator: ChunkMeshGenerator::new(),
            producer,
            observer,
            reports,
            statistics,
            command_receiver,
            shutdown,
            lap_upload_budget,
        }
    }

    fn should_stop(&self) -> bool {
        if self.shutdown.load(Ordering::Acquire) {
            return true;
        }

        match self.command_receiver.try_recv() {
            Ok(LoaderCommand::Shutdown) | Err(TryRecvError::Disconnected) => true,
            Err(TryRecvError::Empty) => false,
        }
    }

    fn run(mut self) {
        log::info!(
            "Chunk loader started: radius {}, {} jobs, {} meshes",
            self.iterator.radius(),
            self.iterator.jobs().len(),
            self.iterator.mesh_count()
        );

        loop {
            if self.should_stop() {
                break;
            }

            let report = self.run_lap();
            if report.outcome == LapOutcome::Interrupted {
                break;
            }

            self.statistics.record_lap();
            if report.uploads > 0 || report.removals > 0 {
                log::debug!(
                    "Lap {} around {:?}: {} uploads, {} removals, {} renders in {:?}",
                    report.lap,
                    report.center,
                    report.uploads,
                    report.removals,
                    report.renders,
                    report.elapsed
                );
            }

            if let Err(report) = self.reports.push(report) {
                self.statistics.record_dropped_report();
                log::trace!("Report ring full, dropping report for lap {}", report.lap);
            }

            if self.producer.swap(&self.command_receiver).is_err() {
                break;
            }
            self.statistics.record_swap();
        }

        log::info!(
            "Chunk loader stopped after {} laps",
            self.statistics.snapshot().laps
        );
    }

    #[profiling::function]
    fn run_lap(&mut self) -> LapReport {
        let started = Instant::now();
        let center = self.observer.read().to_chunk_pos();

        let mut report = LapReport {
            lap: self.producer.lap(),
            center,
            chunks_loaded: 0,
            chunks_generated: 0,
            chunks_evicted: 0,
            meshes_built: 0,
            empty_meshes: 0,
            uploads: 0,
            renders: 0,
            removals: 0,
            elapsed: Duration::ZERO,
            outcome: LapOutcome::Completed,
        };

        self.rescan_meshes(center, &mut report);
        self.evict_chunks(center, &mut report);

        let jobs = self.iterator.jobs().clone();
        for job in jobs.iter() {
            match job.kind {
                JobKind::GenerateChunk => {
                    self.ensure_chunk(center + job.position, &mut report);
                }
                JobKind::GenerateMesh => {
                    self.ensure_mesh(center + job.position, &mut report);
                }
                JobKind::Sync => {
                    if self.shutdown.load(Ordering::Acquire) {
                        report.outcome = LapOutcome::Interrupted;
                        break;
                    }

                    if self.lap_upload_budget > 0
                        && report.uploads as usize >= self.lap_upload_budget
                    {
                        report.outcome = LapOutcome::BudgetExhausted;
                        break;
                    }
                }
                JobKind::LastSyncAndLoadRegion => {
                    if let Some((min, max)) = job.region() {
                        self.storage.prepare_region(center + min, center + max);
                    }
                }
                JobKind::EndMarker => break,
            }
        }

        report.elapsed = started.elapsed();
        report
    }

    /// Drops meshes that left the sphere around `center` and re-issues renders for the rest.
    fn rescan_meshes(&mut self, center: ChunkPos, report: &mut LapReport) {
        let radius_squared = (self.iterator.radius() as i32).pow(2);
        let buffer = self.producer.buffer_mut();
        let slots = &mut self.slots;
        let statistics = &self.statistics;

        self.meshes.retain_or_else(
            |_, entry| {
                let in_range = entry.position.distance_squared(center) < radius_squared;
                if in_range {
                    entry.status = Status::Checked;
                }
                in_range
            },
            |_, entry| {
                if let Some(slot) = entry.slot {
                    buffer.removals.push(RemoveTask {
                        slot,
                        position: entry.position,
                    });
                    slots.free(slot);
                    report.removals += 1;
                }
                statistics.record_mesh_removed(entry.slot.is_some());
            },
        );

        for entry in self.meshes.values_mut() {
            debug_assert_eq!(entry.status, Status::Checked);
            if let Some(slot) = entry.slot {
                buffer.renders.push(RenderTask {
                    slot,
                    position: entry.position,
                });
                report.renders += 1;
            }
            entry.status = Status::Loaded;
        }
    }

    /// Unloads cached chunks outside the grid window around `center`. Afterwards every set
    /// bit in `loaded_chunks` stands for the only window position under its key.
    fn evict_chunks(&mut self, center: ChunkPos, report: &mut LapReport) {
        if self.window_center == Some(center) {
            return;
        }
        self.window_center = Some(center);

        let grid = self.grid;
        let chunks = &self.chunks;
        let stale: Vec<usize> = self
            .loaded_chunks
            .iter_ones()
            .filter(|&key| {
                chunks[key]
                    .as_ref()
                    .is_none_or(|chunk| !grid.in_window(center, chunk.position))
            })
            .collect();

        for key in stale {
            self.loaded_chunks.clear(key);
            self.chunks[key] = None;
            self.statistics.record_chunk_evicted();
            report.chunks_evicted += 1;
        }
    }

    fn ensure_chunk(&mut self, position: ChunkPos, report: &mut LapReport) {
        let key = self.grid.key(position);
        if self.loaded_chunks.test(key) {
            debug_assert!(
                self.chunks[key]
                    .as_ref()
                    .is_some_and(|chunk| chunk.position == position),
                "Loaded key for {:?} holds another chunk",
                position
            );
            return;
        }

        let (data, source) = load_or_generate(self.storage.as_mut(), position);
        match source {
            ChunkSource::Storage => report.chunks_loaded += 1,
            ChunkSource::Generated => report.chunks_generated += 1,
        }
        self.statistics.record_chunk(source == ChunkSource::Storage);

        self.chunks[key] = Some(CachedChunk { position, data });
        self.loaded_chunks.set(key);
    }

    fn ensure_mesh(&mut self, position: ChunkPos, report: &mut LapReport) {
        let key = self.grid.key(position);

        if let Some(entry) = self.meshes.get(key) {
            assert_eq!(
                entry.position, position,
                "Two in-range mesh positions share a key"
            );
            return;
        }

        let grid = self.grid;
        let chunks = &self.chunks;
        let Some(input) = ChunkMeshGeneratorInput::try_from_lookup(position, |dependency| {
            chunks[grid.key(dependency)]
                .as_ref()
                .filter(|chunk| chunk.position == dependency)
                .map(|chunk| &chunk.data)
        }) else {
            panic!("Mesh {:?} was scheduled before its chunks", position);
        };

        let mesh = self.mesh_generator.generate_mesh(&input);
        report.meshes_built += 1;

        let slot = if mesh.is_empty() {
            report.empty_meshes += 1;
            None
        } else {
            let Some(slot) = self.slots.allocate() else {
                panic!("Out of mesh slots at {:?}", position);
            };
            self.producer
                .buffer_mut()
                .uploads
                .push(UploadTask { slot, mesh });
            report.uploads += 1;
            Some(slot)
        };

        self.statistics.record_mesh_built(slot.is_some());
        self.meshes.insert(
            key,
            MeshEntry {
                position,
                slot,
                status: Status::Loaded,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::{
        clock::SystemClock,
        sync::{ring_buffer::ring_buffer, triple_buffer::triple_buffer},
        task_buffer::{TaskConsumer, task_exchange},
        world_storage::{GeneratedWorldStorage, MemoryWorldStorage},
        worldgen::{
            WorldGenerator,
            test_world_generators::{EmptyWorldGenerator, FlatWorldGenerator},
        },
    };

    struct Harness {
        loader: ChunkLoader,
        consumer: TaskConsumer,
        observer: crate::sync::triple_buffer::TripleWriter<WorldPosF>,
        _command_sender: Sender<LoaderCommand>,
    }

    fn harness(
        radius: u32,
        sync_repetitions: u32,
        budget: usize,
        storage: Box<dyn WorldStorage>,
    ) -> Harness {
        let (producer, consumer) = task_exchange(Duration::ZERO, Arc::new(SystemClock));
        let (observer, observer_reader) = triple_buffer(WorldPosF(Vec3::ZERO));
        let (reports, _report_reader) = ring_buffer(4);
        let (command_sender, command_receiver) = crossbeam_channel::unbounded();

        let loader = ChunkLoader::new(
            SphereIterator::build(radius, sync_repetitions),
            storage,
            producer,
            observer_reader,
            reports,
            Arc::new(LoaderStatistics::new()),
            command_receiver,
            Arc::new(AtomicBool::new(false)),
            budget,
        );

        Harness {
            loader,
            consumer,
            observer,
            _command_sender: command_sender,
        }
    }

    fn flat(radius: u32, budget: usize) -> Harness {
        harness(
            radius,
            1,
            budget,
            Box::new(GeneratedWorldStorage::new(FlatWorldGenerator::new(0))),
        )
    }

    #[test]
    fn test_first_lap_builds_every_mesh() {
        let mut harness = flat(3, 0);
        let report = harness.loader.run_lap();

        let iterator = SphereIterator::build(3, 1);
        assert_eq!(report.outcome, LapOutcome::Completed);
        assert_eq!(report.meshes_built as usize, iterator.mesh_count());
        assert_eq!(
            report.chunks_generated as usize,
            iterator.chunk_dependencies().len()
        );
        assert_eq!(report.uploads + report.empty_meshes, report.meshes_built);
        assert!(report.uploads > 0);
        assert_eq!(report.renders, 0);
        assert_eq!(
            harness.loader.producer.buffer().uploads.len(),
            report.uploads as usize
        );
    }

    #[test]
    fn test_second_lap_only_renders() {
        let mut harness = flat(3, 0);
        let first = harness.loader.run_lap();
        harness
            .loader
            .producer
            .swap(&harness.loader.command_receiver)
            .unwrap();
        harness.consumer.drain(|_| ()).unwrap();

        let second = harness.loader.run_lap();
        assert_eq!(second.meshes_built, 0);
        assert_eq!(second.chunks_generated, 0);
        assert_eq!(second.uploads, 0);
        assert_eq!(second.renders, first.uploads);
    }

    #[test]
    fn test_moving_observer_removes_and_frees_slots() {
        let mut harness = flat(3, 0);
        let first = harness.loader.run_lap();
        harness
            .loader
            .producer
            .swap(&harness.loader.command_receiver)
            .unwrap();
        harness.consumer.drain(|_| ()).unwrap();

        harness.observer.write(WorldPosF(Vec3::new(64.0, 0.0, 0.0)));
        let second = harness.loader.run_lap();
        assert_eq!(second.center, ChunkPos::new(4, 0, 0));
        assert!(second.removals > 0);
        assert!(second.uploads > 0);

        // Every slot in use belongs to exactly one resident uploaded mesh
        let uploaded = harness
            .loader
            .meshes
            .iter()
            .filter(|(_, entry)| entry.slot.is_some())
            .count();
        assert_eq!(harness.loader.slots.allocated() as usize, uploaded);
        assert_eq!(
            uploaded as u32,
            first.uploads - second.removals + second.uploads
        );

        let buffer = harness.loader.producer.buffer();
        for removal in &buffer.removals {
            assert!(removal.position.distance_squared(second.center) >= 9);
        }
    }

    fn swap_and_drain(harness: &mut Harness) {
        harness
            .loader
            .producer
            .swap(&harness.loader.command_receiver)
            .unwrap();
        harness.consumer.drain(|_| ()).unwrap();
    }

    // Runs budget-limited laps until one completes, returning the meshes built over all of them
    fn meshes_built_until_complete(harness: &mut Harness, first: LapReport) -> usize {
        let mut total = first.meshes_built;
        for _ in 0..64 {
            swap_and_drain(harness);

            let report = harness.loader.run_lap();
            total += report.meshes_built;
            if report.outcome == LapOutcome::Completed {
                break;
            }
        }
        total as usize
    }

    #[test]
    fn test_upload_budget_ends_lap_at_sync_point() {
        let mut harness = flat(4, 8);
        let report = harness.loader.run_lap();
        assert_eq!(report.outcome, LapOutcome::BudgetExhausted);
        assert!(report.uploads >= 8);

        let total = meshes_built_until_complete(&mut harness, report);
        assert_eq!(total, SphereIterator::build(4, 1).mesh_count());
    }

    // With repeated sync points every shell still loads its chunks, hints its region and
    // builds its meshes within a single lap
    #[test]
    fn test_upload_budget_with_repeated_sync_points() {
        let mut harness = harness(
            4,
            3,
            8,
            Box::new(GeneratedWorldStorage::new(FlatWorldGenerator::new(0))),
        );
        let report = harness.loader.run_lap();
        assert_eq!(report.outcome, LapOutcome::BudgetExhausted);
        assert!(report.uploads >= 8);

        // The lap stopped on a shell boundary: every chunk it loaded fed a mesh it built
        let needed: std::collections::HashSet<ChunkPos> = harness
            .loader
            .meshes
            .iter()
            .flat_map(|(_, entry)| entry.position.mesh_dependencies())
            .collect();
        assert_eq!(needed.len(), report.chunks_generated as usize);

        let iterator = SphereIterator::build(4, 3);
        let total = meshes_built_until_complete(&mut harness, report);
        assert_eq!(total, iterator.mesh_count());
        assert_eq!(
            harness.loader.loaded_chunks.count_ones(),
            iterator.chunk_dependencies().len()
        );
    }

    #[test]
    fn test_chunks_outside_window_are_evicted() {
        let mut harness = flat(4, 0);
        let mut evicted = 0;
        let mut center = ChunkPos::ZERO;

        for step in 1..=6 {
            evicted += harness.loader.run_lap().chunks_evicted;
            swap_and_drain(&mut harness);

            harness.observer.write(WorldPosF(Vec3::new(
                48.0 * step as f32,
                0.0,
                80.0 * step as f32,
            )));
            center = ChunkPos::new(3 * step, 0, 5 * step);
        }
        let report = harness.loader.run_lap();
        assert_eq!(report.center, center);
        evicted += report.chunks_evicted;
        assert!(evicted > 0);

        let loader = &harness.loader;
        let cached: Vec<ChunkPos> = loader
            .chunks
            .iter()
            .flatten()
            .map(|chunk| chunk.position)
            .collect();
        assert!(
            cached
                .iter()
                .all(|&position| loader.grid.in_window(center, position))
        );
        assert_eq!(loader.loaded_chunks.count_ones(), cached.len());

        let statistics = loader.statistics.snapshot();
        assert_eq!(statistics.resident_chunks as usize, cached.len());
        assert_eq!(statistics.chunks_evicted, evicted as u64);
        assert_eq!(
            statistics.chunks_generated - statistics.chunks_evicted,
            cached.len() as u64
        );

        // Everything the sphere needs around the new center is present
        for &offset in loader.iterator.chunk_dependencies().iter() {
            let position = center + offset;
            assert!(loader.loaded_chunks.test(loader.grid.key(position)));
            assert!(cached.contains(&position));
        }
    }

    #[test]
    fn test_standing_still_evicts_nothing() {
        let mut harness = flat(3, 0);
        harness.loader.run_lap();
        swap_and_drain(&mut harness);

        let report = harness.loader.run_lap();
        assert_eq!(report.chunks_evicted, 0);
        assert_eq!(report.chunks_generated, 0);
    }

    #[test]
    fn test_empty_world_uploads_nothing() {
        let mut harness = harness(
            3,
            1,
            0,
            Box::new(GeneratedWorldStorage::new(EmptyWorldGenerator::new(0))),
        );
        let report = harness.loader.run_lap();
        assert_eq!(report.uploads, 0);
        assert_eq!(report.empty_meshes, report.meshes_built);
        assert_eq!(harness.loader.slots.allocated(), 0);
    }

    #[test]
    fn test_stored_chunks_are_loaded_not_generated() {
        let mut storage = MemoryWorldStorage::new(EmptyWorldGenerator::new(0));
        storage.insert(ChunkPos::ZERO, ChunkData::solid(crate::voxels::voxel::Voxel::STONE));

        let mut harness = harness(2, 1, 0, Box::new(storage));
        let report = harness.loader.run_lap();
        assert_eq!(report.chunks_loaded, 1);
        assert!(report.uploads > 0);
    }

    #[test]
    fn test_shutdown_flag_interrupts_lap() {
        let mut harness = flat(3, 0);
        harness.loader.shutdown.store(true, Ordering::Release);
        let report = harness.loader.run_lap();
        assert_eq!(report.outcome, LapOutcome::Interrupted);
    }
}
