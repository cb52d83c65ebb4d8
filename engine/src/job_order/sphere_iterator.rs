use std::{path::Path, sync::Arc, time::Instant};

use ahash::AHashSet;
use glam::IVec3;

use crate::{
    job_order::{Job, JobKind, cache},
    voxels::coord::ChunkPos,
};

/// The precomputed order in which chunks and meshes around the observer are produced.
///
/// Mesh cells within `radius` of the origin are visited by ascending distance, grouped into
/// shells of one unit each. Every shell first generates the chunks its meshes depend on that
/// no earlier shell generated, then passes `sync_repetitions` sync markers (the last of which
/// carries the shell's chunk bounding box), then generates its meshes.
#[derive(Clone)]
pub struct SphereIterator {
    radius: u32,
    sync_repetitions: u32,
    jobs: Arc<[Job]>,
    chunk_dependencies: Arc<[ChunkPos]>,
    mesh_count: usize,
}

impl SphereIterator {
    pub fn build(radius: u32, sync_repetitions: u32) -> Self {
        let start = Instant::now();
        let jobs = build_jobs(radius, sync_repetitions);
        log::info!(
            "Built job order for radius {} with {} sync repetitions: {} jobs in {:.1} ms",
            radius,
            sync_repetitions,
            jobs.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Self::from_jobs(radius, sync_repetitions, jobs)
    }

    /// Loads the job order from the cache directory, or builds and caches it.
    /// A missing or unusable cache file is never an error, just slower.
    pub fn load_or_build(radius: u32, sync_repetitions: u32, cache_dir: &Path) -> Self {
        let path = cache::cache_file_path(cache_dir, radius, sync_repetitions);

        match cache::read_jobs(&path, radius, sync_repetitions) {
            Ok(jobs) => {
                log::debug!("Loaded {} jobs from {:?}", jobs.len(), path);
                return Self::from_jobs(radius, sync_repetitions, jobs);
            }
            Err(cache::CacheError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No job order cache at {:?}", path);
            }
            Err(e) => {
                log::warn!("Ignoring job order cache {:?}: {}", path, e);
            }
        }

        let iterator = Self::build(radius, sync_repetitions);
        if let Err(e) = cache::write_jobs(&path, radius, sync_repetitions, &iterator.jobs) {
            log::warn!("Failed to write job order cache {:?}: {}", path, e);
        }
        iterator
    }

    pub(crate) fn from_jobs(radius: u32, sync_repetitions: u32, jobs: Vec<Job>) -> Self {
        let chunk_dependencies: Arc<[ChunkPos]> = jobs
            .iter()
            .filter(|job| job.kind == JobKind::GenerateChunk)
            .map(|job| job.position)
            .collect();
        let mesh_count = jobs
            .iter()
            .filter(|job| job.kind == JobKind::GenerateMesh)
            .count();

        SphereIterator {
            radius,
            sync_repetitions,
            jobs: jobs.into(),
            chunk_dependencies,
            mesh_count,
        }
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn sync_repetitions(&self) -> u32 {
        self.sync_repetitions
    }

    pub fn jobs(&self) -> &Arc<[Job]> {
        &self.jobs
    }

    /// Every chunk offset the sphere depends on, in generation order.
    pub fn chunk_dependencies(&self) -> &Arc<[ChunkPos]> {
        &self.chunk_dependencies
    }

    pub fn mesh_count(&self) -> usize {
        self.mesh_count
    }

    /// Whether a mesh cell at `offset` from the center is inside the sphere.
    pub fn contains(&self, offset: ChunkPos) -> bool {
        let radius = self.radius as i32;
        offset.0.length_squared() < radius * radius
    }
}

/// Lattice points strictly inside the sphere, ordered by ascending squared distance.
/// Ties keep the x, y, z enumeration order.
fn sorted_sphere_points(radius: i32) -> Vec<IVec3> {
    let mut points = Vec::new();
    for x in -radius..=radius {
        for y in -radius..=radius {
            for z in -radius..=radius {
                let point = IVec3::new(x, y, z);
                if point.length_squared() < radius * radius {
                    points.push(point);
                }
            }
        }
    }

    points.sort_by_key(|point| point.length_squared());
    points
}

#[derive(Default)]
struct ShellBuilder {
    jobs: Vec<Job>,
    chunk_dependencies: AHashSet<ChunkPos>,
    chunk_jobs: Vec<Job>,
    mesh_jobs: Vec<Job>,
}

impl ShellBuilder {
    fn add_mesh(&mut self, position: ChunkPos) {
        for dependency in position.mesh_dependencies() {
            if self.chunk_dependencies.insert(dependency) {
                self.chunk_jobs.push(Job::generate_chunk(dependency));
            }
        }
        self.mesh_jobs.push(Job::generate_mesh(position));
    }

    fn flush_shell(&mut self, sync_repetitions: u32) {
        self.jobs.push(Job::marker(JobKind::Sync));
        self.jobs.append(&mut self.chunk_jobs);
        for _ in 1..sync_repetitions {
            self.jobs.push(Job::marker(JobKind::Sync));
        }
        self.jobs.push(Job::marker(JobKind::LastSyncAndLoadRegion));
        self.jobs.append(&mut self.mesh_jobs);
    }
}

pub(crate) fn build_jobs(radius: u32, sync_repetitions: u32) -> Vec<Job> {
    assert!(radius > 0, "Sphere radius must be positive");
    assert!(sync_repetitions > 0, "Sync repetitions must be positive");

    let radius = radius as i32;
    let mut builder = ShellBuilder::default();
    let mut shell = 0;

    for point in sorted_sphere_points(radius) {
        let distance_squared = point.length_squared();
        while distance_squared >= (shell + 1) * (shell + 1) {
            builder.flush_shell(sync_repetitions);
            shell += 1;
        }
        builder.add_mesh(ChunkPos(point));
    }
    builder.flush_shell(sync_repetitions);

    let mut jobs = builder.jobs;

    // Trailing bracket. Together with the repetitions below the sequence ends with
    // `sync_repetitions` syncs before the end marker.
    jobs.push(Job::marker(JobKind::Sync));
    for _ in 1..sync_repetitions {
        jobs.push(Job::marker(JobKind::Sync));
    }
    jobs.push(Job::marker(JobKind::EndMarker));

    compute_region_bounds(&mut jobs);
    jobs
}

/// Stores the bounding box of each region's chunk jobs in the region's closing marker.
fn compute_region_bounds(jobs: &mut [Job]) {
    let mut bounds: Option<(ChunkPos, ChunkPos)> = None;

    for job in jobs.iter_mut() {
        match job.kind {
            JobKind::GenerateChunk => {
                bounds = Some(match bounds {
                    Some((min, max)) => (min.min(job.position), max.max(job.position)),
                    None => (job.position, job.position),
                });
            }
            JobKind::LastSyncAndLoadRegion => {
                let (min, max) = match bounds.take() {
                    Some((min, max)) => {
                        assert!(
                            min.0.cmple(max.0).all(),
                            "Region bounds are inverted: min {:?}, max {:?}",
                            min,
                            max
                        );
                        (min, max)
                    }
                    None => Job::EMPTY_REGION,
                };
                job.position = min;
                job.extent = max;
            }
            JobKind::Sync | JobKind::GenerateMesh | JobKind::EndMarker => {}
        }
    }

    assert!(
        bounds.is_none(),
        "Chunk jobs after the last region marker have no region"
    );
}
