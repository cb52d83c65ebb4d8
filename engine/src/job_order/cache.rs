use std::{
    fs::{self, File},
    io::{Read, Write},
    path::{Path, PathBuf},
};

use bytemuck::{Pod, Zeroable};
use thiserror::Error;

use crate::{
    job_order::{Job, JobKind},
    voxels::coord::ChunkPos,
};

const CACHE_MAGIC: u32 = u32::from_le_bytes(*b"SPHI");
pub const CACHE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("file is too short to contain a header ({0} bytes)")]
    MissingHeader(usize),
    #[error("not a job order cache file")]
    BadMagic,
    #[error("unsupported cache version {0}, expected {expected}", expected = CACHE_VERSION)]
    Version(u32),
    #[error("cache was built for radius {found_radius} with {found_syncs} syncs, expected radius {radius} with {syncs}")]
    Parameters {
        radius: u32,
        syncs: u32,
        found_radius: u32,
        found_syncs: u32,
    },
    #[error("payload is {found} bytes, expected {expected}")]
    Length { expected: usize, found: usize },
    #[error("unknown job kind {0}")]
    UnknownJobKind(u32),
}

/// Little-endian file header, followed by `count` job records.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct CacheHeader {
    magic: u32,
    version: u32,
    radius: u32,
    sync_repetitions: u32,
    count: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct JobRecord {
    kind: u32,
    position: [i32; 3],
    extent: [i32; 3],
}

const HEADER_SIZE: usize = size_of::<CacheHeader>();
const RECORD_SIZE: usize = size_of::<JobRecord>();

impl From<&Job> for JobRecord {
    fn from(job: &Job) -> Self {
        JobRecord {
            kind: (job.kind as u32).to_le(),
            position: job.position.0.to_array().map(i32::to_le),
            extent: job.extent.0.to_array().map(i32::to_le),
        }
    }
}

impl TryFrom<JobRecord> for Job {
    type Error = CacheError;

    fn try_from(record: JobRecord) -> Result<Self, Self::Error> {
        let kind =
            JobKind::try_from(u32::from_le(record.kind)).map_err(CacheError::UnknownJobKind)?;
        Ok(Job {
            kind,
            position: ChunkPos(record.position.map(i32::from_le).into()),
            extent: ChunkPos(record.extent.map(i32::from_le).into()),
        })
    }
}

pub fn cache_file_path(cache_dir: &Path, radius: u32, sync_repetitions: u32) -> PathBuf {
    cache_dir.join(format!("sphere_{}_{}.bin", radius, sync_repetitions))
}

pub fn encode_jobs(radius: u32, sync_repetitions: u32, jobs: &[Job]) -> Vec<u8> {
    let count = u32::try_from(jobs.len()).expect("Job order does not fit in a cache file");
    let header = CacheHeader {
        magic: CACHE_MAGIC.to_le(),
        version: CACHE_VERSION.to_le(),
        radius: radius.to_le(),
        sync_repetitions: sync_repetitions.to_le(),
        count: count.to_le(),
    };

    let mut bytes = Vec::with_capacity(HEADER_SIZE + jobs.len() * RECORD_SIZE);
    bytes.extend_from_slice(bytemuck::bytes_of(&header));
    for job in jobs {
        bytes.extend_from_slice(bytemuck::bytes_of(&JobRecord::from(job)));
    }
    bytes
}

pub fn decode_jobs(bytes: &[u8], radius: u32, sync_repetitions: u32) -> Result<Vec<Job>, CacheError> {
    if bytes.len() < HEADER_SIZE {
        return Err(CacheError::MissingHeader(bytes.len()));
    }

    let (header_bytes, payload) = bytes.split_at(HEADER_SIZE);
    let header: CacheHeader = bytemuck::pod_read_unaligned(header_bytes);

    if u32::from_le(header.magic) != CACHE_MAGIC {
        return Err(CacheError::BadMagic);
    }

    let version = u32::from_le(header.version);
    if version != CACHE_VERSION {
        return Err(CacheError::Version(version));
    }

    let found_radius = u32::from_le(header.radius);
    let found_syncs = u32::from_le(header.sync_repetitions);
    if found_radius != radius || found_syncs != sync_repetitions {
        return Err(CacheError::Parameters {
            radius,
            syncs: sync_repetitions,
            found_radius,
            found_syncs,
        });
    }

    let expected = u32::from_le(header.count) as usize * RECORD_SIZE;
    if payload.len() != expected {
        return Err(CacheError::Length {
            expected,
            found: payload.len(),
        });
    }

    payload
        .chunks_exact(RECORD_SIZE)
        .map(|record| Job::try_from(bytemuck::pod_read_unaligned::<JobRecord>(record)))
        .collect()
}

pub fn read_jobs(path: &Path, radius: u32, sync_repetitions: u32) -> Result<Vec<Job>, CacheError> {
    let mut bytes = Vec::new();
    File::open(path)?.read_to_end(&mut bytes)?;
    decode_jobs(&bytes, radius, sync_repetitions)
}

/// Writes through a temporary file, so a crash mid-write can't leave a truncated cache behind.
pub fn write_jobs(
    path: &Path,
    radius: u32,
    sync_repetitions: u32,
    jobs: &[Job],
) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("bin.tmp");
    {
        let mut file = File::create(&temp_path)?;
        file.write_all(&encode_jobs(radius, sync_repetitions, jobs))?;
        file.sync_all()?;
    }
    fs::rename(&temp_path, path)?;
    Ok(())
}
