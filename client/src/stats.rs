use bytesize::ByteSize;
use engine::{
    chunk_loader::{LapOutcome, LapReport},
    rendering::{headless::HeadlessGpuBackend, mesh_renderer::FrameStatistics},
    world_stats::LoaderStatisticsSnapshot,
};

use crate::fps_counter::FpsCounter;

/// Accumulates lap reports between two statistics lines.
#[derive(Default)]
pub struct ReportSummary {
    laps: u32,
    budget_limited_laps: u32,
    meshes_built: u32,
    empty_meshes: u32,
    chunks_evicted: u32,
    slowest_lap_ms: f64,
    peak_faces_drawn: u64,
}

impl ReportSummary {
    pub fn add(&mut self, report: &LapReport) {
        self.laps += 1;
        if report.outcome == LapOutcome::BudgetExhausted {
            self.budget_limited_laps += 1;
        }
        self.meshes_built += report.meshes_built;
        self.empty_meshes += report.empty_meshes;
        self.chunks_evicted += report.chunks_evicted;
        self.slowest_lap_ms = self
            .slowest_lap_ms
            .max(report.elapsed.as_secs_f64() * 1000.0);
    }

    pub fn add_frame(&mut self, frame: &FrameStatistics) {
        self.peak_faces_drawn = self.peak_faces_drawn.max(frame.faces_drawn);
    }

    pub fn log_and_reset(
        &mut self,
        loader: &LoaderStatisticsSnapshot,
        gpu: &HeadlessGpuBackend,
        fps: &FpsCounter,
    ) {
        log::info!(
            "laps {} (+{}, {} budget limited, slowest {:.2} ms), meshes +{} ({} empty), resident chunks {} ({} evicted), resident meshes {}",
            loader.laps,
            self.laps,
            self.budget_limited_laps,
            self.slowest_lap_ms,
            self.meshes_built,
            self.empty_meshes,
            loader.resident_chunks,
            self.chunks_evicted,
            loader.resident_meshes,
        );
        log::info!(
            "gpu: {} live meshes ({}), up to {} faces drawn, {} uploaded in total, {} releases; frame {:.2} ms avg, {:.2} ms max; {} dropped reports",
            gpu.live_count(),
            ByteSize(gpu.live_bytes()),
            self.peak_faces_drawn,
            ByteSize(gpu.uploaded_bytes),
            gpu.releases,
            fps.average_frame_time().as_secs_f64() * 1000.0,
            fps.slowest_frame_time().as_secs_f64() * 1000.0,
            loader.dropped_reports,
        );

        *self = Self::default();
    }
}
