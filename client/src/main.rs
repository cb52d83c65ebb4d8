use std::time::Instant;

use engine::{
    config::{config_manager::Config, streaming_config::StreamingConfig},
    rendering::headless::HeadlessGpuBackend,
    world::World,
    world_storage::GeneratedWorldStorage,
    worldgen::{WorldGenerator, noise_world_generator::NoiseWorldGenerator},
};

use crate::{
    config::ClientConfig, fps_counter::FpsCounter, observer::ObserverPath, stats::ReportSummary,
};

mod config;
mod fps_counter;
mod observer;
mod stats;

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init_timed();
    log::info!("Starting streaming client...");

    let streaming_config = StreamingConfig::create_manager()?.snapshot();
    let client_config = ClientConfig::create_manager()?.snapshot();
    let path = ObserverPath::from_config(&client_config);

    let storage = GeneratedWorldStorage::new(NoiseWorldGenerator::new(streaming_config.seed));
    let (mut world, mut renderer) =
        World::start::<HeadlessGpuBackend>(&streaming_config, storage, path.position_at(0.0))?;
    let mut gpu = HeadlessGpuBackend::new();

    let mut fps = FpsCounter::new();
    let mut summary = ReportSummary::default();
    let started = Instant::now();
    let mut last_stats = started;

    loop {
        let frame_started = Instant::now();
        let elapsed = frame_started.duration_since(started);
        if client_config
            .run_duration()
            .is_some_and(|duration| elapsed >= duration)
        {
            break;
        }

        world.set_observer(path.position_at(elapsed.as_secs_f32()));
        let frame = renderer.frame(&mut gpu);
        summary.add_frame(&frame);

        for report in world.poll_reports() {
            summary.add(&report);
        }

        if last_stats.elapsed() >= client_config.stats_interval() {
            summary.log_and_reset(&world.statistics(), &gpu, &fps);
            last_stats = Instant::now();
        }

        profiling::finish_frame!();
        fps.tick();

        if let Some(remaining) = client_config
            .frame_time()
            .checked_sub(frame_started.elapsed())
        {
            std::thread::sleep(remaining);
        }
    }

    world.shutdown();
    // Apply whatever the loader published last before tearing down
    renderer.frame(&mut gpu);
    summary.log_and_reset(&world.statistics(), &gpu, &fps);
    renderer.release_all(&mut gpu);

    log::info!(
        "Shut down after {:.1} s, {} task buffers applied",
        started.elapsed().as_secs_f32(),
        renderer.laps_applied()
    );

    Ok(())
}
