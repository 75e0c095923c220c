//! Headless Verlet particle simulation
//!
//! Streams particles from two emitters into a closed box and logs timing.

mod spawner;

use anyhow::{Context, Result};
use clap::Parser;
use particle_simulation::{SimulationParams, Simulator, ThreadPool};
use serde::Deserialize;
use spawner::{Spawner, SpawnerConfig};
use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

const LOG_INTERVAL: u64 = 60;

#[derive(Parser, Debug)]
#[command(about = "Verlet particle simulation on a uniform grid")]
struct Args {
    /// YAML scenario with `simulation` and `spawner` sections
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of frames to simulate
    #[arg(short, long, default_value_t = 600)]
    frames: u64,

    /// Worker threads (defaults to available parallelism)
    #[arg(short, long)]
    threads: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DriverConfig {
    simulation: SimulationParams,
    spawner: SpawnerConfig,
}

fn load_config(path: &Path) -> Result<DriverConfig> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let config = serde_yaml::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

fn main() -> Result<()> {
    // Initialize logger (RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => {
            let config = load_config(path)?;
            log::info!("✓ Loaded scenario {}", path.display());
            config
        }
        None => DriverConfig::default(),
    };

    let pool = match args.threads {
        Some(n) => ThreadPool::new(n),
        None => ThreadPool::with_available_parallelism(),
    }
    .context("spawning worker threads")?;
    log::info!("✓ Thread pool ready with {} workers", pool.thread_count());

    let params = config.simulation;
    let mut sim = Simulator::new(params, &pool)?;
    let spawner = Spawner::new(config.spawner, params.world_size, params.particle_radius);
    spawner.scatter(&mut sim, &mut rand::rng());

    let mut frame_times: VecDeque<f32> = VecDeque::with_capacity(LOG_INTERVAL as usize);
    let mut total_ms = 0.0f64;
    let mut worst_ms = 0.0f32;
    let started = Instant::now();

    for frame in 1..=args.frames {
        let elapsed = frame as f32 * params.step_dt;
        spawner.emit(&mut sim, elapsed);

        let frame_start = Instant::now();
        sim.step();
        let frame_time = frame_start.elapsed().as_secs_f32() * 1000.0;

        total_ms += frame_time as f64;
        worst_ms = worst_ms.max(frame_time);
        frame_times.push_back(frame_time);
        if frame_times.len() > LOG_INTERVAL as usize {
            frame_times.pop_front();
        }

        if frame % LOG_INTERVAL == 0 {
            let avg = frame_times.iter().sum::<f32>() / frame_times.len() as f32;
            log::info!(
                "frame {:>5}: {:>6} particles, step {:.2} ms avg ({:.0} steps/s)",
                frame,
                sim.entity_count(),
                avg,
                1000.0 / avg.max(f32::EPSILON)
            );
        }
    }

    if args.frames > 0 {
        log::info!(
            "✓ Simulated {} frames with {} particles in {:.2?}",
            args.frames,
            sim.entity_count(),
            started.elapsed()
        );
        log::info!(
            "  step time: {:.2} ms mean, {:.2} ms worst",
            total_ms / args.frames as f64,
            worst_ms
        );
    }

    Ok(())
}
