//! Particle emitters feeding the simulation
//!
//! Two emitters sit near the top corners and fire streams towards the middle,
//! alternating per particle. Spawned particles take a color cycling with time.

use glam::Vec2;
use particle_physics::time_based_rgb;
use particle_simulation::Simulator;
use rand::Rng;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    /// Stop emitting once this many particles exist
    pub max_particles: usize,
    /// Particles emitted per frame
    pub spawner_count: usize,
    /// Vertical distance between particles emitted in the same frame
    pub spacing: f32,
    /// Launch speed (world units per second)
    pub speed: f32,
    /// Particles scattered over the world before the first frame
    pub initial_particles: usize,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            max_particles: 12_000,
            spawner_count: 20,
            spacing: 4.0,
            speed: 500.0,
            initial_particles: 0,
        }
    }
}

pub struct Spawner {
    config: SpawnerConfig,
    left: Vec2,
    right: Vec2,
}

impl Spawner {
    pub fn new(config: SpawnerConfig, world_size: f32, radius: f32) -> Self {
        let left = Vec2::new(4.0, 50.0);
        // Shifted up so both streams interleave instead of colliding head-on
        let right = Vec2::new(world_size - 4.0, 50.0 - (radius + config.spacing));
        Self {
            config,
            left,
            right,
        }
    }

    /// Scatter the initial population uniformly over the world interior
    pub fn scatter(&self, sim: &mut Simulator, rng: &mut impl Rng) {
        let params = *sim.params();
        let lo = params.cell_size();
        let hi = params.world_size - lo;
        for _ in 0..self.config.initial_particles {
            let position = Vec2::new(rng.random_range(lo..hi), rng.random_range(lo..hi));
            sim.spawn(position, params.particle_radius);
        }
        log::info!("Scattered {} particles", self.config.initial_particles);
    }

    /// Emit one frame's worth of particles; returns how many were spawned
    pub fn emit(&self, sim: &mut Simulator, elapsed: f32) -> usize {
        let remaining = self.config.max_particles.saturating_sub(sim.entity_count());
        let count = self.config.spawner_count.min(remaining);
        let radius = sim.params().particle_radius;
        let color = time_based_rgb(elapsed);

        for i in 0..count {
            let offset = Vec2::new(0.0, i as f32 * self.config.spacing);
            let (origin, direction) = if i % 2 == 0 {
                (self.left, Vec2::new(0.5, 0.5))
            } else {
                (self.right, Vec2::new(-0.5, 0.5))
            };

            let particle = sim.spawn(origin + offset, radius);
            particle.color = color;
            let id = particle.id;
            sim.set_velocity(id, direction * self.config.speed);
        }
        count
    }
}
