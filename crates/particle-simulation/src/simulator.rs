//! CPU particle simulation engine
//!
//! Each `step` runs `sub_steps` times:
//! gravity → collisions (striped, parallel) → boundaries (parallel)
//! → integration (parallel) → grid rebuild (serial).

use glam::Vec2;
use particle_physics::{
    radial_pull, radial_push, GravityDirection, Particle, ParticleInstance, SpatialGrid,
};

use crate::collision::resolve_collisions;
use crate::slots::ParticleSlots;
use crate::{ParamsError, SimulationParams, ThreadPool};

/// Particle arena, broad-phase grid and integration state
///
/// Borrows the thread pool for its whole lifetime, so it can never outlive the
/// workers its tasks run on.
pub struct Simulator<'pool> {
    particles: Vec<Particle>,
    grid: SpatialGrid,
    gravity: Vec2,
    params: SimulationParams,
    pool: &'pool ThreadPool,
}

impl<'pool> Simulator<'pool> {
    pub fn new(params: SimulationParams, pool: &'pool ThreadPool) -> Result<Self, ParamsError> {
        params.validate()?;
        let grid = SpatialGrid::new(params.world_size, params.cell_size());
        log::info!(
            "Initializing Simulator: {}x{} grid, cell size {}, {} sub-steps, {} threads",
            grid.columns(),
            grid.rows(),
            grid.cell_size(),
            params.sub_steps,
            pool.thread_count()
        );

        Ok(Self {
            particles: Vec::new(),
            grid,
            gravity: GravityDirection::Down.vector(params.gravity_strength),
            params,
            pool,
        })
    }

    /// Append a particle at rest and register it in the grid
    ///
    /// The returned reference is only valid until the next mutation of the
    /// simulator; address particles by `id` after that.
    pub fn spawn(&mut self, position: Vec2, radius: f32) -> &mut Particle {
        let id = self.particles.len();
        let (col, row) = self.grid.cell_coords(position);
        if !self.grid.insert(id, col, row) {
            log::debug!("Spawned particle {id} outside the grid at {position}");
        }
        self.particles.push(Particle::new(position, radius, col, row, id));
        &mut self.particles[id]
    }

    /// Set the velocity of particle `id` (world units per second)
    pub fn set_velocity(&mut self, id: usize, velocity: Vec2) {
        let dt = self.params.sub_step_dt();
        self.particles[id].set_velocity(velocity, dt);
    }

    /// Add to the velocity of particle `id` (world units per second)
    pub fn nudge_velocity(&mut self, id: usize, velocity: Vec2) {
        let dt = self.params.sub_step_dt();
        self.particles[id].add_velocity(velocity, dt);
    }

    /// Accelerate every particle within `radius` of `point` towards it
    pub fn apply_radial_pull(&mut self, point: Vec2, radius: f32) {
        let strength = self.params.interaction_strength;
        for particle in &mut self.particles {
            particle.accelerate(radial_pull(point, particle.position, radius, strength));
        }
    }

    /// Accelerate every particle within `radius` of `point` away from it
    pub fn apply_radial_push(&mut self, point: Vec2, radius: f32) {
        let strength = self.params.interaction_strength;
        for particle in &mut self.particles {
            particle.accelerate(radial_push(point, particle.position, radius, strength));
        }
    }

    pub fn set_gravity_direction(&mut self, direction: GravityDirection) {
        self.gravity = direction.vector(self.params.gravity_strength);
    }

    /// Advance one frame
    pub fn step(&mut self) {
        let dt = self.params.sub_step_dt();
        for _ in 0..self.params.sub_steps {
            for particle in &mut self.particles {
                particle.accelerate(self.gravity);
            }
            resolve_collisions(self.pool, &self.grid, &mut self.particles);
            self.resolve_boundaries();
            self.integrate(dt);
            self.grid.rebuild(&self.particles);
        }
        log::trace!(
            "Stepped {} particles, {} occupied cells",
            self.particles.len(),
            self.grid.occupied_cells()
        );
    }

    /// Remove every particle
    pub fn clear(&mut self) {
        self.particles.clear();
        self.grid.clear();
    }

    fn resolve_boundaries(&mut self) {
        let lo = self.params.cell_size();
        let hi = self.params.world_size - lo;
        let bounce = self.params.bounce_factor;
        let count = self.particles.len();
        let slots = ParticleSlots::new(&mut self.particles);

        self.pool.parallel_for(count, |start, end| {
            // SAFETY: parallel_for hands out disjoint id ranges
            let particles = unsafe { slots.range_mut(start, end) };
            for particle in particles {
                resolve_boundary(particle, lo, hi, bounce);
            }
        });
    }

    fn integrate(&mut self, dt: f32) {
        let cell_size = self.params.cell_size();
        let grid = &self.grid;
        let count = self.particles.len();
        let slots = ParticleSlots::new(&mut self.particles);

        self.pool.parallel_for(count, |start, end| {
            // SAFETY: parallel_for hands out disjoint id ranges
            let particles = unsafe { slots.range_mut(start, end) };
            for particle in particles {
                integrate_particle(particle, dt, grid, cell_size);
            }
        });
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particle(&self, id: usize) -> &Particle {
        &self.particles[id]
    }

    pub fn particle_mut(&mut self, id: usize) -> &mut Particle {
        &mut self.particles[id]
    }

    pub fn entity_count(&self) -> usize {
        self.particles.len()
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Render-ready copy of every particle
    pub fn instances(&self) -> Vec<ParticleInstance> {
        self.particles.iter().map(Particle::instance).collect()
    }
}

/// Keep a particle inside `[lo, hi]` on both axes, reflecting its velocity
///
/// Axes are handled independently so a corner hit bounces on both.
pub(crate) fn resolve_boundary(particle: &mut Particle, lo: f32, hi: f32, bounce: f32) {
    let mut velocity = particle.velocity();
    let mut hit = false;

    if particle.position.x < lo || particle.position.x > hi {
        particle.position.x = particle.position.x.clamp(lo, hi);
        velocity = Vec2::new(-velocity.x, velocity.y) * bounce;
        hit = true;
    }
    if particle.position.y < lo || particle.position.y > hi {
        particle.position.y = particle.position.y.clamp(lo, hi);
        velocity = Vec2::new(velocity.x, -velocity.y) * bounce;
        hit = true;
    }

    if hit {
        particle.set_velocity(velocity, 1.0);
    }
}

/// Verlet sub-step for one particle, then refresh its grid cell
///
/// Velocity is dropped when a single sub-step would carry the particle past the
/// collision checks of a whole cell.
pub(crate) fn integrate_particle(
    particle: &mut Particle,
    dt: f32,
    grid: &SpatialGrid,
    cell_size: f32,
) {
    particle.update_position(dt);
    let (col, row) = grid.cell_coords(particle.position);
    particle.grid_col = col;
    particle.grid_row = row;

    if particle.velocity().length_squared() > cell_size {
        particle.set_velocity(Vec2::ZERO, 1.0);
    }
}
