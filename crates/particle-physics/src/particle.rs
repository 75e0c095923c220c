//! Particle state and Verlet integration primitives

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::constants::DEFAULT_COLOR;

/// A circular particle integrated with position Verlet
///
/// Velocity is not stored. It is implied by the difference between the current
/// and the previous position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Current position
    pub position: Vec2,
    /// Position at the previous sub-step
    pub position_last: Vec2,
    /// Acceleration accumulated since the last integration
    pub acceleration: Vec2,
    pub radius: f32,
    /// RGBA display color, ignored by the physics
    pub color: [u8; 4],
    /// Grid column derived from `position.x`
    pub grid_col: i32,
    /// Grid row derived from `position.y`
    pub grid_row: i32,
    /// Index of this particle in the owning array
    pub id: usize,
}

impl Particle {
    /// Create a particle at rest
    pub fn new(position: Vec2, radius: f32, grid_col: i32, grid_row: i32, id: usize) -> Self {
        Self {
            position,
            position_last: position,
            acceleration: Vec2::ZERO,
            radius,
            color: DEFAULT_COLOR,
            grid_col,
            grid_row,
            id,
        }
    }

    /// Advance one sub-step (Störmer-Verlet) and reset the accumulated acceleration
    pub fn update_position(&mut self, dt: f32) {
        let displacement = self.position - self.position_last;
        self.position_last = self.position;
        self.position += displacement + self.acceleration * (dt * dt);
        self.acceleration = Vec2::ZERO;
    }

    pub fn accelerate(&mut self, acceleration: Vec2) {
        self.acceleration += acceleration;
    }

    /// Displacement over the last sub-step
    pub fn velocity(&self) -> Vec2 {
        self.position - self.position_last
    }

    /// Set the implied velocity to `velocity * dt`
    pub fn set_velocity(&mut self, velocity: Vec2, dt: f32) {
        self.position_last = self.position - velocity * dt;
    }

    /// Add `velocity * dt` to the implied velocity
    pub fn add_velocity(&mut self, velocity: Vec2, dt: f32) {
        self.position_last -= velocity * dt;
    }

    /// Packed view for renderers
    pub fn instance(&self) -> ParticleInstance {
        ParticleInstance {
            position: self.position.to_array(),
            radius: self.radius,
            color: u32::from_le_bytes(self.color),
        }
    }
}

/// GPU-compatible particle instance
/// Aligned for WGSL struct compatibility
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 2],
    pub radius: f32,
    /// RGBA, little-endian packed (red in the low byte)
    pub color: u32,
}
