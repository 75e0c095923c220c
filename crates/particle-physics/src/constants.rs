//! Default physical constants for the particle simulation
//!
//! Units are world units (pixels of the square world) and seconds. These are the
//! values the simulation parameters fall back to.

/// Edge length of the square world
pub const WORLD_SIZE: f32 = 512.0;

/// Default particle radius
pub const PARTICLE_RADIUS: f32 = 2.0;

/// Magnitude of the gravity vector
/// If too strong, particles will skip cells between sub-steps
pub const GRAVITY_STRENGTH: f32 = 200.0;

/// Duration of one frame
pub const STEP_DT: f32 = 1.0 / 60.0;

/// Verlet sub-steps per frame
pub const SUB_STEPS: u32 = 8;

/// Fraction of velocity kept after hitting a wall
pub const BOUNCE_FACTOR: f32 = 0.66;

/// Gain applied to radial pull/push accelerations
pub const INTERACTION_STRENGTH: f32 = 5.0;

/// Default particle color (opaque white, RGBA)
pub const DEFAULT_COLOR: [u8; 4] = [255, 255, 255, 255];
