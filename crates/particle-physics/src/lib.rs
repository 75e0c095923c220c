//! # Particle Physics
//!
//! Plain-data building blocks for a 2D Verlet particle simulation: the particle
//! record, the uniform spatial grid used for broad-phase culling, and the
//! external accelerations an input layer can apply.

pub mod color;
pub mod constants;
pub mod forces;
pub mod grid;
pub mod particle;

pub use color::*;
pub use constants::*;
pub use forces::*;
pub use grid::*;
pub use particle::*;
