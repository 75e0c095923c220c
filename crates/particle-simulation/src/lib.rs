//! # Particle Simulation Engine
//!
//! CPU Verlet simulation of circular particles. Collision resolution runs on a
//! hand-rolled thread pool, made race-free by scanning the broad-phase grid in
//! two passes of non-adjacent column stripes.

pub mod collision;
pub mod error;
pub mod params;
pub mod simulator;
pub mod thread_pool;

mod slots;

pub use collision::{resolve_collisions, resolve_pair, StripePlan, STENCIL};
pub use error::*;
pub use params::*;
pub use simulator::*;
pub use thread_pool::*;
