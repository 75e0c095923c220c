//! Simulation parameters for runtime tuning

use particle_physics::{
    BOUNCE_FACTOR, GRAVITY_STRENGTH, INTERACTION_STRENGTH, PARTICLE_RADIUS, STEP_DT, SUB_STEPS,
    WORLD_SIZE,
};
use serde::Deserialize;

use crate::ParamsError;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Edge of the square world
    pub world_size: f32,
    /// Radius the grid is sized for (cell edge = diameter)
    pub particle_radius: f32,
    pub sub_steps: u32,
    /// Frame duration, split evenly across sub-steps
    pub step_dt: f32,
    pub gravity_strength: f32,
    /// Restitution applied on wall hits
    pub bounce_factor: f32,
    /// Gain of radial pull/push
    pub interaction_strength: f32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            world_size: WORLD_SIZE,
            particle_radius: PARTICLE_RADIUS,
            sub_steps: SUB_STEPS,
            step_dt: STEP_DT,
            gravity_strength: GRAVITY_STRENGTH,
            bounce_factor: BOUNCE_FACTOR,
            interaction_strength: INTERACTION_STRENGTH,
        }
    }
}

impl SimulationParams {
    /// Grid cell edge, one particle diameter
    pub fn cell_size(&self) -> f32 {
        2.0 * self.particle_radius
    }

    pub fn sub_step_dt(&self) -> f32 {
        self.step_dt / self.sub_steps as f32
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        let fields = [
            ("world_size", self.world_size),
            ("particle_radius", self.particle_radius),
            ("step_dt", self.step_dt),
            ("gravity_strength", self.gravity_strength),
            ("bounce_factor", self.bounce_factor),
            ("interaction_strength", self.interaction_strength),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(ParamsError::NotFinite { name, value });
            }
        }

        if self.particle_radius <= 0.0 {
            return Err(ParamsError::NonPositiveRadius(self.particle_radius));
        }
        // Boundaries sit one cell in from each edge, leave room between them
        if self.world_size <= 2.0 * self.cell_size() {
            return Err(ParamsError::WorldTooSmall {
                world_size: self.world_size,
                cell_size: self.cell_size(),
            });
        }
        if self.sub_steps == 0 {
            return Err(ParamsError::NoSubSteps);
        }
        if self.step_dt <= 0.0 {
            return Err(ParamsError::NonPositiveStep(self.step_dt));
        }
        if !(0.0..=1.0).contains(&self.bounce_factor) {
            return Err(ParamsError::BounceOutOfRange(self.bounce_factor));
        }
        for (name, value) in [
            ("gravity_strength", self.gravity_strength),
            ("interaction_strength", self.interaction_strength),
        ] {
            if value < 0.0 {
                return Err(ParamsError::Negative { name, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = SimulationParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.cell_size(), 4.0);
        assert_eq!(params.sub_step_dt(), STEP_DT / 8.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = [
            SimulationParams {
                particle_radius: 0.0,
                ..Default::default()
            },
            SimulationParams {
                world_size: 8.0,
                ..Default::default()
            },
            SimulationParams {
                sub_steps: 0,
                ..Default::default()
            },
            SimulationParams {
                step_dt: -1.0,
                ..Default::default()
            },
            SimulationParams {
                bounce_factor: 1.5,
                ..Default::default()
            },
            SimulationParams {
                gravity_strength: -1.0,
                ..Default::default()
            },
            SimulationParams {
                world_size: f32::NAN,
                ..Default::default()
            },
        ];
        for params in bad {
            assert!(params.validate().is_err(), "{params:?} should be rejected");
        }
    }

    #[test]
    fn test_error_names_field() {
        let params = SimulationParams {
            interaction_strength: f32::INFINITY,
            ..Default::default()
        };
        let message = params.validate().unwrap_err().to_string();
        assert!(message.contains("interaction_strength"));
    }
}
