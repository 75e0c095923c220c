//! Parameter validation errors

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamsError {
    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f32 },
    #[error("particle radius must be positive, got {0}")]
    NonPositiveRadius(f32),
    #[error("world size {world_size} leaves no room inside the {cell_size}-wide boundary band")]
    WorldTooSmall { world_size: f32, cell_size: f32 },
    #[error("at least one sub-step is required")]
    NoSubSteps,
    #[error("step duration must be positive, got {0}")]
    NonPositiveStep(f32),
    #[error("bounce factor must lie in [0, 1], got {0}")]
    BounceOutOfRange(f32),
    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f32 },
}
