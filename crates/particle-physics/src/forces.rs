//! External accelerations: directional gravity and radial pull/push

use glam::Vec2;

/// Direction gravity points to, in screen coordinates (+y is down)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GravityDirection {
    Up,
    Down,
    Left,
    Right,
}

impl GravityDirection {
    /// Gravity vector of the given magnitude
    pub fn vector(self, strength: f32) -> Vec2 {
        match self {
            GravityDirection::Up => Vec2::new(0.0, -strength),
            GravityDirection::Down => Vec2::new(0.0, strength),
            GravityDirection::Left => Vec2::new(-strength, 0.0),
            GravityDirection::Right => Vec2::new(strength, 0.0),
        }
    }
}

/// Acceleration pulling `position` towards `point`
///
/// Proportional to `radius - distance`, zero outside `radius`.
pub fn radial_pull(point: Vec2, position: Vec2, radius: f32, strength: f32) -> Vec2 {
    let dir = point - position;
    let dist = dir.length();
    dir * (strength * (radius - dist)).max(0.0)
}

/// Acceleration pushing `position` away from `point`
///
/// Mirror of [`radial_pull`], zero outside `radius`.
pub fn radial_push(point: Vec2, position: Vec2, radius: f32, strength: f32) -> Vec2 {
    let dir = point - position;
    let dist = dir.length();
    dir * (-strength * (radius - dist)).min(0.0)
}
