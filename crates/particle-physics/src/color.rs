//! Display colors for spawned particles

use std::f32::consts::PI;

/// Rainbow color cycling with `t` (seconds)
///
/// Each channel is `255 * sin²(t + phase)` with phases a third of a turn apart.
pub fn time_based_rgb(t: f32) -> [u8; 4] {
    let r = t.sin();
    let g = (t + 0.33 * 2.0 * PI).sin();
    let b = (t + 0.66 * 2.0 * PI).sin();
    [channel(r), channel(g), channel(b), 255]
}

fn channel(s: f32) -> u8 {
    (255.0 * s * s) as u8
}
