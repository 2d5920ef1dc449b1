//! Spatial position assignment for new sound instances.
//!
//! Positions are picked once at creation time, in the listener's coordinate
//! space: x spans left/right, y up/down, negative z is in front.

use rand::Rng;

use crate::config::SpatializerConfig;

/// Listener ear positions handed to the spatial sink.
pub const LEFT_EAR: [f32; 3] = [-0.1, 0.0, 0.0];
pub const RIGHT_EAR: [f32; 3] = [0.1, 0.0, 0.0];

/// Pick an emitter position for a new instance.
///
/// With randomization on, the position jitters across the configured spread;
/// otherwise every sound is centered in front of the listener at the
/// configured distance.
pub fn pick_position(cfg: &SpatializerConfig) -> [f32; 3] {
    let distance = cfg.distance.max(0.0);
    let spread = cfg.spread.max(0.0);

    if !cfg.randomize || spread == 0.0 {
        return [0.0, 0.0, -distance];
    }

    let mut rng = rand::thread_rng();
    let x = rng.gen_range(-spread..=spread);
    let y = rng.gen_range(-spread * 0.25..=spread * 0.25);
    [x, y, -distance]
}
