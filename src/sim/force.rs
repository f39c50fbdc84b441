//! Force and direction helpers
//!
//! Pure functions over `glam::Vec2`; everything here is deterministic given
//! the RNG passed in.

use glam::Vec2;
use rand::Rng;

use crate::consts::FRAGMENT_OFFSET_DIVISOR;
use crate::polar_to_cartesian;

/// Uniformly random unit vector (angle drawn from [0, 2π))
pub fn random_direction<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    let angle = rng.random::<f32>() * std::f32::consts::TAU;
    polar_to_cartesian(1.0, angle)
}

/// Small random nudge, each component uniform in [-0.5, 0.5) * magnitude
pub fn jitter_force<R: Rng + ?Sized>(rng: &mut R, magnitude: f32) -> Vec2 {
    Vec2::new(
        (rng.random::<f32>() - 0.5) * magnitude,
        (rng.random::<f32>() - 0.5) * magnitude,
    )
}

/// Where a fragment starts and how fast it leaves
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentLaunch {
    pub position: Vec2,
    /// Pixels per step
    pub velocity: Vec2,
}

/// Launch state for a fragment flying out along `direction`
pub fn fragment_launch(
    center: Vec2,
    direction: Vec2,
    blast_radius: f32,
    force_magnitude: f32,
) -> FragmentLaunch {
    FragmentLaunch {
        position: center + direction * (blast_radius / FRAGMENT_OFFSET_DIVISOR),
        velocity: direction * force_magnitude,
    }
}

/// Outward force an explosion at `center` exerts on a body at `target`.
///
/// Falls off as `force_magnitude / distance` (not inverse-square). Bodies at
/// or beyond `blast_radius` get nothing, and so does a body sitting exactly
/// on the center since it has no direction to be pushed in.
pub fn radial_impulse(
    center: Vec2,
    target: Vec2,
    blast_radius: f32,
    force_magnitude: f32,
) -> Option<Vec2> {
    let offset = target - center;
    let distance = offset.length();
    if distance >= blast_radius || distance == 0.0 {
        return None;
    }
    Some(offset / distance * (force_magnitude / distance))
}
