//! Balloon Pop - poppable physics balloons in the browser
//!
//! Core modules:
//! - `sim`: Simulation (rapier world adapter, balloons, explosions, timers)
//! - `platform`: Browser host (DOM overlays, toggle button, render loop)
//! - `settings`: Data-driven tuning, overridable from LocalStorage

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod platform;
pub mod settings;
pub mod sim;

pub use settings::Settings;

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep in milliseconds (60 Hz, the rate the forces are tuned for)
    pub const STEP_MS: f32 = 1000.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta fed to the accumulator (ms)
    pub const MAX_FRAME_MS: f32 = 100.0;

    /// World dimensions (pixels)
    pub const WORLD_WIDTH: f32 = 800.0;
    pub const WORLD_HEIGHT: f32 = 600.0;
    /// Boundary wall thickness; walls sit just outside the world rect
    pub const WALL_THICKNESS: f32 = 20.0;
    pub const CEILING_RESTITUTION: f32 = 0.9;

    /// Balloon population
    pub const BALLOON_COUNT: usize = 10;
    pub const BALLOON_MIN_RADIUS: f32 = 30.0;
    pub const BALLOON_MAX_RADIUS: f32 = 50.0;
    /// Vertical band balloons spawn in
    pub const SPAWN_MIN_Y: f32 = 300.0;
    pub const SPAWN_MAX_Y: f32 = 400.0;

    /// Balloon material
    pub const BALLOON_FRICTION: f32 = 0.02;
    pub const BALLOON_AIR_FRICTION: f32 = 0.01;
    pub const BALLOON_RESTITUTION: f32 = 0.8;

    /// Per-step random nudge applied to every intact balloon
    pub const JITTER_MAGNITUDE: f32 = 0.0005;
    /// Gravity y while gravity mode is on (negative: balloons float up)
    pub const GRAVITY_Y: f32 = -0.05;

    /// Explosion defaults
    pub const FORCE_MAGNITUDE: f32 = 5.0;
    pub const BLAST_RADIUS: f32 = 400.0;
    pub const FRAGMENT_COUNT: usize = 20;
    /// Fragments start at blast_radius / divisor from the center
    pub const FRAGMENT_OFFSET_DIVISOR: f32 = 10.0;
    pub const FRAGMENT_RADIUS: f32 = 2.0;
    /// Upper bound on fragments per explosion
    pub const MAX_FRAGMENT_COUNT: usize = 500;

    /// Inflate animation: +5% per step up to 120%, one step every 50 ms
    pub const INFLATE_STEP: f32 = 0.05;
    pub const INFLATE_TARGET: f32 = 1.2;
    pub const INFLATE_INTERVAL_MS: f64 = 50.0;
    /// Smallest inflate step a loaded config may use
    pub const INFLATE_MIN_STEP: f32 = 0.001;

    /// Gravity-armed explosion timers fire after MIN + U[0,1) * SPREAD ms
    pub const TIMER_MIN_MS: f64 = 5000.0;
    pub const TIMER_SPREAD_MS: f64 = 10000.0;
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}
