//! Simulation module
//!
//! All balloon logic lives here. Rules:
//! - Fixed timestep only, time comes from the simulation clock
//! - Seeded RNG only
//! - Physics goes through the `world` adapter, never rapier directly
//! - No DOM or platform dependencies (overlays are a trait)

pub mod balloon;
pub mod force;
pub mod inflate;
pub mod overlay;
pub mod schedule;
pub mod state;
pub mod tick;
pub mod world;

pub use balloon::{
    Balloon, BalloonId, BalloonState, Detonation, ExplodeError, ExplosionParams, InflateProgress,
    ResizeError,
};
pub use force::{fragment_launch, jitter_force, radial_impulse, random_direction};
pub use inflate::{InflateConfig, Inflation};
pub use overlay::{BodyPose, Overlay, PageOffset, Placement};
pub use schedule::{Scheduler, Task};
pub use state::{Boundaries, Simulation, create_boundaries, spawn_balloons};
pub use tick::{TickInput, advance, run_for, tick};
pub use world::{BodyId, BodyKind, CircleDesc, Material, Outline, RectDesc, World};
