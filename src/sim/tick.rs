//! Fixed timestep simulation tick
//!
//! One tick = timers, input, before-step jitter, engine step, after-step
//! overlay sync.

use super::balloon::BalloonId;
use super::force::jitter_force;
use super::state::Simulation;
use crate::consts::*;

/// Input gathered between ticks (clicks, button presses)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Flip gravity mode
    pub toggle_gravity: bool,
    /// Balloons clicked since the last tick
    pub pops: Vec<BalloonId>,
}

impl TickInput {
    pub fn is_empty(&self) -> bool {
        !self.toggle_gravity && self.pops.is_empty()
    }
}

/// Advance the simulation by one fixed step
pub fn tick(sim: &mut Simulation, input: &TickInput) {
    sim.time_ticks += 1;
    sim.clock_ms += STEP_MS as f64;

    if input.toggle_gravity {
        sim.toggle_gravity();
    }
    for &id in &input.pops {
        let params = sim.settings.explosion;
        if let Err(e) = sim.explode(id, params) {
            log::debug!("Click on balloon {}: {}", id, e);
        }
    }

    // Timers (pop timers and inflate increments) due by now
    while let Some(task) = sim.scheduler.pop_due(sim.clock_ms) {
        sim.run_task(task);
    }

    apply_jitter(sim);
    sim.world.step();
    sync_overlays(sim);
}

/// Before-step: nudge every intact balloon
fn apply_jitter(sim: &mut Simulation) {
    let magnitude = sim.settings.jitter_magnitude;
    for balloon in sim.balloons.iter().filter(|b| b.is_intact()) {
        if let Some(body) = balloon.body() {
            let force = jitter_force(&mut sim.rng, magnitude);
            sim.world.apply_force(body, force);
        }
    }
}

/// After-step: move overlays onto their bodies
fn sync_overlays(sim: &mut Simulation) {
    for balloon in sim.balloons.iter_mut() {
        balloon.update_position(&sim.world);
    }
}

/// Feed a frame's elapsed time through the fixed-step accumulator.
/// Input is consumed by the first tick. Returns the number of ticks run.
pub fn advance(sim: &mut Simulation, input: &mut TickInput, frame_ms: f32) -> u32 {
    sim.accumulator += frame_ms.clamp(0.0, MAX_FRAME_MS);

    let mut substeps = 0;
    while sim.accumulator >= STEP_MS && substeps < MAX_SUBSTEPS {
        let frame_input = std::mem::take(input);
        tick(sim, &frame_input);
        sim.accumulator -= STEP_MS;
        substeps += 1;
    }
    if substeps == MAX_SUBSTEPS {
        // Drop the backlog rather than spiral
        sim.accumulator = sim.accumulator.min(STEP_MS);
    }
    substeps
}

/// Tick with no input until `ms` of simulation time have passed
pub fn run_for(sim: &mut Simulation, ms: f64) {
    let end = sim.clock_ms + ms;
    let idle = TickInput::default();
    while sim.clock_ms < end {
        tick(sim, &idle);
    }
}
