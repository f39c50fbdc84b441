//! Simulation state and bootstrap
//!
//! Owns the physics world, the balloons and the timer queue. Per-step
//! behaviour lives in `tick`.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::balloon::{
    Balloon, BalloonId, Detonation, ExplodeError, ExplosionParams, InflateProgress, ResizeError,
};
use super::overlay::Overlay;
use super::schedule::{Scheduler, Task};
use super::world::{BodyId, RectDesc, World};
use crate::Settings;
use crate::consts::*;

/// The four static walls around the playfield
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boundaries {
    pub ground: BodyId,
    pub ceiling: BodyId,
    pub left_wall: BodyId,
    pub right_wall: BodyId,
}

/// Walls `WALL_THICKNESS` thick hugging the outside of a `width × height` area
pub fn create_boundaries(world: &mut World, width: f32, height: f32) -> Boundaries {
    let t = WALL_THICKNESS;
    let ground = world.add_rectangle(&RectDesc {
        center: Vec2::new(width / 2.0, height + t / 2.0),
        size: Vec2::new(width, t),
        restitution: 0.0,
    });
    let ceiling = world.add_rectangle(&RectDesc {
        center: Vec2::new(width / 2.0, -t / 2.0),
        size: Vec2::new(width, t),
        restitution: CEILING_RESTITUTION,
    });
    let left_wall = world.add_rectangle(&RectDesc {
        center: Vec2::new(-t / 2.0, height / 2.0),
        size: Vec2::new(t, height),
        restitution: 0.0,
    });
    let right_wall = world.add_rectangle(&RectDesc {
        center: Vec2::new(width + t / 2.0, height / 2.0),
        size: Vec2::new(t, height),
        restitution: 0.0,
    });
    Boundaries {
        ground,
        ceiling,
        left_wall,
        right_wall,
    }
}

/// Random `rgb(r, g, b)` CSS colour
pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> String {
    let r: u8 = rng.random();
    let g: u8 = rng.random();
    let b: u8 = rng.random();
    format!("rgb({r}, {g}, {b})")
}

/// Detached balloons at random spots in the spawn band
pub fn spawn_balloons<R: Rng + ?Sized>(rng: &mut R, settings: &Settings) -> Vec<Balloon> {
    (0..settings.balloon_count)
        .map(|id| {
            let x = rng.random::<f32>() * settings.width;
            let y = settings.spawn_min_y
                + rng.random::<f32>() * (settings.spawn_max_y - settings.spawn_min_y);
            let radius = settings.min_radius
                + rng.random::<f32>() * (settings.max_radius - settings.min_radius);
            let color = random_color(rng);
            Balloon::new(id, Vec2::new(x, y), radius, color).with_inflate(settings.inflate)
        })
        .collect()
}

/// Everything that moves, plus the clock that drives timers
pub struct Simulation {
    pub settings: Settings,
    pub(crate) world: World,
    pub(crate) balloons: Vec<Balloon>,
    pub(crate) boundaries: Boundaries,
    pub(crate) scheduler: Scheduler,
    pub(crate) rng: Pcg32,
    /// Simulation clock (ms)
    pub(crate) clock_ms: f64,
    pub(crate) time_ticks: u64,
    /// Unconsumed frame time (ms)
    pub(crate) accumulator: f32,
    gravity_enabled: bool,
    timers_armed: bool,
    popped: usize,
}

impl Simulation {
    /// Build the world, walls and balloons. Gravity starts off.
    pub fn new(settings: Settings, seed: u64) -> Self {
        let settings = settings.sanitized();
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut world = World::new();
        let boundaries = create_boundaries(&mut world, settings.width, settings.height);

        let mut balloons = spawn_balloons(&mut rng, &settings);
        for balloon in &mut balloons {
            balloon.add(&mut world);
        }
        log::info!(
            "Simulation ready: {} balloons in {}x{} (seed {})",
            balloons.len(),
            settings.width,
            settings.height,
            seed
        );

        Self {
            settings,
            world,
            balloons,
            boundaries,
            scheduler: Scheduler::new(),
            rng,
            clock_ms: 0.0,
            time_ticks: 0,
            accumulator: 0.0,
            gravity_enabled: false,
            timers_armed: false,
            popped: 0,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn boundaries(&self) -> &Boundaries {
        &self.boundaries
    }

    pub fn balloons(&self) -> &[Balloon] {
        &self.balloons
    }

    pub fn balloon(&self, id: BalloonId) -> Option<&Balloon> {
        self.balloons.get(id)
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn gravity_enabled(&self) -> bool {
        self.gravity_enabled
    }

    /// Balloons that have fully popped
    pub fn popped(&self) -> usize {
        self.popped
    }

    /// Balloons still waiting to be popped
    pub fn intact(&self) -> usize {
        self.balloons.iter().filter(|b| b.is_intact()).count()
    }

    /// True when no explosion or timer is pending
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// Give a balloon its visual element
    pub fn attach_overlay(&mut self, id: BalloonId, overlay: Box<dyn Overlay>) {
        if let Some(balloon) = self.balloons.get_mut(id) {
            balloon.set_overlay(overlay);
            balloon.update_position(&self.world);
        }
    }

    /// Register an explosion listener on one balloon
    pub fn on_explode(&mut self, id: BalloonId, callback: impl FnMut(&Balloon) + 'static) {
        if let Some(balloon) = self.balloons.get_mut(id) {
            balloon.on_explode(callback);
        }
    }

    /// Start popping a balloon; the inflate animation runs on timers
    pub fn explode(&mut self, id: BalloonId, params: ExplosionParams) -> Result<(), ExplodeError> {
        let balloon = self
            .balloons
            .get_mut(id)
            .ok_or(ExplodeError::UnknownBalloon(id))?;
        balloon.explode(params)?;
        self.scheduler.schedule(self.clock_ms, Task::Inflate(id));
        Ok(())
    }

    /// Replace a balloon's body with one of a new radius
    pub fn resize(&mut self, id: BalloonId, radius: f32) -> Result<(), ResizeError> {
        let balloon = self
            .balloons
            .get_mut(id)
            .ok_or(ResizeError::UnknownBalloon(id))?;
        balloon.resize(&mut self.world, radius)
    }

    /// Flip gravity mode. The first activation arms a pop timer on every
    /// balloon. Returns the new mode.
    pub fn toggle_gravity(&mut self) -> bool {
        self.gravity_enabled = !self.gravity_enabled;
        if self.gravity_enabled {
            self.world.set_gravity(Vec2::new(0.0, self.settings.gravity_y));
            log::info!("Gravity enabled ({})", self.settings.gravity_y);
            if !self.timers_armed {
                self.arm_timers();
            }
        } else {
            self.world.set_gravity(Vec2::ZERO);
            log::info!("Gravity disabled");
        }
        self.gravity_enabled
    }

    fn arm_timers(&mut self) {
        self.timers_armed = true;
        for id in 0..self.balloons.len() {
            let delay = self.settings.timer_min_ms
                + self.rng.random::<f64>() * self.settings.timer_spread_ms;
            self.scheduler
                .schedule(self.clock_ms + delay, Task::Explode(id));
            log::debug!("Balloon {} will pop in {:.0} ms", id, delay);
        }
        log::info!("Armed {} pop timers", self.balloons.len());
    }

    /// Run one timer task
    pub(crate) fn run_task(&mut self, task: Task) {
        match task {
            Task::Explode(id) => {
                let params = self.settings.explosion;
                // Already popped by a click is fine
                if let Err(e) = self.explode(id, params) {
                    log::debug!("Pop timer for balloon {}: {}", id, e);
                }
            }
            Task::Inflate(id) => {
                let Some(balloon) = self.balloons.get_mut(id) else {
                    return;
                };
                match balloon.inflate_step(&mut self.world) {
                    InflateProgress::Pending { next_in_ms } => {
                        self.scheduler
                            .schedule(self.clock_ms + next_in_ms, Task::Inflate(id));
                    }
                    InflateProgress::Ready => {
                        if let Some(detonation) = balloon.detonate(&mut self.world, &mut self.rng)
                        {
                            self.on_detonation(&detonation);
                        }
                    }
                    InflateProgress::Idle => {}
                }
            }
        }
    }

    fn on_detonation(&mut self, detonation: &Detonation) {
        self.popped += 1;
        log::debug!(
            "{} popped, {} intact, {} bodies in world after blast at {:?}",
            self.popped,
            self.intact(),
            self.world.len(),
            detonation.center
        );
    }
}
