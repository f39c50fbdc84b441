//! Balloon entity and its explosion sequence
//!
//! A balloon moves through `Intact -> Exploding -> Removed` exactly once.
//! Exploding is spread over several calls so the inflate animation can be
//! paced by timers while the world keeps stepping:
//!
//! 1. [`Balloon::explode`] commits: callbacks fire, the overlay goes away
//! 2. [`Balloon::inflate_step`] grows the body, once per timer
//! 3. [`Balloon::detonate`] spawns fragments, pushes neighbours and removes
//!    the body

use std::fmt;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::force::{fragment_launch, radial_impulse, random_direction};
use super::inflate::{InflateConfig, Inflation};
use super::overlay::{BodyPose, Overlay};
use super::world::{BodyId, BodyKind, CircleDesc, Material, World};
use crate::consts::*;

/// Index of a balloon in its simulation
pub type BalloonId = usize;

/// Per-explosion tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplosionParams {
    /// Fragment launch speed (px/step) and impulse numerator
    pub force_magnitude: f32,
    /// Bodies this far or further are untouched
    pub blast_radius: f32,
    pub fragment_count: usize,
}

impl Default for ExplosionParams {
    fn default() -> Self {
        Self {
            force_magnitude: FORCE_MAGNITUDE,
            blast_radius: BLAST_RADIUS,
            fragment_count: FRAGMENT_COUNT,
        }
    }
}

impl ExplosionParams {
    pub fn new(force_magnitude: f32, blast_radius: f32, fragment_count: usize) -> Self {
        Self {
            force_magnitude,
            blast_radius,
            fragment_count,
        }
    }

    /// Non-negative force and radius, fragment count capped
    pub fn sanitized(self) -> Self {
        let non_negative = |v: f32, default: f32| if v.is_nan() { default } else { v.max(0.0) };
        Self {
            force_magnitude: non_negative(self.force_magnitude, FORCE_MAGNITUDE),
            blast_radius: non_negative(self.blast_radius, BLAST_RADIUS),
            fragment_count: self.fragment_count.min(MAX_FRAGMENT_COUNT),
        }
    }
}

/// Lifecycle of a balloon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalloonState {
    Intact,
    /// Committed, inflating before the pop
    Exploding,
    /// Popped; the body is gone from the world
    Removed,
}

/// Why an explosion request did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplodeError {
    /// The balloon was never added to a world
    NotAttached,
    /// An earlier call already started the explosion
    AlreadyTriggered,
    /// No balloon with this id
    UnknownBalloon(BalloonId),
}

impl fmt::Display for ExplodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExplodeError::NotAttached => {
                write!(f, "balloon has not been added to a world, cannot explode")
            }
            ExplodeError::AlreadyTriggered => write!(f, "balloon is already exploding"),
            ExplodeError::UnknownBalloon(id) => write!(f, "no balloon with id {id}"),
        }
    }
}

impl std::error::Error for ExplodeError {}

/// Why a resize request did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeError {
    /// Exploding or removed balloons keep their body
    Exploded,
    /// The balloon's body is no longer in the world
    Missing,
    /// No balloon with this id
    UnknownBalloon(BalloonId),
}

impl fmt::Display for ResizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResizeError::Exploded => write!(f, "balloon has exploded, cannot resize"),
            ResizeError::Missing => write!(f, "balloon body is missing from the world"),
            ResizeError::UnknownBalloon(id) => write!(f, "no balloon with id {id}"),
        }
    }
}

impl std::error::Error for ResizeError {}

/// Result of one inflate increment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InflateProgress {
    /// Grew; call again after this many ms
    Pending { next_in_ms: f64 },
    /// Fully inflated, ready to detonate
    Ready,
    /// Not exploding
    Idle,
}

/// What a detonation did to the world
#[derive(Debug, Clone, PartialEq)]
pub struct Detonation {
    pub center: Vec2,
    pub fragments: Vec<BodyId>,
    /// Bodies that received an outward force
    pub pushed: usize,
}

/// Listener fired when a balloon commits to exploding
pub type ExplodeCallback = Box<dyn FnMut(&Balloon)>;

#[derive(Debug, Clone, PartialEq)]
enum BodySlot {
    /// Not in a world yet
    Detached(CircleDesc),
    Attached(BodyId),
    /// Popped
    Gone,
}

#[derive(Debug, Clone, Copy)]
struct PendingExplosion {
    params: ExplosionParams,
    inflation: Inflation,
}

/// Material every balloon body uses
pub fn balloon_material() -> Material {
    Material {
        friction: BALLOON_FRICTION,
        restitution: BALLOON_RESTITUTION,
        air_friction: BALLOON_AIR_FRICTION,
    }
}

/// A poppable balloon
pub struct Balloon {
    id: BalloonId,
    color: String,
    radius: f32,
    body: BodySlot,
    state: BalloonState,
    inflate: InflateConfig,
    overlay: Option<Box<dyn Overlay>>,
    callbacks: Vec<ExplodeCallback>,
    explosion: Option<PendingExplosion>,
}

impl fmt::Debug for Balloon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Balloon")
            .field("id", &self.id)
            .field("color", &self.color)
            .field("radius", &self.radius)
            .field("state", &self.state)
            .field("body", &self.body)
            .field("overlay", &self.overlay.is_some())
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

impl Balloon {
    /// Detached balloon; call [`Balloon::add`] to put it in a world
    pub fn new(id: BalloonId, position: Vec2, radius: f32, color: impl Into<String>) -> Self {
        Self {
            id,
            color: color.into(),
            radius,
            body: BodySlot::Detached(CircleDesc {
                center: position,
                radius,
                material: balloon_material(),
                kind: BodyKind::Balloon,
            }),
            state: BalloonState::Intact,
            inflate: InflateConfig::default(),
            overlay: None,
            callbacks: Vec::new(),
            explosion: None,
        }
    }

    /// Use a non-default inflate animation
    pub fn with_inflate(mut self, inflate: InflateConfig) -> Self {
        self.inflate = inflate;
        self
    }

    pub fn id(&self) -> BalloonId {
        self.id
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    /// Radius the balloon was created (or last resized) with
    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn state(&self) -> BalloonState {
        self.state
    }

    pub fn is_intact(&self) -> bool {
        self.state == BalloonState::Intact
    }

    pub fn is_exploded(&self) -> bool {
        self.state != BalloonState::Intact
    }

    pub fn is_attached(&self) -> bool {
        matches!(self.body, BodySlot::Attached(_))
    }

    /// Live body handle, if attached
    pub fn body(&self) -> Option<BodyId> {
        match self.body {
            BodySlot::Attached(id) => Some(id),
            _ => None,
        }
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    /// Current position: from the world when attached, from the pending
    /// description otherwise
    pub fn position(&self, world: &World) -> Option<Vec2> {
        match &self.body {
            BodySlot::Detached(desc) => Some(desc.center),
            BodySlot::Attached(id) => world.position(*id),
            BodySlot::Gone => None,
        }
    }

    /// Pose of the live body
    pub fn pose(&self, world: &World) -> Option<BodyPose> {
        let id = self.body()?;
        Some(BodyPose {
            position: world.position(id)?,
            angle: world.angle(id)?,
            radius: world.radius(id)?,
        })
    }

    /// Insert the body into `world`. Adding twice keeps the first body.
    pub fn add(&mut self, world: &mut World) -> Option<BodyId> {
        match &self.body {
            BodySlot::Detached(desc) => {
                let id = world.add_circle(desc);
                self.body = BodySlot::Attached(id);
                Some(id)
            }
            BodySlot::Attached(id) => {
                log::warn!("Balloon {} is already in the world", self.id);
                Some(*id)
            }
            BodySlot::Gone => None,
        }
    }

    /// Give the balloon a visual element, replacing (and removing) any old one
    pub fn set_overlay(&mut self, overlay: Box<dyn Overlay>) {
        if let Some(mut old) = self.overlay.replace(overlay) {
            old.remove();
        }
    }

    /// Register a listener fired once when the explosion is committed
    pub fn on_explode(&mut self, callback: impl FnMut(&Balloon) + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    /// Move the overlay to match the body
    pub fn update_position(&mut self, world: &World) {
        if self.overlay.is_none() {
            return;
        }
        if let Some(pose) = self.pose(world) {
            if let Some(overlay) = self.overlay.as_mut() {
                overlay.place(&pose);
            }
        }
    }

    /// Swap the body for a new one of `new_radius` at the same position.
    /// Velocity is not carried over.
    pub fn resize(&mut self, world: &mut World, new_radius: f32) -> Result<(), ResizeError> {
        if !self.is_intact() {
            return Err(ResizeError::Exploded);
        }
        if let BodySlot::Attached(old) = self.body {
            let center = world.position(old).ok_or(ResizeError::Missing)?;
            world.remove(old);
            let id = world.add_circle(&CircleDesc {
                center,
                radius: new_radius,
                material: balloon_material(),
                kind: BodyKind::Balloon,
            });
            self.body = BodySlot::Attached(id);
        } else if let BodySlot::Detached(desc) = &mut self.body {
            desc.radius = new_radius;
        } else {
            return Err(ResizeError::Exploded);
        }
        self.radius = new_radius;
        Ok(())
    }

    /// Commit to exploding. Only the first call on an attached balloon does
    /// anything; the inflate/detonate steps follow via
    /// [`Balloon::inflate_step`] and [`Balloon::detonate`].
    pub fn explode(&mut self, params: ExplosionParams) -> Result<(), ExplodeError> {
        if !self.is_intact() {
            log::debug!("Balloon {} already exploding, ignoring", self.id);
            return Err(ExplodeError::AlreadyTriggered);
        }
        if !self.is_attached() {
            log::error!("Balloon {}: {}", self.id, ExplodeError::NotAttached);
            return Err(ExplodeError::NotAttached);
        }

        self.state = BalloonState::Exploding;

        let mut callbacks = std::mem::take(&mut self.callbacks);
        for callback in callbacks.iter_mut() {
            callback(&*self);
        }

        if let Some(mut overlay) = self.overlay.take() {
            overlay.remove();
        }

        self.explosion = Some(PendingExplosion {
            params: params.sanitized(),
            inflation: Inflation::new(self.inflate, self.radius),
        });
        Ok(())
    }

    /// Grow the body by one increment
    pub fn inflate_step(&mut self, world: &mut World) -> InflateProgress {
        let Some(body) = self.body() else {
            return InflateProgress::Idle;
        };
        let Some(pending) = self.explosion.as_mut() else {
            return InflateProgress::Idle;
        };
        if pending.inflation.is_complete() {
            return InflateProgress::Ready;
        }
        let radius = pending.inflation.advance();
        world.set_circle_radius(body, radius);
        log::trace!(
            "Balloon {} inflating: scale {:.2}",
            self.id,
            pending.inflation.scale()
        );
        InflateProgress::Pending {
            next_in_ms: pending.inflation.interval_ms(),
        }
    }

    /// Pop: spawn fragments, push every other body in range outward, remove
    /// the balloon's body. Returns None unless fully inflated.
    ///
    /// The world is enumerated after the fragments are added, so this
    /// explosion's own fragments are pushed too.
    pub fn detonate<R: Rng + ?Sized>(
        &mut self,
        world: &mut World,
        rng: &mut R,
    ) -> Option<Detonation> {
        let own = self.body()?;
        let pending = self.explosion?;
        if !pending.inflation.is_complete() {
            return None;
        }
        let params = pending.params;
        let center = world.position(own)?;

        let mut fragments = Vec::with_capacity(params.fragment_count);
        for _ in 0..params.fragment_count {
            let direction = random_direction(rng);
            let launch = fragment_launch(
                center,
                direction,
                params.blast_radius,
                params.force_magnitude,
            );
            let fragment = world.add_circle(&CircleDesc {
                center: launch.position,
                radius: FRAGMENT_RADIUS,
                material: Material::default(),
                kind: BodyKind::Fragment,
            });
            world.set_velocity(fragment, launch.velocity);
            fragments.push(fragment);
        }

        let mut pushed = 0;
        for id in world.body_ids() {
            if id == own {
                continue;
            }
            let Some(position) = world.position(id) else {
                continue;
            };
            if let Some(force) =
                radial_impulse(center, position, params.blast_radius, params.force_magnitude)
            {
                if world.apply_force(id, force) {
                    pushed += 1;
                }
            }
        }

        world.remove(own);
        self.body = BodySlot::Gone;
        self.state = BalloonState::Removed;
        self.explosion = None;
        log::info!(
            "Balloon {} popped at ({:.0}, {:.0}): {} fragments, {} bodies pushed",
            self.id,
            center.x,
            center.y,
            fragments.len(),
            pushed
        );

        Some(Detonation {
            center,
            fragments,
            pushed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records what the balloon asked of its overlay
    #[derive(Default)]
    struct Recorder {
        placed: Vec<BodyPose>,
        removed: bool,
    }

    struct TestOverlay(Rc<RefCell<Recorder>>);

    impl Overlay for TestOverlay {
        fn place(&mut self, pose: &BodyPose) {
            self.0.borrow_mut().placed.push(*pose);
        }

        fn remove(&mut self) {
            self.0.borrow_mut().removed = true;
        }
    }

    fn run_explosion(balloon: &mut Balloon, world: &mut World, rng: &mut Pcg32) -> Detonation {
        loop {
            match balloon.inflate_step(world) {
                InflateProgress::Pending { .. } => continue,
                InflateProgress::Ready => break,
                InflateProgress::Idle => panic!("balloon is not exploding"),
            }
        }
        balloon.detonate(world, rng).expect("detonation")
    }

    #[test]
    fn test_explode_detached_is_rejected() {
        let mut balloon = Balloon::new(0, Vec2::new(400.0, 300.0), 40.0, "red");
        let world = World::new();

        assert_eq!(
            balloon.explode(ExplosionParams::default()),
            Err(ExplodeError::NotAttached)
        );
        assert!(balloon.is_intact());
        assert_eq!(balloon.position(&world), Some(Vec2::new(400.0, 300.0)));
    }

    #[test]
    fn test_full_explosion() {
        let mut world = World::new();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut balloon = Balloon::new(0, Vec2::new(400.0, 300.0), 40.0, "red");
        let own = balloon.add(&mut world).unwrap();

        let near = Balloon::new(1, Vec2::new(500.0, 300.0), 30.0, "blue")
            .add(&mut world)
            .unwrap();
        let far = Balloon::new(2, Vec2::new(400.0, 750.0), 30.0, "green")
            .add(&mut world)
            .unwrap();

        balloon.explode(ExplosionParams::new(5.0, 400.0, 20)).unwrap();
        assert_eq!(balloon.state(), BalloonState::Exploding);
        let detonation = run_explosion(&mut balloon, &mut world, &mut rng);

        assert_eq!(detonation.fragments.len(), 20);
        assert_eq!(world.count_of(BodyKind::Fragment), 20);
        assert!(!world.contains(own));
        assert_eq!(balloon.state(), BalloonState::Removed);

        let push = world.pending_force(near).unwrap();
        assert!(push.x > 0.0);
        assert!((push.length() - 5.0 / 100.0).abs() < 1e-4);
        assert_eq!(world.pending_force(far), Some(Vec2::ZERO));
        // 20 fragments at 40px plus the near balloon
        assert_eq!(detonation.pushed, 21);
    }

    #[test]
    fn test_walls_in_range_are_not_counted_as_pushed() {
        use crate::sim::world::RectDesc;

        let mut world = World::new();
        let mut rng = Pcg32::seed_from_u64(4);
        let ground = world.add_rectangle(&RectDesc {
            center: Vec2::new(400.0, 500.0),
            size: Vec2::new(800.0, 20.0),
            restitution: 0.0,
        });
        world.add_rectangle(&RectDesc {
            center: Vec2::new(100.0, 300.0),
            size: Vec2::new(20.0, 600.0),
            restitution: 0.0,
        });
        let near = Balloon::new(1, Vec2::new(450.0, 300.0), 30.0, "blue")
            .add(&mut world)
            .unwrap();

        let mut balloon = Balloon::new(0, Vec2::new(400.0, 300.0), 40.0, "red");
        balloon.add(&mut world);
        balloon.explode(ExplosionParams::new(5.0, 400.0, 0)).unwrap();
        let detonation = run_explosion(&mut balloon, &mut world, &mut rng);

        assert_eq!(detonation.pushed, 1);
        assert_eq!(world.pending_force(ground), Some(Vec2::ZERO));
        assert!(world.pending_force(near).unwrap().x > 0.0);
    }

    #[test]
    fn test_explosion_params_sanitized() {
        let params = ExplosionParams::new(-5.0, f32::NAN, 1_000_000).sanitized();
        assert_eq!(params.force_magnitude, 0.0);
        assert_eq!(params.blast_radius, BLAST_RADIUS);
        assert_eq!(params.fragment_count, MAX_FRAGMENT_COUNT);
        assert_eq!(
            ExplosionParams::default().sanitized(),
            ExplosionParams::default()
        );
    }

    #[test]
    fn test_explode_twice_matches_once() {
        let mut world = World::new();
        let mut rng = Pcg32::seed_from_u64(2);
        let mut balloon = Balloon::new(0, Vec2::new(400.0, 300.0), 40.0, "red");
        balloon.add(&mut world);

        let fired = Rc::new(RefCell::new(0));
        let counter = fired.clone();
        balloon.on_explode(move |_| *counter.borrow_mut() += 1);

        balloon.explode(ExplosionParams::default()).unwrap();
        assert_eq!(
            balloon.explode(ExplosionParams::default()),
            Err(ExplodeError::AlreadyTriggered)
        );
        run_explosion(&mut balloon, &mut world, &mut rng);
        let bodies = world.len();

        assert_eq!(
            balloon.explode(ExplosionParams::default()),
            Err(ExplodeError::AlreadyTriggered)
        );
        assert_eq!(balloon.inflate_step(&mut world), InflateProgress::Idle);
        assert!(balloon.detonate(&mut world, &mut rng).is_none());
        assert_eq!(world.len(), bodies);
        assert_eq!(*fired.borrow(), 1);
    }

    #[test]
    fn test_callbacks_fire_in_order_before_changes() {
        let mut world = World::new();
        let mut balloon = Balloon::new(3, Vec2::new(100.0, 100.0), 40.0, "red");
        let body = balloon.add(&mut world).unwrap();
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        balloon.set_overlay(Box::new(TestOverlay(recorder.clone())));

        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second"] {
            let log = log.clone();
            let recorder = recorder.clone();
            balloon.on_explode(move |b| {
                // Overlay still present, body untouched
                assert!(!recorder.borrow().removed);
                assert_eq!(b.id(), 3);
                assert_eq!(b.body(), Some(body));
                log.borrow_mut().push(tag);
            });
        }

        balloon.explode(ExplosionParams::default()).unwrap();
        assert_eq!(*log.borrow(), vec!["first", "second"]);
        assert!(recorder.borrow().removed);
        assert!(!balloon.has_overlay());
    }

    #[test]
    fn test_inflate_reaches_exactly_target() {
        let mut world = World::new();
        let mut balloon = Balloon::new(0, Vec2::new(400.0, 300.0), 40.0, "red");
        let body = balloon.add(&mut world).unwrap();
        balloon.explode(ExplosionParams::default()).unwrap();

        let mut last = 40.0;
        while let InflateProgress::Pending { next_in_ms } = balloon.inflate_step(&mut world) {
            assert_eq!(next_in_ms, 50.0);
            let r = world.radius(body).unwrap();
            assert!(r >= last && r <= 40.0 * 1.2);
            last = r;
        }
        assert_eq!(world.radius(body), Some(40.0 * 1.2));
    }

    #[test]
    fn test_resize_replaces_body() {
        let mut world = World::new();
        let mut balloon = Balloon::new(0, Vec2::new(250.0, 150.0), 40.0, "teal");
        let old = balloon.add(&mut world).unwrap();

        balloon.resize(&mut world, 60.0).unwrap();
        let new = balloon.body().unwrap();
        assert!(!world.contains(old));
        assert!(world.contains(new));
        assert_eq!(world.position(new), Some(Vec2::new(250.0, 150.0)));
        assert_eq!(world.radius(new), Some(60.0));
        assert_eq!(world.count_of(BodyKind::Balloon), 1);
        assert_eq!(balloon.radius(), 60.0);
        assert_eq!(balloon.color(), "teal");
    }

    #[test]
    fn test_resize_detached_and_exploded() {
        let mut world = World::new();
        let mut balloon = Balloon::new(0, Vec2::new(250.0, 150.0), 40.0, "teal");
        balloon.resize(&mut world, 50.0).unwrap();
        assert!(world.is_empty());

        let body = balloon.add(&mut world).unwrap();
        assert_eq!(world.radius(body), Some(50.0));

        balloon.explode(ExplosionParams::default()).unwrap();
        assert_eq!(
            balloon.resize(&mut world, 10.0),
            Err(ResizeError::Exploded)
        );
    }

    #[test]
    fn test_update_position_tracks_body() {
        let mut world = World::new();
        let mut balloon = Balloon::new(0, Vec2::new(10.0, 20.0), 5.0, "red");
        balloon.add(&mut world);
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        balloon.set_overlay(Box::new(TestOverlay(recorder.clone())));

        balloon.update_position(&world);
        balloon.update_position(&world);
        let placed = &recorder.borrow().placed;
        assert_eq!(placed.len(), 2);
        assert_eq!(placed[0], placed[1]);
        assert_eq!(placed[0].position, Vec2::new(10.0, 20.0));
        assert_eq!(placed[0].radius, 5.0);
    }
}
