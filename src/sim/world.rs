//! Physics world adapter over rapier2d
//!
//! The simulation speaks in step-based units: positions in pixels (y down),
//! velocities in pixels per step, forces in mass·px/ms² and gravity as a
//! scaled acceleration. Rapier integrates in seconds, so this module is the
//! only place that converts between the two.

use glam::Vec2;
use rapier2d::prelude::*;

use crate::consts::STEP_MS;

/// Handle to a body living in the world
pub type BodyId = RigidBodyHandle;

/// Mass density of every collider (a radius-40 circle weighs ~5)
pub const BODY_DENSITY: f32 = 0.001;

/// Forces arrive per ms², rapier wants per s²
const FORCE_UNIT_SCALE: f32 = 1.0e6;

/// Gravity vectors are scaled by 0.001 px/ms², i.e. 1000 px/s²
const GRAVITY_UNIT_SCALE: f32 = 1.0e3;

/// What a body is, stored in rapier's user data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Boundary,
    Balloon,
    Fragment,
}

impl BodyKind {
    fn to_user_data(self) -> u128 {
        match self {
            BodyKind::Boundary => 1,
            BodyKind::Balloon => 2,
            BodyKind::Fragment => 3,
        }
    }

    fn from_user_data(data: u128) -> Option<Self> {
        match data {
            1 => Some(BodyKind::Boundary),
            2 => Some(BodyKind::Balloon),
            3 => Some(BodyKind::Fragment),
            _ => None,
        }
    }
}

/// Surface properties of a dynamic body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub friction: f32,
    pub restitution: f32,
    /// Fraction of velocity lost per step
    pub air_friction: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            friction: 0.1,
            restitution: 0.0,
            air_friction: 0.01,
        }
    }
}

/// Collision shape of a body, for drawing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outline {
    Circle { radius: f32 },
    Rect { half_extents: Vec2 },
}

/// A dynamic circle that has not been inserted yet
#[derive(Debug, Clone, PartialEq)]
pub struct CircleDesc {
    pub center: Vec2,
    pub radius: f32,
    pub material: Material,
    pub kind: BodyKind,
}

/// A static axis-aligned rectangle
#[derive(Debug, Clone, PartialEq)]
pub struct RectDesc {
    pub center: Vec2,
    pub size: Vec2,
    pub restitution: f32,
}

/// The rigid-body world: every boundary, balloon and fragment lives here
pub struct World {
    gravity: Vec2,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Empty world with gravity off, stepping at the fixed 60 Hz rate
    pub fn new() -> Self {
        let params = IntegrationParameters {
            dt: STEP_MS / 1000.0,
            ..Default::default()
        };
        Self {
            gravity: Vec2::ZERO,
            params,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
        }
    }

    /// Step duration in seconds
    fn dt(&self) -> f32 {
        self.params.dt
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    /// Insert a dynamic circle
    pub fn add_circle(&mut self, desc: &CircleDesc) -> BodyId {
        // Per-step air friction expressed as a per-second damping rate
        let damping = desc.material.air_friction / self.dt();
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![desc.center.x, desc.center.y])
            .linear_damping(damping)
            .user_data(desc.kind.to_user_data())
            .build();
        let handle = self.bodies.insert(body);

        let collider = ColliderBuilder::ball(desc.radius)
            .density(BODY_DENSITY)
            .friction(desc.material.friction)
            .restitution(desc.material.restitution)
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        handle
    }

    /// Insert a fixed rectangle
    pub fn add_rectangle(&mut self, desc: &RectDesc) -> BodyId {
        let body = RigidBodyBuilder::fixed()
            .translation(vector![desc.center.x, desc.center.y])
            .user_data(BodyKind::Boundary.to_user_data())
            .build();
        let handle = self.bodies.insert(body);

        let collider = ColliderBuilder::cuboid(desc.size.x / 2.0, desc.size.y / 2.0)
            .restitution(desc.restitution)
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        handle
    }

    /// Remove a body and its colliders. Returns false if it was not here.
    pub fn remove(&mut self, id: BodyId) -> bool {
        self.bodies
            .remove(
                id,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains(id)
    }

    /// Number of bodies of every kind
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Snapshot of every body currently in the world
    pub fn body_ids(&self) -> Vec<BodyId> {
        self.bodies.iter().map(|(handle, _)| handle).collect()
    }

    pub fn count_of(&self, kind: BodyKind) -> usize {
        self.bodies
            .iter()
            .filter(|(_, body)| BodyKind::from_user_data(body.user_data) == Some(kind))
            .count()
    }

    pub fn kind(&self, id: BodyId) -> Option<BodyKind> {
        self.bodies
            .get(id)
            .and_then(|body| BodyKind::from_user_data(body.user_data))
    }

    pub fn position(&self, id: BodyId) -> Option<Vec2> {
        let t = self.bodies.get(id)?.translation();
        Some(Vec2::new(t.x, t.y))
    }

    /// Rotation in radians
    pub fn angle(&self, id: BodyId) -> Option<f32> {
        Some(self.bodies.get(id)?.rotation().angle())
    }

    /// Radius of the body's circle collider (None for rectangles)
    pub fn radius(&self, id: BodyId) -> Option<f32> {
        let body = self.bodies.get(id)?;
        body.colliders().iter().find_map(|handle| {
            self.colliders
                .get(*handle)
                .and_then(|c| c.shape().as_ball())
                .map(|ball| ball.radius)
        })
    }

    /// Shape of the body's first circle or rectangle collider
    pub fn outline(&self, id: BodyId) -> Option<Outline> {
        let body = self.bodies.get(id)?;
        body.colliders().iter().find_map(|handle| {
            let shape = self.colliders.get(*handle)?.shape();
            if let Some(ball) = shape.as_ball() {
                Some(Outline::Circle {
                    radius: ball.radius,
                })
            } else {
                shape.as_cuboid().map(|cuboid| Outline::Rect {
                    half_extents: Vec2::new(cuboid.half_extents.x, cuboid.half_extents.y),
                })
            }
        })
    }

    /// Velocity in pixels per step
    pub fn velocity(&self, id: BodyId) -> Option<Vec2> {
        let v = self.bodies.get(id)?.linvel();
        Some(Vec2::new(v.x, v.y) * self.dt())
    }

    /// Set velocity in pixels per step
    pub fn set_velocity(&mut self, id: BodyId, velocity: Vec2) {
        let dt = self.dt();
        if let Some(body) = self.bodies.get_mut(id) {
            body.set_linvel(vector![velocity.x / dt, velocity.y / dt], true);
        }
    }

    /// Apply a force at the body's center for the next step only.
    /// Returns false for fixed or missing bodies, which do not take forces.
    pub fn apply_force(&mut self, id: BodyId, force: Vec2) -> bool {
        match self.bodies.get_mut(id) {
            Some(body) if body.is_dynamic() => {
                let f = force * FORCE_UNIT_SCALE;
                body.add_force(vector![f.x, f.y], true);
                true
            }
            _ => false,
        }
    }

    /// Force accumulated for the upcoming step, in simulation units
    pub fn pending_force(&self, id: BodyId) -> Option<Vec2> {
        let f = self.bodies.get(id)?.user_force();
        Some(Vec2::new(f.x, f.y) / FORCE_UNIT_SCALE)
    }

    /// Replace the circle collider's radius, keeping the body
    pub fn set_circle_radius(&mut self, id: BodyId, radius: f32) {
        let Some(body) = self.bodies.get(id) else {
            return;
        };
        for handle in body.colliders() {
            if let Some(collider) = self.colliders.get_mut(*handle) {
                if collider.shape().as_ball().is_some() {
                    collider.set_shape(SharedShape::ball(radius));
                }
            }
        }
    }

    /// Scale a circle body's radius by `factor`
    pub fn scale_body(&mut self, id: BodyId, factor: f32) {
        if let Some(radius) = self.radius(id) {
            self.set_circle_radius(id, radius * factor);
        }
    }

    /// Advance one fixed step, then drop this step's forces
    pub fn step(&mut self) {
        let g = self.gravity * GRAVITY_UNIT_SCALE;
        self.pipeline.step(
            &vector![g.x, g.y],
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            None,
            &(),
            &(),
        );
        for (_, body) in self.bodies.iter_mut() {
            body.reset_forces(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball_at(x: f32, y: f32, r: f32) -> CircleDesc {
        CircleDesc {
            center: Vec2::new(x, y),
            radius: r,
            material: Material::default(),
            kind: BodyKind::Balloon,
        }
    }

    #[test]
    fn test_add_and_remove() {
        let mut world = World::new();
        let id = world.add_circle(&ball_at(100.0, 200.0, 10.0));
        assert!(world.contains(id));
        assert_eq!(world.position(id), Some(Vec2::new(100.0, 200.0)));
        assert_eq!(world.radius(id), Some(10.0));
        assert_eq!(world.kind(id), Some(BodyKind::Balloon));

        assert!(world.remove(id));
        assert!(!world.contains(id));
        assert!(!world.remove(id));
        assert!(world.is_empty());
    }

    #[test]
    fn test_rectangles_have_no_radius() {
        let mut world = World::new();
        let id = world.add_rectangle(&RectDesc {
            center: Vec2::new(400.0, 610.0),
            size: Vec2::new(800.0, 20.0),
            restitution: 0.0,
        });
        assert_eq!(world.radius(id), None);
        assert_eq!(
            world.outline(id),
            Some(Outline::Rect {
                half_extents: Vec2::new(400.0, 10.0)
            })
        );
        assert_eq!(world.count_of(BodyKind::Boundary), 1);
    }

    #[test]
    fn test_velocity_round_trips_step_units() {
        let mut world = World::new();
        let id = world.add_circle(&ball_at(0.0, 0.0, 2.0));
        world.set_velocity(id, Vec2::new(5.0, 0.0));
        let v = world.velocity(id).unwrap();
        assert!((v.x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_force_lasts_one_step() {
        let mut world = World::new();
        let id = world.add_circle(&ball_at(0.0, 0.0, 10.0));
        world.apply_force(id, Vec2::new(0.01, 0.0));
        let pending = world.pending_force(id).unwrap();
        assert!((pending.x - 0.01).abs() < 1e-6);

        world.step();
        assert_eq!(world.pending_force(id), Some(Vec2::ZERO));
        assert!(world.velocity(id).unwrap().x > 0.0);
    }

    #[test]
    fn test_fixed_bodies_refuse_forces() {
        let mut world = World::new();
        let wall = world.add_rectangle(&RectDesc {
            center: Vec2::new(0.0, 0.0),
            size: Vec2::new(20.0, 20.0),
            restitution: 0.0,
        });
        let ball = world.add_circle(&ball_at(50.0, 0.0, 5.0));
        assert!(!world.apply_force(wall, Vec2::new(1.0, 0.0)));
        assert!(world.apply_force(ball, Vec2::new(1.0, 0.0)));
        assert_eq!(world.pending_force(wall), Some(Vec2::ZERO));

        world.remove(ball);
        assert!(!world.apply_force(ball, Vec2::X));
    }

    #[test]
    fn test_scale_body() {
        let mut world = World::new();
        let id = world.add_circle(&ball_at(0.0, 0.0, 40.0));
        world.scale_body(id, 1.5);
        assert!((world.radius(id).unwrap() - 60.0).abs() < 1e-4);
    }

    #[test]
    fn test_gravity_pulls() {
        let mut world = World::new();
        world.set_gravity(Vec2::new(0.0, -0.05));
        let id = world.add_circle(&ball_at(0.0, 0.0, 10.0));
        for _ in 0..10 {
            world.step();
        }
        assert!(world.position(id).unwrap().y < 0.0);
    }
}
