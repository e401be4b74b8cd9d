//! # Physics
//!
//! Rigid-body dynamics are rapier's job. [`PhysicsWorld`] bundles the pieces of a rapier simulation that always travel together, and [`PhysicsScene`] is a [`Scene`] whose children live in one: every update steps the world first and then lets the children react to where things ended up.
//!
//! The world is in meters with y up. [`PhysicsWorld::render_body`] and friends take care of flipping into screen pixels.

use std::any::Any;

use macroquad::math::{vec2, Rect, Vec2};
use rapier2d::prelude::*;

use crate::{
    error::SceneError,
    graphics::{
        shapes::{self, to_screen},
        Color, ImageId, Surface,
    },
    scene::{ObjectId, Scene, SceneObject, Stage, Tick},
    PIXELS_PER_METER,
};

/// solver iterations per step, for both the velocity and the position passes
pub const SOLVER_ITERATIONS: usize = 10;

/// the most fixed steps a single update will catch up on before dropping the backlog
const MAX_CATCH_UP_STEPS: u32 = 8;

/// How a [`PhysicsScene`] turns update deltas into world steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepMode {
    /// one step per update, as long as that update's actual delta. frame pacing leaks into the simulation, which is accepted
    Variable,
    /// steps of exactly `1 / hz` seconds, as many as the accumulated time allows
    Fixed { hz: f32 },
}

/// A rapier world and all of its bookkeeping.
pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    ccd: CCDSolver,
}

impl PhysicsWorld {
    /// an empty world pulling everything down at `gravity` m/s²
    pub fn new(gravity: f32) -> Self {
        let params = IntegrationParameters {
            max_velocity_iterations: SOLVER_ITERATIONS,
            max_stabilization_iterations: SOLVER_ITERATIONS,
            ..Default::default()
        };
        Self {
            gravity: vector![0.0, gravity],
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            params,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            ccd: CCDSolver::new(),
        }
    }

    /// advances the simulation by `dt` seconds. a non-positive `dt` leaves the world alone
    pub fn step(&mut self, dt: f32) {
        if dt <= 0.0 || !dt.is_finite() {
            return;
        }
        self.params.dt = dt;
        self.pipeline.step(
            &self.gravity,
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
    }

    /// inserts `body` with `colliders` attached to it
    pub fn add_body(
        &mut self,
        body: impl Into<RigidBody>,
        colliders: impl IntoIterator<Item = Collider>,
    ) -> RigidBodyHandle {
        let handle = self.bodies.insert(body);
        for collider in colliders {
            self.colliders
                .insert_with_parent(collider, handle, &mut self.bodies);
        }
        handle
    }

    /// removes the body along with its colliders and any joints attached to it
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> Result<RigidBody, SceneError> {
        self.bodies
            .remove(
                handle,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .ok_or(SceneError::MissingBody(handle))
    }

    pub fn join(
        &mut self,
        first: RigidBodyHandle,
        second: RigidBodyHandle,
        joint: impl Into<GenericJoint>,
    ) -> ImpulseJointHandle {
        self.impulse_joints.insert(first, second, joint, true)
    }

    pub fn body(&self, handle: RigidBodyHandle) -> Result<&RigidBody, SceneError> {
        self.bodies
            .get(handle)
            .ok_or(SceneError::MissingBody(handle))
    }

    pub fn body_mut(&mut self, handle: RigidBodyHandle) -> Result<&mut RigidBody, SceneError> {
        self.bodies
            .get_mut(handle)
            .ok_or(SceneError::MissingBody(handle))
    }

    /// where the body's origin is, in meters
    pub fn position(&self, handle: RigidBodyHandle) -> Result<Vec2, SceneError> {
        let translation = self.body(handle)?.translation();
        Ok(vec2(translation.x, translation.y))
    }

    /// the body's rotation in radians, counterclockwise
    pub fn angle(&self, handle: RigidBodyHandle) -> Result<f32, SceneError> {
        Ok(self.body(handle)?.rotation().angle())
    }

    /// teleports the body, waking it up
    pub fn set_position(&mut self, handle: RigidBodyHandle, position: Vec2) -> Result<(), SceneError> {
        self.body_mut(handle)?
            .set_translation(vector![position.x, position.y], true);
        Ok(())
    }

    /// the outline of every collider on the body, in world meters. only boxes and convex polygons have outlines; other shapes are left out
    pub fn body_polygons(&self, handle: RigidBodyHandle) -> Result<Vec<Vec<Vec2>>, SceneError> {
        let body = self.body(handle)?;
        let mut polygons = Vec::with_capacity(body.colliders().len());
        for collider in body.colliders() {
            let Some(collider) = self.colliders.get(*collider) else {
                continue;
            };
            let shape = collider.shape();
            let local: Vec<Point<Real>> = if let Some(cuboid) = shape.as_cuboid() {
                let half = cuboid.half_extents;
                vec![
                    point![-half.x, -half.y],
                    point![half.x, -half.y],
                    point![half.x, half.y],
                    point![-half.x, half.y],
                ]
            } else if let Some(convex) = shape.as_convex_polygon() {
                convex.points().to_vec()
            } else {
                continue;
            };
            let iso = collider.position();
            polygons.push(
                local
                    .iter()
                    .map(|p| {
                        let p = iso * p;
                        vec2(p.x, p.y)
                    })
                    .collect(),
            );
        }
        Ok(polygons)
    }

    /// fills the body's collider outlines in `color`
    pub fn render_body(
        &self,
        handle: RigidBodyHandle,
        surface: &mut dyn Surface,
        color: Color,
    ) -> Result<(), SceneError> {
        let height = surface.size().y;
        for polygon in self.body_polygons(handle)? {
            let points: Vec<Vec2> = polygon.iter().map(|p| to_screen(*p, height)).collect();
            surface.polygon(&points, color);
        }
        Ok(())
    }

    /// draws `image` as a square `size` meters across, centered on the body and turning with it
    pub fn render_image(
        &self,
        handle: RigidBodyHandle,
        image: ImageId,
        size: f32,
        surface: &mut dyn Surface,
    ) -> Result<(), SceneError> {
        let center = to_screen(self.position(handle)?, surface.size().y);
        let side = size * PIXELS_PER_METER;
        let dest = Rect::new(center.x - side / 2.0, center.y - side / 2.0, side, side);
        // counterclockwise in the world is clockwise on a y-down screen
        surface.image(image, dest, -self.angle(handle)?);
        Ok(())
    }
}

/// a collider shaped like a regular polygon centered on its body
pub fn regular_polygon_collider(sides: usize, radius: f32) -> Result<ColliderBuilder, SceneError> {
    if sides < 3 {
        return Err(SceneError::Shape(format!("a polygon needs 3 sides, not {sides}")));
    }
    if !(radius.is_finite() && radius > 0.0) {
        return Err(SceneError::Shape(format!("polygon radius {radius} is not positive")));
    }
    let points: Vec<Point<Real>> = shapes::regular_polygon(sides, radius)
        .into_iter()
        .map(|p| point![p.x, p.y])
        .collect();
    convex_collider(&points)
}

/// the convex hull of `points` as a collider. fewer than three points, or points all on one line, have no area and are refused
pub fn convex_collider(points: &[Point<Real>]) -> Result<ColliderBuilder, SceneError> {
    if points.len() < 3 {
        return Err(SceneError::Shape(format!(
            "a convex hull needs 3 points, not {}",
            points.len()
        )));
    }
    if points.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
        return Err(SceneError::Shape("hull points must be finite".to_owned()));
    }
    if is_flat(points) {
        return Err(SceneError::Shape(format!(
            "all {} hull points lie on one line",
            points.len()
        )));
    }
    ColliderBuilder::convex_hull(points)
        .ok_or_else(|| SceneError::Shape(format!("no convex hull through {} points", points.len())))
}

/// whether every point lies on one line through the first
fn is_flat(points: &[Point<Real>]) -> bool {
    let origin = points[0];
    let Some(far) = points
        .iter()
        .map(|p| *p - origin)
        .max_by(|a, b| a.norm_squared().total_cmp(&b.norm_squared()))
    else {
        return true;
    };
    let reach = far.norm();
    if reach <= f32::EPSILON {
        return true;
    }
    points
        .iter()
        .map(|p| *p - origin)
        .all(|v| (far.x * v.y - far.y * v.x).abs() <= 1e-5 * reach * reach)
}

/// A [`Scene`] living in a [`PhysicsWorld`], which it steps before every update.
pub struct PhysicsScene<S> {
    world: PhysicsWorld,
    scene: Scene<PhysicsWorld, S>,
    mode: StepMode,
    accumulator: f32,
}

impl<S: 'static> PhysicsScene<S> {
    pub fn new(gravity: f32) -> Self {
        Self::with_mode(gravity, StepMode::Variable)
    }

    /// a fixed rate that isn't a positive number of steps per second falls back to [`StepMode::Variable`]
    pub fn with_mode(gravity: f32, mode: StepMode) -> Self {
        let mode = match mode {
            StepMode::Fixed { hz } if !(hz.is_finite() && hz > 0.0) => {
                log::warn!("can't step physics at {hz} Hz, stepping once per update instead");
                StepMode::Variable
            }
            mode => mode,
        };
        Self {
            world: PhysicsWorld::new(gravity),
            scene: Scene::new(),
            mode,
            accumulator: 0.0,
        }
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    pub fn scene(&self) -> &Scene<PhysicsWorld, S> {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene<PhysicsWorld, S> {
        &mut self.scene
    }

    /// both halves at once, for building objects that need bodies before they can be added
    pub fn parts_mut(&mut self) -> (&mut PhysicsWorld, &mut Scene<PhysicsWorld, S>) {
        (&mut self.world, &mut self.scene)
    }

    pub fn add(&mut self, object: impl SceneObject<PhysicsWorld, S>) -> ObjectId {
        self.scene.add(object)
    }

    pub fn remove(
        &mut self,
        id: ObjectId,
    ) -> Result<Box<dyn SceneObject<PhysicsWorld, S>>, SceneError> {
        self.scene.remove(id)
    }

    pub fn mode(&self) -> StepMode {
        self.mode
    }

    fn step_world(&mut self, dt: f32) {
        match self.mode {
            StepMode::Variable => self.world.step(dt),
            StepMode::Fixed { hz } => {
                let step = 1.0 / hz;
                self.accumulator += dt.max(0.0);
                let mut steps = 0;
                while self.accumulator >= step {
                    if steps == MAX_CATCH_UP_STEPS {
                        log::debug!("physics fell {:.3}s behind, dropping it", self.accumulator);
                        self.accumulator = 0.0;
                        break;
                    }
                    self.world.step(step);
                    self.accumulator -= step;
                    steps += 1;
                }
            }
        }
    }
}

impl<S: 'static> Stage<S> for PhysicsScene<S> {
    fn update(&mut self, tick: &mut Tick<'_, S>) -> Result<(), SceneError> {
        self.step_world(tick.dt);
        self.scene.update(&mut self.world, tick);
        Ok(())
    }

    fn render(&self, store: &S, surface: &mut dyn Surface) -> Result<(), SceneError> {
        self.scene.render(&self.world, store, surface);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
