//! # The claw
//!
//! A carriage slides along the top of the machine with a rope of hinged segments hanging from it, and two arms hang off the end of the rope. The player only steers the carriage and squeezes the arms. Everything else is physics.
//!
//! What the carriage does each tick comes from a small state machine, [`ClawLogic`], that cycles
//!
//! ```text
//! Ready --drop--> Dropping --bottom--> Grabbing --rise--> Rising --top--> Ready
//!                     \-------------------rise--------------/
//! ```
//!
//! and [`Claw`] applies what it decides to the bodies.

use std::any::Any;

use crane_engine::{
    graphics::{vec2, Color, Rect, Vec2, WHITE},
    physics::convex_collider,
    InputState, Key, PhysicsWorld, Renderable, SceneError, SceneObject, Surface, Updatable,
    UpdateCtx, PIXELS_PER_METER,
};
use rapier2d::prelude::*;

use crate::{config::MachineConfig, progress::Progress};

const ROPE_COLOR: Color = Color::new(135.0 / 255.0, 86.0 / 255.0, 56.0 / 255.0, 1.0);
const CLASP_COLOR: Color = Color::new(85.0 / 255.0, 86.0 / 255.0, 82.0 / 255.0, 1.0);

const FRAME_FRICTION: f32 = 0.9;
const CARRIAGE_FRICTION: f32 = 0.5;
const ROPE_FRICTION: f32 = 0.9;
const ROPE_DAMPING: f32 = 1000.0;
const ARM_FRICTION: f32 = 0.5;
const ARM_DAMPING: f32 = 10.0;
const ARM_WIDTH: f32 = 1.0;
const ARM_HEIGHT: f32 = 3.0;
const ARM_THICKNESS: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClawState {
    /// waiting at the top, free to move sideways
    #[default]
    Ready,
    /// descending, arms open
    Dropping,
    /// sitting at the bottom
    Grabbing,
    /// coming back up, arms squeezed
    Rising,
}

/// Where the carriage is allowed to go, in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub min_x: f32,
    pub max_x: f32,
    /// dropping stops once the carriage is below this
    pub min_y: f32,
    /// rising stops once the carriage is above this
    pub max_y: f32,
}

impl Limits {
    pub fn new(center: Vec2, machine: &MachineConfig) -> Self {
        let inset = machine.boundary_thickness * 2.0 + machine.support_thickness;
        Self {
            min_x: center.x - machine.width / 2.0 + inset,
            max_x: center.x + machine.width / 2.0 - inset,
            min_y: center.y,
            max_y: center.y + machine.height / 2.0 - inset,
        }
    }
}

/// What the claw should do this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClawCommand {
    /// carriage velocity, m/s
    pub velocity: Vec2,
    /// torque closing the arms. the right arm gets it as is, the left one mirrored
    pub torque: f32,
    /// a coin went in this tick
    pub coin_inserted: bool,
}

/// The claw's state machine, without any bodies attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ClawLogic {
    state: ClawState,
    limits: Limits,
    speed: f32,
    torque: f32,
}

impl ClawLogic {
    pub fn new(limits: Limits, speed: f32, torque: f32) -> Self {
        Self {
            state: ClawState::Ready,
            limits,
            speed,
            torque,
        }
    }

    pub fn state(&self) -> ClawState {
        self.state
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// advances one tick with the carriage at `carriage`
    pub fn step(&mut self, carriage: Vec2, input: &InputState) -> ClawCommand {
        let before = self.state;
        let mut velocity = Vec2::ZERO;
        let mut torque = 0.0;
        let mut coin_inserted = false;

        match self.state {
            ClawState::Ready => {
                if input.is_held(Key::Right) && carriage.x < self.limits.max_x {
                    velocity.x = self.speed;
                } else if input.is_held(Key::Left) && carriage.x > self.limits.min_x {
                    velocity.x = -self.speed;
                }
                if input.is_held(Key::Clench) {
                    torque = self.torque;
                }
            }
            ClawState::Dropping => {
                torque = self.torque;
                velocity.y = -self.speed;
                if carriage.y < self.limits.min_y {
                    self.state = ClawState::Grabbing;
                }
            }
            ClawState::Grabbing => {
                torque = -self.torque;
            }
            ClawState::Rising => {
                torque = -self.torque;
                velocity.y = self.speed;
                if carriage.y > self.limits.max_y {
                    self.state = ClawState::Ready;
                }
            }
        }

        if input.is_held(Key::Drop) && self.state == ClawState::Ready {
            self.state = ClawState::Dropping;
            coin_inserted = true;
        } else if input.is_held(Key::Rise)
            && matches!(self.state, ClawState::Dropping | ClawState::Grabbing)
        {
            self.state = ClawState::Rising;
        }

        if self.state != before {
            log::debug!("claw {before:?} -> {:?}", self.state);
        }
        ClawCommand {
            velocity,
            torque,
            coin_inserted,
        }
    }
}

/// The claw machine's moving parts, and its frame.
pub struct Claw {
    logic: ClawLogic,
    frame: Vec<RigidBodyHandle>,
    carriage: RigidBodyHandle,
    rope: Vec<RigidBodyHandle>,
    arms: [RigidBodyHandle; 2],
    support_thickness: f32,
    /// y of the machine's top edge
    top: f32,
}

impl Claw {
    /// builds the frame, carriage, rope and arms of a machine centered on `center`
    pub fn build(
        world: &mut PhysicsWorld,
        center: Vec2,
        machine: &MachineConfig,
    ) -> Result<Self, SceneError> {
        let (cx, cy) = (center.x, center.y);
        let (hw, hh) = (machine.width / 2.0, machine.height / 2.0);
        let bt = machine.boundary_thickness;
        let st = machine.support_thickness;
        let drop_zone = machine.drop_zone_width;
        let separator = machine.height / 4.0;

        // walls, ceiling, a floor with a gap on the left, and the divider beside the gap
        let walls = [
            (vec2(cx - hw + bt, cy), vec2(bt, hh)),
            (vec2(cx + hw - bt, cy), vec2(bt, hh)),
            (vec2(cx, cy + hh - bt), vec2(hw, bt)),
            (
                vec2(cx + drop_zone / 2.0, cy - hh + bt),
                vec2(hw - drop_zone / 2.0, bt),
            ),
            (
                vec2(cx - hw + drop_zone, cy - hh + separator),
                vec2(bt, separator),
            ),
        ];
        let frame = walls
            .iter()
            .map(|(at, half)| {
                world.add_body(
                    RigidBodyBuilder::fixed().translation(vector![at.x, at.y]),
                    [ColliderBuilder::cuboid(half.x, half.y)
                        .friction(FRAME_FRICTION)
                        .build()],
                )
            })
            .collect();

        let carriage_at = vec2(cx, cy + hh - bt * 2.0 - st);
        let carriage = world.add_body(
            RigidBodyBuilder::kinematic_velocity_based()
                .translation(vector![carriage_at.x, carriage_at.y]),
            [ColliderBuilder::cuboid(st, st)
                .friction(CARRIAGE_FRICTION)
                .build()],
        );

        if machine.rope_segments == 0 {
            return Err(SceneError::Shape("the rope needs at least one segment".to_owned()));
        }
        // each segment hangs from the one above by a hinge at its own center
        let segment = machine.rope_length / machine.rope_segments as f32;
        let rope_top = carriage_at.y - segment;
        let mut rope = Vec::with_capacity(machine.rope_segments);
        let mut above = (carriage, carriage_at);
        for i in 0..machine.rope_segments {
            let at = vec2(cx, rope_top - i as f32 * segment * 2.0);
            let body = world.add_body(
                RigidBodyBuilder::dynamic()
                    .translation(vector![at.x, at.y])
                    .angular_damping(ROPE_DAMPING),
                [ColliderBuilder::cuboid(machine.rope_thickness, segment)
                    .friction(ROPE_FRICTION)
                    .density(1.0)
                    .collision_groups(InteractionGroups::new(Group::GROUP_1, !Group::GROUP_2))
                    .build()],
            );
            hinge(world, above, (body, at), at);
            above = (body, at);
            rope.push(body);
        }

        let arm_at = vec2(cx, rope_top - machine.rope_segments as f32 * segment * 2.0);
        let left = arm(world, arm_at, -1.0)?;
        let right = arm(world, arm_at, 1.0)?;
        hinge(world, above, (left, arm_at), arm_at);
        hinge(world, above, (right, arm_at), arm_at);

        Ok(Self {
            logic: ClawLogic::new(Limits::new(center, machine), machine.speed, machine.torque),
            frame,
            carriage,
            rope,
            arms: [left, right],
            support_thickness: st,
            top: cy + hh,
        })
    }

    pub fn state(&self) -> ClawState {
        self.logic.state()
    }

    pub fn limits(&self) -> Limits {
        self.logic.limits()
    }

    pub fn carriage(&self) -> RigidBodyHandle {
        self.carriage
    }

    pub fn rope(&self) -> &[RigidBodyHandle] {
        &self.rope
    }

    pub fn arms(&self) -> [RigidBodyHandle; 2] {
        self.arms
    }
}

/// joins two bodies with a hinge at `anchor`, world coordinates
fn hinge(
    world: &mut PhysicsWorld,
    (first, first_at): (RigidBodyHandle, Vec2),
    (second, second_at): (RigidBodyHandle, Vec2),
    anchor: Vec2,
) {
    let a = anchor - first_at;
    let b = anchor - second_at;
    let joint = RevoluteJointBuilder::new()
        .local_anchor1(point![a.x, a.y])
        .local_anchor2(point![b.x, b.y])
        .contacts_enabled(false);
    world.join(first, second, joint);
}

/// one claw arm: two triangles hanging from `at`, bending out to the `side` (-1 left, 1 right)
fn arm(world: &mut PhysicsWorld, at: Vec2, side: f32) -> Result<RigidBodyHandle, SceneError> {
    let (w, h, t) = (ARM_WIDTH * side, ARM_HEIGHT, ARM_THICKNESS * side);
    let upper = [point![0.0, 0.0], point![w, -h / 2.0], point![w - t, -h / 2.0]];
    let lower = [point![w, -h / 2.0], point![w - t, -h / 2.0], point![0.0, -h]];
    let colliders = [upper, lower]
        .iter()
        .map(|points| {
            convex_collider(points).map(|c| c.density(1.0).friction(ARM_FRICTION).build())
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(world.add_body(
        RigidBodyBuilder::dynamic()
            .translation(vector![at.x, at.y])
            .angular_damping(ARM_DAMPING),
        colliders,
    ))
}

impl Updatable<PhysicsWorld, Progress> for Claw {
    fn update(&mut self, ctx: &mut UpdateCtx<'_, PhysicsWorld, Progress>) -> Result<(), SceneError> {
        let carriage = ctx.world.position(self.carriage)?;
        let command = self.logic.step(carriage, ctx.input);
        if command.coin_inserted {
            ctx.store.charge_play();
            log::info!("coin in, {:.2} spent so far", ctx.store.total_spent());
        }

        ctx.world
            .body_mut(self.carriage)?
            .set_linvel(vector![command.velocity.x, command.velocity.y], true);
        let [left, right] = self.arms;
        for (arm, torque) in [(left, -command.torque), (right, command.torque)] {
            let body = ctx.world.body_mut(arm)?;
            body.reset_torques(true);
            body.add_torque(torque, true);
        }
        Ok(())
    }
}

impl Renderable<PhysicsWorld, Progress> for Claw {
    fn render(
        &self,
        world: &PhysicsWorld,
        _progress: &Progress,
        surface: &mut dyn Surface,
    ) -> Result<(), SceneError> {
        for body in self.frame.iter() {
            world.render_body(*body, surface, WHITE)?;
        }
        for body in self.rope.iter() {
            world.render_body(*body, surface, ROPE_COLOR)?;
        }
        for body in self.arms.iter() {
            world.render_body(*body, surface, CLASP_COLOR)?;
        }
        world.render_body(self.carriage, surface, WHITE)?;

        // the cable from the ceiling down to the carriage
        let carriage = world.position(self.carriage)?;
        let cable = Rect::new(
            (carriage.x - self.support_thickness / 2.0) * PIXELS_PER_METER,
            surface.size().y - self.top * PIXELS_PER_METER,
            self.support_thickness * PIXELS_PER_METER,
            (self.top - carriage.y) * PIXELS_PER_METER,
        );
        surface.rect(cable, WHITE);
        Ok(())
    }
}

impl SceneObject<PhysicsWorld, Progress> for Claw {
    fn as_updatable(&mut self) -> Option<&mut dyn Updatable<PhysicsWorld, Progress>> {
        Some(self)
    }

    fn as_renderable(&self) -> Option<&dyn Renderable<PhysicsWorld, Progress>> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
