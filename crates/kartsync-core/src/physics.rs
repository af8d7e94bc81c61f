//! The per-tick kart physics step.
//!
//! [`step`] is a pure function of (state, move, body parameters, world). The
//! authority, the owning client's prediction, and reconciliation replay all
//! go through it, which is what lets a client reproduce the server's result
//! for the same sequence of moves.
//!
//! # Processing Order
//!
//! All forces of a step are summed into one accumulator before integrating:
//!
//! 1. Steering rotates velocity and heading (bicycle-model turn), then the
//!    drive force is added along the new forward axis
//! 2. Kinetic friction against the direction of travel
//! 3. Quadratic air resistance against the direction of travel
//! 4. Integrate: `velocity += force / mass * dt`, delta = `velocity * dt`
//! 5. Sweep the delta through the world; on a blocking hit the velocity is
//!    reflected and scaled by the bounce factor
//!
//! The accumulator lives only inside one call to [`step`].

use std::ops::AddAssign;

use glam::{Quat, Vec3};
use kartsync_track::Track;

use crate::config::{BodyParams, GRAVITY};
use crate::kinematics::{KinematicState, UP};
use crate::moves::MoveRecord;

/// Result of moving a body through the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    /// Where the body ended up
    pub end: Vec3,
    /// Whether a blocking hit stopped it
    pub blocked: bool,
}

/// World geometry the physics step moves karts through.
///
/// The query is stateless: it reports where a body starting at `from` would
/// stop and leaves relocating the body to the caller.
pub trait MotionQuery {
    /// Sweeps a body from `from` along `delta` (world units).
    fn apply_delta_motion(&self, from: Vec3, delta: Vec3) -> Motion;
}

impl MotionQuery for Track {
    fn apply_delta_motion(&self, from: Vec3, delta: Vec3) -> Motion {
        let result = self.sweep(from, delta);
        Motion {
            end: result.end,
            blocked: result.blocked(),
        }
    }
}

/// Empty world: every motion completes unobstructed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenSpace;

impl MotionQuery for OpenSpace {
    fn apply_delta_motion(&self, from: Vec3, delta: Vec3) -> Motion {
        Motion {
            end: from + delta,
            blocked: false,
        }
    }
}

/// Result of one physics step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// State after the step
    pub state: KinematicState,
    /// Position delta that was requested from the world, in world units
    pub delta: Vec3,
    /// Whether the motion was blocked
    pub collided: bool,
    /// The move as it should be remembered for replay: identical to the
    /// input, except that steering is zeroed when the step collided
    pub applied: MoveRecord,
}

/// Sum of the forces acting on a body during one step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ForceAccumulator(Vec3);

impl AddAssign<Vec3> for ForceAccumulator {
    fn add_assign(&mut self, force: Vec3) {
        self.0 += force;
    }
}

/// Advances `state` by one move.
///
/// A move with a non-positive or non-finite `delta_time` is a no-op. Inputs
/// are not clamped here; range checks are the authority's job.
#[must_use]
pub fn step<Q: MotionQuery + ?Sized>(
    state: &KinematicState,
    mv: &MoveRecord,
    params: &BodyParams,
    world: &Q,
) -> StepOutcome {
    let dt = mv.delta_time;
    if !(dt.is_finite() && dt > 0.0) {
        return StepOutcome {
            state: *state,
            delta: Vec3::ZERO,
            collided: false,
            applied: *mv,
        };
    }

    let mut next = *state;
    let mut forces = ForceAccumulator::default();

    forces += drive_force(&mut next, mv, params);
    forces += kinetic_friction_force(next.velocity, params);
    forces += air_resistance_force(next.velocity, params);

    let acceleration = forces.0 / params.mass;
    next.velocity += acceleration * dt;

    let delta = next.velocity * dt * params.units_per_meter;
    let motion = world.apply_delta_motion(next.position, delta);
    next.position = motion.end;

    let mut applied = *mv;
    if motion.blocked {
        next.velocity = -next.velocity * params.bounce_factor;
        applied = applied.with_steering_consumed();
    }

    tracing::trace!(
        timestamp = mv.timestamp,
        speed = next.velocity.length(),
        collided = motion.blocked,
        "physics step"
    );

    StepOutcome {
        state: next,
        delta,
        collided: motion.blocked,
        applied,
    }
}

/// Runs `moves` in order starting from `start` and returns the final state.
///
/// Replay is deterministic: the same start state and move sequence always
/// produce the same bits.
pub fn replay<'a, Q, I>(
    start: KinematicState,
    moves: I,
    params: &BodyParams,
    world: &Q,
) -> KinematicState
where
    Q: MotionQuery + ?Sized,
    I: IntoIterator<Item = &'a MoveRecord>,
{
    moves
        .into_iter()
        .fold(start, |state, mv| step(&state, mv, params, world).state)
}

/// Turns the body according to steering and returns the drive force.
///
/// The turn angle is the distance covered along the forward axis divided by
/// the turning radius. Reversing flips the sign of that distance, so the
/// same steering turns the other way, as a real car does.
fn drive_force(state: &mut KinematicState, mv: &MoveRecord, params: &BodyParams) -> Vec3 {
    let travelled = state.forward_speed() * mv.delta_time;
    let turn_angle = travelled / params.min_turning_radius * mv.steering;
    let rotation = Quat::from_axis_angle(UP, turn_angle);

    state.velocity = rotation * state.velocity;
    state.orientation = (rotation * state.orientation).normalize();

    state.forward() * (params.throttle_force * mv.throttle)
}

fn kinetic_friction_force(velocity: Vec3, params: &BodyParams) -> Vec3 {
    match velocity.try_normalize() {
        Some(direction) => -direction * params.mass * GRAVITY * params.friction_coefficient,
        None => Vec3::ZERO,
    }
}

fn air_resistance_force(velocity: Vec3, params: &BodyParams) -> Vec3 {
    match velocity.try_normalize() {
        Some(direction) => -direction * velocity.length_squared() * params.drag_coefficient,
        None => Vec3::ZERO,
    }
}
