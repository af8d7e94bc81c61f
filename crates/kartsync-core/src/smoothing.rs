//! Remote smoothing on observers.
//!
//! An observer only sees a kart through snapshots that arrive at irregular
//! intervals. Snapping to each one makes the kart jitter, so the smoother
//! keeps two samples, the window start and the newest target, and renders a
//! blend between them based on how long ago the target arrived:
//!
//! ```text
//! ratio = elapsed_since_arrival / arrival_interval
//! ```
//!
//! `arrival_interval` is the time between the two most recent arrivals.
//! `ratio` passes 1 when the next snapshot is late, and the pose is then
//! extrapolated along the same curve.
//!
//! # Modes
//!
//! - [`InterpolationMode::Linear`]: straight-line position blend.
//! - [`InterpolationMode::Cubic`]: Hermite curve whose tangents are the
//!   sampled velocities, so the rendered motion matches the kart's real
//!   velocity at both ends of the window. The tangent for `ratio` is
//!   `velocity * arrival_interval * units_per_meter`.
//!
//! Orientation is always spherically interpolated.
//!
//! The collision state snaps to every snapshot. Only the rendered pose
//! ([`RemoteSmoother::visual`]) is smoothed.

use glam::Vec3;

pub use crate::config::{InterpolationMode, SmoothingConfig, StartSample};

use crate::error::Result;
use crate::kinematics::{KinematicState, Transform};
use crate::physics::MotionQuery;
use crate::role::{Frame, ReplicationStrategy, Role};
use crate::state::ServerState;

/// Cubic Hermite position at `t`.
///
/// `p0`/`p1` are the endpoints and `m0`/`m1` the derivatives with respect
/// to `t` at those endpoints.
#[must_use]
pub fn cubic_interp(p0: Vec3, m0: Vec3, p1: Vec3, m1: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    let t3 = t2 * t;
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    p0 * h00 + m0 * h10 + p1 * h01 + m1 * h11
}

/// Derivative of [`cubic_interp`] with respect to `t`.
#[must_use]
pub fn cubic_interp_derivative(p0: Vec3, m0: Vec3, p1: Vec3, m1: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    let d00 = 6.0 * t2 - 6.0 * t;
    let d10 = 3.0 * t2 - 4.0 * t + 1.0;
    let d01 = -6.0 * t2 + 6.0 * t;
    let d11 = 3.0 * t2 - 2.0 * t;
    p0 * d00 + m0 * d10 + p1 * d01 + m1 * d11
}

/// One authoritative sample as seen by an observer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RemoteSample {
    /// Pose
    pub transform: Transform,
    /// Velocity, in metres per second
    pub velocity: Vec3,
    /// Observer-local time the sample was captured, in seconds
    pub capture_time: f64,
}

impl RemoteSample {
    fn of(state: &KinematicState, capture_time: f64) -> Self {
        Self {
            transform: state.transform(),
            velocity: state.velocity,
            capture_time,
        }
    }
}

/// The observer's strategy for one remote kart.
#[derive(Debug, Clone)]
pub struct RemoteSmoother {
    config: SmoothingConfig,
    units_per_meter: f32,
    start: RemoteSample,
    target: RemoteSample,
    arrivals: u64,
    arrival_interval: f32,
    /// Local render clock, in seconds
    clock: f64,
    collision: KinematicState,
    visual: KinematicState,
}

impl RemoteSmoother {
    /// Creates a smoother showing `initial` until snapshots arrive.
    #[must_use]
    pub fn new(initial: KinematicState, config: SmoothingConfig, units_per_meter: f32) -> Self {
        let sample = RemoteSample::of(&initial, 0.0);
        Self {
            config,
            units_per_meter,
            start: sample,
            target: sample,
            arrivals: 0,
            arrival_interval: 0.0,
            clock: 0.0,
            collision: initial,
            visual: initial,
        }
    }

    /// Rotates the window: the new snapshot becomes the target.
    ///
    /// The first snapshot becomes both start and target, so it is rendered
    /// verbatim until a second one defines an interval.
    pub fn push_sample(&mut self, state: &ServerState) {
        let arrived = RemoteSample {
            transform: state.transform,
            velocity: state.velocity,
            capture_time: self.clock,
        };

        if self.arrivals == 0 {
            self.start = arrived;
            self.arrival_interval = 0.0;
        } else {
            self.start = match self.config.start_sample {
                StartSample::PreviousTarget => self.target,
                StartSample::DisplayedPose => RemoteSample::of(&self.visual, self.clock),
            };
            self.arrival_interval = (self.clock - self.target.capture_time) as f32;
        }
        self.target = arrived;
        self.arrivals += 1;
        self.collision = state.kinematics();

        tracing::trace!(
            arrivals = self.arrivals,
            interval = self.arrival_interval,
            "remote sample arrived"
        );
    }

    /// Advances the render clock by `dt` and recomputes the visual pose.
    pub fn advance(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.clock += f64::from(dt);
        }
        self.visual = self.current_pose();
    }

    /// Blend factor for the current render time, or `None` while the
    /// interval is too short to divide by.
    #[must_use]
    pub fn ratio(&self) -> Option<f32> {
        if self.arrival_interval <= self.config.min_interval {
            return None;
        }
        let elapsed = (self.clock - self.target.capture_time) as f32;
        Some(elapsed / self.arrival_interval)
    }

    fn current_pose(&self) -> KinematicState {
        match self.ratio() {
            Some(ratio) => self.pose_at(ratio),
            None => KinematicState::from_transform(self.start.transform, self.start.velocity),
        }
    }

    /// Pose and velocity at `ratio` along the current window.
    ///
    /// `0` is the start sample and `1` the target; values above 1
    /// extrapolate.
    #[must_use]
    pub fn pose_at(&self, ratio: f32) -> KinematicState {
        let start = &self.start;
        let target = &self.target;
        let orientation = start
            .transform
            .rotation
            .slerp(target.transform.rotation, ratio)
            .normalize();

        let (position, velocity) = match self.config.mode {
            InterpolationMode::Linear => (
                start.transform.position.lerp(target.transform.position, ratio),
                start.velocity.lerp(target.velocity, ratio),
            ),
            InterpolationMode::Cubic => {
                let scale = self.velocity_to_derivative();
                let m0 = start.velocity * scale;
                let m1 = target.velocity * scale;
                let p0 = start.transform.position;
                let p1 = target.transform.position;
                let position = cubic_interp(p0, m0, p1, m1, ratio);
                let velocity = if scale > 0.0 {
                    cubic_interp_derivative(p0, m0, p1, m1, ratio) / scale
                } else {
                    start.velocity
                };
                (position, velocity)
            }
        };

        KinematicState {
            position,
            orientation,
            velocity,
        }
    }

    /// Converts a velocity in m/s into a derivative with respect to `ratio`,
    /// in world units.
    fn velocity_to_derivative(&self) -> f32 {
        self.arrival_interval * self.units_per_meter
    }

    /// The rendered pose.
    #[must_use]
    pub fn visual(&self) -> &KinematicState {
        &self.visual
    }

    /// The snapped collision state.
    #[must_use]
    pub fn collision(&self) -> &KinematicState {
        &self.collision
    }

    /// Start of the current window.
    #[must_use]
    pub fn start(&self) -> &RemoteSample {
        &self.start
    }

    /// End of the current window.
    #[must_use]
    pub fn target(&self) -> &RemoteSample {
        &self.target
    }

    /// Seconds between the two most recent arrivals.
    #[must_use]
    pub fn arrival_interval(&self) -> f32 {
        self.arrival_interval
    }
}

impl ReplicationStrategy for RemoteSmoother {
    fn role(&self) -> Role {
        Role::RemoteObserver
    }

    fn update(&mut self, frame: &mut Frame<'_>, _world: Option<&dyn MotionQuery>) -> Result<()> {
        self.advance(frame.dt);
        Ok(())
    }

    fn on_server_state(
        &mut self,
        state: &ServerState,
        _world: Option<&dyn MotionQuery>,
    ) -> Result<()> {
        self.push_sample(state);
        Ok(())
    }

    fn kinematics(&self) -> &KinematicState {
        &self.collision
    }

    fn visual_transform(&self) -> Transform {
        self.visual.transform()
    }
}
