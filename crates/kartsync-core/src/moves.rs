//! Moves: one quantized input sample per simulation tick.
//!
//! A [`MoveRecord`] is the unit of local prediction, of network transfer to
//! the authority, and of replay during reconciliation. Records are plain
//! values; nothing mutates one after it is built.

use serde::{Deserialize, Serialize};

/// Driver input sampled once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InputSample {
    /// Steering in `[-1, 1]`; positive turns counter-clockwise seen from
    /// above when driving forward.
    pub steering: f32,
    /// Throttle in `[-1, 1]`; negative brakes and then reverses.
    pub throttle: f32,
}

impl InputSample {
    /// Creates an input sample, clamping both axes to `[-1, 1]`.
    ///
    /// NaN inputs become zero.
    #[must_use]
    pub fn new(steering: f32, throttle: f32) -> Self {
        Self {
            steering: clamp_axis(steering),
            throttle: clamp_axis(throttle),
        }
    }

    /// Throttle and brake read as separate triggers, combined into one axis.
    #[must_use]
    pub fn from_pedals(steering: f32, throttle: f32, brake: f32) -> Self {
        Self::new(steering, clamp_unit(throttle) - clamp_unit(brake))
    }
}

fn clamp_axis(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// One input sample with its duration and the client's logical timestamp.
///
/// `timestamp` comes from the producing client's [`MoveClock`]. It is only
/// ever compared with other timestamps from the same client, never with
/// server time or with another client's moves.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Steering in `[-1, 1]`
    pub steering: f32,
    /// Throttle in `[-1, 1]`
    pub throttle: f32,
    /// Simulated seconds this move covers
    pub delta_time: f32,
    /// Client-local logical time at which the move was created
    pub timestamp: f64,
}

impl MoveRecord {
    /// Creates a move record.
    #[must_use]
    pub const fn new(steering: f32, throttle: f32, delta_time: f32, timestamp: f64) -> Self {
        Self {
            steering,
            throttle,
            delta_time,
            timestamp,
        }
    }

    /// Creates a move from an input sample.
    #[must_use]
    pub const fn from_input(input: InputSample, delta_time: f32, timestamp: f64) -> Self {
        Self::new(input.steering, input.throttle, delta_time, timestamp)
    }

    /// The same move with its steering spent.
    ///
    /// Used after a collision so that replaying the move does not turn the
    /// kart back into the surface it just bounced off.
    #[must_use]
    pub const fn with_steering_consumed(self) -> Self {
        Self {
            steering: 0.0,
            ..self
        }
    }

    /// The input part of this move.
    #[must_use]
    pub const fn input(&self) -> InputSample {
        InputSample {
            steering: self.steering,
            throttle: self.throttle,
        }
    }
}

/// Per-client monotonic logical clock used to stamp moves.
///
/// Each owning client holds its own clock. It advances by the simulated time
/// of every move it stamps, so timestamps within one client are strictly
/// increasing as long as every stamped move has a positive duration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MoveClock {
    now: f64,
}

impl MoveClock {
    /// Creates a clock starting at `start` seconds.
    #[must_use]
    pub const fn starting_at(start: f64) -> Self {
        Self { now: start }
    }

    /// Current logical time.
    #[must_use]
    pub const fn now(&self) -> f64 {
        self.now
    }

    /// Advances the clock by `delta_time` and stamps a move with the new time.
    ///
    /// Returns `None` for a non-positive or non-finite `delta_time`; such a
    /// tick produces no move.
    pub fn stamp(&mut self, input: InputSample, delta_time: f32) -> Option<MoveRecord> {
        if !(delta_time.is_finite() && delta_time > 0.0) {
            return None;
        }
        self.now += f64::from(delta_time);
        Some(MoveRecord::from_input(input, delta_time, self.now))
    }
}
