//! Local prediction on the owning client.
//!
//! Each tick the predictor stamps the local input into a move, runs it
//! through the same physics step the authority uses, remembers it until the
//! authority acknowledges it, and sends it. The kart responds to input
//! immediately instead of one round trip later.

use crate::buffer::PredictionBuffer;
use crate::config::BodyParams;
use crate::error::Result;
use crate::kinematics::KinematicState;
use crate::moves::{InputSample, MoveClock, MoveRecord};
use crate::net::MoveSink;
use crate::physics::{self, MotionQuery};

/// Predicted state plus the moves it was built from.
#[derive(Debug, Clone)]
pub struct Predictor {
    state: KinematicState,
    buffer: PredictionBuffer,
    clock: MoveClock,
    params: BodyParams,
}

impl Predictor {
    /// Creates a predictor starting at `initial` with an empty buffer.
    #[must_use]
    pub fn new(initial: KinematicState, params: BodyParams, buffer_capacity: usize) -> Self {
        Self {
            state: initial,
            buffer: PredictionBuffer::new(buffer_capacity),
            clock: MoveClock::default(),
            params,
        }
    }

    /// Uses `clock` for stamping instead of one starting at zero.
    #[must_use]
    pub fn with_clock(mut self, clock: MoveClock) -> Self {
        self.clock = clock;
        self
    }

    /// Predicts one tick.
    ///
    /// Returns the move that was sent, or `None` when `dt` is not a positive
    /// finite number and the tick produced no move.
    ///
    /// The buffered copy has its steering zeroed if the step collided, so a
    /// later replay does not steer back into the wall. The authority receives
    /// the move as the driver made it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonMonotonicTimestamp`](crate::Error::NonMonotonicTimestamp)
    /// if the clock was rewound below an acknowledged timestamp. Nothing is
    /// sent in that case.
    pub fn predict<Q: MotionQuery + ?Sized>(
        &mut self,
        input: InputSample,
        dt: f32,
        world: &Q,
        outbox: &mut dyn MoveSink,
    ) -> Result<Option<MoveRecord>> {
        let Some(mv) = self.clock.stamp(input, dt) else {
            return Ok(None);
        };

        let outcome = physics::step(&self.state, &mv, &self.params, world);
        self.buffer.push(outcome.applied)?;
        self.state = outcome.state;
        outbox.send_move(mv);
        Ok(Some(mv))
    }

    /// Overwrites the predicted state.
    pub fn snap_to(&mut self, state: KinematicState) {
        self.state = state;
    }

    /// Replays every buffered move on top of the current state.
    pub fn replay_pending<Q: MotionQuery + ?Sized>(&mut self, world: &Q) {
        self.state = physics::replay(self.state, &self.buffer, &self.params, world);
    }

    /// Predicted state.
    #[must_use]
    pub fn state(&self) -> &KinematicState {
        &self.state
    }

    /// Unacknowledged moves.
    #[must_use]
    pub fn buffer(&self) -> &PredictionBuffer {
        &self.buffer
    }

    /// Mutable access to the unacknowledged moves.
    pub fn buffer_mut(&mut self) -> &mut PredictionBuffer {
        &mut self.buffer
    }

    /// The stamping clock.
    #[must_use]
    pub fn clock(&self) -> &MoveClock {
        &self.clock
    }

    /// Body parameters used for every step.
    #[must_use]
    pub fn params(&self) -> &BodyParams {
        &self.params
    }
}
