//! Server-side move validation and ground truth.
//!
//! The authority receives moves from the owning client, validates each one,
//! runs the physics step on the accepted ones and publishes the result as a
//! [`ServerState`]. It never predicts and never reconciles.
//!
//! # Validation
//!
//! A move is accepted only if all of the following hold:
//!
//! 1. Steering and throttle are within `[-1, 1]`
//! 2. `delta_time` is finite and not negative
//! 3. The timestamp is finite and newer than the last accepted one
//! 4. The client's accumulated simulated time plus `delta_time` does not
//!    run ahead of the server clock (speed-hack guard; can be disabled)
//!
//! Rejected moves are logged and dropped. The client is not told; its next
//! reconciliation overwrites the prediction made for the dropped move.

use crate::config::{AuthorityConfig, BodyParams};
use crate::error::{Error, Rejection, Result};
use crate::kinematics::KinematicState;
use crate::moves::{MoveClock, MoveRecord};
use crate::physics::{self, MotionQuery};
use crate::role::{require_world, Frame, ReplicationStrategy, Role};
use crate::state::ServerState;

/// Checks the parts of a move that do not depend on history.
///
/// # Errors
///
/// Returns the first [`Rejection`] that applies.
pub fn validate_input(mv: &MoveRecord) -> std::result::Result<(), Rejection> {
    if !(-1.0..=1.0).contains(&mv.steering) {
        return Err(Rejection::SteeringOutOfRange(mv.steering));
    }
    if !(-1.0..=1.0).contains(&mv.throttle) {
        return Err(Rejection::ThrottleOutOfRange(mv.throttle));
    }
    if !(mv.delta_time.is_finite() && mv.delta_time >= 0.0) {
        return Err(Rejection::InvalidDeltaTime(mv.delta_time));
    }
    if !mv.timestamp.is_finite() {
        return Err(Rejection::NonFiniteTimestamp);
    }
    Ok(())
}

/// Validation counters, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthorityStats {
    /// Moves executed
    pub accepted: u64,
    /// Moves dropped by validation
    pub rejected: u64,
}

/// The server's controller for one kart.
#[derive(Debug, Clone)]
pub struct AuthorityController {
    state: KinematicState,
    server_state: ServerState,
    params: BodyParams,
    config: AuthorityConfig,
    /// Seconds of server time elapsed since this controller was created
    server_time: f64,
    /// Sum of `delta_time` over every move accepted from the client
    client_simulated_time: f64,
    last_accepted: Option<f64>,
    locally_controlled: bool,
    host_clock: MoveClock,
    stats: AuthorityStats,
}

impl AuthorityController {
    /// Creates an authority starting from `initial`.
    ///
    /// The initial snapshot is published immediately with a default move
    /// (timestamp 0), which acknowledges nothing.
    #[must_use]
    pub fn new(initial: KinematicState, params: BodyParams, config: AuthorityConfig) -> Self {
        Self {
            state: initial,
            server_state: ServerState::new(&initial, MoveRecord::default()),
            params,
            config,
            server_time: 0.0,
            client_simulated_time: 0.0,
            last_accepted: None,
            locally_controlled: false,
            host_clock: MoveClock::default(),
            stats: AuthorityStats::default(),
        }
    }

    /// Marks the kart as driven by the host itself (listen server).
    ///
    /// A locally controlled authority turns its own input into moves every
    /// tick, applies them directly and publishes the result. Nothing goes
    /// through validation on that path.
    pub fn set_locally_controlled(&mut self, locally_controlled: bool) {
        self.locally_controlled = locally_controlled;
    }

    /// Whether the host drives this kart.
    #[must_use]
    pub fn is_locally_controlled(&self) -> bool {
        self.locally_controlled
    }

    /// Advances the server clock.
    ///
    /// Non-positive or non-finite values are ignored.
    pub fn advance_clock(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.server_time += f64::from(dt);
        }
    }

    /// Validates `mv` against this client's history and the server clock.
    ///
    /// Nothing is modified.
    ///
    /// # Errors
    ///
    /// Returns the first [`Rejection`] that applies.
    pub fn validate(&self, mv: &MoveRecord) -> std::result::Result<(), Rejection> {
        validate_input(mv)?;

        if let Some(last_accepted) = self.last_accepted {
            if mv.timestamp <= last_accepted {
                return Err(Rejection::StaleTimestamp {
                    timestamp: mv.timestamp,
                    last_accepted,
                });
            }
        }

        if self.config.validate_clock {
            let proposed = self.client_simulated_time + f64::from(mv.delta_time);
            if proposed > self.server_time + self.config.clock_tolerance {
                return Err(Rejection::ClockAhead {
                    proposed,
                    server_now: self.server_time,
                });
            }
        }

        Ok(())
    }

    /// Validates and executes a move sent by the owning client.
    ///
    /// On success the new snapshot is returned. On rejection ground truth is
    /// left untouched.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] that caused the move to be dropped.
    pub fn submit_move<Q: MotionQuery + ?Sized>(
        &mut self,
        mv: MoveRecord,
        world: &Q,
    ) -> std::result::Result<&ServerState, Rejection> {
        if let Err(rejection) = self.validate(&mv) {
            self.stats.rejected += 1;
            tracing::warn!(
                timestamp = mv.timestamp,
                %rejection,
                "rejected move"
            );
            return Err(rejection);
        }

        self.client_simulated_time += f64::from(mv.delta_time);
        self.last_accepted = Some(mv.timestamp);
        self.stats.accepted += 1;
        Ok(self.apply(mv, world))
    }

    fn apply<Q: MotionQuery + ?Sized>(&mut self, mv: MoveRecord, world: &Q) -> &ServerState {
        let outcome = physics::step(&self.state, &mv, &self.params, world);
        self.state = outcome.state;
        self.server_state = ServerState::new(&self.state, mv);
        &self.server_state
    }

    /// Ground truth.
    #[must_use]
    pub fn state(&self) -> &KinematicState {
        &self.state
    }

    /// The snapshot clients should receive.
    #[must_use]
    pub fn server_state(&self) -> &ServerState {
        &self.server_state
    }

    /// Seconds elapsed on the server clock.
    #[must_use]
    pub fn server_time(&self) -> f64 {
        self.server_time
    }

    /// Seconds of simulation the client has been granted so far.
    #[must_use]
    pub fn client_simulated_time(&self) -> f64 {
        self.client_simulated_time
    }

    /// Timestamp of the last accepted move.
    #[must_use]
    pub fn last_accepted(&self) -> Option<f64> {
        self.last_accepted
    }

    /// Accept/reject counters.
    #[must_use]
    pub fn stats(&self) -> AuthorityStats {
        self.stats
    }
}

impl ReplicationStrategy for AuthorityController {
    fn role(&self) -> Role {
        Role::Authority
    }

    fn update(&mut self, frame: &mut Frame<'_>, world: Option<&dyn MotionQuery>) -> Result<()> {
        self.advance_clock(frame.dt);
        if !self.locally_controlled {
            return Ok(());
        }

        let world = require_world(world)?;
        if let Some(mv) = self.host_clock.stamp(frame.input, frame.dt) {
            self.apply(mv, world);
        }
        Ok(())
    }

    fn on_server_state(
        &mut self,
        _state: &ServerState,
        _world: Option<&dyn MotionQuery>,
    ) -> Result<()> {
        Err(Error::WrongRole {
            expected: Role::OwningClient,
            actual: Role::Authority,
        })
    }

    fn on_move_received(&mut self, mv: MoveRecord, world: Option<&dyn MotionQuery>) -> Result<()> {
        let world = require_world(world)?;
        self.submit_move(mv, world)?;
        Ok(())
    }

    fn kinematics(&self) -> &KinematicState {
        &self.state
    }

    fn server_state(&self) -> Option<&ServerState> {
        Some(&self.server_state)
    }
}
