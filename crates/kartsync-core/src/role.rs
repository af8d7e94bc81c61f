//! Network roles and the per-kart replication strategy.
//!
//! Every process decides once, when a kart is created, which role it plays
//! for that kart:
//!
//! - [`Role::Authority`]: the server; validates moves and owns ground truth
//! - [`Role::OwningClient`]: the client driving the kart; predicts locally
//!   and reconciles against the server
//! - [`Role::RemoteObserver`]: any other client; smooths between snapshots
//!
//! The role picks one [`ReplicationStrategy`] implementation, and the
//! [`Kart`] wrapper forwards the two entry points to it: a per-tick
//! [`Kart::update`] called by the game loop and [`Kart::on_server_state`]
//! called by the network layer when a new snapshot is delivered.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use kartsync_core::{Frame, InputSample, Kart, KartConfig, KartId, KinematicState, MoveRecord, Role};
//! use kartsync_core::physics::OpenSpace;
//!
//! let config = KartConfig::default();
//! let mut client = Kart::new(KartId::new(1), Role::OwningClient, &config, KinematicState::default())
//!     .unwrap()
//!     .with_world(Arc::new(OpenSpace));
//!
//! let mut outbox: Vec<MoveRecord> = Vec::new();
//! let mut frame = Frame::new(1.0 / 60.0, InputSample::new(0.0, 1.0), &mut outbox);
//! client.update(&mut frame).unwrap();
//!
//! assert_eq!(outbox.len(), 1);
//! assert!(client.kinematics().velocity.x > 0.0);
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::authority::AuthorityController;
use crate::buffer::PredictionBuffer;
use crate::client::OwningClientController;
use crate::config::KartConfig;
use crate::error::{Error, Result};
use crate::kinematics::{KinematicState, Transform};
use crate::moves::{InputSample, MoveRecord};
use crate::net::MoveSink;
use crate::physics::MotionQuery;
use crate::smoothing::RemoteSmoother;
use crate::state::ServerState;

/// Which part of the replication scheme this process plays for a kart.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Simulation output is ground truth (the server)
    Authority,
    /// Locally controls the kart; predicts and reconciles
    OwningClient,
    /// Displays a kart someone else controls
    RemoteObserver,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authority => write!(f, "Authority"),
            Self::OwningClient => write!(f, "OwningClient"),
            Self::RemoteObserver => write!(f, "RemoteObserver"),
        }
    }
}

/// Identifier for a networked kart.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KartId(u64);

impl KartId {
    /// Creates a new `KartId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for KartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KartId({})", self.0)
    }
}

impl fmt::Display for KartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for KartId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

/// Everything one tick of the game loop hands to a kart.
pub struct Frame<'a> {
    /// Seconds since the previous tick
    pub dt: f32,
    /// Local driver input this tick (ignored by roles that do not drive)
    pub input: InputSample,
    /// Where an owning client sends its moves
    pub outbox: &'a mut dyn MoveSink,
}

impl<'a> Frame<'a> {
    /// Creates a frame.
    pub fn new(dt: f32, input: InputSample, outbox: &'a mut dyn MoveSink) -> Self {
        Self { dt, input, outbox }
    }
}

impl fmt::Debug for Frame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("dt", &self.dt)
            .field("input", &self.input)
            .finish_non_exhaustive()
    }
}

/// Role-specific behaviour behind a [`Kart`].
///
/// There are exactly three implementations, one per [`Role`]:
/// [`AuthorityController`], [`OwningClientController`] and
/// [`RemoteSmoother`].
pub trait ReplicationStrategy: Send {
    /// The role this strategy implements.
    fn role(&self) -> Role;

    /// Advances one tick.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingDependency`] if the strategy needs a world and
    /// none is attached.
    fn update(&mut self, frame: &mut Frame<'_>, world: Option<&dyn MotionQuery>) -> Result<()>;

    /// Handles a freshly delivered authoritative snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WrongRole`] on the authority, or
    /// [`Error::MissingDependency`] if replay needs a world and none is
    /// attached.
    fn on_server_state(
        &mut self,
        state: &ServerState,
        world: Option<&dyn MotionQuery>,
    ) -> Result<()>;

    /// Handles a move sent by the owning client. Only the authority accepts
    /// moves.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WrongRole`] unless overridden.
    fn on_move_received(&mut self, _mv: MoveRecord, _world: Option<&dyn MotionQuery>) -> Result<()> {
        Err(Error::WrongRole {
            expected: Role::Authority,
            actual: self.role(),
        })
    }

    /// The simulated (collision) state of the kart.
    fn kinematics(&self) -> &KinematicState;

    /// The pose to render. Differs from the simulated pose only on observers.
    fn visual_transform(&self) -> Transform {
        self.kinematics().transform()
    }

    /// The snapshot to replicate, on the authority.
    fn server_state(&self) -> Option<&ServerState> {
        None
    }

    /// Moves awaiting acknowledgment, on the owning client.
    fn prediction_buffer(&self) -> Option<&PredictionBuffer> {
        None
    }
}

/// Returns the attached world or the missing-dependency error.
pub(crate) fn require_world(world: Option<&dyn MotionQuery>) -> Result<&dyn MotionQuery> {
    world.ok_or(Error::MissingDependency("motion query"))
}

/// Shared world geometry a kart moves through.
pub type SharedWorld = Arc<dyn MotionQuery + Send + Sync>;

/// A networked kart: an identifier, a fixed role, and the matching strategy.
pub struct Kart {
    id: KartId,
    strategy: Box<dyn ReplicationStrategy>,
    world: Option<SharedWorld>,
}

impl fmt::Debug for Kart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kart")
            .field("id", &self.id)
            .field("role", &self.strategy.role())
            .field("kinematics", self.strategy.kinematics())
            .field("world", &self.world.is_some())
            .finish()
    }
}

impl Kart {
    /// Creates a kart playing `role`, starting from `initial`.
    ///
    /// No world is attached yet; see [`Kart::with_world`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` does not validate.
    pub fn new(id: KartId, role: Role, config: &KartConfig, initial: KinematicState) -> Result<Self> {
        config.validate()?;
        let strategy: Box<dyn ReplicationStrategy> = match role {
            Role::Authority => Box::new(AuthorityController::new(
                initial,
                config.body,
                config.authority,
            )),
            Role::OwningClient => Box::new(OwningClientController::new(
                initial,
                config.body,
                config.buffer_capacity,
            )),
            Role::RemoteObserver => Box::new(RemoteSmoother::new(
                initial,
                config.smoothing,
                config.body.units_per_meter,
            )),
        };
        tracing::debug!(kart = %id, %role, "kart created");
        Ok(Self {
            id,
            strategy,
            world: None,
        })
    }

    /// Creates a kart around an already built strategy.
    #[must_use]
    pub fn from_strategy(id: KartId, strategy: Box<dyn ReplicationStrategy>) -> Self {
        Self {
            id,
            strategy,
            world: None,
        }
    }

    /// Attaches the world this kart moves through.
    #[must_use]
    pub fn with_world(mut self, world: SharedWorld) -> Self {
        self.world = Some(world);
        self
    }

    /// Replaces (or removes) the attached world.
    pub fn set_world(&mut self, world: Option<SharedWorld>) {
        self.world = world;
    }

    /// This kart's identifier.
    #[must_use]
    pub fn id(&self) -> KartId {
        self.id
    }

    /// The role chosen at creation.
    #[must_use]
    pub fn role(&self) -> Role {
        self.strategy.role()
    }

    /// Per-tick entry point.
    ///
    /// A failure affects only this kart's tick: it is logged, the tick is
    /// skipped, and the error is returned for the caller to inspect.
    ///
    /// # Errors
    ///
    /// Propagates the strategy's error, typically
    /// [`Error::MissingDependency`].
    pub fn update(&mut self, frame: &mut Frame<'_>) -> Result<()> {
        let world = self.world.as_deref().map(|w| w as &dyn MotionQuery);
        self.strategy
            .update(frame, world)
            .inspect_err(|err| self.log_failure("update", err))
    }

    /// Network callback for a delivered snapshot.
    ///
    /// # Errors
    ///
    /// Propagates the strategy's error; see
    /// [`ReplicationStrategy::on_server_state`].
    pub fn on_server_state(&mut self, state: &ServerState) -> Result<()> {
        let world = self.world.as_deref().map(|w| w as &dyn MotionQuery);
        self.strategy
            .on_server_state(state, world)
            .inspect_err(|err| self.log_failure("server state", err))
    }

    /// Network callback for a move sent by the owning client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MoveRejected`] when validation fails (the move is
    /// dropped) and [`Error::WrongRole`] off the authority.
    pub fn on_move_received(&mut self, mv: MoveRecord) -> Result<()> {
        let world = self.world.as_deref().map(|w| w as &dyn MotionQuery);
        self.strategy
            .on_move_received(mv, world)
            .inspect_err(|err| self.log_failure("move", err))
    }

    /// The simulated state.
    #[must_use]
    pub fn kinematics(&self) -> &KinematicState {
        self.strategy.kinematics()
    }

    /// The pose to render.
    #[must_use]
    pub fn visual_transform(&self) -> Transform {
        self.strategy.visual_transform()
    }

    /// The snapshot to replicate (authority only).
    #[must_use]
    pub fn server_state(&self) -> Option<&ServerState> {
        self.strategy.server_state()
    }

    /// Unacknowledged moves (owning client only).
    #[must_use]
    pub fn prediction_buffer(&self) -> Option<&PredictionBuffer> {
        self.strategy.prediction_buffer()
    }

    fn log_failure(&self, stage: &'static str, err: &Error) {
        match err {
            Error::MoveRejected(_) => {
                tracing::warn!(kart = %self.id, stage, error = %err, "dropping move");
            }
            Error::MissingDependency(_) => {
                tracing::error!(kart = %self.id, stage, error = %err, "skipping kart tick");
            }
            _ => {
                tracing::warn!(kart = %self.id, stage, error = %err, "kart tick failed");
            }
        }
    }
}
