//! Server reconciliation on the owning client.
//!
//! When a snapshot arrives the client:
//!
//! 1. Snaps its predicted state to the authoritative one
//! 2. Drops every buffered move the snapshot acknowledges
//!    (`timestamp <= last_move.timestamp`)
//! 3. Replays the remaining moves, oldest first, through the physics step
//!
//! With a deterministic step and no rejected moves, the replayed state
//! equals what was predicted, and the correction is zero.

use glam::Vec3;

use crate::kinematics::KinematicState;
use crate::physics::MotionQuery;
use crate::prediction::Predictor;
use crate::state::ServerState;

/// What one reconciliation did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reconciliation {
    /// Moves dropped as acknowledged
    pub pruned: usize,
    /// Moves replayed on top of the snapshot
    pub replayed: usize,
    /// Predicted position after reconciling minus before, in world units
    pub correction: Vec3,
}

impl Reconciliation {
    /// Whether the prediction moved at all.
    #[must_use]
    pub fn corrected(&self) -> bool {
        self.correction != Vec3::ZERO
    }
}

/// Applies authoritative snapshots to a [`Predictor`].
#[derive(Debug, Clone, Default)]
pub struct ReconciliationController {
    reconciliations: u64,
    last: Option<Reconciliation>,
}

impl ReconciliationController {
    /// Creates a controller.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snap, prune and replay.
    pub fn reconcile<Q: MotionQuery + ?Sized>(
        &mut self,
        predictor: &mut Predictor,
        server_state: &ServerState,
        world: &Q,
    ) -> Reconciliation {
        let before: KinematicState = *predictor.state();

        predictor.snap_to(server_state.kinematics());
        let pruned = predictor
            .buffer_mut()
            .acknowledge(server_state.acknowledged_timestamp());
        let replayed = predictor.buffer().len();
        predictor.replay_pending(world);

        let report = Reconciliation {
            pruned,
            replayed,
            correction: predictor.state().position - before.position,
        };

        tracing::debug!(
            acknowledged = server_state.acknowledged_timestamp(),
            pruned,
            replayed,
            correction = report.correction.length(),
            "reconciled with server state"
        );

        self.reconciliations += 1;
        self.last = Some(report);
        report
    }

    /// Number of snapshots applied so far.
    #[must_use]
    pub fn reconciliations(&self) -> u64 {
        self.reconciliations
    }

    /// Report from the most recent reconciliation.
    #[must_use]
    pub fn last(&self) -> Option<&Reconciliation> {
        self.last.as_ref()
    }
}
