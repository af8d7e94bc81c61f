//! The owning client's strategy: predict every tick, reconcile on every
//! snapshot.

use crate::buffer::PredictionBuffer;
use crate::config::BodyParams;
use crate::error::Result;
use crate::kinematics::KinematicState;
use crate::physics::MotionQuery;
use crate::prediction::Predictor;
use crate::reconciliation::{Reconciliation, ReconciliationController};
use crate::role::{require_world, Frame, ReplicationStrategy, Role};
use crate::state::ServerState;

/// [`Predictor`] and [`ReconciliationController`] behind one strategy.
#[derive(Debug, Clone)]
pub struct OwningClientController {
    predictor: Predictor,
    reconciler: ReconciliationController,
}

impl OwningClientController {
    /// Creates a client predicting from `initial`.
    #[must_use]
    pub fn new(initial: KinematicState, params: BodyParams, buffer_capacity: usize) -> Self {
        Self::from_predictor(Predictor::new(initial, params, buffer_capacity))
    }

    /// Wraps an existing predictor.
    #[must_use]
    pub fn from_predictor(predictor: Predictor) -> Self {
        Self {
            predictor,
            reconciler: ReconciliationController::new(),
        }
    }

    /// The predictor.
    #[must_use]
    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }

    /// Report from the latest reconciliation.
    #[must_use]
    pub fn last_reconciliation(&self) -> Option<&Reconciliation> {
        self.reconciler.last()
    }
}

impl ReplicationStrategy for OwningClientController {
    fn role(&self) -> Role {
        Role::OwningClient
    }

    fn update(&mut self, frame: &mut Frame<'_>, world: Option<&dyn MotionQuery>) -> Result<()> {
        let world = require_world(world)?;
        self.predictor
            .predict(frame.input, frame.dt, world, &mut *frame.outbox)?;
        Ok(())
    }

    fn on_server_state(
        &mut self,
        state: &ServerState,
        world: Option<&dyn MotionQuery>,
    ) -> Result<()> {
        let world = require_world(world)?;
        self.reconciler.reconcile(&mut self.predictor, state, world);
        Ok(())
    }

    fn kinematics(&self) -> &KinematicState {
        self.predictor.state()
    }

    fn prediction_buffer(&self) -> Option<&PredictionBuffer> {
        Some(self.predictor.buffer())
    }
}
