//! The authoritative snapshot the server publishes for each kart.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::kinematics::{KinematicState, Transform};
use crate::moves::MoveRecord;

/// Latest ground truth for one kart.
///
/// Produced only by the authority and overwritten on every accepted move.
/// Replication is allowed to coalesce: a client sees the freshest value, not
/// necessarily every intermediate one.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ServerState {
    /// Authoritative pose
    pub transform: Transform,
    /// Authoritative velocity, in metres per second
    pub velocity: Vec3,
    /// The move that produced this state. Its timestamp tells the owning
    /// client which of its moves have been applied.
    pub last_move: MoveRecord,
}

impl ServerState {
    /// Snapshot of `state` after applying `last_move`.
    #[must_use]
    pub fn new(state: &KinematicState, last_move: MoveRecord) -> Self {
        Self {
            transform: state.transform(),
            velocity: state.velocity,
            last_move,
        }
    }

    /// The kinematic state described by this snapshot.
    #[must_use]
    pub fn kinematics(&self) -> KinematicState {
        KinematicState::from_transform(self.transform, self.velocity)
    }

    /// Timestamp of the newest move the authority has applied.
    #[must_use]
    pub fn acknowledged_timestamp(&self) -> f64 {
        self.last_move.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn snapshot_round_trips_kinematics() {
        let state = KinematicState {
            position: Vec3::new(10.0, -4.0, 0.0),
            orientation: Quat::from_rotation_z(0.7),
            velocity: Vec3::new(3.0, 1.0, 0.0),
        };
        let snapshot = ServerState::new(&state, MoveRecord::new(0.2, 1.0, 0.1, 4.2));
        assert_eq!(snapshot.kinematics(), state);
        assert_eq!(snapshot.acknowledged_timestamp(), 4.2);
    }

    #[test]
    fn snapshot_is_serializable() {
        let snapshot = ServerState::new(
            &KinematicState::at_rest(Vec3::new(1.0, 2.0, 3.0), 0.5),
            MoveRecord::new(0.0, 0.5, 1.0 / 60.0, 9.0),
        );
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: ServerState = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot, back);
    }
}
