//! # Kartsync Core
//!
//! Client-side prediction and server reconciliation for networked karts.
//!
//! One authoritative server simulates every kart. The client driving a kart
//! predicts its own moves so input feels immediate, and corrects itself
//! whenever the server's verdict arrives. Every other client sees the kart
//! through periodic snapshots and smooths between them.
//!
//! ## Architecture
//!
//! - **Physics**: one deterministic step shared by every role
//!   ([`physics::step`])
//! - **Moves**: timestamped input samples, buffered until acknowledged
//!   ([`MoveRecord`], [`PredictionBuffer`])
//! - **Authority**: validates moves and publishes [`ServerState`]
//!   ([`AuthorityController`])
//! - **Owning client**: predicts, then snaps, prunes and replays
//!   ([`Predictor`], [`ReconciliationController`])
//! - **Observer**: linear or cubic Hermite smoothing ([`RemoteSmoother`])
//!
//! A [`Kart`] picks one of these strategies from its [`Role`] when it is
//! created and forwards the per-tick and network callbacks to it.
//!
//! ## Usage
//!
//! ```
//! use kartsync_core::physics::OpenSpace;
//! use kartsync_core::{
//!     AuthorityController, AuthorityConfig, BodyParams, InputSample, KinematicState, MoveRecord,
//!     OwningClientController, ReplicationStrategy, Frame,
//! };
//!
//! let params = BodyParams::default();
//! let mut server = AuthorityController::new(KinematicState::default(), params, AuthorityConfig::default());
//! let mut client = OwningClientController::new(KinematicState::default(), params, 64);
//!
//! // Client predicts one tick and sends the move.
//! let mut outbox: Vec<MoveRecord> = Vec::new();
//! client.update(&mut Frame::new(0.1, InputSample::new(0.0, 1.0), &mut outbox), Some(&OpenSpace)).unwrap();
//!
//! // Server runs for the same time, then executes the move.
//! server.advance_clock(0.1);
//! let snapshot = *server.submit_move(outbox[0], &OpenSpace).unwrap();
//!
//! // Client reconciles; nothing is left to replay.
//! client.on_server_state(&snapshot, Some(&OpenSpace)).unwrap();
//! assert_eq!(client.prediction_buffer().map(|buffer| buffer.len()), Some(0));
//! assert_eq!(client.kinematics(), server.state());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export the track crate for world geometry
pub use kartsync_track as track;

pub mod authority;
pub mod buffer;
pub mod client;
pub mod config;
pub mod error;
pub mod kinematics;
pub mod moves;
pub mod net;
pub mod physics;
pub mod prediction;
pub mod reconciliation;
pub mod role;
pub mod smoothing;
pub mod state;

pub use authority::{AuthorityController, AuthorityStats};
pub use buffer::PredictionBuffer;
pub use client::OwningClientController;
pub use config::{AuthorityConfig, BodyParams, KartConfig, SmoothingConfig};
pub use error::{Error, Rejection, Result};
pub use kinematics::{KinematicState, Transform};
pub use moves::{InputSample, MoveClock, MoveRecord};
pub use net::MoveSink;
pub use physics::MotionQuery;
pub use prediction::Predictor;
pub use reconciliation::{Reconciliation, ReconciliationController};
pub use role::{Frame, Kart, KartId, ReplicationStrategy, Role};
pub use smoothing::{InterpolationMode, RemoteSample, RemoteSmoother, StartSample};
pub use state::ServerState;

#[cfg(test)]
mod tests;
