//! The outgoing half of the network contract.
//!
//! The transport itself lives outside this crate. It must deliver moves
//! reliably and in order; losing one would leave the owning client's buffer
//! holding a move the authority never applies.

use std::collections::VecDeque;

use crate::moves::MoveRecord;

/// Destination for moves the owning client sends to the authority.
///
/// Sending is fire-and-forget. Nothing waits for a reply, and a move the
/// authority rejects is dropped without telling the sender.
pub trait MoveSink {
    /// Queues one move for delivery.
    fn send_move(&mut self, mv: MoveRecord);
}

impl MoveSink for Vec<MoveRecord> {
    fn send_move(&mut self, mv: MoveRecord) {
        self.push(mv);
    }
}

impl MoveSink for VecDeque<MoveRecord> {
    fn send_move(&mut self, mv: MoveRecord) {
        self.push_back(mv);
    }
}

/// Discards everything; for roles that never send.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl MoveSink for NullSink {
    fn send_move(&mut self, _mv: MoveRecord) {}
}
