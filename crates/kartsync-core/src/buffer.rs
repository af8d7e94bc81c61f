//! Unacknowledged moves on the owning client.
//!
//! Moves are appended at the tail as they are predicted and pruned from the
//! head once the authority reports having applied them. Timestamps inside
//! the buffer are strictly increasing, so pruning "everything up to T" and
//! "everything with timestamp <= T" are the same operation.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::moves::MoveRecord;

/// Ordered moves not yet confirmed by the authority (oldest first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionBuffer {
    moves: VecDeque<MoveRecord>,
    capacity: usize,
    last_acknowledged: Option<f64>,
}

impl PredictionBuffer {
    /// Default number of moves kept; a few seconds of input at 60 Hz.
    pub const DEFAULT_CAPACITY: usize = 256;

    /// Creates an empty buffer holding at most `capacity` moves (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            moves: VecDeque::with_capacity(capacity),
            capacity,
            last_acknowledged: None,
        }
    }

    /// Appends a move at the tail.
    ///
    /// When the buffer is full the oldest move is evicted and returned.
    /// Losing it only matters if the authority never applies it, in which
    /// case the next reconciliation corrects the prediction anyway.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonMonotonicTimestamp`] if `mv` is not strictly newer
    /// than the newest buffered move or the last acknowledged one.
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn push(&mut self, mv: MoveRecord) -> Result<Option<MoveRecord>> {
        let previous = self.newest_timestamp().or(self.last_acknowledged);
        if let Some(previous) = previous {
            // Written as a negated comparison so NaN timestamps are refused too.
            if !(mv.timestamp > previous) {
                return Err(Error::NonMonotonicTimestamp {
                    previous,
                    next: mv.timestamp,
                });
            }
        } else if !mv.timestamp.is_finite() {
            return Err(Error::NonMonotonicTimestamp {
                previous: f64::NEG_INFINITY,
                next: mv.timestamp,
            });
        }

        let evicted = if self.moves.len() >= self.capacity {
            self.moves.pop_front()
        } else {
            None
        };
        if let Some(old) = &evicted {
            tracing::warn!(
                evicted = old.timestamp,
                capacity = self.capacity,
                "prediction buffer full, evicting oldest unacknowledged move"
            );
        }

        self.moves.push_back(mv);
        Ok(evicted)
    }

    /// Drops every move with `timestamp <= acknowledged`.
    ///
    /// Returns how many moves were removed. The remaining moves are exactly
    /// those newer than `acknowledged`, in their original order.
    pub fn acknowledge(&mut self, acknowledged: f64) -> usize {
        let before = self.moves.len();
        while let Some(front) = self.moves.front() {
            if front.timestamp <= acknowledged {
                self.moves.pop_front();
            } else {
                break;
            }
        }
        if self.last_acknowledged.map_or(true, |last| acknowledged > last) {
            self.last_acknowledged = Some(acknowledged);
        }
        before - self.moves.len()
    }

    /// Iterates the unacknowledged moves, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &MoveRecord> + ExactSizeIterator {
        self.moves.iter()
    }

    /// Moves newer than `timestamp`, without removing anything.
    pub fn moves_after(&self, timestamp: f64) -> impl Iterator<Item = &MoveRecord> {
        self.moves.iter().filter(move |mv| mv.timestamp > timestamp)
    }

    /// Timestamp of the oldest unacknowledged move.
    #[must_use]
    pub fn oldest_timestamp(&self) -> Option<f64> {
        self.moves.front().map(|mv| mv.timestamp)
    }

    /// Timestamp of the newest buffered move.
    #[must_use]
    pub fn newest_timestamp(&self) -> Option<f64> {
        self.moves.back().map(|mv| mv.timestamp)
    }

    /// Highest timestamp acknowledged so far.
    #[must_use]
    pub fn last_acknowledged(&self) -> Option<f64> {
        self.last_acknowledged
    }

    /// Number of unacknowledged moves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Returns `true` if nothing is waiting for acknowledgment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Maximum number of moves kept.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every buffered move.
    pub fn clear(&mut self) {
        self.moves.clear();
    }
}

impl Default for PredictionBuffer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl<'a> IntoIterator for &'a PredictionBuffer {
    type Item = &'a MoveRecord;
    type IntoIter = std::collections::vec_deque::Iter<'a, MoveRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_move(timestamp: f64) -> MoveRecord {
        MoveRecord::new(0.0, 1.0, 0.1, timestamp)
    }

    fn timestamps(buffer: &PredictionBuffer) -> Vec<f64> {
        buffer.iter().map(|mv| mv.timestamp).collect()
    }

    #[test]
    fn test_push_and_len() {
        let mut buffer = PredictionBuffer::new(10);

        buffer.push(make_move(1.0)).unwrap();
        buffer.push(make_move(2.0)).unwrap();
        buffer.push(make_move(3.0)).unwrap();

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.oldest_timestamp(), Some(1.0));
        assert_eq!(buffer.newest_timestamp(), Some(3.0));
    }

    #[test]
    fn test_acknowledge() {
        let mut buffer = PredictionBuffer::new(10);

        buffer.push(make_move(1.0)).unwrap();
        buffer.push(make_move(2.0)).unwrap();
        buffer.push(make_move(3.0)).unwrap();

        assert_eq!(buffer.acknowledge(2.0), 2);

        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.oldest_timestamp(), Some(3.0));
        assert_eq!(buffer.last_acknowledged(), Some(2.0));
    }

    #[test]
    fn test_acknowledge_between_timestamps() {
        let mut buffer = PredictionBuffer::new(10);
        for t in [1.0, 1.1, 1.2] {
            buffer.push(make_move(t)).unwrap();
        }
        buffer.acknowledge(1.15);
        assert_eq!(timestamps(&buffer), vec![1.2]);
    }

    #[test]
    fn test_acknowledge_older_keeps_everything() {
        let mut buffer = PredictionBuffer::new(10);
        buffer.push(make_move(5.0)).unwrap();
        assert_eq!(buffer.acknowledge(1.0), 0);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_stale_acknowledgment_does_not_regress() {
        let mut buffer = PredictionBuffer::new(10);
        buffer.acknowledge(4.0);
        buffer.acknowledge(2.0);
        assert_eq!(buffer.last_acknowledged(), Some(4.0));
    }

    #[test]
    fn test_moves_after() {
        let mut buffer = PredictionBuffer::new(10);
        for t in [1.0, 2.0, 3.0, 4.0] {
            buffer.push(make_move(t)).unwrap();
        }

        let after: Vec<_> = buffer.moves_after(2.0).collect();
        assert_eq!(after.len(), 2);
        assert_eq!(after[0].timestamp, 3.0);
        assert_eq!(after[1].timestamp, 4.0);
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn test_rejects_non_increasing_timestamps() {
        let mut buffer = PredictionBuffer::new(10);
        buffer.push(make_move(2.0)).unwrap();
        assert!(matches!(
            buffer.push(make_move(2.0)),
            Err(Error::NonMonotonicTimestamp { .. })
        ));
        assert!(buffer.push(make_move(1.0)).is_err());
        assert!(buffer.push(make_move(f64::NAN)).is_err());
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_rejects_timestamp_already_acknowledged() {
        let mut buffer = PredictionBuffer::new(10);
        buffer.acknowledge(3.0);
        assert!(buffer.push(make_move(3.0)).is_err());
        assert!(buffer.push(make_move(3.5)).is_ok());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut buffer = PredictionBuffer::new(3);

        assert_eq!(buffer.push(make_move(1.0)).unwrap(), None);
        buffer.push(make_move(2.0)).unwrap();
        buffer.push(make_move(3.0)).unwrap();

        let evicted = buffer.push(make_move(4.0)).unwrap();
        assert_eq!(evicted.map(|mv| mv.timestamp), Some(1.0));
        assert_eq!(timestamps(&buffer), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let buffer = PredictionBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);
    }

    proptest! {
        #[test]
        fn acknowledge_keeps_exactly_newer_moves_in_order(
            steps in prop::collection::vec(1u32..1_000, 0..64),
            ack in 0u32..40_000,
        ) {
            let mut buffer = PredictionBuffer::new(128);
            let mut now = 0u32;
            let mut pushed = Vec::new();
            for step in steps {
                now += step;
                let t = f64::from(now) / 1_000.0;
                buffer.push(make_move(t)).unwrap();
                pushed.push(t);
            }

            let ack = f64::from(ack) / 1_000.0;
            buffer.acknowledge(ack);

            let expected: Vec<f64> = pushed.into_iter().filter(|t| *t > ack).collect();
            prop_assert_eq!(timestamps(&buffer), expected);
        }
    }
}
