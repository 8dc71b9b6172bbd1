use std::sync::atomic::{AtomicUsize, Ordering};

use crate::direction::Direction;
use crate::error::{SimError, Violation};
use crate::lane_channel::LaneChannel;

/// Shared per-lane state: the bounded buffer and the crossing counters.
///
/// The pending list and output list are not stored here. The pending list is
/// moved into the lane's arrival thread and the output list is built by the
/// crossing thread and handed back when it is joined, so neither is ever
/// reachable from two threads.
#[derive(Debug)]
pub struct Lane {
    direction: Direction,
    channel: LaneChannel,
    expected: usize,
    crossed: AtomicUsize,
}

impl Lane {
    pub fn new(direction: Direction, capacity: usize, expected: usize) -> Result<Self, SimError> {
        Ok(Self {
            direction,
            channel: LaneChannel::new(direction, capacity)?,
            expected,
            crossed: AtomicUsize::new(0),
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn channel(&self) -> &LaneChannel {
        &self.channel
    }

    /// Total cars that will ever arrive on this lane.
    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn crossed(&self) -> usize {
        self.crossed.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.crossed() == self.expected
    }

    /// Count one more crossing and return the new total. Only the lane's
    /// crossing thread calls this.
    pub(crate) fn record_crossing(&self) -> Result<usize, Violation> {
        let crossed = self.crossed.fetch_add(1, Ordering::AcqRel) + 1;
        if crossed > self.expected {
            return Err(Violation::CrossedExceedsExpected {
                lane: self.direction,
                crossed,
                expected: self.expected,
            });
        }
        Ok(crossed)
    }
}
