//! Bounded hand-off between a lane's arrival and crossing threads.
//!
//! A fixed ring of slots behind one mutex, with a condition variable for each
//! side: the arrival thread waits on `not_full`, the crossing thread waits on
//! `not_empty`. Cars move into the ring on `push` and back out on `pop`, so
//! ownership is transferred rather than shared.

use std::sync::{Condvar, Mutex, MutexGuard};

use crate::car::Car;
use crate::direction::Direction;
use crate::error::SimError;

#[derive(Debug)]
struct Ring {
    slots: Box<[Option<Car>]>,
    head: usize,
    tail: usize,
    len: usize,
    /// Set once the arrival side will never push again.
    closed: bool,
    high_water: usize,
}

impl Ring {
    fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            tail: 0,
            len: 0,
            closed: false,
            high_water: 0,
        }
    }

    #[inline]
    fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    fn push_back(&mut self, car: Car) {
        debug_assert!(self.slots[self.tail].is_none());
        self.slots[self.tail] = Some(car);
        self.tail = (self.tail + 1) % self.slots.len();
        self.len += 1;
        self.high_water = self.high_water.max(self.len);
    }

    fn pop_front(&mut self) -> Option<Car> {
        let car = self.slots[self.head].take()?;
        self.head = (self.head + 1) % self.slots.len();
        self.len -= 1;
        Some(car)
    }
}

/// Fixed-capacity FIFO of cars for one lane.
#[derive(Debug)]
pub struct LaneChannel {
    lane: Direction,
    ring: Mutex<Ring>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl LaneChannel {
    /// Create a channel holding at most `capacity` cars.
    pub fn new(lane: Direction, capacity: usize) -> Result<Self, SimError> {
        if capacity < 1 {
            return Err(SimError::InvalidCapacity(capacity));
        }
        Ok(Self {
            lane,
            ring: Mutex::new(Ring::new(capacity)),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ring>, SimError> {
        self.ring
            .lock()
            .map_err(|_| SimError::LockPoisoned("lane channel"))
    }

    /// Append `car` at the tail, blocking while the lane is full.
    ///
    /// Fails only if the channel was already closed; the car is dropped with
    /// the error since nothing downstream could ever take it.
    pub fn push(&self, car: Car) -> Result<(), SimError> {
        let mut ring = self.lock()?;
        while ring.is_full() && !ring.closed {
            ring = self
                .not_full
                .wait(ring)
                .map_err(|_| SimError::LockPoisoned("lane channel"))?;
        }
        if ring.closed {
            return Err(SimError::ChannelClosed(self.lane));
        }
        ring.push_back(car);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Remove the car at the head, blocking while the lane is empty.
    ///
    /// Returns `Ok(None)` once the lane is empty and closed: no car will
    /// ever arrive again.
    pub fn pop(&self) -> Result<Option<Car>, SimError> {
        let mut ring = self.lock()?;
        while ring.len == 0 && !ring.closed {
            ring = self
                .not_empty
                .wait(ring)
                .map_err(|_| SimError::LockPoisoned("lane channel"))?;
        }
        let car = ring.pop_front();
        if car.is_some() {
            self.not_full.notify_one();
        }
        Ok(car)
    }

    /// Mark the arrival side finished and wake every waiter. Cars already
    /// buffered can still be popped.
    pub fn close(&self) {
        // A poisoned ring still needs its waiters woken.
        let mut ring = match self.ring.lock() {
            Ok(ring) => ring,
            Err(poisoned) => poisoned.into_inner(),
        };
        ring.closed = true;
        drop(ring);
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Close the channel when the returned guard drops, including while
    /// unwinding from a panic.
    pub fn close_on_drop(&self) -> CloseOnDrop<'_> {
        CloseOnDrop(self)
    }

    pub fn lane(&self) -> Direction {
        self.lane
    }

    pub fn capacity(&self) -> usize {
        self.lock().map(|ring| ring.slots.len()).unwrap_or(0)
    }

    /// Cars currently buffered.
    pub fn len(&self) -> usize {
        self.lock().map(|ring| ring.len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.lock().map(|ring| ring.closed).unwrap_or(true)
    }

    /// Highest occupancy the buffer reached.
    pub fn high_water(&self) -> usize {
        self.lock().map(|ring| ring.high_water).unwrap_or(0)
    }
}

/// Closes its channel on drop. See [`LaneChannel::close_on_drop`].
pub struct CloseOnDrop<'a>(&'a LaneChannel);

impl Drop for CloseOnDrop<'_> {
    fn drop(&mut self) {
        self.0.close();
    }
}
