//! The four quadrants of the intersection and the locks that guard them.
//!
//! Each quadrant is a `Mutex<()>`: holding the guard means a car occupies
//! that quadrant. Alongside the locks, an occupancy table records which car
//! holds each quadrant so a broken lock discipline is detected and reported
//! instead of silently producing overlapping crossings.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::config::QUADRANT_COUNT;
use crate::direction::Direction;
use crate::error::{SimError, Violation};
use crate::path::QuadrantPath;

/// A quadrant of the intersection. Declaration order is the global lock
/// order: `Q0 < Q1 < Q2 < Q3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quadrant {
    /// East side.
    Q0,
    /// North side.
    Q1,
    /// West side.
    Q2,
    /// South side.
    Q3,
}

impl Quadrant {
    pub const ALL: [Quadrant; QUADRANT_COUNT] =
        [Quadrant::Q0, Quadrant::Q1, Quadrant::Q2, Quadrant::Q3];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The quadrant a car entering from `entry` occupies first.
    pub fn home(entry: Direction) -> Self {
        match entry {
            Direction::North => Quadrant::Q1,
            Direction::East => Quadrant::Q0,
            Direction::South => Quadrant::Q3,
            Direction::West => Quadrant::Q2,
        }
    }

    /// The quadrant `steps` positions further along a car's clockwise sweep.
    pub fn clockwise(self, steps: usize) -> Self {
        Self::ALL[(self.index() + steps) % QUADRANT_COUNT]
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.index())
    }
}

// ---------------------------------------------------------------------------
// QuadrantSet
// ---------------------------------------------------------------------------

const VACANT: u64 = 0;

/// The four quadrant locks shared by every crossing thread.
#[derive(Debug, Default)]
pub struct QuadrantSet {
    locks: [Mutex<()>; QUADRANT_COUNT],
    /// `car id + 1` of the current occupant, or `VACANT`.
    occupants: [AtomicU64; QUADRANT_COUNT],
    entries: [AtomicU64; QUADRANT_COUNT],
}

impl QuadrantSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock every quadrant on `path` for `car_id`.
    ///
    /// Locks are taken in `path.lock_order()`, never in traversal order.
    /// Every crossing thread agrees on that single total order, so no cycle
    /// of threads waiting on each other's quadrants can form.
    pub fn acquire(&self, path: &QuadrantPath, car_id: u32) -> Result<QuadrantGuard<'_>, SimError> {
        let order = path.lock_order();
        let mut guard = QuadrantGuard {
            set: self,
            held: Vec::with_capacity(order.len()),
        };
        for &quadrant in order.as_slice() {
            let lock = self.locks[quadrant.index()]
                .lock()
                .map_err(|_| SimError::LockPoisoned("quadrant"))?;
            self.occupy(quadrant, car_id)?;
            guard.held.push((quadrant, lock));
        }
        Ok(guard)
    }

    fn occupy(&self, quadrant: Quadrant, car_id: u32) -> Result<(), Violation> {
        let tag = u64::from(car_id) + 1;
        self.occupants[quadrant.index()]
            .compare_exchange(VACANT, tag, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|held| Violation::QuadrantDoubleOccupied {
                quadrant,
                holder: (held - 1) as u32,
                intruder: car_id,
            })?;
        self.entries[quadrant.index()].fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Id of the car currently occupying `quadrant`, if any.
    pub fn occupant(&self, quadrant: Quadrant) -> Option<u32> {
        match self.occupants[quadrant.index()].load(Ordering::Acquire) {
            VACANT => None,
            tag => Some((tag - 1) as u32),
        }
    }

    /// How many crossings have passed through `quadrant` so far.
    pub fn entries(&self, quadrant: Quadrant) -> u64 {
        self.entries[quadrant.index()].load(Ordering::Relaxed)
    }
}

/// Held quadrant locks for one crossing. Dropping it vacates and unlocks
/// the quadrants in reverse acquisition order.
pub struct QuadrantGuard<'a> {
    set: &'a QuadrantSet,
    held: Vec<(Quadrant, MutexGuard<'a, ()>)>,
}

impl QuadrantGuard<'_> {
    /// Quadrants held, in acquisition (ascending) order.
    pub fn quadrants(&self) -> impl Iterator<Item = Quadrant> + '_ {
        self.held.iter().map(|(q, _)| *q)
    }
}

impl Drop for QuadrantGuard<'_> {
    fn drop(&mut self) {
        while let Some((quadrant, lock)) = self.held.pop() {
            self.set.occupants[quadrant.index()].store(VACANT, Ordering::Release);
            drop(lock);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::resolve_path;

    #[test]
    fn test_home_quadrants() {
        assert_eq!(Quadrant::home(Direction::North), Quadrant::Q1);
        assert_eq!(Quadrant::home(Direction::East), Quadrant::Q0);
        assert_eq!(Quadrant::home(Direction::South), Quadrant::Q3);
        assert_eq!(Quadrant::home(Direction::West), Quadrant::Q2);
    }

    #[test]
    fn test_clockwise_wraps() {
        assert_eq!(Quadrant::Q3.clockwise(1), Quadrant::Q0);
        assert_eq!(Quadrant::Q2.clockwise(2), Quadrant::Q0);
    }

    #[test]
    fn test_acquire_marks_and_release_clears() {
        let set = QuadrantSet::new();
        let path = resolve_path(Direction::South, Direction::West);
        {
            let guard = set.acquire(&path, 7).unwrap();
            let held: Vec<_> = guard.quadrants().collect();
            assert_eq!(held, vec![Quadrant::Q0, Quadrant::Q1, Quadrant::Q3]);
            assert_eq!(set.occupant(Quadrant::Q0), Some(7));
            assert_eq!(set.occupant(Quadrant::Q1), Some(7));
            assert_eq!(set.occupant(Quadrant::Q2), None);
            assert_eq!(set.occupant(Quadrant::Q3), Some(7));
        }
        for q in Quadrant::ALL {
            assert_eq!(set.occupant(q), None, "{q} still occupied");
        }
        assert_eq!(set.entries(Quadrant::Q0), 1);
        assert_eq!(set.entries(Quadrant::Q2), 0);
    }

    #[test]
    fn test_disjoint_paths_held_together() {
        let set = QuadrantSet::new();
        let north = set
            .acquire(&resolve_path(Direction::North, Direction::South), 1)
            .unwrap();
        let south = set
            .acquire(&resolve_path(Direction::South, Direction::North), 2)
            .unwrap();
        assert_eq!(set.occupant(Quadrant::Q1), Some(1));
        assert_eq!(set.occupant(Quadrant::Q3), Some(2));
        drop(north);
        drop(south);
    }

    #[test]
    fn test_double_occupancy_is_reported() {
        let set = QuadrantSet::new();
        // Forge a stale mark to simulate a broken lock discipline.
        set.occupants[Quadrant::Q1.index()].store(43, Ordering::Release);
        let err = set
            .acquire(&resolve_path(Direction::North, Direction::West), 5)
            .err()
            .unwrap();
        match err {
            SimError::InvariantViolation(Violation::QuadrantDoubleOccupied {
                quadrant,
                holder,
                intruder,
            }) => {
                assert_eq!(quadrant, Quadrant::Q1);
                assert_eq!(holder, 42);
                assert_eq!(intruder, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
        // The forged mark is left alone and the lock is free again.
        assert_eq!(set.occupant(Quadrant::Q1), Some(42));
        assert!(set.locks[Quadrant::Q1.index()].try_lock().is_ok());
    }
}
