//! Path resolution: which quadrants a car occupies while crossing.
//!
//! A car always starts in the home quadrant of its entry direction and sweeps
//! clockwise: a straight crossing covers one more quadrant, a wide turn two
//! more, and a near turn (including a U-turn) stays in the home quadrant.

use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::quadrant::Quadrant;

/// Longest path through the intersection (a wide turn).
pub const MAX_PATH_LEN: usize = 3;

/// Classification of a movement through the intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnKind {
    /// Exit one step counter-clockwise, or a U-turn. Home quadrant only.
    NearTurn,
    /// Exit directly opposite the entry. Two quadrants.
    Straight,
    /// Exit one step clockwise. Three quadrants.
    WideTurn,
}

impl TurnKind {
    pub fn classify(entry: Direction, exit: Direction) -> Self {
        if exit == entry.clockwise(1) {
            TurnKind::WideTurn
        } else if exit == entry.opposite() {
            TurnKind::Straight
        } else {
            TurnKind::NearTurn
        }
    }

    /// Number of quadrants a movement of this kind occupies.
    pub fn quadrant_count(self) -> usize {
        match self {
            TurnKind::NearTurn => 1,
            TurnKind::Straight => 2,
            TurnKind::WideTurn => 3,
        }
    }
}

/// The quadrants on a car's path, kept in traversal order.
///
/// Traversal order is what the car physically does; it is never the order
/// locks are taken in. Use [`QuadrantPath::lock_order`] for that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<Quadrant>", try_from = "Vec<Quadrant>")]
pub struct QuadrantPath {
    traversal: [Quadrant; MAX_PATH_LEN],
    len: u8,
}

impl QuadrantPath {
    fn from_sweep(home: Quadrant, count: usize) -> Self {
        let mut traversal = [home; MAX_PATH_LEN];
        for (step, slot) in traversal.iter_mut().enumerate().take(count) {
            *slot = home.clockwise(step);
        }
        Self {
            traversal,
            len: count as u8,
        }
    }

    pub fn traversal(&self) -> &[Quadrant] {
        &self.traversal[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The quadrants sorted by ascending index: the only order in which
    /// crossings may lock them.
    pub fn lock_order(&self) -> LockOrder {
        let mut quadrants = self.traversal;
        quadrants[..self.len as usize].sort_unstable();
        LockOrder {
            quadrants,
            len: self.len,
        }
    }
}

/// A path's quadrants in global lock order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOrder {
    quadrants: [Quadrant; MAX_PATH_LEN],
    len: u8,
}

impl LockOrder {
    pub fn as_slice(&self) -> &[Quadrant] {
        &self.quadrants[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl From<QuadrantPath> for Vec<Quadrant> {
    fn from(path: QuadrantPath) -> Self {
        path.traversal().to_vec()
    }
}

impl TryFrom<Vec<Quadrant>> for QuadrantPath {
    type Error = String;

    fn try_from(quadrants: Vec<Quadrant>) -> Result<Self, Self::Error> {
        let Some(&home) = quadrants.first() else {
            return Err("empty quadrant path".to_string());
        };
        if quadrants.len() > MAX_PATH_LEN {
            return Err(format!("quadrant path of {} quadrants", quadrants.len()));
        }
        let path = Self::from_sweep(home, quadrants.len());
        if path.traversal() != quadrants.as_slice() {
            return Err(format!("{quadrants:?} is not a clockwise sweep"));
        }
        Ok(path)
    }
}

/// Resolve the quadrants a car entering from `entry` and leaving towards
/// `exit` occupies, home quadrant first.
pub fn resolve_path(entry: Direction, exit: Direction) -> QuadrantPath {
    let kind = TurnKind::classify(entry, exit);
    QuadrantPath::from_sweep(Quadrant::home(entry), kind.quadrant_count())
}
