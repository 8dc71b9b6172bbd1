use serde::{Deserialize, Serialize};

use crate::direction::Direction;

/// A car's identity and movement. Deliberately not `Clone`: a car is moved
/// from the schedule into its lane, through the lane buffer and into the
/// lane's output list, so it can never sit in two lists at once.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    id: u32,
    entry: Direction,
    exit: Direction,
}

impl Car {
    pub fn new(id: u32, entry: Direction, exit: Direction) -> Self {
        Self { id, entry, exit }
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The lane this car arrives on.
    #[inline]
    pub fn entry(&self) -> Direction {
        self.entry
    }

    #[inline]
    pub fn exit(&self) -> Direction {
        self.exit
    }
}
