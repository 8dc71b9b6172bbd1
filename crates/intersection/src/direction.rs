//! Compass directions, used both as lane identifiers and as the cyclic
//! adjacency index of the intersection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::DIRECTION_COUNT;

/// An inbound lane / exit direction. Declaration order is clockwise and is
/// the integer encoding used by schedule files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; DIRECTION_COUNT] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The direction `steps` quarter turns clockwise from this one.
    pub fn clockwise(self, steps: usize) -> Self {
        Self::ALL[(self.index() + steps) % DIRECTION_COUNT]
    }

    pub fn opposite(self) -> Self {
        self.clockwise(2)
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "North",
            Direction::East => "East",
            Direction::South => "South",
            Direction::West => "West",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts the integer encoding (`0`..`3`), full names and single letters,
/// case-insensitively.
impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(index) = s.parse::<usize>() {
            return Self::from_index(index)
                .ok_or_else(|| format!("direction index {index} out of range 0-3"));
        }
        match s.to_ascii_lowercase().as_str() {
            "n" | "north" => Ok(Direction::North),
            "e" | "east" => Ok(Direction::East),
            "s" | "south" => Ok(Direction::South),
            "w" | "west" => Ok(Direction::West),
            _ => Err(format!("unknown direction '{s}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        for dir in Direction::ALL {
            assert_eq!(Direction::from_index(dir.index()), Some(dir));
        }
        assert_eq!(Direction::from_index(4), None);
    }

    #[test]
    fn test_clockwise_wraps() {
        assert_eq!(Direction::North.clockwise(1), Direction::East);
        assert_eq!(Direction::West.clockwise(1), Direction::North);
        assert_eq!(Direction::South.clockwise(4), Direction::South);
    }

    #[test]
    fn test_opposite() {
        assert_eq!(Direction::North.opposite(), Direction::South);
        assert_eq!(Direction::East.opposite(), Direction::West);
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!("0".parse::<Direction>(), Ok(Direction::North));
        assert_eq!("3".parse::<Direction>(), Ok(Direction::West));
        assert_eq!("east".parse::<Direction>(), Ok(Direction::East));
        assert_eq!("S".parse::<Direction>(), Ok(Direction::South));
        assert!("4".parse::<Direction>().is_err());
        assert!("up".parse::<Direction>().is_err());
    }
}
