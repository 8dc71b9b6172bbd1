// ---------------------------------------------------------------------------
// SimError: setup, schedule and runtime failures of a simulation run
// ---------------------------------------------------------------------------

use std::fmt;

use crate::direction::Direction;
use crate::quadrant::Quadrant;

/// A broken runtime invariant. Any of these means the lock discipline was
/// violated somewhere, so the run is aborted rather than continued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A lane recorded more crossings than it was ever going to receive.
    CrossedExceedsExpected {
        lane: Direction,
        crossed: usize,
        expected: usize,
    },
    /// The lane channel closed empty before every expected car crossed.
    LaneExhaustedEarly {
        lane: Direction,
        crossed: usize,
        expected: usize,
    },
    /// A crossing found its quadrant already marked by another car.
    QuadrantDoubleOccupied {
        quadrant: Quadrant,
        holder: u32,
        intruder: u32,
    },
    /// The same car id was recorded as crossed twice.
    DuplicateCrossing { car_id: u32 },
    /// A lane's output list does not match its pending list.
    OutputMismatch { lane: Direction },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::CrossedExceedsExpected {
                lane,
                crossed,
                expected,
            } => write!(
                f,
                "{lane} lane crossed {crossed} cars but only {expected} were expected"
            ),
            Violation::LaneExhaustedEarly {
                lane,
                crossed,
                expected,
            } => write!(
                f,
                "{lane} lane ran dry after {crossed} of {expected} crossings"
            ),
            Violation::QuadrantDoubleOccupied {
                quadrant,
                holder,
                intruder,
            } => write!(
                f,
                "{quadrant} entered by car {intruder} while held by car {holder}"
            ),
            Violation::DuplicateCrossing { car_id } => {
                write!(f, "car {car_id} crossed more than once")
            }
            Violation::OutputMismatch { lane } => {
                write!(f, "{lane} lane output does not match its arrivals")
            }
        }
    }
}

/// Errors that can occur while setting up or running the intersection.
#[derive(Debug)]
pub enum SimError {
    /// Lane capacity must be at least 1.
    InvalidCapacity(usize),
    /// A lane's `expected` count disagrees with the size of its pending list.
    LaneMismatch {
        lane: Direction,
        expected: usize,
        pending: usize,
    },
    /// A car was queued on a lane other than its entry direction.
    WrongLane { car_id: u32, lane: Direction },
    /// Two cars in the schedule share an id.
    DuplicateCarId(u32),
    /// A schedule line could not be parsed.
    ScheduleParse { line: usize, reason: String },
    /// I/O error reading a schedule or parameter file.
    Io(std::io::Error),
    /// Parameter file could not be decoded.
    Config(String),
    /// A car was pushed after the lane stopped accepting arrivals.
    ChannelClosed(Direction),
    /// A lock was poisoned by a panicking thread.
    LockPoisoned(&'static str),
    /// A runtime invariant was broken.
    InvariantViolation(Violation),
    /// A worker thread panicked.
    ThreadPanicked {
        role: &'static str,
        lane: Direction,
    },
}

impl SimError {
    /// True for errors raised before any thread was started.
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            SimError::InvalidCapacity(_)
                | SimError::LaneMismatch { .. }
                | SimError::WrongLane { .. }
                | SimError::DuplicateCarId(_)
                | SimError::ScheduleParse { .. }
                | SimError::Io(_)
                | SimError::Config(_)
        )
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidCapacity(c) => {
                write!(f, "Invalid lane capacity {c}: must be at least 1")
            }
            SimError::LaneMismatch {
                lane,
                expected,
                pending,
            } => write!(
                f,
                "{lane} lane expects {expected} cars but has {pending} pending"
            ),
            SimError::WrongLane { car_id, lane } => {
                write!(f, "Car {car_id} queued on the {lane} lane it does not enter from")
            }
            SimError::DuplicateCarId(id) => write!(f, "Duplicate car id {id} in schedule"),
            SimError::ScheduleParse { line, reason } => {
                write!(f, "Schedule line {line}: {reason}")
            }
            SimError::Io(e) => write!(f, "I/O error: {e}"),
            SimError::Config(msg) => write!(f, "Configuration error: {msg}"),
            SimError::ChannelClosed(lane) => {
                write!(f, "{lane} lane is closed to new arrivals")
            }
            SimError::LockPoisoned(what) => write!(f, "Lock poisoned: {what}"),
            SimError::InvariantViolation(v) => write!(f, "Invariant violation: {v}"),
            SimError::ThreadPanicked { role, lane } => {
                write!(f, "{role} thread for the {lane} lane panicked")
            }
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SimError {
    fn from(e: std::io::Error) -> Self {
        SimError::Io(e)
    }
}

impl From<Violation> for SimError {
    fn from(v: Violation) -> Self {
        SimError::InvariantViolation(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_invalid_capacity() {
        let msg = format!("{}", SimError::InvalidCapacity(0));
        assert!(msg.contains("at least 1"), "got: {msg}");
    }

    #[test]
    fn test_display_lane_mismatch() {
        let err = SimError::LaneMismatch {
            lane: Direction::East,
            expected: 0,
            pending: 2,
        };
        let msg = format!("{err}");
        assert!(msg.contains("East"), "got: {msg}");
        assert!(msg.contains("expects 0"), "got: {msg}");
    }

    #[test]
    fn test_display_violation() {
        let err: SimError = Violation::QuadrantDoubleOccupied {
            quadrant: Quadrant::Q2,
            holder: 4,
            intruder: 9,
        }
        .into();
        let msg = format!("{err}");
        assert!(msg.starts_with("Invariant violation"), "got: {msg}");
        assert!(msg.contains("Q2"), "got: {msg}");
        assert!(msg.contains("car 9"), "got: {msg}");
    }

    #[test]
    fn test_setup_errors_are_distinguishable() {
        assert!(SimError::InvalidCapacity(0).is_setup_error());
        assert!(SimError::DuplicateCarId(3).is_setup_error());
        assert!(!SimError::ThreadPanicked {
            role: "crossing",
            lane: Direction::North,
        }
        .is_setup_error());
        assert!(!SimError::InvariantViolation(Violation::DuplicateCrossing { car_id: 1 })
            .is_setup_error());
    }

    #[test]
    fn test_io_error_has_source() {
        let err: SimError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, SimError::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
