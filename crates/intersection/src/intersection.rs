use crate::config::{SimParams, DIRECTION_COUNT};
use crate::direction::Direction;
use crate::error::SimError;
use crate::lane::Lane;
use crate::quadrant::QuadrantSet;

/// The shared context of a run: four lanes and the quadrant locks.
///
/// Built once before any thread starts and only ever shared by reference,
/// so every lane and quadrant outlives the threads using it.
#[derive(Debug)]
pub struct Intersection {
    lanes: [Lane; DIRECTION_COUNT],
    quadrants: QuadrantSet,
}

impl Intersection {
    /// Build an intersection whose lanes expect `expected[dir.index()]` cars.
    pub fn new(params: &SimParams, expected: [usize; DIRECTION_COUNT]) -> Result<Self, SimError> {
        params.validate()?;
        let [north, east, south, west] = Direction::ALL
            .map(|dir| Lane::new(dir, params.lane_capacity, expected[dir.index()]));
        Ok(Self {
            lanes: [north?, east?, south?, west?],
            quadrants: QuadrantSet::new(),
        })
    }

    pub fn lane(&self, direction: Direction) -> &Lane {
        &self.lanes[direction.index()]
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn quadrants(&self) -> &QuadrantSet {
        &self.quadrants
    }

    /// Cars expected across all lanes.
    pub fn total_expected(&self) -> usize {
        self.lanes.iter().map(Lane::expected).sum()
    }

    pub fn total_crossed(&self) -> usize {
        self.lanes.iter().map(Lane::crossed).sum()
    }

    pub fn is_finished(&self) -> bool {
        self.lanes.iter().all(Lane::is_finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_builds_four_lanes() {
        let intersection = Intersection::new(&SimParams::with_capacity(2), [1, 0, 3, 0]).unwrap();
        for dir in Direction::ALL {
            assert_eq!(intersection.lane(dir).direction(), dir);
            assert_eq!(intersection.lane(dir).channel().capacity(), 2);
        }
        assert_eq!(intersection.lane(Direction::South).expected(), 3);
        assert_eq!(intersection.total_expected(), 4);
        assert_eq!(intersection.total_crossed(), 0);
        assert!(!intersection.is_finished());
    }

    #[test]
    fn test_new_rejects_zero_capacity() {
        let err = Intersection::new(&SimParams::with_capacity(0), [0; DIRECTION_COUNT]).unwrap_err();
        assert!(matches!(err, SimError::InvalidCapacity(0)));
    }
}
