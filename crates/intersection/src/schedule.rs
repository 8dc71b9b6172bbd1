//! Per-lane pending car lists and the ways to build them.
//!
//! A schedule file holds one car per line as `<id> <in> <out>`, directions
//! given as `0=North 1=East 2=South 3=West` or by name. Blank lines and
//! `#` comments are skipped. Each car joins the lane of its entry direction,
//! and within a lane cars keep file order.

use std::collections::HashSet;
use std::path::Path;

use bevy::log::info;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::car::Car;
use crate::config::DIRECTION_COUNT;
use crate::direction::Direction;
use crate::error::SimError;

/// Cars waiting to arrive, one ordered list per lane.
#[derive(Debug, Default)]
pub struct Schedule {
    lanes: [Vec<Car>; DIRECTION_COUNT],
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `car` to the lane it enters from.
    pub fn push(&mut self, car: Car) {
        self.lanes[car.entry().index()].push(car);
    }

    pub fn lane(&self, direction: Direction) -> &[Car] {
        &self.lanes[direction.index()]
    }

    /// Ids of a lane's cars in arrival order.
    pub fn lane_ids(&self, direction: Direction) -> Vec<u32> {
        self.lane(direction).iter().map(Car::id).collect()
    }

    pub fn len(&self) -> usize {
        self.lanes.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check that no id is used twice across all lanes.
    pub fn check_unique_ids(&self) -> Result<(), SimError> {
        let mut seen = HashSet::with_capacity(self.len());
        for car in self.lanes.iter().flatten() {
            if !seen.insert(car.id()) {
                return Err(SimError::DuplicateCarId(car.id()));
            }
        }
        Ok(())
    }

    pub fn into_lanes(self) -> [Vec<Car>; DIRECTION_COUNT] {
        self.lanes
    }

    /// Parse schedule text.
    pub fn parse(text: &str) -> Result<Self, SimError> {
        let mut schedule = Schedule::new();
        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let content = raw.split('#').next().unwrap_or_default().trim();
            if content.is_empty() {
                continue;
            }
            schedule.push(parse_car(content).map_err(|reason| SimError::ScheduleParse {
                line,
                reason,
            })?);
        }
        schedule.check_unique_ids()?;
        Ok(schedule)
    }

    pub fn load(path: &Path) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)?;
        let schedule = Self::parse(&text)?;
        info!(
            "Loaded {} cars from {} (N={} E={} S={} W={})",
            schedule.len(),
            path.display(),
            schedule.lane(Direction::North).len(),
            schedule.lane(Direction::East).len(),
            schedule.lane(Direction::South).len(),
            schedule.lane(Direction::West).len(),
        );
        Ok(schedule)
    }

    /// `count` cars with uniformly random entry and exit directions, ids
    /// `1..=count`. The same seed always yields the same schedule.
    pub fn random(count: u32, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut schedule = Schedule::new();
        for id in 1..=count {
            let entry = Direction::ALL[rng.gen_range(0..DIRECTION_COUNT)];
            let exit = Direction::ALL[rng.gen_range(0..DIRECTION_COUNT)];
            schedule.push(Car::new(id, entry, exit));
        }
        schedule
    }
}

fn parse_car(content: &str) -> Result<Car, String> {
    let fields: Vec<&str> = content.split_whitespace().collect();
    let [id, entry, exit] = fields.as_slice() else {
        return Err(format!(
            "expected `<id> <in> <out>`, found {} fields",
            fields.len()
        ));
    };
    let id = id
        .parse::<u32>()
        .map_err(|e| format!("bad car id '{id}': {e}"))?;
    Ok(Car::new(id, entry.parse()?, exit.parse()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_routes_cars_to_entry_lanes() {
        let text = "\
            # id in out
            1 0 2
            2 1 3

            3 0 3   # near turn
            4 south west
        ";
        let schedule = Schedule::parse(text).unwrap();
        assert_eq!(schedule.len(), 4);
        assert_eq!(schedule.lane_ids(Direction::North), vec![1, 3]);
        assert_eq!(schedule.lane_ids(Direction::East), vec![2]);
        assert_eq!(schedule.lane_ids(Direction::South), vec![4]);
        assert!(schedule.lane(Direction::West).is_empty());

        let first = &schedule.lane(Direction::North)[0];
        assert_eq!(first.exit(), Direction::South);
    }

    #[test]
    fn test_parse_reports_line_number() {
        let err = Schedule::parse("1 0 2\n2 0\n").unwrap_err();
        match err {
            SimError::ScheduleParse { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("2 fields"), "got: {reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_direction() {
        let err = Schedule::parse("1 0 7").unwrap_err();
        assert!(matches!(err, SimError::ScheduleParse { line: 1, .. }));
    }

    #[test]
    fn test_parse_rejects_duplicate_ids() {
        let err = Schedule::parse("5 0 1\n5 2 3").unwrap_err();
        assert!(matches!(err, SimError::DuplicateCarId(5)));
    }

    #[test]
    fn test_random_is_reproducible() {
        let a = Schedule::random(200, 42);
        let b = Schedule::random(200, 42);
        assert_eq!(a.len(), 200);
        for dir in Direction::ALL {
            assert_eq!(a.lane(dir), b.lane(dir));
        }
        assert!(a.check_unique_ids().is_ok());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Schedule::load(Path::new("/nonexistent/schedule.txt")).unwrap_err();
        assert!(matches!(err, SimError::Io(_)));
    }
}
