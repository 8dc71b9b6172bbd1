//! Runs a full simulation: one arrival and one crossing thread per lane,
//! all joined before the outcome is checked and returned.

use std::collections::HashSet;
use std::thread::{self, ScopedJoinHandle};
use std::time::{Duration, Instant};

use bevy::log::{error, info};
use serde::Serialize;

use crate::arrival::run_arrival;
use crate::car::Car;
use crate::config::{SimParams, DIRECTION_COUNT};
use crate::crossing::run_crossing;
use crate::direction::Direction;
use crate::error::{SimError, Violation};
use crate::intersection::Intersection;
use crate::quadrant::Quadrant;
use crate::report::CrossingReporter;
use crate::schedule::Schedule;

/// Final state of one lane.
#[derive(Debug, Serialize)]
pub struct LaneOutcome {
    pub direction: Direction,
    pub expected: usize,
    pub crossed: usize,
    /// Highest buffer occupancy seen during the run.
    pub high_water: usize,
    /// Cars in the order they crossed.
    pub output: Vec<Car>,
}

impl LaneOutcome {
    pub fn output_ids(&self) -> Vec<u32> {
        self.output.iter().map(Car::id).collect()
    }
}

/// Everything a finished run produced.
#[derive(Debug, Serialize)]
pub struct SimulationOutcome {
    pub lane_capacity: usize,
    pub lanes: Vec<LaneOutcome>,
    pub total_crossed: usize,
    /// Crossings that passed through each quadrant, indexed `Q0..Q3`.
    pub quadrant_entries: [u64; 4],
    pub elapsed_ms: u64,
}

impl SimulationOutcome {
    pub fn lane(&self, direction: Direction) -> &LaneOutcome {
        &self.lanes[direction.index()]
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        serde_json::to_string_pretty(self).map_err(|e| SimError::Config(e.to_string()))
    }
}

/// A validated intersection together with the cars it will process.
pub struct Simulation {
    intersection: Intersection,
    pending: [Vec<Car>; DIRECTION_COUNT],
    lane_capacity: usize,
}

impl Simulation {
    /// Pair an intersection with a schedule, rejecting any mismatch before a
    /// thread is started.
    pub fn new(intersection: Intersection, schedule: Schedule) -> Result<Self, SimError> {
        schedule.check_unique_ids()?;
        for dir in Direction::ALL {
            let lane = intersection.lane(dir);
            let pending = schedule.lane(dir);
            if lane.expected() != pending.len() {
                return Err(SimError::LaneMismatch {
                    lane: dir,
                    expected: lane.expected(),
                    pending: pending.len(),
                });
            }
            if let Some(stray) = pending.iter().find(|car| car.entry() != dir) {
                return Err(SimError::WrongLane {
                    car_id: stray.id(),
                    lane: dir,
                });
            }
        }
        let lane_capacity = intersection.lane(Direction::North).channel().capacity();
        Ok(Self {
            intersection,
            pending: schedule.into_lanes(),
            lane_capacity,
        })
    }

    /// Build the intersection from `params`, deriving each lane's expected
    /// count from the schedule.
    pub fn from_schedule(params: &SimParams, schedule: Schedule) -> Result<Self, SimError> {
        let expected = Direction::ALL.map(|dir| schedule.lane(dir).len());
        let intersection = Intersection::new(params, expected)?;
        Self::new(intersection, schedule)
    }

    /// Run all eight threads to completion.
    pub fn run(self, reporter: &dyn CrossingReporter) -> Result<SimulationOutcome, SimError> {
        let Simulation {
            intersection,
            pending,
            lane_capacity,
        } = self;
        let arrival_ids = pending
            .each_ref()
            .map(|cars| cars.iter().map(Car::id).collect::<Vec<_>>());

        info!(
            "Starting simulation: {} cars, lane capacity {}",
            intersection.total_expected(),
            lane_capacity
        );
        let started = Instant::now();
        let outputs = run_threads(&intersection, pending, reporter)?;
        let elapsed = started.elapsed();

        let mut seen = HashSet::with_capacity(intersection.total_expected());
        let mut lanes = Vec::with_capacity(DIRECTION_COUNT);
        for (dir, output) in Direction::ALL.into_iter().zip(outputs) {
            let lane = intersection.lane(dir);
            if let Some(car) = output.iter().find(|car| !seen.insert(car.id())) {
                return Err(fail(Violation::DuplicateCrossing { car_id: car.id() }));
            }
            if !output.iter().map(Car::id).eq(arrival_ids[dir.index()].iter().copied()) {
                return Err(fail(Violation::OutputMismatch { lane: dir }));
            }
            if !lane.is_finished() || output.len() != lane.expected() {
                return Err(fail(Violation::LaneExhaustedEarly {
                    lane: dir,
                    crossed: lane.crossed(),
                    expected: lane.expected(),
                }));
            }
            info!(
                "{} lane done: {} cars, buffer peak {}/{}",
                dir,
                lane.crossed(),
                lane.channel().high_water(),
                lane_capacity
            );
            lanes.push(LaneOutcome {
                direction: dir,
                expected: lane.expected(),
                crossed: lane.crossed(),
                high_water: lane.channel().high_water(),
                output,
            });
        }

        let total_crossed = intersection.total_crossed();
        info!(
            "Simulation finished: {} cars crossed in {:?}",
            total_crossed, elapsed
        );
        Ok(SimulationOutcome {
            lane_capacity,
            lanes,
            total_crossed,
            quadrant_entries: Quadrant::ALL.map(|q| intersection.quadrants().entries(q)),
            elapsed_ms: saturating_millis(elapsed),
        })
    }
}

fn saturating_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

fn fail(violation: Violation) -> SimError {
    error!("{}", violation);
    SimError::InvariantViolation(violation)
}

type ArrivalHandle<'scope> = ScopedJoinHandle<'scope, Result<usize, SimError>>;
type CrossingHandle<'scope> = ScopedJoinHandle<'scope, Result<Vec<Car>, SimError>>;

/// Spawn the arrival/crossing pair for every lane and join them all.
fn run_threads(
    intersection: &Intersection,
    pending: [Vec<Car>; DIRECTION_COUNT],
    reporter: &dyn CrossingReporter,
) -> Result<[Vec<Car>; DIRECTION_COUNT], SimError> {
    thread::scope(|s| {
        let mut arrivals: Vec<(Direction, ArrivalHandle<'_>)> = Vec::new();
        let mut crossings: Vec<(Direction, CrossingHandle<'_>)> = Vec::new();
        let mut spawn_error = None;

        for (dir, cars) in Direction::ALL.into_iter().zip(pending) {
            let lane = intersection.lane(dir);
            let arrival = thread::Builder::new()
                .name(format!("arrival-{}", dir.name().to_lowercase()))
                .spawn_scoped(s, move || run_arrival(lane, cars));
            let crossing = thread::Builder::new()
                .name(format!("crossing-{}", dir.name().to_lowercase()))
                .spawn_scoped(s, move || run_crossing(intersection, dir, reporter));
            match (arrival, crossing) {
                (Ok(a), Ok(c)) => {
                    arrivals.push((dir, a));
                    crossings.push((dir, c));
                }
                (a, c) => {
                    spawn_error = a.err().or(c.err()).map(SimError::Io);
                    break;
                }
            }
        }
        if let Some(e) = spawn_error {
            // Release whatever did start; scope exit joins it.
            for lane in intersection.lanes() {
                lane.channel().close();
            }
            return Err(e);
        }

        let mut errors = Vec::new();
        for (dir, handle) in arrivals {
            match handle.join() {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => errors.push(e),
                Err(_) => errors.push(SimError::ThreadPanicked {
                    role: "arrival",
                    lane: dir,
                }),
            }
        }
        let mut outputs: [Vec<Car>; DIRECTION_COUNT] = Default::default();
        for (dir, handle) in crossings {
            match handle.join() {
                Ok(Ok(output)) => outputs[dir.index()] = output,
                Ok(Err(e)) => errors.push(e),
                Err(_) => errors.push(SimError::ThreadPanicked {
                    role: "crossing",
                    lane: dir,
                }),
            }
        }

        match errors.into_iter().min_by_key(severity) {
            Some(e) => Err(e),
            None => Ok(outputs),
        }
    })
}

/// Lower is closer to the root cause. A closed channel is almost always the
/// echo of another thread giving up.
fn severity(error: &SimError) -> u8 {
    match error {
        SimError::ThreadPanicked { .. } => 0,
        SimError::InvariantViolation(_) => 1,
        SimError::LockPoisoned(_) => 2,
        SimError::ChannelClosed(_) => 4,
        _ => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::CollectingReporter;

    #[test]
    fn test_elapsed_millis_saturate_instead_of_wrapping() {
        assert_eq!(saturating_millis(Duration::from_millis(1_500)), 1_500);
        assert_eq!(saturating_millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_small_run_reports_every_lane() {
        let sim = Simulation::from_schedule(&SimParams::with_capacity(1), Schedule::random(24, 3))
            .unwrap();
        let outcome = sim.run(&CollectingReporter::new()).unwrap();
        assert_eq!(outcome.total_crossed, 24);
        assert_eq!(outcome.lanes.len(), DIRECTION_COUNT);
        for dir in Direction::ALL {
            assert_eq!(outcome.lane(dir).direction, dir);
        }
    }
}
