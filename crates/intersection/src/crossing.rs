use bevy::log::{debug, error};

use crate::car::Car;
use crate::direction::Direction;
use crate::error::{SimError, Violation};
use crate::intersection::Intersection;
use crate::path::resolve_path;
use crate::report::{CrossingEvent, CrossingReporter};

/// Move every expected car of one lane through the intersection and return
/// the lane's output list in crossing order.
///
/// Per car: pop from the lane, resolve its path, lock the path's quadrants
/// in ascending order, record and report the crossing while the locks are
/// held, then release. The only blocking points are the lane pop (with no
/// quadrant held) and waiting for a quadrant lock.
pub fn run_crossing(
    intersection: &Intersection,
    direction: Direction,
    reporter: &dyn CrossingReporter,
) -> Result<Vec<Car>, SimError> {
    // Once this thread stops, nobody drains the buffer: unblock the
    // arrival side whether we finished, failed or panicked.
    let _close = intersection.lane(direction).channel().close_on_drop();
    let result = cross_lane(intersection, direction, reporter);
    if let Err(e) = &result {
        error!("{} crossing aborted: {}", direction, e);
    }
    result
}

fn cross_lane(
    intersection: &Intersection,
    direction: Direction,
    reporter: &dyn CrossingReporter,
) -> Result<Vec<Car>, SimError> {
    let lane = intersection.lane(direction);
    let mut output = Vec::with_capacity(lane.expected());

    while lane.crossed() < lane.expected() {
        let Some(car) = lane.channel().pop()? else {
            return Err(Violation::LaneExhaustedEarly {
                lane: direction,
                crossed: lane.crossed(),
                expected: lane.expected(),
            }
            .into());
        };
        if car.entry() != direction {
            return Err(SimError::WrongLane {
                car_id: car.id(),
                lane: direction,
            });
        }

        let path = resolve_path(car.entry(), car.exit());
        let held = intersection.quadrants().acquire(&path, car.id())?;

        let sequence = lane.record_crossing()?;
        let event = CrossingEvent::new(&car, path, sequence);
        reporter.report(&event);
        debug!(
            "{} #{}: car {} -> {} holding {:?}",
            direction,
            sequence,
            car.id(),
            car.exit(),
            held.quadrants().collect::<Vec<_>>()
        );
        output.push(car);

        drop(held);
    }

    Ok(output)
}
