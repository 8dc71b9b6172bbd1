use bevy::log::debug;

use crate::car::Car;
use crate::error::SimError;
use crate::lane::Lane;

/// Feed a lane's pending cars into its channel, in order, then close the
/// channel. Blocks only while the lane buffer is full.
///
/// The channel is closed on every exit path so the crossing side can never
/// wait on a lane that will not receive more cars.
pub fn run_arrival(lane: &Lane, pending: Vec<Car>) -> Result<usize, SimError> {
    let channel = lane.channel();
    let _close = channel.close_on_drop();
    let mut arrived = 0;
    for car in pending {
        channel.push(car)?;
        arrived += 1;
    }
    debug!("{} arrivals finished after {} cars", channel.lane(), arrived);
    Ok(arrived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::Direction;

    #[test]
    fn test_arrival_pushes_in_order_and_closes() {
        let lane = Lane::new(Direction::East, 4, 3).unwrap();
        let pending = (1..=3)
            .map(|id| Car::new(id, Direction::East, Direction::West))
            .collect();
        assert_eq!(run_arrival(&lane, pending).unwrap(), 3);
        assert!(lane.channel().is_closed());

        let mut ids = Vec::new();
        while let Some(car) = lane.channel().pop().unwrap() {
            ids.push(car.id());
        }
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_arrival_with_nothing_pending_closes_immediately() {
        let lane = Lane::new(Direction::South, 1, 0).unwrap();
        assert_eq!(run_arrival(&lane, Vec::new()).unwrap(), 0);
        assert!(lane.channel().pop().unwrap().is_none());
    }

    #[test]
    fn test_arrival_into_closed_lane_fails() {
        let lane = Lane::new(Direction::West, 1, 1).unwrap();
        lane.channel().close();
        let err = run_arrival(&lane, vec![Car::new(1, Direction::West, Direction::East)])
            .unwrap_err();
        assert!(matches!(err, SimError::ChannelClosed(Direction::West)));
    }
}
