//! Crossing events and the sinks they are delivered to.
//!
//! A crossing thread calls [`CrossingReporter::report`] while it still holds
//! the car's quadrant locks, so for any two crossings that share a quadrant
//! the report order is the order they actually held it.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use bevy::log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::car::Car;
use crate::direction::Direction;
use crate::path::QuadrantPath;

/// One completed crossing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossingEvent {
    pub car_id: u32,
    pub entry: Direction,
    pub exit: Direction,
    /// Quadrants occupied, in traversal order.
    pub quadrants: QuadrantPath,
    /// Position of this car in its lane's crossing order, starting at 1.
    pub lane_sequence: usize,
}

impl CrossingEvent {
    pub fn new(car: &Car, quadrants: QuadrantPath, lane_sequence: usize) -> Self {
        Self {
            car_id: car.id(),
            entry: car.entry(),
            exit: car.exit(),
            quadrants,
            lane_sequence,
        }
    }
}

/// Receives crossing events from every crossing thread concurrently.
pub trait CrossingReporter: Send + Sync {
    fn report(&self, event: &CrossingEvent);
}

impl<T: CrossingReporter + ?Sized> CrossingReporter for std::sync::Arc<T> {
    fn report(&self, event: &CrossingEvent) {
        (**self).report(event);
    }
}

/// Deliver each event to both reporters.
impl<A: CrossingReporter, B: CrossingReporter> CrossingReporter for (A, B) {
    fn report(&self, event: &CrossingEvent) {
        self.0.report(event);
        self.1.report(event);
    }
}

/// Logs every crossing at `info`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl CrossingReporter for LogReporter {
    fn report(&self, event: &CrossingEvent) {
        info!(
            "car {} crossed {} -> {} via {:?}",
            event.car_id,
            event.entry,
            event.exit,
            event.quadrants.traversal()
        );
    }
}

/// Writes `<in> <out> <id>` per crossing, directions as integers.
#[derive(Debug)]
pub struct LineReporter<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> LineReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> CrossingReporter for LineReporter<W> {
    fn report(&self, event: &CrossingEvent) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(
            out,
            "{} {} {}",
            event.entry.index(),
            event.exit.index(),
            event.car_id
        ) {
            warn!("failed to write crossing of car {}: {}", event.car_id, e);
        }
    }
}

/// Keeps every event in memory, in report order.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<CrossingEvent>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CrossingEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn into_events(self) -> Vec<CrossingEvent> {
        self.events.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CrossingReporter for CollectingReporter {
    fn report(&self, event: &CrossingEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::resolve_path;

    fn event(id: u32, entry: Direction, exit: Direction) -> CrossingEvent {
        let car = Car::new(id, entry, exit);
        CrossingEvent::new(&car, resolve_path(entry, exit), 1)
    }

    #[test]
    fn test_line_reporter_format() {
        let reporter = LineReporter::new(Vec::new());
        reporter.report(&event(12, Direction::North, Direction::South));
        reporter.report(&event(3, Direction::West, Direction::East));
        let text = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(text, "0 2 12\n3 1 3\n");
    }

    #[test]
    fn test_collecting_reporter_keeps_order() {
        let reporter = CollectingReporter::new();
        reporter.report(&event(1, Direction::East, Direction::West));
        reporter.report(&event(2, Direction::East, Direction::South));
        let ids: Vec<u32> = reporter.events().iter().map(|e| e.car_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(reporter.into_events().len(), 2);
    }

    #[test]
    fn test_pair_reports_to_both() {
        let pair = (CollectingReporter::new(), LineReporter::new(Vec::new()));
        pair.report(&event(8, Direction::South, Direction::North));
        assert_eq!(pair.0.events().len(), 1);
        assert_eq!(pair.1.into_inner(), b"2 0 8\n".to_vec());
    }

    #[test]
    fn test_event_serializes_quadrants_as_list() {
        let json = serde_json::to_value(event(4, Direction::North, Direction::East)).unwrap();
        assert_eq!(json["car_id"], 4);
        assert_eq!(json["entry"], "North");
        assert_eq!(json["quadrants"], serde_json::json!(["Q1", "Q2", "Q3"]));
    }
}
