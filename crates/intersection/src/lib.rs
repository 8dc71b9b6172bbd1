use std::sync::Arc;

use bevy::prelude::*;

pub mod arrival;
pub mod car;
pub mod config;
pub mod crossing;
pub mod direction;
pub mod error;
pub mod intersection;
pub mod lane;
pub mod lane_channel;
pub mod path;
pub mod quadrant;
pub mod report;
pub mod schedule;
pub mod simulation;

pub use car::Car;
pub use config::SimParams;
pub use direction::Direction;
pub use error::{SimError, Violation};
pub use intersection::Intersection;
pub use path::{resolve_path, QuadrantPath, TurnKind};
pub use quadrant::{Quadrant, QuadrantSet};
pub use report::{CollectingReporter, CrossingEvent, CrossingReporter, LineReporter, LogReporter};
pub use simulation::{LaneOutcome, Simulation, SimulationOutcome};

// ---------------------------------------------------------------------------
// Engine integration
// ---------------------------------------------------------------------------

/// Cars queued for the next run. Taken (left `None`) when the run starts.
#[derive(Resource, Default)]
pub struct PendingSchedule(pub Option<schedule::Schedule>);

/// Where crossing events go. Defaults to [`LogReporter`].
#[derive(Resource, Clone)]
pub struct CrossingSink(pub Arc<dyn CrossingReporter>);

impl Default for CrossingSink {
    fn default() -> Self {
        Self(Arc::new(LogReporter))
    }
}

/// Result of the last run.
#[derive(Resource)]
pub struct SimulationResult(pub Result<SimulationOutcome, SimError>);

/// Runs the pending schedule once at startup and stores a
/// [`SimulationResult`]. Insert [`SimParams`], [`PendingSchedule`] and
/// optionally [`CrossingSink`] before the first update.
pub struct IntersectionPlugin;

impl Plugin for IntersectionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimParams>()
            .init_resource::<PendingSchedule>()
            .init_resource::<CrossingSink>()
            .add_systems(Startup, run_pending_schedule);
    }
}

fn run_pending_schedule(
    mut commands: Commands,
    params: Res<SimParams>,
    sink: Res<CrossingSink>,
    mut pending: ResMut<PendingSchedule>,
) {
    let Some(schedule) = pending.0.take() else {
        warn!("IntersectionPlugin: no pending schedule, nothing to run");
        return;
    };
    let result =
        Simulation::from_schedule(&params, schedule).and_then(|sim| sim.run(sink.0.as_ref()));
    if let Err(e) = &result {
        error!("Simulation failed: {}", e);
    }
    commands.insert_resource(SimulationResult(result));
}
