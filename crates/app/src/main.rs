//! `crossroads`: runs one intersection simulation headlessly and exits.
//!
//! Crossings are printed to stdout as `<in> <out> <id>` lines, or replaced
//! by a JSON summary with `--json`. Logs go to stderr.

mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use clap::Parser;

use intersection::schedule::Schedule;
use intersection::{
    CrossingSink, IntersectionPlugin, LineReporter, LogReporter, PendingSchedule, SimError,
    SimulationResult,
};

use cli::{Cli, Source};

fn main() -> ExitCode {
    // Usage errors and --help exit here, before logging is set up.
    let args = Cli::parse();

    let mut app = App::new();
    app.add_plugins(MinimalPlugins).add_plugins(LogPlugin {
        level: if args.quiet { Level::WARN } else { Level::INFO },
        ..default()
    });

    if let Err(e) = prepare(&mut app, &args) {
        error!("{}", e);
        return exit_code(&e);
    }

    // Startup systems run on the first update, which performs the whole run.
    app.update();

    match app.world_mut().remove_resource::<SimulationResult>() {
        Some(SimulationResult(Ok(outcome))) => {
            if args.json {
                match outcome.to_json() {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        error!("{}", e);
                        return ExitCode::FAILURE;
                    }
                }
            }
            ExitCode::SUCCESS
        }
        Some(SimulationResult(Err(e))) => exit_code(&e),
        None => {
            error!("simulation did not run");
            ExitCode::FAILURE
        }
    }
}

/// Resolve parameters and the schedule, then install the plugin and its
/// resources.
fn prepare(app: &mut App, args: &Cli) -> Result<(), SimError> {
    let params = args.params()?;

    let schedule = match args.source() {
        Source::File(path) => Schedule::load(&path)?,
        Source::Random { count, seed } => {
            info!("Generating {} random cars (seed {})", count, seed);
            Schedule::random(count, seed)
        }
    };

    let sink = if args.json {
        CrossingSink(Arc::new(LogReporter))
    } else {
        CrossingSink(Arc::new(LineReporter::new(std::io::stdout())))
    };

    app.add_plugins(IntersectionPlugin)
        .insert_resource(params)
        .insert_resource(PendingSchedule(Some(schedule)))
        .insert_resource(sink);
    Ok(())
}

/// 2 for anything rejected before a thread started, 1 for a failed run.
fn exit_code(error: &SimError) -> ExitCode {
    if error.is_setup_error() {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}
