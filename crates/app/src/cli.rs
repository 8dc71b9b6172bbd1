//! Command-line arguments for the `crossroads` driver.

use std::path::PathBuf;

use clap::Parser;

use intersection::{SimError, SimParams};

/// crossroads - four-way intersection simulation
///
/// Prints one `<in> <out> <id>` line per crossing (0=North 1=East 2=South
/// 3=West), or a JSON summary with --json. Logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "crossroads")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Schedule file, one `<id> <in> <out>` car per line
    #[arg(required_unless_present = "random", conflicts_with = "random")]
    pub schedule: Option<PathBuf>,

    /// Generate this many random cars instead of reading a schedule file
    #[arg(long, value_name = "COUNT")]
    pub random: Option<u32>,

    /// Seed for --random (default 0)
    #[arg(long, requires = "random")]
    pub seed: Option<u64>,

    /// Cars each lane buffer holds; overrides --config
    #[arg(long, value_name = "C", env = "CROSSROADS_CAPACITY")]
    pub capacity: Option<usize>,

    /// JSON run parameters, e.g. {"lane_capacity": 4}
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print a JSON summary instead of one line per crossing
    #[arg(long)]
    pub json: bool,

    /// Only log warnings and errors
    #[arg(long)]
    pub quiet: bool,
}

/// Where the cars come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Random { count: u32, seed: u64 },
}

impl Cli {
    pub fn source(&self) -> Source {
        match (&self.schedule, self.random) {
            (Some(path), _) => Source::File(path.clone()),
            (None, count) => Source::Random {
                count: count.unwrap_or(0),
                seed: self.seed.unwrap_or(0),
            },
        }
    }

    /// Resolve run parameters. The config file is the base; `--capacity`
    /// (or `CROSSROADS_CAPACITY`) replaces its lane capacity.
    pub fn params(&self) -> Result<SimParams, SimError> {
        let mut params = match &self.config {
            Some(path) => SimParams::load(path)?,
            None => SimParams::default(),
        };
        if let Some(capacity) = self.capacity {
            params.lane_capacity = capacity;
        }
        params.validate()?;
        Ok(params)
    }
}
