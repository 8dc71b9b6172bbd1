//! Intersection constants and tunable run parameters.
//!
//! The geometry (four lanes, four quadrants) is fixed at compile time. The
//! only tunable is the per-lane buffer capacity, carried in [`SimParams`] so
//! the driver can load it from JSON or override it from the command line.

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

pub const DIRECTION_COUNT: usize = 4;
pub const QUADRANT_COUNT: usize = 4;

/// Cars a lane can hold between arrival and crossing when nothing overrides it.
pub const DEFAULT_LANE_CAPACITY: usize = 10;

/// Tunable parameters for a simulation run.
#[derive(Resource, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Capacity `C` of every lane buffer. Must be at least 1.
    pub lane_capacity: usize,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            lane_capacity: DEFAULT_LANE_CAPACITY,
        }
    }
}

impl SimParams {
    pub fn with_capacity(lane_capacity: usize) -> Self {
        Self { lane_capacity }
    }

    /// Reject parameters no run can start with.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.lane_capacity < 1 {
            return Err(SimError::InvalidCapacity(self.lane_capacity));
        }
        Ok(())
    }

    pub fn from_json(text: &str) -> Result<Self, SimError> {
        let params: SimParams =
            serde_json::from_str(text).map_err(|e| SimError::Config(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    pub fn load(path: &Path) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_valid() {
        let params = SimParams::default();
        assert_eq!(params.lane_capacity, DEFAULT_LANE_CAPACITY);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = SimParams::with_capacity(0).validate().unwrap_err();
        assert!(matches!(err, SimError::InvalidCapacity(0)));
    }

    #[test]
    fn test_from_json_reads_capacity() {
        let params = SimParams::from_json(r#"{ "lane_capacity": 3 }"#).unwrap();
        assert_eq!(params.lane_capacity, 3);
    }

    #[test]
    fn test_from_json_defaults_missing_fields() {
        let params = SimParams::from_json("{}").unwrap();
        assert_eq!(params, SimParams::default());
    }

    #[test]
    fn test_from_json_rejects_zero_capacity() {
        let err = SimParams::from_json(r#"{ "lane_capacity": 0 }"#).unwrap_err();
        assert!(matches!(err, SimError::InvalidCapacity(0)));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = SimParams::from_json("not json").unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }
}
