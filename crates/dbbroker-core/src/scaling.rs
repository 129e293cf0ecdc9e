use serde::{Deserialize, Serialize};

use crate::serde_helpers::null_as_default;

/// Current resource allocation of an instance.
///
/// Fetched fresh for every decision and never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scaling {
    #[serde(default, deserialize_with = "null_as_default")]
    pub allocated_units: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub used_units: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub starting_units: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub minimum_units: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub memory_per_unit_in_mb: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub storage_per_unit_in_mb: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unit_size_in_mb: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unit_type: String,
}

impl Scaling {
    /// Whether the instance already holds exactly `units` allocated units.
    pub fn has_units(&self, units: i64) -> bool {
        self.allocated_units == units
    }
}
