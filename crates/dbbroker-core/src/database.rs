//! Database types offered by the provider and their release status.

use serde::{Deserialize, Serialize};

use crate::serde_helpers::null_as_default;

/// Release states under which a database type may be offered in the catalog.
const OFFERED_STATUSES: [&str; 2] = ["stable", "beta"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Database {
    #[serde(rename = "type")]
    pub database_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(rename = "_embedded", default, deserialize_with = "null_as_default")]
    pub embedded: DatabaseVersions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseVersions {
    #[serde(default, deserialize_with = "null_as_default")]
    pub versions: Vec<DatabaseVersion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseVersion {
    #[serde(default, deserialize_with = "null_as_default")]
    pub application: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub preferred: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,
}

impl Database {
    /// Whether this database type may be listed in the catalog.
    pub fn is_offered(&self) -> bool {
        OFFERED_STATUSES.contains(&self.status.as_str())
    }

    /// The version the provider marks as preferred, if any.
    pub fn preferred_version(&self) -> Option<&DatabaseVersion> {
        self.embedded.versions.iter().find(|v| v.preferred)
    }
}
