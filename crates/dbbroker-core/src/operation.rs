//! Provider-side operations ("recipes") and the per-instance operation history.
//!
//! Every mutating call against the provider is accepted as an asynchronous
//! job. The provider keeps a list of those jobs per instance, and only the
//! most recently *updated* one describes what is happening right now: a
//! rescale can be created after a provisioning job and still finish before
//! the older job stops reporting progress.
//!
//! - [`OperationStatus`] - the four job states and the single in-progress predicate
//! - [`Operation`] - one job record as returned by the provider
//! - [`OperationHistory`] - the history ordered by `updated_at`, newest first
//! - [`InstancePhase`] - the lifecycle phase derived from the current job

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::serde_helpers::null_as_default;

/// Name the provider gives to the job that creates an instance.
pub const PROVISION_OPERATION: &str = "Provision";

/// Status of a provider-side operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Running,
    Waiting,
    Complete,
    Failed,
}

impl OperationStatus {
    /// Whether the operation is still being worked on by the provider.
    ///
    /// This is the only place that decides what "in progress" means; every
    /// lifecycle path goes through it.
    #[inline]
    pub fn is_in_progress(self) -> bool {
        matches!(self, Self::Running | Self::Waiting)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Waiting => "waiting",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single provider-side job record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: String,
    /// Operation kind, e.g. `Provision`, `Deprovision` or a scaling run.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub template: String,
    pub status: OperationStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status_detail: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub account_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub deployment_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub operations_complete: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub operations_total: i64,
}

impl Operation {
    /// Whether this job is the one that creates the instance.
    pub fn is_provision(&self) -> bool {
        self.name == PROVISION_OPERATION
    }

    pub fn is_in_progress(&self) -> bool {
        self.status.is_in_progress()
    }

    /// Short human-readable progress line, e.g. `Provision running (3/7)`.
    pub fn progress_description(&self) -> String {
        let name = if self.name.is_empty() {
            "operation"
        } else {
            self.name.as_str()
        };
        if self.operations_total > 0 {
            format!(
                "{} {} ({}/{})",
                name, self.status, self.operations_complete, self.operations_total
            )
        } else {
            format!("{} {}", name, self.status)
        }
    }
}

/// Lifecycle phase of an existing instance, derived from its operation history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstancePhase {
    /// The current operation is running or waiting; `kind` is its name.
    InProgress { kind: String },
    /// The current operation completed.
    Settled,
    /// The current operation failed.
    Failed,
    /// The provider has no operation on record for the instance.
    Unrecorded,
}

/// Operation history of one instance, ordered by `updated_at` descending.
///
/// Ties (and records without `updated_at`, which sort last) are ordered by
/// `id` so that the same input always yields the same `current()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationHistory {
    operations: Vec<Operation>,
}

impl OperationHistory {
    pub fn new(mut operations: Vec<Operation>) -> Self {
        operations.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Self { operations }
    }

    /// The most recently updated operation, if any.
    pub fn current(&self) -> Option<&Operation> {
        self.operations.first()
    }

    pub fn is_in_progress(&self) -> bool {
        self.current().is_some_and(Operation::is_in_progress)
    }

    pub fn phase(&self) -> InstancePhase {
        match self.current() {
            None => InstancePhase::Unrecorded,
            Some(op) if op.status.is_in_progress() => InstancePhase::InProgress {
                kind: op.name.clone(),
            },
            Some(op) if op.status == OperationStatus::Complete => InstancePhase::Settled,
            Some(_) => InstancePhase::Failed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl From<Vec<Operation>> for OperationHistory {
    fn from(operations: Vec<Operation>) -> Self {
        Self::new(operations)
    }
}
