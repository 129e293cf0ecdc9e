//! Service instance request and response bodies.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use dbbroker_core::serde_helpers::null_as_default;
use dbbroker_core::{OperationStatus, ParameterOverrides};

/// Query string of mutating instance calls.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AsyncQuery {
    #[serde(default)]
    pub accepts_incomplete: Option<String>,
}

impl AsyncQuery {
    /// Whether the platform accepts an asynchronous response.
    pub fn accepts_incomplete(&self) -> bool {
        self.accepts_incomplete.as_deref() == Some("true")
    }
}

/// Query string of the last-operation poll.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LastOperationQuery {
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub plan_id: Option<String>,
    /// Value of the `operation` field from the accepted response, echoed back.
    #[serde(default)]
    pub operation: Option<String>,
}

impl LastOperationQuery {
    pub fn is_deprovision(&self) -> bool {
        self.operation.as_deref() == Some(OperationKind::Deprovision.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvisionRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub service_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub plan_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: ProvisionParameters,
}

/// Optional provisioning parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProvisionParameters {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub datacenter: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub units: Option<i64>,
    #[serde(default)]
    pub cache_mode: Option<bool>,
}

impl From<ProvisionParameters> for ParameterOverrides {
    fn from(p: ProvisionParameters) -> Self {
        Self {
            account_id: p.account_id,
            datacenter: p.datacenter,
            version: p.version,
            units: p.units,
            cache_mode: p.cache_mode,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub service_id: String,
    #[serde(default)]
    pub plan_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: UpdateParameters,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateParameters {
    #[serde(default)]
    pub units: Option<i64>,
}

/// Lifecycle operation named in accepted responses and echoed by the poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Provision,
    Update,
    Deprovision,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Provision => "provision",
            Self::Update => "update",
            Self::Deprovision => "deprovision",
        }
    }
}

/// Body of provision and update responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

impl DashboardResponse {
    pub fn new(dashboard_url: impl Into<String>) -> Self {
        Self {
            dashboard_url: Some(dashboard_url.into()),
            operation: None,
        }
    }

    /// Body of an accepted (202) response for `kind`.
    pub fn accepted(kind: OperationKind) -> Self {
        Self {
            dashboard_url: None,
            operation: Some(kind.as_str().to_string()),
        }
    }

    #[must_use]
    pub fn with_operation(mut self, kind: OperationKind) -> Self {
        self.operation = Some(kind.as_str().to_string());
        self
    }
}

/// `{}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyBody {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchInstanceResponse {
    pub dashboard_url: String,
    pub parameters: FetchInstanceParameters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchInstanceParameters {
    pub id: String,
    pub name: String,
    pub account_id: String,
    #[serde(rename = "type")]
    pub database_type: String,
    pub notes: String,
    pub version: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    pub allocated_units: i64,
    pub used_units: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LastOperationState {
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "succeeded")]
    Succeeded,
    #[serde(rename = "failed")]
    Failed,
}

impl From<OperationStatus> for LastOperationState {
    fn from(status: OperationStatus) -> Self {
        match status {
            OperationStatus::Running | OperationStatus::Waiting => Self::InProgress,
            OperationStatus::Complete => Self::Succeeded,
            OperationStatus::Failed => Self::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastOperationResponse {
    pub state: LastOperationState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl LastOperationResponse {
    pub fn new(state: LastOperationState, description: impl Into<String>) -> Self {
        Self {
            state,
            description: Some(description.into()),
        }
    }

    pub fn succeeded() -> Self {
        Self {
            state: LastOperationState::Succeeded,
            description: None,
        }
    }
}
