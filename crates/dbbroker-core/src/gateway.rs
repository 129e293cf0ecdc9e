//! Remote Gateway abstraction.
//!
//! The lifecycle logic talks to the database provider exclusively through
//! [`RemoteGateway`]. The HTTP implementation lives in `dbbroker-gateway`;
//! tests substitute in-memory fakes.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::account::Account;
use crate::database::Database;
use crate::instance::{NewInstance, ServiceInstance};
use crate::operation::{Operation, OperationHistory};
use crate::scaling::Scaling;

/// Shared handle to a gateway implementation.
pub type DynGateway = Arc<dyn RemoteGateway>;

/// Result of a create call: the new instance and the id of the provider job
/// that is building it.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedInstance {
    pub instance: ServiceInstance,
    pub operation_id: Option<String>,
}

/// Operations the broker needs from the database provider.
///
/// Every call is a single remote round trip (retries aside). Mutating calls
/// return the id of the provider job they started, which the caller inspects
/// once to decide between a synchronous and an asynchronous response.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Lists all instances visible to the configured API token.
    async fn list_instances(&self) -> Result<Vec<ServiceInstance>, GatewayError>;

    /// Fetches an instance by its provider id.
    ///
    /// # Errors
    ///
    /// Returns a `GatewayError` with [`GatewayError::is_not_found`] set if the
    /// instance does not exist.
    async fn get_instance(&self, instance_id: &str) -> Result<ServiceInstance, GatewayError>;

    /// Creates a new instance.
    async fn create_instance(&self, params: &NewInstance) -> Result<CreatedInstance, GatewayError>;

    /// Deletes an instance and returns the id of the deprovisioning job.
    async fn delete_instance(&self, instance_id: &str) -> Result<Option<String>, GatewayError>;

    /// Fetches a single provider job.
    async fn get_operation(&self, operation_id: &str) -> Result<Operation, GatewayError>;

    /// Lists all jobs recorded for an instance, in provider order.
    async fn list_operations(&self, instance_id: &str) -> Result<Vec<Operation>, GatewayError>;

    /// Fetches the current resource allocation of an instance.
    async fn get_scaling(&self, instance_id: &str) -> Result<Scaling, GatewayError>;

    /// Requests a new unit count and returns the id of the scaling job.
    async fn set_scaling(&self, instance_id: &str, units: i64)
    -> Result<Option<String>, GatewayError>;

    /// Lists the accounts the API token has access to.
    async fn list_accounts(&self) -> Result<Vec<Account>, GatewayError>;

    /// Lists the database types the provider offers.
    async fn list_databases(&self) -> Result<Vec<Database>, GatewayError>;

    /// Looks up an instance by its unique name and fetches its full record.
    ///
    /// Returns `None` if no living instance carries the name, including the
    /// case where it disappears between the listing and the fetch.
    async fn find_instance_by_name(
        &self,
        name: &str,
    ) -> Result<Option<ServiceInstance>, GatewayError> {
        let instances = self.list_instances().await?;
        let Some(listed) = instances.into_iter().find(|instance| instance.name == name) else {
            return Ok(None);
        };
        match self.get_instance(&listed.id).await {
            Ok(instance) => Ok(Some(instance)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Fetches the job history of an instance, newest update first.
    async fn operation_history(&self, instance_id: &str) -> Result<OperationHistory, GatewayError> {
        Ok(OperationHistory::new(self.list_operations(instance_id).await?))
    }
}

/// Errors returned by a [`RemoteGateway`].
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Provider responded with status {status}: {body}")]
    Status { status: u16, body: ProviderErrorBody },

    #[error("Could not decode provider response: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Build a status error from a raw response body.
    pub fn status(status: u16, raw_body: &str) -> Self {
        Self::Status {
            status,
            body: ProviderErrorBody::decode(raw_body),
        }
    }

    /// Whether the provider reported the addressed resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }

    /// HTTP status reported by the provider, if the call got that far.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Error body returned by the provider.
///
/// The provider sends either `{"errors": "message"}` or
/// `{"errors": {"field": ["message", ...]}}`. Anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderErrorBody {
    Single(String),
    Multi(BTreeMap<String, Vec<String>>),
    Unparseable(String),
}

impl ProviderErrorBody {
    /// Decode a raw body, trying the map shape first, then the string shape.
    pub fn decode(raw: &str) -> Self {
        #[derive(Deserialize)]
        struct MultiErrors {
            errors: BTreeMap<String, Vec<String>>,
        }
        #[derive(Deserialize)]
        struct SingleError {
            errors: String,
        }

        if let Ok(multi) = serde_json::from_str::<MultiErrors>(raw) {
            return Self::Multi(multi.errors);
        }
        if let Ok(single) = serde_json::from_str::<SingleError>(raw) {
            return Self::Single(single.errors);
        }
        Self::Unparseable(raw.to_string())
    }
}

impl fmt::Display for ProviderErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(message) => f.write_str(message),
            Self::Multi(errors) => {
                let joined = errors
                    .iter()
                    .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
                    .collect::<Vec<_>>()
                    .join(", ");
                f.write_str(&joined)
            }
            Self::Unparseable(raw) => write!(f, "could not parse API response: {raw}"),
        }
    }
}
