use axum::http::StatusCode;

use dbbroker_api::{BrokerError, FetchInstanceParameters, FetchInstanceResponse};
use dbbroker_core::InstancePhase;
use dbbroker_core::operation::PROVISION_OPERATION;

use super::{Reconciler, log_gateway_error};

impl Reconciler {
    /// Current parameters of the instance `name`.
    pub async fn fetch(&self, name: &str) -> Result<FetchInstanceResponse, BrokerError> {
        let instance = self
            .find_instance(name, || {
                BrokerError::internal("Could not look up service instance")
            })
            .await?
            .ok_or_else(|| BrokerError::missing_instance("The service instance does not exist"))?;

        let history = self
            .history(name, &instance.id, || {
                BrokerError::missing_recipes("Could not read service instance operations")
            })
            .await?;
        if let InstancePhase::InProgress { kind } = history.phase() {
            return Err(if kind == PROVISION_OPERATION {
                BrokerError::concurrency_with_status(
                    "The service instance provisioning is still in progress",
                    StatusCode::NOT_FOUND,
                )
            } else {
                BrokerError::concurrency("The service instance is being updated")
            });
        }

        let scaling = self.gateway.get_scaling(&instance.id).await.map_err(|err| {
            log_gateway_error(name, "scaling", &err);
            BrokerError::missing_scaling("Could not read service instance scaling")
        })?;

        Ok(FetchInstanceResponse {
            dashboard_url: instance.dashboard_url(),
            parameters: FetchInstanceParameters {
                id: instance.id,
                name: instance.name,
                account_id: instance.account_id,
                database_type: instance.database_type,
                notes: instance.notes,
                version: instance.version,
                created_at: instance.created_at,
                allocated_units: scaling.allocated_units,
                used_units: scaling.used_units,
            },
        })
    }
}
