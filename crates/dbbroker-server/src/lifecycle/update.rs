use axum::response::{IntoResponse, Response};

use dbbroker_api::{
    BrokerError, BrokerResponse, DashboardResponse, EmptyBody, OperationKind, UpdateRequest,
};
use dbbroker_core::OperationStatus;

use super::{Reconciler, log_gateway_error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The instance already has the requested units.
    Unchanged,
    /// The rescale finished within the call.
    Completed,
    Accepted { dashboard_url: String },
}

impl IntoResponse for UpdateOutcome {
    fn into_response(self) -> Response {
        match self {
            Self::Unchanged | Self::Completed => BrokerResponse::ok(EmptyBody {}).into_response(),
            Self::Accepted { dashboard_url } => BrokerResponse::accepted(
                DashboardResponse::new(dashboard_url).with_operation(OperationKind::Update),
            )
            .into_response(),
        }
    }
}

impl Reconciler {
    /// Rescale the instance `name` to the units of the request.
    pub async fn update(
        &self,
        name: &str,
        request: UpdateRequest,
    ) -> Result<UpdateOutcome, BrokerError> {
        let units = self.resolver().resolve_units(
            &request.service_id,
            request.plan_id.as_deref(),
            request.parameters.units,
        )?;

        let instance = self
            .find_instance(name, || {
                BrokerError::conflict("Could not look up service instance")
            })
            .await?
            .ok_or_else(|| BrokerError::instance_not_found("The service instance does not exist"))?;

        // A settled no-op must not be blocked by the job history.
        let scaling = self.gateway.get_scaling(&instance.id).await.map_err(|err| {
            log_gateway_error(name, "scaling", &err);
            BrokerError::conflict("Could not read service instance scaling")
        })?;
        if scaling.has_units(units) {
            tracing::info!(instance = %name, units, "instance already has the requested units");
            return Ok(UpdateOutcome::Unchanged);
        }

        let history = self
            .history(name, &instance.id, || {
                BrokerError::conflict("Could not read service instance operations")
            })
            .await?;
        if history.is_in_progress() {
            tracing::info!(instance = %name, "update rejected, an operation is in progress");
            return Err(BrokerError::concurrency(
                "The service instance is currently being updated",
            ));
        }

        let operation_id = self
            .gateway
            .set_scaling(&instance.id, units)
            .await
            .map_err(|err| {
                log_gateway_error(name, "set scaling", &err);
                BrokerError::conflict("Could not update service instance")
            })?;

        match self.initial_status(name, operation_id.as_deref()).await {
            Some(OperationStatus::Complete) => {
                tracing::info!(instance = %name, units, "instance rescaled");
                Ok(UpdateOutcome::Completed)
            }
            Some(OperationStatus::Failed) => {
                tracing::error!(instance = %name, units, "rescale job failed");
                Err(BrokerError::update_failure(
                    "The service instance update failed",
                ))
            }
            _ => {
                tracing::info!(
                    instance = %name,
                    from = scaling.allocated_units,
                    to = units,
                    "rescale started"
                );
                Ok(UpdateOutcome::Accepted {
                    dashboard_url: instance.dashboard_url(),
                })
            }
        }
    }
}
