use axum::response::{IntoResponse, Response};

use dbbroker_api::{BrokerError, BrokerResponse, DashboardResponse, EmptyBody, OperationKind};
use dbbroker_core::OperationStatus;

use super::{Reconciler, log_gateway_error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeprovisionOutcome {
    Completed,
    Accepted,
}

impl IntoResponse for DeprovisionOutcome {
    fn into_response(self) -> Response {
        match self {
            Self::Completed => BrokerResponse::ok(EmptyBody {}).into_response(),
            Self::Accepted => {
                BrokerResponse::accepted(DashboardResponse::accepted(OperationKind::Deprovision))
                    .into_response()
            }
        }
    }
}

impl Reconciler {
    /// Delete the instance `name`.
    ///
    /// An absent instance is reported as gone (410).
    pub async fn deprovision(&self, name: &str) -> Result<DeprovisionOutcome, BrokerError> {
        let instance = self
            .find_instance(name, || {
                BrokerError::internal("Could not look up service instance")
            })
            .await?
            .ok_or_else(|| BrokerError::instance_gone("The service instance does not exist"))?;

        let history = self
            .history(name, &instance.id, || {
                BrokerError::internal("Could not read service instance operations")
            })
            .await?;
        if history.is_in_progress() {
            tracing::info!(instance = %name, "deprovision rejected, an operation is in progress");
            return Err(BrokerError::concurrency(
                "The service instance is currently being updated",
            ));
        }

        let operation_id = self.gateway.delete_instance(&instance.id).await.map_err(|err| {
            log_gateway_error(name, "delete", &err);
            BrokerError::internal("Could not delete service instance")
        })?;

        match self.initial_status(name, operation_id.as_deref()).await {
            Some(OperationStatus::Complete) => {
                tracing::info!(instance = %name, "instance deleted");
                Ok(DeprovisionOutcome::Completed)
            }
            Some(OperationStatus::Failed) => {
                tracing::error!(instance = %name, "deprovisioning job failed");
                Err(BrokerError::deprovision_failure(
                    "The service instance deprovisioning failed",
                ))
            }
            _ => {
                tracing::info!(instance = %name, "deprovisioning started");
                Ok(DeprovisionOutcome::Accepted)
            }
        }
    }
}
