use dbbroker_api::{BrokerError, LastOperationQuery, LastOperationResponse};

use super::Reconciler;

impl Reconciler {
    /// State of the most recently updated provider job of `name`.
    pub async fn last_operation(
        &self,
        name: &str,
        query: &LastOperationQuery,
    ) -> Result<LastOperationResponse, BrokerError> {
        let instance = self
            .find_instance(name, || {
                BrokerError::internal("Could not look up service instance")
            })
            .await?;

        let Some(instance) = instance else {
            // The instance vanishing is how a deprovisioning job completes.
            if query.is_deprovision() {
                tracing::info!(instance = %name, "instance gone, deprovisioning succeeded");
                return Ok(LastOperationResponse::succeeded());
            }
            return Err(BrokerError::instance_gone("The service instance does not exist"));
        };

        let history = self
            .history(name, &instance.id, || {
                BrokerError::internal("Could not read service instance operations")
            })
            .await?;

        Ok(match history.current() {
            None => LastOperationResponse::succeeded(),
            Some(operation) => {
                tracing::debug!(
                    instance = %name,
                    operation_id = %operation.id,
                    status = ?operation.status,
                    "last operation"
                );
                LastOperationResponse::new(operation.status.into(), operation.progress_description())
            }
        })
    }
}
