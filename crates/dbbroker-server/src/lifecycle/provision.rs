use axum::response::{IntoResponse, Response};

use dbbroker_api::{BrokerError, BrokerResponse, DashboardResponse, OperationKind, ProvisionRequest};
use dbbroker_core::{
    DeploymentTarget, InstancePhase, NewInstance, OperationStatus, ParameterOverrides,
    ServiceInstance, operation::PROVISION_OPERATION,
};

use super::{Reconciler, log_gateway_error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// The provider finished the deployment within the create call (201).
    Created { dashboard_url: String },
    /// An identical instance already exists (200).
    Exists { dashboard_url: String },
    /// Provisioning continues in the background (202).
    Accepted { dashboard_url: String },
}

impl IntoResponse for ProvisionOutcome {
    fn into_response(self) -> Response {
        match self {
            Self::Created { dashboard_url } => {
                BrokerResponse::created(DashboardResponse::new(dashboard_url)).into_response()
            }
            Self::Exists { dashboard_url } => {
                BrokerResponse::ok(DashboardResponse::new(dashboard_url)).into_response()
            }
            Self::Accepted { dashboard_url } => BrokerResponse::accepted(
                DashboardResponse::new(dashboard_url).with_operation(OperationKind::Provision),
            )
            .into_response(),
        }
    }
}

impl Reconciler {
    /// Provision the instance `name` for the requested plan.
    ///
    /// Repeating the call with the same parameters converges on the same
    /// answer without creating a second instance. Two concurrent first calls
    /// for the same new name can both see the instance as absent and both
    /// issue a create; the provider's duplicate-name check decides which one
    /// wins.
    pub async fn provision(
        &self,
        name: &str,
        request: ProvisionRequest,
    ) -> Result<ProvisionOutcome, BrokerError> {
        let overrides = ParameterOverrides::from(request.parameters);
        let target = self
            .resolver()
            .resolve(&request.service_id, &request.plan_id, &overrides)?;
        let account_id = self.resolve_account(&overrides).await?;

        let existing = self
            .find_instance(name, || {
                BrokerError::internal("Could not look up service instances")
            })
            .await?;

        match existing {
            Some(instance) => self.reconcile_existing(name, instance, &target).await,
            None => {
                let params = NewInstance {
                    name: name.to_string(),
                    account_id,
                    datacenter: target.datacenter,
                    database_type: target.database_type,
                    version: target.version,
                    units: target.units,
                    cache_mode: target.cache_mode,
                    notes: format!("{}-{}", request.service_id, request.plan_id),
                };
                self.create(name, &params).await
            }
        }
    }

    /// Account from the request, the configured default or the first account
    /// the API token can see.
    async fn resolve_account(&self, overrides: &ParameterOverrides) -> Result<String, BrokerError> {
        if let Some(account_id) = self.resolver().preset_account_id(overrides) {
            return Ok(account_id);
        }
        let accounts = self.gateway.list_accounts().await.map_err(|err| {
            tracing::error!(error = %err, "could not list provider accounts");
            BrokerError::conflict("Could not read provider accounts")
        })?;
        accounts
            .into_iter()
            .map(|account| account.id)
            .find(|id| !id.is_empty())
            .ok_or_else(|| {
                BrokerError::missing_parameters(
                    "AccountID is missing for service instance provisioning",
                )
            })
    }

    async fn reconcile_existing(
        &self,
        name: &str,
        instance: ServiceInstance,
        target: &DeploymentTarget,
    ) -> Result<ProvisionOutcome, BrokerError> {
        let conflict = || BrokerError::conflict("Could not create service instance");
        let history = self.history(name, &instance.id, conflict).await?;
        let dashboard_url = instance.dashboard_url();

        match history.phase() {
            InstancePhase::InProgress { kind } if kind == PROVISION_OPERATION => {
                tracing::info!(instance = %name, "provisioning already in progress");
                Ok(ProvisionOutcome::Accepted { dashboard_url })
            }
            InstancePhase::Settled => {
                let scaling = self.gateway.get_scaling(&instance.id).await.map_err(|err| {
                    log_gateway_error(name, "scaling", &err);
                    conflict()
                })?;
                if scaling.has_units(target.units) {
                    tracing::info!(instance = %name, units = target.units, "instance already provisioned");
                    Ok(ProvisionOutcome::Exists { dashboard_url })
                } else {
                    tracing::error!(
                        instance = %name,
                        allocated = scaling.allocated_units,
                        requested = target.units,
                        "existing instance differs from the requested plan"
                    );
                    Err(conflict())
                }
            }
            phase => {
                tracing::error!(instance = %name, ?phase, "instance exists in a conflicting state");
                Err(conflict())
            }
        }
    }

    async fn create(&self, name: &str, params: &NewInstance) -> Result<ProvisionOutcome, BrokerError> {
        let created = self.gateway.create_instance(params).await.map_err(|err| {
            log_gateway_error(name, "create", &err);
            BrokerError::internal("Could not provision service instance")
        })?;
        let dashboard_url = created.instance.dashboard_url();
        let operation_id = created
            .operation_id
            .as_deref()
            .or(created.instance.provision_recipe_id.as_deref());

        match self.initial_status(name, operation_id).await {
            Some(OperationStatus::Complete) => {
                tracing::info!(instance = %name, "instance provisioned");
                Ok(ProvisionOutcome::Created { dashboard_url })
            }
            Some(OperationStatus::Failed) => {
                tracing::error!(instance = %name, "provisioning job failed");
                Err(BrokerError::provision_failure(
                    "The service instance provisioning failed",
                ))
            }
            _ => {
                tracing::info!(instance = %name, units = params.units, "provisioning started");
                Ok(ProvisionOutcome::Accepted { dashboard_url })
            }
        }
    }
}
