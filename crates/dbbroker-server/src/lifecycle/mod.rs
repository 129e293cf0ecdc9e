//! Lifecycle Reconciler.
//!
//! Each protocol call reads the remote snapshots it needs (instance, operation
//! history, scaling), derives the instance state from them and issues at most
//! one mutating call. Nothing is cached between requests: the provider is the
//! only source of truth, and concurrent mutations on the same instance are
//! arbitrated by its job queue.
//!
//! Mutating calls never wait for the provider job to finish. The job's initial
//! status decides between a synchronous and an accepted response; the platform
//! then polls [`Reconciler::last_operation`].

mod deprovision;
mod fetch;
mod last_operation;
mod provision;
mod update;

use std::sync::Arc;

use dbbroker_api::BrokerError;
use dbbroker_core::{
    CatalogResolver, DynGateway, GatewayError, OperationHistory, OperationStatus,
    ResolverDefaults, ServiceCatalog, ServiceInstance,
};

pub use deprovision::DeprovisionOutcome;
pub use provision::ProvisionOutcome;
pub use update::UpdateOutcome;

pub struct Reconciler {
    gateway: DynGateway,
    catalog: Arc<ServiceCatalog>,
    defaults: ResolverDefaults,
}

impl Reconciler {
    pub fn new(gateway: DynGateway, catalog: Arc<ServiceCatalog>, defaults: ResolverDefaults) -> Self {
        Self {
            gateway,
            catalog,
            defaults,
        }
    }

    pub fn resolver(&self) -> CatalogResolver<'_> {
        CatalogResolver::new(&self.catalog, &self.defaults)
    }

    pub fn gateway(&self) -> &DynGateway {
        &self.gateway
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    /// Looks up the instance backing `name`, mapping lookup failures with `on_error`.
    pub(crate) async fn find_instance(
        &self,
        name: &str,
        on_error: impl FnOnce() -> BrokerError,
    ) -> Result<Option<ServiceInstance>, BrokerError> {
        self.gateway
            .find_instance_by_name(name)
            .await
            .map_err(|err| {
                log_gateway_error(name, "instance lookup", &err);
                on_error()
            })
    }

    pub(crate) async fn history(
        &self,
        name: &str,
        instance_id: &str,
        on_error: impl FnOnce() -> BrokerError,
    ) -> Result<OperationHistory, BrokerError> {
        self.gateway
            .operation_history(instance_id)
            .await
            .map_err(|err| {
                log_gateway_error(name, "operation history", &err);
                on_error()
            })
    }

    /// Status of a freshly started provider job, read exactly once.
    ///
    /// `None` when the job id is unknown or the read fails; callers then
    /// answer asynchronously and leave the outcome to the poll.
    pub(crate) async fn initial_status(
        &self,
        name: &str,
        operation_id: Option<&str>,
    ) -> Option<OperationStatus> {
        let operation_id = operation_id.filter(|id| !id.is_empty())?;
        match self.gateway.get_operation(operation_id).await {
            Ok(operation) => {
                tracing::debug!(
                    instance = %name,
                    operation_id = %operation_id,
                    status = ?operation.status,
                    "initial operation status"
                );
                Some(operation.status)
            }
            Err(err) => {
                tracing::warn!(
                    instance = %name,
                    operation_id = %operation_id,
                    error = %err,
                    "could not read initial operation status"
                );
                None
            }
        }
    }
}

pub(crate) fn log_gateway_error(name: &str, call: &str, err: &GatewayError) {
    tracing::error!(instance = %name, call, error = %err, "provider call failed");
}
