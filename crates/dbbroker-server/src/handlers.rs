use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use serde::de::DeserializeOwned;

use dbbroker_api::{
    AsyncQuery, BindingResponse, BrokerError, BrokerResponse, EmptyBody, FetchInstanceResponse,
    HealthResponse, LastOperationQuery, LastOperationResponse, ProvisionRequest, UpdateRequest,
};
use dbbroker_core::{ServiceCatalog, filter_catalog};

use crate::lifecycle::{DeprovisionOutcome, ProvisionOutcome, UpdateOutcome};
use crate::server::AppState;

type BrokerResult<T> = Result<BrokerResponse<T>, BrokerError>;

pub async fn root() -> BrokerResponse<HealthResponse> {
    BrokerResponse::ok(HealthResponse::ok())
}

pub async fn health() -> BrokerResponse<HealthResponse> {
    BrokerResponse::ok(HealthResponse::ok())
}

/// Static catalog, reduced to the database types the provider currently offers.
pub async fn catalog(State(state): State<AppState>) -> BrokerResponse<ServiceCatalog> {
    let reconciler = &state.reconciler;
    let catalog = match reconciler.gateway().list_databases().await {
        Ok(databases) => filter_catalog(reconciler.catalog(), &databases),
        Err(err) => {
            tracing::warn!(error = %err, "could not list provider databases, serving the full catalog");
            reconciler.catalog().clone()
        }
    };
    BrokerResponse::ok(catalog)
}

pub async fn provision_instance(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
    Query(query): Query<AsyncQuery>,
    body: Bytes,
) -> Result<ProvisionOutcome, BrokerError> {
    require_async(&query, "Service instance provisioning requires an asynchronous operation")?;
    let request: ProvisionRequest = parse_body(&body, "provisioning")?;
    state.reconciler.provision(&instance_id, request).await
}

pub async fn fetch_instance(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
) -> BrokerResult<FetchInstanceResponse> {
    let response = state.reconciler.fetch(&instance_id).await?;
    Ok(BrokerResponse::ok(response))
}

pub async fn update_instance(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
    Query(query): Query<AsyncQuery>,
    body: Bytes,
) -> Result<UpdateOutcome, BrokerError> {
    require_async(&query, "Service instance update requires an asynchronous operation")?;
    let request: UpdateRequest = parse_body(&body, "update")?;
    state.reconciler.update(&instance_id, request).await
}

pub async fn deprovision_instance(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
    Query(query): Query<AsyncQuery>,
) -> Result<DeprovisionOutcome, BrokerError> {
    require_async(&query, "Service instance deprovisioning requires an asynchronous operation")?;
    state.reconciler.deprovision(&instance_id).await
}

pub async fn last_operation(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
    Query(query): Query<LastOperationQuery>,
) -> BrokerResult<LastOperationResponse> {
    let response = state.reconciler.last_operation(&instance_id, &query).await?;
    Ok(BrokerResponse::ok(response))
}

pub async fn fetch_binding(
    State(state): State<AppState>,
    Path((instance_id, binding_id)): Path<(String, String)>,
) -> BrokerResult<BindingResponse> {
    let response = state
        .reconciler
        .fetch_binding(&instance_id, &binding_id)
        .await?;
    Ok(BrokerResponse::ok(response))
}

pub async fn unbind(
    State(state): State<AppState>,
    Path((instance_id, binding_id)): Path<(String, String)>,
) -> BrokerResult<EmptyBody> {
    let response = state.reconciler.unbind(&instance_id, &binding_id).await?;
    Ok(BrokerResponse::ok(response))
}

fn require_async(query: &AsyncQuery, description: &str) -> Result<(), BrokerError> {
    if query.accepts_incomplete() {
        Ok(())
    } else {
        Err(BrokerError::async_required(description))
    }
}

/// Decode a JSON request body. An empty body counts as `{}`.
fn parse_body<T: DeserializeOwned>(body: &[u8], kind: &str) -> Result<T, BrokerError> {
    let raw: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        body
    };
    serde_json::from_slice(raw).map_err(|err| {
        tracing::debug!(error = %err, "rejected malformed {kind} request body");
        BrokerError::malformed_request(format!("Could not unmarshal {kind} request"))
    })
}
