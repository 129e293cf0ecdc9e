//! Open Service Broker wire types.
//!
//! - [`BrokerError`] - protocol errors with their `{error, description}` body
//! - [`BrokerResponse`] - JSON success responses carrying the broker headers
//! - request and response bodies for instances, bindings and health

pub mod binding;
pub mod error;
pub mod instance;
pub mod response;

pub use binding::{BindingCredentials, BindingEndpoint, BindingParameters, BindingResponse};
pub use error::{AUTH_REALM, BrokerError, ErrorBody};
pub use instance::{
    AsyncQuery, DashboardResponse, EmptyBody, FetchInstanceParameters, FetchInstanceResponse,
    LastOperationQuery, LastOperationResponse, LastOperationState, OperationKind,
    ProvisionParameters, ProvisionRequest, UpdateParameters, UpdateRequest,
};
pub use response::{BROKER_HEADER, BROKER_HEADER_VALUE, BrokerResponse, HealthResponse};
