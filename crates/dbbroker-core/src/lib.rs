pub mod account;
pub mod catalog;
pub mod database;
pub mod error;
pub mod gateway;
pub mod instance;
pub mod operation;
pub mod resolver;
pub mod scaling;
pub mod serde_helpers;

pub use account::Account;
pub use catalog::{Service, ServiceCatalog, ServicePlan, filter_catalog};
pub use database::{Database, DatabaseVersion};
pub use error::{CoreError, Result};
pub use gateway::{CreatedInstance, DynGateway, GatewayError, ProviderErrorBody, RemoteGateway};
pub use instance::{ConnectionStrings, NewInstance, ServiceInstance};
pub use operation::{InstancePhase, Operation, OperationHistory, OperationStatus};
pub use resolver::{CatalogResolver, DeploymentTarget, ParameterOverrides, ResolverDefaults};
pub use scaling::Scaling;
