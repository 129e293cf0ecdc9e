pub mod binding;
pub mod config;
pub mod handlers;
pub mod lifecycle;
pub mod middleware;
pub mod observability;
pub mod server;

pub use config::AppConfig;
pub use lifecycle::{DeprovisionOutcome, ProvisionOutcome, Reconciler, UpdateOutcome};
pub use server::{AppState, BrokerServer, ServerBuilder, build_app};
