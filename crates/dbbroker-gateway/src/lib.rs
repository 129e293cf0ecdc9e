//! Provider REST API client.
//!
//! [`ProviderClient`] implements [`dbbroker_core::RemoteGateway`] on top of
//! `reqwest`: bearer-token authentication, JSON bodies, bounded retries on
//! transient failures and decoding of the provider's error bodies.

mod client;
mod wire;

pub use client::{ClientConfig, DEFAULT_API_URL, ProviderClient, RETRY_STATUS_CODES};
