//! Service binding response body.

use serde::{Deserialize, Serialize};

use dbbroker_core::{Scaling, ServiceInstance};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindingResponse {
    pub credentials: BindingCredentials,
    pub endpoints: Vec<BindingEndpoint>,
    pub parameters: BindingParameters,
}

/// Connection details derived from the instance's connection strings.
///
/// The raw connection-string lists are always present; the parsed fields are
/// left out when there is no parseable direct connection string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingCredentials {
    pub direct: Vec<String>,
    pub cli: Vec<String>,
    pub maps: Vec<String>,
    pub ssh: Vec<String>,
    pub health: Vec<String>,
    pub admin: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uri: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub database_uri: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub database: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scheme: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ca_certificate: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingEndpoint {
    pub host: String,
    pub ports: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindingParameters {
    pub deployment: ServiceInstance,
    pub scaling: Scaling,
}
