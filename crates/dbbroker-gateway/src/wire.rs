//! Request and response envelopes of the provider API.
//!
//! Listings are wrapped in a HAL-style `_embedded` object; create and scale
//! requests wrap their payload in a `deployment` object.

use serde::{Deserialize, Serialize};

use dbbroker_core::{Account, Database, NewInstance, Operation, ServiceInstance};

#[derive(Debug, Deserialize)]
pub(crate) struct Embedded<T> {
    #[serde(rename = "_embedded")]
    pub embedded: T,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DeploymentList {
    #[serde(default)]
    pub deployments: Vec<ServiceInstance>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RecipeList {
    #[serde(default)]
    pub recipes: Vec<Operation>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AccountList {
    #[serde(default)]
    pub accounts: Vec<Account>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApplicationList {
    #[serde(default)]
    pub applications: Vec<Database>,
}

/// Just the id of a recipe returned by a mutating call.
#[derive(Debug, Deserialize)]
pub(crate) struct RecipeRef {
    #[serde(default)]
    pub id: Option<String>,
}

impl RecipeRef {
    pub fn into_id(self) -> Option<String> {
        self.id.filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DeploymentEnvelope<T> {
    pub deployment: T,
}

pub(crate) type CreateRequest<'a> = DeploymentEnvelope<&'a NewInstance>;

#[derive(Debug, Serialize)]
pub(crate) struct ScalingUnits {
    pub units: i64,
}
