//! Service catalog: the offerings and plans advertised to the platform.
//!
//! The catalog is loaded once at startup from a YAML (or JSON) file,
//! validated and normalized, and then shared read-only. Filtering against
//! the provider's live database list is a pure function ([`filter_catalog`])
//! that returns a new catalog and leaves the loaded one untouched.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::{CoreError, Result};
use crate::serde_helpers::is_false;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceCatalog {
    #[serde(default)]
    pub services: Vec<Service>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(default)]
    pub id: String,
    /// Service name, equal to the provider's database type.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub bindable: bool,
    #[serde(default)]
    pub instances_retrievable: bool,
    #[serde(default)]
    pub bindings_retrievable: bool,
    #[serde(default)]
    pub plan_updateable: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: ServiceMetadata,
    #[serde(default)]
    pub plans: Vec<ServicePlan>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceMetadata {
    #[serde(rename = "displayName", default)]
    pub display_name: String,
    #[serde(rename = "imageUrl", default, skip_serializing_if = "String::is_empty")]
    pub image_url: String,
    #[serde(rename = "longDescription", default)]
    pub long_description: String,
    #[serde(rename = "providerDisplayName", default)]
    pub provider_display_name: String,
    #[serde(rename = "documentationUrl", default)]
    pub documentation_url: String,
    #[serde(rename = "supportUrl", default)]
    pub support_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServicePlan {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub free: bool,
    #[serde(default)]
    pub bindable: bool,
    #[serde(default)]
    pub metadata: PlanMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanMetadata {
    #[serde(rename = "displayName", default)]
    pub display_name: String,
    #[serde(rename = "imageUrl", default, skip_serializing_if = "String::is_empty")]
    pub image_url: String,
    #[serde(default)]
    pub costs: Vec<PlanCost>,
    #[serde(default)]
    pub bullets: Vec<String>,
    #[serde(rename = "highAvailability", default)]
    pub high_availability: bool,
    #[serde(default)]
    pub units: i64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub cache_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanCost {
    #[serde(default)]
    pub amount: CostAmount,
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostAmount {
    #[serde(default)]
    pub usd: f64,
}

impl ServiceCatalog {
    /// Load, validate and normalize a catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CoreError::CatalogIo {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_yaml_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            services = catalog.services.len(),
            "Service catalog loaded"
        );
        Ok(catalog)
    }

    /// Parse, validate and normalize catalog content. JSON is accepted as well.
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let catalog: ServiceCatalog = serde_yaml::from_str(raw)?;
        catalog.normalized()
    }

    /// Validate required fields and fill in the values the broker relies on.
    ///
    /// - every service needs an id, a name and at least one plan
    /// - every plan needs an id and a name
    /// - `metadata.displayName` defaults to the service name
    /// - `bindable`, `instances_retrievable` and `bindings_retrievable` are forced on
    /// - plan `metadata.units` defaults to 1
    ///
    /// `plan_updateable` is left as configured since some database types can not be rescaled.
    pub fn normalized(mut self) -> Result<Self> {
        if self.services.is_empty() {
            return Err(CoreError::invalid_catalog("no service offerings defined"));
        }
        for (sx, service) in self.services.iter_mut().enumerate() {
            if service.id.is_empty() {
                return Err(CoreError::invalid_catalog(format!("service #{sx}: id is missing")));
            }
            if service.name.is_empty() {
                return Err(CoreError::invalid_catalog(format!("service #{sx}: name is missing")));
            }
            if service.metadata.display_name.is_empty() {
                service.metadata.display_name = service.name.clone();
            }
            service.bindable = true;
            service.instances_retrievable = true;
            service.bindings_retrievable = true;

            if service.plans.is_empty() {
                return Err(CoreError::invalid_catalog(format!(
                    "service #{sx}: at least one plan has to be defined"
                )));
            }
            for (px, plan) in service.plans.iter_mut().enumerate() {
                if plan.id.is_empty() {
                    return Err(CoreError::invalid_catalog(format!(
                        "service #{sx}, plan #{px}: id is missing"
                    )));
                }
                if plan.name.is_empty() {
                    return Err(CoreError::invalid_catalog(format!(
                        "service #{sx}, plan #{px}: name is missing"
                    )));
                }
                if plan.metadata.units <= 0 {
                    plan.metadata.units = 1;
                }
            }
        }
        Ok(self)
    }

    /// Look up a plan by service and plan id.
    pub fn find_plan(&self, service_id: &str, plan_id: &str) -> Option<(&Service, &ServicePlan)> {
        self.services
            .iter()
            .filter(|s| s.id == service_id)
            .find_map(|s| s.plans.iter().find(|p| p.id == plan_id).map(|p| (s, p)))
    }
}

/// Keep only the services whose database type the provider currently offers
/// as `stable` or `beta`.
pub fn filter_catalog(catalog: &ServiceCatalog, databases: &[Database]) -> ServiceCatalog {
    let services = catalog
        .services
        .iter()
        .filter(|service| {
            databases
                .iter()
                .any(|db| db.database_type == service.name && db.is_offered())
        })
        .cloned()
        .collect();
    ServiceCatalog { services }
}
