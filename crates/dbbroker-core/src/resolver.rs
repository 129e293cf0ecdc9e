//! Catalog Resolver: turns a (service, plan) pair plus request overrides into
//! concrete deployment parameters.
//!
//! Precedence for every field, highest first:
//!
//! 1. explicit request parameter
//! 2. plan metadata default
//! 3. process-wide default (datacenter and account id only)
//!
//! Empty strings in the request count as "not given". An explicit `units`
//! value always wins, including non-positive ones, which then fail validation.

use crate::catalog::ServiceCatalog;
use crate::error::{CoreError, Result};

/// Optional per-request parameters that override plan defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterOverrides {
    pub account_id: Option<String>,
    pub datacenter: Option<String>,
    pub version: Option<String>,
    pub units: Option<i64>,
    pub cache_mode: Option<bool>,
}

/// Process-wide defaults, taken from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverDefaults {
    pub datacenter: String,
    pub account_id: Option<String>,
}

/// Fully resolved parameters for a new deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentTarget {
    pub database_type: String,
    pub datacenter: String,
    pub version: Option<String>,
    pub units: i64,
    pub cache_mode: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct CatalogResolver<'a> {
    catalog: &'a ServiceCatalog,
    defaults: &'a ResolverDefaults,
}

impl<'a> CatalogResolver<'a> {
    pub fn new(catalog: &'a ServiceCatalog, defaults: &'a ResolverDefaults) -> Self {
        Self { catalog, defaults }
    }

    /// Resolve the deployment parameters for a provisioning request.
    ///
    /// # Errors
    ///
    /// - `UnknownPlan` if no catalog entry matches `(service_id, plan_id)`
    /// - `MissingParameters` if the resolved unit count is not positive
    pub fn resolve(
        &self,
        service_id: &str,
        plan_id: &str,
        overrides: &ParameterOverrides,
    ) -> Result<DeploymentTarget> {
        let (service, plan) = self
            .catalog
            .find_plan(service_id, plan_id)
            .ok_or_else(|| CoreError::unknown_plan(service_id, plan_id))?;
        let meta = &plan.metadata;

        let units = match overrides.units {
            Some(units) => units,
            None if meta.units > 0 => meta.units,
            None => 1,
        };
        if units <= 0 {
            return Err(CoreError::missing_parameters(format!(
                "units must be a positive number, got {units}"
            )));
        }

        let datacenter = non_empty(overrides.datacenter.as_deref())
            .or_else(|| non_empty(meta.datacenter.as_deref()))
            .unwrap_or(&self.defaults.datacenter)
            .to_string();
        if datacenter.is_empty() {
            return Err(CoreError::missing_parameters("no datacenter configured"));
        }

        let version = non_empty(overrides.version.as_deref())
            .or_else(|| non_empty(meta.version.as_deref()))
            .map(str::to_string);

        Ok(DeploymentTarget {
            database_type: service.name.clone(),
            datacenter,
            version,
            units,
            cache_mode: overrides.cache_mode.unwrap_or(meta.cache_mode),
        })
    }

    /// Resolve the target unit count of an update request.
    ///
    /// Explicit units win; otherwise the units of the requested plan are used.
    /// A plan id that is given but unknown is rejected even when explicit units
    /// are present.
    pub fn resolve_units(
        &self,
        service_id: &str,
        plan_id: Option<&str>,
        explicit: Option<i64>,
    ) -> Result<i64> {
        let plan_units = match non_empty(plan_id) {
            Some(plan_id) => {
                let (_, plan) = self
                    .catalog
                    .find_plan(service_id, plan_id)
                    .ok_or_else(|| CoreError::unknown_plan(service_id, plan_id))?;
                Some(plan.metadata.units)
            }
            None => None,
        };

        let units = explicit.or(plan_units).unwrap_or(0);
        if units <= 0 {
            return Err(CoreError::missing_parameters(
                "either a plan or a positive number of units is required",
            ));
        }
        Ok(units)
    }

    /// Account id from the request or the configured default.
    ///
    /// `None` means the caller has to fall back to the provider's account listing.
    pub fn preset_account_id(&self, overrides: &ParameterOverrides) -> Option<String> {
        non_empty(overrides.account_id.as_deref())
            .or_else(|| non_empty(self.defaults.account_id.as_deref()))
            .map(str::to_string)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
