use thiserror::Error;

/// Core error types for broker-local decisions (catalog and parameter resolution)
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Unknown plan: service '{service_id}', plan '{plan_id}'")]
    UnknownPlan { service_id: String, plan_id: String },

    #[error("Missing parameters: {0}")]
    MissingParameters(String),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Could not read catalog {path}: {source}")]
    CatalogIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse catalog: {0}")]
    CatalogParse(#[from] serde_yaml::Error),
}

impl CoreError {
    /// Create a new UnknownPlan error
    pub fn unknown_plan(service_id: impl Into<String>, plan_id: impl Into<String>) -> Self {
        Self::UnknownPlan {
            service_id: service_id.into(),
            plan_id: plan_id.into(),
        }
    }

    /// Create a new MissingParameters error
    pub fn missing_parameters(message: impl Into<String>) -> Self {
        Self::MissingParameters(message.into())
    }

    /// Create a new InvalidCatalog error
    pub fn invalid_catalog(message: impl Into<String>) -> Self {
        Self::InvalidCatalog(message.into())
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_plan_error() {
        let err = CoreError::unknown_plan("svc-1", "plan-9");
        assert_eq!(
            err.to_string(),
            "Unknown plan: service 'svc-1', plan 'plan-9'"
        );
    }

    #[test]
    fn test_catalog_io_error_names_path() {
        let err = CoreError::CatalogIo {
            path: "catalog.yml".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.to_string(), "Could not read catalog catalog.yml: missing");
    }
}
