use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dbbroker_core::CoreError;

use crate::response::json_response;

/// Realm announced in the `WWW-Authenticate` challenge.
pub const AUTH_REALM: &str = r#"Basic realm="dbbroker""#;

/// Protocol errors returned to the platform.
///
/// Each variant fixes the machine-readable `error` code. The description is
/// always written by the broker; provider error bodies are logged, never
/// forwarded.
#[derive(Debug, Clone, Error)]
pub enum BrokerError {
    #[error("AsyncRequired: {0}")]
    AsyncRequired(String),
    #[error("MalformedRequest: {0}")]
    MalformedRequest(String),
    #[error("MissingParameters: {0}")]
    MissingParameters(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("ServiceInstanceNotFound: {0}")]
    ServiceInstanceNotFound(String),
    #[error("MissingServiceInstance: {description}")]
    MissingServiceInstance { description: String, gone: bool },
    #[error("MissingRecipes: {0}")]
    MissingRecipes(String),
    #[error("MissingScalingParameters: {0}")]
    MissingScalingParameters(String),
    #[error("ConcurrencyError: {description}")]
    Concurrency {
        description: String,
        status: StatusCode,
    },
    #[error("ProvisionFailure: {0}")]
    ProvisionFailure(String),
    #[error("UpdateFailure: {0}")]
    UpdateFailure(String),
    #[error("DeprovisionFailure: {0}")]
    DeprovisionFailure(String),
    #[error("UnknownError: {description}")]
    Unknown {
        description: String,
        status: StatusCode,
    },
}

impl BrokerError {
    pub fn async_required(msg: impl Into<String>) -> Self {
        Self::AsyncRequired(msg.into())
    }
    pub fn malformed_request(msg: impl Into<String>) -> Self {
        Self::MalformedRequest(msg.into())
    }
    pub fn missing_parameters(msg: impl Into<String>) -> Self {
        Self::MissingParameters(msg.into())
    }
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }
    pub fn instance_not_found(msg: impl Into<String>) -> Self {
        Self::ServiceInstanceNotFound(msg.into())
    }
    /// Missing instance reported as 404.
    pub fn missing_instance(msg: impl Into<String>) -> Self {
        Self::MissingServiceInstance {
            description: msg.into(),
            gone: false,
        }
    }
    /// Missing instance reported as 410 Gone.
    pub fn instance_gone(msg: impl Into<String>) -> Self {
        Self::MissingServiceInstance {
            description: msg.into(),
            gone: true,
        }
    }
    pub fn missing_recipes(msg: impl Into<String>) -> Self {
        Self::MissingRecipes(msg.into())
    }
    pub fn missing_scaling(msg: impl Into<String>) -> Self {
        Self::MissingScalingParameters(msg.into())
    }
    /// An in-flight operation blocks the request (422).
    pub fn concurrency(msg: impl Into<String>) -> Self {
        Self::concurrency_with_status(msg, StatusCode::UNPROCESSABLE_ENTITY)
    }
    pub fn concurrency_with_status(msg: impl Into<String>, status: StatusCode) -> Self {
        Self::Concurrency {
            description: msg.into(),
            status,
        }
    }
    pub fn provision_failure(msg: impl Into<String>) -> Self {
        Self::ProvisionFailure(msg.into())
    }
    pub fn update_failure(msg: impl Into<String>) -> Self {
        Self::UpdateFailure(msg.into())
    }
    pub fn deprovision_failure(msg: impl Into<String>) -> Self {
        Self::DeprovisionFailure(msg.into())
    }
    /// Conflicting or undecidable state (409).
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::unknown(msg, StatusCode::CONFLICT)
    }
    /// A remote call failed outright (500).
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::unknown(msg, StatusCode::INTERNAL_SERVER_ERROR)
    }
    pub fn unknown(msg: impl Into<String>, status: StatusCode) -> Self {
        Self::Unknown {
            description: msg.into(),
            status,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AsyncRequired(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::MalformedRequest(_) | Self::MissingParameters(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::ServiceInstanceNotFound(_)
            | Self::MissingRecipes(_)
            | Self::MissingScalingParameters(_) => StatusCode::NOT_FOUND,
            Self::MissingServiceInstance { gone: true, .. } => StatusCode::GONE,
            Self::MissingServiceInstance { gone: false, .. } => StatusCode::NOT_FOUND,
            Self::Concurrency { status, .. } | Self::Unknown { status, .. } => *status,
            Self::ProvisionFailure(_) => StatusCode::BAD_REQUEST,
            Self::UpdateFailure(_) => StatusCode::CONFLICT,
            Self::DeprovisionFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AsyncRequired(_) => "AsyncRequired",
            Self::MalformedRequest(_) => "MalformedRequest",
            Self::MissingParameters(_) => "MissingParameters",
            Self::Unauthorized(_) => "Unauthorized",
            Self::ServiceInstanceNotFound(_) => "ServiceInstanceNotFound",
            Self::MissingServiceInstance { .. } => "MissingServiceInstance",
            Self::MissingRecipes(_) => "MissingRecipes",
            Self::MissingScalingParameters(_) => "MissingScalingParameters",
            Self::Concurrency { .. } => "ConcurrencyError",
            Self::ProvisionFailure(_) => "ProvisionFailure",
            Self::UpdateFailure(_) => "UpdateFailure",
            Self::DeprovisionFailure(_) => "DeprovisionFailure",
            Self::Unknown { .. } => "UnknownError",
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::AsyncRequired(msg)
            | Self::MalformedRequest(msg)
            | Self::MissingParameters(msg)
            | Self::Unauthorized(msg)
            | Self::ServiceInstanceNotFound(msg)
            | Self::MissingRecipes(msg)
            | Self::MissingScalingParameters(msg)
            | Self::ProvisionFailure(msg)
            | Self::UpdateFailure(msg)
            | Self::DeprovisionFailure(msg) => msg,
            Self::MissingServiceInstance { description, .. }
            | Self::Concurrency { description, .. }
            | Self::Unknown { description, .. } => description,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.error_code().to_string(),
            description: self.description().to_string(),
        }
    }
}

impl From<CoreError> for BrokerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownPlan { .. } => Self::malformed_request("Unknown plan_id"),
            CoreError::MissingParameters(msg) => Self::missing_parameters(msg),
            other => Self::internal(other.to_string()),
        }
    }
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub description: String,
}

impl IntoResponse for BrokerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::to_vec(&self.to_body()).unwrap_or_else(|_| b"{}".to_vec());
        let mut response = json_response(status, body);
        if matches!(self, Self::Unauthorized(_)) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(AUTH_REALM));
        }
        response
    }
}
