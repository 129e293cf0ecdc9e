use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Identification header set on every broker response.
pub const BROKER_HEADER: HeaderName = HeaderName::from_static("x-broker");
pub const BROKER_HEADER_VALUE: HeaderValue = HeaderValue::from_static("dbbroker");

/// A JSON success response with an explicit status code.
#[derive(Debug, Clone)]
pub struct BrokerResponse<T> {
    pub value: T,
    pub status: StatusCode,
}

impl<T> BrokerResponse<T> {
    pub fn new(value: T, status: StatusCode) -> Self {
        Self { value, status }
    }

    pub fn ok(value: T) -> Self {
        Self::new(value, StatusCode::OK)
    }

    pub fn created(value: T) -> Self {
        Self::new(value, StatusCode::CREATED)
    }

    pub fn accepted(value: T) -> Self {
        Self::new(value, StatusCode::ACCEPTED)
    }
}

impl<T: Serialize> IntoResponse for BrokerResponse<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.value) {
            Ok(body) => json_response(self.status, body),
            Err(_) => json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"error":"UnknownError","description":"Serialization failure"}"#.to_vec(),
            ),
        }
    }
}

/// Build a JSON response with the broker headers.
pub(crate) fn json_response(status: StatusCode, body: Vec<u8>) -> Response {
    let mut response = (status, body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(BROKER_HEADER, BROKER_HEADER_VALUE);
    response
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: &'static str,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}
