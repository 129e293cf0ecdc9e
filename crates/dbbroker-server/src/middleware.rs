use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, Request, header::AUTHORIZATION};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use dbbroker_api::BrokerError;

/// Username and password the platform authenticates with.
#[derive(Clone)]
pub struct BrokerCredentials {
    username: Arc<str>,
    password: Arc<str>,
}

impl BrokerCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Arc::from(username.into()),
            password: Arc::from(password.into()),
        }
    }

    /// Compare in constant time. Both fields are always checked.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        let user_ok = self.username.as_bytes().ct_eq(username.as_bytes());
        let pass_ok = self.password.as_bytes().ct_eq(password.as_bytes());
        bool::from(user_ok & pass_ok)
    }
}

impl std::fmt::Debug for BrokerCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Reject requests without valid HTTP basic credentials.
pub async fn basic_auth(
    State(credentials): State<BrokerCredentials>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let authorized = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| parse_basic_auth(h).ok())
        .is_some_and(|(user, pass)| credentials.matches(&user, &pass));

    if !authorized {
        tracing::debug!(path = %req.uri().path(), "rejected request with missing or invalid credentials");
        return BrokerError::unauthorized("You are not authorized to access this service broker")
            .into_response();
    }
    next.run(req).await
}

/// Split a `Basic` authorization header into username and password.
pub fn parse_basic_auth(header: &str) -> Result<(String, String), String> {
    let credentials = header
        .trim()
        .strip_prefix("Basic ")
        .ok_or_else(|| "Authorization header must start with 'Basic '".to_string())?;

    let decoded = STANDARD
        .decode(credentials)
        .map_err(|_| "Invalid base64 encoding in Authorization header".to_string())?;

    let credentials_str = String::from_utf8(decoded)
        .map_err(|_| "Invalid UTF-8 in decoded credentials".to_string())?;

    // Password may contain colons
    let (username, password) = credentials_str
        .split_once(':')
        .ok_or_else(|| "Credentials must be in format 'username:password'".to_string())?;

    Ok((username.to_string(), password.to_string()))
}

/// Request id of the current request, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(HeaderValue);

impl RequestId {
    pub fn as_str(&self) -> &str {
        self.0.to_str().unwrap_or_default()
    }
}

/// Reuse the caller's `x-request-id` or mint one, and echo it on the response.
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let header_name = HeaderName::from_static("x-request-id");

    let value = match req.headers().get(&header_name) {
        Some(value) => value.clone(),
        None => HeaderValue::from_str(&Uuid::new_v4().to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("unknown")),
    };
    req.extensions_mut().insert(RequestId(value.clone()));

    let mut res = next.run(req).await;
    res.headers_mut().insert(header_name, value);
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(raw: &str) -> String {
        format!("Basic {}", STANDARD.encode(raw))
    }

    #[test]
    fn parses_basic_header() {
        assert_eq!(
            parse_basic_auth(&encode("broker:s3cr:et")).unwrap(),
            ("broker".to_string(), "s3cr:et".to_string())
        );
        assert!(parse_basic_auth("Bearer abc").is_err());
        assert!(parse_basic_auth("Basic !!!").is_err());
        assert!(parse_basic_auth(&encode("no-colon")).is_err());
    }

    #[test]
    fn credentials_compare_both_fields() {
        let creds = BrokerCredentials::new("broker", "secret");
        assert!(creds.matches("broker", "secret"));
        assert!(!creds.matches("broker", "secreT"));
        assert!(!creds.matches("other", "secret"));
        assert!(!creds.matches("", ""));
        assert!(!format!("{creds:?}").contains("secret"));
    }
}
