//! Requests the virtual user sends, independent of any HTTP client.
//!
//! | Call | Method | Path | Headers | Body |
//! |---|---|---|---|---|
//! | create user | POST | `{base}/users` | `Content-Type`, `x-api-key` | `{"name", "email"}` |
//! | get user | GET | `{base}/users/{id}` | `Content-Type`, `x-api-key` | none |
//! | health check | GET | `{base}/healthCheck` | none | none |

use http::Method;

use crate::classify::UserId;
use crate::config::LoadTestConfig;
use crate::payload::UserPayload;

pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const API_KEY_HEADER: &str = "x-api-key";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A request as the harness should send it.
///
/// `path` is absolute; the harness prefixes it with the target host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    /// Name the request is aggregated under in load reports. Ids stay as `{id}`.
    pub name: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<String>,
}

impl ApiRequest {
    /// First value of a header, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and body of a response the harness received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Headers every user endpoint is called with.
fn user_headers(config: &LoadTestConfig) -> Vec<(&'static str, String)> {
    vec![
        (CONTENT_TYPE_HEADER, JSON_CONTENT_TYPE.to_string()),
        (API_KEY_HEADER, config.api_key.clone()),
    ]
}

/// `POST {base}/users`
pub fn create_user(config: &LoadTestConfig, payload: &UserPayload) -> ApiRequest {
    ApiRequest {
        method: Method::POST,
        path: config.endpoint("/users"),
        name: config.endpoint("/users"),
        headers: user_headers(config),
        body: Some(payload.to_json()),
    }
}

/// `GET {base}/users/{id}`
pub fn get_user(config: &LoadTestConfig, id: &UserId) -> ApiRequest {
    ApiRequest {
        method: Method::GET,
        path: config.endpoint(&format!("/users/{}", id)),
        name: config.endpoint("/users/{id}"),
        headers: user_headers(config),
        body: None,
    }
}

/// `GET {base}/healthCheck`
pub fn health_check(config: &LoadTestConfig) -> ApiRequest {
    ApiRequest {
        method: Method::GET,
        path: config.endpoint("/healthCheck"),
        name: config.endpoint("/healthCheck"),
        headers: Vec::new(),
        body: None,
    }
}
