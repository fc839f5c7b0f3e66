//! Success/failure classification of create-user responses.

use std::fmt;

use serde_json::Value;

/// Status code the user API answers a successful create with.
pub const CREATE_USER_OK: u16 = 200;

/// Identifier of a created user, exactly as the API returned it under `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct UserId(Value);

impl UserId {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Whether the id is usable for a follow-up lookup.
    ///
    /// `null`, `false`, `0`, `""` and empty arrays or objects are not.
    pub fn is_truthy(&self) -> bool {
        match &self.0 {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(fields) => !fields.is_empty(),
        }
    }
}

/// Renders as a path segment: strings verbatim, everything else as JSON text.
impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{}", other),
        }
    }
}

/// Why a create-user call counts as failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateUserFailure {
    /// The API answered with something other than 200
    UnexpectedStatus(u16),
    /// 200, but the body was not JSON or carried no `id`
    MalformedBody(String),
}

impl fmt::Display for CreateUserFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreateUserFailure::UnexpectedStatus(status) => {
                write!(f, "Failed to create user: {}", status)
            }
            CreateUserFailure::MalformedBody(reason) => {
                write!(f, "JSON parse error or missing id: {}", reason)
            }
        }
    }
}

impl std::error::Error for CreateUserFailure {}

/// Classify a create-user response.
pub fn create_user_response(status: u16, body: &str) -> Result<UserId, CreateUserFailure> {
    if status != CREATE_USER_OK {
        return Err(CreateUserFailure::UnexpectedStatus(status));
    }

    let parsed: Value = serde_json::from_str(body)
        .map_err(|e| CreateUserFailure::MalformedBody(e.to_string()))?;
    match parsed {
        Value::Object(mut fields) => fields
            .remove("id")
            .map(UserId::new)
            .ok_or_else(|| CreateUserFailure::MalformedBody("missing field `id`".to_string())),
        other => Err(CreateUserFailure::MalformedBody(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
