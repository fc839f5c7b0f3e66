//! Random create-user payloads.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Smallest suffix drawn for generated names and emails.
pub const SUFFIX_MIN: u16 = 1000;
/// Largest suffix drawn for generated names and emails.
pub const SUFFIX_MAX: u16 = 9999;

/// Body of a create-user request.
///
/// Generated fresh for every task invocation; two virtual users may well
/// produce the same name or email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPayload {
    pub name: String,
    pub email: String,
}

impl UserPayload {
    /// Draw a payload: `User<n1>` and `user<n2>@example.com`, with `n1` and `n2`
    /// independent and uniform in `1000..=9999`.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let name_suffix = rng.gen_range(SUFFIX_MIN..=SUFFIX_MAX);
        let email_suffix = rng.gen_range(SUFFIX_MIN..=SUFFIX_MAX);
        Self {
            name: format!("User{}", name_suffix),
            email: format!("user{}@example.com", email_suffix),
        }
    }

    /// JSON request body.
    pub fn to_json(&self) -> String {
        serde_json::json!({
            "name": self.name,
            "email": self.email,
        })
        .to_string()
    }
}
