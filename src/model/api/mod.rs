//! Types exchanged with API clients.
//!
//! Create payloads (`*Spec`) decode every field as optional, so that a missing
//! reference or a frozen questionnaire is reported before the body's shape.
//! Partial updates (`*Patch`) leave absent fields untouched.

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

pub mod answer;
pub mod auth;
pub mod question;
pub mod questionnaire;
pub mod response;
pub mod user;

/// Distinguish an explicit `null` from an absent field: absent stays `None`
/// through `#[serde(default)]`, while a present value (including `null`)
/// becomes `Some`.
fn deserialize_some<'de, T, D>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Unwrap a body field that a full specification must carry.
fn required<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| Error::bad_request(format!("The '{field}' field is required.")))
}
