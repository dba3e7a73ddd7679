use argon2::{Config, Error as Argon2Error};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    common::UserId,
    db::{NewUser, User},
};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Raw account details, received from a user. These are never stored
/// directly, since the password is in plaintext.
#[derive(Clone, Deserialize, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Reasons to refuse a [`Registration`].
#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("Username must not be empty.")]
    EmptyUsername,
    #[error("Enter a valid email address.")]
    InvalidEmail,
    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters.")]
    ShortPassword,
    #[error(transparent)]
    Hash(#[from] Argon2Error),
}

impl TryFrom<Registration> for NewUser {
    type Error = CredentialsError;

    /// Convert a [`Registration`] to a new, active, non-staff [`User`] by
    /// hashing the password.
    fn try_from(registration: Registration) -> Result<Self, Self::Error> {
        let username = registration.username.trim().to_string();
        if username.is_empty() {
            return Err(CredentialsError::EmptyUsername);
        }
        let email = normalize_email(&registration.email).ok_or(CredentialsError::InvalidEmail)?;
        if registration.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(CredentialsError::ShortPassword);
        }

        // 16 bytes is recommended for password hashing:
        //  https://en.wikipedia.org/wiki/Argon2
        let mut salt = [0_u8; 16];
        rand::thread_rng().fill(&mut salt);
        let password_hash =
            argon2::hash_encoded(registration.password.as_bytes(), &salt, &Config::default())?;

        Ok(Self {
            username,
            email,
            password_hash,
            is_staff: false,
            is_active: true,
        })
    }
}

/// Lowercase the domain part of an email address, rejecting anything that
/// does not look like `local@domain`.
pub fn normalize_email(email: &str) -> Option<String> {
    let (local, domain) = email.trim().rsplit_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains(char::is_whitespace) {
        return None;
    }
    Some(format!("{local}@{}", domain.to_lowercase()))
}

/// Login form.
#[derive(Clone, Deserialize, Serialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

/// An account as shown to API clients. The token is only present on
/// registration and login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDescription {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl UserDescription {
    pub fn with_token(user: User, token: String) -> Self {
        Self {
            token: Some(token),
            ..Self::from(user)
        }
    }
}

impl From<User> for UserDescription {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.user.username,
            email: user.user.email,
            is_staff: user.user.is_staff,
            token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_domain_is_lowercased() {
        assert_eq!(
            normalize_email("Jane.Doe@Example.COM").as_deref(),
            Some("Jane.Doe@example.com")
        );
        assert_eq!(normalize_email("no-at-sign"), None);
        assert_eq!(normalize_email("@example.com"), None);
        assert_eq!(normalize_email("jane@"), None);
    }

    #[test]
    fn bad_registrations() {
        let mut registration = Registration::example();
        registration.username = "  ".into();
        assert!(matches!(
            NewUser::try_from(registration),
            Err(CredentialsError::EmptyUsername)
        ));

        let mut registration = Registration::example();
        registration.email = "jane".into();
        assert!(matches!(
            NewUser::try_from(registration),
            Err(CredentialsError::InvalidEmail)
        ));

        let mut registration = Registration::example();
        registration.password = "short".into();
        assert!(matches!(
            NewUser::try_from(registration),
            Err(CredentialsError::ShortPassword)
        ));
    }

    #[test]
    fn token_only_serialized_when_present() {
        let user = User {
            id: 3,
            user: Registration::example().try_into().unwrap(),
        };
        let description = UserDescription::from(user.clone());
        let json = rocket::serde::json::serde_json::to_value(&description).unwrap();
        assert!(json.get("token").is_none());
        assert!(json.get("password_hash").is_none());

        let description = UserDescription::with_token(user, "abc".into());
        let json = rocket::serde::json::serde_json::to_value(&description).unwrap();
        assert_eq!(json["token"], "abc");
    }
}
