use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    model::{
        api::user::Registration,
        common::UserId,
        store::{Store, UserRepo},
    },
    Config,
};

/// Core account data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCore {
    pub username: String,
    /// Normalised so that the domain part is lowercase.
    pub email: String,
    pub password_hash: String,
    /// Staff may create, change and delete questionnaires, questions and
    /// answer options.
    pub is_staff: bool,
    /// Inactive accounts can neither log in nor use existing tokens.
    pub is_active: bool,
}

impl UserCore {
    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap_or(false)
    }
}

/// A user without an ID.
pub type NewUser = UserCore;

/// A user from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(flatten)]
    pub user: UserCore,
}

impl Deref for User {
    type Target = UserCore;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

impl DerefMut for User {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.user
    }
}

/// Ensure there is at least one staff account, creating one from the
/// configured credentials if not.
///
/// This operation is idempotent.
pub async fn ensure_staff_exists(users: &Store, config: &Config) -> Result<()> {
    if !users.staff().await?.is_empty() {
        return Ok(());
    }

    let registration = Registration {
        username: config.admin_username().to_string(),
        email: config.admin_email().to_string(),
        password: config.admin_password().to_string(),
    };
    let mut staff: NewUser = registration.try_into()?;
    staff.is_staff = true;
    let staff = users.insert_user(staff).await?;
    info!("Created initial staff account '{}'", staff.username);
    Ok(())
}
