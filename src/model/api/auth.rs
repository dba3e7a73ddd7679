use std::marker::PhantomData;

use chrono::{serde::ts_seconds, DateTime, Duration, Utc};
use jsonwebtoken::{
    errors::Error as JwtError, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    model::{common::UserId, db::User, store::Store},
    Config,
};

/// Tokens are valid for this many days after they are issued.
pub const TOKEN_VALIDITY_DAYS: i64 = 60;

/// Token claims: the user ID plus an expiry datetime.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: UserId,
    #[serde(rename = "exp", with = "ts_seconds")]
    pub expire_at: DateTime<Utc>,
}

impl Claims {
    /// Claims for the given user, expiring [`TOKEN_VALIDITY_DAYS`] from now.
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            expire_at: Utc::now() + Duration::days(TOKEN_VALIDITY_DAYS),
        }
    }

    /// Sign these claims into a token.
    pub fn encode(&self, config: &Config) -> Result<String, JwtError> {
        jsonwebtoken::encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(config.jwt_secret()),
        )
    }
}

/// Issue a bearer token for the given user.
pub fn issue_token(id: UserId, config: &Config) -> Result<String, JwtError> {
    Claims::new(id).encode(config)
}

/// Check a bearer token's signature and expiry, returning the user ID it
/// was issued for.
pub fn verify_token(token: &str, config: &Config) -> Result<UserId, JwtError> {
    jsonwebtoken::decode(
        token,
        &DecodingKey::from_secret(config.jwt_secret()),
        &Validation::default(),
    )
    .map(|data: TokenData<Claims>| data.claims.id)
}

/// Which accounts an [`AuthToken`] admits.
pub trait Role: Send + Sync + 'static {
    fn permits(user: &User) -> bool;
}

/// Staff accounts only.
pub struct Staff;

impl Role for Staff {
    fn permits(user: &User) -> bool {
        user.is_staff
    }
}

/// Any active account.
pub struct Member;

impl Role for Member {
    fn permits(_user: &User) -> bool {
        true
    }
}

/// Why a request could not be authenticated.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authentication credentials were not provided.")]
    MissingCredentials,
    #[error("Invalid token.")]
    InvalidToken,
    #[error("You do not have permission to perform this action.")]
    NotPermitted,
    #[error("Internal server error.")]
    Unavailable,
}

impl AuthError {
    pub fn status(&self) -> Status {
        match self {
            Self::MissingCredentials | Self::InvalidToken => Status::Unauthorized,
            Self::NotPermitted => Status::Forbidden,
            Self::Unavailable => Status::InternalServerError,
        }
    }
}

/// A verified bearer token, belonging to an active account admitted by `R`.
pub struct AuthToken<R> {
    pub user: User,
    phantom: PhantomData<R>,
}

impl<R> AuthToken<R> {
    pub fn into_user(self) -> User {
        self.user
    }
}

/// Resolve the `Authorization: Bearer` header to an account admitted by `R`.
async fn authenticate<R: Role>(req: &Request<'_>) -> Result<User, AuthError> {
    let header = req
        .headers()
        .get_one("Authorization")
        .ok_or(AuthError::MissingCredentials)?;
    let mut parts = header.split_whitespace();
    if !parts
        .next()
        .map_or(false, |scheme| scheme.eq_ignore_ascii_case("bearer"))
    {
        return Err(AuthError::MissingCredentials);
    }
    let token = match (parts.next(), parts.next()) {
        (Some(token), None) => token,
        _ => return Err(AuthError::InvalidToken),
    };

    let rocket = req.rocket();
    let (config, store) = match (rocket.state::<Config>(), rocket.state::<Store>()) {
        (Some(config), Some(store)) => (config, store),
        _ => {
            error!("Authentication attempted before config and storage were ready");
            return Err(AuthError::Unavailable);
        }
    };

    let id = verify_token(token, config).map_err(|e| {
        debug!("Rejected token: {e}");
        AuthError::InvalidToken
    })?;
    let user = store
        .user(id)
        .await
        .map_err(|e| {
            error!("Failed to load user {id}: {e}");
            AuthError::Unavailable
        })?
        .filter(|user| user.is_active)
        .ok_or(AuthError::InvalidToken)?;

    if R::permits(&user) {
        Ok(user)
    } else {
        Err(AuthError::NotPermitted)
    }
}

#[rocket::async_trait]
impl<'r, R: Role> FromRequest<'r> for AuthToken<R> {
    type Error = AuthError;

    /// Authenticate the request, caching any failure so the catchers can
    /// describe it.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match authenticate::<R>(req).await {
            Ok(user) => Outcome::Success(Self {
                user,
                phantom: PhantomData,
            }),
            Err(err) => {
                let err = *req.local_cache(|| err);
                Outcome::Failure((err.status(), err))
            }
        }
    }
}
