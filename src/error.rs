use argon2::Error as Argon2Error;
use jsonwebtoken::errors::Error as JwtError;
use mongodb::error::Error as DbError;
use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::Json,
    Catcher, Request,
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    logging::RequestId,
    model::api::{auth::AuthError, user::CredentialsError},
    rules::{mutability::GuardError, validation::AnswerError},
};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
    #[error(transparent)]
    Credentials(#[from] CredentialsError),
    #[error(transparent)]
    Guard(#[from] GuardError),
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    /// "<what> not found", as a 404.
    pub fn not_found(what: impl AsRef<str>) -> Self {
        Self::Status(Status::NotFound, format!("{} not found", what.as_ref()))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Status(Status::BadRequest, message.into())
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Db(_) | Self::Jwt(_) | Self::Argon2(_) => Status::InternalServerError,
            Self::Credentials(CredentialsError::Hash(_)) => Status::InternalServerError,
            Self::Credentials(_) => Status::BadRequest,
            Self::Guard(err) => err.status(),
            Self::Answer(_) => Status::Forbidden,
            Self::Status(status, _) => *status,
        }
    }
}

/// Body of a rejected operation.
#[derive(Serialize)]
struct Message {
    message: String,
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let id = RequestId::of(req);
        let status = self.status();
        if status.class().is_server_error() {
            // Internal details stay in the log; the catcher renders the body.
            error!("req{id}: {self}");
            return Err(status);
        }

        warn!("req{id}: {self}");
        (
            status,
            Json(Message {
                message: self.to_string(),
            }),
        )
            .respond_to(req)
    }
}

/// Body of a request that failed before reaching its handler.
#[derive(Serialize)]
struct Detail {
    detail: String,
}

impl Detail {
    fn new(detail: impl Into<String>) -> Json<Self> {
        Json(Self {
            detail: detail.into(),
        })
    }
}

#[catch(400)]
fn bad_request() -> Json<Detail> {
    Detail::new("Malformed request.")
}

#[catch(401)]
fn unauthorized(req: &Request) -> Json<Detail> {
    Detail::new(req.local_cache(|| AuthError::MissingCredentials).to_string())
}

#[catch(403)]
fn forbidden(req: &Request) -> Json<Detail> {
    Detail::new(req.local_cache(|| AuthError::NotPermitted).to_string())
}

#[catch(404)]
fn not_found() -> Json<Detail> {
    Detail::new("Not found.")
}

#[catch(422)]
fn unprocessable_entity() -> Json<Detail> {
    Detail::new("The request body could not be parsed.")
}

#[catch(500)]
fn internal_error() -> Json<Detail> {
    Detail::new("Internal server error.")
}

/// JSON catchers for failures outside of handlers.
pub fn catchers() -> Vec<Catcher> {
    catchers![
        bad_request,
        unauthorized,
        forbidden,
        not_found,
        unprocessable_entity,
        internal_error,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::mutability::{Operation, Resource};

    #[test]
    fn status_mapping() {
        assert_eq!(Error::not_found("Question 3").status(), Status::NotFound);
        assert_eq!(
            Error::not_found("Question 3").to_string(),
            "Question 3 not found"
        );
        assert_eq!(Error::bad_request("nope").status(), Status::BadRequest);
        assert_eq!(
            Error::from(AnswerError::Unanswered).status(),
            Status::Forbidden
        );
        assert_eq!(
            Error::from(GuardError::Started {
                resource: Resource::Question,
                operation: Operation::Delete,
            })
            .status(),
            Status::Forbidden
        );
        assert_eq!(
            Error::from(GuardError::Unspecified("question_id")).status(),
            Status::NotAcceptable
        );
        assert_eq!(
            Error::from(CredentialsError::ShortPassword).status(),
            Status::BadRequest
        );
    }
}
