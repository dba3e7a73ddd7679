//! Persistence behind per-entity repository traits.
//!
//! [`Store`] is a cheap handle over either MongoDB or an in-memory store, and
//! is placed into managed state at ignition.

use std::{cmp::Ordering, ops::Deref, sync::Arc};

use chrono::NaiveDate;
use mongodb::{Client, Database};
use rocket::{
    http::Status,
    request::{FromRequest, Outcome, Request},
};

use crate::{
    error::Result,
    model::{
        common::{AnswerId, QuestionId, QuestionnaireId, ResponseId, UserId},
        db::{
            AnswerOption, NewAnswerOption, NewQuestion, NewQuestionnaire, NewUser,
            NewUserResponse, Question, Questionnaire, User, UserResponse,
        },
    },
};

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[rocket::async_trait]
pub trait QuestionnaireRepo: Send + Sync {
    /// All questionnaires, in listing order.
    async fn questionnaires(&self) -> Result<Vec<Questionnaire>>;
    /// Questionnaires whose window contains `day`, in listing order.
    async fn active_questionnaires(&self, day: NaiveDate) -> Result<Vec<Questionnaire>>;
    async fn questionnaire(&self, id: QuestionnaireId) -> Result<Option<Questionnaire>>;
    async fn insert_questionnaire(&self, questionnaire: NewQuestionnaire)
        -> Result<Questionnaire>;
    /// Overwrite an existing questionnaire's fields.
    async fn replace_questionnaire(&self, questionnaire: &Questionnaire) -> Result<()>;
    /// Delete a questionnaire together with its questions, their answer
    /// options and their responses. Returns false if there was nothing to
    /// delete.
    async fn delete_questionnaire(&self, id: QuestionnaireId) -> Result<bool>;
}

#[rocket::async_trait]
pub trait QuestionRepo: Send + Sync {
    async fn questions(&self) -> Result<Vec<Question>>;
    async fn questions_for(&self, questionnaire_id: QuestionnaireId) -> Result<Vec<Question>>;
    async fn question(&self, id: QuestionId) -> Result<Option<Question>>;
    async fn insert_question(&self, question: NewQuestion) -> Result<Question>;
    async fn replace_question(&self, question: &Question) -> Result<()>;
    /// Delete a question together with its answer options and responses.
    async fn delete_question(&self, id: QuestionId) -> Result<bool>;
}

#[rocket::async_trait]
pub trait AnswerOptionRepo: Send + Sync {
    async fn answer_options(&self) -> Result<Vec<AnswerOption>>;
    async fn answer_options_for(&self, question_id: QuestionId) -> Result<Vec<AnswerOption>>;
    async fn answer_option(&self, id: AnswerId) -> Result<Option<AnswerOption>>;
    async fn insert_answer_option(&self, option: NewAnswerOption) -> Result<AnswerOption>;
    async fn replace_answer_option(&self, option: &AnswerOption) -> Result<()>;
    /// Delete an answer option, removing it from every response that
    /// selected it.
    async fn delete_answer_option(&self, id: AnswerId) -> Result<bool>;
}

#[rocket::async_trait]
pub trait ResponseRepo: Send + Sync {
    async fn responses(&self) -> Result<Vec<UserResponse>>;
    async fn response(&self, id: ResponseId) -> Result<Option<UserResponse>>;
    async fn responses_for_user(&self, user_id: UserId) -> Result<Vec<UserResponse>>;
    async fn has_response(&self, user_id: UserId, question_id: QuestionId) -> Result<bool>;
    /// Store a response. A second response by the same user to the same
    /// question is refused with
    /// [`AnswerError::AlreadyAnswered`](crate::rules::validation::AnswerError::AlreadyAnswered).
    async fn insert_response(&self, response: NewUserResponse) -> Result<UserResponse>;
    async fn delete_response(&self, id: ResponseId) -> Result<bool>;
}

#[rocket::async_trait]
pub trait UserRepo: Send + Sync {
    async fn user(&self, id: UserId) -> Result<Option<User>>;
    /// Look up a user by their normalised email address.
    async fn user_by_email(&self, email: &str) -> Result<Option<User>>;
    /// All staff accounts, by ID.
    async fn staff(&self) -> Result<Vec<User>>;
    /// Store a user, refusing a username or email that is already taken.
    async fn insert_user(&self, user: NewUser) -> Result<User>;
}

/// Everything the application needs from its storage.
pub trait Storage:
    QuestionnaireRepo + QuestionRepo + AnswerOptionRepo + ResponseRepo + UserRepo
{
}

impl<T> Storage for T where
    T: QuestionnaireRepo + QuestionRepo + AnswerOptionRepo + ResponseRepo + UserRepo
{
}

/// A shared handle on the application's storage.
#[derive(Clone)]
pub struct Store(Arc<dyn Storage>);

impl Store {
    /// A fresh, empty in-memory store.
    pub fn memory() -> Self {
        Self(Arc::new(MemoryStore::default()))
    }

    /// A store backed by the given MongoDB database.
    pub fn mongodb(client: Client, db: Database) -> Self {
        Self(Arc::new(MongoStore::new(client, db)))
    }
}

impl Deref for Store {
    type Target = dyn Storage;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Store {
    type Error = ();

    /// Get the store from the managed state.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match req.rocket().state::<Store>() {
            Some(store) => Outcome::Success(store.clone()),
            None => {
                error!("Storage is not managed by this rocket");
                Outcome::Failure((Status::InternalServerError, ()))
            }
        }
    }
}

/// Latest start date first, undated questionnaires last, then by ID.
pub(crate) fn listing_order(a: &Questionnaire, b: &Questionnaire) -> Ordering {
    b.date_start
        .cmp(&a.date_start)
        .then_with(|| a.id.cmp(&b.id))
}

/// Duplicate-free, ascending option IDs.
pub(crate) fn normalize_choices(choices: &mut Vec<AnswerId>) {
    choices.sort_unstable();
    choices.dedup();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undated_questionnaires_listed_last() {
        let dated = |id, day: &str| Questionnaire {
            id,
            questionnaire: NewQuestionnaire {
                date_start: Some(day.parse().unwrap()),
                ..NewQuestionnaire::example()
            },
        };
        let undated = |id| Questionnaire {
            id,
            questionnaire: NewQuestionnaire::example(),
        };

        let mut questionnaires = vec![
            undated(1),
            dated(2, "2020-01-01"),
            undated(3),
            dated(4, "2021-01-01"),
            dated(5, "2020-01-01"),
        ];
        questionnaires.sort_by(listing_order);

        let ids: Vec<_> = questionnaires.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![4, 2, 5, 1, 3]);
    }

    #[test]
    fn choices_deduplicated_and_sorted() {
        let mut choices = vec![5, 2, 5, 1];
        normalize_choices(&mut choices);
        assert_eq!(choices, vec![1, 2, 5]);
    }
}
