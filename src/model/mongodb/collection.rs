use std::ops::Deref;

use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};

use crate::model::db::{
    AnswerOption, NewAnswerOption, NewQuestion, NewQuestionnaire, Question, Questionnaire, User,
    UserResponse,
};

use super::counter::Counter;

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Questionnaire collections. The `New*` collections are used to replace a
// record's fields while keeping its `_id`.
const QUESTIONNAIRES: &str = "questionnaires";
impl MongoCollection for Questionnaire {
    const NAME: &'static str = QUESTIONNAIRES;
}
impl MongoCollection for NewQuestionnaire {
    const NAME: &'static str = QUESTIONNAIRES;
}

// Question collections
const QUESTIONS: &str = "questions";
impl MongoCollection for Question {
    const NAME: &'static str = QUESTIONS;
}
impl MongoCollection for NewQuestion {
    const NAME: &'static str = QUESTIONS;
}

// Answer option collections
const ANSWERS: &str = "answers";
impl MongoCollection for AnswerOption {
    const NAME: &'static str = ANSWERS;
}
impl MongoCollection for NewAnswerOption {
    const NAME: &'static str = ANSWERS;
}

// User response collection. Responses are never replaced.
const RESPONSES: &str = "responses";
impl MongoCollection for UserResponse {
    const NAME: &'static str = RESPONSES;
}

// User collection. New users are always written with their allocated ID.
const USERS: &str = "users";
impl MongoCollection for User {
    const NAME: &'static str = USERS;
}

// Counter collection
const COUNTERS: &str = "counters";
impl MongoCollection for Counter {
    const NAME: &'static str = COUNTERS;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // One response per user per question.
    let response_index = IndexModel::builder()
        .keys(doc! {"user_id": 1, "question_id": 1})
        .options(unique.clone())
        .build();
    Coll::<UserResponse>::from_db(db)
        .create_index(response_index, None)
        .await?;

    // User collection.
    let users = Coll::<User>::from_db(db);
    let username_index = IndexModel::builder()
        .keys(doc! {"username": 1})
        .options(unique.clone())
        .build();
    users.create_index(username_index, None).await?;
    let email_index = IndexModel::builder()
        .keys(doc! {"email": 1})
        .options(unique)
        .build();
    users.create_index(email_index, None).await?;

    // Foreign key lookups.
    let question_index = IndexModel::builder()
        .keys(doc! {"questionnaire_id": 1})
        .build();
    Coll::<Question>::from_db(db)
        .create_index(question_index, None)
        .await?;
    let answer_index = IndexModel::builder().keys(doc! {"question_id": 1}).build();
    Coll::<AnswerOption>::from_db(db)
        .create_index(answer_index, None)
        .await?;

    Ok(())
}
