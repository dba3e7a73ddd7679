use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::common::{AnswerId, QuestionId, ResponseId, UserId};

/// Core data of one user's answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponseCore {
    pub user_id: UserId,
    pub question_id: QuestionId,
    /// Empty when the question was answered by choice.
    pub text_answer: String,
    /// Selected answer options, sorted and free of duplicates.
    pub choice_answer: Vec<AnswerId>,
}

/// A user response without an ID.
pub type NewUserResponse = UserResponseCore;

/// A user response from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: ResponseId,
    #[serde(flatten)]
    pub response: UserResponseCore,
}

impl Deref for UserResponse {
    type Target = UserResponseCore;

    fn deref(&self) -> &Self::Target {
        &self.response
    }
}

impl DerefMut for UserResponse {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.response
    }
}
