use serde::{Deserialize, Deserializer, Serialize};

use crate::model::{
    common::{AnswerId, QuestionId, ResponseId, UserId},
    db::UserResponse,
};

/// Longest accepted free-text answer, in characters.
pub const MAX_TEXT_ANSWER_LENGTH: usize = 500;

/// A submitted response.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ResponseSpec {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub question: Option<QuestionId>,
    #[serde(default)]
    pub text_answer: Option<String>,
    /// Accepts either a single option ID or a list of them.
    #[serde(default, deserialize_with = "one_or_many")]
    pub choice_answer: Vec<AnswerId>,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<AnswerId>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(AnswerId),
        Many(Vec<AnswerId>),
        Null(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(id) => vec![id],
        OneOrMany::Many(ids) => ids,
        OneOrMany::Null(()) => Vec::new(),
    })
}

/// A stored response as shown to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDescription {
    pub id: ResponseId,
    pub user_id: UserId,
    pub question: QuestionId,
    pub text_answer: String,
    pub choice_answer: Vec<AnswerId>,
}

impl From<UserResponse> for ResponseDescription {
    fn from(response: UserResponse) -> Self {
        let UserResponse { id, response } = response;
        Self {
            id,
            user_id: response.user_id,
            question: response.question_id,
            text_answer: response.text_answer,
            choice_answer: response.choice_answer,
        }
    }
}


#[cfg(test)]
mod examples {
    use super::*;

    impl ResponseSpec {
        pub fn text_example(user_id: UserId, question: QuestionId) -> Self {
            Self {
                user_id: Some(user_id),
                question: Some(question),
                text_answer: Some("I like sunny weather.".to_string()),
                choice_answer: Vec::new(),
            }
        }

        pub fn choice_example(
            user_id: UserId,
            question: QuestionId,
            choice_answer: Vec<AnswerId>,
        ) -> Self {
            Self {
                user_id: Some(user_id),
                question: Some(question),
                text_answer: None,
                choice_answer,
            }
        }
    }
}
