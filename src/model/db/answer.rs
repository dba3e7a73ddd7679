use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::common::{AnswerId, QuestionId};

/// Core answer option data: one candidate choice for a choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOptionCore {
    pub question_id: QuestionId,
    pub text: String,
}

/// An answer option without an ID.
pub type NewAnswerOption = AnswerOptionCore;

/// An answer option from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    #[serde(rename = "_id")]
    pub id: AnswerId,
    #[serde(flatten)]
    pub option: AnswerOptionCore,
}

impl Deref for AnswerOption {
    type Target = AnswerOptionCore;

    fn deref(&self) -> &Self::Target {
        &self.option
    }
}

impl DerefMut for AnswerOption {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.option
    }
}
