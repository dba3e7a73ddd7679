use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::common::{QuestionId, QuestionType, QuestionnaireId};

/// Core question data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionCore {
    /// The owning questionnaire. Fixed at creation.
    pub questionnaire_id: QuestionnaireId,
    /// Question prompt.
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
}

/// A question without an ID.
pub type NewQuestion = QuestionCore;

/// A question from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: QuestionId,
    #[serde(flatten)]
    pub question: QuestionCore,
}

impl Deref for Question {
    type Target = QuestionCore;

    fn deref(&self) -> &Self::Target {
        &self.question
    }
}

impl DerefMut for Question {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.question
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl QuestionCore {
        pub fn text_example(questionnaire_id: QuestionnaireId) -> Self {
            Self {
                questionnaire_id,
                question: "What kind of weather do you like?".to_string(),
                question_type: QuestionType::TextAnswer,
            }
        }

        pub fn single_choice_example(questionnaire_id: QuestionnaireId) -> Self {
            Self {
                questionnaire_id,
                question: "What kind of clothes do you like?".to_string(),
                question_type: QuestionType::SingleChoice,
            }
        }

        pub fn multiple_choice_example(questionnaire_id: QuestionnaireId) -> Self {
            Self {
                questionnaire_id,
                question: "What kind of games do you like?".to_string(),
                question_type: QuestionType::MultipleChoice,
            }
        }
    }
}
