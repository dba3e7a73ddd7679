use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{
        common::{QuestionId, QuestionType, QuestionnaireId},
        db::{NewQuestion, Question, QuestionCore},
    },
};

use super::required;

/// A question specification, as submitted on creation or full update.
///
/// Every field decodes as optional so that a body missing some of them still
/// reaches the reference and start date checks. The remaining fields are
/// enforced afterwards by [`QuestionSpec::into_new`] and [`QuestionSpec::apply`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QuestionSpec {
    #[serde(default)]
    pub questionnaire_id: Option<QuestionnaireId>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default, rename = "type")]
    pub question_type: Option<QuestionType>,
}

impl QuestionSpec {
    /// Build the new question for the (already checked) owning questionnaire.
    pub fn into_new(self, questionnaire_id: QuestionnaireId) -> Result<NewQuestion> {
        Ok(NewQuestion {
            questionnaire_id,
            question: required(self.question, "question")?,
            question_type: required(self.question_type, "type")?,
        })
    }

    /// Replace the editable fields of `question`. The owning questionnaire
    /// may be repeated but not changed.
    pub fn apply(self, question: &mut QuestionCore) -> Result<()> {
        if self
            .questionnaire_id
            .map_or(false, |id| id != question.questionnaire_id)
        {
            return Err(Error::bad_request(
                "The questionnaire of a question cannot be changed.",
            ));
        }
        question.question = required(self.question, "question")?;
        question.question_type = required(self.question_type, "type")?;
        Ok(())
    }
}

/// A partial question update.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QuestionPatch {
    #[serde(default)]
    pub questionnaire_id: Option<QuestionnaireId>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default, rename = "type")]
    pub question_type: Option<QuestionType>,
}

impl QuestionPatch {
    pub fn apply(self, question: &mut QuestionCore) -> Result<()> {
        if self
            .questionnaire_id
            .map_or(false, |id| id != question.questionnaire_id)
        {
            return Err(Error::bad_request(
                "The questionnaire of a question cannot be changed.",
            ));
        }
        if let Some(text) = self.question {
            question.question = text;
        }
        if let Some(question_type) = self.question_type {
            question.question_type = question_type;
        }
        Ok(())
    }
}

/// A question as shown to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDescription {
    pub id: QuestionId,
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub questionnaire_id: QuestionnaireId,
}

impl From<Question> for QuestionDescription {
    fn from(question: Question) -> Self {
        let Question { id, question } = question;
        Self {
            id,
            question: question.question,
            question_type: question.question_type,
            questionnaire_id: question.questionnaire_id,
        }
    }
}
