use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{
        common::{AnswerId, QuestionId},
        db::{AnswerOption, AnswerOptionCore, NewAnswerOption},
    },
};

use super::required;

/// An answer option specification, as submitted on creation or full update.
/// Fields decode as optional and are enforced once the owner checks pass.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnswerSpec {
    #[serde(default)]
    pub question_id: Option<QuestionId>,
    #[serde(default)]
    pub text: Option<String>,
}

impl AnswerSpec {
    pub fn into_new(self, question_id: QuestionId) -> Result<NewAnswerOption> {
        Ok(NewAnswerOption {
            question_id,
            text: required(self.text, "text")?,
        })
    }

    /// Replace the label of `option`.
    pub fn apply(self, option: &mut AnswerOptionCore) -> Result<()> {
        let text = required(self.text.clone(), "text")?;
        AnswerPatch::from(self).apply(option)?;
        option.text = text;
        Ok(())
    }
}

/// A partial answer option update.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnswerPatch {
    #[serde(default)]
    pub question_id: Option<QuestionId>,
    #[serde(default)]
    pub text: Option<String>,
}

impl From<AnswerSpec> for AnswerPatch {
    fn from(spec: AnswerSpec) -> Self {
        Self {
            question_id: spec.question_id,
            text: spec.text,
        }
    }
}

impl AnswerPatch {
    /// Update the label of `option`. The owning question may be repeated but
    /// not changed.
    pub fn apply(self, option: &mut AnswerOptionCore) -> Result<()> {
        if self
            .question_id
            .map_or(false, |id| id != option.question_id)
        {
            return Err(Error::bad_request(
                "The question of an answer option cannot be changed.",
            ));
        }
        if let Some(text) = self.text {
            option.text = text;
        }
        Ok(())
    }
}

/// An answer option as shown to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerDescription {
    pub id: AnswerId,
    pub question_id: QuestionId,
    pub text: String,
}

impl From<AnswerOption> for AnswerDescription {
    fn from(option: AnswerOption) -> Self {
        Self {
            id: option.id,
            question_id: option.option.question_id,
            text: option.option.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relabel() {
        let mut option = AnswerOptionCore::example(3);
        AnswerSpec::example2(3).apply(&mut option).unwrap();
        assert_eq!(option, AnswerOptionCore::example2(3));

        let unlabelled = AnswerSpec {
            question_id: Some(3),
            text: None,
        };
        let err = unlabelled.apply(&mut option).unwrap_err();
        assert_eq!(err.to_string(), "The 'text' field is required.");
        assert_eq!(option, AnswerOptionCore::example2(3));

        let moved = AnswerPatch {
            question_id: Some(4),
            text: None,
        };
        assert!(moved.apply(&mut option).is_err());
    }
}
