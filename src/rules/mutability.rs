//! The structure of a questionnaire (its questions and their answer options)
//! is frozen as soon as the questionnaire has a start date.

use std::fmt::Display;

use chrono::NaiveDate;
use rocket::http::Status;
use thiserror::Error;

use crate::model::{common::QuestionType, db::QuestionnaireCore};

/// A structural record guarded by its questionnaire's start date.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Resource {
    Question,
    Answer,
}

impl Display for Resource {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::Question => "questions",
                Self::Answer => "answers",
            }
        )
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

/// Reasons to refuse a structural change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    /// A required reference was left out of the payload.
    #[error("No '{0}' specified.")]
    Unspecified(&'static str),
    /// The owning questionnaire already has a start date.
    #[error("{}", started_message(.resource, .operation))]
    Started {
        resource: Resource,
        operation: Operation,
    },
    /// Answer options only make sense for choice questions.
    #[error("This type of question requires a text answer.")]
    TextQuestion,
}

impl GuardError {
    pub fn status(&self) -> Status {
        match self {
            Self::Started { .. } => Status::Forbidden,
            Self::Unspecified(_) | Self::TextQuestion => Status::NotAcceptable,
        }
    }
}

fn started_message(resource: &Resource, operation: &Operation) -> String {
    match operation {
        Operation::Create => format!(
            "After specifying the start date of the survey, you cannot create new {resource}."
        ),
        Operation::Update => format!(
            "After specifying the start date for the survey, you cannot change the {resource}."
        ),
        Operation::Delete => format!(
            "After specifying the start date of the survey, you cannot delete {resource}."
        ),
    }
}

/// May the structure of a questionnaire with this start date still change?
pub fn can_mutate(date_start: Option<NaiveDate>) -> bool {
    date_start.is_none()
}

/// Refuse `operation` on `resource` if the owning `questionnaire` has started.
pub fn ensure_mutable(
    questionnaire: &QuestionnaireCore,
    resource: Resource,
    operation: Operation,
) -> Result<(), GuardError> {
    if can_mutate(questionnaire.date_start) {
        Ok(())
    } else {
        Err(GuardError::Started {
            resource,
            operation,
        })
    }
}

/// Unwrap a reference that a create payload must carry. Ids start at 1, so
/// `0` counts as unspecified.
pub fn require(reference: Option<u32>, field: &'static str) -> Result<u32, GuardError> {
    reference
        .filter(|&id| id != 0)
        .ok_or(GuardError::Unspecified(field))
}

/// Refuse to attach answer options to a text question.
pub fn ensure_accepts_options(question_type: QuestionType) -> Result<(), GuardError> {
    if question_type.is_choice() {
        Ok(())
    } else {
        Err(GuardError::TextQuestion)
    }
}
